//! Ordered collections of hydrated objects.

use std::cmp::Ordering;

use ldaptools_core::attribute::{AttributeMap, AttributeValue};
use ldaptools_core::types::SortDirection;

use super::LdapObject;

/// Objects returned by a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LdapObjectCollection {
    objects: Vec<LdapObject>,
}

impl LdapObjectCollection {
    pub fn new(objects: Vec<LdapObject>) -> Self {
        Self { objects }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn first(&self) -> Option<&LdapObject> {
        self.objects.first()
    }

    pub fn get(&self, index: usize) -> Option<&LdapObject> {
        self.objects.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LdapObject> {
        self.objects.iter()
    }

    /// Every object as a map, DN included.
    pub fn to_maps(&self) -> Vec<AttributeMap> {
        self.objects.iter().map(LdapObject::to_map).collect()
    }

    /// Stable sort by several keys, the first key being the most significant.
    ///
    /// `dn` sorts by the object's DN. Missing values sort first when ascending.
    pub fn sort_by_attributes(&mut self, order: &[(String, SortDirection)]) {
        if order.is_empty() {
            return;
        }
        self.objects.sort_by(|a, b| {
            order
                .iter()
                .map(|(attribute, direction)| {
                    let ordering = compare_optional(
                        sort_value(a, attribute).as_ref(),
                        sort_value(b, attribute).as_ref(),
                    );
                    match direction {
                        SortDirection::Asc => ordering,
                        SortDirection::Desc => ordering.reverse(),
                    }
                })
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
    }
}

fn sort_value(object: &LdapObject, attribute: &str) -> Option<AttributeValue> {
    if attribute.eq_ignore_ascii_case("dn") {
        return object.dn().map(AttributeValue::from);
    }
    object
        .get(attribute)
        .and_then(|v| v.values().first().cloned())
}

fn compare_optional(a: Option<&AttributeValue>, b: Option<&AttributeValue>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => compare_values(a, b),
    }
}

fn compare_values(a: &AttributeValue, b: &AttributeValue) -> Ordering {
    match (a, b) {
        (AttributeValue::Integer(x), AttributeValue::Integer(y)) => x.cmp(y),
        (AttributeValue::DateTime(x), AttributeValue::DateTime(y)) => x.cmp(y),
        (AttributeValue::Boolean(x), AttributeValue::Boolean(y)) => x.cmp(y),
        _ => a.to_string().to_lowercase().cmp(&b.to_string().to_lowercase()),
    }
}

impl IntoIterator for LdapObjectCollection {
    type Item = LdapObject;
    type IntoIter = std::vec::IntoIter<LdapObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.into_iter()
    }
}

impl<'a> IntoIterator for &'a LdapObjectCollection {
    type Item = &'a LdapObject;
    type IntoIter = std::slice::Iter<'a, LdapObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.iter()
    }
}

impl FromIterator<LdapObject> for LdapObjectCollection {
    fn from_iter<T: IntoIterator<Item = LdapObject>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn person(dn: &str, sn: Option<&str>, age: i64) -> LdapObject {
        let mut attrs = AttributeMap::new().with("age", age);
        if let Some(sn) = sn {
            attrs.set("sn", sn);
        }
        LdapObject::new(attrs, None).with_dn(dn)
    }

    fn dns(collection: &LdapObjectCollection) -> Vec<&str> {
        collection.iter().filter_map(LdapObject::dn).collect()
    }

    #[test]
    fn test_sort_case_insensitive_strings() {
        let mut collection = LdapObjectCollection::new(vec![
            person("cn=1", Some("smith"), 1),
            person("cn=2", Some("Bourke"), 2),
            person("cn=3", Some("adams"), 3),
        ]);
        collection.sort_by_attributes(&[("sn".to_string(), SortDirection::Asc)]);
        assert_eq!(dns(&collection), vec!["cn=3", "cn=2", "cn=1"]);
    }

    #[test]
    fn test_sort_missing_first_and_desc() {
        let mut collection = LdapObjectCollection::new(vec![
            person("cn=1", Some("b"), 1),
            person("cn=2", None, 2),
        ]);
        collection.sort_by_attributes(&[("sn".to_string(), SortDirection::Asc)]);
        assert_eq!(dns(&collection), vec!["cn=2", "cn=1"]);

        collection.sort_by_attributes(&[("sn".to_string(), SortDirection::Desc)]);
        assert_eq!(dns(&collection), vec!["cn=1", "cn=2"]);
    }

    #[test]
    fn test_sort_numeric_and_multi_key() {
        let mut collection = LdapObjectCollection::new(vec![
            person("cn=1", Some("same"), 10),
            person("cn=2", Some("same"), 9),
            person("cn=3", Some("first"), 100),
        ]);
        collection.sort_by_attributes(&[
            ("sn".to_string(), SortDirection::Asc),
            ("age".to_string(), SortDirection::Asc),
        ]);
        assert_eq!(dns(&collection), vec!["cn=3", "cn=2", "cn=1"]);
    }

    #[test]
    fn test_sort_datetimes() {
        let early = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).single().unwrap();
        let late = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap();
        let mut collection = LdapObjectCollection::new(vec![
            LdapObject::new(AttributeMap::new().with("created", late), None).with_dn("cn=late"),
            LdapObject::new(AttributeMap::new().with("created", early), None).with_dn("cn=early"),
        ]);

        collection.sort_by_attributes(&[("created".to_string(), SortDirection::Asc)]);
        assert_eq!(dns(&collection), vec!["cn=early", "cn=late"]);
    }

    #[test]
    fn test_to_maps() {
        let collection: LdapObjectCollection =
            vec![person("cn=1", Some("a"), 1)].into_iter().collect();
        let maps = collection.to_maps();
        assert_eq!(maps[0].get_string("dn"), Some("cn=1"));
        assert_eq!(collection.first().and_then(|o| o.get_string("sn")), Some("a"));
    }
}
