//! Built-in schema definitions for Active Directory and OpenLDAP.

use crate::converter::ids;

use super::SchemaDefinition;

pub(crate) const ACTIVE_DIRECTORY: &str = "ad";
pub(crate) const OPENLDAP: &str = "openldap";

pub(crate) fn active_directory() -> Vec<SchemaDefinition> {
    vec![ad_user(), ad_group(), ad_computer(), ad_contact(), ad_ou()]
}

pub(crate) fn openldap() -> Vec<SchemaDefinition> {
    vec![openldap_user(), openldap_group(), openldap_ou()]
}

/// Attributes every AD object carries.
fn with_ad_common(schema: SchemaDefinition) -> SchemaDefinition {
    schema
        .with_attribute("name", "cn")
        .with_attribute("description", "description")
        .with_converted_attribute("guid", "objectGUID", ids::WINDOWS_GUID)
        .with_converted_attribute("created", "whenCreated", ids::GENERALIZED_TIME)
        .with_converted_attribute("modified", "whenChanged", ids::GENERALIZED_TIME)
}

fn ad_user() -> SchemaDefinition {
    with_ad_common(SchemaDefinition::new(
        "user",
        vec!["top", "person", "organizationalPerson", "user"],
    ))
    .with_attribute("username", "sAMAccountName")
    .with_converted_attribute("password", "unicodePwd", ids::WINDOWS_PASSWORD)
    .with_attribute("firstName", "givenName")
    .with_attribute("lastName", "sn")
    .with_attribute("displayName", "displayName")
    .with_attribute("emailAddress", "mail")
    .with_attribute("upn", "userPrincipalName")
    .with_attribute("groups", "memberOf")
    .with_converted_attribute("sid", "objectSid", ids::WINDOWS_SID)
    .with_converted_attribute("userAccountControl", "userAccountControl", ids::INT)
    .with_converted_attribute("passwordLastSet", "pwdLastSet", ids::WINDOWS_TIME)
    .with_converted_attribute("lastLogon", "lastLogonTimestamp", ids::WINDOWS_TIME)
    .with_default_value("name", "%username%")
    .with_default_value("displayName", "%username%")
    .with_default_value("firstName", "%username%")
    .with_default_value("upn", "%username%@%_domainname_%")
    .with_default_value("userAccountControl", "512")
}

fn ad_group() -> SchemaDefinition {
    with_ad_common(SchemaDefinition::new("group", vec!["top", "group"]))
        .with_attribute("accountName", "sAMAccountName")
        .with_attribute("members", "member")
        .with_attribute("groups", "memberOf")
        .with_converted_attribute("sid", "objectSid", ids::WINDOWS_SID)
        .with_converted_attribute("groupType", "groupType", ids::INT)
        .with_default_value("accountName", "%name%")
        // Global security group.
        .with_default_value("groupType", "-2147483646")
}

fn ad_computer() -> SchemaDefinition {
    with_ad_common(SchemaDefinition::new(
        "computer",
        vec!["top", "person", "organizationalPerson", "user", "computer"],
    ))
    .with_attribute("accountName", "sAMAccountName")
    .with_attribute("dnsHostName", "dNSHostName")
    .with_attribute("operatingSystem", "operatingSystem")
    .with_converted_attribute("sid", "objectSid", ids::WINDOWS_SID)
    .with_converted_attribute("userAccountControl", "userAccountControl", ids::INT)
    .with_default_value("accountName", "%name%$")
    // WORKSTATION_TRUST_ACCOUNT
    .with_default_value("userAccountControl", "4096")
}

fn ad_contact() -> SchemaDefinition {
    with_ad_common(SchemaDefinition::new(
        "contact",
        vec!["top", "person", "organizationalPerson", "contact"],
    ))
    .with_attribute("firstName", "givenName")
    .with_attribute("lastName", "sn")
    .with_attribute("displayName", "displayName")
    .with_attribute("emailAddress", "mail")
    .with_default_value("displayName", "%name%")
}

fn ad_ou() -> SchemaDefinition {
    SchemaDefinition::new("ou", vec!["top", "organizationalUnit"])
        .with_attribute("name", "ou")
        .with_attribute("description", "description")
        .with_converted_attribute("guid", "objectGUID", ids::WINDOWS_GUID)
        .with_converted_attribute("created", "whenCreated", ids::GENERALIZED_TIME)
}

fn openldap_user() -> SchemaDefinition {
    SchemaDefinition::new(
        "user",
        vec!["top", "person", "organizationalPerson", "inetOrgPerson"],
    )
    .with_attribute("name", "cn")
    .with_attribute("username", "uid")
    .with_attribute("password", "userPassword")
    .with_attribute("firstName", "givenName")
    .with_attribute("lastName", "sn")
    .with_attribute("displayName", "displayName")
    .with_attribute("emailAddress", "mail")
    .with_attribute("description", "description")
    .with_attribute("guid", "entryUUID")
    .with_converted_attribute("created", "createTimestamp", ids::GENERALIZED_TIME)
    .with_converted_attribute("modified", "modifyTimestamp", ids::GENERALIZED_TIME)
    .with_rdn("username")
    .with_default_value("name", "%username%")
    .with_default_value("displayName", "%username%")
    .with_default_value("lastName", "%username%")
}

fn openldap_group() -> SchemaDefinition {
    SchemaDefinition::new("group", vec!["top", "groupOfNames"])
        .with_attribute("name", "cn")
        .with_attribute("members", "member")
        .with_attribute("description", "description")
        .with_attribute("guid", "entryUUID")
        .with_converted_attribute("created", "createTimestamp", ids::GENERALIZED_TIME)
}

fn openldap_ou() -> SchemaDefinition {
    SchemaDefinition::new("ou", vec!["top", "organizationalUnit"])
        .with_attribute("name", "ou")
        .with_attribute("description", "description")
        .with_attribute("guid", "entryUUID")
}
