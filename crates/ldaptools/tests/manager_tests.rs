//! Round trips through the manager: create, find, modify, move, delete.

mod common;

use std::sync::Arc;

use ldaptools::prelude::*;

use common::{example_com, init_test_logging, RecordingDispatcher};

fn manager(conn: Arc<InMemoryConnection>) -> (LdapManager, Arc<RecordingDispatcher>) {
    init_test_logging();
    let recorder = Arc::new(RecordingDispatcher::default());
    let context = LdapContext::new(conn).with_dispatcher(recorder.clone());
    (LdapManager::from_context(context), recorder)
}

#[tokio::test]
async fn test_find_modify_move_delete() {
    let conn = example_com();
    conn.push_entries(vec![RawEntry::new("cn=jsmith,ou=Staff,dc=example,dc=com")
        .with("cn", vec!["jsmith".into()])
        .with("sAMAccountName", vec!["jsmith".into()])
        .with("givenName", vec!["John".into()])
        .with("userAccountControl", vec!["512".into()])])
    .await;
    let (manager, recorder) = manager(conn.clone());

    let mut query = manager.query();
    query
        .from_schema(ObjectKind::User)
        .unwrap()
        .set_filter(Filter::eq("username", "jsmith"));
    let mut user = query.get_one_or_none().await.unwrap().unwrap();

    assert_eq!(user.get_string("username"), Some("jsmith"));
    assert_eq!(user.get("userAccountControl"), Some(&AttributeValue::Integer(512)));

    user.set("firstName", "Johnny").set("userAccountControl", 514i64);
    manager.persist(&mut user).await.unwrap();

    let Some(Operation::BatchModify(modify)) = conn.last_operation().await else {
        panic!("expected a batch modify");
    };
    assert_eq!(
        modify.batch(),
        [
            BatchChange::replace("givenName", vec!["Johnny".into()]),
            BatchChange::replace("userAccountControl", vec!["514".into()]),
        ]
    );

    manager
        .move_to(&mut user, "ou=Former,dc=example,dc=com")
        .await
        .unwrap();
    assert_eq!(user.dn(), Some("cn=jsmith,ou=Former,dc=example,dc=com"));

    manager.delete(&user).await.unwrap();
    let Some(Operation::Delete(delete)) = conn.last_operation().await else {
        panic!("expected a delete");
    };
    assert_eq!(delete.dn(), Some("cn=jsmith,ou=Former,dc=example,dc=com"));

    assert_eq!(
        recorder.kinds(),
        vec![
            EventKind::BeforeQuery,
            EventKind::AfterQuery,
            EventKind::BeforeModify,
            EventKind::AfterModify,
            EventKind::BeforeMove,
            EventKind::AfterMove,
            EventKind::BeforeDelete,
            EventKind::AfterDelete,
        ]
    );

    let events = recorder.events();
    let moved = events[5].as_object().unwrap();
    assert_eq!(moved.dn, "cn=jsmith,ou=Staff,dc=example,dc=com");
    assert_eq!(
        moved.new_dn.as_deref(),
        Some("cn=jsmith,ou=Former,dc=example,dc=com")
    );
}

#[tokio::test]
async fn test_create_through_manager() {
    let conn = example_com();
    let (manager, _) = manager(conn.clone());

    let dn = manager
        .create_ou()
        .unwrap()
        .with(AttributeMap::new().with("name", "Sales"))
        .unwrap()
        .in_container("%_defaultnamingcontext_%")
        .unwrap()
        .execute()
        .await
        .unwrap();

    assert_eq!(dn, "ou=Sales,dc=example,dc=com");
    let Some(Operation::Add(add)) = conn.last_operation().await else {
        panic!("expected an add");
    };
    assert_eq!(
        add.attributes().get("objectClass"),
        Some(&AttributeValue::from(vec!["top", "organizationalUnit"]))
    );
}

#[tokio::test]
async fn test_openldap_schema_override() {
    let conn = example_com();
    let context = LdapContext::new(conn.clone())
        .with_config(LdapToolsConfig::default().with_schema_name("openldap"));
    let manager = LdapManager::from_context(context);

    let dn = manager
        .create_user()
        .unwrap()
        .with(AttributeMap::new().with("username", "jdoe").with("password", "secret"))
        .unwrap()
        .in_container("ou=People,dc=example,dc=com")
        .unwrap()
        .execute()
        .await
        .unwrap();

    assert_eq!(dn, "uid=jdoe,ou=People,dc=example,dc=com");
    let Some(Operation::Add(add)) = conn.last_operation().await else {
        panic!("expected an add");
    };
    assert_eq!(add.attributes().get_string("userPassword"), Some("secret"));
    assert_eq!(add.attributes().get_string("sn"), Some("jdoe"));
}

#[tokio::test]
async fn test_after_modify_error_still_clears_changes() {
    init_test_logging();
    let conn = example_com();
    let mut bus = EventBus::new();
    bus.on_modify(Stage::After, |_| Err(LdapError::invalid_state("audit sink down")));
    let manager = LdapManager::from_context(LdapContext::new(conn.clone()).with_dispatcher(Arc::new(bus)));

    let mut user = LdapObject::new(AttributeMap::new(), Some(ObjectKind::User))
        .with_dn("cn=jsmith,ou=Staff,dc=example,dc=com");
    user.add("groups", "cn=Sales,dc=example,dc=com");

    let err = manager.persist(&mut user).await.unwrap_err();
    assert_eq!(err.error_code(), "INVALID_STATE");
    assert_eq!(conn.operation_count().await, 1);
    assert!(!user.has_changes());

    manager.persist(&mut user).await.unwrap();
    assert_eq!(conn.operation_count().await, 1);
}
