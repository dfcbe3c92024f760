//! Query execution through the public API.

mod common;

use ldaptools::prelude::*;

use common::{context_with_recorder, example_local, people_rows};

async fn last_query(conn: &InMemoryConnection) -> QueryOperation {
    match conn.last_operation().await {
        Some(Operation::Query(op)) => op,
        other => panic!("expected a query operation, got {other:?}"),
    }
}

#[tokio::test]
async fn test_two_rows_hydrate_to_two_objects() {
    let conn = example_local();
    conn.push_entries(people_rows()).await;
    let (context, _) = context_with_recorder(conn.clone());

    let result = LdapQuery::new(context)
        .execute(HydrationMode::Object)
        .await
        .unwrap();
    let objects = result.into_objects().unwrap();

    assert_eq!(objects.len(), 2);
    let first = objects.get(0).unwrap();
    assert_eq!(first.dn(), Some("uid=jbourke,ou=People,dc=example,dc=local"));
    assert_eq!(first.get_string("givenname"), Some("Jon"));
    assert_eq!(first.get_string("cn"), Some("Jon Bourke"));
    assert_eq!(first.get_string("sn"), Some("Bourke"));

    let second = objects.get(1).unwrap();
    assert_eq!(second.dn(), Some("uid=jgoldste,ou=People,dc=example,dc=local"));
    assert_eq!(second.get_string("givenname"), Some("Joe"));
}

#[tokio::test]
async fn test_array_hydration() {
    let conn = example_local();
    conn.push_entries(people_rows()).await;
    let (context, _) = context_with_recorder(conn.clone());

    let rows = LdapQuery::new(context).get_array_result().await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[0],
        AttributeMap::new()
            .with("givenname", "Jon")
            .with("cn", "Jon Bourke")
            .with("sn", "Bourke")
            .with("dn", "uid=jbourke,ou=People,dc=example,dc=local")
    );
}

#[tokio::test]
async fn test_order_by_requests_and_sorts() {
    let conn = example_local();
    conn.push_entries(people_rows()).await;
    let (context, _) = context_with_recorder(conn.clone());

    let mut query = LdapQuery::new(context);
    query
        .set_attributes(["cn", "givenname"])
        .add_order_by("sn", SortDirection::Desc);
    let objects = query.get_result().await.unwrap();

    let op = last_query(&conn).await;
    assert_eq!(op.attributes(), ["cn", "givenname", "sn"]);

    let surnames: Vec<&str> = objects.iter().filter_map(|o| o.get_string("sn")).collect();
    assert_eq!(surnames, vec!["Goldstein", "Bourke"]);
}

#[tokio::test]
async fn test_scope_selects_function() {
    let conn = example_local();
    let (context, _) = context_with_recorder(conn.clone());
    let mut query = LdapQuery::new(context);

    for (scope, function) in [
        ("subtree", "ldap_search"),
        ("onelevel", "ldap_list"),
        ("base", "ldap_read"),
    ] {
        query.set_scope_name(scope).unwrap();
        query.execute(HydrationMode::Object).await.unwrap();
        assert_eq!(last_query(&conn).await.ldap_function(), function);
    }
}

#[tokio::test]
async fn test_repeated_execution_is_independent() {
    let conn = example_local();
    conn.push_entries(people_rows()).await;
    let (context, _) = context_with_recorder(conn.clone());

    let mut query = LdapQuery::new(context);
    query.set_attributes(["cn"]).add_order_by("sn", SortDirection::Asc);

    assert_eq!(query.execute(HydrationMode::Object).await.unwrap().len(), 2);
    assert_eq!(query.execute(HydrationMode::Object).await.unwrap().len(), 0);
    assert_eq!(query.attributes(), ["cn"]);

    let operations = conn.operations().await;
    assert_eq!(operations.len(), 2);
    assert_eq!(operations[0], operations[1]);
}

#[tokio::test]
async fn test_query_events() {
    let conn = example_local();
    conn.push_entries(people_rows()).await;
    let (context, recorder) = context_with_recorder(conn.clone());

    let mut query = LdapQuery::new(context);
    query
        .set_base_dn("ou=People,dc=example,dc=local")
        .set_filter(Filter::eq("sn", "Bourke"));
    query.get_result().await.unwrap();

    assert_eq!(recorder.kinds(), vec![EventKind::BeforeQuery, EventKind::AfterQuery]);
    let events = recorder.events();
    let before = events[0].as_query().unwrap();
    assert_eq!(before.base_dn, "ou=People,dc=example,dc=local");
    assert_eq!(before.filter, "(sn=Bourke)");
    assert_eq!(before.result_count, None);
    assert_eq!(events[1].as_query().unwrap().result_count, Some(2));
}

#[tokio::test]
async fn test_transport_failure_is_propagated() {
    let conn = example_local();
    let (context, recorder) = context_with_recorder(conn.clone());
    conn.fail_next("timeout").await;

    let err = LdapQuery::new(context)
        .execute(HydrationMode::Array)
        .await
        .unwrap_err();

    assert!(matches!(err, LdapError::Transport { .. }));
    assert_eq!(recorder.kinds(), vec![EventKind::BeforeQuery]);
}
