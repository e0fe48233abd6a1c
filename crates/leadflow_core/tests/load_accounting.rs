use leadflow_core::db::open_db_in_memory;
use leadflow_core::{
    ContactRepository, LeadRepository, ListQuery, LoadService, NewContact, NewLead, NewOperator,
    NewSource, OperatorRepository, SourceRepository, SqliteContactRepository,
    SqliteLeadRepository, SqliteOperatorRepository, SqliteSourceRepository,
};
use uuid::Uuid;

#[test]
fn load_counts_only_active_contacts_of_the_operator() {
    let conn = open_db_in_memory().unwrap();
    let operators = SqliteOperatorRepository::try_new(&conn).unwrap();
    let contacts = SqliteContactRepository::try_new(&conn).unwrap();
    let leads = SqliteLeadRepository::try_new(&conn).unwrap();
    let sources = SqliteSourceRepository::try_new(&conn).unwrap();
    let load = LoadService::new(&operators, &contacts);

    let alice = operators
        .create_operator(&NewOperator::new("Alice", "alice@example.com").with_max_load(2))
        .unwrap();
    let bob = operators
        .create_operator(&NewOperator::new("Bob", "bob@example.com"))
        .unwrap();
    let source = sources.create_source(&NewSource::new("Site", "t")).unwrap();
    let lead = leads.create_lead(&NewLead::new("web:1")).unwrap();

    let first = contacts
        .create_contact(&NewContact::new(lead.id, source.id, Some(alice.id)))
        .unwrap();
    contacts
        .create_contact(&NewContact::new(lead.id, source.id, Some(alice.id)))
        .unwrap();
    contacts
        .create_contact(&NewContact::new(lead.id, source.id, Some(bob.id)))
        .unwrap();
    contacts
        .create_contact(&NewContact::new(lead.id, source.id, None))
        .unwrap();

    assert_eq!(load.current_load(alice.id).unwrap(), 2);
    assert_eq!(load.current_load(bob.id).unwrap(), 1);
    assert!(!load.has_capacity(&alice).unwrap());

    contacts.close_contact(first.id).unwrap();
    assert_eq!(load.current_load(alice.id).unwrap(), 1);
    assert!(load.has_capacity(&alice).unwrap());

    // Closing twice releases capacity once.
    contacts.close_contact(first.id).unwrap();
    assert_eq!(load.current_load(alice.id).unwrap(), 1);
}

#[test]
fn close_keeps_first_closed_at() {
    let conn = open_db_in_memory().unwrap();
    let contacts = SqliteContactRepository::try_new(&conn).unwrap();
    let leads = SqliteLeadRepository::try_new(&conn).unwrap();
    let sources = SqliteSourceRepository::try_new(&conn).unwrap();

    let source = sources.create_source(&NewSource::new("Site", "t")).unwrap();
    let lead = leads.create_lead(&NewLead::new("web:1")).unwrap();
    let contact = contacts
        .create_contact(&NewContact::new(lead.id, source.id, None))
        .unwrap();
    assert!(contact.closed_at.is_none());

    let closed = contacts.close_contact(contact.id).unwrap().unwrap();
    assert!(!closed.is_active());
    let closed_at = closed.closed_at.unwrap();

    let again = contacts.close_contact(contact.id).unwrap().unwrap();
    assert_eq!(again.closed_at, Some(closed_at));
    assert!(contacts.close_contact(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn unknown_operator_has_no_load_view() {
    let conn = open_db_in_memory().unwrap();
    let operators = SqliteOperatorRepository::try_new(&conn).unwrap();
    let contacts = SqliteContactRepository::try_new(&conn).unwrap();
    let load = LoadService::new(&operators, &contacts);

    let missing = Uuid::new_v4();
    assert!(load.operator_with_load(missing).unwrap().is_none());
    assert_eq!(load.current_load(missing).unwrap(), 0);
}

#[test]
fn available_operators_paginate_after_capacity_filter() {
    let conn = open_db_in_memory().unwrap();
    let operators = SqliteOperatorRepository::try_new(&conn).unwrap();
    let contacts = SqliteContactRepository::try_new(&conn).unwrap();
    let load = LoadService::new(&operators, &contacts);

    operators
        .create_operator(&NewOperator::new("Zero", "zero@example.com").with_max_load(0))
        .unwrap();
    let second = operators
        .create_operator(&NewOperator::new("Second", "second@example.com"))
        .unwrap();
    let third = operators
        .create_operator(&NewOperator::new("Third", "third@example.com"))
        .unwrap();

    let first_page = load.list_available_operators(&ListQuery::new(0, 1)).unwrap();
    assert_eq!(first_page.len(), 1);
    assert_eq!(first_page[0].operator.id, second.id);

    let second_page = load.list_available_operators(&ListQuery::new(1, 1)).unwrap();
    assert_eq!(second_page.len(), 1);
    assert_eq!(second_page[0].operator.id, third.id);
}
