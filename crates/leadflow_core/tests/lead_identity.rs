use leadflow_core::db::open_db_in_memory;
use leadflow_core::{
    DuplicateConstraint, EntityKind, LeadHints, LeadRepository, LeadService, LeadUpdate,
    ListQuery, NewLead, RepoError, SqliteLeadRepository, ValidationError,
};
use uuid::Uuid;

#[test]
fn external_id_is_unique() {
    let conn = open_db_in_memory().unwrap();
    let leads = LeadService::new(SqliteLeadRepository::try_new(&conn).unwrap());

    let created = leads.create_lead(&NewLead::new(" tg:42 ")).unwrap();
    assert_eq!(created.external_id, "tg:42");

    let err = leads.create_lead(&NewLead::new("tg:42")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Duplicate(DuplicateConstraint::LeadExternalId)
    ));

    let found = leads.find_lead_by_external_id("tg:42").unwrap().unwrap();
    assert_eq!(found.id, created.id);
}

#[test]
fn update_changes_only_provided_fields() {
    let conn = open_db_in_memory().unwrap();
    let leads = LeadService::new(SqliteLeadRepository::try_new(&conn).unwrap());

    let mut input = NewLead::new("tg:1");
    input.phone = Some("+100".to_string());
    input.full_name = Some("Bob".to_string());
    let lead = leads.create_lead(&input).unwrap();

    let updated = leads
        .update_lead(
            lead.id,
            &LeadUpdate {
                notes: Some("prefers mornings".to_string()),
                ..LeadUpdate::default()
            },
        )
        .unwrap();
    assert_eq!(updated.phone.as_deref(), Some("+100"));
    assert_eq!(updated.full_name.as_deref(), Some("Bob"));
    assert_eq!(updated.notes.as_deref(), Some("prefers mornings"));

    assert!(matches!(
        leads.update_lead(Uuid::new_v4(), &LeadUpdate::default()),
        Err(RepoError::NotFound {
            entity: EntityKind::Lead,
            ..
        })
    ));
    assert!(matches!(
        leads.update_lead(
            lead.id,
            &LeadUpdate {
                email: Some("nope".to_string()),
                ..LeadUpdate::default()
            }
        ),
        Err(RepoError::Validation(ValidationError::InvalidEmail { .. }))
    ));
}

#[test]
fn fill_missing_never_overwrites_existing_values() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLeadRepository::try_new(&conn).unwrap();

    let mut input = NewLead::new("tg:7");
    input.phone = Some("+100".to_string());
    let lead = repo.create_lead(&input).unwrap();

    let merged = repo
        .fill_missing_lead_fields(
            lead.id,
            &LeadHints {
                phone: Some("+999".to_string()),
                email: Some(" bob@example.com ".to_string()),
                full_name: Some("  ".to_string()),
            },
        )
        .unwrap();
    assert_eq!(merged.phone.as_deref(), Some("+100"));
    assert_eq!(merged.email.as_deref(), Some("bob@example.com"));
    assert!(merged.full_name.is_none());
}

#[test]
fn list_leads_paginates_in_creation_order() {
    let conn = open_db_in_memory().unwrap();
    let leads = LeadService::new(SqliteLeadRepository::try_new(&conn).unwrap());
    for index in 0..5 {
        leads
            .create_lead(&NewLead::new(format!("tg:{index}")))
            .unwrap();
    }

    let page = leads.list_leads(&ListQuery::new(1, 2)).unwrap();
    let ids: Vec<_> = page.iter().map(|lead| lead.external_id.as_str()).collect();
    assert_eq!(ids, vec!["tg:1", "tg:2"]);

    assert_eq!(leads.list_leads(&ListQuery::default()).unwrap().len(), 5);
}
