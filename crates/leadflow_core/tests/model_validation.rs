use leadflow_core::{
    Contact, ContactDetails, ContactStatus, Lead, LeadHints, NewLead, NewOperator, NewSource,
    Operator, OperatorUpdate, OperatorWithLoad, ValidationError,
};
use uuid::Uuid;

fn operator(max_load: u32, is_active: bool) -> Operator {
    Operator {
        id: Uuid::new_v4(),
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        is_active,
        max_load,
        created_at: 1,
        updated_at: 1,
    }
}

#[test]
fn new_operator_requires_name_and_email_shape() {
    assert!(NewOperator::new("Alice", "alice@example.com").validate().is_ok());
    assert_eq!(
        NewOperator::new("   ", "alice@example.com").validate(),
        Err(ValidationError::BlankField("name"))
    );
    assert!(matches!(
        NewOperator::new("Alice", "alice@localhost").validate(),
        Err(ValidationError::InvalidEmail { field: "email", .. })
    ));
}

#[test]
fn new_operator_defaults_to_active_with_capacity_ten() {
    let input = NewOperator::new("Alice", "alice@example.com");
    assert!(input.is_active);
    assert_eq!(input.max_load, 10);
}

#[test]
fn operator_update_validates_only_present_fields() {
    assert!(OperatorUpdate::default().validate().is_ok());
    let update = OperatorUpdate {
        email: Some("broken".to_string()),
        ..OperatorUpdate::default()
    };
    assert!(update.validate().is_err());
}

#[test]
fn capacity_is_strictly_below_max_load() {
    let view = OperatorWithLoad::new(operator(2, true), 1);
    assert!(view.has_capacity());
    assert!(view.is_available());

    let full = OperatorWithLoad::new(operator(2, true), 2);
    assert!(!full.has_capacity());

    let zero_capacity = OperatorWithLoad::new(operator(0, true), 0);
    assert!(!zero_capacity.is_available());

    let inactive = OperatorWithLoad::new(operator(5, false), 0);
    assert!(inactive.has_capacity());
    assert!(!inactive.is_available());
}

#[test]
fn new_source_requires_bot_token() {
    assert_eq!(
        NewSource::new("Telegram", " ").validate(),
        Err(ValidationError::BlankField("bot_token"))
    );
}

#[test]
fn hints_are_trimmed_and_blank_values_dropped() {
    let hints = LeadHints {
        phone: Some("  +100 ".to_string()),
        email: Some("   ".to_string()),
        full_name: None,
    };
    let normalized = hints.normalized();
    assert_eq!(normalized.phone.as_deref(), Some("+100"));
    assert!(normalized.email.is_none());

    let lead = NewLead::from_hints("tg:1", &hints);
    assert_eq!(lead.phone.as_deref(), Some("+100"));
    assert!(lead.email.is_none());
}

#[test]
fn missing_from_only_offers_empty_fields() {
    let lead = Lead {
        id: Uuid::new_v4(),
        external_id: "tg:1".to_string(),
        phone: Some("+100".to_string()),
        email: Some(String::new()),
        full_name: None,
        notes: None,
        created_at: 1,
        updated_at: 1,
    };
    let hints = LeadHints {
        phone: Some("+200".to_string()),
        email: Some("bob@example.com".to_string()),
        full_name: Some("Bob".to_string()),
    };

    let missing = lead.missing_from(&hints);
    assert!(missing.phone.is_none());
    assert_eq!(missing.email.as_deref(), Some("bob@example.com"));
    assert_eq!(missing.full_name.as_deref(), Some("Bob"));
    assert!(lead.missing_from(&LeadHints::default()).is_empty());
}

#[test]
fn contact_closure_must_match_status() {
    let mut contact = Contact {
        id: Uuid::new_v4(),
        lead_id: Uuid::new_v4(),
        source_id: Uuid::new_v4(),
        operator_id: None,
        message: None,
        status: ContactStatus::Closed,
        closed_at: None,
        created_at: 1,
        updated_at: 1,
    };
    assert_eq!(contact.validate(), Err(ValidationError::InconsistentClosure));

    contact.closed_at = Some(2);
    assert!(contact.validate().is_ok());
    assert!(!contact.is_active());
}

#[test]
fn serialized_field_names_are_stable() {
    let view = OperatorWithLoad::new(operator(3, true), 1);
    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["max_load"], 3);
    assert_eq!(json["current_load"], 1);
    assert_eq!(json["is_active"], true);

    let details = ContactDetails {
        contact: Contact {
            id: Uuid::new_v4(),
            lead_id: Uuid::new_v4(),
            source_id: Uuid::new_v4(),
            operator_id: None,
            message: Some("hello".to_string()),
            status: ContactStatus::New,
            closed_at: None,
            created_at: 1,
            updated_at: 1,
        },
        lead_external_id: "tg:1".to_string(),
        lead_phone: None,
        lead_email: None,
        operator_name: None,
        source_name: "Telegram".to_string(),
    };
    let json = serde_json::to_value(&details).unwrap();
    assert_eq!(json["status"], "new");
    assert_eq!(json["lead_external_id"], "tg:1");
    assert!(json["operator_id"].is_null());

    let parsed: ContactDetails = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, details);
}
