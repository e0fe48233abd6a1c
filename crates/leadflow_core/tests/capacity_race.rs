use leadflow_core::db::open_db;
use leadflow_core::{
    CapacityGuard, ContactRepository, ContactService, CreateContactRequest, DistributionService,
    LeadRepository, NewContact, NewLead, NewOperator, NewSource, Operator, OperatorRepository,
    Source, SourceRepository, SqliteContactRepository, SqliteLeadRepository,
    SqliteOperatorRepository, SqliteSourceRepository,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

fn seed(conn: &Connection, max_load: u32) -> (Source, Operator) {
    let sources = SqliteSourceRepository::try_new(conn).unwrap();
    let operators = SqliteOperatorRepository::try_new(conn).unwrap();
    let source = sources
        .create_source(&NewSource::new("Telegram", "bot-token"))
        .unwrap();
    let operator = operators
        .create_operator(&NewOperator::new("Alice", "alice@example.com").with_max_load(max_load))
        .unwrap();
    sources.add_weight(source.id, operator.id, 1).unwrap();
    (source, operator)
}

fn active_load(path: &Path, operator: &Operator) -> u32 {
    let conn = open_db(path).unwrap();
    SqliteContactRepository::try_new(&conn)
        .unwrap()
        .count_active_contacts(operator.id)
        .unwrap()
}

#[test]
fn interleaved_snapshot_selections_overshoot_capacity() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race.sqlite3");
    let first_conn = open_db(&path).unwrap();
    let second_conn = open_db(&path).unwrap();
    let (source, alice) = seed(&first_conn, 2);

    let lead = SqliteLeadRepository::try_new(&first_conn)
        .unwrap()
        .create_lead(&NewLead::new("tg:0"))
        .unwrap();
    SqliteContactRepository::try_new(&first_conn)
        .unwrap()
        .create_contact(&NewContact::new(lead.id, source.id, Some(alice.id)))
        .unwrap();

    let mut picks = Vec::new();
    for conn in [&first_conn, &second_conn] {
        let sources = SqliteSourceRepository::try_new(conn).unwrap();
        let operators = SqliteOperatorRepository::try_new(conn).unwrap();
        let contacts = SqliteContactRepository::try_new(conn).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        // Both decisions observe load = max_load - 1 before either insert lands.
        picks.push(
            DistributionService::new(&sources, &operators, &contacts)
                .select_operator_id(source.id, None, &mut rng)
                .unwrap(),
        );
    }
    assert_eq!(picks, vec![Some(alice.id), Some(alice.id)]);

    for (conn, pick) in [&first_conn, &second_conn].into_iter().zip(picks) {
        SqliteContactRepository::try_new(conn)
            .unwrap()
            .create_contact(&NewContact::new(lead.id, source.id, pick))
            .unwrap();
    }

    assert_eq!(active_load(&path, &alice), 3);
}

#[test]
fn held_write_lock_blocks_serialized_creation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locked.sqlite3");
    let holder = open_db(&path).unwrap();
    let (source, alice) = seed(&holder, 5);

    let mut waiter = open_db(&path).unwrap();
    waiter.busy_timeout(Duration::from_millis(50)).unwrap();

    holder.execute_batch("BEGIN IMMEDIATE;").unwrap();
    {
        let mut contacts = ContactService::with_rng(
            &mut waiter,
            CapacityGuard::Serialized,
            StdRng::seed_from_u64(3),
        )
        .unwrap();
        let err = contacts
            .create_contact(&CreateContactRequest::new("tg:1", source.id))
            .unwrap_err();
        assert!(err.is_busy(), "expected busy error, got {err}");
        assert_eq!(err.code(), "db_busy");
    }
    holder.execute_batch("ROLLBACK;").unwrap();

    let mut contacts =
        ContactService::with_rng(&mut waiter, CapacityGuard::Serialized, StdRng::seed_from_u64(3))
            .unwrap();
    let contact = contacts
        .create_contact(&CreateContactRequest::new("tg:1", source.id))
        .unwrap();
    assert_eq!(contact.operator_id, Some(alice.id));
}

#[test]
fn concurrent_serialized_creations_never_exceed_capacity() {
    const THREADS: u64 = 8;
    const CONTACTS_PER_THREAD: u64 = 3;
    const MAX_LOAD: u32 = 5;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("concurrent.sqlite3");
    let (source, alice) = {
        let conn = open_db(&path).unwrap();
        seed(&conn, MAX_LOAD)
    };

    std::thread::scope(|scope| {
        for thread_index in 0..THREADS {
            let path = path.as_path();
            let source_id = source.id;
            scope.spawn(move || {
                let mut conn = open_db(path).unwrap();
                let mut contacts = ContactService::with_rng(
                    &mut conn,
                    CapacityGuard::Serialized,
                    StdRng::seed_from_u64(thread_index),
                )
                .unwrap();
                for contact_index in 0..CONTACTS_PER_THREAD {
                    contacts
                        .create_contact(&CreateContactRequest::new(
                            format!("tg:{thread_index}:{contact_index}"),
                            source_id,
                        ))
                        .unwrap();
                }
            });
        }
    });

    assert_eq!(active_load(&path, &alice), MAX_LOAD);

    let conn = open_db(&path).unwrap();
    let assigned = SqliteContactRepository::try_new(&conn)
        .unwrap()
        .list_contacts_by_operator(alice.id)
        .unwrap()
        .len();
    let total: i64 = conn
        .query_row("SELECT COUNT(*) FROM contacts;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(assigned, MAX_LOAD as usize);
    assert_eq!(total, (THREADS * CONTACTS_PER_THREAD) as i64);
}
