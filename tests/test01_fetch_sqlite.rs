#![cfg(feature = "sqlite")]

use chrono::{DateTime, TimeZone, Utc};
use sql_record::prelude::*;

sql_record::record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Account {
        pub id: i64 => r#"db:"id" json:"account_id""#,
        pub name: String => r#"db:"name,omitempty" json:"display""#,
        pub active: bool => r#"db:"active""#,
        pub created: DateTime<Utc> => r#"db:"created""#,
        pub secret: String => r#"db:"-""#,
        pub note: String,
        pub score: f64 => r#"db:"score""#,
    }
}

const SCHEMA: &str = "
    CREATE TABLE accounts (
        id INTEGER PRIMARY KEY,
        name TEXT,
        active INTEGER,
        created TEXT,
        secret TEXT,
        note TEXT,
        score REAL
    );
    INSERT INTO accounts VALUES (1, 'Ann', 1, '2023-05-01 12:00:00 +0000 UTC', 's1', 'n1', 1.5);
    INSERT INTO accounts VALUES (2, 'Bob', 0, '2023-05-02 08:30:00 +0200 CEST', 's2', 'n2', 2.5);
    INSERT INTO accounts VALUES (3, NULL, 1, '2023-05-03 00:00:00 +0000 UTC', 's3', 'n3', 3.5);
";

fn seeded_db() -> Result<DbHandle, SqlRecordError> {
    let db = DbHandle::init("sqlite", "db", ":memory:")?;
    db.execute_batch(SCHEMA)?;
    Ok(db)
}

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

#[test]
fn fetch_one_maps_the_documented_example() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_db()?;
    let mut account = Account::default();
    db.fetch_one(
        &mut account,
        "SELECT '7' AS id, 'Ann' AS name, '1' AS active, '2023-05-01 12:00:00 +0000 UTC' AS created",
        &[],
    )?;
    assert_eq!(account.id, 7);
    assert_eq!(account.name, "Ann");
    assert!(account.active);
    assert_eq!(account.created, utc(2023, 5, 1, 12, 0));
    Ok(())
}

#[test]
fn fetch_one_leaves_unmapped_fields_alone() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_db()?;
    let mut account = Account {
        secret: "keep".into(),
        note: "keep".into(),
        score: 9.0,
        ..Account::default()
    };
    db.fetch_one(&mut account, "SELECT * FROM accounts WHERE id = ?1", &[RowValues::Int(2)])?;
    assert_eq!(account.id, 2);
    assert_eq!(account.name, "Bob");
    assert!(!account.active);
    assert_eq!(account.created, utc(2023, 5, 2, 6, 30));
    // excluded, untagged and unsupported field types are never written
    assert_eq!(account.secret, "keep");
    assert_eq!(account.note, "keep");
    assert!((account.score - 9.0).abs() < f64::EPSILON);
    Ok(())
}

#[test]
fn null_and_missing_columns_keep_current_values() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_db()?;
    let mut account = Account {
        name: "previous".into(),
        active: true,
        ..Account::default()
    };
    db.fetch_one(&mut account, "SELECT id, name FROM accounts WHERE id = 3", &[])?;
    assert_eq!(account.id, 3);
    assert_eq!(account.name, "previous");
    assert!(account.active);
    assert_eq!(account.created, DateTime::<Utc>::default());
    Ok(())
}

#[test]
fn fetch_one_without_rows_is_no_data_found() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_db()?;
    let mut account = Account::default();
    let err = db
        .fetch_one(&mut account, "SELECT * FROM accounts WHERE id = 99", &[])
        .unwrap_err();
    assert!(matches!(err, SqlRecordError::NoDataFound));
    assert_eq!(err.kind(), ErrorKind::NoDataFound);
    assert_eq!(account, Account::default());
    Ok(())
}

#[test]
fn fetch_one_uses_only_the_first_row() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_db()?;
    let mut account = Account::default();
    db.fetch_one(&mut account, "SELECT * FROM accounts ORDER BY id DESC", &[])?;
    assert_eq!(account.id, 3);
    Ok(())
}

#[test]
fn fetch_many_returns_rows_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_db()?;
    let mut accounts: Vec<Account> = Vec::new();
    db.fetch_many(&mut accounts, "SELECT * FROM accounts ORDER BY id DESC", &[])?;
    let ids: Vec<i64> = accounts.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);
    // each record starts from its default, so the NULL name stays empty
    assert_eq!(accounts[0].name, "");
    assert_eq!(accounts[2].name, "Ann");
    Ok(())
}

#[test]
fn fetch_many_without_rows_is_empty_not_an_error() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_db()?;
    let mut accounts: Vec<Account> = Vec::new();
    db.fetch_many(&mut accounts, "SELECT * FROM accounts WHERE id > 100", &[])?;
    assert!(accounts.is_empty());
    Ok(())
}

#[test]
fn fetch_many_appends_to_existing_contents() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_db()?;
    let mut accounts = vec![Account {
        id: 42,
        ..Account::default()
    }];
    db.fetch_many(&mut accounts, "SELECT * FROM accounts WHERE id = ?1", &[RowValues::Int(1)])?;
    let ids: Vec<i64> = accounts.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![42, 1]);
    Ok(())
}

#[test]
fn conversion_failure_aborts_the_whole_fetch() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_db()?;
    db.execute(
        "INSERT INTO accounts (id, name, created) VALUES (?1, ?2, ?3)",
        &[RowValues::Int(4), "Dee".into(), "not-a-date".into()],
    )?;

    let mut accounts: Vec<Account> = Vec::new();
    let err = db
        .fetch_many(&mut accounts, "SELECT * FROM accounts ORDER BY id", &[])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConversionFailed);
    assert!(accounts.is_empty());

    let mut account = Account::default();
    let err = db
        .fetch_one(&mut account, "SELECT 'x7' AS id", &[])
        .unwrap_err();
    match err {
        SqlRecordError::ConversionFailed { column, .. } => assert_eq!(column, "id"),
        other => panic!("unexpected error {other:?}"),
    }
    Ok(())
}

#[test]
fn destination_shape_is_checked() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_db()?;

    let mut accounts: Vec<Account> = Vec::new();
    let err = db
        .fetch_one(&mut accounts, "SELECT * FROM accounts", &[])
        .unwrap_err();
    assert!(matches!(
        err,
        SqlRecordError::ShapeInvalid {
            expected: Shape::Record,
            found: Shape::Sequence
        }
    ));
    assert_eq!(err.to_string(), "destination must be a record reference, got sequence");

    let mut account = Account::default();
    let err = db
        .fetch_many(&mut account, "SELECT * FROM accounts", &[])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ShapeInvalid);
    Ok(())
}

#[test]
fn tag_key_selects_the_annotation() -> Result<(), Box<dyn std::error::Error>> {
    let db = DbHandle::init("sqlite", "json", ":memory:")?;
    assert_eq!(db.tag(), "json");
    let mut account = Account::default();
    db.fetch_one(
        &mut account,
        "SELECT 5 AS account_id, 'Eve' AS display, 'Ann' AS name, 1 AS active",
        &[],
    )?;
    assert_eq!(account.id, 5);
    assert_eq!(account.name, "Eve");
    // `active` has no json annotation
    assert!(!account.active);
    Ok(())
}

#[test]
fn mapping_is_repeatable() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_db()?;
    let first: Account = db.get("SELECT * FROM accounts WHERE id = 2", &[])?;
    let second: Account = db.get("SELECT * FROM accounts WHERE id = 2", &[])?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn typed_helpers_return_owned_values() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_db()?;
    let all: Vec<Account> = db.select("SELECT * FROM accounts ORDER BY id", &[])?;
    assert_eq!(all.len(), 3);

    let missing = db.get::<Account>("SELECT * FROM accounts WHERE id = 0", &[]);
    assert!(matches!(missing, Err(SqlRecordError::NoDataFound)));

    let count: i64 = db.fetch_value("SELECT COUNT(*) FROM accounts", &[])?;
    assert_eq!(count, 3);
    let name: Option<String> = db.fetch_value("SELECT name FROM accounts WHERE id = 3", &[])?;
    assert_eq!(name, None);
    let none = db.fetch_value::<i64>("SELECT id FROM accounts WHERE id = 0", &[]);
    assert!(matches!(none, Err(SqlRecordError::NoDataFound)));
    Ok(())
}

#[test]
fn raw_rows_keep_driver_values() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_db()?;
    let rows = db.fetch_rows("SELECT id, name, score FROM accounts ORDER BY id", &[])?;
    assert_eq!(rows.len(), 3);
    let first = &rows.results[0];
    assert_eq!(first.get("id"), Some(&RowValues::Int(1)));
    assert_eq!(first.get("name"), Some(&RowValues::Text("Ann".into())));
    assert_eq!(first.get("score"), Some(&RowValues::Float(1.5)));
    assert_eq!(rows.results[2].get("name"), Some(&RowValues::Null));
    assert_eq!(
        rows.get_column_names().map(|c| c.as_slice().to_vec()),
        Some(vec!["id".to_string(), "name".to_string(), "score".to_string()])
    );
    Ok(())
}

#[test]
fn timestamp_parameters_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_db()?;
    let when = utc(2024, 2, 29, 23, 59);
    let outcome = db.execute(
        "INSERT INTO accounts (id, name, active, created) VALUES (?1, ?2, ?3, ?4)",
        &[RowValues::Int(10), "Zed".into(), RowValues::Bool(true), when.into()],
    )?;
    assert_eq!(outcome.rows_affected, 1);
    assert_eq!(outcome.last_insert_id, Some(10));

    let account: Account = db.get("SELECT * FROM accounts WHERE id = 10", &[])?;
    assert_eq!(account.created, when);
    assert!(account.active);
    Ok(())
}

#[test]
fn driver_errors_pass_through() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_db()?;
    let mut accounts: Vec<Account> = Vec::new();
    let err = db
        .fetch_many(&mut accounts, "SELECT * FROM no_such_table", &[])
        .unwrap_err();
    assert!(matches!(err, SqlRecordError::SqliteError(_)));
    assert_eq!(err.kind(), ErrorKind::DriverError);
    Ok(())
}
