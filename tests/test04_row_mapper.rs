use chrono::{DateTime, TimeZone, Utc};
use sql_record::helpers::create_test_row;
use sql_record::mapping::{RowMapper, describe, lookup_tag, tag_column};
use sql_record::prelude::*;

sql_record::record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Order {
        pub id: i64 => r#"db:"order_id" api:"id""#,
        pub quantity: i32 => r#"db:"qty""#,
        pub customer: String => r#"db:" customer ,omitempty""#,
        pub paid: bool => r#"db:"paid""#,
        pub placed: DateTime<Utc> => r#"db:"placed_at""#,
        pub internal: String => r#"db:"-" api:"internal""#,
        pub blank: String => r#"db:"""#,
        pub total: Option<i64> => r#"db:"total""#,
    }
}

fn order_row(id: &str, paid: &str) -> Row {
    create_test_row(
        &["order_id", "qty", "customer", "paid", "placed_at", "internal", "total"],
        vec![
            RowValues::Text(id.into()),
            RowValues::Int(2),
            RowValues::Text("acme".into()),
            RowValues::Text(paid.into()),
            RowValues::Text("2023-05-01 14:00:00 +0200 CEST".into()),
            RowValues::Text("hidden".into()),
            RowValues::Int(99),
        ],
    )
}

#[test]
fn descriptor_binds_annotated_fields_only() {
    let descriptor = describe::<Order>("db");
    let columns: Vec<&str> = descriptor
        .bindings()
        .iter()
        .map(|b| b.column.as_str())
        .collect();
    assert_eq!(columns, vec!["order_id", "qty", "customer", "paid", "placed_at", "total"]);

    let api = describe::<Order>("api");
    let columns: Vec<&str> = api.bindings().iter().map(|b| b.column.as_str()).collect();
    assert_eq!(columns, vec!["id", "internal"]);

    assert!(describe::<Order>("xml").is_empty());
}

#[test]
fn tag_helpers_follow_the_annotation_convention() {
    let tags = r#"db:"created_at,omitempty" json:"created""#;
    assert_eq!(lookup_tag(tags, "db").as_deref(), Some("created_at,omitempty"));
    assert_eq!(lookup_tag(tags, "json").as_deref(), Some("created"));
    assert_eq!(lookup_tag(tags, "yaml").as_deref(), None);
    assert_eq!(tag_column(tags, "db").as_deref(), Some("created_at"));
    assert_eq!(tag_column(r#"db:"-""#, "db").as_deref(), None);
    assert_eq!(tag_column(r#"db:"say \"hi\"" json:"x""#, "db").as_deref(), Some(r#"say "hi""#));
}

#[test]
fn mapper_coerces_every_bound_field() {
    let mapper = RowMapper::new("db");
    let order: Order = mapper.map_new(&order_row("17", "1")).unwrap();
    assert_eq!(order.id, 17);
    assert_eq!(order.quantity, 2);
    assert_eq!(order.customer, "acme");
    assert!(order.paid);
    assert_eq!(order.placed, Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap());
    assert_eq!(order.internal, "");
    // Option fields have no coercion rule
    assert_eq!(order.total, None);
}

#[test]
fn mapping_into_an_existing_record_keeps_unbound_state() {
    let mapper = RowMapper::new("db");
    let mut order = Order {
        internal: "mine".into(),
        blank: "mine".into(),
        ..Order::default()
    };
    mapper.map_row(&order_row("5", "true"), &mut order).unwrap();
    assert_eq!(order.id, 5);
    assert!(!order.paid);
    assert_eq!(order.internal, "mine");
    assert_eq!(order.blank, "mine");
}

#[test]
fn result_sets_map_in_order_or_not_at_all() {
    let mapper = RowMapper::new("db");
    let mut rows = ResultSet::default();
    rows.add_row(order_row("1", "1"));
    rows.add_row(order_row("2", "0"));
    let orders: Vec<Order> = mapper.map_result_set(&rows).unwrap();
    assert_eq!(orders.iter().map(|o| o.id).collect::<Vec<_>>(), vec![1, 2]);

    rows.add_row(order_row("three", "1"));
    let err = mapper.map_result_set::<Order>(&rows).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConversionFailed);
}

#[test]
fn scalars_read_with_the_same_rules() {
    let raw = RowValues::Text("1".into());
    assert!(bool::from_row_value("flag", &raw).unwrap());
    assert_eq!(i64::from_row_value("n", &raw).unwrap(), 1);
    assert_eq!(Option::<i64>::from_row_value("n", &RowValues::Null).unwrap(), None);
    assert!(String::from_row_value("s", &RowValues::Null).is_err());
}
