use pgdal::{Builder, Entity, FieldDescriptor, MemoryCursor, OrmError, Value, decode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
struct Preferences {
    theme: String,
    alerts: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Entity)]
struct Customer {
    #[dal("id, autoincrement")]
    id: i64,
    #[dal("full_name")]
    name: String,
    #[dal(" email ")]
    email: Option<String>,
    #[dal("preferences, jsonb")]
    preferences: Option<Preferences>,
    #[dal(",omitted")]
    cached_rank: i32,
    active: bool,
    r#type: String,
}

fn sample() -> Customer {
    Customer {
        id: 41,
        name: "Ada".into(),
        email: None,
        preferences: Some(Preferences {
            theme: "dark".into(),
            alerts: true,
        }),
        cached_rank: 3,
        active: true,
        r#type: "retail".into(),
    }
}

#[test]
fn derived_descriptors() {
    let fields = Customer::fields();
    let columns: Vec<&str> = fields.iter().map(|f| f.column).collect();
    assert_eq!(
        columns,
        vec![
            "id",
            "full_name",
            "email",
            "preferences",
            "cached_rank",
            "active",
            "type"
        ]
    );
    assert!(fields[0].flags.autoincrement);
    assert!(fields[3].flags.jsonb);
    assert!(fields[4].flags.omitted);
    assert_eq!(fields[4].name, "cached_rank");
    assert!(std::ptr::eq(Customer::fields(), fields));
}

#[test]
fn derived_descriptors_match_runtime_tags() {
    let tagged = [
        ("id", "id, autoincrement"),
        ("name", "full_name"),
        ("email", " email "),
        ("preferences", "preferences, jsonb"),
        ("cached_rank", ",omitted"),
    ];
    for ((name, tag), derived) in tagged.into_iter().zip(Customer::fields()) {
        assert_eq!(FieldDescriptor::from_tag(name, tag).unwrap(), *derived);
    }
    assert_eq!(Customer::fields()[6], FieldDescriptor::new("type", "type"));
    assert!(FieldDescriptor::from_tag("x", "x, jsonx").is_err());
}

#[test]
fn insert_from_entity() {
    let mut b = Builder::new();
    b.insert("customers")
        .entity(&sample())
        .unwrap()
        .returning_id()
        .build()
        .unwrap();

    assert_eq!(
        b.sql(),
        "INSERT INTO customers(full_name, email, preferences, active, type) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id"
    );
    assert_eq!(
        b.values(),
        &[
            Value::from("Ada"),
            Value::Null,
            Value::Text(r#"{"theme":"dark","alerts":true}"#.into()),
            Value::Bool(true),
            Value::from("retail"),
        ]
    );
}

#[test]
fn null_json_field_is_left_out() {
    let customer = Customer {
        preferences: None,
        ..sample()
    };

    let mut b = Builder::new();
    b.insert("customers").entity(&customer).unwrap().build().unwrap();
    assert_eq!(
        b.sql(),
        "INSERT INTO customers(full_name, email, active, type) VALUES ($1, $2, $3, $4)"
    );
}

#[test]
fn update_by_id_from_entity() {
    let mut b = Builder::new();
    b.update("customers")
        .entity_by_id(&sample())
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(
        b.sql(),
        "UPDATE customers SET full_name = $1, email = $2, preferences = $3, active = $4, type = $5 \
         WHERE (id = $6)"
    );
    assert_eq!(b.values().last(), Some(&Value::Int(41)));
}

#[test]
fn insert_then_load_round_trips() {
    let original = sample();

    let mut b = Builder::new();
    b.insert("customers").entity(&original).unwrap().build().unwrap();

    // Rebuild the row the insert would have written, plus a server-side id.
    let mut columns = vec!["id"];
    let mut row = vec![Value::Int(41)];
    let written = [
        "full_name",
        "email",
        "preferences",
        "active",
        "type",
    ];
    columns.extend(written);
    row.extend(b.values().iter().cloned());
    columns.push("created_at");
    row.push(Value::from("ignored"));

    let loaded: Vec<Customer> = decode::load(MemoryCursor::new(&columns, vec![row])).unwrap();
    assert_eq!(loaded.len(), 1);

    let expected = Customer {
        cached_rank: 0,
        ..original
    };
    assert_eq!(loaded[0], expected);
}

#[test]
fn load_one_and_empty() {
    let none: Option<Customer> =
        decode::load_one(MemoryCursor::new(&["id"], vec![])).unwrap();
    assert_eq!(none, None);

    let one: Option<Customer> = decode::load_one(MemoryCursor::new(
        &["id", "preferences"],
        vec![
            vec![
                Value::Int(1),
                Value::Json(serde_json::json!({"theme": "light", "alerts": false})),
            ],
            vec![Value::Int(2), Value::Null],
        ],
    ))
    .unwrap();
    let one = one.unwrap();
    assert_eq!(one.id, 1);
    assert_eq!(one.preferences.unwrap().theme, "light");
}

#[test]
fn wrong_column_type_is_a_decode_error() {
    let err = decode::load::<Customer, _>(MemoryCursor::new(
        &["active"],
        vec![vec![Value::from("yes")]],
    ))
    .unwrap_err();
    match err {
        OrmError::Decode { column, .. } => assert_eq!(column, "active"),
        other => panic!("unexpected error: {other}"),
    }
}
