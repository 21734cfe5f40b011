use pgdal::{
    Builder, ConnectionConfig, ConnectionRegistry, Entity, OrmError, OrmResult, Session, Value,
};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio_postgres::NoTls;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
struct Details {
    color: String,
}

#[derive(Debug, Clone, PartialEq, Default, Entity)]
struct Item {
    #[dal("id, autoincrement")]
    id: i64,
    name: String,
    price: i32,
    #[dal("details, jsonb")]
    details: Option<Details>,
}

fn database_url(test: &str) -> Option<String> {
    dotenvy::dotenv().ok();
    match std::env::var("DATABASE_URL") {
        Ok(v) => Some(v),
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping {test}");
            None
        }
    }
}

fn unique_table() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before UNIX_EPOCH")
        .as_nanos();
    format!("pgdal_items_{}_{}", std::process::id(), nanos)
}

async fn connect(url: &str) -> OrmResult<tokio_postgres::Client> {
    let (client, connection) = tokio_postgres::connect(url, NoTls)
        .await
        .map_err(OrmError::from_db_error)?;
    tokio::spawn(async move {
        let _ = connection.await;
    });
    Ok(client)
}

async fn insert_item(
    session: &Session<&tokio_postgres::Client>,
    table: &str,
    item: &Item,
) -> OrmResult<i64> {
    let mut b = Builder::new();
    b.insert(table).entity(item)?.returning_id().build()?;
    let (id,): (i64,) = session.scan(&b).await?;
    Ok(id)
}

#[tokio::test]
async fn session_roundtrip() -> OrmResult<()> {
    let Some(url) = database_url("session_roundtrip") else {
        return Ok(());
    };
    let client = connect(&url).await?;
    let table = unique_table();

    client
        .batch_execute(&format!(
            "CREATE TEMP TABLE {table} (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                price INTEGER NOT NULL,
                details JSONB
            )"
        ))
        .await
        .map_err(OrmError::from_db_error)?;

    let session = Session::new(&client);

    let first = Item {
        name: "lamp".into(),
        price: 40,
        details: Some(Details {
            color: "red".into(),
        }),
        ..Default::default()
    };
    let lamp_id = insert_item(&session, &table, &first).await?;
    assert!(lamp_id > 0);

    for (name, price) in [("desk", 120), ("chair", 75)] {
        let item = Item {
            name: name.into(),
            price,
            ..Default::default()
        };
        insert_item(&session, &table, &item).await?;
    }

    // query into maps
    let mut b = Builder::new();
    b.select(&["name", "price"])
        .from(&table)
        .where_("price > :min")
        .order_asc(&["price"])
        .set_parameter("min", 50)
        .build()?;
    let rows = session.query(&b).await?;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], Value::from("chair"));
    assert_eq!(rows[1]["price"], Value::Int(120));

    // typed structs
    let mut b = Builder::new();
    b.select(&["*"])
        .from(&table)
        .where_("id = ?")
        .set_parameter(0, lamp_id)
        .build()?;
    let items: Vec<Item> = session.query_type(&b).await?;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, lamp_id);
    assert_eq!(items[0].details.as_ref().map(|d| d.color.as_str()), Some("red"));

    let lamp: Option<Item> = session.first_result_type(&b).await?;
    assert_eq!(lamp.map(|i| i.name), Some("lamp".to_string()));

    // first result of an empty query
    let mut b = Builder::new();
    b.select(&["id"]).from(&table).where_("price < 0").build()?;
    assert!(session.first_result(&b).await?.is_none());
    assert!(session.first_result_array(&b).await?.is_none());

    // paged query with total count
    let mut b = Builder::new();
    b.select(&["id", "name"])
        .from(&table)
        .order_asc(&["id"])
        .first_result(2)
        .max_results(1)
        .build()?;
    let (page, total) = session.count_query_array(&b).await?;
    assert_eq!(total, 3);
    assert_eq!(page.len(), 1);
    assert_eq!(page[0][1], Value::from("desk"));

    // update through the entity
    let mut changed = items[0].clone();
    changed.price = 45;
    let mut b = Builder::new();
    b.update(&table).entity_by_id(&changed)?.build()?;
    assert_eq!(session.exec(&b).await?, 1);

    let mut b = Builder::new();
    b.select(&["price"])
        .from(&table)
        .where_("id = ?")
        .set_parameter(0, lamp_id)
        .build()?;
    let (price,): (i32,) = session.scan(&b).await?;
    assert_eq!(price, 45);

    // numeric and bit columns
    let mut b = Builder::new();
    b.raw(&format!("SELECT SUM(id) AS total, ?::bit(3) AS flags FROM {table}"))
        .set_parameter(0, "101")
        .build()?;
    let row = session.first_result(&b).await?.expect("one aggregate row");
    assert!(matches!(row["total"], Value::Numeric(_)));
    assert_eq!(row["flags"], Value::from("101"));
    let (total, _): (i64, String) = session.scan(&b).await?;
    assert!(total >= lamp_id);

    // delete
    let mut b = Builder::new();
    b.delete(&table)
        .where_("price < ?")
        .set_parameter(0, 100)
        .build()?;
    assert_eq!(session.exec(&b).await?, 2);

    Ok(())
}

#[tokio::test]
async fn session_in_transaction() -> OrmResult<()> {
    let Some(url) = database_url("session_in_transaction") else {
        return Ok(());
    };
    let mut client = connect(&url).await?;
    let table = unique_table();

    client
        .batch_execute(&format!(
            "CREATE TEMP TABLE {table} (id BIGSERIAL PRIMARY KEY, name TEXT NOT NULL)"
        ))
        .await
        .map_err(OrmError::from_db_error)?;

    {
        let tx = client.transaction().await.map_err(OrmError::from_db_error)?;
        let session = Session::new(&tx);

        let mut b = Builder::new();
        b.insert(&table)
            .column("name", "?")
            .set_parameter(0, "draft")
            .build()?;
        assert_eq!(session.exec(&b).await?, 1);
        // dropped without commit
    }

    let session = Session::new(&client);
    let mut b = Builder::new();
    b.select(&["id"]).from(&table).build()?;
    let (rows, total) = session.count_query(&b).await?;
    assert_eq!(total, 0);
    assert!(rows.is_empty());

    Ok(())
}

#[tokio::test]
async fn registry_sessions() -> OrmResult<()> {
    let Some(url) = database_url("registry_sessions") else {
        return Ok(());
    };
    let config = ConnectionConfig::from_url(&url)?.max_pool_size(2);

    let registry = ConnectionRegistry::new();
    registry.add_single_db(&config).await?;
    registry.add_db("reporting", &config).await?;
    assert_eq!(registry.names(), vec!["DAL_UNIQUE", "reporting"]);

    let mut b = Builder::new();
    b.raw("SELECT ?::int8 + ?::int8")
        .set_parameter(0, 2)
        .set_parameter(1, 3)
        .build()?;

    let session = registry.single_session().await?;
    let (sum,): (i64,) = session.scan(&b).await?;
    assert_eq!(sum, 5);

    let session = registry.session("reporting").await?;
    let row = session.first_result_array(&b).await?;
    assert_eq!(row, Some(vec![Value::Int(5)]));

    assert!(registry.session("missing").await.is_err());
    Ok(())
}
