//! Statement builder example for pgdal
//!
//! Run with: cargo run --example builder -p pgdal
//!
//! Builds statements without touching a database and prints the resolved
//! SQL with its bound values.

use pgdal::prelude::*;

fn show(label: &str, b: &Builder) {
    println!("{label}:\n  {}\n  {:?}\n", b.sql(), b.values());
}

fn main() -> OrmResult<()> {
    // ============================================
    // SELECT
    // ============================================
    let customer = as_alias("c.name", "customer");
    let mut b = Builder::new();
    b.select(&["o.id", &customer, "o.total"])
        .from("orders o")
        .inner_join(Join::new("customers").alias("c").on("c.id = o.customer_id"))
        .where_(&and([gte("o.total", ":min"), eq("o.status", "?")]))
        .or_where("o.priority = ?")
        .order_desc(&["o.created_at"])
        .first_result(21)
        .max_results(20)
        .set_parameter("min", 100)
        .set_parameter(0, "open")
        .set_parameter(1, true)
        .build()?;
    show("select", &b);

    let count = b.count_statement()?;
    println!("count:\n  {}\n  {:?}\n", count.sql, count.values);

    // ============================================
    // Grouping
    // ============================================
    let mut b = Builder::new();
    b.select(&["status", "COUNT(*)"])
        .from("orders")
        .group_by(&["status"])
        .having("COUNT(*) > ?")
        .set_parameter(0, 5)
        .build()?;
    show("group by", &b);

    // ============================================
    // INSERT / UPDATE / DELETE
    // ============================================
    let mut b = Builder::new();
    b.insert("orders")
        .columns(&["customer_id", "total"])
        .column("created_at", "now()")
        .returning_id()
        .set_parameter(0, 7)
        .set_parameter(1, 250)
        .build()?;
    show("insert", &b);

    let mut b = Builder::new();
    b.update("orders")
        .set("status", ":status")
        .sets(&["total"])
        .where_(&or([eq("id", "?"), lt("total", "0")]))
        .set_parameter("status", "shipped")
        .set_parameter(0, 300)
        .set_parameter(1, 42)
        .build()?;
    show("update", &b);

    let mut b = Builder::new();
    b.delete("orders")
        .where_("status = :status")
        .set_parameter("status", "cancelled")
        .build()?;
    show("delete", &b);

    // ============================================
    // Raw SQL
    // ============================================
    let mut b = Builder::new();
    b.raw("SELECT * FROM orders WHERE tags @> :tags::text[] AND id > ?")
        .set_parameter("tags", "{rush}")
        .set_parameter(0, 10)
        .build()?;
    show("raw", &b);

    Ok(())
}
