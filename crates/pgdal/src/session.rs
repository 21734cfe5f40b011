//! Execution facade: run built statements and decode their rows.
//!
//! ```ignore
//! let mut b = Builder::new();
//! b.select(&["id", "name"]).from("users").where_("active = ?").set_parameter(0, true).build()?;
//!
//! let session = Session::new(&client);
//! let users: Vec<User> = session.query_type(&b).await?;
//!
//! // Same calls inside a transaction.
//! let tx = client.transaction().await?;
//! Session::new(&tx).exec(&update).await?;
//! tx.commit().await?;
//! ```

use crate::builder::Builder;
use crate::client::GenericClient;
use crate::decode::{self, FromValues, RowMap, RowsCursor};
use crate::entity::Entity;
use crate::error::OrmResult;
use crate::resolve::Resolved;
use crate::value::Value;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// Runs built statements over a [`GenericClient`].
pub struct Session<C: GenericClient> {
    client: C,
}

impl<C: GenericClient> Session<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn into_inner(self) -> C {
        self.client
    }

    /// Bind the first row's columns into a tuple.
    pub async fn scan<T: FromValues>(&self, builder: &Builder) -> OrmResult<T> {
        let rows = self.fetch(builder.statement()?).await?;
        decode::scan(RowsCursor::new(rows))
    }

    /// All rows as column-name maps.
    pub async fn query(&self, builder: &Builder) -> OrmResult<Vec<RowMap>> {
        let rows = self.fetch(builder.statement()?).await?;
        decode::query_maps(RowsCursor::new(rows))
    }

    /// All rows as positional arrays.
    pub async fn query_array(&self, builder: &Builder) -> OrmResult<Vec<Vec<Value>>> {
        let rows = self.fetch(builder.statement()?).await?;
        decode::query_arrays(RowsCursor::new(rows))
    }

    /// All rows as entities.
    pub async fn query_type<T: Entity + Default>(&self, builder: &Builder) -> OrmResult<Vec<T>> {
        let rows = self.fetch(builder.statement()?).await?;
        decode::load(RowsCursor::new(rows))
    }

    /// First row as a map; `None` when the query returns nothing.
    pub async fn first_result(&self, builder: &Builder) -> OrmResult<Option<RowMap>> {
        let rows = self.fetch_first(builder.statement()?).await?;
        decode::first_map(RowsCursor::new(rows))
    }

    pub async fn first_result_array(&self, builder: &Builder) -> OrmResult<Option<Vec<Value>>> {
        let rows = self.fetch_first(builder.statement()?).await?;
        decode::first_array(RowsCursor::new(rows))
    }

    pub async fn first_result_type<T: Entity + Default>(
        &self,
        builder: &Builder,
    ) -> OrmResult<Option<T>> {
        let rows = self.fetch_first(builder.statement()?).await?;
        decode::load_one(RowsCursor::new(rows))
    }

    /// Total row count plus the current page, as maps.
    ///
    /// The count ignores ORDER BY and paging. When it is zero the page query
    /// is not run.
    pub async fn count_query(&self, builder: &Builder) -> OrmResult<(Vec<RowMap>, i64)> {
        let Some((rows, count)) = self.counted(builder).await? else {
            return Ok((Vec::new(), 0));
        };
        Ok((decode::query_maps(RowsCursor::new(rows))?, count))
    }

    pub async fn count_query_array(&self, builder: &Builder) -> OrmResult<(Vec<Vec<Value>>, i64)> {
        let Some((rows, count)) = self.counted(builder).await? else {
            return Ok((Vec::new(), 0));
        };
        Ok((decode::query_arrays(RowsCursor::new(rows))?, count))
    }

    pub async fn count_query_type<T: Entity + Default>(
        &self,
        builder: &Builder,
    ) -> OrmResult<(Vec<T>, i64)> {
        let Some((rows, count)) = self.counted(builder).await? else {
            return Ok((Vec::new(), 0));
        };
        Ok((decode::load(RowsCursor::new(rows))?, count))
    }

    /// Execute a statement that returns no rows; yields the affected row count.
    pub async fn exec(&self, builder: &Builder) -> OrmResult<u64> {
        let stmt = builder.statement()?;
        tracing::debug!(target: "pgdal.sql", sql = %stmt.sql, param_count = stmt.values.len(), "exec");
        let params = bind(&stmt.values);
        self.client.execute(&stmt.sql, &params).await
    }

    // ==================== Internals ====================

    async fn fetch(&self, stmt: &Resolved) -> OrmResult<Vec<Row>> {
        tracing::debug!(target: "pgdal.sql", sql = %stmt.sql, param_count = stmt.values.len(), "query");
        let params = bind(&stmt.values);
        let rows = self.client.query(&stmt.sql, &params).await?;
        tracing::trace!(target: "pgdal.sql", rows = rows.len(), "query returned");
        Ok(rows)
    }

    async fn fetch_first(&self, stmt: &Resolved) -> OrmResult<Vec<Row>> {
        tracing::debug!(target: "pgdal.sql", sql = %stmt.sql, param_count = stmt.values.len(), "query first");
        let params = bind(&stmt.values);
        let row = self.client.query_opt(&stmt.sql, &params).await?;
        Ok(row.into_iter().collect())
    }

    async fn counted(&self, builder: &Builder) -> OrmResult<Option<(Vec<Row>, i64)>> {
        let page = builder.statement()?;
        let count_stmt = builder.count_statement()?;
        let (count,): (i64,) = decode::scan(RowsCursor::new(self.fetch(&count_stmt).await?))?;
        if count == 0 {
            return Ok(None);
        }
        let rows = self.fetch(page).await?;
        Ok(Some((rows, count)))
    }
}

fn bind(values: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    values.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}
