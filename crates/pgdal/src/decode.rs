//! Row decoding.
//!
//! Every function here drains a [`Cursor`] into one of four shapes: maps keyed
//! by column name, positional arrays, a scalar tuple, or [`Entity`] structs.
//! The cursor is closed on every exit path, including errors.

use crate::entity::{self, Entity};
use crate::error::{OrmError, OrmResult};
use crate::value::{FromValue, Value};
use std::collections::HashMap;
use tokio_postgres::Row;

/// One row keyed by column name.
pub type RowMap = HashMap<String, Value>;

/// A forward-only result cursor.
pub trait Cursor {
    /// Column names in result order.
    fn columns(&self) -> &[String];

    /// Move to the next row. Returns `false` once the rows are exhausted.
    fn advance(&mut self) -> OrmResult<bool>;

    /// Values of the current row, in column order.
    fn values(&mut self) -> OrmResult<Vec<Value>>;

    fn close(&mut self) -> OrmResult<()> {
        Ok(())
    }
}

/// Closes the wrapped cursor when dropped.
struct Closing<C: Cursor> {
    cursor: C,
    closed: bool,
}

impl<C: Cursor> Closing<C> {
    fn new(cursor: C) -> Self {
        Self {
            cursor,
            closed: false,
        }
    }

    fn next_values(&mut self) -> OrmResult<Option<Vec<Value>>> {
        if self.cursor.advance()? {
            self.cursor.values().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Close now, reporting the close error.
    fn finish(mut self) -> OrmResult<()> {
        self.closed = true;
        self.cursor.close()
    }
}

impl<C: Cursor> Drop for Closing<C> {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Err(e) = self.cursor.close() {
                tracing::warn!(target: "pgdal.sql", error = %e, "failed to close cursor");
            }
        }
    }
}

fn to_map(columns: &[String], values: Vec<Value>) -> RowMap {
    columns.iter().cloned().zip(values).collect()
}

// ==================== Untyped ====================

/// All rows as column-name maps.
pub fn query_maps<C: Cursor>(cursor: C) -> OrmResult<Vec<RowMap>> {
    let mut c = Closing::new(cursor);
    let mut rows = Vec::new();
    while let Some(values) = c.next_values()? {
        rows.push(to_map(c.cursor.columns(), values));
    }
    c.finish()?;
    Ok(rows)
}

/// The first row as a column-name map; `None` when there are no rows.
pub fn first_map<C: Cursor>(cursor: C) -> OrmResult<Option<RowMap>> {
    let mut c = Closing::new(cursor);
    let row = c
        .next_values()?
        .map(|values| to_map(c.cursor.columns(), values));
    c.finish()?;
    Ok(row)
}

/// All rows as positional arrays.
pub fn query_arrays<C: Cursor>(cursor: C) -> OrmResult<Vec<Vec<Value>>> {
    let mut c = Closing::new(cursor);
    let mut rows = Vec::new();
    while let Some(values) = c.next_values()? {
        rows.push(values);
    }
    c.finish()?;
    Ok(rows)
}

/// The first row as a positional array; `None` when there are no rows.
pub fn first_array<C: Cursor>(cursor: C) -> OrmResult<Option<Vec<Value>>> {
    let mut c = Closing::new(cursor);
    let row = c.next_values()?;
    c.finish()?;
    Ok(row)
}

// ==================== Scalar ====================

/// Positional binding of one row into a tuple.
pub trait FromValues: Sized {
    const ARITY: usize;

    fn from_values(columns: &[String], values: Vec<Value>) -> OrmResult<Self>;
}

macro_rules! impl_from_values {
    ($n:expr; $($t:ident),+) => {
        impl<$($t: FromValue),+> FromValues for ($($t,)+) {
            const ARITY: usize = $n;

            fn from_values(columns: &[String], values: Vec<Value>) -> OrmResult<Self> {
                if values.len() != Self::ARITY {
                    return Err(OrmError::decode(
                        columns.join(", "),
                        format!("expected {} columns, found {}", Self::ARITY, values.len()),
                    ));
                }
                let mut names = columns.iter();
                let mut values = values.into_iter();
                Ok(($(
                    {
                        let name = names.next().map_or("", String::as_str);
                        let value = values.next().unwrap_or_default();
                        entity::decode::<$t>(name, value)?
                    },
                )+))
            }
        }
    };
}

impl_from_values!(1; A);
impl_from_values!(2; A, B);
impl_from_values!(3; A, B, C);
impl_from_values!(4; A, B, C, D);
impl_from_values!(5; A, B, C, D, E);
impl_from_values!(6; A, B, C, D, E, F);

/// Bind the first row's columns into `T`. No rows is [`OrmError::NotFound`].
pub fn scan<T: FromValues, C: Cursor>(cursor: C) -> OrmResult<T> {
    let mut c = Closing::new(cursor);
    let values = c
        .next_values()?
        .ok_or_else(|| OrmError::not_found("scan returned no rows"))?;
    let out = T::from_values(c.cursor.columns(), values)?;
    c.finish()?;
    Ok(out)
}

// ==================== Typed ====================

/// All rows as entities. Columns without a matching field are ignored.
pub fn load<T: Entity + Default, C: Cursor>(cursor: C) -> OrmResult<Vec<T>> {
    let mut c = Closing::new(cursor);
    let mut out = Vec::new();
    while let Some(values) = c.next_values()? {
        let mut item = T::default();
        entity::apply_row(&mut item, c.cursor.columns(), values)?;
        out.push(item);
    }
    c.finish()?;
    Ok(out)
}

/// The first row as an entity; `None` when there are no rows.
pub fn load_one<T: Entity + Default, C: Cursor>(cursor: C) -> OrmResult<Option<T>> {
    let mut c = Closing::new(cursor);
    let item = match c.next_values()? {
        Some(values) => {
            let mut item = T::default();
            entity::apply_row(&mut item, c.cursor.columns(), values)?;
            Some(item)
        }
        None => None,
    };
    c.finish()?;
    Ok(item)
}

// ==================== Cursors ====================

/// Cursor over rows held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCursor {
    columns: Vec<String>,
    rows: std::vec::IntoIter<Vec<Value>>,
    current: Option<Vec<Value>>,
    closed: bool,
}

impl MemoryCursor {
    pub fn new(columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows.into_iter(),
            current: None,
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Cursor for MemoryCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn advance(&mut self) -> OrmResult<bool> {
        self.current = self.rows.next();
        Ok(self.current.is_some())
    }

    fn values(&mut self) -> OrmResult<Vec<Value>> {
        self.current
            .take()
            .ok_or_else(|| OrmError::decode("*", "cursor is not positioned on a row"))
    }

    fn close(&mut self) -> OrmResult<()> {
        self.closed = true;
        Ok(())
    }
}

/// Cursor over rows returned by `tokio-postgres`.
pub struct RowsCursor {
    columns: Vec<String>,
    rows: std::vec::IntoIter<Row>,
    current: Option<Row>,
}

impl RowsCursor {
    pub fn new(rows: Vec<Row>) -> Self {
        let columns = rows
            .first()
            .map(|r| r.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();
        Self {
            columns,
            rows: rows.into_iter(),
            current: None,
        }
    }
}

impl Cursor for RowsCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn advance(&mut self) -> OrmResult<bool> {
        self.current = self.rows.next();
        Ok(self.current.is_some())
    }

    fn values(&mut self) -> OrmResult<Vec<Value>> {
        let row = self
            .current
            .as_ref()
            .ok_or_else(|| OrmError::decode("*", "cursor is not positioned on a row"))?;
        (0..row.len())
            .map(|i| {
                row.try_get::<_, Value>(i)
                    .map_err(|e| OrmError::decode(row.columns()[i].name(), e.to_string()))
            })
            .collect()
    }
}
