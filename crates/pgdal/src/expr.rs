//! Small string helpers for condition and table expressions.
//!
//! ```ignore
//! use pgdal::expr::{and, eq, gt, neq, or};
//!
//! let cond = and([or([eq("a", "?"), neq("b", "?")]), gt("c", ":min")]);
//! assert_eq!(cond, "((a = ? OR b != ?) AND c > :min)");
//! ```

/// `"name alias"`.
pub fn as_alias(name: &str, alias: &str) -> String {
    format!("{name} {alias}")
}

/// Join expressions with AND, parenthesized when there is more than one.
pub fn and<I, S>(exprs: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    join(exprs, " AND ")
}

/// Join expressions with OR, parenthesized when there is more than one.
pub fn or<I, S>(exprs: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    join(exprs, " OR ")
}

pub fn eq(column: &str, placeholder: &str) -> String {
    compare(column, "=", placeholder)
}

pub fn neq(column: &str, placeholder: &str) -> String {
    compare(column, "!=", placeholder)
}

pub fn gt(column: &str, placeholder: &str) -> String {
    compare(column, ">", placeholder)
}

pub fn gte(column: &str, placeholder: &str) -> String {
    compare(column, ">=", placeholder)
}

pub fn lt(column: &str, placeholder: &str) -> String {
    compare(column, "<", placeholder)
}

pub fn lte(column: &str, placeholder: &str) -> String {
    compare(column, "<=", placeholder)
}

fn compare(column: &str, op: &str, placeholder: &str) -> String {
    format!("{column} {op} {placeholder}")
}

fn join<I, S>(exprs: I, sep: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let parts: Vec<S> = exprs.into_iter().collect();
    let joined = parts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(sep);
    if parts.len() > 1 {
        format!("({joined})")
    } else {
        joined
    }
}
