//! Placeholder resolution: `?` / `:name` → `$1, $2, ...`.
//!
//! Positional and named placeholders share one running ordinal in the order
//! they appear, so `a = ? AND b = :b AND c = ?` becomes
//! `a = $1 AND b = $2 AND c = $3` with values `[p0, b, p1]`.

use crate::error::{OrmError, OrmResult};
use crate::param::Params;
use crate::value::Value;
use regex::Regex;
use std::sync::OnceLock;

/// Final SQL text plus the values in marker order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resolved {
    pub sql: String,
    pub values: Vec<Value>,
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER_RE.get_or_init(|| {
        Regex::new(r"\?|:([A-Za-z_\-]+)").expect("invalid built-in placeholder regex")
    })
}

/// Rewrite `sql` into `$n` markers and collect the bound values in order.
///
/// Positional lookups start at index 0. When the first `?` finds no index 0
/// but an index 1 is bound, the whole statement is read 1-based instead.
pub fn resolve(sql: &str, params: &Params) -> OrmResult<Resolved> {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut values = Vec::new();
    let mut last = 0;
    let mut positional = 0usize;
    let mut base: Option<usize> = None;

    for caps in placeholder_regex().captures_iter(sql) {
        let Some(whole) = caps.get(0) else { continue };

        let value = match caps.get(1) {
            // `?::bit`, `now()::date`: a colon after a colon is a cast.
            Some(_) if sql[..whole.start()].ends_with(':') => continue,
            Some(name) => params
                .name(name.as_str())
                .ok_or_else(|| OrmError::ParameterName(name.as_str().to_string()))?,
            None => {
                let base = *base.get_or_insert_with(|| {
                    if params.index(0).is_none() && params.index(1).is_some() {
                        1
                    } else {
                        0
                    }
                });
                let index = positional + base;
                let value = params
                    .index(index)
                    .ok_or(OrmError::ParameterIndex(index))?;
                positional += 1;
                value
            }
        };

        values.push(value.clone());
        out.push_str(&sql[last..whole.start()]);
        out.push('$');
        out.push_str(&values.len().to_string());
        last = whole.end();
    }

    out.push_str(&sql[last..]);
    Ok(Resolved { sql: out, values })
}
