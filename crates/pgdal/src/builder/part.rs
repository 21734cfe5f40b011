//! Clause parts: the typed fragments a [`Builder`](super::Builder) is made of.
//!
//! A builder holds at most one part per [`PartKind`]. Adding a part of a kind
//! that already exists merges into it (see [`ClausePart::merge`]), and every
//! part knows how to render itself for the statement it belongs to.

use super::StatementKind;

/// Join flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
            JoinKind::Right => "RIGHT",
        }
    }
}

/// A join descriptor.
///
/// `table` may already carry its alias (`"orders o"`, see
/// [`as_alias`](crate::expr::as_alias)) or the alias can be set separately.
/// Without a condition the join renders with no `ON` clause.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Join {
    pub from_alias: Option<String>,
    pub table: String,
    pub alias: Option<String>,
    pub condition: Option<String>,
}

impl Join {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            ..Self::default()
        }
    }

    /// Alias of the left-hand side this join hangs off.
    pub fn from_alias(mut self, alias: &str) -> Self {
        self.from_alias = Some(alias.to_string());
        self
    }

    /// Alias of the joined table.
    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    pub fn on(mut self, condition: &str) -> Self {
        self.condition = Some(condition.to_string());
        self
    }

    fn render(&self, kind: JoinKind) -> String {
        let mut s = format!("{} JOIN {}", kind.as_sql(), self.table);
        if let Some(alias) = &self.alias {
            s.push(' ');
            s.push_str(alias);
        }
        if let Some(condition) = &self.condition {
            s.push_str(" ON ");
            s.push_str(condition);
        }
        s
    }
}

/// How a WHERE entry attaches to the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    And,
    Or,
}

impl Conjunction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        }
    }
}

/// ORDER BY direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// A column paired with its value expression (`?`, `:name`, `?::bit`, `now()`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnValue {
    pub name: String,
    pub expr: String,
}

impl ColumnValue {
    pub fn new(name: &str, expr: &str) -> Self {
        Self {
            name: name.to_string(),
            expr: expr.to_string(),
        }
    }
}

/// Category of a clause part; at most one part of each kind exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartKind {
    Columns,
    Table,
    Joins,
    Where,
    GroupBy,
    Having,
    OrderBy,
    Assignments,
    Raw,
}

/// One typed fragment of a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClausePart {
    /// SELECT list.
    Columns(Vec<String>),
    /// FROM list, or the target table of INSERT/UPDATE/DELETE.
    Table(Vec<String>),
    Joins(Vec<(JoinKind, Join)>),
    Where(Vec<(Conjunction, String)>),
    GroupBy(Vec<String>),
    Having(String),
    OrderBy(Vec<(Direction, Vec<String>)>),
    /// INSERT columns / UPDATE SET pairs.
    Assignments(Vec<ColumnValue>),
    /// Caller-supplied statement text.
    Raw(String),
}

impl ClausePart {
    pub fn kind(&self) -> PartKind {
        match self {
            ClausePart::Columns(_) => PartKind::Columns,
            ClausePart::Table(_) => PartKind::Table,
            ClausePart::Joins(_) => PartKind::Joins,
            ClausePart::Where(_) => PartKind::Where,
            ClausePart::GroupBy(_) => PartKind::GroupBy,
            ClausePart::Having(_) => PartKind::Having,
            ClausePart::OrderBy(_) => PartKind::OrderBy,
            ClausePart::Assignments(_) => PartKind::Assignments,
            ClausePart::Raw(_) => PartKind::Raw,
        }
    }

    /// Fold `other` into `self`.
    ///
    /// List parts accumulate entries in call order. ORDER BY entries of a
    /// direction already present join that entry's column list. HAVING and raw
    /// text are replaced.
    pub fn merge(&mut self, other: ClausePart) {
        match (self, other) {
            (ClausePart::Columns(a), ClausePart::Columns(b))
            | (ClausePart::Table(a), ClausePart::Table(b))
            | (ClausePart::GroupBy(a), ClausePart::GroupBy(b)) => a.extend(b),
            (ClausePart::Joins(a), ClausePart::Joins(b)) => a.extend(b),
            (ClausePart::Where(a), ClausePart::Where(b)) => a.extend(b),
            (ClausePart::Assignments(a), ClausePart::Assignments(b)) => a.extend(b),
            (ClausePart::OrderBy(a), ClausePart::OrderBy(b)) => {
                for (direction, columns) in b {
                    match a.iter_mut().find(|(d, _)| *d == direction) {
                        Some((_, existing)) => existing.extend(columns),
                        None => a.push((direction, columns)),
                    }
                }
            }
            (this, other) => *this = other,
        }
    }

    /// Render this part for a statement of `statement` kind.
    ///
    /// Returns `None` for parts with nothing to render.
    pub fn render(&self, statement: StatementKind) -> Option<String> {
        let sql = match self {
            ClausePart::Columns(cols) => {
                if cols.is_empty() {
                    return None;
                }
                cols.join(", ")
            }
            ClausePart::Table(tables) => {
                if tables.is_empty() {
                    return None;
                }
                tables.join(", ")
            }
            ClausePart::Joins(joins) => {
                if joins.is_empty() {
                    return None;
                }
                joins
                    .iter()
                    .map(|(kind, join)| join.render(*kind))
                    .collect::<Vec<_>>()
                    .join(" ")
            }
            ClausePart::Where(conditions) => render_where(conditions)?,
            ClausePart::GroupBy(cols) => {
                if cols.is_empty() {
                    return None;
                }
                format!("GROUP BY {}", cols.join(", "))
            }
            ClausePart::Having(condition) => format!("HAVING {condition}"),
            ClausePart::OrderBy(entries) => {
                let rendered: Vec<String> = entries
                    .iter()
                    .filter(|(_, cols)| !cols.is_empty())
                    .map(|(dir, cols)| format!("{} {}", cols.join(", "), dir.as_sql()))
                    .collect();
                if rendered.is_empty() {
                    return None;
                }
                format!("ORDER BY {}", rendered.join(", "))
            }
            ClausePart::Assignments(pairs) => {
                if pairs.is_empty() {
                    return None;
                }
                match statement {
                    StatementKind::Insert => {
                        let names: Vec<&str> = pairs.iter().map(|p| p.name.as_str()).collect();
                        let exprs: Vec<&str> = pairs.iter().map(|p| p.expr.as_str()).collect();
                        format!("({}) VALUES ({})", names.join(", "), exprs.join(", "))
                    }
                    _ => pairs
                        .iter()
                        .map(|p| format!("{} = {}", p.name, p.expr))
                        .collect::<Vec<_>>()
                        .join(", "),
                }
            }
            ClausePart::Raw(sql) => sql.clone(),
        };
        Some(sql)
    }
}

/// Each condition is parenthesized; the whole chain gets an extra pair only
/// when there is more than one condition.
fn render_where(conditions: &[(Conjunction, String)]) -> Option<String> {
    if conditions.is_empty() {
        return None;
    }

    let mut sql = String::from("WHERE ");
    let wrap = conditions.len() > 1;
    if wrap {
        sql.push('(');
    }
    for (i, (conjunction, condition)) in conditions.iter().enumerate() {
        if i > 0 {
            sql.push(' ');
            sql.push_str(conjunction.as_sql());
            sql.push(' ');
        }
        sql.push('(');
        sql.push_str(condition);
        sql.push(')');
    }
    if wrap {
        sql.push(')');
    }
    Some(sql)
}
