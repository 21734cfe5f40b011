//! Typed mapping between structs and columns.
//!
//! A type implementing [`Entity`] exposes a static list of
//! [`FieldDescriptor`]s (field name, column name, [`FieldFlags`]) plus
//! index-based accessors. The list is normally produced by
//! `#[derive(Entity)]`:
//!
//! ```ignore
//! #[derive(Entity, Default)]
//! struct User {
//!     #[dal("id, autoincrement")]
//!     id: i64,
//!     #[dal("user_name")]
//!     name: String,
//!     #[dal("settings, jsonb")]
//!     settings: Option<Settings>,
//!     #[dal(",omitted")]
//!     scratch: String,
//! }
//! ```
//!
//! Tag syntax is `<column>[,autoincrement][,omitted][,json|jsonb]`. Spaces are
//! ignored and an empty column name falls back to the field name.
//!
//! Generated INSERT / UPDATE column lists skip `autoincrement` and `omitted`
//! fields. JSON fields cross the boundary as JSON text, and a JSON field whose
//! value serializes to `null` is left out entirely. Whatever is mapped to the
//! `id` column is coerced to a 64-bit integer.

use crate::error::{OrmError, OrmResult};
use crate::value::{FromValue, ToValue, Value};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Per-field flags. This is the complete set the tag syntax accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldFlags {
    /// Server-generated; never written by INSERT or UPDATE.
    pub autoincrement: bool,
    /// Never part of generated SQL.
    pub omitted: bool,
    pub json: bool,
    pub jsonb: bool,
}

impl FieldFlags {
    pub const fn is_json(&self) -> bool {
        self.json || self.jsonb
    }

    /// Whether generated INSERT / UPDATE statements include the field.
    pub const fn is_writable(&self) -> bool {
        !self.autoincrement && !self.omitted
    }
}

/// Column mapping of one struct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub column: &'static str,
    pub flags: FieldFlags,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, column: &'static str) -> Self {
        Self {
            name,
            column,
            flags: FieldFlags {
                autoincrement: false,
                omitted: false,
                json: false,
                jsonb: false,
            },
        }
    }

    pub const fn autoincrement(mut self) -> Self {
        self.flags.autoincrement = true;
        self
    }

    pub const fn omitted(mut self) -> Self {
        self.flags.omitted = true;
        self
    }

    pub const fn json(mut self) -> Self {
        self.flags.json = true;
        self
    }

    pub const fn jsonb(mut self) -> Self {
        self.flags.jsonb = true;
        self
    }

    /// Parse a column tag for field `name`.
    ///
    /// This is the runtime form of the `#[dal("...")]` attribute, for
    /// hand-written [`Entity`] impls. `#[derive(Entity)]` applies the same
    /// rules at compile time.
    ///
    /// ```ignore
    /// let d = FieldDescriptor::from_tag("id", "id, autoincrement")?;
    /// assert!(d.flags.autoincrement);
    /// ```
    pub fn from_tag(name: &'static str, tag: &'static str) -> OrmResult<Self> {
        let mut segments = tag.split(',').map(str::trim);
        let column = match segments.next() {
            Some(c) if !c.is_empty() => c,
            _ => name,
        };

        let mut descriptor = Self::new(name, column);
        for flag in segments {
            descriptor = match flag {
                "" => descriptor,
                "autoincrement" => descriptor.autoincrement(),
                "omitted" => descriptor.omitted(),
                "json" => descriptor.json(),
                "jsonb" => descriptor.jsonb(),
                other => {
                    return Err(OrmError::validation(format!(
                        "unknown flag `{other}` in tag of field `{name}`"
                    )));
                }
            };
        }
        Ok(descriptor)
    }
}

/// A struct mapped to table columns.
///
/// Field indices are positions in [`fields`](Entity::fields).
pub trait Entity {
    fn fields() -> &'static [FieldDescriptor];

    /// Encoded value of field `index`. `None` leaves the field out of
    /// generated SQL.
    fn field_value(&self, index: usize) -> OrmResult<Option<Value>>;

    /// Store a decoded column value into field `index`.
    fn set_field(&mut self, index: usize, value: Value) -> OrmResult<()>;

    fn column_index(column: &str) -> Option<usize> {
        Self::fields().iter().position(|f| f.column == column)
    }
}

// ==================== Field codecs ====================

/// Encode a plain field.
pub fn encode<T: ToValue>(value: &T) -> OrmResult<Option<Value>> {
    Ok(Some(value.to_value()))
}

/// Encode a `json` / `jsonb` field as JSON text; `null` is skipped.
pub fn encode_json<T: Serialize>(column: &str, value: &T) -> OrmResult<Option<Value>> {
    let json = serde_json::to_value(value)
        .map_err(|e| OrmError::Serialization(format!("column {column}: {e}")))?;
    if json.is_null() {
        return Ok(None);
    }
    Ok(Some(Value::Text(json.to_string())))
}

/// Decode a plain field.
pub fn decode<T: FromValue>(column: &str, value: Value) -> OrmResult<T> {
    T::from_value(value).map_err(|e| OrmError::decode(column, e.to_string()))
}

/// Decode a `json` / `jsonb` field from text, bytes or a JSON column.
pub fn decode_json<T: DeserializeOwned>(column: &str, value: Value) -> OrmResult<T> {
    let parsed = match value {
        Value::Text(s) => serde_json::from_str(&s),
        Value::Bytes(b) => serde_json::from_slice(&b),
        Value::Json(j) => serde_json::from_value(j),
        Value::Null => serde_json::from_value(serde_json::Value::Null),
        other => {
            return Err(OrmError::decode(
                column,
                format!("cannot read JSON from a {} value", other.kind()),
            ));
        }
    };
    parsed.map_err(|e| OrmError::Serialization(format!("column {column}: {e}")))
}

// ==================== Statement support ====================

fn coerce_id(value: Value) -> OrmResult<Value> {
    value
        .into_id()
        .map_err(|e| OrmError::decode("id", e.to_string()))
}

/// Columns and values an INSERT / UPDATE writes for `entity`, in field order.
pub(crate) fn writable_values<T: Entity>(entity: &T) -> OrmResult<Vec<(&'static str, Value)>> {
    let mut out = Vec::new();
    for (index, field) in T::fields().iter().enumerate() {
        if !field.flags.is_writable() {
            continue;
        }
        let Some(value) = entity.field_value(index)? else {
            continue;
        };
        let value = if field.column == "id" {
            coerce_id(value)?
        } else {
            value
        };
        out.push((field.column, value));
    }
    Ok(out)
}

/// Value of the `id` column, whatever its flags.
pub(crate) fn id_value<T: Entity>(entity: &T) -> OrmResult<Value> {
    let index = T::column_index("id")
        .ok_or_else(|| OrmError::validation("entity has no field mapped to column `id`"))?;
    let value = coerce_id(entity.field_value(index)?.unwrap_or_default())?;
    if value.is_null() {
        return Err(OrmError::validation("entity id is null"));
    }
    Ok(value)
}

/// Copy one row onto `entity`. Columns without a matching field are ignored.
pub(crate) fn apply_row<T: Entity>(
    entity: &mut T,
    columns: &[String],
    values: Vec<Value>,
) -> OrmResult<()> {
    for (column, value) in columns.iter().zip(values) {
        if let Some(index) = T::column_index(column) {
            entity.set_field(index, value)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Meta {
        tags: Vec<String>,
    }

    #[derive(Debug, Default, PartialEq)]
    struct Account {
        id: i64,
        name: String,
        meta: Option<Meta>,
        cache: String,
    }

    static ACCOUNT_FIELDS: [FieldDescriptor; 4] = [
        FieldDescriptor::new("id", "id").autoincrement(),
        FieldDescriptor::new("name", "name"),
        FieldDescriptor::new("meta", "meta").jsonb(),
        FieldDescriptor::new("cache", "cache").omitted(),
    ];

    impl Entity for Account {
        fn fields() -> &'static [FieldDescriptor] {
            &ACCOUNT_FIELDS
        }

        fn field_value(&self, index: usize) -> OrmResult<Option<Value>> {
            match index {
                0 => encode(&self.id),
                1 => encode(&self.name),
                2 => encode_json("meta", &self.meta),
                3 => encode(&self.cache),
                _ => Ok(None),
            }
        }

        fn set_field(&mut self, index: usize, value: Value) -> OrmResult<()> {
            match index {
                0 => self.id = decode("id", value)?,
                1 => self.name = decode("name", value)?,
                2 => self.meta = decode_json("meta", value)?,
                3 => self.cache = decode("cache", value)?,
                _ => {}
            }
            Ok(())
        }
    }

    #[test]
    fn tag_with_flags_and_spaces() {
        let d = FieldDescriptor::from_tag("Id", " id , autoincrement ").unwrap();
        assert_eq!(d.column, "id");
        assert!(d.flags.autoincrement);
        assert!(!d.flags.is_writable());
    }

    #[test]
    fn empty_column_uses_field_name() {
        let d = FieldDescriptor::from_tag("LastName", ",json").unwrap();
        assert_eq!(d.column, "LastName");
        assert!(d.flags.is_json());

        let d = FieldDescriptor::from_tag("plain", "").unwrap();
        assert_eq!(d.column, "plain");
        assert_eq!(d.flags, FieldFlags::default());
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let err = FieldDescriptor::from_tag("x", "x,primary").unwrap_err();
        assert!(matches!(err, OrmError::Validation(_)));
    }

    #[test]
    fn writable_values_skip_flags_and_null_json() {
        let account = Account {
            id: 3,
            name: "ana".into(),
            meta: None,
            cache: "c".into(),
        };
        let values = writable_values(&account).unwrap();
        assert_eq!(values, vec![("name", Value::from("ana"))]);

        let account = Account {
            meta: Some(Meta {
                tags: vec!["a".into()],
            }),
            ..account
        };
        let values = writable_values(&account).unwrap();
        assert_eq!(values[1], ("meta", Value::Text(r#"{"tags":["a"]}"#.into())));
    }

    #[test]
    fn id_is_found_even_when_autoincrement() {
        let account = Account {
            id: 9,
            ..Account::default()
        };
        assert_eq!(id_value(&account).unwrap(), Value::Int(9));
    }

    #[test]
    fn apply_row_ignores_unknown_columns() {
        let mut account = Account::default();
        apply_row(
            &mut account,
            &["id".into(), "extra".into(), "meta".into()],
            vec![
                Value::Int(1),
                Value::from("ignored"),
                Value::Json(serde_json::json!({"tags": ["x"]})),
            ],
        )
        .unwrap();
        assert_eq!(account.id, 1);
        assert_eq!(
            account.meta,
            Some(Meta {
                tags: vec!["x".into()]
            })
        );
    }

    #[test]
    fn bad_json_is_a_serialization_error() {
        let err = decode_json::<Meta>("meta", Value::from("{not json")).unwrap_err();
        assert!(matches!(err, OrmError::Serialization(_)));
    }
}
