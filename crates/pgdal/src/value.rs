//! Loosely-typed column and parameter values.
//!
//! [`Value`] is the one value type that flows through the builder's parameter
//! map, the resolver's ordered output, and the untyped row decoder. It binds to
//! `tokio-postgres` through [`ToSql`] (adapting to the server-inferred parameter
//! type where the conversion is lossless) and is produced from result columns
//! through [`FromSql`].

use bit_vec::BitVec;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::error::Error;
use thiserror::Error;
use tokio_postgres::types::{FromSql, IsNull, Kind, ToSql, Type};
use uuid::Uuid;

/// A driver-native value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
    Uuid(Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Numeric(Decimal),
    Array(Vec<Value>),
    /// Binary wire content of a column type with no dedicated variant
    /// (interval, inet, ranges, ...).
    Raw(Vec<u8>),
}

impl Value {
    /// Short name of the variant, used in conversion errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Json(_) => "json",
            Value::Uuid(_) => "uuid",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Timestamp(_) => "timestamp",
            Value::TimestampTz(_) => "timestamptz",
            Value::Numeric(_) => "numeric",
            Value::Array(_) => "array",
            Value::Raw(_) => "raw",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Coerce an identifier value into a 64-bit integer.
    ///
    /// `Null` is kept as is; integral floats and numeric text are accepted.
    pub fn into_id(self) -> Result<Value, ConversionError> {
        match self {
            Value::Null | Value::Int(_) => Ok(self),
            Value::Float(f) if f.fract() == 0.0 && f.is_finite() => Ok(Value::Int(f as i64)),
            Value::Numeric(d) if d.fract().is_zero() => d
                .to_i64()
                .map(Value::Int)
                .ok_or_else(|| ConversionError::new("i64", "out-of-range numeric")),
            Value::Text(ref s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| ConversionError::new("i64", "text")),
            other => Err(ConversionError::new("i64", other.kind())),
        }
    }
}

/// A value could not be converted into the requested Rust type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert {found} value into {expected}")]
pub struct ConversionError {
    pub expected: &'static str,
    pub found: &'static str,
}

impl ConversionError {
    pub fn new(expected: &'static str, found: &'static str) -> Self {
        Self { expected, found }
    }
}

// ==================== Rust -> Value ====================

macro_rules! impl_from_for_value {
    ($($ty:ty => |$v:ident| $body:expr),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from($v: $ty) -> Self {
                    $body
                }
            }
        )*
    };
}

impl_from_for_value! {
    bool => |v| Value::Bool(v),
    i8 => |v| Value::Int(v.into()),
    i16 => |v| Value::Int(v.into()),
    i32 => |v| Value::Int(v.into()),
    i64 => |v| Value::Int(v),
    u8 => |v| Value::Int(v.into()),
    u16 => |v| Value::Int(v.into()),
    u32 => |v| Value::Int(v.into()),
    f32 => |v| Value::Float(v.into()),
    f64 => |v| Value::Float(v),
    String => |v| Value::Text(v),
    &str => |v| Value::Text(v.to_string()),
    Vec<u8> => |v| Value::Bytes(v),
    serde_json::Value => |v| Value::Json(v),
    Uuid => |v| Value::Uuid(v),
    NaiveDate => |v| Value::Date(v),
    NaiveTime => |v| Value::Time(v),
    NaiveDateTime => |v| Value::Timestamp(v),
    DateTime<Utc> => |v| Value::TimestampTz(v),
    Decimal => |v| Value::Numeric(v),
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Borrowing conversion used when reading entity fields.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

impl<T> ToValue for T
where
    T: Clone + Into<Value>,
{
    fn to_value(&self) -> Value {
        self.clone().into()
    }
}

// ==================== Value -> Rust ====================

/// Conversion out of a decoded [`Value`].
///
/// Numeric conversions are lenient where no information is lost (an `int4`
/// column fills an `i64` field, an integer fills an `f64` field).
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, ConversionError>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        Ok(value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(ConversionError::new("bool", other.kind())),
        }
    }
}

macro_rules! impl_from_value_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, ConversionError> {
                    match value {
                        Value::Int(i) => <$ty>::try_from(i)
                            .map_err(|_| ConversionError::new(stringify!($ty), "out-of-range int")),
                        Value::Numeric(d) if d.fract().is_zero() => d
                            .to_i64()
                            .and_then(|i| <$ty>::try_from(i).ok())
                            .ok_or_else(|| {
                                ConversionError::new(stringify!($ty), "out-of-range numeric")
                            }),
                        other => Err(ConversionError::new(stringify!($ty), other.kind())),
                    }
                }
            }
        )*
    };
}

impl_from_value_int!(i16, i32, i64, u32);

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(i) => Ok(i as f64),
            Value::Numeric(d) => d
                .to_f64()
                .ok_or_else(|| ConversionError::new("f64", "out-of-range numeric")),
            other => Err(ConversionError::new("f64", other.kind())),
        }
    }
}

impl FromValue for Decimal {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Numeric(d) => Ok(d),
            Value::Int(i) => Ok(Decimal::from(i)),
            Value::Float(f) => {
                Decimal::try_from(f).map_err(|_| ConversionError::new("Decimal", "float"))
            }
            Value::Text(s) => parse_decimal(&s).map_err(|_| ConversionError::new("Decimal", "text")),
            other => Err(ConversionError::new("Decimal", other.kind())),
        }
    }
}


impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Json(j) => Ok(j.to_string()),
            Value::Numeric(d) => Ok(d.to_string()),
            other => Err(ConversionError::new("String", other.kind())),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bytes(b) => Ok(b),
            Value::Text(s) => Ok(s.into_bytes()),
            other => Err(ConversionError::new("Vec<u8>", other.kind())),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Json(j) => Ok(j),
            Value::Text(s) => {
                serde_json::from_str(&s).map_err(|_| ConversionError::new("json", "text"))
            }
            other => Err(ConversionError::new("json", other.kind())),
        }
    }
}

impl FromValue for Uuid {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Uuid(u) => Ok(u),
            Value::Text(s) => Uuid::parse_str(&s).map_err(|_| ConversionError::new("uuid", "text")),
            other => Err(ConversionError::new("uuid", other.kind())),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Date(d) => Ok(d),
            other => Err(ConversionError::new("NaiveDate", other.kind())),
        }
    }
}

impl FromValue for NaiveTime {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Time(t) => Ok(t),
            other => Err(ConversionError::new("NaiveTime", other.kind())),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Timestamp(ts) => Ok(ts),
            Value::TimestampTz(ts) => Ok(ts.naive_utc()),
            other => Err(ConversionError::new("NaiveDateTime", other.kind())),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::TimestampTz(ts) => Ok(ts),
            Value::Timestamp(ts) => Ok(ts.and_utc()),
            other => Err(ConversionError::new("DateTime<Utc>", other.kind())),
        }
    }
}

// ==================== tokio-postgres bridge ====================

fn is_text_type(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN
    )
}

fn is_bit_type(ty: &Type) -> bool {
    matches!(*ty, Type::BIT | Type::VARBIT)
}

fn parse_decimal(s: &str) -> Result<Decimal, rust_decimal::Error> {
    let s = s.trim();
    s.parse::<Decimal>().or_else(|_| Decimal::from_scientific(s))
}

/// `"1011"` -> bit string.
fn parse_bits(s: &str) -> Result<BitVec, Box<dyn Error + Sync + Send>> {
    s.trim()
        .chars()
        .map(|c| match c {
            '0' => Ok(false),
            '1' => Ok(true),
            other => Err(format!("invalid bit `{other}` in {s:?}").into()),
        })
        .collect()
}

fn bits_to_text(bits: &BitVec) -> String {
    bits.iter().map(|b| if b { '1' } else { '0' }).collect()
}

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql_checked(ty, out),
            Value::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql(ty, out),
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                Type::FLOAT8 => (*v as f64).to_sql(ty, out),
                Type::NUMERIC => Decimal::from(*v).to_sql(ty, out),
                _ if is_text_type(ty) => v.to_string().to_sql(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                Type::NUMERIC => Decimal::try_from(*v)?.to_sql(ty, out),
                _ if is_text_type(ty) => v.to_string().to_sql(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Text(v) => match *ty {
                Type::JSON | Type::JSONB => {
                    serde_json::from_str::<serde_json::Value>(v)?.to_sql(ty, out)
                }
                Type::NUMERIC => parse_decimal(v)?.to_sql(ty, out),
                _ if is_bit_type(ty) => parse_bits(v)?.to_sql(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Bytes(v) => v.to_sql_checked(ty, out),
            Value::Json(v) => {
                if is_text_type(ty) {
                    v.to_string().to_sql(ty, out)
                } else {
                    v.to_sql_checked(ty, out)
                }
            }
            Value::Uuid(v) => v.to_sql_checked(ty, out),
            Value::Date(v) => v.to_sql_checked(ty, out),
            Value::Time(v) => v.to_sql_checked(ty, out),
            Value::Timestamp(v) => match *ty {
                Type::TIMESTAMPTZ => v.and_utc().to_sql(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::TimestampTz(v) => match *ty {
                Type::TIMESTAMP => v.naive_utc().to_sql(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Numeric(v) => match *ty {
                Type::FLOAT4 => v.to_f32().ok_or("numeric out of float4 range")?.to_sql(ty, out),
                Type::FLOAT8 => v.to_f64().ok_or("numeric out of float8 range")?.to_sql(ty, out),
                _ if is_text_type(ty) => v.to_string().to_sql(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Array(v) => v.to_sql_checked(ty, out),
            Value::Raw(v) => {
                out.extend_from_slice(v);
                Ok(IsNull::No)
            }
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

impl<'a> FromSql<'a> for Value {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        let value = match *ty {
            Type::BOOL => Value::Bool(bool::from_sql(ty, raw)?),
            Type::CHAR => Value::Int(i8::from_sql(ty, raw)?.into()),
            Type::INT2 => Value::Int(i16::from_sql(ty, raw)?.into()),
            Type::INT4 => Value::Int(i32::from_sql(ty, raw)?.into()),
            Type::INT8 => Value::Int(i64::from_sql(ty, raw)?),
            Type::OID => Value::Int(u32::from_sql(ty, raw)?.into()),
            Type::FLOAT4 => Value::Float(f32::from_sql(ty, raw)?.into()),
            Type::FLOAT8 => Value::Float(f64::from_sql(ty, raw)?),
            Type::NUMERIC => Value::Numeric(Decimal::from_sql(ty, raw)?),
            Type::BYTEA => Value::Bytes(Vec::<u8>::from_sql(ty, raw)?),
            Type::JSON | Type::JSONB => Value::Json(serde_json::Value::from_sql(ty, raw)?),
            Type::UUID => Value::Uuid(Uuid::from_sql(ty, raw)?),
            Type::DATE => Value::Date(NaiveDate::from_sql(ty, raw)?),
            Type::TIME => Value::Time(NaiveTime::from_sql(ty, raw)?),
            Type::TIMESTAMP => Value::Timestamp(NaiveDateTime::from_sql(ty, raw)?),
            Type::TIMESTAMPTZ => Value::TimestampTz(DateTime::<Utc>::from_sql(ty, raw)?),
            _ if is_bit_type(ty) => Value::Text(bits_to_text(&BitVec::from_sql(ty, raw)?)),
            _ if is_text_type(ty) => Value::Text(String::from_sql(ty, raw)?),
            _ => match ty.kind() {
                Kind::Array(_) => Value::Array(Vec::<Value>::from_sql(ty, raw)?),
                Kind::Enum(_) => Value::Text(String::from_utf8(raw.to_vec())?),
                Kind::Domain(inner) => Value::from_sql(inner, raw)?,
                _ => Value::Raw(raw.to_vec()),
            },
        };
        Ok(value)
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(Value::Null)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_none_is_null() {
        let v: Value = Option::<i32>::None.into();
        assert!(v.is_null());
        let v: Value = Some("x").into();
        assert_eq!(v, Value::Text("x".to_string()));
    }

    #[test]
    fn id_coercion() {
        assert_eq!(Value::Int(3).into_id().unwrap(), Value::Int(3));
        assert_eq!(Value::Float(4.0).into_id().unwrap(), Value::Int(4));
        assert_eq!(Value::Text(" 12 ".into()).into_id().unwrap(), Value::Int(12));
        assert_eq!(Value::Null.into_id().unwrap(), Value::Null);
        assert!(Value::Bool(true).into_id().is_err());
        assert!(Value::Float(1.5).into_id().is_err());
    }

    #[test]
    fn lenient_numeric_reads() {
        assert_eq!(f64::from_value(Value::Int(2)).unwrap(), 2.0);
        assert_eq!(i32::from_value(Value::Int(7)).unwrap(), 7);
        assert!(i16::from_value(Value::Int(i64::MAX)).is_err());
        assert!(i64::from_value(Value::Text("1".into())).is_err());
    }

    #[test]
    fn null_only_fills_options() {
        assert_eq!(Option::<String>::from_value(Value::Null).unwrap(), None);
        let err = String::from_value(Value::Null).unwrap_err();
        assert_eq!(err, ConversionError::new("String", "null"));
    }

    #[test]
    fn json_reads_from_text() {
        let v = serde_json::Value::from_value(Value::Text("[1,2]".into())).unwrap();
        assert_eq!(v, serde_json::json!([1, 2]));
    }

    #[test]
    fn timestamps_convert_between_zones() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let utc = DateTime::<Utc>::from_value(Value::Timestamp(ts)).unwrap();
        assert_eq!(utc.naive_utc(), ts);
        assert_eq!(NaiveDateTime::from_value(Value::TimestampTz(utc)).unwrap(), ts);
    }

    fn encoded<T: ToSql>(value: &T, ty: &Type) -> BytesMut {
        let mut buf = BytesMut::new();
        value.to_sql_checked(ty, &mut buf).unwrap();
        buf
    }

    #[test]
    fn every_column_type_is_accepted() {
        for ty in [
            Type::NUMERIC,
            Type::INT4_ARRAY,
            Type::TEXT_ARRAY,
            Type::INTERVAL,
            Type::INET,
            Type::VARBIT,
        ] {
            assert!(<Value as FromSql>::accepts(&ty), "{ty}");
        }
    }

    #[test]
    fn numeric_columns_and_parameters() {
        let price = Decimal::new(1250, 2);
        let raw = encoded(&price, &Type::NUMERIC);
        assert_eq!(Value::from_sql(&Type::NUMERIC, &raw).unwrap(), Value::Numeric(price));

        assert_eq!(
            encoded(&Value::Int(5), &Type::NUMERIC),
            encoded(&Decimal::from(5), &Type::NUMERIC)
        );
        assert_eq!(
            encoded(&Value::Text("12.50".into()), &Type::NUMERIC),
            encoded(&price, &Type::NUMERIC)
        );
        assert_eq!(
            encoded(&Value::Numeric(price), &Type::FLOAT8),
            encoded(&12.5f64, &Type::FLOAT8)
        );

        let mut buf = BytesMut::new();
        assert!(Value::Text("abc".into()).to_sql_checked(&Type::NUMERIC, &mut buf).is_err());
    }

    #[test]
    fn numeric_reads() {
        assert_eq!(i64::from_value(Value::Numeric(Decimal::from(42))).unwrap(), 42);
        assert!(i32::from_value(Value::Numeric(Decimal::new(15, 1))).is_err());
        assert_eq!(f64::from_value(Value::Numeric(Decimal::new(15, 1))).unwrap(), 1.5);
        assert_eq!(
            Decimal::from_value(Value::Text("2.5".into())).unwrap(),
            Decimal::new(25, 1)
        );
        assert_eq!(Decimal::from_value(Value::Int(3)).unwrap(), Decimal::from(3));
        assert_eq!(
            Value::Numeric(Decimal::from(9)).into_id().unwrap(),
            Value::Int(9)
        );
    }

    #[test]
    fn bit_strings_bind_from_text() {
        let bits: BitVec = [true, false, true].into_iter().collect();
        assert_eq!(
            encoded(&Value::Text("101".into()), &Type::BIT),
            encoded(&bits, &Type::BIT)
        );
        assert_eq!(
            encoded(&Value::Text("101".into()), &Type::VARBIT),
            encoded(&bits, &Type::VARBIT)
        );

        let mut buf = BytesMut::new();
        assert!(Value::Text("12".into()).to_sql_checked(&Type::BIT, &mut buf).is_err());

        let raw = encoded(&bits, &Type::VARBIT);
        assert_eq!(
            Value::from_sql(&Type::VARBIT, &raw).unwrap(),
            Value::Text("101".into())
        );
    }

    #[test]
    fn arrays_decode_element_wise() {
        let raw = encoded(&vec![Some(1i32), None, Some(3)], &Type::INT4_ARRAY);
        let value = Value::from_sql(&Type::INT4_ARRAY, &raw).unwrap();
        assert_eq!(
            value,
            Value::Array(vec![Value::Int(1), Value::Null, Value::Int(3)])
        );
        assert_eq!(encoded(&value, &Type::INT4_ARRAY), raw);
    }

    #[test]
    fn unknown_types_are_kept_raw() {
        let raw = [0u8, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0];
        let value = Value::from_sql(&Type::INTERVAL, &raw).unwrap();
        assert_eq!(value, Value::Raw(raw.to_vec()));
        assert_eq!(&encoded(&value, &Type::INTERVAL)[..], &raw[..]);
    }
}
