//! Attribute casts applied by model schemas when attributes are assigned.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::CoreError;
use crate::value::Value;

/// Target type for an attribute cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cast {
    Integer,
    Float,
    String,
    Boolean,
    /// JSON text decoded into a list (or a map, for keyed arrays).
    Array,
    /// JSON text decoded into a map.
    Object,
    /// Normalized to an RFC 3339 UTC string.
    DateTime,
}

impl FromStr for Cast {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "int" | "integer" => Ok(Self::Integer),
            "float" | "double" => Ok(Self::Float),
            "string" => Ok(Self::String),
            "bool" | "boolean" => Ok(Self::Boolean),
            "array" => Ok(Self::Array),
            "object" => Ok(Self::Object),
            "datetime" => Ok(Self::DateTime),
            _ => Err(CoreError::UnknownCast(s.to_string())),
        }
    }
}

impl Cast {
    fn name(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::DateTime => "datetime",
        }
    }

    /// Coerce `value` to this cast's type. `Null` always passes through.
    pub fn apply(self, value: &Value) -> Result<Value, CoreError> {
        if value.is_null() {
            return Ok(Value::Null);
        }

        let cast = match self {
            Self::Integer => to_integer(value),
            Self::Float => to_float(value),
            Self::String => Some(Value::String(to_text(value))),
            Self::Boolean => to_boolean(value),
            Self::Array => to_array(value)?,
            Self::Object => to_object(value)?,
            Self::DateTime => to_datetime(value),
        };

        cast.ok_or_else(|| CoreError::Cast {
            target: self.name(),
            value: to_text(value),
        })
    }
}

fn to_integer(value: &Value) -> Option<Value> {
    let i = match value {
        Value::Integer(i) => *i,
        Value::Float(f) if f.is_finite() => f.trunc() as i64,
        Value::Bool(b) => i64::from(*b),
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => i,
                Err(_) => s.parse::<f64>().ok().filter(|f| f.is_finite())?.trunc() as i64,
            }
        }
        _ => return None,
    };
    Some(Value::Integer(i))
}

fn to_float(value: &Value) -> Option<Value> {
    let f = match value {
        Value::Float(f) => *f,
        Value::Integer(i) => *i as f64,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    Some(Value::Float(f))
}

fn to_boolean(value: &Value) -> Option<Value> {
    let b = match value {
        Value::Bool(b) => *b,
        Value::Integer(i) => *i != 0,
        Value::Float(f) => *f != 0.0,
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "" | "0" | "false" | "no" | "off" => false,
            _ => return None,
        },
        Value::List(items) => !items.is_empty(),
        Value::Map(map) => !map.is_empty(),
        Value::Null => false,
    };
    Some(Value::Bool(b))
}

fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::String(s) => s.clone(),
        Value::List(_) | Value::Map(_) => value.to_json().to_string(),
    }
}

fn to_array(value: &Value) -> Result<Option<Value>, CoreError> {
    Ok(match value {
        Value::List(_) | Value::Map(_) => Some(value.clone()),
        Value::String(s) => match Value::from(serde_json::from_str::<serde_json::Value>(s)?) {
            decoded @ (Value::List(_) | Value::Map(_)) => Some(decoded),
            _ => None,
        },
        _ => None,
    })
}

fn to_object(value: &Value) -> Result<Option<Value>, CoreError> {
    Ok(match value {
        Value::Map(_) => Some(value.clone()),
        Value::String(s) => match Value::from(serde_json::from_str::<serde_json::Value>(s)?) {
            decoded @ Value::Map(_) => Some(decoded),
            _ => None,
        },
        _ => None,
    })
}

fn to_datetime(value: &Value) -> Option<Value> {
    let parsed: DateTime<Utc> = match value {
        Value::Integer(secs) => DateTime::from_timestamp(*secs, 0)?,
        Value::String(s) => parse_datetime(s.trim())?,
        _ => return None,
    };
    Some(Value::String(parsed.to_rfc3339()))
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
