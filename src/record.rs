use chrono::{DateTime, FixedOffset, Utc};
use std::error::Error;
use std::fmt;

/// Text-marshaling capability for opaque attribute values.
///
/// Types that want full control over their inline rendering implement
/// [`MarshalText::marshal_text`]; the default implementation falls back to
/// the `Debug` form. A marshaling failure aborts rendering of the whole
/// record (see [`crate::error::RenderError::Marshal`]).
pub trait MarshalText: fmt::Debug + Send + Sync {
    fn marshal_text(&self) -> Result<String, Box<dyn Error + Send + Sync>> {
        Ok(format!("{:?}", self))
    }
}

/// One key/value pair attached to a log record.
///
/// Keys need not be unique within a record; when several attributes share a
/// key, placeholder resolution takes the first one in declaration order.
#[derive(Debug)]
pub struct Attr {
    pub key: String,
    pub value: Value,
}

impl Attr {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Attr { key: key.into(), value: value.into() }
    }
}

/// Closed set of value kinds an attribute may carry.
///
/// `Group` nests further attributes and is what dotted-path placeholders
/// traverse. `Other` holds anything else behind the [`MarshalText`]
/// capability.
#[derive(Debug)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Time(DateTime<FixedOffset>),
    Group(Vec<Attr>),
    Other(Box<dyn MarshalText>),
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Value::Time(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Time(v.fixed_offset())
    }
}

impl From<Vec<Attr>> for Value {
    fn from(v: Vec<Attr>) -> Self {
        Value::Group(v)
    }
}

impl From<Box<dyn MarshalText>> for Value {
    fn from(v: Box<dyn MarshalText>) -> Self {
        Value::Other(v)
    }
}

/// One structured log record: a message template plus ordered attributes.
///
/// Records are built per log call, rendered once and discarded. The message
/// is a template whose backtick-delimited spans name attributes to inline.
#[derive(Debug, Default)]
pub struct Record {
    pub message: String,
    pub attrs: Vec<Attr>,
}

impl Record {
    pub fn new(message: impl Into<String>, attrs: Vec<Attr>) -> Self {
        Record { message: message.into(), attrs }
    }
}
