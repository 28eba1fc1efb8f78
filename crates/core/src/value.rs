//! Value type definitions for the Rivulet engine.
//!
//! This module defines the `Value` enum which represents any value a
//! dataframe cell can hold.

use crate::error::{Error, Result};
use crate::types::DataType;
use core::cmp::Ordering;
use core::hash::{Hash, Hasher};

/// A value held by a dataframe cell.
#[derive(Clone, Debug)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit floating point
    Float64(f64),
    /// UTF-8 string
    Utf8(String),
    /// Days since the Unix epoch
    Date(i32),
    /// Unix timestamp in milliseconds
    Datetime(i64),
}

impl Value {
    /// Returns the data type of this value, or None if it's Null.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Int32(_) => Some(DataType::Int32),
            Value::Int64(_) => Some(DataType::Int64),
            Value::Float64(_) => Some(DataType::Float64),
            Value::Utf8(_) => Some(DataType::Utf8),
            Value::Date(_) => Some(DataType::Date),
            Value::Datetime(_) => Some(DataType::Datetime),
        }
    }

    /// Returns true if this value is Null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the boolean value if this is a Boolean, None otherwise.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the i32 value if this is an Int32, None otherwise.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the i64 value if this is an Int64, None otherwise.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the f64 value if this is a Float64, None otherwise.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns a reference to the string if this is a Utf8, None otherwise.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Utf8(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Returns the day count if this is a Date, None otherwise.
    pub fn as_date(&self) -> Option<i32> {
        match self {
            Value::Date(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the timestamp if this is a Datetime, None otherwise.
    pub fn as_datetime(&self) -> Option<i64> {
        match self {
            Value::Datetime(v) => Some(*v),
            _ => None,
        }
    }

    /// Widens this value to f64 if it is numeric.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Int32(v) => Some(*v as f64),
            Value::Int64(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Casts this value to the target type.
    ///
    /// Null casts to Null for any target. Numeric widening is exact;
    /// narrowing float-to-int truncates toward zero. Date/Datetime convert
    /// at millisecond resolution (a Datetime cast to Date floors to the
    /// containing day).
    pub fn cast(&self, to: DataType) -> Result<Value> {
        const MS_PER_DAY: i64 = 86_400_000;

        if self.is_null() {
            return Ok(Value::Null);
        }
        if self.data_type() == Some(to) {
            return Ok(self.clone());
        }
        let out = match (self, to) {
            (Value::Int32(v), DataType::Int64) => Some(Value::Int64(*v as i64)),
            (Value::Int32(v), DataType::Float64) => Some(Value::Float64(*v as f64)),
            (Value::Int64(v), DataType::Int32) => Some(Value::Int32(*v as i32)),
            (Value::Int64(v), DataType::Float64) => Some(Value::Float64(*v as f64)),
            (Value::Float64(v), DataType::Int32) => Some(Value::Int32(*v as i32)),
            (Value::Float64(v), DataType::Int64) => Some(Value::Int64(*v as i64)),
            (Value::Date(d), DataType::Datetime) => {
                Some(Value::Datetime(*d as i64 * MS_PER_DAY))
            }
            (Value::Datetime(ms), DataType::Date) => {
                Some(Value::Date(ms.div_euclid(MS_PER_DAY) as i32))
            }
            _ => None,
        };
        out.ok_or_else(|| {
            Error::type_mismatch(self.data_type().unwrap_or(DataType::Utf8), to)
        })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(b) => b.hash(state),
            Value::Int32(i) => i.hash(state),
            Value::Int64(i) => i.hash(state),
            Value::Float64(f) => f.to_bits().hash(state),
            Value::Utf8(s) => s.hash(state),
            Value::Date(d) => d.hash(state),
            Value::Datetime(t) => t.hash(state),
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            // Nulls sort first.
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Int32(a), Value::Int32(b)) => a.cmp(b),
            (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
            // Cross-width numeric comparisons
            (Value::Int32(a), Value::Int64(b)) => (*a as i64).cmp(b),
            (Value::Int64(a), Value::Int32(b)) => a.cmp(&(*b as i64)),
            (Value::Int32(a), Value::Float64(b)) => cmp_f64(*a as f64, *b),
            (Value::Float64(a), Value::Int32(b)) => cmp_f64(*a, *b as f64),
            (Value::Int64(a), Value::Float64(b)) => cmp_f64(*a as f64, *b),
            (Value::Float64(a), Value::Int64(b)) => cmp_f64(*a, *b as f64),
            (Value::Float64(a), Value::Float64(b)) => cmp_f64(*a, *b),
            (Value::Utf8(a), Value::Utf8(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Datetime(a), Value::Datetime(b)) => a.cmp(b),
            (Value::Date(a), Value::Datetime(b)) => (*a as i64 * 86_400_000).cmp(b),
            (Value::Datetime(a), Value::Date(b)) => a.cmp(&(*b as i64 * 86_400_000)),
            // Different, incomparable types: order by type discriminant so
            // the order is still total.
            _ => self.type_order().cmp(&other.type_order()),
        }
    }
}

/// Total order on f64: NaN sorts greater than all other values.
fn cmp_f64(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

impl Value {
    fn type_order(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Int32(_) => 2,
            Value::Int64(_) => 3,
            Value::Float64(_) => 4,
            Value::Utf8(_) => 5,
            Value::Date(_) => 6,
            Value::Datetime(_) => 7,
        }
    }
}

impl core::fmt::Display for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Utf8(s) => write!(f, "{}", s),
            Value::Date(d) => write!(f, "date({})", d),
            Value::Datetime(t) => write!(f, "datetime({})", t),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Utf8(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Utf8(v)
    }
}
