//! JavaScript value representation.
//!
//! This module provides the core `Value` enum seen by property lookups.
//! Primitives are stored inline, objects are referenced by heap index.

use std::fmt;

/// Index of an object in the heap.
///
/// Object identity is index identity: two values referencing the same
/// `ObjectId` reference the same object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl ObjectId {
    /// Returns the id as a heap vector index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Primitive receiver categories that resolve through a canonical prototype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// `true` / `false`
    Boolean,
    /// Smi or Double
    Number,
    /// String value
    String,
}

impl PrimitiveKind {
    /// Name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Number => "number",
            PrimitiveKind::String => "string",
        }
    }
}

/// Represents any JavaScript value.
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// let undefined = Value::Undefined;
/// let number = Value::Smi(42);
/// let float = Value::Double(3.14);
///
/// assert!(!undefined.is_truthy());
/// assert!(number.is_truthy());
/// assert_eq!(number.type_of(), "number");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// JavaScript undefined value
    Undefined,
    /// JavaScript null value
    Null,
    /// JavaScript boolean (true or false)
    Boolean(bool),
    /// Small integer (fits in 32 bits)
    Smi(i32),
    /// IEEE 754 double-precision floating point
    Double(f64),
    /// JavaScript string value
    String(String),
    /// Heap-allocated object
    HeapObject(ObjectId),
}

impl Value {
    /// Returns whether this value is truthy in JavaScript semantics.
    ///
    /// ```
    /// use core_types::{ObjectId, Value};
    ///
    /// assert!(!Value::Undefined.is_truthy());
    /// assert!(!Value::Smi(0).is_truthy());
    /// assert!(!Value::Double(f64::NAN).is_truthy());
    /// assert!(Value::HeapObject(ObjectId(0)).is_truthy());
    /// ```
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Smi(n) => *n != 0,
            Value::Double(n) => !n.is_nan() && *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::HeapObject(_) => true,
        }
    }

    /// Returns the JavaScript typeof result for this value.
    ///
    /// Callability lives in the heap, so every object reports `"object"`
    /// here; the realm refines it for functions.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object", // JavaScript quirk
            Value::Boolean(_) => "boolean",
            Value::Smi(_) | Value::Double(_) => "number",
            Value::String(_) => "string",
            Value::HeapObject(_) => "object",
        }
    }

    /// `true` for `undefined` and `null`, the receivers property access rejects.
    #[inline]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Returns the referenced object, if any.
    #[inline]
    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Value::HeapObject(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the primitive kind for boolean, number and string values.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            Value::Boolean(_) => Some(PrimitiveKind::Boolean),
            Value::Smi(_) | Value::Double(_) => Some(PrimitiveKind::Number),
            Value::String(_) => Some(PrimitiveKind::String),
            _ => None,
        }
    }

    /// ToNumber conversion for primitives.
    ///
    /// Objects convert to NaN; no `valueOf` hook is consulted.
    ///
    /// ```
    /// use core_types::Value;
    ///
    /// assert_eq!(Value::Boolean(true).to_number(), 1.0);
    /// assert_eq!(Value::String(" 12 ".to_string()).to_number(), 12.0);
    /// assert_eq!(Value::Null.to_number(), 0.0);
    /// assert!(Value::Undefined.to_number().is_nan());
    /// ```
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Smi(n) => f64::from(*n),
            Value::Double(n) => *n,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse::<f64>().unwrap_or(f64::NAN)
                }
            }
            Value::HeapObject(_) => f64::NAN,
        }
    }

    /// Builds the smallest numeric representation of `n`.
    pub fn number(n: f64) -> Value {
        if n.fract() == 0.0
            && n >= f64::from(i32::MIN)
            && n <= f64::from(i32::MAX)
            && !(n == 0.0 && n.is_sign_negative())
        {
            Value::Smi(n as i32)
        } else {
            Value::Double(n)
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Undefined
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Smi(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::HeapObject(id)
    }
}

/// JavaScript `String()` conversion.
///
/// ```
/// use core_types::Value;
///
/// assert_eq!(Value::Undefined.to_string(), "undefined");
/// assert_eq!(Value::Double(2.0).to_string(), "2");
/// assert_eq!(Value::Smi(42).to_string(), "42");
/// ```
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Smi(n) => write!(f, "{}", n),
            Value::Double(n) => {
                if n.is_nan() {
                    write!(f, "NaN")
                } else if n.is_infinite() {
                    if n.is_sign_positive() {
                        write!(f, "Infinity")
                    } else {
                        write!(f, "-Infinity")
                    }
                } else if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::HeapObject(_) => write!(f, "[object Object]"),
        }
    }
}
