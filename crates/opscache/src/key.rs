//! Cache keys: operation name plus positional arguments

use std::fmt;
use std::path::{Path, PathBuf};

use expensiveops::{Error, Result};
use serde::{Serialize, Serializer};

/// One argument of an intercepted call
///
/// Only values with structural equality and a stable hash can be part of a
/// key. Floats are kept as their canonical bit pattern and NaN is refused.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArgValue {
    /// Signed integer
    Int(i64),
    /// Boolean flag
    Bool(bool),
    /// Free text
    Text(String),
    /// Filesystem path, compared as given (not canonicalized)
    Path(PathBuf),
    /// Float bits, see [`ArgValue::float`]
    Float(u64),
}

impl ArgValue {
    /// Build a float argument
    ///
    /// `-0.0` is folded into `0.0`; NaN has no equality and is rejected.
    pub fn float(value: f64) -> Result<Self> {
        if value.is_nan() {
            return Err(Error::InvalidArgument(
                "NaN cannot be part of a cache key".to_string(),
            ));
        }
        let value = if value == 0.0 { 0.0 } else { value };
        Ok(ArgValue::Float(value.to_bits()))
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        ArgValue::Int(v)
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        ArgValue::Bool(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        ArgValue::Text(v.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        ArgValue::Text(v)
    }
}

impl From<&Path> for ArgValue {
    fn from(v: &Path) -> Self {
        ArgValue::Path(v.to_path_buf())
    }
}

impl From<PathBuf> for ArgValue {
    fn from(v: PathBuf) -> Self {
        ArgValue::Path(v)
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Int(v) => write!(f, "{}", v),
            ArgValue::Bool(v) => write!(f, "{}", v),
            ArgValue::Text(v) => write!(f, "{:?}", v),
            ArgValue::Path(v) => write!(f, "{}", v.display()),
            ArgValue::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
        }
    }
}

impl Serialize for ArgValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ArgValue::Int(v) => serializer.serialize_i64(*v),
            ArgValue::Bool(v) => serializer.serialize_bool(*v),
            ArgValue::Text(v) => serializer.serialize_str(v),
            ArgValue::Path(v) => serializer.serialize_str(&v.to_string_lossy()),
            ArgValue::Float(bits) => serializer.serialize_f64(f64::from_bits(*bits)),
        }
    }
}

/// Render an argument list as `a, b, c`
pub(crate) fn join_args(args: &[ArgValue]) -> String {
    args.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Identity of one `(operation, arguments)` pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    operation: String,
    args: Vec<ArgValue>,
}

impl CacheKey {
    /// Build a key from an operation name and its arguments
    ///
    /// Operations that share a store must use distinct names.
    pub fn build(operation: &str, args: Vec<ArgValue>) -> Result<Self> {
        if operation.is_empty() {
            return Err(Error::InvalidArgument(
                "operation name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            operation: operation.to_string(),
            args,
        })
    }

    /// Operation name
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Positional arguments
    pub fn args(&self) -> &[ArgValue] {
        &self.args
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.operation, join_args(&self.args))
    }
}
