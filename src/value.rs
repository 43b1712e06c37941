//! Argument values carried by a log record.
//!
//! Records hold an ordered list of [`Value`]s instead of untyped arguments.
//! Each variant knows its default string form, and the printf engine in
//! [`crate::printf`] uses the variant to decide which verbs apply.

use std::fmt;

/// A single log argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    Char(char),
    /// Rendered message of an error value
    Error(String),
    /// Any other value, rendered through its `Display` impl at the call site
    Display(String),
}

impl Value {
    /// Capture an error by its display message.
    pub fn error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        Value::Error(err.to_string())
    }

    /// Capture any displayable value by its rendered form.
    pub fn display<T: fmt::Display + ?Sized>(value: &T) -> Self {
        Value::Display(value.to_string())
    }

    /// Type name used in printf diagnostics such as `%!d(string=x)`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Float(_) => "float64",
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::Error(_) => "error",
            Value::Display(_) => "display",
        }
    }

    /// Whether the value renders as text rather than as a number or flag.
    pub fn is_textual(&self) -> bool {
        matches!(self, Value::Str(_) | Value::Error(_) | Value::Display(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) | Value::Error(s) | Value::Display(s) => f.write_str(s),
            Value::Int(v) => write!(f, "{}", v),
            Value::Uint(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "{}", v),
        }
    }
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

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Str(v.clone())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Char(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(v as i64)
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Uint(v as u64)
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64, isize);
impl_from_unsigned!(u8, u16, u32, u64, usize);

impl From<&std::io::Error> for Value {
    fn from(err: &std::io::Error) -> Self {
        Value::error(err)
    }
}

impl From<std::io::Error> for Value {
    fn from(err: std::io::Error) -> Self {
        Value::error(&err)
    }
}

/// Build a `Vec<Value>` from heterogeneous expressions.
///
/// ```rust
/// use xlog::{args, Value};
///
/// let v = args!["retry", 3, 0.5];
/// assert_eq!(v, vec![Value::from("retry"), Value::Int(3), Value::Float(0.5)]);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($arg)),+]
    };
}
