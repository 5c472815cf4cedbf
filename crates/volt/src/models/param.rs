//! Procedure parameter values

use std::fmt;

/// A parameter value passed to a procedure call
///
/// How it is put on the wire depends on the declared parameter type of the
/// procedure; see [`crate::ParamType::encode`].
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Null => f.write_str("NULL"),
            Param::Bool(b) => write!(f, "{}", b),
            Param::Int(i) => write!(f, "{}", i),
            Param::Float(x) => write!(f, "{}", x),
            Param::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Param {
    fn from(s: &str) -> Self {
        Param::Text(s.to_string())
    }
}

impl From<String> for Param {
    fn from(s: String) -> Self {
        Param::Text(s)
    }
}

impl From<&String> for Param {
    fn from(s: &String) -> Self {
        Param::Text(s.clone())
    }
}

impl From<bool> for Param {
    fn from(b: bool) -> Self {
        Param::Bool(b)
    }
}

impl From<i32> for Param {
    fn from(i: i32) -> Self {
        Param::Int(i64::from(i))
    }
}

impl From<i64> for Param {
    fn from(i: i64) -> Self {
        Param::Int(i)
    }
}

impl From<u32> for Param {
    fn from(i: u32) -> Self {
        Param::Int(i64::from(i))
    }
}

impl From<f64> for Param {
    fn from(x: f64) -> Self {
        Param::Float(x)
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(value: Option<T>) -> Self {
        value.map_or(Param::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(Param::from("TABLE"), Param::Text("TABLE".to_string()));
        assert_eq!(Param::from(7), Param::Int(7));
        assert_eq!(Param::from(true), Param::Bool(true));
        assert_eq!(Param::from(None::<i64>), Param::Null);
        assert_eq!(Param::from(Some("x")), Param::Text("x".to_string()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Param::Null.to_string(), "NULL");
        assert_eq!(Param::Float(1.5).to_string(), "1.5");
    }
}
