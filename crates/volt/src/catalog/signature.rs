//! Parameter types and per-type wire encoding

use serde_json::{Number, Value};
use std::fmt;
use std::str::FromStr;

use crate::models::Param;

/// Declared type of a procedure parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Decimal,
    Bit,
    Varchar,
    Timestamp,
    Varbinary,
}

impl ParamType {
    pub fn name(self) -> &'static str {
        match self {
            ParamType::TinyInt => "tinyint",
            ParamType::SmallInt => "smallint",
            ParamType::Integer => "integer",
            ParamType::BigInt => "bigint",
            ParamType::Float => "float",
            ParamType::Decimal => "decimal",
            ParamType::Bit => "bit",
            ParamType::Varchar => "varchar",
            ParamType::Timestamp => "timestamp",
            ParamType::Varbinary => "varbinary",
        }
    }

    fn is_integer(self) -> bool {
        matches!(
            self,
            ParamType::TinyInt | ParamType::SmallInt | ParamType::Integer | ParamType::BigInt
        )
    }

    /// Whether `value` fits the width of this integer type
    fn fits(self, value: i64) -> bool {
        match self {
            ParamType::TinyInt => i8::try_from(value).is_ok(),
            ParamType::SmallInt => i16::try_from(value).is_ok(),
            ParamType::Integer => i32::try_from(value).is_ok(),
            _ => true,
        }
    }

    /// Encode a parameter as a JSON value for the `Parameters` array
    ///
    /// Numeric types are sent as bare numbers, decimals as quoted strings and
    /// bits as `0`/`1`. Returns `None` when the value cannot be represented
    /// as this type, including integers outside the type's width.
    pub fn encode(self, param: &Param) -> Option<Value> {
        if let Param::Null = param {
            return Some(Value::Null);
        }

        match self {
            t if t.is_integer() => integer_value(param)
                .filter(|value| t.fits(*value))
                .map(Value::from),
            ParamType::Float => match param {
                Param::Int(i) => Some(Value::from(*i)),
                Param::Float(x) => Number::from_f64(*x).map(Value::Number),
                Param::Text(s) => strip_quotes(s)
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number),
                _ => None,
            },
            ParamType::Decimal => match param {
                Param::Int(_) | Param::Float(_) => Some(Value::String(param.to_string())),
                Param::Text(s) => Some(Value::String(strip_quotes(s).to_string())),
                _ => None,
            },
            ParamType::Bit => match param {
                Param::Bool(b) => Some(Value::from(u8::from(*b))),
                Param::Int(i @ (0 | 1)) => Some(Value::from(*i)),
                Param::Text(s) => parse_bit(s).map(Value::from),
                _ => None,
            },
            ParamType::Timestamp => match param {
                Param::Int(i) => Some(Value::from(*i)),
                Param::Text(s) => Some(Value::String(strip_quotes(s).to_string())),
                _ => None,
            },
            _ => match param {
                Param::Text(s) => Some(Value::String(strip_quotes(s).to_string())),
                Param::Int(i) => Some(Value::from(*i)),
                Param::Float(x) => Number::from_f64(*x).map(Value::Number),
                Param::Bool(b) => Some(Value::String(b.to_string())),
                Param::Null => Some(Value::Null),
            },
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ParamType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tinyint" => Ok(ParamType::TinyInt),
            "smallint" => Ok(ParamType::SmallInt),
            "int" | "integer" => Ok(ParamType::Integer),
            "bigint" => Ok(ParamType::BigInt),
            "float" => Ok(ParamType::Float),
            "decimal" => Ok(ParamType::Decimal),
            "bit" | "boolean" => Ok(ParamType::Bit),
            "varchar" | "string" => Ok(ParamType::Varchar),
            "timestamp" => Ok(ParamType::Timestamp),
            "varbinary" => Ok(ParamType::Varbinary),
            other => Err(format!("unknown parameter type '{}'", other)),
        }
    }
}

/// Ordered parameter types of a procedure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    params: Vec<ParamType>,
    long_running: bool,
}

impl Signature {
    pub fn new(params: Vec<ParamType>) -> Self {
        Self {
            params,
            long_running: false,
        }
    }

    /// Signature of a procedure that takes no parameters
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Mark the procedure as producing long output (uses the long timeout)
    pub fn long_running(mut self) -> Self {
        self.long_running = true;
        self
    }

    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn is_long_running(&self) -> bool {
        self.long_running
    }
}

/// Remove one pair of surrounding single quotes
fn strip_quotes(s: &str) -> &str {
    s.strip_prefix('\'')
        .and_then(|inner| inner.strip_suffix('\''))
        .unwrap_or(s)
}

fn integer_value(param: &Param) -> Option<i64> {
    match param {
        Param::Int(i) => Some(*i),
        Param::Float(x) => whole_float(*x),
        Param::Text(s) => strip_quotes(s).trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// A float with no fractional part that converts to `i64` exactly
fn whole_float(x: f64) -> Option<i64> {
    // 2^63, the first whole float above i64::MAX
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (x.is_finite() && x.fract() == 0.0 && (-LIMIT..LIMIT).contains(&x)).then_some(x as i64)
}

fn parse_bit(s: &str) -> Option<u8> {
    match strip_quotes(s).trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(1),
        "false" | "no" | "0" => Some(0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_type_names() {
        assert_eq!("INT".parse::<ParamType>().unwrap(), ParamType::Integer);
        assert_eq!("string".parse::<ParamType>().unwrap(), ParamType::Varchar);
        assert_eq!(" Bit ".parse::<ParamType>().unwrap(), ParamType::Bit);
        assert!("geography".parse::<ParamType>().is_err());
    }

    #[test]
    fn test_integer_encoding() {
        let t = ParamType::TinyInt;
        assert_eq!(t.encode(&Param::Int(3)), Some(json!(3)));
        assert_eq!(t.encode(&"0".into()), Some(json!(0)));
        assert_eq!(t.encode(&"'12'".into()), Some(json!(12)));
        assert_eq!(t.encode(&Param::Float(2.0)), Some(json!(2)));
        assert_eq!(t.encode(&Param::Float(2.5)), None);
        assert_eq!(t.encode(&"abc".into()), None);
    }

    #[test]
    fn test_integer_width_limits() {
        assert_eq!(ParamType::TinyInt.encode(&Param::Int(127)), Some(json!(127)));
        assert_eq!(ParamType::TinyInt.encode(&Param::Int(1000)), None);
        assert_eq!(ParamType::TinyInt.encode(&"-129".into()), None);
        assert_eq!(ParamType::SmallInt.encode(&Param::Int(40_000)), None);
        assert_eq!(ParamType::SmallInt.encode(&Param::Int(-32_768)), Some(json!(-32_768)));
        assert_eq!(ParamType::Integer.encode(&Param::Int(1 << 31)), None);
        assert_eq!(ParamType::Integer.encode(&Param::Float(3e9)), None);
        assert_eq!(ParamType::BigInt.encode(&Param::Int(i64::MAX)), Some(json!(i64::MAX)));
        assert_eq!(ParamType::BigInt.encode(&"9223372036854775808".into()), None);
    }

    #[test]
    fn test_float_to_bigint_range() {
        let t = ParamType::BigInt;
        assert_eq!(t.encode(&Param::Float(1e20)), None);
        assert_eq!(t.encode(&Param::Float(-1e20)), None);
        assert_eq!(t.encode(&Param::Float(f64::INFINITY)), None);
        assert_eq!(t.encode(&Param::Float(f64::NAN)), None);
        assert_eq!(t.encode(&Param::Float(-9.223372036854775808e18)), Some(json!(i64::MIN)));
        assert_eq!(t.encode(&Param::Float(1e15)), Some(json!(1_000_000_000_000_000i64)));
    }

    #[test]
    fn test_decimal_is_quoted() {
        let t = ParamType::Decimal;
        assert_eq!(t.encode(&"12.50".into()), Some(json!("12.50")));
        assert_eq!(t.encode(&Param::Int(7)), Some(json!("7")));
    }

    #[test]
    fn test_bit_normalization() {
        let t = ParamType::Bit;
        assert_eq!(t.encode(&"true".into()), Some(json!(1)));
        assert_eq!(t.encode(&"'YES'".into()), Some(json!(1)));
        assert_eq!(t.encode(&"no".into()), Some(json!(0)));
        assert_eq!(t.encode(&"0".into()), Some(json!(0)));
        assert_eq!(t.encode(&Param::Bool(false)), Some(json!(0)));
        assert_eq!(t.encode(&Param::Int(1)), Some(json!(1)));
        assert_eq!(t.encode(&Param::Int(2)), None);
        assert_eq!(t.encode(&"maybe".into()), None);
    }

    #[test]
    fn test_varchar_strips_quotes() {
        let t = ParamType::Varchar;
        assert_eq!(t.encode(&"'TABLE'".into()), Some(json!("TABLE")));
        assert_eq!(t.encode(&"it's".into()), Some(json!("it's")));
        assert_eq!(t.encode(&Param::Int(5)), Some(json!(5)));
    }

    #[test]
    fn test_null_for_any_type() {
        assert_eq!(ParamType::BigInt.encode(&Param::Null), Some(Value::Null));
        assert_eq!(ParamType::Bit.encode(&Param::Null), Some(Value::Null));
    }

    #[test]
    fn test_signature() {
        let sig = Signature::new(vec![ParamType::Varchar, ParamType::Bit]).long_running();
        assert_eq!(sig.arity(), 2);
        assert!(sig.is_long_running());
        assert_eq!(Signature::empty().arity(), 0);
    }
}
