use serde::{Deserialize, Serialize};

/// Supported SQL data types for catalog fields.
///
/// The source's `record_buf` also carries a field-reference "type" when an
/// expression operand names a column instead of a literal, but that is a
/// property of [`crate::sql::expression::Operand`], not a storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    Decimal,
    String,
}

/// Exact fixed-point decimal, compared bit-for-bit rather than through
/// floating point rounding.
///
/// `mantissa` is the value scaled by `10^scale`; two decimals compare equal
/// only when both mantissa and scale match, matching spec's "exact decimal
/// comparison" requirement (no float issue with e.g. 0.1 + 0.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Decimal {
    pub mantissa: i64,
    pub scale: u32,
}

impl Decimal {
    pub fn new(mantissa: i64, scale: u32) -> Self {
        Self { mantissa, scale }
    }
}

impl std::fmt::Display for Decimal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let scale = self.scale as usize;
        if scale == 0 {
            return write!(f, "{}", self.mantissa);
        }
        let sign = if self.mantissa < 0 { "-" } else { "" };
        let abs = self.mantissa.unsigned_abs();
        let digits = format!("{:0width$}", abs, width = scale + 1);
        let (whole, frac) = digits.split_at(digits.len() - scale);
        write!(f, "{sign}{whole}.{frac}")
    }
}

/// A catalog-typed value as held inside a tuple once an expression operand
/// is resolved, or as a literal operand in an expression term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Integer(i64),
    Decimal(Decimal),
    String(String),
}

impl Value {
    pub fn datatype(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Integer(_) => Some(DataType::Integer),
            Value::Decimal(_) => Some(DataType::Decimal),
            Value::String(_) => Some(DataType::String),
        }
    }
}
