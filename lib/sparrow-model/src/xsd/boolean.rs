use crate::xsd::{Decimal, Double, Float, Integer, XsdLexicalError};
use std::fmt;
use std::str::FromStr;

/// [XML Schema `boolean` datatype](https://www.w3.org/TR/xmlschema11-2/#boolean)
///
/// Uses internally a [`bool`].
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Copy, Hash, Default)]
pub struct Boolean {
    value: bool,
}

impl Boolean {
    #[inline]
    pub fn as_bool(self) -> bool {
        self.value
    }
}

impl From<bool> for Boolean {
    #[inline]
    fn from(value: bool) -> Self {
        Self { value }
    }
}

impl From<Boolean> for bool {
    #[inline]
    fn from(value: Boolean) -> Self {
        value.value
    }
}

impl From<Integer> for Boolean {
    #[inline]
    fn from(value: Integer) -> Self {
        (value != Integer::from(0)).into()
    }
}

impl From<Decimal> for Boolean {
    #[inline]
    fn from(value: Decimal) -> Self {
        (value != Decimal::from(0)).into()
    }
}

impl From<Float> for Boolean {
    #[inline]
    fn from(value: Float) -> Self {
        (value != Float::from(0.) && !value.is_nan()).into()
    }
}

impl From<Double> for Boolean {
    #[inline]
    fn from(value: Double) -> Self {
        (value != Double::from(0.) && !value.is_nan()).into()
    }
}

impl FromStr for Boolean {
    type Err = XsdLexicalError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "true" | "1" => Ok(true.into()),
            "false" | "0" => Ok(false.into()),
            _ => Err(XsdLexicalError::new("boolean", input)),
        }
    }
}

impl fmt::Display for Boolean {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_accepts_numeric_forms() {
        assert_eq!(Boolean::from_str("1").unwrap(), true.into());
        assert_eq!(Boolean::from_str("0").unwrap(), false.into());
        assert!(Boolean::from_str("TRUE").is_err());
    }
}
