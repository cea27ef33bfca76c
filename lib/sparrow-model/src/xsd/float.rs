use crate::xsd::{Boolean, Integer, XsdLexicalError};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// [XML Schema `float` datatype](https://www.w3.org/TR/xmlschema11-2/#float)
///
/// Uses internally an [`f32`]. Equality follows IEEE 754 (`NaN != NaN`);
/// [`Float::total_cmp`] gives the total order used by `ORDER BY`.
#[derive(PartialEq, Debug, Clone, Copy, Default)]
pub struct Float {
    value: f32,
}

impl Float {
    pub const NAN: Self = Self { value: f32::NAN };

    #[inline]
    #[must_use]
    pub fn is_nan(self) -> bool {
        self.value.is_nan()
    }

    #[inline]
    #[must_use]
    pub fn abs(self) -> Self {
        self.value.abs().into()
    }

    /// [fn:round](https://www.w3.org/TR/xpath-functions-31/#func-round): ties go towards positive infinity.
    #[inline]
    #[must_use]
    pub fn round(self) -> Self {
        (self.value + 0.5).floor().into()
    }

    #[inline]
    #[must_use]
    pub fn ceil(self) -> Self {
        self.value.ceil().into()
    }

    #[inline]
    #[must_use]
    pub fn floor(self) -> Self {
        self.value.floor().into()
    }

    /// A total order aligned with [`f32::total_cmp`] except that all NaN payloads compare equal.
    #[inline]
    #[must_use]
    pub fn total_cmp(self, other: Self) -> Ordering {
        if self.value.is_nan() && other.value.is_nan() {
            Ordering::Equal
        } else {
            self.value.total_cmp(&other.value)
        }
    }

    /// Casts towards zero into an [`Integer`], returning `None` when not finite or out of range.
    #[inline]
    #[must_use]
    pub fn checked_integer(self) -> Option<Integer> {
        let truncated = self.value.trunc();
        if truncated.is_finite() && (i64::MIN as f32..=i64::MAX as f32).contains(&truncated) {
            Some(Integer::from(truncated as i64))
        } else {
            None
        }
    }
}

impl From<f32> for Float {
    #[inline]
    fn from(value: f32) -> Self {
        Self { value }
    }
}

impl From<Float> for f32 {
    #[inline]
    fn from(value: Float) -> Self {
        value.value
    }
}

impl From<Boolean> for Float {
    #[inline]
    fn from(value: Boolean) -> Self {
        Self {
            value: if bool::from(value) { 1. } else { 0. },
        }
    }
}

impl PartialOrd for Float {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

impl FromStr for Float {
    type Err = XsdLexicalError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            value: match input {
                "INF" | "+INF" => f32::INFINITY,
                "-INF" => f32::NEG_INFINITY,
                "NaN" => f32::NAN,
                _ => {
                    if input.is_empty()
                        || !input
                            .bytes()
                            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
                    {
                        return Err(XsdLexicalError::new("float", input));
                    }
                    f32::from_str(input).map_err(|_| XsdLexicalError::new("float", input))?
                }
            },
        })
    }
}

impl fmt::Display for Float {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value == f32::INFINITY {
            f.write_str("INF")
        } else if self.value == f32::NEG_INFINITY {
            f.write_str("-INF")
        } else {
            self.value.fmt(f)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_handles_special_values() {
        assert_eq!(f32::from(Float::from_str("INF").unwrap()), f32::INFINITY);
        assert_eq!(f32::from(Float::from_str("-INF").unwrap()), f32::NEG_INFINITY);
        assert!(Float::from_str("NaN").unwrap().is_nan());
        assert!(Float::from_str("inf").is_err());
        assert_eq!(f32::from(Float::from_str("1.5e2").unwrap()), 150.);
    }
}
