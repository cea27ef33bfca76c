use crate::xsd::{Boolean, Decimal, Float, Integer, XsdLexicalError};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// [XML Schema `double` datatype](https://www.w3.org/TR/xmlschema11-2/#double)
///
/// Uses internally an [`f64`]. Equality follows IEEE 754 (`NaN != NaN`);
/// [`Double::total_cmp`] gives the total order used by `ORDER BY`.
#[derive(PartialEq, Debug, Clone, Copy, Default)]
pub struct Double {
    value: f64,
}

impl Double {
    pub const NAN: Self = Self { value: f64::NAN };

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

    /// A total order aligned with [`f64::total_cmp`] except that all NaN payloads compare equal.
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
        if truncated.is_finite() && (i64::MIN as f64..=i64::MAX as f64).contains(&truncated) {
            Some(Integer::from(truncated as i64))
        } else {
            None
        }
    }
}

impl From<f64> for Double {
    #[inline]
    fn from(value: f64) -> Self {
        Self { value }
    }
}

impl From<Double> for f64 {
    #[inline]
    fn from(value: Double) -> Self {
        value.value
    }
}

impl From<Boolean> for Double {
    #[inline]
    fn from(value: Boolean) -> Self {
        Self {
            value: if bool::from(value) { 1. } else { 0. },
        }
    }
}

impl From<Decimal> for Double {
    #[inline]
    fn from(value: Decimal) -> Self {
        value.to_double()
    }
}

impl From<Float> for Double {
    #[inline]
    fn from(value: Float) -> Self {
        f64::from(f32::from(value)).into()
    }
}

impl PartialOrd for Double {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

impl FromStr for Double {
    type Err = XsdLexicalError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            value: match input {
                "INF" | "+INF" => f64::INFINITY,
                "-INF" => f64::NEG_INFINITY,
                "NaN" => f64::NAN,
                _ => {
                    if input.is_empty()
                        || !input
                            .bytes()
                            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
                    {
                        return Err(XsdLexicalError::new("double", input));
                    }
                    f64::from_str(input).map_err(|_| XsdLexicalError::new("double", input))?
                }
            },
        })
    }
}

impl fmt::Display for Double {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value == f64::INFINITY {
            f.write_str("INF")
        } else if self.value == f64::NEG_INFINITY {
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
    fn rounding_ties_go_up() {
        assert_eq!(Double::from(2.5).round(), Double::from(3.));
        assert_eq!(Double::from(-2.5).round(), Double::from(-2.));
        assert_eq!(Double::from(-2.6).round(), Double::from(-3.));
    }

    #[test]
    fn nan_is_not_equal_to_itself() {
        assert_ne!(Double::NAN, Double::NAN);
        assert_eq!(Double::NAN.total_cmp(Double::NAN), Ordering::Equal);
    }
}
