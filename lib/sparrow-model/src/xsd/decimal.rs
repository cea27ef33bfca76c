use crate::xsd::{Double, Float, Integer, XsdLexicalError};
use std::fmt;
use std::str::FromStr;

const FRACTION_DIGITS: u32 = 9;
const SCALE: i128 = 1_000_000_000;

/// [XML Schema `decimal` datatype](https://www.w3.org/TR/xmlschema11-2/#decimal)
///
/// It stores the value in an [`i128`] after multiplying it by 10⁹, giving
/// nine digits after the decimal point and up to twenty-nine before it.
/// Lexical forms with more than nine fractional digits are rejected rather
/// than silently truncated.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Copy, Hash, Default)]
pub struct Decimal {
    value: i128, // value * 10^9
}

impl Decimal {
    pub const MAX: Self = Self { value: i128::MAX };
    pub const MIN: Self = Self { value: i128::MIN };

    /// [op:numeric-add](https://www.w3.org/TR/xpath-functions-31/#func-numeric-add)
    ///
    /// Returns `None` in case of overflow.
    #[inline]
    #[must_use]
    pub fn checked_add(self, rhs: impl Into<Self>) -> Option<Self> {
        Some(Self {
            value: self.value.checked_add(rhs.into().value)?,
        })
    }

    /// [op:numeric-subtract](https://www.w3.org/TR/xpath-functions-31/#func-numeric-subtract)
    ///
    /// Returns `None` in case of overflow.
    #[inline]
    #[must_use]
    pub fn checked_sub(self, rhs: impl Into<Self>) -> Option<Self> {
        Some(Self {
            value: self.value.checked_sub(rhs.into().value)?,
        })
    }

    /// [op:numeric-multiply](https://www.w3.org/TR/xpath-functions-31/#func-numeric-multiply)
    ///
    /// The product is truncated towards zero at the ninth fractional digit.
    /// Returns `None` in case of overflow.
    #[must_use]
    pub fn checked_mul(self, rhs: impl Into<Self>) -> Option<Self> {
        let rhs = rhs.into();
        // (ai * S + af) * (bi * S + bf) / S = ai*bi*S + ai*bf + af*bi + af*bf/S
        let (ai, af) = (self.value / SCALE, self.value % SCALE);
        let (bi, bf) = (rhs.value / SCALE, rhs.value % SCALE);
        let mut value = ai.checked_mul(bi)?.checked_mul(SCALE)?;
        value = value.checked_add(ai.checked_mul(bf)?)?;
        value = value.checked_add(af.checked_mul(bi)?)?;
        value = value.checked_add(af * bf / SCALE)?;
        Some(Self { value })
    }

    /// [op:numeric-divide](https://www.w3.org/TR/xpath-functions-31/#func-numeric-divide)
    ///
    /// The quotient is truncated towards zero at the ninth fractional digit.
    /// Returns `None` in case of division by zero or overflow.
    #[inline]
    #[must_use]
    pub fn checked_div(self, rhs: impl Into<Self>) -> Option<Self> {
        let rhs = rhs.into();
        if rhs.value == 0 {
            return None;
        }
        Some(Self {
            value: self.value.checked_mul(SCALE)?.checked_div(rhs.value)?,
        })
    }

    /// [op:numeric-mod](https://www.w3.org/TR/xpath-functions-31/#func-numeric-mod)
    ///
    /// Returns `None` in case of division by zero or overflow.
    #[inline]
    #[must_use]
    pub fn checked_rem(self, rhs: impl Into<Self>) -> Option<Self> {
        let rhs = rhs.into();
        if rhs.value == 0 {
            return None;
        }
        Some(Self {
            value: self.value.checked_rem(rhs.value)?,
        })
    }

    /// [op:numeric-unary-minus](https://www.w3.org/TR/xpath-functions-31/#func-numeric-unary-minus)
    #[inline]
    #[must_use]
    pub fn checked_neg(self) -> Option<Self> {
        Some(Self {
            value: self.value.checked_neg()?,
        })
    }

    /// [fn:abs](https://www.w3.org/TR/xpath-functions-31/#func-abs)
    #[inline]
    #[must_use]
    pub fn checked_abs(self) -> Option<Self> {
        Some(Self {
            value: self.value.checked_abs()?,
        })
    }

    /// [fn:round](https://www.w3.org/TR/xpath-functions-31/#func-round): ties go towards positive infinity.
    #[inline]
    #[must_use]
    pub fn round(self) -> Self {
        let int = self.value / SCALE;
        let frac = self.value % SCALE;
        Self {
            value: if frac >= SCALE / 2 {
                (int + 1) * SCALE
            } else if frac < -(SCALE / 2) {
                (int - 1) * SCALE
            } else {
                int * SCALE
            },
        }
    }

    /// [fn:ceiling](https://www.w3.org/TR/xpath-functions-31/#func-ceiling)
    #[inline]
    #[must_use]
    pub fn ceil(self) -> Self {
        Self {
            value: if self.value > 0 && self.value % SCALE != 0 {
                (self.value / SCALE + 1) * SCALE
            } else {
                self.value / SCALE * SCALE
            },
        }
    }

    /// [fn:floor](https://www.w3.org/TR/xpath-functions-31/#func-floor)
    #[inline]
    #[must_use]
    pub fn floor(self) -> Self {
        Self {
            value: if self.value < 0 && self.value % SCALE != 0 {
                (self.value / SCALE - 1) * SCALE
            } else {
                self.value / SCALE * SCALE
            },
        }
    }

    /// Casts towards zero into an [`Integer`], returning `None` when out of range.
    #[inline]
    #[must_use]
    pub fn checked_integer(self) -> Option<Integer> {
        i64::try_from(self.value / SCALE).ok().map(Integer::from)
    }

    #[inline]
    #[must_use]
    pub fn is_negative(self) -> bool {
        self.value < 0
    }

    #[inline]
    #[must_use]
    pub fn is_positive(self) -> bool {
        self.value > 0
    }

    /// Approximates as a [`Float`], losing precision.
    #[inline]
    #[must_use]
    pub fn to_float(self) -> Float {
        ((self.value as f32) / (SCALE as f32)).into()
    }

    /// Approximates as a [`Double`], losing precision.
    #[inline]
    #[must_use]
    pub fn to_double(self) -> Double {
        ((self.value as f64) / (SCALE as f64)).into()
    }
}

impl From<Integer> for Decimal {
    #[inline]
    fn from(value: Integer) -> Self {
        Self {
            value: i128::from(i64::from(value)) * SCALE,
        }
    }
}

impl From<i32> for Decimal {
    #[inline]
    fn from(value: i32) -> Self {
        Self {
            value: i128::from(value) * SCALE,
        }
    }
}

impl From<i64> for Decimal {
    #[inline]
    fn from(value: i64) -> Self {
        Self {
            value: i128::from(value) * SCALE,
        }
    }
}

impl FromStr for Decimal {
    type Err = XsdLexicalError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let error = || XsdLexicalError::new("decimal", input);
        let (negative, unsigned) = match input.as_bytes().first() {
            Some(b'-') => (true, &input[1..]),
            Some(b'+') => (false, &input[1..]),
            _ => (false, input),
        };
        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (unsigned, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(error());
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(error());
        }
        if u32::try_from(frac_part.len()).map_err(|_| error())? > FRACTION_DIGITS {
            return Err(error());
        }
        let mut value: i128 = 0;
        for b in int_part.bytes() {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add((b - b'0').into()))
                .ok_or_else(error)?;
        }
        value = value.checked_mul(SCALE).ok_or_else(error)?;
        let mut frac: i128 = 0;
        for b in frac_part.bytes() {
            frac = frac * 10 + i128::from(b - b'0');
        }
        frac *= 10_i128.pow(FRACTION_DIGITS - u32::try_from(frac_part.len()).map_err(|_| error())?);
        value = value.checked_add(frac).ok_or_else(error)?;
        if negative {
            value = -value;
        }
        Ok(Self { value })
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value < 0 {
            f.write_str("-")?;
        }
        let magnitude = self.value.unsigned_abs();
        let int_part = magnitude / SCALE.unsigned_abs();
        let mut frac_part = magnitude % SCALE.unsigned_abs();
        write!(f, "{int_part}")?;
        if frac_part != 0 {
            let mut digits = FRACTION_DIGITS;
            while frac_part % 10 == 0 {
                frac_part /= 10;
                digits -= 1;
            }
            write!(f, ".{frac_part:0>width$}", width = digits as usize)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_round_trips() {
        for lexical in ["0", "1", "-1", "12.5", "-0.25", "100.001"] {
            assert_eq!(Decimal::from_str(lexical).unwrap().to_string(), lexical);
        }
        assert_eq!(Decimal::from_str("+1.50").unwrap().to_string(), "1.5");
        assert_eq!(Decimal::from_str(".5").unwrap().to_string(), "0.5");
        assert!(Decimal::from_str(".").is_err());
        assert!(Decimal::from_str("1e3").is_err());
    }

    #[test]
    fn multiplication_keeps_scale() {
        let a = Decimal::from_str("1.5").unwrap();
        let b = Decimal::from_str("2.5").unwrap();
        assert_eq!(a.checked_mul(b).unwrap().to_string(), "3.75");
    }

    #[test]
    fn division_truncates() {
        let a = Decimal::from(1);
        let b = Decimal::from(3);
        assert_eq!(
            a.checked_div(b).unwrap().to_string(),
            "0.333333333"
        );
        assert_eq!(a.checked_div(Decimal::from(0)), None);
    }

    #[test]
    fn rounding_ties_go_up() {
        assert_eq!(Decimal::from_str("2.5").unwrap().round(), 3.into());
        assert_eq!(Decimal::from_str("-2.5").unwrap().round(), Decimal::from(-2));
        assert_eq!(Decimal::from_str("2.4").unwrap().floor(), 2.into());
        assert_eq!(Decimal::from_str("-2.4").unwrap().floor(), Decimal::from(-3));
        assert_eq!(Decimal::from_str("2.4").unwrap().ceil(), 3.into());
    }
}
