//! Value-level semantics of RDF terms: effective boolean value, value
//! equality and comparison, the total `ORDER BY` ordering, the numeric
//! promotion chain integer ⊂ decimal ⊂ float ⊂ double, language-range
//! matching and casts.

use crate::error::ExpressionError;
use sparrow_model::vocab::xsd;
use sparrow_model::xsd::{Boolean, Date, DateTime, Decimal, Double, Float, Integer};
use sparrow_model::{Literal, NamedNode, NamedNodeRef, Term};
use std::cmp::Ordering;
use std::str::FromStr;

/// A decoded numeric value, in one of the four kinds of the promotion chain.
#[derive(Debug, Clone, Copy)]
pub enum Numeric {
    Integer(Integer),
    Decimal(Decimal),
    Float(Float),
    Double(Double),
}

impl Numeric {
    fn rank(self) -> u8 {
        match self {
            Self::Integer(_) => 0,
            Self::Decimal(_) => 1,
            Self::Float(_) => 2,
            Self::Double(_) => 3,
        }
    }

    fn as_float(self) -> Float {
        match self {
            Self::Integer(v) => v.into(),
            Self::Decimal(v) => v.to_float(),
            Self::Float(v) => v,
            Self::Double(v) => Float::from(f64::from(v) as f32),
        }
    }

    fn as_double(self) -> Double {
        match self {
            Self::Integer(v) => v.into(),
            Self::Decimal(v) => v.to_double(),
            Self::Float(v) => v.into(),
            Self::Double(v) => v,
        }
    }

    pub fn is_nan(self) -> bool {
        match self {
            Self::Integer(_) | Self::Decimal(_) => false,
            Self::Float(v) => v.is_nan(),
            Self::Double(v) => v.is_nan(),
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Self::Integer(v) => v == Integer::from(0),
            Self::Decimal(v) => v == Decimal::from(0),
            Self::Float(v) => v == Float::from(0.),
            Self::Double(v) => v == Double::from(0.),
        }
    }

    /// The literal with the canonical lexical form of this value.
    pub fn to_literal(self) -> Literal {
        match self {
            Self::Integer(v) => v.into(),
            Self::Decimal(v) => v.into(),
            Self::Float(v) => v.into(),
            Self::Double(v) => v.into(),
        }
    }

    pub fn to_term(self) -> Term {
        self.to_literal().into()
    }
}

impl From<Numeric> for Term {
    fn from(value: Numeric) -> Self {
        value.to_term()
    }
}

/// Promotes a pair to the widest of the two kinds.
fn promote(a: Numeric, b: Numeric) -> (Numeric, Numeric) {
    let rank = a.rank().max(b.rank());
    let widen = |v: Numeric| match rank {
        0 | 1 => match v {
            Numeric::Integer(i) => Numeric::Decimal(i.into()),
            other => other,
        },
        2 => Numeric::Float(v.as_float()),
        _ => Numeric::Double(v.as_double()),
    };
    if a.rank() == b.rank() {
        (a, b)
    } else {
        (widen(a), widen(b))
    }
}

/// Is this datatype one of the numeric XSD datatypes the engine evaluates?
pub(crate) fn is_numeric_datatype(datatype: NamedNodeRef<'_>) -> bool {
    datatype == xsd::INTEGER
        || datatype == xsd::DECIMAL
        || datatype == xsd::FLOAT
        || datatype == xsd::DOUBLE
        || is_derived_integer_datatype(datatype)
}

fn is_derived_integer_datatype(datatype: NamedNodeRef<'_>) -> bool {
    datatype == xsd::LONG
        || datatype == xsd::INT
        || datatype == xsd::SHORT
        || datatype == xsd::BYTE
        || datatype == xsd::UNSIGNED_LONG
        || datatype == xsd::UNSIGNED_INT
        || datatype == xsd::UNSIGNED_SHORT
        || datatype == xsd::UNSIGNED_BYTE
        || datatype == xsd::POSITIVE_INTEGER
        || datatype == xsd::NEGATIVE_INTEGER
        || datatype == xsd::NON_NEGATIVE_INTEGER
        || datatype == xsd::NON_POSITIVE_INTEGER
}

fn derived_integer_in_range(datatype: NamedNodeRef<'_>, value: i64) -> bool {
    if datatype == xsd::LONG {
        true
    } else if datatype == xsd::INT {
        i64::from(i32::MIN) <= value && value <= i64::from(i32::MAX)
    } else if datatype == xsd::SHORT {
        i64::from(i16::MIN) <= value && value <= i64::from(i16::MAX)
    } else if datatype == xsd::BYTE {
        i64::from(i8::MIN) <= value && value <= i64::from(i8::MAX)
    } else if datatype == xsd::UNSIGNED_LONG || datatype == xsd::NON_NEGATIVE_INTEGER {
        value >= 0
    } else if datatype == xsd::UNSIGNED_INT {
        0 <= value && value <= i64::from(u32::MAX)
    } else if datatype == xsd::UNSIGNED_SHORT {
        0 <= value && value <= i64::from(u16::MAX)
    } else if datatype == xsd::UNSIGNED_BYTE {
        0 <= value && value <= i64::from(u8::MAX)
    } else if datatype == xsd::POSITIVE_INTEGER {
        value > 0
    } else if datatype == xsd::NEGATIVE_INTEGER {
        value < 0
    } else if datatype == xsd::NON_POSITIVE_INTEGER {
        value <= 0
    } else {
        true
    }
}

/// Decodes a numeric typed literal.
///
/// Returns `Ok(None)` when the term is not a numeric literal at all, and
/// [`ExpressionError::MalformedLiteral`] when it claims a numeric datatype
/// but its lexical form does not parse.
pub(crate) fn numeric_value(term: &Term) -> Result<Option<Numeric>, ExpressionError> {
    let Term::Literal(literal) = term else {
        return Ok(None);
    };
    let datatype = literal.datatype();
    let value = literal.value();
    let result = if datatype == xsd::INTEGER {
        Integer::from_str(value)
            .map(Numeric::Integer)
            .map_err(|_| ExpressionError::MalformedLiteral)
    } else if datatype == xsd::DECIMAL {
        Decimal::from_str(value)
            .map(Numeric::Decimal)
            .map_err(|_| ExpressionError::MalformedLiteral)
    } else if datatype == xsd::FLOAT {
        Float::from_str(value)
            .map(Numeric::Float)
            .map_err(|_| ExpressionError::MalformedLiteral)
    } else if datatype == xsd::DOUBLE {
        Double::from_str(value)
            .map(Numeric::Double)
            .map_err(|_| ExpressionError::MalformedLiteral)
    } else if is_derived_integer_datatype(datatype) {
        Integer::from_str(value)
            .ok()
            .filter(|i| derived_integer_in_range(datatype, (*i).into()))
            .map(Numeric::Integer)
            .ok_or(ExpressionError::MalformedLiteral)
    } else {
        return Ok(None);
    };
    result.map(Some)
}

/// Decodes an `xsd:dateTime` or `xsd:date` literal into an instant.
pub(crate) fn date_time_value(term: &Term) -> Result<Option<DateTime>, ExpressionError> {
    let Term::Literal(literal) = term else {
        return Ok(None);
    };
    if literal.datatype() == xsd::DATE_TIME {
        DateTime::from_str(literal.value())
            .map(Some)
            .map_err(|_| ExpressionError::MalformedLiteral)
    } else if literal.datatype() == xsd::DATE {
        Date::from_str(literal.value())
            .map(|d| Some(d.to_date_time()))
            .map_err(|_| ExpressionError::MalformedLiteral)
    } else {
        Ok(None)
    }
}

/// The SPARQL [effective boolean value](https://www.w3.org/TR/sparql11-query/#ebv).
///
/// Following the SPARQL rules, a boolean or numeric literal whose lexical
/// form is invalid has the EBV `false` rather than raising an error.
pub(crate) fn effective_boolean_value(term: &Term) -> Result<bool, ExpressionError> {
    let Term::Literal(literal) = term else {
        return Err(ExpressionError::TypeMismatch);
    };
    if literal.datatype() == xsd::BOOLEAN {
        return Ok(Boolean::from_str(literal.value()).map(bool::from).unwrap_or(false));
    }
    if literal.is_plain() {
        return Ok(!literal.value().is_empty());
    }
    if is_numeric_datatype(literal.datatype()) {
        return Ok(match numeric_value(term) {
            Ok(Some(value)) => !value.is_zero() && !value.is_nan(),
            _ => false,
        });
    }
    Err(ExpressionError::TypeMismatch)
}

/// Value equality: numeric promotion for numerics, instant comparison for
/// date-times, string comparison for plain literals; an error across
/// incomparable literal types.
pub(crate) fn value_eq(a: &Term, b: &Term) -> Result<bool, ExpressionError> {
    match (a, b) {
        (Term::NamedNode(a), Term::NamedNode(b)) => Ok(a == b),
        (Term::BlankNode(a), Term::BlankNode(b)) => Ok(a == b),
        (Term::Literal(la), Term::Literal(lb)) => {
            if let (Some(a), Some(b)) = (numeric_value(a)?, numeric_value(b)?) {
                let (a, b) = promote(a, b);
                return Ok(numeric_cmp(a, b) == Some(Ordering::Equal));
            }
            if la.is_plain() && lb.is_plain() {
                return Ok(la.value() == lb.value() && la.language() == lb.language());
            }
            if la.datatype() == xsd::BOOLEAN && lb.datatype() == xsd::BOOLEAN {
                let a = Boolean::from_str(la.value()).map_err(|_| ExpressionError::MalformedLiteral)?;
                let b = Boolean::from_str(lb.value()).map_err(|_| ExpressionError::MalformedLiteral)?;
                return Ok(a == b);
            }
            if let (Some(a), Some(b)) = (date_time_value(a)?, date_time_value(b)?) {
                return Ok(a == b);
            }
            // Unknown datatypes: same term is equal, anything else is an error
            if la == lb {
                Ok(true)
            } else {
                Err(ExpressionError::TypeMismatch)
            }
        }
        _ => Ok(false),
    }
}

fn numeric_cmp(a: Numeric, b: Numeric) -> Option<Ordering> {
    match (a, b) {
        (Numeric::Integer(a), Numeric::Integer(b)) => Some(a.cmp(&b)),
        (Numeric::Decimal(a), Numeric::Decimal(b)) => Some(a.cmp(&b)),
        (Numeric::Float(a), Numeric::Float(b)) => a.partial_cmp(&b),
        (Numeric::Double(a), Numeric::Double(b)) => a.partial_cmp(&b),
        _ => {
            let (a, b) = promote(a, b);
            numeric_cmp(a, b)
        }
    }
}

/// Value comparison for the `<`, `>`, `<=`, `>=` operators.
///
/// `Ok(None)` is the unordered case (a NaN operand): every comparison with
/// it is false without being an error.
pub(crate) fn value_cmp(a: &Term, b: &Term) -> Result<Option<Ordering>, ExpressionError> {
    if let (Some(na), Some(nb)) = (numeric_value(a)?, numeric_value(b)?) {
        let (na, nb) = promote(na, nb);
        return Ok(numeric_cmp(na, nb));
    }
    match (a, b) {
        (Term::Literal(la), Term::Literal(lb)) => {
            if la.is_plain() && lb.is_plain() {
                return Ok(Some(
                    la.value()
                        .cmp(lb.value())
                        .then_with(|| la.language().cmp(&lb.language())),
                ));
            }
            if la.datatype() == xsd::BOOLEAN && lb.datatype() == xsd::BOOLEAN {
                let a = Boolean::from_str(la.value()).map_err(|_| ExpressionError::MalformedLiteral)?;
                let b = Boolean::from_str(lb.value()).map_err(|_| ExpressionError::MalformedLiteral)?;
                return Ok(Some(a.cmp(&b)));
            }
            if let (Some(a), Some(b)) = (date_time_value(a)?, date_time_value(b)?) {
                return Ok(Some(a.cmp(&b)));
            }
            Err(ExpressionError::TypeMismatch)
        }
        _ => Err(ExpressionError::TypeMismatch),
    }
}

/// The total row ordering used by `ORDER BY` and the sort-based operators:
/// unbound < blank < IRI < plain literal < typed literal, each kind ordered
/// internally, so results are deterministic.
pub(crate) fn order_cmp(a: Option<&Term>, b: Option<&Term>) -> Ordering {
    let rank = |term: Option<&Term>| match term {
        None => 0_u8,
        Some(Term::BlankNode(_)) => 1,
        Some(Term::NamedNode(_)) => 2,
        Some(Term::Literal(literal)) => {
            if literal.is_plain() {
                3
            } else {
                4
            }
        }
    };
    rank(a).cmp(&rank(b)).then_with(|| match (a, b) {
        (Some(Term::BlankNode(a)), Some(Term::BlankNode(b))) => a.as_str().cmp(b.as_str()),
        (Some(Term::NamedNode(a)), Some(Term::NamedNode(b))) => a.as_str().cmp(b.as_str()),
        (Some(a @ Term::Literal(la)), Some(b @ Term::Literal(lb))) => {
            if la.is_plain() && lb.is_plain() {
                return la
                    .value()
                    .cmp(lb.value())
                    .then_with(|| la.language().cmp(&lb.language()));
            }
            if let (Ok(Some(na)), Ok(Some(nb))) = (numeric_value(a), numeric_value(b)) {
                let (na, nb) = promote(na, nb);
                if let Some(ordering) = total_numeric_cmp(na, nb) {
                    return ordering;
                }
            }
            if let (Ok(Some(da)), Ok(Some(db))) = (date_time_value(a), date_time_value(b)) {
                return da.cmp(&db);
            }
            la.datatype()
                .as_str()
                .cmp(lb.datatype().as_str())
                .then_with(|| la.value().cmp(lb.value()))
        }
        _ => Ordering::Equal,
    })
}

fn total_numeric_cmp(a: Numeric, b: Numeric) -> Option<Ordering> {
    Some(match (a, b) {
        (Numeric::Integer(a), Numeric::Integer(b)) => a.cmp(&b),
        (Numeric::Decimal(a), Numeric::Decimal(b)) => a.cmp(&b),
        (Numeric::Float(a), Numeric::Float(b)) => a.total_cmp(b),
        (Numeric::Double(a), Numeric::Double(b)) => a.total_cmp(b),
        _ => return None,
    })
}

/// [RFC 4647](https://tools.ietf.org/html/rfc4647#section-3.3.1) basic filtering.
///
/// `*` matches any non-empty tag; otherwise a case-insensitive prefix match
/// on `-` separated subtags.
pub(crate) fn lang_matches(tag: &str, range: &str) -> bool {
    if range == "*" {
        return !tag.is_empty();
    }
    let mut tag_subtags = tag.split('-');
    let mut range_subtags = range.split('-');
    loop {
        match range_subtags.next() {
            None => return true,
            Some(range_subtag) => match tag_subtags.next() {
                None => return false,
                Some(tag_subtag) => {
                    if !tag_subtag.eq_ignore_ascii_case(range_subtag) {
                        return false;
                    }
                }
            },
        }
    }
}

/// The string value and language of a plain or `xsd:string` literal, the
/// only argument types the string builtins accept.
pub(crate) fn string_literal(term: &Term) -> Result<(&str, Option<&str>), ExpressionError> {
    match term {
        Term::Literal(literal) if literal.is_plain() => {
            Ok((literal.value(), literal.language()))
        }
        _ => Err(ExpressionError::TypeMismatch),
    }
}

/// The SPARQL argument-compatibility rule for two-argument string builtins:
/// the result language is the first argument's when legal.
pub(crate) fn compatible_string_pair<'a>(
    a: &'a Term,
    b: &'a Term,
) -> Result<(&'a str, &'a str, Option<&'a str>), ExpressionError> {
    let (a_value, a_language) = string_literal(a)?;
    let (b_value, b_language) = string_literal(b)?;
    match (a_language, b_language) {
        (_, None) => Ok((a_value, b_value, a_language)),
        (Some(a_tag), Some(b_tag)) if a_tag == b_tag => Ok((a_value, b_value, a_language)),
        _ => Err(ExpressionError::TypeMismatch),
    }
}

/// The `STR()` coercion: lexical form of a literal or the text of an IRI.
pub(crate) fn str_value(term: &Term) -> Result<String, ExpressionError> {
    match term {
        Term::NamedNode(node) => Ok(node.as_str().to_owned()),
        Term::Literal(literal) => Ok(literal.value().to_owned()),
        Term::BlankNode(_) => Err(ExpressionError::TypeMismatch),
    }
}

/// A cast in the `xsd:integer(?x)` style.
///
/// Blank nodes are never castable; IRIs only cast to `xsd:string`.
pub(crate) fn cast(term: &Term, datatype: &NamedNode) -> Result<Term, ExpressionError> {
    let target = datatype.as_ref();
    if target == xsd::STRING {
        return Ok(Literal::new_simple_literal(str_value(term)?).into());
    }
    let Term::Literal(literal) = term else {
        return Err(ExpressionError::TypeMismatch);
    };
    let value = literal.value();
    if target == xsd::BOOLEAN {
        let result = if literal.datatype() == xsd::BOOLEAN || literal.is_plain() {
            Boolean::from_str(value.trim()).map_err(|_| ExpressionError::MalformedLiteral)?
        } else if is_numeric_datatype(literal.datatype()) {
            match numeric_value(term)? {
                Some(v) => Boolean::from(!v.is_zero() && !v.is_nan()),
                None => return Err(ExpressionError::TypeMismatch),
            }
        } else {
            return Err(ExpressionError::TypeMismatch);
        };
        return Ok(Literal::from(result).into());
    }
    if target == xsd::INTEGER || is_derived_integer_datatype(target) {
        let integer = match numeric_value(term)? {
            Some(Numeric::Integer(v)) => v,
            Some(Numeric::Decimal(v)) => v.checked_integer().ok_or(ExpressionError::Overflow)?,
            Some(Numeric::Float(v)) => v.checked_integer().ok_or(ExpressionError::Overflow)?,
            Some(Numeric::Double(v)) => v.checked_integer().ok_or(ExpressionError::Overflow)?,
            None => {
                if literal.datatype() == xsd::BOOLEAN {
                    Boolean::from_str(value)
                        .map(Integer::from)
                        .map_err(|_| ExpressionError::MalformedLiteral)?
                } else if literal.is_plain() {
                    Integer::from_str(value.trim())
                        .map_err(|_| ExpressionError::MalformedLiteral)?
                } else {
                    return Err(ExpressionError::TypeMismatch);
                }
            }
        };
        if !derived_integer_in_range(target, integer.into()) {
            return Err(ExpressionError::Overflow);
        }
        return Ok(Literal::new_typed_literal(integer.to_string(), datatype.clone()).into());
    }
    if target == xsd::DECIMAL {
        let decimal = match numeric_value(term)? {
            Some(Numeric::Integer(v)) => Decimal::from(v),
            Some(Numeric::Decimal(v)) => v,
            Some(Numeric::Float(v)) => Decimal::from_str(&v.to_string())
                .map_err(|_| ExpressionError::Overflow)?,
            Some(Numeric::Double(v)) => Decimal::from_str(&v.to_string())
                .map_err(|_| ExpressionError::Overflow)?,
            None => {
                if literal.datatype() == xsd::BOOLEAN {
                    let b = Boolean::from_str(value).map_err(|_| ExpressionError::MalformedLiteral)?;
                    Decimal::from(Integer::from(b))
                } else if literal.is_plain() {
                    Decimal::from_str(value.trim())
                        .map_err(|_| ExpressionError::MalformedLiteral)?
                } else {
                    return Err(ExpressionError::TypeMismatch);
                }
            }
        };
        return Ok(Literal::from(decimal).into());
    }
    if target == xsd::FLOAT {
        let float = match numeric_value(term)? {
            Some(v) => v.as_float(),
            None => {
                if literal.datatype() == xsd::BOOLEAN {
                    let b = Boolean::from_str(value).map_err(|_| ExpressionError::MalformedLiteral)?;
                    Float::from(b)
                } else if literal.is_plain() {
                    Float::from_str(value.trim()).map_err(|_| ExpressionError::MalformedLiteral)?
                } else {
                    return Err(ExpressionError::TypeMismatch);
                }
            }
        };
        return Ok(Literal::from(float).into());
    }
    if target == xsd::DOUBLE {
        let double = match numeric_value(term)? {
            Some(v) => v.as_double(),
            None => {
                if literal.datatype() == xsd::BOOLEAN {
                    let b = Boolean::from_str(value).map_err(|_| ExpressionError::MalformedLiteral)?;
                    Double::from(b)
                } else if literal.is_plain() {
                    Double::from_str(value.trim()).map_err(|_| ExpressionError::MalformedLiteral)?
                } else {
                    return Err(ExpressionError::TypeMismatch);
                }
            }
        };
        return Ok(Literal::from(double).into());
    }
    if target == xsd::DATE_TIME {
        if literal.datatype() == xsd::DATE_TIME || literal.is_plain() {
            let parsed =
                DateTime::from_str(value.trim()).map_err(|_| ExpressionError::MalformedLiteral)?;
            return Ok(Literal::from(parsed).into());
        }
        if literal.datatype() == xsd::DATE {
            let parsed =
                Date::from_str(value).map_err(|_| ExpressionError::MalformedLiteral)?;
            return Ok(Literal::from(parsed.to_date_time()).into());
        }
        return Err(ExpressionError::TypeMismatch);
    }
    if target == xsd::DATE {
        if literal.datatype() == xsd::DATE || literal.is_plain() {
            let parsed =
                Date::from_str(value.trim()).map_err(|_| ExpressionError::MalformedLiteral)?;
            return Ok(Literal::from(parsed).into());
        }
        if literal.datatype() == xsd::DATE_TIME {
            let parsed =
                DateTime::from_str(value).map_err(|_| ExpressionError::MalformedLiteral)?;
            return Ok(Literal::from(parsed.date()).into());
        }
        return Err(ExpressionError::TypeMismatch);
    }
    Err(ExpressionError::UnsupportedCast(datatype.clone()))
}

/// [op:numeric-add](https://www.w3.org/TR/xpath-functions-31/#func-numeric-add) with promotion.
pub(crate) fn numeric_add(a: Numeric, b: Numeric) -> Result<Numeric, ExpressionError> {
    match promote(a, b) {
        (Numeric::Integer(a), Numeric::Integer(b)) => a
            .checked_add(b)
            .map(Numeric::Integer)
            .ok_or(ExpressionError::Overflow),
        (Numeric::Decimal(a), Numeric::Decimal(b)) => a
            .checked_add(b)
            .map(Numeric::Decimal)
            .ok_or(ExpressionError::Overflow),
        (Numeric::Float(a), Numeric::Float(b)) => {
            Ok(Numeric::Float((f32::from(a) + f32::from(b)).into()))
        }
        (a, b) => Ok(Numeric::Double(
            (f64::from(a.as_double()) + f64::from(b.as_double())).into(),
        )),
    }
}

/// [op:numeric-subtract](https://www.w3.org/TR/xpath-functions-31/#func-numeric-subtract) with promotion.
pub(crate) fn numeric_sub(a: Numeric, b: Numeric) -> Result<Numeric, ExpressionError> {
    match promote(a, b) {
        (Numeric::Integer(a), Numeric::Integer(b)) => a
            .checked_sub(b)
            .map(Numeric::Integer)
            .ok_or(ExpressionError::Overflow),
        (Numeric::Decimal(a), Numeric::Decimal(b)) => a
            .checked_sub(b)
            .map(Numeric::Decimal)
            .ok_or(ExpressionError::Overflow),
        (Numeric::Float(a), Numeric::Float(b)) => {
            Ok(Numeric::Float((f32::from(a) - f32::from(b)).into()))
        }
        (a, b) => Ok(Numeric::Double(
            (f64::from(a.as_double()) - f64::from(b.as_double())).into(),
        )),
    }
}

/// [op:numeric-multiply](https://www.w3.org/TR/xpath-functions-31/#func-numeric-multiply) with promotion.
pub(crate) fn numeric_mul(a: Numeric, b: Numeric) -> Result<Numeric, ExpressionError> {
    match promote(a, b) {
        (Numeric::Integer(a), Numeric::Integer(b)) => a
            .checked_mul(b)
            .map(Numeric::Integer)
            .ok_or(ExpressionError::Overflow),
        (Numeric::Decimal(a), Numeric::Decimal(b)) => a
            .checked_mul(b)
            .map(Numeric::Decimal)
            .ok_or(ExpressionError::Overflow),
        (Numeric::Float(a), Numeric::Float(b)) => {
            Ok(Numeric::Float((f32::from(a) * f32::from(b)).into()))
        }
        (a, b) => Ok(Numeric::Double(
            (f64::from(a.as_double()) * f64::from(b.as_double())).into(),
        )),
    }
}

/// [op:numeric-divide](https://www.w3.org/TR/xpath-functions-31/#func-numeric-divide):
/// integer ÷ integer yields a decimal; division by a zero integer or decimal
/// is an error while float division follows IEEE 754.
pub(crate) fn numeric_div(a: Numeric, b: Numeric) -> Result<Numeric, ExpressionError> {
    match promote(a, b) {
        (Numeric::Integer(a), Numeric::Integer(b)) => Decimal::from(a)
            .checked_div(Decimal::from(b))
            .map(Numeric::Decimal)
            .ok_or(ExpressionError::DivideByZero),
        (Numeric::Decimal(a), Numeric::Decimal(b)) => a
            .checked_div(b)
            .map(Numeric::Decimal)
            .ok_or(ExpressionError::DivideByZero),
        (Numeric::Float(a), Numeric::Float(b)) => {
            Ok(Numeric::Float((f32::from(a) / f32::from(b)).into()))
        }
        (a, b) => Ok(Numeric::Double(
            (f64::from(a.as_double()) / f64::from(b.as_double())).into(),
        )),
    }
}

/// [op:numeric-unary-minus](https://www.w3.org/TR/xpath-functions-31/#func-numeric-unary-minus).
pub(crate) fn numeric_neg(value: Numeric) -> Result<Numeric, ExpressionError> {
    match value {
        Numeric::Integer(v) => v
            .checked_neg()
            .map(Numeric::Integer)
            .ok_or(ExpressionError::Overflow),
        Numeric::Decimal(v) => v
            .checked_neg()
            .map(Numeric::Decimal)
            .ok_or(ExpressionError::Overflow),
        Numeric::Float(v) => Ok(Numeric::Float((-f32::from(v)).into())),
        Numeric::Double(v) => Ok(Numeric::Double((-f64::from(v)).into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integer(value: &str) -> Term {
        Literal::new_typed_literal(value, xsd::INTEGER).into()
    }

    fn string(value: &str) -> Term {
        Literal::new_simple_literal(value).into()
    }

    #[test]
    fn ebv_follows_the_sparql_table() {
        assert!(effective_boolean_value(&string("x")).unwrap());
        assert!(!effective_boolean_value(&string("")).unwrap());
        assert!(effective_boolean_value(&integer("5")).unwrap());
        assert!(!effective_boolean_value(&integer("0")).unwrap());
        assert!(!effective_boolean_value(
            &Literal::new_typed_literal("NaN", xsd::DOUBLE).into()
        )
        .unwrap());
        // Invalid lexical forms give false, not an error
        assert!(!effective_boolean_value(
            &Literal::new_typed_literal("abc", xsd::BOOLEAN).into()
        )
        .unwrap());
        assert!(effective_boolean_value(
            &Term::NamedNode(NamedNode::new_unchecked("http://example.com"))
        )
        .is_err());
    }

    #[test]
    fn numeric_equality_promotes() {
        assert!(value_eq(
            &integer("1"),
            &Literal::new_typed_literal("1.0", xsd::DECIMAL).into()
        )
        .unwrap());
        assert!(!value_eq(&integer("1"), &integer("2")).unwrap());
        // Same lexical form under unrelated datatypes is an error, not false
        let custom: Term =
            Literal::new_typed_literal("a", NamedNode::new_unchecked("http://example.com/dt"))
                .into();
        let other: Term =
            Literal::new_typed_literal("b", NamedNode::new_unchecked("http://example.com/dt"))
                .into();
        assert!(value_eq(&custom, &custom.clone()).unwrap());
        assert!(value_eq(&custom, &other).is_err());
    }

    #[test]
    fn integer_division_yields_decimal() {
        let result = numeric_div(
            Numeric::Integer(1.into()),
            Numeric::Integer(Integer::from(2)),
        )
        .unwrap();
        assert_eq!(result.to_literal().datatype(), xsd::DECIMAL);
        assert_eq!(result.to_literal().value(), "0.5");
        assert!(matches!(
            numeric_div(Numeric::Integer(1.into()), Numeric::Integer(0.into())),
            Err(ExpressionError::DivideByZero)
        ));
    }

    #[test]
    fn lang_matches_is_rfc4647_basic() {
        assert!(lang_matches("en-US", "en"));
        assert!(!lang_matches("en", "en-US"));
        assert!(lang_matches("fr-CA", "*"));
        assert!(!lang_matches("", "*"));
        assert!(lang_matches("en-us", "EN-US"));
    }

    #[test]
    fn ordering_ranks_term_kinds() {
        let blank = Term::BlankNode(sparrow_model::BlankNode::new_unchecked("b"));
        let iri = Term::NamedNode(NamedNode::new_unchecked("http://example.com"));
        let plain = string("zzz");
        let typed = integer("1");
        assert_eq!(order_cmp(None, Some(&blank)), Ordering::Less);
        assert_eq!(order_cmp(Some(&blank), Some(&iri)), Ordering::Less);
        assert_eq!(order_cmp(Some(&iri), Some(&plain)), Ordering::Less);
        assert_eq!(order_cmp(Some(&plain), Some(&typed)), Ordering::Less);
        assert_eq!(
            order_cmp(Some(&integer("2")), Some(&integer("10"))),
            Ordering::Less
        );
    }

    #[test]
    fn casts() {
        let two_and_a_half: Term = Literal::new_typed_literal("2.5", xsd::DECIMAL).into();
        assert_eq!(
            cast(&two_and_a_half, &xsd::INTEGER.into_owned()).unwrap(),
            integer("2")
        );
        assert_eq!(
            cast(&string("13"), &xsd::INTEGER.into_owned()).unwrap(),
            integer("13")
        );
        assert!(cast(&string("abc"), &xsd::INTEGER.into_owned()).is_err());
        assert!(cast(
            &Term::BlankNode(sparrow_model::BlankNode::new_unchecked("b")),
            &xsd::INTEGER.into_owned()
        )
        .is_err());
    }
}
