//! The expression evaluator: a pure recursive walk from (expression tree,
//! row, evaluation context) to a term or the SPARQL error sentinel.
//!
//! The return type is `Result<Option<Term>, ExpressionError>`: `Ok(None)`
//! is SPARQL "unbound", `Err(_)` is SPARQL "error". Filter, LeftJoin,
//! COALESCE and the `&&`/`||` truth tables depend on the distinction.

use crate::context::EvalContext;
use crate::error::ExpressionError;
use crate::row::Row;
use crate::value::{
    self, cast, compatible_string_pair, date_time_value, effective_boolean_value, lang_matches,
    numeric_value, str_value, string_literal, value_cmp, value_eq, Numeric,
};
use md5::{Digest, Md5};
use oxiri::Iri;
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use sparrow_algebra::{Expression, Function, PatternLiteral};
use sparrow_model::vocab::xsd;
use sparrow_model::xsd::{DateTime, Integer};
use sparrow_model::{Literal, NamedNode, Term};
use std::cmp::Ordering;
use std::fmt::Write;

/// Evaluates an expression against one row.
pub(crate) fn evaluate_expression(
    expression: &Expression,
    row: &Row,
    context: &EvalContext,
) -> Result<Option<Term>, ExpressionError> {
    match expression {
        Expression::NamedNode(node) => Ok(Some(node.clone().into())),
        Expression::Literal(literal) => Ok(Some(literal.clone().into())),
        Expression::Variable(variable) => Ok(context
            .variables
            .offset(variable.as_str())
            .and_then(|offset| row.get(offset).cloned())),
        Expression::Or(a, b) => {
            let a = boolean_of(a, row, context);
            let b = boolean_of(b, row, context);
            match (a, b) {
                (Ok(true), _) | (_, Ok(true)) => boolean(true),
                (Ok(false), Ok(false)) => boolean(false),
                (Err(e), _) | (_, Err(e)) => Err(e),
            }
        }
        Expression::And(a, b) => {
            let a = boolean_of(a, row, context);
            let b = boolean_of(b, row, context);
            match (a, b) {
                (Ok(false), _) | (_, Ok(false)) => boolean(false),
                (Ok(true), Ok(true)) => boolean(true),
                (Err(e), _) | (_, Err(e)) => Err(e),
            }
        }
        Expression::Not(e) => boolean(!boolean_of(e, row, context)?),
        Expression::Equal(a, b) => {
            let a = required(evaluate_expression(a, row, context)?)?;
            let b = required(evaluate_expression(b, row, context)?)?;
            boolean(value_eq(&a, &b)?)
        }
        Expression::NotEqual(a, b) => {
            let a = required(evaluate_expression(a, row, context)?)?;
            let b = required(evaluate_expression(b, row, context)?)?;
            boolean(!value_eq(&a, &b)?)
        }
        Expression::Less(a, b) => compare(a, b, row, context, |o| o == Ordering::Less),
        Expression::LessOrEqual(a, b) => compare(a, b, row, context, |o| o != Ordering::Greater),
        Expression::Greater(a, b) => compare(a, b, row, context, |o| o == Ordering::Greater),
        Expression::GreaterOrEqual(a, b) => compare(a, b, row, context, |o| o != Ordering::Less),
        Expression::StrEqual(a, b) => {
            let a = str_value(&required(evaluate_expression(a, row, context)?)?)?;
            let b = str_value(&required(evaluate_expression(b, row, context)?)?)?;
            boolean(a.eq_ignore_ascii_case(&b))
        }
        Expression::StrNotEqual(a, b) => {
            let a = str_value(&required(evaluate_expression(a, row, context)?)?)?;
            let b = str_value(&required(evaluate_expression(b, row, context)?)?)?;
            boolean(!a.eq_ignore_ascii_case(&b))
        }
        Expression::StrMatch(e, pattern) => boolean(pattern_match(e, pattern, row, context)?),
        Expression::StrNotMatch(e, pattern) => boolean(!pattern_match(e, pattern, row, context)?),
        Expression::Add(a, b) => {
            let (a, b) = numeric_pair(a, b, row, context)?;
            Ok(Some(value::numeric_add(a, b)?.to_term()))
        }
        Expression::Subtract(a, b) => {
            let (a, b) = numeric_pair(a, b, row, context)?;
            Ok(Some(value::numeric_sub(a, b)?.to_term()))
        }
        Expression::Multiply(a, b) => {
            let (a, b) = numeric_pair(a, b, row, context)?;
            Ok(Some(value::numeric_mul(a, b)?.to_term()))
        }
        Expression::Divide(a, b) => {
            let (a, b) = numeric_pair(a, b, row, context)?;
            Ok(Some(value::numeric_div(a, b)?.to_term()))
        }
        Expression::Remainder(a, b) => {
            let a = integer_of(a, row, context)?;
            let b = integer_of(b, row, context)?;
            let result = a.checked_rem(b).ok_or(ExpressionError::DivideByZero)?;
            Ok(Some(Literal::from(result).into()))
        }
        Expression::UnaryMinus(e) => {
            let v = numeric_of(e, row, context)?;
            Ok(Some(value::numeric_neg(v)?.to_term()))
        }
        Expression::UnaryPlus(e) => {
            let v = numeric_of(e, row, context)?;
            Ok(Some(v.to_term()))
        }
        Expression::BitNot(e) => {
            let v = i64::from(integer_of(e, row, context)?);
            Ok(Some(Literal::from(!v).into()))
        }
        Expression::BitAnd(a, b) => bit_op(a, b, row, context, |a, b| a & b),
        Expression::BitOr(a, b) => bit_op(a, b, row, context, |a, b| a | b),
        Expression::BitXor(a, b) => bit_op(a, b, row, context, |a, b| a ^ b),
        Expression::In(needle, haystack) => boolean(in_list(needle, haystack, row, context)?),
        Expression::NotIn(needle, haystack) => boolean(!in_list(needle, haystack, row, context)?),
        Expression::Bound(variable) => {
            // The argument is syntactically a variable: evaluating it would
            // make "unbound" indistinguishable from an absent literal
            let bound = context
                .variables
                .offset(variable.as_str())
                .is_some_and(|offset| row.is_bound(offset));
            boolean(bound)
        }
        Expression::If(condition, then_branch, else_branch) => {
            if boolean_of(condition, row, context)? {
                evaluate_expression(then_branch, row, context)
            } else {
                evaluate_expression(else_branch, row, context)
            }
        }
        Expression::Coalesce(args) => {
            let mut last_error = ExpressionError::UnboundVariable;
            for arg in args {
                match evaluate_expression(arg, row, context) {
                    Ok(Some(value)) => return Ok(Some(value)),
                    Ok(None) => (),
                    Err(e) => last_error = e,
                }
            }
            Err(last_error)
        }
        Expression::Cast(datatype, e) => {
            let term = required(evaluate_expression(e, row, context)?)?;
            Ok(Some(cast(&term, datatype)?))
        }
        Expression::FunctionCall(function, args) => {
            evaluate_function(*function, args, row, context)
        }
        Expression::Aggregate(_) => Err(ExpressionError::AggregateOutsideGroup),
    }
}

/// Unbound becomes an error for the operators that need a value.
fn required(value: Option<Term>) -> Result<Term, ExpressionError> {
    value.ok_or(ExpressionError::UnboundVariable)
}

fn boolean(value: bool) -> Result<Option<Term>, ExpressionError> {
    Ok(Some(Literal::from(value).into()))
}

fn boolean_of(
    expression: &Expression,
    row: &Row,
    context: &EvalContext,
) -> Result<bool, ExpressionError> {
    let term = required(evaluate_expression(expression, row, context)?)?;
    effective_boolean_value(&term)
}

fn numeric_of(
    expression: &Expression,
    row: &Row,
    context: &EvalContext,
) -> Result<Numeric, ExpressionError> {
    let term = required(evaluate_expression(expression, row, context)?)?;
    numeric_value(&term)?.ok_or(ExpressionError::TypeMismatch)
}

fn numeric_pair(
    a: &Expression,
    b: &Expression,
    row: &Row,
    context: &EvalContext,
) -> Result<(Numeric, Numeric), ExpressionError> {
    Ok((numeric_of(a, row, context)?, numeric_of(b, row, context)?))
}

fn integer_of(
    expression: &Expression,
    row: &Row,
    context: &EvalContext,
) -> Result<Integer, ExpressionError> {
    match numeric_of(expression, row, context)? {
        Numeric::Integer(value) => Ok(value),
        _ => Err(ExpressionError::TypeMismatch),
    }
}

fn compare(
    a: &Expression,
    b: &Expression,
    row: &Row,
    context: &EvalContext,
    test: impl Fn(Ordering) -> bool,
) -> Result<Option<Term>, ExpressionError> {
    let a = required(evaluate_expression(a, row, context)?)?;
    let b = required(evaluate_expression(b, row, context)?)?;
    boolean(match value_cmp(&a, &b)? {
        Some(ordering) => test(ordering),
        // A NaN operand: all comparisons are false without erroring
        None => false,
    })
}

fn bit_op(
    a: &Expression,
    b: &Expression,
    row: &Row,
    context: &EvalContext,
    op: impl Fn(i64, i64) -> i64,
) -> Result<Option<Term>, ExpressionError> {
    let a = i64::from(integer_of(a, row, context)?);
    let b = i64::from(integer_of(b, row, context)?);
    Ok(Some(Literal::from(op(a, b)).into()))
}

fn pattern_match(
    expression: &Expression,
    pattern: &PatternLiteral,
    row: &Row,
    context: &EvalContext,
) -> Result<bool, ExpressionError> {
    let text = str_value(&required(evaluate_expression(expression, row, context)?)?)?;
    let regex = context.compile_regex(&pattern.pattern, &pattern.flags)?;
    Ok(regex.is_match(&text))
}

/// SPARQL `IN`: true on the first member equal to the needle; an error if
/// no member matched but one of them errored.
fn in_list(
    needle: &Expression,
    haystack: &[Expression],
    row: &Row,
    context: &EvalContext,
) -> Result<bool, ExpressionError> {
    let needle = required(evaluate_expression(needle, row, context)?)?;
    let mut pending_error = None;
    for member in haystack {
        match evaluate_expression(member, row, context)
            .and_then(|m| value_eq(&needle, &required(m)?))
        {
            Ok(true) => return Ok(true),
            Ok(false) => (),
            Err(e) => pending_error = Some(e),
        }
    }
    match pending_error {
        Some(e) => Err(e),
        None => Ok(false),
    }
}

fn evaluate_function(
    function: Function,
    args: &[Expression],
    row: &Row,
    context: &EvalContext,
) -> Result<Option<Term>, ExpressionError> {
    match function {
        Function::Str => {
            let term = required_arg(args, 0, row, context)?;
            Ok(Some(Literal::new_simple_literal(str_value(&term)?).into()))
        }
        Function::Lang => {
            let term = required_arg(args, 0, row, context)?;
            let Term::Literal(literal) = term else {
                return Err(ExpressionError::TypeMismatch);
            };
            match literal.language() {
                Some(language) => Ok(Some(Literal::new_simple_literal(language).into())),
                None if literal.is_plain() => {
                    Ok(Some(Literal::new_simple_literal("").into()))
                }
                None => Err(ExpressionError::TypeMismatch),
            }
        }
        Function::LangMatches => {
            let tag = plain_string_arg(args, 0, row, context)?;
            let range = plain_string_arg(args, 1, row, context)?;
            boolean(lang_matches(&tag, &range))
        }
        Function::Datatype => {
            let term = required_arg(args, 0, row, context)?;
            let Term::Literal(literal) = term else {
                return Err(ExpressionError::TypeMismatch);
            };
            if literal.language().is_some() {
                // Per SPARQL, DATATYPE of a language-tagged literal errors
                Err(ExpressionError::TypeMismatch)
            } else {
                Ok(Some(literal.datatype().into_owned().into()))
            }
        }
        Function::SameTerm => {
            let a = required_arg(args, 0, row, context)?;
            let b = required_arg(args, 1, row, context)?;
            boolean(a == b)
        }
        Function::IsIri => {
            let term = required_arg(args, 0, row, context)?;
            boolean(term.is_named_node())
        }
        Function::IsBlank => {
            let term = required_arg(args, 0, row, context)?;
            boolean(term.is_blank_node())
        }
        Function::IsLiteral => {
            let term = required_arg(args, 0, row, context)?;
            boolean(term.is_literal())
        }
        Function::IsNumeric => {
            let term = required_arg(args, 0, row, context)?;
            boolean(matches!(numeric_value(&term), Ok(Some(_))))
        }
        Function::Regex => {
            let text = required_arg(args, 0, row, context)?;
            let (text, _) = string_literal(&text).map(|(v, l)| (v.to_owned(), l))?;
            let pattern = plain_string_arg(args, 1, row, context)?;
            let flags = if args.len() > 2 {
                plain_string_arg(args, 2, row, context)?
            } else {
                String::new()
            };
            let regex = context.compile_regex(&pattern, &flags)?;
            boolean(regex.is_match(&text))
        }
        Function::Concat => {
            let mut result = String::new();
            let mut shared_datatype: Option<Option<(NamedNode, Option<String>)>> = None;
            for (i, _) in args.iter().enumerate() {
                let term = required_arg(args, i, row, context)?;
                let Term::Literal(literal) = term else {
                    return Err(ExpressionError::TypeMismatch);
                };
                result.push_str(literal.value());
                let signature = Some((
                    literal.datatype().into_owned(),
                    literal.language().map(ToOwned::to_owned),
                ));
                match &shared_datatype {
                    None => shared_datatype = Some(signature),
                    Some(shared) if *shared == signature => (),
                    Some(_) => shared_datatype = Some(None),
                }
            }
            Ok(Some(match shared_datatype.flatten() {
                Some((_, Some(language))) => {
                    Literal::new_language_tagged_literal_unchecked(result, language).into()
                }
                Some((datatype, None)) => Literal::new_typed_literal(result, datatype).into(),
                None => Literal::new_simple_literal(result).into(),
            }))
        }
        Function::StrDt => {
            let lexical = simple_string_arg(args, 0, row, context)?;
            let datatype = required_arg(args, 1, row, context)?;
            let Term::NamedNode(datatype) = datatype else {
                return Err(ExpressionError::TypeMismatch);
            };
            Ok(Some(Literal::new_typed_literal(lexical, datatype).into()))
        }
        Function::StrLang => {
            let lexical = simple_string_arg(args, 0, row, context)?;
            let language = plain_string_arg(args, 1, row, context)?;
            Ok(Some(
                Literal::new_language_tagged_literal(lexical, language)
                    .map_err(|_| ExpressionError::MalformedLiteral)?
                    .into(),
            ))
        }
        Function::BNode => {
            if args.is_empty() {
                return Ok(Some(context.fresh_bnode().into()));
            }
            let value = simple_string_arg(args, 0, row, context)?;
            Ok(Some(EvalContext::derived_bnode(&value).into()))
        }
        Function::Iri => {
            let term = required_arg(args, 0, row, context)?;
            match term {
                Term::NamedNode(node) => Ok(Some(node.into())),
                Term::Literal(literal) if literal.is_plain() => {
                    let iri = resolve_iri(literal.value(), context)?;
                    Ok(Some(iri.into()))
                }
                _ => Err(ExpressionError::TypeMismatch),
            }
        }
        Function::StrLen => {
            let (value, _) = string_arg(args, 0, row, context)?;
            Ok(Some(
                Literal::from(i64::try_from(value.chars().count()).unwrap_or(i64::MAX)).into(),
            ))
        }
        Function::SubStr => {
            let (value, language) = string_arg(args, 0, row, context)?;
            let start = i64::from(integer_of(arg(args, 1)?, row, context)?);
            let length = if args.len() > 2 {
                Some(i64::from(integer_of(arg(args, 2)?, row, context)?))
            } else {
                None
            };
            // XPath substring: 1-based character positions, out-of-range clamps
            let skip = usize::try_from((start - 1).max(0)).unwrap_or(0);
            let result: String = match length {
                Some(length) => {
                    let end = start.saturating_add(length);
                    let take = usize::try_from((end - start.max(1)).max(0)).unwrap_or(0);
                    value.chars().skip(skip).take(take).collect()
                }
                None => value.chars().skip(skip).collect(),
            };
            Ok(Some(string_result(result, language)))
        }
        Function::UCase => {
            let (value, language) = string_arg(args, 0, row, context)?;
            Ok(Some(string_result(value.to_uppercase(), language)))
        }
        Function::LCase => {
            let (value, language) = string_arg(args, 0, row, context)?;
            Ok(Some(string_result(value.to_lowercase(), language)))
        }
        Function::StrStarts => {
            let (a, b) = string_pair_args(args, row, context)?;
            boolean(a.starts_with(&b))
        }
        Function::StrEnds => {
            let (a, b) = string_pair_args(args, row, context)?;
            boolean(a.ends_with(&b))
        }
        Function::Contains => {
            let (a, b) = string_pair_args(args, row, context)?;
            boolean(a.contains(&b))
        }
        Function::StrBefore => {
            let a = required_arg(args, 0, row, context)?;
            let b = required_arg(args, 1, row, context)?;
            let (a_value, b_value, language) = compatible_string_pair(&a, &b)?;
            Ok(Some(match a_value.find(b_value) {
                Some(position) => {
                    string_result(a_value[..position].to_owned(), language.map(ToOwned::to_owned))
                }
                None => Literal::new_simple_literal("").into(),
            }))
        }
        Function::StrAfter => {
            let a = required_arg(args, 0, row, context)?;
            let b = required_arg(args, 1, row, context)?;
            let (a_value, b_value, language) = compatible_string_pair(&a, &b)?;
            Ok(Some(match a_value.find(b_value) {
                Some(position) => string_result(
                    a_value[position + b_value.len()..].to_owned(),
                    language.map(ToOwned::to_owned),
                ),
                None => Literal::new_simple_literal("").into(),
            }))
        }
        Function::EncodeForUri => {
            let (value, _) = string_arg(args, 0, row, context)?;
            let mut result = String::with_capacity(value.len());
            for byte in value.bytes() {
                if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
                    result.push(char::from(byte));
                } else {
                    write!(&mut result, "%{byte:02X}").map_err(|_| ExpressionError::Overflow)?;
                }
            }
            Ok(Some(Literal::new_simple_literal(result).into()))
        }
        Function::Replace => {
            let (value, language) = string_arg(args, 0, row, context)?;
            let pattern = plain_string_arg(args, 1, row, context)?;
            let replacement = plain_string_arg(args, 2, row, context)?;
            let flags = if args.len() > 3 {
                plain_string_arg(args, 3, row, context)?
            } else {
                String::new()
            };
            let regex = context.compile_regex(&pattern, &flags)?;
            let result = regex.replace_all(&value, replacement.as_str()).into_owned();
            Ok(Some(string_result(result, language)))
        }
        Function::Abs => match numeric_of(arg(args, 0)?, row, context)? {
            Numeric::Integer(v) => Ok(Some(
                Literal::from(v.checked_abs().ok_or(ExpressionError::Overflow)?).into(),
            )),
            Numeric::Decimal(v) => Ok(Some(
                Literal::from(v.checked_abs().ok_or(ExpressionError::Overflow)?).into(),
            )),
            Numeric::Float(v) => Ok(Some(Literal::from(v.abs()).into())),
            Numeric::Double(v) => Ok(Some(Literal::from(v.abs()).into())),
        },
        Function::Round => match numeric_of(arg(args, 0)?, row, context)? {
            Numeric::Integer(v) => Ok(Some(Literal::from(v).into())),
            Numeric::Decimal(v) => Ok(Some(Literal::from(v.round()).into())),
            Numeric::Float(v) => Ok(Some(Literal::from(v.round()).into())),
            Numeric::Double(v) => Ok(Some(Literal::from(v.round()).into())),
        },
        Function::Ceil => match numeric_of(arg(args, 0)?, row, context)? {
            Numeric::Integer(v) => Ok(Some(Literal::from(v).into())),
            Numeric::Decimal(v) => Ok(Some(Literal::from(v.ceil()).into())),
            Numeric::Float(v) => Ok(Some(Literal::from(v.ceil()).into())),
            Numeric::Double(v) => Ok(Some(Literal::from(v.ceil()).into())),
        },
        Function::Floor => match numeric_of(arg(args, 0)?, row, context)? {
            Numeric::Integer(v) => Ok(Some(Literal::from(v).into())),
            Numeric::Decimal(v) => Ok(Some(Literal::from(v.floor()).into())),
            Numeric::Float(v) => Ok(Some(Literal::from(v.floor()).into())),
            Numeric::Double(v) => Ok(Some(Literal::from(v.floor()).into())),
        },
        Function::Now => Ok(Some(Literal::from(context.now).into())),
        Function::Year => date_component(args, row, context, |dt| dt.year()),
        Function::Month => date_component(args, row, context, |dt| dt.month().into()),
        Function::Day => date_component(args, row, context, |dt| dt.day().into()),
        Function::Hours => date_component(args, row, context, |dt| dt.hour().into()),
        Function::Minutes => date_component(args, row, context, |dt| dt.minute().into()),
        Function::Seconds => {
            let dt = date_time_arg(args, row, context)?;
            Ok(Some(Literal::from(dt.second()).into()))
        }
        Function::Timezone => {
            let dt = date_time_arg(args, row, context)?;
            let offset = dt.timezone_offset().ok_or(ExpressionError::TypeMismatch)?;
            Ok(Some(
                Literal::new_typed_literal(offset.duration_lexical(), xsd::DAY_TIME_DURATION)
                    .into(),
            ))
        }
        Function::Tz => {
            let dt = date_time_arg(args, row, context)?;
            Ok(Some(
                Literal::new_simple_literal(
                    dt.timezone_offset()
                        .map(|offset| offset.to_string())
                        .unwrap_or_default(),
                )
                .into(),
            ))
        }
        Function::ToUnixTime => {
            let dt = date_time_arg(args, row, context)?;
            Ok(Some(Literal::from(dt.to_unix_seconds()).into()))
        }
        Function::FromUnixTime => {
            let seconds = integer_of(arg(args, 0)?, row, context)?;
            Ok(Some(
                Literal::from(DateTime::from_unix_seconds(seconds.into())).into(),
            ))
        }
        Function::Rand => {
            let value = context.random.borrow_mut().random_double();
            Ok(Some(Literal::from(value).into()))
        }
        Function::Md5 => digest::<Md5>(args, row, context),
        Function::Sha1 => digest::<Sha1>(args, row, context),
        Function::Sha256 => digest::<Sha256>(args, row, context),
        Function::Sha384 => digest::<Sha384>(args, row, context),
        Function::Sha512 => digest::<Sha512>(args, row, context),
        Function::Uuid => {
            let uuid = context.random.borrow_mut().random_uuid();
            Ok(Some(
                NamedNode::new_unchecked(format!("urn:uuid:{uuid}")).into(),
            ))
        }
        Function::StrUuid => {
            let uuid = context.random.borrow_mut().random_uuid();
            Ok(Some(Literal::new_simple_literal(uuid).into()))
        }
        _ => unreachable!("all Function variants are handled above"),
    }
}

fn arg(args: &[Expression], index: usize) -> Result<&Expression, ExpressionError> {
    args.get(index).ok_or(ExpressionError::TypeMismatch)
}

fn required_arg(
    args: &[Expression],
    index: usize,
    row: &Row,
    context: &EvalContext,
) -> Result<Term, ExpressionError> {
    required(evaluate_expression(arg(args, index)?, row, context)?)
}

/// A plain or `xsd:string` argument, language tag allowed and dropped.
fn plain_string_arg(
    args: &[Expression],
    index: usize,
    row: &Row,
    context: &EvalContext,
) -> Result<String, ExpressionError> {
    let term = required_arg(args, index, row, context)?;
    string_literal(&term).map(|(value, _)| value.to_owned())
}

/// A simple literal argument: no language tag accepted.
fn simple_string_arg(
    args: &[Expression],
    index: usize,
    row: &Row,
    context: &EvalContext,
) -> Result<String, ExpressionError> {
    let term = required_arg(args, index, row, context)?;
    match string_literal(&term)? {
        (value, None) => Ok(value.to_owned()),
        (_, Some(_)) => Err(ExpressionError::TypeMismatch),
    }
}

fn string_arg(
    args: &[Expression],
    index: usize,
    row: &Row,
    context: &EvalContext,
) -> Result<(String, Option<String>), ExpressionError> {
    let term = required_arg(args, index, row, context)?;
    string_literal(&term).map(|(value, language)| {
        (value.to_owned(), language.map(ToOwned::to_owned))
    })
}

fn string_pair_args(
    args: &[Expression],
    row: &Row,
    context: &EvalContext,
) -> Result<(String, String), ExpressionError> {
    let a = required_arg(args, 0, row, context)?;
    let b = required_arg(args, 1, row, context)?;
    let (a_value, b_value, _) = compatible_string_pair(&a, &b)?;
    Ok((a_value.to_owned(), b_value.to_owned()))
}

fn string_result(value: String, language: Option<String>) -> Term {
    match language {
        Some(language) => Literal::new_language_tagged_literal_unchecked(value, language).into(),
        None => Literal::new_simple_literal(value).into(),
    }
}

fn date_time_arg(
    args: &[Expression],
    row: &Row,
    context: &EvalContext,
) -> Result<DateTime, ExpressionError> {
    let term = required_arg(args, 0, row, context)?;
    date_time_value(&term)?.ok_or(ExpressionError::TypeMismatch)
}

fn date_component(
    args: &[Expression],
    row: &Row,
    context: &EvalContext,
    component: impl Fn(DateTime) -> i64,
) -> Result<Option<Term>, ExpressionError> {
    let dt = date_time_arg(args, row, context)?;
    Ok(Some(Literal::from(component(dt)).into()))
}

fn digest<D: Digest>(
    args: &[Expression],
    row: &Row,
    context: &EvalContext,
) -> Result<Option<Term>, ExpressionError> {
    let value = plain_string_arg(args, 0, row, context)?;
    let hash = hex::encode(D::digest(value.as_bytes()));
    Ok(Some(Literal::new_simple_literal(hash).into()))
}

fn resolve_iri(value: &str, context: &EvalContext) -> Result<NamedNode, ExpressionError> {
    match &context.base_iri {
        Some(base) => {
            let base =
                Iri::parse(base.as_str()).map_err(|_| ExpressionError::MalformedLiteral)?;
            base.resolve(value)
                .map(|iri| NamedNode::new_unchecked(iri.into_inner()))
                .map_err(|_| ExpressionError::MalformedLiteral)
        }
        None => NamedNode::new(value).map_err(|_| ExpressionError::MalformedLiteral),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryTriplesSource;
    use crate::variables::VariableTable;
    use sparrow_model::{Dataset, Variable};
    use std::rc::Rc;

    fn context() -> EvalContext {
        EvalContext::new(
            Rc::new(MemoryTriplesSource::new(Dataset::new())),
            VariableTable::new(),
            None,
        )
    }

    fn integer(value: i64) -> Expression {
        Expression::Literal(Literal::from(value))
    }

    fn string(value: &str) -> Expression {
        Expression::Literal(Literal::new_simple_literal(value))
    }

    fn eval(expression: &Expression) -> Result<Option<Term>, ExpressionError> {
        evaluate_expression(expression, &Row::new(), &context())
    }

    fn assert_true(expression: Expression) {
        assert_eq!(eval(&expression).unwrap(), Some(Literal::from(true).into()));
    }

    #[test]
    fn three_valued_and_or() {
        let error = Expression::Add(Box::new(string("a")), Box::new(integer(1)));
        // false && error -> false
        assert_eq!(
            eval(&Expression::And(
                Box::new(Expression::Literal(Literal::from(false))),
                Box::new(error.clone()),
            ))
            .unwrap(),
            Some(Literal::from(false).into())
        );
        // true || error -> true
        assert_eq!(
            eval(&Expression::Or(
                Box::new(Expression::Literal(Literal::from(true))),
                Box::new(error.clone()),
            ))
            .unwrap(),
            Some(Literal::from(true).into())
        );
        // true && error -> error
        assert!(eval(&Expression::And(
            Box::new(Expression::Literal(Literal::from(true))),
            Box::new(error.clone()),
        ))
        .is_err());
        // false || error -> error
        assert!(eval(&Expression::Or(
            Box::new(Expression::Literal(Literal::from(false))),
            Box::new(error),
        ))
        .is_err());
    }

    #[test]
    fn coalesce_skips_errors_and_unbound() {
        let ctx = context();
        let x = Variable::new_unchecked("x");
        ctx.variables.declare(&x);
        let y = Variable::new_unchecked("y");
        let y_offset = ctx.variables.declare(&y);
        let mut row = Row::new();
        row.set(y_offset, Literal::from(3i64).into());
        let expression = Expression::Coalesce(vec![
            Expression::Variable(x),
            Expression::Add(
                Box::new(Expression::Variable(y)),
                Box::new(string("abc")),
            ),
            string("fallback"),
        ]);
        assert_eq!(
            evaluate_expression(&expression, &row, &ctx).unwrap(),
            Some(Literal::new_simple_literal("fallback").into())
        );
        assert!(evaluate_expression(&Expression::Coalesce(Vec::new()), &row, &ctx).is_err());
    }

    #[test]
    fn bound_does_not_evaluate_its_argument() {
        let ctx = context();
        let x = Variable::new_unchecked("x");
        let offset = ctx.variables.declare(&x);
        let mut row = Row::new();
        assert_eq!(
            evaluate_expression(&Expression::Bound(x.clone()), &row, &ctx).unwrap(),
            Some(Literal::from(false).into())
        );
        row.set(offset, Literal::new_simple_literal("v").into());
        assert_eq!(
            evaluate_expression(&Expression::Bound(x), &row, &ctx).unwrap(),
            Some(Literal::from(true).into())
        );
    }

    #[test]
    fn comparison_with_non_numeric_string_errors() {
        assert!(eval(&Expression::Greater(
            Box::new(string("abc")),
            Box::new(integer(5)),
        ))
        .is_err());
        assert_true(Expression::Greater(Box::new(integer(7)), Box::new(integer(5))));
    }

    #[test]
    fn concat_keeps_a_shared_datatype() {
        let tagged = |v: &str| {
            Expression::Literal(Literal::new_language_tagged_literal(v, "en").unwrap())
        };
        let result = eval(&Expression::FunctionCall(
            Function::Concat,
            vec![tagged("foo"), tagged("bar")],
        ))
        .unwrap();
        assert_eq!(
            result,
            Some(
                Literal::new_language_tagged_literal("foobar", "en")
                    .unwrap()
                    .into()
            )
        );
        let mixed = eval(&Expression::FunctionCall(
            Function::Concat,
            vec![tagged("foo"), string("bar")],
        ))
        .unwrap();
        assert_eq!(mixed, Some(Literal::new_simple_literal("foobar").into()));
    }

    #[test]
    fn regex_honours_the_case_flag() {
        assert_true(Expression::FunctionCall(
            Function::Regex,
            vec![string("ABC"), string("^abc$"), string("i")],
        ));
        assert!(eval(&Expression::FunctionCall(
            Function::Regex,
            vec![string("a"), string("("), ],
        ))
        .is_err());
    }

    #[test]
    fn datatype_and_lang_error_cases() {
        let tagged =
            Expression::Literal(Literal::new_language_tagged_literal("foo", "en").unwrap());
        assert!(eval(&Expression::FunctionCall(Function::Datatype, vec![tagged.clone()])).is_err());
        assert_eq!(
            eval(&Expression::FunctionCall(Function::Lang, vec![tagged])).unwrap(),
            Some(Literal::new_simple_literal("en").into())
        );
        assert_eq!(
            eval(&Expression::FunctionCall(Function::Datatype, vec![string("x")])).unwrap(),
            Some(xsd::STRING.into_owned().into())
        );
        assert!(eval(&Expression::FunctionCall(Function::Lang, vec![integer(3)])).is_err());
    }

    #[test]
    fn substr_is_one_based() {
        assert_eq!(
            eval(&Expression::FunctionCall(
                Function::SubStr,
                vec![string("foobar"), integer(4)],
            ))
            .unwrap(),
            Some(Literal::new_simple_literal("bar").into())
        );
        assert_eq!(
            eval(&Expression::FunctionCall(
                Function::SubStr,
                vec![string("foobar"), integer(4), integer(2)],
            ))
            .unwrap(),
            Some(Literal::new_simple_literal("ba").into())
        );
    }

    #[test]
    fn aggregate_marker_errors_outside_grouping() {
        let expression = Expression::Aggregate(Box::new(
            sparrow_algebra::AggregateExpression::count_all(),
        ));
        assert!(matches!(
            eval(&expression),
            Err(ExpressionError::AggregateOutsideGroup)
        ));
    }
}
