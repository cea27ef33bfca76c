//! SPARQL [expressions](https://www.w3.org/TR/sparql11-query/#expressions),
//! builtin function calls and aggregate markers.

use sparrow_model::{Literal, NamedNode, Variable};
use std::fmt;
use std::fmt::Display;

/// An expression tree evaluated against one solution row.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Expression {
    NamedNode(NamedNode),
    Literal(Literal),
    Variable(Variable),
    /// [Logical-or](https://www.w3.org/TR/sparql11-query/#func-logical-or), three-valued.
    Or(Box<Self>, Box<Self>),
    /// [Logical-and](https://www.w3.org/TR/sparql11-query/#func-logical-and), three-valued.
    And(Box<Self>, Box<Self>),
    /// [fn:not](https://www.w3.org/TR/xpath-functions-31/#func-not).
    Not(Box<Self>),
    /// [RDFterm-equal](https://www.w3.org/TR/sparql11-query/#func-RDFterm-equal) and the XSD value equalities.
    Equal(Box<Self>, Box<Self>),
    NotEqual(Box<Self>, Box<Self>),
    Less(Box<Self>, Box<Self>),
    LessOrEqual(Box<Self>, Box<Self>),
    Greater(Box<Self>, Box<Self>),
    GreaterOrEqual(Box<Self>, Box<Self>),
    /// Case-insensitive string equality, inherited from the RDQL surface.
    StrEqual(Box<Self>, Box<Self>),
    StrNotEqual(Box<Self>, Box<Self>),
    /// Match against a pattern literal with flags, inherited from the RDQL surface.
    StrMatch(Box<Self>, PatternLiteral),
    StrNotMatch(Box<Self>, PatternLiteral),
    /// [op:numeric-add](https://www.w3.org/TR/xpath-functions-31/#func-numeric-add) and the other XSD additions.
    Add(Box<Self>, Box<Self>),
    Subtract(Box<Self>, Box<Self>),
    Multiply(Box<Self>, Box<Self>),
    Divide(Box<Self>, Box<Self>),
    /// Integer remainder, inherited from the RDQL surface.
    Remainder(Box<Self>, Box<Self>),
    UnaryMinus(Box<Self>),
    UnaryPlus(Box<Self>),
    /// Bitwise complement over integers.
    BitNot(Box<Self>),
    BitAnd(Box<Self>, Box<Self>),
    BitOr(Box<Self>, Box<Self>),
    BitXor(Box<Self>, Box<Self>),
    /// [IN](https://www.w3.org/TR/sparql11-query/#func-in).
    In(Box<Self>, Vec<Self>),
    NotIn(Box<Self>, Vec<Self>),
    /// [BOUND](https://www.w3.org/TR/sparql11-query/#func-bound): the argument is
    /// syntactically a variable and is not evaluated.
    Bound(Variable),
    /// [IF](https://www.w3.org/TR/sparql11-query/#func-if).
    If(Box<Self>, Box<Self>, Box<Self>),
    /// [COALESCE](https://www.w3.org/TR/sparql11-query/#func-coalesce).
    Coalesce(Vec<Self>),
    /// A cast to the given datatype, e.g. `xsd:integer(?x)`.
    Cast(NamedNode, Box<Self>),
    /// A builtin function call.
    FunctionCall(Function, Vec<Self>),
    /// An aggregate marker; only meaningful below a Group operator.
    Aggregate(Box<AggregateExpression>),
}

impl Expression {
    /// Convenience shorthand for the common variable leaf.
    #[inline]
    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable(Variable::new_unchecked(name))
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamedNode(node) => node.fmt(f),
            Self::Literal(literal) => literal.fmt(f),
            Self::Variable(variable) => variable.fmt(f),
            Self::Or(a, b) => write!(f, "({a} || {b})"),
            Self::And(a, b) => write!(f, "({a} && {b})"),
            Self::Not(e) => write!(f, "!{e}"),
            Self::Equal(a, b) => write!(f, "({a} = {b})"),
            Self::NotEqual(a, b) => write!(f, "({a} != {b})"),
            Self::Less(a, b) => write!(f, "({a} < {b})"),
            Self::LessOrEqual(a, b) => write!(f, "({a} <= {b})"),
            Self::Greater(a, b) => write!(f, "({a} > {b})"),
            Self::GreaterOrEqual(a, b) => write!(f, "({a} >= {b})"),
            Self::StrEqual(a, b) => write!(f, "({a} eq {b})"),
            Self::StrNotEqual(a, b) => write!(f, "({a} ne {b})"),
            Self::StrMatch(a, p) => write!(f, "({a} =~ {p})"),
            Self::StrNotMatch(a, p) => write!(f, "({a} !~ {p})"),
            Self::Add(a, b) => write!(f, "({a} + {b})"),
            Self::Subtract(a, b) => write!(f, "({a} - {b})"),
            Self::Multiply(a, b) => write!(f, "({a} * {b})"),
            Self::Divide(a, b) => write!(f, "({a} / {b})"),
            Self::Remainder(a, b) => write!(f, "({a} % {b})"),
            Self::UnaryMinus(e) => write!(f, "-{e}"),
            Self::UnaryPlus(e) => write!(f, "+{e}"),
            Self::BitNot(e) => write!(f, "~{e}"),
            Self::BitAnd(a, b) => write!(f, "({a} & {b})"),
            Self::BitOr(a, b) => write!(f, "({a} | {b})"),
            Self::BitXor(a, b) => write!(f, "({a} ^ {b})"),
            Self::In(a, list) => {
                write!(f, "({a} IN (")?;
                fmt_comma_separated(f, list)?;
                f.write_str("))")
            }
            Self::NotIn(a, list) => {
                write!(f, "({a} NOT IN (")?;
                fmt_comma_separated(f, list)?;
                f.write_str("))")
            }
            Self::Bound(variable) => write!(f, "BOUND({variable})"),
            Self::If(c, t, e) => write!(f, "IF({c}, {t}, {e})"),
            Self::Coalesce(args) => {
                f.write_str("COALESCE(")?;
                fmt_comma_separated(f, args)?;
                f.write_str(")")
            }
            Self::Cast(datatype, e) => write!(f, "{datatype}({e})"),
            Self::FunctionCall(function, args) => {
                write!(f, "{function}(")?;
                fmt_comma_separated(f, args)?;
                f.write_str(")")
            }
            Self::Aggregate(aggregate) => aggregate.fmt(f),
        }
    }
}

fn fmt_comma_separated(f: &mut fmt::Formatter<'_>, items: &[Expression]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        item.fmt(f)?;
    }
    Ok(())
}

/// A regular expression literal with its flags, as written in `?x =~ /pat/i`.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct PatternLiteral {
    pub pattern: String,
    pub flags: String,
}

impl PatternLiteral {
    #[inline]
    pub fn new(pattern: impl Into<String>, flags: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            flags: flags.into(),
        }
    }
}

impl fmt::Display for PatternLiteral {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.pattern, self.flags)
    }
}

/// The builtin functions of the expression language.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
#[non_exhaustive]
pub enum Function {
    Str,
    Lang,
    LangMatches,
    Datatype,
    SameTerm,
    IsIri,
    IsBlank,
    IsLiteral,
    IsNumeric,
    Regex,
    Concat,
    StrDt,
    StrLang,
    BNode,
    Iri,
    StrLen,
    SubStr,
    UCase,
    LCase,
    StrStarts,
    StrEnds,
    Contains,
    StrBefore,
    StrAfter,
    EncodeForUri,
    Replace,
    Abs,
    Round,
    Ceil,
    Floor,
    Now,
    Year,
    Month,
    Day,
    Hours,
    Minutes,
    Seconds,
    Timezone,
    Tz,
    ToUnixTime,
    FromUnixTime,
    Rand,
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
    Uuid,
    StrUuid,
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Str => "STR",
            Self::Lang => "LANG",
            Self::LangMatches => "LANGMATCHES",
            Self::Datatype => "DATATYPE",
            Self::SameTerm => "sameTerm",
            Self::IsIri => "isIRI",
            Self::IsBlank => "isBLANK",
            Self::IsLiteral => "isLITERAL",
            Self::IsNumeric => "isNUMERIC",
            Self::Regex => "REGEX",
            Self::Concat => "CONCAT",
            Self::StrDt => "STRDT",
            Self::StrLang => "STRLANG",
            Self::BNode => "BNODE",
            Self::Iri => "IRI",
            Self::StrLen => "STRLEN",
            Self::SubStr => "SUBSTR",
            Self::UCase => "UCASE",
            Self::LCase => "LCASE",
            Self::StrStarts => "STRSTARTS",
            Self::StrEnds => "STRENDS",
            Self::Contains => "CONTAINS",
            Self::StrBefore => "STRBEFORE",
            Self::StrAfter => "STRAFTER",
            Self::EncodeForUri => "ENCODE_FOR_URI",
            Self::Replace => "REPLACE",
            Self::Abs => "ABS",
            Self::Round => "ROUND",
            Self::Ceil => "CEIL",
            Self::Floor => "FLOOR",
            Self::Now => "NOW",
            Self::Year => "YEAR",
            Self::Month => "MONTH",
            Self::Day => "DAY",
            Self::Hours => "HOURS",
            Self::Minutes => "MINUTES",
            Self::Seconds => "SECONDS",
            Self::Timezone => "TIMEZONE",
            Self::Tz => "TZ",
            Self::ToUnixTime => "TO_UNIXTIME",
            Self::FromUnixTime => "FROM_UNIXTIME",
            Self::Rand => "RAND",
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha384 => "SHA384",
            Self::Sha512 => "SHA512",
            Self::Uuid => "UUID",
            Self::StrUuid => "STRUUID",
        })
    }
}

/// An [aggregate](https://www.w3.org/TR/sparql11-query/#aggregates) over the rows of one group.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct AggregateExpression {
    pub function: AggregateFunction,
    /// `None` stands for `COUNT(*)`.
    pub expression: Option<Expression>,
    pub distinct: bool,
    /// The `GROUP_CONCAT` separator; a single space when absent.
    pub separator: Option<String>,
}

impl AggregateExpression {
    pub fn new(function: AggregateFunction, expression: Expression) -> Self {
        Self {
            function,
            expression: Some(expression),
            distinct: false,
            separator: None,
        }
    }

    /// `COUNT(*)`, counting rows rather than bound values.
    pub fn count_all() -> Self {
        Self {
            function: AggregateFunction::Count,
            expression: None,
            distinct: false,
            separator: None,
        }
    }
}

impl fmt::Display for AggregateExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.function)?;
        if self.distinct {
            f.write_str("DISTINCT ")?;
        }
        match &self.expression {
            Some(expression) => expression.fmt(f)?,
            None => f.write_str("*")?,
        }
        if let Some(separator) = &self.separator {
            write!(f, "; SEPARATOR={separator:?}")?;
        }
        f.write_str(")")
    }
}

/// The aggregate functions of the grouping operator.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Sample,
    GroupConcat,
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Sample => "SAMPLE",
            Self::GroupConcat => "GROUP_CONCAT",
        })
    }
}

/// One `ORDER BY` condition: an expression plus a direction.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum OrderExpression {
    Asc(Expression),
    Desc(Expression),
}

impl OrderExpression {
    #[inline]
    pub fn expression(&self) -> &Expression {
        match self {
            Self::Asc(e) | Self::Desc(e) => e,
        }
    }

    #[inline]
    pub fn is_descending(&self) -> bool {
        matches!(self, Self::Desc(_))
    }
}

impl fmt::Display for OrderExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc(e) => write!(f, "ASC({e})"),
            Self::Desc(e) => write!(f, "DESC({e})"),
        }
    }
}
