use sparrow_model::NamedNode;
use std::error::Error;
use std::io;

/// An error raised while executing a query: construction failures, triples
/// source failures and misuse of the consumer surface.
///
/// Expression-level errors are a different thing: they are represented by
/// [`ExpressionError`] and absorbed by the operators per the SPARQL rules,
/// they never surface here.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EvaluationError {
    /// Error from the underlying triples source.
    #[error(transparent)]
    Source(Box<dyn Error + Send + Sync>),
    /// The algebra tree cannot be translated into a rowsource pipeline.
    #[error("malformed algebra: {0}")]
    MalformedAlgebra(String),
    /// `SERVICE` evaluation was requested but no handler is registered.
    #[error("no handler is registered for the service {0}")]
    UnsupportedService(NamedNode),
    /// The variable naming the `SERVICE` endpoint is unbound.
    #[error("the variable naming the service endpoint is unbound")]
    UnboundService,
    /// This rowsource cannot restart its iteration.
    #[error("this rowsource does not support reset")]
    ResetUnsupported,
    /// A triples-source factory outside the supported version range.
    #[error("the triples-source factory version {actual} is outside the supported range {min}..={max}")]
    UnsupportedFactoryVersion { actual: u32, min: u32, max: u32 },
    /// No triples-source factory has been registered with the world.
    #[error("no triples-source factory is registered")]
    NoTriplesSourceFactory,
    /// I/O failure while serializing results.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The SPARQL expression "error" sentinel.
///
/// Expression evaluation returns `Result<Option<Term>, ExpressionError>`:
/// `Ok(None)` is the SPARQL "unbound" and `Err(_)` the SPARQL "error". The
/// distinction is load-bearing for `FILTER`, `OPTIONAL` predicates,
/// `COALESCE` and the three-valued `&&`/`||` tables.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum ExpressionError {
    /// The operands have incompatible types for the operation.
    #[error("incompatible types for this operation")]
    TypeMismatch,
    /// Integer or decimal division by zero.
    #[error("division by zero")]
    DivideByZero,
    /// Arithmetic overflow.
    #[error("arithmetic overflow")]
    Overflow,
    /// The lexical form of a literal is not valid for its datatype.
    #[error("malformed lexical form for the declared datatype")]
    MalformedLiteral,
    /// A regular expression failed to compile.
    #[error("invalid regular expression: {0}")]
    RegexSyntax(String),
    /// A variable used in the expression carries no binding in this row.
    #[error("the variable is not bound")]
    UnboundVariable,
    /// An aggregate expression was evaluated outside a grouping context.
    #[error("aggregate expression outside of a grouping context")]
    AggregateOutsideGroup,
    /// A cast that the target datatype does not accept.
    #[error("unsupported cast to {0}")]
    UnsupportedCast(NamedNode),
}
