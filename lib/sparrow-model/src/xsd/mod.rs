//! Typed values for the [XML Schema datatypes](https://www.w3.org/TR/xmlschema11-2/)
//! the query engine evaluates: parsing from lexical forms, canonical
//! formatting, checked arithmetic and the numeric promotion chain
//! integer ⊂ decimal ⊂ float ⊂ double.

mod boolean;
mod date_time;
mod decimal;
mod double;
mod float;
mod integer;

pub use self::boolean::Boolean;
pub use self::date_time::{Date, DateTime, DateTimeOverflowError, TimezoneOffset};
pub use self::decimal::Decimal;
pub use self::double::Double;
pub use self::float::Float;
pub use self::integer::Integer;

/// An error raised when a lexical form is not valid for the expected datatype.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid xsd:{datatype} lexical form: {value:?}")]
pub struct XsdLexicalError {
    datatype: &'static str,
    value: String,
}

impl XsdLexicalError {
    pub(crate) fn new(datatype: &'static str, value: &str) -> Self {
        Self {
            datatype,
            value: value.to_owned(),
        }
    }

    /// The local name of the datatype whose parsing failed.
    pub fn datatype(&self) -> &str {
        self.datatype
    }
}
