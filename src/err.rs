use thiserror::Error;

/// A lexical or syntactic failure in one of the codec parsers, in the
/// filter parser or in the date-range parser.
///
/// Carries the position of the failure within the input text. Positions
/// are 1-based; structural failures with no meaningful position (for
/// example a JSON grid whose `rows` entry is not an array) report
/// line 0, column 0.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("{msg} at line {line}, column {col}")]
pub struct ParseError {
    pub line: u32,
    pub col: u32,
    pub msg: String,
}

impl ParseError {
    pub(crate) fn new(line: u32, col: u32, msg: String) -> Self {
        ParseError { line, col, msg }
    }

    /// A parse error with no usable position information.
    pub(crate) fn no_pos(msg: String) -> Self {
        ParseError {
            line: 0,
            col: 0,
            msg,
        }
    }
}

/// A structural violation of the grid invariants: a duplicate column
/// name, a row referencing a column the grid does not declare, or an
/// invalid tag or ref name.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("{0}")]
pub struct SchemaError(pub String);

/// Encapsulates all errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// The mime type is not one the codec dispatcher knows about.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    /// Format negotiation against an `Accept` header produced no match.
    #[error("Not acceptable: {0}")]
    NotAcceptable(String),
    /// An IO error, which can only arise while writing CSV output.
    #[error("IO error: {0}")]
    Io(String),
}

#[cfg(test)]
mod test {
    use super::{Error, ParseError, SchemaError};

    #[test]
    fn parse_error_display() {
        let err = ParseError::new(3, 14, "expected ','".to_owned());
        assert_eq!(err.to_string(), "expected ',' at line 3, column 14");
    }

    #[test]
    fn error_wraps_parse_and_schema() {
        let parse: Error = ParseError::no_pos("bad token".to_owned()).into();
        assert!(matches!(parse, Error::Parse(_)));

        let schema: Error = SchemaError("duplicate column 'id'".to_owned()).into();
        assert_eq!(schema.to_string(), "duplicate column 'id'");
    }
}
