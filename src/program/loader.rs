//! Program text loader.
//!
//! Programs ship as a single line of comma-separated, optionally negative,
//! base-10 integers (`3,9,8,9,10,9,4,9,99,-1,8`). Tokens are trimmed and
//! parsed independently; empty tokens (a trailing comma, stray whitespace)
//! are skipped, and any other non-numeric token is a load error.

use crate::vm::Word;
use thiserror::Error;

/// Parse program text into the initial memory image.
pub fn parse_program(text: &str) -> Result<Vec<Word>, ParseError> {
    let mut image = Vec::new();

    for (index, token) in text.trim().split(',').enumerate() {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let value = token.parse::<Word>().map_err(|_| ParseError::InvalidToken {
            index,
            token: token.to_string(),
        })?;
        image.push(value);
    }

    Ok(image)
}

/// Errors that can occur while loading program text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A token is neither an integer nor empty.
    #[error("invalid token {token:?} at position {index}")]
    InvalidToken { index: usize, token: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_program() {
        assert_eq!(parse_program("1,0,0,0,99").unwrap(), vec![1, 0, 0, 0, 99]);
    }

    #[test]
    fn test_parse_negative_values() {
        assert_eq!(parse_program("3,9,-1,8").unwrap(), vec![3, 9, -1, 8]);
    }

    #[test]
    fn test_parse_tolerates_whitespace_and_trailing_comma() {
        assert_eq!(parse_program(" 1, 2 ,3,\n").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_program("109,1,99,").unwrap(), vec![109, 1, 99]);
    }

    #[test]
    fn test_parse_large_values() {
        assert_eq!(
            parse_program("104,1125899906842624,99").unwrap(),
            vec![104, 1_125_899_906_842_624, 99]
        );
    }

    #[test]
    fn test_parse_rejects_non_numeric_token() {
        let err = parse_program("1,0,abc,99").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidToken {
                index: 2,
                token: "abc".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_empty_text() {
        assert_eq!(parse_program("").unwrap(), Vec::<Word>::new());
    }
}
