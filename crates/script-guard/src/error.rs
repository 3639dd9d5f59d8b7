/// Why a script could not be parsed.
///
/// Sanitization treats every parse failure the same way: the script is passed
/// through unchanged and the real error surfaces when it runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: '{keyword}' statements are not supported")]
    Unsupported { line: usize, keyword: String },
}

impl ParseError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        ParseError::Syntax {
            line,
            message: message.into(),
        }
    }

    pub fn line(&self) -> usize {
        match self {
            ParseError::Syntax { line, .. } | ParseError::Unsupported { line, .. } => *line,
        }
    }
}
