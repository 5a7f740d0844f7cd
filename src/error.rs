//! Error types for compiling and rendering fragments

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::parser::Span;
use crate::template::FragmentKind;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Parse error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },
}

impl ParseError {
    /// Create a syntax error
    pub fn syntax(span: Span, message: impl Into<String>, expected: Vec<String>) -> Self {
        Self::Syntax {
            span,
            message: message.into(),
            expected,
        }
    }

    /// Get the source span of the error
    pub fn span(&self) -> &Span {
        match self {
            Self::Syntax { span, .. } => span,
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let mut buf = Vec::new();
        match self {
            ParseError::Syntax {
                span,
                message,
                expected,
            } => {
                let expected_str = if expected.is_empty() {
                    String::new()
                } else {
                    format!("\nExpected: {}", expected.join(", "))
                };

                let written = Report::build(ReportKind::Error, filename, span.start)
                    .with_message(message)
                    .with_label(
                        Label::new((filename, span.clone()))
                            .with_message(format!("{}{}", message, expected_str))
                            .with_color(Color::Red),
                    )
                    .finish()
                    .write((filename, Source::from(source)), &mut buf);
                if written.is_err() {
                    return self.to_string();
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl<'a> From<chumsky::error::Rich<'a, crate::parser::lexer::Lexeme>> for ParseError {
    fn from(err: chumsky::error::Rich<'a, crate::parser::lexer::Lexeme>) -> Self {
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => {
                let found_str = match found {
                    Some(tok) => format_token(tok),
                    None => "end of input".to_string(),
                };
                format!("Unexpected {}", found_str)
            }
            RichReason::Custom(msg) => msg.to_string(),
        };

        // Format expected tokens nicely
        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(format_token(tok)),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("end of input".to_string()),
                chumsky::error::RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
                chumsky::error::RichPattern::Any => Some("any token".to_string()),
                chumsky::error::RichPattern::SomethingElse => None,
            })
            .collect();

        ParseError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &crate::parser::lexer::Lexeme) -> String {
    use crate::parser::lexer::{Lexeme, Token};
    match tok {
        Lexeme::Text(_) => "text".to_string(),
        Lexeme::Open => "'{{'".to_string(),
        Lexeme::Close => "'}}'".to_string(),
        Lexeme::Token(tok) => match tok {
            Token::Ident(s) => format!("identifier '{}'", s),
            Token::Field(path) => format!("field '.{}'", path.join(".")),
            Token::String(s) => format!("string \"{}\"", s),
            Token::Int(n) => format!("number {}", n),
            Token::Float(n) => format!("number {}", n),
            Token::If => "keyword 'if'".to_string(),
            Token::Else => "keyword 'else'".to_string(),
            Token::End => "keyword 'end'".to_string(),
            Token::Range => "keyword 'range'".to_string(),
            Token::With => "keyword 'with'".to_string(),
            Token::True => "'true'".to_string(),
            Token::False => "'false'".to_string(),
            Token::Nil => "'nil'".to_string(),
            Token::Pipe => "'|'".to_string(),
            Token::ParenOpen => "'('".to_string(),
            Token::ParenClose => "')'".to_string(),
            Token::Dot => "'.'".to_string(),
            Token::Close | Token::TrimClose => "'}}'".to_string(),
        },
    }
}

/// Errors returned by registration and rendering
#[derive(Debug, Error)]
pub enum Error {
    /// A fragment was registered without a name
    #[error("{kind} name must not be empty")]
    EmptyName { kind: FragmentKind },

    /// A fragment with the same kind and name already exists
    #[error("template {name} already exists")]
    DuplicateName { kind: FragmentKind, name: String },

    /// Fragment source failed to parse or uses an unknown function
    #[error("failed to compile template {name}: {}", format_parse_errors(.errors))]
    Compile {
        name: String,
        errors: Vec<ParseError>,
    },

    /// Render referenced an unregistered page or layout
    #[error("no template {name}")]
    MissingFragment { kind: FragmentKind, name: String },

    /// A `share` call referenced an unregistered fragment
    #[error("no shared template {name}")]
    SharedMissing { name: String },

    /// `share` calls nested deeper than the configured limit
    #[error("shared template {name} nested deeper than {max_depth} levels")]
    RecursiveShare { name: String, max_depth: usize },

    /// Evaluation failed while executing a fragment
    #[error("template {fragment}: {message}")]
    Execution { fragment: String, message: String },

    /// The render data could not be converted to a template value
    #[error("invalid render data: {0}")]
    Data(#[from] serde_json::Error),
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Create a compile error
    pub fn compile(name: impl Into<String>, errors: Vec<ParseError>) -> Self {
        Self::Compile {
            name: name.into(),
            errors,
        }
    }

    /// Create a missing fragment error
    pub fn missing(kind: FragmentKind, name: impl Into<String>) -> Self {
        Self::MissingFragment {
            kind,
            name: name.into(),
        }
    }

    /// Create an execution error
    pub fn execution(fragment: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            fragment: fragment.into(),
            message: message.into(),
        }
    }

    /// Get the parse errors of a compile failure
    pub fn parse_errors(&self) -> Option<&[ParseError]> {
        match self {
            Self::Compile { errors, .. } => Some(errors),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_display() {
        let err = Error::DuplicateName {
            kind: FragmentKind::Page,
            name: "P1".to_string(),
        };
        assert_eq!(err.to_string(), "template P1 already exists");
    }

    #[test]
    fn test_shared_missing_display() {
        let err = Error::SharedMissing {
            name: "S1".to_string(),
        };
        assert!(err.to_string().contains("no shared template S1"));
    }

    #[test]
    fn test_compile_display_names_fragment() {
        let err = Error::compile(
            "broken",
            vec![ParseError::syntax(0..2, "unclosed action", vec![])],
        );
        let msg = err.to_string();
        assert!(msg.contains("broken"));
        assert!(msg.contains("unclosed action"));
        assert_eq!(err.parse_errors().map(|e| e.len()), Some(1));
    }

    #[test]
    fn test_empty_name_display() {
        let err = Error::EmptyName {
            kind: FragmentKind::Layout,
        };
        assert_eq!(err.to_string(), "layout name must not be empty");
    }

    #[test]
    fn test_format_includes_message() {
        let err = ParseError::syntax(3..8, "Unexpected keyword 'end'", vec![]);
        let report = err.format("ab {{ end }}", "page.tmpl");
        assert!(report.contains("Unexpected keyword 'end'"));
    }
}
