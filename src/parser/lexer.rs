//! Lexer for weave templates
//!
//! Template source is a mix of literal text and `{{ ... }}` actions. The
//! scanner in [`lex`] walks the text, handles trim markers and comments, and
//! hands each action's interior to the logos [`Token`] lexer.

use logos::Logos;

use crate::error::ParseError;
use crate::parser::ast::Span;

/// Tokens that can appear inside an action
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token {
    // Control keywords
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("end")]
    End,
    #[token("range")]
    Range,
    #[token("with")]
    With,

    // Constant keywords
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("nil")]
    Nil,

    // Delimiters
    #[token("|")]
    Pipe,
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token(".")]
    Dot,

    // Closing delimiters; `-}}` also trims the whitespace that follows
    #[token("}}")]
    Close,
    #[token("-}}")]
    TrimClose,

    // `.name.inner` - a field chain relative to dot
    #[regex(r"(\.[a-zA-Z_][a-zA-Z0-9_]*)+", |lex| {
        lex.slice()[1..].split('.').map(str::to_string).collect::<Vec<_>>()
    })]
    Field(Vec<String>),

    // Literals - identifiers must come after keywords
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice()))]
    #[regex(r"`[^`]*`", |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    String(String),

    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r"-?[0-9]+\.[0-9]+([eE][-+]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),
}

/// What the grammar consumes: text runs, action delimiters, and the tokens
/// between them.
#[derive(Debug, Clone, PartialEq)]
pub enum Lexeme {
    Text(String),
    Open,
    Close,
    Token(Token),
}

/// Strip the quotes of a double-quoted literal and resolve its escapes
fn unescape(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Push a text run, applying the trim markers of the surrounding actions
fn push_text(
    out: &mut Vec<(Lexeme, Span)>,
    text: &str,
    start: usize,
    trim_start: bool,
    trim_end: bool,
) {
    let mut slice = text;
    let mut offset = start;
    if trim_start {
        let trimmed = slice.trim_start();
        offset += slice.len() - trimmed.len();
        slice = trimmed;
    }
    if trim_end {
        slice = slice.trim_end();
    }
    if !slice.is_empty() {
        out.push((Lexeme::Text(slice.to_string()), offset..offset + slice.len()));
    }
}

/// Does the action opened at `open` start with a `{{- ` trim marker?
fn has_trim_marker(source: &str, open: usize) -> bool {
    let mut rest = source[open + 2..].chars();
    rest.next() == Some('-') && rest.next().is_some_and(char::is_whitespace)
}

/// Lex template source into text runs and action tokens
pub fn lex(source: &str) -> Result<Vec<(Lexeme, Span)>, ParseError> {
    let mut out = Vec::new();
    let mut pos = 0;
    let mut trim_next = false;

    while pos < source.len() {
        let Some(rel) = source[pos..].find("{{") else {
            push_text(&mut out, &source[pos..], pos, trim_next, false);
            break;
        };
        let open = pos + rel;
        let trim_left = has_trim_marker(source, open);
        push_text(&mut out, &source[pos..open], pos, trim_next, trim_left);

        let mut inner = open + 2;
        if trim_left {
            inner += 1;
            let rest = &source[inner..];
            inner += rest.len() - rest.trim_start().len();
        }

        if source[inner..].starts_with("/*") {
            let (next, trim) = skip_comment(source, open, inner)?;
            pos = next;
            trim_next = trim;
            continue;
        }

        out.push((Lexeme::Open, open..inner));
        let mut lexer = Token::lexer(&source[inner..]).spanned();
        loop {
            match lexer.next() {
                None => {
                    return Err(ParseError::syntax(
                        open..source.len(),
                        "unclosed action",
                        vec!["'}}'".to_string()],
                    ))
                }
                Some((Err(()), span)) => {
                    let span = inner + span.start..inner + span.end;
                    let found = &source[span.clone()];
                    let message = if is_integer(found) {
                        format!("integer literal {} out of range", found)
                    } else {
                        format!("unexpected character '{}' in action", found)
                    };
                    return Err(ParseError::syntax(span, message, vec![]));
                }
                Some((Ok(tok @ (Token::Close | Token::TrimClose)), span)) => {
                    trim_next = tok == Token::TrimClose;
                    out.push((Lexeme::Close, inner + span.start..inner + span.end));
                    pos = inner + span.end;
                    break;
                }
                Some((Ok(tok), span)) => {
                    out.push((Lexeme::Token(tok), inner + span.start..inner + span.end));
                }
            }
        }
    }

    Ok(out)
}

/// Matches the `Int` pattern, which only fails to lex on overflow
fn is_integer(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Skip a `{{/* ... */}}` comment whose body starts at `body`.
///
/// Returns the position after the closing delimiter and whether it carried a
/// trim marker.
fn skip_comment(source: &str, open: usize, body: usize) -> Result<(usize, bool), ParseError> {
    let Some(end) = source[body + 2..].find("*/") else {
        return Err(ParseError::syntax(
            open..source.len(),
            "unclosed comment",
            vec!["'*/'".to_string()],
        ));
    };
    let after = body + 2 + end + 2;
    let rest = &source[after..];
    if rest.starts_with("}}") {
        return Ok((after + 2, false));
    }
    let trimmed = rest.trim_start();
    if trimmed.len() < rest.len() && trimmed.starts_with("-}}") {
        let close = after + (rest.len() - trimmed.len());
        return Ok((close + 3, true));
    }
    Err(ParseError::syntax(
        open..after,
        "comment ends before closing delimiter",
        vec!["'}}'".to_string()],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Lexeme> {
        lex(input)
            .expect("Should lex")
            .into_iter()
            .map(|(t, _)| t)
            .collect()
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(tokens("hello"), vec![Lexeme::Text("hello".to_string())]);
        assert!(tokens("").is_empty());
    }

    #[test]
    fn test_action_tokens() {
        assert_eq!(
            tokens(r#"a {{ share "S1" }} b"#),
            vec![
                Lexeme::Text("a ".to_string()),
                Lexeme::Open,
                Lexeme::Token(Token::Ident("share".to_string())),
                Lexeme::Token(Token::String("S1".to_string())),
                Lexeme::Close,
                Lexeme::Text(" b".to_string()),
            ]
        );
    }

    #[test]
    fn test_keywords_and_fields() {
        assert_eq!(
            tokens("{{ if .user.name }}{{ else }}{{ end }}"),
            vec![
                Lexeme::Open,
                Lexeme::Token(Token::If),
                Lexeme::Token(Token::Field(vec!["user".to_string(), "name".to_string()])),
                Lexeme::Close,
                Lexeme::Open,
                Lexeme::Token(Token::Else),
                Lexeme::Close,
                Lexeme::Open,
                Lexeme::Token(Token::End),
                Lexeme::Close,
            ]
        );
    }

    #[test]
    fn test_dot_and_literals() {
        assert_eq!(
            tokens("{{ . 12 -3 1.5 true nil `raw` }}"),
            vec![
                Lexeme::Open,
                Lexeme::Token(Token::Dot),
                Lexeme::Token(Token::Int(12)),
                Lexeme::Token(Token::Int(-3)),
                Lexeme::Token(Token::Float(1.5)),
                Lexeme::Token(Token::True),
                Lexeme::Token(Token::Nil),
                Lexeme::Token(Token::String("raw".to_string())),
                Lexeme::Close,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            tokens(r#"{{ "a\"b\n" }}"#)[1],
            Lexeme::Token(Token::String("a\"b\n".to_string()))
        );
    }

    #[test]
    fn test_trim_markers() {
        assert_eq!(
            tokens("a  {{- .x -}}  b"),
            vec![
                Lexeme::Text("a".to_string()),
                Lexeme::Open,
                Lexeme::Token(Token::Field(vec!["x".to_string()])),
                Lexeme::Close,
                Lexeme::Text("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_negative_number_is_not_trim_marker() {
        assert_eq!(
            tokens("a {{-3}}"),
            vec![
                Lexeme::Text("a ".to_string()),
                Lexeme::Open,
                Lexeme::Token(Token::Int(-3)),
                Lexeme::Close,
            ]
        );
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(
            tokens("a {{/* note */}} b"),
            vec![Lexeme::Text("a ".to_string()), Lexeme::Text(" b".to_string())]
        );
        assert_eq!(
            tokens("a {{- /* note */ -}} b"),
            vec![Lexeme::Text("a".to_string()), Lexeme::Text("b".to_string())]
        );
    }

    #[test]
    fn test_spans_are_absolute() {
        let lexed = lex("ab{{ .x }}").expect("Should lex");
        assert_eq!(lexed[0].1, 0..2);
        assert_eq!(lexed[1].1, 2..4);
        assert_eq!(lexed[2].1, 5..7);
        assert_eq!(lexed[3].1, 8..10);
    }

    #[test]
    fn test_unclosed_action() {
        let err = lex("{{ .Name").unwrap_err();
        assert!(err.to_string().contains("unclosed action"));
    }

    #[test]
    fn test_unclosed_comment() {
        let err = lex("{{/* nope").unwrap_err();
        assert!(err.to_string().contains("unclosed comment"));
    }

    #[test]
    fn test_bad_character() {
        let err = lex("{{ # }}").unwrap_err();
        assert!(err.to_string().contains("unexpected character '#'"));
    }

    #[test]
    fn test_integer_overflow() {
        let err = lex("{{ print 99999999999999999999 }}").unwrap_err();
        assert!(err
            .to_string()
            .contains("integer literal 99999999999999999999 out of range"));
        assert_eq!(err.span(), &(9..29));

        assert!(lex("{{ print -9223372036854775808 }}").is_ok());
    }
}
