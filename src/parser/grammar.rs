//! Parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::parser::ast::*;
use crate::parser::lexer::{Lexeme, Token};

/// Parse template source into an AST
pub fn parse(input: &str) -> Result<Document, Vec<crate::ParseError>> {
    let len = input.len();

    // Split text from actions, then lex each action
    let lexed = crate::parser::lexer::lex(input).map_err(|e| vec![e])?;
    let token_iter = lexed.into_iter().map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Lexeme, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    document_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn document_parser<'a, I>() -> impl Parser<'a, I, Document, extra::Err<Rich<'a, Lexeme>>> + Clone
where
    I: ValueInput<'a, Token = Lexeme, Span = SimpleSpan>,
{
    let literal = select! {
        Lexeme::Token(Token::String(s)) => Literal::String(s),
        Lexeme::Token(Token::Int(n)) => Literal::Int(n),
        Lexeme::Token(Token::Float(n)) => Literal::Float(n),
        Lexeme::Token(Token::True) => Literal::Bool(true),
        Lexeme::Token(Token::False) => Literal::Bool(false),
        Lexeme::Token(Token::Nil) => Literal::Nil,
    };

    let identifier = select! {
        Lexeme::Token(Token::Ident(s)) => Identifier::new(s),
    }
    .map_with(|id, e| Spanned::new(id, span_range(&e.span())));

    // Pipelines nest through parenthesised operands
    let pipeline = recursive(|pipeline| {
        let operand = choice((
            just(Lexeme::Token(Token::Dot)).to(Operand::Dot),
            select! { Lexeme::Token(Token::Field(path)) => Operand::Field(path) },
            literal.map(Operand::Literal),
            pipeline
                .clone()
                .delimited_by(
                    just(Lexeme::Token(Token::ParenOpen)),
                    just(Lexeme::Token(Token::ParenClose)),
                )
                .map(|p: Pipeline| Operand::Paren(Box::new(p))),
        ))
        .map_with(|op, e| Spanned::new(op, span_range(&e.span())));

        // A call swallows every operand that follows its name
        let command = choice((
            identifier
                .clone()
                .then(operand.clone().repeated().collect::<Vec<_>>())
                .map(|(func, args)| Command::Call { func, args }),
            operand.map(|op| Command::Operand(op.node)),
        ))
        .map_with(|cmd, e| Spanned::new(cmd, span_range(&e.span())));

        command
            .separated_by(just(Lexeme::Token(Token::Pipe)))
            .at_least(1)
            .collect::<Vec<_>>()
            .map(|commands| Pipeline { commands })
            .boxed()
    });

    let spanned_pipeline = pipeline.map_with(|p, e| Spanned::new(p, span_range(&e.span())));

    let body = recursive(|body| {
        let text = select! { Lexeme::Text(s) => Node::Text(s) };

        let output = just(Lexeme::Open)
            .ignore_then(spanned_pipeline.clone())
            .then_ignore(just(Lexeme::Close))
            .map(Node::Output);

        let end_tag = just(Lexeme::Open)
            .then(just(Lexeme::Token(Token::End)))
            .then(just(Lexeme::Close))
            .ignored();

        let else_tag = just(Lexeme::Open)
            .then(just(Lexeme::Token(Token::Else)))
            .then(just(Lexeme::Close))
            .ignored();

        // `{{ else }} body {{ end }}` or just `{{ end }}`
        let plain_tail = choice((
            else_tag
                .ignore_then(body.clone())
                .then_ignore(end_tag.clone())
                .map(Some),
            end_tag.to(None),
        ));

        // `{{ else if p }}` chains end in a plain tail
        let if_tail = recursive(|if_tail| {
            choice((
                just(Lexeme::Open)
                    .then(just(Lexeme::Token(Token::Else)))
                    .then(just(Lexeme::Token(Token::If)))
                    .ignore_then(spanned_pipeline.clone())
                    .then_ignore(just(Lexeme::Close))
                    .then(body.clone())
                    .then(if_tail)
                    .map(|((pipeline, body), else_body)| {
                        Some(vec![Node::If(Branch {
                            pipeline,
                            body,
                            else_body,
                        })])
                    }),
                plain_tail.clone(),
            ))
        });

        let if_block = just(Lexeme::Open)
            .then(just(Lexeme::Token(Token::If)))
            .ignore_then(spanned_pipeline.clone())
            .then_ignore(just(Lexeme::Close))
            .then(body.clone())
            .then(if_tail)
            .map(|((pipeline, body), else_body)| {
                Node::If(Branch {
                    pipeline,
                    body,
                    else_body,
                })
            });

        let range_block = just(Lexeme::Open)
            .then(just(Lexeme::Token(Token::Range)))
            .ignore_then(spanned_pipeline.clone())
            .then_ignore(just(Lexeme::Close))
            .then(body.clone())
            .then(plain_tail.clone())
            .map(|((pipeline, body), else_body)| {
                Node::Range(Branch {
                    pipeline,
                    body,
                    else_body,
                })
            });

        let with_block = just(Lexeme::Open)
            .then(just(Lexeme::Token(Token::With)))
            .ignore_then(spanned_pipeline.clone())
            .then_ignore(just(Lexeme::Close))
            .then(body)
            .then(plain_tail)
            .map(|((pipeline, body), else_body)| {
                Node::With(Branch {
                    pipeline,
                    body,
                    else_body,
                })
            });

        // Order matters: block headers before plain output actions
        choice((text, if_block, range_block, with_block, output))
            .repeated()
            .collect::<Vec<_>>()
            .boxed()
    });

    body.then_ignore(end()).map(|nodes| Document { nodes })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_output(input: &str) -> Pipeline {
        let doc = parse(input).expect("Should parse");
        assert_eq!(doc.nodes.len(), 1);
        match &doc.nodes[0] {
            Node::Output(p) => p.node.clone(),
            other => panic!("Expected output, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_text_only() {
        let doc = parse("just text").expect("Should parse");
        assert_eq!(doc.nodes, vec![Node::Text("just text".to_string())]);
    }

    #[test]
    fn test_parse_empty() {
        let doc = parse("").expect("Should parse");
        assert!(doc.nodes.is_empty());
    }

    #[test]
    fn test_parse_field() {
        let p = single_output("{{ .obj.p1 }}");
        assert_eq!(p.commands.len(), 1);
        assert_eq!(
            p.commands[0].node,
            Command::Operand(Operand::Field(vec!["obj".to_string(), "p1".to_string()]))
        );
    }

    #[test]
    fn test_parse_call_with_argument() {
        let p = single_output(r#"{{ share "S1" }}"#);
        match &p.commands[0].node {
            Command::Call { func, args } => {
                assert_eq!(func.node.as_str(), "share");
                assert_eq!(func.span, 3..8);
                assert_eq!(args.len(), 1);
                assert_eq!(
                    args[0].node,
                    Operand::Literal(Literal::String("S1".to_string()))
                );
            }
            other => panic!("Expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_pipeline() {
        let p = single_output("{{ .name | print | html }}");
        assert_eq!(p.commands.len(), 3);
    }

    #[test]
    fn test_parse_parenthesised_operand() {
        let p = single_output(r#"{{ eq (len .items) 2 }}"#);
        match &p.commands[0].node {
            Command::Call { args, .. } => {
                assert!(matches!(args[0].node, Operand::Paren(_)));
                assert_eq!(args[1].node, Operand::Literal(Literal::Int(2)));
            }
            other => panic!("Expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_if_else() {
        let doc = parse("{{ if .a }}yes{{ else }}no{{ end }}").expect("Should parse");
        match &doc.nodes[0] {
            Node::If(b) => {
                assert_eq!(b.body, vec![Node::Text("yes".to_string())]);
                assert_eq!(b.else_body, Some(vec![Node::Text("no".to_string())]));
            }
            other => panic!("Expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_else_if_chain() {
        let doc = parse("{{ if .a }}A{{ else if .b }}B{{ else }}C{{ end }}").expect("Should parse");
        match &doc.nodes[0] {
            Node::If(b) => {
                let else_body = b.else_body.as_ref().expect("Should have else");
                match &else_body[0] {
                    Node::If(inner) => {
                        assert_eq!(inner.body, vec![Node::Text("B".to_string())]);
                        assert_eq!(inner.else_body, Some(vec![Node::Text("C".to_string())]));
                    }
                    other => panic!("Expected nested if, got {:?}", other),
                }
            }
            other => panic!("Expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_range_and_with() {
        let doc = parse("{{ range .items }}[{{ . }}]{{ end }}{{ with .user }}{{ .name }}{{ else }}-{{ end }}")
            .expect("Should parse");
        assert_eq!(doc.nodes.len(), 2);
        assert!(matches!(&doc.nodes[0], Node::Range(b) if b.else_body.is_none()));
        assert!(matches!(&doc.nodes[1], Node::With(b) if b.else_body.is_some()));
    }

    #[test]
    fn test_parse_nested_blocks() {
        let doc = parse("{{ range . }}{{ if . }}x{{ end }}{{ end }}").expect("Should parse");
        match &doc.nodes[0] {
            Node::Range(b) => assert!(matches!(b.body[0], Node::If(_))),
            other => panic!("Expected range, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_unterminated() {
        let errs = parse("{{ .Name").unwrap_err();
        assert_eq!(errs.len(), 1);
    }

    #[test]
    fn test_parse_error_missing_end() {
        assert!(parse("{{ if .a }}open").is_err());
    }

    #[test]
    fn test_parse_error_stray_end() {
        assert!(parse("text {{ end }}").is_err());
    }

    #[test]
    fn test_parse_error_empty_action() {
        assert!(parse("{{ }}").is_err());
    }
}
