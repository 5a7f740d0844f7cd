//! Execution of a parsed template against a data value

use serde_json::{Number, Value};

use crate::error::Error;
use crate::parser::ast::{Command, Document, Literal, Node, Operand, Pipeline};

use super::funcs;
use super::value::{self, MissingKey};

/// Behaviour behind the `share` and `yield` functions.
///
/// The composer supplies a live implementation for each render pass;
/// [`Placeholders`] is used when a fragment runs on its own.
pub trait Helpers {
    /// Render the page-namespace fragment `name` and return its text
    fn share(&self, name: &str) -> Result<String, Error>;

    /// Text bound to `yield`, if this pass has any
    fn yield_content(&self) -> Option<String>;
}

/// Marker text emitted by `yield` outside a composed render
pub const YIELD_MARKER: &str = "{{ yield }}";

/// Helpers that re-emit the calls themselves as template text
#[derive(Debug, Clone, Copy, Default)]
pub struct Placeholders;

impl Helpers for Placeholders {
    fn share(&self, name: &str) -> Result<String, Error> {
        Ok(format!("{{{{ share \"{}\" }}}}", name))
    }

    fn yield_content(&self) -> Option<String> {
        Some(YIELD_MARKER.to_string())
    }
}

/// Everything a fragment sees besides its data
pub struct ExecContext<'a> {
    /// Registered name of the executing fragment, returned by `current`
    pub fragment: &'a str,
    pub missing_key: MissingKey,
    pub helpers: &'a dyn Helpers,
}

impl ExecContext<'_> {
    pub(crate) fn error(&self, message: impl Into<String>) -> Error {
        Error::execution(self.fragment, message)
    }
}

/// Execute a document with `dot` as its data value
pub fn execute(doc: &Document, dot: &Value, ctx: &ExecContext<'_>) -> Result<String, Error> {
    let mut out = String::new();
    exec_nodes(&doc.nodes, dot, ctx, &mut out)?;
    Ok(out)
}

fn exec_nodes(
    nodes: &[Node],
    dot: &Value,
    ctx: &ExecContext<'_>,
    out: &mut String,
) -> Result<(), Error> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Output(pipeline) => {
                let value = eval_pipeline(&pipeline.node, dot, ctx)?;
                out.push_str(&value::display(&value));
            }
            Node::If(branch) => {
                let cond = eval_pipeline(&branch.pipeline.node, dot, ctx)?;
                if value::is_truthy(&cond) {
                    exec_nodes(&branch.body, dot, ctx, out)?;
                } else if let Some(else_body) = &branch.else_body {
                    exec_nodes(else_body, dot, ctx, out)?;
                }
            }
            Node::With(branch) => {
                let scoped = eval_pipeline(&branch.pipeline.node, dot, ctx)?;
                if value::is_truthy(&scoped) {
                    exec_nodes(&branch.body, &scoped, ctx, out)?;
                } else if let Some(else_body) = &branch.else_body {
                    exec_nodes(else_body, dot, ctx, out)?;
                }
            }
            Node::Range(branch) => {
                let items = match eval_pipeline(&branch.pipeline.node, dot, ctx)? {
                    Value::Array(items) => items,
                    // Object values iterate in key order
                    Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
                    Value::Null => Vec::new(),
                    other => {
                        return Err(ctx.error(format!(
                            "range can't iterate over {}",
                            value::type_name(&other)
                        )))
                    }
                };
                if items.is_empty() {
                    if let Some(else_body) = &branch.else_body {
                        exec_nodes(else_body, dot, ctx, out)?;
                    }
                }
                for item in &items {
                    exec_nodes(&branch.body, item, ctx, out)?;
                }
            }
        }
    }
    Ok(())
}

fn eval_pipeline(pipeline: &Pipeline, dot: &Value, ctx: &ExecContext<'_>) -> Result<Value, Error> {
    let mut piped = None;
    for cmd in &pipeline.commands {
        piped = Some(eval_command(&cmd.node, dot, ctx, piped.take())?);
    }
    Ok(piped.unwrap_or(Value::Null))
}

/// Evaluate one command; a piped value becomes the call's last argument
fn eval_command(
    cmd: &Command,
    dot: &Value,
    ctx: &ExecContext<'_>,
    piped: Option<Value>,
) -> Result<Value, Error> {
    match cmd {
        Command::Operand(op) => {
            if piped.is_some() {
                return Err(ctx.error("can't give argument to non-function"));
            }
            eval_operand(op, dot, ctx)
        }
        Command::Call { func, args } => {
            let mut values = args
                .iter()
                .map(|arg| eval_operand(&arg.node, dot, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            values.extend(piped);
            funcs::call(func.node.as_str(), values, ctx)
        }
    }
}

fn eval_operand(op: &Operand, dot: &Value, ctx: &ExecContext<'_>) -> Result<Value, Error> {
    match op {
        Operand::Dot => Ok(dot.clone()),
        Operand::Field(path) => {
            value::lookup(dot, path, ctx.missing_key).map_err(|msg| ctx.error(msg))
        }
        Operand::Literal(lit) => Ok(match lit {
            Literal::String(s) => Value::String(s.clone()),
            Literal::Int(n) => Value::from(*n),
            Literal::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Nil => Value::Null,
        }),
        Operand::Paren(inner) => eval_pipeline(inner, dot, ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use serde_json::json;

    fn run(source: &str, data: Value) -> Result<String, Error> {
        run_with(source, data, MissingKey::Default)
    }

    fn run_with(source: &str, data: Value, missing_key: MissingKey) -> Result<String, Error> {
        let doc = parse(source).expect("Should parse");
        let ctx = ExecContext {
            fragment: "T1",
            missing_key,
            helpers: &Placeholders,
        };
        execute(&doc, &data, &ctx)
    }

    #[test]
    fn test_text_and_fields() {
        let out = run("Hi {{ .name }}!", json!({"name": "dave"})).unwrap();
        assert_eq!(out, "Hi dave!");
    }

    #[test]
    fn test_current_is_fragment_name() {
        assert_eq!(run("{{ current }}", json!(null)).unwrap(), "T1");
    }

    #[test]
    fn test_placeholders_reemit_calls() {
        assert_eq!(
            run(r#"{{ share "S1" }} / {{ yield }}"#, json!(null)).unwrap(),
            r#"{{ share "S1" }} / {{ yield }}"#
        );
    }

    #[test]
    fn test_missing_key_modes() {
        let data = json!({"obj": {"p1": 1}});
        assert_eq!(
            run_with("{{ .obj.nope }}", data.clone(), MissingKey::Default).unwrap(),
            "<no value>"
        );
        assert_eq!(
            run_with("{{ .obj.nope }}", data, MissingKey::Zero).unwrap(),
            "0"
        );
    }

    #[test]
    fn test_if_else_chain() {
        let src = "{{ if .a }}A{{ else if .b }}B{{ else }}C{{ end }}";
        assert_eq!(run(src, json!({"a": 1})).unwrap(), "A");
        assert_eq!(run(src, json!({"b": "x"})).unwrap(), "B");
        assert_eq!(run(src, json!({})).unwrap(), "C");
    }

    #[test]
    fn test_range_over_array_and_object() {
        assert_eq!(
            run("{{ range .items }}<{{ . }}>{{ end }}", json!({"items": [1, 2, 3]})).unwrap(),
            "<1><2><3>"
        );
        assert_eq!(
            run("{{ range . }}{{ . }}{{ end }}", json!({"b": "2", "a": "1"})).unwrap(),
            "12"
        );
    }

    #[test]
    fn test_range_else_on_empty() {
        let src = "{{ range .items }}x{{ else }}none{{ end }}";
        assert_eq!(run(src, json!({"items": []})).unwrap(), "none");
        assert_eq!(run(src, json!({})).unwrap(), "none");
    }

    #[test]
    fn test_range_over_scalar_fails() {
        let err = run("{{ range .n }}{{ end }}", json!({"n": 3})).unwrap_err();
        assert!(matches!(err, Error::Execution { .. }));
        assert!(err.to_string().contains("range can't iterate over number"));
    }

    #[test]
    fn test_with_rebinds_dot() {
        let src = "{{ with .user }}{{ .name }}{{ else }}anon{{ end }}";
        assert_eq!(run(src, json!({"user": {"name": "dave"}})).unwrap(), "dave");
        assert_eq!(run(src, json!({})).unwrap(), "anon");
    }

    #[test]
    fn test_pipeline_appends_argument() {
        assert_eq!(
            run("{{ .tag | html }}", json!({"tag": "<b>"})).unwrap(),
            "&lt;b&gt;"
        );
        assert_eq!(run("{{ .items | len }}", json!({"items": [1, 2]})).unwrap(), "2");
    }

    #[test]
    fn test_pipe_into_operand_fails() {
        let err = run("{{ .a | .b }}", json!({})).unwrap_err();
        assert!(err.to_string().contains("non-function"));
    }

    #[test]
    fn test_parenthesised_call() {
        assert_eq!(
            run("{{ if eq (len .items) 2 }}two{{ end }}", json!({"items": [1, 2]})).unwrap(),
            "two"
        );
    }

    #[test]
    fn test_field_on_string_is_execution_error() {
        let err = run("{{ .name.first }}", json!({"name": "dave"})).unwrap_err();
        match err {
            Error::Execution { fragment, message } => {
                assert_eq!(fragment, "T1");
                assert!(message.contains("can't evaluate field first"));
            }
            other => panic!("Expected execution error, got {:?}", other),
        }
    }
}
