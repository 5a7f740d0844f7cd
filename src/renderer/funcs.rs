//! Functions callable from templates

use serde_json::Value;

use crate::error::Error;

use super::exec::ExecContext;
use super::value::{self, is_truthy};

/// Functions bound in every fragment
pub const COMMON: &[&str] = &[
    "current", "share", "not", "and", "or", "eq", "ne", "len", "print", "html",
];

/// Functions bound only in layouts
pub const LAYOUT_ONLY: &[&str] = &["yield"];

fn expect_args(
    ctx: &ExecContext<'_>,
    name: &str,
    args: &[Value],
    want: usize,
) -> Result<(), Error> {
    if args.len() != want {
        return Err(ctx.error(format!(
            "wrong number of args for {}: want {} got {}",
            name,
            want,
            args.len()
        )));
    }
    Ok(())
}

fn expect_at_least(
    ctx: &ExecContext<'_>,
    name: &str,
    args: &[Value],
    min: usize,
) -> Result<(), Error> {
    if args.len() < min {
        return Err(ctx.error(format!(
            "wrong number of args for {}: want at least {} got {}",
            name,
            min,
            args.len()
        )));
    }
    Ok(())
}

/// Call function `name` with already evaluated arguments
pub fn call(name: &str, mut args: Vec<Value>, ctx: &ExecContext<'_>) -> Result<Value, Error> {
    match name {
        "current" => {
            expect_args(ctx, name, &args, 0)?;
            Ok(Value::String(ctx.fragment.to_string()))
        }
        "yield" => {
            expect_args(ctx, name, &args, 0)?;
            ctx.helpers
                .yield_content()
                .map(Value::String)
                .ok_or_else(|| ctx.error("yield called outside a layout"))
        }
        "share" => {
            expect_args(ctx, name, &args, 1)?;
            match &args[0] {
                Value::String(target) => ctx.helpers.share(target).map(Value::String),
                other => Err(ctx.error(format!(
                    "share expects a template name, got {}",
                    value::type_name(other)
                ))),
            }
        }
        "not" => {
            expect_args(ctx, name, &args, 1)?;
            Ok(Value::Bool(!is_truthy(&args[0])))
        }
        "and" => {
            expect_at_least(ctx, name, &args, 1)?;
            let pos = args.iter().position(|v| !is_truthy(v));
            Ok(take_at_or_last(args, pos))
        }
        "or" => {
            expect_at_least(ctx, name, &args, 1)?;
            let pos = args.iter().position(is_truthy);
            Ok(take_at_or_last(args, pos))
        }
        "eq" => {
            expect_at_least(ctx, name, &args, 2)?;
            let first = args.remove(0);
            Ok(Value::Bool(
                args.iter().any(|other| value::values_equal(&first, other)),
            ))
        }
        "ne" => {
            expect_args(ctx, name, &args, 2)?;
            Ok(Value::Bool(!value::values_equal(&args[0], &args[1])))
        }
        "len" => {
            expect_args(ctx, name, &args, 1)?;
            let len = match &args[0] {
                Value::String(s) => s.len(),
                Value::Array(items) => items.len(),
                Value::Object(map) => map.len(),
                other => {
                    return Err(ctx.error(format!(
                        "len of type {}",
                        value::type_name(other)
                    )))
                }
            };
            Ok(Value::from(len))
        }
        "print" => Ok(Value::String(sprint(&args))),
        "html" => Ok(Value::String(escape_html(&sprint(&args)))),
        other => Err(ctx.error(format!("function \"{}\" not defined", other))),
    }
}

fn take_at_or_last(mut args: Vec<Value>, pos: Option<usize>) -> Value {
    match pos {
        Some(i) => args.swap_remove(i),
        None => args.pop().unwrap_or(Value::Null),
    }
}

/// Concatenate arguments, with a space between operands when neither side
/// is a string
fn sprint(args: &[Value]) -> String {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 && !args[i - 1].is_string() && !arg.is_string() {
            out.push(' ');
        }
        out.push_str(&value::display(arg));
    }
    out
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&#34;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::exec::Placeholders;
    use crate::renderer::value::MissingKey;
    use serde_json::json;

    fn ctx() -> ExecContext<'static> {
        ExecContext {
            fragment: "F",
            missing_key: MissingKey::Default,
            helpers: &Placeholders,
        }
    }

    #[test]
    fn test_and_or_return_operands() {
        assert_eq!(call("and", vec![json!(1), json!(0), json!(2)], &ctx()).unwrap(), json!(0));
        assert_eq!(call("and", vec![json!(1), json!(2)], &ctx()).unwrap(), json!(2));
        assert_eq!(call("or", vec![json!(""), json!("x")], &ctx()).unwrap(), json!("x"));
        assert_eq!(call("or", vec![json!(""), json!(0)], &ctx()).unwrap(), json!(0));
    }

    #[test]
    fn test_eq_any_of() {
        assert_eq!(call("eq", vec![json!(2), json!(1), json!(2)], &ctx()).unwrap(), json!(true));
        assert_eq!(call("ne", vec![json!("a"), json!("a")], &ctx()).unwrap(), json!(false));
    }

    #[test]
    fn test_len() {
        assert_eq!(call("len", vec![json!("abc")], &ctx()).unwrap(), json!(3));
        assert!(call("len", vec![json!(3)], &ctx()).is_err());
    }

    #[test]
    fn test_print_spacing() {
        assert_eq!(sprint(&[json!(1), json!(2)]), "1 2");
        assert_eq!(sprint(&[json!("a"), json!(1), json!("b")]), "a1b");
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&#34;x&#34;&gt;&amp;&#39;");
    }

    #[test]
    fn test_share_requires_string() {
        let err = call("share", vec![json!(1)], &ctx()).unwrap_err();
        assert!(err.to_string().contains("share expects a template name"));
    }

    #[test]
    fn test_wrong_arity() {
        let err = call("current", vec![json!(1)], &ctx()).unwrap_err();
        assert!(err.to_string().contains("wrong number of args for current"));
    }
}
