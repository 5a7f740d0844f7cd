//! Compiling fragment source into executable fragments

use serde_json::Value;

use crate::config::Config;
use crate::error::{Error, ParseError};
use crate::parser::{parse, Document};
use crate::renderer::{self, funcs, ExecContext, Helpers, MissingKey, Placeholders};

use super::FragmentKind;

/// A compiled fragment. Immutable once built.
#[derive(Debug, Clone)]
pub struct Fragment {
    name: String,
    kind: FragmentKind,
    source: String,
    document: Document,
    missing_key: MissingKey,
}

impl Fragment {
    /// Registered name, also what `current` returns
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FragmentKind {
        self.kind
    }

    /// Raw template text
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn missing_key(&self) -> MissingKey {
        self.missing_key
    }

    /// Execute against `data`, resolving `share` and `yield` through `helpers`
    pub fn execute(&self, data: &Value, helpers: &dyn Helpers) -> Result<String, Error> {
        let ctx = ExecContext {
            fragment: &self.name,
            missing_key: self.missing_key,
            helpers,
        };
        renderer::execute(&self.document, data, &ctx)
    }

    /// Execute without a registry: `share` and `yield` re-emit themselves
    /// as template text.
    pub fn execute_detached(&self, data: &Value) -> Result<String, Error> {
        self.execute(data, &Placeholders)
    }
}

fn is_bound(func: &str, kind: FragmentKind) -> bool {
    funcs::COMMON.contains(&func)
        || (kind == FragmentKind::Layout && funcs::LAYOUT_ONLY.contains(&func))
}

/// Compile `source` as a fragment of the given kind.
///
/// Syntax errors and calls to functions the kind does not bind are both
/// reported as [`Error::Compile`].
pub fn compile(
    name: &str,
    source: &str,
    kind: FragmentKind,
    config: &Config,
) -> Result<Fragment, Error> {
    let document = parse(source).map_err(|errors| Error::compile(name, errors))?;

    let mut errors = Vec::new();
    document.for_each_call(&mut |func| {
        if !is_bound(func.node.as_str(), kind) {
            errors.push(ParseError::syntax(
                func.span.clone(),
                format!("function \"{}\" not defined", func.node),
                vec![],
            ));
        }
    });
    if !errors.is_empty() {
        return Err(Error::compile(name, errors));
    }

    let missing_key = if config.missing_key_zero {
        MissingKey::Zero
    } else {
        MissingKey::Default
    };

    Ok(Fragment {
        name: name.to_string(),
        kind,
        source: source.to_string(),
        document,
        missing_key,
    })
}
