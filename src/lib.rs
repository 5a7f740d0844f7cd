//! Weave - layered template composition
//!
//! Register named page, layout and shared fragments once, then render a page
//! inside a layout as many times as needed, from as many threads as needed.
//! A layout embeds the page's output with `{{ yield }}`; any fragment embeds
//! another page-namespace fragment with `{{ share "name" }}`.
//!
//! # Example
//!
//! ```rust
//! use weave::TemplateSet;
//!
//! let set = TemplateSet::new();
//! set.add_layout("L1", "This is layout {{ current }}: {{ yield }}").unwrap();
//! set.add("P1", "This is page {{ current }}").unwrap();
//!
//! let out = set.render("L1", "P1", &()).unwrap();
//! assert_eq!(out.as_str(), "This is layout L1: This is page P1");
//! ```

pub mod config;
pub mod error;
pub mod parser;
pub mod renderer;
pub mod template;

pub use config::{Config, ConfigError};
pub use error::{Error, ParseError};
pub use template::{Fragment, FragmentKind, FragmentSource, Registry};

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use template::{compile, Composer};

/// Final output of a render
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rendered(String);

impl Rendered {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0.into_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Rendered {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<[u8]> for Rendered {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl std::fmt::Display for Rendered {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A set of fragments plus the configuration they were compiled with.
///
/// All methods take `&self`; share a set between threads with an [`Arc`].
#[derive(Debug, Default)]
pub struct TemplateSet {
    registry: Registry,
    config: Config,
}

impl TemplateSet {
    /// Create an empty set with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty set with custom configuration
    ///
    /// # Example
    ///
    /// ```rust
    /// use weave::{Config, TemplateSet};
    /// use serde_json::json;
    ///
    /// let set = TemplateSet::with_config(Config::new().with_missing_key_zero(true));
    /// set.add("P1", "count: {{ .counts.b }}").unwrap();
    ///
    /// let out = set.render("", "P1", &json!({"counts": {"a": 3}})).unwrap();
    /// assert_eq!(out.as_str(), "count: 0");
    /// ```
    pub fn with_config(config: Config) -> Self {
        Self {
            registry: Registry::new(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Register a page or shared fragment
    pub fn add(&self, name: &str, source: &str) -> Result<(), Error> {
        self.add_fragment(name, source, FragmentKind::Page)
    }

    /// Register a layout fragment
    pub fn add_layout(&self, name: &str, source: &str) -> Result<(), Error> {
        self.add_fragment(name, source, FragmentKind::Layout)
    }

    /// Register fragments produced by a loader, stopping at the first error
    pub fn add_all<I>(&self, sources: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = FragmentSource>,
    {
        for source in sources {
            self.add_fragment(&source.name, &source.content, source.kind())?;
        }
        Ok(())
    }

    fn add_fragment(&self, name: &str, source: &str, kind: FragmentKind) -> Result<(), Error> {
        if name.is_empty() {
            return Err(Error::EmptyName { kind });
        }
        let fragment = compile(name, source, kind, &self.config)?;
        self.registry.insert(fragment)?;
        debug!(%kind, name, "registered fragment");
        Ok(())
    }

    /// Look up a page or shared fragment
    pub fn get(&self, name: &str) -> Option<Arc<Fragment>> {
        self.registry.get(FragmentKind::Page, name)
    }

    /// Look up a layout fragment
    pub fn get_layout(&self, name: &str) -> Option<Arc<Fragment>> {
        self.registry.get(FragmentKind::Layout, name)
    }

    /// Render `page` inside `layout` (or alone when `layout` is empty)
    pub fn render<T>(&self, layout: &str, page: &str, data: &T) -> Result<Rendered, Error>
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(data)?;
        self.render_value(layout, page, &value)
    }

    /// Like [`TemplateSet::render`], for data that is already a JSON value
    pub fn render_value(&self, layout: &str, page: &str, data: &Value) -> Result<Rendered, Error> {
        Composer::new(&self.registry, &self.config)
            .render(layout, page, data)
            .map(Rendered::from)
    }
}
