//! Fragment storage and layered rendering
//!
//! Fragments come in two namespaces. Pages and shared fragments live in the
//! page namespace; layouts have their own. A render executes a page, then
//! (optionally) a layout whose `yield` emits the page's output.
//!
//! # Example
//!
//! ```text
//! layout "base":  <body>{{ share "nav" }}{{ yield }}</body>
//! page "nav":     <nav>{{ .site }}</nav>
//! page "home":    <h1>Welcome to {{ .site }}</h1>
//!
//! render("base", "home", {"site": "weave"})
//!   => <body><nav>weave</nav><h1>Welcome to weave</h1></body>
//! ```

mod compiler;
mod composer;
mod registry;

pub use compiler::{compile, Fragment};
pub(crate) use composer::Composer;
pub use registry::Registry;

/// Namespace a fragment is registered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentKind {
    /// Pages and shared fragments
    Page,
    Layout,
}

impl std::fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FragmentKind::Page => write!(f, "page"),
            FragmentKind::Layout => write!(f, "layout"),
        }
    }
}

/// A named template source produced by an external loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentSource {
    pub name: String,
    pub content: String,
    pub is_layout: bool,
}

impl FragmentSource {
    /// A page or shared fragment
    pub fn page(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            is_layout: false,
        }
    }

    /// A layout fragment
    pub fn layout(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            is_layout: true,
        }
    }

    pub fn kind(&self) -> FragmentKind {
        if self.is_layout {
            FragmentKind::Layout
        } else {
            FragmentKind::Page
        }
    }
}
