//! Layered rendering: page pass, shared fragments, layout pass

use serde_json::Value;
use tracing::{debug, trace};

use crate::config::Config;
use crate::error::Error;
use crate::renderer::Helpers;

use super::{FragmentKind, Registry};

/// Renders pages into layouts against one registry
pub(crate) struct Composer<'a> {
    registry: &'a Registry,
    config: &'a Config,
}

impl<'a> Composer<'a> {
    pub fn new(registry: &'a Registry, config: &'a Config) -> Self {
        Self { registry, config }
    }

    /// Render `page_name`, wrapped in `layout_name` unless it is empty.
    ///
    /// The page runs first. Its output is then bound to the layout's
    /// `yield`, while every other expression in the layout sees `data`.
    pub fn render(&self, layout_name: &str, page_name: &str, data: &Value) -> Result<String, Error> {
        debug!(layout = layout_name, page = page_name, "rendering");

        let page = self
            .registry
            .get(FragmentKind::Page, page_name)
            .ok_or_else(|| Error::missing(FragmentKind::Page, page_name))?;
        let page_content = page.execute(data, &ShareScope::new(self, data))?;

        if layout_name.is_empty() {
            return Ok(page_content);
        }

        let layout = self
            .registry
            .get(FragmentKind::Layout, layout_name)
            .ok_or_else(|| Error::missing(FragmentKind::Layout, layout_name))?;
        layout.execute(data, &ShareScope::new(self, data).with_page(&page_content))
    }
}

/// Live `share`/`yield` bindings for one pass of a render
struct ShareScope<'a> {
    composer: &'a Composer<'a>,
    data: &'a Value,
    page: Option<&'a str>,
    depth: usize,
}

impl<'a> ShareScope<'a> {
    fn new(composer: &'a Composer<'a>, data: &'a Value) -> Self {
        Self {
            composer,
            data,
            page: None,
            depth: 0,
        }
    }

    fn with_page(mut self, page: &'a str) -> Self {
        self.page = Some(page);
        self
    }
}

impl Helpers for ShareScope<'_> {
    fn share(&self, name: &str) -> Result<String, Error> {
        let max_depth = self.composer.config.max_share_depth;
        if self.depth >= max_depth {
            return Err(Error::RecursiveShare {
                name: name.to_string(),
                max_depth,
            });
        }

        let shared = self
            .composer
            .registry
            .get(FragmentKind::Page, name)
            .ok_or_else(|| Error::SharedMissing {
                name: name.to_string(),
            })?;
        trace!(shared = name, depth = self.depth, "rendering shared fragment");

        // Shared fragments see the same data but never the page output
        let nested = ShareScope {
            composer: self.composer,
            data: self.data,
            page: None,
            depth: self.depth + 1,
        };
        shared.execute(self.data, &nested)
    }

    fn yield_content(&self) -> Option<String> {
        self.page.map(str::to_string)
    }
}
