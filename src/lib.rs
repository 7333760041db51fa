//! A compiler and renderer for SilverStripe-style `.ss` view templates.
//!
//! # Features
//!
//! ### Syntax
//!
//! - References: `$Title`, `$Link(1)`, `$Parent.Title`, `{$Title}`
//! - Conditionals: `<% if $Count > 0 %> ... <% else %> ... <% end_if %>`
//! - Loops: `<% loop $Children %> ... <% end_loop %>`
//! - Scopes: `<% with $Parent %> ... <% end_with %>` plus `$Up` and `$Top`
//! - Nested templates: `<% include Footer %>` and layouts via `$Layout`
//! - CSS and JavaScript requirements: `<% require javascript("app.js") %>`
//! - Comments: `<%-- ... --%>`
//!
//! ### Engine
//!
//! - Compiled templates are cached per engine and safe to share across
//!   threads
//! - Render against maps, records, any [`serde`] serializable value or your
//!   own [`Object`] implementation
//! - Render to a [`String`] or any [`std::io::Write`] implementor
//! - Convenient macro for building contexts:
//!   `ssviewer::value!{ Title: "Home", Menu: [{ Title: "About" }] }`
//!
//! # Getting started
//!
//! Your entry point is the [`Engine`] struct. The engine stores the
//! configuration, the template [`Loader`] and the compiled templates.
//! Generally, you only need to construct one engine during the lifetime of a
//! program.
//!
//! ```
//! use ssviewer::{Config, Engine, MemoryLoader};
//!
//! let config = Config::new("/var/www", "simple")?;
//! let loader = MemoryLoader::new()
//!     .with("Page", "<h1>$Title</h1><% include Footer %>")
//!     .with("Includes/Footer", "<footer>$SiteName</footer>");
//! let engine = Engine::with_loader(config, loader);
//!
//! let result = engine.render(&["Page"], ssviewer::value! {
//!     Title: "Home",
//!     SiteName: "Example",
//! })?;
//! assert_eq!(result, "<h1>Home</h1><footer>Example</footer>");
//! # Ok::<(), ssviewer::Error>(())
//! ```
//!
//! Templates are loaded from `ROOT/themes/THEME/templates/` when the engine
//! is constructed with [`Engine::new`].
//!
//! # Examples
//!
//! ### Render using structured data
//!
//! ```
//! # use ssviewer::{Config, Engine, MemoryLoader};
//! #[derive(serde::Serialize)]
//! struct Page { Title: String, Children: Vec<Child> }
//!
//! #[derive(serde::Serialize)]
//! struct Child { Title: String }
//!
//! let page = Page {
//!     Title: "Home".into(),
//!     Children: vec![Child { Title: "a".into() }, Child { Title: "b".into() }],
//! };
//!
//! # let config = Config::new("/var/www", "simple")?;
//! # let engine = Engine::with_loader(config, MemoryLoader::new());
//! let result = engine
//!     .compile_str("Page", "$Title: <% loop $Children %>[$Title]<% end_loop %>", true)?
//!     .render(&engine, ssviewer::to_value(page)?)?;
//!
//! assert_eq!(result, "Home: [a][b]");
//! # Ok::<(), ssviewer::Error>(())
//! ```
//!
//! ### Render with a layout
//!
//! The second template name is looked up under `Layout/` and is rendered
//! wherever the main template references `$Layout`.
//!
//! ```
//! # use ssviewer::{Config, Engine, MemoryLoader};
//! # let config = Config::new("/var/www", "simple")?;
//! let loader = MemoryLoader::new()
//!     .with("Page", "<body>$Layout</body>")
//!     .with("Layout/Page", "<main>$Content</main>");
//! let engine = Engine::with_loader(config, loader);
//!
//! let result = engine.render(&["Page", "Page"], ssviewer::value! { Content: "Hi" })?;
//! assert_eq!(result, "<body><main>Hi</main></body>");
//! # Ok::<(), ssviewer::Error>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

mod compile;
mod config;
mod error;
mod loader;
mod macros;
mod render;
mod requirements;
mod types;
mod value;

use std::fmt;
use std::io;
use std::sync::Arc;

pub use crate::compile::CompiledTemplate;
pub use crate::config::{Config, Protocol};
pub use crate::error::{Error, ErrorKind, Location};
pub use crate::loader::{FileLoader, Loader, MemoryLoader};
pub use crate::requirements::{DefaultRequirements, Placement, Requirements};
#[cfg(feature = "serde")]
pub use crate::value::to_value;
pub use crate::value::{Func, List, Map, Object, Record, Value};

use crate::compile::Cache;
use crate::config::LAYOUTS_PATH;

/// A type alias for results in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The default maximum include depth.
const DEFAULT_MAX_INCLUDE_DEPTH: usize = 64;

/// The compilation and rendering engine.
pub struct Engine {
    config: Config,
    loader: Box<dyn Loader>,
    cache: Cache,
    max_include_depth: usize,
}

impl Engine {
    /// Construct a new engine that loads templates from the configured
    /// theme's template directory.
    #[inline]
    pub fn new(config: Config) -> Self {
        let loader = FileLoader::from_config(&config);
        Self::with_loader(config, loader)
    }

    /// Construct a new engine with a custom template loader.
    ///
    /// # Examples
    ///
    /// ```
    /// use ssviewer::{Config, Engine, MemoryLoader};
    ///
    /// let config = Config::new("/var/www", "simple")?;
    /// let engine = Engine::with_loader(config, MemoryLoader::new().with("Page", "Hello"));
    /// # Ok::<(), ssviewer::Error>(())
    /// ```
    #[inline]
    pub fn with_loader<L>(config: Config, loader: L) -> Self
    where
        L: Loader + 'static,
    {
        Self {
            config,
            loader: Box::new(loader),
            cache: Cache::default(),
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }

    /// Set the maximum number of nested `<% include %>` directives.
    ///
    /// Defaults to 64.
    #[inline]
    pub fn set_max_include_depth(&mut self, depth: usize) {
        self.max_include_depth = depth;
    }

    /// Returns the engine configuration.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compile the template at `path`, or return it from the cache if it has
    /// already been compiled.
    ///
    /// `$Layout` is a layout substitution only in a main template.
    pub fn compile(&self, path: &str, is_main: bool) -> Result<Arc<CompiledTemplate>> {
        compile::compile(self, path, is_main, 0)
    }

    /// Compile template source directly. The result is not cached, but any
    /// templates it includes are.
    pub fn compile_str(
        &self,
        name: &str,
        source: &str,
        is_main: bool,
    ) -> Result<Arc<CompiledTemplate>> {
        compile::template(self, name, source, is_main, 0).map(Arc::new)
    }

    /// Returns the number of compiled templates in the cache.
    pub fn cached_templates(&self) -> usize {
        self.cache.len()
    }

    /// Drops all compiled templates, e.g. after template files changed.
    pub fn clear_cache(&self) {
        self.cache.clear()
    }

    /// Render the main template, and optionally a layout, to a string.
    ///
    /// `templates` is the main template path followed by an optional layout
    /// name, resolved under `Layout/`. Further names are ignored.
    #[inline]
    pub fn render(&self, templates: &[&str], ctx: impl Into<Value>) -> Result<String> {
        let mut requirements = DefaultRequirements::new();
        self.render_with(templates, ctx, &mut requirements)
    }

    /// Render to a string, collecting requirements with the given collector.
    pub fn render_with(
        &self,
        templates: &[&str],
        ctx: impl Into<Value>,
        requirements: &mut dyn Requirements,
    ) -> Result<String> {
        let templates = self.compile_all(templates)?;
        render::to_string(self, &templates, ctx.into(), requirements)
    }

    /// Render to the given writer.
    pub fn render_to_writer<W>(
        &self,
        writer: W,
        templates: &[&str],
        ctx: impl Into<Value>,
        requirements: &mut dyn Requirements,
    ) -> Result<()>
    where
        W: io::Write,
    {
        let templates = self.compile_all(templates)?;
        render::to_writer(self, &templates, ctx.into(), requirements, writer)
    }

    fn compile_all(&self, templates: &[&str]) -> Result<Vec<Arc<CompiledTemplate>>> {
        let mut compiled = Vec::with_capacity(2);
        if let Some(main) = templates.first() {
            compiled.push(self.compile(main, true)?);
        }
        if let Some(layout) = templates.get(1) {
            compiled.push(self.compile(&format!("{LAYOUTS_PATH}{layout}"), false)?);
        }
        Ok(compiled)
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("cached_templates", &self.cache.len())
            .field("max_include_depth", &self.max_include_depth)
            .finish_non_exhaustive()
    }
}

impl CompiledTemplate {
    /// Render this template on its own to a string.
    #[inline]
    pub fn render(self: &Arc<Self>, engine: &Engine, ctx: impl Into<Value>) -> Result<String> {
        let mut requirements = DefaultRequirements::new();
        render::to_string(
            engine,
            std::slice::from_ref(self),
            ctx.into(),
            &mut requirements,
        )
    }
}
