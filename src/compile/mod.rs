//! Compile template source into a chunk tree that can be executed by the
//! renderer.
//!
//! This process has two stages:
//! - The scanner chunks the template source into tokens.
//! - The parser constructs the chunk tree from the token stream, compiling
//!   included templates as it goes.
//!
//! Compiled templates are memoized per engine by path.

mod lex;
mod parse;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::types::chunk::Chunk;
use crate::{Engine, Error, Result};

/// A compiled template.
pub struct CompiledTemplate {
    name: Arc<str>,
    root: Chunk,
}

/// A thread-safe map from template path to compiled template.
///
/// A lookup that misses is parsed outside of the lock. If two threads compile
/// the same path at once the first one to finish wins and both get its
/// result.
#[derive(Default)]
pub(crate) struct Cache {
    templates: Mutex<HashMap<String, Arc<CompiledTemplate>>>,
}

impl CompiledTemplate {
    /// The path or name the template was compiled from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn root(&self) -> &Chunk {
        &self.root
    }
}

impl fmt::Debug for CompiledTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledTemplate")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Cache {
    pub fn get(&self, path: &str) -> Option<Arc<CompiledTemplate>> {
        self.lock().get(path).cloned()
    }

    /// Inserts a compiled template unless one is already present, returning
    /// the one that ends up in the cache.
    pub fn insert(&self, path: &str, template: CompiledTemplate) -> Arc<CompiledTemplate> {
        self.lock()
            .entry(path.to_owned())
            .or_insert_with(|| Arc::new(template))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn clear(&self) {
        self.lock().clear()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<CompiledTemplate>>> {
        self.templates.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns the compiled template for `path`, loading and parsing it on the
/// first request.
pub(crate) fn compile(
    engine: &Engine,
    path: &str,
    is_main: bool,
    depth: usize,
) -> Result<Arc<CompiledTemplate>> {
    if depth > engine.max_include_depth {
        return Err(Error::max_include_depth(engine.max_include_depth));
    }

    if let Some(template) = engine.cache.get(path) {
        tracing::debug!(path, "template cache hit");
        return Ok(template);
    }

    tracing::debug!(path, "template cache miss");
    let source = engine.loader.load(path)?;
    let template = template(engine, path, &source, is_main, depth)?;
    Ok(engine.cache.insert(path, template))
}

/// Parses template source into a compiled template, bypassing the cache.
pub(crate) fn template(
    engine: &Engine,
    name: &str,
    source: &str,
    is_main: bool,
    depth: usize,
) -> Result<CompiledTemplate> {
    let name: Arc<str> = Arc::from(name);
    let root = parse::Parser::new(engine, name.clone(), source, is_main, depth).parse_source()?;
    Ok(CompiledTemplate { name, root })
}
