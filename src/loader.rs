//! Sources of template text.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::config::TEMPLATE_EXTENSION;
use crate::{Config, Error, Result};

/// Provides the raw text of a template given its path, e.g. `Page` or
/// `Includes/Footer`.
pub trait Loader: Send + Sync {
    fn load(&self, path: &str) -> Result<String>;
}

/// Loads templates from the theme's template directory on disk.
///
/// The path `Includes/Footer` maps to `TEMPLATES_DIR/Includes/Footer.ss`.
#[derive(Debug, Clone)]
pub struct FileLoader {
    dir: PathBuf,
}

/// Loads templates from memory.
///
/// # Examples
///
/// ```
/// use ssviewer::{Loader, MemoryLoader};
///
/// let loader = MemoryLoader::new().with("Page", "<h1>$Title</h1>");
/// assert_eq!(loader.load("Page")?, "<h1>$Title</h1>");
/// # Ok::<(), ssviewer::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    templates: HashMap<String, String>,
}

impl FileLoader {
    /// Loads from the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Loads from the configured theme's template directory.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.templates_dir())
    }

    fn file_path(&self, path: &str) -> PathBuf {
        self.dir.join(format!("{path}.{TEMPLATE_EXTENSION}"))
    }
}

impl Loader for FileLoader {
    fn load(&self, path: &str) -> Result<String> {
        let file = self.file_path(path);
        tracing::trace!(path, file = %file.display(), "loading template");
        fs::read_to_string(&file).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => Error::not_found(path),
            _ => Error::from(err),
        })
    }
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a template, returning the loader.
    pub fn with(mut self, path: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(path, source);
        self
    }

    /// Adds a template, replacing any existing template with the same path.
    pub fn insert(&mut self, path: impl Into<String>, source: impl Into<String>) {
        self.templates.insert(path.into(), source.into());
    }
}

impl Loader for MemoryLoader {
    fn load(&self, path: &str) -> Result<String> {
        self.templates
            .get(path)
            .cloned()
            .ok_or_else(|| Error::not_found(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::ErrorKind;

    #[test]
    fn file_loader_reads_extension() {
        let dir = std::env::temp_dir().join(format!("ssviewer-loader-{}", std::process::id()));
        fs::create_dir_all(dir.join("Includes")).unwrap();
        fs::write(dir.join("Includes/Footer.ss"), "footer").unwrap();

        let loader = FileLoader::new(&dir);
        assert_eq!(loader.load("Includes/Footer").unwrap(), "footer");

        let err = loader.load("Missing").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn memory_loader_not_found() {
        let err = MemoryLoader::new().load("Page").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.to_string(), "template `Page` not found");
    }
}
