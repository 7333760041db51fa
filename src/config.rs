//! Configuration consumed by the engine: where templates live, which theme is
//! active and how `<% base_tag %>` builds the site URL.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// The sub-path, relative to the templates directory, of layout templates.
pub const LAYOUTS_PATH: &str = "Layout/";

/// The sub-path, relative to the templates directory, of included templates.
pub const INCLUDES_PATH: &str = "Includes/";

/// The file extension of template files.
pub const TEMPLATE_EXTENSION: &str = "ss";

/// Engine configuration.
///
/// # Examples
///
/// ```
/// use ssviewer::{Config, Protocol};
///
/// let config = Config::new("/var/www", "simple")?
///     .with_site_url("example.com/")
///     .with_default_protocol(Protocol::Https);
///
/// assert_eq!(config.templates_dir().to_str(), Some("/var/www/themes/simple/templates/"));
/// # Ok::<(), ssviewer::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawConfig"))]
pub struct Config {
    ss_root: String,
    theme: String,
    site_url: Option<String>,
    default_protocol: Protocol,
}

/// The protocol used to complete a site URL that doesn't specify one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl Config {
    /// Construct a new configuration from the site root and the theme name.
    ///
    /// Both must be non-empty.
    pub fn new(ss_root: impl Into<String>, theme: impl Into<String>) -> Result<Self> {
        let mut ss_root = ss_root.into();
        let theme = theme.into();
        if ss_root.is_empty() {
            return Err(Error::config(
                "template rendering requires configuration property `ssroot` is set",
            ));
        }
        if theme.is_empty() {
            return Err(Error::config(
                "template rendering requires configuration property `theme` is set",
            ));
        }
        if !ss_root.ends_with('/') {
            ss_root.push('/');
        }
        Ok(Self {
            ss_root,
            theme,
            site_url: None,
            default_protocol: Protocol::default(),
        })
    }

    /// Set the site URL used by `<% base_tag %>`.
    pub fn with_site_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.site_url = (!url.is_empty()).then_some(url);
        self
    }

    /// Set the protocol used when the site URL doesn't specify one.
    pub fn with_default_protocol(mut self, protocol: Protocol) -> Self {
        self.default_protocol = protocol;
        self
    }

    /// Parse a configuration from a JSON document.
    ///
    /// The settings may be at the top level or nested under a `goss` key.
    ///
    /// ```
    /// let config = ssviewer::Config::from_json_str(
    ///     r#"{ "goss": { "ssroot": "/srv/site", "theme": "simple", "defaultProtocol": "https" } }"#,
    /// )?;
    /// assert_eq!(config.theme(), "simple");
    /// # Ok::<(), ssviewer::Error>(())
    /// ```
    #[cfg(feature = "serde")]
    #[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
    pub fn from_json_str(json: &str) -> Result<Self> {
        let doc: serde_json::Value =
            serde_json::from_str(json).map_err(|e| Error::config(e.to_string()))?;
        let section = match doc.get("goss") {
            Some(section) => section.clone(),
            None => doc,
        };
        serde_json::from_value(section).map_err(|e| Error::config(e.to_string()))
    }

    /// Read and parse a JSON configuration file.
    #[cfg(feature = "serde")]
    #[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn ss_root(&self) -> &str {
        &self.ss_root
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn site_url(&self) -> Option<&str> {
        self.site_url.as_deref()
    }

    pub fn default_protocol(&self) -> Protocol {
        self.default_protocol
    }

    /// The directory containing the theme's templates.
    pub fn templates_dir(&self) -> PathBuf {
        Path::new(&self.ss_root)
            .join("themes")
            .join(&self.theme)
            .join("templates/")
    }

    /// The URL prefix of the theme's stylesheets, used by `themedCSS`.
    pub fn css_url(&self) -> String {
        format!("themes/{}/css/", self.theme)
    }

    /// The absolute URL emitted by `<% base_tag %>`.
    pub fn base_url(&self) -> String {
        let url = self.site_url.as_deref().unwrap_or("localhost/");
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_owned()
        } else {
            format!("{}://{}", self.default_protocol, url)
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => f.write_str("http"),
            Self::Https => f.write_str("https"),
        }
    }
}

/// The configuration as it appears in a JSON document, before validation.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    #[serde(rename = "ssroot", default)]
    ss_root: String,
    #[serde(default)]
    theme: String,
    #[serde(default)]
    site_url: Option<String>,
    #[serde(default)]
    default_protocol: Protocol,
}

#[cfg(feature = "serde")]
impl TryFrom<RawConfig> for Config {
    type Error = Error;

    fn try_from(raw: RawConfig) -> Result<Self> {
        let config = Config::new(raw.ss_root, raw.theme)?.with_default_protocol(raw.default_protocol);
        Ok(match raw.site_url {
            Some(url) => config.with_site_url(url),
            None => config,
        })
    }
}
