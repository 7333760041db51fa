//! Collects CSS and JavaScript inclusion requests made while rendering and
//! injects the corresponding markup into the finished page.

/// Where a script is injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Before `</head>`.
    Head,
    /// Before `</body>`.
    Body,
}

/// Receives the inclusion requests emitted by `<% require %>` directives.
///
/// Rendering calls [`inject_into_head`][Requirements::inject_into_head] and
/// then [`inject_into_body`][Requirements::inject_into_body] on the finished
/// markup.
pub trait Requirements {
    /// Include a stylesheet by path.
    fn add_css(&mut self, path: &str);

    /// Include an inline stylesheet. A non-empty `key` suppresses any later
    /// inclusion with the same key.
    fn add_custom_css(&mut self, css: &str, key: &str);

    /// Include a script by path, before `</body>`.
    fn add_javascript(&mut self, path: &str);

    /// Include an inline script. A non-empty `key` suppresses any later
    /// inclusion with the same key.
    fn add_custom_javascript(&mut self, js: &str, placement: Placement, key: &str);

    /// Inserts stylesheets and head scripts before `</head>`.
    fn inject_into_head(&self, markup: String) -> String;

    /// Inserts body scripts before `</body>`.
    fn inject_into_body(&self, markup: String) -> String;
}

/// The default [`Requirements`] collector.
///
/// # Examples
///
/// ```
/// use ssviewer::{DefaultRequirements, Requirements};
///
/// let mut req = DefaultRequirements::new();
/// req.add_javascript("app.js");
/// req.add_javascript("app.js");
///
/// let html = req.inject_into_body(String::from("<body></body>"));
/// assert_eq!(
///     html,
///     r#"<body><script type="text/javascript" src="app.js"></script></body>"#
/// );
/// ```
#[derive(Debug, Default, Clone)]
pub struct DefaultRequirements {
    css: Vec<Inclusion>,
    scripts: Vec<Inclusion>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Inclusion {
    source: Source,
    placement: Placement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    Path(String),
    Custom { content: String, key: String },
}

impl DefaultRequirements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if nothing has been requested.
    pub fn is_empty(&self) -> bool {
        self.css.is_empty() && self.scripts.is_empty()
    }

    fn head_markup(&self) -> String {
        let css = self.css.iter().map(Inclusion::as_css);
        let js = self
            .scripts
            .iter()
            .filter(|i| i.placement == Placement::Head)
            .map(Inclusion::as_javascript);
        css.chain(js).collect()
    }

    fn body_markup(&self) -> String {
        self.scripts
            .iter()
            .filter(|i| i.placement == Placement::Body)
            .map(Inclusion::as_javascript)
            .collect()
    }
}

impl Requirements for DefaultRequirements {
    fn add_css(&mut self, path: &str) {
        include_unique(&mut self.css, Inclusion::path(path, Placement::Head));
    }

    fn add_custom_css(&mut self, css: &str, key: &str) {
        include_unique(&mut self.css, Inclusion::custom(css, key, Placement::Head));
    }

    fn add_javascript(&mut self, path: &str) {
        include_unique(&mut self.scripts, Inclusion::path(path, Placement::Body));
    }

    fn add_custom_javascript(&mut self, js: &str, placement: Placement, key: &str) {
        include_unique(&mut self.scripts, Inclusion::custom(js, key, placement));
    }

    fn inject_into_head(&self, markup: String) -> String {
        inject_before(markup, "</head>", &self.head_markup())
    }

    fn inject_into_body(&self, markup: String) -> String {
        inject_before(markup, "</body>", &self.body_markup())
    }
}

impl Inclusion {
    fn path(path: &str, placement: Placement) -> Self {
        Self {
            source: Source::Path(path.to_owned()),
            placement,
        }
    }

    fn custom(content: &str, key: &str, placement: Placement) -> Self {
        Self {
            source: Source::Custom {
                content: content.to_owned(),
                key: key.to_owned(),
            },
            placement,
        }
    }

    /// Whether this inclusion makes `other` redundant.
    fn covers(&self, other: &Self) -> bool {
        match (&self.source, &other.source) {
            (Source::Path(a), Source::Path(b)) => a == b,
            (Source::Custom { key: a, .. }, Source::Custom { key: b, .. }) => {
                !a.is_empty() && a == b
            }
            _ => false,
        }
    }

    fn as_css(&self) -> String {
        match &self.source {
            Source::Path(path) => {
                format!(r#"<link rel="stylesheet" type="text/css" href="{path}" />"#)
            }
            Source::Custom { content, .. } => format!("<style>{content}</style>"),
        }
    }

    fn as_javascript(&self) -> String {
        match &self.source {
            Source::Path(path) => {
                format!(r#"<script type="text/javascript" src="{path}"></script>"#)
            }
            Source::Custom { content, .. } => {
                format!(r#"<script type="text/javascript">{content}</script>"#)
            }
        }
    }
}

fn include_unique(list: &mut Vec<Inclusion>, item: Inclusion) {
    if !list.iter().any(|i| i.covers(&item)) {
        list.push(item);
    }
}

fn inject_before(mut markup: String, tag: &str, inject: &str) -> String {
    if inject.is_empty() {
        return markup;
    }
    if let Some(i) = markup.find(tag) {
        markup.insert_str(i, inject);
    }
    markup
}
