// src/document.rs

//! Queryable view of the source HTML document.
//!
//! Parsing is delegated to `scraper` (html5ever). The engine only needs two
//! queries: the main build script and elements by `id`.

use scraper::{ElementRef, Html};

/// Human-readable form of the main-role selector, used in failure messages.
pub const MAIN_SELECTOR: &str = r#"script[role="main"]"#;

/// An element found by [`SourceDocument::element_by_id`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundElement {
    /// Value of the `src` attribute, if any.
    pub src: Option<String>,
    /// Inner HTML, markup preserved.
    pub inner_html: String,
}

/// A parsed source document. Parsed once per build attempt.
pub struct SourceDocument {
    html: Html,
}

impl std::fmt::Debug for SourceDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceDocument").finish_non_exhaustive()
    }
}

impl SourceDocument {
    /// HTML5 parsing is total; malformed markup still yields a document.
    pub fn parse(text: &str) -> Self {
        Self {
            html: Html::parse_document(text),
        }
    }

    fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.html.root_element().descendants().filter_map(ElementRef::wrap)
    }

    /// Text of the first `script[role="main"]` element.
    pub fn main_program(&self) -> Option<String> {
        self.elements()
            .find(|el| el.value().name() == "script" && el.value().attr("role") == Some("main"))
            .map(|el| el.text().collect())
    }

    /// First element whose `id` equals `id` exactly.
    pub fn element_by_id(&self, id: &str) -> Option<FoundElement> {
        if id.is_empty() {
            return None;
        }
        self.elements()
            .find(|el| el.value().id() == Some(id))
            .map(|el| FoundElement {
                src: el.value().attr("src").map(str::to_string),
                inner_html: el.inner_html(),
            })
    }
}

/// Keep only `[A-Za-z0-9_-]` from a requested identifier.
pub fn sanitize_id(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}
