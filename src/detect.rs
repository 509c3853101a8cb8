//! Content-type detection for undeclared input.
//!
//! The detector never fails: it walks a fixed priority order and falls back
//! to plain text when nothing else matches. Bracket-delimited input that does
//! not parse as JSON is not an error either — it simply falls through to the
//! HTML and Markdown checks, because a text document that happens to start
//! with `{` is far more common than a user who wanted a JSON parse error.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::path::Path;

use crate::error::DocPressError;

/// The four formats the conversion core understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Html,
    Json,
    Markdown,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentType::Text => "text",
            ContentType::Html => "html",
            ContentType::Json => "json",
            ContentType::Markdown => "markdown",
        };
        f.write_str(name)
    }
}

impl ContentType {
    /// Map a file extension to a content type.
    ///
    /// Unrecognised or missing extensions default to [`ContentType::Text`];
    /// a permissive ergonomic choice, not a validation failure.
    pub fn from_extension(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => ContentType::Json,
            Some("html") | Some("htm") | Some("xhtml") => ContentType::Html,
            Some("md") | Some("markdown") | Some("mdown") => ContentType::Markdown,
            _ => ContentType::Text,
        }
    }
}

/// Content type as declared by a caller, including the `auto` sentinel that
/// defers to [`detect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeclaredType {
    #[default]
    Auto,
    Known(ContentType),
}

impl DeclaredType {
    /// Resolve a declared type name from a CLI flag or API field.
    ///
    /// This is the one open string edge in the system; everything past it is
    /// a closed enum. Unknown names fail with
    /// [`DocPressError::UnsupportedType`] and no conversion is attempted.
    pub fn from_name(name: &str) -> Result<Self, DocPressError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(DeclaredType::Auto),
            "text" | "txt" => Ok(DeclaredType::Known(ContentType::Text)),
            "html" => Ok(DeclaredType::Known(ContentType::Html)),
            "json" => Ok(DeclaredType::Known(ContentType::Json)),
            "markdown" | "md" => Ok(DeclaredType::Known(ContentType::Markdown)),
            other => Err(DocPressError::UnsupportedType {
                declared: other.to_string(),
            }),
        }
    }

    /// Resolve to a concrete content type, running the detector for `Auto`.
    pub fn resolve(self, content: &str) -> ContentType {
        match self {
            DeclaredType::Known(t) => t,
            DeclaredType::Auto => detect(content),
        }
    }
}

// Any opening or closing tag with a plausible element name.
static RE_HTML_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)</?[a-zA-Z][a-zA-Z0-9-]*(\s[^<>]*)?/?>").unwrap());

// Markdown cues checked in [`detect`]; any single hit classifies the input.
static RE_MARKDOWN_CUES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?m)^#{1,6}\s+\S",              // heading
        r"(?m)^\s{0,3}[*+-]\s+\S",        // bullet list
        r"(?m)^\s{0,3}\d+\.\s+\S",        // ordered list
        r"\*\*[^*\n]+\*\*",               // bold
        r"\*[^*\n]+\*",                   // italic
        r"\[[^\]\n]+\]\([^)\n]+\)",       // link
        r"```",                           // fenced code
        r"(?m)^\s{0,3}>\s?\S",            // blockquote
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Infer the format of raw content.
///
/// Priority order: JSON, HTML, Markdown, then plain text. Deterministic —
/// the same input always yields the same classification.
pub fn detect(content: &str) -> ContentType {
    let trimmed = content.trim();

    if looks_bracket_delimited(trimmed) && serde_json::from_str::<serde_json::Value>(trimmed).is_ok()
    {
        return ContentType::Json;
    }

    if RE_HTML_TAG.is_match(content) {
        return ContentType::Html;
    }

    if RE_MARKDOWN_CUES.iter().any(|re| re.is_match(content)) {
        return ContentType::Markdown;
    }

    ContentType::Text
}

fn looks_bracket_delimited(trimmed: &str) -> bool {
    (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'))
}
