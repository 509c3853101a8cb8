//! Conversion and page-layout options.
//!
//! All behaviour is controlled through [`ConversionOptions`], built via its
//! [`ConversionOptionsBuilder`]. Keeping every knob in one struct makes it
//! trivial to share options across requests, serialise them for logging, and
//! diff two runs to understand why their outputs differ.
//!
//! Layout validation is structural: [`PageLayoutOptions::validate`] returns
//! every broken field at once (see [`FieldError`]) instead of bailing on the
//! first, so a CLI user fixing a command line or an API client fixing a
//! payload sees the full picture in one round trip.

use crate::error::{DocPressError, FieldError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// How the JSON converter lays out its output.
///
/// Only consulted for JSON input; silently ignored for the other formats.
/// Unknown names at the string edges default to `Structured` — a permissive
/// ergonomic default, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonDisplayMode {
    /// Recursive pretty-printed tree with typed value markers. (default)
    #[default]
    Structured,
    /// Tabular rendering: arrays of objects become one row per element.
    Table,
    /// Pretty-printed JSON source, escaped inside a code block.
    Raw,
}

impl JsonDisplayMode {
    /// Resolve a mode name, defaulting unknown or empty names to
    /// [`JsonDisplayMode::Structured`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "table" => JsonDisplayMode::Table,
            "raw" => JsonDisplayMode::Raw,
            _ => JsonDisplayMode::Structured,
        }
    }
}

/// Paper size handed to the browser's print call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PageFormat {
    #[default]
    A4,
    A3,
    A5,
    Legal,
    Letter,
    Tabloid,
}

impl PageFormat {
    /// Resolve a format name (case-insensitive). Anything outside the six
    /// known formats is a validation error, not a silent fallback.
    pub fn from_name(name: &str) -> Result<Self, FieldError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(PageFormat::A4),
            "a3" => Ok(PageFormat::A3),
            "a5" => Ok(PageFormat::A5),
            "legal" => Ok(PageFormat::Legal),
            "letter" => Ok(PageFormat::Letter),
            "tabloid" => Ok(PageFormat::Tabloid),
            _ => Err(FieldError::new(
                "page_format",
                format!("unknown page format '{name}' (expected A4, A3, A5, Legal, Letter, or Tabloid)"),
            )),
        }
    }

    /// Paper dimensions in inches, `(width, height)`.
    pub fn dimensions_in(&self) -> (f64, f64) {
        match self {
            PageFormat::A4 => (8.27, 11.69),
            PageFormat::A3 => (11.69, 16.54),
            PageFormat::A5 => (5.83, 8.27),
            PageFormat::Legal => (8.5, 14.0),
            PageFormat::Letter => (8.5, 11.0),
            PageFormat::Tabloid => (11.0, 17.0),
        }
    }
}

impl fmt::Display for PageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PageFormat::A4 => "A4",
            PageFormat::A3 => "A3",
            PageFormat::A5 => "A5",
            PageFormat::Legal => "Legal",
            PageFormat::Letter => "Letter",
            PageFormat::Tabloid => "Tabloid",
        };
        f.write_str(name)
    }
}

impl TryFrom<String> for PageFormat {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PageFormat::from_name(&value).map_err(|e| e.message)
    }
}

impl From<PageFormat> for String {
    fn from(value: PageFormat) -> Self {
        value.to_string()
    }
}

/// Page margins as CSS length strings (`"1cm"`, `"0.4in"`, `"12pt"`, …).
///
/// Kept as strings rather than a numeric unit type because that is what both
/// the CLI surface and the print engine speak; validation and unit conversion
/// happen once, in [`PageLayoutOptions::validate`] and
/// [`css_length_to_inches`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: String,
    pub right: String,
    pub bottom: String,
    pub left: String,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: "0.4in".to_string(),
            right: "0.4in".to_string(),
            bottom: "0.4in".to_string(),
            left: "0.4in".to_string(),
        }
    }
}

impl Margins {
    /// Same length on all four sides.
    pub fn uniform(length: impl Into<String>) -> Self {
        let l = length.into();
        Self {
            top: l.clone(),
            right: l.clone(),
            bottom: l.clone(),
            left: l,
        }
    }
}

/// Page-layout options forwarded to the browser's print call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageLayoutOptions {
    /// Paper size. Default: A4.
    pub page_format: PageFormat,

    /// Page margins. Default: 0.4in on every side.
    pub margins: Margins,

    /// Print CSS backgrounds. Default: true.
    pub print_background: bool,

    /// Honour an `@page` size declared in the document's CSS over
    /// `page_format`. Default: false.
    pub prefer_css_page_size: bool,

    /// HTML snippet repeated at the top of every page. Enables
    /// header/footer display when set.
    pub header_template: Option<String>,

    /// HTML snippet repeated at the bottom of every page.
    pub footer_template: Option<String>,

    /// Per-render timeout in seconds. Default: 60.
    ///
    /// The print call is the only I/O-bound suspension point in a
    /// conversion; an unresponsive browser must not hang a request forever.
    pub render_timeout_secs: u64,
}

impl Default for PageLayoutOptions {
    fn default() -> Self {
        Self {
            page_format: PageFormat::A4,
            margins: Margins::default(),
            print_background: true,
            prefer_css_page_size: false,
            header_template: None,
            footer_template: None,
            render_timeout_secs: 60,
        }
    }
}

impl PageLayoutOptions {
    /// Check every field, returning the full list of problems.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        for (field, value) in [
            ("margins.top", &self.margins.top),
            ("margins.right", &self.margins.right),
            ("margins.bottom", &self.margins.bottom),
            ("margins.left", &self.margins.left),
        ] {
            if css_length_to_inches(value).is_none() {
                errors.push(FieldError::new(
                    field,
                    format!("invalid length '{value}' (expected a number with px, in, cm, mm, pt, or pc)"),
                ));
            }
        }

        if self.render_timeout_secs == 0 {
            errors.push(FieldError::new(
                "render_timeout_secs",
                "timeout must be at least 1 second",
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Parse a CSS length string into inches.
///
/// Bare numbers are pixels. Returns `None` for negative values, unknown
/// units, or garbage.
pub fn css_length_to_inches(value: &str) -> Option<f64> {
    let v = value.trim();
    let (number, per_inch) = if let Some(n) = v.strip_suffix("px") {
        (n, 96.0)
    } else if let Some(n) = v.strip_suffix("in") {
        (n, 1.0)
    } else if let Some(n) = v.strip_suffix("cm") {
        (n, 2.54)
    } else if let Some(n) = v.strip_suffix("mm") {
        (n, 25.4)
    } else if let Some(n) = v.strip_suffix("pt") {
        (n, 72.0)
    } else if let Some(n) = v.strip_suffix("pc") {
        (n, 6.0)
    } else {
        (v, 96.0)
    };

    let number: f64 = number.trim().parse().ok()?;
    if number < 0.0 || !number.is_finite() {
        return None;
    }
    Some(number / per_inch)
}

/// Options for a single conversion.
///
/// Built via [`ConversionOptions::builder()`] or
/// [`ConversionOptions::default()`].
///
/// # Example
/// ```rust
/// use docpress::{ConversionOptions, JsonDisplayMode, PageFormat};
///
/// let options = ConversionOptions::builder()
///     .title("Quarterly report")
///     .json_display_mode(JsonDisplayMode::Table)
///     .page_format(PageFormat::Letter)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    /// Document title. When absent, converters fall back to content-derived
    /// titles (frontmatter, a root-level JSON `title` field, the first
    /// Markdown heading) and finally to an empty string.
    pub title: Option<String>,

    /// JSON rendering strategy. Ignored for non-JSON input.
    pub json_display_mode: JsonDisplayMode,

    /// Page layout forwarded to the renderer.
    pub page_layout: PageLayoutOptions,

    /// Path to a custom HTML shell template containing `{title}`,
    /// `{content}`, and `{style}` placeholders. Unreadable or missing files
    /// fall back to the embedded default shell.
    pub template_path: Option<PathBuf>,
}

impl ConversionOptions {
    /// Create a new builder for `ConversionOptions`.
    pub fn builder() -> ConversionOptionsBuilder {
        ConversionOptionsBuilder {
            options: Self::default(),
            field_errors: Vec::new(),
        }
    }
}

/// Builder for [`ConversionOptions`].
///
/// String-typed inputs (page format names) are checked in [`build`], which
/// reports every problem at once as [`DocPressError::Validation`].
///
/// [`build`]: ConversionOptionsBuilder::build
#[derive(Debug)]
pub struct ConversionOptionsBuilder {
    options: ConversionOptions,
    field_errors: Vec<FieldError>,
}

impl ConversionOptionsBuilder {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.options.title = Some(title.into());
        self
    }

    pub fn json_display_mode(mut self, mode: JsonDisplayMode) -> Self {
        self.options.json_display_mode = mode;
        self
    }

    pub fn page_format(mut self, format: PageFormat) -> Self {
        self.options.page_layout.page_format = format;
        self
    }

    /// Set the page format from a name; unknown names surface at [`build`]
    /// as a validation error.
    ///
    /// [`build`]: ConversionOptionsBuilder::build
    pub fn page_format_name(mut self, name: &str) -> Self {
        match PageFormat::from_name(name) {
            Ok(format) => self.options.page_layout.page_format = format,
            Err(e) => self.field_errors.push(e),
        }
        self
    }

    pub fn margins(mut self, margins: Margins) -> Self {
        self.options.page_layout.margins = margins;
        self
    }

    pub fn print_background(mut self, v: bool) -> Self {
        self.options.page_layout.print_background = v;
        self
    }

    pub fn prefer_css_page_size(mut self, v: bool) -> Self {
        self.options.page_layout.prefer_css_page_size = v;
        self
    }

    pub fn header_template(mut self, html: impl Into<String>) -> Self {
        self.options.page_layout.header_template = Some(html.into());
        self
    }

    pub fn footer_template(mut self, html: impl Into<String>) -> Self {
        self.options.page_layout.footer_template = Some(html.into());
        self
    }

    pub fn render_timeout_secs(mut self, secs: u64) -> Self {
        self.options.page_layout.render_timeout_secs = secs;
        self
    }

    pub fn template_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.template_path = Some(path.into());
        self
    }

    /// Build the options, validating the page layout.
    pub fn build(self) -> Result<ConversionOptions, DocPressError> {
        let mut errors = self.field_errors;
        if let Err(layout_errors) = self.options.page_layout.validate() {
            errors.extend(layout_errors);
        }
        if errors.is_empty() {
            Ok(self.options)
        } else {
            Err(DocPressError::Validation(errors))
        }
    }
}
