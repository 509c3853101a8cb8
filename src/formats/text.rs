//! Plain-text conversion: escape everything, preserve paragraph structure.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::DocPressError;
use crate::formats::{Converter, HtmlDocument};
use crate::options::ConversionOptions;
use crate::template;

// Two or more consecutive newlines separate paragraphs.
static RE_PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").unwrap());

/// Converts plain text: the whole input is HTML-escaped, blank lines split
/// paragraphs, single newlines become line breaks.
pub struct TextConverter;

impl Converter for TextConverter {
    fn convert(
        &self,
        content: &str,
        options: &ConversionOptions,
    ) -> Result<HtmlDocument, DocPressError> {
        let escaped = html_escape::encode_safe(&normalize_newlines(content)).into_owned();

        let mut fragment = String::with_capacity(escaped.len() + 64);
        for paragraph in RE_PARAGRAPH_BREAK.split(&escaped) {
            let paragraph = paragraph.trim_end();
            if paragraph.is_empty() {
                continue;
            }
            fragment.push_str("<p>");
            fragment.push_str(&paragraph.replace('\n', "<br>\n"));
            fragment.push_str("</p>\n");
        }

        let title = options.title.as_deref().unwrap_or("");
        Ok(template::bind(
            &fragment,
            title,
            options.template_path.as_deref(),
        ))
    }
}

fn normalize_newlines(content: &str) -> String {
    content.replace("\r\n", "\n").replace('\r', "\n")
}
