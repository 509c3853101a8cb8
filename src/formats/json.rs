//! JSON conversion: three mutually exclusive rendering strategies.
//!
//! * `structured` — a recursive tree pretty-printer with typed value markers
//!   and depth-scaled indentation (the default).
//! * `table` — tabular rendering keyed off the root shape: array-of-objects
//!   becomes a real table with the union of keys as columns; other shapes
//!   degrade to two-column or single-value layouts.
//! * `raw` — the pretty-printed JSON source, escaped inside a code block.
//!
//! The parsed [`serde_json::Value`] tree is traversed read-only. Every
//! object key and string value is HTML-escaped on the way out.

use serde_json::Value;

use crate::error::DocPressError;
use crate::formats::{Converter, HtmlDocument};
use crate::options::{ConversionOptions, JsonDisplayMode};
use crate::template;

/// Converts JSON input according to
/// [`ConversionOptions::json_display_mode`].
pub struct JsonConverter;

impl Converter for JsonConverter {
    fn convert(
        &self,
        content: &str,
        options: &ConversionOptions,
    ) -> Result<HtmlDocument, DocPressError> {
        let value: Value =
            serde_json::from_str(content).map_err(|e| DocPressError::JsonParse {
                detail: e.to_string(),
            })?;

        let fragment = match options.json_display_mode {
            JsonDisplayMode::Structured => {
                let mut out = String::new();
                render_structured(&value, 0, &mut out);
                out
            }
            JsonDisplayMode::Table => render_table(&value),
            JsonDisplayMode::Raw => render_raw(&value),
        };

        let title = resolve_title(options, &value);
        Ok(template::bind(
            &fragment,
            &title,
            options.template_path.as_deref(),
        ))
    }
}

/// Explicit option title wins, then a `title` string field at the root of a
/// JSON object, then empty.
fn resolve_title(options: &ConversionOptions, value: &Value) -> String {
    if let Some(title) = &options.title {
        return title.clone();
    }
    if let Value::Object(map) = value {
        if let Some(Value::String(title)) = map.get("title") {
            return title.clone();
        }
    }
    String::new()
}

// ── Structured mode ──────────────────────────────────────────────────────

fn render_structured(value: &Value, depth: usize, out: &mut String) {
    match value {
        Value::Null => out.push_str("<span class=\"json-null\">null</span>"),
        Value::Bool(b) => {
            out.push_str("<span class=\"json-bool\">");
            out.push_str(if *b { "true" } else { "false" });
            out.push_str("</span>");
        }
        Value::Number(n) => {
            out.push_str("<span class=\"json-number\">");
            out.push_str(&n.to_string());
            out.push_str("</span>");
        }
        Value::String(s) => {
            out.push_str("<span class=\"json-string\">&quot;");
            out.push_str(&html_escape::encode_safe(s));
            out.push_str("&quot;</span>");
        }
        Value::Array(items) => {
            if items.is_empty() {
                out.push_str("<span class=\"json-empty\">[ ]</span>");
                return;
            }
            push_container_open(out, "json-array", depth);
            for (index, item) in items.iter().enumerate() {
                out.push_str("<div class=\"json-item\"><span class=\"json-index\">");
                out.push_str(&index.to_string());
                out.push_str("</span>");
                render_structured(item, depth + 1, out);
                out.push_str("</div>");
            }
            out.push_str("</div>");
        }
        Value::Object(map) => {
            if map.is_empty() {
                out.push_str("<span class=\"json-empty\">{ }</span>");
                return;
            }
            push_container_open(out, "json-object", depth);
            for (key, item) in map {
                out.push_str("<div class=\"json-entry\"><span class=\"json-key\">");
                out.push_str(&html_escape::encode_safe(key));
                out.push_str("</span>: ");
                render_structured(item, depth + 1, out);
                out.push_str("</div>");
            }
            out.push_str("</div>");
        }
    }
}

// Containers nest in the DOM, so a constant per-level margin yields
// indentation proportional to depth.
fn push_container_open(out: &mut String, class: &str, depth: usize) {
    if depth == 0 {
        out.push_str(&format!("<div class=\"{class}\">"));
    } else {
        out.push_str(&format!(
            "<div class=\"{class}\" style=\"margin-left:14px\">"
        ));
    }
}

// ── Table mode ───────────────────────────────────────────────────────────

fn render_table(value: &Value) -> String {
    match value {
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
            render_object_rows(items)
        }
        Value::Array(items) => render_indexed_rows(items),
        Value::Object(map) => render_key_value_rows(map),
        scalar => {
            let mut marker = String::new();
            render_structured(scalar, 0, &mut marker);
            format!("<div class=\"json-scalar\"><span class=\"json-label\">value</span>{marker}</div>\n")
        }
    }
}

/// Array of objects: one column per key (union across all elements,
/// first-seen order), one row per element, missing keys as empty cells.
fn render_object_rows(items: &[Value]) -> String {
    let mut columns: Vec<&str> = Vec::new();
    for item in items {
        if let Value::Object(map) = item {
            for key in map.keys() {
                if !columns.contains(&key.as_str()) {
                    columns.push(key);
                }
            }
        }
    }

    let mut out = String::from("<table>\n<thead><tr>");
    for column in &columns {
        out.push_str("<th>");
        out.push_str(&html_escape::encode_safe(column));
        out.push_str("</th>");
    }
    out.push_str("</tr></thead>\n<tbody>\n");

    for item in items {
        let Value::Object(map) = item else {
            continue;
        };
        out.push_str("<tr>");
        for column in &columns {
            out.push_str("<td>");
            if let Some(cell) = map.get(*column) {
                out.push_str(&render_cell(cell));
            }
            out.push_str("</td>");
        }
        out.push_str("</tr>\n");
    }

    out.push_str("</tbody>\n</table>\n");
    out
}

/// Array of non-objects: two-column (index, value) table.
fn render_indexed_rows(items: &[Value]) -> String {
    let mut out = String::from("<table>\n<thead><tr><th>#</th><th>value</th></tr></thead>\n<tbody>\n");
    for (index, item) in items.iter().enumerate() {
        out.push_str(&format!("<tr><td>{index}</td><td>"));
        out.push_str(&render_cell(item));
        out.push_str("</td></tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

/// Root object: two-column (key, value) table; nested values use the
/// structured renderer.
fn render_key_value_rows(map: &serde_json::Map<String, Value>) -> String {
    let mut out =
        String::from("<table>\n<thead><tr><th>key</th><th>value</th></tr></thead>\n<tbody>\n");
    for (key, item) in map {
        out.push_str("<tr><td>");
        out.push_str(&html_escape::encode_safe(key));
        out.push_str("</td><td>");
        render_structured(item, 0, &mut out);
        out.push_str("</td></tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

/// A single table cell: scalars inline, nested structures as pretty JSON.
fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => "<span class=\"json-null\">null</span>".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => html_escape::encode_safe(s).into_owned(),
        nested => {
            // to_string_pretty only fails on non-string map keys, which
            // serde_json::Value cannot represent.
            let pretty = serde_json::to_string_pretty(nested).unwrap_or_default();
            format!(
                "<pre class=\"json-cell\">{}</pre>",
                html_escape::encode_safe(&pretty)
            )
        }
    }
}

// ── Raw mode ─────────────────────────────────────────────────────────────

fn render_raw(value: &Value) -> String {
    let pretty = serde_json::to_string_pretty(value).unwrap_or_default();
    format!(
        "<pre class=\"json-raw\"><code>{}</code></pre>\n",
        html_escape::encode_safe(&pretty)
    )
}
