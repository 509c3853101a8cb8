//! The HTML shell template that wraps converter fragments.
//!
//! Binding substitutes `{title}`, `{content}`, and `{style}` in a single
//! pass over the shell, so placeholder text occurring inside an inserted
//! value stays literal. The title is HTML-escaped because it is user text
//! landing in a text node; the content fragment and stylesheet are inserted
//! verbatim — they are produced by the converters, which carry the escaping
//! obligation for everything user-supplied inside them.
//!
//! A custom shell can be supplied via
//! [`crate::ConversionOptions::template_path`]. A missing or unreadable file
//! falls back to the embedded default shell; binding never fails.

use std::path::Path;
use tracing::{debug, warn};

/// The embedded fallback shell. Always available, never fails to bind.
pub const DEFAULT_SHELL: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
{style}
</style>
</head>
<body>
{content}
</body>
</html>
"#;

/// Print-oriented stylesheet injected into every generated document.
///
/// Covers the class vocabulary emitted by the converters (`json-*`,
/// `md-quote`) plus sensible print defaults for tables and code blocks.
pub const DEFAULT_STYLE: &str = r#"body {
  font-family: -apple-system, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
  font-size: 11pt;
  line-height: 1.55;
  color: #1f2328;
  margin: 0;
}
h1, h2, h3, h4, h5, h6 { line-height: 1.25; margin: 1.2em 0 0.5em; }
h1 { font-size: 1.8em; border-bottom: 1px solid #d0d7de; padding-bottom: 0.3em; }
h2 { font-size: 1.4em; border-bottom: 1px solid #d8dee4; padding-bottom: 0.2em; }
p { margin: 0.6em 0; }
a { color: #0969da; text-decoration: none; }
pre {
  background: #f6f8fa;
  border: 1px solid #d0d7de;
  border-radius: 6px;
  padding: 10px 12px;
  overflow-x: auto;
  font-size: 0.9em;
}
code { font-family: "SF Mono", SFMono-Regular, Consolas, "Liberation Mono", monospace; }
p code, li code { background: #f6f8fa; border-radius: 4px; padding: 0.1em 0.35em; }
blockquote.md-quote {
  margin: 0.8em 0;
  padding: 0.2em 1em;
  border-left: 4px solid #d0d7de;
  color: #57606a;
}
table { border-collapse: collapse; margin: 0.8em 0; width: 100%; }
th, td { border: 1px solid #d0d7de; padding: 6px 10px; text-align: left; vertical-align: top; }
th { background: #f6f8fa; font-weight: 600; }
tr:nth-child(even) td { background: #fbfcfd; }
hr { border: none; border-top: 1px solid #d0d7de; margin: 1.5em 0; }
img { max-width: 100%; }
.json-null, .json-empty { color: #8250df; font-style: italic; }
.json-bool { color: #0550ae; }
.json-number { color: #0550ae; }
.json-string { color: #0a3069; }
.json-key { color: #953800; font-weight: 600; }
.json-index { color: #57606a; margin-right: 0.5em; }
.json-entry, .json-item { margin: 2px 0; }
.json-scalar .json-label { font-weight: 600; margin-right: 0.6em; }
pre.json-raw { white-space: pre-wrap; word-break: break-word; }
@media print {
  body { -webkit-print-color-adjust: exact; print-color-adjust: exact; }
  pre, blockquote, table, img { break-inside: avoid; }
  h1, h2, h3 { break-after: avoid; }
}
"#;

/// Substitute the fragment, title, and stylesheet into a shell.
///
/// The shell is loaded from `template_path` when given; any load failure is
/// logged and silently replaced by [`DEFAULT_SHELL`]. Only the shell itself
/// is scanned for placeholders; inserted values are never rescanned, so a
/// title that happens to contain `{content}` comes out as that literal text.
pub fn bind(fragment: &str, title: &str, template_path: Option<&Path>) -> String {
    let shell = load_shell(template_path);
    let title = html_escape::encode_safe(title);

    let mut out = String::with_capacity(shell.len() + fragment.len() + DEFAULT_STYLE.len());
    let mut rest = shell.as_str();
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        if let Some(after) = tail.strip_prefix("{title}") {
            out.push_str(&title);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{style}") {
            out.push_str(DEFAULT_STYLE);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{content}") {
            out.push_str(fragment);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

fn load_shell(template_path: Option<&Path>) -> String {
    let Some(path) = template_path else {
        return DEFAULT_SHELL.to_string();
    };
    match std::fs::read_to_string(path) {
        Ok(shell) => {
            debug!("Loaded shell template from {}", path.display());
            shell
        }
        Err(e) => {
            warn!(
                "Failed to read shell template '{}' ({}); using embedded default",
                path.display(),
                e
            );
            DEFAULT_SHELL.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn binds_all_three_placeholders() {
        let doc = bind("<p>body</p>", "My Title", None);
        assert!(doc.contains("<title>My Title</title>"));
        assert!(doc.contains("<p>body</p>"));
        assert!(doc.contains("font-family"));
        assert!(!doc.contains("{title}"));
        assert!(!doc.contains("{content}"));
        assert!(!doc.contains("{style}"));
    }

    #[test]
    fn escapes_title_but_not_content() {
        let doc = bind("<p>safe</p>", "a < b & \"c\"", None);
        assert!(doc.contains("a &lt; b &amp; &quot;c&quot;"));
        assert!(doc.contains("<p>safe</p>"));
    }

    #[test]
    fn placeholder_text_in_the_title_stays_literal() {
        let doc = bind("<p>body</p>", "{content} and {style}", None);
        assert!(doc.contains("<title>{content} and {style}</title>"));
        assert_eq!(doc.matches("<p>body</p>").count(), 1);
        assert_eq!(doc.matches("@media print").count(), 1);
    }

    #[test]
    fn unknown_placeholders_are_left_alone() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "<main>{{content}}</main><aside>{{sidebar}}</aside>{{").unwrap();
        let doc = bind("<p>x</p>", "t", Some(f.path()));
        assert!(doc.contains("<main><p>x</p></main>"));
        assert!(doc.contains("<aside>{sidebar}</aside>{"));
    }

    #[test]
    fn missing_template_falls_back_to_default() {
        let doc = bind("<p>x</p>", "t", Some(Path::new("/definitely/not/here.html")));
        assert!(doc.contains("<!DOCTYPE html>"));
        assert!(doc.contains("<p>x</p>"));
    }

    #[test]
    fn custom_template_is_used_when_readable() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "<main data-shell=\"custom\">{{content}}</main>").unwrap();
        let doc = bind("<p>x</p>", "t", Some(f.path()));
        assert!(doc.contains("data-shell=\"custom\""));
        assert!(doc.contains("<p>x</p>"));
    }
}
