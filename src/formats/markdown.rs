//! Markdown conversion: naive frontmatter split plus a custom
//! `pulldown-cmark` event renderer.
//!
//! The renderer walks the event stream instead of using the stock
//! `push_html` so it can attach anchor ids to headings, turn soft breaks
//! into `<br>`, class blockquotes for the print stylesheet, and collect the
//! first heading as a title fallback in a single pass.
//!
//! Frontmatter handling is deliberately not YAML: a leading `---` block is
//! read as flat `key: value` lines with surrounding quotes stripped, and
//! everything else in it is ignored. Documents that need real YAML
//! semantics should pass an explicit title instead.

use once_cell::sync::Lazy;
use pulldown_cmark::{Alignment, CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use regex::Regex;

use crate::error::DocPressError;
use crate::formats::{Converter, HtmlDocument};
use crate::options::ConversionOptions;
use crate::template;

static RE_CODE_LANGUAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Converts Markdown (CommonMark plus tables, strikethrough, and smart
/// punctuation) into HTML.
pub struct MarkdownConverter;

impl Converter for MarkdownConverter {
    fn convert(
        &self,
        content: &str,
        options: &ConversionOptions,
    ) -> Result<HtmlDocument, DocPressError> {
        let (frontmatter, body) = split_frontmatter(content);

        let mut md_options = Options::empty();
        md_options.insert(Options::ENABLE_TABLES);
        md_options.insert(Options::ENABLE_STRIKETHROUGH);
        md_options.insert(Options::ENABLE_SMART_PUNCTUATION);
        let parser = Parser::new_ext(body, md_options);

        let mut renderer = HtmlRenderer::default();
        for event in parser {
            renderer.handle(event);
        }
        let (fragment, first_heading) =
            renderer
                .finish()
                .map_err(|detail| DocPressError::Conversion {
                    detail: format!("Markdown rendering failed: {detail}"),
                })?;

        let title = options
            .title
            .clone()
            .or_else(|| frontmatter.get("title").map(str::to_string))
            .or(first_heading)
            .unwrap_or_default();

        Ok(template::bind(
            &fragment,
            &title,
            options.template_path.as_deref(),
        ))
    }
}

// ── Frontmatter ──────────────────────────────────────────────────────────

/// Flat `key: value` pairs from a leading `---` block.
#[derive(Debug, Default)]
pub struct Frontmatter {
    fields: Vec<(String, String)>,
}

impl Frontmatter {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Split a leading frontmatter block off the document.
///
/// Returns the parsed fields and the remaining body. The closing fence must
/// be a line holding nothing but `---`; without an opening `---` first line
/// or such a closer, the whole input is body.
pub fn split_frontmatter(content: &str) -> (Frontmatter, &str) {
    let Some(rest) = content.strip_prefix("---\n").or_else(|| {
        content.strip_prefix("---\r\n")
    }) else {
        return (Frontmatter::default(), content);
    };

    let mut close = None;
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim() == "---" {
            close = Some((offset, offset + line.len()));
            break;
        }
        offset += line.len();
    }
    let Some((block_end, body_start)) = close else {
        return (Frontmatter::default(), content);
    };
    let block = &rest[..block_end];

    let mut fields = Vec::new();
    for line in block.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        fields.push((key.to_string(), strip_quotes(value.trim()).to_string()));
    }

    (Frontmatter { fields }, &rest[body_start..])
}

fn strip_quotes(value: &str) -> &str {
    let v = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    v.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')).unwrap_or(v)
}

/// Lowercase the text and collapse non-alphanumeric runs into single
/// hyphens: `"Getting Started!"` becomes `"getting-started"`.
fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

// ── Event renderer ───────────────────────────────────────────────────────

/// An element whose inner content must be buffered before the opening tag
/// can be written (headings need a slug of their text, images need alt
/// text).
enum Pending {
    Heading { level: HeadingLevel },
    Image { url: String, title: String },
}

struct Buffer {
    pending: Pending,
    html: String,
    plain: String,
}

#[derive(Default)]
struct HtmlRenderer {
    out: String,
    buffers: Vec<Buffer>,
    first_heading: Option<String>,
    table_alignments: Vec<Alignment>,
    table_column: usize,
    in_table_head: bool,
    imbalance: bool,
}

impl HtmlRenderer {
    /// The sink current inline content goes to.
    fn sink(&mut self) -> &mut String {
        match self.buffers.last_mut() {
            Some(buffer) => &mut buffer.html,
            None => &mut self.out,
        }
    }

    fn push_escaped(&mut self, text: &str) {
        let escaped = html_escape::encode_safe(text).into_owned();
        self.sink().push_str(&escaped);
        if let Some(buffer) = self.buffers.last_mut() {
            buffer.plain.push_str(text);
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag_end) => self.end(tag_end),
            Event::Text(text) => self.push_escaped(&text),
            Event::Code(code) => {
                let escaped = html_escape::encode_safe(code.as_ref()).into_owned();
                let sink = self.sink();
                sink.push_str("<code>");
                sink.push_str(&escaped);
                sink.push_str("</code>");
                if let Some(buffer) = self.buffers.last_mut() {
                    buffer.plain.push_str(&code);
                }
            }
            Event::Html(html) | Event::InlineHtml(html) => self.sink().push_str(&html),
            Event::SoftBreak | Event::HardBreak => self.sink().push_str("<br>\n"),
            Event::Rule => self.sink().push_str("<hr>\n"),
            Event::TaskListMarker(checked) => {
                self.sink().push_str(if checked {
                    "<input type=\"checkbox\" checked disabled> "
                } else {
                    "<input type=\"checkbox\" disabled> "
                });
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.sink().push_str("<p>"),
            Tag::Heading { level, .. } => {
                self.buffers.push(Buffer {
                    pending: Pending::Heading { level },
                    html: String::new(),
                    plain: String::new(),
                });
            }
            Tag::BlockQuote(_) => self.sink().push_str("<blockquote class=\"md-quote\">\n"),
            Tag::CodeBlock(kind) => {
                let sink_tag = match kind {
                    CodeBlockKind::Fenced(lang) if RE_CODE_LANGUAGE.is_match(&lang) => {
                        format!("<pre><code class=\"language-{lang}\">")
                    }
                    _ => "<pre><code>".to_string(),
                };
                self.sink().push_str(&sink_tag);
            }
            Tag::List(Some(start)) => {
                let open = if start == 1 {
                    "<ol>\n".to_string()
                } else {
                    format!("<ol start=\"{start}\">\n")
                };
                self.sink().push_str(&open);
            }
            Tag::List(None) => self.sink().push_str("<ul>\n"),
            Tag::Item => self.sink().push_str("<li>"),
            Tag::Emphasis => self.sink().push_str("<em>"),
            Tag::Strong => self.sink().push_str("<strong>"),
            Tag::Strikethrough => self.sink().push_str("<del>"),
            Tag::Link { dest_url, title, .. } => {
                let mut open = format!(
                    "<a href=\"{}\"",
                    html_escape::encode_safe(dest_url.as_ref())
                );
                if !title.is_empty() {
                    open.push_str(&format!(
                        " title=\"{}\"",
                        html_escape::encode_safe(title.as_ref())
                    ));
                }
                open.push('>');
                self.sink().push_str(&open);
            }
            Tag::Image { dest_url, title, .. } => {
                self.buffers.push(Buffer {
                    pending: Pending::Image {
                        url: dest_url.to_string(),
                        title: title.to_string(),
                    },
                    html: String::new(),
                    plain: String::new(),
                });
            }
            Tag::Table(alignments) => {
                self.table_alignments = alignments;
                self.sink().push_str("<table>\n");
            }
            Tag::TableHead => {
                self.in_table_head = true;
                self.table_column = 0;
                self.sink().push_str("<thead>\n<tr>");
            }
            Tag::TableRow => {
                self.table_column = 0;
                self.sink().push_str("<tr>");
            }
            Tag::TableCell => {
                let cell = if self.in_table_head { "th" } else { "td" };
                let open = match self.table_alignments.get(self.table_column) {
                    Some(Alignment::Left) => format!("<{cell} style=\"text-align:left\">"),
                    Some(Alignment::Center) => format!("<{cell} style=\"text-align:center\">"),
                    Some(Alignment::Right) => format!("<{cell} style=\"text-align:right\">"),
                    _ => format!("<{cell}>"),
                };
                self.sink().push_str(&open);
            }
            _ => {}
        }
    }

    fn end(&mut self, tag_end: TagEnd) {
        match tag_end {
            TagEnd::Paragraph => self.sink().push_str("</p>\n"),
            TagEnd::Heading(_) => {
                let Some(buffer) = self.buffers.pop() else {
                    self.imbalance = true;
                    return;
                };
                let Pending::Heading { level } = buffer.pending else {
                    self.imbalance = true;
                    return;
                };
                if self.first_heading.is_none() {
                    self.first_heading = Some(buffer.plain.trim().to_string());
                }
                let slug = slugify(&buffer.plain);
                let heading = if slug.is_empty() {
                    format!("<{level}>{}</{level}>\n", buffer.html)
                } else {
                    format!("<{level} id=\"{slug}\">{}</{level}>\n", buffer.html)
                };
                self.sink().push_str(&heading);
            }
            TagEnd::BlockQuote(_) => self.sink().push_str("</blockquote>\n"),
            TagEnd::CodeBlock => self.sink().push_str("</code></pre>\n"),
            TagEnd::List(true) => self.sink().push_str("</ol>\n"),
            TagEnd::List(false) => self.sink().push_str("</ul>\n"),
            TagEnd::Item => self.sink().push_str("</li>\n"),
            TagEnd::Emphasis => self.sink().push_str("</em>"),
            TagEnd::Strong => self.sink().push_str("</strong>"),
            TagEnd::Strikethrough => self.sink().push_str("</del>"),
            TagEnd::Link => self.sink().push_str("</a>"),
            TagEnd::Image => {
                let Some(buffer) = self.buffers.pop() else {
                    self.imbalance = true;
                    return;
                };
                let Pending::Image { url, title } = buffer.pending else {
                    self.imbalance = true;
                    return;
                };
                let mut img = format!(
                    "<img src=\"{}\" alt=\"{}\"",
                    html_escape::encode_safe(&url),
                    html_escape::encode_safe(buffer.plain.trim()),
                );
                if !title.is_empty() {
                    img.push_str(&format!(" title=\"{}\"", html_escape::encode_safe(&title)));
                }
                img.push('>');
                self.sink().push_str(&img);
            }
            TagEnd::Table => self.sink().push_str("</tbody>\n</table>\n"),
            TagEnd::TableHead => {
                self.in_table_head = false;
                self.sink().push_str("</tr>\n</thead>\n<tbody>\n");
            }
            TagEnd::TableRow => self.sink().push_str("</tr>\n"),
            TagEnd::TableCell => {
                let cell = if self.in_table_head { "</th>" } else { "</td>" };
                self.table_column += 1;
                self.sink().push_str(cell);
            }
            _ => {}
        }
    }

    fn finish(self) -> Result<(String, Option<String>), String> {
        if self.imbalance || !self.buffers.is_empty() {
            return Err("unbalanced heading or image events".to_string());
        }
        Ok((self.out, self.first_heading))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(content: &str) -> String {
        MarkdownConverter
            .convert(content, &ConversionOptions::default())
            .unwrap()
    }

    #[test]
    fn headings_get_anchor_ids() {
        let doc = convert("# Getting Started!\n\n## A  B  C");
        assert!(doc.contains("<h1 id=\"getting-started\">Getting Started!</h1>"));
        assert!(doc.contains("<h2 id=\"a-b-c\">A  B  C</h2>"));
    }

    #[test]
    fn soft_breaks_become_line_breaks() {
        let doc = convert("line one\nline two");
        assert!(doc.contains("line one<br>\nline two"));
    }

    #[test]
    fn fenced_code_keeps_language_class_and_escapes() {
        let doc = convert("```rust\nlet x = a < b && c > d;\n```");
        assert!(doc.contains("<pre><code class=\"language-rust\">"));
        assert!(doc.contains("a &lt; b &amp;&amp; c &gt; d;"));
    }

    #[test]
    fn weird_code_fence_tag_drops_the_class() {
        let doc = convert("```c++ extra\nint x;\n```");
        assert!(doc.contains("<pre><code>"));
        assert!(!doc.contains("language-"));
    }

    #[test]
    fn blockquotes_are_classed_for_print() {
        let doc = convert("> quoted wisdom");
        assert!(doc.contains("<blockquote class=\"md-quote\">"));
        assert!(doc.contains("quoted wisdom"));
    }

    #[test]
    fn tables_render_with_alignment() {
        let doc = convert("| a | b |\n|:--|--:|\n| 1 | 2 |");
        assert!(doc.contains("<th style=\"text-align:left\">a</th>"));
        assert!(doc.contains("<th style=\"text-align:right\">b</th>"));
        assert!(doc.contains("<td style=\"text-align:left\">1</td>"));
        assert!(doc.contains("</tbody>\n</table>"));
    }

    #[test]
    fn inline_markup_round_trips() {
        let doc = convert("*em* **strong** ~~gone~~ `code` [link](https://example.com)");
        assert!(doc.contains("<em>em</em>"));
        assert!(doc.contains("<strong>strong</strong>"));
        assert!(doc.contains("<del>gone</del>"));
        assert!(doc.contains("<code>code</code>"));
        assert!(doc.contains("<a href=\"https://example.com\">link</a>"));
    }

    #[test]
    fn frontmatter_is_split_and_not_rendered() {
        let (fm, body) = split_frontmatter("---\ntitle: \"My Doc\"\nauthor: 'me'\n---\n# Body\n");
        assert_eq!(fm.get("title"), Some("My Doc"));
        assert_eq!(fm.get("author"), Some("me"));
        assert_eq!(body, "# Body\n");
    }

    #[test]
    fn unterminated_frontmatter_is_body() {
        let (fm, body) = split_frontmatter("---\ntitle: lost\nno closing fence");
        assert!(fm.is_empty());
        assert!(body.starts_with("---"));
    }

    #[test]
    fn frontmatter_closer_must_be_a_bare_fence() {
        // Lines that merely start with --- do not close the block.
        let (fm, body) =
            split_frontmatter("---\ntitle: x\n----- rule\n---extra\n---\nbody\n");
        assert_eq!(fm.get("title"), Some("x"));
        assert_eq!(body, "body\n");

        // No bare --- line at all means no frontmatter.
        let (fm, body) = split_frontmatter("---\ntitle: x\n---junk\nbody");
        assert!(fm.is_empty());
        assert!(body.starts_with("---\ntitle: x"));
    }

    #[test]
    fn title_resolution_order() {
        // Explicit option wins over everything.
        let options = ConversionOptions::builder().title("Explicit").build().unwrap();
        let doc = MarkdownConverter
            .convert("---\ntitle: FM\n---\n# Heading", &options)
            .unwrap();
        assert!(doc.contains("<title>Explicit</title>"));

        // Frontmatter next.
        let doc = convert("---\ntitle: FM\n---\n# Heading");
        assert!(doc.contains("<title>FM</title>"));

        // First heading next.
        let doc = convert("intro paragraph\n\n## Deep Heading\n\n# Later");
        assert!(doc.contains("<title>Deep Heading</title>"));

        // Otherwise empty.
        let doc = convert("just a paragraph");
        assert!(doc.contains("<title></title>"));
    }

    #[test]
    fn heading_title_strips_inline_markup() {
        let doc = convert("# A *styled* `title`");
        assert!(doc.contains("<title>A styled title</title>"));
        assert!(doc.contains("id=\"a-styled-title\""));
    }

    #[test]
    fn ordered_list_start_is_preserved() {
        let doc = convert("3. three\n4. four");
        assert!(doc.contains("<ol start=\"3\">"));
        assert!(doc.contains("<li>three</li>"));
    }

    #[test]
    fn raw_html_passes_through() {
        let doc = convert("before\n\n<div class=\"keep\">kept</div>\n\nafter");
        assert!(doc.contains("<div class=\"keep\">kept</div>"));
    }
}
