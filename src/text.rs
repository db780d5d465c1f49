//! Plain-text deriver – converts final HTML into a readable text alternative
//! for multipart delivery.
//!
//! Head content and images are omitted, link hrefs are collapsed when they
//! duplicate the link text, and output is word-wrapped. Works on the parsed
//! tree, so no markup can leak into the text part.

use crate::dom::{parse_html, DomNode, ElementNode};

/// Options for the text derivation; caller-supplied values replace the
/// defaults wholesale.
#[derive(Debug, Clone)]
pub struct TextOptions {
    /// Wrap column; 0 disables wrapping.
    pub wordwrap: usize,
    /// Omit `<head>` content entirely.
    pub skip_head: bool,
    /// Omit `<img>` elements (when `false`, their `alt` text is emitted).
    pub skip_images: bool,
    /// Omit the `[href]` suffix when it equals the link text.
    pub hide_link_href_if_same_as_text: bool,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            wordwrap: 80,
            skip_head: true,
            skip_images: true,
            hide_link_href_if_same_as_text: true,
        }
    }
}

/// Tags that force a block boundary in the text output.
const BLOCK_TAGS: &[&str] = &[
    "blockquote", "div", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li", "ol", "p", "table",
    "td", "th", "tr", "ul",
];

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Convert HTML to a plain-text alternative.
pub fn to_text(html: &str, options: &TextOptions) -> String {
    let nodes = parse_html(html);
    let mut writer = TextWriter::new(options);
    writer.walk(&nodes);
    writer.finish()
}

struct TextWriter<'a> {
    options: &'a TextOptions,
    blocks: Vec<String>,
    current: String,
}

impl<'a> TextWriter<'a> {
    fn new(options: &'a TextOptions) -> Self {
        Self {
            options,
            blocks: Vec::new(),
            current: String::new(),
        }
    }

    fn walk(&mut self, nodes: &[DomNode]) {
        for node in nodes {
            match node {
                DomNode::Text(text) => self.push_text(text),
                DomNode::Comment(_) | DomNode::Doctype(_) => {}
                DomNode::Element(e) => self.walk_element(e),
            }
        }
    }

    fn walk_element(&mut self, e: &ElementNode) {
        match e.tag.as_str() {
            "head" if self.options.skip_head => {}
            "style" | "script" => {}
            "img" => {
                if !self.options.skip_images {
                    if let Some(alt) = e.attr("alt") {
                        self.push_text(alt);
                    }
                }
            }
            "br" => self.current.push('\n'),
            "a" => self.push_link(e),
            tag if HEADING_TAGS.contains(&tag) => {
                self.flush();
                let before = self.blocks.len();
                self.walk(&e.children);
                self.flush();
                for block in &mut self.blocks[before..] {
                    *block = block.to_uppercase();
                }
            }
            tag if BLOCK_TAGS.contains(&tag) => {
                // Table cells stay on the row's line, separated by a space.
                if tag == "td" || tag == "th" {
                    if !self.current.is_empty() {
                        self.push_text(" ");
                    }
                    self.walk(&e.children);
                } else {
                    self.flush();
                    self.walk(&e.children);
                    self.flush();
                }
            }
            _ => self.walk(&e.children),
        }
    }

    fn push_link(&mut self, e: &ElementNode) {
        let label = collect_inline_text(&e.children);
        let label = label.trim();
        if label.is_empty() {
            return;
        }
        self.push_text(label);
        if let Some(href) = e.attr("href") {
            let same = href.trim() == label;
            if !(same && self.options.hide_link_href_if_same_as_text) {
                self.push_text(&format!(" [{href}]"));
            }
        }
    }

    /// Append text with whitespace collapsed to single spaces.
    fn push_text(&mut self, text: &str) {
        let decoded = decode_text(text);
        let mut chars = decoded.chars().peekable();
        while let Some(c) = chars.next() {
            if c.is_whitespace() {
                // Collapse runs; drop leading whitespace at a block/line start.
                while chars.peek().is_some_and(|n| n.is_whitespace()) {
                    chars.next();
                }
                if !self.current.is_empty() && !self.current.ends_with([' ', '\n']) {
                    self.current.push(' ');
                }
            } else {
                self.current.push(c);
            }
        }
    }

    fn flush(&mut self) {
        let text = std::mem::take(&mut self.current);
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let mut lines = Vec::new();
        for segment in text.split('\n') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            if self.options.wordwrap == 0 {
                lines.push(segment.to_string());
            } else {
                lines.extend(wrap(segment, self.options.wordwrap));
            }
        }
        if !lines.is_empty() {
            self.blocks.push(lines.join("\n"));
        }
    }

    fn finish(mut self) -> String {
        self.flush();
        self.blocks.join("\n\n")
    }
}

/// Inline text of a subtree, used for link labels.
fn collect_inline_text(nodes: &[DomNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            DomNode::Text(text) => out.push_str(&decode_text(text)),
            DomNode::Element(e) if e.tag != "style" && e.tag != "script" => {
                out.push_str(&collect_inline_text(&e.children));
            }
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_text(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Greedy word wrap at `width` columns. Words longer than the width get
/// their own line rather than being split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
        } else if line.chars().count() + 1 + word.chars().count() <= width {
            line.push(' ');
            line.push_str(word);
        } else {
            lines.push(std::mem::take(&mut line));
            line.push_str(word);
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_content_is_skipped() {
        let html = "<html><head><title>X</title></head><body><p>Y</p></body></html>";
        let text = to_text(html, &TextOptions::default());
        assert!(text.contains('Y'));
        assert!(!text.contains('X'));
    }

    #[test]
    fn images_are_skipped_by_default() {
        let html = r#"<p>Before <img src="a.png" alt="Logo" /> after</p>"#;
        let text = to_text(html, &TextOptions::default());
        assert_eq!(text, "Before after");
    }

    #[test]
    fn image_alt_shown_when_not_skipped() {
        let options = TextOptions {
            skip_images: false,
            ..Default::default()
        };
        let html = r#"<p><img src="a.png" alt="Logo" /></p>"#;
        assert_eq!(to_text(html, &options), "Logo");
    }

    #[test]
    fn link_href_shown_when_different() {
        let html = r#"<p><a href="https://example.com">Click here</a></p>"#;
        let text = to_text(html, &TextOptions::default());
        assert_eq!(text, "Click here [https://example.com]");
    }

    #[test]
    fn duplicate_link_href_is_hidden() {
        let html = r#"<p><a href="example.com">example.com</a></p>"#;
        let text = to_text(html, &TextOptions::default());
        assert_eq!(text, "example.com");
    }

    #[test]
    fn headings_are_uppercased() {
        let html = "<h1>Welcome aboard</h1><p>body</p>";
        let text = to_text(html, &TextOptions::default());
        assert!(text.starts_with("WELCOME ABOARD"));
    }

    #[test]
    fn wraps_at_configured_column() {
        let long = "word ".repeat(40);
        let html = format!("<p>{long}</p>");
        let text = to_text(&html, &TextOptions::default());
        assert!(text.lines().all(|l| l.chars().count() <= 80));
        assert!(text.lines().count() > 1);
    }

    #[test]
    fn no_angle_brackets_in_output() {
        let html = "<div><p>Hello</p><table><tr><td>a</td><td>b</td></tr></table></div>";
        let text = to_text(html, &TextOptions::default());
        assert!(!text.contains('<'));
        assert!(!text.contains('>'));
        assert!(text.contains("a b"));
    }

    #[test]
    fn blocks_are_separated_by_blank_lines() {
        let text = to_text("<p>one</p><p>two</p>", &TextOptions::default());
        assert_eq!(text, "one\n\ntwo");
    }
}
