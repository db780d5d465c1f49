//! CSS inliner – moves stylesheet rules into `style` attributes on matching
//! elements and strips the now-redundant `<style>` blocks.
//!
//! Rule handling is deliberately flat: simple and compound selectors only
//! (`*`, `tag`, `.class`, `#id`, `tag.class#id`), no combinators, no
//! specificity – later rules win per property, and an element's pre-existing
//! inline style wins over everything, which is what inline specificity means
//! in real CSS. `@media` blocks are never inlined; they are preserved in a
//! single `<style>` element so responsive overrides keep working.

use crate::dom::{find_element_mut, parse_html, serialize, DomNode, ElementNode};
use crate::style::StyleMap;

/// Tuning options for the inliner, layered over [`Default`] by callers.
#[derive(Debug, Clone)]
pub struct InlineOptions {
    /// Delete `<style>` elements after their rules are inlined.
    pub remove_style_tags: bool,
    /// Re-emit `@media` blocks in a `<style>` element in `<head>`.
    pub preserve_media_queries: bool,
}

impl Default for InlineOptions {
    fn default() -> Self {
        Self {
            remove_style_tags: true,
            preserve_media_queries: true,
        }
    }
}

/// Inline `extra_css` plus the document's own `<style>` rules into `style`
/// attributes. `extra_css` is applied as if it were a final stylesheet, so
/// its rules win over document rules on conflicting properties.
pub fn inline(html: &str, extra_css: &str, options: &InlineOptions) -> String {
    let mut nodes = parse_html(html);

    let mut document_css = String::new();
    collect_style_tags(&mut nodes, options.remove_style_tags, &mut document_css);

    let (doc_rules, doc_at_rules) = parse_rules(&document_css);
    let (extra_rules, extra_at_rules) = parse_rules(extra_css);

    let mut rules = doc_rules;
    rules.extend(extra_rules);

    apply_rules(&mut nodes, &rules);

    let mut preserved = Vec::new();
    let removed_doc_rules = if options.remove_style_tags {
        doc_at_rules
    } else {
        Vec::new()
    };
    for at_rule in removed_doc_rules.into_iter().chain(extra_at_rules) {
        let is_media = at_rule.trim_start().starts_with("@media");
        if !is_media || options.preserve_media_queries {
            preserved.push(at_rule);
        }
    }
    if !preserved.is_empty() {
        attach_style_element(&mut nodes, &preserved.join("\n"));
    }

    serialize(&nodes)
}

/// Elements that never receive a `style` attribute.
const NON_STYLABLE: &[&str] = &[
    "base", "head", "html", "link", "meta", "script", "style", "title",
];

// ---------------------------------------------------------------------------
// Stylesheet collection
// ---------------------------------------------------------------------------

/// Gather the text of every `<style>` element in document order, optionally
/// removing the elements themselves.
fn collect_style_tags(nodes: &mut Vec<DomNode>, remove: bool, out: &mut String) {
    let mut i = 0;
    while i < nodes.len() {
        let is_style = matches!(&nodes[i], DomNode::Element(e) if e.tag == "style");
        if is_style {
            if let DomNode::Element(e) = &nodes[i] {
                for child in &e.children {
                    if let DomNode::Text(text) = child {
                        out.push_str(text);
                        out.push('\n');
                    }
                }
            }
            if remove {
                nodes.remove(i);
                continue;
            }
        } else if let DomNode::Element(e) = &mut nodes[i] {
            collect_style_tags(&mut e.children, remove, out);
        }
        i += 1;
    }
}

fn attach_style_element(nodes: &mut Vec<DomNode>, css: &str) {
    let mut style = ElementNode::new("style");
    style.children.push(DomNode::Text(css.to_string()));
    let style = DomNode::Element(style);

    if let Some(head) = find_element_mut(nodes, "head") {
        head.children.push(style);
    } else if let Some(body) = find_element_mut(nodes, "body") {
        body.children.insert(0, style);
    } else {
        nodes.insert(0, style);
    }
}

// ---------------------------------------------------------------------------
// Flat CSS parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct CssRule {
    selectors: Vec<Selector>,
    declarations: String,
}

#[derive(Debug, Clone, Default)]
struct Selector {
    universal: bool,
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

/// Split a stylesheet into inlinable flat rules and preserved at-rule blocks
/// (`@media`, `@font-face`, …). No nesting outside at-rules is supported.
fn parse_rules(css: &str) -> (Vec<CssRule>, Vec<String>) {
    let mut rules = Vec::new();
    let mut at_rules = Vec::new();
    let css = strip_css_comments(css);
    let mut rest = css.as_str();

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        if rest.starts_with('@') {
            let (block, remainder) = take_at_rule(rest);
            at_rules.push(block.trim().to_string());
            rest = remainder;
            continue;
        }
        let Some(open) = rest.find('{') else {
            break;
        };
        let Some(close) = rest[open..].find('}') else {
            break;
        };
        let selector_text = &rest[..open];
        let declarations = rest[open + 1..open + close].trim().to_string();
        let mut selectors = Vec::new();
        for part in selector_text.split(',') {
            if let Some(selector) = parse_selector(part.trim()) {
                selectors.push(selector);
            }
        }
        if !selectors.is_empty() && !declarations.is_empty() {
            rules.push(CssRule {
                selectors,
                declarations,
            });
        }
        rest = &rest[open + close + 1..];
    }

    (rules, at_rules)
}

/// Consume one at-rule: either a statement ending in `;` or a brace-balanced
/// block (which may itself contain nested rules, e.g. `@media`).
fn take_at_rule(css: &str) -> (&str, &str) {
    let mut depth = 0usize;
    for (i, c) in css.char_indices() {
        match c {
            ';' if depth == 0 => return (&css[..=i], &css[i + 1..]),
            '{' => depth += 1,
            '}' => {
                if depth <= 1 {
                    return (&css[..=i], &css[i + 1..]);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    (css, "")
}

fn strip_css_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start..].find("*/") {
            Some(end) => rest = &rest[start + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Parse a simple or compound selector. Selectors with combinators or
/// pseudo-classes cannot be inlined and yield `None`.
fn parse_selector(text: &str) -> Option<Selector> {
    if text.is_empty() {
        return None;
    }
    if text
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '>' | '+' | '~' | '[' | ':'))
    {
        log::debug!("Skipping non-inlinable selector: \"{text}\"");
        return None;
    }
    if text == "*" {
        return Some(Selector {
            universal: true,
            ..Default::default()
        });
    }

    let mut selector = Selector::default();
    let mut chars = text.chars().peekable();
    let mut tag = String::new();
    while let Some(&c) = chars.peek() {
        if c == '.' || c == '#' {
            break;
        }
        tag.push(c);
        chars.next();
    }
    if !tag.is_empty() {
        selector.tag = Some(tag.to_ascii_lowercase());
    }

    while let Some(marker) = chars.next() {
        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if c == '.' || c == '#' {
                break;
            }
            name.push(c);
            chars.next();
        }
        if name.is_empty() {
            return None;
        }
        match marker {
            '.' => selector.classes.push(name),
            '#' => selector.id = Some(name),
            _ => return None,
        }
    }

    Some(selector)
}

// ---------------------------------------------------------------------------
// Rule application
// ---------------------------------------------------------------------------

fn selector_matches(selector: &Selector, element: &ElementNode) -> bool {
    if selector.universal {
        return true;
    }
    if let Some(tag) = &selector.tag {
        if *tag != element.tag {
            return false;
        }
    }
    if let Some(id) = &selector.id {
        if element.attr("id") != Some(id.as_str()) {
            return false;
        }
    }
    let classes = element.classes();
    selector.classes.iter().all(|c| classes.contains(&c.as_str()))
}

fn apply_rules(nodes: &mut [DomNode], rules: &[CssRule]) {
    crate::dom::visit_elements_mut(nodes, &mut |element| {
        if NON_STYLABLE.contains(&element.tag.as_str()) {
            return;
        }
        let mut map = StyleMap::new();
        for rule in rules {
            if rule.selectors.iter().any(|s| selector_matches(s, element)) {
                map.merge_raw(&rule.declarations);
            }
        }
        if map.is_empty() {
            return;
        }
        // Pre-existing inline declarations are applied last and win.
        if let Some(existing) = element.inline_style() {
            let existing = existing.to_string();
            map.merge_raw(&existing);
        }
        element.set_attr("style", &map.to_style_string());
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_rule_is_inlined_and_style_tag_removed() {
        let html = r#"<html><head><style>.a { color: red }</style></head><body><p class="a">x</p></body></html>"#;
        let out = inline(html, "", &InlineOptions::default());
        assert!(out.contains(r#"style="color: red;""#));
        assert!(!out.contains("<style>"));
    }

    #[test]
    fn extra_css_wins_over_document_css() {
        let html = r#"<style>p { color: red }</style><p>x</p>"#;
        let out = inline(html, "p { color: blue }", &InlineOptions::default());
        assert!(out.contains(r#"style="color: blue;""#));
    }

    #[test]
    fn existing_inline_style_wins() {
        let html = r#"<style>p { color: red }</style><p style="color: green;">x</p>"#;
        let out = inline(html, "", &InlineOptions::default());
        assert!(out.contains(r#"style="color: green;""#));
    }

    #[test]
    fn id_and_compound_selectors_match() {
        let html = r#"<td id="cell" class="wide">x</td><td class="wide narrow">y</td>"#;
        let css = "#cell { color: red } td.wide.narrow { width: 50% }";
        let out = inline(html, css, &InlineOptions::default());
        assert!(out.contains(r#"<td id="cell" class="wide" style="color: red;">"#));
        assert!(out.contains(r#"style="width: 50%;""#));
    }

    #[test]
    fn combinator_selectors_are_skipped() {
        let html = r#"<div class="a"><p>x</p></div>"#;
        let out = inline(html, ".a > p { color: red }", &InlineOptions::default());
        assert!(!out.contains("style="));
    }

    #[test]
    fn media_queries_are_preserved_in_head() {
        let html = "<html><head></head><body><p>x</p></body></html>";
        let css = "@media (max-width: 480px) { p { width: 100% } }";
        let out = inline(html, css, &InlineOptions::default());
        assert!(out.contains("<style>"));
        assert!(out.contains("@media (max-width: 480px)"));
        // Media rules must not be inlined.
        assert!(!out.contains(r#"<p style"#));
    }

    #[test]
    fn media_queries_can_be_dropped() {
        let options = InlineOptions {
            preserve_media_queries: false,
            ..Default::default()
        };
        let css = "@media (max-width: 480px) { p { width: 100% } }";
        let out = inline("<p>x</p>", css, &options);
        assert!(!out.contains("@media"));
    }

    #[test]
    fn font_face_is_always_preserved() {
        let css = "@font-face { font-family: Inter; src: url(x.woff2); }";
        let out = inline("<html><head></head><body></body></html>", css, &InlineOptions::default());
        assert!(out.contains("@font-face"));
    }

    #[test]
    fn style_tags_kept_when_requested() {
        let options = InlineOptions {
            remove_style_tags: false,
            ..Default::default()
        };
        let html = r#"<style>.a { color: red }</style><p class="a">x</p>"#;
        let out = inline(html, "", &options);
        assert!(out.contains("<style>"));
        assert!(out.contains(r#"style="color: red;""#));
    }

    #[test]
    fn head_elements_are_not_styled() {
        let html = "<html><head><title>t</title></head><body></body></html>";
        let out = inline(html, "* { color: red }", &InlineOptions::default());
        assert!(!out.contains("<title style"));
        assert!(!out.contains("<head style"));
    }
}
