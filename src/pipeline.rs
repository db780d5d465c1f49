//! Pipeline – ties together utility-CSS generation, inlining, cleanup, and
//! plain-text derivation into a single render call.
//!
//! The pipeline itself has no fatal path: every stage degrades to its safe
//! default (empty CSS, untouched HTML) with a logged warning. The only
//! failure a caller can observe is upstream, in the SSR renderer that
//! produces the head/body pair before this code runs.

use crate::cleanup;
use crate::dom::{find_element_mut, parse_html, serialize, DomNode, ElementNode};
use crate::inline::{self, InlineOptions};
use crate::media;
use crate::tailwind::{self, TailwindConfig};
use crate::text::{self, TextOptions};

/// Fixed document preamble for email clients (XHTML 1.0 Transitional).
pub const DOCTYPE: &str = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">"#;

/// Configuration for one render call. All options are independent; the
/// default renders compact HTML with no utility CSS and no text part.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Reformat the output with newlines and per-tag lines.
    pub pretty: bool,
    /// Also derive a plain-text alternative; switches the output shape.
    pub plain_text: bool,
    /// Enables utility-CSS generation when set.
    pub tailwind_config: Option<TailwindConfig>,
    /// Raw CSS always merged in ahead of the generated utility CSS
    /// (e.g. `@font-face` declarations).
    pub global_styles: Option<String>,
    /// Overrides for the plain-text deriver.
    pub text_options: Option<TextOptions>,
    /// Overrides for the CSS inliner.
    pub inline_options: Option<InlineOptions>,
}

/// Result of a render: a bare HTML string, or an HTML/text pair when
/// `plain_text` was requested. The shape depends on that one flag only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutput {
    Html(String),
    WithText { html: String, text: String },
}

impl RenderOutput {
    pub fn html(&self) -> &str {
        match self {
            RenderOutput::Html(html) => html,
            RenderOutput::WithText { html, .. } => html,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            RenderOutput::Html(_) => None,
            RenderOutput::WithText { text, .. } => Some(text),
        }
    }

    pub fn into_html(self) -> String {
        match self {
            RenderOutput::Html(html) => html,
            RenderOutput::WithText { html, .. } => html,
        }
    }
}

/// Full pipeline over an SSR head/body pair.
///
/// The fragments are opaque text assumed to contain `<head>…</head>` and
/// `<body>…</body>`; they are concatenated after the fixed DOCTYPE preamble
/// and pushed through utility-CSS generation → inlining → cleanup →
/// (optional) pretty-printing → (optional) plain-text derivation.
pub fn render_parts(head: &str, body: &str, options: &RenderOptions) -> RenderOutput {
    render_combined(format!("{DOCTYPE}\n{head}\n{body}"), options)
}

/// Convenience for markup that is already one document (CLI entry point).
/// The DOCTYPE preamble is prepended when absent.
pub fn render_document(html: &str, options: &RenderOptions) -> RenderOutput {
    let trimmed = html.trim_start();
    let has_doctype = trimmed
        .get(..9)
        .is_some_and(|p| p.eq_ignore_ascii_case("<!doctype"));
    let combined = if has_doctype {
        html.to_string()
    } else {
        format!("{DOCTYPE}\n{html}")
    };
    render_combined(combined, options)
}

fn render_combined(combined: String, options: &RenderOptions) -> RenderOutput {
    // 1. Convert data-mq-* directives into a trailing <style> block so the
    //    inliner can carry them through as preserved media queries.
    let combined = apply_media_directives(&combined);

    // 2. Generate utility CSS for the classes used in the markup. The
    //    feature is enabled by supplying a config.
    let generated_css = match &options.tailwind_config {
        Some(config) => css_or_default(tailwind::process(&combined, Some(config))),
        None => String::new(),
    };

    // 3. Global styles first, generated CSS second; skip absent parts.
    let mut extra_css = String::new();
    for part in [options.global_styles.as_deref(), Some(&*generated_css)] {
        match part {
            Some(css) if !css.is_empty() => {
                if !extra_css.is_empty() {
                    extra_css.push('\n');
                }
                extra_css.push_str(css);
            }
            _ => {}
        }
    }

    // 4. Inline – always, even with empty extra CSS, so <style> removal and
    //    attribute merging behave consistently.
    let inline_options = options.inline_options.clone().unwrap_or_default();
    let inlined = inline::inline(&combined, &extra_css, &inline_options);

    // 5. Optional pretty-print, then artifact cleanup (original stage order).
    let formatted = if options.pretty {
        cleanup::pretty(&inlined)
    } else {
        inlined
    };
    let final_html = cleanup::cleanup(&formatted);

    if options.plain_text {
        let text_options = options.text_options.clone().unwrap_or_default();
        let text = text::to_text(&final_html, &text_options);
        RenderOutput::WithText {
            html: final_html,
            text,
        }
    } else {
        RenderOutput::Html(final_html)
    }
}

/// Strip `data-mq-*` attributes from the document and inject the generated
/// media queries as a trailing `<style>` block in `<body>`. Markup without
/// any directive passes through untouched.
fn apply_media_directives(html: &str) -> String {
    if !html.contains("data-mq-") {
        return html.to_string();
    }
    let mut nodes = parse_html(html);
    let css = media::extract_document(&mut nodes);
    if !css.is_empty() {
        let mut style = ElementNode::new("style");
        style.children.push(DomNode::Text(css));
        let style = DomNode::Element(style);
        if let Some(body) = find_element_mut(&mut nodes, "body") {
            body.children.push(style);
        } else {
            nodes.push(style);
        }
    }
    serialize(&nodes)
}

/// Degrade a best-effort CSS stage to empty output on failure.
fn css_or_default(result: Result<String, String>) -> String {
    match result {
        Ok(css) => css,
        Err(reason) => {
            log::warn!("Failed to process Tailwind CSS: {reason}");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const HEAD: &str = "<head><title>Test</title></head>";

    #[test]
    fn output_shape_follows_plain_text_flag() {
        let body = "<body><p>Hello</p></body>";
        match render_parts(HEAD, body, &RenderOptions::default()) {
            RenderOutput::Html(html) => assert!(html.contains("Hello")),
            other => panic!("Expected bare HTML, got {other:?}"),
        }
        let options = RenderOptions {
            plain_text: true,
            ..Default::default()
        };
        match render_parts(HEAD, body, &options) {
            RenderOutput::WithText { html, text } => {
                assert!(html.contains("Hello"));
                assert!(text.contains("Hello"));
            }
            other => panic!("Expected html/text pair, got {other:?}"),
        }
    }

    #[test]
    fn doctype_preamble_is_prepended() {
        let out = render_parts(HEAD, "<body></body>", &RenderOptions::default());
        assert!(out.html().starts_with("<!DOCTYPE html PUBLIC"));
        assert!(out.html().contains("XHTML 1.0 Transitional"));
    }

    #[test]
    fn style_block_is_inlined_and_removed() {
        let body = r#"<body><style>.a { color: red }</style><p class="a">x</p></body>"#;
        let out = render_parts(HEAD, body, &RenderOptions::default());
        assert!(out.html().contains(r#"style="color: red;""#));
        assert!(!out.html().contains("<style>"));
    }

    #[test]
    fn media_directives_become_preserved_css() {
        let body = r#"<body><div id="hero" data-mq-mobile="width: 100%;">x</div></body>"#;
        let out = render_parts(HEAD, body, &RenderOptions::default());
        let html = out.html();
        assert!(!html.contains("data-mq-mobile"));
        assert!(html.contains("@media (max-width: 480px)"));
        assert!(html.contains("#hero"));
    }

    #[test]
    fn tailwind_classes_are_generated_and_inlined() {
        let body = r#"<body><td class="p-4 text-center">x</td></body>"#;
        let options = RenderOptions {
            tailwind_config: Some(TailwindConfig::Inline(json!({}))),
            ..Default::default()
        };
        let out = render_parts(HEAD, body, &options);
        let html = out.html();
        assert!(html.contains("padding: 16px;"));
        assert!(html.contains("text-align: center;"));
    }

    #[test]
    fn bad_tailwind_config_degrades_to_no_css() {
        let body = r#"<body><td class="p-4">x</td></body>"#;
        let options = RenderOptions {
            tailwind_config: Some(TailwindConfig::Inline(json!(42))),
            ..Default::default()
        };
        let out = render_parts(HEAD, body, &options);
        // Worst case: markup with class attributes, no generated styles.
        assert!(out.html().contains("p-4"));
        assert!(!out.html().contains("padding: 16px"));
    }

    #[test]
    fn css_or_default_converts_err_to_empty() {
        assert_eq!(css_or_default(Ok("p {}".to_string())), "p {}");
        assert_eq!(css_or_default(Err("boom".to_string())), "");
    }

    #[test]
    fn global_styles_lose_to_generated_css() {
        let body = r#"<body><td class="text-center">x</td></body>"#;
        let options = RenderOptions {
            tailwind_config: Some(TailwindConfig::Inline(json!({}))),
            global_styles: Some(".text-center { text-align: left; }".to_string()),
            ..Default::default()
        };
        let out = render_parts(HEAD, body, &options);
        assert!(out.html().contains("text-align: center;"));
    }

    #[test]
    fn pretty_output_is_line_structured() {
        let options = RenderOptions {
            pretty: true,
            ..Default::default()
        };
        let out = render_parts(HEAD, "<body><p>Hi</p></body>", &options);
        assert!(out.html().contains("<p>\nHi\n</p>"));
    }
}
