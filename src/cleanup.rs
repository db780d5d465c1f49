//! HTML post-processor – strips SSR artifacts from the rendered document.
//!
//! Pure string transforms that run after inlining: SSR hydration-boundary
//! marker comments, dead event-handler hooks, now-empty `class` attributes,
//! and `"; undefined"` fragments from unset optional style values. MSO
//! conditional comments are untouched (their bodies never match the fixed
//! marker patterns).

/// SSR-framework hydration markers: no-op, block start, block end, and
/// conditional-block sentinels. Meaningless in static email output.
const SSR_MARKERS: &[&str] = &["<!---->", "<!--[-->", "<!--]-->", "<!--[!-->"];

/// Dead hydration hooks emitted on `<img>`/`<link>` elements.
const DEAD_HANDLERS: &[&str] = &[
    r#"onload="this.__e=event""#,
    r#"onerror="this.__e=event""#,
];

/// Remove SSR marker comments and other rendering artifacts.
pub fn cleanup(html: &str) -> String {
    let mut out = html.to_string();
    for marker in SSR_MARKERS {
        out = out.replace(marker, "");
    }
    for handler in DEAD_HANDLERS {
        out = remove_with_leading_whitespace(&out, handler);
    }
    out = remove_empty_class_attrs(&out);
    remove_undefined_fragments(&out)
}

/// Remove every occurrence of `needle` together with the run of whitespace
/// immediately before it.
fn remove_with_leading_whitespace(html: &str, needle: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(idx) = rest.find(needle) {
        let before = &rest[..idx];
        out.push_str(before.trim_end());
        rest = &rest[idx + needle.len()..];
    }
    out.push_str(rest);
    out
}

/// Strip bare `class` attributes and `class=""` left behind once the inliner
/// consumed their content.
fn remove_empty_class_attrs(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(idx) = rest.find(" class") {
        let after = &rest[idx + " class".len()..];
        let (empty, consumed) = if let Some(tail) = after.strip_prefix("=\"\"") {
            (
                matches!(tail.chars().next(), Some(' ') | Some('>') | Some('/')),
                "=\"\"".len(),
            )
        } else {
            (
                matches!(after.chars().next(), Some(' ') | Some('>') | Some('/')),
                0,
            )
        };
        if empty {
            out.push_str(&rest[..idx]);
            rest = &rest[idx + " class".len() + consumed..];
        } else {
            out.push_str(&rest[..idx + " class".len()]);
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

/// Remove literal `"; undefined"` fragments (an optional style value that was
/// concatenated while unset), including the semicolon that preceded them.
fn remove_undefined_fragments(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(idx) = rest.find(';') {
        let after = &rest[idx + 1..];
        let trimmed = after.trim_start();
        if trimmed.starts_with("undefined") {
            out.push_str(&rest[..idx]);
            let ws = after.len() - trimmed.len();
            rest = &after[ws + "undefined".len()..];
        } else {
            out.push_str(&rest[..=idx]);
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

/// Basic pretty printing: newline before every `<` and after every `>`, then
/// trim and drop blank lines. Purely cosmetic and lossy with respect to
/// whitespace; attribute values containing literal angle brackets will be
/// split too, so this stays opt-in.
pub fn pretty(html: &str) -> String {
    html.replace('<', "\n<")
        .replace('>', ">\n")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ssr_markers_are_removed() {
        let html = "<div><!----><p>a</p><!--[--><p>b</p><!--]--><!--[!--></div>";
        assert_eq!(cleanup(html), "<div><p>a</p><p>b</p></div>");
    }

    #[test]
    fn mso_conditional_comments_survive() {
        let html = "<!--[if mso]><table><![endif]--><p>x</p>";
        assert_eq!(cleanup(html), html);
    }

    #[test]
    fn dead_handlers_are_stripped() {
        let html = r#"<img src="a.png" onload="this.__e=event" onerror="this.__e=event" />"#;
        assert_eq!(cleanup(html), r#"<img src="a.png" />"#);
    }

    #[test]
    fn empty_class_attributes_are_removed() {
        assert_eq!(cleanup("<p class>x</p>"), "<p>x</p>");
        assert_eq!(cleanup(r#"<p class="">x</p>"#), "<p>x</p>");
        assert_eq!(
            cleanup(r#"<p class="kept">x</p>"#),
            r#"<p class="kept">x</p>"#
        );
    }

    #[test]
    fn undefined_fragments_are_removed() {
        let html = r#"<p style="color: red; undefined">x</p>"#;
        assert_eq!(cleanup(html), r#"<p style="color: red">x</p>"#);
    }

    #[test]
    fn pretty_splits_tags_onto_lines() {
        let out = pretty("<div><p>Hi</p></div>");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines, vec!["<div>", "<p>", "Hi", "</p>", "</div>"]);
    }

    #[test]
    fn pretty_drops_blank_lines() {
        let out = pretty("<div>\n\n  <p>x</p>\n</div>");
        assert!(out.lines().all(|l| !l.trim().is_empty()));
    }
}
