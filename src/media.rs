//! Media-query generator – converts per-breakpoint property maps into
//! `@media` blocks and extracts `data-mq-*` directives from elements.
//!
//! These helpers sit on the trusted side of the safety boundary: values are
//! emitted as-is (component templates are the only call sites), unlike
//! [`crate::style::merge`] which sanitizes untrusted declarations.

use crate::dom::{visit_elements_mut, DomNode, ElementNode};
use crate::style::StyleMap;

/// Fixed responsive breakpoints (px).
pub const MOBILE_BREAKPOINT: u32 = 480;
pub const TABLET_BREAKPOINT: u32 = 768;
pub const DESKTOP_BREAKPOINT: u32 = 992;

/// Per-breakpoint property maps, request-scoped. Keys are camelCase.
#[derive(Debug, Clone, Default)]
pub struct MediaQueryOptions {
    pub mobile: Option<StyleMap>,
    pub tablet: Option<StyleMap>,
    pub desktop: Option<StyleMap>,
    pub dark_mode: Option<StyleMap>,
}

/// Convert a camelCase-keyed property map into `"kebab-key: value;"` lines.
pub fn props_to_css(props: &StyleMap) -> String {
    props
        .iter()
        .map(|(key, value)| format!("{}: {};", camel_to_kebab(key), value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Generate media queries for responsive emails. Blocks are emitted in fixed
/// order (mobile, tablet, desktop, dark mode); absent buckets are omitted.
pub fn generate(selector: &str, options: &MediaQueryOptions) -> String {
    let mut out = String::new();

    if let Some(props) = &options.mobile {
        push_block(
            &mut out,
            &format!("(max-width: {MOBILE_BREAKPOINT}px)"),
            selector,
            props,
        );
    }
    if let Some(props) = &options.tablet {
        push_block(
            &mut out,
            &format!(
                "(min-width: {}px) and (max-width: {TABLET_BREAKPOINT}px)",
                MOBILE_BREAKPOINT + 1
            ),
            selector,
            props,
        );
    }
    if let Some(props) = &options.desktop {
        push_block(
            &mut out,
            &format!("(min-width: {}px)", DESKTOP_BREAKPOINT + 1),
            selector,
            props,
        );
    }
    if let Some(props) = &options.dark_mode {
        push_block(&mut out, "(prefers-color-scheme: dark)", selector, props);
    }

    out
}

fn push_block(out: &mut String, condition: &str, selector: &str, props: &StyleMap) {
    out.push_str(&format!(
        "\n@media {condition} {{\n  {selector} {{\n    {}\n  }}\n}}\n",
        props_to_css(props)
    ));
}

/// Parse a flat `"key: value;"` string into a camelCase-keyed property map.
/// Malformed pieces (missing property or value) are silently skipped.
pub fn parse_css_string(css: &str) -> StyleMap {
    let mut map = StyleMap::new();
    for decl in css.split(';') {
        if let Some((property, value)) = decl.split_once(':') {
            let property = property.trim();
            let value = value.trim();
            if !property.is_empty() && !value.is_empty() {
                map.insert(&kebab_to_camel(property), value);
            }
        }
    }
    map
}

/// Element micro-protocol attributes, paired with their option buckets.
const MQ_ATTRIBUTES: &[&str] = &[
    "data-mq-mobile",
    "data-mq-tablet",
    "data-mq-desktop",
    "data-mq-dark",
];

/// Extract custom media queries from an element's `data-mq-*` attributes.
///
/// The attributes are removed as a side effect – they must not leak into the
/// final markup. Returns the generated `@media` CSS targeting `#unique_id`.
pub fn extract_from_element(element: &mut ElementNode, unique_id: &str) -> String {
    let mut options = MediaQueryOptions::default();

    if let Some(css) = element.remove_attr("data-mq-mobile") {
        options.mobile = Some(parse_css_string(&css));
    }
    if let Some(css) = element.remove_attr("data-mq-tablet") {
        options.tablet = Some(parse_css_string(&css));
    }
    if let Some(css) = element.remove_attr("data-mq-desktop") {
        options.desktop = Some(parse_css_string(&css));
    }
    if let Some(css) = element.remove_attr("data-mq-dark") {
        options.dark_mode = Some(parse_css_string(&css));
    }

    generate(&format!("#{unique_id}"), &options)
}

/// Walk a parsed document and collect media queries from every element that
/// carries `data-mq-*` attributes. Elements without an `id` get a generated
/// one so the `#id` selector can target them. Returns the combined CSS.
pub fn extract_document(nodes: &mut [DomNode]) -> String {
    let mut css = String::new();
    let mut counter = 0usize;

    visit_elements_mut(nodes, &mut |element| {
        if !MQ_ATTRIBUTES.iter().any(|a| element.attr(a).is_some()) {
            return;
        }
        let id = match element.attr("id") {
            Some(id) => id.to_string(),
            None => {
                counter += 1;
                let id = format!("mq-{counter}");
                element.set_attr("id", &id);
                id
            }
        };
        css.push_str(&extract_from_element(element, &id));
    });

    css
}

fn camel_to_kebab(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn kebab_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for c in key.chars() {
        if c == '-' {
            upper_next = true;
        } else if upper_next {
            out.push(c.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
