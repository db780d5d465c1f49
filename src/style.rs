//! Style normalizer/merger – merges inline style declaration strings into one
//! deduplicated, sanitized, order-stable string.
//!
//! This is the safety boundary for everything that ends up in a `style="…"`
//! attribute: property names are normalized to kebab-case, values are
//! stripped of declaration-breakout characters, and anything outside the
//! email-safe allowlist is dropped with a diagnostic. Never fatal.

/// CSS properties that are generally safe and supported in email clients.
/// Not exhaustive, but covers most common email-safe properties. Sorted for
/// binary search; immutable process-wide.
pub const EMAIL_SAFE_PROPERTIES: &[&str] = &[
    "background",
    "background-color",
    "border",
    "border-bottom",
    "border-collapse",
    "border-color",
    "border-left",
    "border-radius",
    "border-right",
    "border-spacing",
    "border-style",
    "border-top",
    "border-width",
    "color",
    "direction",
    "display",
    "font",
    "font-family",
    "font-size",
    "font-style",
    "font-weight",
    "height",
    "letter-spacing",
    "line-height",
    "margin",
    "margin-bottom",
    "margin-left",
    "margin-right",
    "margin-top",
    "max-height",
    "max-width",
    "min-height",
    "min-width",
    "mso-font-width",
    "mso-padding-alt",
    "mso-text-raise",
    "overflow",
    "padding",
    "padding-bottom",
    "padding-left",
    "padding-right",
    "padding-top",
    "text-align",
    "text-decoration",
    "text-transform",
    "vertical-align",
    "white-space",
    "width",
];

pub fn is_email_safe_property(key: &str) -> bool {
    EMAIL_SAFE_PROPERTIES
        .binary_search_by(|probe| probe.cmp(&key))
        .is_ok()
}

// ---------------------------------------------------------------------------
// Ordered declaration map
// ---------------------------------------------------------------------------

/// Insertion-ordered `property → value` map with last-writer-wins overwrite.
///
/// Output order is the order in which each surviving key was first inserted,
/// not sorted. Shared by [`merge`] and the CSS inliner, which needs the same
/// deduplication without the allowlist.
#[derive(Debug, Clone, Default)]
pub struct StyleMap {
    entries: Vec<(String, String)>,
}

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite; the key keeps its first-insertion position.
    pub fn insert(&mut self, key: &str, value: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value.to_string();
        } else {
            self.entries.push((key.to_string(), value.to_string()));
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialize as `"key: value;"` declarations joined by a single space.
    pub fn to_style_string(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push(';');
        }
        out
    }

    /// Parse a flat declaration string, merging into this map. No
    /// normalization or sanitization – inliner-internal use only.
    pub fn merge_raw(&mut self, style: &str) {
        for decl in style.split(';') {
            let decl = decl.trim();
            if decl.is_empty() {
                continue;
            }
            if let Some((key, value)) = decl.split_once(':') {
                self.insert(key.trim(), value.trim());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// merge – the public sanitizing merger
// ---------------------------------------------------------------------------

/// Merge any number of style strings (CSS `style` attribute format) into one
/// normalized, deduplicated, email-safe string. `None` entries are silently
/// skipped, so callers can pass optional fragments straight through.
///
/// Later occurrences of the same canonical property overwrite earlier ones;
/// output order is first-insertion order. Malformed or unsafe declarations
/// are logged and dropped – this function never fails.
pub fn merge<'a, I>(styles: I) -> String
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut map = StyleMap::new();

    for style in styles.into_iter().flatten() {
        for decl in style.split(';') {
            let decl = decl.trim();
            if decl.is_empty() {
                continue;
            }
            let Some(colon) = decl.find(':') else {
                log::warn!("Invalid style declaration: \"{decl}\"");
                continue;
            };
            let raw_key = decl[..colon].trim();
            let raw_value = decl[colon + 1..].trim();

            let Some(value) = sanitize_value(raw_value) else {
                continue;
            };
            // Stripping can empty a value that was pure smuggling syntax.
            if value.is_empty() && !raw_value.is_empty() {
                continue;
            }

            let key = normalize_key(raw_key);
            if !is_email_safe_property(&key) {
                log::warn!("Unsupported or unsafe CSS property: \"{key}\" will be ignored.");
                continue;
            }

            map.insert(&key, &value);
        }
    }

    map.to_style_string()
}

/// Normalize a property key: keys already containing a hyphen or carrying the
/// reserved `mso-` prefix pass through unchanged; otherwise camelCase is
/// converted to kebab-case.
fn normalize_key(key: &str) -> String {
    if key.starts_with("mso-") || key.contains('-') {
        return key.to_string();
    }
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

/// Sanitize a declaration value. Returns `None` (with a diagnostic) for
/// `expression(…)` injection vectors; otherwise strips semicolons, the `--`
/// custom-property sequence, newlines, and backslashes.
fn sanitize_value(value: &str) -> Option<String> {
    if contains_expression(value) {
        log::warn!("Potentially unsafe value detected (expression): \"{value}\"");
        return None;
    }
    Some(
        value
            .replace(';', "")
            .replace("--", "")
            .replace(['\r', '\n', '\\'], ""),
    )
}

/// Case-insensitive match for `expression` followed by optional whitespace
/// and `(` – the IE dynamic-property injection vector.
fn contains_expression(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    let mut search = lower.as_str();
    while let Some(idx) = search.find("expression") {
        let rest = search[idx + "expression".len()..].trim_start();
        if rest.starts_with('(') {
            return true;
        }
        search = &search[idx + 1..];
    }
    false
}

// ---------------------------------------------------------------------------
// Misc unit helpers
// ---------------------------------------------------------------------------

/// Convert pixels to points for MSO (Outlook) email clients.
/// The conversion ratio is approximately 0.75pt = 1px, floored.
pub fn px_to_pt(px: u32) -> u32 {
    px * 3 / 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowlist_is_sorted() {
        let mut sorted = EMAIL_SAFE_PROPERTIES.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, EMAIL_SAFE_PROPERTIES);
    }

    #[test]
    fn last_writer_wins_keeps_first_seen_order() {
        let out = merge([Some("color: red; font-size: 12px;"), Some("color: blue;")]);
        assert_eq!(out, "color: blue; font-size: 12px;");
    }

    #[test]
    fn merge_is_idempotent() {
        let once = merge([Some("color: red; font-size: 12px;"), Some("color: blue;")]);
        let twice = merge([Some(once.as_str())]);
        assert_eq!(once, twice);
    }

    #[test]
    fn placeholders_are_skipped() {
        let out = merge([None, Some("color: red;"), None]);
        assert_eq!(out, "color: red;");
    }

    #[test]
    fn empty_input_yields_empty_string() {
        assert_eq!(merge([None, None]), "");
        assert_eq!(merge([Some("")]), "");
    }

    #[test]
    fn unsafe_properties_are_dropped() {
        let out = merge([Some("position: absolute; color: red; z-index: 10;")]);
        assert_eq!(out, "color: red;");
    }

    #[test]
    fn expression_and_custom_properties_are_dropped() {
        let out = merge([Some("width: expression(alert(1)); color: blue; --x: y;")]);
        assert_eq!(out, "color: blue;");
    }

    #[test]
    fn expression_with_whitespace_is_detected() {
        let out = merge([Some("width: EXPRESSION (alert(1)); color: blue;")]);
        assert_eq!(out, "color: blue;");
    }

    #[test]
    fn camel_case_is_normalized() {
        let out = merge([Some("fontSize: 14px; backgroundColor: white;")]);
        assert_eq!(out, "font-size: 14px; background-color: white;");
    }

    #[test]
    fn mso_properties_pass_through() {
        let out = merge([Some("mso-padding-alt: 0; mso-text-raise: 4px;")]);
        assert_eq!(out, "mso-padding-alt: 0; mso-text-raise: 4px;");
    }

    #[test]
    fn declaration_without_colon_is_dropped() {
        let out = merge([Some("nonsense; color: red;")]);
        assert_eq!(out, "color: red;");
    }

    #[test]
    fn value_smuggling_characters_are_stripped() {
        let out = merge([Some("color: re\\d;"), Some("width: 10px")]);
        assert_eq!(out, "color: red; width: 10px;");
    }

    #[test]
    fn style_map_merge_raw_dedupes() {
        let mut map = StyleMap::new();
        map.merge_raw("color: red; width: 10px");
        map.merge_raw("color: blue");
        assert_eq!(map.to_style_string(), "color: blue; width: 10px;");
    }

    #[test]
    fn px_to_pt_floors() {
        assert_eq!(px_to_pt(16), 12);
        assert_eq!(px_to_pt(10), 7);
    }
}
