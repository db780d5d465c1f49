//! Utility-CSS extractor and generator – scans final markup for class usages
//! and synthesizes a stylesheet from a Tailwind-flavoured utility subset.
//!
//! Strictly best-effort: every failure path degrades to "no CSS generated"
//! at the orchestrator, never aborting a render. The supported utility
//! families are the email-relevant ones (display, typography, spacing,
//! width, colors, radius); unknown classes simply produce no rule.

use std::collections::BTreeSet;
use std::fs;

use serde::Deserialize;

/// Tailwind configuration source: a JSON file path (resolved relative to the
/// process working directory) or an inline JSON object.
#[derive(Debug, Clone)]
pub enum TailwindConfig {
    Path(String),
    Inline(serde_json::Value),
}

/// Theme overrides honoured by the compiler. Only `theme.extend.colors` and
/// `theme.extend.spacing` are meaningful; unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    theme: ThemeSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ThemeSection {
    extend: ThemeOverrides,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ThemeOverrides {
    pub colors: std::collections::BTreeMap<String, String>,
    pub spacing: std::collections::BTreeMap<String, String>,
}

impl ThemeOverrides {
    fn is_empty(&self) -> bool {
        self.colors.is_empty() && self.spacing.is_empty()
    }
}

/// Generate utility CSS for every class referenced in `html`.
///
/// Returns the stylesheet text, one rule per resolvable class. An empty
/// class set short-circuits to `Ok("")` without touching the config. Config
/// problems are logged and downgraded to the default theme; only a malformed
/// inline config is reported as `Err` (the orchestrator maps that to empty
/// CSS as well).
pub fn process(html: &str, config: Option<&TailwindConfig>) -> Result<String, String> {
    let classes = extract_classes(html);
    if classes.is_empty() {
        return Ok(String::new());
    }

    let theme = resolve_config(config)?;
    let compiler = select_compiler(theme);

    let mut css = String::new();
    for class in &classes {
        if let Some(declarations) = compiler.compile(class) {
            css.push_str(&format!(".{class} {{ {declarations} }}\n"));
        }
    }
    Ok(css)
}

/// Collect every class name appearing in a `class="…"` attribute.
pub fn extract_classes(html: &str) -> BTreeSet<String> {
    let mut classes = BTreeSet::new();
    let mut rest = html;
    while let Some(idx) = rest.find("class=") {
        rest = &rest[idx + "class=".len()..];
        let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            continue;
        };
        let value = &rest[1..];
        let Some(end) = value.find(quote) else {
            break;
        };
        for class in value[..end].split_whitespace() {
            classes.insert(class.to_string());
        }
        rest = &value[end + 1..];
    }
    classes
}

fn resolve_config(config: Option<&TailwindConfig>) -> Result<ThemeOverrides, String> {
    match config {
        None => Ok(ThemeOverrides::default()),
        Some(TailwindConfig::Path(path)) => {
            let text = match fs::read_to_string(path) {
                Ok(t) => t,
                Err(e) => {
                    log::warn!("Tailwind config file not found at {path}: {e}");
                    return Ok(ThemeOverrides::default());
                }
            };
            match serde_json::from_str::<ConfigFile>(&text) {
                Ok(parsed) => Ok(parsed.theme.extend),
                Err(e) => {
                    log::warn!("Failed to load Tailwind config from {path}: {e}");
                    Ok(ThemeOverrides::default())
                }
            }
        }
        Some(TailwindConfig::Inline(value)) => {
            if !value.is_object() {
                return Err("Tailwind config must be a JSON object".to_string());
            }
            let parsed: ConfigFile = serde_json::from_value(value.clone())
                .map_err(|e| format!("Invalid Tailwind config: {e}"))?;
            Ok(parsed.theme.extend)
        }
    }
}

// ---------------------------------------------------------------------------
// Compiler strategies
// ---------------------------------------------------------------------------

/// A utility-class compiler: class name → CSS declarations, or `None` when
/// the class maps to no known utility.
trait UtilityCompiler {
    fn compile(&self, class: &str) -> Option<String>;
}

/// Pick a strategy once per config resolution: the static table when there
/// are no overrides, the themed variant otherwise.
fn select_compiler(theme: ThemeOverrides) -> Box<dyn UtilityCompiler> {
    if theme.is_empty() {
        Box::new(StaticCompiler)
    } else {
        Box::new(ThemedCompiler { theme })
    }
}

/// Default theme, no overrides.
struct StaticCompiler;

impl UtilityCompiler for StaticCompiler {
    fn compile(&self, class: &str) -> Option<String> {
        compile_class(class, None)
    }
}

/// Theme-aware variant consulting config overrides before the defaults.
struct ThemedCompiler {
    theme: ThemeOverrides,
}

impl UtilityCompiler for ThemedCompiler {
    fn compile(&self, class: &str) -> Option<String> {
        compile_class(class, Some(&self.theme))
    }
}

/// Fixed default palette (Tailwind default shades).
const COLORS: &[(&str, &str)] = &[
    ("black", "#000000"),
    ("blue-500", "#3b82f6"),
    ("blue-700", "#1d4ed8"),
    ("gray-100", "#f3f4f6"),
    ("gray-200", "#e5e7eb"),
    ("gray-300", "#d1d5db"),
    ("gray-500", "#6b7280"),
    ("gray-700", "#374151"),
    ("gray-900", "#111827"),
    ("green-500", "#22c55e"),
    ("green-700", "#15803d"),
    ("red-500", "#ef4444"),
    ("red-700", "#b91c1c"),
    ("white", "#ffffff"),
    ("yellow-500", "#eab308"),
];

fn lookup_color<'a>(name: &'a str, theme: Option<&'a ThemeOverrides>) -> Option<&'a str> {
    if let Some(theme) = theme {
        if let Some(hex) = theme.colors.get(name) {
            return Some(hex.as_str());
        }
    }
    COLORS
        .binary_search_by(|(n, _)| n.cmp(&name))
        .ok()
        .map(|i| COLORS[i].1)
}

/// Spacing scale: 1 unit = 4px, overridable per key from the theme.
fn lookup_spacing(value: &str, theme: Option<&ThemeOverrides>) -> Option<String> {
    if let Some(theme) = theme {
        if let Some(v) = theme.spacing.get(value) {
            return Some(v.clone());
        }
    }
    value.parse::<f32>().ok().map(|v| format!("{}px", v * 4.0))
}

fn compile_class(class: &str, theme: Option<&ThemeOverrides>) -> Option<String> {
    // Exact utilities first.
    let exact = match class {
        "block" => "display: block;",
        "inline" => "display: inline;",
        "inline-block" => "display: inline-block;",
        "hidden" => "display: none;",
        "text-left" => "text-align: left;",
        "text-center" => "text-align: center;",
        "text-right" => "text-align: right;",
        "font-bold" => "font-weight: 700;",
        "font-normal" => "font-weight: 400;",
        "italic" => "font-style: italic;",
        "not-italic" => "font-style: normal;",
        "underline" => "text-decoration: underline;",
        "line-through" => "text-decoration: line-through;",
        "no-underline" => "text-decoration: none;",
        "uppercase" => "text-transform: uppercase;",
        "lowercase" => "text-transform: lowercase;",
        "capitalize" => "text-transform: capitalize;",
        "text-xs" => "font-size: 12px;",
        "text-sm" => "font-size: 14px;",
        "text-base" => "font-size: 16px;",
        "text-lg" => "font-size: 18px;",
        "text-xl" => "font-size: 20px;",
        "text-2xl" => "font-size: 24px;",
        "text-3xl" => "font-size: 30px;",
        "text-4xl" => "font-size: 36px;",
        "w-full" => "width: 100%;",
        "w-auto" => "width: auto;",
        "w-1/2" => "width: 50%;",
        "w-1/3" => "width: 33.333333%;",
        "w-2/3" => "width: 66.666667%;",
        "w-1/4" => "width: 25%;",
        "w-3/4" => "width: 75%;",
        "rounded" => "border-radius: 4px;",
        "rounded-md" => "border-radius: 6px;",
        "rounded-lg" => "border-radius: 8px;",
        "rounded-full" => "border-radius: 9999px;",
        _ => "",
    };
    if !exact.is_empty() {
        return Some(exact.to_string());
    }

    // Colors: text-{c}, bg-{c}, border-{c}.
    if let Some(name) = class.strip_prefix("text-") {
        if let Some(hex) = lookup_color(name, theme) {
            return Some(format!("color: {hex};"));
        }
    }
    if let Some(name) = class.strip_prefix("bg-") {
        if let Some(hex) = lookup_color(name, theme) {
            return Some(format!("background-color: {hex};"));
        }
    }
    if let Some(name) = class.strip_prefix("border-") {
        if let Some(hex) = lookup_color(name, theme) {
            return Some(format!("border-color: {hex};"));
        }
    }

    compile_spacing(class, theme)
}

/// Spacing utilities: `p-{n}`, `px-{n}`, `py-{n}`, `pt/pr/pb/pl-{n}` and the
/// `m*` equivalents.
fn compile_spacing(class: &str, theme: Option<&ThemeOverrides>) -> Option<String> {
    let (prefix, value_str) = class.rsplit_once('-')?;
    let value = lookup_spacing(value_str, theme)?;

    let decls = match prefix {
        "p" => format!("padding: {value};"),
        "px" => format!("padding-left: {value}; padding-right: {value};"),
        "py" => format!("padding-top: {value}; padding-bottom: {value};"),
        "pt" => format!("padding-top: {value};"),
        "pr" => format!("padding-right: {value};"),
        "pb" => format!("padding-bottom: {value};"),
        "pl" => format!("padding-left: {value};"),
        "m" => format!("margin: {value};"),
        "mx" => format!("margin-left: {value}; margin-right: {value};"),
        "my" => format!("margin-top: {value}; margin-bottom: {value};"),
        "mt" => format!("margin-top: {value};"),
        "mr" => format!("margin-right: {value};"),
        "mb" => format!("margin-bottom: {value};"),
        "ml" => format!("margin-left: {value};"),
        _ => return None,
    };
    Some(decls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn color_table_is_sorted() {
        let mut sorted = COLORS.to_vec();
        sorted.sort_unstable_by_key(|(n, _)| *n);
        assert_eq!(sorted, COLORS);
    }

    #[test]
    fn extracts_and_dedupes_classes() {
        let html = r#"<div class="p-4 text-center"><p class="text-center">x</p></div>"#;
        let classes = extract_classes(html);
        assert_eq!(classes.len(), 2);
        assert!(classes.contains("p-4"));
        assert!(classes.contains("text-center"));
    }

    #[test]
    fn no_classes_yields_empty_css() {
        assert_eq!(process("<p>plain</p>", None).unwrap(), "");
    }

    #[test]
    fn generates_rules_for_known_classes() {
        let html = r#"<td class="p-4 font-bold bg-gray-200 unknown-thing">x</td>"#;
        let css = process(html, None).unwrap();
        assert!(css.contains(".p-4 { padding: 16px; }"));
        assert!(css.contains(".font-bold { font-weight: 700; }"));
        assert!(css.contains(".bg-gray-200 { background-color: #e5e7eb; }"));
        assert!(!css.contains("unknown-thing"));
    }

    #[test]
    fn spacing_axis_variants() {
        assert_eq!(
            compile_class("px-2", None).unwrap(),
            "padding-left: 8px; padding-right: 8px;"
        );
        assert_eq!(compile_class("mt-6", None).unwrap(), "margin-top: 24px;");
    }

    #[test]
    fn inline_config_overrides_colors() {
        let config = TailwindConfig::Inline(json!({
            "theme": { "extend": { "colors": { "brand": "#336699" } } }
        }));
        let css = process(r#"<a class="text-brand">go</a>"#, Some(&config)).unwrap();
        assert!(css.contains(".text-brand { color: #336699; }"));
    }

    #[test]
    fn inline_config_overrides_spacing() {
        let config = TailwindConfig::Inline(json!({
            "theme": { "extend": { "spacing": { "gutter": "24px" } } }
        }));
        let css = process(r#"<td class="p-gutter">x</td>"#, Some(&config)).unwrap();
        assert!(css.contains(".p-gutter { padding: 24px; }"));
    }

    #[test]
    fn non_object_inline_config_is_an_error() {
        let config = TailwindConfig::Inline(json!("nope"));
        assert!(process(r#"<p class="p-4">x</p>"#, Some(&config)).is_err());
    }

    #[test]
    fn missing_config_file_degrades_to_defaults() {
        let config = TailwindConfig::Path("/nonexistent/tailwind.config.json".to_string());
        let css = process(r#"<p class="text-center">x</p>"#, Some(&config)).unwrap();
        assert!(css.contains(".text-center { text-align: center; }"));
    }
}
