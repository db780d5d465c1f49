//! HTML parser and serializer – converts email markup into a simple DOM tree
//! and back.
//!
//! Email templates are SSR output, not arbitrary web pages, so a hand-written
//! recursive-descent parser over well-formed markup is sufficient. Unlike a
//! browser DOM we keep comments as nodes: MSO conditional comments
//! (`<!--[if mso]>…<![endif]-->`) are meaningful in email HTML and must
//! survive the pipeline untouched.

// ---------------------------------------------------------------------------
// DOM types
// ---------------------------------------------------------------------------

/// A node in the DOM tree.
#[derive(Debug, Clone)]
pub enum DomNode {
    Element(ElementNode),
    /// Raw text content, stored verbatim (entities are not decoded).
    Text(String),
    /// Comment body without the `<!--` / `-->` delimiters.
    Comment(String),
    /// Doctype line without the `<!` / `>` delimiters.
    Doctype(String),
}

/// An element node carrying tag, attributes (in source order), and children.
#[derive(Debug, Clone)]
pub struct ElementNode {
    /// Lowercased tag name.
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<DomNode>,
}

impl ElementNode {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, overwriting an existing one in place.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(entry) = self.attributes.iter_mut().find(|(k, _)| k == name) {
            entry.1 = value.to_string();
        } else {
            self.attributes.push((name.to_string(), value.to_string()));
        }
    }

    /// Remove an attribute, returning its value if present.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self.attributes.iter().position(|(k, _)| k == name)?;
        Some(self.attributes.remove(idx).1)
    }

    pub fn classes(&self) -> Vec<&str> {
        self.attr("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn inline_style(&self) -> Option<&str> {
        self.attr("style")
    }
}

/// Void elements that never carry children and serialize self-closed
/// (XHTML 1.0 Transitional form, which is what email clients expect).
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is raw text (no child elements, no entity rules).
const RAW_TEXT_ELEMENTS: &[&str] = &["style", "script", "title", "textarea"];

/// Attributes serialized bare when their value is empty; everything else
/// keeps an explicit `=""` so the markup stays XHTML-shaped.
const BOOLEAN_ATTRS: &[&str] = &[
    "checked", "disabled", "multiple", "novalidate", "readonly", "required", "selected",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

// ---------------------------------------------------------------------------
// Parser – simple recursive descent over HTML
// ---------------------------------------------------------------------------

/// Parse an HTML string into a list of DOM nodes.
pub fn parse_html(html: &str) -> Vec<DomNode> {
    let mut parser = Parser::new(html);
    parser.parse_nodes(false)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Parse sibling nodes until EOF or, when `in_element`, a closing tag.
    fn parse_nodes(&mut self, in_element: bool) -> Vec<DomNode> {
        let mut nodes = Vec::new();
        loop {
            if self.eof() {
                break;
            }
            if self.starts_with("</") {
                if in_element {
                    break;
                }
                // Top level: skip the stray closing tag and continue.
                self.skip_closing_tag();
                continue;
            }
            if let Some(node) = self.parse_node() {
                nodes.push(node);
            }
        }
        nodes
    }

    fn parse_node(&mut self) -> Option<DomNode> {
        if self.starts_with("<!--") {
            return Some(self.parse_comment());
        }
        if self.starts_with("<!") || self.starts_with("<?") {
            return self.parse_doctype();
        }
        if self.starts_with("<") && self.looks_like_tag() {
            Some(self.parse_element())
        } else {
            Some(self.parse_text())
        }
    }

    /// A `<` only opens a tag when followed by a name or `/`; otherwise it is
    /// literal text (e.g. "1 < 2" inside a text node).
    fn looks_like_tag(&self) -> bool {
        matches!(
            self.input[self.pos..].chars().nth(1),
            Some(c) if c.is_ascii_alphabetic() || c == '/'
        )
    }

    fn parse_text(&mut self) -> DomNode {
        let start = self.pos;
        // Consume at least one char so a literal '<' cannot loop forever.
        self.advance(1);
        while !self.eof() {
            if self.starts_with("<")
                && (self.looks_like_tag() || self.starts_with("<!") || self.starts_with("<?"))
            {
                break;
            }
            self.advance(1);
        }
        DomNode::Text(self.input[start..self.pos].to_string())
    }

    fn parse_comment(&mut self) -> DomNode {
        self.advance(4); // skip <!--
        let start = self.pos;
        while !self.eof() && !self.starts_with("-->") {
            self.advance(1);
        }
        let body = self.input[start..self.pos].to_string();
        if !self.eof() {
            self.advance(3);
        }
        DomNode::Comment(body)
    }

    fn parse_doctype(&mut self) -> Option<DomNode> {
        self.advance(2); // skip <! or <?
        let start = self.pos;
        while !self.eof() && !self.starts_with(">") {
            self.advance(1);
        }
        let body = self.input[start..self.pos].to_string();
        if !self.eof() {
            self.advance(1);
        }
        if body.is_empty() {
            None
        } else {
            Some(DomNode::Doctype(body))
        }
    }

    fn parse_element(&mut self) -> DomNode {
        self.advance(1); // consume '<'
        let tag_name = self.parse_name();
        let mut elem = ElementNode::new(&tag_name);

        loop {
            self.skip_whitespace();
            if self.eof() || self.starts_with(">") || self.starts_with("/>") {
                break;
            }
            let (key, value) = self.parse_attribute();
            elem.attributes.push((key, value));
        }

        if self.starts_with("/>") {
            self.advance(2);
            return DomNode::Element(elem);
        }
        if self.starts_with(">") {
            self.advance(1);
        }
        if is_void_element(&elem.tag) {
            return DomNode::Element(elem);
        }

        if is_raw_text_element(&elem.tag) {
            elem.children = self.parse_raw_text(&elem.tag);
        } else {
            elem.children = self.parse_nodes(true);
        }

        if self.starts_with("</") {
            self.skip_closing_tag();
        }

        DomNode::Element(elem)
    }

    /// Content of `<style>` / `<script>` etc. up to the matching close tag.
    fn parse_raw_text(&mut self, tag: &str) -> Vec<DomNode> {
        let close = format!("</{tag}");
        let start = self.pos;
        while !self.eof() && !self.input[self.pos..].to_ascii_lowercase().starts_with(&close) {
            self.advance(1);
        }
        let text = &self.input[start..self.pos];
        if text.is_empty() {
            Vec::new()
        } else {
            vec![DomNode::Text(text.to_string())]
        }
    }

    fn skip_closing_tag(&mut self) {
        self.advance(2); // skip </
        self.parse_name();
        self.skip_whitespace();
        if self.starts_with(">") {
            self.advance(1);
        }
    }

    fn parse_name(&mut self) -> String {
        let start = self.pos;
        while !self.eof() {
            let c = self.current_char();
            if c.is_alphanumeric() || c == '-' || c == '_' || c == ':' {
                self.advance(1);
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_ascii_lowercase()
    }

    fn parse_attribute(&mut self) -> (String, String) {
        let key = self.parse_name();
        self.skip_whitespace();
        if !self.starts_with("=") {
            return (key, String::new());
        }
        self.advance(1);
        self.skip_whitespace();
        let value = self.parse_attr_value();
        (key, value)
    }

    fn parse_attr_value(&mut self) -> String {
        for quote in ['"', '\''] {
            if !self.eof() && self.current_char() == quote {
                self.advance(1);
                let start = self.pos;
                while !self.eof() && self.current_char() != quote {
                    self.advance(1);
                }
                let val = self.input[start..self.pos].to_string();
                if !self.eof() {
                    self.advance(1);
                }
                return decode_entities(&val);
            }
        }
        let start = self.pos;
        while !self.eof() {
            let c = self.current_char();
            if c.is_whitespace() || c == '>' || c == '/' {
                break;
            }
            self.advance(1);
        }
        self.input[start..self.pos].to_string()
    }

    fn skip_whitespace(&mut self) {
        while !self.eof() && self.current_char().is_whitespace() {
            self.advance(1);
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn current_char(&self) -> char {
        self.input[self.pos..].chars().next().unwrap_or('\0')
    }

    fn advance(&mut self, n: usize) {
        // Advance by `n` characters (not bytes).
        for _ in 0..n {
            if let Some(c) = self.input[self.pos..].chars().next() {
                self.pos += c.len_utf8();
            }
        }
    }
}

fn decode_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
}

fn encode_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

// ---------------------------------------------------------------------------
// Serializer
// ---------------------------------------------------------------------------

/// Serialize DOM nodes back into markup.
pub fn serialize(nodes: &[DomNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        serialize_node(node, &mut out);
    }
    out
}

fn serialize_node(node: &DomNode, out: &mut String) {
    match node {
        DomNode::Text(text) => out.push_str(text),
        DomNode::Comment(body) => {
            out.push_str("<!--");
            out.push_str(body);
            out.push_str("-->");
        }
        DomNode::Doctype(body) => {
            out.push_str("<!");
            out.push_str(body);
            out.push('>');
        }
        DomNode::Element(e) => {
            out.push('<');
            out.push_str(&e.tag);
            for (key, value) in &e.attributes {
                out.push(' ');
                out.push_str(key);
                if value.is_empty() && BOOLEAN_ATTRS.contains(&key.as_str()) {
                    continue;
                }
                out.push_str("=\"");
                out.push_str(&encode_attr(value));
                out.push('"');
            }
            if is_void_element(&e.tag) {
                out.push_str(" />");
                return;
            }
            out.push('>');
            for child in &e.children {
                serialize_node(child, out);
            }
            out.push_str("</");
            out.push_str(&e.tag);
            out.push('>');
        }
    }
}

// ---------------------------------------------------------------------------
// Traversal helpers
// ---------------------------------------------------------------------------

/// Visit every element in the tree, depth-first, with mutable access.
pub fn visit_elements_mut<F: FnMut(&mut ElementNode)>(nodes: &mut [DomNode], f: &mut F) {
    for node in nodes {
        if let DomNode::Element(e) = node {
            f(e);
            visit_elements_mut(&mut e.children, f);
        }
    }
}

/// Find the first element with the given tag, depth-first.
pub fn find_element_mut<'a>(nodes: &'a mut [DomNode], tag: &str) -> Option<&'a mut ElementNode> {
    for node in nodes {
        if let DomNode::Element(e) = node {
            if e.tag == tag {
                return Some(e);
            }
            if let Some(found) = find_element_mut(&mut e.children, tag) {
                return Some(found);
            }
        }
    }
    None
}
