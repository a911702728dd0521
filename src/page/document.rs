//! Minimal, lenient HTML tree for saved news pages.
//!
//! Only what the furigana pass needs is modelled: elements with attributes, text, and
//! opaque raw chunks (doctype, comments, CDATA, script/style bodies). Text is kept
//! exactly as it appeared in the source, entities included, so untouched parts of the
//! page serialize back unchanged.

use std::borrow::Cow;

use quick_xml::{
    events::{
        BytesStart,
        Event,
    },
    Reader,
};
use crate::core::FurikesuError;

// Stand-ins for characters quick-xml would otherwise read as markup. The names cannot
// occur in a real page because HTML entity names never contain `-`.
const MASKED_LT: &str = "&furikesu-lt;";
const MASKED_AMP: &str = "&furikesu-amp;";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
    self_closing: bool,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
            self_closing: false,
        }
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    /// Concatenated text of all descendants, excluding raw chunks.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.name.as_str())
    }
}

impl Node {
    pub fn text_content(&self) -> String {
        match self {
            Node::Element(element) => element.text_content(),
            Node::Text(text) => text.clone(),
            Node::Raw(_) => String::new(),
        }
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Element(element) => collect_text(&element.children, out),
            Node::Text(text) => out.push_str(text),
            Node::Raw(_) => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub nodes: Vec<Node>,
}

impl Document {
    pub fn parse(html: &str) -> Result<Self, FurikesuError> {
        let html = mask_markup_text(html);

        let mut reader = Reader::from_str(&html);
        let config = reader.config_mut();
        config.trim_text(false);
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.allow_dangling_amp = true;

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Vec<Node> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let element = element_from_start(&e);
                    if element.is_void() {
                        push_node(&mut stack, &mut root, Node::Element(element));
                    } else {
                        stack.push(element);
                    }
                }
                Event::Empty(e) => {
                    let mut element = element_from_start(&e);
                    element.self_closing = true;
                    push_node(&mut stack, &mut root, Node::Element(element));
                }
                Event::End(e) => {
                    let name = decode_name(e.name().as_ref());
                    // stray end tags are dropped; a matching one closes everything opened after it
                    if let Some(depth) = stack.iter().rposition(|element| element.name == name) {
                        close_until(&mut stack, &mut root, depth);
                    }
                }
                Event::Text(e) => {
                    let text = e.decode().map_err(|err| {
                        FurikesuError::Custom(format!("Text decode error: {:?}", err))
                    })?;
                    push_text(&mut stack, &mut root, &text);
                }
                Event::GeneralRef(e) => {
                    let entity = e.decode().map_err(|err| {
                        FurikesuError::Custom(format!("Entity decode error: {:?}", err))
                    })?;
                    let text = match format!("&{};", entity) {
                        reference if reference == MASKED_LT => "<".to_string(),
                        reference if reference == MASKED_AMP => "&".to_string(),
                        reference => reference,
                    };
                    push_text(&mut stack, &mut root, &text);
                }
                Event::CData(e) => {
                    let text = reader.decoder().decode(&e).map_err(|err| {
                        FurikesuError::Custom(format!("CDATA decode error: {:?}", err))
                    })?;
                    let text = unmask(&text);
                    push_node(&mut stack, &mut root, Node::Raw(format!("<![CDATA[{}]]>", text)));
                }
                Event::Comment(e) => {
                    let text = e.decode().map_err(|err| {
                        FurikesuError::Custom(format!("Comment decode error: {:?}", err))
                    })?;
                    push_node(&mut stack, &mut root, Node::Raw(format!("<!--{}-->", text)));
                }
                Event::DocType(e) => {
                    let text = e.decode().map_err(|err| {
                        FurikesuError::Custom(format!("Doctype decode error: {:?}", err))
                    })?;
                    push_node(
                        &mut stack,
                        &mut root,
                        Node::Raw(format!("<!DOCTYPE {}>", text.trim())),
                    );
                }
                Event::Eof => break,
                // xml declarations and processing instructions have no place in HTML output
                _ => {}
            }
        }

        close_until(&mut stack, &mut root, 0);
        Ok(Self { nodes: root })
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            write_node(node, &mut out);
        }
        out
    }

    /// Visits every element named `name` in document order, parents before children.
    pub fn for_each_element_mut(&mut self, name: &str, mut f: impl FnMut(&mut Element)) {
        visit_mut(&mut self.nodes, name, &mut f);
    }

    pub fn elements(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        visit(&self.nodes, name, &mut found);
        found
    }
}

fn visit_mut(nodes: &mut [Node], name: &str, f: &mut impl FnMut(&mut Element)) {
    for node in nodes {
        if let Node::Element(element) = node {
            if element.is(name) {
                f(element);
            }
            visit_mut(&mut element.children, name, f);
        }
    }
}

fn visit<'a>(nodes: &'a [Node], name: &str, found: &mut Vec<&'a Element>) {
    for node in nodes {
        if let Node::Element(element) = node {
            if element.is(name) {
                found.push(element);
            }
            visit(&element.children, name, found);
        }
    }
}

fn push_node(stack: &mut [Element], root: &mut Vec<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => root.push(node),
    }
}

/// Appends text to the open element, merging with a preceding text node. Inside
/// script and style the text is kept as a raw chunk instead.
fn push_text(stack: &mut [Element], root: &mut Vec<Node>, text: &str) {
    let (siblings, raw) = match stack.last_mut() {
        Some(parent) => {
            let raw = is_raw_text_element(&parent.name);
            (&mut parent.children, raw)
        }
        None => (root, false),
    };
    match (siblings.last_mut(), raw) {
        (Some(Node::Raw(existing)), true) | (Some(Node::Text(existing)), false) => {
            existing.push_str(text)
        }
        (_, true) => siblings.push(Node::Raw(text.to_string())),
        (_, false) => siblings.push(Node::Text(text.to_string())),
    }
}

fn close_until(stack: &mut Vec<Element>, root: &mut Vec<Node>, depth: usize) {
    while stack.len() > depth {
        let Some(element) = stack.pop() else { break };
        push_node(stack, root, Node::Element(element));
    }
}

fn decode_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

fn element_from_start(e: &BytesStart<'_>) -> Element {
    let mut element = Element::new(&decode_name(e.name().as_ref()));
    for attr in e.html_attributes().flatten() {
        let key = decode_name(attr.key.as_ref());
        let value = String::from_utf8_lossy(&attr.value).into_owned();
        element.attributes.push((key, value));
    }
    element
}

fn is_raw_text_element(name: &str) -> bool {
    matches!(name, "script" | "style")
}

/// Rewrites the source so quick-xml keeps everything a browser treats as text:
/// a `<` that cannot open a tag, and the whole body of script and style elements.
/// Comments are copied untouched. The stand-ins are turned back while building the tree.
fn mask_markup_text(html: &str) -> String {
    let bytes = html.as_bytes();
    let mut out = String::with_capacity(html.len());
    let mut flushed = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        if html[i..].starts_with("<!--") {
            i = html[i + 4..].find("-->").map_or(bytes.len(), |end| i + 4 + end + 3);
            continue;
        }
        match bytes.get(i + 1) {
            Some(c) if c.is_ascii_alphabetic() => {
                let tag_end = start_tag_end(bytes, i);
                let name = tag_name(&html[i + 1..tag_end]);
                i = tag_end;
                if is_raw_text_element(&name) && !html[..tag_end].ends_with("/>") {
                    let body_end = raw_text_end(html, tag_end, &name);
                    out.push_str(&html[flushed..tag_end]);
                    out.push_str(&html[tag_end..body_end].replace('&', MASKED_AMP).replace('<', MASKED_LT));
                    flushed = body_end;
                    i = body_end;
                }
            }
            Some(b'/' | b'!' | b'?') => i += 1,
            _ => {
                out.push_str(&html[flushed..i]);
                out.push_str(MASKED_LT);
                i += 1;
                flushed = i;
            }
        }
    }
    out.push_str(&html[flushed..]);
    out
}

/// Index just past the `>` closing the tag that starts at `start`, skipping quoted values.
fn start_tag_end(bytes: &[u8], start: usize) -> usize {
    let mut quote = None;
    for (offset, &byte) in bytes[start..].iter().enumerate() {
        match (quote, byte) {
            (Some(q), _) if byte == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(byte),
            (None, b'>') => return start + offset + 1,
            _ => {}
        }
    }
    bytes.len()
}

fn tag_name(tag: &str) -> String {
    tag.chars().take_while(char::is_ascii_alphanumeric).collect::<String>().to_ascii_lowercase()
}

/// Start of the `</name` that ends a raw text body, or the end of input.
fn raw_text_end(html: &str, from: usize, name: &str) -> usize {
    html[from..]
        .to_ascii_lowercase()
        .find(&format!("</{}", name))
        .map_or(html.len(), |offset| from + offset)
}

fn unmask(text: &str) -> Cow<'_, str> {
    if text.contains(MASKED_LT) {
        Cow::Owned(text.replace(MASKED_LT, "<"))
    } else {
        Cow::Borrowed(text)
    }
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) | Node::Raw(text) => out.push_str(text),
        Node::Element(element) => {
            out.push('<');
            out.push_str(&element.name);
            for (key, value) in &element.attributes {
                let quote = if value.contains('"') { '\'' } else { '"' };
                out.push(' ');
                out.push_str(key);
                out.push('=');
                out.push(quote);
                out.push_str(value);
                out.push(quote);
            }
            if element.self_closing {
                out.push_str("/>");
                return;
            }
            out.push('>');
            if element.is_void() {
                return;
            }
            for child in &element.children {
                write_node(child, out);
            }
            out.push_str("</");
            out.push_str(&element.name);
            out.push('>');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_serialize_preserves_markup() {
        let html = concat!(
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>ニュース</title></head>",
            "<body><p class=\"lead\">今日&amp;<ruby>明日<rt>あした</rt></ruby><br>天気</p>",
            "<!-- footer --></body></html>"
        );

        let document = Document::parse(html).unwrap();
        assert_eq!(document.to_html(), html);
    }

    #[test]
    fn test_script_bodies_are_opaque() {
        let html = "<div><script>if (a < b && c) { x = '<ruby>'; }</script><ruby>人<rt>ひと</rt></ruby></div>";

        let document = Document::parse(html).unwrap();

        assert_eq!(document.elements("ruby").len(), 1);
        assert_eq!(document.to_html(), html);
    }

    #[test]
    fn test_dangling_ampersand_is_text() {
        let html = "<p>Q&A <ruby>人<rt>ひと</rt></ruby> & more</p>";

        let document = Document::parse(html).unwrap();

        assert_eq!(document.elements("ruby").len(), 1);
        assert_eq!(document.elements("p")[0].text_content(), "Q&A 人ひと & more");
        assert_eq!(document.to_html(), html);
    }

    #[test]
    fn test_literal_less_than_is_text() {
        let html = "<p>3 < 5 <ruby>人<rt>ひと</rt></ruby> <= 7<</p>";

        let document = Document::parse(html).unwrap();

        assert_eq!(document.elements("ruby").len(), 1);
        assert_eq!(document.elements("ruby")[0].text_content(), "人ひと");
        assert_eq!(document.to_html(), html);
    }

    #[test]
    fn test_script_inside_comment_keeps_later_bodies_in_place() {
        let html = concat!(
            "<!--[if lt IE 9]><script src=\"a.js\"></script><![endif]-->",
            "<script>var x = 1;</script><script>var y = 2;</script>"
        );

        let document = Document::parse(html).unwrap();
        let scripts = document.elements("script");

        assert_eq!(scripts.len(), 2);
        assert_eq!(scripts[0].children, vec![Node::Raw("var x = 1;".to_string())]);
        assert_eq!(scripts[1].children, vec![Node::Raw("var y = 2;".to_string())]);
        assert_eq!(document.to_html(), html);
    }

    #[test]
    fn test_self_closing_script_has_no_body() {
        let html = "<script src=\"a.js\"/><script>var y = 2;</script><ruby>人<rt>ひと</rt></ruby>";

        let document = Document::parse(html).unwrap();
        let scripts = document.elements("script");

        assert_eq!(scripts.len(), 2);
        assert!(scripts[0].children.is_empty());
        assert_eq!(scripts[1].children, vec![Node::Raw("var y = 2;".to_string())]);
        assert_eq!(document.elements("ruby").len(), 1);
        assert_eq!(document.to_html(), html);
    }

    #[test]
    fn test_style_body_with_entities_and_tags_is_opaque() {
        let html = "<STYLE>p::after { content: \"&amp; <b>\"; }</STYLE><p>本</p>";

        let document = Document::parse(html).unwrap();

        assert_eq!(
            document.elements("style")[0].children,
            vec![Node::Raw("p::after { content: \"&amp; <b>\"; }".to_string())]
        );
        assert!(document.elements("b").is_empty());
        assert_eq!(document.to_html(), "<style>p::after { content: \"&amp; <b>\"; }</style><p>本</p>");
    }

    #[test]
    fn test_entity_in_ruby_base_is_kept_as_written() {
        let html = "<ruby>&#26085;本語<rt>にほんご</rt></ruby>";

        let document = Document::parse(html).unwrap();

        assert_eq!(document.elements("ruby")[0].children[0], Node::Text("&#26085;本語".to_string()));
        assert_eq!(document.to_html(), html);
    }

    #[test]
    fn test_unclosed_and_stray_tags_are_tolerated() {
        let html = "<div><p>一<span>二</p></em>三</div>";

        let document = Document::parse(html).unwrap();
        let div = document.elements("div")[0];

        assert_eq!(div.text_content(), "一二三");
        assert_eq!(document.to_html(), "<div><p>一<span>二</span></p>三</div>");
    }

    #[test]
    fn test_html_attributes_and_case() {
        let html = "<RT class=furigana hidden>よみ</RT>";

        let document = Document::parse(html).unwrap();
        let rt = document.elements("rt")[0];

        assert_eq!(rt.attribute("class"), Some("furigana"));
        assert_eq!(rt.attribute("hidden"), Some(""));
        assert_eq!(document.to_html(), "<rt class=\"furigana\" hidden=\"\">よみ</rt>");
    }

    #[test]
    fn test_set_attribute_replaces_existing() {
        let mut element = Element::new("rt");
        element.set_attribute("style", "color: red");
        element.set_attribute("style", "color: blue");

        assert_eq!(element.attributes.len(), 1);
        assert_eq!(element.attribute("style"), Some("color: blue"));
    }
}
