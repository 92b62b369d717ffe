//! Markup Document Tree
//!
//! Every UI module is built as a [`Module`] and rendered by [`Module::render`].
//! Compilers never concatenate source text themselves; text, attribute and style
//! escaping all happen in this file.
//!
//! `Expr` nodes and attributes carry raw expressions. They are only ever built
//! from identifiers the compiler chose itself, never from blueprint strings.

use serde_json::Value;

const INDENT: &str = "  ";

// =============================================================================
// Tree
// =============================================================================

/// One attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum Attr {
    /// String literal
    Str(String),
    /// Raw expression
    Expr(String),
    /// JSON value embedded as an expression
    Json(Value),
    /// Inline style object
    Style(StyleMap),
    /// Boolean attribute written without a value
    Flag,
}

/// Inline style declarations in insertion order (camelCase properties)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleMap(Vec<(String, String)>);

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, prop: &str, value: impl Into<String>) {
        let value = value.into();
        match self.0.iter_mut().find(|(p, _)| p == prop) {
            Some(entry) => entry.1 = value,
            None => self.0.push((prop.to_string(), value)),
        }
    }

    /// Set only when a value is present and non-blank
    pub fn set_opt(&mut self, prop: &str, value: Option<&str>) {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.set(prop, v);
        }
    }

    pub fn get(&self, prop: &str) -> Option<&str> {
        self.0.iter().find(|(p, _)| p == prop).map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn render(&self) -> String {
        let body: Vec<String> = self
            .0
            .iter()
            .map(|(prop, value)| format!("{}: {}", prop, js_string(value)))
            .collect();
        format!("{{{{ {} }}}}", body.join(", "))
    }
}

/// An element with attributes and children
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, Attr)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &str, value: Attr) -> Self {
        self.attrs.push((name.to_string(), value));
        self
    }

    /// Set `className`, replacing any earlier value
    pub fn class(mut self, classes: impl Into<String>) -> Self {
        let value = Attr::Str(classes.into());
        match self.attrs.iter_mut().find(|(name, _)| name == "className") {
            Some(entry) => entry.1 = value,
            None => self.attrs.push(("className".to_string(), value)),
        }
        self
    }

    pub fn string(self, name: &str, value: impl Into<String>) -> Self {
        self.attr(name, Attr::Str(value.into()))
    }

    pub fn expr(self, name: &str, expr: impl Into<String>) -> Self {
        self.attr(name, Attr::Expr(expr.into()))
    }

    /// Inline style, skipped when empty
    pub fn style(self, style: StyleMap) -> Self {
        if style.is_empty() {
            self
        } else {
            self.attr("style", Attr::Style(style))
        }
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(nodes);
        self
    }
}

/// A node in the element tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Expr(String),
    /// `{list.map((item, index) => (body))}`
    Map {
        list: String,
        item: String,
        body: Box<Node>,
    },
    /// `{cond && (body)}`
    When { cond: String, body: Box<Node> },
    Fragment(Vec<Node>),
}

impl Node {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn map(list: impl Into<String>, item: impl Into<String>, body: impl Into<Node>) -> Self {
        Self::Map {
            list: list.into(),
            item: item.into(),
            body: Box::new(body.into()),
        }
    }

    pub fn when(cond: impl Into<String>, body: impl Into<Node>) -> Self {
        Self::When {
            cond: cond.into(),
            body: Box::new(body.into()),
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Self::Element(el)
    }
}

/// One import declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub default: Option<String>,
    pub named: Vec<String>,
    pub from: String,
}

impl Import {
    pub fn default(name: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            default: Some(name.into()),
            named: Vec::new(),
            from: from.into(),
        }
    }

    pub fn named<I, S>(names: I, from: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            default: None,
            named: names.into_iter().map(Into::into).collect(),
            from: from.into(),
        }
    }

    fn render(&self) -> String {
        let mut parts = Vec::new();
        if let Some(default) = &self.default {
            parts.push(default.clone());
        }
        if !self.named.is_empty() {
            parts.push(format!("{{ {} }}", self.named.join(", ")));
        }
        format!("import {} from {};", parts.join(", "), js_string(&self.from))
    }
}

/// A module-level constant holding static data
#[derive(Debug, Clone, PartialEq)]
pub struct Const {
    pub name: String,
    pub value: Value,
}

/// The default-exported component
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub name: String,
    pub body: Node,
}

/// A complete UI source module
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub banner: Vec<String>,
    pub imports: Vec<Import>,
    pub consts: Vec<Const>,
    /// Exported as `metadata` (route modules)
    pub metadata: Option<Value>,
    pub component: Component,
}

impl Module {
    pub fn new(component_name: impl Into<String>, body: impl Into<Node>) -> Self {
        Self {
            banner: Vec::new(),
            imports: Vec::new(),
            consts: Vec::new(),
            metadata: None,
            component: Component {
                name: component_name.into(),
                body: body.into(),
            },
        }
    }

    pub fn banner(mut self, line: impl Into<String>) -> Self {
        self.banner.push(line.into());
        self
    }

    /// Add an import, skipping exact duplicates
    pub fn import(mut self, import: Import) -> Self {
        if !self.imports.contains(&import) {
            self.imports.push(import);
        }
        self
    }

    pub fn constant(mut self, name: impl Into<String>, value: Value) -> Self {
        self.consts.push(Const {
            name: name.into(),
            value,
        });
        self
    }

    pub fn metadata(mut self, value: Value) -> Self {
        self.metadata = Some(value);
        self
    }

    /// Serialize to source text
    pub fn render(&self) -> String {
        let mut out = String::new();

        for line in &self.banner {
            out.push_str(&format!("// {}\n", single_line(line)));
        }
        if !self.banner.is_empty() {
            out.push('\n');
        }

        for import in &self.imports {
            out.push_str(&import.render());
            out.push('\n');
        }
        if !self.imports.is_empty() {
            out.push('\n');
        }

        for constant in &self.consts {
            out.push_str(&format!("const {} = {};\n\n", constant.name, json_pretty(&constant.value)));
        }

        if let Some(metadata) = &self.metadata {
            out.push_str(&format!("export const metadata = {};\n\n", json_pretty(metadata)));
        }

        out.push_str(&format!("export default function {}() {{\n", self.component.name));
        out.push_str(&format!("{}return (\n", INDENT));
        render_node(&self.component.body, 2, &mut out);
        out.push_str(&format!("{});\n", INDENT));
        out.push_str("}\n");
        out
    }
}

// =============================================================================
// Serializer
// =============================================================================

fn render_node(node: &Node, depth: usize, out: &mut String) {
    let pad = INDENT.repeat(depth);
    match node {
        Node::Element(el) => render_element(el, depth, out),
        Node::Text(text) => {
            out.push_str(&pad);
            out.push_str(&escape_text(text));
            out.push('\n');
        }
        Node::Expr(expr) => {
            out.push_str(&format!("{}{{{}}}\n", pad, expr));
        }
        Node::Map { list, item, body } => {
            out.push_str(&format!("{}{{{}.map(({}, index) => (\n", pad, list, item));
            render_node(body, depth + 1, out);
            out.push_str(&format!("{}))}}\n", pad));
        }
        Node::When { cond, body } => {
            out.push_str(&format!("{}{{{} && (\n", pad, cond));
            render_node(body, depth + 1, out);
            out.push_str(&format!("{})}}\n", pad));
        }
        Node::Fragment(nodes) => {
            out.push_str(&format!("{}<>\n", pad));
            for child in nodes {
                render_node(child, depth + 1, out);
            }
            out.push_str(&format!("{}</>\n", pad));
        }
    }
}

fn render_element(el: &Element, depth: usize, out: &mut String) {
    let pad = INDENT.repeat(depth);
    let attrs: String = el
        .attrs
        .iter()
        .map(|(name, value)| match value {
            Attr::Flag => format!(" {}", name),
            other => format!(" {}={}", name, render_attr(other)),
        })
        .collect();

    if el.children.is_empty() {
        out.push_str(&format!("{}<{}{} />\n", pad, el.tag, attrs));
        return;
    }

    out.push_str(&format!("{}<{}{}>\n", pad, el.tag, attrs));
    for child in &el.children {
        render_node(child, depth + 1, out);
    }
    out.push_str(&format!("{}</{}>\n", pad, el.tag));
}

fn render_attr(value: &Attr) -> String {
    match value {
        Attr::Str(s) if is_plain_attr(s) => format!("\"{}\"", s),
        Attr::Str(s) => format!("{{{}}}", js_string(s)),
        Attr::Expr(expr) => format!("{{{}}}", expr),
        Attr::Json(value) => format!("{{{}}}", value),
        Attr::Style(style) => style.render(),
        Attr::Flag => String::new(),
    }
}

/// Attribute strings cannot carry escapes; anything special goes through an expression
fn is_plain_attr(s: &str) -> bool {
    !s.chars()
        .any(|c| matches!(c, '"' | '\\' | '{' | '}' | '<' | '>' | '&') || c.is_control())
}

/// Text children with markup-significant characters become string expressions
fn escape_text(text: &str) -> String {
    let special = text
        .chars()
        .any(|c| matches!(c, '{' | '}' | '<' | '>' | '&' | '"' | '\'' | '`') || c.is_control());
    if special || text.trim() != text || text.is_empty() {
        format!("{{{}}}", js_string(text))
    } else {
        text.to_string()
    }
}

/// A JS string literal
/// Text safe inside a `//` comment: every JS line terminator becomes a space
fn single_line(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\n' | '\r' | '\u{2028}' | '\u{2029}' => ' ',
            c => c,
        })
        .collect()
}

pub fn js_string(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

fn json_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
