//! Document access capability.
//!
//! The widget never touches a concrete UI library. The host supplies a [`Dom`]
//! that resolves CSS selectors to opaque [`NodeId`] handles and applies the
//! widget's updates.

use std::fmt;
use std::sync::Arc;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

/// Opaque handle to a node owned by the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Click callback, given the clicked node.
pub type ClickHandler = Arc<dyn Fn(NodeId) + Send + Sync>;

/// Element to be created under an existing node.
///
/// Attribute values and text are plain text; hosts that build markup should
/// use [`NewElement::to_html`], which escapes them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewElement {
    pub tag: String,
    pub classes: Vec<String>,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<NewElement>,
}

impl NewElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn child(mut self, child: NewElement) -> Self {
        self.children.push(child);
        self
    }

    /// Render as escaped HTML.
    pub fn to_html(&self) -> String {
        let mut html = format!("<{}", self.tag);
        if !self.classes.is_empty() {
            html.push_str(&format!(" class=\"{}\"", escape_html(&self.classes.join(" "))));
        }
        for (name, value) in &self.attributes {
            html.push_str(&format!(" {}=\"{}\"", name, escape_html(value)));
        }
        html.push('>');
        if let Some(text) = &self.text {
            html.push_str(&escape_html(text));
        }
        for child in &self.children {
            html.push_str(&child.to_html());
        }
        html.push_str(&format!("</{}>", self.tag));
        html
    }
}

/// Escape text for use in HTML content and quoted attribute values.
///
/// Covers text content and attribute values in double or single quotes only.
/// Unquoted attributes, URLs, scripts and styles need their own encoding.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Document operations the widget needs from its host.
pub trait Dom: Send + Sync {
    /// All nodes matching `selector`, in document order.
    fn query_all(&self, selector: &str) -> Vec<NodeId>;

    /// Descendants of `root` matching `selector`, in document order.
    fn query_within(&self, root: NodeId, selector: &str) -> Vec<NodeId>;

    /// Attribute value of a node.
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Replace a node's content with text.
    fn set_text(&self, node: NodeId, text: &str);

    /// Append a new element as the last child of `parent`.
    fn append_element(&self, parent: NodeId, element: &NewElement) -> NodeId;

    fn add_class(&self, node: NodeId, class: &str);

    fn remove_class(&self, node: NodeId, class: &str);

    /// Register a click handler on a node.
    fn on_click(&self, node: NodeId, handler: ClickHandler);

    /// Notify the host document of a widget event.
    fn trigger(&self, _event: &str) {}
}
