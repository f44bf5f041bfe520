//! In-memory document for headless runs and tests.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::{ClickHandler, Dom, NewElement, NodeId};

#[derive(Debug, Default)]
struct Node {
    tag: String,
    classes: Vec<String>,
    attributes: HashMap<String, String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Default)]
struct Document {
    nodes: Vec<Node>,
    handlers: HashMap<NodeId, Vec<ClickHandler>>,
    triggered: Vec<String>,
}

impl Document {
    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize)
    }

    fn create(&mut self, parent: Option<NodeId>, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len() as u64);
        self.nodes.push(Node {
            tag: tag.to_lowercase(),
            parent,
            ..Default::default()
        });
        if let Some(parent) = parent.and_then(|p| self.node_mut(p)) {
            parent.children.push(id);
        }
        id
    }

    fn build(&mut self, parent: NodeId, element: &NewElement) -> NodeId {
        let id = self.create(Some(parent), &element.tag);
        if let Some(node) = self.node_mut(id) {
            node.classes = element.classes.clone();
            node.attributes = element.attributes.iter().cloned().collect();
            node.text = element.text.clone().unwrap_or_default();
        }
        for child in &element.children {
            self.build(id, child);
        }
        id
    }

    /// Nodes in document order, starting below `root` (or at the top).
    fn descendants(&self, root: Option<NodeId>) -> Vec<NodeId> {
        let mut stack: Vec<NodeId> = match root {
            Some(root) => self
                .node(root)
                .map(|n| n.children.iter().rev().copied().collect())
                .unwrap_or_default(),
            None => (0..self.nodes.len() as u64)
                .rev()
                .map(NodeId)
                .filter(|id| self.node(*id).is_some_and(|n| n.parent.is_none()))
                .collect(),
        };

        let mut ordered = Vec::new();
        while let Some(id) = stack.pop() {
            ordered.push(id);
            if let Some(node) = self.node(id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        ordered
    }

    fn matches(&self, id: NodeId, selector: &[Compound]) -> bool {
        let Some((last, ancestors)) = selector.split_last() else {
            return false;
        };
        let Some(node) = self.node(id) else {
            return false;
        };
        if !last.matches(node) {
            return false;
        }

        let mut remaining = ancestors;
        let mut current = node.parent;
        while let Some((wanted, rest)) = remaining.split_last() {
            let Some(ancestor) = current.and_then(|a| self.node(a)) else {
                return false;
            };
            if wanted.matches(ancestor) {
                remaining = rest;
            }
            current = ancestor.parent;
        }
        true
    }

    fn select(&self, root: Option<NodeId>, selector: &str) -> Vec<NodeId> {
        let parsed = parse_selector(selector);
        self.descendants(root)
            .into_iter()
            .filter(|id| self.matches(*id, &parsed))
            .collect()
    }
}

/// One compound selector: `tag.class[attr][attr=value]`.
#[derive(Debug, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
}

impl Compound {
    fn matches(&self, node: &Node) -> bool {
        if let Some(tag) = &self.tag {
            if *tag != node.tag {
                return false;
            }
        }
        if !self.classes.iter().all(|c| node.classes.contains(c)) {
            return false;
        }
        self.attributes.iter().all(|(name, value)| match value {
            Some(value) => node.attributes.get(name) == Some(value),
            None => node.attributes.contains_key(name),
        })
    }
}

/// Parse descendant selectors made of tag, class and attribute parts.
fn parse_selector(selector: &str) -> Vec<Compound> {
    selector.split_whitespace().map(parse_compound).collect()
}

fn parse_compound(input: &str) -> Compound {
    let mut compound = Compound::default();
    let mut rest = input;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('[') {
            let end = after.find(']').unwrap_or(after.len());
            let inner = &after[..end];
            let attribute = match inner.split_once('=') {
                Some((name, value)) => (
                    name.trim().to_string(),
                    Some(value.trim().trim_matches(['"', '\'']).to_string()),
                ),
                None => (inner.trim().to_string(), None),
            };
            compound.attributes.push(attribute);
            rest = after.get(end + 1..).unwrap_or("");
        } else if let Some(after) = rest.strip_prefix('.') {
            let end = after.find(['.', '[']).unwrap_or(after.len());
            compound.classes.push(after[..end].to_string());
            rest = &after[end..];
        } else {
            let end = rest.find(['.', '[']).unwrap_or(rest.len());
            compound.tag = Some(rest[..end].to_lowercase());
            rest = &rest[end..];
        }
    }

    compound
}

/// A document tree held in memory.
///
/// Supports tag, class, attribute and descendant selectors, records click
/// handlers so tests can [`MemoryDom::click`] nodes, and keeps every
/// triggered event name.
#[derive(Default)]
pub struct MemoryDom {
    document: Mutex<Document>,
}

impl MemoryDom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an element, at the top level when `parent` is `None`.
    pub fn create(&self, parent: Option<NodeId>, tag: &str) -> NodeId {
        self.document.lock().create(parent, tag)
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        if let Some(node) = self.document.lock().node_mut(node) {
            node.attributes.insert(name.to_string(), value.to_string());
        }
    }

    /// Text content of a node.
    pub fn text(&self, node: NodeId) -> String {
        self.document
            .lock()
            .node(node)
            .map(|n| n.text.clone())
            .unwrap_or_default()
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.document
            .lock()
            .node(node)
            .is_some_and(|n| n.classes.iter().any(|c| c == class))
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.document
            .lock()
            .node(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Number of click handlers on a node.
    pub fn handler_count(&self, node: NodeId) -> usize {
        self.document
            .lock()
            .handlers
            .get(&node)
            .map_or(0, Vec::len)
    }

    /// Run the node's click handlers.
    pub fn click(&self, node: NodeId) {
        let handlers = self
            .document
            .lock()
            .handlers
            .get(&node)
            .cloned()
            .unwrap_or_default();
        for handler in handlers {
            handler(node);
        }
    }

    /// Event names triggered so far.
    pub fn triggered(&self) -> Vec<String> {
        self.document.lock().triggered.clone()
    }
}

impl Dom for MemoryDom {
    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        self.document.lock().select(None, selector)
    }

    fn query_within(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        self.document.lock().select(Some(root), selector)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.document
            .lock()
            .node(node)
            .and_then(|n| n.attributes.get(name).cloned())
    }

    fn set_text(&self, node: NodeId, text: &str) {
        if let Some(node) = self.document.lock().node_mut(node) {
            node.text = text.to_string();
        }
    }

    fn append_element(&self, parent: NodeId, element: &NewElement) -> NodeId {
        self.document.lock().build(parent, element)
    }

    fn add_class(&self, node: NodeId, class: &str) {
        if let Some(node) = self.document.lock().node_mut(node) {
            if !node.classes.iter().any(|c| c == class) {
                node.classes.push(class.to_string());
            }
        }
    }

    fn remove_class(&self, node: NodeId, class: &str) {
        if let Some(node) = self.document.lock().node_mut(node) {
            node.classes.retain(|c| c != class);
        }
    }

    fn on_click(&self, node: NodeId, handler: ClickHandler) {
        self.document
            .lock()
            .handlers
            .entry(node)
            .or_default()
            .push(handler);
    }

    fn trigger(&self, event: &str) {
        self.document.lock().triggered.push(event.to_string());
    }
}
