//! The host tree boundary and an in-memory implementation of it.

use std::fmt::Write as _;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::collections::map::HashMap;
use crate::element::{EventHandler, PropValue, NODE_VALUE};
use crate::HostError;

pub type HostNodeId = usize;

/// Payload handed to event listeners.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub name: Rc<str>,
    pub target: HostNodeId,
}

/// Mutation primitives the reconciler needs from the platform it renders into.
pub trait HostTree {
    fn create_node(&mut self, tag: &str) -> Result<HostNodeId, HostError>;
    fn create_text_node(&mut self) -> Result<HostNodeId, HostError>;
    fn set_property(
        &mut self,
        node: HostNodeId,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError>;
    fn clear_property(&mut self, node: HostNodeId, name: &str) -> Result<(), HostError>;
    fn add_event_listener(
        &mut self,
        node: HostNodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError>;
    fn remove_event_listener(
        &mut self,
        node: HostNodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError>;
    fn append_child(&mut self, parent: HostNodeId, child: HostNodeId) -> Result<(), HostError>;
    fn remove_child(&mut self, parent: HostNodeId, child: HostNodeId) -> Result<(), HostError>;

    /// Drops a node that was created for a generation which never committed.
    /// Such nodes were never appended anywhere. Hosts that reclaim detached
    /// nodes on their own can keep the default.
    fn release_node(&mut self, node: HostNodeId) -> Result<(), HostError> {
        let _ = node;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostNodeKind {
    Element(Rc<str>),
    Text,
}

#[derive(Debug)]
pub struct HostNode {
    kind: HostNodeKind,
    properties: IndexMap<Rc<str>, PropValue>,
    listeners: HashMap<Rc<str>, Vec<EventHandler>>,
    children: Vec<HostNodeId>,
    parent: Option<HostNodeId>,
}

impl HostNode {
    fn new(kind: HostNodeKind) -> Self {
        Self {
            kind,
            properties: IndexMap::new(),
            listeners: HashMap::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn kind(&self) -> &HostNodeKind {
        &self.kind
    }

    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            HostNodeKind::Element(tag) => Some(tag),
            HostNodeKind::Text => None,
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropValue> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.properties.iter().map(|(name, value)| (&**name, value))
    }

    pub fn listeners(&self, event: &str) -> &[EventHandler] {
        self.listeners.get(event).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn children(&self) -> &[HostNodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<HostNodeId> {
        self.parent
    }
}

/// Host tree kept entirely in memory. Nodes live in a flat arena addressed by
/// [`HostNodeId`]; removed subtrees free their slots.
#[derive(Debug, Default)]
pub struct MemoryHost {
    nodes: Vec<Option<HostNode>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Creates a detached element to use as a render container.
    pub fn create_container(&mut self, tag: &str) -> Result<HostNodeId, HostError> {
        self.create_node(tag)
    }

    pub fn node(&self, id: HostNodeId) -> Result<&HostNode, HostError> {
        self.nodes
            .get(id)
            .and_then(Option::as_ref)
            .ok_or(HostError::Missing { id })
    }

    fn node_mut(&mut self, id: HostNodeId) -> Result<&mut HostNode, HostError> {
        self.nodes
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or(HostError::Missing { id })
    }

    pub fn children(&self, id: HostNodeId) -> Result<&[HostNodeId], HostError> {
        Ok(self.node(id)?.children())
    }

    pub fn property(&self, id: HostNodeId, name: &str) -> Result<Option<&PropValue>, HostError> {
        Ok(self.node(id)?.property(name))
    }

    /// Number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Concatenated values of every text node below `id`, in document order.
    pub fn text_content(&self, id: HostNodeId) -> Result<String, HostError> {
        let mut output = String::new();
        self.collect_text(id, &mut output)?;
        Ok(output)
    }

    fn collect_text(&self, id: HostNodeId, output: &mut String) -> Result<(), HostError> {
        let node = self.node(id)?;
        if node.kind == HostNodeKind::Text {
            if let Some(value) = node.property(NODE_VALUE) {
                let _ = write!(output, "{value}");
            }
        }
        for &child in &node.children {
            self.collect_text(child, output)?;
        }
        Ok(())
    }

    /// Invokes every listener bound to `event` on `id`. Returns how many ran.
    pub fn dispatch_event(&self, id: HostNodeId, event: &str) -> Result<usize, HostError> {
        let handlers = self.node(id)?.listeners(event).to_vec();
        let payload = Event {
            name: Rc::from(event),
            target: id,
        };
        for handler in &handlers {
            handler.call(&payload);
        }
        Ok(handlers.len())
    }

    pub fn dump_tree(&self, root: Option<HostNodeId>) -> String {
        let mut output = String::new();
        if let Some(root_id) = root {
            self.dump_node(&mut output, root_id, 0);
        } else {
            output.push_str("(no root)\n");
        }
        output
    }

    fn dump_node(&self, output: &mut String, id: HostNodeId, depth: usize) {
        let indent = "  ".repeat(depth);
        let Some(Some(node)) = self.nodes.get(id) else {
            let _ = writeln!(output, "{indent}[{id}] (missing)");
            return;
        };
        match &node.kind {
            HostNodeKind::Text => {
                let value = node
                    .property(NODE_VALUE)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                let _ = writeln!(output, "{indent}{value:?}");
            }
            HostNodeKind::Element(tag) => {
                let _ = write!(output, "{indent}<{tag}");
                for (name, value) in node.properties() {
                    let _ = write!(output, " {name}={:?}", value.to_string());
                }
                let mut events: Vec<_> = node
                    .listeners
                    .iter()
                    .filter(|(_, handlers)| !handlers.is_empty())
                    .map(|(event, _)| event.clone())
                    .collect();
                events.sort();
                for event in events {
                    let _ = write!(output, " @{event}");
                }
                output.push_str(">\n");
                for &child in &node.children {
                    self.dump_node(output, child, depth + 1);
                }
            }
        }
    }

    fn release_subtree(&mut self, id: HostNodeId) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(next).and_then(Option::take) {
                stack.extend(node.children);
            }
        }
    }
}

fn validate_tag(tag: &str) -> Result<(), HostError> {
    let mut chars = tag.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(HostError::UnsupportedType {
            tag: tag.to_owned(),
        })
    }
}

impl HostTree for MemoryHost {
    fn create_node(&mut self, tag: &str) -> Result<HostNodeId, HostError> {
        validate_tag(tag)?;
        let id = self.nodes.len();
        self.nodes
            .push(Some(HostNode::new(HostNodeKind::Element(Rc::from(tag)))));
        Ok(id)
    }

    fn create_text_node(&mut self) -> Result<HostNodeId, HostError> {
        let id = self.nodes.len();
        let mut node = HostNode::new(HostNodeKind::Text);
        node.properties.insert(Rc::from(NODE_VALUE), PropValue::from(""));
        self.nodes.push(Some(node));
        Ok(id)
    }

    fn set_property(
        &mut self,
        node: HostNodeId,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError> {
        self.node_mut(node)?
            .properties
            .insert(Rc::from(name), value.clone());
        Ok(())
    }

    fn clear_property(&mut self, node: HostNodeId, name: &str) -> Result<(), HostError> {
        // Cleared properties read back as empty, like a DOM property reset to "".
        self.node_mut(node)?
            .properties
            .insert(Rc::from(name), PropValue::from(""));
        Ok(())
    }

    fn add_event_listener(
        &mut self,
        node: HostNodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError> {
        let handlers = self
            .node_mut(node)?
            .listeners
            .entry(Rc::from(event))
            .or_default();
        if !handlers.contains(handler) {
            handlers.push(handler.clone());
        }
        Ok(())
    }

    fn remove_event_listener(
        &mut self,
        node: HostNodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError> {
        if let Some(handlers) = self.node_mut(node)?.listeners.get_mut(event) {
            handlers.retain(|bound| bound != handler);
        }
        Ok(())
    }

    fn append_child(&mut self, parent: HostNodeId, child: HostNodeId) -> Result<(), HostError> {
        self.node(parent)?;
        let previous_parent = self.node(child)?.parent;
        if let Some(previous) = previous_parent {
            self.node_mut(previous)?.children.retain(|&c| c != child);
        }
        self.node_mut(child)?.parent = Some(parent);
        self.node_mut(parent)?.children.push(child);
        Ok(())
    }

    fn remove_child(&mut self, parent: HostNodeId, child: HostNodeId) -> Result<(), HostError> {
        let siblings = &mut self.node_mut(parent)?.children;
        let index = siblings
            .iter()
            .position(|&c| c == child)
            .ok_or(HostError::NotAChild { parent, child })?;
        siblings.remove(index);
        self.release_subtree(child);
        Ok(())
    }

    fn release_node(&mut self, node: HostNodeId) -> Result<(), HostError> {
        if let Some(parent) = self.node(node)?.parent {
            self.node_mut(parent)?.children.retain(|&c| c != node);
        }
        self.release_subtree(node);
        Ok(())
    }
}
