//! In-memory [`HostAdapter`] that records every mutation.

use std::fmt::Write as _;
use std::rc::Rc;

use crate::collections::{hash_one, OrderedMap};
use crate::element::{Event, EventHandler, PropValue, NODE_VALUE};
use crate::host::{HostAdapter, HostError};
use crate::NodeId;

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    CreateElement { id: NodeId, tag: Rc<str> },
    CreateText { id: NodeId, text: String },
    SetProperty { id: NodeId, name: Rc<str>, value: PropValue },
    ClearProperty { id: NodeId, name: Rc<str> },
    AddListener { id: NodeId, event_type: Rc<str> },
    RemoveListener { id: NodeId, event_type: Rc<str> },
    AppendChild { parent: NodeId, child: NodeId },
    RemoveChild { parent: NodeId, child: NodeId },
}

impl Mutation {
    /// Whether this mutation changed an existing node rather than creating
    /// one.
    pub fn is_update(&self) -> bool {
        !matches!(self, Mutation::CreateElement { .. } | Mutation::CreateText { .. })
    }
}

/// Mutations grouped by kind.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MutationCounts {
    pub created: usize,
    pub props_set: usize,
    pub props_cleared: usize,
    pub listeners_added: usize,
    pub listeners_removed: usize,
    pub appended: usize,
    pub removed: usize,
}

impl MutationCounts {
    pub fn total(&self) -> usize {
        self.created
            + self.props_set
            + self.props_cleared
            + self.listeners_added
            + self.listeners_removed
            + self.appended
            + self.removed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryNodeKind {
    Container,
    Element(Rc<str>),
    Text(String),
}

#[derive(Debug)]
pub struct MemoryNode {
    kind: MemoryNodeKind,
    props: OrderedMap<Rc<str>, PropValue>,
    listeners: Vec<(Rc<str>, EventHandler)>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl MemoryNode {
    fn new(kind: MemoryNodeKind) -> Self {
        Self {
            kind,
            props: OrderedMap::default(),
            listeners: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn kind(&self) -> &MemoryNodeKind {
        &self.kind
    }

    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            MemoryNodeKind::Element(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            MemoryNodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn prop(&self, name: &str) -> Option<&PropValue> {
        self.props.get(name)
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn listener_count(&self, event_type: &str) -> usize {
        self.listeners
            .iter()
            .filter(|(ty, _)| &**ty == event_type)
            .count()
    }
}

/// Host tree kept entirely in memory. Nodes are never freed; removed
/// nodes are only detached.
#[derive(Debug, Default)]
pub struct MemoryHost {
    nodes: Vec<MemoryNode>, // FUTURE(no_std): migrate to arena-backed node storage.
    mutations: Vec<Mutation>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detached root node to render into. Not recorded as a
    /// mutation.
    pub fn create_container(&mut self) -> NodeId {
        self.push(MemoryNodeKind::Container)
    }

    pub fn node(&self, id: NodeId) -> Option<&MemoryNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.mutations)
    }

    pub fn counts(&self) -> MutationCounts {
        let mut counts = MutationCounts::default();
        for mutation in &self.mutations {
            match mutation {
                Mutation::CreateElement { .. } | Mutation::CreateText { .. } => {
                    counts.created += 1
                }
                Mutation::SetProperty { .. } => counts.props_set += 1,
                Mutation::ClearProperty { .. } => counts.props_cleared += 1,
                Mutation::AddListener { .. } => counts.listeners_added += 1,
                Mutation::RemoveListener { .. } => counts.listeners_removed += 1,
                Mutation::AppendChild { .. } => counts.appended += 1,
                Mutation::RemoveChild { .. } => counts.removed += 1,
            }
        }
        counts
    }

    /// Invokes every listener for `event_type` on `node`, in registration
    /// order. Returns how many ran.
    pub fn dispatch(&self, node: NodeId, event_type: &str) -> Result<usize, HostError> {
        let target = self.nodes.get(node).ok_or(HostError::Missing { id: node })?;
        let handlers: Vec<EventHandler> = target
            .listeners
            .iter()
            .filter(|(ty, _)| &**ty == event_type)
            .map(|(_, handler)| handler.clone())
            .collect();
        let event = Event {
            event_type: Rc::from(event_type),
            target: node,
        };
        for handler in &handlers {
            handler.call(&event);
        }
        Ok(handlers.len())
    }

    /// Concatenated text of every text node below `root`.
    pub fn text_content(&self, root: NodeId) -> String {
        let mut output = String::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if let MemoryNodeKind::Text(text) = &node.kind {
                output.push_str(text);
            }
            stack.extend(node.children.iter().rev());
        }
        output
    }

    /// First element with `tag` below `root`, depth-first.
    pub fn find_first(&self, root: NodeId, tag: &str) -> Option<NodeId> {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = self.nodes.get(id)?;
            if node.tag() == Some(tag) {
                return Some(id);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    pub fn dump_tree(&self, root: NodeId) -> String {
        let mut output = String::new();
        self.dump_node(&mut output, root, 0);
        output
    }

    /// Hash of the tree shape and props rendered by [`dump_tree`](Self::dump_tree).
    pub fn fingerprint(&self, root: NodeId) -> u64 {
        hash_one(&self.dump_tree(root))
    }

    fn dump_node(&self, output: &mut String, id: NodeId, depth: usize) {
        let indent = "  ".repeat(depth);
        let Some(node) = self.nodes.get(id) else {
            let _ = writeln!(output, "{indent}[{id}] (missing)");
            return;
        };
        match &node.kind {
            MemoryNodeKind::Container => {
                let _ = writeln!(output, "{indent}#root");
            }
            MemoryNodeKind::Text(text) => {
                let _ = writeln!(output, "{indent}{text:?}");
            }
            MemoryNodeKind::Element(tag) => {
                let _ = write!(output, "{indent}<{tag}");
                for (name, value) in &node.props {
                    let _ = write!(output, " {name}=\"{value}\"");
                }
                for (event_type, _) in &node.listeners {
                    let _ = write!(output, " @{event_type}");
                }
                output.push_str(">\n");
            }
        }
        for &child in &node.children {
            self.dump_node(output, child, depth + 1);
        }
    }

    fn push(&mut self, kind: MemoryNodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(MemoryNode::new(kind));
        id
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut MemoryNode, HostError> {
        self.nodes.get_mut(id).ok_or(HostError::Missing { id })
    }

    fn detach(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        let node = self.get_mut(parent)?;
        let index = node
            .children
            .iter()
            .position(|&id| id == child)
            .ok_or(HostError::NotAChild { parent, child })?;
        node.children.remove(index);
        self.get_mut(child)?.parent = None;
        Ok(())
    }
}

impl HostAdapter for MemoryHost {
    fn create_element(&mut self, tag: &str) -> NodeId {
        let tag: Rc<str> = Rc::from(tag);
        let id = self.push(MemoryNodeKind::Element(tag.clone()));
        self.mutations.push(Mutation::CreateElement { id, tag });
        id
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        let id = self.push(MemoryNodeKind::Text(text.to_owned()));
        self.mutations.push(Mutation::CreateText {
            id,
            text: text.to_owned(),
        });
        id
    }

    fn set_property(
        &mut self,
        node: NodeId,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError> {
        let target = self.get_mut(node)?;
        match &mut target.kind {
            MemoryNodeKind::Text(text) if name == NODE_VALUE => *text = value.to_string(),
            _ => {
                target.props.insert(Rc::from(name), value.clone());
            }
        }
        self.mutations.push(Mutation::SetProperty {
            id: node,
            name: Rc::from(name),
            value: value.clone(),
        });
        Ok(())
    }

    fn clear_property(&mut self, node: NodeId, name: &str) -> Result<(), HostError> {
        let target = self.get_mut(node)?;
        match &mut target.kind {
            MemoryNodeKind::Text(text) if name == NODE_VALUE => text.clear(),
            _ => {
                target.props.shift_remove(name);
            }
        }
        self.mutations.push(Mutation::ClearProperty {
            id: node,
            name: Rc::from(name),
        });
        Ok(())
    }

    fn add_event_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError> {
        let event_type: Rc<str> = Rc::from(event_type);
        self.get_mut(node)?
            .listeners
            .push((event_type.clone(), handler.clone()));
        self.mutations.push(Mutation::AddListener { id: node, event_type });
        Ok(())
    }

    fn remove_event_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError> {
        let target = self.get_mut(node)?;
        if let Some(index) = target
            .listeners
            .iter()
            .position(|(ty, registered)| &**ty == event_type && registered == handler)
        {
            target.listeners.remove(index);
        }
        self.mutations.push(Mutation::RemoveListener {
            id: node,
            event_type: Rc::from(event_type),
        });
        Ok(())
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        if matches!(self.get_mut(parent)?.kind, MemoryNodeKind::Text(_)) {
            return Err(HostError::NotAnElement { id: parent });
        }
        if let Some(previous) = self.get_mut(child)?.parent {
            self.detach(previous, child)?;
        }
        self.get_mut(parent)?.children.push(child);
        self.get_mut(child)?.parent = Some(parent);
        self.mutations.push(Mutation::AppendChild { parent, child });
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        self.detach(parent, child)?;
        self.mutations.push(Mutation::RemoveChild { parent, child });
        Ok(())
    }
}
