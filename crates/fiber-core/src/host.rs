//! Boundary to the concrete display tree.

use std::fmt;

use crate::element::{EventHandler, PropValue};
use crate::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    Missing { id: NodeId },
    NotAChild { parent: NodeId, child: NodeId },
    NotAnElement { id: NodeId },
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::Missing { id } => write!(f, "host node {id} missing"),
            HostError::NotAChild { parent, child } => {
                write!(f, "host node {child} is not a child of {parent}")
            }
            HostError::NotAnElement { id } => {
                write!(f, "host node {id} cannot have children")
            }
        }
    }
}

impl std::error::Error for HostError {}

/// Creates, mutates and removes concrete host nodes on behalf of the
/// commit phase.
///
/// Nodes are addressed by [`NodeId`]; the adapter owns the mapping to
/// whatever the display surface uses.
pub trait HostAdapter {
    fn create_element(&mut self, tag: &str) -> NodeId;

    fn create_text(&mut self, text: &str) -> NodeId;

    fn set_property(&mut self, node: NodeId, name: &str, value: &PropValue)
        -> Result<(), HostError>;

    /// Resets `name` to its empty value.
    fn clear_property(&mut self, node: NodeId, name: &str) -> Result<(), HostError>;

    fn add_event_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError>;

    fn remove_event_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError>;

    /// Appends `child` as the last child of `parent`.
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError>;

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError>;
}

impl<H: HostAdapter + ?Sized> HostAdapter for Box<H> {
    fn create_element(&mut self, tag: &str) -> NodeId {
        (**self).create_element(tag)
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        (**self).create_text(text)
    }

    fn set_property(
        &mut self,
        node: NodeId,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError> {
        (**self).set_property(node, name, value)
    }

    fn clear_property(&mut self, node: NodeId, name: &str) -> Result<(), HostError> {
        (**self).clear_property(node, name)
    }

    fn add_event_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError> {
        (**self).add_event_listener(node, event_type, handler)
    }

    fn remove_event_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError> {
        (**self).remove_event_listener(node, event_type, handler)
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        (**self).append_child(parent, child)
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        (**self).remove_child(parent, child)
    }
}
