//! Host node creation and prop/event diffing.

use std::rc::Rc;

use log::trace;

use crate::element::{EventHandler, PropValue, Props, NODE_VALUE, TEXT_ELEMENT};
use crate::host::{HostAdapter, HostError};
use crate::NodeId;

pub fn is_event(name: &str, prefix: &str) -> bool {
    name.starts_with(prefix)
}

/// `onClick` with prefix `on` listens for `click`.
pub fn event_type(name: &str, prefix: &str) -> String {
    name.strip_prefix(prefix).unwrap_or(name).to_lowercase()
}

/// Minimal set of host calls turning one prop map into another.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PropPatch {
    pub cleared: Vec<Rc<str>>,
    pub set: Vec<(Rc<str>, PropValue)>,
    pub detached: Vec<(String, EventHandler)>,
    pub attached: Vec<(String, EventHandler)>,
}

impl PropPatch {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of host calls [`apply`](Self::apply) will make.
    pub fn len(&self) -> usize {
        self.cleared.len() + self.set.len() + self.detached.len() + self.attached.len()
    }

    /// Applies removals, then writes, then listener detaches, then attaches.
    pub fn apply<H: HostAdapter + ?Sized>(&self, host: &mut H, node: NodeId) -> Result<(), HostError> {
        for name in &self.cleared {
            host.clear_property(node, name)?;
        }
        for (name, value) in &self.set {
            host.set_property(node, name, value)?;
        }
        for (event_type, handler) in &self.detached {
            host.remove_event_listener(node, event_type, handler)?;
        }
        for (event_type, handler) in &self.attached {
            host.add_event_listener(node, event_type, handler)?;
        }
        Ok(())
    }
}

/// Diffs `prev` against `next`. `children` never takes part.
pub fn diff_props(prev: &Props, next: &Props, event_prefix: &str) -> PropPatch {
    let mut patch = PropPatch::default();
    if prev.same_attrs(next) {
        return patch;
    }
    let event = |name: &str| is_event(name, event_prefix);

    for (name, _) in prev.iter().filter(|(name, _)| !event(*name)) {
        if !next.contains(name) {
            patch.cleared.push(Rc::from(name));
        }
    }
    for (name, value) in next.iter().filter(|(name, _)| !event(*name)) {
        if prev.get(name) != Some(value) {
            patch.set.push((Rc::from(name), value.clone()));
        }
    }
    for (name, value) in prev.iter().filter(|(name, _)| event(*name)) {
        if next.get(name) == Some(value) {
            continue;
        }
        match value.as_handler() {
            Some(handler) => patch
                .detached
                .push((event_type(name, event_prefix), handler.clone())),
            None => trace!("skipping non-handler event prop {name}"),
        }
    }
    for (name, value) in next.iter().filter(|(name, _)| event(*name)) {
        if prev.get(name) == Some(value) {
            continue;
        }
        match value.as_handler() {
            Some(handler) => patch
                .attached
                .push((event_type(name, event_prefix), handler.clone())),
            None => trace!("skipping non-handler event prop {name}"),
        }
    }
    patch
}

/// Creates the host node for a host-tag fiber and applies its props.
///
/// The node is not attached anywhere; placement happens at commit.
pub fn materialize<H: HostAdapter + ?Sized>(
    host: &mut H,
    tag: &str,
    props: &Props,
    event_prefix: &str,
) -> Result<NodeId, HostError> {
    let mut patch = diff_props(&Props::empty(), props, event_prefix);
    let node = if tag == TEXT_ELEMENT {
        let text = props.get(NODE_VALUE).map(ToString::to_string).unwrap_or_default();
        patch.set.retain(|(name, _)| &**name != NODE_VALUE);
        host.create_text(&text)
    } else {
        host.create_element(tag)
    };
    patch.apply(host, node)?;
    Ok(node)
}
