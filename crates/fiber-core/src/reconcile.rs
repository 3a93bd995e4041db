//! Positional child reconciliation.

use log::trace;

use crate::element::Element;
use crate::fiber::{EffectTag, Fiber, FiberId, FiberTree};

/// Committed fibers a render pass will remove, along with the effect tag
/// each carried before it was marked.
#[derive(Debug, Default)]
pub(crate) struct Deletions {
    fibers: Vec<FiberId>,
    displaced: Vec<EffectTag>,
}

impl Deletions {
    pub(crate) fn as_slice(&self) -> &[FiberId] {
        &self.fibers
    }

    fn mark(&mut self, tree: &mut FiberTree, id: FiberId) {
        let Some(fiber) = tree.get_mut(id) else {
            return;
        };
        self.fibers.push(id);
        self.displaced.push(fiber.effect_tag);
        fiber.effect_tag = EffectTag::Deletion;
    }

    /// Forgets the backlog once it has been committed.
    pub(crate) fn clear(&mut self) {
        self.fibers.clear();
        self.displaced.clear();
    }

    /// Drops the backlog of a pass that will never commit, putting back the
    /// tags the committed fibers had before the pass marked them.
    pub(crate) fn discard(&mut self, tree: &mut FiberTree) {
        for (id, tag) in self.fibers.drain(..).zip(self.displaced.drain(..)) {
            if let Some(fiber) = tree.get_mut(id) {
                fiber.effect_tag = tag;
            }
        }
    }
}

/// Builds `wip`'s child chain from `elements`, matching them by index
/// against the children of `wip`'s alternate.
///
/// Old fibers that do not survive are tagged [`EffectTag::Deletion`] and
/// recorded in `deletions`; they keep their links so commit can still find
/// their host nodes.
pub(crate) fn reconcile_children(
    tree: &mut FiberTree,
    wip: FiberId,
    elements: &[Element],
    deletions: &mut Deletions,
) {
    let mut old = tree
        .get(wip)
        .and_then(Fiber::alternate)
        .and_then(|alternate| tree.get(alternate))
        .and_then(Fiber::child);
    let mut elements = elements.iter();
    let mut previous: Option<FiberId> = None;

    loop {
        let element = elements.next();
        if element.is_none() && old.is_none() {
            break;
        }

        let matched = match (old, element) {
            (Some(old_id), Some(element)) => tree
                .get(old_id)
                .and_then(|fiber| fiber.ty.clone().map(|ty| (fiber, ty)))
                .filter(|(_, ty)| ty == element.ty())
                .map(|(fiber, ty)| (old_id, ty, fiber.host_node)),
            _ => None,
        };
        let same_type = matched.is_some();

        let created = match (matched, element) {
            (Some((old_id, ty, host_node)), Some(element)) => Some(tree.insert(Fiber::update(
                ty,
                element.props().clone(),
                host_node,
                wip,
                old_id,
            ))),
            (None, Some(element)) => Some(tree.insert(Fiber::placement(
                element.ty().clone(),
                element.props().clone(),
                wip,
            ))),
            (_, None) => None,
        };

        if let Some(old_id) = old {
            if !same_type {
                trace!("reconcile: deleting {old_id:?}");
                deletions.mark(tree, old_id);
            }
            old = tree.get(old_id).and_then(Fiber::sibling);
        }

        if let Some(id) = created {
            match previous {
                None => tree.set_child(wip, Some(id)),
                Some(prev) => tree.set_sibling(prev, Some(id)),
            }
            previous = Some(id);
        }
    }
}
