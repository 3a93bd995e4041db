//! Fiber arena.
//!
//! Fibers are stored in a [`SlotMap`] and refer to each other through
//! [`FiberId`]s. `parent`, `child`, `sibling` and `alternate` are plain
//! optional ids, so a tree can be walked one step at a time without
//! recursion and old generations can be freed without ownership cycles.

use std::fmt::Write as _;

use slotmap::SlotMap;

use crate::collections::HashSet;
use crate::element::{ElementType, Props};
use crate::hooks::Hook;
use crate::NodeId;

slotmap::new_key_type! {
    /// Identifier of a fiber inside a [`FiberTree`].
    pub struct FiberId;
}

/// Host mutation a fiber requires at commit time.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum EffectTag {
    #[default]
    None,
    Placement,
    Update,
    Deletion,
}

#[derive(Debug)]
pub struct Fiber {
    pub(crate) ty: Option<ElementType>,
    pub(crate) props: Props,
    pub(crate) host_node: Option<NodeId>,
    pub(crate) parent: Option<FiberId>,
    pub(crate) child: Option<FiberId>,
    pub(crate) sibling: Option<FiberId>,
    pub(crate) alternate: Option<FiberId>,
    pub(crate) effect_tag: EffectTag,
    pub(crate) hooks: Vec<Hook>,
}

impl Fiber {
    pub(crate) fn root(container: NodeId, props: Props, alternate: Option<FiberId>) -> Self {
        Self {
            ty: None,
            props,
            host_node: Some(container),
            parent: None,
            child: None,
            sibling: None,
            alternate,
            effect_tag: EffectTag::None,
            hooks: Vec::new(),
        }
    }

    pub(crate) fn placement(ty: ElementType, props: Props, parent: FiberId) -> Self {
        Self {
            ty: Some(ty),
            props,
            host_node: None,
            parent: Some(parent),
            child: None,
            sibling: None,
            alternate: None,
            effect_tag: EffectTag::Placement,
            hooks: Vec::new(),
        }
    }

    pub(crate) fn update(
        ty: ElementType,
        props: Props,
        host_node: Option<NodeId>,
        parent: FiberId,
        alternate: FiberId,
    ) -> Self {
        Self {
            ty: Some(ty),
            props,
            host_node,
            parent: Some(parent),
            child: None,
            sibling: None,
            alternate: Some(alternate),
            effect_tag: EffectTag::Update,
            hooks: Vec::new(),
        }
    }

    /// `None` only for root fibers.
    pub fn ty(&self) -> Option<&ElementType> {
        self.ty.as_ref()
    }

    /// Props this fiber was rendered with.
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// Host node owned by this fiber. `None` for components and unmaterialized fibers.
    pub fn host_node(&self) -> Option<NodeId> {
        self.host_node
    }

    /// Returns the parent fiber. `None` for roots.
    pub fn parent(&self) -> Option<FiberId> {
        self.parent
    }

    /// Returns the first child.
    pub fn child(&self) -> Option<FiberId> {
        self.child
    }

    /// Returns the next sibling.
    pub fn sibling(&self) -> Option<FiberId> {
        self.sibling
    }

    /// Fiber of the previous commit this one was matched against.
    pub fn alternate(&self) -> Option<FiberId> {
        self.alternate
    }

    /// Host mutation pending for this fiber at commit.
    pub fn effect_tag(&self) -> EffectTag {
        self.effect_tag
    }

    /// Hook slots of a component fiber, in call order.
    pub fn hooks(&self) -> &[Hook] {
        &self.hooks
    }

    /// Whether this fiber is a render root.
    pub fn is_root(&self) -> bool {
        self.ty.is_none()
    }

    /// Whether this fiber renders a [`Component`](crate::Component).
    pub fn is_component(&self) -> bool {
        self.ty.as_ref().is_some_and(ElementType::is_component)
    }
}

#[derive(Debug, Default)]
pub struct FiberTree {
    fibers: SlotMap<FiberId, Fiber>,
}

impl FiberTree {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live fibers across all generations.
    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    /// Whether the arena holds no fibers.
    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    /// Whether `id` is still live.
    pub fn contains(&self, id: FiberId) -> bool {
        self.fibers.contains_key(id)
    }

    /// Returns the fiber for `id`, if it is still live.
    pub fn get(&self, id: FiberId) -> Option<&Fiber> {
        self.fibers.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: FiberId) -> Option<&mut Fiber> {
        self.fibers.get_mut(id)
    }

    pub(crate) fn insert(&mut self, fiber: Fiber) -> FiberId {
        self.fibers.insert(fiber)
    }

    pub(crate) fn set_host_node(&mut self, id: FiberId, node: NodeId) {
        if let Some(fiber) = self.fibers.get_mut(id) {
            debug_assert!(fiber.host_node.is_none(), "host node assigned twice");
            if fiber.host_node.is_none() {
                fiber.host_node = Some(node);
            }
        }
    }

    pub(crate) fn set_child(&mut self, id: FiberId, child: Option<FiberId>) {
        if let Some(fiber) = self.fibers.get_mut(id) {
            fiber.child = child;
        }
    }

    pub(crate) fn set_sibling(&mut self, id: FiberId, sibling: Option<FiberId>) {
        if let Some(fiber) = self.fibers.get_mut(id) {
            fiber.sibling = sibling;
        }
    }

    /// Iterates `id`'s children in order.
    pub fn children(&self, id: FiberId) -> Children<'_> {
        Children {
            tree: self,
            next: self.get(id).and_then(|fiber| fiber.child),
        }
    }

    /// Next fiber in depth-first order: the child, else the nearest sibling
    /// found walking up through parents. `None` once the walk leaves the
    /// tree.
    pub fn next_unit_of_work(&self, id: FiberId) -> Option<FiberId> {
        self.successor(id, None)
    }

    /// Depth-first pre-order over `root`'s descendants (root excluded).
    pub fn descendants(&self, root: FiberId) -> Descendants<'_> {
        Descendants {
            tree: self,
            root,
            next: self.get(root).and_then(|fiber| fiber.child),
        }
    }

    fn successor(&self, id: FiberId, boundary: Option<FiberId>) -> Option<FiberId> {
        let fiber = self.get(id)?;
        if fiber.child.is_some() {
            return fiber.child;
        }
        let mut current = id;
        loop {
            if Some(current) == boundary {
                return None;
            }
            let fiber = self.get(current)?;
            if fiber.sibling.is_some() {
                return fiber.sibling;
            }
            current = fiber.parent?;
        }
    }

    /// Host node of the nearest ancestor that owns one.
    pub fn host_parent(&self, id: FiberId) -> Option<NodeId> {
        let mut current = self.get(id)?.parent;
        while let Some(parent_id) = current {
            let parent = self.get(parent_id)?;
            if parent.host_node.is_some() {
                return parent.host_node;
            }
            current = parent.parent;
        }
        None
    }

    /// First host node at or below `id`, following `child` links through
    /// fibers that own none.
    pub fn first_host_node(&self, id: FiberId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(fiber_id) = current {
            let fiber = self.get(fiber_id)?;
            if fiber.host_node.is_some() {
                return fiber.host_node;
            }
            current = fiber.child;
        }
        None
    }

    /// Frees every fiber not reachable from `keep` and clears the kept
    /// fibers' `alternate` links. Returns the number of fibers freed.
    pub(crate) fn sweep(&mut self, keep: Option<FiberId>) -> usize {
        let mut live: HashSet<FiberId> = HashSet::default();
        if let Some(root) = keep.filter(|root| self.contains(*root)) {
            live.insert(root);
            live.extend(self.descendants(root));
        }
        let before = self.fibers.len();
        self.fibers.retain(|id, fiber| {
            if live.contains(&id) {
                fiber.alternate = None;
                true
            } else {
                false
            }
        });
        before - self.fibers.len()
    }

    /// Indented outline of the subtree at `root`, for debugging.
    pub fn dump(&self, root: FiberId) -> String {
        let mut output = String::new();
        self.dump_fiber(&mut output, root, 0);
        output
    }

    fn dump_fiber(&self, output: &mut String, id: FiberId, depth: usize) {
        let indent = "  ".repeat(depth);
        let Some(fiber) = self.get(id) else {
            let _ = writeln!(output, "{indent}(missing)");
            return;
        };
        let name = fiber.ty.as_ref().map_or("(root)", ElementType::name);
        let _ = write!(output, "{indent}{name} {:?}", fiber.effect_tag);
        if let Some(node) = fiber.host_node {
            let _ = write!(output, " #{node}");
        }
        if !fiber.hooks.is_empty() {
            let _ = write!(output, " hooks={}", fiber.hooks.len());
        }
        output.push('\n');
        for child in self.children(id) {
            self.dump_fiber(output, child, depth + 1);
        }
    }
}

pub struct Children<'a> {
    tree: &'a FiberTree,
    next: Option<FiberId>,
}

impl Iterator for Children<'_> {
    type Item = FiberId;

    fn next(&mut self) -> Option<FiberId> {
        let current = self.next?;
        self.next = self.tree.get(current).and_then(|fiber| fiber.sibling);
        Some(current)
    }
}

pub struct Descendants<'a> {
    tree: &'a FiberTree,
    root: FiberId,
    next: Option<FiberId>,
}

impl Iterator for Descendants<'_> {
    type Item = FiberId;

    fn next(&mut self) -> Option<FiberId> {
        let current = self.next?;
        self.next = self.tree.successor(current, Some(self.root));
        Some(current)
    }
}
