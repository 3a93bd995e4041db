use std::fmt;
use std::rc::Rc;

use crate::element::{Element, Props};
use crate::hooks::Hooks;

type RenderFn = dyn Fn(&Props, &mut Hooks<'_>) -> Element;

struct ComponentInner {
    name: &'static str,
    render: Box<RenderFn>,
}

/// A function component.
///
/// Equality is identity: two `Component`s are the same type only when they
/// are clones of the same handle. Create a component once and reuse the
/// handle (the `#[component]` macro caches one per thread) or every render
/// will replace the subtree instead of updating it.
#[derive(Clone)]
pub struct Component {
    inner: Rc<ComponentInner>,
}

impl Component {
    pub fn new(
        name: &'static str,
        render: impl Fn(&Props, &mut Hooks<'_>) -> Element + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(ComponentInner {
                name,
                render: Box::new(render),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub(crate) fn render(&self, props: &Props, hooks: &mut Hooks<'_>) -> Element {
        (self.inner.render)(props, hooks)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Component {}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.inner.name).finish()
    }
}
