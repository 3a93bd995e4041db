//! Immutable element descriptions and the builder that produces them.
//!
//! An [`Element`] is a snapshot of desired UI shape: a type (host tag or
//! [`Component`]) plus [`Props`]. Elements are cheap to clone; props and
//! children are shared behind `Rc`.

use std::fmt;
use std::rc::Rc;

use crate::collections::OrderedMap;
use crate::component::Component;
use crate::NodeId;

/// Reserved host tag for raw text nodes.
pub const TEXT_ELEMENT: &str = "TEXT_ELEMENT";
/// Reserved prop carrying a text node's literal value.
pub const NODE_VALUE: &str = "nodeValue";
/// Name of the children entry. Never stored as a regular prop.
pub const CHILDREN: &str = "children";

/// Event delivered to a host listener.
#[derive(Clone, Debug)]
pub struct Event {
    pub event_type: Rc<str>,
    pub target: NodeId,
}

/// Shared event callback. Two handlers are equal only if they are the same
/// allocation, so rebuilding a closure on every render counts as a change.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&Event)>);

impl EventHandler {
    pub fn new(callback: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(callback))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// A prop value. Scalars compare by value, handlers by reference.
#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    Str(Rc<str>),
    Int(i64),
    Float(f64),
    Bool(bool),
    Handler(EventHandler),
}

impl PropValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            PropValue::Handler(handler) => Some(handler),
            _ => None,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Str(value) => f.write_str(value),
            PropValue::Int(value) => write!(f, "{value}"),
            PropValue::Float(value) => write!(f, "{value}"),
            PropValue::Bool(value) => write!(f, "{value}"),
            PropValue::Handler(_) => f.write_str("<handler>"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(Rc::from(value))
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(Rc::from(value))
    }
}

impl From<Rc<str>> for PropValue {
    fn from(value: Rc<str>) -> Self {
        PropValue::Str(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(i64::from(value))
    }
}

impl From<u32> for PropValue {
    fn from(value: u32) -> Self {
        PropValue::Int(i64::from(value))
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<EventHandler> for PropValue {
    fn from(value: EventHandler) -> Self {
        PropValue::Handler(value)
    }
}

pub type PropMap = OrderedMap<Rc<str>, PropValue>;

/// Props of an element or fiber: named values plus the ordered children.
#[derive(Clone)]
pub struct Props {
    attrs: Rc<PropMap>,
    children: Rc<[Element]>,
}

impl Props {
    pub fn new(attrs: PropMap, children: Vec<Element>) -> Self {
        Self {
            attrs: Rc::new(attrs),
            children: Rc::from(children),
        }
    }

    pub fn empty() -> Self {
        Self::new(PropMap::default(), Vec::new())
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.attrs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// Named props in declaration order. `children` is not included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.attrs.iter().map(|(name, value)| (&**name, value))
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Whether both props share the same underlying prop map.
    pub(crate) fn same_attrs(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.attrs, &other.attrs)
    }
}

impl Default for Props {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Props")
            .field("attrs", &*self.attrs)
            .field("children", &self.children.len())
            .finish()
    }
}

/// What an element renders as.
#[derive(Clone, PartialEq)]
pub enum ElementType {
    Host(Rc<str>),
    Component(Component),
}

impl ElementType {
    pub fn host(tag: impl Into<Rc<str>>) -> Self {
        ElementType::Host(tag.into())
    }

    pub fn text() -> Self {
        ElementType::Host(Rc::from(TEXT_ELEMENT))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ElementType::Host(tag) if &**tag == TEXT_ELEMENT)
    }

    pub fn is_component(&self) -> bool {
        matches!(self, ElementType::Component(_))
    }

    pub fn as_host(&self) -> Option<&str> {
        match self {
            ElementType::Host(tag) => Some(tag),
            ElementType::Component(_) => None,
        }
    }

    pub fn as_component(&self) -> Option<&Component> {
        match self {
            ElementType::Component(component) => Some(component),
            ElementType::Host(_) => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ElementType::Host(tag) => tag,
            ElementType::Component(component) => component.name(),
        }
    }
}

impl fmt::Debug for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Host(tag) => write!(f, "Host({tag})"),
            ElementType::Component(component) => write!(f, "Component({})", component.name()),
        }
    }
}

impl From<&str> for ElementType {
    fn from(tag: &str) -> Self {
        ElementType::host(tag)
    }
}

impl From<String> for ElementType {
    fn from(tag: String) -> Self {
        ElementType::host(tag)
    }
}

impl From<Component> for ElementType {
    fn from(component: Component) -> Self {
        ElementType::Component(component)
    }
}

impl From<&Component> for ElementType {
    fn from(component: &Component) -> Self {
        ElementType::Component(component.clone())
    }
}

#[derive(Clone)]
pub struct Element {
    ty: ElementType,
    props: Props,
}

impl Element {
    pub fn new(ty: impl Into<ElementType>, props: Props) -> Self {
        Self {
            ty: ty.into(),
            props,
        }
    }

    pub fn ty(&self) -> &ElementType {
        &self.ty
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn is_text(&self) -> bool {
        self.ty.is_text()
    }

    /// The literal of a text element.
    pub fn text(&self) -> Option<&PropValue> {
        if self.is_text() {
            self.props.get(NODE_VALUE)
        } else {
            None
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("ty", &self.ty)
            .field("props", &self.props)
            .finish()
    }
}

/// A child passed to the builder: either an element or a scalar that will
/// be wrapped as a text element.
#[derive(Clone, Debug)]
pub enum Child {
    Element(Element),
    Text(PropValue),
}

impl Child {
    fn into_element(self) -> Element {
        match self {
            Child::Element(element) => element,
            Child::Text(value) => text_element(value),
        }
    }
}

impl From<Element> for Child {
    fn from(element: Element) -> Self {
        Child::Element(element)
    }
}

impl From<ElementBuilder> for Child {
    fn from(builder: ElementBuilder) -> Self {
        Child::Element(builder.build())
    }
}

macro_rules! text_child_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Child {
                fn from(value: $ty) -> Self {
                    Child::Text(PropValue::from(value))
                }
            }
        )*
    };
}

text_child_from!(&str, String, Rc<str>, i64, i32, u32, f64, bool);

/// Creates a text element for `value`.
pub fn text_element(value: impl Into<PropValue>) -> Element {
    let mut attrs = PropMap::default();
    attrs.insert(Rc::from(NODE_VALUE), value.into());
    Element::new(ElementType::text(), Props::new(attrs, Vec::new()))
}

/// Builds an element from a type, named props and children.
///
/// A `children` entry among `props` is ignored; the children argument
/// always wins. Non-element children become text elements.
pub fn create_element<N, C>(
    ty: impl Into<ElementType>,
    props: impl IntoIterator<Item = (N, PropValue)>,
    children: impl IntoIterator<Item = C>,
) -> Element
where
    N: Into<Rc<str>>,
    C: Into<Child>,
{
    let attrs: PropMap = props
        .into_iter()
        .map(|(name, value)| (name.into(), value))
        .filter(|(name, _)| &**name != CHILDREN)
        .collect();
    let children = children
        .into_iter()
        .map(|child| child.into().into_element())
        .collect();
    Element::new(ty, Props::new(attrs, children))
}

/// Fluent alternative to [`create_element`].
pub struct ElementBuilder {
    ty: ElementType,
    attrs: PropMap,
    children: Vec<Element>,
}

impl ElementBuilder {
    pub fn new(ty: impl Into<ElementType>) -> Self {
        Self {
            ty: ty.into(),
            attrs: PropMap::default(),
            children: Vec::new(),
        }
    }

    pub fn prop(mut self, name: impl Into<Rc<str>>, value: impl Into<PropValue>) -> Self {
        let name = name.into();
        if &*name != CHILDREN {
            self.attrs.insert(name, value.into());
        }
        self
    }

    /// Registers `callback` under the full prop name, e.g. `"onClick"`.
    pub fn listener(self, name: impl Into<Rc<str>>, callback: impl Fn(&Event) + 'static) -> Self {
        self.prop(name, EventHandler::new(callback))
    }

    pub fn handler(self, name: impl Into<Rc<str>>, handler: EventHandler) -> Self {
        self.prop(name, handler)
    }

    pub fn child(mut self, child: impl Into<Child>) -> Self {
        self.children.push(child.into().into_element());
        self
    }

    pub fn children<C: Into<Child>>(mut self, children: impl IntoIterator<Item = C>) -> Self {
        self.children
            .extend(children.into_iter().map(|child| child.into().into_element()));
        self
    }

    pub fn text(self, value: impl Into<PropValue>) -> Self {
        self.child(Child::Text(value.into()))
    }

    pub fn build(self) -> Element {
        Element::new(self.ty, Props::new(self.attrs, self.children))
    }
}

/// Shorthand for [`ElementBuilder::new`].
pub fn element(ty: impl Into<ElementType>) -> ElementBuilder {
    ElementBuilder::new(ty)
}

impl From<ElementBuilder> for Element {
    fn from(builder: ElementBuilder) -> Self {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_children_become_text_elements() {
        let el = create_element("button", [("id", PropValue::from("go"))], [Child::from(3)]);

        assert_eq!(el.ty().as_host(), Some("button"));
        assert_eq!(el.props().get("id"), Some(&PropValue::from("go")));
        let [child] = el.props().children() else {
            panic!("expected one child");
        };
        assert!(child.is_text());
        assert_eq!(child.text(), Some(&PropValue::Int(3)));
        assert!(child.props().children().is_empty());
    }

    #[test]
    fn children_prop_is_never_stored() {
        let el = create_element(
            "div",
            [("children", PropValue::from("x")), ("title", PropValue::from("t"))],
            Vec::<Child>::new(),
        );
        assert!(!el.props().contains(CHILDREN));
        assert_eq!(el.props().len(), 1);

        let built = element("div").prop("children", 1).prop("a", 1).build();
        assert_eq!(built.props().iter().map(|(name, _)| name).collect::<Vec<_>>(), ["a"]);
    }

    #[test]
    fn builder_keeps_declaration_order() {
        let el = element("input")
            .prop("value", "v")
            .prop("disabled", true)
            .listener("onInput", |_| {})
            .build();
        let names: Vec<_> = el.props().iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["value", "disabled", "onInput"]);
    }

    #[test]
    fn handler_equality_is_by_reference() {
        let a = EventHandler::new(|_| {});
        let b = EventHandler::new(|_| {});
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_ne!(PropValue::from(a), PropValue::from(b));
    }

    #[test]
    fn host_types_compare_by_tag() {
        assert_eq!(ElementType::host("div"), ElementType::from(String::from("div")));
        assert_ne!(ElementType::host("div"), ElementType::host("span"));
        assert!(ElementType::text().is_text());
    }
}
