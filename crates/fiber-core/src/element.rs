//! Immutable descriptions of what should be on screen.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::host::Event;

/// Type tag reserved for text elements.
pub const TEXT_ELEMENT: &str = "TEXT_ELEMENT";
/// Prop under which text elements carry their value.
pub const NODE_VALUE: &str = "nodeValue";
/// Reserved prop name. Never forwarded to the host.
pub const CHILDREN: &str = "children";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    Host(Rc<str>),
    Text,
}

impl ElementType {
    pub fn as_str(&self) -> &str {
        match self {
            ElementType::Host(tag) => tag,
            ElementType::Text => TEXT_ELEMENT,
        }
    }
}

impl From<&str> for ElementType {
    fn from(tag: &str) -> Self {
        if tag == TEXT_ELEMENT {
            ElementType::Text
        } else {
            ElementType::Host(Rc::from(tag))
        }
    }
}

impl From<String> for ElementType {
    fn from(tag: String) -> Self {
        ElementType::from(tag.as_str())
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event listener callback. Two handlers are equal only if they are the same
/// allocation, so cloning a handler keeps it equal to the original.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&Event)>);

impl EventHandler {
    pub fn new(handler: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(handler))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Rc::as_ptr(&self.0))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    Text(Rc<str>),
    Number(f64),
    Bool(bool),
    Handler(EventHandler),
    Null,
}

impl PropValue {
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
            PropValue::Text(text) => f.write_str(text),
            PropValue::Number(number) => write!(f, "{number}"),
            PropValue::Bool(flag) => write!(f, "{flag}"),
            PropValue::Handler(_) => f.write_str("[handler]"),
            PropValue::Null => Ok(()),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Text(Rc::from(value))
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Text(Rc::from(value))
    }
}

impl From<Rc<str>> for PropValue {
    fn from(value: Rc<str>) -> Self {
        PropValue::Text(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Number(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Number(value.into())
    }
}

impl From<u32> for PropValue {
    fn from(value: u32) -> Self {
        PropValue::Number(value.into())
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<EventHandler> for PropValue {
    fn from(handler: EventHandler) -> Self {
        PropValue::Handler(handler)
    }
}

/// Attribute bag plus ordered children of an element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props {
    attributes: IndexMap<Rc<str>, PropValue>,
    children: Vec<Element>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.attributes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Attributes in insertion order. Children are not included.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.attributes.iter().map(|(name, value)| (&**name, value))
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn insert(&mut self, name: impl Into<Rc<str>>, value: impl Into<PropValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn push_child(&mut self, child: impl Into<Child>) {
        self.children.push(child.into().into_element());
    }
}

/// Something that may appear in an element's children list. Plain values are
/// turned into text elements.
#[derive(Clone, Debug, PartialEq)]
pub enum Child {
    Element(Element),
    Value(PropValue),
}

impl Child {
    pub fn into_element(self) -> Element {
        match self {
            Child::Element(element) => element,
            Child::Value(value) => create_text_element(value),
        }
    }
}

impl From<Element> for Child {
    fn from(element: Element) -> Self {
        Child::Element(element)
    }
}

impl From<PropValue> for Child {
    fn from(value: PropValue) -> Self {
        Child::Value(value)
    }
}

impl From<&str> for Child {
    fn from(value: &str) -> Self {
        Child::Value(value.into())
    }
}

impl From<String> for Child {
    fn from(value: String) -> Self {
        Child::Value(value.into())
    }
}

impl From<f64> for Child {
    fn from(value: f64) -> Self {
        Child::Value(value.into())
    }
}

impl From<i32> for Child {
    fn from(value: i32) -> Self {
        Child::Value(value.into())
    }
}

impl From<bool> for Child {
    fn from(value: bool) -> Self {
        Child::Value(value.into())
    }
}

/// A node to render. Cloning is cheap; the props are shared.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    ty: ElementType,
    props: Rc<Props>,
}

impl Element {
    pub fn new(ty: impl Into<ElementType>) -> Self {
        Self {
            ty: ty.into(),
            props: Rc::new(Props::new()),
        }
    }

    pub fn ty(&self) -> &ElementType {
        &self.ty
    }

    pub fn props(&self) -> &Rc<Props> {
        &self.props
    }

    pub fn children(&self) -> &[Element] {
        self.props.children()
    }

    pub fn prop(mut self, name: impl Into<Rc<str>>, value: impl Into<PropValue>) -> Self {
        Rc::make_mut(&mut self.props).insert(name, value);
        self
    }

    pub fn child(mut self, child: impl Into<Child>) -> Self {
        Rc::make_mut(&mut self.props).push_child(child);
        self
    }

    pub fn children_from<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Child>,
    {
        let props = Rc::make_mut(&mut self.props);
        for child in children {
            props.push_child(child);
        }
        self
    }
}

/// Builds an element from a type tag, an attribute list and children.
pub fn create_element(
    ty: impl Into<ElementType>,
    attributes: Vec<(&str, PropValue)>,
    children: Vec<Child>,
) -> Element {
    let mut props = Props::new();
    for (name, value) in attributes {
        props.insert(name, value);
    }
    for child in children {
        props.push_child(child);
    }
    Element {
        ty: ty.into(),
        props: Rc::new(props),
    }
}

/// Wraps a plain value in a text element.
pub fn create_text_element(value: impl Into<PropValue>) -> Element {
    let mut props = Props::new();
    props.insert(NODE_VALUE, value);
    Element {
        ty: ElementType::Text,
        props: Rc::new(props),
    }
}
