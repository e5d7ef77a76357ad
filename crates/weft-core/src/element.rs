// SPDX-License-Identifier: Apache-2.0
//! Tree descriptions.
//!
//! An [`Element`] describes one desired tree position; [`Children`]
//! describes the desired children of a position. Descriptions are cheap to
//! clone (`Rc` payloads) and fully typed — the shapes the reconciler accepts
//! are closed, so there is no "unrecognized description" runtime path.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::error::ReconcileError;
use crate::hooks::HookContext;

/// Explicit identity hint for a child within one sibling list.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Key(Rc<str>);

impl Key {
    /// Creates a key from any string-like value.
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Rc::from(key.as_ref()))
    }

    /// The key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({:?})", self.0)
    }
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Opaque props attached to a host element or component.
///
/// The core never inspects host props; it carries them to the host seam
/// and to component functions. Hosts and components downcast to their own
/// concrete type.
#[derive(Clone)]
pub struct Props(Rc<dyn Any>);

impl Props {
    /// Wraps a concrete props value.
    pub fn new<T: 'static>(value: T) -> Self {
        Self(Rc::new(value))
    }

    /// Props for an element that takes none.
    #[must_use]
    pub fn empty() -> Self {
        Self(Rc::new(()))
    }

    /// Borrows the concrete props value, if it has type `T`.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Identity comparison: true when both wrap the same allocation.
    ///
    /// Props are opaque to the core, so "changed" is decided by identity;
    /// clone a description to assert that its props did not change.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Props {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Props(..)")
    }
}

/// A component function.
///
/// Identity (for reuse-vs-recreate decisions) is the `Rc` pointer: two
/// clones of one `Component` are the same type, two separately constructed
/// `Component`s are not.
#[derive(Clone)]
pub struct Component(
    #[allow(clippy::type_complexity)]
    Rc<dyn Fn(&mut HookContext<'_>, &Props) -> Result<Children, ReconcileError>>,
);

impl Component {
    /// Wraps a render function.
    pub fn new(
        render: impl Fn(&mut HookContext<'_>, &Props) -> Result<Children, ReconcileError> + 'static,
    ) -> Self {
        Self(Rc::new(render))
    }

    /// Invokes the render function.
    pub(crate) fn render(
        &self,
        cx: &mut HookContext<'_>,
        props: &Props,
    ) -> Result<Children, ReconcileError> {
        (self.0)(cx, props)
    }

    /// Type identity: pointer equality of the underlying function.
    #[must_use]
    pub fn same_type(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({:p})", Rc::as_ptr(&self.0))
    }
}

/// Description of a host element position.
#[derive(Debug, Clone)]
pub struct HostElement {
    /// Host element type name (e.g. `"div"` for a DOM host).
    pub ty: Rc<str>,
    /// Optional explicit identity.
    pub key: Option<Key>,
    /// Opaque host props.
    pub props: Props,
    /// Desired children.
    pub children: Children,
}

/// Description of a component position.
#[derive(Debug, Clone)]
pub struct ComponentElement {
    /// The component function.
    pub component: Component,
    /// Optional explicit identity.
    pub key: Option<Key>,
    /// Props passed to the component function.
    pub props: Props,
}

/// Description of a group (fragment) position.
#[derive(Debug, Clone)]
pub struct FragmentElement {
    /// Optional explicit identity.
    pub key: Option<Key>,
    /// The grouped children.
    pub children: Vec<Element>,
}

/// One desired tree position.
#[derive(Debug, Clone)]
pub enum Element {
    /// A host element.
    Host(HostElement),
    /// A host text run.
    Text(Rc<str>),
    /// A component invocation.
    Component(ComponentElement),
    /// A keyable group with no host instance of its own.
    Fragment(FragmentElement),
}

impl Element {
    /// Host element with no props and no children.
    pub fn host(ty: impl AsRef<str>) -> Self {
        Self::Host(HostElement {
            ty: Rc::from(ty.as_ref()),
            key: None,
            props: Props::empty(),
            children: Children::None,
        })
    }

    /// Host text run.
    pub fn text(content: impl AsRef<str>) -> Self {
        Self::Text(Rc::from(content.as_ref()))
    }

    /// Component invocation with empty props.
    pub fn component(component: Component) -> Self {
        Self::Component(ComponentElement {
            component,
            key: None,
            props: Props::empty(),
        })
    }

    /// Unkeyed fragment.
    pub fn fragment(children: Vec<Element>) -> Self {
        Self::Fragment(FragmentElement {
            key: None,
            children,
        })
    }

    /// Sets the key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<Key>) -> Self {
        let key = Some(key.into());
        match &mut self {
            Self::Host(h) => h.key = key,
            Self::Component(c) => c.key = key,
            Self::Fragment(g) => g.key = key,
            Self::Text(_) => {}
        }
        self
    }

    /// Sets the props. Ignored for text and fragments.
    #[must_use]
    pub fn with_props<T: 'static>(mut self, props: T) -> Self {
        let props = Props::new(props);
        match &mut self {
            Self::Host(h) => h.props = props,
            Self::Component(c) => c.props = props,
            Self::Text(_) | Self::Fragment(_) => {}
        }
        self
    }

    /// Sets the children of a host element. Ignored elsewhere.
    #[must_use]
    pub fn with_children(mut self, children: impl Into<Children>) -> Self {
        if let Self::Host(h) = &mut self {
            h.children = children.into();
        }
        self
    }

    /// The element's explicit key, if any.
    #[must_use]
    pub fn key(&self) -> Option<&Key> {
        match self {
            Self::Host(h) => h.key.as_ref(),
            Self::Component(c) => c.key.as_ref(),
            Self::Fragment(g) => g.key.as_ref(),
            Self::Text(_) => None,
        }
    }
}

/// The desired children of one position.
#[derive(Debug, Clone, Default)]
pub enum Children {
    /// No children.
    #[default]
    None,
    /// Exactly one child.
    One(Box<Element>),
    /// An ordered child list.
    Many(Vec<Element>),
}

impl From<Element> for Children {
    fn from(element: Element) -> Self {
        Self::One(Box::new(element))
    }
}

impl From<Vec<Element>> for Children {
    fn from(elements: Vec<Element>) -> Self {
        Self::Many(elements)
    }
}

impl From<&str> for Children {
    fn from(text: &str) -> Self {
        Self::One(Box::new(Element::text(text)))
    }
}

/// One entry in an effect dependency list.
///
/// Scalars and strings compare by value; opaque handles compare by `Rc`
/// pointer identity, mirroring the identity comparison the original
/// dependency check performs.
#[derive(Clone, Debug)]
pub enum Dep {
    /// Signed integer dependency.
    Int(i64),
    /// Boolean dependency.
    Bool(bool),
    /// Float dependency (compared bit-exactly).
    Float(f64),
    /// String dependency.
    Str(Rc<str>),
    /// Opaque handle dependency (pointer identity).
    Handle(Rc<dyn Any>),
}

impl PartialEq for Dep {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Handle(a), Self::Handle(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<i32> for Dep {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Dep {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for Dep {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for Dep {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Dep {
    fn from(v: &str) -> Self {
        Self::Str(Rc::from(v))
    }
}

/// An effect dependency list.
pub type Deps = Vec<Dep>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dep_scalars_compare_by_value() {
        assert_eq!(Dep::from(3), Dep::from(3));
        assert_ne!(Dep::from(3), Dep::from(4));
        assert_eq!(Dep::from("a"), Dep::from("a"));
        assert_ne!(Dep::from(1), Dep::from(true));
    }

    #[test]
    fn dep_handles_compare_by_identity() {
        let a: Rc<dyn Any> = Rc::new(5_u8);
        let b: Rc<dyn Any> = Rc::new(5_u8);
        assert_eq!(Dep::Handle(Rc::clone(&a)), Dep::Handle(Rc::clone(&a)));
        assert_ne!(Dep::Handle(a), Dep::Handle(b));
    }

    #[test]
    fn component_identity_is_per_construction() {
        let a = Component::new(|_, _| Ok(Children::None));
        let b = Component::new(|_, _| Ok(Children::None));
        assert!(a.same_type(&a.clone()));
        assert!(!a.same_type(&b));
    }
}
