//! Runtime descriptions of payload and response types.
//!
//! A `Kind` stands in for the static type of a value when strategies decide
//! whether they can handle it. Two kinds are equal when they describe the same
//! Rust type; the name is kept only for diagnostics.

use std::any::{type_name, TypeId};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::Arc;

use crate::strategy::Payload;

/// Coarse classification strategies dispatch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `dyn Payload`: the static type was erased; the codec decides at encode time.
    Any,
    /// Character data that must bypass JSON encoding.
    Text,
    /// No value (`()`); an empty body is acceptable.
    Unit,
    /// Anything else.
    Structured,
}

#[derive(Clone, Copy)]
pub struct Kind {
    id: TypeId,
    name: &'static str,
    shape: Shape,
}

impl Kind {
    pub fn of<T: ?Sized + 'static>() -> Self {
        let id = TypeId::of::<T>();
        Self {
            id,
            name: type_name::<T>(),
            shape: shape_of(id),
        }
    }

    /// The erased kind: a payload whose static type is unknown to the caller.
    pub fn any() -> Self {
        Self::of::<dyn Payload>()
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn is_any(&self) -> bool {
        self.shape == Shape::Any
    }

    pub fn is_text(&self) -> bool {
        self.shape == Shape::Text
    }

    pub fn is_unit(&self) -> bool {
        self.shape == Shape::Unit
    }
}

fn shape_of(id: TypeId) -> Shape {
    let text = [
        TypeId::of::<String>(),
        TypeId::of::<str>(),
        TypeId::of::<&'static str>(),
        TypeId::of::<Box<str>>(),
        TypeId::of::<Cow<'static, str>>(),
        TypeId::of::<Arc<str>>(),
        TypeId::of::<Rc<str>>(),
    ];
    if text.contains(&id) {
        Shape::Text
    } else if id == TypeId::of::<dyn Payload>() {
        Shape::Any
    } else if id == TypeId::of::<()>() {
        Shape::Unit
    } else {
        Shape::Structured
    }
}

impl PartialEq for Kind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Kind {}

impl Hash for Kind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kind({})", self.name)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
