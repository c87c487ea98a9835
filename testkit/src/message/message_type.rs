use std::{
    any::{TypeId, type_name},
    fmt, hash,
    sync::Arc,
};

/// Runtime identity of a message type.
///
/// Carries a short, human-readable name with module paths stripped
/// (`Box<EvtA>` rather than `alloc::boxed::Box<my_app::EvtA>`) and, for
/// pointer-like wrappers, the type being wrapped.
#[derive(Clone)]
pub struct MessageType(Arc<TypeInfo>);

struct TypeInfo {
    id: TypeId,
    name: String,
    pointer: Option<(&'static str, MessageType)>,
}

impl MessageType {
    pub fn of<T: 'static>() -> Self {
        Self(Arc::new(TypeInfo {
            id: TypeId::of::<T>(),
            name: short_type_name(type_name::<T>()),
            pointer: None,
        }))
    }

    /// The type of a `wrapper` (such as `Box`) around `pointee`.
    pub fn pointer<T: 'static>(wrapper: &'static str, pointee: MessageType) -> Self {
        Self(Arc::new(TypeInfo {
            id: TypeId::of::<T>(),
            name: short_type_name(type_name::<T>()),
            pointer: Some((wrapper, pointee)),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn type_id(&self) -> TypeId {
        self.0.id
    }

    /// The wrapped type, if this is a pointer type.
    pub fn pointee(&self) -> Option<&MessageType> {
        self.0.pointer.as_ref().map(|(_, t)| t)
    }

    pub(crate) fn pointer_parts(&self) -> Option<(&'static str, MessageType)> {
        self.0.pointer.clone()
    }

    /// Number of pointer layers around the innermost type.
    pub fn pointer_depth(&self) -> u32 {
        let mut depth = 0;
        let mut current = self.pointee();
        while let Some(t) = current {
            depth += 1;
            current = t.pointee();
        }
        depth
    }
}

impl PartialEq for MessageType {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for MessageType {}

impl hash::Hash for MessageType {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

impl fmt::Debug for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageType({})", self.0.name)
    }
}

impl serde::Serialize for MessageType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Strips module paths from every segment of a type name.
fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut token = String::new();
    let mut chars = full.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_alphanumeric() || c == '_' {
            token.push(c);
        } else if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            token.clear();
        } else {
            out.push_str(&token);
            token.clear();
            out.push(c);
        }
    }
    out.push_str(&token);
    out
}
