use std::{hash::Hash, sync::Arc};

/// Unique name of a message handler within an application.
///
/// Set by the handler itself via
/// [`HandlerConfigurer::identity`](crate::HandlerConfigurer::identity). Used to
/// enable or disable individual handlers and to attribute produced messages
/// in reports.
///
/// `HandlerIdentity` is cheap to clone (uses string comparison with a fast-path
/// for pointer equality when identities share the same allocation).
#[derive(Debug, Clone, Ord, PartialOrd, serde::Serialize)]
pub struct HandlerIdentity(Arc<str>);

impl HandlerIdentity {
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for HandlerIdentity {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for HandlerIdentity {}

impl std::fmt::Display for HandlerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Hash for HandlerIdentity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl From<&str> for HandlerIdentity {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for HandlerIdentity {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}
