use crate::AnyMessage;

/// Decides whether two messages are equal for the purpose of exact
/// expectations.
///
/// Implemented for closures, so a custom comparator can be supplied inline:
///
/// ```rust,ignore
/// let config = TestConfig::default()
///     .with_comparator(|a: &dyn AnyMessage, b: &dyn AnyMessage| a.type_of() == b.type_of());
/// ```
pub trait Comparator: Send + Sync {
    fn equal(&self, a: &dyn AnyMessage, b: &dyn AnyMessage) -> bool;
}

impl<F> Comparator for F
where
    F: Fn(&dyn AnyMessage, &dyn AnyMessage) -> bool + Send + Sync,
{
    fn equal(&self, a: &dyn AnyMessage, b: &dyn AnyMessage) -> bool {
        self(a, b)
    }
}

/// Compares canonical forms when both messages provide one, and falls back
/// to `PartialEq` otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultComparator;

impl Comparator for DefaultComparator {
    fn equal(&self, a: &dyn AnyMessage, b: &dyn AnyMessage) -> bool {
        if a.type_of() != b.type_of() {
            return false;
        }
        match (a.canonical_json(), b.canonical_json()) {
            (Some(x), Some(y)) => x == y,
            _ => a.eq_message(b),
        }
    }
}
