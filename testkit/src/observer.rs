use crate::Fact;

/// Receives [`Fact`]s as the engine performs an operation.
///
/// Observers are called synchronously on the thread performing the
/// operation, in the order facts occur. Closures taking a `&Fact` are
/// observers.
///
/// # Example
///
/// ```rust
/// use testkit::{Fact, Observer};
///
/// struct SkipCounter(std::sync::atomic::AtomicUsize);
///
/// impl Observer for SkipCounter {
///     fn notify(&self, fact: &Fact) {
///         if let Fact::HandlingSkipped { .. } = fact {
///             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
///         }
///     }
/// }
/// ```
pub trait Observer: Send + Sync {
    fn notify(&self, fact: &Fact);
}

impl<F> Observer for F
where
    F: Fn(&Fact) + Send + Sync,
{
    fn notify(&self, fact: &Fact) {
        self(fact)
    }
}
