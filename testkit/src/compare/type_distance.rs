use crate::MessageType;

/// How closely two message types are related.
///
/// Ordered from closest to furthest: `Identical < Indirect(1) < Indirect(2) < .. < Unrelated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeDistance {
    Identical,
    /// The types differ only by the given number of pointer layers.
    Indirect(u32),
    Unrelated,
}

/// Computes the distance between two message types.
///
/// Types are related when one can be reached from the other by unwrapping
/// pointer layers, in either direction.
pub fn type_distance(a: &MessageType, b: &MessageType) -> TypeDistance {
    if a == b {
        return TypeDistance::Identical;
    }
    match layers_between(a, b).or_else(|| layers_between(b, a)) {
        Some(n) => TypeDistance::Indirect(n),
        None => TypeDistance::Unrelated,
    }
}

fn layers_between(outer: &MessageType, target: &MessageType) -> Option<u32> {
    let mut depth = 0;
    let mut current = outer.pointee();
    while let Some(t) = current {
        depth += 1;
        if t == target {
            return Some(depth);
        }
        current = t.pointee();
    }
    None
}
