//! Message comparison: equality, "like" (subset) comparison and the distance
//! between message types.

mod comparator;
mod like;
mod type_distance;

pub use comparator::{Comparator, DefaultComparator};
pub use like::is_superset;
pub use type_distance::{TypeDistance, type_distance};
