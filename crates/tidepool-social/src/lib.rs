//! Relationship edges: follows, likes, collections.
//!
//! All three are rows in a table with a unique (actor, target) index. The
//! [`RelationshipGuard`] wraps every mutation in a check-then-act pair so
//! callers get a definite [`GuardError`] instead of a raw store conflict.

mod error;
mod guard;

pub use error::{GuardError, GuardResult};
pub use guard::{Relation, RelationshipGuard, COLLECTIONS, FOLLOWS, LIKES};
