mod contributor;
mod kind;

pub(crate) use contributor::{insert_unique, remove_item};
pub use contributor::Contributor;
pub use kind::{ContributorKind, ContributorType};
