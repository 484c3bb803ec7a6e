mod contributor_service;
mod graph_loader;

pub use contributor_service::{ContributorService, RelationOutcome};
pub use graph_loader::GraphLoader;
