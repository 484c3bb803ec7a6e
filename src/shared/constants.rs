/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

/// Length of the `contributor.identifier` column; slugs never exceed it
pub const IDENTIFIER_MAX: usize = 100;

/// How many suffixed identifiers to try before giving up on a slug base
pub const IDENTIFIER_MAX_ATTEMPTS: usize = 1000;
