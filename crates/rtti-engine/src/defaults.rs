//! Default constants for registry configuration.

/// Default maximum number of distinct registered types.
pub const DEFAULT_MAX_TYPE_COUNT: usize = 32767;

/// Default maximum number of base (or derived) relationships recorded per type,
/// counting direct and transitive relationships.
pub const DEFAULT_MAX_INHERIT_TYPES: usize = 50;
