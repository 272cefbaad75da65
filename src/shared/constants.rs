/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// SCHEMA ENGINE
// =============================================================================

/// Default capacity of the schema cache (entries, not bytes)
pub const DEFAULT_SCHEMA_CACHE_CAPACITY: usize = 256;

/// Hard bounds for the configurable schema cache capacity
pub const MIN_SCHEMA_CACHE_CAPACITY: usize = 100;
pub const MAX_SCHEMA_CACHE_CAPACITY: usize = 500;

// =============================================================================
// SUBMISSIONS & ATTACHMENTS
// =============================================================================

/// Maximum number of payloads accepted in one batch submit request
pub const MAX_BATCH_SIZE: usize = 50;

/// Length of the random token embedded in derived attachment paths
pub const PATH_TOKEN_LEN: usize = 8;

/// Fallback segment when a form type sanitizes to nothing
pub const FALLBACK_FORM_TYPE: &str = "general";

/// Fallback segment when a field name sanitizes to nothing
pub const FALLBACK_FIELD_NAME: &str = "file";

/// Fallback segment when a filename sanitizes to nothing
pub const FALLBACK_FILENAME: &str = "unknown_file";

/// Fallback segment when a submission id sanitizes to nothing
pub const FALLBACK_SUBMISSION_ID: &str = "unknown";
