/// Every scenario in the catalog.
pub const CATALOG_SIZE: usize = 15;

/// Spam is off by default and reports itself as skipped.
pub const SKIPPED_BY_DEFAULT: &[&str] = &["transfer_spam"];

pub const PRIMARY_API_KEY: &str = "primary-api-key";
