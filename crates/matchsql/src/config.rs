use smol_str::SmolStr;

/// Collation that makes comparisons case and accent insensitive.
pub const DEFAULT_COLLATION: &str = "und:ci";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterConfig {
    /// Collation wrapped around targets of the case-insensitive functions
    pub collation: SmolStr,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            collation: SmolStr::new_static(DEFAULT_COLLATION),
        }
    }
}
