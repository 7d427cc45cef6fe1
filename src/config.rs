//! Build-time tuning constants. Correctness never depends on these values;
//! they trade index build time and memory against query pruning power.

/// Largest `k` the `Results` accumulator supports. Matches the reference
/// implementation's usable capacity.
pub const MAX_K: usize = 20;

/// Chunks larger than this are candidates for further bisection.
pub const SPLIT_THRESHOLD: usize = 64;

/// How the splitter bisects chunks: tunable pass counts and size threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildConfig {
    /// Number of x-axis bisection passes.
    pub x_splits: usize,
    /// Number of y-axis bisection passes.
    pub y_splits: usize,
    /// Chunks at or below this size are not split further.
    pub split_threshold: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            x_splits: 5,
            y_splits: 5,
            split_threshold: SPLIT_THRESHOLD,
        }
    }
}
