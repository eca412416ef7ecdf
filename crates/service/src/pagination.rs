//! Pagination utilities for service layer
//!
//! Query and leaderboard reads page with OData-style `skip`/`top`; the page
//! size is capped server-side no matter what the client asks for.

/// Hard upper bound on the number of rows returned by one read.
pub const MAX_TOP: u64 = 25;

/// Pagination parameters
#[derive(Clone, Copy, Debug, Default)]
pub struct Pagination {
    /// rows to drop from the front; absent or negative means 0
    pub skip: Option<i64>,
    /// rows to return; absent means the caller's default, negative means 0
    pub top: Option<i64>,
}

impl Pagination {
    pub fn new(skip: Option<i64>, top: Option<i64>) -> Self { Self { skip, top } }

    /// Clamp to `MAX_TOP` and convert to `usize`, with `MAX_TOP` as the default page size
    pub fn normalize(self) -> (usize, usize) {
        self.normalize_with_default(MAX_TOP)
    }

    pub fn normalize_with_default(self, default_top: u64) -> (usize, usize) {
        let skip = self.skip.unwrap_or(0).max(0) as u64;
        let top = match self.top {
            Some(t) => (t.max(0) as u64).min(MAX_TOP),
            None => default_top.min(MAX_TOP),
        };
        (usize::try_from(skip).unwrap_or(usize::MAX), top as usize)
    }
}
