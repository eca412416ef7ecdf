//! Score-ordered reads over one object type.
//!
//! Both reads are pushed down to the repository (ordered/limited select and a
//! count), so they stay cheap even for types too large to scan in memory.

use std::sync::Arc;

use tracing::{debug, instrument};

use models::storage_object as rules;

use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::storage::domain::{RankEntry, RankedObject};
use crate::storage::repository::StorageObjectRepository;

/// Page size when the client does not ask for one.
pub const DEFAULT_TOP: u64 = 10;

pub struct LeaderboardService<R: ?Sized> {
    repo: Arc<R>,
}

impl<R: StorageObjectRepository + ?Sized> LeaderboardService<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    /// Full objects, highest scores first; equal scores share a rank.
    #[instrument(skip(self))]
    pub async fn top(&self, object_type: &str, top: Option<i64>) -> Result<Vec<RankedObject>, ServiceError> {
        rules::validate_object_type(object_type)?;
        let (_, limit) = Pagination::new(None, top).normalize_with_default(DEFAULT_TOP);
        let rows = self.repo.top_by_score(object_type, limit as u64).await?;

        let mut out: Vec<RankedObject> = Vec::with_capacity(rows.len());
        for (i, object) in rows.into_iter().enumerate() {
            let rank = match out.last() {
                Some(prev) if prev.object.object_score == object.object_score => prev.rank,
                _ => i as u64 + 1,
            };
            out.push(RankedObject { object, rank });
        }
        debug!(returned = out.len(), "leaderboard_top");
        Ok(out)
    }

    /// `None` when the object does not exist.
    #[instrument(skip(self))]
    pub async fn rank(&self, object_id: &str) -> Result<Option<RankEntry>, ServiceError> {
        let Some(object) = self.repo.find(object_id).await? else { return Ok(None) };
        let above = self.repo.count_above(&object.object_type, object.object_score).await?;
        Ok(Some(RankEntry {
            object_id: object.object_id,
            object_type: object.object_type,
            object_score: object.object_score,
            rank: above + 1,
        }))
    }
}
