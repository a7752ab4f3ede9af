//! Point store contract and reference in-memory implementation
//!
//! A [`PointStore`] hands the query engine a snapshot-consistent candidate
//! list already restricted by type and status. The engine never assumes
//! exclusive access: a sync/download process may rewrite the store while
//! queries run, and any single fetch may observe the pre- or post-update
//! state, but never a torn one.
//!
//! [`MemoryStore`] is the reference implementation used by the tests and
//! benchmarks, and by embedders that do not bring their own database. Base
//! marker records sit behind an `RwLock`; the per-user logged/marked/
//! unsynced overlays are concurrent maps so log CRUD can interleave freely
//! with queries.

use crate::point::{Category, Condition, PointOfInterest, StatusFilter, TypeFilter};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::RwLock;

/// Failure surfaced by a point store, distinct from an empty result set.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("point store unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Read contract consumed by the nearest-query engine.
///
/// `fetch_candidates` must return a consistent snapshot restricted by both
/// filters, with per-user overlay flags (`marked`, `unsynced`, logged
/// condition) already joined onto each record. Indexing, persistence and
/// pagination are the implementation's business.
#[async_trait]
pub trait PointStore: Send + Sync {
    async fn fetch_candidates(
        &self,
        type_filter: TypeFilter,
        status_filter: StatusFilter,
    ) -> Result<Vec<PointOfInterest>, StoreError>;
}

/// In-memory point store with per-user overlays.
#[derive(Default)]
pub struct MemoryStore {
    points: RwLock<Vec<PointOfInterest>>,
    /// Log entries recorded locally, keyed by marker id
    log_overlay: DashMap<i64, Condition>,
    /// Markers the user has flagged
    marked: DashSet<i64>,
    /// Markers with a log entry not yet uploaded
    unsynced: DashSet<i64>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the full marker set, as a sync/download refresh would.
    pub fn replace_all(&self, points: Vec<PointOfInterest>) {
        let mut guard = self.points.write().unwrap_or_else(|e| e.into_inner());
        *guard = points;
    }

    /// Append a single marker.
    pub fn insert(&self, point: PointOfInterest) {
        let mut guard = self.points.write().unwrap_or_else(|e| e.into_inner());
        guard.push(point);
    }

    /// Record a locally-logged condition for a marker.
    pub fn set_logged(&self, id: i64, condition: Condition) {
        self.log_overlay.insert(id, condition);
    }

    /// Flag or unflag a marker.
    pub fn set_marked(&self, id: i64, marked: bool) {
        if marked {
            self.marked.insert(id);
        } else {
            self.marked.remove(&id);
        }
    }

    /// Track whether a marker has a log entry awaiting upload.
    pub fn set_unsynced(&self, id: i64, unsynced: bool) {
        if unsynced {
            self.unsynced.insert(id);
        } else {
            self.unsynced.remove(&id);
        }
    }

    /// Drop all per-user overlay state.
    pub fn clear_overlays(&self) {
        self.log_overlay.clear();
        self.marked.clear();
        self.unsynced.clear();
    }

    pub fn len(&self) -> usize {
        self.points.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Join the overlay flags onto a base record.
    fn joined(&self, point: &PointOfInterest) -> PointOfInterest {
        let mut joined = point.clone();
        // One overlay read per row: a concurrent set_logged is either fully
        // visible in the joined row or not at all, never half-applied
        let logged = self.log_overlay.get(&point.id).map(|c| *c);
        if let Some(condition) = logged {
            joined.condition = condition;
        }
        joined.marked = joined.marked || self.marked.contains(&point.id);
        if self.unsynced.contains(&point.id) {
            joined.unsynced = joined.unsynced.or(logged).or(Some(Condition::Unknown));
        }
        joined
    }

    fn status_matches(&self, joined: &PointOfInterest, status: StatusFilter) -> bool {
        match status {
            StatusFilter::Any => true,
            // Logged when either the archive condition or a local log says so
            StatusFilter::Logged => {
                joined.condition != Condition::NotLogged
                    || self.log_overlay.contains_key(&joined.id)
            }
            StatusFilter::NotLogged => {
                joined.condition == Condition::NotLogged
                    && !self.log_overlay.contains_key(&joined.id)
            }
            StatusFilter::Marked => self.marked.contains(&joined.id),
            StatusFilter::Unsynced => self.unsynced.contains(&joined.id),
        }
    }

    fn type_matches(&self, joined: &PointOfInterest, type_filter: TypeFilter) -> bool {
        match type_filter {
            // Long-standing quirk of the FBM-only list: membership is
            // evaluated against the joined row, so an FBM whose local log
            // says it could not be found drops out of the candidate set
            // entirely, while "All" still returns it. Callers depend on the
            // historical behavior, so it is preserved rather than fixed.
            TypeFilter::FbmOnly => {
                joined.category == Category::Fbm && !joined.condition.is_unfound()
            }
            other => other.matches(joined.category),
        }
    }
}

#[async_trait]
impl PointStore for MemoryStore {
    async fn fetch_candidates(
        &self,
        type_filter: TypeFilter,
        status_filter: StatusFilter,
    ) -> Result<Vec<PointOfInterest>, StoreError> {
        // Snapshot under the read lock, then join and filter lock-free so a
        // concurrent replace_all never tears a result
        let snapshot: Vec<PointOfInterest> = {
            let guard = self
                .points
                .read()
                .map_err(|_| StoreError::Unavailable { reason: "store poisoned".into() })?;
            guard.clone()
        };

        Ok(snapshot
            .iter()
            .map(|p| self.joined(p))
            .filter(|p| self.type_matches(p, type_filter) && self.status_matches(p, status_filter))
            .collect())
    }
}

/// A store that always fails; lets callers exercise error paths.
pub struct UnavailableStore;

#[async_trait]
impl PointStore for UnavailableStore {
    async fn fetch_candidates(
        &self,
        _type_filter: TypeFilter,
        _status_filter: StatusFilter,
    ) -> Result<Vec<PointOfInterest>, StoreError> {
        Err(StoreError::Unavailable { reason: "store offline".into() })
    }
}
