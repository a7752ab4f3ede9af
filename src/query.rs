//! Anchor-relative nearest-marker queries
//!
//! [`rank`] is the pure half: fetch candidates from a [`PointStore`],
//! compute distance and bearing from the anchor, and sort ascending by
//! distance. [`NearestSession`] is the stateful half: it owns the anchor
//! (live device fixes or a pinned "relative mode" point), runs store reads
//! off the caller's thread, and guarantees last-result-wins when location
//! updates outrun query completion.

use crate::coord::GeographicCoordinate;
use crate::greatcircle::{self, Unit};
use crate::point::{FilterCriteria, PointOfInterest};
use crate::store::PointStore;
use crate::Result;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Semaphore, watch};

/// Candidate counts below this are ranked serially; the rayon fan-out only
/// pays for itself on large sets.
const PARALLEL_THRESHOLD: usize = 512;

/// A candidate marker with its distance (kilometres) and initial bearing
/// (degrees, `[0, 360)`) from the query anchor. Derived per query, never
/// persisted.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankedResult {
    pub point: PointOfInterest,
    pub distance: f64,
    pub bearing_from_anchor: f64,
}

impl RankedResult {
    /// Distance rendered for display in the given unit.
    pub fn distance_text(&self, unit: Unit) -> String {
        unit.format(self.distance)
    }
}

/// Where distances are measured from.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AnchorState {
    /// Tracking the continuously-updated device location
    Live(GeographicCoordinate),
    /// Relative mode: pinned to a chosen point until explicitly exited
    Fixed {
        coord: GeographicCoordinate,
        label: String,
    },
}

impl AnchorState {
    pub fn coord(&self) -> GeographicCoordinate {
        match self {
            AnchorState::Live(coord) => *coord,
            AnchorState::Fixed { coord, .. } => *coord,
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, AnchorState::Fixed { .. })
    }
}

/// A device location reading with the metadata needed to judge whether it
/// is materially better than the fix currently in use.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocationFix {
    pub coord: GeographicCoordinate,
    /// Estimated horizontal accuracy, metres
    pub accuracy_m: f32,
    /// Wall-clock time of the reading, milliseconds since the epoch
    pub timestamp_ms: u64,
    /// Which positioning source produced the reading
    pub provider: Option<String>,
}

/// A fix older/newer than this is treated as a different epoch entirely.
const SIGNIFICANT_AGE_MS: i64 = 2 * 60 * 1000;

/// Accuracy loss beyond this (metres) disqualifies a newer fix from an
/// unfamiliar provider.
const SIGNIFICANT_ACCURACY_LOSS_M: f32 = 200.0;

impl LocationFix {
    pub fn new(coord: GeographicCoordinate, accuracy_m: f32, timestamp_ms: u64) -> Self {
        Self { coord, accuracy_m, timestamp_ms, provider: None }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Whether this reading should replace the current one.
    ///
    /// Any fix beats none. A fix more than two minutes newer always wins
    /// (the user has likely moved); more than two minutes older always
    /// loses. Otherwise accuracy decides: strictly more accurate wins,
    /// newer-and-not-worse wins, and a newer but significantly less
    /// accurate reading is only trusted from the provider already in use.
    pub fn is_better_than(&self, current: Option<&LocationFix>) -> bool {
        let Some(current) = current else {
            return true;
        };

        let age_delta = self.timestamp_ms as i64 - current.timestamp_ms as i64;
        if age_delta > SIGNIFICANT_AGE_MS {
            return true;
        }
        if age_delta < -SIGNIFICANT_AGE_MS {
            return false;
        }
        let is_newer = age_delta > 0;

        let accuracy_delta = self.accuracy_m - current.accuracy_m;
        if accuracy_delta < 0.0 {
            return true;
        }
        if is_newer && accuracy_delta == 0.0 {
            return true;
        }
        is_newer
            && accuracy_delta <= SIGNIFICANT_ACCURACY_LOSS_M
            && self.provider == current.provider
    }
}

/// Fetch, rank and sort candidates relative to `anchor`.
///
/// Results are sorted ascending by distance; equal distances keep the
/// store's order (stable sort, no secondary key). A store failure is
/// returned as an error, which is distinct from an empty candidate set.
#[cfg_attr(feature = "profiling", profiling::function)]
pub async fn rank(
    anchor: GeographicCoordinate,
    criteria: &FilterCriteria,
    store: &dyn PointStore,
) -> Result<Vec<RankedResult>> {
    let candidates = store
        .fetch_candidates(criteria.type_filter, criteria.status_filter)
        .await?;

    let ranked_one = |point: PointOfInterest| RankedResult {
        distance: greatcircle::distance(anchor, point.coord, Unit::Km),
        bearing_from_anchor: greatcircle::bearing(anchor, point.coord),
        point,
    };

    let mut results: Vec<RankedResult> = if candidates.len() >= PARALLEL_THRESHOLD {
        candidates.into_par_iter().map(ranked_one).collect()
    } else {
        candidates.into_iter().map(ranked_one).collect()
    };

    // Stable sort so ties keep store order
    results.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
    Ok(results)
}

/// Variant of [`rank`] for callers that may not have a location yet: an
/// absent anchor yields `Ok(None)`, never an error.
pub async fn rank_opt(
    anchor: Option<GeographicCoordinate>,
    criteria: &FilterCriteria,
    store: &dyn PointStore,
) -> Result<Option<Vec<RankedResult>>> {
    match anchor {
        Some(anchor) => Ok(Some(rank(anchor, criteria, store).await?)),
        None => Ok(None),
    }
}

/// What a session currently knows about its results.
#[derive(Clone, Debug, PartialEq)]
pub enum SnapshotState {
    /// No anchor yet; nothing to rank
    Waiting,
    /// Ranked results for the current anchor and criteria
    Ready(Vec<RankedResult>),
    /// The store failed; not the same thing as zero results
    Failed(String),
}

/// Published on the session's watch channel after every completed query.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultsSnapshot {
    /// Generation of the query that produced this snapshot
    pub generation: u64,
    pub state: SnapshotState,
}

struct SessionState {
    anchor: Option<AnchorState>,
    last_fix: Option<LocationFix>,
    criteria: FilterCriteria,
}

struct SessionInner {
    store: Arc<dyn PointStore>,
    state: Mutex<SessionState>,
    /// Bumped on every trigger; a query publishes only if it still owns the
    /// latest generation when it finishes
    generation: AtomicU64,
    /// Single permit: at most one store read in flight
    gate: Semaphore,
    tx: watch::Sender<ResultsSnapshot>,
}

/// One nearest-list session: an anchor, filter criteria, and a stream of
/// ranked snapshots.
///
/// Every trigger (better fix, criteria change, relative-mode switch,
/// explicit refresh) supersedes whatever query is in flight: a superseded
/// query's result is discarded, never published over a newer one. Queries
/// run on the tokio runtime the calling task lives on; store reads never
/// block the caller.
pub struct NearestSession {
    inner: Arc<SessionInner>,
    rx: watch::Receiver<ResultsSnapshot>,
}

impl NearestSession {
    pub fn new(store: Arc<dyn PointStore>, criteria: FilterCriteria) -> Self {
        let (tx, rx) = watch::channel(ResultsSnapshot {
            generation: 0,
            state: SnapshotState::Waiting,
        });
        let inner = Arc::new(SessionInner {
            store,
            state: Mutex::new(SessionState {
                anchor: None,
                last_fix: None,
                criteria,
            }),
            generation: AtomicU64::new(0),
            gate: Semaphore::new(1),
            tx,
        });
        Self { inner, rx }
    }

    /// Subscribe to result snapshots. The receiver always holds the latest
    /// published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<ResultsSnapshot> {
        self.rx.clone()
    }

    /// The current anchor, if any.
    pub fn anchor(&self) -> Option<AnchorState> {
        self.lock_state().anchor.clone()
    }

    /// Whether the session is pinned in relative mode.
    pub fn is_relative(&self) -> bool {
        self.lock_state().anchor.as_ref().is_some_and(AnchorState::is_fixed)
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.lock_state().criteria
    }

    /// Offer a new device fix. Returns `true` when the fix was materially
    /// better and replaced the live anchor (triggering a re-query). In
    /// relative mode the fix is remembered for when relative mode exits,
    /// but the pinned anchor does not move.
    pub fn offer_fix(&self, fix: LocationFix) -> bool {
        let mut state = self.lock_state();
        if !fix.is_better_than(state.last_fix.as_ref()) {
            return false;
        }
        tracing::debug!(
            lat = fix.coord.lat,
            lon = fix.coord.lon,
            accuracy_m = fix.accuracy_m,
            "accepting location fix"
        );
        state.last_fix = Some(fix.clone());

        if state.anchor.as_ref().is_some_and(AnchorState::is_fixed) {
            return false;
        }
        state.anchor = Some(AnchorState::Live(fix.coord));
        drop(state);
        self.trigger();
        true
    }

    /// Pin the anchor to a chosen point ("relative mode"). Hard
    /// cancellation point: any in-flight query is superseded and a full
    /// re-query runs against the new anchor.
    pub fn enter_relative(&self, coord: GeographicCoordinate, label: impl Into<String>) {
        let label = label.into();
        tracing::info!(%label, "entering relative mode");
        self.lock_state().anchor = Some(AnchorState::Fixed { coord, label });
        self.trigger();
    }

    /// Leave relative mode and fall back to the most recent live fix (or to
    /// no anchor if none has arrived yet). Hard cancellation point.
    pub fn exit_relative(&self) {
        tracing::info!("exiting relative mode");
        {
            let mut state = self.lock_state();
            state.anchor = state
                .last_fix
                .as_ref()
                .map(|fix| AnchorState::Live(fix.coord));
        }
        self.trigger();
    }

    /// Change the filter criteria and re-query.
    pub fn set_criteria(&self, criteria: FilterCriteria) {
        self.lock_state().criteria = criteria;
        self.trigger();
    }

    /// Force a full re-query against the current anchor and criteria.
    pub fn refresh(&self) {
        self.trigger();
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Launch a query for the current anchor/criteria, superseding any
    /// query already in flight. Must be called from within a tokio runtime.
    fn trigger(&self) {
        let generation = self.inner.generation.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        let (anchor, criteria) = {
            let state = self.lock_state();
            (state.anchor.as_ref().map(AnchorState::coord), state.criteria)
        };

        let Some(anchor) = anchor else {
            // No fix yet: publish Waiting so stale results don't linger
            self.inner.tx.send_replace(ResultsSnapshot {
                generation,
                state: SnapshotState::Waiting,
            });
            return;
        };

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            // One query at a time; waiters coalesce behind the permit
            let Ok(_permit) = inner.gate.acquire().await else {
                return;
            };
            if inner.generation.load(AtomicOrdering::SeqCst) != generation {
                // Superseded while queued: drop before touching the store
                tracing::debug!(generation, "query superseded before start");
                return;
            }

            let outcome = rank(anchor, &criteria, inner.store.as_ref()).await;

            if inner.generation.load(AtomicOrdering::SeqCst) != generation {
                tracing::debug!(generation, "discarding superseded query result");
                return;
            }
            let state = match outcome {
                Ok(results) => {
                    tracing::debug!(generation, count = results.len(), "query complete");
                    SnapshotState::Ready(results)
                }
                Err(error) => {
                    tracing::warn!(generation, %error, "query failed");
                    SnapshotState::Failed(error.to_string())
                }
            };
            inner.tx.send_replace(ResultsSnapshot { generation, state });
        });
    }
}

impl std::fmt::Debug for NearestSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock_state();
        f.debug_struct("NearestSession")
            .field("anchor", &state.anchor)
            .field("criteria", &state.criteria)
            .field(
                "generation",
                &self.inner.generation.load(AtomicOrdering::Relaxed),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::{Category, Condition, StatusFilter, TypeFilter};
    use crate::store::{MemoryStore, UnavailableStore};
    use std::time::Duration;

    fn marker(id: i64, category: Category, lat: f64, lon: f64) -> PointOfInterest {
        PointOfInterest {
            id,
            name: format!("TP{id:04}"),
            category,
            condition: Condition::NotLogged,
            coord: GeographicCoordinate::new(lat, lon),
            marked: false,
            unsynced: None,
        }
    }

    /// Anchor plus one pillar and one FBM from the huntingdon survey area.
    fn scenario_store() -> (GeographicCoordinate, Arc<MemoryStore>) {
        let anchor = GeographicCoordinate::new(52.3305, -0.0310);
        let store = MemoryStore::new();
        store.replace_all(vec![
            marker(1, Category::Pillar, 52.3308, -0.0312),
            marker(2, Category::Fbm, 52.3301, -0.0308),
            marker(3, Category::Bolt, 52.3400, -0.0400),
        ]);
        (anchor, Arc::new(store))
    }

    #[tokio::test]
    async fn test_rank_sorts_ascending() {
        let (anchor, store) = scenario_store();
        let criteria = FilterCriteria::new(TypeFilter::All, StatusFilter::Any);
        let results = rank(anchor, &criteria, store.as_ref()).await.unwrap();
        assert_eq!(results.len(), 3);
        for pair in results.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
        // The pillar is nearest
        assert_eq!(results[0].point.id, 1);
    }

    #[tokio::test]
    async fn test_rank_pillars_only_returns_pillar_first() {
        let (anchor, store) = scenario_store();
        let criteria = FilterCriteria::new(TypeFilter::PillarsOnly, StatusFilter::Any);
        let results = rank(anchor, &criteria, store.as_ref()).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].point.category, Category::Pillar);
    }

    #[tokio::test]
    async fn test_rank_fbm_only_current_behavior() {
        // Pins the FBM-only quirk: once the FBM carries a "couldn't find"
        // log it vanishes from FBM-only results even though it is the
        // nearest FBM, while All still ranks it
        let (anchor, store) = scenario_store();
        let criteria = FilterCriteria::new(TypeFilter::FbmOnly, StatusFilter::Any);

        let before = rank(anchor, &criteria, store.as_ref()).await.unwrap();
        assert_eq!(before.len(), 1);
        assert_eq!(before[0].point.id, 2);

        store.set_logged(2, Condition::CouldntFind);
        let after = rank(anchor, &criteria, store.as_ref()).await.unwrap();
        assert!(after.is_empty());

        let all = FilterCriteria::new(TypeFilter::All, StatusFilter::Any);
        let all_results = rank(anchor, &all, store.as_ref()).await.unwrap();
        assert!(all_results.iter().any(|r| r.point.id == 2));
    }

    #[test]
    fn test_distance_text_applies_unit() {
        let result = RankedResult {
            point: marker(1, Category::Pillar, 52.0, -1.0),
            distance: 3.25,
            bearing_from_anchor: 0.0,
        };
        assert_eq!(result.distance_text(Unit::Km), "3.2km");
        assert_eq!(result.distance_text(Unit::Metres), "3250m");
    }

    #[tokio::test]
    async fn test_rank_bearing_in_range() {
        let (anchor, store) = scenario_store();
        let criteria = FilterCriteria::new(TypeFilter::All, StatusFilter::Any);
        let results = rank(anchor, &criteria, store.as_ref()).await.unwrap();
        for r in &results {
            assert!((0.0..360.0).contains(&r.bearing_from_anchor));
        }
    }

    #[tokio::test]
    async fn test_rank_ties_keep_store_order() {
        let anchor = GeographicCoordinate::new(52.0, -1.0);
        let store = MemoryStore::new();
        // Same position, three ids: distances tie exactly
        store.replace_all(vec![
            marker(7, Category::Pillar, 52.1, -1.0),
            marker(8, Category::Pillar, 52.1, -1.0),
            marker(9, Category::Pillar, 52.1, -1.0),
        ]);
        let criteria = FilterCriteria::new(TypeFilter::PillarsOnly, StatusFilter::Any);
        let results = rank(anchor, &criteria, &store).await.unwrap();
        let ids: Vec<i64> = results.iter().map(|r| r.point.id).collect();
        assert_eq!(ids, vec![7, 8, 9]);
    }

    #[tokio::test]
    async fn test_rank_store_failure_is_error_not_empty() {
        let anchor = GeographicCoordinate::new(52.0, -1.0);
        let criteria = FilterCriteria::default();
        let result = rank(anchor, &criteria, &UnavailableStore).await;
        assert!(matches!(result, Err(crate::Error::Store(_))));
    }

    #[tokio::test]
    async fn test_rank_opt_absent_anchor() {
        let (_, store) = scenario_store();
        let criteria = FilterCriteria::default();
        let result = rank_opt(None, &criteria, store.as_ref()).await.unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_fix_beats_nothing() {
        let fix = LocationFix::new(GeographicCoordinate::new(52.0, -1.0), 50.0, 1_000);
        assert!(fix.is_better_than(None));
    }

    #[test]
    fn test_significantly_newer_fix_wins() {
        let old = LocationFix::new(GeographicCoordinate::new(52.0, -1.0), 10.0, 0);
        let new = LocationFix::new(GeographicCoordinate::new(52.1, -1.0), 500.0, 130_000);
        assert!(new.is_better_than(Some(&old)));
        assert!(!old.is_better_than(Some(&new)));
    }

    #[test]
    fn test_more_accurate_fix_wins() {
        let current = LocationFix::new(GeographicCoordinate::new(52.0, -1.0), 100.0, 10_000);
        let better = LocationFix::new(GeographicCoordinate::new(52.0, -1.0), 20.0, 9_000);
        assert!(better.is_better_than(Some(&current)));
    }

    #[test]
    fn test_newer_but_much_less_accurate_needs_same_provider() {
        let current = LocationFix::new(GeographicCoordinate::new(52.0, -1.0), 10.0, 10_000)
            .with_provider("gps");
        let sloppy_other = LocationFix::new(GeographicCoordinate::new(52.0, -1.0), 300.0, 11_000)
            .with_provider("network");
        assert!(!sloppy_other.is_better_than(Some(&current)));

        let sloppy_same = LocationFix::new(GeographicCoordinate::new(52.0, -1.0), 150.0, 11_000)
            .with_provider("gps");
        assert!(sloppy_same.is_better_than(Some(&current)));
    }

    async fn wait_for_ready(rx: &mut watch::Receiver<ResultsSnapshot>) -> Vec<RankedResult> {
        for _ in 0..50 {
            {
                let snapshot = rx.borrow();
                if let SnapshotState::Ready(results) = &snapshot.state {
                    return results.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("session never published results");
    }

    #[tokio::test]
    async fn test_session_starts_waiting() {
        let (_, store) = scenario_store();
        let session = NearestSession::new(store, FilterCriteria::default());
        let rx = session.subscribe();
        assert_eq!(rx.borrow().state, SnapshotState::Waiting);
        assert!(session.anchor().is_none());
    }

    #[tokio::test]
    async fn test_session_publishes_after_fix() {
        let (anchor, store) = scenario_store();
        let session = NearestSession::new(
            store,
            FilterCriteria::new(TypeFilter::All, StatusFilter::Any),
        );
        let mut rx = session.subscribe();

        assert!(session.offer_fix(LocationFix::new(anchor, 25.0, 1_000)));
        let results = wait_for_ready(&mut rx).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].point.id, 1);
    }

    #[tokio::test]
    async fn test_session_rejects_worse_fix() {
        let (anchor, store) = scenario_store();
        let session = NearestSession::new(store, FilterCriteria::default());
        assert!(session.offer_fix(LocationFix::new(anchor, 10.0, 10_000)));
        // Older and less accurate: ignored
        let worse = LocationFix::new(GeographicCoordinate::new(53.0, -1.0), 500.0, 9_000);
        assert!(!session.offer_fix(worse));
        assert_eq!(session.anchor().map(|a| a.coord()), Some(anchor));
    }

    #[tokio::test]
    async fn test_session_relative_mode_pins_anchor() {
        let (anchor, store) = scenario_store();
        let session = NearestSession::new(
            store,
            FilterCriteria::new(TypeFilter::All, StatusFilter::Any),
        );
        let mut rx = session.subscribe();

        let pinned = GeographicCoordinate::new(52.3301, -0.0308);
        session.enter_relative(pinned, "FBM 42");
        assert!(session.is_relative());

        let results = wait_for_ready(&mut rx).await;
        // From the pinned FBM position, the FBM itself ranks first
        assert_eq!(results[0].point.id, 2);

        // Live fixes are remembered but do not move the pinned anchor
        assert!(!session.offer_fix(LocationFix::new(anchor, 5.0, 50_000)));
        assert_eq!(session.anchor().map(|a| a.coord()), Some(pinned));

        // Exiting falls back to the remembered fix and re-queries
        session.exit_relative();
        assert!(!session.is_relative());
        assert_eq!(session.anchor().map(|a| a.coord()), Some(anchor));
    }

    #[tokio::test]
    async fn test_session_criteria_change_requeries() {
        let (anchor, store) = scenario_store();
        let session = NearestSession::new(
            store,
            FilterCriteria::new(TypeFilter::All, StatusFilter::Any),
        );
        let mut rx = session.subscribe();
        session.offer_fix(LocationFix::new(anchor, 25.0, 1_000));
        let all = wait_for_ready(&mut rx).await;
        assert_eq!(all.len(), 3);

        session.set_criteria(FilterCriteria::new(
            TypeFilter::PillarsOnly,
            StatusFilter::Any,
        ));
        for _ in 0..50 {
            {
                let snapshot = rx.borrow();
                if let SnapshotState::Ready(results) = &snapshot.state {
                    if results.len() == 1 {
                        assert_eq!(results[0].point.category, Category::Pillar);
                        return;
                    }
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("criteria change never produced a filtered snapshot");
    }

    #[tokio::test]
    async fn test_session_last_result_wins() {
        // A store whose first read is slow: the superseding query's result
        // must land and stay, the slow one must be discarded
        struct SlowFirstStore {
            inner: MemoryStore,
            calls: AtomicU64,
        }

        #[async_trait::async_trait]
        impl PointStore for SlowFirstStore {
            async fn fetch_candidates(
                &self,
                type_filter: TypeFilter,
                status_filter: StatusFilter,
            ) -> std::result::Result<Vec<PointOfInterest>, crate::store::StoreError> {
                if self.calls.fetch_add(1, AtomicOrdering::SeqCst) == 0 {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                }
                self.inner.fetch_candidates(type_filter, status_filter).await
            }
        }

        let inner = MemoryStore::new();
        inner.replace_all(vec![
            marker(1, Category::Pillar, 52.3308, -0.0312),
            marker(2, Category::Pillar, 52.4000, -0.0312),
        ]);
        let store = Arc::new(SlowFirstStore { inner, calls: AtomicU64::new(0) });

        let session = NearestSession::new(
            store,
            FilterCriteria::new(TypeFilter::PillarsOnly, StatusFilter::Any),
        );
        let mut rx = session.subscribe();

        // First anchor: near marker 1. Query starts and stalls.
        session.offer_fix(LocationFix::new(
            GeographicCoordinate::new(52.3305, -0.0310),
            25.0,
            1_000,
        ));
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Much newer anchor near marker 2 supersedes the stalled query
        session.offer_fix(LocationFix::new(
            GeographicCoordinate::new(52.4001, -0.0310),
            25.0,
            200_000,
        ));

        let results = wait_for_ready(&mut rx).await;
        assert_eq!(results[0].point.id, 2, "stale ordering overwrote newer result");

        // Give the stalled query time to finish and verify it stayed dead
        tokio::time::sleep(Duration::from_millis(300)).await;
        let snapshot = rx.borrow().clone();
        match snapshot.state {
            SnapshotState::Ready(results) => assert_eq!(results[0].point.id, 2),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_session_store_failure_published_distinctly() {
        let session = NearestSession::new(Arc::new(UnavailableStore), FilterCriteria::default());
        let mut rx = session.subscribe();
        session.offer_fix(LocationFix::new(
            GeographicCoordinate::new(52.0, -1.0),
            25.0,
            1_000,
        ));
        for _ in 0..50 {
            {
                let snapshot = rx.borrow();
                if let SnapshotState::Failed(reason) = &snapshot.state {
                    assert!(reason.contains("offline"));
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("store failure never surfaced");
    }
}
