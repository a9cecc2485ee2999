//! Shared generate-and-mark loop over one road graph.
//!
//! The ledger lock is held from the start of a search until its route has
//! been classified and marked, so two concurrent callers never see the same
//! edges as new.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::config::RouteGeneratorConfig;
use crate::error::{AppError, Result};
use crate::models::{GeneratedRoute, NodeId, RoadNetwork, RouteRequest, SearchStrategy};
use crate::services::route_generator::RouteGenerator;
use crate::services::visited_edges::VisitedEdges;

const RUNNING: u8 = 0;
const CANCELLED: u8 = 1;
const COMMITTED: u8 = 2;

pub struct CoverageSession<G> {
    graph: Arc<G>,
    ledger: Arc<Mutex<VisitedEdges>>,
    config: RouteGeneratorConfig,
}

impl<G> Clone for CoverageSession<G> {
    fn clone(&self) -> Self {
        CoverageSession {
            graph: Arc::clone(&self.graph),
            ledger: Arc::clone(&self.ledger),
            config: self.config.clone(),
        }
    }
}

fn lock_ledger(ledger: &Mutex<VisitedEdges>) -> Result<MutexGuard<'_, VisitedEdges>> {
    ledger
        .lock()
        .map_err(|_| AppError::Internal("visited-edge ledger lock poisoned".to_string()))
}

/// Generate, classify and mark under one lock. With `commit` set, marking
/// only happens if the caller has not abandoned the request meanwhile.
fn generate_locked<G: RoadNetwork>(
    graph: &G,
    ledger: &Mutex<VisitedEdges>,
    config: RouteGeneratorConfig,
    strategy: SearchStrategy,
    request: &RouteRequest,
    commit: Option<&AtomicU8>,
) -> Result<GeneratedRoute> {
    let mut guard = lock_ledger(ledger)?;

    let nodes = RouteGenerator::with_strategy(graph, &guard, config, strategy).generate(request)?;
    let segments = guard.segments_for(graph, &nodes)?;

    if let Some(state) = commit {
        if state
            .compare_exchange(RUNNING, COMMITTED, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(AppError::RouteNotFound("route abandoned after timeout".to_string()));
        }
    }

    guard.mark_edges_visited(&nodes);
    Ok(GeneratedRoute { nodes, segments })
}

impl<G: RoadNetwork + Send + Sync + 'static> CoverageSession<G> {
    pub fn new(graph: Arc<G>, config: RouteGeneratorConfig) -> Self {
        Self::with_ledger(graph, VisitedEdges::new(), config)
    }

    /// Session starting from an existing ledger, e.g. one seeded from
    /// recorded tracks.
    pub fn with_ledger(graph: Arc<G>, ledger: VisitedEdges, config: RouteGeneratorConfig) -> Self {
        CoverageSession {
            graph,
            ledger: Arc::new(Mutex::new(ledger)),
            config,
        }
    }

    /// Generate a route and mark its edges visited. The returned segments
    /// describe novelty as it was before marking.
    pub fn generate_and_mark(
        &self,
        strategy: SearchStrategy,
        request: &RouteRequest,
    ) -> Result<GeneratedRoute> {
        generate_locked(
            self.graph.as_ref(),
            &self.ledger,
            self.config.clone(),
            strategy,
            request,
            None,
        )
    }

    /// [`generate_and_mark`](Self::generate_and_mark) on the blocking pool,
    /// giving up after `limit`. A timed-out search reports route-not-found
    /// and its result, if it ever arrives, is not marked.
    pub async fn generate_with_timeout(
        &self,
        strategy: SearchStrategy,
        request: RouteRequest,
        limit: Duration,
    ) -> Result<GeneratedRoute> {
        let graph = Arc::clone(&self.graph);
        let ledger = Arc::clone(&self.ledger);
        let config = self.config.clone();
        let state = Arc::new(AtomicU8::new(RUNNING));
        let worker_state = Arc::clone(&state);

        let mut handle = tokio::task::spawn_blocking(move || {
            generate_locked(
                graph.as_ref(),
                &ledger,
                config,
                strategy,
                &request,
                Some(&worker_state),
            )
        });

        match tokio::time::timeout(limit, &mut handle).await {
            Ok(joined) => joined
                .map_err(|e| AppError::Internal(format!("route worker failed: {}", e)))?,
            Err(_) => {
                if state
                    .compare_exchange(RUNNING, CANCELLED, Ordering::SeqCst, Ordering::SeqCst)
                    .is_ok()
                {
                    tracing::warn!(
                        strategy = %strategy,
                        timeout_ms = limit.as_millis() as u64,
                        "Route generation timed out"
                    );
                    return Err(AppError::RouteNotFound(format!(
                        "{} timed out after {}ms",
                        strategy,
                        limit.as_millis()
                    )));
                }

                // Committed right at the deadline; the route is already marked
                handle
                    .await
                    .map_err(|e| AppError::Internal(format!("route worker failed: {}", e)))?
            }
        }
    }

    /// Pre-seed the ledger with an externally recorded node sequence.
    pub fn seed_track(&self, nodes: &[NodeId]) -> Result<usize> {
        let mut ledger = lock_ledger(&self.ledger)?;
        Ok(ledger.mark_track_visited(self.graph.as_ref(), nodes))
    }

    pub fn coverage(&self) -> Result<f64> {
        let ledger = lock_ledger(&self.ledger)?;
        Ok(ledger.coverage(self.graph.as_ref()))
    }

    pub fn reset(&self) -> Result<()> {
        lock_ledger(&self.ledger)?.clear();
        Ok(())
    }

    /// Copy of the ledger as it is now.
    pub fn snapshot(&self) -> Result<VisitedEdges> {
        Ok(lock_ledger(&self.ledger)?.clone())
    }
}
