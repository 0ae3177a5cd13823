//! Run controller: at most one active optimization, with revoke.
//!
//! The controller is the only writer of `Running` and the only trigger of
//! cancellation. The worker task only moves a run from `Running` to a
//! terminal status and records progress.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{GeneticConfig, ScorerConfig};
use crate::constraints::ViolationScorer;
use crate::domain::{Roster, ShiftSlot};
use crate::error::{Result, SchedulingError};
use crate::progress::ProgressListener;
use crate::solver::{GeneticAlgorithm, RunStatus, Solution, Termination};

/// Snapshot of the process-wide run state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
    pub status: RunStatus,
    /// Generations fully evolved so far; equals `Solution::generations` once
    /// the run finishes.
    pub generation: usize,
    pub best_fitness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            run_id: None,
            status: RunStatus::Idle,
            generation: 0,
            best_fitness: None,
            error: None,
        }
    }
}

/// Everything needed to start one optimization run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub slots: Vec<ShiftSlot>,
    pub roster: Roster,
    pub config: GeneticConfig,
    pub scorer: ScorerConfig,
}

/// Handle to a started run.
pub struct RunHandle {
    pub id: Uuid,
    join: JoinHandle<Result<Solution>>,
}

impl RunHandle {
    /// Waits for the run to finish.
    pub async fn join(self) -> Result<Solution> {
        self.join.await?
    }
}

struct ActiveRun {
    id: Uuid,
    cancel: CancellationToken,
}

/// Enforces a single concurrent run and routes revoke requests to it.
///
/// # Examples
///
/// ```
/// use shift_scheduling::service::RunController;
/// use shift_scheduling::solver::RunStatus;
///
/// let controller = RunController::new();
/// assert_eq!(controller.state().status, RunStatus::Idle);
/// // Nothing to cancel yet.
/// assert!(!controller.revoke());
/// ```
#[derive(Default)]
pub struct RunController {
    state: Arc<Mutex<RunState>>,
    active: Mutex<Option<ActiveRun>>,
}

impl RunController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RunState {
        self.state.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().status == RunStatus::Running
    }

    /// Starts a run in the background.
    ///
    /// Rejects with [`SchedulingError::InvalidConfiguration`] before touching
    /// the run state, and with [`SchedulingError::Busy`] while another run is
    /// active. The worker pool is only built once the run is claimed. Must be
    /// called from within a tokio runtime.
    pub fn start(
        &self,
        request: RunRequest,
        listener: impl ProgressListener + Send + 'static,
    ) -> Result<RunHandle> {
        let scorer = ViolationScorer::new(request.scorer)?;
        request.config.validate()?;

        let id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let previous = {
            let mut state = self.state.lock();
            if state.status == RunStatus::Running {
                warn!(active = ?state.run_id, "Rejected run start while busy");
                return Err(SchedulingError::Busy);
            }
            *self.active.lock() = Some(ActiveRun {
                id,
                cancel: cancel.clone(),
            });
            std::mem::replace(
                &mut *state,
                RunState {
                    run_id: Some(id),
                    status: RunStatus::Running,
                    ..RunState::default()
                },
            )
        };

        let ga = match GeneticAlgorithm::new(request.config, scorer) {
            Ok(ga) => ga,
            Err(e) => {
                self.release(id, previous);
                return Err(e);
            }
        };

        info!(run_id = %id, slots = request.slots.len(), "Optimization run started");

        let tracker = StateTracker {
            state: Arc::clone(&self.state),
            inner: listener,
        };
        let mut ga = ga.with_listener(tracker);
        let state = Arc::clone(&self.state);

        let join = tokio::task::spawn_blocking(move || {
            let result = ga.run(&request.slots, &request.roster, &cancel);
            finish(&state, id, &result);
            result
        });

        Ok(RunHandle { id, join })
    }

    /// Gives up a claim taken by `start` when the run could not be launched.
    fn release(&self, id: Uuid, previous: RunState) {
        let mut state = self.state.lock();
        if state.run_id == Some(id) {
            *state = previous;
        }
        let mut active = self.active.lock();
        if active.as_ref().map(|run| run.id) == Some(id) {
            *active = None;
        }
    }

    /// Requests cancellation of the active run.
    ///
    /// Returns immediately; the run stops at its next generation boundary.
    /// Returns false when no run is active.
    pub fn revoke(&self) -> bool {
        if !self.is_running() {
            return false;
        }
        match self.active.lock().as_ref() {
            Some(run) => {
                info!(run_id = %run.id, "Revoking optimization run");
                run.cancel.cancel();
                true
            }
            None => false,
        }
    }
}

/// Records the terminal status of a run, unless a newer run replaced it.
fn finish(state: &Mutex<RunState>, id: Uuid, result: &Result<Solution>) {
    let mut state = state.lock();
    if state.run_id != Some(id) {
        return;
    }
    match result {
        Ok(solution) => {
            state.status = match solution.termination {
                Termination::Cancelled => RunStatus::Cancelled,
                Termination::Converged | Termination::Exhausted => RunStatus::Completed,
            };
            state.generation = solution.generations;
            state.best_fitness = Some(solution.best.fitness());
            info!(run_id = %id, status = state.status.as_str(), "Optimization run finished");
        }
        Err(e) => {
            state.status = RunStatus::Failed;
            state.error = Some(e.to_string());
            warn!(run_id = %id, error = %e, "Optimization run failed");
        }
    }
}

/// Mirrors progress into the shared run state before forwarding it.
struct StateTracker<L> {
    state: Arc<Mutex<RunState>>,
    inner: L,
}

impl<L: ProgressListener> ProgressListener for StateTracker<L> {
    fn on_generation_update(&mut self, generation: usize, fitness: f64) {
        {
            let mut state = self.state.lock();
            state.generation = generation + 1;
            state.best_fitness = Some(fitness);
        }
        self.inner.on_generation_update(generation, fitness);
    }
}
