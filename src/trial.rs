//! Trial records and the append-only store that holds them.

use serde::{Deserialize, Serialize};

use crate::params::LaunchParams;
use crate::trajectory_sampling::Trajectory;

/// Terminal state of a simulation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightOutcome {
    /// Dropped below the ground threshold
    Landed,
    /// Speed became zero or non-finite; stopped where it was
    Degenerate,
    /// Hit the iteration cap before landing
    Aborted,
    /// Required parameters were not finite; nothing was simulated
    Invalid,
}

/// Where a trial came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialOrigin {
    Interactive,
    Batch,
    Imported,
}

/// Output of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialResult {
    pub distance: f64,     // m, final x
    pub max_height: f64,   // m
    pub air_time: f64,     // s
    pub trajectory: Trajectory,
    pub outcome: FlightOutcome,
}

impl TrialResult {
    /// Zeroed result returned for rejected input
    pub fn invalid() -> Self {
        Self {
            distance: 0.0,
            max_height: 0.0,
            air_time: 0.0,
            trajectory: Trajectory::default(),
            outcome: FlightOutcome::Invalid,
        }
    }

    pub fn landed(&self) -> bool {
        self.outcome == FlightOutcome::Landed
    }
}

/// Sequential trial identifier, unique within a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrialId(pub u64);

impl std::fmt::Display for TrialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One launch-to-landing simulation with its inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub id: TrialId,
    pub params: LaunchParams,
    pub results: TrialResult,
    pub origin: TrialOrigin,
}

/// Ordered, append-only collection of trials
///
/// Insertion order is temporal order. The store never evicts; callers that
/// want a cap take a view with [`TrialStore::last_n`].
#[derive(Debug, Clone, Default)]
pub struct TrialStore {
    trials: Vec<Trial>,
    next_id: u64,
}

impl TrialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a trial and return its id
    pub fn record(&mut self, params: LaunchParams, results: TrialResult, origin: TrialOrigin) -> TrialId {
        let id = TrialId(self.next_id);
        self.next_id += 1;
        self.trials.push(Trial { id, params, results, origin });
        id
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trial> {
        self.trials.iter()
    }

    pub fn get(&self, id: TrialId) -> Option<&Trial> {
        // ids are assigned in insertion order, so the slice is sorted by id
        self.trials
            .binary_search_by_key(&id, |t| t.id)
            .ok()
            .map(|idx| &self.trials[idx])
    }

    pub fn last(&self) -> Option<&Trial> {
        self.trials.last()
    }

    /// The most recent `n` trials, oldest first
    pub fn last_n(&self, n: usize) -> &[Trial] {
        let start = self.trials.len().saturating_sub(n);
        &self.trials[start..]
    }
}

impl<'a> IntoIterator for &'a TrialStore {
    type Item = &'a Trial;
    type IntoIter = std::slice::Iter<'a, Trial>;

    fn into_iter(self) -> Self::IntoIter {
        self.trials.iter()
    }
}
