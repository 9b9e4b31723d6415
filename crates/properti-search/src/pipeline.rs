//! Strategy fallthrough state machine.
//!
//! Each strategy tier carries a [`StrategyState`]. [`transition`] is a pure
//! function from the three states to the next [`Step`]; the engine only
//! executes what it returns, so ordering rules live in one place:
//!
//! | Tier      | Success     | Empty        | Failed       | Skipped      |
//! |-----------|-------------|--------------|--------------|--------------|
//! | fts       | finish fts  | next tier    | next tier    | next tier    |
//! | hybrid    | finish hyb. | next tier    | next tier    | next tier    |
//! | fallback  | finish fb.  | finish fb.   | fail         | fail         |

use serde::Serialize;

use properti_core::SearchStrategyKind;

/// Lifecycle of one strategy tier within a single search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyState {
    #[default]
    NotTried,
    /// Gate not met; never executed.
    Skipped,
    /// Executed, zero rows.
    Empty,
    /// Executed, at least one row.
    Success,
    /// Executed, datastore error or timeout.
    Failed,
}

impl StrategyState {
    /// Whether the tier reached the datastore.
    pub fn was_attempted(&self) -> bool {
        matches!(self, Self::Empty | Self::Success | Self::Failed)
    }
}

/// What the engine should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Run(SearchStrategyKind),
    Finish(SearchStrategyKind),
    Fail,
}

/// Decide the next step from the current tier states.
pub fn transition(states: &[StrategyState; 3]) -> Step {
    for kind in SearchStrategyKind::ORDERED {
        let state = states[kind.index()];
        match state {
            StrategyState::NotTried => return Step::Run(kind),
            StrategyState::Success => return Step::Finish(kind),
            _ if kind != SearchStrategyKind::Fallback => continue,
            StrategyState::Empty => return Step::Finish(kind),
            StrategyState::Failed | StrategyState::Skipped => return Step::Fail,
        }
    }
    Step::Fail
}

/// Per-search tier states.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrategyPipeline {
    states: [StrategyState; 3],
}

impl StrategyPipeline {
    /// Start a pipeline; the full-text tier is skipped unless its gate is met.
    pub fn new(attempt_fts: bool) -> Self {
        let mut pipeline = Self::default();
        if !attempt_fts {
            pipeline.states[SearchStrategyKind::Fts.index()] = StrategyState::Skipped;
        }
        pipeline
    }

    pub fn next_step(&self) -> Step {
        transition(&self.states)
    }

    pub fn record(&mut self, kind: SearchStrategyKind, state: StrategyState) {
        self.states[kind.index()] = state;
    }

    pub fn state(&self, kind: SearchStrategyKind) -> StrategyState {
        self.states[kind.index()]
    }

    /// Tiers that reached the datastore, in order.
    pub fn attempted(&self) -> Vec<SearchStrategyKind> {
        SearchStrategyKind::ORDERED
            .into_iter()
            .filter(|k| self.state(*k).was_attempted())
            .collect()
    }
}
