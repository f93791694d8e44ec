//! Propagates many catalog entries to one target, one outcome per entry.

use serde::Serialize;
use tracing::{info, warn};

use crate::collectors::catalog::RecordResult;
use crate::core::orbit::{ErrorKind, PropagatedState, PropagationSettings};
use crate::core::satellite::Satellite;
use crate::core::time::Target;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub norad_id: Option<u32>,
    pub name: Option<String>,
    #[serde(flatten)]
    pub result: Outcome,
}

/// Serialised without a tag: either the state fields or the error fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    State(PropagatedState),
    Failed {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        kind: Option<ErrorKind>,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<u8>,
        #[serde(skip_serializing_if = "Option::is_none")]
        minutes_since_epoch: Option<f64>,
    },
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self.result, Outcome::State(_))
    }
}

/// Propagates already-initialised satellites.
pub fn propagate_satellites(satellites: &[Satellite], target: Target) -> Vec<BatchOutcome> {
    let outcomes: Vec<BatchOutcome> = satellites.iter().map(|sat| propagate_one(sat, target)).collect();
    log_summary(&outcomes);
    outcomes
}

/// Initialises and propagates every parsed entry; entries that failed to
/// parse are reported in place and the batch carries on.
pub fn propagate_batch(entries: &[RecordResult], target: Target, settings: PropagationSettings) -> Vec<BatchOutcome> {
    let outcomes: Vec<BatchOutcome> = entries
        .iter()
        .map(|entry| match entry {
            Ok(elements) => propagate_one(&Satellite::new(elements.clone(), settings), target),
            Err(e) => BatchOutcome {
                norad_id: None,
                name: None,
                result: Outcome::Failed { error: e.to_string(), kind: None, code: None, minutes_since_epoch: None },
            },
        })
        .collect();
    log_summary(&outcomes);
    outcomes
}

fn propagate_one(sat: &Satellite, target: Target) -> BatchOutcome {
    let result = match sat.propagate(target) {
        Ok(state) => Outcome::State(state),
        Err(e) => {
            warn!(norad = sat.norad_id(), error = %e, "Propagation failed");
            Outcome::Failed {
                error: e.to_string(),
                kind: Some(e.kind),
                code: Some(e.kind.code()),
                minutes_since_epoch: Some(e.minutes_since_epoch),
            }
        }
    };
    BatchOutcome { norad_id: Some(sat.norad_id()), name: sat.name().map(str::to_string), result }
}

fn log_summary(outcomes: &[BatchOutcome]) {
    let ok = outcomes.iter().filter(|o| o.is_ok()).count();
    info!(total = outcomes.len(), ok, failed = outcomes.len() - ok, "Batch propagated");
}
