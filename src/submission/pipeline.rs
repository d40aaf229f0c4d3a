use serde_json::Value;

use crate::models::NewSubmission;
use crate::sinks::FanOut;
use crate::state::SharedState;

use super::fields::{self, ValidationError};

pub struct PipelineResult {
    pub submission: NewSubmission,
    pub fan_out: FanOut,
}

/// Validate the raw fields and fan the submission out to every sink.
/// Sink failures are logged by the registry and reported in `fan_out`.
pub async fn run(state: &SharedState, raw: &Value) -> Result<PipelineResult, ValidationError> {
    let submission = fields::validate(raw)?;

    let fan_out = state.sinks.store_all(&submission).await;
    if !fan_out.failed.is_empty() {
        tracing::warn!(
            "Submission from {} stored in {:?}, failed in {:?}",
            submission.name,
            fan_out.stored,
            fan_out.failed
        );
    }

    Ok(PipelineResult {
        submission,
        fan_out,
    })
}
