//! Lead pipeline stages and the `stageChangedAt` transition rule.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::types::Record;

/// Field holding the lead's current stage.
pub const STAGE_FIELD: &str = "pipelineStage";

/// Field stamped whenever the stage actually changes.
pub const STAGE_CHANGED_AT_FIELD: &str = "stageChangedAt";

/// Enumerated lead-progress state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Inquiry,
    Application,
    Screening,
    Training,
    Onboarded,
    Rejected,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 6] = [
        Self::Inquiry,
        Self::Application,
        Self::Screening,
        Self::Training,
        Self::Onboarded,
        Self::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inquiry => "inquiry",
            Self::Application => "application",
            Self::Screening => "screening",
            Self::Training => "training",
            Self::Onboarded => "onboarded",
            Self::Rejected => "rejected",
        }
    }

    /// Onboarded and rejected leads leave the pipeline.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Onboarded | Self::Rejected)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineStage {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown pipeline stage: {s}")))
    }
}

/// Apply the stage-transition rule to an update `patch`.
///
/// When the patch sets `pipelineStage` to a value different from `current`,
/// `stageChangedAt` is inserted with `now`. When the stage is absent or
/// unchanged the patch is left exactly as given. Returns whether a
/// transition happened.
///
/// `now` is passed in already encoded (the datastore has its own date
/// representation).
pub fn apply_stage_transition(
    current: Option<&str>,
    patch: &mut Record,
    now: Value,
) -> Result<bool, CoreError> {
    let next = match patch.get(STAGE_FIELD) {
        None | Some(Value::Null) => return Ok(false),
        Some(Value::String(s)) => s.parse::<PipelineStage>()?,
        Some(other) => {
            return Err(CoreError::Validation(format!(
                "{STAGE_FIELD} must be a string (got {other})"
            )))
        }
    };

    if current == Some(next.as_str()) {
        return Ok(false);
    }

    patch.insert(STAGE_CHANGED_AT_FIELD.to_string(), now);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn patch(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn stage_round_trips_through_str() {
        for stage in PipelineStage::ALL {
            assert_eq!(stage.as_str().parse::<PipelineStage>().unwrap(), stage);
        }
    }

    #[test]
    fn unknown_stage_is_rejected() {
        assert_matches!("hired".parse::<PipelineStage>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(
            serde_json::to_value(PipelineStage::Screening).unwrap(),
            json!("screening")
        );
    }

    #[test]
    fn terminal_stages() {
        assert!(PipelineStage::Onboarded.is_terminal());
        assert!(PipelineStage::Rejected.is_terminal());
        assert!(!PipelineStage::Training.is_terminal());
    }

    // -----------------------------------------------------------------------
    // apply_stage_transition
    // -----------------------------------------------------------------------

    #[test]
    fn changed_stage_sets_stage_changed_at() {
        let mut p = patch(json!({ "pipelineStage": "screening" }));
        let changed = apply_stage_transition(Some("application"), &mut p, json!("NOW")).unwrap();
        assert!(changed);
        assert_eq!(p[STAGE_CHANGED_AT_FIELD], "NOW");
    }

    #[test]
    fn first_stage_assignment_counts_as_change() {
        let mut p = patch(json!({ "pipelineStage": "inquiry" }));
        assert!(apply_stage_transition(None, &mut p, json!("NOW")).unwrap());
        assert!(p.contains_key(STAGE_CHANGED_AT_FIELD));
    }

    #[test]
    fn unchanged_stage_leaves_patch_untouched() {
        let original = json!({ "pipelineStage": "training", "leadScore": 40 });
        let mut p = patch(original.clone());
        let changed = apply_stage_transition(Some("training"), &mut p, json!("NOW")).unwrap();
        assert!(!changed);
        assert_eq!(Value::Object(p), original);
    }

    #[test]
    fn absent_stage_leaves_patch_untouched() {
        let mut p = patch(json!({ "leadScore": 80 }));
        assert!(!apply_stage_transition(Some("inquiry"), &mut p, json!("NOW")).unwrap());
        assert!(!p.contains_key(STAGE_CHANGED_AT_FIELD));
    }

    #[test]
    fn invalid_stage_value_is_validation_error() {
        let mut p = patch(json!({ "pipelineStage": 3 }));
        assert_matches!(
            apply_stage_transition(None, &mut p, json!("NOW")),
            Err(CoreError::Validation(_))
        );
        let mut p = patch(json!({ "pipelineStage": "hired" }));
        assert_matches!(
            apply_stage_transition(None, &mut p, json!("NOW")),
            Err(CoreError::Validation(_))
        );
    }
}
