use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepKind {
    Apply { variant: String, test_id: String },
    ImportVerify { address: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub index: usize,
    #[serde(flatten)]
    pub kind: StepKind,
    /// Primary ID observed after the step, if any.
    pub object_id: Option<String>,
    pub error: Option<String>,
}

impl StepReport {
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub case: String,
    pub provisioner: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub steps: Vec<StepReport>,
    /// Failure of teardown or of the post-destroy absence check.
    pub destroy_error: Option<String>,
}

impl ScenarioReport {
    pub fn new(case: impl Into<String>, provisioner: impl Into<String>) -> Self {
        Self {
            case: case.into(),
            provisioner: provisioner.into(),
            started_at: Utc::now(),
            finished_at: None,
            steps: Vec::new(),
            destroy_error: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.destroy_error.is_none() && self.steps.iter().all(StepReport::passed)
    }

    /// Every failure message, steps first.
    pub fn errors(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .steps
            .iter()
            .filter_map(|s| s.error.as_ref().map(|e| format!("step {}: {}", s.index, e)))
            .collect();
        if let Some(e) = &self.destroy_error {
            out.push(format!("destroy: {}", e));
        }
        out
    }
}
