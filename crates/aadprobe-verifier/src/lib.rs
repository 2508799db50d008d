pub mod checks;
pub mod error;
pub mod local;
pub mod provisioner;
pub mod report;
pub mod scenario;
pub mod terraform;
pub mod verifier;

pub use checks::{check_attr, check_attr_set, check_destroy, check_exists, evaluate, Check};
pub use error::{ProvisionError, ScenarioError, StateError, VerificationError};
pub use local::LocalProvisioner;
pub use provisioner::Provisioner;
pub use report::{ScenarioReport, StepKind, StepReport};
pub use scenario::{apply_checks, run_case, Step, TestCase, BUILTIN_CASES};
pub use terraform::TerraformProvisioner;
pub use verifier::{Outcome, Verifier};
