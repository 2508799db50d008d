use std::collections::BTreeSet;

use aadprobe_config::{Fixture, Variant, FIXTURE_ADDRESS};
use aadprobe_domain::StateSnapshot;
use chrono::Utc;
use tracing::{info, warn};

use crate::checks::{check_destroy, evaluate, primary_id, Check};
use crate::error::{ScenarioError, StateError};
use crate::provisioner::Provisioner;
use crate::report::{ScenarioReport, StepKind, StepReport};
use crate::verifier::Verifier;

/// Names accepted by [`TestCase::builtin`].
pub const BUILTIN_CASES: [&str; 4] = ["basic", "available-to-other-tenants", "complete", "update"];

#[derive(Debug, Clone)]
pub enum Step {
    /// Apply `fixture`, then run `checks` against the resulting state.
    Apply { fixture: Fixture, checks: Vec<Check> },
    /// Re-import `address` by its current id; every attribute must survive.
    ImportVerify { address: String },
}

/// An ordered lifecycle: steps, then destroy, then the absence check.
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub steps: Vec<Step>,
}

/// Checks every apply of `fixture` must pass.
pub fn apply_checks(fixture: &Fixture) -> Vec<Check> {
    let mut checks = vec![Check::exists(FIXTURE_ADDRESS)];
    checks.extend(
        fixture
            .expected_attrs()
            .into_iter()
            .map(|(key, value)| Check::attr(FIXTURE_ADDRESS, &key, value)),
    );
    checks.push(Check::attr_set(FIXTURE_ADDRESS, "application_id"));
    checks
}

impl TestCase {
    fn single(name: &str, fixture: Fixture) -> Self {
        let checks = apply_checks(&fixture);
        Self {
            name: name.to_string(),
            steps: vec![
                Step::Apply { fixture, checks },
                Step::ImportVerify { address: FIXTURE_ADDRESS.to_string() },
            ],
        }
    }

    pub fn basic(id: &str) -> Self {
        Self::single("basic", Fixture::new(Variant::Basic, id))
    }

    pub fn available_to_other_tenants(id: &str) -> Self {
        Self::single(
            "available-to-other-tenants",
            Fixture::new(Variant::AvailableToOtherTenants, id),
        )
    }

    pub fn complete(id: &str) -> Self {
        Self::single("complete", Fixture::new(Variant::Complete, id))
    }

    /// Basic fixture, then the complete fixture under a new test id. The
    /// object must be updated in place.
    pub fn update(id: &str, updated_id: &str) -> Self {
        let first = Fixture::new(Variant::Basic, id);
        let second = Fixture::new(Variant::Complete, updated_id);
        let mut second_checks = apply_checks(&second);
        second_checks.push(Check::id_unchanged(FIXTURE_ADDRESS));
        Self {
            name: "update".to_string(),
            steps: vec![
                Step::Apply { checks: apply_checks(&first), fixture: first },
                Step::Apply { fixture: second, checks: second_checks },
            ],
        }
    }

    /// A built-in case with fresh random test ids.
    pub fn builtin(name: &str) -> Option<Self> {
        let id = || Fixture::random(Variant::Basic).id;
        match name {
            "basic" => Some(Self::basic(&id())),
            "available-to-other-tenants" => Some(Self::available_to_other_tenants(&id())),
            "complete" => Some(Self::complete(&id())),
            "update" => Some(Self::update(&id(), &id())),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), ScenarioError> {
        if self.steps.is_empty() {
            return Err(ScenarioError::Empty(self.name.clone()));
        }
        let mut applied = false;
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                Step::Apply { .. } => applied = true,
                Step::ImportVerify { .. } if !applied => {
                    return Err(ScenarioError::ImportBeforeApply { case: self.name.clone(), step: i });
                }
                Step::ImportVerify { .. } => {}
            }
        }
        Ok(())
    }
}

/// Outcome of one step: the state it left behind (if it got that far) and
/// the first failure.
struct StepOutcome {
    state: Option<StateSnapshot>,
    error: Option<String>,
}

async fn run_apply(
    provisioner: &dyn Provisioner,
    verifier: &Verifier,
    fixture: &Fixture,
    checks: &[Check],
    previous: Option<&StateSnapshot>,
) -> StepOutcome {
    let state = match provisioner.apply(fixture).await {
        Ok(s) => s,
        Err(e) => return StepOutcome { state: None, error: Some(e.to_string()) },
    };
    let error = evaluate(verifier, &state, previous, checks)
        .await
        .err()
        .map(|e| e.to_string());
    StepOutcome { state: Some(state), error }
}

async fn run_import_verify(
    provisioner: &dyn Provisioner,
    previous: &StateSnapshot,
    address: &str,
) -> StepOutcome {
    match reimport_and_compare(provisioner, previous, address).await {
        Ok(state) => StepOutcome { state: Some(state), error: None },
        Err(e) => StepOutcome { state: None, error: Some(e) },
    }
}

async fn reimport_and_compare(
    provisioner: &dyn Provisioner,
    previous: &StateSnapshot,
    address: &str,
) -> Result<StateSnapshot, String> {
    let id = primary_id(previous, address).map_err(|e| e.to_string())?;
    let before = previous
        .resource(address)
        .map(|r| r.flat_attributes())
        .unwrap_or_default();
    let imported = provisioner
        .reimport(address, &id)
        .await
        .map_err(|e| e.to_string())?;
    let after = imported
        .resource(address)
        .ok_or_else(|| StateError::ResourceNotInState(address.to_string()).to_string())?
        .flat_attributes();

    let keys: BTreeSet<&String> = before.keys().chain(after.keys()).collect();
    for key in keys {
        if before.get(key) != after.get(key) {
            return Err(StateError::ImportMismatch {
                address: address.to_string(),
                key: key.clone(),
                before: before.get(key).cloned(),
                after: after.get(key).cloned(),
            }
            .to_string());
        }
    }
    Ok(imported)
}

/// Run `case` to completion.
///
/// Steps stop at the first failure, but destroy and the absence check always
/// run against the last state any step produced.
pub async fn run_case(
    case: &TestCase,
    provisioner: &dyn Provisioner,
    verifier: &Verifier,
) -> Result<ScenarioReport, ScenarioError> {
    case.validate()?;
    info!(case = %case.name, provisioner = provisioner.name(), "starting scenario");

    let mut report = ScenarioReport::new(&case.name, provisioner.name());
    let mut last: Option<StateSnapshot> = None;

    for (index, step) in case.steps.iter().enumerate() {
        let (kind, outcome) = match step {
            Step::Apply { fixture, checks } => (
                StepKind::Apply {
                    variant: fixture.variant.to_string(),
                    test_id: fixture.id.clone(),
                },
                run_apply(provisioner, verifier, fixture, checks, last.as_ref()).await,
            ),
            Step::ImportVerify { address } => {
                let outcome = match &last {
                    Some(prev) => run_import_verify(provisioner, prev, address).await,
                    None => StepOutcome {
                        state: None,
                        error: Some(StateError::ResourceNotInState(address.clone()).to_string()),
                    },
                };
                (StepKind::ImportVerify { address: address.clone() }, outcome)
            }
        };

        if let Some(state) = outcome.state {
            last = Some(state);
        }
        let object_id = last
            .as_ref()
            .and_then(|s| s.resource(FIXTURE_ADDRESS))
            .and_then(|r| r.id())
            .map(str::to_string);

        let failed = outcome.error.is_some();
        if let Some(e) = &outcome.error {
            warn!(case = %case.name, step = index, error = %e, "step failed");
        }
        report.steps.push(StepReport { index, kind, object_id, error: outcome.error });
        if failed {
            break;
        }
    }

    report.destroy_error = match provisioner.destroy().await {
        Err(e) => Some(e.to_string()),
        Ok(()) => match &last {
            Some(state) => check_destroy(verifier, state).await.err().map(|e| e.to_string()),
            None => None,
        },
    };
    if let Some(e) = &report.destroy_error {
        warn!(case = %case.name, error = %e, "destroy check failed");
    }

    report.finished_at = Some(Utc::now());
    info!(case = %case.name, passed = report.passed(), "scenario finished");
    Ok(report)
}
