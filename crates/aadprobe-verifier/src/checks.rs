use aadprobe_domain::{LifecyclePhase, ObjectId, StateSnapshot, APPLICATION_RESOURCE_TYPE};
use tracing::debug;

use crate::error::StateError;
use crate::verifier::Verifier;

/// One assertion against the state produced by an apply step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    /// The resource is in state and its object exists remotely.
    Exists { address: String },
    /// Attribute equals `expected` (flattened key syntax).
    Attr { address: String, key: String, expected: String },
    /// Attribute is present and non-empty.
    AttrSet { address: String, key: String },
    /// Primary ID is the same as in the previous step's state.
    IdUnchanged { address: String },
}

impl Check {
    pub fn exists(address: &str) -> Self {
        Check::Exists { address: address.into() }
    }

    pub fn attr(address: &str, key: &str, expected: impl Into<String>) -> Self {
        Check::Attr {
            address: address.into(),
            key: key.into(),
            expected: expected.into(),
        }
    }

    pub fn attr_set(address: &str, key: &str) -> Self {
        Check::AttrSet { address: address.into(), key: key.into() }
    }

    pub fn id_unchanged(address: &str) -> Self {
        Check::IdUnchanged { address: address.into() }
    }
}

impl std::fmt::Display for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Check::Exists { address } => write!(f, "{} exists", address),
            Check::Attr { address, key, expected } => write!(f, "{}.{} = {:?}", address, key, expected),
            Check::AttrSet { address, key } => write!(f, "{}.{} is set", address, key),
            Check::IdUnchanged { address } => write!(f, "{} keeps its id", address),
        }
    }
}

/// Resolve the primary ID recorded for `address`.
pub fn primary_id(state: &StateSnapshot, address: &str) -> Result<ObjectId, StateError> {
    let rs = state
        .resource(address)
        .ok_or_else(|| StateError::ResourceNotInState(address.to_string()))?;
    ObjectId::new(rs.id().unwrap_or_default()).map_err(|source| StateError::InvalidId {
        address: address.to_string(),
        source,
    })
}

/// The resource must be in state and present in the directory.
pub async fn check_exists(
    verifier: &Verifier,
    state: &StateSnapshot,
    address: &str,
) -> Result<ObjectId, StateError> {
    let id = primary_id(state, address)?;
    verifier.verify(&id, LifecyclePhase::Created).await?;
    Ok(id)
}

/// Every application in the pre-destroy state must now be absent.
///
/// Resources of other types are skipped. The first failure is returned.
pub async fn check_destroy(verifier: &Verifier, state: &StateSnapshot) -> Result<(), StateError> {
    for rs in state.resources_of_type(APPLICATION_RESOURCE_TYPE) {
        let id = ObjectId::new(rs.id().unwrap_or_default()).map_err(|source| StateError::InvalidId {
            address: rs.address.clone(),
            source,
        })?;
        debug!(address = %rs.address, object_id = %id, "checking destroy");
        verifier.verify(&id, LifecyclePhase::Destroyed).await?;
    }
    Ok(())
}

pub fn check_attr(
    state: &StateSnapshot,
    address: &str,
    key: &str,
    expected: &str,
) -> Result<(), StateError> {
    let rs = state
        .resource(address)
        .ok_or_else(|| StateError::ResourceNotInState(address.to_string()))?;
    let actual = rs.attribute(key);
    if actual.as_deref() == Some(expected) {
        return Ok(());
    }
    Err(StateError::AttributeMismatch {
        address: address.to_string(),
        key: key.to_string(),
        expected: expected.to_string(),
        actual,
    })
}

pub fn check_attr_set(state: &StateSnapshot, address: &str, key: &str) -> Result<(), StateError> {
    let rs = state
        .resource(address)
        .ok_or_else(|| StateError::ResourceNotInState(address.to_string()))?;
    match rs.attribute(key) {
        Some(v) if !v.is_empty() => Ok(()),
        _ => Err(StateError::AttributeNotSet {
            address: address.to_string(),
            key: key.to_string(),
        }),
    }
}

/// Run `checks` in order against `state`; the first failure wins.
///
/// `previous` is the state from the preceding apply, used by
/// [`Check::IdUnchanged`].
pub async fn evaluate(
    verifier: &Verifier,
    state: &StateSnapshot,
    previous: Option<&StateSnapshot>,
    checks: &[Check],
) -> Result<(), StateError> {
    for check in checks {
        debug!(%check, "evaluating");
        match check {
            Check::Exists { address } => {
                check_exists(verifier, state, address).await?;
            }
            Check::Attr { address, key, expected } => check_attr(state, address, key, expected)?,
            Check::AttrSet { address, key } => check_attr_set(state, address, key)?,
            Check::IdUnchanged { address } => {
                let before = previous
                    .ok_or_else(|| StateError::ResourceNotInState(format!("{} (previous step)", address)))
                    .and_then(|prev| primary_id(prev, address))?;
                let after = primary_id(state, address)?;
                if before != after {
                    return Err(StateError::IdChanged {
                        address: address.clone(),
                        before: before.to_string(),
                        after: after.to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}
