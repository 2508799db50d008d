use std::sync::Arc;

use aadprobe_client::{ClientError, DirectoryClient};
use aadprobe_domain::{Application, LifecyclePhase, ObjectId};
use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::error::VerificationError;

/// Classification of one read probe against the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    Found(Box<Application>),
    ConfirmedAbsent,
    TransientError(#[serde(serialize_with = "display")] ClientError),
    UnexpectedError(#[serde(serialize_with = "display")] ClientError),
}

fn display<S: Serializer>(err: &ClientError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(err)
}

impl Outcome {
    pub fn from_result(result: Result<Application, ClientError>) -> Self {
        match result {
            Ok(app) => Outcome::Found(Box::new(app)),
            Err(e) if e.is_not_found() => Outcome::ConfirmedAbsent,
            Err(e) if e.is_transient() => Outcome::TransientError(e),
            Err(e) => Outcome::UnexpectedError(e),
        }
    }

    /// Created/Updated need `Found`; Destroyed needs `ConfirmedAbsent`.
    pub fn satisfies(&self, phase: LifecyclePhase) -> bool {
        match self {
            Outcome::Found(_) => phase.expects_presence(),
            Outcome::ConfirmedAbsent => !phase.expects_presence(),
            Outcome::TransientError(_) | Outcome::UnexpectedError(_) => false,
        }
    }

    /// Turn this outcome into the verdict for `phase`.
    pub fn into_verdict(self, id: &ObjectId, phase: LifecyclePhase) -> Result<(), VerificationError> {
        if self.satisfies(phase) {
            return Ok(());
        }
        let id = id.clone();
        Err(match self {
            Outcome::Found(payload) => VerificationError::ResourceStillExists { id, payload },
            Outcome::ConfirmedAbsent => VerificationError::ResourceMissing { id },
            Outcome::TransientError(source) | Outcome::UnexpectedError(source) => {
                VerificationError::Unexpected { id, source }
            }
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Found(_) => "found",
            Outcome::ConfirmedAbsent => "confirmed_absent",
            Outcome::TransientError(_) => "transient_error",
            Outcome::UnexpectedError(_) => "unexpected_error",
        }
    }
}

/// Confirms that a remote application object matches an expected lifecycle
/// phase. Stateless per call; clones share the underlying client.
#[derive(Clone)]
pub struct Verifier {
    client: Arc<dyn DirectoryClient>,
}

impl Verifier {
    pub fn new(client: Arc<dyn DirectoryClient>) -> Self {
        Self { client }
    }

    /// Probe the directory once and classify the response.
    pub async fn classify(&self, id: &ObjectId) -> Outcome {
        let outcome = Outcome::from_result(self.client.get_application(id).await);
        debug!(object_id = %id, client = self.client.name(), outcome = outcome.label(), "probed directory");
        outcome
    }

    /// Succeeds iff the object's presence matches `phase`. Never retries.
    pub async fn verify(&self, id: &ObjectId, phase: LifecyclePhase) -> Result<(), VerificationError> {
        let verdict = self.classify(id).await.into_verdict(id, phase);
        match &verdict {
            Ok(()) => info!(object_id = %id, %phase, "verified"),
            Err(e) => warn!(object_id = %id, %phase, error = %e, "verification failed"),
        }
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aadprobe_client::InMemoryDirectory;

    const ALL_PHASES: [LifecyclePhase; 3] = [
        LifecyclePhase::Created,
        LifecyclePhase::Updated,
        LifecyclePhase::Destroyed,
    ];

    fn app(name: &str) -> Application {
        Application {
            object_id: String::new(),
            app_id: String::new(),
            display_name: name.into(),
            homepage: Some(format!("https://{}", name)),
            identifier_uris: vec![],
            reply_urls: vec![],
            available_to_other_tenants: false,
            oauth2_allow_implicit_flow: false,
        }
    }

    fn setup() -> (InMemoryDirectory, Verifier) {
        let dir = InMemoryDirectory::new();
        let verifier = Verifier::new(Arc::new(dir.clone()));
        (dir, verifier)
    }

    async fn create(dir: &InMemoryDirectory, name: &str) -> ObjectId {
        let created = dir.create(app(name)).await;
        ObjectId::new(created.object_id).unwrap()
    }

    #[tokio::test]
    async fn never_provisioned_is_confirmed_absent() {
        let (_dir, v) = setup();
        let id = ObjectId::new("00000000-0000-0000-0000-000000000000").unwrap();
        assert_eq!(v.classify(&id).await, Outcome::ConfirmedAbsent);
        v.verify(&id, LifecyclePhase::Destroyed).await.unwrap();
    }

    #[tokio::test]
    async fn just_created_is_found() {
        let (dir, v) = setup();
        let id = create(&dir, "acctest1").await;

        v.verify(&id, LifecyclePhase::Created).await.unwrap();
        v.verify(&id, LifecyclePhase::Updated).await.unwrap();
        match v.verify(&id, LifecyclePhase::Destroyed).await {
            Err(VerificationError::ResourceStillExists { id: got, payload }) => {
                assert_eq!(got, id);
                assert_eq!(payload.display_name, "acctest1");
            }
            other => panic!("expected ResourceStillExists, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn still_exists_error_carries_full_payload() {
        let (dir, v) = setup();
        let id = create(&dir, "acctest-diag").await;
        let err = v.verify(&id, LifecyclePhase::Destroyed).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("still exists"), "got: {}", msg);
        assert!(msg.contains("acctest-diag"), "got: {}", msg);
        assert!(msg.contains("https://acctest-diag"), "got: {}", msg);
    }

    #[tokio::test]
    async fn after_destroy_is_missing() {
        let (dir, v) = setup();
        let id = create(&dir, "acctest1").await;
        dir.delete(&id).await.unwrap();

        v.verify(&id, LifecyclePhase::Destroyed).await.unwrap();
        assert!(matches!(
            v.verify(&id, LifecyclePhase::Created).await,
            Err(VerificationError::ResourceMissing { .. })
        ));
    }

    #[tokio::test]
    async fn server_error_is_never_confirmed_absent() {
        let (dir, v) = setup();
        let id = ObjectId::new("whatever").unwrap();

        for phase in ALL_PHASES {
            dir.fail_next(ClientError::from_status(500, "GET: status 500")).await;
            match v.verify(&id, phase).await {
                Err(VerificationError::Unexpected { source, .. }) => {
                    assert!(!source.is_not_found());
                }
                other => panic!("phase {}: expected Unexpected, got {:?}", phase, other),
            }
        }

        dir.fail_next(ClientError::from_status(500, "GET: status 500")).await;
        assert!(matches!(v.classify(&id).await, Outcome::UnexpectedError(_)));
    }

    #[tokio::test]
    async fn transient_error_fails_without_retry() {
        let (dir, v) = setup();
        let id = create(&dir, "acctest1").await;

        dir.fail_next(ClientError::from_status(503, "unavailable")).await;
        assert!(matches!(
            v.verify(&id, LifecyclePhase::Created).await,
            Err(VerificationError::Unexpected { source: ClientError::Transient(_), .. })
        ));
        // The injected failure was consumed by exactly one probe.
        v.verify(&id, LifecyclePhase::Created).await.unwrap();
    }

    #[test]
    fn outcome_phase_matrix() {
        let found = Outcome::Found(Box::new(app("x")));
        let absent = Outcome::ConfirmedAbsent;
        let transient = Outcome::TransientError(ClientError::Transient("t".into()));
        let unexpected = Outcome::UnexpectedError(ClientError::Other("u".into()));

        for phase in ALL_PHASES {
            assert_eq!(found.satisfies(phase), phase != LifecyclePhase::Destroyed);
            assert_eq!(absent.satisfies(phase), phase == LifecyclePhase::Destroyed);
            assert!(!transient.satisfies(phase));
            assert!(!unexpected.satisfies(phase));
        }
    }

    #[test]
    fn verdicts_follow_the_phase_matrix() {
        let id = ObjectId::new("id").unwrap();

        for phase in ALL_PHASES {
            let found = Outcome::Found(Box::new(app("x"))).into_verdict(&id, phase);
            if phase.expects_presence() {
                found.unwrap();
            } else {
                assert!(matches!(found, Err(VerificationError::ResourceStillExists { .. })));
            }

            let absent = Outcome::ConfirmedAbsent.into_verdict(&id, phase);
            if phase.expects_presence() {
                assert!(matches!(absent, Err(VerificationError::ResourceMissing { .. })));
            } else {
                absent.unwrap();
            }

            let transient = Outcome::TransientError(ClientError::Transient("t".into()));
            assert!(matches!(
                transient.into_verdict(&id, phase),
                Err(VerificationError::Unexpected { source: ClientError::Transient(_), .. })
            ));
        }
    }

    #[test]
    fn outcome_serializes_error_text() {
        let json = serde_json::to_value(Outcome::UnexpectedError(ClientError::Other("boom".into()))).unwrap();
        assert_eq!(json["outcome"], "unexpected_error");
        assert_eq!(json["detail"], "directory error: boom");
        let json = serde_json::to_value(Outcome::ConfirmedAbsent).unwrap();
        assert_eq!(json["outcome"], "confirmed_absent");
    }

    #[tokio::test]
    async fn concurrent_verifications_are_independent() {
        let (dir, v) = setup();
        let a = create(&dir, "acctest-a").await;
        let b = create(&dir, "acctest-b").await;
        dir.delete(&b).await.unwrap();

        let (ra, rb) = tokio::join!(
            v.verify(&a, LifecyclePhase::Created),
            v.verify(&b, LifecyclePhase::Destroyed),
        );
        ra.unwrap();
        rb.unwrap();
    }
}
