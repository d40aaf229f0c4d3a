pub mod database;
pub mod document;
pub mod pdf;
pub mod spreadsheet;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::models::NewSubmission;

/// What a sink produced. Only the document sink yields an artifact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SinkOutcome {
    pub artifact: Option<PathBuf>,
}

#[derive(Debug)]
pub struct SinkError {
    pub message: String,
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<String> for SinkError {
    fn from(s: String) -> Self {
        SinkError { message: s }
    }
}

impl From<anyhow::Error> for SinkError {
    fn from(err: anyhow::Error) -> Self {
        // Alternate formatting keeps the context chain.
        SinkError {
            message: format!("{err:#}"),
        }
    }
}

impl From<sqlx::Error> for SinkError {
    fn from(err: sqlx::Error) -> Self {
        SinkError {
            message: err.to_string(),
        }
    }
}

#[async_trait]
pub trait SubmissionSink: Send + Sync {
    fn id(&self) -> &str;
    async fn store(&self, submission: &NewSubmission) -> Result<SinkOutcome, SinkError>;
}

/// Result of fanning one submission out to every sink.
#[derive(Debug, Default)]
pub struct FanOut {
    pub stored: Vec<String>,
    pub failed: Vec<String>,
    pub artifact: Option<PathBuf>,
}

/// Sinks in registration order. Each one runs independently of the others.
pub struct SinkRegistry {
    sinks: Vec<Arc<dyn SubmissionSink>>,
}

impl SinkRegistry {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn register(&mut self, sink: Arc<dyn SubmissionSink>) {
        self.sinks.push(sink);
    }

    pub fn ids(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.id()).collect()
    }

    /// Run every sink in order. Failures are logged and do not stop later sinks.
    pub async fn store_all(&self, submission: &NewSubmission) -> FanOut {
        let mut fan_out = FanOut::default();

        for sink in &self.sinks {
            match sink.store(submission).await {
                Ok(outcome) => {
                    tracing::info!("Saved to {}: {}", sink.id(), submission.name);
                    if outcome.artifact.is_some() {
                        fan_out.artifact = outcome.artifact;
                    }
                    fan_out.stored.push(sink.id().to_string());
                }
                Err(e) => {
                    tracing::error!("{} error for {}: {e}", sink.id(), submission.name);
                    fan_out.failed.push(sink.id().to_string());
                }
            }
        }

        fan_out
    }
}

impl Default for SinkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recording {
        id: &'static str,
        fail: bool,
        artifact: Option<&'static str>,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl SubmissionSink for Recording {
        fn id(&self) -> &str {
            self.id
        }

        async fn store(&self, _submission: &NewSubmission) -> Result<SinkOutcome, SinkError> {
            self.log.lock().unwrap().push(self.id);
            if self.fail {
                return Err(SinkError::from(format!("{} is down", self.id)));
            }
            Ok(SinkOutcome {
                artifact: self.artifact.map(PathBuf::from),
            })
        }
    }

    fn submission() -> NewSubmission {
        NewSubmission {
            name: "Jane".to_string(),
            contact: "jane@example.com".to_string(),
            age: 40,
        }
    }

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn registry(setup: &[(&'static str, bool, Option<&'static str>)]) -> (SinkRegistry, Log) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = SinkRegistry::new();
        for (id, fail, artifact) in setup {
            registry.register(Arc::new(Recording {
                id: *id,
                fail: *fail,
                artifact: *artifact,
                log: log.clone(),
            }));
        }
        (registry, log)
    }

    #[tokio::test]
    async fn runs_sinks_in_registration_order() {
        let (registry, log) = registry(&[("a", false, None), ("b", false, None), ("c", false, None)]);

        let fan_out = registry.store_all(&submission()).await;

        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(fan_out.stored, vec!["a", "b", "c"]);
        assert!(fan_out.failed.is_empty());
        assert_eq!(registry.ids(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn failure_does_not_stop_later_sinks() {
        let (registry, log) = registry(&[
            ("a", true, None),
            ("b", false, None),
            ("c", false, Some("out/doc.pdf")),
        ]);

        let fan_out = registry.store_all(&submission()).await;

        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(fan_out.failed, vec!["a"]);
        assert_eq!(fan_out.stored, vec!["b", "c"]);
        assert_eq!(fan_out.artifact, Some(PathBuf::from("out/doc.pdf")));
    }

    #[tokio::test]
    async fn failed_artifact_sink_leaves_no_artifact() {
        let (registry, _) = registry(&[("a", false, None), ("doc", true, Some("never.pdf"))]);

        let fan_out = registry.store_all(&submission()).await;

        assert!(fan_out.artifact.is_none());
    }

    #[test]
    fn anyhow_errors_keep_context() {
        let err = anyhow::anyhow!("disk full").context("Failed to write workbook");
        let sink_err = SinkError::from(err);
        assert_eq!(sink_err.to_string(), "Failed to write workbook: disk full");
    }
}
