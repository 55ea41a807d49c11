//! Output publication to a Kubernetes Secret
//!
//! The target secret must already exist; its whole payload is replaced
//! with the collected outputs. This runs after apply/destroy, so a
//! failure here means infrastructure already changed and only the
//! publication needs remediation.

use crate::error::{RunnerError, RunnerResult};
use crate::terraform::options::OutputSet;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::{Api, PostParams};
use kube::Client;
use std::collections::BTreeMap;
use tracing::info;

/// Store that can overwrite the payload of one pre-existing secret
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn replace_payload(&self, outputs: &OutputSet) -> RunnerResult<()>;
}

/// Secret store backed by the Kubernetes API
pub struct KubeSecretStore {
    api: Api<Secret>,
    namespace: String,
    name: String,
}

impl KubeSecretStore {
    /// Target the named secret in the given namespace
    pub fn new(client: Client, namespace: &str, name: &str) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    fn publish_error(&self, reason: impl Into<String>) -> RunnerError {
        RunnerError::Publish {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn replace_payload(&self, outputs: &OutputSet) -> RunnerResult<()> {
        let mut secret = self.api.get(&self.name).await.map_err(|e| match e {
            kube::Error::Api(ref response) if response.code == 404 => RunnerError::SecretMissing {
                namespace: self.namespace.clone(),
                name: self.name.clone(),
            },
            other => self.publish_error(other.to_string()),
        })?;

        let data: BTreeMap<String, ByteString> = outputs
            .iter()
            .map(|(name, payload)| (name.clone(), ByteString(payload.clone())))
            .collect();

        // Full overwrite, not a merge
        secret.data = Some(data);
        secret.string_data = None;

        self.api
            .replace(&self.name, &PostParams::default(), &secret)
            .await
            .map_err(|e| self.publish_error(e.to_string()))?;

        Ok(())
    }
}

/// Publish collected outputs, skipping the store entirely when there are
/// none. Returns whether a publish happened.
pub async fn publish_outputs(store: &dyn SecretStore, outputs: &OutputSet) -> RunnerResult<bool> {
    if outputs.is_empty() {
        info!("no outputs were found in module");
        return Ok(false);
    }

    store.replace_payload(outputs).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeStore {
        payloads: Mutex<Vec<OutputSet>>,
        missing: bool,
    }

    #[async_trait]
    impl SecretStore for FakeStore {
        async fn replace_payload(&self, outputs: &OutputSet) -> RunnerResult<()> {
            if self.missing {
                return Err(RunnerError::SecretMissing {
                    namespace: "default".to_string(),
                    name: "outputs".to_string(),
                });
            }
            self.payloads.lock().unwrap().push(outputs.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn empty_outputs_skip_the_store() {
        let store = FakeStore::default();
        let published = publish_outputs(&store, &OutputSet::new()).await.unwrap();

        assert!(!published);
        assert!(store.payloads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn outputs_published_exactly_once() {
        let store = FakeStore::default();
        let mut outputs = OutputSet::new();
        outputs.insert("result".to_string(), b"\"xyz\"".to_vec());

        let published = publish_outputs(&store, &outputs).await.unwrap();

        assert!(published);
        let payloads = store.payloads.lock().unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0]["result"], b"\"xyz\"");
    }

    #[tokio::test]
    async fn missing_secret_surfaces_distinctly() {
        let store = FakeStore {
            missing: true,
            ..FakeStore::default()
        };
        let mut outputs = OutputSet::new();
        outputs.insert("result".to_string(), b"\"xyz\"".to_vec());

        let err = publish_outputs(&store, &outputs).await.unwrap_err();
        assert!(matches!(err, RunnerError::SecretMissing { .. }));
        assert!(err.infrastructure_mutated());
    }
}
