use std::time::Duration;

use crate::api::{ApiError, InputArtifact, RemixApi, with_deadline};

/// Holds the currently selected input artifact.
///
/// A failed upload leaves the previous selection untouched.
#[derive(Debug)]
pub struct UploadController {
    artifact: Option<InputArtifact>,
    request_timeout: Duration,
}

impl UploadController {
    pub fn new(request_timeout: Duration) -> Self {
        Self {
            artifact: None,
            request_timeout,
        }
    }

    pub fn artifact(&self) -> Option<&InputArtifact> {
        self.artifact.as_ref()
    }

    /// Upload `bytes` and, on success, replace the held artifact.
    pub async fn select_artifact<C: RemixApi>(
        &mut self,
        client: &C,
        bytes: Vec<u8>,
        display_name: &str,
    ) -> Result<&InputArtifact, ApiError> {
        let uploaded = with_deadline(
            self.request_timeout,
            client.upload_artifact(bytes, display_name),
        )
        .await;

        match uploaded {
            Ok(artifact) => {
                tracing::info!(
                    file_id = %artifact.artifact_id,
                    name = %artifact.display_name,
                    "Input artifact selected",
                );
                Ok(self.artifact.insert(artifact))
            }
            Err(err) => {
                tracing::warn!(
                    name = display_name,
                    error = %err,
                    kept = self.artifact.as_ref().map(|a| a.display_name.as_str()),
                    "Upload failed, keeping previous selection",
                );
                Err(err)
            }
        }
    }
}
