//! Routes user intents to the upload, parameter and job controllers.
//!
//! The session is what a front end talks to: it never mutates the job record
//! itself, it only reads snapshots from [`JobLifecycleManager`].

use std::sync::Arc;

use crate::api::{InputArtifact, RemixApi};
use crate::error::NrxError;
use crate::lifecycle::{JobLifecycleManager, LifecycleSettings, SubmitOutcome};
use crate::params::ParameterState;
use crate::upload::UploadController;

pub struct RemixSession<C> {
    client: Arc<C>,
    upload: UploadController,
    params: ParameterState,
    jobs: JobLifecycleManager<C>,
}

impl<C: RemixApi + 'static> RemixSession<C> {
    pub fn new(client: Arc<C>, settings: LifecycleSettings) -> Self {
        Self {
            upload: UploadController::new(settings.request_timeout),
            params: ParameterState::default(),
            jobs: JobLifecycleManager::new(Arc::clone(&client), settings),
            client,
        }
    }

    pub fn params(&self) -> &ParameterState {
        &self.params
    }

    pub fn jobs(&self) -> &JobLifecycleManager<C> {
        &self.jobs
    }

    pub fn load_catalog(&mut self, styles: Vec<String>) {
        tracing::debug!(count = styles.len(), "Style catalog loaded");
        self.params.set_catalog(styles);
    }

    /// Upload a new input file. On success any previous job is discarded.
    pub async fn select_artifact(
        &mut self,
        bytes: Vec<u8>,
        display_name: &str,
    ) -> Result<InputArtifact, NrxError> {
        let artifact = self
            .upload
            .select_artifact(self.client.as_ref(), bytes, display_name)
            .await?
            .clone();
        self.jobs.reset().await;
        Ok(artifact)
    }

    pub fn set_energy(&mut self, value: f64) -> f64 {
        self.params.set_energy(value)
    }

    pub fn set_brightness(&mut self, value: f64) -> f64 {
        self.params.set_brightness(value)
    }

    pub fn set_style(&mut self, style: &str) -> Result<(), NrxError> {
        self.params.set_style(style)
    }

    /// Build a request from the current selection and hand it to the job manager.
    pub async fn submit(&mut self) -> Result<SubmitOutcome, NrxError> {
        let artifact = self.upload.artifact().ok_or(NrxError::NoArtifact)?;
        let request = self.params.build_request(artifact)?;
        Ok(self.jobs.submit(request).await)
    }

    pub async fn shutdown(self) {
        self.jobs.shutdown().await;
    }
}
