pub mod client;
pub mod error;
pub mod types;

pub use client::{DEFAULT_API_URL, HttpRemixClient, RemixApi, with_deadline};
pub use error::ApiError;
pub use types::{InputArtifact, JobStatusResponse, RemixRequest, RemoteStatus, ResultLocator};
