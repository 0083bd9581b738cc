//! Post-processing actions attached to submissions
//!
//! Actions are write-only: the client serializes them into the request body
//! and never interprets their execution.

use serde::Serialize;
use std::fmt;

/// Post-processing instruction executed by the service
///
/// Serialized with a `type` discriminator followed by the fields that kind
/// needs.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Action {
    /// Upload each result to an S3-compatible bucket
    #[serde(rename = "upload_s3")]
    UploadS3 {
        /// Key prefix inside the bucket
        path: String,
        access_key_id: String,
        secret_access_key: String,
        bucket: String,
        /// Custom endpoint for non-AWS providers
        #[serde(skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
    },
}

impl Action {
    /// Discriminator value sent to the API
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UploadS3 { .. } => "upload_s3",
        }
    }
}

// Keeps credentials out of logs
impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UploadS3 {
                path,
                access_key_id,
                bucket,
                endpoint,
                ..
            } => f
                .debug_struct("UploadS3")
                .field("path", path)
                .field("access_key_id", access_key_id)
                .field("secret_access_key", &"<redacted>")
                .field("bucket", bucket)
                .field("endpoint", endpoint)
                .finish(),
        }
    }
}
