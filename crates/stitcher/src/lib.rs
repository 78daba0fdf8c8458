//! Client side of the remote video-stitching hosts.
//!
//! - [`api`]: REST client for a single host (`/status`, `/stitching`).
//! - [`host`]: the [`host::StitchHost`] seam the dispatch loop talks to.
//! - [`payload`]: the job description submitted per assessment.

pub mod api;
pub mod host;
pub mod payload;

pub use api::{HostStatus, StitcherApi, StitcherApiError};
pub use host::{HttpStitchHost, StitchHost};
pub use payload::{CompletionData, StitchJobInputs, StitchingJobPayload, TemplateAssets};
