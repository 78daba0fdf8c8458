//! Event type names published on the pipeline event bus.

/// An assessment was created or resubmitted.
pub const EVENT_SUBMITTED: &str = "assessment.submitted";

/// A submission was rejected before it reached the store.
pub const EVENT_UPLOAD_REJECTED: &str = "assessment.upload_rejected";

/// The stitching host reported a finished video.
pub const EVENT_STITCH_COMPLETED: &str = "assessment.stitch_completed";

/// A reviewer or admin sent the assessment back through the stages.
pub const EVENT_REGENERATED: &str = "assessment.regenerated";

/// A reviewer approved the final video.
pub const EVENT_QC_APPROVED: &str = "assessment.qc_approved";

/// A reviewer asked the employee to upload new videos.
pub const EVENT_REUPLOAD_REQUESTED: &str = "assessment.reupload_requested";
