//! Repository layer: one zero-sized struct per table with async methods
//! taking `&PgPool`.

pub mod assessment_repo;
pub mod response_video_repo;

pub use assessment_repo::AssessmentRepo;
pub use response_video_repo::ResponseVideoRepo;
