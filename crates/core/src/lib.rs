//! Pure domain logic for the BluSanta personalized-video pipeline.
//!
//! Nothing in this crate performs I/O. Stage orchestration lives in
//! `blusanta-pipeline`; persistence in `blusanta-db`.

pub mod error;
pub mod language;
pub mod pipeline_events;
pub mod pronunciation;
pub mod qc;
pub mod storage_paths;
pub mod submission;
pub mod timestamps;
pub mod types;
