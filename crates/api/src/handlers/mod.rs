pub mod admin;
pub mod assessments;
pub mod generation;
pub mod qc;
pub mod storage;
