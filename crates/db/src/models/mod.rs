pub mod assessment;
pub mod response_video;
pub mod status;
