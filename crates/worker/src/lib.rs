//! Out-of-process backstop for the pipeline stages.
//!
//! The [`poller::Poller`] counts pending work in the database on a fixed
//! interval and asks the API server to run the matching stage. The server's
//! single-flight locks make a redundant trigger harmless.

pub mod config;
pub mod poller;
