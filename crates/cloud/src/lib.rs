//! External collaborators of the pipeline.
//!
//! Each concern is an `async_trait` seam with one HTTP implementation:
//!
//! - [`storage::ObjectStorage`] / [`storage::GcsStorage`]: object metadata,
//!   uploads and V4 signed upload URLs.
//! - [`compute::ComputeProvider`] / [`compute::GceCompute`]: stitching host
//!   power state and external address.
//! - [`tts::SpeechSynthesizer`] / [`tts::ElevenLabsClient`]: speech synthesis
//!   and remaining character quota.
//! - [`transliteration::Transliterator`] / [`transliteration::InputToolsTransliterator`]:
//!   best-effort Latin to Devanagari conversion.
//! - [`messaging::Messenger`] / [`messaging::GupshupMessenger`]: WhatsApp
//!   template notifications.
//! - [`sheet::QcSheet`] / [`sheet::GoogleSheetsClient`]: the QC tracking
//!   spreadsheet.

pub mod auth;
pub mod compute;
pub mod error;
mod http;
pub mod messaging;
pub mod sheet;
pub mod storage;
pub mod transliteration;
pub mod tts;

pub use error::{CloudError, CloudResult};
