//! BluSanta event bus and notification infrastructure.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PipelineEvent`]: the event envelope, with typed payloads in
//!   [`payloads`].
//! - [`SheetSync`]: mirrors submissions and completions into the QC sheet.
//! - [`NotificationRouter`]: sends submission receipts over WhatsApp.
//! - [`delivery`]: the WhatsApp [`Notifier`] with retry.

pub mod bus;
pub mod delivery;
pub mod payloads;
pub mod router;
pub mod sheet_sync;

pub use bus::{EventBus, PipelineEvent};
pub use delivery::whatsapp::{Notifier, TemplateIds};
pub use payloads::Recipient;
pub use router::NotificationRouter;
pub use sheet_sync::SheetSync;
