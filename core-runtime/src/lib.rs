//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the mirroring crates:
//! - Logging and tracing setup
//! - Export configuration
//! - Event bus for run progress
//!
//! ## Overview
//!
//! Nothing in here knows about notes. `core-sync` consumes the
//! [`ExportConfig`](config::ExportConfig) and publishes
//! [`SyncEvent`](events::SyncEvent)s; hosts call
//! [`init_logging`](logging::init_logging) once at startup.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{ExportConfig, ExportConfigBuilder};
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, SyncEvent};
