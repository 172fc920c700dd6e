//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured operator log via tracing)
//!     → metrics.rs (counters through the metrics facade)
//!
//! Sessions additionally produce:
//!     → keylog.rs (NSS key-log records, relayed by the acceptor)
//! ```
//!
//! # Design Decisions
//! - Verbosity is explicit configuration, not process-wide flags
//! - Key-log lines are written as secrets arrive, not batched per session
//! - No metrics exporter is installed; counters are free when nobody records them

pub mod keylog;
pub mod logging;
pub mod metrics;
