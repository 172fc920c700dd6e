//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → cli.rs (command-line flags override file values)
//!     → validation.rs (semantic checks, all errors at once)
//!     → ServerConfig (validated, immutable)
//!     → handed explicitly to startup, acceptor and ECH setup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once validated
//! - All fields have defaults to allow running with no flags at all
//! - Validation separates syntactic (serde/clap) from semantic checks
//! - Nothing here touches the network

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::ClientAuthMode;
pub use schema::EchSettings;
pub use schema::ListenerConfig;
pub use schema::ServerConfig;
pub use schema::TlsSettings;
