//! # ddns-sync
//!
//! A Dynamic DNS updater that verifies convergence: an update only counts as
//! successful once the provider reports the record holding the requested IP.
//!
//! ## Features
//!
//! - Uniform update contract across unrelated provider APIs
//! - Providers: DonDominio, Aliyun
//! - Eager credential validation, before any network activity
//! - IPv4/IPv6 dual stack, selected by the address value itself
//! - Automatic public IP detection with fallback services
//! - Daemon mode with configurable check interval
//!
//! ## Usage
//!
//! ```bash
//! # Show configured providers and the detected public IP
//! ddns-sync status
//!
//! # Update all providers once
//! ddns-sync update
//!
//! # Run as daemon
//! ddns-sync daemon
//!
//! # Validate configuration
//! ddns-sync validate
//! ```

pub mod config;
pub mod detector;
pub mod error;
pub mod ipversion;
pub mod providers;

pub use config::Config;
pub use detector::IpDetector;
pub use error::{DdnsError, Result, UpdateError, ValidationError};
pub use ipversion::IpVersion;
pub use providers::{create_provider, Provider, ProviderKind};
