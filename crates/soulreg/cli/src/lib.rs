//! Soulreg CLI - configuration, script execution and the reference walkthrough
//! behind the `soulreg` binary.

#![deny(unsafe_code)]

pub mod config;
pub mod demo;
pub mod error;
pub mod network;
pub mod script;

pub use config::RegistryConfig;
pub use error::{CliError, CliResult};
pub use network::{ContractAddresses, NetworkProfile};
pub use script::{run_script, Call, CallOutcome};
