//! Launcher for the Java KVM viewer served by AMI-style BMC web interfaces.
//!
//! A run logs into the BMC, fetches the JViewer launch descriptor, makes
//! sure the viewer JAR is cached locally and then supervises the `java`
//! process until it exits or a shutdown signal arrives.

pub mod bmc;
pub mod config;
pub mod descriptor;
pub mod engine;
pub mod error;

pub use config::LaunchConfig;
pub use descriptor::Descriptor;
pub use engine::orchestrator::{Launcher, RunReport, RunState};
pub use error::LaunchError;
