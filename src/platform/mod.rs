//! Platform identification and platform-specific transport defaults.
//!
//! This module resolves the EC2 instance type the process runs on, maps it
//! to a compiled-in profile of transport defaults, and applies those
//! defaults at process start.

pub mod detector;
pub mod init;
pub mod profile;

pub use detector::{DetectedPlatform, PlatformDetector};
pub use init::{
    initialize_platform, PlatformSettings, RuntimeVersionSource, UnprobedRuntime,
};
pub use profile::{lookup, PlatformProfile, PLATFORM_PROFILES};
