//! The `efa_platform_adapter` core library.
//!
//! This crate is the platform-adaptation layer that sits beneath an
//! RDMA-backed GPU collective transport. It identifies the EC2 platform the
//! process runs on, derives platform-specific transport defaults, negotiates
//! byte-delivery-ordering and message-size capabilities with the libfabric
//! provider on a per-endpoint basis, and sorts discovered multi-rail network
//! interfaces into canonical logical slots.

pub mod config;
pub mod constants;
pub mod endpoint;
pub mod error;
pub mod platform;
pub mod rail;
pub mod sysfs;
pub mod types;
