//! Strong typing with newtypes for domain concepts.
//!
//! This module provides type-safe wrappers around primitive types to prevent
//! common errors and provide better API design through the type system.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::rail::VF_GROUP_COUNT;
use crate::error::PlatformError;

/// Wire protocol used by the collective transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    /// Two-sided send/receive message exchange.
    SendRecv,
    /// One-sided RDMA write transfers.
    Rdma,
}

impl Protocol {
    /// Canonical uppercase spelling used by the transport tunables.
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::SendRecv => "SENDRECV",
            Protocol::Rdma => "RDMA",
        }
    }
}

impl FromStr for Protocol {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("SENDRECV") {
            Ok(Protocol::SendRecv)
        } else if s.eq_ignore_ascii_case("RDMA") {
            Ok(Protocol::Rdma)
        } else {
            Err(PlatformError::Config(format!("Unknown protocol: {}", s)))
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Virtual-function index extracted from a NIC hardware identifier.
///
/// Identifies which of the two physical NIC groups a rail belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VfIndex(u8);

impl VfIndex {
    /// Create a new VF index with range validation.
    pub fn new(idx: u8) -> Result<Self, PlatformError> {
        if usize::from(idx) >= VF_GROUP_COUNT {
            return Err(PlatformError::RailTopology(format!(
                "Invalid vf_idx value {}",
                idx
            )));
        }
        Ok(Self(idx))
    }

    /// Get the index value.
    pub fn value(self) -> usize {
        usize::from(self.0)
    }
}

impl std::fmt::Display for VfIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "vf{}", self.0)
    }
}

/// GPU-direct RDMA support as reported by the transport runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GdrSupport {
    Supported,
    Unsupported,
}

impl GdrSupport {
    pub fn is_supported(self) -> bool {
        matches!(self, GdrSupport::Supported)
    }
}

/// Version of the libfabric library the provider was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibfabricVersion {
    pub major: u32,
    pub minor: u32,
}

impl LibfabricVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Libfabric 1.13 and later understand the provider-scoped fork-safety
    /// variable; older releases only honor the rdma-core one.
    pub fn fork_safe_env_var(self) -> &'static str {
        if self.major > 1 || (self.major == 1 && self.minor >= 13) {
            crate::constants::env::FI_EFA_FORK_SAFE
        } else {
            crate::constants::env::RDMAV_FORK_SAFE
        }
    }
}

impl std::fmt::Display for LibfabricVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
