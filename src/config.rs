//! Operator tunables and the environment compatibility shim.
//!
//! This module centralizes all runtime configuration: the `OFI_NCCL_`-prefixed
//! tunables the operator may set, and the [`EnvSink`] shim through which
//! computed defaults are handed to external collaborators that still read
//! process environment variables. The merge policy is uniform everywhere:
//! an explicit operator override wins, the computed default applies otherwise.

use std::collections::HashMap;
use std::str::FromStr;

use figment::{
    providers::Env,
    Figment,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::constants::defaults;
use crate::error::{PlatformError, Result};
use crate::types::Protocol;

/// Operator tunables read from `OFI_NCCL_`-prefixed environment variables.
///
/// Every field is optional; absence means "use the platform default".
/// The disable-check flags are 0/1 integers to match the transport's
/// parameter conventions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tunables {
    /// Wire protocol override ("SENDRECV" or "RDMA", case-insensitive).
    pub protocol: Option<String>,

    /// Expected internode latency override, in microseconds.
    pub net_latency: Option<f32>,

    /// Skip the GDR-required platform check when set to a non-zero value.
    pub disable_gdr_required_check: Option<u8>,

    /// Skip the native RDMA write validation when set to a non-zero value.
    pub disable_native_rdma_check: Option<u8>,

    /// Domain-per-thread policy override (0 or 1).
    pub domain_per_thread: Option<u8>,

    /// Duplicate-connection fan-out override.
    pub nic_dup_conns: Option<u32>,

    /// Eager-message threshold override, in bytes.
    pub eager_max_size: Option<u64>,
}

impl Tunables {
    /// Load tunables from the process environment.
    pub fn load() -> Result<Self> {
        Figment::new()
            .merge(Env::prefixed("OFI_NCCL_"))
            .extract()
            .map_err(|e| PlatformError::Config(format!("Failed to load tunables: {}", e)))
    }

    /// Parsed protocol override, if any.
    pub fn protocol(&self) -> Result<Option<Protocol>> {
        self.protocol
            .as_deref()
            .map(Protocol::from_str)
            .transpose()
    }

    pub fn gdr_check_disabled(&self) -> bool {
        self.disable_gdr_required_check.unwrap_or(0) != 0
    }

    pub fn native_rdma_check_disabled(&self) -> bool {
        self.disable_native_rdma_check.unwrap_or(0) != 0
    }

    /// Domain-per-thread override, when the operator set one.
    pub fn domain_per_thread(&self) -> Option<bool> {
        self.domain_per_thread.map(|v| v != 0)
    }

    /// Effective eager-message threshold.
    pub fn effective_eager_max_size(&self) -> u64 {
        self.eager_max_size.unwrap_or(defaults::EAGER_MAX_SIZE)
    }
}

/// Key-value environment consumed by external collaborators.
///
/// The transport runtime and libfabric both read configuration from process
/// environment variables; this shim is the single place the platform layer
/// writes them. Writes never overwrite an explicit operator choice, so the
/// only mutating entry point callers should reach for is
/// [`EnvSink::set_if_absent`].
pub trait EnvSink: Send + Sync {
    /// Read a variable, `None` when unset.
    fn get(&self, name: &str) -> Option<String>;

    /// Unconditionally write a variable.
    fn set(&self, name: &str, value: &str) -> Result<()>;

    /// Write a variable only when it is currently unset.
    ///
    /// Returns `true` when the write happened, `false` when an existing
    /// value was left untouched.
    fn set_if_absent(&self, name: &str, value: &str) -> Result<bool> {
        if self.get(name).is_some() {
            return Ok(false);
        }
        self.set(name, value)?;
        Ok(true)
    }
}

/// [`EnvSink`] backed by the real process environment.
#[derive(Debug, Default)]
pub struct ProcessEnv;

impl EnvSink for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        if name.is_empty() || name.contains('=') || name.contains('\0') {
            return Err(PlatformError::Environment(format!(
                "Invalid environment variable name: {:?}",
                name
            )));
        }
        std::env::set_var(name, value);
        Ok(())
    }
}

/// [`EnvSink`] backed by an in-memory map.
///
/// Used by tests and by hosts that want to stage the computed environment
/// and apply it themselves.
#[derive(Debug, Default)]
pub struct MemoryEnv {
    vars: Mutex<HashMap<String, String>>,
}

impl MemoryEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a variable, as if the operator had exported it.
    pub fn seed(&self, name: &str, value: &str) {
        self.vars.lock().insert(name.to_string(), value.to_string());
    }

    /// Snapshot of the current contents.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.vars.lock().clone()
    }
}

impl EnvSink for MemoryEnv {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.lock().get(name).cloned()
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        self.vars.lock().insert(name.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_if_absent_preserves_operator_choice() {
        let env = MemoryEnv::new();
        env.seed("NCCL_PROTO", "LL128");

        let written = env.set_if_absent("NCCL_PROTO", "simple").unwrap();
        assert!(!written);
        assert_eq!(env.get("NCCL_PROTO").as_deref(), Some("LL128"));
    }

    #[test]
    fn test_set_if_absent_writes_when_unset() {
        let env = MemoryEnv::new();
        let written = env.set_if_absent("NCCL_PROTO", "simple").unwrap();
        assert!(written);
        assert_eq!(env.get("NCCL_PROTO").as_deref(), Some("simple"));
    }

    #[test]
    fn test_tunables_default_to_unset() {
        figment::Jail::expect_with(|_jail| {
            let tunables: Tunables = Figment::new()
                .merge(Env::prefixed("OFI_NCCL_"))
                .extract()
                .unwrap();
            assert!(tunables.protocol.is_none());
            assert!(tunables.net_latency.is_none());
            assert!(!tunables.gdr_check_disabled());
            assert_eq!(
                tunables.effective_eager_max_size(),
                defaults::EAGER_MAX_SIZE
            );
            Ok(())
        });
    }

    #[test]
    fn test_tunables_from_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("OFI_NCCL_PROTOCOL", "rdma");
            jail.set_env("OFI_NCCL_NET_LATENCY", "35.0");
            jail.set_env("OFI_NCCL_DISABLE_GDR_REQUIRED_CHECK", "1");
            jail.set_env("OFI_NCCL_NIC_DUP_CONNS", "4");

            let tunables: Tunables = Figment::new()
                .merge(Env::prefixed("OFI_NCCL_"))
                .extract()
                .unwrap();
            assert_eq!(tunables.protocol().unwrap(), Some(Protocol::Rdma));
            assert_eq!(tunables.net_latency, Some(35.0));
            assert!(tunables.gdr_check_disabled());
            assert!(!tunables.native_rdma_check_disabled());
            assert_eq!(tunables.nic_dup_conns, Some(4));
            Ok(())
        });
    }

    #[test]
    fn test_invalid_protocol_rejected() {
        let tunables = Tunables {
            protocol: Some("tcp".to_string()),
            ..Tunables::default()
        };
        assert!(tunables.protocol().is_err());
    }
}
