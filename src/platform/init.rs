//! Process-start application of platform defaults.
//!
//! Mirrors the transport's init sequence: select the provider filter,
//! hand collaborator defaults to the environment (set-if-absent only), and
//! merge operator overrides with profile defaults into the settings every
//! later endpoint consults.

use std::path::PathBuf;

use tracing::{debug, info};

use super::detector::PlatformDetector;
use crate::config::{EnvSink, Tunables};
use crate::constants::{defaults, env as env_vars, provider};
use crate::error::Result;
use crate::types::{LibfabricVersion, Protocol};

/// Version of the collective runtime this process is linked against,
/// when it can be determined at all.
///
/// Resolved once at startup by the host; `None` means the runtime does not
/// export a version symbol and version-gated workarounds are skipped.
pub trait RuntimeVersionSource {
    fn runtime_version(&self) -> Option<u32>;
}

/// Source for hosts that do not probe the runtime version.
#[derive(Debug, Default)]
pub struct UnprobedRuntime;

impl RuntimeVersionSource for UnprobedRuntime {
    fn runtime_version(&self) -> Option<u32> {
        None
    }
}

/// Merged, process-wide transport settings produced by
/// [`initialize_platform`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformSettings {
    /// Provider filter to hand to libfabric, when this layer selected one.
    pub provider_filter: Option<&'static str>,
    /// Wire protocol every endpoint will be configured for.
    pub selected_protocol: Protocol,
    /// Expected internode latency in microseconds.
    pub net_latency_us: f32,
    /// Duplicate-connection fan-out per NIC.
    pub nic_dup_conns: u32,
    /// Whether the transport creates one domain per thread.
    pub domain_per_thread: bool,
    /// Topology description file handed to the collective runtime, if any.
    pub topology_file: Option<PathBuf>,
}

/// Apply platform-specific defaults at process start.
///
/// Reads the detected platform profile, writes collaborator environment
/// defaults through the shim (never overwriting an operator choice), and
/// returns the merged settings. Explicit env writes that fail are errors;
/// an unknown platform is not.
pub fn initialize_platform(
    detector: &PlatformDetector,
    tunables: &Tunables,
    env: &dyn EnvSink,
    libfabric: LibfabricVersion,
    runtime: &dyn RuntimeVersionSource,
) -> Result<PlatformSettings> {
    info!("Configuring platform-specific options");

    let detected = detector.detect();
    let profile = detected.profile;

    // Force the EFA provider when the operator did not pick one. On
    // platforms without EFA NICs this falls back to the runtime's internal
    // transport, which is the behavior we want.
    let mut select_efa = false;
    let provider_filter = match env.get(env_vars::FI_PROVIDER) {
        None => {
            info!("Setting provider filter to {}", provider::TARGET_PROVIDER);
            select_efa = true;
            Some(provider::TARGET_PROVIDER)
        }
        Some(p) if p == provider::TARGET_PROVIDER => {
            select_efa = true;
            None
        }
        Some(_) => None,
    };

    // Legacy rdma-core needs userspace fork handling; new kernels and
    // rdma-core releases ignore the flag, so it is safe to always request.
    let fork_safe_var = libfabric.fork_safe_env_var();
    if env.set_if_absent(fork_safe_var, "1")? {
        info!("Setting {} environment variable to 1", fork_safe_var);
    }

    configure_nvls_option(env, runtime)?;

    // Platforms that do not require a post-receive flush get it disabled,
    // since older runtimes force it on regardless of GPU generation.
    if let Some(profile) = profile {
        if !profile.net_flush_required
            && env.set_if_absent(env_vars::NCCL_NET_FORCE_FLUSH, "0")?
        {
            info!("Setting {}=0", env_vars::NCCL_NET_FORCE_FLUSH);
        }
    }

    // Chunk sizes for the NVLink Switch algorithms. The tree chunk size can
    // not exceed the base chunk size, so both are pinned together.
    let chunk = defaults::NVLS_CHUNK_SIZE.to_string();
    for var in [
        env_vars::NCCL_NVLSTREE_MAX_CHUNKSIZE,
        env_vars::NCCL_NVLS_CHUNKSIZE,
    ] {
        if env.set_if_absent(var, &chunk)? {
            info!("Setting {} to {}", var, chunk);
        }
    }

    let topology_file = configure_topology_file(env, detected.name(), profile)?;

    let nic_dup_conns = tunables
        .nic_dup_conns
        .or(profile.map(|p| p.default_dup_conns))
        .unwrap_or(0);

    let net_latency_us = match tunables.net_latency {
        Some(latency) => latency,
        None => {
            let latency = match profile {
                Some(p) if p.latency_us >= 0.0 => p.latency_us,
                // For historical reasons, the default for EFA is 150 us.
                _ => defaults::NET_LATENCY_US,
            };
            info!("Internode latency set at {:.1} us", latency);
            latency
        }
    };

    let selected_protocol = match tunables.protocol()? {
        Some(protocol) => protocol,
        None => match profile {
            Some(p) if select_efa => p.default_protocol,
            _ => Protocol::SendRecv,
        },
    };

    let domain_per_thread = tunables
        .domain_per_thread()
        .or(profile.map(|p| p.domain_per_thread))
        .unwrap_or(false);
    info!(
        "Creating one domain per {}",
        if domain_per_thread { "thread" } else { "process" }
    );

    Ok(PlatformSettings {
        provider_filter,
        selected_protocol,
        net_latency_us,
        nic_dup_conns,
        domain_per_thread,
        topology_file,
    })
}

/// Disable NVLink Switch topology discovery for runtime versions with the
/// known EFA defect, fixed in 2.18.5.
fn configure_nvls_option(env: &dyn EnvSink, runtime: &dyn RuntimeVersionSource) -> Result<()> {
    if env.get(env_vars::NCCL_NVLS_ENABLE).is_some() {
        return Ok(());
    }

    match runtime.runtime_version() {
        None => {
            debug!("Runtime version unavailable; skipping NVLS version check");
        }
        Some(version) if version < defaults::MIN_NVLS_RUNTIME_VERSION => {
            info!("Disabling NVLS support due to runtime version {}", version);
            env.set_if_absent(env_vars::NCCL_NVLS_ENABLE, "0")?;
        }
        Some(version) => {
            debug!("Not disabling NVLS support for runtime version {}", version);
        }
    }

    Ok(())
}

fn configure_topology_file(
    env: &dyn EnvSink,
    platform_name: Option<&str>,
    profile: Option<&'static super::profile::PlatformProfile>,
) -> Result<Option<PathBuf>> {
    if let Some(existing) = env.get(env_vars::NCCL_TOPO_FILE) {
        info!(
            "{} already set to {}",
            env_vars::NCCL_TOPO_FILE,
            existing
        );
        return Ok(None);
    }

    let Some(topology) = profile.and_then(|p| p.topology) else {
        return Ok(None);
    };

    let path = PathBuf::from(defaults::TOPOLOGY_DIR).join(topology);
    info!(
        "Running on {} platform, setting {} to {}",
        platform_name.unwrap_or("unknown"),
        env_vars::NCCL_TOPO_FILE,
        path.display()
    );
    env.set_if_absent(env_vars::NCCL_TOPO_FILE, &path.display().to_string())?;

    Ok(Some(path))
}
