//! Compiled-in registry of per-platform transport profiles.

use crate::types::Protocol;

/// Transport defaults for one known EC2 instance type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlatformProfile {
    /// Instance type as reported by the DMI product name.
    pub name: &'static str,
    /// Topology description file shipped for this platform, if any.
    pub topology: Option<&'static str>,
    /// Default duplicate-connection fan-out per NIC.
    pub default_dup_conns: u32,
    /// Expected internode latency in microseconds; negative means unset.
    pub latency_us: f32,
    /// Whether GPU-direct RDMA must be active on this platform.
    pub gdr_required: bool,
    /// Whether a post-receive network flush is required.
    pub net_flush_required: bool,
    /// Default wire protocol.
    pub default_protocol: Protocol,
    /// Whether the transport should create one domain per thread.
    pub domain_per_thread: bool,
}

/// Static profile table. Lookup is a linear scan by exact name; the table
/// is small and fixed, so O(n) is intentional.
pub const PLATFORM_PROFILES: &[PlatformProfile] = &[
    PlatformProfile {
        name: "p4d.24xlarge",
        topology: Some("p4d-24xl-topo.xml"),
        default_dup_conns: 0,
        latency_us: 75.0,
        gdr_required: true,
        net_flush_required: true,
        default_protocol: Protocol::SendRecv,
        domain_per_thread: false,
    },
    PlatformProfile {
        name: "p4de.24xlarge",
        topology: Some("p4de-24xl-topo.xml"),
        default_dup_conns: 0,
        latency_us: 75.0,
        gdr_required: true,
        net_flush_required: true,
        default_protocol: Protocol::SendRecv,
        domain_per_thread: false,
    },
    PlatformProfile {
        name: "p3dn.24xlarge",
        topology: None,
        default_dup_conns: 4,
        latency_us: 150.0,
        gdr_required: false,
        net_flush_required: true,
        default_protocol: Protocol::SendRecv,
        domain_per_thread: false,
    },
    PlatformProfile {
        name: "p5.48xlarge",
        topology: Some("p5.48xl-topo.xml"),
        default_dup_conns: 0,
        latency_us: 75.0,
        gdr_required: true,
        net_flush_required: false,
        default_protocol: Protocol::Rdma,
        domain_per_thread: false,
    },
    PlatformProfile {
        name: "g5.48xlarge",
        topology: Some("g5.48xl-topo.xml"),
        default_dup_conns: 0,
        latency_us: -1.0,
        gdr_required: false,
        net_flush_required: true,
        default_protocol: Protocol::SendRecv,
        domain_per_thread: false,
    },
    PlatformProfile {
        name: "trn1.32xlarge",
        topology: None,
        default_dup_conns: 0,
        latency_us: -1.0,
        gdr_required: true,
        net_flush_required: true,
        default_protocol: Protocol::SendRecv,
        domain_per_thread: true,
    },
    PlatformProfile {
        name: "trn1n.32xlarge",
        topology: None,
        default_dup_conns: 0,
        latency_us: -1.0,
        gdr_required: true,
        net_flush_required: true,
        default_protocol: Protocol::SendRecv,
        domain_per_thread: true,
    },
];

/// Look up the profile for a platform name.
///
/// An unknown platform is a valid, common state and returns `None`.
pub fn lookup(name: &str) -> Option<&'static PlatformProfile> {
    PLATFORM_PROFILES.iter().find(|p| p.name == name)
}
