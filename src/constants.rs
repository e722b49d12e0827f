//! Domain constants for the platform layer.
//!
//! This module contains compile-time constants used throughout the crate.
//! These are separated from runtime configuration to provide clear distinction
//! between values that never change and those that can be configured.

/// Platform identity sources exposed by the OS.
pub mod identity {
    /// First line of this file reports the EC2 instance type.
    pub const DMI_PRODUCT_NAME_PATH: &str = "/sys/devices/virtual/dmi/id/product_name";

    /// Per-device directory holding the `node_guid` attribute file.
    pub const INFINIBAND_CLASS_DIR: &str = "/sys/class/infiniband";

    /// Attribute file name carrying the NIC hardware identifier.
    pub const NODE_GUID_FILE: &str = "node_guid";
}

/// Node GUID wire format: `XXXX:XXXX:XXXX:XXXX`, a colon-delimited 64-bit
/// hex token whose lowest byte encodes the virtual-function index.
pub mod guid {
    /// Total length of a well-formed GUID string.
    pub const GUID_LEN: usize = 19;

    /// Byte offset of the colon preceding the final hex group.
    pub const LAST_COLON_OFFSET: usize = 14;

    /// Byte offset of the two trailing digits holding the VF index.
    pub const VF_DIGITS_OFFSET: usize = 17;
}

/// Rail topology constants.
pub mod rail {
    /// Number of physical NIC groups rails alternate between.
    pub const VF_GROUP_COUNT: usize = 2;
}

/// Libfabric provider constants.
pub mod provider {
    /// Provider this layer targets; anything else short-circuits negotiation.
    pub const TARGET_PROVIDER: &str = "efa";

    /// Endpoint option names as declared by the EFA provider.
    pub const OPT_EMULATED_WRITE: &str = "FI_OPT_EFA_EMULATED_WRITE";
    pub const OPT_SENDRECV_IN_ORDER: &str = "FI_OPT_EFA_SENDRECV_IN_ORDER_ALIGNED_128_BYTES";
    pub const OPT_WRITE_IN_ORDER: &str = "FI_OPT_EFA_WRITE_IN_ORDER_ALIGNED_128_BYTES";
    pub const OPT_MAX_MSG_SIZE: &str = "FI_OPT_MAX_MSG_SIZE";
}

/// Environment variables consumed by external collaborators. Writes through
/// the env shim are how computed defaults reach them.
pub mod env {
    /// Provider filter consumed by libfabric.
    pub const FI_PROVIDER: &str = "FI_PROVIDER";

    /// Fork-safety flag understood by libfabric >= 1.13.
    pub const FI_EFA_FORK_SAFE: &str = "FI_EFA_FORK_SAFE";

    /// Fork-safety flag understood by legacy rdma-core via older libfabric.
    pub const RDMAV_FORK_SAFE: &str = "RDMAV_FORK_SAFE";

    /// High-level protocol mode of the collective runtime.
    pub const NCCL_PROTO: &str = "NCCL_PROTO";

    /// Topology description file consumed by the collective runtime.
    pub const NCCL_TOPO_FILE: &str = "NCCL_TOPO_FILE";

    /// Post-receive network flush control.
    pub const NCCL_NET_FORCE_FLUSH: &str = "NCCL_NET_FORCE_FLUSH";

    /// NVLink Switch topology discovery control.
    pub const NCCL_NVLS_ENABLE: &str = "NCCL_NVLS_ENABLE";

    /// Chunk-size tunables for the NVLink Switch algorithms.
    pub const NCCL_NVLS_CHUNKSIZE: &str = "NCCL_NVLS_CHUNKSIZE";
    pub const NCCL_NVLSTREE_MAX_CHUNKSIZE: &str = "NCCL_NVLSTREE_MAX_CHUNKSIZE";
}

/// Computed defaults applied when the operator has not chosen otherwise.
pub mod defaults {
    /// Historical default internode latency for EFA, in microseconds.
    pub const NET_LATENCY_US: f32 = 150.0;

    /// Default eager-message threshold in bytes.
    pub const EAGER_MAX_SIZE: u64 = 8192;

    /// Conservative high-level protocol mode used when byte ordering is
    /// not guaranteed by the provider.
    pub const CONSERVATIVE_PROTO_MODE: &str = "simple";

    /// NVLS chunk size recovering the pre-regression transfer granularity.
    pub const NVLS_CHUNK_SIZE: u64 = 524288;

    /// Collective runtime versions below 2.18.5 have a known defect with
    /// NVLink Switch discovery on EFA platforms.
    pub const MIN_NVLS_RUNTIME_VERSION: u32 = 21805;

    /// Installation directory holding the per-platform topology files.
    pub const TOPOLOGY_DIR: &str = "/opt/efa-platform-adapter/share/topology";
}

/// Wire message extents feeding the max-message-size negotiation.
pub mod msg {
    /// Size of the transport's RDMA control message.
    pub const RDMA_CTRL_MSG_SIZE: u64 = 64;

    /// Size of the connection-establishment metadata message.
    pub const RDMA_CONN_INFO_SIZE: u64 = 512;
}
