//! Capability-query interface to a provider endpoint.
//!
//! The transport below owns the actual libfabric calls; this layer only
//! consumes a narrow get/set surface. Hard failures carry the provider
//! error code; "unsupported" is an expected outcome, not an error.

use crate::constants::provider;
use crate::error::Result;

/// Endpoint options this layer negotiates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointOption {
    /// Whether RDMA writes are emulated rather than native.
    EmulatedWrite,
    /// 128-byte-aligned in-order delivery for the send/receive protocol.
    SendRecvInOrder,
    /// 128-byte-aligned in-order delivery for the RDMA write protocol.
    WriteInOrder,
    /// Maximum message size accepted by the endpoint.
    MaxMsgSize,
}

impl EndpointOption {
    /// Option name as declared by the provider headers.
    pub fn name(self) -> &'static str {
        match self {
            EndpointOption::EmulatedWrite => provider::OPT_EMULATED_WRITE,
            EndpointOption::SendRecvInOrder => provider::OPT_SENDRECV_IN_ORDER,
            EndpointOption::WriteInOrder => provider::OPT_WRITE_IN_ORDER,
            EndpointOption::MaxMsgSize => provider::OPT_MAX_MSG_SIZE,
        }
    }
}

impl std::fmt::Display for EndpointOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Outcome of a capability query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetOutcome {
    Value(bool),
    /// The provider does not support this option.
    Unsupported,
}

/// Outcome of a capability set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Applied,
    /// The provider does not support this option.
    Unsupported,
}

/// A NIC endpoint as seen through the provider's option interface.
///
/// Implemented by the transport layer over the real libfabric endpoint.
/// Methods return `Err` only for hard failures of the call itself.
pub trait ProviderEndpoint {
    /// Provider name backing this endpoint (e.g. "efa").
    fn provider(&self) -> &str;

    fn get_bool_option(&self, option: EndpointOption) -> Result<GetOutcome>;

    fn set_bool_option(&self, option: EndpointOption, value: bool) -> Result<SetOutcome>;

    fn set_size_option(&self, option: EndpointOption, value: u64) -> Result<SetOutcome>;
}

/// Which endpoint options were declared by the provider headers at
/// configure time.
///
/// This is the build-time probing result handed in by the host; an
/// undeclared option can never be queried, whatever the runtime provider
/// would say.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderFeatures {
    pub emulated_write: bool,
    pub sendrecv_in_order: bool,
    pub write_in_order: bool,
    pub max_msg_size: bool,
}

impl ProviderFeatures {
    /// All options declared, the common case on current providers.
    pub const fn all() -> Self {
        Self {
            emulated_write: true,
            sendrecv_in_order: true,
            write_in_order: true,
            max_msg_size: true,
        }
    }

    /// No options declared, matching a legacy provider build.
    pub const fn none() -> Self {
        Self {
            emulated_write: false,
            sendrecv_in_order: false,
            write_in_order: false,
            max_msg_size: false,
        }
    }
}

impl Default for ProviderFeatures {
    fn default() -> Self {
        Self::all()
    }
}
