//! Per-endpoint capability negotiation with the RDMA provider.

pub mod capability;
pub mod negotiator;

pub use capability::{
    EndpointOption, GetOutcome, ProviderEndpoint, ProviderFeatures, SetOutcome,
};
pub use negotiator::EndpointNegotiator;
