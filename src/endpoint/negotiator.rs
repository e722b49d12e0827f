//! Per-endpoint protocol and ordering negotiation.
//!
//! The first endpoint configured in the process establishes whether byte
//! delivery ordering is required; every later endpoint must match that
//! decision or fail. Divergence would leave some peers assuming in-order
//! delivery while others reorder, which corrupts data silently, so the
//! whole negotiation sequence runs under one process-wide mutex.

use parking_lot::Mutex;
use tracing::{info, trace, warn};

use super::capability::{
    EndpointOption, GetOutcome, ProviderEndpoint, ProviderFeatures, SetOutcome,
};
use crate::config::{EnvSink, Tunables};
use crate::constants::{defaults, env as env_vars, msg, provider};
use crate::error::{PlatformError, Result};
use crate::platform::{DetectedPlatform, PlatformProfile, PlatformSettings};
use crate::types::{GdrSupport, Protocol};

/// The EFA provider on this instance type can deliver an RDMA write payload
/// twice, so it does not report the write-in-order option even though
/// writes are never segmented and buffer reuse stays safe. Ordering checks
/// are skipped for exactly this platform/protocol pair; the send/receive
/// protocol still has segmentation constraints and is not exempt.
const ORDERING_EXEMPT_PLATFORM: &str = "p5.48xlarge";

/// Process-wide ordering decision, first endpoint wins.
#[derive(Debug, Default)]
struct NegotiationState {
    configured: bool,
    ordering_required: bool,
}

/// Applies protocol selection, write-semantics validation, ordering
/// negotiation, and message-size tuning to every endpoint the transport
/// creates.
pub struct EndpointNegotiator {
    platform_name: Option<String>,
    profile: Option<&'static PlatformProfile>,
    protocol: Protocol,
    gdr: GdrSupport,
    features: ProviderFeatures,
    gdr_check_disabled: bool,
    native_rdma_check_disabled: bool,
    eager_max_size: u64,
    state: Mutex<NegotiationState>,
}

impl EndpointNegotiator {
    pub fn new(
        detected: &DetectedPlatform,
        settings: &PlatformSettings,
        tunables: &Tunables,
        gdr: GdrSupport,
        features: ProviderFeatures,
    ) -> Self {
        Self {
            platform_name: detected.raw_name.clone(),
            profile: detected.profile,
            protocol: settings.selected_protocol,
            gdr,
            features,
            gdr_check_disabled: tunables.gdr_check_disabled(),
            native_rdma_check_disabled: tunables.native_rdma_check_disabled(),
            eager_max_size: tunables.effective_eager_max_size(),
            state: Mutex::new(NegotiationState::default()),
        }
    }

    /// Configure a newly created endpoint.
    ///
    /// Endpoints from providers other than the targeted one succeed
    /// immediately without any capability call.
    pub fn configure_endpoint(
        &self,
        endpoint: &dyn ProviderEndpoint,
        env: &dyn EnvSink,
    ) -> Result<()> {
        if endpoint.provider() != provider::TARGET_PROVIDER {
            return Ok(());
        }

        // The ordering decision must be made consistently even when
        // endpoints are configured concurrently at process start, so the
        // whole sequence serializes on the state lock.
        let mut state = self.state.lock();

        self.check_gdr_requirement()?;

        if self.protocol == Protocol::Rdma && !self.native_rdma_check_disabled {
            self.validate_native_write(endpoint)?;
        }

        self.negotiate_ordering(endpoint, env, &mut state)?;

        if self.protocol == Protocol::Rdma {
            self.configure_max_msg_size(endpoint)?;
        }

        Ok(())
    }

    /// Platforms marked GDR-required must not run without GPU-direct RDMA.
    fn check_gdr_requirement(&self) -> Result<()> {
        if self.gdr_check_disabled {
            return Ok(());
        }

        if let Some(profile) = self.profile {
            if profile.gdr_required && !self.gdr.is_supported() {
                return Err(PlatformError::Config(format!(
                    "GDR disabled on GDR-required instance type {}",
                    profile.name
                )));
            }
        }

        Ok(())
    }

    /// Verify the hardware performs RDMA writes natively rather than
    /// silently emulating them over a slower path.
    fn validate_native_write(&self, endpoint: &dyn ProviderEndpoint) -> Result<()> {
        let option = EndpointOption::EmulatedWrite;

        if !self.features.emulated_write {
            return Err(PlatformError::Config(format!(
                "{} not declared while the communication protocol is RDMA write",
                option
            )));
        }

        match endpoint.get_bool_option(option)? {
            GetOutcome::Value(true) => Err(PlatformError::Config(format!(
                "{} is true while the communication protocol is RDMA write",
                option
            ))),
            GetOutcome::Value(false) => {
                trace!("Endpoint option {} is false", option);
                Ok(())
            }
            GetOutcome::Unsupported => Err(PlatformError::Config(format!(
                "Couldn't query {}",
                option
            ))),
        }
    }

    /// Ordering option for the selected protocol, `None` when the provider
    /// build never declared it.
    fn ordering_option(&self) -> Option<EndpointOption> {
        match self.protocol {
            Protocol::SendRecv => self
                .features
                .sendrecv_in_order
                .then_some(EndpointOption::SendRecvInOrder),
            Protocol::Rdma => self
                .features
                .write_in_order
                .then_some(EndpointOption::WriteInOrder),
        }
    }

    fn ordering_exempt(&self, env: &dyn EnvSink) -> bool {
        env.get(env_vars::NCCL_PROTO).is_none()
            && self.protocol == Protocol::Rdma
            && self.platform_name.as_deref() == Some(ORDERING_EXEMPT_PLATFORM)
    }

    fn negotiate_ordering(
        &self,
        endpoint: &dyn ProviderEndpoint,
        env: &dyn EnvSink,
        state: &mut NegotiationState,
    ) -> Result<()> {
        if !state.configured && self.ordering_exempt(env) {
            info!(
                "Skipping ordering checks on {} + {}",
                ORDERING_EXEMPT_PLATFORM,
                Protocol::Rdma
            );
            state.ordering_required = false;
            state.configured = true;
        }

        // Ordering only matters on the first endpoint (which sets the
        // policy) and afterwards only if that policy requires it.
        if state.configured && !state.ordering_required {
            return Ok(());
        }

        let have_ordering = match self.ordering_option() {
            Some(option) => match endpoint.set_bool_option(option, true)? {
                SetOutcome::Applied => {
                    trace!("Endpoint option {} enabled", option);
                    true
                }
                SetOutcome::Unsupported => {
                    info!("Setting {} not supported", option);
                    false
                }
            },
            None => false,
        };

        if state.configured && state.ordering_required && !have_ordering {
            return Err(PlatformError::OrderingViolation(format!(
                "Ordering unavailable on endpoint after being established for {}",
                self.protocol
            )));
        }

        if !state.configured {
            state.ordering_required = have_ordering;
            state.configured = true;

            if !have_ordering {
                self.force_conservative_proto(env)?;
            }
        }

        Ok(())
    }

    /// Without in-order delivery the runtime must stay on its conservative
    /// protocol mode; an operator who forced a faster mode gets a warning.
    fn force_conservative_proto(&self, env: &dyn EnvSink) -> Result<()> {
        if env.set_if_absent(env_vars::NCCL_PROTO, defaults::CONSERVATIVE_PROTO_MODE)? {
            info!(
                "Setting {} to \"{}\"",
                env_vars::NCCL_PROTO,
                defaults::CONSERVATIVE_PROTO_MODE
            );
        } else if let Some(mode) = env.get(env_vars::NCCL_PROTO) {
            if !mode.eq_ignore_ascii_case(defaults::CONSERVATIVE_PROTO_MODE) {
                warn!(
                    "{} is set to \"{}\", but the endpoint does not support \
                     128 byte in-order aligned stores; this endpoint may \
                     corrupt data during communication",
                    env_vars::NCCL_PROTO,
                    mode
                );
            }
        }

        Ok(())
    }

    /// Raise the endpoint's maximum message size so every message the
    /// transport sends eagerly stays on the zero-copy path. Best-effort:
    /// "unsupported" is success.
    fn configure_max_msg_size(&self, endpoint: &dyn ProviderEndpoint) -> Result<()> {
        if !self.features.max_msg_size {
            return Ok(());
        }

        let optval = msg::RDMA_CTRL_MSG_SIZE
            .max(self.eager_max_size)
            .max(msg::RDMA_CONN_INFO_SIZE);

        match endpoint.set_size_option(EndpointOption::MaxMsgSize, optval)? {
            SetOutcome::Applied => {
                trace!("Endpoint option {} set to {}", EndpointOption::MaxMsgSize, optval);
            }
            SetOutcome::Unsupported => {
                info!("Setting {} not supported", EndpointOption::MaxMsgSize);
            }
        }

        Ok(())
    }
}
