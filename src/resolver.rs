//! # Capability Resolver
//!
//! Connect to a peripheral, enumerate its characteristics, and either list
//! them all or pick one by policy.
//!
//! ## Selection Policies
//!
//! Matching is plain set membership on [`CapabilitySet`]: an endpoint
//! matches a tag when the tag is in its set. Nothing is inferred, so an
//! endpoint that only offers `write-without-response` is not a `write`
//! endpoint.
//!
//! | Policy | Picks |
//! |--------|-------|
//! | [`FirstWithCapability`] | first endpoint carrying the tag |
//! | [`Preference`] | first endpoint carrying tag 1, else tag 2, ... |
//!
//! "First" always means enumeration order.
//!
//! [`CapabilitySet`]: crate::transport::CapabilitySet

use crate::error::BlePosError;
use crate::transport::{
    Capability, EndpointDescriptor, EndpointHandle, Link, LinkGuard, PeripheralRef, RadioStack,
};

/// Chooses the endpoint a job is written to.
pub trait EndpointPolicy: Send + Sync {
    /// `None` when no endpoint qualifies.
    fn select(&self, endpoints: &[EndpointDescriptor]) -> Option<EndpointHandle>;
}

/// First endpoint, in enumeration order, whose set contains the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirstWithCapability(pub Capability);

impl Default for FirstWithCapability {
    fn default() -> Self {
        Self(Capability::Write)
    }
}

impl EndpointPolicy for FirstWithCapability {
    fn select(&self, endpoints: &[EndpointDescriptor]) -> Option<EndpointHandle> {
        endpoints
            .iter()
            .find(|e| e.capabilities.contains(self.0))
            .map(|e| e.handle)
    }
}

/// Ranked tags; each later tag is only tried when no endpoint carries the
/// earlier ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preference(pub Vec<Capability>);

impl EndpointPolicy for Preference {
    fn select(&self, endpoints: &[EndpointDescriptor]) -> Option<EndpointHandle> {
        self.0
            .iter()
            .find_map(|cap| FirstWithCapability(*cap).select(endpoints))
    }
}

/// What [`enumerate`] should do once connected.
#[derive(Clone, Copy)]
pub enum ResolveMode<'a> {
    /// Return every endpoint (diagnostics).
    List,
    /// Return the handle the policy picks.
    Find(&'a dyn EndpointPolicy),
}

/// Result of [`enumerate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Listed(Vec<EndpointDescriptor>),
    Found(EndpointHandle),
    /// The search ran and nothing matched. Not an error.
    NotFound,
}

impl Resolution {
    pub fn handle(&self) -> Option<EndpointHandle> {
        match self {
            Resolution::Found(handle) => Some(*handle),
            _ => None,
        }
    }
}

/// Connect to `peripheral`, resolve, and disconnect.
///
/// The connection is released before this returns, whether resolution
/// succeeded or not. Dropping the future mid-way also releases it.
///
/// ## Errors
///
/// - [`BlePosError::ConnectionFailed`]: the peripheral could not be reached
/// - [`BlePosError::EnumerationFailed`]: the stack failed mid-enumeration
pub async fn enumerate<R: RadioStack>(
    radio: &R,
    peripheral: &PeripheralRef,
    mode: ResolveMode<'_>,
) -> Result<Resolution, BlePosError> {
    let address = peripheral.address();
    tracing::info!(address, "connecting");
    let link = radio
        .connect(address)
        .await
        .map_err(|source| BlePosError::ConnectionFailed {
            address: address.to_string(),
            source,
        })?;
    let mut guard = LinkGuard::new(link, address);

    let outcome = match mode {
        ResolveMode::List => list_on(guard.link(), address).await.map(Resolution::Listed),
        ResolveMode::Find(policy) => find_on(guard.link(), address, policy).await.map(|found| {
            match found {
                Some(handle) => Resolution::Found(handle),
                None => Resolution::NotFound,
            }
        }),
    };

    // Disconnect errors are logged; the resolution stands on its own
    let _ = guard.release().await;
    outcome
}

/// Enumerate every endpoint on an open link, emitting each as a log event.
pub async fn list_on<L: Link>(
    link: &mut L,
    address: &str,
) -> Result<Vec<EndpointDescriptor>, BlePosError> {
    let endpoints = enumerate_on(link, address).await?;
    for endpoint in &endpoints {
        tracing::info!(
            address,
            handle = %endpoint.handle,
            label = endpoint.label.as_deref().unwrap_or(""),
            capabilities = %endpoint.capabilities,
            "endpoint"
        );
    }
    Ok(endpoints)
}

/// Apply `policy` to the endpoints of an open link.
pub async fn find_on<L: Link>(
    link: &mut L,
    address: &str,
    policy: &dyn EndpointPolicy,
) -> Result<Option<EndpointHandle>, BlePosError> {
    let endpoints = enumerate_on(link, address).await?;
    let selected = policy.select(&endpoints);
    match selected {
        Some(handle) => tracing::info!(address, %handle, "selected endpoint"),
        None => tracing::info!(address, candidates = endpoints.len(), "no endpoint matched"),
    }
    Ok(selected)
}

async fn enumerate_on<L: Link>(
    link: &mut L,
    address: &str,
) -> Result<Vec<EndpointDescriptor>, BlePosError> {
    link.enumerate_endpoints()
        .await
        .map_err(|source| BlePosError::EnumerationFailed {
            address: address.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::{Call, Fault};
    use crate::transport::MockRadio;
    use Capability::*;
    use pretty_assertions::assert_eq;

    const ADDR: &str = "AA:BB:CC:DD:EE:FF";

    fn endpoints() -> Vec<EndpointDescriptor> {
        vec![
            EndpointDescriptor::new(0, [Read]),
            EndpointDescriptor::new(1, [Write, Notify]),
            EndpointDescriptor::new(2, [Write]),
        ]
    }

    fn radio_with(endpoints: Vec<EndpointDescriptor>) -> MockRadio {
        endpoints
            .into_iter()
            .fold(MockRadio::new().with_peripheral("PT-210", ADDR), |r, e| {
                r.with_endpoint(e)
            })
    }

    #[test]
    fn test_first_match_wins() {
        let policy = FirstWithCapability(Write);
        assert_eq!(policy.select(&endpoints()), Some(EndpointHandle(1)));
    }

    #[test]
    fn test_no_match_is_none() {
        let policy = FirstWithCapability(Indicate);
        assert_eq!(policy.select(&endpoints()), None);
    }

    #[test]
    fn test_write_without_response_does_not_match_write() {
        let eps = vec![EndpointDescriptor::new(7, [WriteWithoutResponse])];
        assert_eq!(FirstWithCapability(Write).select(&eps), None);
        assert_eq!(
            FirstWithCapability(WriteWithoutResponse).select(&eps),
            Some(EndpointHandle(7))
        );
    }

    #[test]
    fn test_preference_ranks_tags_before_order() {
        let eps = vec![
            EndpointDescriptor::new(3, [WriteWithoutResponse]),
            EndpointDescriptor::new(4, [Write]),
        ];
        let policy = Preference(vec![Write, WriteWithoutResponse]);
        assert_eq!(policy.select(&eps), Some(EndpointHandle(4)));

        let policy = Preference(vec![WriteWithoutResponse, Write]);
        assert_eq!(policy.select(&eps), Some(EndpointHandle(3)));
    }

    #[test]
    fn test_preference_falls_back() {
        let eps = vec![EndpointDescriptor::new(3, [WriteWithoutResponse])];
        let policy = Preference(vec![Write, WriteWithoutResponse]);
        assert_eq!(policy.select(&eps), Some(EndpointHandle(3)));
    }

    #[tokio::test]
    async fn test_find_mode() {
        let radio = radio_with(endpoints());
        let peripheral = radio.peripheral(ADDR).unwrap();
        let policy = FirstWithCapability::default();

        let res = enumerate(&radio, &peripheral, ResolveMode::Find(&policy))
            .await
            .unwrap();
        assert_eq!(res, Resolution::Found(EndpointHandle(1)));
        assert_eq!(
            radio.calls(),
            vec![Call::Connect(ADDR.into()), Call::Enumerate, Call::Disconnect]
        );
    }

    #[tokio::test]
    async fn test_find_mode_not_found() {
        let radio = radio_with(vec![EndpointDescriptor::new(0, [Read, Notify])]);
        let peripheral = radio.peripheral(ADDR).unwrap();
        let policy = FirstWithCapability::default();

        let res = enumerate(&radio, &peripheral, ResolveMode::Find(&policy))
            .await
            .unwrap();
        assert_eq!(res, Resolution::NotFound);
        assert_eq!(res.handle(), None);
    }

    #[tokio::test]
    async fn test_list_mode() {
        let radio = radio_with(endpoints());
        let peripheral = radio.peripheral(ADDR).unwrap();
        let res = enumerate(&radio, &peripheral, ResolveMode::List).await.unwrap();
        assert_eq!(res, Resolution::Listed(endpoints()));
    }

    #[tokio::test]
    async fn test_list_mode_empty() {
        let radio = radio_with(Vec::new());
        let peripheral = radio.peripheral(ADDR).unwrap();
        let res = enumerate(&radio, &peripheral, ResolveMode::List).await.unwrap();
        assert_eq!(res, Resolution::Listed(Vec::new()));
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let radio = radio_with(endpoints()).failing(Fault::Connect);
        let peripheral = radio.peripheral(ADDR).unwrap();
        let err = enumerate(&radio, &peripheral, ResolveMode::List)
            .await
            .unwrap_err();
        assert!(matches!(err, BlePosError::ConnectionFailed { .. }));
        // Nothing to release
        assert_eq!(radio.calls(), vec![Call::Connect(ADDR.into())]);
    }

    #[tokio::test]
    async fn test_enumeration_failure_still_disconnects() {
        let radio = radio_with(endpoints()).failing(Fault::Enumerate);
        let peripheral = radio.peripheral(ADDR).unwrap();
        let policy = FirstWithCapability::default();
        let err = enumerate(&radio, &peripheral, ResolveMode::Find(&policy))
            .await
            .unwrap_err();
        assert!(matches!(err, BlePosError::EnumerationFailed { .. }));
        assert!(!err.is_soft());
        assert_eq!(radio.calls().last(), Some(&Call::Disconnect));
    }

    #[tokio::test]
    async fn test_disconnect_failure_keeps_result() {
        let radio = radio_with(endpoints()).failing(Fault::Disconnect);
        let peripheral = radio.peripheral(ADDR).unwrap();
        let res = enumerate(&radio, &peripheral, ResolveMode::List).await.unwrap();
        assert_eq!(res, Resolution::Listed(endpoints()));
    }
}
