//! # Radio Transport Layer
//!
//! This module defines the seam between the print orchestration and the
//! Bluetooth LE radio stack, plus the data model shared by both sides.
//!
//! ## Available Transports
//!
//! - [`btle`]: btleplug-backed stack (BlueZ, CoreBluetooth, WinRT)
//! - [`mock`]: in-memory stack that records every call, for tests
//!
//! ## Session Rules
//!
//! A [`Link`] is one connection to one peripheral. Endpoint handles returned
//! by [`Link::enumerate_endpoints`] are only valid on that link; never keep
//! them around after [`Link::disconnect`].

pub mod btle;
pub mod mock;

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use btle::BtleRadio;
pub use mock::{Call, MockRadio};

// ============================================================================
// ERRORS
// ============================================================================

/// Errors reported by a radio stack.
///
/// Components wrap these into stage-specific [`crate::BlePosError`] variants.
#[derive(Debug, Error)]
pub enum RadioError {
    /// No usable adapter
    #[error("no Bluetooth adapter: {0}")]
    NoAdapter(String),

    /// Address not seen in any scan
    #[error("peripheral {0} not found")]
    NotFound(String),

    /// Handle does not belong to this link
    #[error("unknown endpoint handle {0}")]
    UnknownHandle(EndpointHandle),

    /// The operation did not complete in time
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Any other backend failure
    #[error("{0}")]
    Backend(String),
}

// ============================================================================
// PERIPHERALS
// ============================================================================

/// Raw advertisement data, passed through unmodified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Advertisement {
    pub rssi: Option<i16>,
    pub manufacturer_data: HashMap<u16, Vec<u8>>,
    pub services: Vec<uuid::Uuid>,
    pub service_data: HashMap<uuid::Uuid, Vec<u8>>,
}

/// A peripheral seen during a scan.
///
/// Radio stacks construct these during a scan; everything else reads them.
#[derive(Debug, Clone, PartialEq)]
pub struct PeripheralRef {
    name: String,
    address: String,
    advertisement: Advertisement,
}

impl PeripheralRef {
    pub(crate) fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        advertisement: Advertisement,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            advertisement,
        }
    }

    /// A peripheral known only by address, e.g. one given on the command
    /// line. Stacks resolve the address themselves on connect.
    pub fn from_address(address: impl Into<String>) -> Self {
        Self::new("", address, Advertisement::default())
    }

    /// Advertised local name, empty when unknown.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Address used to reconnect.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn advertisement(&self) -> &Advertisement {
        &self.advertisement
    }
}

impl fmt::Display for PeripheralRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.name.is_empty() {
            "(unknown)"
        } else {
            &self.name
        };
        write!(f, "{}: {}", self.address, name)?;
        if let Some(rssi) = self.advertisement.rssi {
            write!(f, " (rssi {} dBm)", rssi)?;
        }
        Ok(())
    }
}

// ============================================================================
// ENDPOINTS
// ============================================================================

/// Opaque, link-scoped identifier of one characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EndpointHandle(pub u16);

impl fmt::Display for EndpointHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One GATT characteristic property.
///
/// The string tags are matched verbatim; there is no aliasing or case
/// folding, so `"Write"` does not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    Read,
    Write,
    WriteWithoutResponse,
    Notify,
    Indicate,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::Read,
        Capability::Write,
        Capability::WriteWithoutResponse,
        Capability::Notify,
        Capability::Indicate,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Capability::Read => "read",
            Capability::Write => "write",
            Capability::WriteWithoutResponse => "write-without-response",
            Capability::Notify => "notify",
            Capability::Indicate => "indicate",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|cap| cap.tag() == s)
            .ok_or_else(|| {
                let tags: Vec<&str> = Capability::ALL.iter().map(|c| c.tag()).collect();
                format!("unknown capability '{}', expected one of: {}", s, tags.join(", "))
            })
    }
}

/// Set of capabilities exposed by one endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, cap: Capability) {
        self.0.insert(cap);
    }

    /// Membership test used by every selection policy.
    pub fn contains(&self, cap: Capability) -> bool {
        self.0.contains(&cap)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<&str> = self.iter().map(Capability::tag).collect();
        write!(f, "[{}]", tags.join(", "))
    }
}

/// One characteristic discovered on a connected peripheral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub handle: EndpointHandle,
    pub capabilities: CapabilitySet,
    pub label: Option<String>,
    pub service: Option<String>,
}

impl EndpointDescriptor {
    pub fn new(handle: u16, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            handle: EndpointHandle(handle),
            capabilities: capabilities.into_iter().collect(),
            label: None,
            service: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl fmt::Display for EndpointDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>5}", self.handle.0)?;
        if let Some(label) = &self.label {
            write!(f, "  {}", label)?;
        }
        if let Some(service) = &self.service {
            write!(f, " (service {})", service)?;
        }
        write!(f, "  {}", self.capabilities)
    }
}

// ============================================================================
// RADIO SEAM
// ============================================================================

/// A Bluetooth LE central able to scan and open links.
#[async_trait]
pub trait RadioStack: Send + Sync {
    type Link: Link;

    /// Time-bounded scan. The duration is the stack's own configuration.
    async fn scan(&self) -> Result<Vec<PeripheralRef>, RadioError>;

    /// Open a link to the peripheral with this address.
    async fn connect(&self, address: &str) -> Result<Self::Link, RadioError>;
}

/// An open connection to one peripheral.
///
/// All methods take `&mut self`, so calls on one link are strictly ordered.
#[async_trait]
pub trait Link: Send {
    /// All characteristics, in the order the stack reports them.
    async fn enumerate_endpoints(&mut self) -> Result<Vec<EndpointDescriptor>, RadioError>;

    /// Send one frame. Splitting it to the link's payload limit is the
    /// link's job.
    async fn write(&mut self, handle: EndpointHandle, data: &[u8]) -> Result<(), RadioError>;

    /// Block until every byte written to `handle` has been committed.
    async fn flush(&mut self, handle: EndpointHandle) -> Result<(), RadioError>;

    /// Tear down the connection. Called exactly once per link.
    async fn disconnect(&mut self) -> Result<(), RadioError>;

    /// Start tearing the connection down without waiting for it.
    ///
    /// Called from `Drop` when an operation is cancelled with the link still
    /// open, so it must not block.
    fn disconnect_in_background(&mut self);
}

/// Disconnect a link, logging instead of failing.
///
/// Used on paths that already carry a result (or an error) of their own.
async fn release<L: Link>(link: &mut L, address: &str) -> Result<(), RadioError> {
    tracing::debug!(address, "disconnecting");
    let result = link.disconnect().await;
    if let Err(e) = &result {
        tracing::warn!(address, error = %e, "disconnect failed");
    }
    result
}

/// Owns an open link for the length of one operation.
///
/// [`LinkGuard::release`] disconnects and disarms the guard. If the guard is
/// dropped while still armed (the operation's future was cancelled), the
/// link is torn down with [`Link::disconnect_in_background`].
pub(crate) struct LinkGuard<L: Link> {
    link: L,
    address: String,
    armed: bool,
}

impl<L: Link> LinkGuard<L> {
    pub(crate) fn new(link: L, address: &str) -> Self {
        Self {
            link,
            address: address.to_string(),
            armed: true,
        }
    }

    pub(crate) fn link(&mut self) -> &mut L {
        &mut self.link
    }

    /// Disconnect, logging a failure instead of masking the caller's result.
    pub(crate) async fn release(mut self) -> Result<(), RadioError> {
        let result = release(&mut self.link, &self.address).await;
        self.armed = false;
        result
    }
}

impl<L: Link> Drop for LinkGuard<L> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!(address = %self.address, "operation cancelled, dropping connection");
            self.link.disconnect_in_background();
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_tags_round_trip() {
        for cap in Capability::ALL {
            assert_eq!(cap.tag().parse::<Capability>(), Ok(cap));
        }
    }

    #[test]
    fn test_capability_parse_is_verbatim() {
        assert!("Write".parse::<Capability>().is_err());
        assert!("write_without_response".parse::<Capability>().is_err());
        assert!(" write".parse::<Capability>().is_err());
    }

    #[test]
    fn test_capability_set_membership() {
        let caps: CapabilitySet = [Capability::Write, Capability::Notify].into_iter().collect();
        assert!(caps.contains(Capability::Write));
        assert!(caps.contains(Capability::Notify));
        assert!(!caps.contains(Capability::WriteWithoutResponse));
        assert_eq!(caps.to_string(), "[write, notify]");
    }

    #[test]
    fn test_write_without_response_is_not_write() {
        let caps: CapabilitySet = [Capability::WriteWithoutResponse].into_iter().collect();
        assert!(!caps.contains(Capability::Write));
    }

    #[test]
    fn test_peripheral_display_unknown_name() {
        let p = PeripheralRef::new("", "AA:BB:CC:DD:EE:FF", Advertisement::default());
        assert_eq!(p.to_string(), "AA:BB:CC:DD:EE:FF: (unknown)");
    }

    #[test]
    fn test_endpoint_display() {
        let e = EndpointDescriptor::new(42, [Capability::Read, Capability::Write])
            .with_label("0000ff02-0000-1000-8000-00805f9b34fb");
        assert_eq!(
            e.to_string(),
            "   42  0000ff02-0000-1000-8000-00805f9b34fb  [read, write]"
        );
    }

    #[tokio::test]
    async fn test_released_guard_disconnects_once() {
        let radio = MockRadio::new();
        let link = radio.connect("AA").await.unwrap();
        let guard = LinkGuard::new(link, "AA");
        guard.release().await.unwrap();

        assert_eq!(
            radio.calls(),
            vec![Call::Connect("AA".into()), Call::Disconnect]
        );
    }

    #[tokio::test]
    async fn test_dropped_guard_disconnects() {
        let radio = MockRadio::new();
        let link = radio.connect("AA").await.unwrap();
        drop(LinkGuard::new(link, "AA"));

        assert_eq!(radio.calls().last(), Some(&Call::Disconnect));
    }

    #[tokio::test]
    async fn test_failed_release_is_not_repeated_on_drop() {
        let radio = MockRadio::new().failing(mock::Fault::Disconnect);
        let link = radio.connect("AA").await.unwrap();
        assert!(LinkGuard::new(link, "AA").release().await.is_err());

        assert_eq!(radio.count(|c| *c == Call::Disconnect), 1);
    }
}
