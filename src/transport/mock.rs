//! # Mock Radio
//!
//! An in-memory [`RadioStack`] for tests. Every call made through it (and
//! through the links it opens) is appended to a shared, ordered call log, so
//! tests can assert on what was sent and in which order.
//!
//! ```
//! use blepos::transport::{Capability, EndpointDescriptor, MockRadio};
//!
//! let radio = MockRadio::new()
//!     .with_peripheral("PT-210", "AA:BB:CC:DD:EE:FF")
//!     .with_endpoint(EndpointDescriptor::new(5, [Capability::Write]));
//!
//! assert!(radio.calls().is_empty());
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use super::{
    Advertisement, EndpointDescriptor, EndpointHandle, Link, PeripheralRef, RadioError,
    RadioStack,
};

/// One recorded radio call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Scan,
    Connect(String),
    Enumerate,
    Write { handle: EndpointHandle, data: Vec<u8> },
    Flush(EndpointHandle),
    Disconnect,
}

/// Where the mock should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Scan,
    Connect,
    Enumerate,
    /// Fail the write with this zero-based index (counted per link).
    Write { at: usize },
    /// Never complete the write with this index.
    StallWrite { at: usize },
    Flush,
    Disconnect,
}

/// Scripted radio stack. Clones share the call log.
#[derive(Debug, Clone, Default)]
pub struct MockRadio {
    peripherals: Vec<PeripheralRef>,
    endpoints: Vec<EndpointDescriptor>,
    faults: Vec<Fault>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl MockRadio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peripheral to every scan result.
    pub fn with_peripheral(mut self, name: &str, address: &str) -> Self {
        self.peripherals
            .push(PeripheralRef::new(name, address, Advertisement::default()));
        self
    }

    /// Add an endpoint to every enumeration, in insertion order.
    pub fn with_endpoint(mut self, endpoint: EndpointDescriptor) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    pub fn failing(mut self, fault: Fault) -> Self {
        self.faults.push(fault);
        self
    }

    /// The peripheral registered under `address`, as a scan would report it.
    pub fn peripheral(&self, address: &str) -> Option<PeripheralRef> {
        self.peripherals
            .iter()
            .find(|p| p.address() == address)
            .cloned()
    }

    /// Snapshot of the call log.
    pub fn calls(&self) -> Vec<Call> {
        self.log().clone()
    }

    /// Payloads of every write, in order.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.log()
            .iter()
            .filter_map(|call| match call {
                Call::Write { data, .. } => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.log().iter().filter(|call| pred(call)).count()
    }

    fn log(&self) -> std::sync::MutexGuard<'_, Vec<Call>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: Call) {
        self.log().push(call);
    }

    fn faulty(&self, fault: Fault) -> bool {
        self.faults.contains(&fault)
    }
}

#[async_trait]
impl RadioStack for MockRadio {
    type Link = MockLink;

    async fn scan(&self) -> Result<Vec<PeripheralRef>, RadioError> {
        self.record(Call::Scan);
        if self.faulty(Fault::Scan) {
            return Err(RadioError::NoAdapter("mock adapter powered off".into()));
        }
        Ok(self.peripherals.clone())
    }

    async fn connect(&self, address: &str) -> Result<MockLink, RadioError> {
        self.record(Call::Connect(address.to_string()));
        if self.faulty(Fault::Connect) {
            return Err(RadioError::NotFound(address.to_string()));
        }
        Ok(MockLink {
            radio: self.clone(),
            writes: 0,
        })
    }
}

/// Link opened by [`MockRadio`].
#[derive(Debug)]
pub struct MockLink {
    radio: MockRadio,
    writes: usize,
}

impl MockLink {
    fn check_handle(&self, handle: EndpointHandle) -> Result<(), RadioError> {
        if self.radio.endpoints.iter().any(|e| e.handle == handle) {
            Ok(())
        } else {
            Err(RadioError::UnknownHandle(handle))
        }
    }
}

#[async_trait]
impl Link for MockLink {
    async fn enumerate_endpoints(&mut self) -> Result<Vec<EndpointDescriptor>, RadioError> {
        self.radio.record(Call::Enumerate);
        if self.radio.faulty(Fault::Enumerate) {
            return Err(RadioError::Backend("service discovery aborted".into()));
        }
        Ok(self.radio.endpoints.clone())
    }

    async fn write(&mut self, handle: EndpointHandle, data: &[u8]) -> Result<(), RadioError> {
        self.radio.record(Call::Write {
            handle,
            data: data.to_vec(),
        });
        let index = self.writes;
        self.writes += 1;
        if self.radio.faulty(Fault::StallWrite { at: index }) {
            std::future::pending::<()>().await;
        }
        if self.radio.faulty(Fault::Write { at: index }) {
            return Err(RadioError::Backend("link supervision timeout".into()));
        }
        self.check_handle(handle)
    }

    async fn flush(&mut self, handle: EndpointHandle) -> Result<(), RadioError> {
        self.radio.record(Call::Flush(handle));
        if self.radio.faulty(Fault::Flush) {
            return Err(RadioError::Backend("flush rejected".into()));
        }
        self.check_handle(handle)
    }

    async fn disconnect(&mut self) -> Result<(), RadioError> {
        self.radio.record(Call::Disconnect);
        if self.radio.faulty(Fault::Disconnect) {
            return Err(RadioError::Backend("already gone".into()));
        }
        Ok(())
    }

    fn disconnect_in_background(&mut self) {
        self.radio.record(Call::Disconnect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Capability;

    #[tokio::test]
    async fn test_clones_share_call_log() {
        let radio = MockRadio::new().with_endpoint(EndpointDescriptor::new(1, [Capability::Write]));
        let clone = radio.clone();

        let mut link = clone.connect("AA").await.unwrap();
        link.write(EndpointHandle(1), b"hi").await.unwrap();
        link.disconnect().await.unwrap();

        assert_eq!(
            radio.calls(),
            vec![
                Call::Connect("AA".into()),
                Call::Write {
                    handle: EndpointHandle(1),
                    data: b"hi".to_vec()
                },
                Call::Disconnect,
            ]
        );
    }

    #[tokio::test]
    async fn test_write_fault_is_indexed() {
        let radio = MockRadio::new()
            .with_endpoint(EndpointDescriptor::new(1, [Capability::Write]))
            .failing(Fault::Write { at: 1 });
        let mut link = radio.connect("AA").await.unwrap();

        assert!(link.write(EndpointHandle(1), b"a").await.is_ok());
        assert!(link.write(EndpointHandle(1), b"b").await.is_err());
        assert!(link.write(EndpointHandle(1), b"c").await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_handle_is_rejected() {
        let radio = MockRadio::new();
        let mut link = radio.connect("AA").await.unwrap();
        let err = link.write(EndpointHandle(9), b"x").await.unwrap_err();
        assert!(matches!(err, RadioError::UnknownHandle(EndpointHandle(9))));
    }
}
