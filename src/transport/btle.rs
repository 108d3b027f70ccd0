//! # Bluetooth LE Transport
//!
//! [`RadioStack`] implementation on top of `btleplug`, which drives BlueZ on
//! Linux, CoreBluetooth on macOS and WinRT on Windows.
//!
//! ## Addresses
//!
//! Peripherals are identified by their MAC address (`AA:BB:CC:DD:EE:FF`).
//! CoreBluetooth hides MAC addresses, so on macOS the platform peripheral ID
//! (a UUID) is used instead.
//!
//! ## Endpoint Handles
//!
//! btleplug does not expose ATT attribute handles. Each link numbers the
//! characteristics it discovers from 0 upward, in the order btleplug reports
//! them (sorted by service, then characteristic UUID). The numbering is only
//! valid on the link that produced it.
//!
//! ## Chunked Writes
//!
//! A frame larger than `max_write_len` is split into chunks, with a short
//! pause between chunks so the printer's receive buffer can keep up.
//! Characteristics that support `write` get acknowledged writes; those that
//! only support `write-without-response` get unacknowledged writes, and
//! [`Link::flush`] then waits `settle_delay` for the radio queue to drain.

use async_trait::async_trait;
use btleplug::api::{
    BDAddr, Central, CharPropFlags, Characteristic, Manager as _, Peripheral as _, ScanFilter,
    WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use tokio::time::{sleep, timeout};

use super::{
    Advertisement, Capability, CapabilitySet, EndpointDescriptor, EndpointHandle, Link,
    PeripheralRef, RadioError, RadioStack,
};
use crate::config::RadioConfig;

impl From<btleplug::Error> for RadioError {
    fn from(e: btleplug::Error) -> Self {
        RadioError::Backend(e.to_string())
    }
}

/// btleplug-backed radio stack bound to one adapter.
pub struct BtleRadio {
    adapter: Adapter,
    config: RadioConfig,
}

impl BtleRadio {
    /// Open the adapter selected by `config.adapter_index`.
    ///
    /// ## Errors
    ///
    /// [`RadioError::NoAdapter`] if the Bluetooth service is not running or
    /// the host has no adapter at that index.
    pub async fn new(config: RadioConfig) -> Result<Self, RadioError> {
        let manager = Manager::new()
            .await
            .map_err(|e| RadioError::NoAdapter(e.to_string()))?;
        let adapters = manager
            .adapters()
            .await
            .map_err(|e| RadioError::NoAdapter(e.to_string()))?;
        let count = adapters.len();
        let adapter = adapters
            .into_iter()
            .nth(config.adapter_index)
            .ok_or_else(|| {
                RadioError::NoAdapter(format!(
                    "adapter #{} requested, {} available",
                    config.adapter_index, count
                ))
            })?;

        if let Ok(info) = adapter.adapter_info().await {
            tracing::debug!(adapter = %info, "using Bluetooth adapter");
        }

        Ok(Self { adapter, config })
    }

    async fn run_scan(&self) -> Result<(), RadioError> {
        tracing::debug!(duration = ?self.config.scan_duration, "scanning");
        self.adapter.start_scan(ScanFilter::default()).await?;
        sleep(self.config.scan_duration).await;
        self.adapter.stop_scan().await?;
        Ok(())
    }

    async fn lookup(&self, address: &str) -> Result<Option<Peripheral>, RadioError> {
        for peripheral in self.adapter.peripherals().await? {
            if peripheral_address(&peripheral) == address {
                return Ok(Some(peripheral));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl RadioStack for BtleRadio {
    type Link = BtleLink;

    async fn scan(&self) -> Result<Vec<PeripheralRef>, RadioError> {
        self.run_scan()
            .await
            .map_err(|e| RadioError::NoAdapter(e.to_string()))?;

        let mut found = Vec::new();
        for peripheral in self.adapter.peripherals().await? {
            let address = peripheral_address(&peripheral);
            let props = peripheral.properties().await?;
            let (name, advertisement) = match props {
                Some(props) => (
                    props.local_name.unwrap_or_default(),
                    Advertisement {
                        rssi: props.rssi,
                        manufacturer_data: props.manufacturer_data,
                        services: props.services,
                        service_data: props.service_data,
                    },
                ),
                None => (String::new(), Advertisement::default()),
            };
            found.push(PeripheralRef::new(name, address, advertisement));
        }
        Ok(found)
    }

    async fn connect(&self, address: &str) -> Result<BtleLink, RadioError> {
        // btleplug only knows peripherals it has seen advertise
        let peripheral = match self.lookup(address).await? {
            Some(p) => p,
            None => {
                self.run_scan().await?;
                self.lookup(address)
                    .await?
                    .ok_or_else(|| RadioError::NotFound(address.to_string()))?
            }
        };

        tracing::debug!(address, "connecting");
        match timeout(self.config.timeout, peripheral.connect()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                // The platform may still complete the connection later
                let _ = peripheral.disconnect().await;
                return Err(RadioError::Timeout(self.config.timeout));
            }
        }

        Ok(BtleLink {
            peripheral,
            config: self.config,
            characteristics: None,
            unacknowledged: false,
        })
    }
}

/// Open btleplug connection.
pub struct BtleLink {
    peripheral: Peripheral,
    config: RadioConfig,
    /// Discovered characteristics; index = handle
    characteristics: Option<Vec<Characteristic>>,
    unacknowledged: bool,
}

impl BtleLink {
    async fn discovered(&mut self) -> Result<&[Characteristic], RadioError> {
        if self.characteristics.is_none() {
            self.peripheral.discover_services().await?;
            let chars = self
                .peripheral
                .services()
                .into_iter()
                .flat_map(|service| service.characteristics)
                .collect();
            self.characteristics = Some(chars);
        }
        Ok(self.characteristics.as_deref().unwrap_or_default())
    }

    async fn characteristic(&mut self, handle: EndpointHandle) -> Result<Characteristic, RadioError> {
        self.discovered()
            .await?
            .get(usize::from(handle.0))
            .cloned()
            .ok_or(RadioError::UnknownHandle(handle))
    }
}

#[async_trait]
impl Link for BtleLink {
    async fn enumerate_endpoints(&mut self) -> Result<Vec<EndpointDescriptor>, RadioError> {
        let chars = self.discovered().await?;
        let mut endpoints = Vec::with_capacity(chars.len());
        for (i, c) in chars.iter().enumerate() {
            let handle = u16::try_from(i)
                .map_err(|_| RadioError::Backend("too many characteristics".into()))?;
            endpoints.push(EndpointDescriptor {
                handle: EndpointHandle(handle),
                capabilities: capabilities(c.properties),
                label: Some(c.uuid.to_string()),
                service: Some(c.service_uuid.to_string()),
            });
        }
        Ok(endpoints)
    }

    async fn write(&mut self, handle: EndpointHandle, data: &[u8]) -> Result<(), RadioError> {
        let characteristic = self.characteristic(handle).await?;
        let write_type = if characteristic.properties.contains(CharPropFlags::WRITE) {
            WriteType::WithResponse
        } else if characteristic
            .properties
            .contains(CharPropFlags::WRITE_WITHOUT_RESPONSE)
        {
            WriteType::WithoutResponse
        } else {
            return Err(RadioError::Backend(format!(
                "characteristic {} is not writable",
                characteristic.uuid
            )));
        };

        let chunk_size = self.config.max_write_len.max(1);
        let chunk_count = data.len().div_ceil(chunk_size);
        for (i, chunk) in data.chunks(chunk_size).enumerate() {
            timeout(
                self.config.timeout,
                self.peripheral.write(&characteristic, chunk, write_type),
            )
            .await
            .map_err(|_| RadioError::Timeout(self.config.timeout))??;

            if i + 1 < chunk_count && !self.config.write_delay.is_zero() {
                sleep(self.config.write_delay).await;
            }
        }

        if matches!(write_type, WriteType::WithoutResponse) {
            self.unacknowledged = true;
        }
        Ok(())
    }

    async fn flush(&mut self, handle: EndpointHandle) -> Result<(), RadioError> {
        self.characteristic(handle).await?;
        if !self.peripheral.is_connected().await? {
            return Err(RadioError::Backend("peripheral dropped the connection".into()));
        }
        // Acknowledged writes are committed once they return
        if self.unacknowledged {
            sleep(self.config.settle_delay).await;
            self.unacknowledged = false;
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), RadioError> {
        self.characteristics = None;
        self.peripheral.disconnect().await?;
        Ok(())
    }

    fn disconnect_in_background(&mut self) {
        self.characteristics = None;
        let peripheral = self.peripheral.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = peripheral.disconnect().await {
                        tracing::warn!(error = %e, "background disconnect failed");
                    }
                });
            }
            // BlueZ drops the connection once the process exits
            Err(_) => tracing::warn!("no async runtime, connection left to the platform"),
        }
    }
}

/// Address string a peripheral is known by on this platform.
fn peripheral_address(peripheral: &Peripheral) -> String {
    let address = peripheral.address();
    if address == BDAddr::default() {
        peripheral.id().to_string()
    } else {
        address.to_string()
    }
}

/// Map btleplug property flags onto capability tags.
fn capabilities(flags: CharPropFlags) -> CapabilitySet {
    const MAPPING: [(CharPropFlags, Capability); 5] = [
        (CharPropFlags::READ, Capability::Read),
        (CharPropFlags::WRITE, Capability::Write),
        (
            CharPropFlags::WRITE_WITHOUT_RESPONSE,
            Capability::WriteWithoutResponse,
        ),
        (CharPropFlags::NOTIFY, Capability::Notify),
        (CharPropFlags::INDICATE, Capability::Indicate),
    ];

    MAPPING
        .into_iter()
        .filter(|(flag, _)| flags.contains(*flag))
        .map(|(_, cap)| cap)
        .collect()
}
