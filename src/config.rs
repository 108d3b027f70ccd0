//! # Run Configuration
//!
//! Explicit configuration passed into each component call. Nothing here is
//! global; `main` builds these once from the command line and hands them
//! down.
//!
//! - [`RunConfig`]: what the user asked for (scan, list, print)
//! - [`RadioConfig`]: timing and framing knobs of the btleplug stack

use std::time::Duration;

use crate::transport::EndpointHandle;

/// Default scan duration
pub const DEFAULT_SCAN_DURATION: Duration = Duration::from_secs(5);

/// Default connect / per-write timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default payload per GATT write (bytes).
///
/// Fits the ATT MTU most printers negotiate (185) minus the 3-byte header.
pub const DEFAULT_MAX_WRITE_LEN: usize = 180;

/// Delay between chunks of one frame
pub const DEFAULT_WRITE_DELAY: Duration = Duration::from_millis(2);

/// How long flushing waits for unacknowledged writes to drain
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// What one invocation should do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    pub target_device: Option<String>,
    pub endpoint_override: Option<EndpointHandle>,
    pub scan_requested: bool,
    pub list_requested: bool,
    pub query_filter: Option<String>,
}

/// The single operation a [`RunConfig`] resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing to do; show help
    Usage,
    Scan { filter: Option<String> },
    List { device: String },
    Print {
        device: String,
        endpoint: Option<EndpointHandle>,
    },
}

impl RunConfig {
    /// Build from the positional `device` argument and the two flags.
    ///
    /// With `--scan`, the device argument doubles as the search filter.
    pub fn from_args(
        device: Option<String>,
        characteristic: Option<u16>,
        scan: bool,
        list: bool,
    ) -> Self {
        let query_filter = if scan { device.clone() } else { None };
        Self {
            target_device: device,
            endpoint_override: characteristic.map(EndpointHandle),
            scan_requested: scan,
            list_requested: list,
            query_filter,
        }
    }

    /// Scan wins over list, list over print.
    pub fn action(&self) -> Action {
        if self.scan_requested {
            return Action::Scan {
                filter: self.query_filter.clone(),
            };
        }
        match &self.target_device {
            Some(device) if !device.is_empty() => {
                if self.list_requested {
                    Action::List {
                        device: device.clone(),
                    }
                } else {
                    Action::Print {
                        device: device.clone(),
                        endpoint: self.endpoint_override,
                    }
                }
            }
            _ => Action::Usage,
        }
    }
}

/// Timing and framing of the radio stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioConfig {
    /// How long a scan listens for advertisements
    pub scan_duration: Duration,
    /// Bound on connecting and on each GATT write
    pub timeout: Duration,
    /// Maximum payload per GATT write
    pub max_write_len: usize,
    /// Pause between chunks of one frame
    pub write_delay: Duration,
    /// Wait applied by `flush` after unacknowledged writes
    pub settle_delay: Duration,
    /// Which adapter to use when the host has several
    pub adapter_index: usize,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            scan_duration: DEFAULT_SCAN_DURATION,
            timeout: DEFAULT_TIMEOUT,
            max_write_len: DEFAULT_MAX_WRITE_LEN,
            write_delay: DEFAULT_WRITE_DELAY,
            settle_delay: DEFAULT_SETTLE_DELAY,
            adapter_index: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_device_no_scan_is_usage() {
        let config = RunConfig::from_args(None, None, false, false);
        assert_eq!(config.action(), Action::Usage);

        // --list alone has nothing to list
        let config = RunConfig::from_args(None, None, false, true);
        assert_eq!(config.action(), Action::Usage);
    }

    #[test]
    fn test_scan_uses_device_as_filter() {
        let config = RunConfig::from_args(Some("PT-".into()), None, true, false);
        assert_eq!(config.query_filter.as_deref(), Some("PT-"));
        assert_eq!(
            config.action(),
            Action::Scan {
                filter: Some("PT-".into())
            }
        );
    }

    #[test]
    fn test_scan_takes_priority_over_list() {
        let config = RunConfig::from_args(Some("AA".into()), None, true, true);
        assert!(matches!(config.action(), Action::Scan { .. }));
    }

    #[test]
    fn test_list_requires_device() {
        let config = RunConfig::from_args(Some("AA".into()), Some(3), false, true);
        assert_eq!(
            config.action(),
            Action::List {
                device: "AA".into()
            }
        );
    }

    #[test]
    fn test_default_action_prints() {
        let config = RunConfig::from_args(Some("AA".into()), Some(3), false, false);
        assert_eq!(
            config.action(),
            Action::Print {
                device: "AA".into(),
                endpoint: Some(EndpointHandle(3)),
            }
        );
    }

    #[test]
    fn test_radio_defaults() {
        let config = RadioConfig::default();
        assert_eq!(config.scan_duration, Duration::from_secs(5));
        assert_eq!(config.max_write_len, 180);
        assert_eq!(config.adapter_index, 0);
    }
}
