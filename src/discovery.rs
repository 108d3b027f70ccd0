//! # Discovery
//!
//! Scan for nearby peripherals, optionally narrowed by a text query.
//!
//! The query matches when it is a substring of the peripheral's name **or**
//! its address. Matching is case-sensitive and does no normalization:
//! `"PT-210"` finds `"PT-210_A1B2"` but `"pt-210"` does not. An empty query
//! matches everything.

use crate::error::BlePosError;
use crate::transport::{PeripheralRef, RadioStack};

/// Scan and return every peripheral that matches `query_filter`.
///
/// Discovery never connects to anything. An empty result is not an error.
///
/// ## Errors
///
/// [`BlePosError::TransportUnavailable`] if the radio stack cannot scan; no
/// partial results are returned in that case.
pub async fn scan<R: RadioStack>(
    radio: &R,
    query_filter: Option<&str>,
) -> Result<Vec<PeripheralRef>, BlePosError> {
    let found = radio
        .scan()
        .await
        .map_err(BlePosError::TransportUnavailable)?;
    let total = found.len();

    let matches: Vec<PeripheralRef> = match query_filter {
        Some(query) => found
            .into_iter()
            .filter(|p| matches_query(p, query))
            .collect(),
        None => found,
    };

    tracing::info!(
        seen = total,
        matched = matches.len(),
        filter = query_filter.unwrap_or(""),
        "scan complete"
    );
    Ok(matches)
}

/// Case-sensitive substring match on name or address.
pub fn matches_query(peripheral: &PeripheralRef, query: &str) -> bool {
    peripheral.name().contains(query) || peripheral.address().contains(query)
}
