//! # Transmission
//!
//! Deliver one print job to one peripheral over one connection.
//!
//! ```text
//! connect ──► [find endpoint] ──► write frames ──► finalize ──► disconnect
//!                  │                   │               │
//!                  └─ NoWritable ──────┴── failure ────┴──► disconnect ──► Err
//! ```
//!
//! When no endpoint handle is given, the search runs on the same link that
//! then carries the job. The link is released on every path before
//! [`transmit`] returns, and also when the future is dropped before
//! completing (a caller's timeout, `select!`, Ctrl-C).
//!
//! Transmission is not idempotent: calling it twice prints twice.

use crate::codec::PrintCodec;
use crate::error::BlePosError;
use crate::job::PrintJob;
use crate::resolver::{self, EndpointPolicy};
use crate::transport::{EndpointHandle, Link, LinkGuard, PeripheralRef, RadioStack};

/// Summary of a completed transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transmission {
    /// Endpoint the job was written to
    pub endpoint: EndpointHandle,
    /// Frames written, trailer excluded
    pub frames: usize,
    /// Bytes written, trailer included
    pub bytes: usize,
}

/// Encode `job`, connect to `peripheral`, and write the job to `endpoint`
/// (or to the endpoint `policy` picks), then finalize and disconnect.
///
/// ## Errors
///
/// - [`BlePosError::InvalidJob`]: encoding failed; nothing was connected
/// - [`BlePosError::ConnectionFailed`]
/// - [`BlePosError::EnumerationFailed`] / [`BlePosError::NoWritableEndpoint`]:
///   only when `endpoint` is `None`; zero writes were issued
/// - [`BlePosError::WriteFailed`]: carries how much was sent before the fault
/// - [`BlePosError::FinalizeFailed`]
pub async fn transmit<R, C>(
    radio: &R,
    codec: &C,
    peripheral: &PeripheralRef,
    endpoint: Option<EndpointHandle>,
    job: &PrintJob,
    policy: &dyn EndpointPolicy,
) -> Result<Transmission, BlePosError>
where
    R: RadioStack,
    C: PrintCodec + ?Sized,
{
    let encoded = codec.encode(job)?;
    let trailer = codec.trailer();
    let address = peripheral.address();

    tracing::info!(address, frames = encoded.frames.len(), bytes = encoded.len(), "connecting");
    let link = radio
        .connect(address)
        .await
        .map_err(|source| BlePosError::ConnectionFailed {
            address: address.to_string(),
            source,
        })?;
    let mut guard = LinkGuard::new(link, address);

    let outcome = deliver(guard.link(), address, endpoint, policy, &encoded.frames, &trailer).await;

    // Output may already have reached the printer; a failed disconnect is only logged
    let _ = guard.release().await;
    if let Ok(sent) = &outcome {
        tracing::info!(address, endpoint = %sent.endpoint, bytes = sent.bytes, "transmission complete");
    }
    outcome
}

async fn deliver<L: Link>(
    link: &mut L,
    address: &str,
    endpoint: Option<EndpointHandle>,
    policy: &dyn EndpointPolicy,
    frames: &[Vec<u8>],
    trailer: &[u8],
) -> Result<Transmission, BlePosError> {
    let handle = match endpoint {
        Some(handle) => handle,
        None => resolver::find_on(link, address, policy)
            .await?
            .ok_or_else(|| BlePosError::NoWritableEndpoint {
                address: address.to_string(),
            })?,
    };

    let mut bytes_sent = 0;
    for (frames_sent, frame) in frames.iter().enumerate() {
        tracing::debug!(%handle, frame = frames_sent, len = frame.len(), "write");
        link.write(handle, frame)
            .await
            .map_err(|source| BlePosError::WriteFailed {
                handle,
                frames_sent,
                bytes_sent,
                source,
            })?;
        bytes_sent += frame.len();
    }

    tracing::debug!(%handle, trailer = trailer.len(), "finalize");
    if !trailer.is_empty() {
        link.write(handle, trailer)
            .await
            .map_err(|source| BlePosError::FinalizeFailed { handle, source })?;
        bytes_sent += trailer.len();
    }
    link.flush(handle)
        .await
        .map_err(|source| BlePosError::FinalizeFailed { handle, source })?;

    Ok(Transmission {
        endpoint: handle,
        frames: frames.len(),
        bytes: bytes_sent,
    })
}
