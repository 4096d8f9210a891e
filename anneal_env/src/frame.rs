//! Framing for envelopes on a byte stream.
//!
//! # Wire Format
//!
//! ```text
//! [tag: u8][len: u32 big-endian][payload: len bytes]
//! ```

use crate::error::EnvError;
use crate::types::{Envelope, MessageTag};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Header size in bytes.
pub const HEADER_LEN: usize = 5;

/// Largest payload accepted from a peer.
pub const MAX_PAYLOAD: usize = 1 << 30;

/// Writes one envelope and flushes.
pub async fn write_frame<W>(writer: &mut W, envelope: &Envelope) -> Result<(), EnvError>
where
    W: AsyncWrite + Unpin,
{
    if envelope.payload.len() > MAX_PAYLOAD {
        return Err(EnvError::frame(format!(
            "payload of {} bytes exceeds {}",
            envelope.payload.len(),
            MAX_PAYLOAD
        )));
    }
    let len = envelope.payload.len() as u32;

    let mut header = [0u8; HEADER_LEN];
    header[0] = envelope.tag.as_byte();
    header[1..].copy_from_slice(&len.to_be_bytes());

    writer.write_all(&header).await?;
    writer.write_all(&envelope.payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one envelope.
///
/// Returns `Ok(None)` on a clean end of stream between frames.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Envelope>, EnvError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    match reader.read(&mut header[..1]).await? {
        0 => return Ok(None),
        _ => reader.read_exact(&mut header[1..]).await?,
    };

    let tag = MessageTag::from_byte(header[0])
        .ok_or_else(|| EnvError::frame(format!("unknown tag byte {}", header[0])))?;
    let len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;
    if len > MAX_PAYLOAD {
        return Err(EnvError::frame(format!("declared length {} exceeds {}", len, MAX_PAYLOAD)));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(Some(Envelope::new(tag, payload)))
}
