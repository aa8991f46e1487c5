// ============================================
// File: crates/cryptoserve-core/src/protocol/codec.rs
// ============================================
//! # Frame Codec
//!
//! ## Creation Reason
//! Provides binary serialization and deserialization for frames,
//! shared by the session channel and by test peers.
//!
//! ## Main Functionality
//! - `Codec` trait: Generic encode/decode interface
//! - `FrameCodec`: Implementation for `Header` and `Frame`
//! - `encode` / `decode_header` / `decode_frame` convenience functions
//!
//! ## Wire Format
//! Multi-byte integers are big-endian.
//!
//! ## Parsing Strategy
//! 1. Check that a full header is available
//! 2. Read both flag bytes, then the length
//! 3. Check that the declared payload is available
//!
//! ## ⚠️ Important Note for Next Developer
//! - Always validate buffer lengths before reading
//! - Encoding checks the payload size; never truncate silently
//!
//! ## Last Modified
//! v0.1.0 - Initial codec implementation

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{CoreError, Result};
use crate::protocol::frame::{Frame, Header, ServerFlags, HEADER_SIZE, MAX_PAYLOAD_SIZE};

// ============================================
// Codec Trait
// ============================================

/// Trait for encoding and decoding protocol values.
///
/// # Type Parameters
/// * `T` - The value type to encode/decode
pub trait Codec<T> {
    /// Encodes a value into a byte buffer.
    ///
    /// # Errors
    /// Returns an error if the value cannot be represented on the wire.
    fn encode(&self, msg: &T, buf: &mut BytesMut) -> Result<()>;

    /// Decodes a value from bytes, consuming what it reads.
    ///
    /// # Errors
    /// Returns an error if the buffer is too short.
    fn decode(&self, buf: &mut Bytes) -> Result<T>;
}

// ============================================
// FrameCodec
// ============================================

/// Codec for frame headers and complete frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameCodec;

impl FrameCodec {
    /// Creates a new frame codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Codec<Header> for FrameCodec {
    fn encode(&self, msg: &Header, buf: &mut BytesMut) -> Result<()> {
        buf.reserve(HEADER_SIZE);
        buf.put_u8(msg.server_flags.bits());
        buf.put_u8(msg.exercise_flags);
        buf.put_u16(msg.length);
        Ok(())
    }

    fn decode(&self, buf: &mut Bytes) -> Result<Header> {
        if buf.len() < HEADER_SIZE {
            return Err(CoreError::header_too_short(HEADER_SIZE, buf.len()));
        }

        let server_flags = ServerFlags::from_bits(buf.get_u8());
        let exercise_flags = buf.get_u8();
        let length = buf.get_u16();

        Ok(Header {
            server_flags,
            exercise_flags,
            length,
        })
    }
}

impl Codec<Frame> for FrameCodec {
    fn encode(&self, msg: &Frame, buf: &mut BytesMut) -> Result<()> {
        let length = u16::try_from(msg.payload.len())
            .map_err(|_| CoreError::payload_too_large(MAX_PAYLOAD_SIZE, msg.payload.len()))?;

        let header = Header {
            server_flags: msg.server_flags,
            exercise_flags: msg.exercise_flags,
            length,
        };

        buf.reserve(msg.wire_len());
        self.encode(&header, buf)?;
        buf.put_slice(&msg.payload);
        Ok(())
    }

    fn decode(&self, buf: &mut Bytes) -> Result<Frame> {
        let header = <Self as Codec<Header>>::decode(self, buf)?;

        if buf.len() < header.payload_len() {
            return Err(CoreError::truncated(header.payload_len(), buf.len()));
        }

        let payload = buf.split_to(header.payload_len());

        Ok(Frame {
            server_flags: header.server_flags,
            exercise_flags: header.exercise_flags,
            payload,
        })
    }
}

// ============================================
// Convenience Functions
// ============================================

/// Encodes a payload and its flags into a complete frame.
///
/// # Errors
/// Returns `PayloadTooLarge` if the payload exceeds 65535 bytes.
pub fn encode(payload: &[u8], server_flags: ServerFlags, exercise_flags: u8) -> Result<BytesMut> {
    let frame = Frame::with_flags(Bytes::copy_from_slice(payload), server_flags, exercise_flags);
    encode_frame(&frame)
}

/// Encodes a frame to bytes.
///
/// # Errors
/// Returns `PayloadTooLarge` if the payload exceeds 65535 bytes.
pub fn encode_frame(frame: &Frame) -> Result<BytesMut> {
    let mut buf = BytesMut::with_capacity(frame.wire_len());
    FrameCodec.encode(frame, &mut buf)?;
    Ok(buf)
}

/// Decodes a frame header.
///
/// # Errors
/// Returns `HeaderTooShort` if fewer than 4 bytes are available.
pub fn decode_header(buf: &[u8]) -> Result<Header> {
    let mut bytes = Bytes::copy_from_slice(buf);
    FrameCodec.decode(&mut bytes)
}

/// Decodes a complete frame.
///
/// # Errors
/// Returns an error if the header or payload is incomplete.
pub fn decode_frame(buf: &[u8]) -> Result<Frame> {
    let mut bytes = Bytes::copy_from_slice(buf);
    FrameCodec.decode(&mut bytes)
}

// ============================================
// Tests
// ============================================
