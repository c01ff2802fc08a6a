//! # Handshake Header
//!
//! Fixed 16-byte header that opens an EasyTier config-server session.
//!
//! ## Wire Format
//! ```text
//! [ConnId(4)] [MsgType(1)] [Padding(1)] [Length(2)] [Magic(8)]
//! ```
//! All integers are little-endian. A header is accepted only when the message
//! type is `syn` or `sack`, the padding byte is zero and the declared length is
//! exactly the size of the magic field. The connection id and magic are opaque
//! and never used as match criteria.

use thiserror::Error;

/// Total header size on the wire
pub const HANDSHAKE_LEN: usize = 16;

/// Offset of the message-type byte
pub const MSG_TYPE_OFFSET: usize = 4;

/// Offset of the padding byte
pub const PADDING_OFFSET: usize = 5;

/// Offset of the declared payload length
pub const LENGTH_OFFSET: usize = 6;

/// Offset of the protocol magic
pub const MAGIC_OFFSET: usize = 8;

/// Declared length a genuine handshake carries (size of the magic field)
pub const PAYLOAD_LEN: u16 = 8;

/// Required padding value
pub const PADDING_VALUE: u8 = 0x00;

/// Handshake message variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Session open
    Syn,
    /// Acknowledgment
    Sack,
}

impl MessageType {
    /// Wire value of this message type
    pub fn as_byte(self) -> u8 {
        match self {
            MessageType::Syn => 0x01,
            MessageType::Sack => 0x02,
        }
    }

    /// Decode a wire value; anything unrecognised is `None`
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(MessageType::Syn),
            0x02 => Some(MessageType::Sack),
            _ => None,
        }
    }

    /// Name published to the metadata context
    pub fn name(self) -> &'static str {
        match self {
            MessageType::Syn => "syn",
            MessageType::Sack => "sack",
        }
    }
}

/// Why a 16-byte prefix is not a handshake.
///
/// These are ordinary "not this protocol" outcomes, kept as values so callers
/// can log or count them without treating them as failures.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("unrecognised message type 0x{0:02x}")]
    UnknownMessageType(u8),

    #[error("non-zero padding 0x{0:02x}")]
    NonZeroPadding(u8),

    #[error("declared length {0}, expected 8")]
    UnexpectedLength(u16),
}

/// Decoded handshake header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeHeader {
    pub conn_id: u32,
    pub msg_type: MessageType,
    pub magic: u64,
}

impl HandshakeHeader {
    /// Validate and decode a header.
    ///
    /// Checks run in wire order and stop at the first failure: message type,
    /// padding, then declared length.
    pub fn parse(buf: &[u8; HANDSHAKE_LEN]) -> Result<Self, Rejection> {
        let msg_type = MessageType::from_byte(buf[MSG_TYPE_OFFSET])
            .ok_or(Rejection::UnknownMessageType(buf[MSG_TYPE_OFFSET]))?;

        if buf[PADDING_OFFSET] != PADDING_VALUE {
            return Err(Rejection::NonZeroPadding(buf[PADDING_OFFSET]));
        }

        let declared = u16::from_le_bytes([buf[LENGTH_OFFSET], buf[LENGTH_OFFSET + 1]]);
        if declared != PAYLOAD_LEN {
            return Err(Rejection::UnexpectedLength(declared));
        }

        let mut conn_id = [0u8; 4];
        conn_id.copy_from_slice(&buf[..MSG_TYPE_OFFSET]);
        let mut magic = [0u8; 8];
        magic.copy_from_slice(&buf[MAGIC_OFFSET..]);

        Ok(Self {
            conn_id: u32::from_le_bytes(conn_id),
            msg_type,
            magic: u64::from_le_bytes(magic),
        })
    }

    /// Parse from an arbitrary slice. Anything shorter than a full header is
    /// `None`; trailing bytes are ignored.
    pub fn parse_prefix(data: &[u8]) -> Option<Result<Self, Rejection>> {
        let head: &[u8; HANDSHAKE_LEN] = data.get(..HANDSHAKE_LEN)?.try_into().ok()?;
        Some(Self::parse(head))
    }

    /// Encode this header as it appears on the wire
    pub fn to_bytes(&self) -> [u8; HANDSHAKE_LEN] {
        let mut out = [0u8; HANDSHAKE_LEN];
        out[..MSG_TYPE_OFFSET].copy_from_slice(&self.conn_id.to_le_bytes());
        out[MSG_TYPE_OFFSET] = self.msg_type.as_byte();
        out[PADDING_OFFSET] = PADDING_VALUE;
        out[LENGTH_OFFSET..MAGIC_OFFSET].copy_from_slice(&PAYLOAD_LEN.to_le_bytes());
        out[MAGIC_OFFSET..].copy_from_slice(&self.magic.to_le_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYN: [u8; HANDSHAKE_LEN] = [
        0xDD, 0xCC, 0xBB, 0xAA, 0x01, 0x00, 0x08, 0x00, 0xEF, 0xCD, 0xAB, 0x89, 0x67, 0x45, 0x23,
        0x01,
    ];

    #[test]
    fn test_message_type_bytes() {
        assert_eq!(MessageType::from_byte(0x01), Some(MessageType::Syn));
        assert_eq!(MessageType::from_byte(0x02), Some(MessageType::Sack));
        assert_eq!(MessageType::from_byte(0x00), None);
        assert_eq!(MessageType::from_byte(0x03), None);
        assert_eq!(MessageType::Syn.as_byte(), 0x01);
        assert_eq!(MessageType::Sack.name(), "sack");
    }

    #[test]
    fn test_parse_reference_syn() {
        let header = HandshakeHeader::parse(&SYN).unwrap();
        assert_eq!(header.conn_id, 0xAABBCCDD);
        assert_eq!(header.msg_type, MessageType::Syn);
        assert_eq!(header.magic, 0x0123456789ABCDEF);
    }

    #[test]
    fn test_encode_matches_reference_bytes() {
        let header = HandshakeHeader {
            conn_id: 0xAABBCCDD,
            msg_type: MessageType::Syn,
            magic: 0x0123456789ABCDEF,
        };
        assert_eq!(header.to_bytes(), SYN);
    }

    #[test]
    fn test_rejections_in_wire_order() {
        // Every field wrong: message type is reported first
        let mut buf = SYN;
        buf[MSG_TYPE_OFFSET] = 0x03;
        buf[PADDING_OFFSET] = 0x01;
        buf[LENGTH_OFFSET] = 0x09;
        assert_eq!(
            HandshakeHeader::parse(&buf),
            Err(Rejection::UnknownMessageType(0x03))
        );

        buf[MSG_TYPE_OFFSET] = 0x02;
        assert_eq!(
            HandshakeHeader::parse(&buf),
            Err(Rejection::NonZeroPadding(0x01))
        );

        buf[PADDING_OFFSET] = 0x00;
        assert_eq!(
            HandshakeHeader::parse(&buf),
            Err(Rejection::UnexpectedLength(9))
        );
    }

    #[test]
    fn test_length_is_little_endian() {
        // 0x0800 big-endian reads as 2048 little-endian
        let mut buf = SYN;
        buf[LENGTH_OFFSET] = 0x00;
        buf[LENGTH_OFFSET + 1] = 0x08;
        assert_eq!(
            HandshakeHeader::parse(&buf),
            Err(Rejection::UnexpectedLength(2048))
        );
    }

    #[test]
    fn test_parse_prefix() {
        assert!(HandshakeHeader::parse_prefix(&SYN[..15]).is_none());
        assert!(HandshakeHeader::parse_prefix(&[]).is_none());

        let mut long = SYN.to_vec();
        long.extend_from_slice(b"trailing");
        let header = HandshakeHeader::parse_prefix(&long).unwrap().unwrap();
        assert_eq!(header.msg_type, MessageType::Syn);
    }
}
