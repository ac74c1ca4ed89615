//! TLS protocol constants and types.

/// TLS protocol version as carried in record headers and hellos.
///
/// Only TLS 1.2 is negotiated; the older codes are accepted in record
/// headers because clients commonly send `0x0301` there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum ProtocolVersion {
    /// TLS 1.0 (RFC 2246)
    Tls10 = 0x0301,

    /// TLS 1.1 (RFC 4346)
    Tls11 = 0x0302,

    /// TLS 1.2 (RFC 5246)
    Tls12 = 0x0303,
}

impl ProtocolVersion {
    /// Create from wire format (u16 big-endian).
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0301 => Some(ProtocolVersion::Tls10),
            0x0302 => Some(ProtocolVersion::Tls11),
            0x0303 => Some(ProtocolVersion::Tls12),
            _ => None,
        }
    }

    /// Convert to wire format (u16 big-endian).
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Get the protocol name.
    pub const fn name(self) -> &'static str {
        match self {
            ProtocolVersion::Tls10 => "TLS 1.0",
            ProtocolVersion::Tls11 => "TLS 1.1",
            ProtocolVersion::Tls12 => "TLS 1.2",
        }
    }
}

/// TLS content type (RFC 5246 Section 6.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ContentType {
    /// Change cipher spec (20)
    ChangeCipherSpec = 20,

    /// Alert (21)
    Alert = 21,

    /// Handshake (22)
    Handshake = 22,

    /// Application data (23)
    ApplicationData = 23,
}

impl ContentType {
    /// Create from wire format (u8).
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            20 => Some(ContentType::ChangeCipherSpec),
            21 => Some(ContentType::Alert),
            22 => Some(ContentType::Handshake),
            23 => Some(ContentType::ApplicationData),
            _ => None,
        }
    }

    /// Convert to wire format (u8).
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Handshake message type (RFC 5246 Section 7.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HandshakeType {
    /// HelloRequest (0)
    HelloRequest = 0,

    /// ClientHello (1)
    ClientHello = 1,

    /// ServerHello (2)
    ServerHello = 2,

    /// Certificate (11)
    Certificate = 0x0b,

    /// ServerKeyExchange (12)
    ServerKeyExchange = 0x0c,

    /// CertificateRequest (13)
    CertificateRequest = 0x0d,

    /// ServerHelloDone (14)
    ServerHelloDone = 0x0e,

    /// CertificateVerify (15)
    CertificateVerify = 0x0f,

    /// ClientKeyExchange (16)
    ClientKeyExchange = 0x10,

    /// Finished (20)
    Finished = 0x14,
}

impl HandshakeType {
    /// Create from wire format (u8).
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(HandshakeType::HelloRequest),
            1 => Some(HandshakeType::ClientHello),
            2 => Some(HandshakeType::ServerHello),
            0x0b => Some(HandshakeType::Certificate),
            0x0c => Some(HandshakeType::ServerKeyExchange),
            0x0d => Some(HandshakeType::CertificateRequest),
            0x0e => Some(HandshakeType::ServerHelloDone),
            0x0f => Some(HandshakeType::CertificateVerify),
            0x10 => Some(HandshakeType::ClientKeyExchange),
            0x14 => Some(HandshakeType::Finished),
            _ => None,
        }
    }

    /// Convert to wire format (u8).
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Length of the client and server random values.
pub const RANDOM_SIZE: usize = 32;

/// Length of the session id sent in hellos.
pub const SESSION_ID_SIZE: usize = 32;

/// Length of Finished verify data.
pub const VERIFY_DATA_SIZE: usize = 12;

/// Length of the master secret.
pub const MASTER_SECRET_SIZE: usize = 48;

/// Which end of the connection we are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Initiates the handshake
    Client,
    /// Answers the handshake
    Server,
}

impl Role {
    /// The other end.
    pub const fn peer(self) -> Self {
        match self {
            Role::Client => Role::Server,
            Role::Server => Role::Client,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_type_codes() {
        assert_eq!(HandshakeType::ServerHelloDone.to_u8(), 0x0e);
        assert_eq!(HandshakeType::ClientKeyExchange.to_u8(), 0x10);
        assert_eq!(HandshakeType::from_u8(0x14), Some(HandshakeType::Finished));
        assert_eq!(HandshakeType::from_u8(4), None);
    }

    #[test]
    fn test_protocol_version_ordering() {
        assert!(ProtocolVersion::Tls12 > ProtocolVersion::Tls10);
        assert_eq!(ProtocolVersion::from_u16(0x0304), None);
        assert_eq!(ProtocolVersion::Tls12.to_u16(), 0x0303);
    }
}
