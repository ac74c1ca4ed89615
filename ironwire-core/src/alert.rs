//! TLS alert protocol (RFC 5246 Section 7.2).

use crate::error::{Error, Result};
use core::fmt;

/// Alert level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AlertLevel {
    /// Warning (1)
    Warning = 1,

    /// Fatal (2)
    Fatal = 2,
}

impl AlertLevel {
    /// Create from wire format (u8).
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(AlertLevel::Warning),
            2 => Some(AlertLevel::Fatal),
            _ => None,
        }
    }

    /// Convert to wire format (u8).
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

/// TLS 1.2 alert descriptions.
///
/// Codes outside this list are kept as [`AlertDescription::Unknown`] so a
/// peer's alert always reaches the caller intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertDescription {
    /// Close notify (0)
    CloseNotify,
    /// Unexpected message (10)
    UnexpectedMessage,
    /// Bad record MAC (20)
    BadRecordMac,
    /// Record overflow (22)
    RecordOverflow,
    /// Handshake failure (40)
    HandshakeFailure,
    /// Bad certificate (42)
    BadCertificate,
    /// Unsupported certificate (43)
    UnsupportedCertificate,
    /// Certificate revoked (44)
    CertificateRevoked,
    /// Certificate expired (45)
    CertificateExpired,
    /// Certificate unknown (46)
    CertificateUnknown,
    /// Illegal parameter (47)
    IllegalParameter,
    /// Unknown CA (48)
    UnknownCa,
    /// Access denied (49)
    AccessDenied,
    /// Decode error (50)
    DecodeError,
    /// Decrypt error (51)
    DecryptError,
    /// Protocol version (70)
    ProtocolVersion,
    /// Insufficient security (71)
    InsufficientSecurity,
    /// Internal error (80)
    InternalError,
    /// User canceled (90)
    UserCanceled,
    /// No renegotiation (100)
    NoRenegotiation,
    /// Unsupported extension (110)
    UnsupportedExtension,
    /// Unrecognized name (112, RFC 6066)
    UnrecognizedName,
    /// Any other code
    Unknown(u8),
}

impl AlertDescription {
    /// Convert from wire format (u8).
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => AlertDescription::CloseNotify,
            10 => AlertDescription::UnexpectedMessage,
            20 => AlertDescription::BadRecordMac,
            22 => AlertDescription::RecordOverflow,
            40 => AlertDescription::HandshakeFailure,
            42 => AlertDescription::BadCertificate,
            43 => AlertDescription::UnsupportedCertificate,
            44 => AlertDescription::CertificateRevoked,
            45 => AlertDescription::CertificateExpired,
            46 => AlertDescription::CertificateUnknown,
            47 => AlertDescription::IllegalParameter,
            48 => AlertDescription::UnknownCa,
            49 => AlertDescription::AccessDenied,
            50 => AlertDescription::DecodeError,
            51 => AlertDescription::DecryptError,
            70 => AlertDescription::ProtocolVersion,
            71 => AlertDescription::InsufficientSecurity,
            80 => AlertDescription::InternalError,
            90 => AlertDescription::UserCanceled,
            100 => AlertDescription::NoRenegotiation,
            110 => AlertDescription::UnsupportedExtension,
            112 => AlertDescription::UnrecognizedName,
            other => AlertDescription::Unknown(other),
        }
    }

    /// Convert to wire format (u8).
    pub const fn to_u8(self) -> u8 {
        match self {
            AlertDescription::CloseNotify => 0,
            AlertDescription::UnexpectedMessage => 10,
            AlertDescription::BadRecordMac => 20,
            AlertDescription::RecordOverflow => 22,
            AlertDescription::HandshakeFailure => 40,
            AlertDescription::BadCertificate => 42,
            AlertDescription::UnsupportedCertificate => 43,
            AlertDescription::CertificateRevoked => 44,
            AlertDescription::CertificateExpired => 45,
            AlertDescription::CertificateUnknown => 46,
            AlertDescription::IllegalParameter => 47,
            AlertDescription::UnknownCa => 48,
            AlertDescription::AccessDenied => 49,
            AlertDescription::DecodeError => 50,
            AlertDescription::DecryptError => 51,
            AlertDescription::ProtocolVersion => 70,
            AlertDescription::InsufficientSecurity => 71,
            AlertDescription::InternalError => 80,
            AlertDescription::UserCanceled => 90,
            AlertDescription::NoRenegotiation => 100,
            AlertDescription::UnsupportedExtension => 110,
            AlertDescription::UnrecognizedName => 112,
            AlertDescription::Unknown(code) => code,
        }
    }
}

/// TLS alert message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alert {
    /// Alert level
    pub level: AlertLevel,

    /// Alert description
    pub description: AlertDescription,
}

impl Alert {
    /// Create a new alert.
    pub fn new(level: AlertLevel, description: AlertDescription) -> Self {
        Self { level, description }
    }

    /// Create a fatal alert.
    pub fn fatal(description: AlertDescription) -> Self {
        Self::new(AlertLevel::Fatal, description)
    }

    /// Create the `warning/close_notify` alert.
    pub fn close_notify() -> Self {
        Self::new(AlertLevel::Warning, AlertDescription::CloseNotify)
    }

    /// Whether this alert announces a graceful close.
    pub fn is_close_notify(&self) -> bool {
        self.description == AlertDescription::CloseNotify
    }

    /// Encode the alert to bytes.
    pub fn encode(&self) -> [u8; 2] {
        [self.level.to_u8(), self.description.to_u8()]
    }

    /// Decode an alert record payload.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() != 2 {
            return Err(Error::Framing(format!(
                "Alert must be 2 bytes, got {}",
                data.len()
            )));
        }

        let level = AlertLevel::from_u8(data[0])
            .ok_or_else(|| Error::Framing(format!("Invalid alert level {}", data[0])))?;

        Ok(Self {
            level,
            description: AlertDescription::from_u8(data[1]),
        })
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}/{:?} ({})",
            self.level,
            self.description,
            self.description.to_u8()
        )
    }
}
