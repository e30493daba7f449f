use std::fmt;

mod headers;
pub use headers::*;

/// Identifies a stream within an HTTP/2 connection.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId(pub u32);

impl StreamId {
    /// Stream ID used for connection control frames
    pub const CONNECTION: Self = Self(0);

    /// Server-initiated streams have even IDs
    pub fn is_server_initiated(&self) -> bool {
        self.0 % 2 == 0
    }

    /// Stream IDs a server may promise: even, and not the connection itself
    pub fn is_valid_push(&self) -> bool {
        *self != Self::CONNECTION && self.is_server_initiated()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid stream id: {0}")]
pub struct StreamIdOutOfRange(u32);

impl TryFrom<u32> for StreamId {
    type Error = StreamIdOutOfRange;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value & 0x8000_0000 != 0 {
            Err(StreamIdOutOfRange(value))
        } else {
            Ok(Self(value))
        }
    }
}

impl fmt::Debug for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Why a stream was terminated, cf. <https://httpwg.org/specs/rfc9113.html#ErrorCodes>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetReason {
    /// The associated condition is not a result of an error.
    NoError,

    /// The endpoint detected an unspecific protocol error. This error is for
    /// use when a more specific error code is not available.
    ProtocolError,

    /// The endpoint encountered an unexpected internal error.
    InternalError,

    /// The endpoint detected that its peer violated the flow-control protocol.
    FlowControlError,

    /// The endpoint sent a SETTINGS frame but did not receive a response in a
    /// timely manner.
    SettingsTimeout,

    /// The endpoint received a frame after a stream was half-closed.
    StreamClosed,

    /// The endpoint received a frame with an invalid size.
    FrameSizeError,

    /// The endpoint refused the stream prior to performing any application
    /// processing. This is what we send when declining a push.
    RefusedStream,

    /// The endpoint uses this error code to indicate that the stream is no
    /// longer needed.
    Cancel,

    /// The endpoint is unable to maintain the field section compression context
    /// for the connection.
    CompressionError,

    /// The connection established in response to a CONNECT request was reset
    /// or abnormally closed.
    ConnectError,

    /// The endpoint detected that its peer is exhibiting a behavior that might
    /// be generating excessive load.
    EnhanceYourCalm,

    /// The underlying transport has properties that do not meet minimum
    /// security requirements.
    InadequateSecurity,

    /// The endpoint requires that HTTP/1.1 be used instead of HTTP/2.
    Http1_1Required,

    /// A code we don't know about. Unknown codes must not trigger any special
    /// behavior, we keep the raw value around for logging.
    Unknown(u32),
}

impl ResetReason {
    /// The wire representation of this error code
    pub fn repr(&self) -> u32 {
        match self {
            ResetReason::NoError => 0x00,
            ResetReason::ProtocolError => 0x01,
            ResetReason::InternalError => 0x02,
            ResetReason::FlowControlError => 0x03,
            ResetReason::SettingsTimeout => 0x04,
            ResetReason::StreamClosed => 0x05,
            ResetReason::FrameSizeError => 0x06,
            ResetReason::RefusedStream => 0x07,
            ResetReason::Cancel => 0x08,
            ResetReason::CompressionError => 0x09,
            ResetReason::ConnectError => 0x0a,
            ResetReason::EnhanceYourCalm => 0x0b,
            ResetReason::InadequateSecurity => 0x0c,
            ResetReason::Http1_1Required => 0x0d,
            ResetReason::Unknown(code) => *code,
        }
    }

    /// Map a wire error code to a reason. Never fails: codes outside of
    /// RFC 9113 end up in [ResetReason::Unknown].
    pub fn from_repr(code: u32) -> Self {
        match code {
            0x00 => ResetReason::NoError,
            0x01 => ResetReason::ProtocolError,
            0x02 => ResetReason::InternalError,
            0x03 => ResetReason::FlowControlError,
            0x04 => ResetReason::SettingsTimeout,
            0x05 => ResetReason::StreamClosed,
            0x06 => ResetReason::FrameSizeError,
            0x07 => ResetReason::RefusedStream,
            0x08 => ResetReason::Cancel,
            0x09 => ResetReason::CompressionError,
            0x0a => ResetReason::ConnectError,
            0x0b => ResetReason::EnhanceYourCalm,
            0x0c => ResetReason::InadequateSecurity,
            0x0d => ResetReason::Http1_1Required,
            other => ResetReason::Unknown(other),
        }
    }
}

impl From<u32> for ResetReason {
    fn from(code: u32) -> Self {
        Self::from_repr(code)
    }
}

impl fmt::Display for ResetReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResetReason::Unknown(code) => write!(f, "unknown error code 0x{code:02x}"),
            known => fmt::Debug::fmt(known, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_ids_are_even_and_non_zero() {
        assert!(StreamId(2).is_valid_push());
        assert!(StreamId(1024).is_valid_push());
        assert!(!StreamId(3).is_valid_push());
        assert!(!StreamId::CONNECTION.is_valid_push());
    }

    #[test]
    fn stream_id_rejects_reserved_bit() {
        assert!(StreamId::try_from(0x8000_0002).is_err());
        assert_eq!(StreamId::try_from(6).unwrap(), StreamId(6));
    }

    #[test]
    fn reset_reason_codes() {
        assert_eq!(ResetReason::RefusedStream.repr(), 0x07);
        assert_eq!(ResetReason::Cancel.repr(), 0x08);
        assert_eq!(ResetReason::from_repr(0x01), ResetReason::ProtocolError);
        assert_eq!(ResetReason::from_repr(0x02), ResetReason::InternalError);

        let odd = ResetReason::from_repr(0xbeef);
        assert_eq!(odd, ResetReason::Unknown(0xbeef));
        assert_eq!(odd.repr(), 0xbeef);
        assert_eq!(odd.to_string(), "unknown error code 0xbeef");
    }
}
