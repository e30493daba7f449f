use b_x::BX;

use crate::types::{ResetReason, StreamId};

/// Something went wrong in a way that makes the whole connection unusable:
/// either the peer (or upstream framing) is misbehaving, or an observer broke
/// its contract and left the connection's read cursor somewhere unknown.
///
/// Whoever owns the connection must stop processing frames and should send a
/// GOAWAY with [PushError::as_reset_reason].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PushError {
    #[error("server promised stream {stream_id}, but pushed streams must have even, non-zero IDs")]
    PushSidShouldBeEven { stream_id: StreamId },

    #[error("server promised stream {stream_id}, which is already tracked")]
    DuplicatePush { stream_id: StreamId },

    #[error("promised stream IDs should be numerically increasing (got {stream_id}, last was {last_stream_id})")]
    PushSidShouldBeNumericallyIncreasing {
        stream_id: StreamId,
        last_stream_id: StreamId,
    },

    #[error("received push promise for stream {stream_id} but push is disabled, cf. RFC9113 section 8.4")]
    PushDisabled { stream_id: StreamId },

    #[error("received {event} for unknown or closed pushed stream {stream_id}")]
    UnknownStream {
        stream_id: StreamId,
        event: &'static str,
    },

    #[error("received data on pushed stream {stream_id} before final response headers")]
    DataBeforeHeaders { stream_id: StreamId },

    #[error("received non-final headers on pushed stream {stream_id} after data")]
    HeadersAfterData { stream_id: StreamId },

    #[error("observer returned without taking or skipping the {len}-byte chunk for stream {stream_id}")]
    ChunkNotResolved { stream_id: StreamId, len: usize },

    #[error("error reading {len}-byte chunk for stream {stream_id}: {source}")]
    Read {
        stream_id: StreamId,
        len: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("observer failed while handling data for stream {stream_id}: {source}")]
    Observer {
        stream_id: StreamId,
        #[source]
        source: BX,
    },
}

impl PushError {
    pub fn as_reset_reason(&self) -> ResetReason {
        match self {
            // stream closed errors
            PushError::UnknownStream { .. } => ResetReason::StreamClosed,
            // errors on our side of the connection
            PushError::ChunkNotResolved { .. } => ResetReason::InternalError,
            PushError::Read { .. } => ResetReason::InternalError,
            PushError::Observer { .. } => ResetReason::InternalError,
            // protocol errors
            _ => ResetReason::ProtocolError,
        }
    }

    /// The stream that triggered the error
    pub fn stream_id(&self) -> StreamId {
        match self {
            PushError::PushSidShouldBeEven { stream_id }
            | PushError::DuplicatePush { stream_id }
            | PushError::PushSidShouldBeNumericallyIncreasing { stream_id, .. }
            | PushError::PushDisabled { stream_id }
            | PushError::UnknownStream { stream_id, .. }
            | PushError::DataBeforeHeaders { stream_id }
            | PushError::HeadersAfterData { stream_id }
            | PushError::ChunkNotResolved { stream_id, .. }
            | PushError::Read { stream_id, .. }
            | PushError::Observer { stream_id, .. } => *stream_id,
        }
    }
}

impl From<PushError> for BX {
    fn from(e: PushError) -> Self {
        BX::from_err(e)
    }
}
