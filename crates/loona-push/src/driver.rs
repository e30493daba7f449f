//! Feeding a [PushDemux] from other tasks.
//!
//! The demultiplexer must see the events of a connection one at a time, in
//! the order frames arrived. When frames are decoded somewhere else, send
//! them as [PushEvent]s over a channel and let [drive] apply them.

use std::fmt;

use bytes::{Buf, Bytes};
use tokio::sync::mpsc;
use tracing::debug;

use crate::{
    demux::PushDemux,
    error::PushError,
    observer::PushObserver,
    types::{HeaderList, ResetReason, StreamId},
};

/// Something the frame source saw on a pushed stream
pub enum PushEvent {
    /// PUSH_PROMISE (+ CONTINUATION)
    Promise {
        stream_id: StreamId,
        request_headers: HeaderList,
    },

    /// HEADERS (+ CONTINUATION) on a promised stream
    Headers {
        stream_id: StreamId,
        response_headers: HeaderList,
        last: bool,
    },

    /// DATA on a promised stream, padding already removed
    Data {
        stream_id: StreamId,
        payload: Bytes,
        last: bool,
    },

    /// RST_STREAM
    Reset {
        stream_id: StreamId,
        reason: ResetReason,
    },
}

impl PushEvent {
    pub fn stream_id(&self) -> StreamId {
        match self {
            PushEvent::Promise { stream_id, .. }
            | PushEvent::Headers { stream_id, .. }
            | PushEvent::Data { stream_id, .. }
            | PushEvent::Reset { stream_id, .. } => *stream_id,
        }
    }
}

impl fmt::Debug for PushEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Promise { stream_id, .. } => f.debug_tuple("Promise").field(stream_id).finish(),
            Self::Headers {
                stream_id, last, ..
            } => f
                .debug_tuple("Headers")
                .field(stream_id)
                .field(last)
                .finish(),
            Self::Data {
                stream_id,
                payload,
                last,
            } => f
                .debug_tuple("Data")
                .field(stream_id)
                .field(&payload.len())
                .field(last)
                .finish(),
            Self::Reset { stream_id, reason } => f
                .debug_tuple("Reset")
                .field(stream_id)
                .field(reason)
                .finish(),
        }
    }
}

impl<O: PushObserver> PushDemux<O> {
    /// Apply a single event
    pub fn handle_event(&mut self, ev: PushEvent) -> Result<(), PushError> {
        match ev {
            PushEvent::Promise {
                stream_id,
                request_headers,
            } => self.handle_request_promise(stream_id, &request_headers),
            PushEvent::Headers {
                stream_id,
                response_headers,
                last,
            } => self.handle_response_headers(stream_id, &response_headers, last),
            PushEvent::Data {
                stream_id,
                payload,
                last,
            } => {
                let length = payload.len();
                let mut reader = payload.reader();
                self.handle_data(stream_id, &mut reader, length, last)
            }
            PushEvent::Reset { stream_id, reason } => {
                self.handle_peer_reset(stream_id, reason);
                Ok(())
            }
        }
    }
}

/// Applies events to `demux` in the order they're received, until every
/// sender is dropped or a connection error occurs.
pub async fn drive<O: PushObserver>(
    mut rx: mpsc::Receiver<PushEvent>,
    demux: &mut PushDemux<O>,
) -> Result<(), PushError> {
    while let Some(ev) = rx.recv().await {
        debug!(?ev, "<");
        if let Err(e) = demux.handle_event(ev) {
            debug!(stream_id = %e.stream_id(), reason = ?e.as_reset_reason(), "push connection error: {e}");
            return Err(e);
        }
    }

    debug!("push event senders are gone, done driving");
    Ok(())
}
