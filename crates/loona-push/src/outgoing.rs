//! Resets the connection writer has to send on our behalf.

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};
use tokio::sync::mpsc;
use tracing::debug;

use crate::types::{ResetReason, StreamId};

/// "Send RST_STREAM for `stream_id` with `reason`"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutgoingReset {
    pub stream_id: StreamId,
    pub reason: ResetReason,
}

impl OutgoingReset {
    /// Length of an RST_STREAM frame payload
    pub const PAYLOAD_LEN: usize = 4;

    /// Write the RST_STREAM payload (the error code), cf.
    /// <https://httpwg.org/specs/rfc9113.html#RST_STREAM>
    pub fn encode(&self, mut w: impl Write) -> std::io::Result<()> {
        w.write_u32::<BigEndian>(self.reason.repr())
    }
}

/// Hands resets over to the connection writer without ever waiting on it.
#[derive(Clone)]
pub struct ResetQueue {
    tx: mpsc::UnboundedSender<OutgoingReset>,
}

impl ResetQueue {
    /// Returns the queue and the receiving end the connection writer
    /// should drain.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OutgoingReset>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub(crate) fn send(&self, stream_id: StreamId, reason: ResetReason) {
        debug!(%stream_id, ?reason, "Queueing RstStream");
        if self.tx.send(OutgoingReset { stream_id, reason }).is_err() {
            // the writer is gone, so is the connection: nothing left to reset
            debug!(%stream_id, "connection writer went away, dropping RstStream");
        }
    }
}
