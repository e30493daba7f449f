use std::{
    collections::{hash_map::Entry, HashMap},
    io::Read,
    rc::Rc,
};

use tracing::{debug, trace};

use crate::{
    conf::PushConf,
    error::PushError,
    observer::{CancelAll, PushObserver},
    outgoing::ResetQueue,
    source::{discard, DataSource, Resolution},
    types::{HeaderList, ResetReason, StreamId},
};

// Lifecycle of a pushed stream, as tracked here:
//
//   PUSH_PROMISE
//        |
//        v
//   +-------------------+  1xx   +-------------------+
//   | AwaitingResponse  +------->| ReceivingHeaders  |<--.
//   +--------+----------+        +---------+---------+   | 1xx
//            |   HEADERS (final)           |   `---------'
//            +-----------------------------+
//            v
//   +-------------------+
//   |   ReceivingData   +<--.  DATA
//   +--------+----------+   |
//            |   `----------'
//            | DATA/HEADERS with END_STREAM
//            v
//        Closed (entry removed)
//
// At any point, the observer or the engine may cancel the stream: it then
// becomes `Cancelled` and every frame is drained silently until one carries
// END_STREAM or the peer resets the stream. A peer reset removes the entry
// from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushStreamState {
    /// We got the PUSH_PROMISE, no response headers yet
    AwaitingResponse,

    /// We got an informational (1xx) response, the final one is still to come
    ReceivingHeaders,

    /// We got the final response headers, now expecting data or trailers
    ReceivingData,

    /// The response was fully delivered. Closed streams are not tracked, so
    /// [PushDemux::state] never returns this.
    Closed,

    /// Nobody wants this stream anymore, we're just draining it
    Cancelled,
}

pub(crate) struct PushStream {
    pub(crate) id: StreamId,
    pub(crate) state: PushStreamState,

    // sticky, once a stream is cancelled it stays cancelled
    pub(crate) cancelled: bool,

    // whether `on_request` was called for this stream. if it wasn't,
    // the observer must not hear about it at all.
    pub(crate) observed: bool,

    // whether `on_reset` was called for this stream already
    pub(crate) reset_reported: bool,

    // data bytes received on this stream, delivered or not
    pub(crate) received: u64,
}

impl PushStream {
    fn new(id: StreamId) -> Self {
        Self {
            id,
            state: PushStreamState::AwaitingResponse,
            cancelled: false,
            observed: false,
            reset_reported: false,
            received: 0,
        }
    }

    fn cancel(&mut self) {
        debug!(stream_id = %self.id, from = ?self.state, "cancelling pushed stream");
        self.cancelled = true;
        self.state = PushStreamState::Cancelled;
    }
}

/// Counters for everything that went through a [PushDemux]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PushStats {
    /// PUSH_PROMISE frames accepted for tracking
    pub promised: u64,
    /// pushes refused before the response started
    pub refused: u64,
    /// pushes cancelled after they were admitted
    pub cancelled: u64,
    /// pushes whose response was fully delivered
    pub completed: u64,
    /// pushes that ended with a reset (from the peer, or a protocol error)
    pub reset: u64,
    /// data bytes taken by the observer
    pub bytes_delivered: u64,
    /// data bytes skipped, by the observer or by us
    pub bytes_discarded: u64,
}

/// Routes the events of server-initiated streams to a [PushObserver].
///
/// There is one of these per connection, driven by the single context that
/// reads frames off that connection. Methods that return a [PushError]
/// are reporting a connection error: the caller must stop processing frames.
///
/// Refused and cancelled streams stay tracked, as small entries with no
/// buffers, until a frame marked END_STREAM or a peer reset arrives for them.
/// A peer that does neither keeps them around until the connection goes away.
/// They do not count against [PushConf::max_concurrent_pushes].
pub struct PushDemux<O: PushObserver> {
    conf: Rc<PushConf>,
    observer: O,
    resets: ResetQueue,

    streams: HashMap<StreamId, PushStream>,
    // tracked streams that are not cancelled
    live: usize,
    last_promised: Option<StreamId>,
    stats: PushStats,
}

impl PushDemux<CancelAll> {
    /// A demultiplexer that refuses every push
    pub fn cancel_all(conf: Rc<PushConf>, resets: ResetQueue) -> Self {
        Self::new(conf, CancelAll, resets)
    }
}

impl<O: PushObserver> PushDemux<O> {
    pub fn new(conf: Rc<PushConf>, observer: O, resets: ResetQueue) -> Self {
        Self {
            conf,
            observer,
            resets,
            streams: Default::default(),
            live: 0,
            last_promised: None,
            stats: Default::default(),
        }
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn into_observer(self) -> O {
        self.observer
    }

    pub fn stats(&self) -> PushStats {
        self.stats
    }

    pub fn is_tracked(&self, stream_id: StreamId) -> bool {
        self.streams.contains_key(&stream_id)
    }

    /// State of a tracked stream. Streams that closed are not tracked anymore.
    pub fn state(&self, stream_id: StreamId) -> Option<PushStreamState> {
        self.streams.get(&stream_id).map(|s| s.state)
    }

    /// Number of tracked streams, including ones being drained
    pub fn tracked_count(&self) -> usize {
        self.streams.len()
    }

    /// Data bytes received on a tracked stream so far
    pub fn received(&self, stream_id: StreamId) -> Option<u64> {
        self.streams.get(&stream_id).map(|s| s.received)
    }

    /// Number of tracked streams that are still being delivered
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// The server promised to push a response for `request_headers` on
    /// `stream_id` (a PUSH_PROMISE frame, with its CONTINUATION frames).
    pub fn handle_request_promise(
        &mut self,
        stream_id: StreamId,
        request_headers: &HeaderList,
    ) -> Result<(), PushError> {
        if !stream_id.is_valid_push() {
            return Err(PushError::PushSidShouldBeEven { stream_id });
        }

        if !self.conf.enable_push {
            return Err(PushError::PushDisabled { stream_id });
        }

        if self.streams.contains_key(&stream_id) {
            return Err(PushError::DuplicatePush { stream_id });
        }

        if let Some(last_stream_id) = self.last_promised {
            if stream_id <= last_stream_id {
                return Err(PushError::PushSidShouldBeNumericallyIncreasing {
                    stream_id,
                    last_stream_id,
                });
            }
        }
        self.last_promised = Some(stream_id);
        self.stats.promised += 1;

        let mut stream = PushStream::new(stream_id);
        debug!(%stream_id, ?request_headers, "received push promise");

        if !request_headers.has_request_pseudo_headers() {
            debug!(%stream_id, "push promise is missing request pseudo-headers, refusing");
            self.refuse(&mut stream, ResetReason::ProtocolError);
        } else if self
            .conf
            .max_concurrent_pushes
            .is_some_and(|max| self.live >= max as usize)
        {
            debug!(%stream_id, "too many concurrent pushes, refusing");
            self.refuse(&mut stream, ResetReason::RefusedStream);
        } else {
            stream.observed = true;
            if self.observer.on_request(stream_id, request_headers) {
                debug!(%stream_id, "observer refused push");
                self.refuse(&mut stream, ResetReason::RefusedStream);
            }
        }

        if !stream.cancelled {
            self.live += 1;
        }
        self.streams.insert(stream_id, stream);
        Ok(())
    }

    /// Response headers (or trailers) for a pushed stream. `last` is the
    /// END_STREAM flag.
    pub fn handle_response_headers(
        &mut self,
        stream_id: StreamId,
        response_headers: &HeaderList,
        last: bool,
    ) -> Result<(), PushError> {
        let mut entry = match self.streams.entry(stream_id) {
            Entry::Occupied(entry) => entry,
            Entry::Vacant(_) => {
                return Err(PushError::UnknownStream {
                    stream_id,
                    event: "headers",
                })
            }
        };
        let stream = entry.get_mut();

        if stream.cancelled {
            trace!(%stream_id, %last, "draining headers of cancelled push");
            if last {
                entry.remove();
            }
            return Ok(());
        }

        let is_trailers = match stream.state {
            PushStreamState::AwaitingResponse | PushStreamState::ReceivingHeaders => false,
            PushStreamState::ReceivingData if last => true,
            PushStreamState::ReceivingData => {
                return Err(PushError::HeadersAfterData { stream_id });
            }
            PushStreamState::Closed | PushStreamState::Cancelled => {
                return Err(PushError::UnknownStream {
                    stream_id,
                    event: "headers",
                });
            }
        };

        let status = response_headers.status();
        if !is_trailers && status.is_none() {
            // a malformed response is a stream error, the rest of the
            // connection is fine
            debug!(%stream_id, ?response_headers, "pushed response has no valid :status");
            stream.cancel();
            self.live -= 1;
            stream.reset_reported = true;
            self.resets.send(stream_id, ResetReason::ProtocolError);
            self.observer.on_reset(stream_id, ResetReason::ProtocolError);
            self.stats.reset += 1;
            if last {
                entry.remove();
            }
            return Ok(());
        }

        debug!(%stream_id, ?status, %last, "received pushed response headers");
        let cancel = self
            .observer
            .on_headers(stream_id, response_headers, last);

        if last {
            debug!(%stream_id, "pushed stream closed");
            entry.remove();
            self.live -= 1;
            self.stats.completed += 1;
            return Ok(());
        }

        if cancel {
            stream.cancel();
            self.live -= 1;
            self.resets.send(stream_id, ResetReason::Cancel);
            self.stats.cancelled += 1;
            return Ok(());
        }

        stream.state = match status {
            Some(status) if status.is_informational() => PushStreamState::ReceivingHeaders,
            _ => PushStreamState::ReceivingData,
        };
        Ok(())
    }

    /// A DATA frame for a pushed stream. `source` is positioned at the start
    /// of the frame's `length` payload bytes; when this returns `Ok`, exactly
    /// `length` bytes have been read from it.
    pub fn handle_data(
        &mut self,
        stream_id: StreamId,
        source: &mut dyn Read,
        length: usize,
        last: bool,
    ) -> Result<(), PushError> {
        let mut entry = match self.streams.entry(stream_id) {
            Entry::Occupied(entry) => entry,
            Entry::Vacant(_) => {
                return Err(PushError::UnknownStream {
                    stream_id,
                    event: "data",
                })
            }
        };
        let stream = entry.get_mut();
        stream.received += length as u64;

        if stream.cancelled {
            trace!(%stream_id, %length, %last, "draining data of cancelled push");
            discard(source, length).map_err(|e| PushError::Read {
                stream_id,
                len: length,
                source: e,
            })?;
            self.stats.bytes_discarded += length as u64;
            if last {
                entry.remove();
            }
            return Ok(());
        }

        if stream.state != PushStreamState::ReceivingData {
            return Err(PushError::DataBeforeHeaders { stream_id });
        }

        trace!(%stream_id, %length, %last, "delivering pushed data");
        let mut resolution = None;
        let cancel = self
            .observer
            .on_data(
                stream_id,
                DataSource::new(source, length, &mut resolution),
                last,
            )
            .map_err(|e| PushError::Observer {
                stream_id,
                source: e,
            })?;

        match resolution {
            Some(Resolution::Taken) => self.stats.bytes_delivered += length as u64,
            Some(Resolution::Skipped) => self.stats.bytes_discarded += length as u64,
            Some(Resolution::Failed(kind)) => {
                // the observer swallowed the error, but the cursor is off
                return Err(PushError::Read {
                    stream_id,
                    len: length,
                    source: kind.into(),
                });
            }
            None => {
                return Err(PushError::ChunkNotResolved {
                    stream_id,
                    len: length,
                })
            }
        }

        if last {
            debug!(%stream_id, received = %stream.received, "pushed stream closed");
            entry.remove();
            self.live -= 1;
            self.stats.completed += 1;
            return Ok(());
        }

        if cancel {
            stream.cancel();
            self.live -= 1;
            self.resets.send(stream_id, ResetReason::Cancel);
            self.stats.cancelled += 1;
        }
        Ok(())
    }

    /// The peer reset a stream (RST_STREAM). Resets for streams we don't
    /// know about are ignored: we may have forgotten about them already.
    pub fn handle_peer_reset(&mut self, stream_id: StreamId, reason: ResetReason) {
        let Some(stream) = self.streams.remove(&stream_id) else {
            trace!(%stream_id, ?reason, "ignoring reset for untracked stream");
            return;
        };

        debug!(%stream_id, ?reason, state = ?stream.state, "peer reset pushed stream");
        self.stats.reset += 1;
        if !stream.cancelled {
            self.live -= 1;
        }
        if stream.observed && !stream.reset_reported {
            self.observer.on_reset(stream_id, reason);
        }
    }

    fn refuse(&mut self, stream: &mut PushStream, reason: ResetReason) {
        stream.cancel();
        self.resets.send(stream.id, reason);
        self.stats.refused += 1;
    }
}
