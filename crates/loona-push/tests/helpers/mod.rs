#![allow(dead_code)]

use std::rc::Rc;

use bytes::{Bytes, BytesMut};
use loona_push::{
    DataSource, HeaderList, OutgoingReset, PushConf, PushDemux, PushObserver, ResetQueue,
    ResetReason, StreamId,
};
use tokio::sync::mpsc;

pub(crate) mod tracing_common;

/// What an observer saw, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Seen {
    Request(StreamId, String),
    Headers(StreamId, u16, bool),
    Data(StreamId, Bytes, bool),
    Skipped(StreamId, usize, bool),
    Reset(StreamId, ResetReason),
}

/// What a [Script] observer should do with the chunks it gets
#[derive(Debug, Clone, Copy, Default)]
pub(crate) enum OnData {
    #[default]
    Take,
    Skip,
}

/// An observer that records everything and cancels when told to.
#[derive(Default)]
pub(crate) struct Script {
    pub(crate) seen: Vec<Seen>,
    pub(crate) refuse: Vec<StreamId>,
    pub(crate) cancel_on_headers: Vec<StreamId>,
    pub(crate) cancel_on_data: Vec<StreamId>,
    pub(crate) on_data: OnData,
}

impl PushObserver for Script {
    fn on_request(&mut self, stream_id: StreamId, request_headers: &HeaderList) -> bool {
        let path = request_headers.path().unwrap_or_default().to_string();
        self.seen.push(Seen::Request(stream_id, path));
        self.refuse.contains(&stream_id)
    }

    fn on_headers(
        &mut self,
        stream_id: StreamId,
        response_headers: &HeaderList,
        last: bool,
    ) -> bool {
        let status = response_headers.status().map(|s| s.as_u16()).unwrap_or(0);
        self.seen.push(Seen::Headers(stream_id, status, last));
        self.cancel_on_headers.contains(&stream_id)
    }

    fn on_data(
        &mut self,
        stream_id: StreamId,
        source: DataSource<'_>,
        last: bool,
    ) -> b_x::Result<bool> {
        match self.on_data {
            OnData::Take => {
                let mut buf = BytesMut::new();
                source.take_into(&mut buf)?;
                self.seen.push(Seen::Data(stream_id, buf.freeze(), last));
            }
            OnData::Skip => {
                let len = source.len();
                source.skip()?;
                self.seen.push(Seen::Skipped(stream_id, len, last));
            }
        }
        Ok(self.cancel_on_data.contains(&stream_id))
    }

    fn on_reset(&mut self, stream_id: StreamId, reason: ResetReason) {
        self.seen.push(Seen::Reset(stream_id, reason));
    }
}

pub(crate) fn setup<O: PushObserver>(
    observer: O,
) -> (PushDemux<O>, mpsc::UnboundedReceiver<OutgoingReset>) {
    tracing_common::setup_tracing();

    let (resets, rx) = ResetQueue::channel();
    let demux = PushDemux::new(Rc::new(PushConf::default()), observer, resets);
    (demux, rx)
}

pub(crate) fn drain_resets(rx: &mut mpsc::UnboundedReceiver<OutgoingReset>) -> Vec<OutgoingReset> {
    let mut resets = vec![];
    while let Ok(rst) = rx.try_recv() {
        resets.push(rst);
    }
    resets
}

pub(crate) fn promise(path: &'static str) -> HeaderList {
    HeaderList::new()
        .with(":method", "GET")
        .with(":scheme", "https")
        .with(":authority", "example.org")
        .with(":path", path)
}

pub(crate) fn status(code: &'static str) -> HeaderList {
    HeaderList::new()
        .with(":status", code)
        .with("content-type", "text/plain")
}
