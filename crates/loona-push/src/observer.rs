use pretty_hex::PrettyHex;
use tracing::{debug, trace};

use crate::{
    source::DataSource,
    types::{HeaderList, ResetReason, StreamId},
};

/// Receives the server-initiated streams of one connection.
///
/// Callbacks for a given stream arrive in order: one [on_request], zero or
/// more [on_headers], zero or more [on_data], and it ends with either a
/// header block or chunk marked `last`, or one [on_reset]. Callbacks for
/// different streams interleave however the frames did.
///
/// All callbacks run on the connection's frame-processing context. While one
/// of them runs, no frame is read for *any* stream of the connection, so they
/// must return promptly. Hand data off to another task if there is real work
/// to do.
///
/// [on_request]: PushObserver::on_request
/// [on_headers]: PushObserver::on_headers
/// [on_data]: PushObserver::on_data
/// [on_reset]: PushObserver::on_reset
pub trait PushObserver {
    /// The server intends to push a response for this request. The headers
    /// include at least `:method`, `:scheme`, `:authority` and `:path`.
    ///
    /// Return true to refuse the push: no other callback will be made for
    /// `stream_id` and the stream is reset with `REFUSED_STREAM`.
    fn on_request(&mut self, stream_id: StreamId, request_headers: &HeaderList) -> bool;

    /// Response headers for a pushed request, including at least `:status`.
    /// When `last` is true, no data follows.
    ///
    /// Return true to cancel delivery of the rest of the response.
    fn on_headers(&mut self, stream_id: StreamId, response_headers: &HeaderList, last: bool)
        -> bool;

    /// A chunk of the pushed response body. When `last` is true, no other
    /// chunk follows.
    ///
    /// `source` MUST be resolved before returning, with [DataSource::take],
    /// [DataSource::take_into] or [DataSource::skip]. Returning with an
    /// unresolved source, or an error, is fatal for the connection.
    ///
    /// Return true to cancel delivery of the rest of the response.
    fn on_data(
        &mut self,
        stream_id: StreamId,
        source: DataSource<'_>,
        last: bool,
    ) -> b_x::Result<bool>;

    /// The stream was reset by the peer, or because it violated the protocol.
    /// Cancelling a stream from another callback does not, by itself, lead
    /// to this being called.
    fn on_reset(&mut self, stream_id: StreamId, reason: ResetReason);
}

impl<T: PushObserver + ?Sized> PushObserver for Box<T> {
    fn on_request(&mut self, stream_id: StreamId, request_headers: &HeaderList) -> bool {
        (**self).on_request(stream_id, request_headers)
    }

    fn on_headers(
        &mut self,
        stream_id: StreamId,
        response_headers: &HeaderList,
        last: bool,
    ) -> bool {
        (**self).on_headers(stream_id, response_headers, last)
    }

    fn on_data(
        &mut self,
        stream_id: StreamId,
        source: DataSource<'_>,
        last: bool,
    ) -> b_x::Result<bool> {
        (**self).on_data(stream_id, source, last)
    }

    fn on_reset(&mut self, stream_id: StreamId, reason: ResetReason) {
        (**self).on_reset(stream_id, reason)
    }
}

/// Refuses every push. This is what you want if you don't want server push
/// at all but the server sends it anyway.
#[derive(Debug, Default, Clone, Copy)]
pub struct CancelAll;

impl PushObserver for CancelAll {
    fn on_request(&mut self, _stream_id: StreamId, _request_headers: &HeaderList) -> bool {
        true
    }

    fn on_headers(
        &mut self,
        _stream_id: StreamId,
        _response_headers: &HeaderList,
        _last: bool,
    ) -> bool {
        true
    }

    fn on_data(
        &mut self,
        _stream_id: StreamId,
        source: DataSource<'_>,
        _last: bool,
    ) -> b_x::Result<bool> {
        source.skip()?;
        Ok(true)
    }

    fn on_reset(&mut self, _stream_id: StreamId, _reason: ResetReason) {}
}

/// Accepts every push and logs what comes through. Bodies are read, logged
/// and dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPushes;

impl LogPushes {
    const DUMP_LIMIT: usize = 64;
}

impl PushObserver for LogPushes {
    fn on_request(&mut self, stream_id: StreamId, request_headers: &HeaderList) -> bool {
        debug!(%stream_id, ?request_headers, "push promise >>");
        false
    }

    fn on_headers(
        &mut self,
        stream_id: StreamId,
        response_headers: &HeaderList,
        last: bool,
    ) -> bool {
        debug!(%stream_id, ?response_headers, %last, "push promise <<");
        false
    }

    fn on_data(
        &mut self,
        stream_id: StreamId,
        source: DataSource<'_>,
        last: bool,
    ) -> b_x::Result<bool> {
        let len = source.len();
        let data = source.take()?;
        debug!(%stream_id, %len, %last, "push promise << data");
        trace!(
            "{:?}",
            &data[..std::cmp::min(data.len(), Self::DUMP_LIMIT)].hex_dump()
        );
        Ok(false)
    }

    fn on_reset(&mut self, stream_id: StreamId, reason: ResetReason) {
        debug!(%stream_id, %reason, "push promise << reset");
    }
}
