//! Server push for HTTP/2 clients: follows the streams a server opens on its
//! own (PUSH_PROMISE), hands their lifecycle to a [PushObserver], and turns
//! the observer's decisions into RST_STREAM frames for the connection writer.
//!
//! HTTP/2 <https://httpwg.org/specs/rfc9113.html#PushResources>

mod types;
pub use types::*;

mod conf;
pub use conf::*;

pub mod error;

mod source;
pub use source::{DataSource, Resolution};

mod observer;
pub use observer::*;

mod outgoing;
pub use outgoing::*;

mod demux;
pub use demux::{PushDemux, PushStats, PushStreamState};

pub mod driver;

/// re-exported so consumers can use whatever version we use
pub use bytes;
pub use http;
