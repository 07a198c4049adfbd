//! The seam between this crate and whatever carries bytes to the X server.
//!
//! This crate never owns a connection. Callers hand over a reference to
//! something implementing `RequestConnection` (e.g `xcb::XcbConnection`)
//! and stay responsible for its lifetime.

use std::fmt;
#[cfg(unix)]
use std::os::unix::io::OwnedFd;

use crate::error::Result;
use crate::extension::{Extension, ExtensionInfo};
use crate::raw::{RawReply, RawError, RawEvent};

/// Full sequence number of a request, as assigned by the connection.
pub type SequenceNumber = u64;

/// How errors of a request are reported.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum RequestMode {
    /// Errors are returned synchronously, when the reply (or the check) is awaited.
    Checked,
    /// Errors are delivered asynchronously, through the event queue.
    Unchecked,
}

/// What the server sends back for a request.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum ReplyShape {
    /// Nothing, unless the request fails.
    Void,
    Reply,
    /// A reply with file descriptors attached.
    ReplyWithFds,
}

/// A serialized request, ready to be handed to a connection.
///
/// `bytes` starts with a 4-byte header whose opcode and length fields are
/// left for the connection to fill in (see `wire::fill_header`).
pub struct RawRequest {
    /// `None` for core requests.
    pub extension: Option<&'static Extension>,
    /// Major opcode for core requests, minor opcode for extension requests.
    pub opcode: u8,
    pub bytes: Vec<u8>,
    pub shape: ReplyShape,
    pub mode: RequestMode,
    #[cfg(unix)]
    pub fds: Vec<OwnedFd>,
}

impl fmt::Debug for RawRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RawRequest")
            .field("extension", &self.extension.map(|e| e.name))
            .field("opcode", &self.opcode)
            .field("len", &self.bytes.len())
            .field("shape", &self.shape)
            .field("mode", &self.mode)
            .finish()
    }
}

/// What waiting on a request with a reply can yield.
#[derive(Debug)]
pub enum ReplyOrError {
    Reply(RawReply),
    Error(RawError),
}

/// A live connection to an X server.
///
/// Implementors perform the transport; this crate performs the typing.
pub trait RequestConnection {
    /// Sends a request and returns its sequence number.
    ///
    /// Extension requests carry their `Extension`; the implementation is
    /// expected to have resolved it (see `extension_information`).
    fn send_request(&self, request: RawRequest) -> Result<SequenceNumber>;

    /// Blocks until the reply (or error) for `sequence` arrives.
    ///
    /// Returns `Ok(None)` when the request was sent `Unchecked` and failed:
    /// the error then sits in the event queue. Requests that produce several
    /// replies can be waited on repeatedly.
    fn wait_for_reply(&self, sequence: SequenceNumber) -> Result<Option<ReplyOrError>>;

    /// Blocks until the server has processed a `Checked` void request.
    fn check_request(&self, sequence: SequenceNumber) -> Result<Option<RawError>>;

    /// Tells the connection nobody will ever wait for `sequence`.
    fn discard_reply(&self, sequence: SequenceNumber);

    /// Opcode and event/error offsets of `extension`, or `None` if the server lacks it.
    ///
    /// Resolved once per connection; later calls answer from a cache.
    fn extension_information(&self, extension: &'static Extension) -> Result<Option<ExtensionInfo>>;

    /// Next queued event (or unchecked error), without blocking.
    fn poll_for_event(&self) -> Result<Option<RawEvent>>;

    /// Next event (or unchecked error), blocking until one arrives.
    fn wait_for_event(&self) -> Result<RawEvent>;

    fn flush(&self) -> Result<()>;
}

impl<'a, C: RequestConnection + ?Sized> RequestConnection for &'a C {
    fn send_request(&self, request: RawRequest) -> Result<SequenceNumber> {
        (**self).send_request(request)
    }
    fn wait_for_reply(&self, sequence: SequenceNumber) -> Result<Option<ReplyOrError>> {
        (**self).wait_for_reply(sequence)
    }
    fn check_request(&self, sequence: SequenceNumber) -> Result<Option<RawError>> {
        (**self).check_request(sequence)
    }
    fn discard_reply(&self, sequence: SequenceNumber) {
        (**self).discard_reply(sequence)
    }
    fn extension_information(&self, extension: &'static Extension) -> Result<Option<ExtensionInfo>> {
        (**self).extension_information(extension)
    }
    fn poll_for_event(&self) -> Result<Option<RawEvent>> {
        (**self).poll_for_event()
    }
    fn wait_for_event(&self) -> Result<RawEvent> {
        (**self).wait_for_event()
    }
    fn flush(&self) -> Result<()> {
        (**self).flush()
    }
}
