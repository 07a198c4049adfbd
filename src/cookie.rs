//! Cookies: the handle a request leaves behind until its reply is awaited.

use std::marker::PhantomData;

use crate::connection::{RequestConnection, RequestMode, ReplyOrError, SequenceNumber};
use crate::error::{Error, ReplyError, Result};
use crate::reply::FromRawReply;
use crate::request::ConnectionExt;

/// The pending reply of a request.
///
/// Dropping a cookie without asking for its reply discards the reply.
#[derive(Debug)]
pub struct Cookie<'c, C: RequestConnection + ?Sized, R> {
    conn: &'c C,
    sequence: SequenceNumber,
    mode: RequestMode,
    consumed: bool,
    _reply: PhantomData<fn() -> R>,
}

impl<'c, C: RequestConnection + ?Sized, R: FromRawReply> Cookie<'c, C, R> {
    pub(crate) fn new(conn: &'c C, sequence: SequenceNumber, mode: RequestMode) -> Self {
        Self { conn, sequence, mode, consumed: false, _reply: PhantomData }
    }
    pub fn sequence(&self) -> SequenceNumber {
        self.sequence
    }
    pub fn mode(&self) -> RequestMode {
        self.mode
    }

    /// Blocks until the reply arrives and decodes it.
    ///
    /// X errors of checked requests come back as `ReplyError::X`. For
    /// unchecked requests the error goes to the event queue and this returns
    /// a `Failed` connection error instead.
    pub fn reply(mut self) -> ::std::result::Result<R, ReplyError> {
        self.consumed = true;
        match self.conn.wait_for_reply(self.sequence)? {
            Some(ReplyOrError::Reply(raw)) => Ok(R::from_raw_reply(raw)?),
            Some(ReplyOrError::Error(raw)) => Err(ReplyError::X(self.conn.parse_error(&raw))),
            None => Err(Error::failed(format!("Request {} failed; its error was queued as an event", self.sequence)).into()),
        }
    }

    /// Like `reply()`, but a failed request yields `Ok(None)`.
    ///
    /// Meant for unchecked requests, whose error is left in the event queue.
    pub fn reply_unchecked(mut self) -> Result<Option<R>> {
        self.consumed = true;
        match self.conn.wait_for_reply(self.sequence)? {
            Some(ReplyOrError::Reply(raw)) => R::from_raw_reply(raw).map(Some),
            Some(ReplyOrError::Error(raw)) => {
                warn!("Dropping error for request {}: {}", self.sequence, self.conn.parse_error(&raw));
                Ok(None)
            },
            None => Ok(None),
        }
    }

    /// Gives up on the reply.
    pub fn discard(self) {}
}

impl<'c, C: RequestConnection + ?Sized, R> Drop for Cookie<'c, C, R> {
    fn drop(&mut self) {
        if !self.consumed {
            self.conn.discard_reply(self.sequence);
        }
    }
}

/// The pending completion of a request that has no reply.
#[derive(Debug)]
pub struct VoidCookie<'c, C: RequestConnection + ?Sized> {
    conn: &'c C,
    sequence: SequenceNumber,
    mode: RequestMode,
    consumed: bool,
}

impl<'c, C: RequestConnection + ?Sized> VoidCookie<'c, C> {
    pub(crate) fn new(conn: &'c C, sequence: SequenceNumber, mode: RequestMode) -> Self {
        Self { conn, sequence, mode, consumed: false }
    }
    pub fn sequence(&self) -> SequenceNumber {
        self.sequence
    }
    pub fn mode(&self) -> RequestMode {
        self.mode
    }

    /// Blocks until the server has processed the request, and reports its error if any.
    ///
    /// Only meaningful for checked requests; errors of unchecked ones are
    /// delivered as events.
    pub fn check(mut self) -> ::std::result::Result<(), ReplyError> {
        self.consumed = true;
        if self.mode == RequestMode::Unchecked {
            return Err(Error::invalid_arg(format!("Request {} was sent unchecked; its errors are delivered as events", self.sequence)).into());
        }
        match self.conn.check_request(self.sequence)? {
            None => Ok(()),
            Some(raw) => Err(ReplyError::X(self.conn.parse_error(&raw))),
        }
    }

    /// Forgets about the request. Errors of checked requests are dropped.
    pub fn ignore_error(self) {}
}

impl<'c, C: RequestConnection + ?Sized> Drop for VoidCookie<'c, C> {
    fn drop(&mut self) {
        if !self.consumed && self.mode == RequestMode::Checked {
            self.conn.discard_reply(self.sequence);
        }
    }
}

/// A reply type for requests that may be answered several times.
pub trait MultiReply: FromRawReply {
    /// Whether this is the final reply of the request.
    fn is_last(&self) -> bool;
}

/// Iterator over the replies of a multi-reply request.
///
/// Ends after the reply for which `MultiReply::is_last` holds, or at the first error.
#[derive(Debug)]
pub struct MultiReplyCookie<'c, C: RequestConnection + ?Sized, R> {
    conn: &'c C,
    sequence: SequenceNumber,
    done: bool,
    _reply: PhantomData<fn() -> R>,
}

impl<'c, C: RequestConnection + ?Sized, R: MultiReply> MultiReplyCookie<'c, C, R> {
    pub(crate) fn new(conn: &'c C, sequence: SequenceNumber) -> Self {
        Self { conn, sequence, done: false, _reply: PhantomData }
    }
    pub fn sequence(&self) -> SequenceNumber {
        self.sequence
    }
}

impl<'c, C: RequestConnection + ?Sized, R: MultiReply> Iterator for MultiReplyCookie<'c, C, R> {
    type Item = ::std::result::Result<R, ReplyError>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = match self.conn.wait_for_reply(self.sequence) {
            Err(e) => Err(e.into()),
            Ok(None) => Err(Error::failed(format!("Request {} failed; its error was queued as an event", self.sequence)).into()),
            Ok(Some(ReplyOrError::Error(raw))) => Err(ReplyError::X(self.conn.parse_error(&raw))),
            Ok(Some(ReplyOrError::Reply(raw))) => R::from_raw_reply(raw).map_err(ReplyError::from),
        };
        self.done = match item {
            Ok(ref r) => r.is_last(),
            Err(_) => true,
        };
        Some(item)
    }
}

impl<'c, C: RequestConnection + ?Sized, R> Drop for MultiReplyCookie<'c, C, R> {
    fn drop(&mut self) {
        if !self.done {
            self.conn.discard_reply(self.sequence);
        }
    }
}
