//! Owned buffers for what the X server sends back: replies, events and errors.

use std::fmt;
use std::sync::Arc;
#[cfg(unix)]
use std::os::unix::io::OwnedFd;

use crate::error::{Result, failed};
use crate::wire::Reader;

/// Size of every event, error and reply header on the wire.
pub const HEADER_SIZE: usize = 32;

/// `response_type` of X errors.
pub const ERROR_RESPONSE: u8 = 0;
/// `response_type` of replies.
pub const REPLY_RESPONSE: u8 = 1;
/// `response_type` of XGE (GenericEvent) events.
pub const GE_GENERIC: u8 = 35;

/// A reply buffer, plus the file descriptors the server passed along with it.
///
/// Owns the memory; typed replies borrow it through `Reply<K>` accessors.
pub struct RawReply {
    bytes: Box<[u8]>,
    #[cfg(unix)]
    fds: Vec<OwnedFd>,
}

impl fmt::Debug for RawReply {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut s = f.debug_struct("RawReply");
        s.field("sequence", &self.sequence()).field("len", &self.bytes.len());
        #[cfg(unix)]
        s.field("fds", &self.fds.len());
        s.finish()
    }
}

impl RawReply {
    /// Wraps a reply buffer, checking its header and its `length` field.
    pub fn new(bytes: Box<[u8]>) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return failed(format!("Reply is {} bytes long, expected at least {}", bytes.len(), HEADER_SIZE));
        }
        if bytes[0] != REPLY_RESPONSE {
            return failed(format!("Buffer with response_type {} is not a reply", bytes[0]));
        }
        let expected = HEADER_SIZE + 4 * Reader::new(&bytes).u32(4) as usize;
        if bytes.len() < expected {
            return failed(format!("Reply is truncated: {} bytes, its length field says {}", bytes.len(), expected));
        }
        Ok(Self {
            bytes,
            #[cfg(unix)]
            fds: Vec::new(),
        })
    }
    #[cfg(unix)]
    pub fn with_fds(bytes: Box<[u8]>, fds: Vec<OwnedFd>) -> Result<Self> {
        let mut reply = Self::new(bytes)?;
        reply.fds = fds;
        Ok(reply)
    }
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
    pub fn reader(&self) -> Reader {
        Reader::new(&self.bytes)
    }
    /// Low 16 bits of the sequence number of the request this replies to.
    pub fn sequence(&self) -> u16 {
        self.reader().u16(2)
    }
    /// Length of the trailing data, in 4-byte units.
    pub fn length(&self) -> u32 {
        self.reader().u32(4)
    }
    #[cfg(unix)]
    pub fn fds(&self) -> &[OwnedFd] {
        &self.fds
    }
    /// Moves the file descriptors out; the reply keeps none.
    #[cfg(unix)]
    pub fn take_fds(&mut self) -> Vec<OwnedFd> {
        ::std::mem::replace(&mut self.fds, Vec::new())
    }
}

/// An event buffer, shared with every typed wrapper built from it.
#[derive(Clone, PartialEq, Eq)]
pub struct RawEvent(Arc<[u8]>);

impl fmt::Debug for RawEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RawEvent")
            .field("response_type", &self.response_type())
            .field("sequence", &self.sequence())
            .field("len", &self.0.len())
            .finish()
    }
}

impl RawEvent {
    /// Wraps an event buffer. XGE events may be longer than 32 bytes.
    pub fn new<B: Into<Arc<[u8]>>>(bytes: B) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.len() < HEADER_SIZE {
            return failed(format!("Event is {} bytes long, expected at least {}", bytes.len(), HEADER_SIZE));
        }
        Ok(RawEvent(bytes))
    }
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
    pub fn reader(&self) -> Reader {
        Reader::new(&self.0)
    }
    /// `response_type`, including the "sent by SendEvent" bit.
    pub fn response_type(&self) -> u8 {
        self.0[0]
    }
    /// `response_type` without the "sent by SendEvent" bit.
    pub fn code(&self) -> u8 {
        self.0[0] & 0x7f
    }
    pub fn is_send_event(&self) -> bool {
        self.0[0] & 0x80 != 0
    }
    pub fn sequence(&self) -> u16 {
        self.reader().u16(2)
    }
    /// X errors travel through the event queue when requests are unchecked.
    pub fn is_error(&self) -> bool {
        self.0[0] == ERROR_RESPONSE
    }
    pub fn into_error(self) -> Option<RawError> {
        if self.is_error() {
            Some(RawError(self.0))
        } else {
            None
        }
    }
}

/// An X error buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct RawError(Arc<[u8]>);

impl fmt::Debug for RawError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RawError")
            .field("error_code", &self.error_code())
            .field("sequence", &self.sequence())
            .field("bad_value", &self.bad_value())
            .field("major_opcode", &self.major_opcode())
            .field("minor_opcode", &self.minor_opcode())
            .finish()
    }
}

impl RawError {
    pub fn new<B: Into<Arc<[u8]>>>(bytes: B) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.len() < HEADER_SIZE {
            return failed(format!("Error is {} bytes long, expected {}", bytes.len(), HEADER_SIZE));
        }
        if bytes[0] != ERROR_RESPONSE {
            return failed(format!("Buffer with response_type {} is not an error", bytes[0]));
        }
        Ok(RawError(bytes))
    }
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
    pub fn reader(&self) -> Reader {
        Reader::new(&self.0)
    }
    pub fn error_code(&self) -> u8 {
        self.0[1]
    }
    pub fn sequence(&self) -> u16 {
        self.reader().u16(2)
    }
    /// The offending resource ID or value, for the errors that carry one.
    pub fn bad_value(&self) -> u32 {
        self.reader().u32(4)
    }
    pub fn minor_opcode(&self) -> u16 {
        self.reader().u16(8)
    }
    pub fn major_opcode(&self) -> u8 {
        self.0[10]
    }
}
