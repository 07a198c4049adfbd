//! Scripted connection for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
#[cfg(unix)]
use std::os::unix::io::OwnedFd;

use crate::connection::{RawRequest, ReplyOrError, ReplyShape, RequestConnection, RequestMode, SequenceNumber};
use crate::error::{Error, Result, failed};
use crate::extension::{Extension, ExtensionCache, ExtensionInfo};
use crate::raw::{RawError, RawEvent, RawReply};
use crate::wire;

/// What the fake connection saw go out.
#[derive(Debug, Clone)]
pub struct Sent {
    pub extension: Option<&'static str>,
    pub opcode: u8,
    pub bytes: Vec<u8>,
    pub shape: ReplyShape,
    pub mode: RequestMode,
    pub fds: usize,
}

impl Sent {
    pub fn reader(&self) -> wire::Reader {
        wire::Reader::new(&self.bytes)
    }
}

#[derive(Debug, Default)]
pub struct FakeConnection {
    extensions: HashMap<&'static str, ExtensionInfo>,
    cache: ExtensionCache,
    pub resolutions: Cell<usize>,
    next_sequence: Cell<SequenceNumber>,
    sent: RefCell<Vec<Sent>>,
    modes: RefCell<HashMap<SequenceNumber, RequestMode>>,
    replies: RefCell<HashMap<SequenceNumber, VecDeque<ReplyOrError>>>,
    events: RefCell<VecDeque<RawEvent>>,
    pub discarded: RefCell<Vec<SequenceNumber>>,
}

impl FakeConnection {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_extension(mut self, extension: &'static Extension, info: ExtensionInfo) -> Self {
        self.extensions.insert(extension.name, info);
        self
    }
    fn push(&self, sequence: SequenceNumber, r: ReplyOrError) {
        self.replies.borrow_mut().entry(sequence).or_insert_with(VecDeque::new).push_back(r);
    }
    pub fn queue_reply(&self, sequence: SequenceNumber, bytes: Vec<u8>) {
        let raw = RawReply::new(bytes.into_boxed_slice()).expect("scripted reply must be well-formed");
        self.push(sequence, ReplyOrError::Reply(raw));
    }
    #[cfg(unix)]
    pub fn queue_reply_with_fds(&self, sequence: SequenceNumber, bytes: Vec<u8>, fds: Vec<OwnedFd>) {
        let raw = RawReply::with_fds(bytes.into_boxed_slice(), fds).expect("scripted reply must be well-formed");
        self.push(sequence, ReplyOrError::Reply(raw));
    }
    pub fn queue_error(&self, sequence: SequenceNumber, bytes: Vec<u8>) {
        let raw = RawError::new(bytes).expect("scripted error must be well-formed");
        self.push(sequence, ReplyOrError::Error(raw));
    }
    pub fn queue_event(&self, bytes: Vec<u8>) {
        let raw = RawEvent::new(bytes).expect("scripted event must be well-formed");
        self.events.borrow_mut().push_back(raw);
    }
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.borrow().clone()
    }
    pub fn last_sent(&self) -> Sent {
        self.sent.borrow().last().cloned().expect("nothing was sent")
    }
    pub fn queued_events(&self) -> usize {
        self.events.borrow().len()
    }
}

#[cfg(unix)]
fn fd_count(request: &RawRequest) -> usize {
    request.fds.len()
}
#[cfg(not(unix))]
fn fd_count(_: &RawRequest) -> usize {
    0
}

impl RequestConnection for FakeConnection {
    fn send_request(&self, request: RawRequest) -> Result<SequenceNumber> {
        let fds = fd_count(&request);
        let RawRequest { extension, opcode, mut bytes, shape, mode, .. } = request;
        match extension {
            Some(ext) => {
                let info = self.extension_information(ext)?
                    .ok_or_else(|| Error::unsupported(ext.name))?;
                wire::fill_header(&mut bytes, info.major_opcode, Some(opcode));
            },
            None => wire::fill_header(&mut bytes, opcode, None),
        }
        let sequence = self.next_sequence.get() + 1;
        self.next_sequence.set(sequence);
        self.modes.borrow_mut().insert(sequence, mode);
        self.sent.borrow_mut().push(Sent {
            extension: extension.map(|e| e.name),
            opcode,
            bytes,
            shape,
            mode,
            fds,
        });
        Ok(sequence)
    }
    fn wait_for_reply(&self, sequence: SequenceNumber) -> Result<Option<ReplyOrError>> {
        let next = self.replies.borrow_mut().get_mut(&sequence).and_then(VecDeque::pop_front);
        match next {
            None => failed(format!("No reply scripted for request {}", sequence)),
            Some(ReplyOrError::Error(e)) if self.modes.borrow().get(&sequence) == Some(&RequestMode::Unchecked) => {
                self.events.borrow_mut().push_back(RawEvent::new(e.bytes().to_vec())?);
                Ok(None)
            },
            Some(r) => Ok(Some(r)),
        }
    }
    fn check_request(&self, sequence: SequenceNumber) -> Result<Option<RawError>> {
        let next = self.replies.borrow_mut().get_mut(&sequence).and_then(VecDeque::pop_front);
        match next {
            Some(ReplyOrError::Error(e)) => Ok(Some(e)),
            _ => Ok(None),
        }
    }
    fn discard_reply(&self, sequence: SequenceNumber) {
        self.replies.borrow_mut().remove(&sequence);
        self.discarded.borrow_mut().push(sequence);
    }
    fn extension_information(&self, extension: &'static Extension) -> Result<Option<ExtensionInfo>> {
        self.cache.get_or_resolve(extension, |ext| {
            self.resolutions.set(self.resolutions.get() + 1);
            Ok(self.extensions.get(ext.name).cloned())
        })
    }
    fn poll_for_event(&self) -> Result<Option<RawEvent>> {
        Ok(self.events.borrow_mut().pop_front())
    }
    fn wait_for_event(&self) -> Result<RawEvent> {
        match self.events.borrow_mut().pop_front() {
            Some(e) => Ok(e),
            None => failed("No event scripted"),
        }
    }
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
