//! Drives the typed layer through a `RequestConnection` implemented outside the crate.
//!
//! `MiniServer` plays both the transport and a very small X server that
//! only knows XFIXES.

#![cfg(all(feature = "xfixes", feature = "record"))]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};

use xcbext::ext::record::RecordExt;
use xcbext::ext::xfixes::{self, SelectionEventMask, XfixesError, XfixesExt};
use xcbext::extension::query_extension;
use xcbext::wire::{self, Reader};
use xcbext::{
    AnyEvent, ErrorKind, EventDispatcher, Extension, ExtensionCache, ExtensionInfo, RawError, RawEvent,
    RawReply, RawRequest, ReplyError, ReplyOrError, RequestConnection, RequestMode, Result, SequenceNumber,
    XErrorKind,
};

const XFIXES: ExtensionInfo = ExtensionInfo { major_opcode: 138, first_event: 87, first_error: 140 };

fn put_u16(b: &mut [u8], offset: usize, v: u16) {
    b[offset..offset + 2].copy_from_slice(&v.to_ne_bytes());
}
fn put_u32(b: &mut [u8], offset: usize, v: u32) {
    b[offset..offset + 4].copy_from_slice(&v.to_ne_bytes());
}

#[derive(Debug, Default)]
struct MiniServer {
    cache: ExtensionCache,
    next_sequence: Cell<SequenceNumber>,
    queries: Cell<usize>,
    unchecked: RefCell<HashSet<SequenceNumber>>,
    pending: RefCell<HashMap<SequenceNumber, ReplyOrError>>,
    events: RefCell<VecDeque<RawEvent>>,
}

impl MiniServer {
    fn reply(&self, sequence: SequenceNumber, fill: impl FnOnce(&mut [u8])) {
        let mut b = vec![0; 32];
        b[0] = 1;
        put_u16(&mut b, 2, sequence as u16);
        fill(&mut b);
        let raw = RawReply::new(b.into_boxed_slice()).unwrap();
        self.pending.borrow_mut().insert(sequence, ReplyOrError::Reply(raw));
    }
    fn error(&self, sequence: SequenceNumber, code: u8, bad_value: u32, minor: u16, major: u8) {
        let mut b = vec![0; 32];
        b[1] = code;
        put_u16(&mut b, 2, sequence as u16);
        put_u32(&mut b, 4, bad_value);
        put_u16(&mut b, 8, minor);
        b[10] = major;
        let raw = RawError::new(b).unwrap();
        self.pending.borrow_mut().insert(sequence, ReplyOrError::Error(raw));
    }
    fn process(&self, sequence: SequenceNumber, extension: Option<&'static Extension>, request: &[u8]) {
        let r = Reader::new(request);
        match (extension.map(|e| e.name), r.u8(0), r.u8(1)) {
            (None, 98, _) => {
                self.queries.set(self.queries.get() + 1);
                let name = r.slice(8..8 + r.u16(4) as usize);
                let present = name == b"XFIXES";
                self.reply(sequence, |b| if present {
                    b[8] = 1;
                    b[9] = XFIXES.major_opcode;
                    b[10] = XFIXES.first_event;
                    b[11] = XFIXES.first_error;
                });
            },
            (Some("XFIXES"), _, 0) => self.reply(sequence, |b| {
                put_u32(b, 8, 5);
                put_u32(b, 12, 0);
            }),
            (Some("XFIXES"), major, 19) => self.error(sequence, XFIXES.first_error, r.u32(4), 19, major),
            (Some("XFIXES"), _, 2) => {
                let mut b = vec![0; 32];
                b[0] = XFIXES.first_event;
                put_u16(&mut b, 2, sequence as u16);
                put_u32(&mut b, 4, r.u32(4));
                put_u32(&mut b, 12, r.u32(8));
                self.events.borrow_mut().push_back(RawEvent::new(b).unwrap());
            },
            _ => (),
        }
    }
}

impl RequestConnection for MiniServer {
    fn send_request(&self, request: RawRequest) -> Result<SequenceNumber> {
        let RawRequest { extension, opcode, mut bytes, mode, .. } = request;
        match extension {
            Some(ext) => {
                let info = self.extension_information(ext)?.expect("only sent to present extensions");
                wire::fill_header(&mut bytes, info.major_opcode, Some(opcode));
            },
            None => wire::fill_header(&mut bytes, opcode, None),
        }
        let sequence = self.next_sequence.get() + 1;
        self.next_sequence.set(sequence);
        if mode == RequestMode::Unchecked {
            self.unchecked.borrow_mut().insert(sequence);
        }
        self.process(sequence, extension, &bytes);
        Ok(sequence)
    }
    fn wait_for_reply(&self, sequence: SequenceNumber) -> Result<Option<ReplyOrError>> {
        let answer = self.pending.borrow_mut().remove(&sequence);
        match answer {
            Some(ReplyOrError::Error(e)) if self.unchecked.borrow().contains(&sequence) => {
                self.events.borrow_mut().push_back(RawEvent::new(e.bytes().to_vec())?);
                Ok(None)
            },
            other => Ok(other),
        }
    }
    fn check_request(&self, sequence: SequenceNumber) -> Result<Option<RawError>> {
        match self.pending.borrow_mut().remove(&sequence) {
            Some(ReplyOrError::Error(e)) => Ok(Some(e)),
            _ => Ok(None),
        }
    }
    fn discard_reply(&self, sequence: SequenceNumber) {
        self.pending.borrow_mut().remove(&sequence);
    }
    fn extension_information(&self, extension: &'static Extension) -> Result<Option<ExtensionInfo>> {
        self.cache.get_or_resolve(extension, |ext| query_extension(self, ext.name))
    }
    fn poll_for_event(&self) -> Result<Option<RawEvent>> {
        Ok(self.events.borrow_mut().pop_front())
    }
    fn wait_for_event(&self) -> Result<RawEvent> {
        Ok(self.events.borrow_mut().pop_front().expect("nothing would ever arrive"))
    }
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn extension_is_queried_once() {
    init_logger();
    let conn = MiniServer::default();
    for _ in 0..3 {
        let reply = conn.xfixes_query_version(5, 0, RequestMode::Checked).unwrap().reply().unwrap();
        assert_eq!((reply.major_version(), reply.minor_version()), (5, 0));
    }
    assert_eq!(conn.queries.get(), 1);
}

#[test]
fn checked_errors_are_typed() {
    init_logger();
    let conn = MiniServer::default();
    match conn.xfixes_fetch_region(0x40_0001, RequestMode::Checked).unwrap().reply() {
        Err(ReplyError::X(e)) => {
            assert_eq!(e.kind, XErrorKind::Xfixes(XfixesError::BadRegion));
            assert_eq!(e.bad_value, 0x40_0001);
            assert_eq!((e.major_opcode, e.minor_opcode), (XFIXES.major_opcode, 19));
        },
        other => panic!("expected BadRegion, got {:?}", other),
    }
}

#[test]
fn unchecked_errors_arrive_as_events() {
    init_logger();
    let conn = MiniServer::default();
    let reply = conn.xfixes_fetch_region(7, RequestMode::Unchecked).unwrap().reply_unchecked().unwrap();
    assert!(reply.is_none());

    let events = EventDispatcher::new(&conn).unwrap();
    match events.poll(&conn).unwrap() {
        Some(AnyEvent::Error(e)) => assert_eq!(e.kind, XErrorKind::Xfixes(XfixesError::BadRegion)),
        other => panic!("expected a queued error, got {:?}", other),
    }
    assert!(events.poll(&conn).unwrap().is_none());
}

#[test]
fn selection_events_are_typed() {
    init_logger();
    let conn = MiniServer::default();
    let events = EventDispatcher::new(&conn).unwrap();
    conn.xfixes_select_selection_input(0x20_0003, 1, SelectionEventMask::SET_SELECTION_OWNER, RequestMode::Checked)
        .unwrap()
        .check()
        .unwrap();
    match events.poll(&conn).unwrap() {
        Some(AnyEvent::Xfixes(xfixes::Event::SelectionNotify(e))) => {
            assert_eq!(e.window(), 0x20_0003);
            assert_eq!(e.selection(), 1);
        },
        other => panic!("expected SelectionNotify, got {:?}", other),
    }
}

#[test]
fn absent_extension_is_unsupported() {
    init_logger();
    let conn = MiniServer::default();
    let e = conn.record_query_version(1, 13, RequestMode::Checked).unwrap_err();
    assert_eq!(e.kind, ErrorKind::Unsupported);
    assert_eq!(conn.extension_information(&xcbext::ext::record::EXTENSION).unwrap(), None);
}
