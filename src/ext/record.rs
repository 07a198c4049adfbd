//! RECORD: recording of the protocol traffic of other clients.

use crate::connection::{RequestConnection, RequestMode};
use crate::cookie::{Cookie, MultiReply, MultiReplyCookie, VoidCookie};
use crate::error::Result;
use crate::extension::{Extension, ExtensionInfo};
use crate::list::{FixedElement, List, VarElement, VarList};
use crate::raw::RawError;
use crate::request::{ConnectionExt, ReplyRequest, Request, VoidRequest};
use crate::wire::{self, Reader, RequestWriter};
use crate::x_error::{dispatch_with, XError, XErrorKind};

pub const EXTENSION: Extension = Extension { name: "RECORD", events: 0, errors: 1 };

/// Special `ClientSpec` values.
pub mod client_spec {
    pub const CURRENT_CLIENTS: u32 = 1;
    pub const FUTURE_CLIENTS: u32 = 2;
    pub const ALL_CLIENTS: u32 = 3;
}

/// Bits of `element_header`.
pub mod header {
    pub const FROM_SERVER_TIME: u8 = 0x01;
    pub const FROM_CLIENT_TIME: u8 = 0x02;
    pub const FROM_CLIENT_SEQUENCE: u8 = 0x04;
}

#[derive(Debug, Default, Copy, Clone, Hash, PartialEq, Eq)]
pub struct Range8 {
    pub first: u8,
    pub last: u8,
}

#[derive(Debug, Default, Copy, Clone, Hash, PartialEq, Eq)]
pub struct Range16 {
    pub first: u16,
    pub last: u16,
}

#[derive(Debug, Default, Copy, Clone, Hash, PartialEq, Eq)]
pub struct ExtRange {
    pub major: Range8,
    pub minor: Range16,
}

/// What to record of the selected clients.
#[derive(Debug, Default, Copy, Clone, Hash, PartialEq, Eq)]
pub struct Range {
    pub core_requests: Range8,
    pub core_replies: Range8,
    pub ext_requests: ExtRange,
    pub ext_replies: ExtRange,
    pub delivered_events: Range8,
    pub device_events: Range8,
    pub errors: Range8,
    pub client_started: bool,
    pub client_died: bool,
}

fn read_range8(r: Reader, offset: usize) -> Range8 {
    Range8 { first: r.u8(offset), last: r.u8(offset + 1) }
}

fn read_ext_range(r: Reader, offset: usize) -> ExtRange {
    ExtRange {
        major: read_range8(r, offset),
        minor: Range16 { first: r.u16(offset + 2), last: r.u16(offset + 4) },
    }
}

impl FixedElement for Range {
    const SIZE: usize = 24;
    fn read(r: Reader) -> Self {
        Range {
            core_requests: read_range8(r, 0),
            core_replies: read_range8(r, 2),
            ext_requests: read_ext_range(r, 4),
            ext_replies: read_ext_range(r, 10),
            delivered_events: read_range8(r, 16),
            device_events: read_range8(r, 18),
            errors: read_range8(r, 20),
            client_started: r.bool(22),
            client_died: r.bool(23),
        }
    }
}

impl Range {
    fn write(&self, w: &mut RequestWriter) {
        fn r8(w: &mut RequestWriter, r: Range8) {
            w.u8(r.first).u8(r.last);
        }
        fn ext(w: &mut RequestWriter, r: ExtRange) {
            r8(w, r.major);
            w.u16(r.minor.first).u16(r.minor.last);
        }
        r8(w, self.core_requests);
        r8(w, self.core_replies);
        ext(w, self.ext_requests);
        ext(w, self.ext_replies);
        r8(w, self.delivered_events);
        r8(w, self.device_events);
        r8(w, self.errors);
        w.bool(self.client_started).bool(self.client_died);
    }
}

/// One intercepted client of a `GetContext` reply.
#[derive(Debug, Copy, Clone)]
pub struct ClientInfo<'a> {
    pub client_resource: u32,
    pub ranges: List<'a, Range>,
}

impl<'a> VarElement<'a> for ClientInfo<'a> {
    fn parse(r: Reader<'a>) -> Option<(Self, usize)> {
        if r.len() < 8 {
            return None;
        }
        let num_ranges = r.u32(4) as usize;
        let size = 8 + num_ranges * Range::SIZE;
        if r.len() < size {
            return None;
        }
        let info = ClientInfo { client_resource: r.u32(0), ranges: List::new(r, 8, num_ranges) };
        Some((info, size))
    }
}

/// `category` of an `EnableContext` reply.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum Category {
    FromServer,
    FromClient,
    ClientStarted,
    ClientDied,
    StartOfData,
    EndOfData,
}

impl Category {
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0 => Category::FromServer,
            1 => Category::FromClient,
            2 => Category::ClientStarted,
            3 => Category::ClientDied,
            4 => Category::StartOfData,
            5 => Category::EndOfData,
            _ => return None,
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct QueryVersion {
    pub major_version: u16,
    pub minor_version: u16,
}

impl Request for QueryVersion {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 0;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u16(self.major_version).u16(self.minor_version);
    }
}
impl ReplyRequest for QueryVersion {
    type Reply = QueryVersionReply;
}

reply_kind!(QueryVersionReply = QueryVersionKind, 32);

impl QueryVersionReply {
    accessors! {
        major_version: u16 @ 8;
        minor_version: u16 @ 10;
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CreateContext<'a> {
    pub context: u32,
    pub element_header: u8,
    pub client_specs: &'a [u32],
    pub ranges: &'a [Range],
}

impl<'a> Request for CreateContext<'a> {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 1;
    fn validate(&self) -> Result<()> {
        wire::check_length::<u32>("client_specs", self.client_specs.len())?;
        wire::check_length::<u32>("ranges", self.ranges.len())
    }
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.context).u8(self.element_header).zeroes(3)
            .u32(self.client_specs.len() as u32)
            .u32(self.ranges.len() as u32);
        for &spec in self.client_specs {
            w.u32(spec);
        }
        for range in self.ranges {
            range.write(w);
        }
    }
}
impl<'a> VoidRequest for CreateContext<'a> {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GetContext {
    pub context: u32,
}

impl Request for GetContext {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 4;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.context);
    }
}
impl ReplyRequest for GetContext {
    type Reply = GetContextReply;
}

reply_kind!(GetContextReply = GetContextKind, 32);

impl GetContextReply {
    accessors! {
        element_header: u8 @ 8;
        num_intercepted_clients: u32 @ 12;
    }
    pub fn enabled(&self) -> bool {
        self.data_byte() != 0
    }
    pub fn intercepted_clients(&self) -> VarList<ClientInfo> {
        VarList::new(self.reader(), 32, self.num_intercepted_clients() as usize)
    }
}

/// Starts recording. The server answers with a stream of replies until the
/// context is disabled.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EnableContext {
    pub context: u32,
}

impl Request for EnableContext {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 5;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.context);
    }
}
impl ReplyRequest for EnableContext {
    type Reply = EnableContextReply;
}

reply_kind!(EnableContextReply = EnableContextKind, 32);

impl EnableContextReply {
    accessors! {
        element_header: u8 @ 8;
        client_swapped: bool @ 9;
        xid_base: u32 @ 12;
        server_time: u32 @ 16;
        rec_sequence_num: u32 @ 20;
    }
    pub fn category(&self) -> Option<Category> {
        Category::from_u8(self.data_byte())
    }
    /// The recorded protocol elements.
    pub fn data(&self) -> &[u8] {
        self.reader().slice(32..32 + 4 * self.length() as usize)
    }
}

impl MultiReply for EnableContextReply {
    fn is_last(&self) -> bool {
        self.category() == Some(Category::EndOfData)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DisableContext {
    pub context: u32,
}

impl Request for DisableContext {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 6;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.context);
    }
}
impl VoidRequest for DisableContext {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FreeContext {
    pub context: u32,
}

impl Request for FreeContext {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 7;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.context);
    }
}
impl VoidRequest for FreeContext {}

pub trait RecordExt: RequestConnection {
    fn record_query_version(&self, major_version: u16, minor_version: u16, mode: RequestMode) -> Result<Cookie<'_, Self, QueryVersionReply>> {
        self.send_with_reply(QueryVersion { major_version, minor_version }, mode)
    }
    fn record_create_context(&self, context: u32, element_header: u8, client_specs: &[u32], ranges: &[Range], mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        self.send_void(CreateContext { context, element_header, client_specs, ranges }, mode)
    }
    fn record_get_context(&self, context: u32, mode: RequestMode) -> Result<Cookie<'_, Self, GetContextReply>> {
        self.send_with_reply(GetContext { context }, mode)
    }
    /// Blocks this connection's replies until the context is disabled from
    /// another connection; use a dedicated connection for it.
    fn record_enable_context(&self, context: u32) -> Result<MultiReplyCookie<'_, Self, EnableContextReply>> {
        self.send_with_replies(EnableContext { context })
    }
    fn record_disable_context(&self, context: u32, mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        self.send_void(DisableContext { context }, mode)
    }
    fn record_free_context(&self, context: u32, mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        self.send_void(FreeContext { context }, mode)
    }
}

impl<C: RequestConnection + ?Sized> RecordExt for C {}

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("BadContext (invalid record {invalid_record})")]
    BadContext { invalid_record: u32 },
}

pub(crate) fn decode_error(number: u8, raw: &RawError) -> Option<XErrorKind> {
    match number {
        0 => Some(XErrorKind::Record(RecordError::BadContext { invalid_record: raw.bad_value() })),
        _ => None,
    }
}

pub fn dispatch_error(info: &ExtensionInfo, raw: &RawError) -> ::std::result::Result<(), XError> {
    dispatch_with(info, decode_error, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::tests::{error_bytes, put_u32, reply_bytes};
    use crate::testing::FakeConnection;

    const INFO: ExtensionInfo = ExtensionInfo { major_opcode: 146, first_event: 0, first_error: 154 };

    fn conn() -> FakeConnection {
        FakeConnection::new().with_extension(&EXTENSION, INFO)
    }

    fn key_presses() -> Range {
        Range {
            delivered_events: Range8 { first: 2, last: 3 },
            ext_requests: ExtRange { major: Range8 { first: 128, last: 255 }, minor: Range16 { first: 0, last: 0xffff } },
            client_died: true,
            ..Range::default()
        }
    }

    #[test]
    fn create_context_layout() {
        let conn = conn();
        let specs = [client_spec::ALL_CLIENTS];
        conn.record_create_context(0x80_0001, header::FROM_SERVER_TIME, &specs, &[key_presses()], RequestMode::Checked).unwrap();
        let sent = conn.last_sent();
        assert_eq!(sent.bytes.len(), 20 + 4 + 24);
        let r = sent.reader();
        assert_eq!(r.u32(4), 0x80_0001);
        assert_eq!(r.u8(8), 1);
        assert_eq!(r.u32(12), 1);
        assert_eq!(r.u32(16), 1);
        assert_eq!(r.u32(20), 3);
        assert_eq!(Range::read(r.tail(24)), key_presses());
    }

    #[test]
    fn get_context_walks_clients() {
        let conn = conn();
        let cookie = conn.record_get_context(0x80_0001, RequestMode::Checked).unwrap();
        conn.queue_reply(cookie.sequence(), reply_bytes(8 + 24 + 8, |b| {
            b[1] = 1;
            put_u32(b, 12, 2);
            put_u32(b, 32, 0x20_0000);
            put_u32(b, 36, 1);
            b[40 + 16] = 2;
            b[40 + 17] = 3;
            put_u32(b, 64, 0x40_0000);
            put_u32(b, 68, 0);
        }));
        let reply = cookie.reply().unwrap();
        assert!(reply.enabled());
        let clients: Vec<_> = reply.intercepted_clients().collect();
        assert_eq!(clients.len(), 2);
        assert_eq!(clients[0].client_resource, 0x20_0000);
        assert_eq!(clients[0].ranges.get(0).unwrap().delivered_events, Range8 { first: 2, last: 3 });
        assert_eq!(clients[1].client_resource, 0x40_0000);
        assert!(clients[1].ranges.is_empty());
    }

    #[test]
    fn enable_context_streams_until_end_of_data() {
        let conn = conn();
        let cookie = conn.record_enable_context(0x80_0001).unwrap();
        let seq = cookie.sequence();
        conn.queue_reply(seq, reply_bytes(0, |b| b[1] = 4));
        conn.queue_reply(seq, reply_bytes(4, |b| {
            b[1] = 0;
            b[32] = 2;
        }));
        conn.queue_reply(seq, reply_bytes(0, |b| b[1] = 5));
        let categories: Vec<_> = cookie.map(|r| r.unwrap().category().unwrap()).collect();
        assert_eq!(categories, vec![Category::StartOfData, Category::FromServer, Category::EndOfData]);
        assert!(conn.discarded.borrow().is_empty());
    }

    #[test]
    fn bad_context() {
        let raw = RawError::new(error_bytes(154, 0x80_0001, 146, 5)).unwrap();
        let e = dispatch_error(&INFO, &raw).unwrap_err();
        assert_eq!(e.kind, XErrorKind::Record(RecordError::BadContext { invalid_record: 0x80_0001 }));
        let not_ours = RawError::new(error_bytes(155, 0, 146, 5)).unwrap();
        assert_eq!(dispatch_error(&INFO, &not_ours), Ok(()));
    }
}
