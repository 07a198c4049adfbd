//! XVideo: video adaptors and their ports.

use bitflags::bitflags;

use crate::connection::{RequestConnection, RequestMode};
use crate::cookie::{Cookie, VoidCookie};
use crate::error::Result;
use crate::event::{self, ExtensionEvent};
use crate::extension::{Extension, ExtensionInfo};
use crate::list::{FixedElement, List, VarElement, VarList};
use crate::raw::{RawError, RawEvent};
use crate::request::{ConnectionExt, ReplyRequest, Request, VoidRequest};
use crate::wire::{self, Reader, RequestWriter};
use crate::x_error::{dispatch_with, XError, XErrorKind};

pub const EXTENSION: Extension = Extension { name: "XVideo", events: 2, errors: 3 };

bitflags! {
    /// What an adaptor can do.
    pub struct AdaptorType: u8 {
        const INPUT  = 1 << 0;
        const OUTPUT = 1 << 1;
        const VIDEO  = 1 << 2;
        const STILL  = 1 << 3;
        const IMAGE  = 1 << 4;
    }
}

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum GrabPortStatus {
    Success,
    BadExtension,
    AlreadyGrabbed,
    InvalidTime,
    BadReply,
    BadAlloc,
}

impl GrabPortStatus {
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0 => GrabPortStatus::Success,
            1 => GrabPortStatus::BadExtension,
            2 => GrabPortStatus::AlreadyGrabbed,
            3 => GrabPortStatus::InvalidTime,
            4 => GrabPortStatus::BadReply,
            5 => GrabPortStatus::BadAlloc,
            _ => return None,
        })
    }
}

/// A visual an adaptor supports.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct Format {
    pub visual: u32,
    pub depth: u8,
}

impl FixedElement for Format {
    const SIZE: usize = 8;
    fn read(r: Reader) -> Self {
        Format { visual: r.u32(0), depth: r.u8(4) }
    }
}

/// One adaptor of a `QueryAdaptors` reply.
#[derive(Debug, Copy, Clone)]
pub struct AdaptorInfo<'a> {
    /// First port; the adaptor's ports are `base_id .. base_id + num_ports`.
    pub base_id: u32,
    pub num_ports: u16,
    pub kind: AdaptorType,
    pub name: &'a [u8],
    pub formats: List<'a, Format>,
}

impl<'a> AdaptorInfo<'a> {
    pub fn name_lossy(&self) -> String {
        String::from_utf8_lossy(self.name).into_owned()
    }
}

impl<'a> VarElement<'a> for AdaptorInfo<'a> {
    fn parse(r: Reader<'a>) -> Option<(Self, usize)> {
        if r.len() < 12 {
            return None;
        }
        let name_size = r.u16(4) as usize;
        let num_formats = r.u16(8) as usize;
        let formats_start = 12 + wire::padded(name_size);
        let size = formats_start + num_formats * Format::SIZE;
        if r.len() < size {
            return None;
        }
        let info = AdaptorInfo {
            base_id: r.u32(0),
            num_ports: r.u16(6),
            kind: AdaptorType::from_bits_truncate(r.u8(10)),
            name: r.slice(12..12 + name_size),
            formats: List::new(r, formats_start, num_formats),
        };
        Some((info, size))
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct QueryExtension;

impl Request for QueryExtension {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 0;
    fn serialize(&self, _: &mut RequestWriter) {}
}
impl ReplyRequest for QueryExtension {
    type Reply = QueryExtensionReply;
}

reply_kind!(QueryExtensionReply = QueryExtensionKind, 32);

impl QueryExtensionReply {
    accessors! {
        major: u16 @ 8;
        minor: u16 @ 10;
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct QueryAdaptors {
    pub window: u32,
}

impl Request for QueryAdaptors {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 1;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.window);
    }
}
impl ReplyRequest for QueryAdaptors {
    type Reply = QueryAdaptorsReply;
}

reply_kind!(QueryAdaptorsReply = QueryAdaptorsKind, 32);

impl QueryAdaptorsReply {
    accessors! {
        num_adaptors: u16 @ 8;
    }
    pub fn info(&self) -> VarList<AdaptorInfo> {
        VarList::new(self.reader(), 32, self.num_adaptors() as usize)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GrabPort {
    pub port: u32,
    /// Server time, or 0 for `CurrentTime`.
    pub time: u32,
}

impl Request for GrabPort {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 3;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.port).u32(self.time);
    }
}
impl ReplyRequest for GrabPort {
    type Reply = GrabPortReply;
}

reply_kind!(GrabPortReply = GrabPortKind, 32);

impl GrabPortReply {
    pub fn result(&self) -> Option<GrabPortStatus> {
        GrabPortStatus::from_u8(self.data_byte())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UngrabPort {
    pub port: u32,
    pub time: u32,
}

impl Request for UngrabPort {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 4;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.port).u32(self.time);
    }
}
impl VoidRequest for UngrabPort {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StopVideo {
    pub port: u32,
    pub drawable: u32,
}

impl Request for StopVideo {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 9;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.port).u32(self.drawable);
    }
}
impl VoidRequest for StopVideo {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SelectVideoNotify {
    pub drawable: u32,
    pub onoff: bool,
}

impl Request for SelectVideoNotify {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 10;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.drawable).bool(self.onoff).zeroes(3);
    }
}
impl VoidRequest for SelectVideoNotify {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SelectPortNotify {
    pub port: u32,
    pub onoff: bool,
}

impl Request for SelectPortNotify {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 11;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.port).bool(self.onoff).zeroes(3);
    }
}
impl VoidRequest for SelectPortNotify {}

pub trait XvExt: RequestConnection {
    fn xv_query_extension(&self, mode: RequestMode) -> Result<Cookie<'_, Self, QueryExtensionReply>> {
        self.send_with_reply(QueryExtension, mode)
    }
    fn xv_query_adaptors(&self, window: u32, mode: RequestMode) -> Result<Cookie<'_, Self, QueryAdaptorsReply>> {
        self.send_with_reply(QueryAdaptors { window }, mode)
    }
    fn xv_grab_port(&self, port: u32, time: u32, mode: RequestMode) -> Result<Cookie<'_, Self, GrabPortReply>> {
        self.send_with_reply(GrabPort { port, time }, mode)
    }
    fn xv_ungrab_port(&self, port: u32, time: u32, mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        self.send_void(UngrabPort { port, time }, mode)
    }
    fn xv_stop_video(&self, port: u32, drawable: u32, mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        self.send_void(StopVideo { port, drawable }, mode)
    }
    fn xv_select_video_notify(&self, drawable: u32, onoff: bool, mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        self.send_void(SelectVideoNotify { drawable, onoff }, mode)
    }
    fn xv_select_port_notify(&self, port: u32, onoff: bool, mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        self.send_void(SelectPortNotify { port, onoff }, mode)
    }
}

impl<C: RequestConnection + ?Sized> XvExt for C {}

event_wrapper!(VideoNotifyEvent, 32);

impl VideoNotifyEvent {
    accessors! {
        reason: u8 @ 1;
        time: u32 @ 4;
        drawable: u32 @ 8;
        port: u32 @ 12;
    }
}

event_wrapper!(PortNotifyEvent, 32);

impl PortNotifyEvent {
    accessors! {
        time: u32 @ 4;
        port: u32 @ 8;
        attribute: u32 @ 12;
        value: i32 @ 16;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    VideoNotify(VideoNotifyEvent),
    PortNotify(PortNotifyEvent),
}

impl ExtensionEvent for Event {
    fn extension() -> &'static Extension {
        &EXTENSION
    }
    fn parse(info: &ExtensionInfo, raw: &RawEvent) -> Option<Self> {
        match info.event_number(raw.response_type())? {
            0 => VideoNotifyEvent::from_raw(raw.clone()).map(Event::VideoNotify),
            1 => PortNotifyEvent::from_raw(raw.clone()).map(Event::PortNotify),
            _ => None,
        }
    }
}

pub fn dispatch<F: FnOnce(Event)>(info: &ExtensionInfo, raw: &RawEvent, handler: F) -> bool {
    event::dispatch::<Event, F>(info, raw, handler)
}

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, thiserror::Error)]
pub enum XvError {
    #[error("BadPort")]
    BadPort,
    #[error("BadEncoding")]
    BadEncoding,
    #[error("BadControl")]
    BadControl,
}

pub(crate) fn decode_error(number: u8, _: &RawError) -> Option<XErrorKind> {
    let e = match number {
        0 => XvError::BadPort,
        1 => XvError::BadEncoding,
        2 => XvError::BadControl,
        _ => return None,
    };
    Some(XErrorKind::Xv(e))
}

pub fn dispatch_error(info: &ExtensionInfo, raw: &RawError) -> ::std::result::Result<(), XError> {
    dispatch_with(info, decode_error, raw)
}
