//! DRI2: direct rendering buffer sharing.

use crate::connection::{RequestConnection, RequestMode};
use crate::cookie::{Cookie, VoidCookie};
use crate::error::Result;
use crate::event::{self, ExtensionEvent};
use crate::extension::{Extension, ExtensionInfo};
use crate::raw::RawEvent;
use crate::request::{ConnectionExt, ReplyRequest, Request, VoidRequest};
use crate::wire::{self, RequestWriter};

pub const EXTENSION: Extension = Extension { name: "DRI2", events: 2, errors: 0 };

/// `driver_type` of `Connect`.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum DriverType {
    Dri,
    Vdpau,
}

impl DriverType {
    fn to_u32(self) -> u32 {
        match self {
            DriverType::Dri => 0,
            DriverType::Vdpau => 1,
        }
    }
}

/// `event_type` of a `BufferSwapComplete` event.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum SwapEventType {
    ExchangeComplete,
    BlitComplete,
    FlipComplete,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct QueryVersion {
    pub major_version: u32,
    pub minor_version: u32,
}

impl Request for QueryVersion {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 0;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.major_version).u32(self.minor_version);
    }
}
impl ReplyRequest for QueryVersion {
    type Reply = QueryVersionReply;
}

reply_kind!(QueryVersionReply = QueryVersionKind, 32);

impl QueryVersionReply {
    accessors! {
        major_version: u32 @ 8;
        minor_version: u32 @ 12;
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Connect {
    pub window: u32,
    pub driver_type: DriverType,
}

impl Request for Connect {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 1;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.window).u32(self.driver_type.to_u32());
    }
}
impl ReplyRequest for Connect {
    type Reply = ConnectReply;
}

reply_kind!(
    /// Driver name then device name, each padded to 4 bytes.
    ConnectReply = ConnectKind, 32
);

impl ConnectReply {
    accessors! {
        driver_name_length: u32 @ 8;
        device_name_length: u32 @ 12;
    }
    pub fn driver_name(&self) -> &[u8] {
        let len = self.driver_name_length() as usize;
        self.reader().slice(32..32 + len)
    }
    pub fn device_name(&self) -> &[u8] {
        let start = 32 + wire::padded(self.driver_name_length() as usize);
        let len = self.device_name_length() as usize;
        self.reader().slice(start..start + len)
    }
    /// Empty when the server can't do direct rendering for that window.
    pub fn driver_name_lossy(&self) -> String {
        String::from_utf8_lossy(self.driver_name()).into_owned()
    }
    pub fn device_name_lossy(&self) -> String {
        String::from_utf8_lossy(self.device_name()).into_owned()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Authenticate {
    pub window: u32,
    pub magic: u32,
}

impl Request for Authenticate {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 2;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.window).u32(self.magic);
    }
}
impl ReplyRequest for Authenticate {
    type Reply = AuthenticateReply;
}

reply_kind!(AuthenticateReply = AuthenticateKind, 32);

impl AuthenticateReply {
    pub fn authenticated(&self) -> bool {
        self.reader().u32(8) != 0
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CreateDrawable {
    pub drawable: u32,
}

impl Request for CreateDrawable {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 3;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.drawable);
    }
}
impl VoidRequest for CreateDrawable {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DestroyDrawable {
    pub drawable: u32,
}

impl Request for DestroyDrawable {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 4;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.drawable);
    }
}
impl VoidRequest for DestroyDrawable {}

pub trait Dri2Ext: RequestConnection {
    fn dri2_query_version(&self, major_version: u32, minor_version: u32, mode: RequestMode) -> Result<Cookie<'_, Self, QueryVersionReply>> {
        self.send_with_reply(QueryVersion { major_version, minor_version }, mode)
    }
    fn dri2_connect(&self, window: u32, driver_type: DriverType, mode: RequestMode) -> Result<Cookie<'_, Self, ConnectReply>> {
        self.send_with_reply(Connect { window, driver_type }, mode)
    }
    fn dri2_authenticate(&self, window: u32, magic: u32, mode: RequestMode) -> Result<Cookie<'_, Self, AuthenticateReply>> {
        self.send_with_reply(Authenticate { window, magic }, mode)
    }
    fn dri2_create_drawable(&self, drawable: u32, mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        self.send_void(CreateDrawable { drawable }, mode)
    }
    fn dri2_destroy_drawable(&self, drawable: u32, mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        self.send_void(DestroyDrawable { drawable }, mode)
    }
}

impl<C: RequestConnection + ?Sized> Dri2Ext for C {}

event_wrapper!(BufferSwapCompleteEvent, 32);

impl BufferSwapCompleteEvent {
    accessors! {
        event_type_raw: u16 @ 4;
        drawable: u32 @ 8;
        ust_hi: u32 @ 12;
        ust_lo: u32 @ 16;
        msc_hi: u32 @ 20;
        msc_lo: u32 @ 24;
        sbc: u32 @ 28;
    }
    pub fn event_type(&self) -> Option<SwapEventType> {
        match self.event_type_raw() {
            1 => Some(SwapEventType::ExchangeComplete),
            2 => Some(SwapEventType::BlitComplete),
            3 => Some(SwapEventType::FlipComplete),
            _ => None,
        }
    }
    pub fn ust(&self) -> u64 {
        (self.ust_hi() as u64) << 32 | self.ust_lo() as u64
    }
    pub fn msc(&self) -> u64 {
        (self.msc_hi() as u64) << 32 | self.msc_lo() as u64
    }
}

event_wrapper!(InvalidateBuffersEvent, 32);

impl InvalidateBuffersEvent {
    accessors! {
        drawable: u32 @ 4;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    BufferSwapComplete(BufferSwapCompleteEvent),
    InvalidateBuffers(InvalidateBuffersEvent),
}

impl ExtensionEvent for Event {
    fn extension() -> &'static Extension {
        &EXTENSION
    }
    fn parse(info: &ExtensionInfo, raw: &RawEvent) -> Option<Self> {
        match info.event_number(raw.response_type())? {
            0 => BufferSwapCompleteEvent::from_raw(raw.clone()).map(Event::BufferSwapComplete),
            1 => InvalidateBuffersEvent::from_raw(raw.clone()).map(Event::InvalidateBuffers),
            _ => None,
        }
    }
}

pub fn dispatch<F: FnOnce(Event)>(info: &ExtensionInfo, raw: &RawEvent, handler: F) -> bool {
    event::dispatch::<Event, F>(info, raw, handler)
}
