//! XFIXES: selection and cursor tracking, cursor images and server-side regions.

use bitflags::bitflags;
use vek::{Extent2, Vec2};

use crate::connection::{RequestConnection, RequestMode};
use crate::cookie::{Cookie, VoidCookie};
use crate::error::Result;
use crate::event::{self, ExtensionEvent};
use crate::extension::{Extension, ExtensionInfo};
use crate::list::{FixedElement, List, Rectangle};
use crate::raw::{RawError, RawEvent};
use crate::request::{ConnectionExt, ReplyRequest, Request, VoidRequest};
use crate::wire::RequestWriter;
use crate::x_error::{dispatch_with, XError, XErrorKind};

pub const EXTENSION: Extension = Extension { name: "XFIXES", events: 2, errors: 1 };

bitflags! {
    /// What `SelectSelectionInput` reports.
    pub struct SelectionEventMask: u32 {
        const SET_SELECTION_OWNER      = 1 << 0;
        const SELECTION_WINDOW_DESTROY = 1 << 1;
        const SELECTION_CLIENT_CLOSE   = 1 << 2;
    }
}

bitflags! {
    pub struct CursorNotifyMask: u32 {
        const DISPLAY_CURSOR = 1 << 0;
    }
}

/// `subtype` of a `SelectionNotify` event.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum SelectionEvent {
    SetSelectionOwner,
    SelectionWindowDestroy,
    SelectionClientClose,
}

fn write_rectangle(w: &mut RequestWriter, r: &Rectangle) {
    w.i16(r.x).i16(r.y).u16(r.w).u16(r.h);
}

//
// Requests
//

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct QueryVersion {
    pub client_major_version: u32,
    pub client_minor_version: u32,
}

impl Request for QueryVersion {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 0;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.client_major_version).u32(self.client_minor_version);
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
pub struct SelectSelectionInput {
    pub window: u32,
    pub selection: u32,
    pub event_mask: SelectionEventMask,
}

impl Request for SelectSelectionInput {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 2;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.window).u32(self.selection).u32(self.event_mask.bits());
    }
}
impl VoidRequest for SelectSelectionInput {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SelectCursorInput {
    pub window: u32,
    pub event_mask: CursorNotifyMask,
}

impl Request for SelectCursorInput {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 3;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.window).u32(self.event_mask.bits());
    }
}
impl VoidRequest for SelectCursorInput {}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct GetCursorImage;

impl Request for GetCursorImage {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 4;
    fn serialize(&self, _: &mut RequestWriter) {}
}
impl ReplyRequest for GetCursorImage {
    type Reply = GetCursorImageReply;
}

reply_kind!(
    /// The current cursor image: `width * height` ARGB pixels.
    GetCursorImageReply = GetCursorImageKind, 32
);

impl GetCursorImageReply {
    accessors! {
        x: i16 @ 8;
        y: i16 @ 10;
        width: u16 @ 12;
        height: u16 @ 14;
        xhot: u16 @ 16;
        yhot: u16 @ 18;
        cursor_serial: u32 @ 20;
    }
    pub fn position(&self) -> Vec2<i16> {
        Vec2::new(self.x(), self.y())
    }
    pub fn size(&self) -> Extent2<u16> {
        Extent2::new(self.width(), self.height())
    }
    pub fn hotspot(&self) -> Vec2<u16> {
        Vec2::new(self.xhot(), self.yhot())
    }
    pub fn cursor_image(&self) -> List<u32> {
        List::new(self.reader(), 32, self.width() as usize * self.height() as usize)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CreateRegion<'a> {
    pub region: u32,
    pub rectangles: &'a [Rectangle],
}

impl<'a> Request for CreateRegion<'a> {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 5;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.region);
        for r in self.rectangles {
            write_rectangle(w, r);
        }
    }
}
impl<'a> VoidRequest for CreateRegion<'a> {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DestroyRegion {
    pub region: u32,
}

impl Request for DestroyRegion {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 10;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.region);
    }
}
impl VoidRequest for DestroyRegion {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FetchRegion {
    pub region: u32,
}

impl Request for FetchRegion {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 19;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.region);
    }
}
impl ReplyRequest for FetchRegion {
    type Reply = FetchRegionReply;
}

reply_kind!(FetchRegionReply = FetchRegionKind, 32);

impl FetchRegionReply {
    pub fn extents(&self) -> Rectangle {
        Rectangle::read(self.reader().tail(8))
    }
    /// The region's rectangles. Their count is implied by the reply length.
    pub fn rectangles(&self) -> List<Rectangle> {
        List::new(self.reader(), 32, self.length() as usize / 2)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HideCursor {
    pub window: u32,
}

impl Request for HideCursor {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 29;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.window);
    }
}
impl VoidRequest for HideCursor {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ShowCursor {
    pub window: u32,
}

impl Request for ShowCursor {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 30;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.window);
    }
}
impl VoidRequest for ShowCursor {}

/// XFIXES requests, for every connection.
pub trait XfixesExt: RequestConnection {
    fn xfixes_query_version(&self, client_major_version: u32, client_minor_version: u32, mode: RequestMode) -> Result<Cookie<'_, Self, QueryVersionReply>> {
        self.send_with_reply(QueryVersion { client_major_version, client_minor_version }, mode)
    }
    fn xfixes_select_selection_input(&self, window: u32, selection: u32, event_mask: SelectionEventMask, mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        self.send_void(SelectSelectionInput { window, selection, event_mask }, mode)
    }
    fn xfixes_select_cursor_input(&self, window: u32, event_mask: CursorNotifyMask, mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        self.send_void(SelectCursorInput { window, event_mask }, mode)
    }
    fn xfixes_get_cursor_image(&self, mode: RequestMode) -> Result<Cookie<'_, Self, GetCursorImageReply>> {
        self.send_with_reply(GetCursorImage, mode)
    }
    fn xfixes_create_region(&self, region: u32, rectangles: &[Rectangle], mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        self.send_void(CreateRegion { region, rectangles }, mode)
    }
    fn xfixes_destroy_region(&self, region: u32, mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        self.send_void(DestroyRegion { region }, mode)
    }
    fn xfixes_fetch_region(&self, region: u32, mode: RequestMode) -> Result<Cookie<'_, Self, FetchRegionReply>> {
        self.send_with_reply(FetchRegion { region }, mode)
    }
    fn xfixes_hide_cursor(&self, window: u32, mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        self.send_void(HideCursor { window }, mode)
    }
    fn xfixes_show_cursor(&self, window: u32, mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        self.send_void(ShowCursor { window }, mode)
    }
}

impl<C: RequestConnection + ?Sized> XfixesExt for C {}

//
// Events
//

event_wrapper!(SelectionNotifyEvent, 32);

impl SelectionNotifyEvent {
    accessors! {
        subtype: u8 @ 1;
        window: u32 @ 4;
        owner: u32 @ 8;
        selection: u32 @ 12;
        timestamp: u32 @ 16;
        selection_timestamp: u32 @ 20;
    }
    pub fn selection_event(&self) -> Option<SelectionEvent> {
        match self.subtype() {
            0 => Some(SelectionEvent::SetSelectionOwner),
            1 => Some(SelectionEvent::SelectionWindowDestroy),
            2 => Some(SelectionEvent::SelectionClientClose),
            _ => None,
        }
    }
}

event_wrapper!(CursorNotifyEvent, 32);

impl CursorNotifyEvent {
    accessors! {
        subtype: u8 @ 1;
        window: u32 @ 4;
        cursor_serial: u32 @ 8;
        timestamp: u32 @ 12;
        /// Atom naming the cursor, or 0.
        name: u32 @ 16;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    SelectionNotify(SelectionNotifyEvent),
    CursorNotify(CursorNotifyEvent),
}

impl ExtensionEvent for Event {
    fn extension() -> &'static Extension {
        &EXTENSION
    }
    fn parse(info: &ExtensionInfo, raw: &RawEvent) -> Option<Self> {
        match info.event_number(raw.response_type())? {
            0 => SelectionNotifyEvent::from_raw(raw.clone()).map(Event::SelectionNotify),
            1 => CursorNotifyEvent::from_raw(raw.clone()).map(Event::CursorNotify),
            _ => None,
        }
    }
}

/// Calls `handler` iff `raw` is an XFIXES event.
pub fn dispatch<F: FnOnce(Event)>(info: &ExtensionInfo, raw: &RawEvent, handler: F) -> bool {
    event::dispatch::<Event, F>(info, raw, handler)
}

//
// Errors
//

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, thiserror::Error)]
pub enum XfixesError {
    #[error("BadRegion")]
    BadRegion,
}

pub(crate) fn decode_error(number: u8, _: &RawError) -> Option<XErrorKind> {
    match number {
        0 => Some(XErrorKind::Xfixes(XfixesError::BadRegion)),
        _ => None,
    }
}

/// `Err` iff `raw` is an XFIXES error.
pub fn dispatch_error(info: &ExtensionInfo, raw: &RawError) -> ::std::result::Result<(), XError> {
    dispatch_with(info, decode_error, raw)
}
