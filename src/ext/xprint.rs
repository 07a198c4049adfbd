//! XPrint: print contexts and printer discovery.

use bitflags::bitflags;

use crate::connection::{RequestConnection, RequestMode};
use crate::cookie::{Cookie, VoidCookie};
use crate::error::Result;
use crate::event::{self, ExtensionEvent};
use crate::extension::{Extension, ExtensionInfo};
use crate::list::{VarElement, VarList};
use crate::raw::{RawError, RawEvent};
use crate::request::{ConnectionExt, ReplyRequest, Request, VoidRequest};
use crate::wire::{self, Reader, RequestWriter};
use crate::x_error::{dispatch_with, XError, XErrorKind};

pub const EXTENSION: Extension = Extension { name: "XpExtension", events: 2, errors: 2 };

bitflags! {
    pub struct EventMask: u32 {
        const PRINT     = 1 << 0;
        const ATTRIBUTE = 1 << 1;
    }
}

/// One printer of a `GetPrinterList` reply.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Printer<'a> {
    pub name: &'a [u8],
    pub description: &'a [u8],
}

impl<'a> Printer<'a> {
    pub fn name_lossy(&self) -> String {
        String::from_utf8_lossy(self.name).into_owned()
    }
    pub fn description_lossy(&self) -> String {
        String::from_utf8_lossy(self.description).into_owned()
    }
}

/// A `u32` length, then that many bytes padded to 4.
fn counted_bytes(r: Reader) -> Option<(&[u8], usize)> {
    if r.len() < 4 {
        return None;
    }
    let len = r.u32(0) as usize;
    let size = 4 + wire::padded(len);
    if r.len() < 4 + len {
        return None;
    }
    Some((r.slice(4..4 + len), size))
}

impl<'a> VarElement<'a> for Printer<'a> {
    fn parse(r: Reader<'a>) -> Option<(Self, usize)> {
        let (name, name_size) = counted_bytes(r)?;
        let (description, desc_size) = counted_bytes(r.tail(name_size))?;
        Some((Printer { name, description }, name_size + desc_size))
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct QueryVersion;

impl Request for QueryVersion {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 0;
    fn serialize(&self, _: &mut RequestWriter) {}
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
pub struct GetPrinterList<'a> {
    /// Empty for every printer.
    pub printer_name: &'a [u8],
    pub locale: &'a [u8],
}

impl<'a> Request for GetPrinterList<'a> {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 1;
    fn validate(&self) -> Result<()> {
        wire::check_length::<u32>("printer_name", self.printer_name.len())?;
        wire::check_length::<u32>("locale", self.locale.len())
    }
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.printer_name.len() as u32).u32(self.locale.len() as u32)
            .bytes(self.printer_name).bytes(self.locale);
    }
}
impl<'a> ReplyRequest for GetPrinterList<'a> {
    type Reply = GetPrinterListReply;
}

reply_kind!(GetPrinterListReply = GetPrinterListKind, 32);

impl GetPrinterListReply {
    accessors! {
        list_count: u32 @ 8;
    }
    pub fn printers(&self) -> VarList<Printer> {
        VarList::new(self.reader(), 32, self.list_count() as usize)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CreateContext<'a> {
    pub context_id: u32,
    pub printer_name: &'a [u8],
    pub locale: &'a [u8],
}

impl<'a> Request for CreateContext<'a> {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 2;
    fn validate(&self) -> Result<()> {
        wire::check_length::<u32>("printer_name", self.printer_name.len())?;
        wire::check_length::<u32>("locale", self.locale.len())
    }
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.context_id)
            .u32(self.printer_name.len() as u32).u32(self.locale.len() as u32)
            .bytes(self.printer_name).bytes(self.locale);
    }
}
impl<'a> VoidRequest for CreateContext<'a> {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SetContext {
    /// 0 unsets the current context.
    pub context: u32,
}

impl Request for SetContext {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 3;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.context);
    }
}
impl VoidRequest for SetContext {}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct GetContext;

impl Request for GetContext {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 4;
    fn serialize(&self, _: &mut RequestWriter) {}
}
impl ReplyRequest for GetContext {
    type Reply = GetContextReply;
}

reply_kind!(GetContextReply = GetContextKind, 32);

impl GetContextReply {
    accessors! {
        context: u32 @ 8;
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DestroyContext {
    pub context: u32,
}

impl Request for DestroyContext {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 5;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.context);
    }
}
impl VoidRequest for DestroyContext {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SelectInput {
    pub context: u32,
    pub event_mask: EventMask,
}

impl Request for SelectInput {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 15;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.context).u32(self.event_mask.bits());
    }
}
impl VoidRequest for SelectInput {}

pub trait XPrintExt: RequestConnection {
    fn xprint_query_version(&self, mode: RequestMode) -> Result<Cookie<'_, Self, QueryVersionReply>> {
        self.send_with_reply(QueryVersion, mode)
    }
    fn xprint_get_printer_list(&self, printer_name: &[u8], locale: &[u8], mode: RequestMode) -> Result<Cookie<'_, Self, GetPrinterListReply>> {
        self.send_with_reply(GetPrinterList { printer_name, locale }, mode)
    }
    fn xprint_create_context(&self, context_id: u32, printer_name: &[u8], locale: &[u8], mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        self.send_void(CreateContext { context_id, printer_name, locale }, mode)
    }
    fn xprint_set_context(&self, context: u32, mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        self.send_void(SetContext { context }, mode)
    }
    fn xprint_get_context(&self, mode: RequestMode) -> Result<Cookie<'_, Self, GetContextReply>> {
        self.send_with_reply(GetContext, mode)
    }
    fn xprint_destroy_context(&self, context: u32, mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        self.send_void(DestroyContext { context }, mode)
    }
    fn xprint_select_input(&self, context: u32, event_mask: EventMask, mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        self.send_void(SelectInput { context, event_mask }, mode)
    }
}

impl<C: RequestConnection + ?Sized> XPrintExt for C {}

event_wrapper!(NotifyEvent, 32);

impl NotifyEvent {
    accessors! {
        detail: u8 @ 1;
        context: u32 @ 4;
        cancel: bool @ 8;
    }
}

event_wrapper!(AttributNotifyEvent, 32);

impl AttributNotifyEvent {
    accessors! {
        detail: u8 @ 1;
        context: u32 @ 4;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Notify(NotifyEvent),
    AttributNotify(AttributNotifyEvent),
}

impl ExtensionEvent for Event {
    fn extension() -> &'static Extension {
        &EXTENSION
    }
    fn parse(info: &ExtensionInfo, raw: &RawEvent) -> Option<Self> {
        match info.event_number(raw.response_type())? {
            0 => NotifyEvent::from_raw(raw.clone()).map(Event::Notify),
            1 => AttributNotifyEvent::from_raw(raw.clone()).map(Event::AttributNotify),
            _ => None,
        }
    }
}

pub fn dispatch<F: FnOnce(Event)>(info: &ExtensionInfo, raw: &RawEvent, handler: F) -> bool {
    event::dispatch::<Event, F>(info, raw, handler)
}

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, thiserror::Error)]
pub enum XPrintError {
    #[error("BadContext")]
    BadContext,
    #[error("BadSequence")]
    BadSequence,
}

pub(crate) fn decode_error(number: u8, _: &RawError) -> Option<XErrorKind> {
    let e = match number {
        0 => XPrintError::BadContext,
        1 => XPrintError::BadSequence,
        _ => return None,
    };
    Some(XErrorKind::XPrint(e))
}

pub fn dispatch_error(info: &ExtensionInfo, raw: &RawError) -> ::std::result::Result<(), XError> {
    dispatch_with(info, decode_error, raw)
}
