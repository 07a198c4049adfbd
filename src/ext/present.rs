//! Present: MSC-synchronized pixmap presentation.
//!
//! Present events are XGE events: they arrive with `response_type` 35 and are
//! told apart by the extension's major opcode and their 16-bit event type.

use bitflags::bitflags;
use vek::{Extent2, Vec2};

use crate::connection::{RequestConnection, RequestMode};
use crate::cookie::{Cookie, VoidCookie};
use crate::error::Result;
use crate::event::{self, generic_event_type, ExtensionEvent};
use crate::extension::{Extension, ExtensionInfo};
use crate::list::{FixedElement, List, Rectangle};
use crate::raw::RawEvent;
use crate::request::{ConnectionExt, ReplyRequest, Request, VoidRequest};
use crate::wire::{Reader, RequestWriter};

pub const EXTENSION: Extension = Extension { name: "Present", events: 0, errors: 0 };

bitflags! {
    /// Events selected by `SelectInput`.
    pub struct EventMask: u32 {
        const CONFIGURE_NOTIFY        = 1 << 0;
        const COMPLETE_NOTIFY         = 1 << 1;
        const IDLE_NOTIFY             = 1 << 2;
        const REDIRECT_NOTIFY         = 1 << 3;
    }
}

bitflags! {
    /// `options` of a `PresentPixmap` request, as echoed by `RedirectNotify`.
    pub struct Options: u32 {
        const ASYNC       = 1 << 0;
        const COPY        = 1 << 1;
        const UST         = 1 << 2;
        const SUBOPTIMAL  = 1 << 3;
    }
}

bitflags! {
    pub struct Capability: u32 {
        const ASYNC  = 1 << 0;
        const FENCE  = 1 << 1;
        const UST    = 1 << 2;
    }
}

/// `kind` of a `CompleteNotify` event.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum CompleteKind {
    Pixmap,
    NotifyMsc,
}

/// `mode` of a `CompleteNotify` event.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum CompleteMode {
    Copy,
    Flip,
    Skip,
    SuboptimalCopy,
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

/// Asks for a `CompleteNotify` event once the window's CRTC reaches the target MSC.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NotifyMsc {
    pub window: u32,
    pub serial: u32,
    pub target_msc: u64,
    pub divisor: u64,
    pub remainder: u64,
}

impl Request for NotifyMsc {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 2;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.window).u32(self.serial).zeroes(4)
            .u64(self.target_msc).u64(self.divisor).u64(self.remainder);
    }
}
impl VoidRequest for NotifyMsc {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SelectInput {
    /// Event ID, allocated by the client.
    pub eid: u32,
    pub window: u32,
    pub event_mask: EventMask,
}

impl Request for SelectInput {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 3;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.eid).u32(self.window).u32(self.event_mask.bits());
    }
}
impl VoidRequest for SelectInput {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct QueryCapabilities {
    /// A window or a CRTC.
    pub target: u32,
}

impl Request for QueryCapabilities {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 4;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.target);
    }
}
impl ReplyRequest for QueryCapabilities {
    type Reply = QueryCapabilitiesReply;
}

reply_kind!(QueryCapabilitiesReply = QueryCapabilitiesKind, 32);

impl QueryCapabilitiesReply {
    /// Unknown bits are dropped.
    pub fn capabilities(&self) -> Capability {
        Capability::from_bits_truncate(self.reader().u32(8))
    }
}

pub trait PresentExt: RequestConnection {
    fn present_query_version(&self, major_version: u32, minor_version: u32, mode: RequestMode) -> Result<Cookie<'_, Self, QueryVersionReply>> {
        self.send_with_reply(QueryVersion { major_version, minor_version }, mode)
    }
    fn present_notify_msc(&self, window: u32, serial: u32, target_msc: u64, divisor: u64, remainder: u64, mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        self.send_void(NotifyMsc { window, serial, target_msc, divisor, remainder }, mode)
    }
    fn present_select_input(&self, eid: u32, window: u32, event_mask: EventMask, mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        self.send_void(SelectInput { eid, window, event_mask }, mode)
    }
    fn present_query_capabilities(&self, target: u32, mode: RequestMode) -> Result<Cookie<'_, Self, QueryCapabilitiesReply>> {
        self.send_with_reply(QueryCapabilities { target }, mode)
    }
}

impl<C: RequestConnection + ?Sized> PresentExt for C {}

//
// Events
//

event_wrapper!(ConfigureNotifyEvent, 40);

impl ConfigureNotifyEvent {
    accessors! {
        event: u32 @ 12;
        window: u32 @ 16;
        x: i16 @ 20;
        y: i16 @ 22;
        width: u16 @ 24;
        height: u16 @ 26;
        off_x: i16 @ 28;
        off_y: i16 @ 30;
        pixmap_width: u16 @ 32;
        pixmap_height: u16 @ 34;
        pixmap_flags: u32 @ 36;
    }
    pub fn geometry(&self) -> Rectangle {
        Rectangle::new(self.x(), self.y(), self.width(), self.height())
    }
    pub fn offset(&self) -> Vec2<i16> {
        Vec2::new(self.off_x(), self.off_y())
    }
    pub fn pixmap_size(&self) -> Extent2<u16> {
        Extent2::new(self.pixmap_width(), self.pixmap_height())
    }
}

event_wrapper!(CompleteNotifyEvent, 40);

impl CompleteNotifyEvent {
    accessors! {
        kind_byte: u8 @ 10;
        mode_byte: u8 @ 11;
        event: u32 @ 12;
        window: u32 @ 16;
        serial: u32 @ 20;
        ust: u64 @ 24;
        msc: u64 @ 32;
    }
    pub fn kind(&self) -> Option<CompleteKind> {
        match self.kind_byte() {
            0 => Some(CompleteKind::Pixmap),
            1 => Some(CompleteKind::NotifyMsc),
            _ => None,
        }
    }
    pub fn mode(&self) -> Option<CompleteMode> {
        match self.mode_byte() {
            0 => Some(CompleteMode::Copy),
            1 => Some(CompleteMode::Flip),
            2 => Some(CompleteMode::Skip),
            3 => Some(CompleteMode::SuboptimalCopy),
            _ => None,
        }
    }
}

event_wrapper!(IdleNotifyEvent, 32);

impl IdleNotifyEvent {
    accessors! {
        event: u32 @ 12;
        window: u32 @ 16;
        serial: u32 @ 20;
        pixmap: u32 @ 24;
        idle_fence: u32 @ 28;
    }
}

/// One `(window, serial)` pair of a `RedirectNotify` event.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct Notify {
    pub window: u32,
    pub serial: u32,
}

impl FixedElement for Notify {
    const SIZE: usize = 8;
    fn read(r: Reader) -> Self {
        Notify { window: r.u32(0), serial: r.u32(4) }
    }
}

/// Size of a `RedirectNotify` event before its notify list.
const REDIRECT_NOTIFY_HEAD: usize = 104;

event_wrapper!(RedirectNotifyEvent, REDIRECT_NOTIFY_HEAD);

impl RedirectNotifyEvent {
    accessors! {
        update_window: bool @ 10;
        event: u32 @ 12;
        event_window: u32 @ 16;
        window: u32 @ 20;
        pixmap: u32 @ 24;
        serial: u32 @ 28;
        valid_region: u32 @ 32;
        update_region: u32 @ 36;
        x_off: i16 @ 56;
        y_off: i16 @ 58;
        target_crtc: u32 @ 60;
        wait_fence: u32 @ 64;
        idle_fence: u32 @ 68;
        target_msc: u64 @ 80;
        divisor: u64 @ 88;
        remainder: u64 @ 96;
    }
    pub fn valid_rect(&self) -> Rectangle {
        Rectangle::read(self.reader().tail(40))
    }
    pub fn update_rect(&self) -> Rectangle {
        Rectangle::read(self.reader().tail(48))
    }
    pub fn offset(&self) -> Vec2<i16> {
        Vec2::new(self.x_off(), self.y_off())
    }
    /// Unknown bits are dropped.
    pub fn options(&self) -> Options {
        Options::from_bits_truncate(self.reader().u32(72))
    }
    /// Windows and serials to notify once the pixmap is presented.
    pub fn notifies(&self) -> List<Notify> {
        let count = (self.reader().len() - REDIRECT_NOTIFY_HEAD) / Notify::SIZE;
        List::new(self.reader(), REDIRECT_NOTIFY_HEAD, count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ConfigureNotify(ConfigureNotifyEvent),
    CompleteNotify(CompleteNotifyEvent),
    IdleNotify(IdleNotifyEvent),
    RedirectNotify(RedirectNotifyEvent),
}

impl ExtensionEvent for Event {
    fn extension() -> &'static Extension {
        &EXTENSION
    }
    fn parse(info: &ExtensionInfo, raw: &RawEvent) -> Option<Self> {
        match generic_event_type(info, raw)? {
            0 => ConfigureNotifyEvent::from_raw(raw.clone()).map(Event::ConfigureNotify),
            1 => CompleteNotifyEvent::from_raw(raw.clone()).map(Event::CompleteNotify),
            2 => IdleNotifyEvent::from_raw(raw.clone()).map(Event::IdleNotify),
            3 => RedirectNotifyEvent::from_raw(raw.clone()).map(Event::RedirectNotify),
            evtype => {
                debug!("Unknown Present event type {}", evtype);
                None
            },
        }
    }
}

/// Calls `handler` iff `raw` is a Present GenericEvent.
pub fn dispatch<F: FnOnce(Event)>(info: &ExtensionInfo, raw: &RawEvent, handler: F) -> bool {
    event::dispatch::<Event, F>(info, raw, handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::tests::{buffer, put_u16, put_u32, put_u64, reply_bytes};
    use crate::raw::GE_GENERIC;
    use crate::testing::FakeConnection;

    const INFO: ExtensionInfo = ExtensionInfo { major_opcode: 148, first_event: 0, first_error: 0 };

    fn generic(evtype: u16, len: usize, f: impl FnOnce(&mut [u8])) -> RawEvent {
        RawEvent::new(buffer(len, |b| {
            b[0] = GE_GENERIC;
            b[1] = INFO.major_opcode;
            put_u32(b, 4, ((len - 32) / 4) as u32);
            put_u16(b, 8, evtype);
            f(b);
        })).unwrap()
    }

    #[test]
    fn notify_msc_layout() {
        let conn = FakeConnection::new().with_extension(&EXTENSION, INFO);
        conn.present_notify_msc(0x60_0001, 3, 1000, 2, 1, RequestMode::Unchecked).unwrap();
        let sent = conn.last_sent();
        assert_eq!(sent.bytes.len(), 40);
        let r = sent.reader();
        assert_eq!(r.u32(4), 0x60_0001);
        assert_eq!(r.u32(8), 3);
        assert_eq!(r.u64(16), 1000);
        assert_eq!(r.u64(24), 2);
        assert_eq!(r.u64(32), 1);
    }

    #[test]
    fn capabilities() {
        let conn = FakeConnection::new().with_extension(&EXTENSION, INFO);
        let cookie = conn.present_query_capabilities(1, RequestMode::Checked).unwrap();
        conn.queue_reply(cookie.sequence(), reply_bytes(0, |b| put_u32(b, 8, 0b1011)));
        let caps = cookie.reply().unwrap().capabilities();
        assert_eq!(caps, Capability::ASYNC | Capability::FENCE);
    }

    #[test]
    fn complete_notify() {
        let raw = generic(1, 40, |b| {
            b[10] = 1;
            b[11] = 1;
            put_u32(b, 16, 0x60_0001);
            put_u32(b, 20, 3);
            put_u64(b, 24, 123_456_789);
            put_u64(b, 32, 1001);
        });
        let mut seen = None;
        assert!(dispatch(&INFO, &raw, |e| seen = Some(e)));
        match seen {
            Some(Event::CompleteNotify(e)) => {
                assert_eq!(e.kind(), Some(CompleteKind::NotifyMsc));
                assert_eq!(e.mode(), Some(CompleteMode::Flip));
                assert_eq!(e.window(), 0x60_0001);
                assert_eq!(e.serial(), 3);
                assert_eq!(e.ust(), 123_456_789);
                assert_eq!(e.msc(), 1001);
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn configure_notify_geometry() {
        let raw = generic(0, 40, |b| {
            put_u16(b, 20, (-5_i16) as u16);
            put_u16(b, 22, 7);
            put_u16(b, 24, 640);
            put_u16(b, 26, 480);
            put_u16(b, 32, 800);
            put_u16(b, 34, 600);
        });
        match Event::parse(&INFO, &raw) {
            Some(Event::ConfigureNotify(e)) => {
                assert_eq!(e.geometry(), Rectangle::new(-5, 7, 640, 480));
                assert_eq!(e.pixmap_size(), Extent2::new(800, 600));
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn idle_notify() {
        let raw = generic(2, 32, |b| {
            put_u32(b, 12, 0x61_0000);
            put_u32(b, 16, 0x60_0001);
            put_u32(b, 20, 9);
            put_u32(b, 24, 0x62_0007);
            put_u32(b, 28, 0x63_0002);
        });
        let mut seen = None;
        assert!(dispatch(&INFO, &raw, |e| seen = Some(e)));
        match seen {
            Some(Event::IdleNotify(e)) => {
                assert_eq!(e.event(), 0x61_0000);
                assert_eq!(e.window(), 0x60_0001);
                assert_eq!(e.serial(), 9);
                assert_eq!(e.pixmap(), 0x62_0007);
                assert_eq!(e.idle_fence(), 0x63_0002);
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    fn redirect_notify(notifies: usize) -> RawEvent {
        generic(3, 104 + 8 * notifies, |b| {
            b[10] = 1;
            put_u32(b, 12, 0x61_0000);
            put_u32(b, 16, 0x60_0001);
            put_u32(b, 20, 0x60_0002);
            put_u32(b, 24, 0x62_0007);
            put_u32(b, 28, 11);
            put_u32(b, 32, 0x64_0001);
            put_u32(b, 36, 0x64_0002);
            put_u16(b, 40, 0);
            put_u16(b, 42, 0);
            put_u16(b, 44, 1920);
            put_u16(b, 46, 1080);
            put_u16(b, 48, 10);
            put_u16(b, 50, (-20_i16) as u16);
            put_u16(b, 52, 64);
            put_u16(b, 54, 32);
            put_u16(b, 56, 3);
            put_u16(b, 58, (-4_i16) as u16);
            put_u32(b, 60, 0x65_0001);
            put_u32(b, 64, 0x63_0001);
            put_u32(b, 68, 0x63_0002);
            put_u32(b, 72, 0b101);
            put_u64(b, 80, 5_000_000_001);
            put_u64(b, 88, 2);
            put_u64(b, 96, 1);
            for i in 0..notifies {
                put_u32(b, 104 + 8 * i, 0x70_0000 + i as u32);
                put_u32(b, 108 + 8 * i, 100 + i as u32);
            }
        })
    }

    #[test]
    fn redirect_notify_head_and_notifies() {
        let raw = redirect_notify(2);
        let mut seen = None;
        assert!(dispatch(&INFO, &raw, |e| seen = Some(e)));
        let e = match seen {
            Some(Event::RedirectNotify(e)) => e,
            other => panic!("unexpected {:?}", other),
        };
        assert!(e.update_window());
        assert_eq!(e.event(), 0x61_0000);
        assert_eq!(e.event_window(), 0x60_0001);
        assert_eq!(e.window(), 0x60_0002);
        assert_eq!(e.pixmap(), 0x62_0007);
        assert_eq!(e.serial(), 11);
        assert_eq!(e.valid_region(), 0x64_0001);
        assert_eq!(e.update_region(), 0x64_0002);
        assert_eq!(e.valid_rect(), Rectangle::new(0, 0, 1920, 1080));
        assert_eq!(e.update_rect(), Rectangle::new(10, -20, 64, 32));
        assert_eq!(e.offset(), Vec2::new(3, -4));
        assert_eq!(e.target_crtc(), 0x65_0001);
        assert_eq!(e.wait_fence(), 0x63_0001);
        assert_eq!(e.idle_fence(), 0x63_0002);
        assert_eq!(e.options(), Options::ASYNC | Options::UST);
        assert_eq!(e.target_msc(), 5_000_000_001);
        assert_eq!(e.divisor(), 2);
        assert_eq!(e.remainder(), 1);
        assert_eq!(e.notifies().to_vec(), vec![
            Notify { window: 0x70_0000, serial: 100 },
            Notify { window: 0x70_0001, serial: 101 },
        ]);
    }

    #[test]
    fn redirect_notify_without_notifies() {
        match Event::parse(&INFO, &redirect_notify(0)) {
            Some(Event::RedirectNotify(e)) => assert!(e.notifies().to_vec().is_empty()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn truncated_redirect_notify_is_rejected() {
        for &len in &[32, 40, 100] {
            let raw = generic(3, len, |_| ());
            assert!(Event::parse(&INFO, &raw).is_none(), "{} bytes accepted", len);
            assert!(!dispatch(&INFO, &raw, |_| panic!("handler called")));
        }
    }

    #[test]
    fn other_extensions_and_short_events_are_ignored() {
        let foreign = RawEvent::new(buffer(40, |b| {
            b[0] = GE_GENERIC;
            b[1] = 131;
        })).unwrap();
        assert!(!dispatch(&INFO, &foreign, |_| panic!("handler called")));
        let truncated = generic(1, 32, |_| ());
        assert!(!dispatch(&INFO, &truncated, |_| panic!("handler called")));
        let unknown = generic(9, 32, |_| ());
        assert!(Event::parse(&INFO, &unknown).is_none());
        let core = RawEvent::new(buffer(32, |b| b[0] = 12)).unwrap();
        assert!(Event::parse(&INFO, &core).is_none());
    }
}
