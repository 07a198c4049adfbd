//! XKEYBOARD: keyboard state, bells and XKB event selection.
//!
//! XKB allocates a single event code; every XKB event carries its actual
//! type in byte 1 (`xkbType`).

use bitflags::bitflags;

use crate::connection::{RequestConnection, RequestMode};
use crate::cookie::{Cookie, VoidCookie};
use crate::error::{Error, Result};
use crate::event::{self, ExtensionEvent};
use crate::extension::{Extension, ExtensionInfo};
use crate::raw::{RawError, RawEvent};
use crate::request::{ConnectionExt, ReplyRequest, Request, VoidRequest};
use crate::wire::RequestWriter;
use crate::x_error::{dispatch_with, XError, XErrorKind};

pub const EXTENSION: Extension = Extension { name: "XKEYBOARD", events: 1, errors: 1 };

/// Special `deviceSpec` values.
pub mod device_spec {
    pub const USE_CORE_KBD: u16 = 0x100;
    pub const USE_CORE_PTR: u16 = 0x200;
}

/// Special `bellClass` and `bellID` values.
pub mod bell {
    pub const KBD_FEEDBACK_CLASS: u16 = 0;
    pub const BELL_FEEDBACK_CLASS: u16 = 5;
    pub const DFLT_XI_CLASS: u16 = 0x300;
    pub const DFLT_XI_ID: u16 = 0x400;
}

bitflags! {
    /// XKB event types, as selected by `SelectEvents`.
    pub struct EventType: u16 {
        const NEW_KEYBOARD_NOTIFY     = 1 << 0;
        const MAP_NOTIFY              = 1 << 1;
        const STATE_NOTIFY            = 1 << 2;
        const CONTROLS_NOTIFY         = 1 << 3;
        const INDICATOR_STATE_NOTIFY  = 1 << 4;
        const INDICATOR_MAP_NOTIFY    = 1 << 5;
        const NAMES_NOTIFY            = 1 << 6;
        const COMPAT_MAP_NOTIFY       = 1 << 7;
        const BELL_NOTIFY             = 1 << 8;
        const ACTION_MESSAGE          = 1 << 9;
        const ACCESS_X_NOTIFY         = 1 << 10;
        const EXTENSION_DEVICE_NOTIFY = 1 << 11;
    }
}

bitflags! {
    /// Parts of the keyboard map, for `affectMap`/`map` and `MapNotify`.
    pub struct MapPart: u16 {
        const KEY_TYPES            = 1 << 0;
        const KEY_SYMS             = 1 << 1;
        const MODIFIER_MAP         = 1 << 2;
        const EXPLICIT_COMPONENTS  = 1 << 3;
        const KEY_ACTIONS          = 1 << 4;
        const KEY_BEHAVIORS        = 1 << 5;
        const VIRTUAL_MODS         = 1 << 6;
        const VIRTUAL_MOD_MAP      = 1 << 7;
    }
}

bitflags! {
    /// What changed, in a `StateNotify` event.
    pub struct StatePart: u16 {
        const MODIFIER_STATE      = 1 << 0;
        const MODIFIER_BASE       = 1 << 1;
        const MODIFIER_LATCH      = 1 << 2;
        const MODIFIER_LOCK       = 1 << 3;
        const GROUP_STATE         = 1 << 4;
        const GROUP_BASE          = 1 << 5;
        const GROUP_LATCH         = 1 << 6;
        const GROUP_LOCK          = 1 << 7;
        const COMPAT_STATE        = 1 << 8;
        const GRAB_MODS           = 1 << 9;
        const COMPAT_GRAB_MODS    = 1 << 10;
        const LOOKUP_MODS         = 1 << 11;
        const COMPAT_LOOKUP_MODS  = 1 << 12;
        const POINTER_BUTTONS     = 1 << 13;
    }
}

//
// Requests
//

/// Must be the first XKB request of a client.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UseExtension {
    pub wanted_major: u16,
    pub wanted_minor: u16,
}

impl Request for UseExtension {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 0;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u16(self.wanted_major).u16(self.wanted_minor);
    }
}
impl ReplyRequest for UseExtension {
    type Reply = UseExtensionReply;
}

reply_kind!(UseExtensionReply = UseExtensionKind, 32);

impl UseExtensionReply {
    accessors! {
        server_major: u16 @ 8;
        server_minor: u16 @ 10;
    }
    pub fn supported(&self) -> bool {
        self.data_byte() != 0
    }
}

/// `SelectEvents` without per-event details.
///
/// Only the event types whose selection has no detail part can be changed
/// selectively: `affect_which & !clear & !select_all` must be empty or
/// `MAP_NOTIFY` (whose detail is `affect_map`/`map`).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SelectEvents {
    pub device_spec: u16,
    pub affect_which: EventType,
    pub clear: EventType,
    pub select_all: EventType,
    pub affect_map: MapPart,
    pub map: MapPart,
}

impl SelectEvents {
    /// Event types for which the request would need a details section.
    pub fn needs_details(&self) -> EventType {
        (self.affect_which - self.clear - self.select_all) - EventType::MAP_NOTIFY
    }
}

impl Request for SelectEvents {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 1;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u16(self.device_spec)
            .u16(self.affect_which.bits())
            .u16(self.clear.bits())
            .u16(self.select_all.bits())
            .u16(self.affect_map.bits())
            .u16(self.map.bits());
    }
}
impl VoidRequest for SelectEvents {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Bell {
    pub device_spec: u16,
    pub bell_class: u16,
    pub bell_id: u16,
    pub percent: i8,
    pub force_sound: bool,
    pub event_only: bool,
    pub pitch: i16,
    pub duration: i16,
    /// Atom, or 0.
    pub name: u32,
    /// Window, or 0.
    pub window: u32,
}

impl Request for Bell {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 3;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u16(self.device_spec).u16(self.bell_class).u16(self.bell_id)
            .i8(self.percent).bool(self.force_sound).bool(self.event_only).zeroes(1)
            .i16(self.pitch).i16(self.duration).zeroes(2)
            .u32(self.name).u32(self.window);
    }
}
impl VoidRequest for Bell {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GetState {
    pub device_spec: u16,
}

impl Request for GetState {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 4;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u16(self.device_spec).zeroes(2);
    }
}
impl ReplyRequest for GetState {
    type Reply = GetStateReply;
}

reply_kind!(GetStateReply = GetStateKind, 32);

impl GetStateReply {
    accessors! {
        mods: u8 @ 8;
        base_mods: u8 @ 9;
        latched_mods: u8 @ 10;
        locked_mods: u8 @ 11;
        group: u8 @ 12;
        locked_group: u8 @ 13;
        base_group: i16 @ 14;
        latched_group: i16 @ 16;
        compat_state: u8 @ 18;
        grab_mods: u8 @ 19;
        compat_grab_mods: u8 @ 20;
        lookup_mods: u8 @ 21;
        compat_lookup_mods: u8 @ 22;
        ptr_btn_state: u16 @ 24;
    }
    pub fn device_id(&self) -> u8 {
        self.data_byte()
    }
}

pub trait XkbExt: RequestConnection {
    fn xkb_use_extension(&self, wanted_major: u16, wanted_minor: u16, mode: RequestMode) -> Result<Cookie<'_, Self, UseExtensionReply>> {
        self.send_with_reply(UseExtension { wanted_major, wanted_minor }, mode)
    }
    /// Fails with `InvalidArgument`, without sending anything, if the
    /// selection would need per-event details.
    fn xkb_select_events(&self, request: SelectEvents, mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        let details = request.needs_details();
        if !details.is_empty() {
            return Err(Error::invalid_arg(format!("SelectEvents would need details for {:?}; select them with `clear` or `select_all`", details)));
        }
        self.send_void(request, mode)
    }
    fn xkb_bell(&self, request: Bell, mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        self.send_void(request, mode)
    }
    fn xkb_get_state(&self, device_spec: u16, mode: RequestMode) -> Result<Cookie<'_, Self, GetStateReply>> {
        self.send_with_reply(GetState { device_spec }, mode)
    }
}

impl<C: RequestConnection + ?Sized> XkbExt for C {}

//
// Events
//

event_wrapper!(NewKeyboardNotifyEvent, 32);

impl NewKeyboardNotifyEvent {
    accessors! {
        time: u32 @ 4;
        device_id: u8 @ 8;
        old_device_id: u8 @ 9;
        min_key_code: u8 @ 10;
        max_key_code: u8 @ 11;
        old_min_key_code: u8 @ 12;
        old_max_key_code: u8 @ 13;
        request_major: u8 @ 14;
        request_minor: u8 @ 15;
        changed: u16 @ 16;
    }
}

event_wrapper!(MapNotifyEvent, 32);

impl MapNotifyEvent {
    accessors! {
        time: u32 @ 4;
        device_id: u8 @ 8;
        ptr_btn_actions: u8 @ 9;
        min_key_code: u8 @ 12;
        max_key_code: u8 @ 13;
        first_type: u8 @ 14;
        n_types: u8 @ 15;
        first_key_sym: u8 @ 16;
        n_key_syms: u8 @ 17;
        first_key_act: u8 @ 18;
        n_key_acts: u8 @ 19;
        first_key_behavior: u8 @ 20;
        n_key_behavior: u8 @ 21;
        first_key_explicit: u8 @ 22;
        n_key_explicit: u8 @ 23;
        first_mod_map_key: u8 @ 24;
        n_mod_map_keys: u8 @ 25;
        first_vmod_map_key: u8 @ 26;
        n_vmod_map_keys: u8 @ 27;
        virtual_mods: u16 @ 28;
    }
    pub fn changed(&self) -> MapPart {
        MapPart::from_bits_truncate(self.reader().u16(10))
    }
}

event_wrapper!(StateNotifyEvent, 32);

impl StateNotifyEvent {
    accessors! {
        time: u32 @ 4;
        device_id: u8 @ 8;
        mods: u8 @ 9;
        base_mods: u8 @ 10;
        latched_mods: u8 @ 11;
        locked_mods: u8 @ 12;
        group: u8 @ 13;
        base_group: i16 @ 14;
        latched_group: i16 @ 16;
        locked_group: u8 @ 18;
        compat_state: u8 @ 19;
        grab_mods: u8 @ 20;
        compat_grab_mods: u8 @ 21;
        lookup_mods: u8 @ 22;
        compat_lookup_mods: u8 @ 23;
        ptr_btn_state: u16 @ 24;
        keycode: u8 @ 28;
        event_type: u8 @ 29;
        request_major: u8 @ 30;
        request_minor: u8 @ 31;
    }
    pub fn changed(&self) -> StatePart {
        StatePart::from_bits_truncate(self.reader().u16(26))
    }
}

event_wrapper!(ControlsNotifyEvent, 32);

impl ControlsNotifyEvent {
    accessors! {
        time: u32 @ 4;
        device_id: u8 @ 8;
        num_groups: u8 @ 9;
        changed_controls: u32 @ 12;
        enabled_controls: u32 @ 16;
        enabled_control_changes: u32 @ 20;
        keycode: u8 @ 24;
        event_type: u8 @ 25;
        request_major: u8 @ 26;
        request_minor: u8 @ 27;
    }
}

event_wrapper!(IndicatorStateNotifyEvent, 32);

impl IndicatorStateNotifyEvent {
    accessors! {
        time: u32 @ 4;
        device_id: u8 @ 8;
        state: u32 @ 12;
        state_changed: u32 @ 16;
    }
}

event_wrapper!(IndicatorMapNotifyEvent, 32);

impl IndicatorMapNotifyEvent {
    accessors! {
        time: u32 @ 4;
        device_id: u8 @ 8;
        state: u32 @ 12;
        map_changed: u32 @ 16;
    }
}

event_wrapper!(NamesNotifyEvent, 32);

impl NamesNotifyEvent {
    accessors! {
        time: u32 @ 4;
        device_id: u8 @ 8;
        changed: u16 @ 10;
        first_type: u8 @ 12;
        n_types: u8 @ 13;
        first_level_name: u8 @ 14;
        n_level_names: u8 @ 15;
        n_radio_groups: u8 @ 17;
        n_key_aliases: u8 @ 18;
        changed_group_names: u8 @ 19;
        changed_virtual_mods: u16 @ 20;
        first_key: u8 @ 22;
        n_keys: u8 @ 23;
        changed_indicators: u32 @ 24;
    }
}

event_wrapper!(CompatMapNotifyEvent, 32);

impl CompatMapNotifyEvent {
    accessors! {
        time: u32 @ 4;
        device_id: u8 @ 8;
        changed_groups: u8 @ 9;
        first_si: u16 @ 10;
        n_si: u16 @ 12;
        n_total_si: u16 @ 14;
    }
}

event_wrapper!(BellNotifyEvent, 32);

impl BellNotifyEvent {
    accessors! {
        time: u32 @ 4;
        device_id: u8 @ 8;
        bell_class: u8 @ 9;
        bell_id: u8 @ 10;
        percent: u8 @ 11;
        pitch: u16 @ 12;
        duration: u16 @ 14;
        name: u32 @ 16;
        window: u32 @ 20;
        event_only: bool @ 24;
    }
}

event_wrapper!(ActionMessageEvent, 32);

impl ActionMessageEvent {
    accessors! {
        time: u32 @ 4;
        device_id: u8 @ 8;
        keycode: u8 @ 9;
        press: bool @ 10;
        key_event_follows: bool @ 11;
        mods: u8 @ 12;
        group: u8 @ 13;
    }
    pub fn message(&self) -> &[u8] {
        self.reader().slice(14..22)
    }
}

event_wrapper!(AccessXNotifyEvent, 32);

impl AccessXNotifyEvent {
    accessors! {
        time: u32 @ 4;
        device_id: u8 @ 8;
        keycode: u8 @ 9;
        detail: u16 @ 10;
        slow_keys_delay: u16 @ 12;
        debounce_delay: u16 @ 14;
    }
}

event_wrapper!(ExtensionDeviceNotifyEvent, 32);

impl ExtensionDeviceNotifyEvent {
    accessors! {
        time: u32 @ 4;
        device_id: u8 @ 8;
        reason: u16 @ 10;
        led_class: u16 @ 12;
        led_id: u16 @ 14;
        leds_defined: u32 @ 16;
        led_state: u32 @ 20;
        first_button: u8 @ 24;
        n_buttons: u8 @ 25;
        supported: u16 @ 26;
        unsupported: u16 @ 28;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    NewKeyboardNotify(NewKeyboardNotifyEvent),
    MapNotify(MapNotifyEvent),
    StateNotify(StateNotifyEvent),
    ControlsNotify(ControlsNotifyEvent),
    IndicatorStateNotify(IndicatorStateNotifyEvent),
    IndicatorMapNotify(IndicatorMapNotifyEvent),
    NamesNotify(NamesNotifyEvent),
    CompatMapNotify(CompatMapNotifyEvent),
    BellNotify(BellNotifyEvent),
    ActionMessage(ActionMessageEvent),
    AccessXNotify(AccessXNotifyEvent),
    ExtensionDeviceNotify(ExtensionDeviceNotifyEvent),
}

impl ExtensionEvent for Event {
    fn extension() -> &'static Extension {
        &EXTENSION
    }
    fn parse(info: &ExtensionInfo, raw: &RawEvent) -> Option<Self> {
        if info.event_number(raw.response_type())? != 0 {
            return None;
        }
        let raw = raw.clone();
        match raw.bytes()[1] {
            0 => NewKeyboardNotifyEvent::from_raw(raw).map(Event::NewKeyboardNotify),
            1 => MapNotifyEvent::from_raw(raw).map(Event::MapNotify),
            2 => StateNotifyEvent::from_raw(raw).map(Event::StateNotify),
            3 => ControlsNotifyEvent::from_raw(raw).map(Event::ControlsNotify),
            4 => IndicatorStateNotifyEvent::from_raw(raw).map(Event::IndicatorStateNotify),
            5 => IndicatorMapNotifyEvent::from_raw(raw).map(Event::IndicatorMapNotify),
            6 => NamesNotifyEvent::from_raw(raw).map(Event::NamesNotify),
            7 => CompatMapNotifyEvent::from_raw(raw).map(Event::CompatMapNotify),
            8 => BellNotifyEvent::from_raw(raw).map(Event::BellNotify),
            9 => ActionMessageEvent::from_raw(raw).map(Event::ActionMessage),
            10 => AccessXNotifyEvent::from_raw(raw).map(Event::AccessXNotify),
            11 => ExtensionDeviceNotifyEvent::from_raw(raw).map(Event::ExtensionDeviceNotify),
            xkb_type => {
                debug!("Unknown XKB event type {}", xkb_type);
                None
            },
        }
    }
}

/// Calls `handler` iff `raw` is an XKB event of a known type.
pub fn dispatch<F: FnOnce(Event)>(info: &ExtensionInfo, raw: &RawEvent, handler: F) -> bool {
    event::dispatch::<Event, F>(info, raw, handler)
}

//
// Errors
//

/// `value` of a Keyboard error.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum KeyboardErrorValue {
    BadDevice,
    BadClass,
    BadId,
    Other(u32),
}

impl KeyboardErrorValue {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0xff => KeyboardErrorValue::BadDevice,
            0xfe => KeyboardErrorValue::BadClass,
            0xfd => KeyboardErrorValue::BadId,
            v => KeyboardErrorValue::Other(v),
        }
    }
}

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, thiserror::Error)]
pub enum XkbError {
    #[error("Keyboard ({0:?})")]
    Keyboard(KeyboardErrorValue),
}

pub(crate) fn decode_error(number: u8, raw: &RawError) -> Option<XErrorKind> {
    match number {
        0 => Some(XErrorKind::Xkb(XkbError::Keyboard(KeyboardErrorValue::from_u32(raw.bad_value())))),
        _ => None,
    }
}

pub fn dispatch_error(info: &ExtensionInfo, raw: &RawError) -> ::std::result::Result<(), XError> {
    dispatch_with(info, decode_error, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::raw::tests::{buffer, error_bytes, put_u16, put_u32, reply_bytes};
    use crate::testing::FakeConnection;

    const INFO: ExtensionInfo = ExtensionInfo { major_opcode: 135, first_event: 85, first_error: 137 };

    fn conn() -> FakeConnection {
        FakeConnection::new().with_extension(&EXTENSION, INFO)
    }

    fn xkb_event(xkb_type: u8, f: impl FnOnce(&mut [u8])) -> RawEvent {
        RawEvent::new(buffer(32, |b| {
            b[0] = INFO.first_event;
            b[1] = xkb_type;
            put_u32(b, 4, 5000);
            b[8] = 3;
            f(b);
        })).unwrap()
    }

    #[test]
    fn use_extension() {
        let conn = conn();
        let cookie = conn.xkb_use_extension(1, 0, RequestMode::Checked).unwrap();
        conn.queue_reply(cookie.sequence(), reply_bytes(0, |b| {
            b[1] = 1;
            put_u16(b, 8, 1);
            put_u16(b, 10, 0);
        }));
        let reply = cookie.reply().unwrap();
        assert!(reply.supported());
        assert_eq!(reply.server_major(), 1);
    }

    #[test]
    fn select_events_without_details() {
        let conn = conn();
        let all = EventType::STATE_NOTIFY | EventType::BELL_NOTIFY;
        let request = SelectEvents {
            device_spec: device_spec::USE_CORE_KBD,
            affect_which: all | EventType::MAP_NOTIFY,
            clear: EventType::empty(),
            select_all: all,
            affect_map: MapPart::KEY_SYMS,
            map: MapPart::KEY_SYMS,
        };
        conn.xkb_select_events(request, RequestMode::Unchecked).unwrap();
        let sent = conn.last_sent();
        assert_eq!(sent.bytes.len(), 16);
        let r = sent.reader();
        assert_eq!(r.u16(4), 0x100);
        assert_eq!(r.u16(6), 0b1_0000_0110);
        assert_eq!(r.u16(10), 0b1_0000_0100);
        assert_eq!(r.u16(14), 2);

        let partial = SelectEvents { select_all: EventType::empty(), ..request };
        let e = conn.xkb_select_events(partial, RequestMode::Unchecked).unwrap_err();
        assert_eq!(e.kind, ErrorKind::InvalidArgument);
        assert_eq!(conn.sent().len(), 1);
    }

    #[test]
    fn bell_layout() {
        let conn = conn();
        let request = Bell {
            device_spec: device_spec::USE_CORE_KBD,
            bell_class: bell::DFLT_XI_CLASS,
            bell_id: bell::DFLT_XI_ID,
            percent: -50,
            force_sound: true,
            event_only: false,
            pitch: 440,
            duration: 100,
            name: 0,
            window: 0x20_0001,
        };
        conn.xkb_bell(request, RequestMode::Unchecked).unwrap();
        let sent = conn.last_sent();
        assert_eq!(sent.bytes.len(), 28);
        let r = sent.reader();
        assert_eq!(r.i8(10), -50);
        assert!(r.bool(11));
        assert_eq!(r.i16(14), 440);
        assert_eq!(r.i16(16), 100);
        assert_eq!(r.u32(24), 0x20_0001);
    }

    #[test]
    fn get_state() {
        let conn = conn();
        let cookie = conn.xkb_get_state(device_spec::USE_CORE_KBD, RequestMode::Checked).unwrap();
        conn.queue_reply(cookie.sequence(), reply_bytes(0, |b| {
            b[1] = 3;
            b[8] = 0x05;
            b[11] = 0x02;
            put_u16(b, 16, (-1_i16) as u16);
            put_u16(b, 24, 0x100);
        }));
        let reply = cookie.reply().unwrap();
        assert_eq!(reply.device_id(), 3);
        assert_eq!(reply.mods(), 0x05);
        assert_eq!(reply.locked_mods(), 0x02);
        assert_eq!(reply.latched_group(), -1);
        assert_eq!(reply.ptr_btn_state(), 0x100);
    }

    #[test]
    fn state_notify_by_subtype() {
        let raw = xkb_event(2, |b| {
            b[9] = 0x04;
            put_u16(b, 26, (StatePart::MODIFIER_STATE | StatePart::MODIFIER_LATCH).bits());
            b[28] = 37;
        });
        let mut calls = 0;
        assert!(dispatch(&INFO, &raw, |e| {
            calls += 1;
            match e {
                Event::StateNotify(e) => {
                    assert_eq!(e.time(), 5000);
                    assert_eq!(e.device_id(), 3);
                    assert_eq!(e.mods(), 0x04);
                    assert_eq!(e.changed(), StatePart::MODIFIER_STATE | StatePart::MODIFIER_LATCH);
                    assert_eq!(e.keycode(), 37);
                },
                other => panic!("unexpected {:?}", other),
            }
        }));
        assert_eq!(calls, 1);
    }

    #[test]
    fn bell_and_access_x_notify() {
        let raw = xkb_event(8, |b| {
            b[11] = 50;
            put_u16(b, 12, 440);
            put_u32(b, 20, 0x20_0001);
            b[24] = 1;
        });
        match Event::parse(&INFO, &raw) {
            Some(Event::BellNotify(e)) => {
                assert_eq!(e.percent(), 50);
                assert_eq!(e.pitch(), 440);
                assert_eq!(e.window(), 0x20_0001);
                assert!(e.event_only());
            },
            other => panic!("unexpected {:?}", other),
        }
        let raw = xkb_event(10, |b| {
            b[9] = 38;
            put_u16(b, 12, 300);
        });
        match Event::parse(&INFO, &raw) {
            Some(Event::AccessXNotify(e)) => {
                assert_eq!(e.keycode(), 38);
                assert_eq!(e.slow_keys_delay(), 300);
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn every_subtype_is_decoded() {
        for xkb_type in 0..12 {
            assert!(Event::parse(&INFO, &xkb_event(xkb_type, |_| ())).is_some(), "xkbType {}", xkb_type);
        }
        assert!(Event::parse(&INFO, &xkb_event(12, |_| ())).is_none());
        let next_code = RawEvent::new(buffer(32, |b| b[0] = INFO.first_event + 1)).unwrap();
        assert!(!dispatch(&INFO, &next_code, |_| panic!("handler called")));
    }

    #[test]
    fn keyboard_error_values() {
        let raw = RawError::new(error_bytes(137, 0xfe, 135, 3)).unwrap();
        let e = dispatch_error(&INFO, &raw).unwrap_err();
        assert_eq!(e.kind, XErrorKind::Xkb(XkbError::Keyboard(KeyboardErrorValue::BadClass)));
        assert_eq!(KeyboardErrorValue::from_u32(7), KeyboardErrorValue::Other(7));
    }
}
