//! Event dispatch.
//!
//! Every extension module exposes an `Event` enum whose `parse` is a flat
//! switch over the event number. `dispatch` hands the typed event to a
//! handler; `EventDispatcher` does it for all compiled-in extensions at once,
//! for application event loops.

use crate::connection::RequestConnection;
use crate::error::Result;
#[allow(unused_imports)]
use crate::ext;
use crate::extension::{Extension, ExtensionInfo};
use crate::raw::{RawEvent, GE_GENERIC};
use crate::x_error::{ErrorDispatcher, XError};

/// The event enum of one extension.
pub trait ExtensionEvent: Sized {
    fn extension() -> &'static Extension;
    /// The typed event, iff `raw` is one of this extension's events.
    fn parse(info: &ExtensionInfo, raw: &RawEvent) -> Option<Self>;
}

/// Invokes `handler` with the typed event iff `raw` belongs to `E`'s extension.
///
/// Returns whether the handler was called.
pub fn dispatch<E: ExtensionEvent, F: FnOnce(E)>(info: &ExtensionInfo, raw: &RawEvent, handler: F) -> bool {
    match E::parse(info, raw) {
        Some(e) => {
            handler(e);
            true
        },
        None => false,
    }
}

/// For XGE extensions: the 16-bit event type, iff `raw` is a GenericEvent of this extension.
pub(crate) fn generic_event_type(info: &ExtensionInfo, raw: &RawEvent) -> Option<u16> {
    if raw.code() != GE_GENERIC || raw.bytes()[1] != info.major_opcode {
        return None;
    }
    Some(raw.reader().u16(8))
}

/// Any event an X connection can deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyEvent {
    #[cfg(feature = "dri2")]
    Dri2(ext::dri2::Event),
    #[cfg(feature = "present")]
    Present(ext::present::Event),
    #[cfg(feature = "xfixes")]
    Xfixes(ext::xfixes::Event),
    #[cfg(feature = "xkb")]
    Xkb(ext::xkb::Event),
    #[cfg(feature = "xprint")]
    XPrint(ext::xprint::Event),
    #[cfg(feature = "xv")]
    Xv(ext::xv::Event),
    /// An error of an unchecked request.
    Error(XError),
    /// A core event, or one of an extension this dispatcher doesn't decode.
    Core(RawEvent),
}

fn parse_with<E: ExtensionEvent>(info: Option<ExtensionInfo>, raw: &RawEvent) -> Option<E> {
    info.and_then(|info| E::parse(&info, raw))
}

/// Decodes events for every compiled-in extension the server has.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    errors: ErrorDispatcher,
    #[cfg(feature = "dri2")]
    dri2: Option<ExtensionInfo>,
    #[cfg(feature = "present")]
    present: Option<ExtensionInfo>,
    #[cfg(feature = "xfixes")]
    xfixes: Option<ExtensionInfo>,
    #[cfg(feature = "xkb")]
    xkb: Option<ExtensionInfo>,
    #[cfg(feature = "xprint")]
    xprint: Option<ExtensionInfo>,
    #[cfg(feature = "xv")]
    xv: Option<ExtensionInfo>,
}

impl EventDispatcher {
    pub fn new<C: RequestConnection + ?Sized>(conn: &C) -> Result<Self> {
        Ok(Self {
            errors: ErrorDispatcher::new(conn)?,
            #[cfg(feature = "dri2")]
            dri2: conn.extension_information(&ext::dri2::EXTENSION)?,
            #[cfg(feature = "present")]
            present: conn.extension_information(&ext::present::EXTENSION)?,
            #[cfg(feature = "xfixes")]
            xfixes: conn.extension_information(&ext::xfixes::EXTENSION)?,
            #[cfg(feature = "xkb")]
            xkb: conn.extension_information(&ext::xkb::EXTENSION)?,
            #[cfg(feature = "xprint")]
            xprint: conn.extension_information(&ext::xprint::EXTENSION)?,
            #[cfg(feature = "xv")]
            xv: conn.extension_information(&ext::xv::EXTENSION)?,
        })
    }

    pub fn errors(&self) -> &ErrorDispatcher {
        &self.errors
    }

    /// Classifies one raw event. Never fails: unknown events come back as `AnyEvent::Core`.
    pub fn parse(&self, raw: RawEvent) -> AnyEvent {
        if raw.is_error() {
            if let Some(err) = raw.clone().into_error() {
                return AnyEvent::Error(self.errors.parse(&err));
            }
        }
        #[cfg(feature = "dri2")]
        {
            if let Some(e) = parse_with(self.dri2, &raw) {
                return AnyEvent::Dri2(e);
            }
        }
        #[cfg(feature = "present")]
        {
            if let Some(e) = parse_with(self.present, &raw) {
                return AnyEvent::Present(e);
            }
        }
        #[cfg(feature = "xfixes")]
        {
            if let Some(e) = parse_with(self.xfixes, &raw) {
                return AnyEvent::Xfixes(e);
            }
        }
        #[cfg(feature = "xkb")]
        {
            if let Some(e) = parse_with(self.xkb, &raw) {
                return AnyEvent::Xkb(e);
            }
        }
        #[cfg(feature = "xprint")]
        {
            if let Some(e) = parse_with(self.xprint, &raw) {
                return AnyEvent::XPrint(e);
            }
        }
        #[cfg(feature = "xv")]
        {
            if let Some(e) = parse_with(self.xv, &raw) {
                return AnyEvent::Xv(e);
            }
        }
        AnyEvent::Core(raw)
    }

    /// Next queued event, if any, without blocking.
    pub fn poll<C: RequestConnection + ?Sized>(&self, conn: &C) -> Result<Option<AnyEvent>> {
        Ok(conn.poll_for_event()?.map(|raw| self.parse(raw)))
    }

    /// Next event, blocking until one arrives.
    pub fn wait<C: RequestConnection + ?Sized>(&self, conn: &C) -> Result<AnyEvent> {
        Ok(self.parse(conn.wait_for_event()?))
    }
}
