//! xcbext - Typed X11 extension layer
//!
//! Sends requests of the X extensions that libxcb-style bindings usually
//! leave untyped (DRI2, DRI3, Present, RECORD, X-Resource, XFIXES,
//! XKEYBOARD, XPrint, SELinux, XVideo, XvMC), and turns their replies,
//! events and errors into typed values.
//!
//! The crate does not own the connection. Anything implementing
//! `RequestConnection` can carry the bytes; with the `xcb` feature,
//! `xcb::XcbConnection` does it through libxcb.
//!
//! ```no_run
//! # fn demo<C: xcbext::RequestConnection>(conn: &C) -> Result<(), xcbext::ReplyError> {
//! use xcbext::RequestMode;
//! use xcbext::ext::xfixes::XfixesExt;
//!
//! let version = conn.xfixes_query_version(5, 0, RequestMode::Checked)?.reply()?;
//! println!("XFIXES {}.{}", version.major_version(), version.minor_version());
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/xcbext/0.1.0")]

#[allow(unused_imports)]
#[macro_use]
extern crate log;

#[macro_use]
mod macros;

pub mod error;
pub use crate::error::{Error, ErrorKind, ReplyError, Result};
pub mod wire;
pub mod raw;
pub use crate::raw::{RawError, RawEvent, RawReply};
pub mod connection;
pub use crate::connection::{RawRequest, ReplyOrError, ReplyShape, RequestConnection, RequestMode, SequenceNumber};
pub mod extension;
pub use crate::extension::{Extension, ExtensionCache, ExtensionInfo};
pub mod request;
pub use crate::request::{ConnectionExt, ReplyRequest, Request, VoidRequest};
pub mod cookie;
pub use crate::cookie::{Cookie, MultiReplyCookie, VoidCookie};
pub mod reply;
pub use crate::reply::{Reply, ReplyKind};
pub mod list;
pub use crate::list::{List, Rectangle, VarList};
pub mod event;
pub use crate::event::{AnyEvent, EventDispatcher, ExtensionEvent};
pub mod x_error;
pub use crate::x_error::{CoreError, ErrorDispatcher, XError, XErrorKind};
pub mod ext;

#[cfg(all(unix, feature = "xcb"))]
pub mod xcb;

#[cfg(test)]
mod testing;
