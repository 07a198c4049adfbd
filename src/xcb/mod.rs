//! `RequestConnection` over libxcb.
//!
//! Only built with the `xcb` feature. The `xlib` feature additionally allows
//! borrowing the connection an Xlib `Display` runs on.

pub mod ffi;
mod connection;
#[cfg(feature = "xlib")]
mod xlib;

pub use self::connection::{Settings, XcbConnection};
