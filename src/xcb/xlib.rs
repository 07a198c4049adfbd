use x11::xlib::Display;
use x11::xlib_xcb::XGetXCBConnection;

use crate::error::{Result, invalid_arg};
use super::ffi;
use super::XcbConnection;

impl XcbConnection {
    /// (Xlib-only) Borrows the XCB connection underneath an Xlib `Display`.
    ///
    /// The `Display` keeps ownership and must outlive the returned value.
    /// Unless `XSetEventQueueOwner()` gave the event queue to XCB, events
    /// are still Xlib's to read.
    ///
    /// This function is unsafe because there's no guarantee that the pointer is valid.
    pub unsafe fn from_xlib_display(dpy: *mut Display) -> Result<Self> {
        if dpy.is_null() {
            return invalid_arg("Null Xlib display");
        }
        let c = XGetXCBConnection(dpy) as *mut ffi::xcb_connection_t;
        trace!("Borrowing the XCB connection of Xlib display {:?}", dpy);
        Self::from_raw(c)
    }
}
