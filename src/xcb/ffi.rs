//! The libxcb symbols `XcbConnection` needs, from `xcb-sys`, plus a few missing bits.

use std::os::raw::c_int;

pub use xcb_sys::{
    xcb_connection_t,
    xcb_extension_t,
    xcb_generic_error_t,
    xcb_generic_event_t,
    xcb_protocol_request_t,
    xcb_query_extension_reply_t,
    xcb_void_cookie_t,
    xcb_connect,
    xcb_connection_has_error,
    xcb_discard_reply64,
    xcb_disconnect,
    xcb_flush,
    xcb_get_extension_data,
    xcb_get_reply_fds,
    xcb_poll_for_event,
    xcb_request_check,
    xcb_send_request64,
    xcb_send_request_with_fds64,
    xcb_wait_for_event,
    xcb_wait_for_reply64,
};

/// `xcb-sys` keeps the fields of its `iovec` private. `libc::iovec` has the
/// same layout, and is cast to this one when handed to libxcb.
#[allow(non_camel_case_types)]
pub type xcb_iovec = xcb_sys::iovec;

pub const XCB_REQUEST_CHECKED: c_int = xcb_sys::XCB_REQUEST_CHECKED as c_int;
pub const XCB_REQUEST_REPLY_FDS: c_int = xcb_sys::XCB_REQUEST_REPLY_FDS as c_int;

/// Describes a value returned by `xcb_connection_has_error()`.
pub fn describe_connection_error(code: c_int) -> &'static str {
    if code < 0 {
        return "unknown error";
    }
    match code as u32 {
        xcb_sys::XCB_CONN_ERROR => "socket, pipe or stream error",
        xcb_sys::XCB_CONN_CLOSED_EXT_NOTSUPPORTED => "extension not supported",
        xcb_sys::XCB_CONN_CLOSED_MEM_INSUFFICIENT => "out of memory",
        xcb_sys::XCB_CONN_CLOSED_REQ_LEN_EXCEED => "request length exceeded",
        xcb_sys::XCB_CONN_CLOSED_PARSE_ERR => "could not parse the display string",
        xcb_sys::XCB_CONN_CLOSED_INVALID_SCREEN => "no such screen on the display",
        xcb_sys::XCB_CONN_CLOSED_FDPASSING_FAILED => "file descriptor passing failed",
        _ => "unknown error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_errors_are_described() {
        assert_eq!(describe_connection_error(xcb_sys::XCB_CONN_CLOSED_PARSE_ERR as c_int), "could not parse the display string");
        assert_eq!(describe_connection_error(-1), "unknown error");
        assert_eq!(describe_connection_error(42), "unknown error");
    }

    #[test]
    fn iovec_layouts_match() {
        use std::mem::{align_of, size_of};
        assert_eq!(size_of::<xcb_iovec>(), size_of::<libc::iovec>());
        assert_eq!(align_of::<xcb_iovec>(), align_of::<libc::iovec>());
    }
}
