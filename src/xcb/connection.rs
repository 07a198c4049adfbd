use std::collections::HashSet;
use std::ffi::CString;
use std::os::raw::{c_int, c_uint, c_void};
use std::os::unix::io::{FromRawFd, IntoRawFd, OwnedFd};
use std::ptr;
use std::slice;
use std::sync::{Mutex, MutexGuard, PoisonError};

use libc::iovec;

use crate::connection::{RawRequest, ReplyOrError, ReplyShape, RequestConnection, RequestMode, SequenceNumber};
use crate::error::{Error, Result, failed, invalid_arg};
use crate::extension::{Extension, ExtensionCache, ExtensionInfo};
use crate::raw::{RawError, RawEvent, RawReply, GE_GENERIC, HEADER_SIZE};
use crate::wire::Reader;
use super::ffi;

/// Parameters for `XcbConnection::connect_with()`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Display name given to `xcb_connect()`. `None` means `$DISPLAY`.
    pub display: Option<CString>,
    /// Overrides the screen number parsed from the display name.
    pub screen: Option<i32>,
}

struct ExtensionPtr(*mut ffi::xcb_extension_t);

unsafe impl Send for ExtensionPtr {}

// libxcb identifies extensions by the address of an `xcb_extension_t` it may
// write to, so each one is allocated once and lives for the whole process.
static XCB_EXTENSIONS: Mutex<Vec<(&'static str, ExtensionPtr)>> = Mutex::new(Vec::new());

fn xcb_extension(extension: &'static Extension) -> Result<*mut ffi::xcb_extension_t> {
    let mut all = XCB_EXTENSIONS.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(&(_, ExtensionPtr(p))) = all.iter().find(|&&(name, _)| name == extension.name) {
        return Ok(p);
    }
    let name = CString::new(extension.name)
        .map_err(|_| Error::invalid_arg(format!("Extension name `{}` contains a NUL byte", extension.name)))?;
    let p = Box::into_raw(Box::new(ffi::xcb_extension_t {
        name: name.into_raw(),
        global_id: 0,
    }));
    all.push((extension.name, ExtensionPtr(p)));
    Ok(p)
}

/// Re-packs an event buffer as it travels on the wire.
///
/// libxcb inserts a 4-byte `full_sequence` after the first 32 bytes, which
/// pushes the tail of XGE events 4 bytes further.
fn unpack_event(buf: &[u8]) -> Vec<u8> {
    let mut bytes = buf[..HEADER_SIZE].to_vec();
    if buf[0] & 0x7f == GE_GENERIC {
        bytes.extend_from_slice(&buf[HEADER_SIZE + 4..]);
    }
    bytes
}

/// A `RequestConnection` backed by libxcb.
///
/// libxcb is thread-safe, and so is this type.
#[derive(Debug)]
pub struct XcbConnection {
    c: *mut ffi::xcb_connection_t,
    owned: bool,
    preferred_screen: i32,
    extensions: ExtensionCache,
    fd_replies: Mutex<HashSet<SequenceNumber>>,
}

unsafe impl Send for XcbConnection {}
unsafe impl Sync for XcbConnection {}

impl Drop for XcbConnection {
    fn drop(&mut self) {
        if self.owned {
            trace!("Disconnecting from the X server");
            unsafe {
                ffi::xcb_disconnect(self.c);
            }
        }
    }
}

impl XcbConnection {
    /// Connects to `$DISPLAY`.
    pub fn connect() -> Result<Self> {
        Self::connect_with(&Settings::default())
    }

    pub fn connect_with(settings: &Settings) -> Result<Self> {
        let name_ptr = match settings.display {
            Some(ref s) => s.as_ptr(),
            None => ptr::null(),
        };
        let name = match settings.display {
            Some(ref s) => s.to_string_lossy().into_owned(),
            None => "$DISPLAY".to_owned(),
        };
        let mut screen: c_int = 0;
        let c = unsafe {
            ffi::xcb_connect(name_ptr, &mut screen)
        };
        if c.is_null() {
            return failed(format!("Failed to connect to X display `{}`", name));
        }
        // On failure, xcb_connect() still hands out a connection in an error
        // state, which must be disconnected all the same.
        let conn = Self::new(c, true, settings.screen.unwrap_or(screen));
        let code = unsafe { ffi::xcb_connection_has_error(c) };
        if code != 0 {
            return failed(format!("Failed to connect to X display `{}`: {}", name, ffi::describe_connection_error(code)));
        }
        trace!("Connected to X display `{}`, screen {}", name, conn.preferred_screen);
        Ok(conn)
    }

    /// Borrows an XCB connection owned by someone else. It is never disconnected from here.
    ///
    /// This function is unsafe because there's no guarantee that the pointer is valid,
    /// nor that it outlives the returned value.
    pub unsafe fn from_raw(c: *mut ffi::xcb_connection_t) -> Result<Self> {
        if c.is_null() {
            return invalid_arg("Null XCB connection");
        }
        Ok(Self::new(c, false, 0))
    }

    fn new(c: *mut ffi::xcb_connection_t, owned: bool, preferred_screen: i32) -> Self {
        Self {
            c,
            owned,
            preferred_screen,
            extensions: ExtensionCache::new(),
            fd_replies: Mutex::new(HashSet::new()),
        }
    }

    /// The underlying `xcb_connection_t`.
    ///
    /// Be careful: it is disconnected when `self` is dropped, if `self` owns it.
    pub fn as_raw(&self) -> *mut ffi::xcb_connection_t {
        self.c
    }
    /// Screen number from the display name (or `Settings::screen`), 0 for borrowed connections.
    pub fn preferred_screen(&self) -> i32 {
        self.preferred_screen
    }
    pub fn has_error(&self) -> bool {
        unsafe { ffi::xcb_connection_has_error(self.c) != 0 }
    }

    fn fd_replies(&self) -> MutexGuard<HashSet<SequenceNumber>> {
        self.fd_replies.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn connection_error(&self, what: &str) -> Error {
        let code = unsafe { ffi::xcb_connection_has_error(self.c) };
        let reason = format!("{} failed: XCB connection error {} ({})", what, code, ffi::describe_connection_error(code));
        error!("{}", reason);
        Error::failed(reason)
    }

    unsafe fn take_reply(&self, reply: *mut c_void, with_fds: bool) -> Result<RawReply> {
        let header = slice::from_raw_parts(reply as *const u8, HEADER_SIZE);
        let len = HEADER_SIZE + 4 * Reader::new(header).u32(4) as usize;
        let bytes: Box<[u8]> = slice::from_raw_parts(reply as *const u8, len).into();
        let mut fds = Vec::new();
        if with_fds {
            // Every reply that carries fds has their count in its data byte.
            let nfd = bytes[1] as usize;
            let p = ffi::xcb_get_reply_fds(self.c, reply, len);
            if !p.is_null() {
                fds = slice::from_raw_parts(p, nfd).iter().map(|&fd| OwnedFd::from_raw_fd(fd)).collect();
            }
        }
        libc::free(reply);
        RawReply::with_fds(bytes, fds)
    }
}

unsafe fn take_event(event: *mut ffi::xcb_generic_event_t) -> Result<RawEvent> {
    let p = event as *const u8;
    let header = slice::from_raw_parts(p, HEADER_SIZE);
    let len = if header[0] & 0x7f == GE_GENERIC {
        HEADER_SIZE + 4 + 4 * Reader::new(header).u32(4) as usize
    } else {
        HEADER_SIZE
    };
    let bytes = unpack_event(slice::from_raw_parts(p, len));
    libc::free(event as *mut c_void);
    RawEvent::new(bytes)
}

unsafe fn take_error(error: *mut ffi::xcb_generic_error_t) -> Result<RawError> {
    let bytes = slice::from_raw_parts(error as *const u8, HEADER_SIZE).to_vec();
    libc::free(error as *mut c_void);
    RawError::new(bytes)
}

impl RequestConnection for XcbConnection {
    fn send_request(&self, request: RawRequest) -> Result<SequenceNumber> {
        let RawRequest { extension, opcode, mut bytes, shape, mode, fds } = request;
        let ext = match extension {
            Some(e) => {
                if self.extension_information(e)?.is_none() {
                    return Err(Error::unsupported(format!("The X server lacks the `{}` extension", e.name)));
                }
                xcb_extension(e)?
            },
            None => ptr::null_mut(),
        };
        let mut flags = 0;
        if mode == RequestMode::Checked {
            flags |= ffi::XCB_REQUEST_CHECKED;
        }
        if shape == ReplyShape::ReplyWithFds {
            flags |= ffi::XCB_REQUEST_REPLY_FDS;
        }
        let protocol_request = ffi::xcb_protocol_request_t {
            count: 1,
            ext,
            opcode,
            isvoid: (shape == ReplyShape::Void) as u8,
        };
        // libxcb fills in the header, and uses the two leading entries for its own purposes.
        let empty = iovec { iov_base: ptr::null_mut(), iov_len: 0 };
        let mut parts = [empty, empty, iovec { iov_base: bytes.as_mut_ptr() as *mut c_void, iov_len: bytes.len() }];
        let mut raw_fds: Vec<c_int> = fds.into_iter().map(IntoRawFd::into_raw_fd).collect();
        let sequence = unsafe {
            let vector = parts.as_mut_ptr().add(2) as *mut ffi::xcb_iovec;
            if raw_fds.is_empty() {
                ffi::xcb_send_request64(self.c, flags, vector, &protocol_request)
            } else {
                ffi::xcb_send_request_with_fds64(self.c, flags, vector, &protocol_request, raw_fds.len() as c_uint, raw_fds.as_mut_ptr())
            }
        };
        if sequence == 0 {
            return Err(self.connection_error("Sending a request"));
        }
        if shape == ReplyShape::ReplyWithFds {
            self.fd_replies().insert(sequence);
        }
        Ok(sequence)
    }

    fn wait_for_reply(&self, sequence: SequenceNumber) -> Result<Option<ReplyOrError>> {
        let mut e = ptr::null_mut();
        let reply = unsafe {
            ffi::xcb_wait_for_reply64(self.c, sequence, &mut e)
        };
        let with_fds = self.fd_replies().remove(&sequence);
        if !reply.is_null() {
            let raw = unsafe { self.take_reply(reply, with_fds)? };
            return Ok(Some(ReplyOrError::Reply(raw)));
        }
        if !e.is_null() {
            let raw = unsafe { take_error(e)? };
            return Ok(Some(ReplyOrError::Error(raw)));
        }
        if self.has_error() {
            return Err(self.connection_error("Waiting for a reply"));
        }
        Ok(None)
    }

    fn check_request(&self, sequence: SequenceNumber) -> Result<Option<RawError>> {
        let cookie = ffi::xcb_void_cookie_t { sequence: sequence as c_uint };
        let e = unsafe {
            ffi::xcb_request_check(self.c, cookie)
        };
        if !e.is_null() {
            return unsafe { take_error(e) }.map(Some);
        }
        if self.has_error() {
            return Err(self.connection_error("Checking a request"));
        }
        Ok(None)
    }

    fn discard_reply(&self, sequence: SequenceNumber) {
        self.fd_replies().remove(&sequence);
        unsafe {
            ffi::xcb_discard_reply64(self.c, sequence);
        }
    }

    fn extension_information(&self, extension: &'static Extension) -> Result<Option<ExtensionInfo>> {
        self.extensions.get_or_resolve(extension, |ext| {
            let p = xcb_extension(ext)?;
            let data = unsafe {
                ffi::xcb_get_extension_data(self.c, p)
            };
            if data.is_null() {
                return Err(self.connection_error("Querying an extension"));
            }
            let data = unsafe { &*data };
            if data.present == 0 {
                return Ok(None);
            }
            Ok(Some(ExtensionInfo {
                major_opcode: data.major_opcode,
                first_event: data.first_event,
                first_error: data.first_error,
            }))
        })
    }

    fn poll_for_event(&self) -> Result<Option<RawEvent>> {
        let event = unsafe {
            ffi::xcb_poll_for_event(self.c)
        };
        if !event.is_null() {
            return unsafe { take_event(event) }.map(Some);
        }
        if self.has_error() {
            return Err(self.connection_error("Polling for events"));
        }
        Ok(None)
    }

    fn wait_for_event(&self) -> Result<RawEvent> {
        let event = unsafe {
            ffi::xcb_wait_for_event(self.c)
        };
        if event.is_null() {
            return Err(self.connection_error("Waiting for events"));
        }
        unsafe { take_event(event) }
    }

    fn flush(&self) -> Result<()> {
        if unsafe { ffi::xcb_flush(self.c) } <= 0 {
            return Err(self.connection_error("Flushing"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_globals_are_allocated_once() {
        static FOO: Extension = Extension { name: "XCBEXT-TEST", events: 0, errors: 0 };
        let a = xcb_extension(&FOO).unwrap();
        let b = xcb_extension(&FOO).unwrap();
        assert_eq!(a, b);
        let name = unsafe { ::std::ffi::CStr::from_ptr((*a).name) };
        assert_eq!(name.to_str().unwrap(), "XCBEXT-TEST");
    }

    #[test]
    fn ge_events_lose_full_sequence() {
        let mut buf = vec![0u8; 44];
        buf[0] = GE_GENERIC;
        buf[4..8].copy_from_slice(&2u32.to_ne_bytes());
        buf[32..36].copy_from_slice(&0xdead_beefu32.to_ne_bytes());
        buf[36..44].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let bytes = unpack_event(&buf);
        assert_eq!(bytes.len(), 40);
        assert_eq!(&bytes[32..], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn core_events_stay_32_bytes() {
        let mut buf = vec![0u8; 36];
        buf[0] = 12;
        assert_eq!(unpack_event(&buf).len(), 32);
    }

    #[test]
    fn borrowing_null_is_refused() {
        let e = unsafe { XcbConnection::from_raw(ptr::null_mut()) }.unwrap_err();
        assert_eq!(e.kind, crate::error::ErrorKind::InvalidArgument);
    }
}
