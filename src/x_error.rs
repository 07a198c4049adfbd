//! X protocol errors: typed kinds and their dispatch.
//!
//! Useful reference: the error lists in each extension's protocol XML, and
//! `_XPrintDefaultError()` in XlibInt.c.

use crate::connection::RequestConnection;
use crate::error::Result;
use crate::ext;
use crate::extension::{Extension, ExtensionInfo};
use crate::raw::RawError;

/// A decoded X error, with the header fields every error shares.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} (error_code: {error_code}, sequence: {sequence}, bad value: {bad_value}, major: {major_opcode}, minor: {minor_opcode})")]
pub struct XError {
    pub kind: XErrorKind,
    pub error_code: u8,
    pub sequence: u16,
    /// Resource ID or value the server complained about, for errors that carry one.
    pub bad_value: u32,
    pub major_opcode: u8,
    pub minor_opcode: u16,
}

impl XError {
    pub fn from_raw(kind: XErrorKind, raw: &RawError) -> Self {
        Self {
            kind,
            error_code: raw.error_code(),
            sequence: raw.sequence(),
            bad_value: raw.bad_value(),
            major_opcode: raw.major_opcode(),
            minor_opcode: raw.minor_opcode(),
        }
    }
}

/// Which error it is. One variant per extension that defines errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum XErrorKind {
    #[error("{0}")]
    Core(CoreError),
    #[cfg(feature = "record")]
    #[error("RECORD: {0}")]
    Record(ext::record::RecordError),
    #[cfg(feature = "xfixes")]
    #[error("XFIXES: {0}")]
    Xfixes(ext::xfixes::XfixesError),
    #[cfg(feature = "xkb")]
    #[error("XKEYBOARD: {0}")]
    Xkb(ext::xkb::XkbError),
    #[cfg(feature = "xprint")]
    #[error("XPrint: {0}")]
    XPrint(ext::xprint::XPrintError),
    #[cfg(feature = "xv")]
    #[error("XVideo: {0}")]
    Xv(ext::xv::XvError),
    /// An error code no known extension claims.
    #[error("Unknown error code {0}")]
    Unknown(u8),
}

/// Errors of the core protocol, codes 1 to 17.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("BadRequest")]
    Request,
    #[error("BadValue")]
    Value,
    #[error("BadWindow")]
    Window,
    #[error("BadPixmap")]
    Pixmap,
    #[error("BadAtom")]
    Atom,
    #[error("BadCursor")]
    Cursor,
    #[error("BadFont")]
    Font,
    #[error("BadMatch")]
    Match,
    #[error("BadDrawable")]
    Drawable,
    #[error("BadAccess")]
    Access,
    #[error("BadAlloc")]
    Alloc,
    #[error("BadColor")]
    Colormap,
    #[error("BadGC")]
    GContext,
    #[error("BadIDChoice")]
    IDChoice,
    #[error("BadName")]
    Name,
    #[error("BadLength")]
    Length,
    #[error("BadImplementation")]
    Implementation,
}

impl CoreError {
    pub fn from_code(error_code: u8) -> Option<Self> {
        use self::CoreError::*;
        Some(match error_code {
            1 => Request,
            2 => Value,
            3 => Window,
            4 => Pixmap,
            5 => Atom,
            6 => Cursor,
            7 => Font,
            8 => Match,
            9 => Drawable,
            10 => Access,
            11 => Alloc,
            12 => Colormap,
            13 => GContext,
            14 => IDChoice,
            15 => Name,
            16 => Length,
            17 => Implementation,
            _ => return None,
        })
    }
}

/// Decodes the error numbered `number` (relative to `first_error`) of one extension.
pub(crate) type DecodeError = fn(number: u8, raw: &RawError) -> Option<XErrorKind>;

/// How to recognize the errors of one extension.
#[derive(Copy, Clone)]
pub(crate) struct ErrorTable {
    pub extension: &'static Extension,
    pub decode: DecodeError,
}

/// Per-extension error dispatch, shared by every extension module.
///
/// Returns the typed error iff `raw.error_code() - first_error` is one of the
/// extension's codes.
pub(crate) fn dispatch_with(info: &ExtensionInfo, decode: DecodeError, raw: &RawError) -> ::std::result::Result<(), XError> {
    match info.error_number(raw.error_code()).and_then(|n| decode(n, raw)) {
        Some(kind) => Err(XError::from_raw(kind, raw)),
        None => Ok(()),
    }
}

#[derive(Copy, Clone)]
struct Resolved {
    table: ErrorTable,
    info: ExtensionInfo,
}

/// Maps raw errors to typed ones for the core protocol and every compiled-in
/// extension the server has.
#[derive(Clone)]
pub struct ErrorDispatcher {
    resolved: Vec<Resolved>,
}

impl ::std::fmt::Debug for ErrorDispatcher {
    fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
        f.debug_list()
            .entries(self.resolved.iter().map(|r| (r.table.extension.name, r.info.first_error, r.table.extension.errors)))
            .finish()
    }
}

impl ErrorDispatcher {
    /// Resolves every extension that defines errors against `conn`.
    pub fn new<C: RequestConnection + ?Sized>(conn: &C) -> Result<Self> {
        let mut resolved = Vec::new();
        for table in ext::error_tables() {
            if let Some(info) = conn.extension_information(table.extension)? {
                resolved.push(Resolved { table, info });
            }
        }
        resolved.sort_by_key(|r| r.info.first_error);
        for w in resolved.windows(2) {
            let end = w[0].info.first_error as u16 + w[0].table.extension.errors as u16;
            if end > w[1].info.first_error as u16 {
                warn!("Error ranges of `{}` and `{}` overlap", w[0].table.extension.name, w[1].table.extension.name);
            }
        }
        Ok(Self { resolved })
    }

    /// Returns the typed error iff the code belongs to the core protocol or
    /// to a resolved extension. Unmatched codes yield `Ok(())`.
    pub fn dispatch(&self, raw: &RawError) -> ::std::result::Result<(), XError> {
        if let Some(core) = CoreError::from_code(raw.error_code()) {
            return Err(XError::from_raw(XErrorKind::Core(core), raw));
        }
        for r in &self.resolved {
            dispatch_with(&r.info, r.table.decode, raw)?;
        }
        debug!("No dispatcher claims {:?}", raw);
        Ok(())
    }

    /// Always yields an `XError`, falling back to `XErrorKind::Unknown`.
    pub fn parse(&self, raw: &RawError) -> XError {
        match self.dispatch(raw) {
            Err(e) => e,
            Ok(()) => XError::from_raw(XErrorKind::Unknown(raw.error_code()), raw),
        }
    }
}
