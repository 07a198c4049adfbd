//! Extension descriptors and their per-connection resolution.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::connection::{RequestConnection, RequestMode};
use crate::error::Result;
use crate::list::{Str, VarList};
use crate::reply::{Reply, ReplyKind};
use crate::request::{ConnectionExt, Request, ReplyRequest};
use crate::wire::{self, RequestWriter};

/// Identifies an X extension by the name the server knows it by.
#[derive(Debug, Hash, PartialEq, Eq)]
pub struct Extension {
    /// Name given to `QueryExtension`, e.g `"XFIXES"`.
    pub name: &'static str,
    /// Number of (non-XGE) event codes the extension allocates.
    pub events: u8,
    /// Number of error codes the extension allocates.
    pub errors: u8,
}

/// What the server assigned to an extension on this connection.
#[derive(Debug, Default, Copy, Clone, Hash, PartialEq, Eq)]
pub struct ExtensionInfo {
    pub major_opcode: u8,
    pub first_event: u8,
    pub first_error: u8,
}

impl ExtensionInfo {
    /// Event number relative to `first_event`, for an event's `response_type`.
    ///
    /// `None` if the extension allocates no events, or the code is below its range.
    /// The upper bound is checked by each extension's own dispatcher.
    pub fn event_number(&self, response_type: u8) -> Option<u8> {
        if self.first_event == 0 {
            return None;
        }
        (response_type & 0x7f).checked_sub(self.first_event)
    }
    /// Error number relative to `first_error`, for an error's `error_code`.
    pub fn error_number(&self, error_code: u8) -> Option<u8> {
        if self.first_error == 0 {
            return None;
        }
        error_code.checked_sub(self.first_error)
    }
}

/// Caches extension resolution results for one connection.
///
/// Absent extensions are cached too, as `None`.
#[derive(Debug, Default)]
pub struct ExtensionCache {
    known: Mutex<HashMap<&'static str, Option<ExtensionInfo>>>,
}

impl ExtensionCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<HashMap<&'static str, Option<ExtensionInfo>>> {
        self.known.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached answer for `extension`, calling `resolve` only if there is none.
    ///
    /// `resolve` runs without the lock held, so it may talk to the connection.
    /// If two callers race, the first stored answer wins.
    pub fn get_or_resolve<F>(&self, extension: &'static Extension, resolve: F) -> Result<Option<ExtensionInfo>>
        where F: FnOnce(&'static Extension) -> Result<Option<ExtensionInfo>>
    {
        if let Some(info) = self.lock().get(extension.name) {
            return Ok(*info);
        }
        let info = resolve(extension)?;
        match info {
            Some(ref info) => trace!("Found X11 extension `{}`: {:?}", extension.name, info),
            None => debug!("X11 extension `{}` is not present", extension.name),
        }
        Ok(*self.lock().entry(extension.name).or_insert(info))
    }

    /// The cached answer, if `extension` was resolved already.
    pub fn get(&self, extension: &'static Extension) -> Option<Option<ExtensionInfo>> {
        self.lock().get(extension.name).cloned()
    }

    /// Extensions resolved so far, present or not.
    pub fn len(&self) -> usize {
        self.lock().len()
    }
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Core `QueryExtension` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryExtension<'a> {
    pub name: &'a [u8],
}

impl<'a> Request for QueryExtension<'a> {
    const EXTENSION: Option<&'static Extension> = None;
    const OPCODE: u8 = 98;
    fn validate(&self) -> Result<()> {
        wire::check_length::<u16>("name", self.name.len())
    }
    fn serialize(&self, w: &mut RequestWriter) {
        w.u16(self.name.len() as u16).zeroes(2).bytes(self.name);
    }
}

impl<'a> ReplyRequest for QueryExtension<'a> {
    type Reply = QueryExtensionReply;
}

#[derive(Debug)]
pub enum QueryExtensionKind {}
impl ReplyKind for QueryExtensionKind {
    const NAME: &'static str = "QueryExtensionReply";
}
pub type QueryExtensionReply = Reply<QueryExtensionKind>;

impl QueryExtensionReply {
    pub fn present(&self) -> bool {
        self.reader().bool(8)
    }
    pub fn major_opcode(&self) -> u8 {
        self.reader().u8(9)
    }
    pub fn first_event(&self) -> u8 {
        self.reader().u8(10)
    }
    pub fn first_error(&self) -> u8 {
        self.reader().u8(11)
    }
    /// `None` if the extension isn't present.
    pub fn info(&self) -> Option<ExtensionInfo> {
        if !self.present() {
            return None;
        }
        Some(ExtensionInfo {
            major_opcode: self.major_opcode(),
            first_event: self.first_event(),
            first_error: self.first_error(),
        })
    }
}

/// Core `ListExtensions` request.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ListExtensions;

impl Request for ListExtensions {
    const EXTENSION: Option<&'static Extension> = None;
    const OPCODE: u8 = 99;
    fn serialize(&self, _: &mut RequestWriter) {}
}

impl ReplyRequest for ListExtensions {
    type Reply = ListExtensionsReply;
}

#[derive(Debug)]
pub enum ListExtensionsKind {}
impl ReplyKind for ListExtensionsKind {
    const NAME: &'static str = "ListExtensionsReply";
}
pub type ListExtensionsReply = Reply<ListExtensionsKind>;

impl ListExtensionsReply {
    pub fn names_len(&self) -> u8 {
        self.data_byte()
    }
    pub fn names(&self) -> VarList<Str> {
        VarList::new(self.reader(), 32, self.names_len() as usize)
    }
}

/// Asks the server about an extension, bypassing any cache.
///
/// Connections that don't get this from their transport library can
/// implement `RequestConnection::extension_information` with this plus an
/// `ExtensionCache`.
pub fn query_extension<C: RequestConnection + ?Sized>(conn: &C, name: &str) -> Result<Option<ExtensionInfo>> {
    let cookie = conn.send_with_reply(QueryExtension { name: name.as_bytes() }, RequestMode::Checked)?;
    match cookie.reply() {
        Ok(reply) => Ok(reply.info()),
        Err(e) => {
            warn!("QueryExtension(`{}`) failed: {}", name, e);
            Ok(None)
        },
    }
}

/// Names of every extension the server advertises.
pub fn list_extensions<C: RequestConnection + ?Sized>(conn: &C) -> ::std::result::Result<Vec<String>, crate::error::ReplyError> {
    let reply = conn.send_with_reply(ListExtensions, RequestMode::Checked)?.reply()?;
    Ok(reply.names().map(|s| s.to_string_lossy()).collect())
}
