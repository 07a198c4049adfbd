//! X-Resource: per-client resource usage.

use crate::connection::{RequestConnection, RequestMode};
use crate::cookie::Cookie;
use crate::error::Result;
use crate::extension::Extension;
use crate::list::{FixedElement, List};
use crate::request::{ConnectionExt, ReplyRequest, Request};
use crate::wire::{Reader, RequestWriter};

pub const EXTENSION: Extension = Extension { name: "X-Resource", events: 0, errors: 0 };

/// The XID range owned by one client.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct Client {
    pub resource_base: u32,
    pub resource_mask: u32,
}

impl FixedElement for Client {
    const SIZE: usize = 8;
    fn read(r: Reader) -> Self {
        Client { resource_base: r.u32(0), resource_mask: r.u32(4) }
    }
}

/// How many resources of one type a client owns.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct Type {
    /// Atom naming the resource type.
    pub resource_type: u32,
    pub count: u32,
}

impl FixedElement for Type {
    const SIZE: usize = 8;
    fn read(r: Reader) -> Self {
        Type { resource_type: r.u32(0), count: r.u32(4) }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct QueryVersion {
    pub client_major: u8,
    pub client_minor: u8,
}

impl Request for QueryVersion {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 0;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u8(self.client_major).u8(self.client_minor);
    }
}
impl ReplyRequest for QueryVersion {
    type Reply = QueryVersionReply;
}

reply_kind!(QueryVersionReply = QueryVersionKind, 32);

impl QueryVersionReply {
    accessors! {
        server_major: u16 @ 8;
        server_minor: u16 @ 10;
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct QueryClients;

impl Request for QueryClients {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 1;
    fn serialize(&self, _: &mut RequestWriter) {}
}
impl ReplyRequest for QueryClients {
    type Reply = QueryClientsReply;
}

reply_kind!(QueryClientsReply = QueryClientsKind, 32);

impl QueryClientsReply {
    accessors! {
        num_clients: u32 @ 8;
    }
    pub fn clients(&self) -> List<Client> {
        List::new(self.reader(), 32, self.num_clients() as usize)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct QueryClientResources {
    /// Any XID of the client.
    pub xid: u32,
}

impl Request for QueryClientResources {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 2;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.xid);
    }
}
impl ReplyRequest for QueryClientResources {
    type Reply = QueryClientResourcesReply;
}

reply_kind!(QueryClientResourcesReply = QueryClientResourcesKind, 32);

impl QueryClientResourcesReply {
    accessors! {
        num_types: u32 @ 8;
    }
    pub fn types(&self) -> List<Type> {
        List::new(self.reader(), 32, self.num_types() as usize)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct QueryClientPixmapBytes {
    pub xid: u32,
}

impl Request for QueryClientPixmapBytes {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 3;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.xid);
    }
}
impl ReplyRequest for QueryClientPixmapBytes {
    type Reply = QueryClientPixmapBytesReply;
}

reply_kind!(QueryClientPixmapBytesReply = QueryClientPixmapBytesKind, 32);

impl QueryClientPixmapBytesReply {
    accessors! {
        bytes: u32 @ 8;
        bytes_overflow: u32 @ 12;
    }
    /// `bytes` with its overflow word, for clients past 4 GiB.
    pub fn total_bytes(&self) -> u64 {
        (self.bytes_overflow() as u64) << 32 | self.bytes() as u64
    }
}

pub trait ResExt: RequestConnection {
    fn res_query_version(&self, client_major: u8, client_minor: u8, mode: RequestMode) -> Result<Cookie<'_, Self, QueryVersionReply>> {
        self.send_with_reply(QueryVersion { client_major, client_minor }, mode)
    }
    fn res_query_clients(&self, mode: RequestMode) -> Result<Cookie<'_, Self, QueryClientsReply>> {
        self.send_with_reply(QueryClients, mode)
    }
    fn res_query_client_resources(&self, xid: u32, mode: RequestMode) -> Result<Cookie<'_, Self, QueryClientResourcesReply>> {
        self.send_with_reply(QueryClientResources { xid }, mode)
    }
    fn res_query_client_pixmap_bytes(&self, xid: u32, mode: RequestMode) -> Result<Cookie<'_, Self, QueryClientPixmapBytesReply>> {
        self.send_with_reply(QueryClientPixmapBytes { xid }, mode)
    }
}

impl<C: RequestConnection + ?Sized> ResExt for C {}
