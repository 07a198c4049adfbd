//! SELinux: security contexts of windows, properties, devices and clients.

use crate::connection::{RequestConnection, RequestMode};
use crate::cookie::{Cookie, VoidCookie};
use crate::error::Result;
use crate::extension::Extension;
use crate::list::{VarElement, VarList};
use crate::request::{ConnectionExt, ReplyRequest, Request, VoidRequest};
use crate::wire::{self, Reader, RequestWriter};

pub const EXTENSION: Extension = Extension { name: "SELinux", events: 0, errors: 0 };

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

reply_kind!(
    /// Reply of every request that returns a single security context.
    ContextReply = ContextKind, 32
);

impl ContextReply {
    accessors! {
        context_len: u32 @ 8;
    }
    /// The context string, trailing NUL included when the server sends one.
    pub fn context(&self) -> &[u8] {
        self.reader().slice(32..32 + self.context_len() as usize)
    }
    pub fn context_lossy(&self) -> String {
        let c = self.context();
        let c = c.strip_suffix(b"\0").unwrap_or(c);
        String::from_utf8_lossy(c).into_owned()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SetDeviceCreateContext<'a> {
    pub context: &'a [u8],
}

impl<'a> Request for SetDeviceCreateContext<'a> {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 1;
    fn validate(&self) -> Result<()> {
        wire::check_length::<u32>("context", self.context.len())
    }
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.context.len() as u32).bytes(self.context);
    }
}
impl<'a> VoidRequest for SetDeviceCreateContext<'a> {}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct GetDeviceCreateContext;

impl Request for GetDeviceCreateContext {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 2;
    fn serialize(&self, _: &mut RequestWriter) {}
}
impl ReplyRequest for GetDeviceCreateContext {
    type Reply = ContextReply;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GetWindowContext {
    pub window: u32,
}

impl Request for GetWindowContext {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 7;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.window);
    }
}
impl ReplyRequest for GetWindowContext {
    type Reply = ContextReply;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GetPropertyContext {
    pub window: u32,
    pub property: u32,
}

impl Request for GetPropertyContext {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 12;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.window).u32(self.property);
    }
}
impl ReplyRequest for GetPropertyContext {
    type Reply = ContextReply;
}

/// One property of a `ListProperties` reply.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ListItem<'a> {
    pub name: u32,
    pub object_context: &'a [u8],
    pub data_context: &'a [u8],
}

impl<'a> VarElement<'a> for ListItem<'a> {
    fn parse(r: Reader<'a>) -> Option<(Self, usize)> {
        if r.len() < 12 {
            return None;
        }
        let object_len = r.u32(4) as usize;
        let data_len = r.u32(8) as usize;
        let data_start = 12 + wire::padded(object_len);
        let size = data_start + wire::padded(data_len);
        if r.len() < data_start + data_len {
            return None;
        }
        let item = ListItem {
            name: r.u32(0),
            object_context: r.slice(12..12 + object_len),
            data_context: r.slice(data_start..data_start + data_len),
        };
        Some((item, size))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ListProperties {
    pub window: u32,
}

impl Request for ListProperties {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 14;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.window);
    }
}
impl ReplyRequest for ListProperties {
    type Reply = ListPropertiesReply;
}

reply_kind!(ListPropertiesReply = ListPropertiesKind, 32);

impl ListPropertiesReply {
    accessors! {
        properties_len: u32 @ 8;
    }
    pub fn properties(&self) -> VarList<ListItem> {
        VarList::new(self.reader(), 32, self.properties_len() as usize)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GetClientContext {
    /// Any resource of the client.
    pub resource: u32,
}

impl Request for GetClientContext {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 22;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.resource);
    }
}
impl ReplyRequest for GetClientContext {
    type Reply = ContextReply;
}

pub trait SelinuxExt: RequestConnection {
    fn selinux_query_version(&self, client_major: u8, client_minor: u8, mode: RequestMode) -> Result<Cookie<'_, Self, QueryVersionReply>> {
        self.send_with_reply(QueryVersion { client_major, client_minor }, mode)
    }
    fn selinux_set_device_create_context(&self, context: &[u8], mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        self.send_void(SetDeviceCreateContext { context }, mode)
    }
    fn selinux_get_device_create_context(&self, mode: RequestMode) -> Result<Cookie<'_, Self, ContextReply>> {
        self.send_with_reply(GetDeviceCreateContext, mode)
    }
    fn selinux_get_window_context(&self, window: u32, mode: RequestMode) -> Result<Cookie<'_, Self, ContextReply>> {
        self.send_with_reply(GetWindowContext { window }, mode)
    }
    fn selinux_get_property_context(&self, window: u32, property: u32, mode: RequestMode) -> Result<Cookie<'_, Self, ContextReply>> {
        self.send_with_reply(GetPropertyContext { window, property }, mode)
    }
    fn selinux_list_properties(&self, window: u32, mode: RequestMode) -> Result<Cookie<'_, Self, ListPropertiesReply>> {
        self.send_with_reply(ListProperties { window }, mode)
    }
    fn selinux_get_client_context(&self, resource: u32, mode: RequestMode) -> Result<Cookie<'_, Self, ContextReply>> {
        self.send_with_reply(GetClientContext { resource }, mode)
    }
}

impl<C: RequestConnection + ?Sized> SelinuxExt for C {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::ExtensionInfo;
    use crate::raw::tests::{put_u32, reply_bytes};
    use crate::testing::FakeConnection;

    fn conn() -> FakeConnection {
        FakeConnection::new().with_extension(&EXTENSION, ExtensionInfo { major_opcode: 152, first_event: 0, first_error: 0 })
    }

    const CTX: &[u8] = b"system_u:object_r:x_t:s0\0";

    #[test]
    fn window_context() {
        let conn = conn();
        let cookie = conn.selinux_get_window_context(0x20_0001, RequestMode::Checked).unwrap();
        assert_eq!(conn.last_sent().opcode, 7);
        conn.queue_reply(cookie.sequence(), reply_bytes(28, |b| {
            put_u32(b, 8, CTX.len() as u32);
            b[32..32 + CTX.len()].copy_from_slice(CTX);
        }));
        let reply = cookie.reply().unwrap();
        assert_eq!(reply.context(), CTX);
        assert_eq!(reply.context_lossy(), "system_u:object_r:x_t:s0");
    }

    #[test]
    fn set_device_create_context_pads() {
        let conn = conn();
        conn.selinux_set_device_create_context(b"abcde", RequestMode::Checked).unwrap().ignore_error();
        let sent = conn.last_sent();
        assert_eq!(sent.bytes.len(), 16);
        assert_eq!(sent.reader().u32(4), 5);
        assert_eq!(&sent.bytes[8..13], b"abcde");
    }

    #[test]
    fn list_properties() {
        let conn = conn();
        let cookie = conn.selinux_list_properties(1, RequestMode::Checked).unwrap();
        conn.queue_reply(cookie.sequence(), reply_bytes(32, |b| {
            put_u32(b, 8, 2);
            put_u32(b, 32, 39);
            put_u32(b, 36, 3);
            put_u32(b, 40, 2);
            b[44..47].copy_from_slice(b"obj");
            b[48..50].copy_from_slice(b"da");
            put_u32(b, 52, 40);
            put_u32(b, 56, 0);
            put_u32(b, 60, 0);
        }));
        let reply = cookie.reply().unwrap();
        let items: Vec<_> = reply.properties().collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], ListItem { name: 39, object_context: b"obj", data_context: b"da" });
        assert_eq!(items[1].name, 40);
        assert!(items[1].object_context.is_empty());
    }
}
