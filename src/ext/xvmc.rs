//! XvMC: hardware motion compensation on XVideo ports.

use vek::Extent2;

use crate::connection::{RequestConnection, RequestMode};
use crate::cookie::{Cookie, VoidCookie};
use crate::error::Result;
use crate::extension::Extension;
use crate::list::{FixedElement, List};
use crate::request::{ConnectionExt, ReplyRequest, Request, VoidRequest};
use crate::wire::{Reader, RequestWriter};

pub const EXTENSION: Extension = Extension { name: "XVideo-MotionCompensation", events: 0, errors: 0 };

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct SurfaceInfo {
    pub id: u32,
    pub chroma_format: u16,
    pub max_width: u16,
    pub max_height: u16,
    pub subpicture_max_width: u16,
    pub subpicture_max_height: u16,
    pub mc_type: u32,
    pub flags: u32,
}

impl SurfaceInfo {
    pub fn max_size(&self) -> Extent2<u16> {
        Extent2::new(self.max_width, self.max_height)
    }
}

impl FixedElement for SurfaceInfo {
    const SIZE: usize = 24;
    fn read(r: Reader) -> Self {
        SurfaceInfo {
            id: r.u32(0),
            chroma_format: r.u16(4),
            max_width: r.u16(8),
            max_height: r.u16(10),
            subpicture_max_width: r.u16(12),
            subpicture_max_height: r.u16(14),
            mc_type: r.u32(16),
            flags: r.u32(20),
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct QueryVersion;

impl Request for QueryVersion {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 0;
    fn serialize(&self, _: &mut RequestWriter) {}
}
impl ReplyRequest for QueryVersion {
    type Reply = QueryVersionReply;
}

reply_kind!(QueryVersionReply = QueryVersionKind, 32);

impl QueryVersionReply {
    accessors! {
        major: u32 @ 8;
        minor: u32 @ 12;
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ListSurfaceTypes {
    pub port_id: u32,
}

impl Request for ListSurfaceTypes {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 1;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.port_id);
    }
}
impl ReplyRequest for ListSurfaceTypes {
    type Reply = ListSurfaceTypesReply;
}

reply_kind!(ListSurfaceTypesReply = ListSurfaceTypesKind, 32);

impl ListSurfaceTypesReply {
    accessors! {
        num: u32 @ 8;
    }
    pub fn surfaces(&self) -> List<SurfaceInfo> {
        List::new(self.reader(), 32, self.num() as usize)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CreateContext {
    pub context_id: u32,
    pub port_id: u32,
    pub surface_id: u32,
    pub width: u16,
    pub height: u16,
    pub flags: u32,
}

impl Request for CreateContext {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 2;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.context_id).u32(self.port_id).u32(self.surface_id)
            .u16(self.width).u16(self.height).u32(self.flags);
    }
}
impl ReplyRequest for CreateContext {
    type Reply = CreateContextReply;
}

reply_kind!(CreateContextReply = CreateContextKind, 32);

impl CreateContextReply {
    accessors! {
        width_actual: u16 @ 8;
        height_actual: u16 @ 10;
        flags_return: u32 @ 12;
    }
    /// Driver-private words, as many as the reply length says.
    pub fn priv_data(&self) -> List<u32> {
        List::new(self.reader(), 32, self.length() as usize)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DestroyContext {
    pub context_id: u32,
}

impl Request for DestroyContext {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 3;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.context_id);
    }
}
impl VoidRequest for DestroyContext {}

pub trait XvmcExt: RequestConnection {
    fn xvmc_query_version(&self, mode: RequestMode) -> Result<Cookie<'_, Self, QueryVersionReply>> {
        self.send_with_reply(QueryVersion, mode)
    }
    fn xvmc_list_surface_types(&self, port_id: u32, mode: RequestMode) -> Result<Cookie<'_, Self, ListSurfaceTypesReply>> {
        self.send_with_reply(ListSurfaceTypes { port_id }, mode)
    }
    fn xvmc_create_context(&self, request: CreateContext, mode: RequestMode) -> Result<Cookie<'_, Self, CreateContextReply>> {
        self.send_with_reply(request, mode)
    }
    fn xvmc_destroy_context(&self, context_id: u32, mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        self.send_void(DestroyContext { context_id }, mode)
    }
}

impl<C: RequestConnection + ?Sized> XvmcExt for C {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::ExtensionInfo;
    use crate::raw::tests::{put_u16, put_u32, reply_bytes};
    use crate::testing::FakeConnection;

    fn conn() -> FakeConnection {
        FakeConnection::new().with_extension(&EXTENSION, ExtensionInfo { major_opcode: 151, first_event: 0, first_error: 0 })
    }

    #[test]
    fn surface_types() {
        let conn = conn();
        let cookie = conn.xvmc_list_surface_types(75, RequestMode::Checked).unwrap();
        conn.queue_reply(cookie.sequence(), reply_bytes(24, |b| {
            put_u32(b, 8, 1);
            put_u32(b, 32, 0x11);
            put_u16(b, 36, 1);
            put_u16(b, 40, 2048);
            put_u16(b, 42, 1152);
            put_u32(b, 48, 0x2);
        }));
        let reply = cookie.reply().unwrap();
        let s = reply.surfaces().get(0).unwrap();
        assert_eq!(s.id, 0x11);
        assert_eq!(s.max_size(), Extent2::new(2048, 1152));
        assert_eq!(s.mc_type, 2);
    }

    #[test]
    fn create_context() {
        let conn = conn();
        let request = CreateContext { context_id: 0x50_0001, port_id: 75, surface_id: 0x11, width: 720, height: 576, flags: 1 };
        let cookie = conn.xvmc_create_context(request, RequestMode::Checked).unwrap();
        let sent = conn.last_sent();
        assert_eq!(sent.bytes.len(), 24);
        assert_eq!((sent.reader().u16(16), sent.reader().u16(18)), (720, 576));

        conn.queue_reply(cookie.sequence(), reply_bytes(8, |b| {
            put_u16(b, 8, 720);
            put_u16(b, 10, 576);
            put_u32(b, 32, 7);
            put_u32(b, 36, 9);
        }));
        let reply = cookie.reply().unwrap();
        assert_eq!(reply.width_actual(), 720);
        assert_eq!(reply.priv_data().to_vec(), vec![7, 9]);
    }
}
