//! DRI3: buffer and fence sharing through file descriptors.
//!
//! Only built on unix, where fds can travel over the X connection.

use std::os::unix::io::OwnedFd;

use vek::Extent2;

use crate::connection::{ReplyShape, RequestConnection, RequestMode};
use crate::cookie::{Cookie, VoidCookie};
use crate::error::Result;
use crate::extension::Extension;
use crate::request::{ConnectionExt, ReplyRequest, Request, VoidRequest};
use crate::wire::RequestWriter;

pub const EXTENSION: Extension = Extension { name: "DRI3", events: 0, errors: 0 };

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct QueryVersion {
    pub major_version: u32,
    pub minor_version: u32,
}

impl Request for QueryVersion {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 0;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.major_version).u32(self.minor_version);
    }
}
impl ReplyRequest for QueryVersion {
    type Reply = QueryVersionReply;
}

reply_kind!(QueryVersionReply = QueryVersionKind, 32);

impl QueryVersionReply {
    accessors! {
        major_version: u32 @ 8;
        minor_version: u32 @ 12;
    }
}

/// Opens the DRM device behind a drawable's screen.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Open {
    pub drawable: u32,
    /// RandR provider, or 0 for the default.
    pub provider: u32,
}

impl Request for Open {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 1;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.drawable).u32(self.provider);
    }
}
impl ReplyRequest for Open {
    type Reply = OpenReply;
    const SHAPE: ReplyShape = ReplyShape::ReplyWithFds;
}

reply_kind!(OpenReply = OpenKind, 32);

impl OpenReply {
    pub fn nfd(&self) -> u8 {
        self.data_byte()
    }
    /// Moves the device fd out of the reply. `None` once taken.
    pub fn take_device_fd(&mut self) -> Option<OwnedFd> {
        self.raw_mut().take_fds().into_iter().next()
    }
}

/// Wraps a dma-buf in a new pixmap. The request takes ownership of the fd.
#[derive(Debug)]
pub struct PixmapFromBuffer {
    pub pixmap: u32,
    pub drawable: u32,
    pub size: u32,
    pub width: u16,
    pub height: u16,
    pub stride: u16,
    pub depth: u8,
    pub bpp: u8,
    pub pixmap_fd: OwnedFd,
}

impl Request for PixmapFromBuffer {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 2;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.pixmap).u32(self.drawable).u32(self.size)
            .u16(self.width).u16(self.height).u16(self.stride)
            .u8(self.depth).u8(self.bpp);
    }
    fn into_fds(self) -> Vec<OwnedFd> {
        vec![self.pixmap_fd]
    }
}
impl VoidRequest for PixmapFromBuffer {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BufferFromPixmap {
    pub pixmap: u32,
}

impl Request for BufferFromPixmap {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 3;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.pixmap);
    }
}
impl ReplyRequest for BufferFromPixmap {
    type Reply = BufferFromPixmapReply;
    const SHAPE: ReplyShape = ReplyShape::ReplyWithFds;
}

reply_kind!(BufferFromPixmapReply = BufferFromPixmapKind, 32);

impl BufferFromPixmapReply {
    accessors! {
        size: u32 @ 8;
        width: u16 @ 12;
        height: u16 @ 14;
        stride: u16 @ 16;
        depth: u8 @ 18;
        bpp: u8 @ 19;
    }
    pub fn nfd(&self) -> u8 {
        self.data_byte()
    }
    pub fn extent(&self) -> Extent2<u16> {
        Extent2::new(self.width(), self.height())
    }
    pub fn take_pixmap_fd(&mut self) -> Option<OwnedFd> {
        self.raw_mut().take_fds().into_iter().next()
    }
}

/// Creates a SyncFence from a shared-memory fence fd. The request takes ownership of the fd.
#[derive(Debug)]
pub struct FenceFromFd {
    pub drawable: u32,
    pub fence: u32,
    pub initially_triggered: bool,
    pub fence_fd: OwnedFd,
}

impl Request for FenceFromFd {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 4;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.drawable).u32(self.fence).bool(self.initially_triggered).zeroes(3);
    }
    fn into_fds(self) -> Vec<OwnedFd> {
        vec![self.fence_fd]
    }
}
impl VoidRequest for FenceFromFd {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FdFromFence {
    pub drawable: u32,
    pub fence: u32,
}

impl Request for FdFromFence {
    const EXTENSION: Option<&'static Extension> = Some(&EXTENSION);
    const OPCODE: u8 = 5;
    fn serialize(&self, w: &mut RequestWriter) {
        w.u32(self.drawable).u32(self.fence);
    }
}
impl ReplyRequest for FdFromFence {
    type Reply = FdFromFenceReply;
    const SHAPE: ReplyShape = ReplyShape::ReplyWithFds;
}

reply_kind!(FdFromFenceReply = FdFromFenceKind, 32);

impl FdFromFenceReply {
    pub fn nfd(&self) -> u8 {
        self.data_byte()
    }
    pub fn take_fence_fd(&mut self) -> Option<OwnedFd> {
        self.raw_mut().take_fds().into_iter().next()
    }
}

pub trait Dri3Ext: RequestConnection {
    fn dri3_query_version(&self, major_version: u32, minor_version: u32, mode: RequestMode) -> Result<Cookie<'_, Self, QueryVersionReply>> {
        self.send_with_reply(QueryVersion { major_version, minor_version }, mode)
    }
    fn dri3_open(&self, drawable: u32, provider: u32, mode: RequestMode) -> Result<Cookie<'_, Self, OpenReply>> {
        self.send_with_reply(Open { drawable, provider }, mode)
    }
    fn dri3_pixmap_from_buffer(&self, request: PixmapFromBuffer, mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        self.send_void(request, mode)
    }
    fn dri3_buffer_from_pixmap(&self, pixmap: u32, mode: RequestMode) -> Result<Cookie<'_, Self, BufferFromPixmapReply>> {
        self.send_with_reply(BufferFromPixmap { pixmap }, mode)
    }
    fn dri3_fence_from_fd(&self, drawable: u32, fence: u32, initially_triggered: bool, fence_fd: OwnedFd, mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        self.send_void(FenceFromFd { drawable, fence, initially_triggered, fence_fd }, mode)
    }
    fn dri3_fd_from_fence(&self, drawable: u32, fence: u32, mode: RequestMode) -> Result<Cookie<'_, Self, FdFromFenceReply>> {
        self.send_with_reply(FdFromFence { drawable, fence }, mode)
    }
}

impl<C: RequestConnection + ?Sized> Dri3Ext for C {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use crate::extension::ExtensionInfo;
    use crate::raw::tests::{put_u16, put_u32, reply_bytes};
    use crate::testing::FakeConnection;

    const INFO: ExtensionInfo = ExtensionInfo { major_opcode: 149, first_event: 0, first_error: 0 };

    fn dev_null() -> OwnedFd {
        File::open("/dev/null").unwrap().into()
    }

    #[test]
    fn fds_go_out_with_the_request() {
        let conn = FakeConnection::new().with_extension(&EXTENSION, INFO);
        let request = PixmapFromBuffer {
            pixmap: 0x40_0001,
            drawable: 0x20_0001,
            size: 4096,
            width: 32,
            height: 32,
            stride: 128,
            depth: 24,
            bpp: 32,
            pixmap_fd: dev_null(),
        };
        conn.dri3_pixmap_from_buffer(request, RequestMode::Unchecked).unwrap();
        let sent = conn.last_sent();
        assert_eq!(sent.fds, 1);
        assert_eq!(sent.bytes.len(), 24);
        let r = sent.reader();
        assert_eq!(r.u32(12), 4096);
        assert_eq!(r.u16(20), 128);
        assert_eq!((r.u8(22), r.u8(23)), (24, 32));
    }

    #[test]
    fn fds_come_back_with_the_reply() {
        let conn = FakeConnection::new().with_extension(&EXTENSION, INFO);
        let cookie = conn.dri3_buffer_from_pixmap(0x40_0001, RequestMode::Checked).unwrap();
        assert_eq!(conn.last_sent().shape, ReplyShape::ReplyWithFds);
        conn.queue_reply_with_fds(cookie.sequence(), reply_bytes(0, |b| {
            b[1] = 1;
            put_u32(b, 8, 4096);
            put_u16(b, 12, 32);
            put_u16(b, 14, 32);
            put_u16(b, 16, 128);
            b[18] = 24;
            b[19] = 32;
        }), vec![dev_null()]);
        let mut reply = cookie.reply().unwrap();
        assert_eq!(reply.nfd(), 1);
        assert_eq!(reply.extent(), Extent2::new(32, 32));
        assert_eq!(reply.stride(), 128);
        assert!(reply.take_pixmap_fd().is_some());
        assert!(reply.take_pixmap_fd().is_none());
    }
}
