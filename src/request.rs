//! Typed requests, and the generic send paths every extension trait builds on.

#[cfg(unix)]
use std::os::unix::io::OwnedFd;

use crate::connection::{RawRequest, ReplyShape, RequestConnection, RequestMode};
use crate::cookie::{Cookie, MultiReply, MultiReplyCookie, VoidCookie};
use crate::error::{Result, unsupported};
use crate::extension::Extension;
use crate::raw::RawError;
use crate::reply::FromRawReply;
use crate::wire::RequestWriter;
use crate::x_error::{ErrorDispatcher, XError, XErrorKind};

/// One request of the core protocol or of an extension.
pub trait Request: Sized {
    /// `None` for core requests.
    const EXTENSION: Option<&'static Extension>;
    /// Major opcode for core requests, minor opcode for extension requests.
    const OPCODE: u8;

    /// Byte 1 of the header. Only core requests use it for data.
    fn data_byte(&self) -> u8 {
        0
    }
    /// Rejects arguments the wire format can't carry, before anything is serialized.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
    /// Writes the request body, after the 4-byte header.
    fn serialize(&self, w: &mut RequestWriter);
    /// File descriptors to pass along with the request.
    #[cfg(unix)]
    fn into_fds(self) -> Vec<OwnedFd> {
        Vec::new()
    }
}

/// A request the server answers.
pub trait ReplyRequest: Request {
    type Reply: FromRawReply;
    const SHAPE: ReplyShape = ReplyShape::Reply;
}

/// A request the server doesn't answer, unless it fails.
pub trait VoidRequest: Request {}

/// Serializes `request` without sending it.
pub fn to_raw<R: Request>(request: R, shape: ReplyShape, mode: RequestMode) -> RawRequest {
    let mut w = RequestWriter::with_data_byte(request.data_byte());
    request.serialize(&mut w);
    let bytes = w.finish();
    RawRequest {
        extension: R::EXTENSION,
        opcode: R::OPCODE,
        bytes,
        shape,
        mode,
        #[cfg(unix)]
        fds: request.into_fds(),
    }
}

fn prepare<C, R>(conn: &C, request: R, shape: ReplyShape, mode: RequestMode) -> Result<RawRequest>
    where C: RequestConnection + ?Sized, R: Request
{
    if let Some(ext) = R::EXTENSION {
        if conn.extension_information(ext)?.is_none() {
            return unsupported(format!("The X server lacks the `{}` extension", ext.name));
        }
    }
    request.validate()?;
    let raw = to_raw(request, shape, mode);
    trace!("Sending {:?}", raw);
    Ok(raw)
}

/// Send paths shared by every `RequestConnection`.
///
/// Per-extension traits (`XfixesExt`, `PresentExt`, ...) are thin wrappers
/// around these.
pub trait ConnectionExt: RequestConnection {
    /// Sends a request that has a reply.
    fn send_with_reply<R: ReplyRequest>(&self, request: R, mode: RequestMode) -> Result<Cookie<'_, Self, R::Reply>> {
        let raw = prepare(self, request, R::SHAPE, mode)?;
        let sequence = self.send_request(raw)?;
        Ok(Cookie::new(self, sequence, mode))
    }
    /// Sends a request that has no reply.
    fn send_void<R: VoidRequest>(&self, request: R, mode: RequestMode) -> Result<VoidCookie<'_, Self>> {
        let raw = prepare(self, request, ReplyShape::Void, mode)?;
        let sequence = self.send_request(raw)?;
        Ok(VoidCookie::new(self, sequence, mode))
    }
    /// Sends a request answered by a stream of replies.
    fn send_with_replies<R>(&self, request: R) -> Result<MultiReplyCookie<'_, Self, R::Reply>>
        where R: ReplyRequest, R::Reply: MultiReply
    {
        let raw = prepare(self, request, R::SHAPE, RequestMode::Checked)?;
        let sequence = self.send_request(raw)?;
        Ok(MultiReplyCookie::new(self, sequence))
    }
    /// An error dispatcher for every extension this connection's server has.
    fn error_dispatcher(&self) -> Result<ErrorDispatcher> {
        ErrorDispatcher::new(self)
    }
    /// Decodes an X error into its typed form.
    fn parse_error(&self, raw: &RawError) -> XError {
        match self.error_dispatcher() {
            Ok(d) => d.parse(raw),
            Err(e) => {
                warn!("Could not resolve extensions to decode {:?}: {}", raw, e);
                XError::from_raw(XErrorKind::Unknown(raw.error_code()), raw)
            },
        }
    }
}

impl<C: RequestConnection + ?Sized> ConnectionExt for C {}
