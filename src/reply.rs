//! Typed replies.
//!
//! A `Reply<K>` owns the raw reply buffer of one request. The marker type
//! `K` names the request; each extension module adds accessors to its own
//! `Reply<K>` instantiations, which decode fields when called.

use std::fmt;
use std::marker::PhantomData;

use crate::error::{Result, failed};
use crate::raw::{RawReply, HEADER_SIZE};
use crate::wire::Reader;

/// Anything that can be built out of a raw reply.
pub trait FromRawReply: Sized {
    fn from_raw_reply(raw: RawReply) -> Result<Self>;
}

/// Marker for one kind of reply.
pub trait ReplyKind {
    /// Used in logs and error messages.
    const NAME: &'static str;
    /// Shortest buffer the fixed-offset accessors may read from.
    const MIN_LENGTH: usize = HEADER_SIZE;
}

/// A typed view over the reply to a request of kind `K`.
pub struct Reply<K> {
    raw: RawReply,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ReplyKind> fmt::Debug for Reply<K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct(K::NAME)
            .field("sequence", &self.sequence())
            .field("length", &self.length())
            .finish()
    }
}

impl<K: ReplyKind> FromRawReply for Reply<K> {
    fn from_raw_reply(raw: RawReply) -> Result<Self> {
        if raw.bytes().len() < K::MIN_LENGTH {
            warn!("{} reply is {} bytes long, expected at least {}", K::NAME, raw.bytes().len(), K::MIN_LENGTH);
            return failed(format!("{} reply is too short", K::NAME));
        }
        Ok(Self { raw, _kind: PhantomData })
    }
}

impl<K> Reply<K> {
    pub fn raw(&self) -> &RawReply {
        &self.raw
    }
    pub fn into_raw(self) -> RawReply {
        self.raw
    }
    pub fn sequence(&self) -> u16 {
        self.raw.sequence()
    }
    /// Length of the trailing data, in 4-byte units.
    pub fn length(&self) -> u32 {
        self.raw.length()
    }
    pub(crate) fn reader(&self) -> Reader {
        self.raw.reader()
    }
    /// The byte at offset 1, which some replies use for a small field.
    pub(crate) fn data_byte(&self) -> u8 {
        self.raw.bytes()[1]
    }
    #[cfg(unix)]
    pub(crate) fn raw_mut(&mut self) -> &mut RawReply {
        &mut self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::tests::reply_bytes;

    struct Fat;
    impl ReplyKind for Fat {
        const NAME: &'static str = "Fat";
        const MIN_LENGTH: usize = 40;
    }

    #[test]
    fn min_length_is_enforced() {
        let short = RawReply::new(reply_bytes(4, |_| ()).into_boxed_slice()).unwrap();
        assert!(Reply::<Fat>::from_raw_reply(short).is_err());
        let long = RawReply::new(reply_bytes(8, |b| b[1] = 7).into_boxed_slice()).unwrap();
        let reply = Reply::<Fat>::from_raw_reply(long).unwrap();
        assert_eq!(reply.length(), 2);
        assert_eq!(reply.data_byte(), 7);
    }
}
