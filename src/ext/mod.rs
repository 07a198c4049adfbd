//! One module per X extension.
//!
//! Each module has the extension's `EXTENSION` descriptor, its requests and
//! reply accessors, its events and errors where the protocol defines any, and
//! an extension trait that adds the requests to every `RequestConnection`.

use crate::connection::RequestConnection;
use crate::error::Result;
use crate::extension::{Extension, ExtensionInfo};
#[allow(unused_imports)]
use crate::x_error::ErrorTable;

#[cfg(feature = "dri2")]
pub mod dri2;
#[cfg(all(unix, feature = "dri3"))]
pub mod dri3;
#[cfg(feature = "present")]
pub mod present;
#[cfg(feature = "record")]
pub mod record;
#[cfg(feature = "res")]
pub mod res;
#[cfg(feature = "xfixes")]
pub mod xfixes;
#[cfg(feature = "xkb")]
pub mod xkb;
#[cfg(feature = "xprint")]
pub mod xprint;
#[cfg(feature = "xselinux")]
pub mod xselinux;
#[cfg(feature = "xv")]
pub mod xv;
#[cfg(feature = "xvmc")]
pub mod xvmc;

/// Every extension this build knows about.
pub fn all() -> Vec<&'static Extension> {
    #[allow(unused_mut)]
    let mut all: Vec<&'static Extension> = Vec::new();
    #[cfg(feature = "dri2")]
    all.push(&dri2::EXTENSION);
    #[cfg(all(unix, feature = "dri3"))]
    all.push(&dri3::EXTENSION);
    #[cfg(feature = "present")]
    all.push(&present::EXTENSION);
    #[cfg(feature = "record")]
    all.push(&record::EXTENSION);
    #[cfg(feature = "res")]
    all.push(&res::EXTENSION);
    #[cfg(feature = "xfixes")]
    all.push(&xfixes::EXTENSION);
    #[cfg(feature = "xkb")]
    all.push(&xkb::EXTENSION);
    #[cfg(feature = "xprint")]
    all.push(&xprint::EXTENSION);
    #[cfg(feature = "xselinux")]
    all.push(&xselinux::EXTENSION);
    #[cfg(feature = "xv")]
    all.push(&xv::EXTENSION);
    #[cfg(feature = "xvmc")]
    all.push(&xvmc::EXTENSION);
    all
}

/// Resolves every extension this build knows about, so that later requests
/// and dispatchers answer from the connection's cache.
pub fn resolve_all<C: RequestConnection + ?Sized>(conn: &C) -> Result<Vec<(&'static Extension, Option<ExtensionInfo>)>> {
    let mut out = Vec::new();
    for ext in all() {
        let info = conn.extension_information(ext)?;
        out.push((ext, info));
    }
    trace!("Resolved {} extensions, {} present", out.len(), out.iter().filter(|&&(_, info)| info.is_some()).count());
    Ok(out)
}

/// Error decoders of the extensions that define errors.
pub(crate) fn error_tables() -> Vec<ErrorTable> {
    #[allow(unused_mut)]
    let mut tables = Vec::new();
    #[cfg(feature = "record")]
    tables.push(ErrorTable { extension: &record::EXTENSION, decode: record::decode_error });
    #[cfg(feature = "xfixes")]
    tables.push(ErrorTable { extension: &xfixes::EXTENSION, decode: xfixes::decode_error });
    #[cfg(feature = "xkb")]
    tables.push(ErrorTable { extension: &xkb::EXTENSION, decode: xkb::decode_error });
    #[cfg(feature = "xprint")]
    tables.push(ErrorTable { extension: &xprint::EXTENSION, decode: xprint::decode_error });
    #[cfg(feature = "xv")]
    tables.push(ErrorTable { extension: &xv::EXTENSION, decode: xv::decode_error });
    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeConnection;

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = all().iter().map(|e| e.name).collect();
        let n = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), n);
    }

    #[test]
    fn resolve_all_hits_each_extension_once() {
        let conn = FakeConnection::new();
        let first = resolve_all(&conn).unwrap();
        assert!(first.iter().all(|&(_, info)| info.is_none()));
        resolve_all(&conn).unwrap();
        assert_eq!(conn.resolutions.get(), all().len());
    }
}
