/// Generates fixed-offset getters over `self.reader()`.
///
/// `name: u32 @ 8;` becomes `pub fn name(&self) -> u32 { self.reader().u32(8) }`.
macro_rules! accessors {
    ($($(#[$m:meta])* $name:ident: $t:ident @ $offset:expr;)+) => {
        $(
            $(#[$m])*
            pub fn $name(&self) -> $t {
                self.reader().$t($offset)
            }
        )+
    };
}

/// Generates a typed event wrapper: a view over a shared `RawEvent` that is
/// at least `$min_len` bytes long.
macro_rules! event_wrapper {
    ($(#[$m:meta])* $name:ident, $min_len:expr) => {
        $(#[$m])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name(crate::raw::RawEvent);

        impl $name {
            pub const MIN_LENGTH: usize = $min_len;

            /// Wraps `raw` without checking which event it is.
            pub fn from_raw(raw: crate::raw::RawEvent) -> Option<Self> {
                if raw.bytes().len() < Self::MIN_LENGTH {
                    warn!("{} is {} bytes long, expected at least {}", stringify!($name), raw.bytes().len(), Self::MIN_LENGTH);
                    return None;
                }
                Some($name(raw))
            }
            pub fn raw(&self) -> &crate::raw::RawEvent {
                &self.0
            }
            pub fn sequence(&self) -> u16 {
                self.0.sequence()
            }
            pub fn is_send_event(&self) -> bool {
                self.0.is_send_event()
            }
            #[allow(dead_code)]
            fn reader(&self) -> crate::wire::Reader {
                self.0.reader()
            }
        }
    };
}

/// Declares the marker type, `ReplyKind` impl and alias of one reply.
macro_rules! reply_kind {
    ($(#[$m:meta])* $alias:ident = $kind:ident, $min_len:expr) => {
        #[derive(Debug)]
        pub enum $kind {}
        impl crate::reply::ReplyKind for $kind {
            const NAME: &'static str = stringify!($alias);
            const MIN_LENGTH: usize = $min_len;
        }
        $(#[$m])*
        pub type $alias = crate::reply::Reply<$kind>;
    };
}
