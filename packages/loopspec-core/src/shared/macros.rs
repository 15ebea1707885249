//! Shared macros for the codebase
//!
//! - `define_id!` declares the typed index newtypes of the host model
//! - `oracle_trace!` is a per-query trace hook that compiles away unless the
//!   `trace` feature is enabled (oracle traffic is far too chatty otherwise)

/// Declare a `Copy` index newtype with serde support and a short display prefix.
#[macro_export]
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(v: usize) -> Self {
                $name(v as u32)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

/// Per-query oracle tracing - no-op when the trace feature is disabled
#[cfg(not(feature = "trace"))]
#[macro_export]
macro_rules! oracle_trace {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "trace")]
#[macro_export]
macro_rules! oracle_trace {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}
