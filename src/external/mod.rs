//! Boundary to third-party decoders for PNG, JPEG and EXR.
//!
//! The in-crate codecs never touch this module's lock. Adapters wrapping
//! libraries that are not safe to call concurrently take a [`LibraryGuard`]
//! at construction and hold it for the duration of each call.

#[cfg(feature = "external")]
mod image_crate;

#[cfg(feature = "external")]
pub use image_crate::ImageCrateDecoder;

use alloc::vec::Vec;

use crate::error::DecodeError;
use crate::pixel::{ChannelLayout, ImageFormat};

/// Header facts reported by an external decoder without decoding pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExternalInfo {
    pub width: u32,
    pub height: u32,
    /// Channel layout as stored in the file.
    pub layout: ChannelLayout,
    /// Bits per channel as stored in the file.
    pub bit_depth: u8,
}

/// A decoder for formats this crate does not parse itself.
///
/// `decode` must return exactly `width * height * bytes_per_pixel(layout,
/// bit_depth)` bytes; 16-bit samples are native endian.
pub trait ExternalDecoder: Send + Sync {
    /// Whether `format` can be handled at all.
    fn supports(&self, format: ImageFormat) -> bool;

    /// Read dimensions and native pixel layout.
    fn probe(&self, format: ImageFormat, data: &[u8]) -> Result<ExternalInfo, DecodeError>;

    /// Decode into the requested layout and bit depth.
    fn decode(
        &self,
        format: ImageFormat,
        data: &[u8],
        layout: ChannelLayout,
        bit_depth: u8,
    ) -> Result<Vec<u8>, DecodeError>;
}

#[cfg(feature = "std")]
pub use guard::LibraryGuard;

#[cfg(feature = "std")]
mod guard {
    use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

    /// Shared mutual-exclusion capability for non-reentrant libraries.
    ///
    /// Clones share one lock. [`LibraryGuard::shared`] returns the process-wide
    /// instance that the built-in adapters use by default.
    #[derive(Clone, Debug, Default)]
    pub struct LibraryGuard(Arc<Mutex<()>>);

    impl LibraryGuard {
        /// A fresh, independent lock.
        pub fn new() -> Self {
            Self::default()
        }

        /// The process-wide lock.
        pub fn shared() -> Self {
            static SHARED: OnceLock<LibraryGuard> = OnceLock::new();
            SHARED.get_or_init(LibraryGuard::new).clone()
        }

        /// Block until the lock is held. A poisoned lock is still acquired;
        /// it protects no data.
        pub fn lock(&self) -> MutexGuard<'_, ()> {
            self.0.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Whether two guards share the same lock.
        pub fn same_lock(&self, other: &LibraryGuard) -> bool {
            Arc::ptr_eq(&self.0, &other.0)
        }
    }

}
