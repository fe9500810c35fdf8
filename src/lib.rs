#![no_std]
#![cfg_attr(docs_rs, feature(doc_cfg))]
#![warn(missing_docs)]
#![allow(unused_imports)]

//! A crate for turning PNG data into GPU textures.
//!
//! * [`decode_png_rgba8`] decodes a PNG into a [`PixelBuffer`] of 8-bit RGBA
//!   pixels, whatever pixel format the PNG stores.
//! * [`upload_rgba8`] hands a [`PixelBuffer`] to a [`TextureBackend`] and gives
//!   you a [`TextureHandle`].
//! * [`load_texture_png_rgba8`] does both in one step.
//!
//! ```
//! # #[cfg(feature = "memory_backend")]
//! # fn main() {
//! use pngtex::{load_texture_png_rgba8, ByteCursor, MemoryBackend};
//!
//! let mut backend = MemoryBackend::new();
//! let mut cursor = ByteCursor::new(b"not a png");
//! assert!(load_texture_png_rgba8(&mut cursor, &mut backend).is_err());
//! assert_eq!(backend.texture_count(), 0);
//! # }
//! # #[cfg(not(feature = "memory_backend"))]
//! # fn main() {}
//! ```
//!
//! The crate is `no_std` and only needs `alloc`. Diagnostics go through the
//! [`log`] facade: install any logger to see them.

extern crate alloc;

#[cfg(target_pointer_width = "16")]
compile_error!("this crate assumes 32-bit or bigger pointers!");

pub mod cursor;
pub use cursor::*;

pub mod error;
pub use error::*;

mod pixel_buffer;
pub use pixel_buffer::*;

pub mod png;
pub use png::{decode_png_rgba8, DecodeLimits, PngDecoder};

pub mod texture;
pub use texture::*;

/// Decodes a PNG from `source` and uploads it as a texture.
///
/// On success the source has been advanced past the end of the PNG. If
/// decoding fails nothing is sent to the backend.
///
/// See [`decode_png_rgba8`] and [`upload_rgba8`] for the details of each step.
pub fn load_texture_png_rgba8<S, B>(source: S, backend: &mut B) -> Result<TextureHandle, LoadError>
where
  S: ByteSource,
  B: TextureBackend + ?Sized,
{
  let pixels = decode_png_rgba8(source)?;
  Ok(upload_rgba8(backend, pixels)?)
}
