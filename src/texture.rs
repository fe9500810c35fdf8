#![forbid(unsafe_code)]

//! Module for handing decoded pixels to a graphics backend as a texture.
//!
//! The backend itself is a black box behind the [`TextureBackend`] trait. An
//! OpenGL backend would map the trait methods to `glGenTextures`,
//! `glTexParameteri`, `glTexImage2D` (followed by `glGetError`), and
//! `glDeleteTextures`.
//!
//! Textures are never destroyed implicitly. A [`TextureHandle`] is plain data
//! and you must call [`TextureHandle::release`] with the same backend that
//! created it.

use core::num::NonZeroU32;

use log::{debug, warn};

use crate::{
  error::{BackendError, UploadError},
  pixel_buffer::PixelBuffer,
};

#[cfg(feature = "memory_backend")]
mod memory;
#[cfg(feature = "memory_backend")]
pub use memory::*;

/// A sampling setting applied to every uploaded texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TextureParameter {
  /// Minification uses linear filtering.
  MinFilterLinear,
  /// Magnification uses linear filtering.
  MagFilterLinear,
  /// The S coordinate clamps to the edge texels.
  WrapSClampToEdge,
  /// The T coordinate clamps to the edge texels.
  WrapTClampToEdge,
  /// The R coordinate clamps to the edge texels.
  WrapRClampToEdge,
}
impl TextureParameter {
  /// Every parameter, in the order they're applied during an upload.
  pub const ALL: [Self; 5] = [
    Self::MinFilterLinear,
    Self::MagFilterLinear,
    Self::WrapSClampToEdge,
    Self::WrapTClampToEdge,
    Self::WrapRClampToEdge,
  ];
}

/// The graphics API that textures are created in.
///
/// Implementations are expected to copy the pixel data during
/// [`submit_rgba8`](TextureBackend::submit_rgba8), the bytes aren't kept alive
/// after that call.
pub trait TextureBackend {
  /// Makes a new, empty texture object.
  fn create_texture(&mut self) -> Result<NonZeroU32, BackendError>;

  /// Sets one sampling parameter of a texture.
  fn set_parameter(&mut self, texture: NonZeroU32, parameter: TextureParameter);

  /// Stores RGBA8 pixels as the full contents of mip level 0 of a texture.
  ///
  /// `pixels` is `width * height * 4` bytes, rows top to bottom.
  ///
  /// Errors picked up by [`set_parameter`](TextureBackend::set_parameter)
  /// since this texture was created are reported here too. Nothing flagged
  /// before [`create_texture`](TextureBackend::create_texture) is.
  fn submit_rgba8(
    &mut self, texture: NonZeroU32, width: u32, height: u32, pixels: &[u8],
  ) -> Result<(), BackendError>;

  /// Destroys a texture object.
  fn delete_texture(&mut self, texture: NonZeroU32);
}

impl<B: TextureBackend + ?Sized> TextureBackend for &mut B {
  #[inline]
  fn create_texture(&mut self) -> Result<NonZeroU32, BackendError> {
    (**self).create_texture()
  }
  #[inline]
  fn set_parameter(&mut self, texture: NonZeroU32, parameter: TextureParameter) {
    (**self).set_parameter(texture, parameter)
  }
  #[inline]
  fn submit_rgba8(
    &mut self, texture: NonZeroU32, width: u32, height: u32, pixels: &[u8],
  ) -> Result<(), BackendError> {
    (**self).submit_rgba8(texture, width, height, pixels)
  }
  #[inline]
  fn delete_texture(&mut self, texture: NonZeroU32) {
    (**self).delete_texture(texture)
  }
}

/// A texture living in a [`TextureBackend`].
///
/// A handle with all fields 0 doesn't refer to anything. That's the state
/// after [`release`](TextureHandle::release) and also the `Default`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextureHandle {
  /// Backend id of the texture, 0 once released.
  pub id: u32,
  /// Width in pixels, 0 once released.
  pub width: u32,
  /// Height in pixels, 0 once released.
  pub height: u32,
}
impl TextureHandle {
  /// If this handle still refers to a texture.
  #[inline]
  #[must_use]
  pub const fn is_live(&self) -> bool {
    self.id != 0
  }

  /// Destroys the texture and zeroes the handle.
  ///
  /// Releasing a handle that's already zeroed doesn't call the backend at
  /// all, so releasing twice is harmless.
  pub fn release<B: TextureBackend + ?Sized>(&mut self, backend: &mut B) {
    if let Some(id) = NonZeroU32::new(self.id) {
      debug!("releasing texture {id}");
      backend.delete_texture(id);
    }
    *self = Self::default();
  }
}

/// Uploads RGBA8 pixels as a new texture.
///
/// The texture gets linear filtering and clamp-to-edge wrapping (see
/// [`TextureParameter::ALL`]). The pixels are dropped once the backend has
/// them, whether or not the upload worked.
///
/// ## Failure
/// * If the backend can't create a texture.
/// * If the backend reports an error for the submission. The texture that was
///   created for the upload is deleted again before this returns.
pub fn upload_rgba8<B: TextureBackend + ?Sized>(
  backend: &mut B, pixels: PixelBuffer,
) -> Result<TextureHandle, UploadError> {
  let id = backend.create_texture().map_err(|e| {
    warn!("texture creation failed: {e}");
    UploadError::BackendRejected(e)
  })?;
  for parameter in TextureParameter::ALL {
    backend.set_parameter(id, parameter);
  }
  let (width, height) = (pixels.width(), pixels.height());
  let submitted = backend.submit_rgba8(id, width, height, pixels.as_bytes());
  drop(pixels);
  match submitted {
    Ok(()) => {
      debug!("uploaded {width}x{height} RGBA8 as texture {id}");
      Ok(TextureHandle { id: id.get(), width, height })
    }
    Err(e) => {
      warn!("texture {id} upload rejected: {e}");
      backend.delete_texture(id);
      Err(UploadError::BackendRejected(e))
    }
  }
}
