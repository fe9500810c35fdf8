use alloc::{collections::BTreeMap, vec::Vec};
use core::num::NonZeroU32;

use super::*;

/// A texture stored by a [`MemoryBackend`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MemoryTexture {
  /// Width of level 0, or 0 if nothing was submitted yet.
  pub width: u32,
  /// Height of level 0, or 0 if nothing was submitted yet.
  pub height: u32,
  /// Level 0 pixel data, RGBA8.
  pub pixels: Vec<u8>,
  /// Parameters in the order they were set.
  pub parameters: Vec<TextureParameter>,
}

/// A [`TextureBackend`] that keeps every texture in RAM.
///
/// Handy for headless use and for testing code that uploads textures. Errors
/// are reported with the same codes a GL driver would use for the same
/// mistake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBackend {
  textures: BTreeMap<u32, MemoryTexture>,
  next_id: u32,
  max_texture_size: u32,
  pending_error: Option<BackendError>,
}
impl Default for MemoryBackend {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}
impl MemoryBackend {
  /// The default maximum texture size.
  pub const DEFAULT_MAX_TEXTURE_SIZE: u32 = 16384;

  /// An empty backend with the default maximum texture size.
  #[inline]
  #[must_use]
  pub const fn new() -> Self {
    Self::with_max_texture_size(Self::DEFAULT_MAX_TEXTURE_SIZE)
  }

  /// An empty backend that rejects textures wider or taller than `max`.
  #[inline]
  #[must_use]
  pub const fn with_max_texture_size(max: u32) -> Self {
    Self { textures: BTreeMap::new(), next_id: 1, max_texture_size: max, pending_error: None }
  }

  /// The number of live textures.
  #[inline]
  #[must_use]
  pub fn texture_count(&self) -> usize {
    self.textures.len()
  }

  /// Looks up a live texture.
  #[inline]
  #[must_use]
  pub fn texture(&self, id: u32) -> Option<&MemoryTexture> {
    self.textures.get(&id)
  }

  /// Records an error to be reported by the next submission, keeping the
  /// first one like `glGetError` does. Creating a texture clears it.
  fn flag(&mut self, error: BackendError) {
    self.pending_error.get_or_insert(error);
  }

  fn store(
    &mut self, id: u32, width: u32, height: u32, pixels: &[u8],
  ) -> Result<(), BackendError> {
    if width > self.max_texture_size || height > self.max_texture_size {
      return Err(BackendError::INVALID_VALUE);
    }
    let expected = (width as usize)
      .checked_mul(height as usize)
      .and_then(|n| n.checked_mul(4))
      .ok_or(BackendError::INVALID_VALUE)?;
    if pixels.len() != expected {
      return Err(BackendError::INVALID_VALUE);
    }
    let texture = self.textures.get_mut(&id).ok_or(BackendError::INVALID_OPERATION)?;
    let mut copy = Vec::new();
    copy.try_reserve_exact(pixels.len())?;
    copy.extend_from_slice(pixels);
    texture.width = width;
    texture.height = height;
    texture.pixels = copy;
    Ok(())
  }
}
impl TextureBackend for MemoryBackend {
  fn create_texture(&mut self) -> Result<NonZeroU32, BackendError> {
    // a new upload starts here, nothing from earlier calls carries over
    self.pending_error = None;
    let id = NonZeroU32::new(self.next_id).ok_or(BackendError::OUT_OF_MEMORY)?;
    self.next_id = self.next_id.checked_add(1).unwrap_or(0);
    self.textures.insert(id.get(), MemoryTexture::default());
    Ok(id)
  }

  fn set_parameter(&mut self, texture: NonZeroU32, parameter: TextureParameter) {
    match self.textures.get_mut(&texture.get()) {
      Some(t) => t.parameters.push(parameter),
      None => self.flag(BackendError::INVALID_OPERATION),
    }
  }

  fn submit_rgba8(
    &mut self, texture: NonZeroU32, width: u32, height: u32, pixels: &[u8],
  ) -> Result<(), BackendError> {
    let stored = self.store(texture.get(), width, height, pixels);
    match self.pending_error.take() {
      Some(earlier) => Err(earlier),
      None => stored,
    }
  }

  fn delete_texture(&mut self, texture: NonZeroU32) {
    // deleting an unknown name is silently ignored, as in GL
    self.textures.remove(&texture.get());
  }
}

#[test]
fn test_memory_backend_store() {
  let mut backend = MemoryBackend::with_max_texture_size(4);
  let id = backend.create_texture().unwrap();
  assert_eq!(id.get(), 1);
  backend.set_parameter(id, TextureParameter::MinFilterLinear);
  backend.submit_rgba8(id, 1, 2, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
  let t = backend.texture(1).unwrap();
  assert_eq!((t.width, t.height), (1, 2));
  assert_eq!(t.pixels, [1, 2, 3, 4, 5, 6, 7, 8]);
  assert_eq!(t.parameters, [TextureParameter::MinFilterLinear]);

  assert_eq!(backend.submit_rgba8(id, 1, 1, &[0; 3]), Err(BackendError::INVALID_VALUE));
  assert_eq!(backend.submit_rgba8(id, 5, 1, &[0; 20]), Err(BackendError::INVALID_VALUE));
  backend.delete_texture(id);
  assert_eq!(backend.texture_count(), 0);
  assert_eq!(backend.submit_rgba8(id, 1, 1, &[0; 4]), Err(BackendError::INVALID_OPERATION));
}

#[test]
fn test_memory_backend_error_scope() {
  let mut backend = MemoryBackend::new();
  let ghost = NonZeroU32::new(99).unwrap();

  // an error from before the texture was created isn't reported
  backend.set_parameter(ghost, TextureParameter::WrapSClampToEdge);
  let id = backend.create_texture().unwrap();
  assert_eq!(backend.submit_rgba8(id, 1, 1, &[0; 4]), Ok(()));

  // one between creation and submission is, and only once
  let id = backend.create_texture().unwrap();
  backend.set_parameter(ghost, TextureParameter::WrapSClampToEdge);
  backend.set_parameter(id, TextureParameter::MinFilterLinear);
  assert_eq!(backend.submit_rgba8(id, 1, 1, &[0; 4]), Err(BackendError::INVALID_OPERATION));
  assert_eq!(backend.submit_rgba8(id, 1, 1, &[0; 4]), Ok(()));
}
