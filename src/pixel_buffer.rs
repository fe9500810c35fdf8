use alloc::vec::Vec;

use crate::error::StreamFault;

/// An owned image of 8-bit RGBA pixels.
///
/// * Pixels are `[r, g, b, a]` with straight (not premultiplied) alpha.
/// * Rows go top to bottom and are tightly packed, with no padding between
///   them, so row `y` starts at byte `y * width * 4`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PixelBuffer {
  width: u32,
  height: u32,
  pixels: Vec<[u8; 4]>,
}
impl core::fmt::Debug for PixelBuffer {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("PixelBuffer")
      .field("width", &self.width)
      .field("height", &self.height)
      .field("pixels", &(&self.pixels[..self.pixels.len().min(4)], self.pixels.len()))
      .finish()
  }
}
impl PixelBuffer {
  /// A buffer of transparent black, or an error if it can't be allocated.
  pub(crate) fn try_new_zeroed(width: u32, height: u32) -> Result<Self, StreamFault> {
    let count = (width as usize).checked_mul(height as usize).ok_or(StreamFault::CheckedMath)?;
    let mut pixels = Vec::new();
    pixels.try_reserve_exact(count).map_err(|_| StreamFault::OutOfMemory)?;
    pixels.resize(count, [0; 4]);
    Ok(Self { width, height, pixels })
  }

  /// Wraps pixel data that's already RGBA8.
  ///
  /// Gives `None` if either dimension is 0 or if `bytes` isn't exactly
  /// `width * height * 4` long.
  #[must_use]
  pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> Option<Self> {
    if width == 0 || height == 0 {
      return None;
    }
    let count = (width as usize).checked_mul(height as usize)?;
    let pixels: &[[u8; 4]] = bytemuck::try_cast_slice(bytes).ok()?;
    if pixels.len() != count {
      return None;
    }
    Some(Self { width, height, pixels: pixels.to_vec() })
  }

  /// Width in pixels.
  #[inline]
  #[must_use]
  pub const fn width(&self) -> u32 {
    self.width
  }

  /// Height in pixels.
  #[inline]
  #[must_use]
  pub const fn height(&self) -> u32 {
    self.height
  }

  /// All the pixel data as bytes, `width * height * 4` of them.
  #[inline]
  #[must_use]
  pub fn as_bytes(&self) -> &[u8] {
    bytemuck::cast_slice(&self.pixels)
  }

  /// All the pixels, row by row.
  #[inline]
  #[must_use]
  pub fn pixels(&self) -> &[[u8; 4]] {
    &self.pixels
  }

  #[inline]
  pub(crate) fn pixels_mut(&mut self) -> &mut [[u8; 4]] {
    &mut self.pixels
  }

  /// The pixels of row `y`, if it's in bounds.
  #[inline]
  #[must_use]
  pub fn row(&self, y: u32) -> Option<&[[u8; 4]]> {
    self.rows().nth(y as usize)
  }

  /// Iterates the rows from top to bottom.
  #[inline]
  pub fn rows(&self) -> impl ExactSizeIterator<Item = &[[u8; 4]]> + '_ {
    self.pixels.chunks_exact(self.width as usize)
  }

  /// The pixel at `(x, y)`, if it's in bounds.
  #[inline]
  #[must_use]
  pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
    if x < self.width && y < self.height {
      self.pixels.get(y as usize * self.width as usize + x as usize).copied()
    } else {
      None
    }
  }

  /// Unwraps the pixel data as bytes.
  #[must_use]
  pub fn into_bytes(self) -> Vec<u8> {
    bytemuck::cast_slice(&self.pixels).to_vec()
  }
}

#[test]
fn test_from_rgba8() {
  assert!(PixelBuffer::from_rgba8(0, 1, &[]).is_none());
  assert!(PixelBuffer::from_rgba8(1, 1, &[1, 2, 3]).is_none());
  assert!(PixelBuffer::from_rgba8(1, 1, &[1, 2, 3, 4, 5, 6, 7, 8]).is_none());

  let bytes: Vec<u8> = (0..24).collect();
  let buf = PixelBuffer::from_rgba8(3, 2, &bytes).unwrap();
  assert_eq!(buf.width(), 3);
  assert_eq!(buf.height(), 2);
  assert_eq!(buf.as_bytes(), &bytes[..]);
  assert_eq!(buf.pixel(1, 1), Some([16, 17, 18, 19]));
  assert_eq!(buf.pixel(3, 0), None);
  assert_eq!(buf.row(1).unwrap()[0], [12, 13, 14, 15]);
  assert!(buf.row(2).is_none());
  assert_eq!(buf.rows().len(), 2);
  assert_eq!(buf.into_bytes(), bytes);
}

#[test]
fn test_try_new_zeroed() {
  let buf = PixelBuffer::try_new_zeroed(5, 4).unwrap();
  assert_eq!(buf.pixels().len(), 20);
  assert!(buf.as_bytes().iter().all(|&b| b == 0));
  assert!(PixelBuffer::try_new_zeroed(u32::MAX, u32::MAX).is_err());
}
