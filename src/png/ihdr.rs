use super::*;

/// The types of color that PNG supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PngColorType {
  /// Greyscale
  Y = 0,
  /// Red, Green, Blue
  RGB = 2,
  /// Index into a palette.
  ///
  /// The palette will have RGB8 data. There may optionally be a transparency
  /// chunk.
  Index = 3,
  /// Greyscale + Alpha
  YA = 4,
  /// Red, Green, Blue, Alpha
  RGBA = 6,
}
impl PngColorType {
  /// The number of channels in this type of color.
  #[inline]
  #[must_use]
  pub const fn channel_count(self) -> usize {
    match self {
      Self::Y => 1,
      Self::RGB => 3,
      Self::Index => 1,
      Self::YA => 2,
      Self::RGBA => 4,
    }
  }

  /// If the pixels carry their own alpha channel.
  #[inline]
  #[must_use]
  pub const fn has_alpha(self) -> bool {
    matches!(self, Self::YA | Self::RGBA)
  }

  /// If the color type is greyscale (with or without alpha).
  #[inline]
  #[must_use]
  pub const fn is_grayscale(self) -> bool {
    matches!(self, Self::Y | Self::YA)
  }

  /// The bit depths allowed with this color type.
  #[inline]
  #[must_use]
  pub const fn allowed_bit_depths(self) -> &'static [u8] {
    match self {
      Self::Y => &[1, 2, 4, 8, 16],
      Self::Index => &[1, 2, 4, 8],
      Self::RGB | Self::YA | Self::RGBA => &[8, 16],
    }
  }
}
impl TryFrom<u8> for PngColorType {
  type Error = StreamFault;
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => PngColorType::Y,
      2 => PngColorType::RGB,
      3 => PngColorType::Index,
      4 => PngColorType::YA,
      6 => PngColorType::RGBA,
      _ => return Err(StreamFault::IllegalColorTypeBitDepthCombination),
    })
  }
}

/// Image Header
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IHDR {
  /// width in pixels
  pub width: u32,
  /// height in pixels
  pub height: u32,
  /// bits per channel
  pub bit_depth: u8,
  /// pixel color type
  pub color_type: PngColorType,
  /// if the image data is stored with Adam7 interlacing.
  pub is_interlaced: bool,
}
impl TryFrom<&[u8]> for IHDR {
  type Error = StreamFault;
  fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
    match *value {
      [w0, w1, w2, w3, h0, h1, h2, h3, bit_depth, color_type, compression_method, filter_method, interlace_method] =>
      {
        let width = u32::from_be_bytes([w0, w1, w2, w3]);
        let height = u32::from_be_bytes([h0, h1, h2, h3]);
        if width == 0 || height == 0 {
          return Err(StreamFault::WidthOrHeightZero);
        }
        if width > PNG_UINT_31_MAX || height > PNG_UINT_31_MAX {
          return Err(StreamFault::IhdrIllegalData);
        }
        let color_type = PngColorType::try_from(color_type)?;
        if !color_type.allowed_bit_depths().contains(&bit_depth) {
          return Err(StreamFault::IllegalColorTypeBitDepthCombination);
        }
        if compression_method != 0 || filter_method != 0 {
          return Err(StreamFault::IhdrIllegalData);
        }
        let is_interlaced = match interlace_method {
          0 => false,
          1 => true,
          _ => return Err(StreamFault::IhdrIllegalData),
        };
        Ok(Self { width, height, bit_depth, color_type, is_interlaced })
      }
      _ => Err(StreamFault::IhdrIllegalData),
    }
  }
}
impl IHDR {
  /// Bits used by one pixel of the stored data.
  #[inline]
  #[must_use]
  pub const fn bits_per_pixel(&self) -> usize {
    (self.bit_depth as usize) * self.color_type.channel_count()
  }

  /// Filtering works on bytes, and compares each byte against the same byte
  /// of the pixel to the left. For pixels smaller than a byte that's just the
  /// byte to the left.
  #[inline]
  #[must_use]
  pub const fn filter_unit(&self) -> usize {
    let bytes = self.bits_per_pixel() / 8;
    if bytes == 0 {
      1
    } else {
      bytes
    }
  }

  /// Bytes in one scanline (without the filter byte) of a given pixel width.
  ///
  /// Packed pixels can leave a partial byte at the end of the line, so this
  /// rounds up.
  #[inline]
  #[must_use]
  pub fn bytes_per_scanline(&self, width: u32) -> Option<usize> {
    let bits = self.bits_per_pixel().checked_mul(width as usize)?;
    Some(bits / 8 + usize::from(bits % 8 != 0))
  }

  /// Size of the fully decompressed (but still filtered) image data.
  ///
  /// Each scanline of each pass is a filter byte followed by the scanline
  /// bytes. Interlaced images are seven reduced images back to back.
  pub fn filtered_data_len(&self) -> Option<usize> {
    let mut total = 0_usize;
    for pass in image_passes(self) {
      if pass.is_empty() {
        continue;
      }
      let filterline = self.bytes_per_scanline(pass.width)?.checked_add(1)?;
      total = total.checked_add(filterline.checked_mul(pass.height as usize)?)?;
    }
    Some(total)
  }
}

#[test]
fn test_ihdr_parse_rules() {
  fn ihdr(w: u32, h: u32, depth: u8, color: u8, interlace: u8) -> [u8; 13] {
    let [w0, w1, w2, w3] = w.to_be_bytes();
    let [h0, h1, h2, h3] = h.to_be_bytes();
    [w0, w1, w2, w3, h0, h1, h2, h3, depth, color, 0, 0, interlace]
  }
  let good = IHDR::try_from(&ihdr(3, 2, 4, 3, 1)[..]).unwrap();
  assert_eq!(good.width, 3);
  assert_eq!(good.height, 2);
  assert_eq!(good.color_type, PngColorType::Index);
  assert!(good.is_interlaced);
  assert_eq!(IHDR::try_from(&ihdr(0, 2, 8, 6, 0)[..]), Err(StreamFault::WidthOrHeightZero));
  assert_eq!(IHDR::try_from(&ihdr(2, 0, 8, 6, 0)[..]), Err(StreamFault::WidthOrHeightZero));
  assert_eq!(IHDR::try_from(&ihdr(1 << 31, 1, 8, 6, 0)[..]), Err(StreamFault::IhdrIllegalData));
  assert_eq!(
    IHDR::try_from(&ihdr(1, 1, 4, 2, 0)[..]),
    Err(StreamFault::IllegalColorTypeBitDepthCombination)
  );
  assert_eq!(
    IHDR::try_from(&ihdr(1, 1, 16, 3, 0)[..]),
    Err(StreamFault::IllegalColorTypeBitDepthCombination)
  );
  assert_eq!(
    IHDR::try_from(&ihdr(1, 1, 8, 5, 0)[..]),
    Err(StreamFault::IllegalColorTypeBitDepthCombination)
  );
  assert_eq!(IHDR::try_from(&ihdr(1, 1, 8, 0, 2)[..]), Err(StreamFault::IhdrIllegalData));
  assert_eq!(IHDR::try_from(&[0_u8; 12][..]), Err(StreamFault::IhdrIllegalData));
}

#[test]
fn test_filtered_data_len() {
  let mut h = IHDR { width: 3, height: 2, bit_depth: 1, color_type: PngColorType::Y, is_interlaced: false };
  // 3 bits round up to 1 byte, plus a filter byte, two lines.
  assert_eq!(h.filtered_data_len(), Some(4));
  h.bit_depth = 16;
  h.color_type = PngColorType::RGBA;
  assert_eq!(h.filter_unit(), 8);
  assert_eq!(h.filtered_data_len(), Some((1 + 24) * 2));
  // 8x8 interlaced RGBA16: passes are 1x1, 1x1, 2x1, 2x2, 4x2, 4x4, 8x4
  h.width = 8;
  h.height = 8;
  h.is_interlaced = true;
  let expected = (1 + 8) + (1 + 8) + (1 + 16) + (1 + 16) * 2 + (1 + 32) * 2 + (1 + 32) * 4 + (1 + 64) * 4;
  assert_eq!(h.filtered_data_len(), Some(expected));
}
