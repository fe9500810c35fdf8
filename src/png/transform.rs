//! Format negotiation: getting from any stored PNG pixel format to RGBA8.

use super::*;

/// The normalization stages applied to the stored pixels.
///
/// The stages run in field order, and each one sees the format left by the
/// ones before it. [`Transforms::negotiate`] picks the stages so that every
/// PNG pixel format ends up as 8-bit RGBA with straight alpha.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Transforms {
  /// Indexed color: look up each index in the palette to get RGB.
  pub palette_to_rgb: bool,
  /// Greyscale under 8 bits: scale samples up to 8 bits.
  pub expand_gray_to_8: bool,
  /// Indexed color under 8 bits: one index per byte.
  pub unpack: bool,
  /// A transparency chunk is present: turn it into an alpha channel.
  pub trns_to_alpha: bool,
  /// 16-bit samples: keep only the high byte of each.
  pub strip_16: bool,
  /// Greyscale: copy the gray value to red, green, and blue.
  pub gray_to_rgb: bool,
  /// Fill in a fully opaque alpha channel if there's still none.
  pub add_opaque_alpha: bool,
}
impl Transforms {
  /// Picks the stages for an image with this header.
  #[must_use]
  pub fn negotiate(header: &IHDR, has_transparency: bool) -> Self {
    let color_type = header.color_type;
    let sub_byte = header.bit_depth < 8;
    Self {
      palette_to_rgb: color_type == PngColorType::Index,
      expand_gray_to_8: sub_byte && color_type.is_grayscale(),
      unpack: sub_byte && !color_type.is_grayscale(),
      trns_to_alpha: has_transparency,
      strip_16: header.bit_depth == 16,
      gray_to_rgb: color_type.is_grayscale(),
      add_opaque_alpha: color_type != PngColorType::RGBA,
    }
  }

  /// The pixel format produced after all stages have run.
  #[must_use]
  pub fn output_format(&self, header: &IHDR) -> OutputFormat {
    use PngColorType::*;
    let mut bit_depth = header.bit_depth;
    let mut color_type = header.color_type;
    if self.palette_to_rgb && color_type == Index {
      color_type = RGB;
      bit_depth = 8;
    }
    if (self.expand_gray_to_8 || self.unpack) && bit_depth < 8 {
      bit_depth = 8;
    }
    if self.trns_to_alpha {
      color_type = match color_type {
        Y => YA,
        RGB => RGBA,
        other => other,
      };
    }
    if self.strip_16 && bit_depth == 16 {
      bit_depth = 8;
    }
    if self.gray_to_rgb {
      color_type = match color_type {
        Y => RGB,
        YA => RGBA,
        other => other,
      };
    }
    // the filler only goes on pixels that don't have alpha at this point
    if self.add_opaque_alpha {
      color_type = match color_type {
        Y => YA,
        RGB => RGBA,
        other => other,
      };
    }
    OutputFormat { width: header.width, height: header.height, bit_depth, color_type }
  }
}

/// Image format after transform negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputFormat {
  /// width in pixels
  pub width: u32,
  /// height in pixels
  pub height: u32,
  /// bits per channel
  pub bit_depth: u8,
  /// channel layout
  pub color_type: PngColorType,
}
impl OutputFormat {
  /// If this is 8 bits per channel RGBA.
  #[inline]
  #[must_use]
  pub fn is_rgba8(&self) -> bool {
    self.bit_depth == 8 && self.color_type == PngColorType::RGBA
  }
}

/// The palette of an indexed image.
///
/// Entries past the declared length stay black, which is what a decoder
/// shows for an index that's out of range.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct Palette {
  pub(crate) entries: [[u8; 3]; 256],
  pub(crate) len: usize,
}
impl Palette {
  pub(crate) fn new(colors: &[[u8; 3]]) -> Self {
    let mut entries = [[0_u8; 3]; 256];
    let len = colors.len().min(256);
    entries[..len].copy_from_slice(&colors[..len]);
    Self { entries, len }
  }
}
impl Debug for Palette {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    // currently prints no more than 4 palette entries
    f.debug_tuple("Palette").field(&&self.entries[..self.len.min(4)]).field(&self.len).finish()
  }
}

/// Transparency data from a valid `tRNS` chunk.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transparency {
  /// This gray sample value is fully transparent.
  Gray(u16),
  /// This RGB sample value is fully transparent.
  Rgb([u16; 3]),
  /// Alpha for each palette entry. Entries without a value are opaque.
  Indexed([u8; 256]),
}
impl Debug for Transparency {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      Self::Gray(y) => f.debug_tuple("Gray").field(y).finish(),
      Self::Rgb(rgb) => f.debug_tuple("Rgb").field(rgb).finish(),
      Self::Indexed(alphas) => f.debug_tuple("Indexed").field(&&alphas[..4]).finish(),
    }
  }
}

/// Turns one stored pixel into one RGBA8 pixel, per the negotiated stages.
pub(crate) struct PixelConverter {
  header: IHDR,
  transforms: Transforms,
  palette: [[u8; 3]; 256],
  palette_alpha: [u8; 256],
  gray_key: Option<u16>,
  rgb_key: Option<[u16; 3]>,
}
impl PixelConverter {
  pub(crate) fn new(
    header: IHDR, transforms: Transforms, palette: Option<&Palette>,
    transparency: Option<&Transparency>,
  ) -> Self {
    // sample values below 16 bits only ever compare against the low bits of
    // the transparency key.
    let key_mask: u16 = if header.bit_depth == 16 { u16::MAX } else { (1 << header.bit_depth) - 1 };
    let mut out = Self {
      header,
      transforms,
      palette: palette.map_or([[0; 3]; 256], |p| p.entries),
      palette_alpha: [u8::MAX; 256],
      gray_key: None,
      rgb_key: None,
    };
    if transforms.trns_to_alpha {
      match transparency {
        Some(Transparency::Gray(y)) => out.gray_key = Some(y & key_mask),
        Some(Transparency::Rgb([r, g, b])) => {
          out.rgb_key = Some([r & key_mask, g & key_mask, b & key_mask])
        }
        Some(Transparency::Indexed(alphas)) => out.palette_alpha = *alphas,
        None => (),
      }
    }
    out
  }

  #[inline]
  fn sample(&self, data: &[u8], channel: usize) -> u16 {
    if self.header.bit_depth == 16 {
      u16::from_be_bytes([data[channel * 2], data[channel * 2 + 1]])
    } else {
      u16::from(data[channel])
    }
  }

  /// Reduces a sample of the stored bit depth to 8 bits.
  #[inline]
  fn to_8(&self, sample: u16) -> u8 {
    match self.header.bit_depth {
      // truncation, not rounding
      16 if self.transforms.strip_16 => (sample >> 8) as u8,
      1 | 2 | 4 if self.transforms.expand_gray_to_8 => {
        u8_replicate_bits(u32::from(self.header.bit_depth), sample as u8)
      }
      _ => sample as u8,
    }
  }

  /// `data` is one pixel as passed out of the unfilter step.
  pub(crate) fn convert(&self, data: &[u8]) -> [u8; 4] {
    const OPAQUE: u8 = u8::MAX;
    match self.header.color_type {
      PngColorType::Y => {
        let y = self.sample(data, 0);
        let a = if self.gray_key == Some(y) { 0 } else { OPAQUE };
        let y = self.to_8(y);
        [y, y, y, a]
      }
      PngColorType::YA => {
        let y = self.to_8(self.sample(data, 0));
        let a = self.to_8(self.sample(data, 1));
        [y, y, y, a]
      }
      PngColorType::RGB => {
        let rgb = [self.sample(data, 0), self.sample(data, 1), self.sample(data, 2)];
        let a = if self.rgb_key == Some(rgb) { 0 } else { OPAQUE };
        let [r, g, b] = rgb.map(|s| self.to_8(s));
        [r, g, b, a]
      }
      PngColorType::RGBA => {
        let [r, g, b, a] = [0, 1, 2, 3].map(|c| self.to_8(self.sample(data, c)));
        [r, g, b, a]
      }
      PngColorType::Index => {
        let i = usize::from(data[0]);
        let [r, g, b] = self.palette[i];
        [r, g, b, self.palette_alpha[i]]
      }
    }
  }
}

#[test]
fn test_every_legal_format_negotiates_to_rgba8() {
  use PngColorType::*;
  for color_type in [Y, RGB, Index, YA, RGBA] {
    for &bit_depth in color_type.allowed_bit_depths() {
      for has_transparency in [false, true] {
        let header = IHDR { width: 1, height: 1, bit_depth, color_type, is_interlaced: false };
        let transforms = Transforms::negotiate(&header, has_transparency);
        let format = transforms.output_format(&header);
        assert!(format.is_rgba8(), "{header:?} with tRNS {has_transparency} gave {format:?}");
      }
    }
  }
}

#[test]
fn test_negotiate_flags() {
  let header =
    IHDR { width: 1, height: 1, bit_depth: 2, color_type: PngColorType::Y, is_interlaced: false };
  let t = Transforms::negotiate(&header, true);
  assert!(t.expand_gray_to_8 && t.trns_to_alpha && t.gray_to_rgb && t.add_opaque_alpha);
  assert!(!t.palette_to_rgb && !t.unpack && !t.strip_16);

  let header = IHDR { bit_depth: 16, color_type: PngColorType::RGBA, ..header };
  let t = Transforms::negotiate(&header, false);
  assert_eq!(t, Transforms { strip_16: true, ..Transforms::default() });
}

#[test]
fn test_converter_gray_and_key() {
  let header =
    IHDR { width: 1, height: 1, bit_depth: 2, color_type: PngColorType::Y, is_interlaced: false };
  let trns = Transparency::Gray(1);
  let c = PixelConverter::new(header, Transforms::negotiate(&header, true), None, Some(&trns));
  assert_eq!(c.convert(&[0]), [0, 0, 0, 255]);
  assert_eq!(c.convert(&[1]), [0x55, 0x55, 0x55, 0]);
  assert_eq!(c.convert(&[3]), [255, 255, 255, 255]);

  // the key is compared before the 16-bit samples lose their low byte
  let header = IHDR { bit_depth: 16, color_type: PngColorType::RGB, ..header };
  let trns = Transparency::Rgb([0x1234, 0, 0xFFFF]);
  let c = PixelConverter::new(header, Transforms::negotiate(&header, true), None, Some(&trns));
  assert_eq!(c.convert(&[0x12, 0x34, 0, 0, 0xFF, 0xFF]), [0x12, 0, 0xFF, 0]);
  assert_eq!(c.convert(&[0x12, 0x35, 0, 0, 0xFF, 0xFF]), [0x12, 0, 0xFF, 255]);
}

#[test]
fn test_converter_palette() {
  let header =
    IHDR { width: 1, height: 1, bit_depth: 4, color_type: PngColorType::Index, is_interlaced: false };
  let palette = Palette::new(&[[10, 20, 30], [40, 50, 60]]);
  let mut alphas = [u8::MAX; 256];
  alphas[0] = 7;
  let trns = Transparency::Indexed(alphas);
  let c = PixelConverter::new(
    header,
    Transforms::negotiate(&header, true),
    Some(&palette),
    Some(&trns),
  );
  assert_eq!(c.convert(&[0]), [10, 20, 30, 7]);
  assert_eq!(c.convert(&[1]), [40, 50, 60, 255]);
  // out of range indexes are opaque black
  assert_eq!(c.convert(&[9]), [0, 0, 0, 255]);
}
