#![forbid(unsafe_code)]

//! Module for decoding PNG data into RGBA8 pixels.
//!
//! * [Portable Network Graphics Specification (Second Edition)][png-spec]
//!
//! [png-spec]: https://www.w3.org/TR/2003/REC-PNG-20031110/
//!
//! ## Decoding
//!
//! Call [`decode_png_rgba8`] with a [`ByteCursor`](crate::ByteCursor) over the
//! PNG bytes (or any other [`ByteSource`]). Whatever the stored pixel format
//! is, you get back a [`PixelBuffer`] of 8-bit RGBA pixels with straight
//! alpha, top row first.
//!
//! Use a [`PngDecoder`] if you want something other than the default
//! [`DecodeLimits`].
//!
//! The decoder reads the stream chunk by chunk, pulling from the source only
//! as much as it needs. On success the source is left just past the `IEND`
//! chunk, so anything after the PNG is still there for the caller.
//!
//! ## Normalization
//!
//! The stored pixels pass through a fixed series of [`Transforms`], decided
//! once the header and any palette or transparency chunks have been read:
//!
//! 1) Indexed color is looked up in the palette.
//! 2) Greyscale under 8 bits is scaled up by bit replication, other packed
//!    pixels are unpacked to a byte each.
//! 3) A `tRNS` chunk becomes an alpha channel.
//! 4) 16-bit samples keep their high byte. This is truncation, not rounding.
//! 5) Greyscale becomes RGB.
//! 6) Pixels still without alpha get an opaque alpha of 255.
//!
//! ## Parsing Errors
//!
//! Quoting [section 13.2 of the PNG
//! spec](https://www.w3.org/TR/2003/REC-PNG-20031110/#13Decoders.Errors):
//!
//! > Errors that have little or no effect on the processing of the image may be
//! > ignored, while those that affect critical data shall be dealt with in a
//! > manner appropriate to the application.
//!
//! Anything wrong with critical data is a [`DecodeError`]. Problems with
//! ancillary data (a bad CRC on a `tEXt` chunk, a `tRNS` of the wrong length,
//! a `PLTE` in a greyscale image) are logged with [`log::warn!`] and the
//! offending chunk is ignored.

use core::fmt::{Debug, Write};

use alloc::vec::Vec;
use bitfrob::u8_replicate_bits;
use log::{debug, trace, warn};

use crate::{
  cursor::ByteSource,
  error::{DecodeError, StreamFault},
  pixel_buffer::PixelBuffer,
};

mod adam7;
pub(crate) use adam7::*;

mod chunk;
pub use chunk::ChunkType;
pub(crate) use chunk::{ChunkReader, RawChunk};

mod crc32;
pub use crc32::chunk_crc;

mod ihdr;
pub use ihdr::*;

mod inflate;
pub(crate) use inflate::*;

mod transform;
pub(crate) use transform::{Palette, PixelConverter, Transparency};
pub use transform::{OutputFormat, Transforms};

mod unfilter;
pub(crate) use unfilter::*;

/// The first eight bytes of a PNG datastream should match these bytes.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// The largest value a PNG 4-byte unsigned integer field can hold.
pub(crate) const PNG_UINT_31_MAX: u32 = 0x7FFF_FFFF;

/// Checks if the PNG's initial 8 bytes are correct.
#[inline]
#[must_use]
pub fn is_png_header_correct(png: &[u8]) -> bool {
  png.len() >= 8 && png[..8] == PNG_SIGNATURE
}

/// Resource limits for a decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecodeLimits {
  /// Images wider than this are rejected.
  pub max_width: u32,
  /// Images taller than this are rejected.
  pub max_height: u32,
  /// Ancillary chunks with more data than this are skipped unread.
  pub max_ancillary_chunk_len: u32,
}
impl Default for DecodeLimits {
  #[inline]
  fn default() -> Self {
    Self { max_width: 1_000_000, max_height: 1_000_000, max_ancillary_chunk_len: 8_000_000 }
  }
}

/// Decodes PNG data to RGBA8 with configurable [`DecodeLimits`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PngDecoder {
  /// The limits used by every decode.
  pub limits: DecodeLimits,
}
impl PngDecoder {
  /// A decoder with the default limits.
  #[inline]
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// A decoder with the limits given.
  #[inline]
  #[must_use]
  pub const fn with_limits(limits: DecodeLimits) -> Self {
    Self { limits }
  }

  /// Decodes one complete PNG datastream from `source`.
  ///
  /// On success the source has been advanced to just past the end of the
  /// `IEND` chunk. On failure the source position is wherever reading stopped.
  ///
  /// ## Failure
  /// * [`DecodeError::InvalidSignature`]: The first 8 bytes aren't
  ///   [`PNG_SIGNATURE`]. If fewer than 8 bytes were available then nothing
  ///   was consumed.
  /// * [`DecodeError::ParserInitFailed`]: The scratch buffer for the
  ///   decompressed image data couldn't be allocated or grown.
  /// * [`DecodeError::MalformedStream`]: Anything fatal after that. The
  ///   [`StreamFault`] says what.
  pub fn decode<S: ByteSource>(&self, mut source: S) -> Result<PixelBuffer, DecodeError> {
    let mut signature = [0_u8; 8];
    source.read_exact(&mut signature).map_err(|_| DecodeError::InvalidSignature)?;
    if signature != PNG_SIGNATURE {
      return Err(DecodeError::InvalidSignature);
    }

    let mut chunks = ChunkReader::new(source, self.limits.max_ancillary_chunk_len);
    let header = {
      let first = chunks.next_chunk()?;
      if first.type_ != ChunkType::IHDR {
        return Err(StreamFault::FirstChunkNotIhdr.into());
      }
      IHDR::try_from(first.data)?
    };
    debug!("{header:?}");
    if header.width > self.limits.max_width || header.height > self.limits.max_height {
      return Err(StreamFault::DimensionsTooLarge.into());
    }

    let mut palette: Option<Palette> = None;
    let mut transparency: Option<Transparency> = None;
    let (transforms, mut inflater) = loop {
      let chunk = chunks.next_chunk()?;
      match chunk.type_ {
        ChunkType::IDAT => {
          if header.color_type == PngColorType::Index && palette.is_none() {
            return Err(StreamFault::MissingPalette.into());
          }
          let transforms = Transforms::negotiate(&header, transparency.is_some());
          let format = transforms.output_format(&header);
          debug!("{transforms:?} gives {format:?}");
          if !format.is_rgba8() {
            return Err(StreamFault::UnsupportedOutputFormat.into());
          }

          let filtered_len = header.filtered_data_len().ok_or(StreamFault::CheckedMath)?;
          let mut inflater = IdatInflater::new(filtered_len)?;
          inflater.feed(chunk.data)?;
          break (transforms, inflater);
        }
        ChunkType::IHDR => return Err(StreamFault::DuplicateIhdr.into()),
        ChunkType::PLTE => read_palette(&header, chunk, &mut palette)?,
        ChunkType::tRNS => read_transparency(&header, chunk, palette.as_ref(), &mut transparency),
        ChunkType::IEND => return Err(StreamFault::MissingImageData.into()),
        other if other.is_critical() => {
          return Err(StreamFault::UnknownCriticalChunk(other).into())
        }
        other => trace!("{other:?}: ancillary chunk ignored"),
      }
    };

    // All IDAT chunks must be consecutive, the first other chunk ends the
    // image data.
    let after_idat = loop {
      let chunk = chunks.next_chunk()?;
      if chunk.type_ == ChunkType::IDAT {
        inflater.feed(chunk.data)?;
      } else {
        break (chunk.type_, chunk.data.is_empty());
      }
    };
    let mut filtered = inflater.finish()?;
    // the output is only allocated once the image data has all arrived
    let mut pixels = PixelBuffer::try_new_zeroed(header.width, header.height)?;

    let converter =
      PixelConverter::new(header, transforms, palette.as_ref(), transparency.as_ref());
    let out = pixels.pixels_mut();
    let width = header.width as usize;
    unfilter_decompressed_data(&header, &mut filtered, |x, y, data| {
      if let Some(p) = out.get_mut(y as usize * width + x as usize) {
        *p = converter.convert(data);
      }
    })?;
    drop(filtered);

    read_to_end(&mut chunks, after_idat)?;
    debug!("decoded {}x{} RGBA8", pixels.width(), pixels.height());
    Ok(pixels)
  }
}

/// Decodes a PNG from `source` into RGBA8 using the default [`DecodeLimits`].
///
/// This is `PngDecoder::default().decode(source)`, see
/// [`PngDecoder::decode`].
#[inline]
pub fn decode_png_rgba8<S: ByteSource>(source: S) -> Result<PixelBuffer, DecodeError> {
  PngDecoder::default().decode(source)
}

fn read_palette(
  header: &IHDR, chunk: RawChunk<'_>, palette: &mut Option<Palette>,
) -> Result<(), DecodeError> {
  if palette.is_some() {
    return Err(StreamFault::DuplicatePalette.into());
  }
  let is_indexed = header.color_type == PngColorType::Index;
  if header.color_type.is_grayscale() {
    warn!("PLTE: ignored in a greyscale image");
    return Ok(());
  }
  let colors: &[[u8; 3]] = match bytemuck::try_cast_slice::<u8, [u8; 3]>(chunk.data) {
    Ok(colors) if !colors.is_empty() && colors.len() <= 256 => colors,
    _ if is_indexed => return Err(StreamFault::PaletteIllegalData.into()),
    _ => {
      warn!("PLTE: invalid length {}, ignored", chunk.data.len());
      return Ok(());
    }
  };
  let max_entries = if is_indexed { 1_usize << header.bit_depth } else { 256 };
  if colors.len() > max_entries {
    warn!("PLTE: {} entries is too many for the bit depth, extra entries ignored", colors.len());
  }
  *palette = Some(Palette::new(&colors[..colors.len().min(max_entries)]));
  Ok(())
}

fn read_transparency(
  header: &IHDR, chunk: RawChunk<'_>, palette: Option<&Palette>,
  transparency: &mut Option<Transparency>,
) {
  if transparency.is_some() {
    warn!("tRNS: duplicate chunk ignored");
    return;
  }
  let data = chunk.data;
  *transparency = match header.color_type {
    PngColorType::YA | PngColorType::RGBA => {
      warn!("tRNS: ignored since the image already has alpha");
      None
    }
    PngColorType::Y => match *data {
      [y0, y1] => Some(Transparency::Gray(u16::from_be_bytes([y0, y1]))),
      _ => {
        warn!("tRNS: invalid length {} for a greyscale image, ignored", data.len());
        None
      }
    },
    PngColorType::RGB => match *data {
      [r0, r1, g0, g1, b0, b1] => Some(Transparency::Rgb([
        u16::from_be_bytes([r0, r1]),
        u16::from_be_bytes([g0, g1]),
        u16::from_be_bytes([b0, b1]),
      ])),
      _ => {
        warn!("tRNS: invalid length {} for an RGB image, ignored", data.len());
        None
      }
    },
    PngColorType::Index => match palette {
      None => {
        warn!("tRNS: found before PLTE, ignored");
        None
      }
      Some(p) if data.is_empty() || data.len() > p.len => {
        warn!("tRNS: {} alpha values for {} palette entries, ignored", data.len(), p.len);
        None
      }
      Some(_) => {
        let mut alphas = [u8::MAX; 256];
        alphas[..data.len()].copy_from_slice(data);
        Some(Transparency::Indexed(alphas))
      }
    },
  };
}

/// Reads the chunks after the image data, through `IEND`.
///
/// `first` is the type of the chunk that ended the image data, and if its
/// data was empty.
fn read_to_end<S: ByteSource>(
  chunks: &mut ChunkReader<S>, first: (ChunkType, bool),
) -> Result<(), DecodeError> {
  let (mut type_, mut is_empty) = first;
  loop {
    match type_ {
      ChunkType::IEND => {
        if !is_empty {
          warn!("IEND: chunk has data, ignored");
        }
        return Ok(());
      }
      ChunkType::IDAT => return Err(StreamFault::TooManyIdat.into()),
      ChunkType::IHDR => return Err(StreamFault::DuplicateIhdr.into()),
      ChunkType::PLTE => warn!("PLTE: found after the image data, ignored"),
      ChunkType::tRNS => warn!("tRNS: found after the image data, ignored"),
      other if other.is_critical() => {
        return Err(StreamFault::UnknownCriticalChunk(other).into())
      }
      other => trace!("{other:?}: ancillary chunk ignored"),
    }
    let chunk = chunks.next_chunk()?;
    type_ = chunk.type_;
    is_empty = chunk.data.is_empty();
  }
}

#[test]
fn test_is_png_header_correct() {
  assert!(is_png_header_correct(&PNG_SIGNATURE));
  assert!(is_png_header_correct(&[137, 80, 78, 71, 13, 10, 26, 10, 0, 0]));
  assert!(!is_png_header_correct(&PNG_SIGNATURE[..7]));
  assert!(!is_png_header_correct(b"GIF89a\0\0"));
}

#[test]
fn test_default_limits() {
  let limits = DecodeLimits::default();
  assert_eq!(limits.max_width, 1_000_000);
  assert_eq!(limits.max_height, 1_000_000);
  assert_eq!(limits.max_ancillary_chunk_len, 8_000_000);
  assert_eq!(PngDecoder::new().limits, limits);
}
