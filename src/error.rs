//! Error types for decoding and uploading.

use alloc::collections::TryReserveError;

use crate::{cursor::UnexpectedEnd, png::ChunkType};

/// An error from decoding PNG data.
///
/// Every variant is terminal for the call that produced it. No partially
/// decoded pixels are ever handed back alongside an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
  /// The first 8 bytes aren't the PNG signature (or there weren't 8 bytes).
  #[error("the data does not start with the PNG signature")]
  InvalidSignature,

  /// The decoder couldn't allocate its internal working state.
  #[error("could not allocate the decoder's working state")]
  ParserInitFailed,

  /// Something fatal was found while reading the data stream.
  #[error("malformed PNG stream: {0}")]
  MalformedStream(StreamFault),
}
impl From<StreamFault> for DecodeError {
  #[inline]
  fn from(fault: StreamFault) -> Self {
    Self::MalformedStream(fault)
  }
}
impl From<UnexpectedEnd> for DecodeError {
  #[inline]
  fn from(_: UnexpectedEnd) -> Self {
    Self::MalformedStream(StreamFault::UnexpectedEndOfInput)
  }
}

/// The specific reason a PNG stream was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum StreamFault {
  /// The source ran out of bytes partway through a chunk.
  #[error("unexpected end of input")]
  UnexpectedEndOfInput,
  /// A chunk declared a length of more than `2^31 - 1`.
  #[error("chunk length exceeds 2^31-1")]
  ChunkTooLong,
  /// A chunk type with bytes that aren't ASCII letters.
  #[error("invalid chunk type {0:?}")]
  InvalidChunkType(ChunkType),
  /// A critical chunk's CRC didn't match its contents.
  #[error("CRC mismatch in critical chunk {0:?}")]
  CrcMismatch(ChunkType),
  /// A critical chunk that this decoder doesn't know about.
  #[error("unknown critical chunk {0:?}")]
  UnknownCriticalChunk(ChunkType),
  /// The first chunk wasn't `IHDR`.
  #[error("first chunk is not IHDR")]
  FirstChunkNotIhdr,
  /// An `IHDR` chunk that appeared after the first one.
  #[error("duplicate IHDR chunk")]
  DuplicateIhdr,
  /// The `IHDR` data had the wrong length or an illegal field value.
  #[error("IHDR chunk is invalid")]
  IhdrIllegalData,
  /// The declared width or height was 0.
  #[error("image width or height is 0")]
  WidthOrHeightZero,
  /// The declared dimensions exceed the decoder's limits.
  #[error("image dimensions exceed the configured limits")]
  DimensionsTooLarge,
  /// The color type and bit depth can't be combined.
  #[error("illegal color type and bit depth combination")]
  IllegalColorTypeBitDepthCombination,
  /// The palette chunk was malformed for an indexed image.
  #[error("PLTE chunk is invalid")]
  PaletteIllegalData,
  /// More than one `PLTE` chunk.
  #[error("duplicate PLTE chunk")]
  DuplicatePalette,
  /// An indexed image reached its image data without a palette.
  #[error("indexed image has no PLTE before IDAT")]
  MissingPalette,
  /// `IEND` came before any image data.
  #[error("no IDAT chunk before IEND")]
  MissingImageData,
  /// Image data chunks that aren't contiguous.
  #[error("IDAT chunk after the image data ended")]
  TooManyIdat,
  /// The zlib stream is corrupt.
  #[error("zlib decompression failed")]
  IdatDecompressionFailed,
  /// The zlib stream's Adler-32 checksum didn't match.
  #[error("zlib Adler-32 checksum mismatch")]
  IdatChecksumMismatch,
  /// The zlib stream ended before every scanline was present.
  #[error("not enough image data")]
  NotEnoughImageData,
  /// A scanline used a filter type other than 0 through 4.
  #[error("illegal filter type {0}")]
  IllegalFilterType(u8),
  /// Transform negotiation didn't land on 8-bit RGBA.
  #[error("could not negotiate an RGBA8 output format")]
  UnsupportedOutputFormat,
  /// A size computation overflowed.
  #[error("image size computation overflowed")]
  CheckedMath,
  /// The allocator couldn't provide the output buffer.
  #[error("out of memory while decoding")]
  OutOfMemory,
}

/// An error reported by a [`TextureBackend`](crate::texture::TextureBackend).
///
/// The code uses the same numbering as `glGetError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("backend error code {code:#06X}")]
pub struct BackendError {
  /// Backend specific error code, non-zero.
  pub code: u32,
}
impl BackendError {
  /// `GL_INVALID_ENUM`
  pub const INVALID_ENUM: Self = Self { code: 0x0500 };
  /// `GL_INVALID_VALUE`
  pub const INVALID_VALUE: Self = Self { code: 0x0501 };
  /// `GL_INVALID_OPERATION`
  pub const INVALID_OPERATION: Self = Self { code: 0x0502 };
  /// `GL_OUT_OF_MEMORY`
  pub const OUT_OF_MEMORY: Self = Self { code: 0x0505 };
}
impl From<TryReserveError> for BackendError {
  #[inline]
  fn from(_: TryReserveError) -> Self {
    Self::OUT_OF_MEMORY
  }
}

/// An error from uploading pixels to a texture backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
  /// The backend flagged an error. Any texture object that was created for
  /// the upload has already been destroyed.
  #[error("the texture backend rejected the upload: {0}")]
  BackendRejected(BackendError),
}

/// An error from [`load_texture_png_rgba8`](crate::load_texture_png_rgba8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
  /// Decoding failed, nothing was uploaded.
  #[error(transparent)]
  Decode(#[from] DecodeError),
  /// Decoding worked but the upload failed.
  #[error(transparent)]
  Upload(#[from] UploadError),
}
