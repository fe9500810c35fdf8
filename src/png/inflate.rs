use super::*;

use miniz_oxide::inflate::{
  core::{
    decompress,
    inflate_flags::{
      TINFL_FLAG_HAS_MORE_INPUT, TINFL_FLAG_PARSE_ZLIB_HEADER,
      TINFL_FLAG_USING_NON_WRAPPING_OUTPUT_BUF,
    },
    DecompressorOxide,
  },
  TINFLStatus,
};

/// The scratch buffer starts this big and doubles from there.
const FIRST_STEP: usize = 64 * 1024;

/// Zlib decompression of the image data, fed one `IDAT` chunk at a time.
///
/// All `IDAT` chunks of an image form a single zlib stream. The output goes
/// into one buffer that never needs to wrap around. The buffer only grows as
/// data is actually produced, up to the size of the complete filtered image,
/// so a header claiming a huge image costs nothing until the image data
/// shows up.
pub(crate) struct IdatInflater {
  decompressor: DecompressorOxide,
  out: Vec<u8>,
  out_pos: usize,
  target_len: usize,
  stream_ended: bool,
}
impl IdatInflater {
  /// An inflater that expects exactly `target_len` bytes of output.
  pub(crate) fn new(target_len: usize) -> Result<Self, DecodeError> {
    let mut this = Self {
      decompressor: DecompressorOxide::new(),
      out: Vec::new(),
      out_pos: 0,
      target_len,
      stream_ended: false,
    };
    this.grow()?;
    Ok(this)
  }

  fn grow(&mut self) -> Result<(), DecodeError> {
    let old_len = self.out.len();
    let new_len = self.target_len.min(old_len.saturating_mul(2).max(FIRST_STEP));
    self.out.try_reserve_exact(new_len - old_len).map_err(|_| DecodeError::ParserInitFailed)?;
    self.out.resize(new_len, 0);
    trace!("IDAT: scratch buffer grown to {new_len} bytes");
    Ok(())
  }

  /// Decompresses the next `IDAT` chunk's data.
  pub(crate) fn feed(&mut self, mut input: &[u8]) -> Result<(), DecodeError> {
    if self.stream_ended {
      if !input.is_empty() {
        warn!("IDAT: {} bytes of data after the end of the zlib stream", input.len());
      }
      return Ok(());
    }
    // We can't know if another IDAT follows until we've read the next chunk
    // header, so there's always "more input" as far as the inflater knows.
    let flags = TINFL_FLAG_PARSE_ZLIB_HEADER
      | TINFL_FLAG_USING_NON_WRAPPING_OUTPUT_BUF
      | TINFL_FLAG_HAS_MORE_INPUT;
    loop {
      if self.out_pos == self.out.len() && self.out.len() < self.target_len {
        self.grow()?;
      }
      let (status, input_read, bytes_written) =
        decompress(&mut self.decompressor, input, &mut self.out, self.out_pos, flags);
      self.out_pos += bytes_written;
      input = &input[input_read..];
      match status {
        TINFLStatus::NeedsMoreInput => return Ok(()),
        TINFLStatus::Done => {
          self.stream_ended = true;
          if !input.is_empty() {
            warn!("IDAT: extra compressed data");
          }
          return Ok(());
        }
        TINFLStatus::HasMoreOutput if self.out.len() < self.target_len => continue,
        TINFLStatus::HasMoreOutput => {
          warn!("IDAT: too much image data, the excess is ignored");
          self.stream_ended = true;
          return Ok(());
        }
        TINFLStatus::Adler32Mismatch => return Err(StreamFault::IdatChecksumMismatch.into()),
        TINFLStatus::FailedCannotMakeProgress | TINFLStatus::BadParam | TINFLStatus::Failed => {
          return Err(StreamFault::IdatDecompressionFailed.into())
        }
      }
    }
  }

  /// Checks that the full image's worth of bytes was produced, and gives
  /// them back.
  pub(crate) fn finish(self) -> Result<Vec<u8>, StreamFault> {
    if self.out_pos < self.target_len {
      return Err(StreamFault::NotEnoughImageData);
    }
    if !self.stream_ended {
      warn!("IDAT: the zlib stream is missing its end");
    }
    Ok(self.out)
  }
}

#[test]
fn test_inflater_grows_with_output() {
  let data: Vec<u8> = (0..200_000_u32).map(|i| (i % 251) as u8).collect();
  let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&data, 6);

  let mut inflater = IdatInflater::new(data.len()).unwrap();
  assert_eq!(inflater.out.len(), FIRST_STEP);
  for piece in compressed.chunks(1000) {
    inflater.feed(piece).unwrap();
  }
  assert_eq!(inflater.finish().unwrap(), data);

  // a huge claimed size only costs the first step until data arrives
  let mut inflater = IdatInflater::new(usize::MAX / 2).unwrap();
  inflater.feed(&compressed[..10]).unwrap();
  assert_eq!(inflater.out.len(), FIRST_STEP);
  assert_eq!(inflater.finish().unwrap_err(), StreamFault::NotEnoughImageData);
}
