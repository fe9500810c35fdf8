use super::*;

/// The four ASCII letters naming a chunk's type.
///
/// Bit 5 of each letter (lowercase vs uppercase) carries a property. The one
/// that matters to a decoder is the first letter: uppercase means the chunk is
/// "critical" and can't be ignored, lowercase means "ancillary".
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ChunkType(pub [u8; 4]);
#[allow(nonstandard_style)]
impl ChunkType {
  /// Image header
  pub const IHDR: Self = Self(*b"IHDR");
  /// Palette
  pub const PLTE: Self = Self(*b"PLTE");
  /// Image data
  pub const IDAT: Self = Self(*b"IDAT");
  /// Image trailer
  pub const IEND: Self = Self(*b"IEND");
  /// Transparency
  pub const tRNS: Self = Self(*b"tRNS");

  /// If the chunk must be understood to decode the image.
  #[inline]
  #[must_use]
  pub const fn is_critical(self) -> bool {
    (self.0[0] & 0x20) == 0
  }

  /// If all four bytes are ASCII letters.
  #[inline]
  #[must_use]
  pub const fn is_well_formed(self) -> bool {
    let [a, b, c, d] = self.0;
    a.is_ascii_alphabetic()
      && b.is_ascii_alphabetic()
      && c.is_ascii_alphabetic()
      && d.is_ascii_alphabetic()
  }
}
impl Debug for ChunkType {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    for b in self.0 {
      f.write_char(if b.is_ascii_graphic() { b as char } else { '?' })?;
    }
    Ok(())
  }
}

/// A chunk whose CRC has already been checked.
#[derive(Clone, Copy)]
pub(crate) struct RawChunk<'c> {
  pub(crate) type_: ChunkType,
  pub(crate) data: &'c [u8],
}
impl Debug for RawChunk<'_> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("RawChunk")
      .field("type_", &self.type_)
      .field("data", &(&self.data[..self.data.len().min(12)], self.data.len()))
      .finish()
  }
}

/// Chunk data is read (and the buffer grown) this much at a time.
const READ_STEP: usize = 64 * 1024;

/// Pulls one chunk at a time out of a [`ByteSource`].
///
/// The chunk data is copied into a single buffer that's reused for every
/// chunk, so only one chunk's data is ever held at once.
pub(crate) struct ChunkReader<S> {
  source: S,
  buf: Vec<u8>,
  max_ancillary_len: u32,
}
impl<S: ByteSource> ChunkReader<S> {
  #[inline]
  pub(crate) fn new(source: S, max_ancillary_len: u32) -> Self {
    Self { source, buf: Vec::new(), max_ancillary_len }
  }

  /// Reads the next chunk that's worth looking at.
  ///
  /// * Critical chunks with a bad CRC are an error.
  /// * Ancillary chunks with a bad CRC, or that are over the size limit, are
  ///   logged and passed over.
  pub(crate) fn next_chunk(&mut self) -> Result<RawChunk<'_>, DecodeError> {
    loop {
      let mut head = [0_u8; 8];
      self.source.read_exact(&mut head)?;
      let [l0, l1, l2, l3, t0, t1, t2, t3] = head;
      let length = u32::from_be_bytes([l0, l1, l2, l3]);
      let type_ = ChunkType([t0, t1, t2, t3]);
      if length > PNG_UINT_31_MAX {
        return Err(StreamFault::ChunkTooLong.into());
      }
      if !type_.is_well_formed() {
        return Err(StreamFault::InvalidChunkType(type_).into());
      }
      trace!("chunk {type_:?}, {length} bytes");

      if !type_.is_critical() && length > self.max_ancillary_len {
        warn!("{type_:?}: {length} bytes is over the ancillary chunk limit, skipped");
        // data plus the CRC
        self.source.skip(length as usize + 4)?;
        continue;
      }

      // The buffer grows as the data actually arrives, a bogus length on a
      // short stream only costs one step.
      self.buf.clear();
      let mut remaining = length as usize;
      while remaining > 0 {
        let step = remaining.min(READ_STEP);
        let start = self.buf.len();
        self.buf.try_reserve(step).map_err(|_| DecodeError::MalformedStream(StreamFault::OutOfMemory))?;
        self.buf.resize(start + step, 0);
        self.source.read_exact(&mut self.buf[start..])?;
        remaining -= step;
      }
      let mut crc_bytes = [0_u8; 4];
      self.source.read_exact(&mut crc_bytes)?;
      let declared_crc = u32::from_be_bytes(crc_bytes);
      let actual_crc = chunk_crc(type_.0, &self.buf);

      if declared_crc != actual_crc {
        if type_.is_critical() {
          return Err(StreamFault::CrcMismatch(type_).into());
        }
        warn!("{type_:?}: CRC error, chunk discarded");
        continue;
      }
      return Ok(RawChunk { type_, data: &self.buf });
    }
  }
}

#[test]
fn test_chunk_type_properties() {
  assert!(ChunkType::IHDR.is_critical());
  assert!(ChunkType::IDAT.is_critical());
  assert!(!ChunkType::tRNS.is_critical());
  assert!(!ChunkType(*b"gAMA").is_critical());
  assert!(ChunkType(*b"zzZz").is_well_formed());
  assert!(!ChunkType(*b"ID T").is_well_formed());
  assert!(!ChunkType([0, 1, 2, 3]).is_well_formed());
}
