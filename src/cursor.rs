//! Pull-style byte input for the decoder.
//!
//! The decoder never needs the PNG data as one pre-split slice. It asks a
//! [`ByteSource`] for "the next N bytes" as it walks the chunk stream, and the
//! source moves its own read position forward. [`ByteCursor`] is the source
//! you'll usually want: a read position within a borrowed byte slice. After a
//! decode the cursor sits just past the last byte the decoder used, so any
//! data following the image in the same buffer can be read next.

/// The source didn't have as many bytes as were requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, thiserror::Error)]
#[error("unexpected end of input")]
pub struct UnexpectedEnd;

/// Something that can serve bytes front to back.
pub trait ByteSource {
  /// Fills `buf` completely with the next bytes of the source.
  ///
  /// This is all or nothing: on failure no bytes are consumed.
  fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), UnexpectedEnd>;

  /// Moves past `count` bytes without looking at them.
  ///
  /// The default impl reads into a small stack buffer, override this if the
  /// source can skip directly.
  fn skip(&mut self, mut count: usize) -> Result<(), UnexpectedEnd> {
    let mut scratch = [0_u8; 256];
    while count > 0 {
      let n = count.min(scratch.len());
      self.read_exact(&mut scratch[..n])?;
      count -= n;
    }
    Ok(())
  }
}
impl<S: ByteSource + ?Sized> ByteSource for &mut S {
  #[inline]
  fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), UnexpectedEnd> {
    (**self).read_exact(buf)
  }
  #[inline]
  fn skip(&mut self, count: usize) -> Result<(), UnexpectedEnd> {
    (**self).skip(count)
  }
}

/// A read position within a borrowed byte slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteCursor<'b> {
  bytes: &'b [u8],
  pos: usize,
}
impl<'b> ByteCursor<'b> {
  /// A cursor at the start of `bytes`.
  #[inline]
  #[must_use]
  pub const fn new(bytes: &'b [u8]) -> Self {
    Self { bytes, pos: 0 }
  }

  /// A cursor at `pos` within `bytes`, clamped to the end of the slice.
  #[inline]
  #[must_use]
  pub fn with_position(bytes: &'b [u8], pos: usize) -> Self {
    Self { bytes, pos: pos.min(bytes.len()) }
  }

  /// Offset of the next unread byte.
  #[inline]
  #[must_use]
  pub const fn position(&self) -> usize {
    self.pos
  }

  /// All the bytes not yet read.
  #[inline]
  #[must_use]
  pub fn remaining(&self) -> &'b [u8] {
    &self.bytes[self.pos..]
  }

  /// If every byte has been read.
  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.pos >= self.bytes.len()
  }

  /// The full underlying slice, including bytes already read.
  #[inline]
  #[must_use]
  pub const fn into_inner(self) -> &'b [u8] {
    self.bytes
  }
}
impl ByteSource for ByteCursor<'_> {
  #[inline]
  fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), UnexpectedEnd> {
    let src = self.remaining().get(..buf.len()).ok_or(UnexpectedEnd)?;
    buf.copy_from_slice(src);
    self.pos += buf.len();
    Ok(())
  }

  #[inline]
  fn skip(&mut self, count: usize) -> Result<(), UnexpectedEnd> {
    if self.remaining().len() >= count {
      self.pos += count;
      Ok(())
    } else {
      Err(UnexpectedEnd)
    }
  }
}

#[test]
fn test_cursor_reads_are_all_or_nothing() {
  let data = [1_u8, 2, 3, 4, 5];
  let mut c = ByteCursor::new(&data);
  let mut two = [0_u8; 2];
  c.read_exact(&mut two).unwrap();
  assert_eq!(two, [1, 2]);
  assert_eq!(c.position(), 2);
  let mut four = [0_u8; 4];
  assert_eq!(c.read_exact(&mut four), Err(UnexpectedEnd));
  assert_eq!(c.position(), 2);
  assert_eq!(c.skip(4), Err(UnexpectedEnd));
  c.skip(3).unwrap();
  assert!(c.is_empty());
  assert!(c.remaining().is_empty());
}

#[test]
fn test_default_skip_uses_read_exact() {
  struct Counter(usize);
  impl ByteSource for Counter {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), UnexpectedEnd> {
      if buf.len() > self.0 {
        return Err(UnexpectedEnd);
      }
      self.0 -= buf.len();
      Ok(())
    }
  }
  let mut c = Counter(1000);
  c.skip(700).unwrap();
  assert_eq!(c.0, 300);
  assert!(c.skip(301).is_err());
}
