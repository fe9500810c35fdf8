//! CRC-32 as used by PNG chunks (ISO 3309, polynomial `0xEDB8_8320`).

const CRC_TABLE: [u32; 256] = make_crc_table();

const fn make_crc_table() -> [u32; 256] {
  let mut out = [0; 256];
  let mut n = 0;
  while n < 256 {
    let mut c = n as u32;
    let mut k = 0;
    while k < 8 {
      c = if (c & 1) != 0 { 0xEDB8_8320_u32 ^ (c >> 1) } else { c >> 1 };
      k += 1;
    }
    out[n] = c;
    n += 1;
  }
  out
}

/// A running chunk CRC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Crc32(u32);
impl Crc32 {
  #[inline]
  pub(crate) const fn new() -> Self {
    Self(u32::MAX)
  }
  #[inline]
  pub(crate) fn update(&mut self, bytes: &[u8]) {
    for &byte in bytes {
      let i = (self.0 ^ u32::from(byte)) as u8 as usize;
      self.0 = CRC_TABLE[i] ^ (self.0 >> 8);
    }
  }
  #[inline]
  #[must_use]
  pub(crate) const fn finish(self) -> u32 {
    self.0 ^ u32::MAX
  }
}

/// Computes the CRC that a chunk with this type and data should declare.
///
/// The CRC covers the chunk type and data, but not the length.
#[inline]
#[must_use]
pub fn chunk_crc(chunk_type: [u8; 4], data: &[u8]) -> u32 {
  let mut crc = Crc32::new();
  crc.update(&chunk_type);
  crc.update(data);
  crc.finish()
}

#[test]
fn test_chunk_crc_known_values() {
  // every PNG ends with the same 12 bytes: `0000_0000 IEND AE42_6082`
  assert_eq!(chunk_crc(*b"IEND", &[]), 0xAE42_6082);
  // the standard CRC-32 check value
  let mut crc = Crc32::new();
  crc.update(b"123456789");
  assert_eq!(crc.finish(), 0xCBF4_3926);
}
