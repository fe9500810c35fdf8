use pngtex::{
  png::{ChunkType, DecodeLimits, PngDecoder},
  *,
};
use proptest::prelude::*;
use walkdir::WalkDir;

use super::{init_logging, rand_bytes, unfiltered_rows, zlib, PngBuilder};

fn decode(png: &[u8]) -> Result<PixelBuffer, DecodeError> {
  init_logging();
  decode_png_rgba8(&mut ByteCursor::new(png))
}

fn fault(png: &[u8]) -> StreamFault {
  match decode(png) {
    Err(DecodeError::MalformedStream(fault)) => fault,
    other => panic!("expected a malformed stream, got {other:?}"),
  }
}

fn rgba_2x2() -> Vec<u8> {
  PngBuilder::new()
    .ihdr(2, 2, 8, 6, 0)
    .idat(&unfiltered_rows(&[&[255, 0, 0, 255, 0, 255, 0, 128], &[0, 0, 255, 0, 255, 255, 255, 255]]))
    .iend()
    .build()
}

#[test]
fn test_rgba8_decode() {
  let png = rgba_2x2();
  let mut cursor = ByteCursor::new(&png);
  let pixels = decode_png_rgba8(&mut cursor).unwrap();
  assert_eq!(pixels.width(), 2);
  assert_eq!(pixels.height(), 2);
  assert_eq!(
    pixels.pixels(),
    &[[255, 0, 0, 255], [0, 255, 0, 128], [0, 0, 255, 0], [255, 255, 255, 255]]
  );
  assert_eq!(pixels.row(1).unwrap(), &[[0, 0, 255, 0], [255, 255, 255, 255]]);
  assert_eq!(cursor.position(), png.len());
  assert!(cursor.is_empty());
}

#[test]
fn test_cursor_stops_after_iend() {
  let mut png = rgba_2x2();
  let png_len = png.len();
  png.extend_from_slice(b"TRAILER");
  let mut cursor = ByteCursor::new(&png);
  decode_png_rgba8(&mut cursor).unwrap();
  assert_eq!(cursor.position(), png_len);
  assert_eq!(cursor.remaining(), b"TRAILER");

  // two images back to back in one buffer
  let mut two = rgba_2x2();
  two.extend(rgba_2x2());
  let mut cursor = ByteCursor::new(&two);
  let a = decode_png_rgba8(&mut cursor).unwrap();
  let b = decode_png_rgba8(&mut cursor).unwrap();
  assert_eq!(a, b);
  assert!(cursor.is_empty());
}

#[test]
fn test_invalid_signature() {
  init_logging();
  let mut png = rgba_2x2();
  png[1] = b'X';
  let mut cursor = ByteCursor::new(&png);
  assert_eq!(decode_png_rgba8(&mut cursor), Err(DecodeError::InvalidSignature));
  assert_eq!(cursor.position(), 8);

  let mut cursor = ByteCursor::new(&[137, 80, 78, 71, 13]);
  assert_eq!(decode_png_rgba8(&mut cursor), Err(DecodeError::InvalidSignature));
  assert_eq!(cursor.position(), 0);

  assert_eq!(decode(&[]), Err(DecodeError::InvalidSignature));
}

#[test]
fn test_truncated_stream() {
  let png = rgba_2x2();
  for len in 8..png.len() {
    match decode(&png[..len]) {
      Err(DecodeError::MalformedStream(_)) => (),
      other => panic!("{len} bytes: {other:?}"),
    }
  }
  assert_eq!(fault(&png[..png.len() - 1]), StreamFault::UnexpectedEndOfInput);
}

#[test]
fn test_greyscale_every_bit_depth() {
  // every case stores the levels 0, 1/3, 2/3, and full
  let expected: Vec<[u8; 4]> = [0x00, 0x55, 0xAA, 0xFF].iter().map(|&y| [y, y, y, 255]).collect();
  let cases: [(u8, &[u8]); 5] = [
    (1, &[0b0110_0000]),
    (2, &[0b00_01_10_11]),
    (4, &[0x05, 0xAF]),
    (8, &[0x00, 0x55, 0xAA, 0xFF]),
    (16, &[0x00, 0x00, 0x55, 0xFF, 0xAA, 0x00, 0xFF, 0xFF]),
  ];
  for (bit_depth, row) in cases {
    let png = PngBuilder::new().ihdr(4, 1, bit_depth, 0, 0).idat(&unfiltered_rows(&[row])).iend().build();
    let pixels = decode(&png).unwrap();
    if bit_depth == 1 {
      // 1-bit only has black and white
      assert_eq!(pixels.pixels(), &[[0, 0, 0, 255], [255, 255, 255, 255], [255, 255, 255, 255], [0, 0, 0, 255]]);
    } else {
      assert_eq!(pixels.pixels(), &expected[..], "bit depth {bit_depth}");
    }
  }
}

#[test]
fn test_greyscale_alpha() {
  let png =
    PngBuilder::new().ihdr(2, 1, 8, 4, 0).idat(&unfiltered_rows(&[&[10, 20, 30, 40]])).iend().build();
  assert_eq!(decode(&png).unwrap().pixels(), &[[10, 10, 10, 20], [30, 30, 30, 40]]);
}

#[test]
fn test_greyscale_transparency_key() {
  let png = PngBuilder::new()
    .ihdr(3, 1, 8, 0, 0)
    .chunk(b"tRNS", &[0x00, 0x55])
    .idat(&unfiltered_rows(&[&[0x00, 0x55, 0xFF]]))
    .iend()
    .build();
  assert_eq!(decode(&png).unwrap().pixels(), &[[0, 0, 0, 255], [0x55, 0x55, 0x55, 0], [255, 255, 255, 255]]);

  // a key with the wrong length is ignored
  let png = PngBuilder::new()
    .ihdr(1, 1, 8, 0, 0)
    .chunk(b"tRNS", &[0x55])
    .idat(&unfiltered_rows(&[&[0x55]]))
    .iend()
    .build();
  assert_eq!(decode(&png).unwrap().pixels(), &[[0x55, 0x55, 0x55, 255]]);
}

#[test]
fn test_rgb_transparency_key_16_bit() {
  // the key matches the full 16-bit sample, not just the high byte
  let png = PngBuilder::new()
    .ihdr(2, 1, 16, 2, 0)
    .chunk(b"tRNS", &[0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC])
    .idat(&unfiltered_rows(&[&[
      0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, //
      0x12, 0x00, 0x56, 0x78, 0x9A, 0xBC,
    ]]))
    .iend()
    .build();
  assert_eq!(decode(&png).unwrap().pixels(), &[[0x12, 0x56, 0x9A, 0], [0x12, 0x56, 0x9A, 255]]);
}

#[test]
fn test_16_bit_truncates() {
  let png = PngBuilder::new()
    .ihdr(1, 1, 16, 2, 0)
    .idat(&unfiltered_rows(&[&[0x12, 0xFF, 0x34, 0x80, 0x56, 0x01]]))
    .iend()
    .build();
  assert_eq!(decode(&png).unwrap().pixels(), &[[0x12, 0x34, 0x56, 255]]);

  let png = PngBuilder::new()
    .ihdr(1, 1, 16, 6, 0)
    .idat(&unfiltered_rows(&[&[0x12, 0xFF, 0x34, 0x80, 0x56, 0x01, 0x7F, 0xFF]]))
    .iend()
    .build();
  assert_eq!(decode(&png).unwrap().pixels(), &[[0x12, 0x34, 0x56, 0x7F]]);
}

#[test]
fn test_palette_with_transparency() {
  let png = PngBuilder::new()
    .ihdr(4, 1, 2, 3, 0)
    .chunk(b"PLTE", &[10, 20, 30, 40, 50, 60, 70, 80, 90])
    .chunk(b"tRNS", &[0, 128])
    .idat(&unfiltered_rows(&[&[0b00_01_10_11]]))
    .iend()
    .build();
  assert_eq!(
    decode(&png).unwrap().pixels(),
    &[[10, 20, 30, 0], [40, 50, 60, 128], [70, 80, 90, 255], [0, 0, 0, 255]]
  );
}

#[test]
fn test_palette_rules() {
  let pixels = unfiltered_rows(&[&[0]]);

  let png = PngBuilder::new().ihdr(1, 1, 8, 3, 0).idat(&pixels).iend().build();
  assert_eq!(fault(&png), StreamFault::MissingPalette);

  let png = PngBuilder::new().ihdr(1, 1, 8, 3, 0).chunk(b"PLTE", &[1, 2]).idat(&pixels).iend().build();
  assert_eq!(fault(&png), StreamFault::PaletteIllegalData);

  let png = PngBuilder::new()
    .ihdr(1, 1, 8, 3, 0)
    .chunk(b"PLTE", &[1, 2, 3])
    .chunk(b"PLTE", &[1, 2, 3])
    .idat(&pixels)
    .iend()
    .build();
  assert_eq!(fault(&png), StreamFault::DuplicatePalette);

  // tRNS before PLTE is ignored
  let png = PngBuilder::new()
    .ihdr(1, 1, 8, 3, 0)
    .chunk(b"tRNS", &[0])
    .chunk(b"PLTE", &[1, 2, 3])
    .idat(&pixels)
    .iend()
    .build();
  assert_eq!(decode(&png).unwrap().pixels(), &[[1, 2, 3, 255]]);

  // a palette in a greyscale image is ignored, even a broken one
  let png = PngBuilder::new().ihdr(1, 1, 8, 0, 0).chunk(b"PLTE", &[1]).idat(&pixels).iend().build();
  assert_eq!(decode(&png).unwrap().pixels(), &[[0, 0, 0, 255]]);

  // a suggested palette in an RGB image doesn't change anything
  let png = PngBuilder::new()
    .ihdr(1, 1, 8, 2, 0)
    .chunk(b"PLTE", &[9, 9, 9])
    .idat(&unfiltered_rows(&[&[1, 2, 3]]))
    .iend()
    .build();
  assert_eq!(decode(&png).unwrap().pixels(), &[[1, 2, 3, 255]]);
}

#[test]
fn test_transparency_ignored_with_alpha_channel() {
  let png = PngBuilder::new()
    .ihdr(1, 1, 8, 6, 0)
    .chunk(b"tRNS", &[0, 1, 0, 2, 0, 3])
    .idat(&unfiltered_rows(&[&[1, 2, 3, 4]]))
    .iend()
    .build();
  assert_eq!(decode(&png).unwrap().pixels(), &[[1, 2, 3, 4]]);
}

/// Filters raw scanlines with one filter type, the way an encoder would.
fn filter_rows(raw_rows: &[Vec<u8>], bpp: usize, filter: u8) -> Vec<u8> {
  fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = i16::from(a) + i16::from(b) - i16::from(c);
    let (pa, pb, pc) = ((p - i16::from(a)).abs(), (p - i16::from(b)).abs(), (p - i16::from(c)).abs());
    if pa <= pb && pa <= pc {
      a
    } else if pb <= pc {
      b
    } else {
      c
    }
  }
  let mut out = Vec::new();
  let zero = vec![0_u8; raw_rows[0].len()];
  for (y, row) in raw_rows.iter().enumerate() {
    let prev = if y == 0 { &zero } else { &raw_rows[y - 1] };
    out.push(filter);
    for i in 0..row.len() {
      let a = if i >= bpp { row[i - bpp] } else { 0 };
      let b = prev[i];
      let c = if i >= bpp { prev[i - bpp] } else { 0 };
      let predicted = match filter {
        0 => 0,
        1 => a,
        2 => b,
        3 => ((u16::from(a) + u16::from(b)) / 2) as u8,
        4 => paeth(a, b, c),
        _ => unreachable!(),
      };
      out.push(row[i].wrapping_sub(predicted));
    }
  }
  out
}

#[test]
fn test_every_filter_type() {
  let raw_rows: Vec<Vec<u8>> = (0..3_u8)
    .map(|y| (0..9_u8).map(|i| y.wrapping_mul(97).wrapping_add(i.wrapping_mul(31)) ^ 0x5A).collect())
    .collect();
  let expected: Vec<[u8; 4]> =
    raw_rows.iter().flat_map(|row| row.chunks(3).map(|p| [p[0], p[1], p[2], 255]).collect::<Vec<_>>()).collect();
  for filter in 0..=4 {
    let png = PngBuilder::new().ihdr(3, 3, 8, 2, 0).idat(&filter_rows(&raw_rows, 3, filter)).iend().build();
    assert_eq!(decode(&png).unwrap().pixels(), &expected[..], "filter {filter}");
  }

  let mut filtered = filter_rows(&raw_rows, 3, 0);
  filtered[10] = 5;
  let png = PngBuilder::new().ihdr(3, 3, 8, 2, 0).idat(&filtered).iend().build();
  assert_eq!(fault(&png), StreamFault::IllegalFilterType(5));
}

#[test]
fn test_interlaced_matches_progressive() {
  const ADAM7: [(usize, usize, usize, usize); 7] =
    [(0, 0, 8, 8), (4, 0, 8, 8), (0, 4, 4, 8), (2, 0, 4, 4), (0, 2, 2, 4), (1, 0, 2, 2), (0, 1, 1, 2)];
  let (width, height) = (11_usize, 7_usize);
  let grey: Vec<u8> = (0..width * height).map(|i| (i * 3) as u8).collect();

  let rows: Vec<&[u8]> = grey.chunks(width).collect();
  let progressive = PngBuilder::new().ihdr(width as u32, height as u32, 8, 0, 0).idat(&unfiltered_rows(&rows)).iend().build();

  let mut interlaced_data = Vec::new();
  for (x0, y0, dx, dy) in ADAM7 {
    for y in (y0..height).step_by(dy) {
      let row: Vec<u8> = (x0..width).step_by(dx).map(|x| grey[y * width + x]).collect();
      if row.is_empty() {
        continue;
      }
      interlaced_data.push(0);
      interlaced_data.extend(row);
    }
  }
  let interlaced = PngBuilder::new().ihdr(width as u32, height as u32, 8, 0, 1).idat(&interlaced_data).iend().build();

  let expected = decode(&progressive).unwrap();
  assert_eq!(decode(&interlaced).unwrap(), expected);
  let y = grey[2 * width + 4];
  assert_eq!(expected.pixel(4, 2), Some([y, y, y, 255]));
}

#[test]
fn test_chunk_crc_handling() {
  let filtered = unfiltered_rows(&[&[1, 2, 3]]);

  let png = PngBuilder::new()
    .ihdr(1, 1, 8, 2, 0)
    .chunk_with_crc(b"IDAT", &zlib(&filtered), 0xDEAD_BEEF)
    .iend()
    .build();
  assert_eq!(fault(&png), StreamFault::CrcMismatch(ChunkType::IDAT));

  // ancillary chunks with a bad CRC are dropped, even a tRNS
  let png = PngBuilder::new()
    .ihdr(1, 1, 8, 2, 0)
    .chunk_with_crc(b"tRNS", &[0, 1, 0, 2, 0, 3], 0)
    .chunk_with_crc(b"tEXt", b"Comment\0hello", 1)
    .idat(&filtered)
    .iend()
    .build();
  assert_eq!(decode(&png).unwrap().pixels(), &[[1, 2, 3, 255]]);
}

#[test]
fn test_chunk_ordering_rules() {
  let filtered = unfiltered_rows(&[&[1, 2, 3]]);

  let png = PngBuilder::new().chunk(b"tEXt", b"a\0b").ihdr(1, 1, 8, 2, 0).idat(&filtered).iend().build();
  assert_eq!(fault(&png), StreamFault::FirstChunkNotIhdr);

  let png = PngBuilder::new().ihdr(1, 1, 8, 2, 0).ihdr(1, 1, 8, 2, 0).idat(&filtered).iend().build();
  assert_eq!(fault(&png), StreamFault::DuplicateIhdr);

  let png = PngBuilder::new().ihdr(1, 1, 8, 2, 0).iend().build();
  assert_eq!(fault(&png), StreamFault::MissingImageData);

  let png = PngBuilder::new().ihdr(1, 1, 8, 2, 0).chunk(b"ABCD", &[]).idat(&filtered).iend().build();
  assert_eq!(fault(&png), StreamFault::UnknownCriticalChunk(ChunkType(*b"ABCD")));

  let png = PngBuilder::new().ihdr(1, 1, 8, 2, 0).chunk(b"abCD", &[7; 20]).idat(&filtered).iend().build();
  assert_eq!(decode(&png).unwrap().pixels(), &[[1, 2, 3, 255]]);

  let png = PngBuilder::new()
    .ihdr(1, 1, 8, 2, 0)
    .idat(&filtered)
    .chunk(b"tIME", &[7, 234, 1, 1, 0, 0, 0])
    .chunk(b"IDAT", &[])
    .iend()
    .build();
  assert_eq!(fault(&png), StreamFault::TooManyIdat);

  // no IEND at all
  let png = PngBuilder::new().ihdr(1, 1, 8, 2, 0).idat(&filtered).build();
  assert_eq!(fault(&png), StreamFault::UnexpectedEndOfInput);
}

#[test]
fn test_chunk_framing_rules() {
  let filtered = unfiltered_rows(&[&[1, 2, 3]]);

  // lengths are limited to 2^31 - 1, checked before any data is read
  let png = PngBuilder::new().ihdr(1, 1, 8, 2, 0).raw(&[0x80, 0, 0, 0]).raw(b"tEXt").build();
  assert_eq!(fault(&png), StreamFault::ChunkTooLong);
  let png = PngBuilder::new().raw(&[0xFF, 0xFF, 0xFF, 0xFF]).raw(b"IHDR").build();
  assert_eq!(fault(&png), StreamFault::ChunkTooLong);

  let png = PngBuilder::new().ihdr(1, 1, 8, 2, 0).chunk(b"ID T", &filtered).iend().build();
  assert_eq!(fault(&png), StreamFault::InvalidChunkType(ChunkType(*b"ID T")));
  let png = PngBuilder::new().ihdr(1, 1, 8, 2, 0).idat(&filtered).chunk(b"tEX\0", &[]).iend().build();
  assert_eq!(fault(&png), StreamFault::InvalidChunkType(ChunkType(*b"tEX\0")));
}

#[test]
fn test_header_rules() {
  let filtered = unfiltered_rows(&[&[0]]);
  let png = PngBuilder::new().ihdr(0, 1, 8, 0, 0).idat(&filtered).iend().build();
  assert_eq!(fault(&png), StreamFault::WidthOrHeightZero);

  let png = PngBuilder::new().ihdr(1, 1, 16, 3, 0).idat(&filtered).iend().build();
  assert_eq!(fault(&png), StreamFault::IllegalColorTypeBitDepthCombination);

  let png = PngBuilder::new().ihdr(1, 1, 8, 0, 2).idat(&filtered).iend().build();
  assert_eq!(fault(&png), StreamFault::IhdrIllegalData);

  let png = PngBuilder::new().chunk(b"IHDR", &[0, 0, 0, 1, 0, 0, 0, 1, 8, 0, 0, 0]).idat(&filtered).iend().build();
  assert_eq!(fault(&png), StreamFault::IhdrIllegalData);

  let png = PngBuilder::new().ihdr(1_000_001, 1, 8, 0, 0).idat(&filtered).iend().build();
  assert_eq!(fault(&png), StreamFault::DimensionsTooLarge);
}

#[test]
fn test_image_data_amounts() {
  init_logging();
  // image data split over many single byte IDAT chunks
  let filtered = unfiltered_rows(&[&[1, 2, 3], &[4, 5, 6]]);
  let mut builder = PngBuilder::new().ihdr(1, 2, 8, 2, 0);
  for byte in zlib(&filtered) {
    builder = builder.chunk(b"IDAT", &[byte]);
  }
  assert_eq!(decode(&builder.iend().build()).unwrap().pixels(), &[[1, 2, 3, 255], [4, 5, 6, 255]]);

  let png = PngBuilder::new().ihdr(1, 2, 8, 2, 0).idat(&filtered[..4]).iend().build();
  assert_eq!(fault(&png), StreamFault::NotEnoughImageData);

  // a header claiming 20000x20000 RGBA16 (3.2 GB of scanlines) with almost
  // no data behind it fails without committing memory for the full image
  let png = PngBuilder::new().ihdr(20_000, 20_000, 16, 6, 0).idat(&[0; 64]).iend().build();
  assert_eq!(fault(&png), StreamFault::NotEnoughImageData);

  // extra data is ignored
  let mut too_much = filtered.clone();
  too_much.extend_from_slice(&[0, 9, 9, 9]);
  let png = PngBuilder::new().ihdr(1, 2, 8, 2, 0).idat(&too_much).iend().build();
  assert_eq!(decode(&png).unwrap().pixels(), &[[1, 2, 3, 255], [4, 5, 6, 255]]);

  let mut compressed = zlib(&filtered);
  let last = compressed.len() - 1;
  compressed[last] ^= 0xFF;
  let png = PngBuilder::new().ihdr(1, 2, 8, 2, 0).chunk(b"IDAT", &compressed).iend().build();
  assert_eq!(fault(&png), StreamFault::IdatChecksumMismatch);

  let png = PngBuilder::new().ihdr(1, 2, 8, 2, 0).chunk(b"IDAT", &[0x78, 0x9C, 0xFF, 0xFF]).iend().build();
  assert_eq!(fault(&png), StreamFault::IdatDecompressionFailed);
}

#[test]
fn test_decode_limits() {
  init_logging();
  let png = PngBuilder::new()
    .ihdr(3, 1, 8, 0, 0)
    .chunk(b"tEXt", b"Comment\0a long enough comment")
    .idat(&unfiltered_rows(&[&[1, 2, 3]]))
    .iend()
    .build();

  let narrow = PngDecoder::with_limits(DecodeLimits { max_width: 2, ..DecodeLimits::default() });
  assert_eq!(
    narrow.decode(&mut ByteCursor::new(&png)),
    Err(DecodeError::MalformedStream(StreamFault::DimensionsTooLarge))
  );

  // oversized ancillary chunks are skipped, CRC and all
  let small_chunks = PngDecoder::with_limits(DecodeLimits { max_ancillary_chunk_len: 4, ..DecodeLimits::default() });
  let mut cursor = ByteCursor::new(&png);
  assert_eq!(small_chunks.decode(&mut cursor).unwrap().pixels(), &[[1, 1, 1, 255], [2, 2, 2, 255], [3, 3, 3, 255]]);
  assert!(cursor.is_empty());
}

#[test]
fn test_decode_no_panics() {
  init_logging();
  // every file in the test folder, even non-png files shouldn't panic it.
  for entry in WalkDir::new("tests/").into_iter().filter_map(|e| e.ok()) {
    println!("{}", entry.path().display());
    let v = match std::fs::read(entry.path()) {
      Ok(v) => v,
      Err(e) => {
        println!("Error reading file: {e:?}");
        continue;
      }
    };
    let _ = decode_png_rgba8(&mut ByteCursor::new(&v));
  }
  // even totally random data should never panic the decoder!
  for _ in 0..10 {
    let v = rand_bytes(1024);
    let _ = decode_png_rgba8(&mut ByteCursor::new(&v));
  }
  // random data after a valid signature and header gets a bit further
  for _ in 0..10 {
    let mut v = PngBuilder::new().ihdr(4, 4, 8, 6, 0).build();
    v.extend(rand_bytes(256));
    assert!(decode_png_rgba8(&mut ByteCursor::new(&v)).is_err());
  }
}

#[test]
fn test_fixture_files() {
  init_logging();
  let rgb = std::fs::read("tests/png/fixtures/rgb_3x2.png").unwrap();
  let pixels = decode_png_rgba8(&mut ByteCursor::new(&rgb)).unwrap();
  assert_eq!(
    pixels.pixels(),
    &[[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255], [0, 0, 0, 255], [128, 128, 128, 255], [255, 255, 255, 255]]
  );

  let interlaced = std::fs::read("tests/png/fixtures/gray4_adam7_5x5.png").unwrap();
  let pixels = decode_png_rgba8(&mut ByteCursor::new(&interlaced)).unwrap();
  for (i, p) in pixels.pixels().iter().enumerate() {
    let y = ((i % 16) as u8) * 0x11;
    assert_eq!(*p, [y, y, y, 255], "pixel {i}");
  }
}

proptest! {
  #[test]
  fn prop_greyscale_8_is_opaque_grey(width in 1_u32..8, height in 1_u32..8, seed in any::<u64>()) {
    let grey: Vec<u8> =
      (0..width * height).map(|i| (seed.rotate_left(i) as u8) ^ (i as u8)).collect();
    let rows: Vec<&[u8]> = grey.chunks(width as usize).collect();
    let png = PngBuilder::new().ihdr(width, height, 8, 0, 0).idat(&unfiltered_rows(&rows)).iend().build();
    let pixels = decode_png_rgba8(&mut ByteCursor::new(&png)).unwrap();
    prop_assert_eq!(pixels.as_bytes().len(), (width * height * 4) as usize);
    for (p, y) in pixels.pixels().iter().zip(grey.iter().copied()) {
      prop_assert_eq!(*p, [y, y, y, 255]);
    }
  }

  #[test]
  fn prop_palette_lookup(
    palette in proptest::collection::vec(any::<[u8; 3]>(), 1..=256),
    alphas in proptest::collection::vec(any::<u8>(), 0..=256),
    indexes in proptest::collection::vec(any::<u8>(), 1..32),
  ) {
    let alphas = &alphas[..alphas.len().min(palette.len())];
    let plte: Vec<u8> = palette.iter().flatten().copied().collect();
    let mut builder = PngBuilder::new().ihdr(indexes.len() as u32, 1, 8, 3, 0).chunk(b"PLTE", &plte);
    if !alphas.is_empty() {
      builder = builder.chunk(b"tRNS", alphas);
    }
    let png = builder.idat(&unfiltered_rows(&[&indexes[..]])).iend().build();
    let pixels = decode_png_rgba8(&mut ByteCursor::new(&png)).unwrap();
    for (p, &i) in pixels.pixels().iter().zip(indexes.iter()) {
      let i = usize::from(i);
      let [r, g, b] = palette.get(i).copied().unwrap_or([0, 0, 0]);
      let a = alphas.get(i).copied().unwrap_or(255);
      prop_assert_eq!(*p, [r, g, b, a]);
    }
  }
}
