use super::*;

#[inline]
#[must_use]
const fn paeth_predict(a: u8, b: u8, c: u8) -> u8 {
  let a_ = a as i32;
  let b_ = b as i32;
  let c_ = c as i32;
  let p: i32 = a_ + b_ - c_;
  let pa = (p - a_).abs();
  let pb = (p - b_).abs();
  let pc = (p - c_).abs();
  // the order of these tests decides ties and must not change
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// Reverses the filter on one scanline, in place.
///
/// * `unit` is the filter unit of the pixel format (see [`IHDR::filter_unit`]).
/// * `prev` is the already unfiltered previous line of the same pass, or
///   `None` on the first line, where the previous line is an implied zero.
pub(crate) fn unfilter_line(
  filter: u8, unit: usize, prev: Option<&[u8]>, line: &mut [u8],
) -> Result<(), StreamFault> {
  let up = |i: usize| prev.map_or(0, |p| p[i]);
  match filter {
    0 => (),
    1 => {
      // Sub
      for i in unit..line.len() {
        line[i] = line[i].wrapping_add(line[i - unit]);
      }
    }
    2 => {
      // Up
      if let Some(prev) = prev {
        line.iter_mut().zip(prev.iter().copied()).for_each(|(p, b)| *p = p.wrapping_add(b));
      }
    }
    3 => {
      // Average
      for i in 0..line.len() {
        let a = if i >= unit { line[i - unit] } else { 0 };
        let b = up(i);
        line[i] = line[i].wrapping_add(((u16::from(a) + u16::from(b)) / 2) as u8);
      }
    }
    4 => {
      // Paeth
      for i in 0..line.len() {
        let (a, c) = if i >= unit { (line[i - unit], up(i - unit)) } else { (0, 0) };
        let b = up(i);
        line[i] = line[i].wrapping_add(paeth_predict(a, b, c));
      }
    }
    other => return Err(StreamFault::IllegalFilterType(other)),
  }
  Ok(())
}

/// Unfilters the decompressed data of every pass and hands each pixel to `op`.
///
/// Each call to the `op` gets `|x, y, data|`, where `x` and `y` are the
/// pixel's position in the full image (from the top left) and `data` is the
/// pixel's stored bytes. Pixels packed at less than 8 bits are unpacked first
/// and passed as a single byte holding the value in its low bits.
///
/// The data is unfiltered in place and each filter byte is reset to 0.
///
/// ## Failure
/// * If `decompressed` is shorter than the header says it must be.
/// * If a scanline uses an unknown filter type.
pub(crate) fn unfilter_decompressed_data<F>(
  header: &IHDR, mut decompressed: &mut [u8], mut op: F,
) -> Result<(), StreamFault>
where
  F: FnMut(u32, u32, &[u8]),
{
  let unit = header.filter_unit();
  let bit_depth = usize::from(header.bit_depth);

  for pass in image_passes(header) {
    if pass.is_empty() {
      continue;
    }
    let filterline = header.bytes_per_scanline(pass.width).ok_or(StreamFault::CheckedMath)? + 1;
    let pass_len = filterline.checked_mul(pass.height as usize).ok_or(StreamFault::CheckedMath)?;
    if decompressed.len() < pass_len {
      return Err(StreamFault::NotEnoughImageData);
    }
    let (these_bytes, more_bytes) = core::mem::take(&mut decompressed).split_at_mut(pass_len);
    decompressed = more_bytes;

    let mut prev: Option<&[u8]> = None;
    for (reduced_y, fline) in (0_u32..).zip(these_bytes.chunks_exact_mut(filterline)) {
      let (f, line) = fline.split_at_mut(1);
      unfilter_line(f[0], unit, prev, line)?;
      f[0] = 0;

      if bit_depth < 8 {
        let mask = (1_u8 << bit_depth) - 1;
        for reduced_x in 0..pass.width {
          let bit = reduced_x as usize * bit_depth;
          let down_shift = 8 - bit_depth - (bit % 8);
          let value = (line[bit / 8] >> down_shift) & mask;
          let (x, y) = pass.full_pos(reduced_x, reduced_y);
          op(x, y, &[value]);
        }
      } else {
        for (reduced_x, pixel) in (0..pass.width).zip(line.chunks_exact(unit)) {
          let (x, y) = pass.full_pos(reduced_x, reduced_y);
          op(x, y, pixel);
        }
      }
      prev = Some(line);
    }
  }

  Ok(())
}

#[test]
fn test_paeth_predict() {
  assert_eq!(paeth_predict(0, 0, 0), 0);
  // p = 10 + 20 - 5 = 25: pa = 15, pb = 5, pc = 20
  assert_eq!(paeth_predict(10, 20, 5), 20);
  // ties go to `a` first, then `b`
  assert_eq!(paeth_predict(7, 7, 7), 7);
  // p = 2: pa = 1, pb = 1, pc = 0
  assert_eq!(paeth_predict(1, 3, 2), 2);
}

#[test]
fn test_unfilter_line_each_filter() {
  let prev = [10_u8, 20, 30, 40];

  let mut line = [1_u8, 2, 3, 4];
  unfilter_line(1, 2, Some(&prev[..]), &mut line).unwrap();
  assert_eq!(line, [1, 2, 4, 6]);

  let mut line = [1_u8, 2, 3, 4];
  unfilter_line(2, 2, Some(&prev[..]), &mut line).unwrap();
  assert_eq!(line, [11, 22, 33, 44]);

  let mut line = [1_u8, 2, 3, 4];
  unfilter_line(2, 2, None, &mut line).unwrap();
  assert_eq!(line, [1, 2, 3, 4]);

  // Average: x + floor((a + b) / 2)
  let mut line = [1_u8, 2, 3, 4];
  unfilter_line(3, 2, Some(&prev[..]), &mut line).unwrap();
  assert_eq!(line, [1 + 5, 2 + 10, 3 + (6 + 30) / 2, 4 + (12 + 40) / 2]);

  let mut line = [255_u8, 255];
  unfilter_line(3, 1, Some(&[255_u8, 255][..]), &mut line).unwrap();
  // 255 + 127 wraps, then 255 + ((126 + 255) / 2) wraps
  assert_eq!(line, [126, 189]);

  let mut line = [1_u8, 2, 3, 4];
  unfilter_line(4, 2, None, &mut line).unwrap();
  // with no previous line Paeth acts like Sub
  assert_eq!(line, [1, 2, 4, 6]);

  let mut line = [0_u8; 4];
  assert_eq!(unfilter_line(5, 1, None, &mut line), Err(StreamFault::IllegalFilterType(5)));
}
