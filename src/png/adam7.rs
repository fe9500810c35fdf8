use super::*;

// ```
// 1 6 4 6 2 6 4 6
// 7 7 7 7 7 7 7 7
// 5 6 5 6 5 6 5 6
// 7 7 7 7 7 7 7 7
// 3 6 4 6 3 6 4 6
// 7 7 7 7 7 7 7 7
// 5 6 5 6 5 6 5 6
// 7 7 7 7 7 7 7 7
// ```
/// `(x_start, y_start, x_step, y_step)` of the seven Adam7 passes.
const ADAM7: [(u32, u32, u32, u32); 7] = [
  (0, 0, 8, 8),
  (4, 0, 8, 8),
  (0, 4, 4, 8),
  (2, 0, 4, 4),
  (0, 2, 2, 4),
  (1, 0, 2, 2),
  (0, 1, 1, 2),
];

/// One reduced image of the stored data.
///
/// A non-interlaced image is a single "pass" that covers every pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ImagePass {
  pub(crate) x_start: u32,
  pub(crate) y_start: u32,
  pub(crate) x_step: u32,
  pub(crate) y_step: u32,
  pub(crate) width: u32,
  pub(crate) height: u32,
}
impl ImagePass {
  /// Even when the full image isn't 0 pixels, the width or height of a
  /// particular reduced image can be.
  #[inline]
  #[must_use]
  pub(crate) const fn is_empty(&self) -> bool {
    self.width == 0 || self.height == 0
  }

  /// Converts a reduced image location into the full image location.
  #[inline]
  #[must_use]
  pub(crate) const fn full_pos(&self, reduced_x: u32, reduced_y: u32) -> (u32, u32) {
    (self.x_start + reduced_x * self.x_step, self.y_start + reduced_y * self.y_step)
  }
}

#[inline]
#[must_use]
const fn reduced_len(full: u32, start: u32, step: u32) -> u32 {
  if full > start {
    (full - start + step - 1) / step
  } else {
    0
  }
}

/// The passes that make up the stored image data, in storage order.
pub(crate) fn image_passes(header: &IHDR) -> impl Iterator<Item = ImagePass> {
  let (w, h) = (header.width, header.height);
  let full = ImagePass { x_start: 0, y_start: 0, x_step: 1, y_step: 1, width: w, height: h };
  let interlaced = header.is_interlaced;
  core::iter::once(full).filter(move |_| !interlaced).chain(
    ADAM7
      .into_iter()
      .filter(move |_| interlaced)
      .map(move |(x_start, y_start, x_step, y_step)| ImagePass {
        x_start,
        y_start,
        x_step,
        y_step,
        width: reduced_len(w, x_start, x_step),
        height: reduced_len(h, y_start, y_step),
      }),
  )
}

#[cfg(test)]
fn pass_sizes(width: u32, height: u32) -> [(u32, u32); 7] {
  let header = IHDR { width, height, bit_depth: 8, color_type: PngColorType::Y, is_interlaced: true };
  let mut out = [(0, 0); 7];
  for (o, pass) in out.iter_mut().zip(image_passes(&header)) {
    *o = (pass.width, pass.height);
  }
  out
}

#[test]
fn test_pass_dimensions() {
  for (pass, w_expected) in [
    [1, 1, 1, 1, 1, 1, 1, 1],
    [0, 0, 0, 0, 1, 1, 1, 1],
    [1, 1, 1, 1, 2, 2, 2, 2],
    [0, 0, 1, 1, 1, 1, 2, 2],
    [1, 1, 2, 2, 3, 3, 4, 4],
    [0, 1, 1, 2, 2, 3, 3, 4],
    [1, 2, 3, 4, 5, 6, 7, 8],
  ]
  .into_iter()
  .enumerate()
  {
    for (w, ex) in (1..=8).zip(w_expected) {
      assert_eq!(pass_sizes(w, 1)[pass].0, ex, "pass {pass}, w: {w}");
    }
  }
  for (pass, h_expected) in [
    [1, 1, 1, 1, 1, 1, 1, 1],
    [1, 1, 1, 1, 1, 1, 1, 1],
    [0, 0, 0, 0, 1, 1, 1, 1],
    [1, 1, 1, 1, 2, 2, 2, 2],
    [0, 0, 1, 1, 1, 1, 2, 2],
    [1, 1, 2, 2, 3, 3, 4, 4],
    [0, 1, 1, 2, 2, 3, 3, 4],
  ]
  .into_iter()
  .enumerate()
  {
    for (h, ex) in (1..=8).zip(h_expected) {
      assert_eq!(pass_sizes(1, h)[pass].1, ex, "pass {pass}, h: {h}");
    }
  }
  assert_eq!(pass_sizes(8, 8), [(1, 1), (1, 1), (2, 1), (2, 2), (4, 2), (4, 4), (8, 4)]);
}

#[test]
fn test_passes_cover_every_pixel_once() {
  let header = IHDR { width: 11, height: 7, bit_depth: 8, color_type: PngColorType::Y, is_interlaced: true };
  let mut hits = [[0_u8; 11]; 7];
  for pass in image_passes(&header) {
    for ry in 0..pass.height {
      for rx in 0..pass.width {
        let (x, y) = pass.full_pos(rx, ry);
        hits[y as usize][x as usize] += 1;
      }
    }
  }
  assert!(hits.iter().flatten().all(|&h| h == 1));
  let flat = IHDR { is_interlaced: false, ..header };
  let passes: [Option<ImagePass>; 2] = {
    let mut it = image_passes(&flat);
    [it.next(), it.next()]
  };
  assert_eq!(passes[0].map(|p| (p.width, p.height)), Some((11, 7)));
  assert_eq!(passes[1], None);
}
