//! Greedy variance minimizing box splits over an alpha x red x green x blue
//! histogram.
//!
//! Colour samples are bucketed by their top five bits and alpha by its top
//! four bits. Cumulative moments make the weight, channel sums and squared
//! sum of any box an O(1) inclusion-exclusion lookup. A raster with a single
//! alpha value collapses the alpha axis to one bucket.

const COLOR_SHIFT: u32 = 3;
const ALPHA_SHIFT: u32 = 4;

/// Axis order of the histogram.
const ALPHA: usize = 0;
const RED: usize = 1;
const GREEN: usize = 2;
const BLUE: usize = 3;

/// Bucket layout of the cumulative tables. Index 0 on every axis is the
/// empty prefix.
struct Grid {
    side: [usize; 4],
    stride: [usize; 4],
}

impl Grid {
    fn new(alpha_side: usize) -> Self {
        let color_side = (256 >> COLOR_SHIFT) + 1;
        let side = [alpha_side, color_side, color_side, color_side];
        let mut stride = [1; 4];
        for d in (0..3).rev() {
            stride[d] = stride[d + 1] * side[d + 1];
        }
        Self { side, stride }
    }

    fn cells(&self) -> usize {
        self.side[0] * self.stride[0]
    }

    fn index(&self, coord: [usize; 4]) -> usize {
        coord.iter().zip(self.stride).map(|(c, s)| c * s).sum()
    }
}

/// Half open on the low side: a box spans `(lo[d], hi[d]]` on every axis.
#[derive(Debug, Clone, Copy, Default)]
struct ColorBox {
    lo: [usize; 4],
    hi: [usize; 4],
    volume: usize,
}

impl ColorBox {
    fn update_volume(&mut self) {
        self.volume = (0..4).map(|d| self.hi[d] - self.lo[d]).product();
    }
}

/// Running totals of one box: weight, alpha, red, green, blue.
type Sums = [f64; 5];

/// Cumulative moments of the histogram.
struct Moments {
    grid: Grid,
    /// Weight followed by the alpha, red, green and blue sums.
    linear: [Vec<f64>; 5],
    squares: Vec<f64>,
}

impl Moments {
    fn from_pixels(pixels: &[u8]) -> Self {
        let translucent = pixels
            .get(3)
            .is_some_and(|&first| pixels.chunks_exact(4).any(|px| px[3] != first));
        let grid = Grid::new(if translucent {
            (256 >> ALPHA_SHIFT) + 1
        } else {
            2
        });

        let cells = grid.cells();
        let mut linear: [Vec<f64>; 5] = std::array::from_fn(|_| vec![0.0; cells]);
        let mut squares = vec![0.0; cells];
        for px in pixels.chunks_exact(4) {
            let alpha = if translucent {
                (px[3] >> ALPHA_SHIFT) as usize + 1
            } else {
                1
            };
            let i = grid.index([
                alpha,
                (px[0] >> COLOR_SHIFT) as usize + 1,
                (px[1] >> COLOR_SHIFT) as usize + 1,
                (px[2] >> COLOR_SHIFT) as usize + 1,
            ]);
            let [r, g, b, a] = [px[0], px[1], px[2], px[3]].map(|v| v as f64);
            for (table, v) in linear.iter_mut().zip([1.0, a, r, g, b]) {
                table[i] += v;
            }
            squares[i] += a * a + r * r + g * g + b * b;
        }
        for table in linear.iter_mut().chain(std::iter::once(&mut squares)) {
            accumulate(&grid, table);
        }
        Self {
            grid,
            linear,
            squares,
        }
    }

    fn whole(&self) -> ColorBox {
        let mut cube = ColorBox {
            hi: self.grid.side.map(|s| s - 1),
            ..Default::default()
        };
        cube.update_volume();
        cube
    }

    /// Signed corner sum over the three axes other than `axis`, with `axis`
    /// pinned at `pos`.
    fn slab(&self, cube: &ColorBox, axis: usize, pos: usize, m: &[f64]) -> f64 {
        let mut sum = 0.0;
        for mask in 0..16u32 {
            if mask & (1 << axis) != 0 {
                continue;
            }
            let mut coord = [0; 4];
            let mut lows = 0;
            for d in 0..4 {
                coord[d] = if d == axis {
                    pos
                } else if mask & (1 << d) != 0 {
                    cube.hi[d]
                } else {
                    lows += 1;
                    cube.lo[d]
                };
            }
            let v = m[self.grid.index(coord)];
            if lows % 2 == 0 {
                sum += v;
            } else {
                sum -= v;
            }
        }
        sum
    }

    fn volume(&self, cube: &ColorBox, m: &[f64]) -> f64 {
        self.slab(cube, ALPHA, cube.hi[ALPHA], m) - self.slab(cube, ALPHA, cube.lo[ALPHA], m)
    }

    fn sums(&self, cube: &ColorBox) -> Sums {
        std::array::from_fn(|k| self.volume(cube, &self.linear[k]))
    }

    fn variance(&self, cube: &ColorBox) -> f64 {
        let [w, channels @ ..] = self.sums(cube);
        if w <= 0.0 {
            return 0.0;
        }
        self.volume(cube, &self.squares) - energy(&channels) / w
    }

    /// Best cut along `axis`, as `(score, position)`.
    fn maximize(&self, cube: &ColorBox, axis: usize, whole: Sums) -> (f64, Option<usize>) {
        let base: Sums =
            std::array::from_fn(|k| -self.slab(cube, axis, cube.lo[axis], &self.linear[k]));

        let mut best = (0.0, None);
        for pos in cube.lo[axis] + 1..cube.hi[axis] {
            let half: Sums =
                std::array::from_fn(|k| base[k] + self.slab(cube, axis, pos, &self.linear[k]));
            if half[0] <= 0.0 {
                continue;
            }
            let rest: Sums = std::array::from_fn(|k| whole[k] - half[k]);
            if rest[0] <= 0.0 {
                continue;
            }
            let score = energy(&half[1..]) / half[0] + energy(&rest[1..]) / rest[0];
            if score > best.0 {
                best = (score, Some(pos));
            }
        }
        best
    }

    /// Split `cube` in two, returning the upper part.
    fn cut(&self, cube: &mut ColorBox) -> Option<ColorBox> {
        let whole = self.sums(cube);
        let mut best: (f64, Option<(usize, usize)>) = (0.0, None);
        for axis in [ALPHA, RED, GREEN, BLUE] {
            let (score, pos) = self.maximize(cube, axis, whole);
            if let Some(pos) = pos {
                if best.1.is_none() || score > best.0 {
                    best = (score, Some((axis, pos)));
                }
            }
        }
        let (axis, pos) = best.1?;

        let mut upper = *cube;
        upper.lo[axis] = pos;
        cube.hi[axis] = pos;
        cube.update_volume();
        upper.update_volume();
        Some(upper)
    }
}

fn energy(channels: &[f64]) -> f64 {
    channels.iter().map(|c| c * c).sum()
}

/// Turn cell counts into cumulative sums over `[1, a] x [1, r] x [1, g] x [1, b]`.
fn accumulate(grid: &Grid, table: &mut [f64]) {
    for d in 0..4 {
        let stride = grid.stride[d];
        for i in 0..table.len() {
            if (i / stride) % grid.side[d] > 0 {
                table[i] += table[i - stride];
            }
        }
    }
}

/// Up to `max_colors` representative colours of packed RGBA `pixels`.
pub(crate) fn wu(pixels: &[u8], max_colors: usize) -> Vec<[u8; 4]> {
    let moments = Moments::from_pixels(pixels);

    let mut boxes = vec![moments.whole()];
    let mut spread = vec![0.0];
    let mut next = 0;
    while boxes.len() < max_colors {
        match moments.cut(&mut boxes[next]) {
            Some(upper) => {
                let score = |c: &ColorBox| {
                    if c.volume > 1 {
                        moments.variance(c)
                    } else {
                        0.0
                    }
                };
                spread[next] = score(&boxes[next]);
                spread.push(score(&upper));
                boxes.push(upper);
            }
            None => spread[next] = 0.0,
        }

        next = 0;
        for (k, &s) in spread.iter().enumerate().skip(1) {
            if s > spread[next] {
                next = k;
            }
        }
        if spread[next] <= 0.0 {
            break;
        }
    }
    log::trace!("wu: {} boxes", boxes.len());

    boxes
        .iter()
        .filter_map(|c| {
            let [w, a, r, g, b] = moments.sums(c);
            (w > 0.0).then(|| [r, g, b, a].map(|s| (s / w).round().clamp(0.0, 255.0) as u8))
        })
        .collect()
}
