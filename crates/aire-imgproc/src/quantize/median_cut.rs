use std::collections::HashMap;
use std::ops::Range;

/// A run of histogram entries sharing one output colour.
struct CutBox {
    range: Range<usize>,
    count: u64,
    min: [u8; 4],
    max: [u8; 4],
}

impl CutBox {
    fn new(colors: &[([u8; 4], u64)], range: Range<usize>) -> Self {
        let mut min = [u8::MAX; 4];
        let mut max = [0u8; 4];
        let mut count = 0;
        for (c, n) in &colors[range.clone()] {
            count += n;
            for k in 0..4 {
                min[k] = min[k].min(c[k]);
                max[k] = max[k].max(c[k]);
            }
        }
        Self {
            range,
            count,
            min,
            max,
        }
    }

    fn volume(&self) -> u64 {
        (0..4)
            .map(|k| (self.max[k] - self.min[k]) as u64 + 1)
            .product()
    }

    fn widest(&self) -> usize {
        let mut axis = 0;
        for k in 1..4 {
            if self.max[k] - self.min[k] > self.max[axis] - self.min[axis] {
                axis = k;
            }
        }
        axis
    }

    fn average(&self, colors: &[([u8; 4], u64)]) -> [u8; 4] {
        let mut sums = [0u64; 4];
        for (c, n) in &colors[self.range.clone()] {
            for k in 0..4 {
                sums[k] += c[k] as u64 * n;
            }
        }
        sums.map(|s| ((s + self.count / 2) / self.count) as u8)
    }
}

/// Up to `max_colors` colours by recursive median splits of the colour
/// histogram of packed RGBA `pixels`.
///
/// The box to split is the one with the largest `count * volume` while
/// fewer than three quarters of the budget are used, then the most
/// populated one. Boxes are cut at the weighted median of their widest
/// channel.
pub(crate) fn median_cut(pixels: &[u8], max_colors: usize) -> Vec<[u8; 4]> {
    let mut histogram: HashMap<[u8; 4], u64> = HashMap::new();
    for px in pixels.chunks_exact(4) {
        *histogram.entry([px[0], px[1], px[2], px[3]]).or_default() += 1;
    }
    let mut colors: Vec<([u8; 4], u64)> = histogram.into_iter().collect();
    if colors.is_empty() {
        return Vec::new();
    }
    colors.sort_unstable();

    let mut boxes = vec![CutBox::new(&colors, 0..colors.len())];
    while boxes.len() < max_colors {
        let by_volume = (boxes.len() as f32) < max_colors as f32 * 0.75;
        let candidate = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.range.len() > 1)
            .max_by_key(|(i, b)| {
                let order = if by_volume {
                    b.count.saturating_mul(b.volume())
                } else {
                    b.count
                };
                (order, std::cmp::Reverse(*i))
            })
            .map(|(i, _)| i);
        let Some(i) = candidate else {
            break;
        };

        let cut = boxes.swap_remove(i);
        let axis = cut.widest();
        let slice = &mut colors[cut.range.clone()];
        slice.sort_unstable_by_key(|(c, _)| (c[axis], *c));

        let mut acc = 0;
        let mut median = slice.len() - 1;
        for (k, (_, n)) in slice.iter().enumerate() {
            acc += n;
            if acc * 2 >= cut.count {
                median = (k + 1).min(slice.len() - 1);
                break;
            }
        }
        let split = cut.range.start + median;
        boxes.push(CutBox::new(&colors, cut.range.start..split));
        boxes.push(CutBox::new(&colors, split..cut.range.end));
    }

    boxes.sort_by_key(|b| b.range.start);
    boxes.iter().map(|b| b.average(&colors)).collect()
}
