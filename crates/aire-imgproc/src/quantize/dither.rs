/// Error diffusion used while remapping to a palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DitherAlgorithm {
    /// Plain nearest colour.
    None,
    /// Four neighbours over two rows.
    FloydSteinberg,
    /// Twelve neighbours over three rows.
    #[default]
    JarvisJudiceNinke,
}

impl DitherAlgorithm {
    /// The diffusion kernel, `None` for plain remapping.
    pub fn kernel(&self) -> Option<&'static DiffusionKernel> {
        match self {
            DitherAlgorithm::None => None,
            DitherAlgorithm::FloydSteinberg => Some(&FLOYD_STEINBERG),
            DitherAlgorithm::JarvisJudiceNinke => Some(&JARVIS_JUDICE_NINKE),
        }
    }
}

/// An error diffusion kernel.
///
/// Each entry is `(dx, dy, weight)`; a neighbour receives
/// `error * weight / divisor`. `dy` is never negative and `dx` is positive
/// when `dy == 0`.
#[derive(Debug, Clone, Copy)]
pub struct DiffusionKernel {
    /// Neighbour offsets and weights.
    pub entries: &'static [(i32, usize, u8)],
    /// Sum of the weights.
    pub divisor: u8,
    /// Rows below the current one that receive error.
    pub max_dy: usize,
}

/// ```text
///        X   7
///    3   5   1
/// ```
pub const FLOYD_STEINBERG: DiffusionKernel = DiffusionKernel {
    entries: &[(1, 0, 7), (-1, 1, 3), (0, 1, 5), (1, 1, 1)],
    divisor: 16,
    max_dy: 1,
};

/// ```text
///            X   7   5
///    3   5   7   5   3
///    1   3   5   3   1
/// ```
pub const JARVIS_JUDICE_NINKE: DiffusionKernel = DiffusionKernel {
    entries: &[
        (1, 0, 7),
        (2, 0, 5),
        (-2, 1, 3),
        (-1, 1, 5),
        (0, 1, 7),
        (1, 1, 5),
        (2, 1, 3),
        (-2, 2, 1),
        (-1, 2, 3),
        (0, 2, 5),
        (1, 2, 3),
        (2, 2, 1),
    ],
    divisor: 48,
    max_dy: 2,
};

/// Carried RGB quantization error of one remap pass.
///
/// Holds `max_dy + 1` rows of the image width in a ring. The current row
/// is drained pixel by pixel and then reused for the row `max_dy + 1` below.
pub(crate) struct ErrorDiffusion {
    kernel: &'static DiffusionKernel,
    width: usize,
    y: usize,
    rows: Vec<[f32; 3]>,
}

impl ErrorDiffusion {
    pub(crate) fn new(kernel: &'static DiffusionKernel, width: usize) -> Self {
        Self {
            kernel,
            width,
            y: 0,
            rows: vec![[0.0; 3]; (kernel.max_dy + 1) * width],
        }
    }

    #[inline]
    fn offset(&self, dy: usize) -> usize {
        ((self.y + dy) % (self.kernel.max_dy + 1)) * self.width
    }

    /// Remove and return the error collected at `x` on the current row.
    #[inline]
    pub(crate) fn take(&mut self, x: usize) -> [f32; 3] {
        let at = self.offset(0) + x;
        std::mem::take(&mut self.rows[at])
    }

    /// Spread the error made at `x` on the current row.
    pub(crate) fn diffuse(&mut self, x: usize, error: [f32; 3]) {
        let divisor = self.kernel.divisor as f32;
        for &(dx, dy, weight) in self.kernel.entries {
            let nx = x as i64 + dx as i64;
            if nx < 0 || nx >= self.width as i64 {
                continue;
            }
            let at = self.offset(dy) + nx as usize;
            let weight = weight as f32;
            for (acc, e) in self.rows[at].iter_mut().zip(error) {
                *acc += e * weight / divisor;
            }
        }
    }

    /// Move to the next row.
    pub(crate) fn next_row(&mut self) {
        let start = self.offset(0);
        self.rows[start..start + self.width].fill([0.0; 3]);
        self.y += 1;
    }
}
