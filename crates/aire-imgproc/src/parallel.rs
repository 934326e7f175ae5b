use rayon::prelude::*;
use thiserror::Error;

use aire_image::{Image, ImageError};

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),

    /// The wrapped operation failed.
    #[error(transparent)]
    Image(#[from] ImageError),
}

impl From<ParallelError> for ImageError {
    fn from(err: ParallelError) -> Self {
        match err {
            ParallelError::Image(e) => e,
            ParallelError::InvalidThreadCount(n) => {
                ImageError::InvalidParameter("threads", format!("must be > 0, got {n}"))
            }
            ParallelError::BuildError(msg) => ImageError::UnsupportedConfiguration(msg),
        }
    }
}

/// Controls where the row workers of an operation run.
///
/// Every transform splits its output into rows and hands them to rayon. The
/// strategy only decides which pool executes them; results are identical for
/// every strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStrategy {
    /// Use the global Rayon thread pool.
    #[default]
    ParallelRows,

    /// Run on a single-threaded local pool.
    ///
    /// Useful for small images, debugging, or when the overhead of parallelization
    /// outweighs the benefits.
    Serial,

    /// Run on a local thread pool with `n` threads.
    ///
    /// # Warning
    /// Creates a new thread pool on every call, which has significant overhead.
    /// Use this primarily for benchmarking or specific isolation needs.
    Fixed(usize),
}

impl ExecutionStrategy {
    /// Run `op` under this strategy.
    ///
    /// # Errors
    ///
    /// Returns an error when the local pool cannot be built or when `op` fails.
    pub fn execute<R, F>(self, op: F) -> Result<R, ParallelError>
    where
        R: Send,
        F: FnOnce() -> Result<R, ImageError> + Send,
    {
        let threads = match self {
            ExecutionStrategy::ParallelRows => return Ok(op()?),
            ExecutionStrategy::Serial => 1,
            ExecutionStrategy::Fixed(0) => return Err(ParallelError::InvalidThreadCount(0)),
            ExecutionStrategy::Fixed(n) => n,
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| ParallelError::BuildError(e.to_string()))?;

        Ok(pool.install(op)?)
    }
}

/// Apply `f(y, row)` to every row of a destination buffer in parallel.
///
/// PRECONDITION: `dst.len()` is a multiple of `row_stride`.
pub(crate) fn par_rows_mut<T: Send>(
    dst: &mut [T],
    row_stride: usize,
    f: impl Fn(usize, &mut [T]) + Send + Sync,
) {
    if row_stride == 0 {
        return;
    }
    dst.par_chunks_exact_mut(row_stride)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
}

/// Apply a function to each pixel in the image in parallel.
pub fn par_iter_rows<T1, const C1: usize, T2, const C2: usize>(
    src: &Image<T1, C1>,
    dst: &mut Image<T2, C2>,
    f: impl Fn(&[T1], &mut [T2]) + Send + Sync,
) where
    T1: Send + Sync,
    T2: Send + Sync,
{
    let cols = src.cols();
    if cols == 0 {
        return;
    }
    src.as_slice()
        .par_chunks_exact(C1 * cols)
        .zip(dst.as_slice_mut().par_chunks_exact_mut(C2 * cols))
        .for_each(|(src_chunk, dst_chunk)| {
            src_chunk
                .chunks_exact(C1)
                .zip(dst_chunk.chunks_exact_mut(C2))
                .for_each(|(src_pixel, dst_pixel)| {
                    f(src_pixel, dst_pixel);
                });
        });
}

/// Apply a function to each sample in the image in parallel.
pub fn par_iter_rows_val<T1, const C1: usize, T2, const C2: usize>(
    src: &Image<T1, C1>,
    dst: &mut Image<T2, C2>,
    f: impl Fn(&T1, &mut T2) + Send + Sync,
) where
    T1: Send + Sync,
    T2: Send + Sync,
{
    let cols = src.cols();
    if cols == 0 {
        return;
    }
    src.as_slice()
        .par_chunks_exact(C1 * cols)
        .zip(dst.as_slice_mut().par_chunks_exact_mut(C2 * cols))
        .for_each(|(src_chunk, dst_chunk)| {
            src_chunk
                .iter()
                .zip(dst_chunk.iter_mut())
                .for_each(|(src_pixel, dst_pixel)| {
                    f(src_pixel, dst_pixel);
                });
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_serial() -> Result<(), ParallelError> {
        let out = ExecutionStrategy::Serial.execute(|| Ok(rayon::current_num_threads()))?;
        assert_eq!(out, 1);
        Ok(())
    }

    #[test]
    fn test_execute_fixed_success() -> Result<(), ParallelError> {
        let out = ExecutionStrategy::Fixed(2).execute(|| Ok(rayon::current_num_threads()))?;
        assert_eq!(out, 2);
        Ok(())
    }

    #[test]
    fn test_execute_fixed_error() {
        let res = ExecutionStrategy::Fixed(0).execute(|| Ok(()));
        assert_eq!(res, Err(ParallelError::InvalidThreadCount(0)));
    }

    #[test]
    fn test_execute_forwards_errors() {
        let res: Result<(), _> = ExecutionStrategy::ParallelRows
            .execute(|| Err(ImageError::InvalidKernelSize(2)));
        assert_eq!(
            res,
            Err(ParallelError::Image(ImageError::InvalidKernelSize(2)))
        );
    }

    #[test]
    fn test_into_image_error() {
        let err: ImageError = ParallelError::Image(ImageError::InvalidSigma(-1.0)).into();
        assert_eq!(err, ImageError::InvalidSigma(-1.0));
        let err: ImageError = ParallelError::InvalidThreadCount(0).into();
        assert_eq!(err.kind(), aire_image::ErrorKind::InvalidParameter);
    }

    #[test]
    fn test_par_rows_mut() {
        let mut dst = vec![0usize; 6];
        par_rows_mut(&mut dst, 2, |y, row| row.iter_mut().for_each(|v| *v = y));
        assert_eq!(dst, vec![0, 0, 1, 1, 2, 2]);
    }

    #[test]
    fn test_par_iter_rows_val() -> Result<(), ImageError> {
        let src = Image::<u8, 1>::new([2, 2].into(), vec![1, 2, 3, 4])?;
        let mut dst = Image::<u8, 1>::from_size_val(src.size(), 0)?;
        par_iter_rows_val(&src, &mut dst, |s, d| *d = s * 2);
        assert_eq!(dst.as_slice(), &[2, 4, 6, 8]);
        Ok(())
    }
}
