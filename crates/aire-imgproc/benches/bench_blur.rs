use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use aire_image::Image;
use aire_imgproc::blur::{
    box_blur, fast_gaussian, gaussian_blur, stack_blur, BoxBlurConfig, FastGaussianConfig,
    FastGaussianDegree, GaussianBlurConfig, GaussianPrecision, StackBlurConfig,
};

fn test_image(width: usize, height: usize) -> Image<u8, 4> {
    Image::from_fn([width, height].into(), |x, y| {
        [(x * 7) as u8, (y * 3) as u8, ((x ^ y) * 5) as u8, 255]
    })
}

fn bench_blur(c: &mut Criterion) {
    let mut group = c.benchmark_group("Blur");

    for (width, height) in [(256, 224), (512, 448), (1024, 896)].iter() {
        let image = test_image(*width, *height);

        for kernel_size in [5, 11, 25].iter() {
            group.throughput(criterion::Throughput::Elements(
                (*width * *height * *kernel_size) as u64,
            ));
            let parameter_string = format!("{width}x{height}x{kernel_size}");

            for precision in [GaussianPrecision::Exact, GaussianPrecision::Integral] {
                let config = GaussianBlurConfig::new(*kernel_size, 0.0).with_precision(precision);
                group.bench_with_input(
                    BenchmarkId::new(format!("gaussian_blur_{precision:?}"), &parameter_string),
                    &image,
                    |b, i| b.iter(|| black_box(gaussian_blur(i, &config))),
                );
            }

            let config = BoxBlurConfig::new(*kernel_size);
            group.bench_with_input(
                BenchmarkId::new("box_blur", &parameter_string),
                &image,
                |b, i| b.iter(|| black_box(box_blur(i, &config))),
            );

            let config = StackBlurConfig::new(*kernel_size / 2);
            group.bench_with_input(
                BenchmarkId::new("stack_blur", &parameter_string),
                &image,
                |b, i| b.iter(|| black_box(stack_blur(i, &config))),
            );

            let config = FastGaussianConfig::new(*kernel_size / 2, FastGaussianDegree::Three);
            group.bench_with_input(
                BenchmarkId::new("fast_gaussian", &parameter_string),
                &image,
                |b, i| b.iter(|| black_box(fast_gaussian(i, &config))),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_blur);
criterion_main!(benches);
