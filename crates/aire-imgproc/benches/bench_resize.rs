use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use aire_image::Image;
use aire_imgproc::color::TransferFunction;
use aire_imgproc::interpolation::ResizeFilter;
use aire_imgproc::resize::{resize, resize_fast, ResizeConfig, ScaleSpace};

fn bench_resize(c: &mut Criterion) {
    let mut group = c.benchmark_group("Resize");

    for (width, height) in [(256, 224), (512, 448), (1024, 896)].iter() {
        let image = Image::<u8, 4>::from_fn([*width, *height].into(), |x, y| {
            [(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8, 255]
        });
        let new_size = [*width / 2, *height / 2].into();
        group.throughput(criterion::Throughput::Elements((*width * *height) as u64));
        let parameter_string = format!("{width}x{height}");

        for filter in [
            ResizeFilter::Bilinear,
            ResizeFilter::CatmullRom,
            ResizeFilter::Lanczos3,
        ] {
            let config = ResizeConfig::new(new_size).with_filter(filter);
            group.bench_with_input(
                BenchmarkId::new(format!("resize_{filter:?}"), &parameter_string),
                &image,
                |b, i| b.iter(|| black_box(resize(i, &config))),
            );
            group.bench_with_input(
                BenchmarkId::new(format!("resize_fast_{filter:?}"), &parameter_string),
                &image,
                |b, i| b.iter(|| black_box(resize_fast(i, &config))),
            );
        }

        let config = ResizeConfig::new(new_size)
            .with_filter(ResizeFilter::Lanczos3)
            .with_working_space(ScaleSpace::Linear(TransferFunction::Srgb));
        group.bench_with_input(
            BenchmarkId::new("resize_linear_Lanczos3", &parameter_string),
            &image,
            |b, i| b.iter(|| black_box(resize(i, &config))),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_resize);
criterion_main!(benches);
