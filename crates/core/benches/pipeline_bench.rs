use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use pdfimage_core::image::{ExtractOptions, ImageInput, SoftMaskInput, extract_image};
use pdfimage_core::model::ColorSpaceDescriptor;

const SIDE: u32 = 512;

fn gradient(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

fn inputs() -> Vec<(&'static str, ImageInput)> {
    let px = (SIDE * SIDE) as usize;
    let palette: Vec<u8> = (0..=255u8).flat_map(|i| [i, 255 - i, i / 2]).collect();
    vec![
        (
            "rgb8",
            ImageInput::new(SIDE, SIDE, 8, ColorSpaceDescriptor::DeviceRGB, gradient(px * 3)),
        ),
        (
            "cmyk8_tiff",
            ImageInput::new(SIDE, SIDE, 8, ColorSpaceDescriptor::DeviceCMYK, gradient(px * 4)),
        ),
        (
            "indexed8_alpha",
            ImageInput::new(
                SIDE,
                SIDE,
                8,
                ColorSpaceDescriptor::Indexed {
                    base: Box::new(ColorSpaceDescriptor::DeviceRGB),
                    hival: 255,
                    lookup: palette,
                },
                gradient(px),
            )
            .with_soft_mask(SoftMaskInput::new(SIDE, SIDE, 8, gradient(px))),
        ),
        (
            "gray1",
            ImageInput::new(SIDE, SIDE, 1, ColorSpaceDescriptor::DeviceGray, gradient(px / 8)),
        ),
    ]
}

fn bench_extract(c: &mut Criterion) {
    let options = ExtractOptions {
        merge_soft_mask: true,
        ..Default::default()
    };
    let mut group = c.benchmark_group("extract_image");
    group.sample_size(20);

    for (name, input) in inputs() {
        group.throughput(Throughput::Bytes(input.data.len() as u64));
        group.bench_with_input(BenchmarkId::new("pipeline", name), &input, |b, input| {
            b.iter(|| {
                let image = extract_image(input, &options).expect("extract");
                black_box(image.data.len());
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_extract);
criterion_main!(benches);
