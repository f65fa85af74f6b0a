use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use cssmin::{Options, SourceMapOption, minify};

/// A stylesheet with the usual mix of shared declarations, longhands,
/// media queries and comments, repeated `copies` times.
fn stylesheet(copies: usize) -> String {
    let mut css = String::new();
    for index in 0..copies {
        css.push_str(&format!(
            "/* block {index} */\n\
             .nav-{index} a {{ color: #FF0000; margin-top: 0px; margin-right: 0px; margin-bottom: 0px; margin-left: 0px }}\n\
             .nav-{index} li {{ color: #ff0000; padding: 10px 5px 10px 5px }}\n\
             #item-{index} {{ background: url('img/{index}.png') no-repeat 0 0; font-weight: bold }}\n\
             @media screen and (max-width: 600px) {{ .nav-{index} a {{ display: none }} }}\n"
        ));
    }
    css
}

/// `rules` plain rules sharing declarations, with no `@media` blocks to
/// break the stylesheet into short runs.
fn flat_stylesheet(rules: usize) -> String {
    let mut css = String::new();
    for index in 0..rules {
        css.push_str(&format!(
            ".r{index} {{ color: #00{}; margin: {}px; display: block; padding: {}px }}\n",
            index % 10,
            index % 7,
            index % 5
        ));
    }
    css
}

fn bench_minify(c: &mut Criterion) {
    let mut group = c.benchmark_group("minify");
    let options = Options::default();

    for copies in [10, 100, 500] {
        let css = stylesheet(copies);
        group.throughput(Throughput::Bytes(css.len() as u64));
        group.bench_with_input(BenchmarkId::new("advanced", copies), &css, |b, css| {
            b.iter(|| minify(black_box(css.as_str()), &options))
        });
    }

    for rules in [100, 1000, 4000] {
        let css = flat_stylesheet(rules);
        group.throughput(Throughput::Bytes(css.len() as u64));
        group.bench_with_input(BenchmarkId::new("flat", rules), &css, |b, css| {
            b.iter(|| minify(black_box(css.as_str()), &options))
        });
    }

    group.finish();
}

fn bench_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("modes");
    let css = stylesheet(100);

    let basic = Options {
        advanced: false,
        ..Options::default()
    };
    group.bench_function("basic_only", |b| b.iter(|| minify(black_box(css.as_str()), &basic)));

    let no_restructuring = Options {
        restructuring: false,
        ..Options::default()
    };
    group.bench_function("no_restructuring", |b| {
        b.iter(|| minify(black_box(css.as_str()), &no_restructuring))
    });

    let mapped = Options {
        source_map: SourceMapOption::Enabled,
        ..Options::default()
    };
    group.bench_function("with_source_map", |b| {
        b.iter(|| minify(black_box(css.as_str()), &mapped))
    });

    group.finish();
}

criterion_group!(benches, bench_minify, bench_modes);
criterion_main!(benches);
