use criterion::{Criterion, criterion_group, criterion_main};
use markloom_engine::{Point, ScrollDelta, Size};
mod common;

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    group.sample_size(10);

    group.bench_function("load_2000_lines", |b| {
        b.iter(|| {
            let session = common::loaded_session(std::hint::black_box(2000));
            std::hint::black_box(session.layout().len());
        });
    });

    let mut session = common::loaded_session(2000);

    group.bench_function("scroll_window", |b| {
        let mut down = true;
        b.iter(|| {
            let dy = if down { 900.0 } else { -900.0 };
            session.scroll_by(ScrollDelta { dx: 0.0, dy });
            if session.scroll().y >= session.max_scroll().y || session.scroll().y <= 0.0 {
                down = !down;
            }
            std::hint::black_box(session.window());
        });
    });

    group.bench_function("line_at", |b| {
        let height = session.layout().content_height();
        let mut y = 0.0;
        b.iter(|| {
            y = (y + 137.0) % height;
            std::hint::black_box(session.layout().line_at(y));
        });
    });

    group.bench_function("resolve_point", |b| {
        b.iter(|| {
            let position = session.resolve_point(std::hint::black_box(Point::new(120.0, 300.0)));
            std::hint::black_box(position.ok());
        });
    });

    group.bench_function("set_viewport", |b| {
        let mut tall = false;
        b.iter(|| {
            tall = !tall;
            let height = if tall { 1200.0 } else { 600.0 };
            session.set_viewport(Size::new(800.0, height));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_layout);
criterion_main!(benches);
