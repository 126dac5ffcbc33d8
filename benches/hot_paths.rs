use criterion::{black_box, criterion_group, criterion_main, Criterion};

use vih_map::config::Schema;
use vih_map::dashboard::Dashboard;
use vih_map::data::synthetic;
use vih_map::map::MapRenderer;
use vih_map::metric::{compute_metric, ViewMode, YearSelector};

fn bench_metric(c: &mut Criterion) {
    let schema = Schema::default();
    let dataset = synthetic::generate(&schema);
    let range = YearSelector::parse(&schema.range_label()).unwrap();

    c.bench_function("compute_metric_range", |b| {
        b.iter(|| compute_metric(black_box(&dataset), range, &schema))
    });

    let dashboard = Dashboard::new(dataset, schema);
    c.bench_function("dashboard_view", |b| {
        b.iter(|| dashboard.view(black_box("2009-2012"), ViewMode::Choropleth).unwrap())
    });
}

fn bench_render(c: &mut Criterion) {
    let schema = Schema::default();
    let dashboard = Dashboard::new(synthetic::generate(&schema), schema);
    let renderer = MapRenderer::from_dataset(dashboard.dataset());
    let view = dashboard.view("2009-2012", ViewMode::Choropleth).unwrap();
    let viewport = renderer.home_viewport(200, 160);

    c.bench_function("braille_choropleth", |b| {
        b.iter(|| renderer.render(100, 40, black_box(&viewport), &view.metric, ViewMode::Choropleth))
    });
    c.bench_function("braille_bubbles", |b| {
        b.iter(|| renderer.render(100, 40, black_box(&viewport), &view.metric, ViewMode::Bubbles))
    });
    c.bench_function("svg_choropleth", |b| {
        b.iter(|| renderer.render_svg(900, 600, black_box(&view.metric), ViewMode::Choropleth))
    });
}

criterion_group!(benches, bench_metric, bench_render);
criterion_main!(benches);
