use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use storygraph::config::Config;
use storygraph::gesture::InputEvent;
use storygraph::layout::compute_layouts;
use storygraph::model::{CommitLog, StoryNode};
use storygraph::text_metrics::ApproxMetrics;
use storygraph::{GraphView, SvgCanvas};

/// A chain of `nodes` story beats where every node also depends on the one
/// `extra_span` steps back. Every third node has no saved position.
fn story_chain(nodes: usize, extra_span: usize) -> Vec<StoryNode> {
    (0..nodes)
        .map(|i| {
            let mut causes = Vec::new();
            if i > 0 {
                causes.push(format!("n{}", i - 1));
            }
            if extra_span > 1 && i >= extra_span {
                causes.push(format!("n{}", i - extra_span));
            }
            let node = StoryNode::new(format!("n{i}"), format!("Story beat number {i} where things happen"))
                .with_causes(causes)
                .with_tags(["conflict", "turning point", "foreshadowing"])
                .with_order(i as i64);
            if i % 3 == 0 {
                node
            } else {
                node.with_position((i % 5) as f32 * 260.0, (i / 5) as f32 * 180.0)
            }
        })
        .collect()
}

fn view_for(nodes: Vec<StoryNode>) -> GraphView {
    let mut view = GraphView::with_measure("bench", Config::default(), Box::new(ApproxMetrics));
    view.set_nodes(nodes);
    view
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let config = Config::default();
    for size in [12usize, 100, 500] {
        let nodes = story_chain(size, 4);
        group.bench_with_input(BenchmarkId::from_parameter(size), &nodes, |b, nodes| {
            b.iter(|| {
                let layouts = compute_layouts(black_box(nodes), &config.layout, &config.theme, &ApproxMetrics);
                black_box(layouts.len());
            });
        });
    }
    group.finish();
}

fn bench_render_svg(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_svg");
    for size in [12usize, 100, 500] {
        let view = view_for(story_chain(size, 4));
        group.bench_with_input(BenchmarkId::from_parameter(size), &view, |b, view| {
            b.iter(|| {
                let mut canvas = SvgCanvas::new(1200.0, 800.0);
                view.paint(&mut canvas);
                black_box(canvas.finish().len());
            });
        });
    }
    group.finish();
}

fn bench_drag(c: &mut Criterion) {
    let mut group = c.benchmark_group("gesture_drag");
    let moves: Vec<InputEvent> = (0..200)
        .map(|i| InputEvent::Move {
            x: 10.0 + i as f32,
            y: 10.0 + (i / 2) as f32,
        })
        .collect();
    group.bench_function("node_drag_200_moves", |b| {
        b.iter_batched(
            || view_for(story_chain(100, 4)),
            |mut view| {
                let mut sink = CommitLog::default();
                view.handle_event(&InputEvent::Press { x: 10.0, y: 10.0 }, &mut sink);
                for event in &moves {
                    view.handle_event(event, &mut sink);
                }
                view.handle_event(&InputEvent::Release, &mut sink);
                black_box(sink.commits.len());
            },
            criterion::BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_layout, bench_render_svg, bench_drag);
criterion_main!(benches);
