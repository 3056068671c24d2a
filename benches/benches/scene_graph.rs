// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for scene graph invalidation, bounds validation, and picking.
//!
//! Scenes are synthetic: a grid of panels, each holding a row of items, viewed
//! through a single camera.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use kurbo::{Affine, Point, Vec2};
use understory_scene_graph::{Bounds, LocalNode, NodeId, NodeKind, Scene};

#[derive(Clone)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u32(&mut self) -> u32 {
        // Numerical Recipes LCG parameters.
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 32) as u32
    }

    fn next_f64(&mut self, upper: f64) -> f64 {
        f64::from(self.next_u32()) / f64::from(u32::MAX) * upper
    }
}

struct Fixture {
    scene: Scene,
    camera: NodeId,
    layer: NodeId,
    panels: Vec<NodeId>,
    items: Vec<NodeId>,
}

fn build(panels: usize, items_per_panel: usize, seed: u64) -> Fixture {
    let mut rng = Lcg::new(seed);
    let mut scene = Scene::new();
    scene.set_damage_tracking(true);
    let layer = scene.insert(None, LocalNode::default()).unwrap();
    let camera = scene
        .insert(None, LocalNode {
            local_bounds: Bounds::new(0.0, 0.0, 1920.0, 1080.0),
            kind: NodeKind::Camera,
            ..LocalNode::default()
        })
        .unwrap();
    scene.add_layer(camera, layer).unwrap();

    let cols = (panels as f64).sqrt().ceil().max(1.0) as usize;
    let mut panel_ids = Vec::with_capacity(panels);
    let mut item_ids = Vec::with_capacity(panels * items_per_panel);
    for p in 0..panels {
        let x = (p % cols) as f64 * 220.0;
        let y = (p / cols) as f64 * 220.0;
        let panel = scene
            .insert(Some(layer), LocalNode {
                local_bounds: Bounds::new(0.0, 0.0, 200.0, 200.0),
                local_transform: Affine::translate((x, y)),
                ..LocalNode::default()
            })
            .unwrap();
        panel_ids.push(panel);
        for _ in 0..items_per_panel {
            let item = scene
                .insert(Some(panel), LocalNode {
                    local_bounds: Bounds::new(0.0, 0.0, 12.0, 12.0),
                    local_transform: Affine::translate((rng.next_f64(188.0), rng.next_f64(188.0))),
                    ..LocalNode::default()
                })
                .unwrap();
            item_ids.push(item);
        }
    }
    scene.full_bounds(layer).unwrap();
    let _ = scene.take_damage();
    Fixture {
        scene,
        camera,
        layer,
        panels: panel_ids,
        items: item_ids,
    }
}

fn bench_scene_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_scene_graph");

    for &(panels, items) in &[(16_usize, 16_usize), (64, 32), (256, 32)] {
        let label = format!("{panels}x{items}");

        group.bench_with_input(BenchmarkId::new("full_bounds_noop", &label), &(), |b, _| {
            let mut f = build(panels, items, 7);
            b.iter(|| black_box(f.scene.full_bounds(f.layer)));
        });

        group.bench_with_input(
            BenchmarkId::new("one_leaf_then_full_bounds", &label),
            &(),
            |b, _| {
                let mut f = build(panels, items, 7);
                let leaf = f.items[f.items.len() / 2];
                let mut flip = false;
                b.iter(|| {
                    flip = !flip;
                    let dx = if flip { 1.0 } else { -1.0 };
                    f.scene.offset(leaf, Vec2::new(dx, 0.0)).unwrap();
                    black_box(f.scene.full_bounds(f.layer))
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("sibling_burst_then_full_bounds", &label),
            &(),
            |b, _| {
                b.iter_batched(
                    || build(panels, items, 11),
                    |mut f| {
                        let panel = f.panels[0];
                        let children = f.scene.children_of(panel).to_vec();
                        for child in children {
                            f.scene.offset(child, Vec2::new(0.5, 0.5)).unwrap();
                        }
                        black_box(f.scene.full_bounds(f.layer))
                    },
                    BatchSize::LargeInput,
                );
            },
        );

        group.bench_with_input(BenchmarkId::new("pick_through_camera", &label), &(), |b, _| {
            let mut f = build(panels, items, 13);
            f.scene
                .set_view_transform(f.camera, Affine::scale(0.5))
                .unwrap();
            let mut rng = Lcg::new(99);
            b.iter(|| {
                let p = Point::new(rng.next_f64(1920.0), rng.next_f64(1080.0));
                black_box(f.scene.pick(f.camera, p, 2.0).unwrap())
            });
        });

        group.bench_with_input(BenchmarkId::new("take_damage_after_moves", &label), &(), |b, _| {
            let mut f = build(panels, items, 17);
            let step = (f.items.len() / 8).max(1);
            b.iter(|| {
                for &item in f.items.iter().step_by(step) {
                    f.scene.offset(item, Vec2::new(0.25, 0.0)).unwrap();
                }
                black_box(f.scene.take_damage())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_scene_graph);
criterion_main!(benches);
