//! Viewport behavior against small tile pyramids: clamping, anchored zoom,
//! annotation re-centering and level swaps, plus property checks of the
//! zoom and pan invariants.

use proptest::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use tileview::core::bounds::offset_ranges;
use tileview::tiles::Tile;
use tileview::{
    AnnotationStore, LevelSwap, Point, PyramidSnapshot, ScaledTileCache, Size, TileBounds, TileIndex,
    TilePyramid, TileStore, ViewTransform, Viewer, ViewerConfig, Viewport,
};

const VIEW: Size = Size {
    width: 800.0,
    height: 600.0,
};

fn grid_bounds(count: i32) -> TileBounds {
    TileBounds {
        min_col: 0,
        max_col: count - 1,
        min_row: 0,
        max_row: count - 1,
    }
}

/// Tile store backed by an in-memory snapshot; every other level is empty
fn memory_store(level: u32, count: i32) -> TileStore {
    let tiles = (0..count).flat_map(|col| {
        (0..count).map(move |row| {
            Tile::new(
                level,
                TileIndex::new(col, row),
                image::RgbaImage::from_pixel(4, 4, image::Rgba([120, 130, 140, 255])),
            )
        })
    });
    let pyramid = TilePyramid::new("/nonexistent/tileview-scenarios", &["png".to_string()]);
    TileStore::with_snapshot(
        pyramid,
        PyramidSnapshot::from_tiles(level, tiles),
        ScaledTileCache::new(256, 256, 100),
    )
}

fn write_level(root: &Path, level: u32, count: i32) {
    for col in 0..count {
        let dir = root.join(level.to_string()).join(col.to_string());
        fs::create_dir_all(&dir).unwrap();
        for row in 0..count {
            image::RgbaImage::from_pixel(4, 4, image::Rgba([30, 60, 90, 255]))
                .save(dir.join(format!("{}.png", row)))
                .unwrap();
        }
    }
}

fn settle(viewport: &mut Viewport, store: &mut TileStore) {
    for _ in 0..500 {
        viewport.tick(store);
        if viewport.state().is_settled() {
            return;
        }
    }
    panic!("viewport did not settle: {:?}", viewport.state());
}

#[test]
fn scenario_a_pan_is_clamped_to_map() {
    let bounds = grid_bounds(4);
    let mut viewport = Viewport::new(&ViewerConfig::default(), VIEW, 2).unwrap();

    viewport.set_target_offset(Point::new(-2000.0, -2000.0), Some(&bounds));

    let target = viewport.state().target_offset;
    // 4 tiles of 256 px: min offset is the viewport extent minus 1024.
    assert_eq!(target, Point::new(800.0 - 1024.0, 600.0 - 1024.0));
    assert!(target.x <= 0.0 && target.y <= 0.0);
    // The map still covers the right and bottom edges of the view.
    let transform = viewport.target_transform();
    let far_corner = transform.world_to_screen(Point::new(4.0, 4.0));
    assert!(far_corner.x >= VIEW.width && far_corner.y >= VIEW.height);
}

#[test]
fn scenario_a_with_pyramid_on_disk() {
    let dir = tempdir().unwrap();
    write_level(dir.path(), 2, 4);
    let config = ViewerConfig::default().with_tile_root(dir.path());
    let mut viewer = Viewer::create(config, VIEW).unwrap();

    viewer.pan(Point::new(-2000.0, -2000.0));
    for _ in 0..200 {
        viewer.tick();
    }
    assert_eq!(viewer.state().offset, Point::new(-224.0, -424.0));
}

#[test]
fn scenario_b_anchor_stays_fixed_across_zoom() {
    let bounds = grid_bounds(16);
    let mut viewport = Viewport::new(&ViewerConfig::default(), VIEW, 2).unwrap();
    viewport.set_target_offset(Point::new(-300.0, -200.0), Some(&bounds));
    let anchor = Point::new(400.0, 300.0);

    let before = viewport.target_transform().screen_to_world(anchor);
    viewport.set_target_zoom(1.0, anchor, Some(&bounds));
    let after = viewport.target_transform().screen_to_world(anchor);

    assert_eq!(viewport.state().target_zoom, 3.0);
    assert!((before.x - after.x).abs() < 1e-9, "{:?} vs {:?}", before, after);
    assert!((before.y - after.y).abs() < 1e-9, "{:?} vs {:?}", before, after);
}

#[test]
fn scenario_b_anchor_survives_level_swap() {
    let dir = tempdir().unwrap();
    write_level(dir.path(), 2, 8);
    write_level(dir.path(), 3, 16);
    let config = ViewerConfig::default().with_tile_root(dir.path());
    let mut viewer = Viewer::create(config, VIEW).unwrap();
    let anchor = Point::new(400.0, 300.0);

    viewer.pan(Point::new(-300.0, -200.0));
    for _ in 0..200 {
        viewer.tick();
    }
    let before = viewer.viewport().screen_to_world(anchor);

    viewer.zoom_at(1.0, anchor);
    for _ in 0..200 {
        viewer.tick();
    }
    assert_eq!(viewer.state().active_level, 3);
    assert_eq!(viewer.state().zoom, 3.0);

    // Level 3 tile units are half the size of level 2 units.
    let after = viewer.viewport().screen_to_world(anchor);
    assert!((after.x - before.x * 2.0).abs() < 1e-6, "{:?} vs {:?}", before, after);
    assert!((after.y - before.y * 2.0).abs() < 1e-6, "{:?} vs {:?}", before, after);
}

#[test]
fn scenario_c_recenter_on_annotation() {
    let mut store = memory_store(2, 32);
    let bounds = store.snapshot().bounds().copied();
    let mut viewport = Viewport::new(&ViewerConfig::default(), VIEW, 2).unwrap();

    let mut annotations = AnnotationStore::new();
    let index = annotations.commit(Point::new(12.5, 7.25), 3.0, 2, "outpost");

    let (offset, zoom) = annotations
        .recenter_target(index, &viewport, bounds.as_ref(), true)
        .unwrap();
    assert_eq!(zoom, 3.0);
    viewport.set_target(offset, zoom, bounds.as_ref());
    settle(&mut viewport, &mut store);

    // Level 3 is absent, so the view keeps level 2 at scale 2.
    assert_eq!(viewport.state().active_level, 2);
    let screen = viewport.world_to_screen(Point::new(12.5, 7.25));
    assert!((screen.x - 400.0).abs() < 1e-6, "{:?}", screen);
    assert!((screen.y - 300.0).abs() < 1e-6, "{:?}", screen);
}

#[test]
fn scenario_c_recenter_keeping_current_zoom() {
    let mut store = memory_store(2, 32);
    let bounds = store.snapshot().bounds().copied();
    let mut viewport = Viewport::new(&ViewerConfig::default(), VIEW, 2).unwrap();
    let mut annotations = AnnotationStore::new();
    annotations.commit(Point::new(12.5, 7.25), 3.0, 2, "outpost");

    let (offset, zoom) = annotations
        .recenter_target(0, &viewport, bounds.as_ref(), false)
        .unwrap();
    assert_eq!(zoom, 2.0);
    viewport.set_target(offset, zoom, bounds.as_ref());
    settle(&mut viewport, &mut store);

    let center = viewport.center_world();
    assert!((center.x - 12.5).abs() < 1e-6 && (center.y - 7.25).abs() < 1e-6);
}

#[test]
fn scenario_d_empty_level_keeps_previous() {
    let dir = tempdir().unwrap();
    write_level(dir.path(), 2, 4);
    let config = ViewerConfig::default().with_tile_root(dir.path());
    let mut viewer = Viewer::create(config, VIEW).unwrap();

    viewer.render();
    let generation = viewer.tiles().snapshot().generation();
    let cached = viewer.tiles().cache().len();
    assert!(cached > 0);

    viewer.zoom_at(1.0, Point::new(400.0, 300.0));
    let mut rejected = false;
    for _ in 0..200 {
        rejected |= matches!(viewer.tick(), LevelSwap::RejectedEmpty { requested: 3 });
    }

    assert!(rejected);
    assert_eq!(viewer.state().zoom, 3.0);
    assert_eq!(viewer.state().active_level, 2);
    assert_eq!(viewer.tiles().snapshot().generation(), generation);
    assert_eq!(viewer.tiles().cache().generation(), Some(generation));
    assert_eq!(viewer.tiles().cache().len(), cached);
}

#[test]
fn cache_returns_same_image_without_resampling() {
    let mut store = memory_store(2, 2);
    let (snapshot, cache) = store.parts_mut();
    let tile = snapshot.get(TileIndex::new(1, 1)).unwrap();

    let first = cache.get(tile.index, tile, 1.37);
    let second = cache.get(tile.index, tile, 1.37);
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(cache.resample_count(), 1);
}

#[test]
fn tick_is_idempotent_once_settled() {
    let mut store = memory_store(2, 8);
    let bounds = store.snapshot().bounds().copied();
    let mut viewport = Viewport::new(&ViewerConfig::default(), VIEW, 2).unwrap();
    viewport.set_target_zoom(0.4, Point::new(100.0, 100.0), bounds.as_ref());
    viewport.set_target_offset(Point::new(-150.0, -75.0), bounds.as_ref());
    settle(&mut viewport, &mut store);

    let settled = *viewport.state();
    for _ in 0..10 {
        assert_eq!(viewport.tick(&mut store), LevelSwap::Unchanged);
        assert_eq!(*viewport.state(), settled);
    }
}

#[derive(Debug, Clone)]
enum Op {
    Zoom { delta: f64, anchor: Point },
    Pan { delta: Point },
    Tick,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (-3.0..3.0_f64, 0.0..800.0_f64, 0.0..600.0_f64).prop_map(|(delta, x, y)| Op::Zoom {
            delta,
            anchor: Point::new(x, y)
        }),
        (-3000.0..3000.0_f64, -3000.0..3000.0_f64).prop_map(|(x, y)| Op::Pan {
            delta: Point::new(x, y)
        }),
        Just(Op::Tick),
    ]
}

proptest! {
    #[test]
    fn zoom_and_offset_stay_in_bounds(ops in prop::collection::vec(op(), 1..60), count in 1..12_i32) {
        let mut store = memory_store(2, count);
        let bounds = store.snapshot().bounds().copied();
        let mut viewport = Viewport::new(&ViewerConfig::default(), VIEW, 2).unwrap();
        viewport.set_size(VIEW, bounds.as_ref());

        for op in ops {
            match op {
                Op::Zoom { delta, anchor } => viewport.set_target_zoom(delta, anchor, bounds.as_ref()),
                Op::Pan { delta } => viewport.set_target_offset(delta, bounds.as_ref()),
                Op::Tick => {
                    viewport.tick(&mut store);
                }
            }
            let state = viewport.state();
            prop_assert!(state.zoom >= 2.0 && state.zoom <= 5.0);
            prop_assert!(state.target_zoom >= 2.0 && state.target_zoom <= 5.0);
            prop_assert!(viewport.target_within_bounds(bounds.as_ref(), 1e-6));
        }
    }

    #[test]
    fn screen_world_round_trip(
        ox in -5000.0..5000.0_f64,
        oy in -5000.0..5000.0_f64,
        scale in 0.25..8.0_f64,
        px in -100.0..2000.0_f64,
        py in -100.0..2000.0_f64,
    ) {
        let transform = ViewTransform { offset: Point::new(ox, oy), scale, tile_size: 256, level: 3 };
        let p = Point::new(px, py);
        let back = transform.world_to_screen(transform.screen_to_world(p));
        prop_assert!((back.x - p.x).abs() < 1e-7);
        prop_assert!((back.y - p.y).abs() < 1e-7);
    }

    #[test]
    fn degenerate_ranges_center_the_map(count in 1..3_i32, scale in 0.5..1.0_f64) {
        // At most 2 tiles of at most 256 px never fill an 800 px wide view.
        let bounds = grid_bounds(count);
        let (x, _) = offset_ranges(Some(&bounds), VIEW, scale, 256).unwrap();
        prop_assert!(x.is_degenerate());
        let resolved = x.resolve(-10_000.0);
        let map_px = count as f64 * 256.0 * scale;
        prop_assert!((resolved - (VIEW.width - map_px) / 2.0).abs() < 1e-9);
    }
}
