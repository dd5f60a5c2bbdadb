//! Diagnostic callback behavior on deliberately defective geometry.

use raygauge_engine::{Analysis, AnalysisConfig, DiagnosticCallbacks, Event, GridMode};
use raygauge_trace::{Scene, SceneRegion, Solid};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn single_view() -> GridMode {
    GridMode::Single {
        azimuth_deg: 0.0,
        elevation_deg: 0.0,
    }
}

fn overlapping_slab_scene() -> Scene {
    // Two 2x2x2 cubes sharing a 1x2x2 slab.
    Scene::new(vec![
        SceneRegion::solid("left", 1, Solid::cuboid([0.0, 0.0, 0.0], [2.0, 2.0, 2.0])),
        SceneRegion::solid("right", 2, Solid::cuboid([1.0, 0.0, 0.0], [3.0, 2.0, 2.0])),
    ])
    .unwrap()
}

#[test]
fn overlap_fires_once_per_ray_with_known_depth() {
    let scene = overlapping_slab_scene();
    let depths = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&depths);

    let mut config = AnalysisConfig::new(1.0, 0.1);
    config.mode = single_view();
    config.volume_tolerance = Some(0.01);
    let mut analysis = Analysis::new(&scene, config).unwrap();
    analysis.set_callbacks(DiagnosticCallbacks::new().on_overlap(move |_, event| {
        if let Event::Overlap { depth, .. } = event {
            sink.lock().unwrap().push(*depth);
        }
    }));
    let report = analysis.run().unwrap();

    // Pass 1 shoots 4 rays, pass 2 shoots 16; every ray crosses the
    // slab, so the callback fires exactly once per ray.
    assert!(report.converged());
    assert_eq!(report.passes, 2);
    let depths = depths.lock().unwrap();
    assert_eq!(depths.len(), 20);
    for depth in depths.iter() {
        assert!((depth - 1.0).abs() < 1e-9, "depth {depth}");
    }

    // The post-hoc registry agrees with the callback stream.
    assert_eq!(report.overlaps.len(), 1);
    let pair = &report.overlaps[0];
    assert_eq!(pair.names, ("left".to_string(), "right".to_string()));
    assert_eq!(pair.count, 20);
    assert!((pair.max_depth - 1.0).abs() < 1e-9);
}

#[test]
fn overlap_below_tolerance_is_not_reported() {
    let scene = overlapping_slab_scene();
    let fired = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&fired);

    let mut config = AnalysisConfig::new(1.0, 0.1);
    config.mode = single_view();
    config.overlap_tolerance = 2.0;
    let mut analysis = Analysis::new(&scene, config).unwrap();
    analysis.set_callbacks(DiagnosticCallbacks::new().on_overlap(move |_, _| {
        sink.fetch_add(1, Ordering::SeqCst);
    }));
    let report = analysis.run().unwrap();

    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert!(report.overlaps.is_empty());
}

/// Counts every diagnostic event class.
#[derive(Default)]
struct EventCounts {
    overlap: AtomicUsize,
    gap: AtomicUsize,
    adjacent: AtomicUsize,
    first: AtomicUsize,
    last: AtomicUsize,
    unconfirmed: AtomicUsize,
    exposed: AtomicUsize,
}

fn counting_callbacks(counts: &Arc<EventCounts>) -> DiagnosticCallbacks {
    let bump = |counter: fn(&EventCounts) -> &AtomicUsize| {
        let counts = Arc::clone(counts);
        move |_: &raygauge_trace::Ray, _: &Event| {
            counter(&counts).fetch_add(1, Ordering::SeqCst);
        }
    };
    DiagnosticCallbacks::new()
        .on_overlap(bump(|c| &c.overlap))
        .on_gap(bump(|c| &c.gap))
        .on_adjacent_air(bump(|c| &c.adjacent))
        .on_first_air(bump(|c| &c.first))
        .on_last_air(bump(|c| &c.last))
        .on_unconfirmed_air(bump(|c| &c.unconfirmed))
        .on_exposed_air(bump(|c| &c.exposed))
}

#[test]
fn enclosed_air_is_unconfirmed_but_not_exposed() {
    // A hollow shell with a floating air block inside it: the air
    // never touches solid or the model exterior along the rays.
    let shell = Solid::difference(
        Solid::cuboid([0.0, 0.0, 0.0], [4.0, 4.0, 4.0]),
        Solid::cuboid([1.0, 1.0, 1.0], [3.0, 3.0, 3.0]),
    );
    let scene = Scene::new(vec![
        SceneRegion::solid("shell", 1, shell),
        SceneRegion::air("pocket", Solid::cuboid([1.4, 1.4, 1.4], [2.6, 2.6, 2.6])),
    ])
    .unwrap();

    let counts = Arc::new(EventCounts::default());
    let mut config = AnalysisConfig::new(1.0, 0.25);
    config.mode = single_view();
    config.use_air = true;
    let mut analysis = Analysis::new(&scene, config).unwrap();
    analysis.set_callbacks(counting_callbacks(&counts));
    let report = analysis.run().unwrap();

    assert!(report.converged());
    assert!(counts.unconfirmed.load(Ordering::SeqCst) > 0);
    assert!(counts.gap.load(Ordering::SeqCst) > 0);
    assert_eq!(counts.exposed.load(Ordering::SeqCst), 0);
    assert_eq!(counts.first.load(Ordering::SeqCst), 0);
    assert_eq!(counts.last.load(Ordering::SeqCst), 0);
    assert_eq!(counts.adjacent.load(Ordering::SeqCst), 0);
    assert_eq!(counts.overlap.load(Ordering::SeqCst), 0);
}

#[test]
fn boundary_air_is_exposed_but_confirmed() {
    // Solid slab with contiguous air reaching the model boundary: the
    // air is exposed (and first along the ray) but not unconfirmed.
    let scene = Scene::new(vec![
        SceneRegion::solid("slab", 1, Solid::cuboid([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])),
        SceneRegion::air("vent", Solid::cuboid([1.0, 0.0, 0.0], [2.0, 1.0, 1.0])),
    ])
    .unwrap();

    let counts = Arc::new(EventCounts::default());
    let mut config = AnalysisConfig::new(1.0, 0.25);
    config.mode = single_view();
    config.use_air = true;
    let mut analysis = Analysis::new(&scene, config).unwrap();
    analysis.set_callbacks(counting_callbacks(&counts));
    analysis.run().unwrap();

    assert!(counts.exposed.load(Ordering::SeqCst) > 0);
    assert!(counts.first.load(Ordering::SeqCst) > 0);
    assert_eq!(counts.unconfirmed.load(Ordering::SeqCst), 0);
    assert_eq!(counts.last.load(Ordering::SeqCst), 0);
    assert_eq!(counts.gap.load(Ordering::SeqCst), 0);
}

#[test]
fn gaps_require_air_tracking() {
    let scene = Scene::new(vec![
        SceneRegion::solid("near", 1, Solid::cuboid([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])),
        SceneRegion::solid("far", 2, Solid::cuboid([2.0, 0.0, 0.0], [3.0, 1.0, 1.0])),
    ])
    .unwrap();

    let lengths = Arc::new(Mutex::new(Vec::new()));
    let run = |use_air: bool, lengths: &Arc<Mutex<Vec<f64>>>| {
        let sink = Arc::clone(lengths);
        let mut config = AnalysisConfig::new(1.0, 0.25);
        config.mode = single_view();
        config.use_air = use_air;
        let mut analysis = Analysis::new(&scene, config).unwrap();
        analysis.set_callbacks(DiagnosticCallbacks::new().on_gap(move |_, event| {
            if let Event::Gap { length, .. } = event {
                sink.lock().unwrap().push(*length);
            }
        }));
        analysis.run().unwrap();
    };

    run(false, &lengths);
    assert!(lengths.lock().unwrap().is_empty());

    run(true, &lengths);
    let lengths = lengths.lock().unwrap();
    assert!(!lengths.is_empty());
    for length in lengths.iter() {
        assert!((length - 1.0).abs() < 1e-9, "gap length {length}");
    }
}
