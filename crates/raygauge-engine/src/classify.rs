//! Per-ray partition classification.
//!
//! Walks one ray's ordered partition list and emits diagnostic events
//! for overlaps, gaps, and the air cases. Classification is strictly
//! local to one ray and deterministic for identical input, which is
//! what lets rays be processed on any worker in any order.

use raygauge_math::Point3;
use raygauge_trace::{Partition, Ray};

/// Thresholds controlling classification.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyOptions {
    /// Minimum overlap depth worth reporting.
    pub overlap_tol: f64,
    /// Distance under which two partition boundaries count as touching.
    pub dist_tol: f64,
    /// Whether air regions are tracked; gates the gap and air events.
    pub use_air: bool,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            overlap_tol: 1e-6,
            dist_tol: 1e-6,
            use_air: false,
        }
    }
}

/// A diagnostic event detected along one ray.
///
/// Events are emitted in ray-parametric order (entry to exit).
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Two different regions claim the same span of the ray.
    Overlap {
        /// Earlier partition of the pair.
        a: Partition,
        /// Later partition of the pair.
        b: Partition,
        /// Depth of the shared span.
        depth: f64,
        /// Midpoint of the shared span in model space.
        mid: Point3,
    },
    /// A void between a solid partition and its successor.
    Gap {
        /// Partition before the void.
        before: Partition,
        /// Partition after the void.
        after: Partition,
        /// Length of the void.
        length: f64,
        /// Midpoint of the void in model space.
        mid: Point3,
    },
    /// A solid partition contiguous with a following air partition.
    AdjacentAir {
        /// The solid partition.
        solid: Partition,
        /// The air partition.
        air: Partition,
    },
    /// An air partition at the head of the ray's partition list.
    FirstAir {
        /// The air partition.
        air: Partition,
    },
    /// An air partition at the tail of the ray's partition list.
    LastAir {
        /// The air partition.
        air: Partition,
    },
    /// An air partition with no contiguous solid neighbor on either side.
    UnconfirmedAir {
        /// The air partition.
        air: Partition,
        /// Partition before it, if any.
        before: Option<Partition>,
        /// Partition after it, if any.
        after: Option<Partition>,
    },
    /// An air partition reaching the model's outer boundary on the ray.
    ExposedAir {
        /// The air partition.
        air: Partition,
        /// Nearest solid boundary distance toward the model, if any.
        solid_boundary: Option<f64>,
    },
}

/// Classify one ray's ordered partition list.
///
/// `emit` is called once per event, in ray-parametric order. The
/// partition list must be ordered by increasing `t_in`, as the kernel
/// guarantees.
pub fn classify(
    ray: &Ray,
    parts: &[Partition],
    opts: &ClassifyOptions,
    mut emit: impl FnMut(Event),
) {
    let n = parts.len();
    for i in 0..n {
        let p = parts[i];
        if i == 0 {
            if p.air {
                emit(Event::FirstAir { air: p });
            }
        } else {
            let prev = parts[i - 1];
            let depth = prev.overlap_depth(&p);
            if depth > opts.overlap_tol && prev.region != p.region && !prev.air && !p.air {
                let lo = p.t_in;
                let hi = prev.t_out.min(p.t_out);
                emit(Event::Overlap {
                    a: prev,
                    b: p,
                    depth,
                    mid: ray.at((lo + hi) / 2.0),
                });
            }
            let gap = p.t_in - prev.t_out;
            if opts.use_air && !prev.air && gap > opts.dist_tol {
                emit(Event::Gap {
                    before: prev,
                    after: p,
                    length: gap,
                    mid: ray.at((prev.t_out + p.t_in) / 2.0),
                });
            }
            if opts.use_air && !prev.air && p.air && gap.abs() <= opts.dist_tol {
                emit(Event::AdjacentAir { solid: prev, air: p });
            }
        }
        if p.air && opts.use_air {
            let solid_before = i > 0
                && !parts[i - 1].air
                && (p.t_in - parts[i - 1].t_out).abs() <= opts.dist_tol;
            let solid_after = i + 1 < n
                && !parts[i + 1].air
                && (parts[i + 1].t_in - p.t_out).abs() <= opts.dist_tol;
            if !solid_before && !solid_after {
                emit(Event::UnconfirmedAir {
                    air: p,
                    before: if i > 0 { Some(parts[i - 1]) } else { None },
                    after: parts.get(i + 1).copied(),
                });
            }
            if i == 0 {
                // Reaches the exterior on the entry side.
                emit(Event::ExposedAir {
                    air: p,
                    solid_boundary: parts[i + 1..]
                        .iter()
                        .find(|q| !q.air)
                        .map(|q| q.t_in),
                });
            }
            if i == n - 1 {
                if i != 0 {
                    emit(Event::ExposedAir {
                        air: p,
                        solid_boundary: parts[..i]
                            .iter()
                            .rev()
                            .find(|q| !q.air)
                            .map(|q| q.t_out),
                    });
                }
                emit(Event::LastAir { air: p });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raygauge_math::Vec3;
    use raygauge_trace::RegionId;

    fn ray() -> Ray {
        Ray::new(Point3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0))
    }

    fn part(t_in: f64, t_out: f64, region: u32, air: bool) -> Partition {
        Partition {
            t_in,
            t_out,
            region: RegionId(region),
            air,
        }
    }

    fn collect(parts: &[Partition], opts: &ClassifyOptions) -> Vec<Event> {
        let mut events = Vec::new();
        classify(&ray(), parts, opts, |e| events.push(e));
        events
    }

    #[test]
    fn test_overlap_detected_with_depth() {
        let parts = [part(0.0, 2.0, 0, false), part(1.0, 3.0, 1, false)];
        let events = collect(&parts, &ClassifyOptions::default());
        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::Overlap { depth, mid, .. } => {
                assert!((depth - 1.0).abs() < 1e-12);
                assert!((mid.x - 1.5).abs() < 1e-12);
            }
            other => panic!("expected overlap, got {other:?}"),
        }
    }

    #[test]
    fn test_same_region_never_overlaps() {
        let parts = [part(0.0, 2.0, 0, false), part(1.0, 3.0, 0, false)];
        assert!(collect(&parts, &ClassifyOptions::default()).is_empty());
    }

    #[test]
    fn test_overlap_below_tolerance_ignored() {
        let parts = [part(0.0, 1.0 + 1e-8, 0, false), part(1.0, 3.0, 1, false)];
        assert!(collect(&parts, &ClassifyOptions::default()).is_empty());
    }

    #[test]
    fn test_gap_requires_air_tracking() {
        let parts = [part(0.0, 1.0, 0, false), part(2.0, 3.0, 1, false)];
        assert!(collect(&parts, &ClassifyOptions::default()).is_empty());
        let opts = ClassifyOptions {
            use_air: true,
            ..Default::default()
        };
        let events = collect(&parts, &opts);
        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::Gap { length, mid, .. } => {
                assert!((length - 1.0).abs() < 1e-12);
                assert!((mid.x - 1.5).abs() < 1e-12);
            }
            other => panic!("expected gap, got {other:?}"),
        }
    }

    #[test]
    fn test_air_sequence_events() {
        // air | solid | air: first air is exposed, trailing air is
        // contiguous with solid and therefore confirmed but exposed.
        let opts = ClassifyOptions {
            use_air: true,
            ..Default::default()
        };
        let parts = [
            part(0.0, 1.0, 2, true),
            part(1.0, 2.0, 0, false),
            part(2.0, 3.0, 2, true),
        ];
        let events = collect(&parts, &opts);
        let kinds: Vec<&str> = events
            .iter()
            .map(|e| match e {
                Event::FirstAir { .. } => "first",
                Event::ExposedAir { .. } => "exposed",
                Event::AdjacentAir { .. } => "adjacent",
                Event::LastAir { .. } => "last",
                Event::UnconfirmedAir { .. } => "unconfirmed",
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(kinds, ["first", "exposed", "adjacent", "exposed", "last"]);
    }

    #[test]
    fn test_unconfirmed_air_needs_void_on_both_sides() {
        let opts = ClassifyOptions {
            use_air: true,
            ..Default::default()
        };
        // solid | void | air | void | solid
        let floating = [
            part(0.0, 1.0, 0, false),
            part(1.5, 2.5, 2, true),
            part(3.0, 4.0, 1, false),
        ];
        let events = collect(&floating, &opts);
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::UnconfirmedAir { .. })));
        assert!(!events.iter().any(|e| matches!(e, Event::ExposedAir { .. })));

        // solid | air | solid, all contiguous: the air is confirmed.
        let confirmed = [
            part(0.0, 1.0, 0, false),
            part(1.0, 2.0, 2, true),
            part(2.0, 3.0, 1, false),
        ];
        let events = collect(&confirmed, &opts);
        assert!(!events
            .iter()
            .any(|e| matches!(e, Event::UnconfirmedAir { .. })));
    }

    #[test]
    fn test_classification_is_deterministic() {
        let opts = ClassifyOptions {
            use_air: true,
            ..Default::default()
        };
        let parts = [
            part(0.0, 1.0, 2, true),
            part(0.5, 2.0, 0, false),
            part(2.5, 3.0, 1, false),
            part(3.0, 4.0, 2, true),
        ];
        let first = collect(&parts, &opts);
        let second = collect(&parts, &opts);
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_and_single_lists() {
        let opts = ClassifyOptions {
            use_air: true,
            ..Default::default()
        };
        assert!(collect(&[], &opts).is_empty());
        let solo_air = [part(0.0, 1.0, 2, true)];
        let events = collect(&solo_air, &opts);
        // Head and tail at once: first, unconfirmed, exposed, last.
        assert!(events.iter().any(|e| matches!(e, Event::FirstAir { .. })));
        assert!(events.iter().any(|e| matches!(e, Event::LastAir { .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::UnconfirmedAir { .. })));
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, Event::ExposedAir { .. }))
                .count(),
            1
        );
    }
}
