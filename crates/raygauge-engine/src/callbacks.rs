//! Registration and dispatch of diagnostic callbacks.
//!
//! One optional handler slot per event class. Context travels by
//! closure capture rather than an opaque pointer. Handlers run
//! synchronously on whichever worker thread processed the ray, so they
//! must be reentrant when more than one worker is configured.

use crate::classify::Event;
use raygauge_trace::Ray;

type Handler = Box<dyn Fn(&Ray, &Event) + Send + Sync>;

/// The engine's table of diagnostic callback slots.
///
/// Unset slots are no-ops. Slots are filled with the builder-style
/// `on_*` methods:
///
/// ```
/// use raygauge_engine::DiagnosticCallbacks;
///
/// let callbacks = DiagnosticCallbacks::new()
///     .on_overlap(|_ray, event| eprintln!("overlap: {event:?}"));
/// ```
#[derive(Default)]
pub struct DiagnosticCallbacks {
    overlap: Option<Handler>,
    gap: Option<Handler>,
    adjacent_air: Option<Handler>,
    first_air: Option<Handler>,
    last_air: Option<Handler>,
    unconfirmed_air: Option<Handler>,
    exposed_air: Option<Handler>,
}

impl DiagnosticCallbacks {
    /// An empty table; every event is a no-op.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the overlap handler.
    pub fn on_overlap(mut self, f: impl Fn(&Ray, &Event) + Send + Sync + 'static) -> Self {
        self.overlap = Some(Box::new(f));
        self
    }

    /// Register the gap handler.
    pub fn on_gap(mut self, f: impl Fn(&Ray, &Event) + Send + Sync + 'static) -> Self {
        self.gap = Some(Box::new(f));
        self
    }

    /// Register the adjacent-air handler.
    pub fn on_adjacent_air(mut self, f: impl Fn(&Ray, &Event) + Send + Sync + 'static) -> Self {
        self.adjacent_air = Some(Box::new(f));
        self
    }

    /// Register the first-air handler.
    pub fn on_first_air(mut self, f: impl Fn(&Ray, &Event) + Send + Sync + 'static) -> Self {
        self.first_air = Some(Box::new(f));
        self
    }

    /// Register the last-air handler.
    pub fn on_last_air(mut self, f: impl Fn(&Ray, &Event) + Send + Sync + 'static) -> Self {
        self.last_air = Some(Box::new(f));
        self
    }

    /// Register the unconfirmed-air handler.
    pub fn on_unconfirmed_air(mut self, f: impl Fn(&Ray, &Event) + Send + Sync + 'static) -> Self {
        self.unconfirmed_air = Some(Box::new(f));
        self
    }

    /// Register the exposed-air handler.
    pub fn on_exposed_air(mut self, f: impl Fn(&Ray, &Event) + Send + Sync + 'static) -> Self {
        self.exposed_air = Some(Box::new(f));
        self
    }

    /// Route an event to its slot, if registered.
    pub fn dispatch(&self, ray: &Ray, event: &Event) {
        let slot = match event {
            Event::Overlap { .. } => &self.overlap,
            Event::Gap { .. } => &self.gap,
            Event::AdjacentAir { .. } => &self.adjacent_air,
            Event::FirstAir { .. } => &self.first_air,
            Event::LastAir { .. } => &self.last_air,
            Event::UnconfirmedAir { .. } => &self.unconfirmed_air,
            Event::ExposedAir { .. } => &self.exposed_air,
        };
        if let Some(handler) = slot {
            handler(ray, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raygauge_math::{Point3, Vec3};
    use raygauge_trace::{Partition, RegionId};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn sample_event() -> Event {
        Event::FirstAir {
            air: Partition {
                t_in: 0.0,
                t_out: 1.0,
                region: RegionId(0),
                air: true,
            },
        }
    }

    #[test]
    fn test_unset_slot_is_noop() {
        let callbacks = DiagnosticCallbacks::new();
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vec3::x());
        callbacks.dispatch(&ray, &sample_event());
    }

    #[test]
    fn test_dispatch_routes_to_matching_slot() {
        let first_hits = Arc::new(AtomicUsize::new(0));
        let overlap_hits = Arc::new(AtomicUsize::new(0));
        let fh = Arc::clone(&first_hits);
        let oh = Arc::clone(&overlap_hits);
        let callbacks = DiagnosticCallbacks::new()
            .on_first_air(move |_, _| {
                fh.fetch_add(1, Ordering::SeqCst);
            })
            .on_overlap(move |_, _| {
                oh.fetch_add(1, Ordering::SeqCst);
            });
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vec3::x());
        callbacks.dispatch(&ray, &sample_event());
        callbacks.dispatch(&ray, &sample_event());
        assert_eq!(first_hits.load(Ordering::SeqCst), 2);
        assert_eq!(overlap_hits.load(Ordering::SeqCst), 0);
    }
}
