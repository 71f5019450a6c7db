//! Headless tests over the data half of the renderer: fetch scheduling,
//! live poll cancellation, and the stale-generation guard. Draw systems
//! (gizmos/text) are exercised only through their pure helpers; these tests
//! drive the engine plugins plus [`OverlayPlugin`] with no renderer.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bevy::prelude::*;
use bevy::tasks::IoTaskPool;
use chrono::Utc;

use traffic::geo::GeoBounds;
use traffic::mode::{DisplayMode, SetMode};
use traffic::provider::{
    synthetic_segments, BackendError, DataSource, HistoricalPattern, ProviderHandle,
    TrafficBackend, TrafficDataProvider, TrafficIncident, TrafficSnapshot,
};
use traffic::selection::ZoneSelected;
use traffic::zone::{ZoneCatalogue, ZoneId};
use traffic::{RepaintRequested, TrafficPlugin, ViewGeneration};

use crate::overlay::{OverlayData, OverlayFetchTask, OverlayLayers, OverlayPlugin};

/// Backend that succeeds and counts calls per endpoint.
struct CountingBackend {
    live_calls: AtomicU32,
    historical_calls: AtomicU32,
}

impl CountingBackend {
    fn new() -> Self {
        Self {
            live_calls: AtomicU32::new(0),
            historical_calls: AtomicU32::new(0),
        }
    }
}

impl TrafficBackend for CountingBackend {
    fn fetch_live(&self, _zone: &ZoneId) -> Result<TrafficSnapshot, BackendError> {
        self.live_calls.fetch_add(1, Ordering::SeqCst);
        Ok(TrafficSnapshot {
            segments: synthetic_segments(40.0),
            incidents: Vec::new(),
            average_speed_kmh: 40.0,
            congestion_level: 50,
            taken_at: Utc::now(),
            source: DataSource::Synthetic,
        })
    }

    fn fetch_historical(
        &self,
        _zone: &ZoneId,
        time: chrono::DateTime<Utc>,
    ) -> Result<HistoricalPattern, BackendError> {
        self.historical_calls.fetch_add(1, Ordering::SeqCst);
        Ok(HistoricalPattern {
            segments: synthetic_segments(35.0),
            incidents: Vec::new(),
            average_speed_kmh: 35.0,
            congestion_level: 45,
            queried_at: time,
            raw_points: Vec::new(),
            source: DataSource::Synthetic,
        })
    }

    fn fetch_incidents(&self, _area: &str) -> Result<Vec<TrafficIncident>, BackendError> {
        Ok(Vec::new())
    }
}

fn test_app(backend: Arc<CountingBackend>) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(TrafficPlugin);
    app.add_plugins(OverlayPlugin);
    app.insert_resource(ProviderHandle(Arc::new(TrafficDataProvider::new(
        backend, true,
    ))));
    app.update();
    app
}

fn tick(app: &mut App, n: u32) {
    for _ in 0..n {
        app.world_mut().run_schedule(FixedUpdate);
        std::thread::yield_now();
    }
}

fn pump(app: &mut App, n: u32) {
    for _ in 0..n {
        app.update();
        std::thread::sleep(Duration::from_millis(2));
    }
}

fn pump_until(app: &mut App, max_updates: u32, mut pred: impl FnMut(&App) -> bool) -> bool {
    for _ in 0..max_updates {
        if pred(app) {
            return true;
        }
        app.update();
        std::thread::sleep(Duration::from_millis(2));
    }
    pred(app)
}

fn wait_for_catalogue(app: &mut App) {
    let loaded = pump_until(app, 200, |app| {
        !app.world().resource::<ZoneCatalogue>().is_empty()
    });
    assert!(loaded, "zone catalogue never loaded");
}

#[test]
fn live_mode_fetches_on_entry_and_every_interval_until_switched_away() {
    let backend = Arc::new(CountingBackend::new());
    let mut app = test_app(Arc::clone(&backend));
    wait_for_catalogue(&mut app);

    app.world_mut()
        .send_event(ZoneSelected(ZoneId::new("dxb-001")));
    app.world_mut().send_event(SetMode(DisplayMode::Live));
    let entered = pump_until(&mut app, 100, |_| {
        backend.live_calls.load(Ordering::SeqCst) >= 1
    });
    assert!(entered, "entering live mode must render immediately");
    let after_entry = backend.live_calls.load(Ordering::SeqCst);

    // One poll interval elapses: exactly one more live fetch.
    tick(&mut app, traffic::mode::LivePollTimer::INTERVAL);
    let refreshed = pump_until(&mut app, 100, |_| {
        backend.live_calls.load(Ordering::SeqCst) > after_entry
    });
    assert!(refreshed, "live poll interval must refresh the overlay");

    // Switch away; the live timer is cancelled.
    app.world_mut().send_event(SetMode(DisplayMode::Historical));
    let switched = pump_until(&mut app, 100, |_| {
        backend.historical_calls.load(Ordering::SeqCst) >= 1
    });
    assert!(switched, "mode switch repaints in the new mode");

    // Let any fetch issued before the switch finish before baselining.
    pump(&mut app, 5);
    let live_after_switch = backend.live_calls.load(Ordering::SeqCst);
    tick(&mut app, traffic::mode::LivePollTimer::INTERVAL * 2);
    pump(&mut app, 10);
    assert_eq!(
        backend.live_calls.load(Ordering::SeqCst),
        live_after_switch,
        "no live fetch may occur after switching away from live mode"
    );
}

#[test]
fn overlay_builds_from_selection() {
    let backend = Arc::new(CountingBackend::new());
    let mut app = test_app(Arc::clone(&backend));
    wait_for_catalogue(&mut app);

    app.world_mut()
        .send_event(ZoneSelected(ZoneId::new("dxb-001")));
    let built = pump_until(&mut app, 100, |app| {
        app.world().resource::<OverlayLayers>().source.is_some()
    });
    assert!(built, "selection must produce an overlay");

    let layers = app.world().resource::<OverlayLayers>();
    assert_eq!(layers.flow.len(), 4, "four canonical segments");
    assert_eq!(layers.speeds.len(), 4);
    assert_eq!(layers.incidents.len(), 2, "synthetic incidents when none supplied");
    assert!(layers.heat.len() >= 8, "two heat points per inflated segment");
    assert!(layers.bounds.is_some());
}

#[test]
fn stale_generation_results_are_dropped() {
    let backend = Arc::new(CountingBackend::new());
    let mut app = test_app(Arc::clone(&backend));
    wait_for_catalogue(&mut app);

    app.world_mut()
        .send_event(ZoneSelected(ZoneId::new("dxb-001")));
    let built = pump_until(&mut app, 100, |app| {
        app.world().resource::<OverlayLayers>().source.is_some()
    });
    assert!(built);
    let congestion_before = app.world().resource::<OverlayLayers>().congestion_level;

    // Hand-roll a completed fetch from a previous generation carrying a
    // conspicuous congestion level.
    let stale_generation = app
        .world()
        .resource::<ViewGeneration>()
        .current()
        .wrapping_sub(1);
    let task = IoTaskPool::get().spawn(async move {
        OverlayData {
            segments: synthetic_segments(20.0),
            incidents: Vec::new(),
            average_speed_kmh: 20.0,
            congestion_level: 99,
            source: DataSource::Live,
        }
    });
    app.world_mut().spawn(OverlayFetchTask {
        generation: stale_generation,
        mode: DisplayMode::Historical,
        bounds: GeoBounds::new(25.0, 55.0, 25.2, 55.3),
        zone_center: None,
        task,
    });

    let drained = pump_until(&mut app, 100, |app| {
        app.world()
            .iter_entities()
            .filter(|e| e.contains::<OverlayFetchTask>())
            .count()
            == 0
    });
    assert!(drained, "stale task must be collected and despawned");
    assert_eq!(
        app.world().resource::<OverlayLayers>().congestion_level,
        congestion_before,
        "a stale result must not repaint over newer state"
    );
}

#[test]
fn repaint_without_selection_blanks_the_overlay() {
    let backend = Arc::new(CountingBackend::new());
    let mut app = test_app(backend);
    wait_for_catalogue(&mut app);

    app.world_mut().send_event(RepaintRequested::default());
    app.update();
    let layers = app.world().resource::<OverlayLayers>();
    assert!(layers.source.is_none());
    assert!(layers.flow.is_empty());
}

#[test]
fn dispose_clears_overlay_and_tasks() {
    let backend = Arc::new(CountingBackend::new());
    let mut app = test_app(backend);
    wait_for_catalogue(&mut app);

    app.world_mut()
        .send_event(ZoneSelected(ZoneId::new("dxb-001")));
    let built = pump_until(&mut app, 100, |app| {
        app.world().resource::<OverlayLayers>().source.is_some()
    });
    assert!(built);

    app.world_mut().send_event(traffic::lifecycle::DisposeView);
    let cleared = pump_until(&mut app, 20, |app| {
        app.world().resource::<OverlayLayers>().source.is_none()
    });
    assert!(cleared, "disposal must blank the overlay");
}
