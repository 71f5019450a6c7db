//! TestView — headless integration test harness for the traffic engine.
//!
//! Wraps `bevy::app::App` + [`TrafficPlugin`] with no window or renderer.
//! Periodic behavior is driven deterministically by executing the
//! `FixedUpdate` schedule directly ([`TestView::tick`]); async task results
//! are drained by pumping full updates ([`TestView::pump`]).

use std::sync::Arc;
use std::time::Duration;

use bevy::app::App;
use bevy::prelude::*;

use crate::clock::TimeScrubbed;
use crate::lifecycle::DisposeView;
use crate::mode::{DisplayMode, SetMode};
use crate::provider::{ProviderHandle, TrafficDataProvider};
use crate::selection::ZoneSelected;
use crate::zone::{ZoneCatalogue, ZoneId, ZoneSource, ZoneSourceHandle};
use crate::TrafficPlugin;

pub struct TestView {
    pub app: App,
}

impl TestView {
    /// Build the app without running startup; inject mocks first, then call
    /// [`TestView::start`].
    pub fn new() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(TrafficPlugin);
        Self { app }
    }

    /// Replace the traffic provider before startup.
    pub fn with_provider(mut self, provider: TrafficDataProvider) -> Self {
        self.app.insert_resource(ProviderHandle(Arc::new(provider)));
        self
    }

    /// Replace the zone source before startup.
    pub fn with_zone_source(mut self, source: Arc<dyn ZoneSource>) -> Self {
        self.app.insert_resource(ZoneSourceHandle(source));
        self
    }

    /// Run startup systems (issues the initial zone list fetch).
    pub fn start(mut self) -> Self {
        self.app.update();
        self
    }

    // -----------------------------------------------------------------------
    // Driving
    // -----------------------------------------------------------------------

    /// Run N fixed-update ticks by executing the schedule directly; this
    /// bypasses wall-clock time entirely, so 150 ticks are always "15 s".
    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            self.app.world_mut().run_schedule(FixedUpdate);
            std::thread::yield_now();
        }
    }

    /// Run N full updates with a small sleep so task-pool work can land.
    pub fn pump(&mut self, n: u32) {
        for _ in 0..n {
            self.app.update();
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    /// Pump updates until the predicate holds; returns whether it ever did.
    pub fn pump_until(&mut self, max_updates: u32, mut pred: impl FnMut(&App) -> bool) -> bool {
        for _ in 0..max_updates {
            if pred(&self.app) {
                return true;
            }
            self.app.update();
            std::thread::sleep(Duration::from_millis(2));
        }
        pred(&self.app)
    }

    /// Pump until the catalogue has zones; panics if it never fills.
    pub fn with_zones_loaded(mut self) -> Self {
        let loaded = self.pump_until(200, |app| {
            !app.world().resource::<ZoneCatalogue>().is_empty()
        });
        assert!(loaded, "zone catalogue never loaded");
        self
    }

    // -----------------------------------------------------------------------
    // Interactions
    // -----------------------------------------------------------------------

    pub fn select(&mut self, id: &str) {
        self.app
            .world_mut()
            .send_event(ZoneSelected(ZoneId::new(id)));
    }

    pub fn set_mode(&mut self, mode: DisplayMode) {
        self.app.world_mut().send_event(SetMode(mode));
    }

    pub fn scrub(&mut self, hour: u8) {
        self.app.world_mut().send_event(TimeScrubbed(hour));
    }

    pub fn dispose(&mut self) {
        self.app.world_mut().send_event(DisposeView);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn resource<R: Resource>(&self) -> &R {
        self.app.world().resource::<R>()
    }

    pub fn resource_mut<R: Resource>(&mut self) -> Mut<'_, R> {
        self.app.world_mut().resource_mut::<R>()
    }

    pub fn catalogue_len(&self) -> usize {
        self.resource::<ZoneCatalogue>().len()
    }
}
