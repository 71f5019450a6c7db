//! View disposal.
//!
//! Tearing down the zone view must cancel every timer and in-flight fetch
//! deterministically: the live poll, the animation loop, the periodic zone
//! reload, boundary fetches, and list fetches. A timer that keeps fetching
//! after the view is gone is a resource leak. The rendering crate listens
//! to the same [`DisposeView`] event to drop its own fetch tasks and clear
//! the overlay layers.

use bevy::prelude::*;

use crate::boundary::{BoundaryCache, BoundaryFailures, BoundaryFetchTask, BoundsCache};
use crate::clock::ViewClock;
use crate::mode::LivePollTimer;
use crate::selection::SelectedZone;
use crate::zone::{ZoneListTask, ZoneReloadTimer};
use crate::ViewGeneration;

/// Whether the zone view has been torn down. Periodic systems gate on this
/// and become no-ops afterwards.
#[derive(Resource, Default)]
pub struct ViewLifecycle {
    pub disposed: bool,
}

/// Tear down the zone view.
#[derive(Event, Default)]
pub struct DisposeView;

/// Update: dispose the view — stop all timers, drop all in-flight work,
/// clear session caches and selection.
#[allow(clippy::too_many_arguments)]
pub fn dispose_view(
    mut commands: Commands,
    mut events: EventReader<DisposeView>,
    mut lifecycle: ResMut<ViewLifecycle>,
    mut clock: ResMut<ViewClock>,
    mut poll: ResMut<LivePollTimer>,
    mut reload: ResMut<ZoneReloadTimer>,
    mut boundaries: ResMut<BoundaryCache>,
    mut bounds: ResMut<BoundsCache>,
    mut failures: ResMut<BoundaryFailures>,
    mut selected: ResMut<SelectedZone>,
    mut generation: ResMut<ViewGeneration>,
    boundary_tasks: Query<Entity, With<BoundaryFetchTask>>,
    list_tasks: Query<Entity, With<ZoneListTask>>,
) {
    if events.is_empty() {
        return;
    }
    events.clear();

    lifecycle.disposed = true;
    clock.animating = false;
    clock.counter = 0;
    poll.counter = 0;
    reload.counter = 0;

    // Dropping a task cancels it.
    for entity in &boundary_tasks {
        commands.entity(entity).despawn();
    }
    for entity in &list_tasks {
        commands.entity(entity).despawn();
    }

    boundaries.0.clear();
    bounds.0.clear();
    failures.0.clear();
    selected.0 = None;
    generation.bump();
    info!("zone view disposed");
}

pub struct LifecyclePlugin;

impl Plugin for LifecyclePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ViewLifecycle>()
            .add_event::<DisposeView>()
            .add_systems(Update, dispose_view);
    }
}
