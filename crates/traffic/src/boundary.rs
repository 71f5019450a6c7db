//! Zone boundary polygons and their derived bounds.
//!
//! Boundary fetches are fire-and-forget concurrent: one `IoTaskPool` task
//! per zone, no cap, no cross-zone coordination. Each completion mutates
//! only its own cache entries, so zones resolve (and become drawable) in
//! whatever order their fetches land. A failed fetch simply never renders
//! that zone's polygon.
//!
//! Invariant: a [`BoundsCache`] entry exists only after its boundary fetch
//! has completed — absence means "not yet rendered".

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bevy::prelude::*;
use bevy::tasks::{block_on, IoTaskPool, Task};

use crate::geo::{GeoBounds, ZoneBoundary};
use crate::lifecycle::ViewLifecycle;
use crate::zone::{SourceError, ZoneCatalogue, ZoneId, ZoneSourceHandle};

/// Session cache of fetched boundary polygons, keyed by zone id.
#[derive(Resource, Default)]
pub struct BoundaryCache(pub HashMap<ZoneId, ZoneBoundary>);

/// Rectangular envelopes derived from fetched boundaries.
#[derive(Resource, Default)]
pub struct BoundsCache(pub HashMap<ZoneId, GeoBounds>);

/// Zones whose boundary fetch failed; remembered so we do not refetch every
/// frame. Cleared on manual reload to give the user a retry path.
#[derive(Resource, Default)]
pub struct BoundaryFailures(pub HashSet<ZoneId>);

/// In-flight boundary fetch for one zone.
#[derive(Component)]
pub struct BoundaryFetchTask {
    pub zone_id: ZoneId,
    task: Task<Result<ZoneBoundary, SourceError>>,
}

/// A zone's boundary arrived and the zone is now drawable.
#[derive(Event, Debug, Clone)]
pub struct BoundaryReady(pub ZoneId);

/// Update: issue one fetch per catalogue zone that has no cached boundary,
/// no remembered failure, and no in-flight task.
pub fn request_missing_boundaries(
    mut commands: Commands,
    lifecycle: Res<ViewLifecycle>,
    catalogue: Res<ZoneCatalogue>,
    cache: Res<BoundaryCache>,
    failures: Res<BoundaryFailures>,
    inflight: Query<&BoundaryFetchTask>,
    source: Res<ZoneSourceHandle>,
) {
    if lifecycle.disposed {
        return;
    }
    let inflight_ids: HashSet<&ZoneId> = inflight.iter().map(|t| &t.zone_id).collect();
    for zone in &catalogue.zones {
        if cache.0.contains_key(&zone.id)
            || failures.0.contains(&zone.id)
            || inflight_ids.contains(&zone.id)
        {
            continue;
        }
        let source = Arc::clone(&source.0);
        let zone_id = zone.id.clone();
        let fetch_id = zone_id.clone();
        let task = IoTaskPool::get().spawn(async move { source.boundary(&fetch_id) });
        commands.spawn(BoundaryFetchTask { zone_id, task });
    }
}

/// Update: poll in-flight fetches; completions land independently, in any
/// order.
pub fn collect_boundaries(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut BoundaryFetchTask)>,
    mut cache: ResMut<BoundaryCache>,
    mut bounds: ResMut<BoundsCache>,
    mut failures: ResMut<BoundaryFailures>,
    mut ready: EventWriter<BoundaryReady>,
) {
    for (entity, mut pending) in &mut tasks {
        let Some(result) = block_on(futures_lite::future::poll_once(&mut pending.task)) else {
            continue;
        };
        let zone_id = pending.zone_id.clone();
        match result {
            Ok(boundary) => match boundary.bounds() {
                Some(envelope) => {
                    // Boundary and bounds are inserted together, so a bounds
                    // entry always implies a completed fetch.
                    cache.0.insert(zone_id.clone(), boundary);
                    bounds.0.insert(zone_id.clone(), envelope);
                    ready.send(BoundaryReady(zone_id));
                }
                None => {
                    debug!("boundary for {zone_id} is empty; skipping");
                    failures.0.insert(zone_id);
                }
            },
            Err(err) => {
                debug!("boundary fetch for {zone_id} failed: {err}");
                failures.0.insert(zone_id);
            }
        }
        commands.entity(entity).despawn();
    }
}

pub struct BoundaryPlugin;

impl Plugin for BoundaryPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<BoundaryCache>()
            .init_resource::<BoundsCache>()
            .init_resource::<BoundaryFailures>()
            .add_event::<BoundaryReady>()
            .add_systems(Update, (request_missing_boundaries, collect_boundaries));
    }
}
