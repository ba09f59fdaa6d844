//! Application wiring
//!
//! Pulls the plaza feed, lays communities and their people out on the
//! ground plane, drives the per-avatar asset loads (meshes plus the
//! composited face texture) and runs the fixed-cadence crowd tick. All
//! visual output crosses the [`SceneSink`] seam; the rendering engine on
//! the other side is not this crate's concern.

use std::sync::Arc;
use std::time::Duration;

use glam::Vec2;
use image::RgbaImage;
use rand::Rng;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::assets::{
    store::decode_inline_image, AssetId, AssetSource, AssetStore, DirAssetSource, HttpAssetSource,
    BEARD_MESH_BASE_ID, BODY_MESH_ID, HAIR_MESH_BASE_ID, HEAD_MESH_ID,
};
use crate::config::{LayoutSettings, PlazaSettings};
use crate::face::FaceCompositor;
use crate::plaza::{CommunityRecord, DescriptorDecoder, PlazaClient};
use crate::world::{Avatar, CrowdSeparation, PartKind};

/// Seam to the external rendering collaborator.
pub trait SceneSink: Send + Sync {
    fn apply_community_icon(&self, community_id: u64, icon: &RgbaImage);
    fn apply_face_texture(&self, avatar_id: Uuid, texture: &RgbaImage);
    fn update_transform(&self, avatar_id: Uuid, position: Vec2);
}

/// Headless sink: logs what a renderer would consume.
pub struct LoggingSink;

impl SceneSink for LoggingSink {
    fn apply_community_icon(&self, community_id: u64, icon: &RgbaImage) {
        info!(
            "community {} icon ready ({}x{})",
            community_id,
            icon.width(),
            icon.height()
        );
    }

    fn apply_face_texture(&self, avatar_id: Uuid, texture: &RgbaImage) {
        info!(
            "avatar {} face texture ready ({}x{})",
            avatar_id,
            texture.width(),
            texture.height()
        );
    }

    fn update_transform(&self, avatar_id: Uuid, position: Vec2) {
        debug!("avatar {} at ({:.2}, {:.2})", avatar_id, position.x, position.y);
    }
}

/// One completed per-avatar load: the mesh stage it unlocks, plus the face
/// texture when the stage is the composite.
struct LoadResult {
    avatar_index: usize,
    kind: PartKind,
    outcome: Result<Option<RgbaImage>, String>,
}

pub struct PlazaApp {
    settings: PlazaSettings,
    sink: Arc<dyn SceneSink>,
    decoder: Arc<dyn DescriptorDecoder>,
}

impl PlazaApp {
    pub fn new(
        settings: PlazaSettings,
        sink: Arc<dyn SceneSink>,
        decoder: Arc<dyn DescriptorDecoder>,
    ) -> Self {
        Self { settings, sink, decoder }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(self.settings.assets.fetch_timeout_ms))
            .build()?;

        let feed_url = Url::parse(&self.settings.data_source.feed_url)?;
        let client = PlazaClient::new(
            http.clone(),
            feed_url,
            Duration::from_millis(self.settings.data_source.poll_interval_ms),
            self.settings.data_source.max_poll_attempts,
        );
        let communities = client.poll_until_available().await?;

        for community in &communities {
            if community.icon.is_empty() {
                continue;
            }
            match decode_inline_image(&community.icon) {
                Ok(icon) => self.sink.apply_community_icon(community.id, &icon),
                Err(reason) => warn!("community {} icon undecodable: {reason}", community.id),
            }
        }

        let source: Arc<dyn AssetSource> = match &self.settings.assets.local_dir {
            Some(dir) => Arc::new(DirAssetSource::new(dir.clone())),
            None => {
                let base_url = Url::parse(&self.settings.assets.base_url)?;
                Arc::new(HttpAssetSource::new(http, base_url))
            }
        };
        let store = Arc::new(AssetStore::new(source));

        let mut rng = rand::rng();
        let mut avatars = build_avatars(
            &communities,
            &self.settings.layout,
            self.decoder.as_ref(),
            &mut rng,
        );
        info!("plaza populated with {} avatars", avatars.len());

        let mut loads = spawn_avatar_loads(&avatars, Arc::clone(&store));

        let crowd = CrowdSeparation {
            max_speed: self.settings.simulation.max_speed,
            arrival_radius: self.settings.simulation.arrival_radius,
            min_separation: self.settings.simulation.min_separation,
        };
        let mut ticker = tokio::time::interval(self.settings.simulation.tick_interval());

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    crowd.step(&mut avatars);
                    for avatar in avatars.iter().filter(|a| a.is_ready()) {
                        self.sink.update_transform(avatar.id, avatar.position);
                    }
                }
                Some(joined) = loads.join_next() => {
                    match joined {
                        Ok(result) => self.handle_load(&mut avatars, result),
                        Err(e) => warn!("load task died: {e}"),
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("shutting down");
                    break;
                }
            }
        }

        let stats = store.cache_stats().await;
        info!(
            "asset cache: {} entries, {:.1}% hit ratio",
            stats.cache_entries,
            stats.hit_ratio()
        );
        Ok(())
    }

    fn handle_load(&self, avatars: &mut [Avatar], result: LoadResult) {
        let avatar = &mut avatars[result.avatar_index];
        match result.outcome {
            Ok(texture) => {
                if let Some(texture) = texture {
                    self.sink.apply_face_texture(avatar.id, &texture);
                }
                avatar.attach_part(result.kind);
                if avatar.is_ready() {
                    debug!("avatar {} fully loaded", avatar.screen_name);
                }
            }
            Err(reason) => {
                // the avatar keeps running with the part missing
                warn!(
                    "avatar {} part {:?} failed to load: {reason}",
                    avatar.screen_name, result.kind
                );
            }
        }
    }
}

/// Place community anchors on a ring around the plaza center and scatter
/// each community's people on a smaller ring around their anchor.
fn build_avatars(
    communities: &[CommunityRecord],
    layout: &LayoutSettings,
    decoder: &dyn DescriptorDecoder,
    rng: &mut impl Rng,
) -> Vec<Avatar> {
    let mut avatars = Vec::new();
    let community_count = communities.len().max(1);

    for (index, community) in communities.iter().enumerate() {
        let angle = index as f32 / community_count as f32 * std::f32::consts::TAU;
        let anchor = Vec2::new(angle.cos(), angle.sin()) * layout.community_ring_radius;

        for person in community.people.iter().take(layout.max_people_per_community) {
            let descriptor = match decoder.decode(&person.descriptor_blob) {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    warn!("skipping `{}`: {e}", person.screen_name);
                    continue;
                }
            };
            let scatter = rng.random_range(0.0..std::f32::consts::TAU);
            let distance = layout.avatar_ring_radius * (1.0 + rng.random_range(0.0..1.0));
            let position = anchor + Vec2::new(scatter.cos(), scatter.sin()) * distance;
            avatars.push(Avatar::new(
                person.screen_name.clone(),
                descriptor,
                community.id,
                position,
                anchor,
            ));
        }
    }
    avatars
}

/// Kick off every asset load for every avatar. Each part is an independent
/// task; completion order is unconstrained.
fn spawn_avatar_loads(avatars: &[Avatar], store: Arc<AssetStore>) -> JoinSet<LoadResult> {
    let mut loads: JoinSet<LoadResult> = JoinSet::new();

    for (avatar_index, avatar) in avatars.iter().enumerate() {
        let mut mesh_parts = vec![
            (PartKind::Body, AssetId(BODY_MESH_ID)),
            (PartKind::Head, AssetId(HEAD_MESH_ID)),
            (PartKind::Hair, AssetId(HAIR_MESH_BASE_ID + avatar.descriptor.hair_type)),
        ];
        if avatar.descriptor.has_facial_hair() {
            mesh_parts.push((
                PartKind::Beard,
                AssetId(BEARD_MESH_BASE_ID + avatar.descriptor.beard_type),
            ));
        }

        for (kind, asset_id) in mesh_parts {
            let store = Arc::clone(&store);
            loads.spawn(async move {
                let outcome = store
                    .fetch_bytes(asset_id)
                    .await
                    .map(|_| None)
                    .map_err(|e| e.to_string());
                LoadResult { avatar_index, kind, outcome }
            });
        }

        let store = Arc::clone(&store);
        let descriptor = avatar.descriptor.clone();
        loads.spawn(async move {
            let compositor = FaceCompositor::new(store);
            let outcome = match compositor.composite_face(&descriptor).await {
                Ok(outcome) => {
                    for failure in &outcome.failures {
                        warn!(
                            "face feature {} omitted: {}",
                            failure.feature.name(),
                            failure.error
                        );
                    }
                    Ok(Some(outcome.texture))
                }
                Err(e) => Err(e.to_string()),
            };
            LoadResult { avatar_index, kind: PartKind::Face, outcome }
        });
    }

    loads
}
