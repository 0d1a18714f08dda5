use std::collections::BTreeMap;

use foundation::math::Vec2;
use foundation::time::Time;
use formats::{FlowKind, PathSpec};
use runtime::frame::{DEFAULT_DT_CAP_S, FrameClock};

use crate::path::PathIndex;

pub const DEFAULT_ENTITIES_PER_PATH: usize = 5;
pub const DEFAULT_SPEED_MPS: f64 = 8.0;
pub const MIN_SPEED_MPS: f64 = 0.1;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u32);

/// A vehicle bound to a path by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub kind: FlowKind,
    pub path: String,
    /// Travelled distance, kept in `[0, total)` of its path.
    pub distance_m: f64,
    pub speed_mps: f64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EntityPose {
    pub id: EntityId,
    pub kind: FlowKind,
    /// Anchor-centred meters.
    pub position: Vec2,
    pub heading_rad: f64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AnimatorOptions {
    pub entities_per_path: usize,
    pub default_speed_mps: f64,
    pub dt_cap_s: f64,
}

impl Default for AnimatorOptions {
    fn default() -> Self {
        Self {
            entities_per_path: DEFAULT_ENTITIES_PER_PATH,
            default_speed_mps: DEFAULT_SPEED_MPS,
            dt_cap_s: DEFAULT_DT_CAP_S,
        }
    }
}

/// Cyclic vehicle simulation over a set of named paths.
///
/// Entities reference paths by id. Removing a path leaves its entities in
/// place; they are skipped until a path with the same id is inserted again.
#[derive(Debug, Clone)]
pub struct EntityAnimator {
    paths: BTreeMap<String, PathIndex>,
    entities: Vec<Entity>,
    clock: FrameClock,
    options: AnimatorOptions,
    next_id: u32,
}

impl EntityAnimator {
    pub fn new(options: AnimatorOptions) -> Self {
        Self {
            paths: BTreeMap::new(),
            entities: Vec::new(),
            clock: FrameClock::new(options.dt_cap_s),
            options,
            next_id: 0,
        }
    }

    /// Index every path and spawn `entities_per_path` vehicles on each.
    /// Paths that cannot be indexed get no entities.
    pub fn from_paths(paths: &[PathSpec], options: AnimatorOptions) -> Self {
        let mut animator = Self::new(options);
        for spec in paths {
            if animator.paths.contains_key(&spec.id) {
                tracing::warn!(path = %spec.id, "skipping path with a duplicate id");
                continue;
            }
            let Some(index) = PathIndex::planar(spec.points.clone()) else {
                tracing::debug!(path = %spec.id, "skipping path with fewer than two points");
                continue;
            };
            animator.insert_path(spec.id.clone(), index);
            let speed = spec.speed_mps.unwrap_or(options.default_speed_mps);
            animator.spawn_on_path(&spec.id, spec.kind, options.entities_per_path, speed);
        }
        tracing::debug!(
            paths = animator.paths.len(),
            entities = animator.entities.len(),
            "animator ready"
        );
        animator
    }

    pub fn options(&self) -> &AnimatorOptions {
        &self.options
    }

    /// Install `index` under `id` and return the path it replaced.
    ///
    /// Entities bound to `id` keep their phase: on replacement their
    /// distances are rescaled to the new length, and all of them are wrapped
    /// into `[0, total)`.
    pub fn insert_path(&mut self, id: impl Into<String>, index: PathIndex) -> Option<PathIndex> {
        let id = id.into();
        let scale = match self.paths.get(&id) {
            Some(old) if !old.is_degenerate() => index.total_length() / old.total_length(),
            _ => 1.0,
        };
        for entity in self.entities.iter_mut().filter(|e| e.path == id) {
            entity.distance_m = index.wrap(entity.distance_m * scale);
        }
        self.paths.insert(id, index)
    }

    pub fn remove_path(&mut self, id: &str) -> Option<PathIndex> {
        self.paths.remove(id)
    }

    pub fn path(&self, id: &str) -> Option<&PathIndex> {
        self.paths.get(id)
    }

    /// Spawn `count` entities on `path`, phased at `i / count` of its length.
    /// Returns the new ids; empty if the path is unknown.
    pub fn spawn_on_path(
        &mut self,
        path: &str,
        kind: FlowKind,
        count: usize,
        speed_mps: f64,
    ) -> Vec<EntityId> {
        let Some(index) = self.paths.get(path) else {
            return Vec::new();
        };
        let total = index.total_length();
        let speed_mps = if speed_mps.is_finite() {
            speed_mps.max(MIN_SPEED_MPS)
        } else {
            self.options.default_speed_mps.max(MIN_SPEED_MPS)
        };

        let mut ids = Vec::with_capacity(count);
        for i in 0..count {
            let id = EntityId(self.next_id);
            self.next_id += 1;
            self.entities.push(Entity {
                id,
                kind,
                path: path.to_string(),
                distance_m: i as f64 / count as f64 * total,
                speed_mps,
            });
            ids.push(id);
        }
        ids
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Whether any entity is bound to an existing path.
    pub fn is_active(&self) -> bool {
        self.entities.iter().any(|e| self.paths.contains_key(&e.path))
    }

    /// Advance by the clamped time since the previous tick and return poses.
    pub fn tick(&mut self, now: Time) -> Vec<EntityPose> {
        let frame = self.clock.advance(now);
        self.advance(frame.dt_s);
        self.poses()
    }

    /// Step every attached entity by `speed * dt_s`. Negative or non-finite
    /// steps are treated as zero.
    pub fn advance(&mut self, dt_s: f64) {
        let dt_s = if dt_s.is_finite() { dt_s.max(0.0) } else { 0.0 };
        for entity in &mut self.entities {
            let Some(index) = self.paths.get(&entity.path) else {
                continue;
            };
            entity.distance_m = index.wrap(entity.distance_m + entity.speed_mps * dt_s);
        }
    }

    /// Current poses of every attached entity.
    pub fn poses(&self) -> Vec<EntityPose> {
        self.entities
            .iter()
            .filter_map(|e| {
                let sample = self.paths.get(&e.path)?.sample(e.distance_m);
                Some(EntityPose {
                    id: e.id,
                    kind: e.kind,
                    position: sample.position,
                    heading_rad: sample.heading_rad,
                })
            })
            .collect()
    }

    /// Drop all entities and paths and forget the last timestamp.
    pub fn clear(&mut self) {
        self.paths.clear();
        self.entities.clear();
        self.clock.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::{AnimatorOptions, EntityAnimator, MIN_SPEED_MPS};
    use crate::path::PathIndex;
    use formats::{FlowKind, PathSpec};
    use foundation::math::Vec2;
    use foundation::time::Time;
    use pretty_assertions::assert_eq;

    fn straight(len: f64) -> PathIndex {
        PathIndex::planar(vec![Vec2::ZERO, Vec2::new(len, 0.0)]).expect("path")
    }

    fn distances(animator: &EntityAnimator) -> Vec<f64> {
        animator.entities().iter().map(|e| e.distance_m).collect()
    }

    #[test]
    fn staggers_initial_phases() {
        let mut animator = EntityAnimator::new(AnimatorOptions::default());
        animator.insert_path("inbound", straight(1.0));
        let ids = animator.spawn_on_path("inbound", FlowKind::Inbound, 5, 1.0);
        assert_eq!(ids.len(), 5);
        assert_eq!(distances(&animator), vec![0.0, 0.2, 0.4, 0.6, 0.8]);
    }

    #[test]
    fn advance_wraps_without_exceeding_total() {
        let mut animator = EntityAnimator::new(AnimatorOptions::default());
        animator.insert_path("p", straight(2.4));
        animator.spawn_on_path("p", FlowKind::Outbound, 1, 1.0);
        animator.advance(1.0);
        animator.advance(1.0);
        let d = animator.entities()[0].distance_m;
        assert!((d - 2.0).abs() < 1e-12, "{d}");

        animator.advance(1.0);
        let d = animator.entities()[0].distance_m;
        assert!((d - 0.6).abs() < 1e-12, "{d}");
    }

    #[test]
    fn tick_caps_dt() {
        let mut animator = EntityAnimator::new(AnimatorOptions {
            dt_cap_s: 0.05,
            ..AnimatorOptions::default()
        });
        animator.insert_path("p", straight(100.0));
        animator.spawn_on_path("p", FlowKind::Inbound, 1, 10.0);

        let first = animator.tick(Time(10.0));
        assert_eq!(first[0].position, Vec2::ZERO);

        // A five second gap is treated as one capped step.
        let second = animator.tick(Time(15.0));
        assert!((second[0].position.x - 0.5).abs() < 1e-9);

        // Time going backwards does not move anything.
        let third = animator.tick(Time(14.0));
        assert!((third[0].position.x - 0.5).abs() < 1e-9);
    }

    #[test]
    fn speed_is_frame_rate_independent() {
        let mut coarse = EntityAnimator::new(AnimatorOptions::default());
        coarse.insert_path("p", straight(100.0));
        coarse.spawn_on_path("p", FlowKind::Inbound, 1, 4.0);
        let mut fine = coarse.clone();

        for i in 0..=10 {
            coarse.tick(Time(f64::from(i) * 0.04));
        }
        for i in 0..=40 {
            fine.tick(Time(f64::from(i) * 0.01));
        }
        let a = coarse.entities()[0].distance_m;
        let b = fine.entities()[0].distance_m;
        assert!((a - 1.6).abs() < 1e-9 && (b - 1.6).abs() < 1e-9, "{a} {b}");
    }

    #[test]
    fn missing_paths_are_skipped_then_reattached() {
        let mut animator = EntityAnimator::new(AnimatorOptions::default());
        animator.insert_path("p", straight(10.0));
        animator.spawn_on_path("p", FlowKind::Inbound, 2, 1.0);

        let removed = animator.remove_path("p").expect("path existed");
        assert!(!animator.is_active());
        animator.advance(1.0);
        assert_eq!(animator.entities().len(), 2);
        assert!(animator.poses().is_empty());
        assert_eq!(distances(&animator), vec![0.0, 5.0]);

        animator.insert_path("p", removed);
        animator.advance(1.0);
        assert_eq!(distances(&animator), vec![1.0, 6.0]);
        assert_eq!(animator.poses().len(), 2);
    }

    #[test]
    fn replacing_a_path_keeps_entities_staggered() {
        let mut animator = EntityAnimator::new(AnimatorOptions::default());
        animator.insert_path("truck-inbound", straight(100.0));
        animator.spawn_on_path("truck-inbound", FlowKind::Inbound, 5, 1.0);

        let old = animator.insert_path("truck-inbound", straight(10.0));
        assert!(old.is_some());
        let total = animator.path("truck-inbound").expect("path").total_length();
        for (d, want) in distances(&animator).into_iter().zip([0.0, 2.0, 4.0, 6.0, 8.0]) {
            assert!((d - want).abs() < 1e-9, "{d} vs {want}");
            assert!(d < total);
        }
    }

    #[test]
    fn from_paths_keeps_the_first_of_duplicate_ids() {
        let spec = |len: f64| PathSpec {
            id: "truck-inbound".into(),
            kind: FlowKind::Inbound,
            points: vec![Vec2::ZERO, Vec2::new(len, 0.0)],
            speed_mps: None,
        };
        let paths = [spec(100.0), spec(10.0)];
        let animator = EntityAnimator::from_paths(&paths, AnimatorOptions::default());
        assert_eq!(animator.entities().len(), 5);
        assert_eq!(animator.path("truck-inbound").expect("path").total_length(), 100.0);
        assert_eq!(distances(&animator), vec![0.0, 20.0, 40.0, 60.0, 80.0]);
    }

    #[test]
    fn spawn_on_unknown_path_is_empty() {
        let mut animator = EntityAnimator::new(AnimatorOptions::default());
        assert!(animator.spawn_on_path("nope", FlowKind::Inbound, 3, 1.0).is_empty());
        assert!(animator.entities().is_empty());
    }

    #[test]
    fn from_paths_uses_per_path_speed() {
        let paths = vec![
            PathSpec {
                id: "truck-inbound".into(),
                kind: FlowKind::Inbound,
                points: vec![Vec2::new(-50.0, 0.0), Vec2::new(50.0, 0.0)],
                speed_mps: None,
            },
            PathSpec {
                id: "slow".into(),
                kind: FlowKind::Outbound,
                points: vec![Vec2::new(0.0, 0.0), Vec2::new(0.0, 10.0)],
                speed_mps: Some(0.01),
            },
        ];
        let animator = EntityAnimator::from_paths(
            &paths,
            AnimatorOptions {
                entities_per_path: 3,
                ..AnimatorOptions::default()
            },
        );
        assert_eq!(animator.entities().len(), 6);
        assert!(animator.entities()[..3].iter().all(|e| e.speed_mps == 8.0));
        assert!(animator.entities()[3..].iter().all(|e| e.speed_mps == MIN_SPEED_MPS));

        let poses = animator.poses();
        assert_eq!(poses[0].position, Vec2::new(-50.0, 0.0));
        assert!((poses[3].heading_rad - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn clear_drops_everything() {
        let mut animator = EntityAnimator::new(AnimatorOptions::default());
        animator.insert_path("p", straight(10.0));
        animator.spawn_on_path("p", FlowKind::Inbound, 5, 1.0);
        animator.clear();
        assert!(animator.entities().is_empty());
        assert!(!animator.is_active());
    }
}
