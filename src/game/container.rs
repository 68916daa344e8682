//! Level Container
//!
//! Owns every body and visual a level creates, and the tag map the collision
//! router reads. A container is built whole by [`LevelContainer::load`] and
//! released whole by [`LevelContainer::teardown`], so nothing survives a
//! level change.

use std::collections::BTreeMap;

use tracing::debug;

use crate::core::math::{Quat, Vec3};
use crate::error::LevelFormatError;
use crate::game::config::GameConfig;
use crate::game::entity::{BodyTag, EnemyAgent, EntityId, Platform};
use crate::game::level::{LevelData, DEFAULT_PLATFORM_HEIGHT};
use crate::physics::{BodyDesc, BodyHandle, CollisionGroups, PhysicsWorld, Shape};
use crate::render::{Material, Scene};

/// A loaded level.
#[derive(Clone, Debug)]
pub struct LevelContainer {
    name: String,
    platforms: Vec<Platform>,
    enemies: BTreeMap<EntityId, EnemyAgent>,
    tags: BTreeMap<BodyHandle, BodyTag>,
    first: usize,
    goal: Option<usize>,
    elapsed: f32,
    enemy_speed: f32,
}

impl LevelContainer {
    /// Validate a descriptor and build it into the world and scene.
    ///
    /// Validation runs before anything is created, so on error the world and
    /// scene are untouched.
    pub fn load<W: PhysicsWorld, S: Scene>(
        world: &mut W,
        scene: &mut S,
        data: &LevelData,
        config: &GameConfig,
    ) -> Result<Self, LevelFormatError> {
        data.validate()?;
        let first = data.first_index().ok_or(LevelFormatError::MissingFirstPlatform)?;
        let material = Material::color(data.platform_rgb()?);

        let mut container = Self {
            name: data.name.clone(),
            platforms: Vec::with_capacity(data.platforms.len()),
            enemies: BTreeMap::new(),
            tags: BTreeMap::new(),
            first,
            goal: data.goal_index(),
            elapsed: 0.0,
            enemy_speed: config.enemy_speed,
        };

        for (index, desc) in data.platforms.iter().enumerate() {
            let id = EntityId(index as u32);
            let size = desc.size();
            let shape = Shape::cuboid(size.x, size.y, size.z);
            let origin = desc.origin();
            let motion = desc.motion(index)?;

            let body_desc = match motion {
                Some(_) => BodyDesc::kinematic(0.0, origin, shape),
                None => BodyDesc::fixed(origin, shape),
            };
            let body = world.create_body(body_desc.with_groups(CollisionGroups::platform()));
            world.add_body(body);

            let visual = scene.create_visual(&shape, material);
            scene.set_transform(visual, origin, Quat::IDENTITY);
            scene.add_visual(visual);

            let tag = if desc.is_final {
                BodyTag::Goal
            } else if desc.is_hazard {
                BodyTag::Hazard
            } else if desc.has_enemy {
                BodyTag::EnemyTrigger(id)
            } else {
                BodyTag::Ground
            };
            container.tags.insert(body, tag);

            if let BodyTag::EnemyTrigger(trigger) = tag {
                let enemy = spawn_enemy(world, scene, config, trigger, origin + Vec3::Y * config.enemy_spawn_lift);
                container.tags.insert(enemy.body, BodyTag::Hazard);
                container.enemies.insert(trigger, enemy);
            }

            container.platforms.push(Platform {
                id,
                body,
                visual,
                origin,
                size,
                tag,
                motion,
            });
        }

        if let Some(color) = data.background_rgb()? {
            scene.set_background(color);
        }

        debug!(
            "Loaded level {:?}: {} platforms, {} enemies",
            container.name,
            container.platforms.len(),
            container.enemies.len()
        );
        Ok(container)
    }

    /// Destroy every body and visual this level created.
    pub fn teardown<W: PhysicsWorld, S: Scene>(self, world: &mut W, scene: &mut S) {
        for platform in &self.platforms {
            world.destroy_body(platform.body);
            scene.destroy_visual(platform.visual);
        }
        for enemy in self.enemies.values() {
            world.destroy_body(enemy.body);
            scene.destroy_visual(enemy.visual);
        }
        debug!("Tore down level {:?}", self.name);
    }

    /// Advance level time: move platforms and steer active enemies.
    pub fn update<W: PhysicsWorld, S: Scene>(
        &mut self,
        dt: f32,
        player_position: Vec3,
        world: &mut W,
        scene: &mut S,
    ) {
        if dt <= 0.0 {
            return;
        }
        self.elapsed += dt;

        for platform in self.platforms.iter().filter(|p| p.is_moving()) {
            // Body and visual receive the same value.
            let position = platform.position_at(self.elapsed);
            world.set_position(platform.body, position);
            scene.set_transform(platform.visual, position, Quat::IDENTITY);
        }

        for enemy in self.enemies.values().filter(|e| e.active) {
            let Some(position) = world.position(enemy.body) else {
                continue;
            };
            let heading = (player_position - position).normalize_or_zero();
            world.set_velocity(enemy.body, heading * self.enemy_speed);
        }
    }

    /// Copy active enemy body positions onto their visuals.
    pub fn sync_visuals<W: PhysicsWorld, S: Scene>(&self, world: &W, scene: &mut S) {
        for enemy in self.enemies.values().filter(|e| e.active) {
            if let (Some(position), Some(orientation)) =
                (world.position(enemy.body), world.orientation(enemy.body))
            {
                scene.set_transform(enemy.visual, position, orientation);
            }
        }
    }

    /// Wake the enemy linked to a trigger platform. Returns `false` if there
    /// is none or it is already active.
    pub fn activate_enemy<W: PhysicsWorld, S: Scene>(
        &mut self,
        trigger: EntityId,
        world: &mut W,
        scene: &mut S,
    ) -> bool {
        let Some(enemy) = self.enemies.get_mut(&trigger) else {
            return false;
        };
        if enemy.active {
            return false;
        }
        world.set_position(enemy.body, enemy.spawn);
        world.set_velocity(enemy.body, Vec3::ZERO);
        world.add_body(enemy.body);
        scene.set_transform(enemy.visual, enemy.spawn, Quat::IDENTITY);
        scene.add_visual(enemy.visual);
        enemy.active = true;
        debug!("Enemy on platform {} activated", trigger.0);
        true
    }

    /// Put every enemy back to sleep at its spawn point.
    pub fn reset_enemies<W: PhysicsWorld, S: Scene>(&mut self, world: &mut W, scene: &mut S) {
        for enemy in self.enemies.values_mut().filter(|e| e.active) {
            world.remove_body(enemy.body);
            world.set_position(enemy.body, enemy.spawn);
            world.set_velocity(enemy.body, Vec3::ZERO);
            scene.remove_visual(enemy.visual);
            enemy.active = false;
        }
    }

    /// Tag of a body, if this level owns it.
    #[inline]
    pub fn tag(&self, body: BodyHandle) -> Option<BodyTag> {
        self.tags.get(&body).copied()
    }

    /// Full tag map.
    pub fn tags(&self) -> &BTreeMap<BodyHandle, BodyTag> {
        &self.tags
    }

    /// The spawn platform.
    pub fn first_platform(&self) -> &Platform {
        &self.platforms[self.first]
    }

    /// Current position of the spawn platform.
    pub fn first_platform_position(&self) -> Vec3 {
        self.first_platform().position_at(self.elapsed)
    }

    /// Where the player appears: centered on top of the spawn platform.
    pub fn spawn_point(&self, player_size: f32) -> Vec3 {
        let platform = self.first_platform();
        self.first_platform_position() + Vec3::Y * (platform.size.y * 0.5 + player_size * 0.5)
    }

    /// The goal platform, if the level has one.
    pub fn goal_platform(&self) -> Option<&Platform> {
        self.goal.map(|index| &self.platforms[index])
    }

    /// Current position of the goal platform.
    pub fn goal_position(&self) -> Option<Vec3> {
        self.goal_platform().map(|p| p.position_at(self.elapsed))
    }

    /// Point the completion check measures from: where the center of a
    /// standard-height goal sharing the same top surface would be.
    pub fn goal_anchor(&self) -> Option<Vec3> {
        self.goal_platform().map(|p| {
            let lift = (p.size.y - DEFAULT_PLATFORM_HEIGHT) * 0.5;
            p.position_at(self.elapsed) + Vec3::Y * lift
        })
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Platforms in descriptor order.
    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    /// Enemies keyed by their trigger platform.
    pub fn enemies(&self) -> &BTreeMap<EntityId, EnemyAgent> {
        &self.enemies
    }

    /// Level time (s).
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Number of bodies this level created.
    pub fn body_count(&self) -> usize {
        self.platforms.len() + self.enemies.len()
    }
}

fn spawn_enemy<W: PhysicsWorld, S: Scene>(
    world: &mut W,
    scene: &mut S,
    config: &GameConfig,
    trigger: EntityId,
    spawn: Vec3,
) -> EnemyAgent {
    let shape = Shape::Sphere { radius: config.enemy_radius };
    let body = world.create_body(
        BodyDesc::kinematic(config.enemy_mass, spawn, shape).with_groups(CollisionGroups::enemy()),
    );
    let visual = scene.create_visual(&shape, Material::color(config.enemy_color));
    EnemyAgent {
        trigger,
        body,
        visual,
        spawn,
        active: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::level::PlatformDesc;
    use crate::physics::ArcadeWorld;
    use crate::render::HeadlessScene;

    fn level() -> LevelData {
        let mut first = PlatformDesc::at(0.0, 0.0, 0.0, 6.0, 6.0);
        first.is_first = true;
        let mut moving = PlatformDesc::at(0.0, 2.0, -10.0, 4.0, 4.0);
        moving.move_axis = Some("x".into());
        moving.move_range = Some(3.0);
        let mut trigger = PlatformDesc::at(0.0, 3.0, -15.0, 4.0, 4.0);
        trigger.has_enemy = true;
        let mut goal = PlatformDesc::at(0.0, 4.0, -20.0, 6.0, 6.0);
        goal.is_final = true;

        LevelData {
            name: "Container".into(),
            platform_color: "8DF9C1".into(),
            background: Some("#F98D8D".into()),
            platforms: vec![first, moving, trigger, goal],
        }
    }

    #[test]
    fn test_load_tags_and_background() {
        let mut world = ArcadeWorld::default();
        let mut scene = HeadlessScene::new();
        let level = LevelContainer::load(&mut world, &mut scene, &level(), &GameConfig::default()).unwrap();

        assert_eq!(level.body_count(), 5);
        assert_eq!(world.body_count(), 5);
        // Enemy bodies exist but are not simulated until activated.
        assert_eq!(world.simulated_count(), 4);
        assert_eq!(scene.attached_count(), 4);
        assert_eq!(scene.background(), Some(0xF98D8D));

        let tags: Vec<_> = level.platforms().iter().map(|p| p.tag).collect();
        assert_eq!(
            tags,
            vec![BodyTag::Ground, BodyTag::Ground, BodyTag::EnemyTrigger(EntityId(2)), BodyTag::Goal]
        );
        let enemy = &level.enemies()[&EntityId(2)];
        assert_eq!(level.tag(enemy.body), Some(BodyTag::Hazard));
        assert_eq!(enemy.spawn, Vec3::new(0.0, 5.0, -15.0));
    }

    #[test]
    fn test_spawn_point_sits_on_first_platform() {
        let mut world = ArcadeWorld::default();
        let mut scene = HeadlessScene::new();
        let level = LevelContainer::load(&mut world, &mut scene, &level(), &GameConfig::default()).unwrap();
        assert_eq!(level.spawn_point(1.0), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_invalid_level_creates_nothing() {
        let mut world = ArcadeWorld::default();
        let mut scene = HeadlessScene::new();
        let mut data = level();
        data.platforms[0].is_first = false;

        let err = LevelContainer::load(&mut world, &mut scene, &data, &GameConfig::default()).unwrap_err();
        assert!(matches!(err, LevelFormatError::MissingFirstPlatform));
        assert_eq!(world.body_count(), 0);
        assert_eq!(scene.visual_count(), 0);
    }

    #[test]
    fn test_moving_platform_body_and_visual_agree() {
        let mut world = ArcadeWorld::default();
        let mut scene = HeadlessScene::new();
        let mut level = LevelContainer::load(&mut world, &mut scene, &level(), &GameConfig::default()).unwrap();

        for _ in 0..37 {
            level.update(1.0 / 60.0, Vec3::ZERO, &mut world, &mut scene);
        }
        let platform = &level.platforms()[1];
        let body = world.position(platform.body).unwrap();
        let visual = scene.transform(platform.visual).unwrap().position;
        assert_eq!(body.to_array(), visual.to_array());
        assert_ne!(body, platform.origin);
        assert_eq!(body.y, platform.origin.y);
    }

    #[test]
    fn test_enemy_activation_is_idempotent() {
        let mut world = ArcadeWorld::default();
        let mut scene = HeadlessScene::new();
        let mut level = LevelContainer::load(&mut world, &mut scene, &level(), &GameConfig::default()).unwrap();

        assert!(level.activate_enemy(EntityId(2), &mut world, &mut scene));
        assert!(!level.activate_enemy(EntityId(2), &mut world, &mut scene));
        assert!(!level.activate_enemy(EntityId(0), &mut world, &mut scene));
        assert_eq!(world.simulated_count(), 5);

        level.update(1.0 / 60.0, Vec3::new(0.0, 5.0, 0.0), &mut world, &mut scene);
        let enemy = &level.enemies()[&EntityId(2)];
        let velocity = world.velocity(enemy.body).unwrap();
        assert!((velocity.length() - 4.0).abs() < 1e-5);
        assert!(velocity.z > 0.0);

        level.reset_enemies(&mut world, &mut scene);
        let enemy = &level.enemies()[&EntityId(2)];
        assert!(!enemy.active);
        assert!(!world.is_simulated(enemy.body));
        assert_eq!(world.position(enemy.body), Some(enemy.spawn));
    }

    #[test]
    fn test_teardown_releases_everything() {
        let mut world = ArcadeWorld::default();
        let mut scene = HeadlessScene::new();
        let mut level = LevelContainer::load(&mut world, &mut scene, &level(), &GameConfig::default()).unwrap();
        level.activate_enemy(EntityId(2), &mut world, &mut scene);

        level.teardown(&mut world, &mut scene);
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.simulated_count(), 0);
        assert_eq!(scene.visual_count(), 0);
    }
}
