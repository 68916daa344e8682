//! Renderer Seam
//!
//! The game only creates visuals, attaches them to the scene graph and writes
//! their transforms. [`HeadlessScene`] records all of that for tests and the
//! headless binary.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::core::math::{Quat, Vec3};
use crate::physics::Shape;

/// Opaque identity of a visual owned by a scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VisualHandle(pub u32);

/// Flat-colored material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    /// 0xRRGGBB
    pub color: u32,
}

impl Material {
    /// Material with a single color.
    pub const fn color(color: u32) -> Self {
        Self { color }
    }
}

/// Position and orientation of a visual.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// World position
    pub position: Vec3,
    /// World orientation
    pub orientation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
        }
    }
}

/// The scene graph as seen by the game.
pub trait Scene {
    /// Create a visual (not yet attached).
    fn create_visual(&mut self, shape: &Shape, material: Material) -> VisualHandle;

    /// Attach a visual to the scene graph.
    fn add_visual(&mut self, visual: VisualHandle);

    /// Detach a visual from the scene graph, keeping it for later.
    fn remove_visual(&mut self, visual: VisualHandle);

    /// Detach and free a visual.
    fn destroy_visual(&mut self, visual: VisualHandle);

    /// Write a visual's transform.
    fn set_transform(&mut self, visual: VisualHandle, position: Vec3, orientation: Quat);

    /// Set the clear color.
    fn set_background(&mut self, color: u32);
}

/// What the headless scene knows about one visual.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualRecord {
    /// Shape it was created with
    pub shape: Shape,
    /// Material it was created with
    pub material: Material,
    /// Last written transform
    pub transform: Transform,
    /// Whether it is attached to the scene graph
    pub attached: bool,
}

/// Scene graph that only records state.
#[derive(Clone, Debug, Default)]
pub struct HeadlessScene {
    visuals: BTreeMap<VisualHandle, VisualRecord>,
    next_handle: u32,
    background: Option<u32>,
}

impl HeadlessScene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a visual.
    pub fn visual(&self, visual: VisualHandle) -> Option<&VisualRecord> {
        self.visuals.get(&visual)
    }

    /// Last written transform of a visual.
    pub fn transform(&self, visual: VisualHandle) -> Option<Transform> {
        self.visuals.get(&visual).map(|v| v.transform)
    }

    /// Number of existing visuals.
    pub fn visual_count(&self) -> usize {
        self.visuals.len()
    }

    /// Number of visuals attached to the scene graph.
    pub fn attached_count(&self) -> usize {
        self.visuals.values().filter(|v| v.attached).count()
    }

    /// Current clear color.
    pub fn background(&self) -> Option<u32> {
        self.background
    }
}

impl Scene for HeadlessScene {
    fn create_visual(&mut self, shape: &Shape, material: Material) -> VisualHandle {
        let handle = VisualHandle(self.next_handle);
        self.next_handle += 1;
        self.visuals.insert(
            handle,
            VisualRecord {
                shape: *shape,
                material,
                transform: Transform::default(),
                attached: false,
            },
        );
        handle
    }

    fn add_visual(&mut self, visual: VisualHandle) {
        if let Some(v) = self.visuals.get_mut(&visual) {
            v.attached = true;
        }
    }

    fn remove_visual(&mut self, visual: VisualHandle) {
        if let Some(v) = self.visuals.get_mut(&visual) {
            v.attached = false;
        }
    }

    fn destroy_visual(&mut self, visual: VisualHandle) {
        self.visuals.remove(&visual);
    }

    fn set_transform(&mut self, visual: VisualHandle, position: Vec3, orientation: Quat) {
        if let Some(v) = self.visuals.get_mut(&visual) {
            v.transform = Transform { position, orientation };
        }
    }

    fn set_background(&mut self, color: u32) {
        self.background = Some(color);
    }
}
