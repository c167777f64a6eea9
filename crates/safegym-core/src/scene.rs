//! Scene descriptors handed to the physics bridge
//!
//! A descriptor is the backend-neutral description of every body in a scene.
//! Backends turn it into whatever they need; the reference bridge reads it
//! directly, and the headless runner can dump it as RON.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::tasks::ObstacleKind;

/// What a body is, which decides how the bridge treats contacts with it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    /// The actuated agent
    Robot,
    /// Non-colliding target marker
    Goal,
    /// Movable object with a free joint (e.g. the box)
    FreeBody,
    Obstacle(ObstacleKind),
}

/// How the robot interacts with a body on contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    /// Overlaps freely
    Passthrough,
    /// Pushed out of the way
    Pushable,
    /// Immovable; the robot is pushed back instead
    Solid,
}

impl BodyKind {
    pub fn contact(self) -> Contact {
        match self {
            BodyKind::Robot => Contact::Solid,
            BodyKind::Goal => Contact::Passthrough,
            BodyKind::FreeBody => Contact::Pushable,
            BodyKind::Obstacle(kind) => kind.contact(),
        }
    }
}

/// One body in a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyDescriptor {
    pub name: String,
    pub kind: BodyKind,
    pub position: Vec3,
    pub orientation: Quat,
    /// Half extent in the arena plane, used as the contact radius
    pub half_size: f32,
}

/// Complete scene for one episode
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneDescriptor {
    pub arena_radius: f32,
    pub bodies: Vec<BodyDescriptor>,
}

impl SceneDescriptor {
    pub fn new(arena_radius: f32) -> Self {
        Self {
            arena_radius,
            bodies: Vec::new(),
        }
    }

    /// Add a body
    ///
    /// # Panics
    /// If a body with the same name already exists.
    pub fn push(&mut self, body: BodyDescriptor) {
        assert!(
            self.body(&body.name).is_none(),
            "scene already has a body named '{}'",
            body.name
        );
        self.bodies.push(body);
    }

    pub fn body(&self, name: &str) -> Option<&BodyDescriptor> {
        self.bodies.iter().find(|b| b.name == name)
    }

    /// Render as pretty RON text
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }
}
