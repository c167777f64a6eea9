//! Obstacle kinds and per-episode obstacle draws

use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use serde::{Deserialize, Serialize};

use crate::placement::EntitySpec;
use crate::scene::Contact;

/// Obstacle variety scattered around the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// Flat zone the robot should avoid; no contact
    Hazard,
    /// Light object the robot can knock over
    Vase,
    /// Wide pushable body that needs a large berth
    Gremlin,
    /// Immovable column
    Pillar,
}

impl ObstacleKind {
    /// Order matching an obstacle distribution array
    pub const ALL: [ObstacleKind; 4] = [
        ObstacleKind::Hazard,
        ObstacleKind::Vase,
        ObstacleKind::Gremlin,
        ObstacleKind::Pillar,
    ];

    pub fn keepout(self) -> f32 {
        match self {
            ObstacleKind::Hazard => 0.18,
            ObstacleKind::Vase => 0.15,
            ObstacleKind::Gremlin => 0.5,
            ObstacleKind::Pillar => 0.3,
        }
    }

    /// Half extent in the plane
    pub fn size(self) -> f32 {
        match self {
            ObstacleKind::Hazard => 0.2,
            ObstacleKind::Vase => 0.1,
            ObstacleKind::Gremlin => 0.1,
            ObstacleKind::Pillar => 0.2,
        }
    }

    /// Resting height of the body center
    pub fn height(self) -> f32 {
        match self {
            ObstacleKind::Hazard => 0.01,
            ObstacleKind::Vase => 0.1,
            ObstacleKind::Gremlin => 0.1,
            ObstacleKind::Pillar => 0.5,
        }
    }

    pub fn name_prefix(self) -> &'static str {
        match self {
            ObstacleKind::Hazard => "hazard",
            ObstacleKind::Vase => "vase",
            ObstacleKind::Gremlin => "gremlin",
            ObstacleKind::Pillar => "pillar",
        }
    }

    pub fn contact(self) -> Contact {
        match self {
            ObstacleKind::Hazard => Contact::Passthrough,
            ObstacleKind::Vase | ObstacleKind::Gremlin => Contact::Pushable,
            ObstacleKind::Pillar => Contact::Solid,
        }
    }
}

/// One drawn obstacle
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub name: String,
    pub kind: ObstacleKind,
}

impl Obstacle {
    pub fn spec(&self) -> EntitySpec {
        EntitySpec::new(self.name.clone(), self.kind.keepout())
    }
}

/// Draw `count` obstacle kinds from `distribution` (weights in [`ObstacleKind::ALL`] order)
///
/// Obstacles are named `<kind><index>`, with the index running over all
/// obstacles so names stay unique.
///
/// # Panics
/// If `count > 0` and the distribution has no positive weight.
pub fn draw_obstacles<R: Rng + ?Sized>(
    count: usize,
    distribution: &[f32; 4],
    rng: &mut R,
) -> Vec<Obstacle> {
    if count == 0 {
        return Vec::new();
    }
    let weights = WeightedIndex::new(distribution)
        .unwrap_or_else(|e| panic!("invalid obstacle distribution {:?}: {}", distribution, e));

    (0..count)
        .map(|i| {
            let kind = ObstacleKind::ALL[weights.sample(rng)];
            Obstacle {
                name: format!("{}{}", kind.name_prefix(), i),
                kind,
            }
        })
        .collect()
}
