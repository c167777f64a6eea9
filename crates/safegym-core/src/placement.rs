//! Rejection sampling of non-overlapping entity layouts
//!
//! Entities are placed one at a time inside a disk arena. Fixed entities go
//! first, then randomly placed ones in declaration order. Each random entity
//! gets a per-entity draw budget; running out abandons the whole layout and
//! starts over, up to a whole-layout budget, after which the sampler reports
//! [`ResamplingError`].

use std::collections::HashSet;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ResamplingError;
use crate::layout::{Layout, Placement};
use crate::rng::SamplingRng;

/// Default per-entity draw budget
pub const DEFAULT_ENTITY_ATTEMPTS: usize = 100;

/// Default whole-layout budget
pub const DEFAULT_LAYOUT_ATTEMPTS: usize = 300;

/// How two keepout radii combine into a minimum center distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeepoutRule {
    /// Larger of the two radii
    #[default]
    Max,
    /// Sum of the two radii
    Sum,
}

impl KeepoutRule {
    pub fn separation(self, a: f32, b: f32) -> f32 {
        match self {
            KeepoutRule::Max => a.max(b),
            KeepoutRule::Sum => a + b,
        }
    }
}

/// Rule override for one unordered pair of entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairRule {
    pub a: String,
    pub b: String,
    pub rule: KeepoutRule,
}

impl PairRule {
    fn matches(&self, a: &str, b: &str) -> bool {
        (self.a == a && self.b == b) || (self.a == b && self.b == a)
    }
}

/// Sampler budgets and keepout combination rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Draws allowed per random entity before the layout is abandoned
    pub entity_attempts: usize,
    /// Whole-layout attempts before giving up
    pub layout_attempts: usize,
    /// Rule for pairs without an override
    pub default_rule: KeepoutRule,
    /// Per-pair overrides
    pub pair_rules: Vec<PairRule>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            entity_attempts: DEFAULT_ENTITY_ATTEMPTS,
            layout_attempts: DEFAULT_LAYOUT_ATTEMPTS,
            default_rule: KeepoutRule::Max,
            pair_rules: Vec::new(),
        }
    }
}

impl SamplerConfig {
    pub fn rule_for(&self, a: &str, b: &str) -> KeepoutRule {
        self.pair_rules
            .iter()
            .find(|r| r.matches(a, b))
            .map(|r| r.rule)
            .unwrap_or(self.default_rule)
    }

    /// Minimum allowed center distance between two entities
    pub fn separation(&self, a: &EntitySpec, b: &EntitySpec) -> f32 {
        self.rule_for(&a.name, &b.name)
            .separation(a.keepout, b.keepout)
    }
}

/// One entity to place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpec {
    /// Unique name; layouts and scenes are keyed by it
    pub name: String,
    /// Clearance required from other entities' centers
    pub keepout: f32,
    /// Pinned position; skips random placement
    pub fixed: Option<Vec2>,
    /// Radius of the forbidden disk around the origin (0 = none)
    pub min_origin_distance: f32,
    /// Free bodies also receive a random yaw orientation
    pub free_body: bool,
}

impl EntitySpec {
    pub fn new(name: impl Into<String>, keepout: f32) -> Self {
        Self {
            name: name.into(),
            keepout,
            fixed: None,
            min_origin_distance: 0.0,
            free_body: false,
        }
    }

    pub fn fixed(name: impl Into<String>, keepout: f32, position: Vec2) -> Self {
        Self {
            fixed: Some(position),
            ..Self::new(name, keepout)
        }
    }

    pub fn with_min_origin_distance(mut self, distance: f32) -> Self {
        self.min_origin_distance = distance;
        self
    }

    pub fn free_body(mut self) -> Self {
        self.free_body = true;
        self
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed.is_some()
    }
}

/// Stateless layout sampler; all randomness comes from the caller
#[derive(Debug, Clone, Default)]
pub struct PlacementSampler {
    config: SamplerConfig,
}

impl PlacementSampler {
    pub fn new(config: SamplerConfig) -> Self {
        assert!(
            config.entity_attempts > 0 && config.layout_attempts > 0,
            "sampler budgets must be positive"
        );
        Self { config }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Sample a layout for `specs` inside a disk of `arena_radius`
    ///
    /// The result satisfies, for every randomly placed entity, the pairwise
    /// separation against all earlier entities and containment within
    /// `arena_radius - keepout`. Fixed entities are taken as given.
    ///
    /// # Panics
    /// On malformed specs (duplicate names, negative keepout, keepout or
    /// exclusion disk that does not fit the arena).
    pub fn sample<R: Rng + ?Sized>(
        &self,
        specs: &[EntitySpec],
        arena_radius: f32,
        rng: &mut R,
    ) -> Result<Layout, ResamplingError> {
        validate_specs(specs, arena_radius);

        let fixed: Vec<&EntitySpec> = specs.iter().filter(|s| s.is_fixed()).collect();
        let random: Vec<&EntitySpec> = specs.iter().filter(|s| !s.is_fixed()).collect();

        let mut stuck_on = String::new();
        for attempt in 1..=self.config.layout_attempts {
            match self.try_layout(&fixed, &random, arena_radius, rng) {
                Ok(layout) => {
                    log::debug!(
                        "Sampled layout of {} entities on attempt {}",
                        layout.len(),
                        attempt
                    );
                    return Ok(layout);
                }
                Err(name) => {
                    log::trace!("Layout attempt {} stuck on '{}', restarting", attempt, name);
                    stuck_on = name.to_string();
                }
            }
        }

        let err = ResamplingError {
            layout_attempts: self.config.layout_attempts,
            entity_attempts: self.config.entity_attempts,
            stuck_on,
        };
        log::warn!("{}", err);
        Err(err)
    }

    /// One whole-layout attempt; on failure returns the entity that ran out of draws
    fn try_layout<'a, R: Rng + ?Sized>(
        &self,
        fixed: &[&'a EntitySpec],
        random: &[&'a EntitySpec],
        arena_radius: f32,
        rng: &mut R,
    ) -> Result<Layout, &'a str> {
        let mut layout = Layout::new();
        let mut placed: Vec<(&EntitySpec, Vec2)> = Vec::with_capacity(fixed.len() + random.len());

        for &spec in fixed {
            if let Some(position) = spec.fixed {
                layout.insert(spec.name.clone(), Placement::at(position));
                placed.push((spec, position));
            }
        }

        for &spec in random {
            let outer = arena_radius - spec.keepout;
            let candidate = (0..self.config.entity_attempts)
                .map(|_| rng.gen_in_annulus(spec.min_origin_distance, outer))
                .find(|candidate| {
                    placed.iter().all(|(other, position)| {
                        candidate.distance(*position) >= self.config.separation(spec, other)
                    })
                });

            let Some(position) = candidate else {
                return Err(spec.name.as_str());
            };

            let orientation = spec.free_body.then(|| rng.gen_yaw());
            layout.insert(
                spec.name.clone(),
                Placement {
                    position,
                    orientation,
                },
            );
            placed.push((spec, position));
        }

        Ok(layout)
    }
}

/// Sample with default budgets and the max-keepout rule
pub fn sample_layout<R: Rng + ?Sized>(
    specs: &[EntitySpec],
    arena_radius: f32,
    rng: &mut R,
) -> Result<Layout, ResamplingError> {
    PlacementSampler::default().sample(specs, arena_radius, rng)
}

/// Panic on contract violations by the caller
fn validate_specs(specs: &[EntitySpec], arena_radius: f32) {
    assert!(
        arena_radius.is_finite() && arena_radius > 0.0,
        "arena radius must be positive, got {}",
        arena_radius
    );

    let mut seen = HashSet::with_capacity(specs.len());
    for spec in specs {
        assert!(
            seen.insert(spec.name.as_str()),
            "duplicate entity name '{}'",
            spec.name
        );
        assert!(
            spec.keepout.is_finite() && spec.keepout >= 0.0,
            "entity '{}' has invalid keepout {}",
            spec.name,
            spec.keepout
        );
        if spec.is_fixed() {
            continue;
        }
        assert!(
            spec.keepout <= arena_radius,
            "entity '{}' keepout {} does not fit arena radius {}",
            spec.name,
            spec.keepout,
            arena_radius
        );
        assert!(
            spec.min_origin_distance >= 0.0
                && spec.min_origin_distance <= arena_radius - spec.keepout,
            "entity '{}' exclusion radius {} leaves no room in arena radius {}",
            spec.name,
            spec.min_origin_distance,
            arena_radius
        );
    }
}
