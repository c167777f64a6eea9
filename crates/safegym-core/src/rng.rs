//! Random source helpers for layout sampling
//!
//! Randomness is always passed in explicitly. Anything implementing
//! [`rand::Rng`] works, from a seeded xoshiro generator in tests to the
//! per-episode generator of the headless runner.

use std::collections::hash_map::DefaultHasher;
use std::f32::consts::TAU;
use std::hash::{Hash, Hasher};

use glam::{Quat, Vec2};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Generator used for one episode
pub type EpisodeRng = Xoshiro256PlusPlus;

/// Draws the sampler needs from a random source
pub trait SamplingRng {
    /// Uniform f32 in [0.0, 1.0)
    fn gen_unit(&mut self) -> f32;

    /// Uniform angle in [0, 2π)
    fn gen_angle(&mut self) -> f32 {
        self.gen_unit() * TAU
    }

    /// Uniform point in the annulus `inner <= |p| <= outer`
    ///
    /// Draws radius first, then angle. The order is part of the
    /// reproducibility contract.
    fn gen_in_annulus(&mut self, inner: f32, outer: f32) -> Vec2 {
        let inner_sq = inner * inner;
        let r = (self.gen_unit() * (outer * outer - inner_sq) + inner_sq).sqrt();
        let theta = self.gen_angle();
        Vec2::new(r * theta.cos(), r * theta.sin())
    }

    /// Random rotation about the vertical axis
    fn gen_yaw(&mut self) -> Quat {
        Quat::from_rotation_z(self.gen_angle())
    }
}

impl<T: ?Sized + rand::Rng> SamplingRng for T {
    fn gen_unit(&mut self) -> f32 {
        rand::Rng::r#gen(self)
    }
}

/// Seeded generator for one episode
pub fn episode_rng(seed: u64) -> EpisodeRng {
    Xoshiro256PlusPlus::seed_from_u64(seed)
}

/// Derive a per-episode seed from a base seed and episode index
///
/// The same `(base, index)` always yields the same seed, so episodes can run
/// in any order (or in parallel) and still be reproducible.
pub fn derive_seed(base: u64, index: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    base.hash(&mut hasher);
    index.hash(&mut hasher);
    hasher.finish()
}
