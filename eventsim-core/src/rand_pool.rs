//! ## eventsim-core::rand_pool
//! **Pre-generated, per-session random draws**
//!
//! Sessions run concurrently and finish in whatever order the scheduler
//! allows, so drawing from one shared generator at run time would make a
//! session's draws depend on its siblings. Instead each session gets a pool
//! filled up front from the seeded generator and replays it in isolation.
//!
//! Pools are built sequentially, before any worker starts. A pool is owned by
//! exactly one session and needs `&mut` for every draw.

use eventsim_config::ModelConfig;
use rand::Rng;
use rand_distr::StandardNormal;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct RandomPool {
    uniform: Box<[f64]>,
    normal: Box<[f64]>,
    uniform_cursor: usize,
    normal_cursor: usize,
    wraps: u64,
}

impl RandomPool {
    /// Fills both sequences from `rng`.
    ///
    /// # Panics
    ///
    /// Panics if either count is zero.
    pub fn create<R: Rng>(rng: &mut R, uniform_count: usize, normal_count: usize) -> Self {
        assert!(
            uniform_count > 0 && normal_count > 0,
            "random pool sequences must not be empty"
        );
        let uniform = (0..uniform_count).map(|_| rng.random::<f64>()).collect();
        let normal = (0..normal_count)
            .map(|_| rng.sample::<f64, _>(StandardNormal))
            .collect();
        Self {
            uniform,
            normal,
            uniform_cursor: 0,
            normal_cursor: 0,
            wraps: 0,
        }
    }

    /// Builds a pool sized for one session of `model`.
    pub fn for_model<R: Rng>(rng: &mut R, model: &ModelConfig) -> Self {
        let sizing = PoolSizing::for_model(model);
        Self::create(rng, sizing.uniform, sizing.normal)
    }

    /// Next value in `[0, 1)`.
    pub fn next_uniform(&mut self) -> f64 {
        let value = self.uniform[self.uniform_cursor];
        self.uniform_cursor += 1;
        if self.uniform_cursor == self.uniform.len() {
            warn!(
                size = self.uniform.len(),
                "uniform random pool exhausted, starting from 0 again"
            );
            self.uniform_cursor = 0;
            self.wraps += 1;
        }
        value
    }

    /// Next standard-normal value.
    pub fn next_normal(&mut self) -> f64 {
        let value = self.normal[self.normal_cursor];
        self.normal_cursor += 1;
        if self.normal_cursor == self.normal.len() {
            warn!(
                size = self.normal.len(),
                "normal random pool exhausted, starting from 0 again"
            );
            self.normal_cursor = 0;
            self.wraps += 1;
        }
        value
    }

    /// Next integer in `[0, n)`, truncating `next_uniform() * n`.
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero.
    pub fn next_int(&mut self, n: u64) -> u64 {
        assert!(n > 0, "next_int requires a non-empty range");
        let scaled = (self.next_uniform() * n as f64) as u64;
        scaled.min(n - 1)
    }

    /// Bernoulli trial that succeeds with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_uniform() < p
    }

    /// How many times either sequence has wrapped around.
    pub fn wraps(&self) -> u64 {
        self.wraps
    }

    pub fn uniform_len(&self) -> usize {
        self.uniform.len()
    }

    pub fn normal_len(&self) -> usize {
        self.normal.len()
    }
}

/// Pool dimensions for one session.
///
/// A session draws at most [`PoolSizing::START_DRAWS`] uniforms at start,
/// then [`PoolSizing::UNIFORM_DRAWS_PER_EVENT`] uniforms and one normal per
/// event. [`PoolSizing::HEADROOM`] multiplies the per-event part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSizing {
    pub uniform: usize,
    pub normal: usize,
}

impl PoolSizing {
    pub const START_DRAWS: usize = 8;
    pub const UNIFORM_DRAWS_PER_EVENT: usize = 2;
    pub const HEADROOM: usize = 2;

    pub fn for_model(model: &ModelConfig) -> Self {
        let events = usize::try_from(model.event_count_ceiling()).unwrap_or(usize::MAX);
        let per_event = events.saturating_mul(Self::HEADROOM);
        Self {
            uniform: Self::START_DRAWS
                .saturating_add(per_event.saturating_mul(Self::UNIFORM_DRAWS_PER_EVENT)),
            normal: per_event.saturating_add(1),
        }
    }
}
