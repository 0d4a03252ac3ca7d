pub mod effects;
pub mod particle;
pub mod rocket;
pub mod show;

pub use effects::EffectKind;
pub use show::{FireworkShow, Mode};

use rand::RngExt;

/// Fixed simulation timestep in seconds. The frame loop may run at any rate;
/// the simulation always advances in these increments.
pub const TICK: f64 = 1.0 / 60.0;

/// Uniform random source backing every stochastic choice in the simulation.
pub struct RandomSource {
    rng: rand::rngs::ThreadRng,
}

impl RandomSource {
    pub fn new() -> Self {
        RandomSource { rng: rand::rng() }
    }

    /// Uniform float in [lo, hi).
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        self.rng.random_range(lo..hi)
    }

    /// Uniform integer in [lo, hi], inclusive on both ends.
    pub fn uniform_int(&mut self, lo: i64, hi: i64) -> i64 {
        if hi <= lo {
            return lo;
        }
        self.rng.random_range(lo..=hi)
    }

    /// Bernoulli draw: true with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.random_range(0.0..1.0) < p
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Global particle-density knob. Multiplies every effect's requested particle
/// count at explosion time (never cached earlier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PerformanceTier {
    High,
    Medium,
    Low,
}

impl PerformanceTier {
    pub fn multiplier(self) -> f64 {
        match self {
            PerformanceTier::High => 1.0,
            PerformanceTier::Medium => 0.6,
            PerformanceTier::Low => 0.3,
        }
    }

    /// Scale a requested particle count down to this tier.
    pub fn scale(self, count: usize) -> usize {
        (count as f64 * self.multiplier()) as usize
    }

    pub fn next(self) -> Self {
        match self {
            PerformanceTier::High => PerformanceTier::Medium,
            PerformanceTier::Medium => PerformanceTier::Low,
            PerformanceTier::Low => PerformanceTier::High,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PerformanceTier::High => "high",
            PerformanceTier::Medium => "medium",
            PerformanceTier::Low => "low",
        }
    }
}

/// Tunable show parameters. Setters clamp silently to the documented ranges;
/// out-of-range values are never an error.
#[derive(Debug, Clone)]
pub struct ShowOptions {
    /// Particle draw size in pixels (1-5).
    pub particle_size: f64,
    /// Base particle count for launches that honor it (10-100).
    pub particle_count: usize,
    /// Explosion height as a fraction of viewport height (0.3-0.8).
    pub height: f64,
    /// Horizontal launch spread as a fraction of viewport width (0.2-0.6).
    pub spread: f64,
    /// Velocity multiplier applied to every explosion (0.5-2).
    pub speed: f64,
    /// Seconds between launch opportunities in random mode (0.1-1).
    pub delay: f64,
}

impl Default for ShowOptions {
    fn default() -> Self {
        ShowOptions {
            particle_size: 2.0,
            particle_count: 30,
            height: 0.7,
            spread: 0.4,
            speed: 1.0,
            delay: 0.4,
        }
    }
}

impl ShowOptions {
    pub fn set_particle_size(&mut self, size: f64) -> &mut Self {
        self.particle_size = size.clamp(1.0, 5.0);
        self
    }

    pub fn set_particle_count(&mut self, count: usize) -> &mut Self {
        self.particle_count = count.clamp(10, 100);
        self
    }

    pub fn set_height(&mut self, height: f64) -> &mut Self {
        self.height = height.clamp(0.3, 0.8);
        self
    }

    pub fn set_spread(&mut self, spread: f64) -> &mut Self {
        self.spread = spread.clamp(0.2, 0.6);
        self
    }

    pub fn set_speed(&mut self, speed: f64) -> &mut Self {
        self.speed = speed.clamp(0.5, 2.0);
        self
    }

    pub fn set_delay(&mut self, delay: f64) -> &mut Self {
        self.delay = delay.clamp(0.1, 1.0);
        self
    }
}

/// Viewport bounds in canvas pixels, re-read every frame so resizes take
/// effect without any explicit resize handling in the simulation.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: usize, height: usize) -> Self {
        Viewport {
            width: width as f64,
            height: height as f64,
        }
    }

    /// Velocity/geometry scale relative to the reference canvas the effect
    /// constants were tuned against.
    pub fn scale(&self) -> f64 {
        (self.height / REFERENCE_HEIGHT).clamp(0.05, 4.0)
    }
}

/// Canvas height the effect velocity literals assume.
const REFERENCE_HEIGHT: f64 = 600.0;

/// Fire-and-forget detonation sound. Implementations must never fail loudly;
/// the simulation ignores the outcome entirely.
pub trait SoundSink {
    fn explosion(&mut self, volume: f64);
}

/// Silent sink used by default and in tests.
pub struct NullSound;

impl SoundSink for NullSound {
    fn explosion(&mut self, _volume: f64) {}
}

/// A launch request waiting in the scheduler queue. Secondary explosions and
/// choreography launches are both expressed this way.
#[derive(Debug, Clone)]
pub struct PendingLaunch {
    pub start_x: f64,
    pub start_y: f64,
    pub target_x: f64,
    pub target_y: f64,
    /// Seconds from submission until the rocket is constructed.
    pub delay: f64,
    /// Inherited hue for secondary bursts.
    pub hue: Option<f64>,
    /// Secondary rockets use the reduced particle budget and never spawn
    /// further secondaries.
    pub recursive: bool,
    /// Skip the ascent phase and detonate on construction.
    pub pre_detonated: bool,
    pub effect: Option<EffectKind>,
}

impl PendingLaunch {
    pub fn ascent(start_x: f64, start_y: f64, target_x: f64, target_y: f64, delay: f64) -> Self {
        PendingLaunch {
            start_x,
            start_y,
            target_x,
            target_y,
            delay,
            hue: None,
            recursive: false,
            pre_detonated: false,
            effect: None,
        }
    }

    pub fn with_effect(mut self, effect: Option<EffectKind>) -> Self {
        self.effect = effect;
        self
    }
}

/// Everything a rocket needs while ticking: randomness, the density knob,
/// show options, viewport bounds, the simulation clock, the sound sink, and
/// an outbox for secondary launches the scheduler will enqueue.
pub struct TickCtx<'a> {
    pub rng: &'a mut RandomSource,
    pub tier: PerformanceTier,
    pub options: &'a ShowOptions,
    pub view: Viewport,
    pub now: f64,
    pub sound: &'a mut dyn SoundSink,
    pub pending: &'a mut Vec<PendingLaunch>,
}

/// Wrap a hue offset back into [0, 360).
pub fn wrap_hue(hue: f64) -> f64 {
    hue.rem_euclid(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_clamp_to_documented_bounds() {
        let mut opts = ShowOptions::default();
        opts.set_particle_size(99.0)
            .set_particle_count(3)
            .set_height(1.5)
            .set_spread(0.0)
            .set_speed(10.0)
            .set_delay(-2.0);
        assert_eq!(opts.particle_size, 5.0);
        assert_eq!(opts.particle_count, 10);
        assert_eq!(opts.height, 0.8);
        assert_eq!(opts.spread, 0.2);
        assert_eq!(opts.speed, 2.0);
        assert_eq!(opts.delay, 0.1);
    }

    #[test]
    fn tier_scaling_is_monotonic() {
        let base = 100;
        let low = PerformanceTier::Low.scale(base);
        let medium = PerformanceTier::Medium.scale(base);
        let high = PerformanceTier::High.scale(base);
        assert!(low <= medium && medium <= high);
        assert_eq!(low, 30);
        assert_eq!(medium, 60);
        assert_eq!(high, 100);
    }

    #[test]
    fn hue_wraps_into_range() {
        assert_eq!(wrap_hue(360.0), 0.0);
        assert_eq!(wrap_hue(-20.0), 340.0);
        assert!((0.0..360.0).contains(&wrap_hue(725.0)));
    }

    #[test]
    fn uniform_int_is_inclusive() {
        let mut rng = RandomSource::new();
        for _ in 0..200 {
            let v = rng.uniform_int(2, 4);
            assert!((2..=4).contains(&v));
        }
    }
}
