//! Rocket flight, detonation, and the explosion it leaves behind.
//!
//! A rocket ascends from its launch point toward a target, trailing a short
//! polyline. On arrival it snaps to the exact target, glows briefly, then
//! detonates into a particle field via the effect library. Detonation may
//! schedule secondary launches through the tick context's outbox.

use super::effects::{self, EffectKind};
use super::particle::Particle;
use super::{PendingLaunch, RandomSource, TickCtx, Viewport};
use crate::render::Canvas;
use std::collections::VecDeque;
use std::f64::consts::{PI, TAU};

/// Rendered trail length in positions.
const TRAIL_CAPACITY: usize = 8;
/// Fraction of rockets that corkscrew on the way up.
const SPIRAL_PROBABILITY: f64 = 0.3;
/// Fraction of ordinary launches that fly the reduced recursive profile.
const RECURSIVE_PROBABILITY: f64 = 0.15;
/// Seconds after arrival before the glow starts, before detonation, and
/// before the glow window closes.
const GLOW_START: f64 = 0.05;
const DETONATE_DELAY: f64 = 0.15;
const GLOW_WINDOW: f64 = 0.25;
/// Particle budgets handed to the effect library.
const PRIMARY_BUDGET: usize = 100;
const RECURSIVE_BUDGET: usize = 30;
/// Chance a primary detonation schedules follow-up bursts, and their shape.
const SECONDARY_PROBABILITY: f64 = 0.3;
const SECONDARY_DELAY_MIN: f64 = 0.2;
const SECONDARY_DELAY_MAX: f64 = 0.4;

pub struct Rocket {
    pub x: f64,
    pub y: f64,
    target_x: f64,
    target_y: f64,
    total_distance: f64,
    /// Pixels per tick along the flight path.
    speed: f64,
    /// Constant angular bow applied to the homing direction.
    curvature: f64,
    hue: f64,
    spiral: bool,
    spiral_phase: f64,
    recursive: bool,
    effect: EffectKind,
    trail: VecDeque<(f64, f64)>,
    /// Simulation time at which the rocket snapped to its target.
    arrived_at: Option<f64>,
    exploded: bool,
    particles: Vec<Particle>,
}

impl Rocket {
    pub fn from_launch(launch: &PendingLaunch, view: Viewport, rng: &mut RandomSource) -> Self {
        let dx = launch.target_x - launch.start_x;
        let dy = launch.target_y - launch.start_y;
        let distance = (dx * dx + dy * dy).sqrt();
        // Zero-distance launches get a default upward flight so velocity
        // stays finite.
        let total_distance = if distance < 1e-9 { 1.0 } else { distance };
        let speed = 4.0 + (total_distance / view.height.max(1.0)) * 2.0;

        Rocket {
            x: launch.start_x,
            y: launch.start_y,
            target_x: launch.target_x,
            target_y: launch.target_y,
            total_distance,
            speed,
            curvature: (rng.uniform(0.0, 1.0) - 0.5) * 0.05,
            hue: launch.hue.unwrap_or_else(|| rng.uniform(0.0, 360.0)),
            spiral: rng.chance(SPIRAL_PROBABILITY),
            spiral_phase: 0.0,
            recursive: launch.recursive || rng.chance(RECURSIVE_PROBABILITY),
            effect: launch.effect.unwrap_or_else(|| EffectKind::random(rng)),
            trail: VecDeque::with_capacity(TRAIL_CAPACITY),
            arrived_at: None,
            exploded: false,
            particles: Vec::new(),
        }
    }

    pub fn hue(&self) -> f64 {
        self.hue
    }

    pub fn has_arrived(&self) -> bool {
        self.arrived_at.is_some()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Advance one fixed tick. Returns false once flight, glow, and every
    /// particle are finished.
    pub fn update(&mut self, ctx: &mut TickCtx) -> bool {
        match self.arrived_at {
            None => self.ascend(ctx),
            Some(at) => {
                if !self.exploded && ctx.now - at >= DETONATE_DELAY {
                    self.explode(ctx);
                }
            }
        }

        self.particles.retain_mut(|p| p.update(ctx.rng));

        match self.arrived_at {
            None => true,
            Some(at) => {
                !self.exploded || !self.particles.is_empty() || ctx.now - at < GLOW_WINDOW
            }
        }
    }

    fn ascend(&mut self, ctx: &mut TickCtx) {
        self.trail.push_front((self.x, self.y));
        self.trail.truncate(TRAIL_CAPACITY);

        let dx = self.target_x - self.x;
        let dy = self.target_y - self.y;
        let distance = (dx * dx + dy * dy).sqrt();

        // Arrival: close enough to cover in one step, or overshot vertically.
        if distance <= self.speed || self.y <= self.target_y {
            self.x = self.target_x;
            self.y = self.target_y;
            self.arrived_at = Some(ctx.now);
            return;
        }

        let angle = dy.atan2(dx) + self.curvature;
        self.x += angle.cos() * self.speed;
        self.y += angle.sin() * self.speed;

        if self.spiral {
            self.spiral_phase += 0.3;
            let progress = 1.0 - (distance / self.total_distance).clamp(0.0, 1.0);
            let radius = progress * 3.0;
            let perp = angle + PI / 2.0;
            let wobble = self.spiral_phase.sin() * radius;
            self.x += perp.cos() * wobble * 0.5;
            self.y += perp.sin() * wobble * 0.5;
        }
    }

    /// Detonate. Idempotent: a second call is a no-op.
    fn explode(&mut self, ctx: &mut TickCtx) {
        if self.exploded {
            return;
        }
        self.exploded = true;
        self.trail.clear();

        let budget = if self.recursive {
            RECURSIVE_BUDGET
        } else {
            PRIMARY_BUDGET
        };
        effects::generate(
            self.effect,
            self.x,
            self.y,
            self.hue,
            budget,
            ctx.tier,
            ctx.options,
            ctx.view.scale(),
            ctx.rng,
            &mut self.particles,
        );

        ctx.sound
            .explosion(if self.recursive { 0.3 } else { 0.6 });

        if !self.recursive && ctx.rng.chance(SECONDARY_PROBABILITY) {
            let bursts = ctx.rng.uniform_int(2, 4);
            for _ in 0..bursts {
                // Each secondary sits on a random ray out of the primary,
                // its detonation point further along the same ray.
                let ray = ctx.rng.uniform(0.0, TAU);
                let near = ctx.rng.uniform(20.0, 50.0) * ctx.view.scale();
                let far = near + ctx.rng.uniform(20.0, 60.0) * ctx.view.scale();
                let bx = (self.x + ray.cos() * near).clamp(0.0, ctx.view.width);
                let by = (self.y + ray.sin() * near).clamp(0.0, ctx.view.height);
                ctx.pending.push(PendingLaunch {
                    start_x: bx,
                    start_y: by,
                    target_x: (self.x + ray.cos() * far).clamp(0.0, ctx.view.width),
                    target_y: (self.y + ray.sin() * far).clamp(0.0, ctx.view.height),
                    delay: ctx.rng.uniform(SECONDARY_DELAY_MIN, SECONDARY_DELAY_MAX),
                    hue: Some(self.hue),
                    recursive: true,
                    pre_detonated: true,
                    effect: None,
                });
            }
        }
    }

    /// Skip flight entirely: snap to the target and detonate this tick.
    /// Used for secondary bursts scheduled by earlier detonations.
    pub fn detonate_now(&mut self, ctx: &mut TickCtx) {
        self.x = self.target_x;
        self.y = self.target_y;
        self.trail.clear();
        if self.arrived_at.is_none() {
            self.arrived_at = Some(ctx.now - DETONATE_DELAY);
        }
        self.explode(ctx);
    }

    pub fn render(&self, canvas: &mut Canvas, now: f64) {
        match self.arrived_at {
            None => self.render_flight(canvas),
            Some(at) => self.render_glow(canvas, now - at),
        }
        for p in &self.particles {
            p.render(canvas);
        }
    }

    /// Trail polyline fading toward the tail, plus a bright head.
    fn render_flight(&self, canvas: &mut Canvas) {
        let mut prev = (self.x, self.y);
        for (i, &(tx, ty)) in self.trail.iter().enumerate() {
            let alpha = 1.0 - i as f64 / TRAIL_CAPACITY as f64;
            canvas.line_hsla(prev.0, prev.1, tx, ty, self.hue, 100.0, 60.0, alpha * 0.7);
            prev = (tx, ty);
        }
        canvas.disc_hsla(self.x, self.y, 1.0, self.hue, 100.0, 75.0, 1.0);
    }

    /// Pre-explosion glow: a swelling disc from 50 ms, then decaying light
    /// rays after detonation until the window closes.
    fn render_glow(&self, canvas: &mut Canvas, elapsed: f64) {
        if elapsed < GLOW_START || elapsed >= GLOW_WINDOW {
            return;
        }
        let progress = ((elapsed - GLOW_START) / (GLOW_WINDOW - GLOW_START)).clamp(0.0, 1.0);
        let radius = 2.0 + progress * 6.0;
        let fade = 1.0 - progress;
        canvas.disc_hsla(self.x, self.y, radius, self.hue, 60.0, 85.0, fade * 0.8);

        if elapsed >= DETONATE_DELAY {
            const RAYS: usize = 8;
            let length = radius * 2.5;
            for i in 0..RAYS {
                let angle = i as f64 / RAYS as f64 * TAU;
                canvas.line_hsla(
                    self.x,
                    self.y,
                    self.x + angle.cos() * length,
                    self.y + angle.sin() * length,
                    self.hue,
                    80.0,
                    80.0,
                    fade * 0.6,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fireworks::{
        NullSound, PerformanceTier, RandomSource, ShowOptions, TICK, Viewport,
    };

    fn launch(start: (f64, f64), target: (f64, f64)) -> PendingLaunch {
        PendingLaunch::ascent(start.0, start.1, target.0, target.1, 0.0)
    }

    /// Drive a rocket with a fresh context each tick, advancing `now`.
    fn run_until_arrival(rocket: &mut Rocket, view: Viewport) -> usize {
        let mut rng = RandomSource::new();
        let opts = ShowOptions::default();
        let mut sound = NullSound;
        let mut pending = Vec::new();
        let mut now = 0.0;
        for tick in 0..2000 {
            let mut ctx = TickCtx {
                rng: &mut rng,
                tier: PerformanceTier::High,
                options: &opts,
                view,
                now,
                sound: &mut sound,
                pending: &mut pending,
            };
            rocket.update(&mut ctx);
            now += TICK;
            if rocket.has_arrived() {
                return tick;
            }
        }
        panic!("rocket never arrived");
    }

    #[test]
    fn rocket_snaps_exactly_to_target() {
        let view = Viewport::new(800, 600);
        let mut rng = RandomSource::new();
        for _ in 0..20 {
            let mut rocket =
                Rocket::from_launch(&launch((400.0, 590.0), (400.0, 200.0)), view, &mut rng);
            run_until_arrival(&mut rocket, view);
            assert_eq!(rocket.x, 400.0);
            assert_eq!(rocket.y, 200.0);
        }
    }

    #[test]
    fn detonation_is_idempotent() {
        let view = Viewport::new(800, 600);
        let mut rng = RandomSource::new();
        let opts = ShowOptions::default();
        let mut sound = NullSound;
        let mut pending = Vec::new();
        let mut rocket =
            Rocket::from_launch(&launch((100.0, 500.0), (100.0, 100.0)), view, &mut rng);
        let mut ctx = TickCtx {
            rng: &mut rng,
            tier: PerformanceTier::High,
            options: &opts,
            view,
            now: 1.0,
            sound: &mut sound,
            pending: &mut pending,
        };
        rocket.detonate_now(&mut ctx);
        let count = rocket.particles().len();
        let pending_count = ctx.pending.len();
        rocket.detonate_now(&mut ctx);
        assert_eq!(rocket.particles().len(), count);
        assert_eq!(ctx.pending.len(), pending_count);
    }

    #[test]
    fn recursive_rockets_never_schedule_secondaries() {
        let view = Viewport::new(800, 600);
        let mut rng = RandomSource::new();
        let opts = ShowOptions::default();
        let mut sound = NullSound;
        let mut pending = Vec::new();
        for _ in 0..50 {
            let mut spec = launch((100.0, 500.0), (100.0, 100.0));
            spec.recursive = true;
            let mut rocket = Rocket::from_launch(&spec, view, &mut rng);
            let mut ctx = TickCtx {
                rng: &mut rng,
                tier: PerformanceTier::High,
                options: &opts,
                view,
                now: 0.0,
                sound: &mut sound,
                pending: &mut pending,
            };
            rocket.detonate_now(&mut ctx);
        }
        assert!(pending.is_empty());
    }

    #[test]
    fn primary_detonations_sometimes_schedule_valid_secondaries() {
        let view = Viewport::new(800, 600);
        let mut rng = RandomSource::new();
        let opts = ShowOptions::default();
        let mut sound = NullSound;
        let mut pending = Vec::new();
        for _ in 0..200 {
            let mut spec = launch((400.0, 500.0), (400.0, 150.0));
            spec.effect = Some(EffectKind::Normal);
            let mut rocket = Rocket::from_launch(&spec, view, &mut rng);
            rocket.recursive = false;
            let mut ctx = TickCtx {
                rng: &mut rng,
                tier: PerformanceTier::High,
                options: &opts,
                view,
                now: 0.0,
                sound: &mut sound,
                pending: &mut pending,
            };
            rocket.detonate_now(&mut ctx);
        }
        assert!(!pending.is_empty(), "no secondaries in 200 primaries is implausible");
        for p in &pending {
            assert!(p.recursive && p.pre_detonated);
            assert!((0.2..=0.4).contains(&p.delay));
            assert!(p.hue.is_some());
        }
    }

    #[test]
    fn low_tier_primary_normal_burst_has_thirty_particles() {
        let view = Viewport::new(800, 600);
        let mut rng = RandomSource::new();
        let opts = ShowOptions::default();
        let mut sound = NullSound;
        let mut pending = Vec::new();
        let mut spec = launch((400.0, 500.0), (400.0, 150.0));
        spec.effect = Some(EffectKind::Normal);
        let mut rocket = Rocket::from_launch(&spec, view, &mut rng);
        rocket.recursive = false;
        let mut ctx = TickCtx {
            rng: &mut rng,
            tier: PerformanceTier::Low,
            options: &opts,
            view,
            now: 0.0,
            sound: &mut sound,
            pending: &mut pending,
        };
        rocket.detonate_now(&mut ctx);
        assert_eq!(rocket.particles().len(), 30);
    }

    #[test]
    fn zero_distance_launch_stays_finite() {
        let view = Viewport::new(800, 600);
        let mut rng = RandomSource::new();
        let opts = ShowOptions::default();
        let mut sound = NullSound;
        let mut pending = Vec::new();
        let mut rocket =
            Rocket::from_launch(&launch((200.0, 300.0), (200.0, 300.0)), view, &mut rng);
        let mut now = 0.0;
        for _ in 0..10 {
            let mut ctx = TickCtx {
                rng: &mut rng,
                tier: PerformanceTier::High,
                options: &opts,
                view,
                now,
                sound: &mut sound,
                pending: &mut pending,
            };
            rocket.update(&mut ctx);
            now += TICK;
            assert!(rocket.x.is_finite() && rocket.y.is_finite());
        }
    }

    #[test]
    fn rocket_lifecycle_terminates_within_bounded_ticks() {
        let view = Viewport::new(800, 600);
        let mut rng = RandomSource::new();
        let opts = ShowOptions::default();
        let mut sound = NullSound;
        let mut pending = Vec::new();
        let mut spec = launch((400.0, 590.0), (350.0, 180.0));
        spec.effect = Some(EffectKind::Normal);
        let mut rocket = Rocket::from_launch(&spec, view, &mut rng);
        let mut now = 0.0;
        let mut ticks = 0;
        loop {
            let mut ctx = TickCtx {
                rng: &mut rng,
                tier: PerformanceTier::High,
                options: &opts,
                view,
                now,
                sound: &mut sound,
                pending: &mut pending,
            };
            if !rocket.update(&mut ctx) {
                break;
            }
            now += TICK;
            ticks += 1;
            assert!(ticks < 2000, "rocket never finished");
        }
    }
}
