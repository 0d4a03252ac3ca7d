use super::{RandomSource, TICK, wrap_hue};
use crate::render::Canvas;

/// Recursion depth cap for self-detonating particle chains.
pub const MAX_GENERATION: u8 = 2;
/// Lifespan below which a cascade-capable particle rolls for detonation.
const CASCADE_THRESHOLD: f64 = 0.7;
/// Probability the roll succeeds.
const CASCADE_PROBABILITY: f64 = 0.2;
/// Children spawned by a successful cascade.
const CASCADE_CHILDREN: usize = 5;

/// Baseline per-tick physics. Effects may override per instance.
pub const DEFAULT_GRAVITY: f64 = 0.08;
pub const DEFAULT_FRICTION: f64 = 0.98;
pub const DEFAULT_DECAY: f64 = 0.01;

/// How a particle is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Circle,
    Star,
    Heart,
}

/// Motion law. Most particles are ballistic; shaped particles (heart points)
/// burst outward, elastically settle onto a target offset, then fall.
#[derive(Debug, Clone)]
pub enum Motion {
    Ballistic,
    Shaped {
        /// Shape origin (the explosion center).
        home_x: f64,
        home_y: f64,
        /// This particle's resting offset within the shape.
        offset_x: f64,
        offset_y: f64,
        /// Seconds elapsed since activation.
        phase: f64,
        /// Duration of each of the first two phases.
        transition: f64,
    },
}

/// Friction during the shaped burst-out phase.
const SHAPED_BURST_FRICTION: f64 = 0.92;
/// Slow decay while the shape holds, fast decay once it starts to fall.
const SHAPED_HOLD_DECAY: f64 = 0.005;
const SHAPED_FALL_DECAY: f64 = 0.015;

pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub hue: f64,
    pub shape: Shape,
    /// 1.0 = fully alive, <= 0.0 = terminal (unless children remain).
    pub lifespan: f64,
    /// Lifespan lost per tick.
    pub decay: f64,
    pub gravity: f64,
    pub friction: f64,
    pub size: f64,
    pub brightness: f64,
    /// Cascade recursion depth, capped at MAX_GENERATION.
    pub generation: u8,
    /// Seconds of inertness before the particle activates.
    pub delay: f64,
    pub active: bool,
    /// Allowed to self-detonate into children.
    pub can_cascade: bool,
    cascade_spent: bool,
    pub children: Vec<Particle>,
    pub motion: Motion,
}

impl Particle {
    pub fn new(
        x: f64,
        y: f64,
        vx: f64,
        vy: f64,
        hue: f64,
        shape: Shape,
        generation: u8,
        can_cascade: bool,
        delay: f64,
        rng: &mut RandomSource,
    ) -> Self {
        Particle {
            x,
            y,
            vx,
            vy,
            hue: wrap_hue(hue),
            shape,
            lifespan: 1.0,
            decay: DEFAULT_DECAY,
            gravity: DEFAULT_GRAVITY,
            friction: DEFAULT_FRICTION,
            size: rng.uniform(1.5, 3.5),
            brightness: rng.uniform(40.0, 60.0),
            generation,
            delay,
            active: delay <= 0.0,
            can_cascade,
            cascade_spent: false,
            children: Vec::new(),
            motion: Motion::Ballistic,
        }
    }

    /// Advance one fixed tick. Returns false once the particle and all of its
    /// children are finished.
    pub fn update(&mut self, rng: &mut RandomSource) -> bool {
        if !self.active {
            self.delay -= TICK;
            if self.delay <= 0.0 {
                self.active = true;
            }
            // Inert particles never count as dead.
            return true;
        }

        self.children.retain_mut(|child| child.update(rng));

        match &mut self.motion {
            Motion::Ballistic => {
                self.x += self.vx;
                self.y += self.vy;
                self.vx *= self.friction;
                self.vy *= self.friction;
                self.vy += self.gravity;
                self.lifespan -= self.decay;
            }
            Motion::Shaped {
                home_x,
                home_y,
                offset_x,
                offset_y,
                phase,
                transition,
            } => {
                *phase += TICK;
                let t = *transition;
                if *phase < t {
                    // Burst outward.
                    self.x += self.vx;
                    self.y += self.vy;
                    self.vx *= SHAPED_BURST_FRICTION;
                    self.vy *= SHAPED_BURST_FRICTION;
                } else if *phase < t * 2.0 {
                    // Elastic ease onto the shape, with a breathing scale.
                    let progress = (*phase - t) / t;
                    let eased = elastic_ease(progress);
                    let scale = 1.0 + (progress * std::f64::consts::PI).sin() * 0.4;
                    let tx = *home_x + *offset_x * scale;
                    let ty = *home_y + *offset_y * scale;
                    self.x += (tx - self.x) * eased;
                    self.y += (ty - self.y) * eased;
                } else {
                    // Hold the shape with a heartbeat pulse, then sink.
                    let pulse = 1.0 + (*phase * 2.0).sin() * 0.15;
                    let fall = *phase - t * 2.0;
                    self.x = *home_x + *offset_x * pulse + (*phase * 1.5).sin() * 0.6;
                    self.y = *home_y + *offset_y * pulse + fall * 1.2;
                }
                self.lifespan -= if *phase > t * 2.5 {
                    SHAPED_FALL_DECAY
                } else {
                    SHAPED_HOLD_DECAY
                };
            }
        }

        // One roll per particle, the first time lifespan dips below threshold.
        if self.can_cascade
            && !self.cascade_spent
            && self.generation < MAX_GENERATION
            && self.lifespan < CASCADE_THRESHOLD
        {
            self.cascade_spent = true;
            if rng.chance(CASCADE_PROBABILITY) {
                self.cascade(rng);
            }
        }

        self.lifespan > 0.0 || !self.children.is_empty()
    }

    /// Spawn a fan of child particles at the current position.
    fn cascade(&mut self, rng: &mut RandomSource) {
        if self.generation >= MAX_GENERATION {
            return;
        }
        let step = std::f64::consts::TAU / CASCADE_CHILDREN as f64;
        for i in 0..CASCADE_CHILDREN {
            let angle = step * i as f64 + rng.uniform(-0.2, 0.2);
            let speed = rng.uniform(1.0, 4.0);
            let hue = wrap_hue(self.hue + rng.uniform(-20.0, 20.0));
            self.children.push(Particle::new(
                self.x,
                self.y,
                angle.cos() * speed,
                angle.sin() * speed,
                hue,
                Shape::Circle,
                self.generation + 1,
                self.can_cascade,
                0.0,
                rng,
            ));
        }
    }

    pub fn render(&self, canvas: &mut Canvas) {
        if !self.active {
            return;
        }
        for child in &self.children {
            child.render(canvas);
        }

        let saturation = (100.0 - self.generation as f64 * 15.0).max(0.0);
        let lightness = (self.brightness + self.generation as f64 * 10.0).min(95.0);
        let alpha = self.lifespan.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }

        match self.shape {
            Shape::Circle => {
                canvas.disc_hsla(self.x, self.y, self.size * 0.5, self.hue, saturation, lightness, alpha);
            }
            Shape::Star => self.render_star(canvas, saturation, lightness, alpha),
            Shape::Heart => self.render_heart(canvas, saturation, lightness, alpha),
        }

        // Sparkle core while still bright.
        if self.lifespan > 0.5 {
            canvas.plot_hsla(self.x, self.y, self.hue, 100.0, 75.0, alpha * 0.5 + 0.5);
        }
    }

    /// 5-point star outline, inner radius half the outer.
    fn render_star(&self, canvas: &mut Canvas, saturation: f64, lightness: f64, alpha: f64) {
        const SPIKES: usize = 5;
        let outer = self.size;
        let inner = self.size * 0.5;
        let mut rot = std::f64::consts::PI / 2.0 * 3.0;
        let step = std::f64::consts::PI / SPIKES as f64;

        let mut px = self.x;
        let mut py = self.y - outer;
        for _ in 0..SPIKES {
            for radius in [outer, inner] {
                rot += step;
                let nx = self.x + rot.cos() * radius;
                let ny = self.y + rot.sin() * radius;
                canvas.line_hsla(px, py, nx, ny, self.hue, saturation, lightness, alpha);
                px = nx;
                py = ny;
            }
        }
        canvas.line_hsla(px, py, self.x, self.y - outer, self.hue, saturation, lightness, alpha);
    }

    /// Parametric heart outline scaled to the particle size.
    fn render_heart(&self, canvas: &mut Canvas, saturation: f64, lightness: f64, alpha: f64) {
        const POINTS: usize = 12;
        let scale = self.size / 16.0;
        for i in 0..POINTS {
            let t = i as f64 / POINTS as f64 * std::f64::consts::TAU;
            let (hx, hy) = heart_point(t);
            canvas.plot_hsla(
                self.x + hx * scale,
                self.y + hy * scale,
                self.hue,
                saturation,
                lightness,
                alpha,
            );
        }
    }
}

/// Classic parametric heart curve, y negated so it points up in screen space.
pub fn heart_point(t: f64) -> (f64, f64) {
    let x = 16.0 * t.sin().powi(3);
    let y = -(13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos());
    (x, y)
}

/// Overshoot-and-settle easing used by shaped particles.
fn elastic_ease(t: f64) -> f64 {
    let p = 0.4;
    (2.0f64).powf(-10.0 * t) * ((t - p / 4.0) * std::f64::consts::TAU / p).sin() + 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_particle(rng: &mut RandomSource, can_cascade: bool, delay: f64) -> Particle {
        Particle::new(100.0, 100.0, 1.0, -2.0, 30.0, Shape::Circle, 0, can_cascade, delay, rng)
    }

    #[test]
    fn lifespan_strictly_decreases_while_active() {
        let mut rng = RandomSource::new();
        let mut p = test_particle(&mut rng, false, 0.0);
        let mut prev = p.lifespan;
        for _ in 0..50 {
            p.update(&mut rng);
            assert!(p.lifespan < prev);
            prev = p.lifespan;
        }
    }

    #[test]
    fn delayed_particle_is_inert_for_expected_ticks() {
        let mut rng = RandomSource::new();
        let mut p = test_particle(&mut rng, false, 0.5);
        assert!(!p.active);
        let (x0, y0) = (p.x, p.y);
        // 0.5s / (1/60) = 30 ticks of inertness.
        for tick in 0..60 {
            let alive = p.update(&mut rng);
            assert!(alive || tick > 30);
            if tick < 29 {
                assert!(!p.active, "activated early at tick {tick}");
                assert_eq!((p.x, p.y), (x0, y0));
            }
        }
        assert!(p.active);
    }

    #[test]
    fn particle_terminates_within_bounded_ticks() {
        let mut rng = RandomSource::new();
        // Worst case: cascade-capable, so children may extend life. Bound is
        // initial lifespan / decay for each generation plus delay slack.
        let mut p = test_particle(&mut rng, true, 0.0);
        let mut ticks = 0;
        while p.update(&mut rng) {
            ticks += 1;
            assert!(ticks < 400, "particle never terminated");
        }
    }

    #[test]
    fn cascade_depth_never_exceeds_cap() {
        fn max_depth(p: &Particle) -> u8 {
            p.children
                .iter()
                .map(max_depth)
                .max()
                .unwrap_or(p.generation)
                .max(p.generation)
        }
        let mut rng = RandomSource::new();
        // Run many cascade-capable particles to exercise the probabilistic path.
        for _ in 0..50 {
            let mut p = test_particle(&mut rng, true, 0.0);
            while p.update(&mut rng) {
                assert!(max_depth(&p) <= MAX_GENERATION);
            }
        }
    }

    #[test]
    fn cascade_rolls_exactly_once() {
        let mut rng = RandomSource::new();
        let mut p = test_particle(&mut rng, true, 0.0);
        while p.lifespan >= CASCADE_THRESHOLD {
            p.update(&mut rng);
        }
        p.update(&mut rng);
        assert!(p.cascade_spent);
        let children_after_roll = p.children.len();
        // Further updates never add first-generation children.
        for _ in 0..20 {
            p.update(&mut rng);
            let direct = p.children.iter().filter(|c| c.generation == 1).count();
            assert!(direct <= children_after_roll.max(CASCADE_CHILDREN));
        }
    }

    #[test]
    fn hue_is_wrapped_on_construction() {
        let mut rng = RandomSource::new();
        let p = Particle::new(0.0, 0.0, 0.0, 0.0, 400.0, Shape::Star, 0, false, 0.0, &mut rng);
        assert!((0.0..360.0).contains(&p.hue));
    }

    #[test]
    fn shaped_particle_settles_near_target() {
        let mut rng = RandomSource::new();
        let mut p = test_particle(&mut rng, false, 0.0);
        p.motion = Motion::Shaped {
            home_x: 100.0,
            home_y: 100.0,
            offset_x: 10.0,
            offset_y: -5.0,
            phase: 0.0,
            transition: 0.4,
        };
        // Run through burst and settle phases (0.8s = 48 ticks).
        for _ in 0..50 {
            p.update(&mut rng);
        }
        assert!((p.x - 110.0).abs() < 8.0);
        assert!((p.y - 95.0).abs() < 8.0);
    }
}
