//! Explosion pattern library.
//!
//! Every pattern is described by an [`EffectSpec`]: optional preamble rings,
//! one body layout, optional scattered filler, optional center rays, and a set
//! of probabilistic decoration rules. A single interpreter consumes the
//! descriptor, so adding a pattern means adding a parameter table, not
//! another generator.
//! All velocity/radius literals are tuning constants, not contract.

use super::particle::{DEFAULT_GRAVITY, Motion, Particle, Shape, heart_point};
use super::{PerformanceTier, RandomSource, ShowOptions, wrap_hue};
use std::f64::consts::{PI, TAU};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Normal,
    Spiral,
    Heart,
    Star,
    Circle,
    Burst,
    Dna,
    Butterfly,
    Galaxy,
    Willow,
    Palm,
    Dahlia,
    Waterfall,
    Phoenix,
    Rain,
    Flower,
}

pub const ALL_EFFECTS: [EffectKind; 16] = [
    EffectKind::Normal,
    EffectKind::Spiral,
    EffectKind::Heart,
    EffectKind::Star,
    EffectKind::Circle,
    EffectKind::Burst,
    EffectKind::Dna,
    EffectKind::Butterfly,
    EffectKind::Galaxy,
    EffectKind::Willow,
    EffectKind::Palm,
    EffectKind::Dahlia,
    EffectKind::Waterfall,
    EffectKind::Phoenix,
    EffectKind::Rain,
    EffectKind::Flower,
];

impl EffectKind {
    pub fn name(self) -> &'static str {
        match self {
            EffectKind::Normal => "normal",
            EffectKind::Spiral => "spiral",
            EffectKind::Heart => "heart",
            EffectKind::Star => "star",
            EffectKind::Circle => "circle",
            EffectKind::Burst => "burst",
            EffectKind::Dna => "dna",
            EffectKind::Butterfly => "butterfly",
            EffectKind::Galaxy => "galaxy",
            EffectKind::Willow => "willow",
            EffectKind::Palm => "palm",
            EffectKind::Dahlia => "dahlia",
            EffectKind::Waterfall => "waterfall",
            EffectKind::Phoenix => "phoenix",
            EffectKind::Rain => "rain",
            EffectKind::Flower => "flower",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        ALL_EFFECTS.iter().copied().find(|e| e.name() == name)
    }

    /// Uniform draw over the registered effect set.
    pub fn random(rng: &mut RandomSource) -> Self {
        ALL_EFFECTS[rng.uniform_int(0, ALL_EFFECTS.len() as i64 - 1) as usize]
    }
}

/// A uniform ring or omnidirectional burst emitted before the body layout.
struct RingSpec {
    count: usize,
    speed: f64,
    speed_jitter: f64,
    hue_off: f64,
    shape: Shape,
    delay: f64,
}

/// Filler particles scattered uniformly in an annulus around the origin.
struct ScatterSpec {
    count: usize,
    radius_min: f64,
    radius_max: f64,
    hue_off: f64,
    shape: Shape,
    delay_max: f64,
}

/// Straight rays of particles stepping outward from the center.
struct RaySpec {
    rays: usize,
    length_min: f64,
    length_max: f64,
    steps: usize,
    hue_off: f64,
}

/// Companion particle rule, rolled once per primary body particle.
struct DecorRule {
    prob: f64,
    shape: Shape,
    speed_mul: f64,
    hue_off: f64,
    angle_jitter: f64,
    delay_off: f64,
    lifespan: f64,
    /// Progress band [lo, hi) within which the rule applies.
    band: (f64, f64),
}

const FULL_BAND: (f64, f64) = (0.0, 1.01);

/// The per-effect geometry.
enum Body {
    /// Even radial fan with jitter.
    Fan {
        speed: f64,
        speed_jitter: (f64, f64),
        radius_jitter: (f64, f64),
        angle_jitter: f64,
        hue_jitter: f64,
        shape: Shape,
        delay_max: f64,
        /// Fraction of particles allowed to self-detonate.
        cascade_prob: f64,
    },
    /// Multi-arm spiral, radius growing along each arm.
    Arms {
        arms_min: i64,
        arms_max: i64,
        winds: f64,
        radius_base: f64,
        radius_growth: f64,
        hue_ramp: f64,
        delay_ramp: f64,
    },
    /// Concentric rings with optional zigzag modulation and tangential swirl.
    Rings {
        rings: usize,
        radius_base: f64,
        radius_step: f64,
        zigzag: bool,
        swirl: f64,
        hue_step: f64,
    },
    /// Double-helix ladder.
    Helix {
        rotations: f64,
        strands: usize,
        radius: f64,
        length: f64,
    },
    /// Layered symmetric wings traced by a parametric formula.
    Wings {
        layers: usize,
        layer_scale: f64,
        layer_delay: f64,
        formula: WingFormula,
        lift: f64,
        /// Tail feather fan below the body, 0 disables.
        tail: usize,
    },
    /// Spiral-arm galaxy with progress-growing radius.
    Galaxy {
        arms: usize,
        winds: f64,
        radius_base: f64,
        radius_growth: f64,
    },
    /// Drooping streams (willow). Velocity tapers and gravity pulls tips down.
    Streams {
        streams: usize,
        layers: usize,
        speed_min: f64,
        speed_max: f64,
        taper: f64,
        droop: f64,
    },
    /// Rising trunk plus arcing fronds (palm).
    Palm {
        trunk_frac: f64,
        fronds: usize,
        trunk_speed: f64,
        frond_speed: f64,
    },
    /// Layered petals around the center (dahlia, flower).
    Petals {
        layers: usize,
        petals: usize,
        layer_scale: f64,
        layer_delay: f64,
        hue_step: f64,
        radius_growth: f64,
    },
    /// Downward streams (waterfall, rain).
    Fall {
        streams: usize,
        spread: f64,
        speed_base: f64,
        speed_growth: f64,
        cascade: bool,
        sparkles: usize,
    },
    /// Five-pointed star rays with trailing tails.
    StarPoints {
        points: usize,
        spread: f64,
        radius_base: f64,
        radius_growth: f64,
        tail_frac: f64,
    },
    /// Heart outline with shaped (three-phase) motion plus loose decoration.
    HeartShape {
        size: f64,
        transition: f64,
        point_scale: f64,
        decor_scale: f64,
    },
}

#[derive(Clone, Copy)]
enum WingFormula {
    /// sin(t)·(1+cos 2t) lobes, mirrored left/right.
    Butterfly,
    /// Long swept-back wings.
    Phoenix,
}

impl WingFormula {
    fn point(self, t: f64, side: f64, scale: f64) -> (f64, f64) {
        match self {
            WingFormula::Butterfly => {
                let shape = t.sin() * (1.0 + (2.0 * t).cos());
                (side * shape * 3.0 * scale, t.cos() * (2.0 * t).sin() * 3.0 * scale)
            }
            WingFormula::Phoenix => {
                let wing_angle = PI * 0.3;
                (
                    side * t.sin() * wing_angle.cos() * 3.0 * scale,
                    -t.cos() * wing_angle.sin() * 4.0 * scale,
                )
            }
        }
    }
}

struct EffectSpec {
    /// Multiplier on the requested base count before tier scaling.
    count_scale: f64,
    preamble: &'static [RingSpec],
    body: Body,
    scatter: &'static [ScatterSpec],
    rays: Option<RaySpec>,
    decor: &'static [DecorRule],
}

// Shared decoration sets. Primary >> secondary >> decorative velocity scale.
const SPARK_MIST_GLITTER: &[DecorRule] = &[
    DecorRule {
        prob: 0.4,
        shape: Shape::Star,
        speed_mul: 1.2,
        hue_off: 60.0,
        angle_jitter: 0.25,
        delay_off: 0.1,
        lifespan: 0.9,
        band: FULL_BAND,
    },
    DecorRule {
        prob: 0.3,
        shape: Shape::Circle,
        speed_mul: 0.7,
        hue_off: -30.0,
        angle_jitter: 0.4,
        delay_off: 0.15,
        lifespan: 0.7,
        band: (0.2, 1.01),
    },
    DecorRule {
        prob: 0.5,
        shape: Shape::Star,
        speed_mul: 1.05,
        hue_off: 60.0,
        angle_jitter: 0.1,
        delay_off: 0.0,
        lifespan: 0.8,
        band: (0.8, 1.01),
    },
];

const SPARK_ONLY: &[DecorRule] = &[DecorRule {
    prob: 0.3,
    shape: Shape::Star,
    speed_mul: 0.8,
    hue_off: 40.0,
    angle_jitter: 0.2,
    delay_off: 0.1,
    lifespan: 0.8,
    band: FULL_BAND,
}];

fn descriptor(kind: EffectKind) -> EffectSpec {
    match kind {
        EffectKind::Normal => EffectSpec {
            count_scale: 1.0,
            preamble: &[],
            body: Body::Fan {
                speed: 3.0,
                speed_jitter: (-0.5, 1.5),
                radius_jitter: (0.8, 1.2),
                angle_jitter: 0.15,
                hue_jitter: 10.0,
                shape: Shape::Circle,
                delay_max: 0.2,
                cascade_prob: 0.0,
            },
            scatter: &[],
            rays: None,
            decor: &[],
        },
        EffectKind::Spiral => EffectSpec {
            count_scale: 1.0,
            preamble: &[],
            body: Body::Arms {
                arms_min: 2,
                arms_max: 4,
                winds: 3.0,
                radius_base: 2.0,
                radius_growth: 3.0,
                hue_ramp: 30.0,
                delay_ramp: 0.3,
            },
            scatter: &[],
            rays: None,
            decor: &[],
        },
        EffectKind::Heart => EffectSpec {
            count_scale: 1.0,
            preamble: &[],
            body: Body::HeartShape {
                size: 40.0,
                transition: 0.4,
                point_scale: 1.8,
                decor_scale: 0.8,
            },
            scatter: &[],
            rays: None,
            decor: &[],
        },
        EffectKind::Star => EffectSpec {
            count_scale: 1.0,
            preamble: &[],
            body: Body::StarPoints {
                points: 5,
                spread: PI / 8.0,
                radius_base: 2.0,
                radius_growth: 4.0,
                tail_frac: 0.3,
            },
            scatter: &[],
            rays: None,
            decor: SPARK_ONLY,
        },
        EffectKind::Circle => EffectSpec {
            count_scale: 1.0,
            preamble: &[],
            body: Body::Rings {
                rings: 3,
                radius_base: 2.0,
                radius_step: 1.5,
                zigzag: true,
                swirl: 0.2,
                hue_step: 25.0,
            },
            scatter: &[],
            rays: None,
            decor: SPARK_ONLY,
        },
        EffectKind::Burst => EffectSpec {
            count_scale: 1.0,
            preamble: &[],
            body: Body::Fan {
                speed: 3.0,
                speed_jitter: (0.0, 2.0),
                radius_jitter: (1.0, 1.0),
                angle_jitter: 0.1,
                hue_jitter: 0.0,
                shape: Shape::Star,
                delay_max: 0.0,
                cascade_prob: 0.2,
            },
            scatter: &[],
            rays: None,
            decor: &[],
        },
        EffectKind::Dna => EffectSpec {
            count_scale: 1.0,
            preamble: &[],
            body: Body::Helix {
                rotations: 3.0,
                strands: 2,
                radius: 5.0,
                length: 20.0,
            },
            scatter: &[],
            rays: None,
            decor: &[],
        },
        EffectKind::Butterfly => EffectSpec {
            count_scale: 1.0,
            preamble: &[
                RingSpec {
                    count: 40,
                    speed: 4.0,
                    speed_jitter: 2.0,
                    hue_off: 30.0,
                    shape: Shape::Star,
                    delay: 0.0,
                },
                RingSpec {
                    count: 30,
                    speed: 2.0,
                    speed_jitter: 0.0,
                    hue_off: 60.0,
                    shape: Shape::Circle,
                    delay: 0.1,
                },
            ],
            body: Body::Wings {
                layers: 4,
                layer_scale: 0.2,
                layer_delay: 0.1,
                formula: WingFormula::Butterfly,
                lift: 0.5,
                tail: 0,
            },
            scatter: &[],
            rays: None,
            decor: SPARK_MIST_GLITTER,
        },
        EffectKind::Galaxy => EffectSpec {
            count_scale: 1.0,
            preamble: &[
                RingSpec {
                    count: 50,
                    speed: 4.0,
                    speed_jitter: 2.0,
                    hue_off: 30.0,
                    shape: Shape::Star,
                    delay: 0.0,
                },
                RingSpec {
                    count: 40,
                    speed: 2.0,
                    speed_jitter: 0.0,
                    hue_off: 60.0,
                    shape: Shape::Circle,
                    delay: 0.1,
                },
            ],
            body: Body::Galaxy {
                arms: 5,
                winds: 2.0,
                radius_base: 1.0,
                radius_growth: 6.0,
            },
            scatter: &[
                ScatterSpec {
                    count: 60,
                    radius_min: 4.0,
                    radius_max: 8.0,
                    hue_off: 80.0,
                    shape: Shape::Star,
                    delay_max: 0.5,
                },
                ScatterSpec {
                    count: 40,
                    radius_min: 2.0,
                    radius_max: 8.0,
                    hue_off: 120.0,
                    shape: Shape::Circle,
                    delay_max: 0.3,
                },
            ],
            rays: Some(RaySpec {
                rays: 8,
                length_min: 3.0,
                length_max: 5.0,
                steps: 5,
                hue_off: 40.0,
            }),
            decor: SPARK_MIST_GLITTER,
        },
        EffectKind::Willow => EffectSpec {
            count_scale: 1.0,
            preamble: &[RingSpec {
                count: 30,
                speed: 3.0,
                speed_jitter: 1.0,
                hue_off: 30.0,
                shape: Shape::Star,
                delay: 0.0,
            }],
            body: Body::Streams {
                streams: 12,
                layers: 2,
                speed_min: 2.0,
                speed_max: 4.0,
                taper: 1.5,
                droop: 0.2,
            },
            scatter: &[],
            rays: None,
            decor: SPARK_MIST_GLITTER,
        },
        EffectKind::Palm => EffectSpec {
            count_scale: 1.0,
            preamble: &[],
            body: Body::Palm {
                trunk_frac: 0.2,
                fronds: 6,
                trunk_speed: 5.0,
                frond_speed: 4.0,
            },
            scatter: &[],
            rays: None,
            decor: SPARK_ONLY,
        },
        EffectKind::Dahlia => EffectSpec {
            count_scale: 1.2,
            preamble: &[
                RingSpec {
                    count: 80,
                    speed: 5.0,
                    speed_jitter: 3.0,
                    hue_off: 30.0,
                    shape: Shape::Star,
                    delay: 0.0,
                },
                RingSpec {
                    count: 50,
                    speed: 3.0,
                    speed_jitter: 0.0,
                    hue_off: 60.0,
                    shape: Shape::Circle,
                    delay: 0.1,
                },
            ],
            body: Body::Petals {
                layers: 6,
                petals: 8,
                layer_scale: 0.4,
                layer_delay: 0.12,
                hue_step: 20.0,
                radius_growth: 3.0,
            },
            scatter: &[],
            rays: Some(RaySpec {
                rays: 16,
                length_min: 2.0,
                length_max: 4.0,
                steps: 5,
                hue_off: 40.0,
            }),
            decor: SPARK_MIST_GLITTER,
        },
        EffectKind::Waterfall => EffectSpec {
            count_scale: 1.0,
            preamble: &[
                RingSpec {
                    count: 40,
                    speed: 3.0,
                    speed_jitter: 2.0,
                    hue_off: 30.0,
                    shape: Shape::Star,
                    delay: 0.0,
                },
                RingSpec {
                    count: 30,
                    speed: 2.0,
                    speed_jitter: 0.0,
                    hue_off: 60.0,
                    shape: Shape::Circle,
                    delay: 0.1,
                },
            ],
            body: Body::Fall {
                streams: 8,
                spread: PI / 8.0,
                speed_base: 2.0,
                speed_growth: 3.0,
                cascade: true,
                sparkles: 40,
            },
            scatter: &[],
            rays: None,
            decor: &[],
        },
        EffectKind::Phoenix => EffectSpec {
            count_scale: 1.0,
            preamble: &[
                RingSpec {
                    count: 50,
                    speed: 4.0,
                    speed_jitter: 2.0,
                    hue_off: 60.0,
                    shape: Shape::Star,
                    delay: 0.0,
                },
                RingSpec {
                    count: 40,
                    speed: 3.0,
                    speed_jitter: 0.0,
                    hue_off: 30.0,
                    shape: Shape::Circle,
                    delay: 0.1,
                },
            ],
            body: Body::Wings {
                layers: 4,
                layer_scale: 0.3,
                layer_delay: 0.15,
                formula: WingFormula::Phoenix,
                lift: 0.5,
                tail: 15,
            },
            scatter: &[],
            rays: None,
            decor: SPARK_MIST_GLITTER,
        },
        EffectKind::Rain => EffectSpec {
            count_scale: 1.0,
            preamble: &[],
            body: Body::Fall {
                streams: 5,
                spread: PI / 5.0,
                speed_base: 1.5,
                speed_growth: 2.5,
                cascade: false,
                sparkles: 20,
            },
            scatter: &[],
            rays: None,
            decor: SPARK_ONLY,
        },
        EffectKind::Flower => EffectSpec {
            count_scale: 1.0,
            preamble: &[RingSpec {
                count: 20,
                speed: 2.0,
                speed_jitter: 0.5,
                hue_off: 60.0,
                shape: Shape::Circle,
                delay: 0.0,
            }],
            body: Body::Petals {
                layers: 3,
                petals: 6,
                layer_scale: 0.3,
                layer_delay: 0.1,
                hue_step: 30.0,
                radius_growth: 2.5,
            },
            scatter: &[],
            rays: None,
            decor: SPARK_ONLY,
        },
    }
}

/// Populate `out` with the particle field for one explosion.
///
/// `base_count` is the rocket's budget (full or secondary); the performance
/// tier is applied here, at explosion time. A count that truncates to zero
/// for some sub-group simply yields no particles for that group.
pub fn generate(
    kind: EffectKind,
    origin_x: f64,
    origin_y: f64,
    hue: f64,
    base_count: usize,
    tier: PerformanceTier,
    options: &ShowOptions,
    view_scale: f64,
    rng: &mut RandomSource,
    out: &mut Vec<Particle>,
) {
    let spec = descriptor(kind);
    let count = tier.scale((base_count as f64 * spec.count_scale) as usize);

    let mut e = Emitter {
        ox: origin_x,
        oy: origin_y,
        hue,
        vel: view_scale * options.speed,
        size_mul: options.particle_size / 2.0,
        rng,
        out,
    };

    for ring in spec.preamble {
        e.ring(ring, tier);
    }
    e.body(&spec.body, count, spec.decor);
    for scatter in spec.scatter {
        e.scatter(scatter, tier);
    }
    if let Some(rays) = &spec.rays {
        e.rays(rays);
    }
}

/// Scratch state shared by the interpreter helpers.
struct Emitter<'a> {
    ox: f64,
    oy: f64,
    hue: f64,
    /// World velocity scale (viewport scale x speed option).
    vel: f64,
    size_mul: f64,
    rng: &'a mut RandomSource,
    out: &'a mut Vec<Particle>,
}

impl Emitter<'_> {
    /// Spawn one particle. Velocity is in effect units, scaled here. Returns
    /// a borrow so callers can override physics or motion.
    fn spawn(
        &mut self,
        vx: f64,
        vy: f64,
        hue_off: f64,
        shape: Shape,
        delay: f64,
    ) -> &mut Particle {
        let mut p = Particle::new(
            self.ox,
            self.oy,
            vx * self.vel,
            vy * self.vel,
            wrap_hue(self.hue + hue_off),
            shape,
            0,
            false,
            delay,
            self.rng,
        );
        p.size *= self.size_mul;
        self.out.push(p);
        self.out.last_mut().unwrap()
    }

    fn ring(&mut self, ring: &RingSpec, tier: PerformanceTier) {
        let count = tier.scale(ring.count);
        for i in 0..count {
            let angle = i as f64 / count as f64 * TAU;
            let speed = ring.speed + self.rng.uniform(0.0, ring.speed_jitter.max(1e-9));
            self.spawn(
                angle.cos() * speed,
                angle.sin() * speed,
                ring.hue_off,
                ring.shape,
                ring.delay,
            );
        }
    }

    fn scatter(&mut self, scatter: &ScatterSpec, tier: PerformanceTier) {
        let count = tier.scale(scatter.count);
        for _ in 0..count {
            let angle = self.rng.uniform(0.0, TAU);
            let radius = self.rng.uniform(scatter.radius_min, scatter.radius_max);
            let delay = self.rng.uniform(0.0, scatter.delay_max.max(1e-9));
            self.spawn(
                angle.cos() * radius,
                angle.sin() * radius,
                scatter.hue_off,
                scatter.shape,
                delay,
            );
        }
    }

    fn rays(&mut self, rays: &RaySpec) {
        for i in 0..rays.rays {
            let angle = i as f64 / rays.rays as f64 * TAU;
            let length = self.rng.uniform(rays.length_min, rays.length_max);
            for j in 0..rays.steps {
                let progress = j as f64 / rays.steps as f64;
                self.spawn(
                    angle.cos() * length * progress,
                    angle.sin() * length * progress,
                    rays.hue_off,
                    Shape::Star,
                    0.05 + progress * 0.1,
                );
            }
        }
    }

    /// Roll every decoration rule for one primary particle.
    fn decorate(
        &mut self,
        rules: &[DecorRule],
        angle: f64,
        speed: f64,
        progress: f64,
        hue_off: f64,
        delay: f64,
    ) {
        for rule in rules {
            if progress < rule.band.0 || progress >= rule.band.1 {
                continue;
            }
            if !self.rng.chance(rule.prob) {
                continue;
            }
            let jitter = self.rng.uniform(-rule.angle_jitter, rule.angle_jitter);
            let a = angle + jitter;
            let s = speed * rule.speed_mul;
            let p = self.spawn(
                a.cos() * s,
                a.sin() * s,
                hue_off + rule.hue_off,
                rule.shape,
                delay + rule.delay_off,
            );
            p.lifespan = rule.lifespan;
        }
    }

    fn body(&mut self, body: &Body, count: usize, decor: &[DecorRule]) {
        match *body {
            Body::Fan {
                speed,
                speed_jitter,
                radius_jitter,
                angle_jitter,
                hue_jitter,
                shape,
                delay_max,
                cascade_prob,
            } => {
                if count == 0 {
                    return;
                }
                let step = TAU / count as f64;
                for i in 0..count {
                    let angle = step * i as f64 + self.rng.uniform(-angle_jitter, angle_jitter);
                    let s = (speed + self.rng.uniform(speed_jitter.0, speed_jitter.1))
                        * self.rng.uniform(radius_jitter.0, radius_jitter.1.max(radius_jitter.0 + 1e-9));
                    let hue_off = if hue_jitter > 0.0 {
                        self.rng.uniform(-hue_jitter, hue_jitter)
                    } else {
                        0.0
                    };
                    let delay = if delay_max > 0.0 {
                        self.rng.uniform(0.0, delay_max)
                    } else {
                        0.0
                    };
                    let cascades = cascade_prob > 0.0 && self.rng.chance(cascade_prob);
                    let p = self.spawn(angle.cos() * s, angle.sin() * s, hue_off, shape, delay);
                    p.can_cascade = cascades;
                    let progress = i as f64 / count as f64;
                    self.decorate(decor, angle, s, progress, hue_off, delay);
                }
            }
            Body::Arms {
                arms_min,
                arms_max,
                winds,
                radius_base,
                radius_growth,
                hue_ramp,
                delay_ramp,
            } => {
                let arms = self.rng.uniform_int(arms_min, arms_max) as usize;
                let per_arm = count / arms.max(1);
                let arm_spacing = TAU / arms.max(1) as f64;
                for arm in 0..arms {
                    let arm_offset = arm as f64 * arm_spacing;
                    for i in 0..per_arm {
                        let ratio = i as f64 / per_arm as f64;
                        let angle = arm_offset + ratio * winds * TAU;
                        let radius = radius_base + ratio * radius_growth;
                        let hue_off = ratio * hue_ramp + self.rng.uniform(-10.0, 10.0);
                        let delay = ratio * delay_ramp + self.rng.uniform(0.0, 0.2);
                        self.spawn(
                            angle.cos() * radius,
                            angle.sin() * radius,
                            hue_off,
                            Shape::Circle,
                            delay,
                        );
                        self.decorate(decor, angle, radius, ratio, hue_off, delay);
                    }
                }
            }
            Body::Rings {
                rings,
                radius_base,
                radius_step,
                zigzag,
                swirl,
                hue_step,
            } => {
                let per_ring = count / rings.max(1);
                for ring in 0..rings {
                    let base = radius_base + ring as f64 * radius_step;
                    for i in 0..per_ring {
                        let angle = i as f64 / per_ring as f64 * TAU;
                        let (a, radius) = if zigzag {
                            (
                                angle + (angle * 8.0).sin() * 0.2 + self.rng.uniform(-0.1, 0.1),
                                (base + (angle * 12.0).sin() * 0.3)
                                    * (1.0 + self.rng.uniform(-0.15, 0.15)),
                            )
                        } else {
                            (
                                angle + self.rng.uniform(-0.15, 0.15),
                                base * (1.0 + self.rng.uniform(-0.2, 0.2)),
                            )
                        };
                        let vx = a.cos() * radius + (a + PI / 2.0).cos() * swirl;
                        let vy = a.sin() * radius + (a + PI / 2.0).sin() * swirl;
                        let hue_off = ring as f64 * hue_step + self.rng.uniform(-15.0, 15.0);
                        let delay = self.rng.uniform(0.0, 0.3);
                        self.spawn(vx, vy, hue_off, Shape::Circle, delay);
                        let progress = i as f64 / per_ring as f64;
                        self.decorate(decor, a, radius, progress, hue_off, delay);
                    }
                }
            }
            Body::Helix {
                rotations,
                strands,
                radius,
                length,
            } => {
                let shape = if self.rng.chance(0.5) { Shape::Circle } else { Shape::Star };
                for i in 0..count {
                    let progress = i as f64 / count.max(1) as f64;
                    let angle = progress * TAU * rotations;
                    for strand in 0..strands {
                        let offset = strand as f64 * PI + angle;
                        let vx = offset.cos() * radius * 0.5;
                        let vy = (progress * length - length / 2.0) * 0.2;
                        let delay = 0.8 - progress * 0.6;
                        self.spawn(vx, vy, progress * 100.0, shape, delay);
                        // Ladder rungs between the strands.
                        if i > 0 && i < count - 1 {
                            self.spawn(vx * 0.8, vy * 0.8, 0.0, Shape::Circle, 0.8);
                        }
                    }
                }
            }
            Body::Wings {
                layers,
                layer_scale,
                layer_delay,
                formula,
                lift,
                tail,
            } => {
                let per_wing = count / (2 * layers).max(1);
                for layer in 0..layers {
                    let scale = 1.0 + layer as f64 * layer_scale;
                    let delay_base = layer as f64 * layer_delay;
                    for side in [-1.0, 1.0] {
                        for i in 0..per_wing {
                            let progress = i as f64 / per_wing as f64;
                            let t = progress * PI;
                            let (x, y) = formula.point(t, side, scale);
                            let speed = 2.0 + (progress * PI).sin() * 2.0;
                            let angle = y.atan2(x);
                            let vx = angle.cos() * speed;
                            let vy = angle.sin() * speed - lift;
                            let hue_off = layer as f64 * 15.0 + progress * 30.0;
                            let delay = delay_base + progress * 0.2;
                            self.spawn(vx, vy, hue_off, Shape::Circle, delay);
                            self.decorate(decor, angle, speed, progress, hue_off, delay);
                        }
                    }
                }
                if tail > 0 {
                    let tail_spread = PI * 0.3;
                    for i in 0..tail {
                        let progress = i as f64 / tail as f64;
                        let angle = -PI / 2.0 + (progress - 0.5) * tail_spread;
                        let speed = 3.0 + self.rng.uniform(0.0, 1.0);
                        self.spawn(
                            angle.cos() * speed,
                            angle.sin() * speed + 1.0,
                            progress * 30.0,
                            Shape::Circle,
                            0.2,
                        );
                        if self.rng.chance(0.5) {
                            let a = angle + self.rng.uniform(-0.2, 0.2);
                            let s = speed * 1.1;
                            self.spawn(a.cos() * s, a.sin() * s + 0.8, 60.0, Shape::Star, 0.1);
                        }
                    }
                }
            }
            Body::Galaxy {
                arms,
                winds,
                radius_base,
                radius_growth,
            } => {
                let per_arm = count / arms.max(1);
                for arm in 0..arms {
                    let arm_angle = arm as f64 / arms as f64 * TAU;
                    let arm_hue = 360.0 / arms as f64 * arm as f64;
                    for i in 0..per_arm {
                        let progress = i as f64 / per_arm as f64;
                        let radius = radius_base + progress * radius_growth;
                        let angle = arm_angle + progress * winds * TAU;
                        let vx = angle.cos() * radius;
                        let vy = angle.sin() * radius;
                        let hue_off = arm_hue + progress * 30.0;
                        let delay = 0.7 - progress * 0.3;
                        self.spawn(vx, vy, hue_off, Shape::Circle, delay);
                        self.decorate(decor, angle, radius, progress, hue_off, delay);
                    }
                }
            }
            Body::Streams {
                streams,
                layers,
                speed_min,
                speed_max,
                taper,
                droop,
            } => {
                let per_stream = count / (streams * layers).max(1);
                for layer in 0..layers {
                    let layer_scale = 1.0 + layer as f64 * 0.2;
                    let delay_base = layer as f64 * 0.1;
                    for stream in 0..streams {
                        let base_angle = stream as f64 / streams as f64 * TAU;
                        let stream_speed = self.rng.uniform(speed_min, speed_max);
                        for i in 0..per_stream {
                            let progress = i as f64 / per_stream as f64;
                            let angle = base_angle + (progress * PI).sin() * 0.1;
                            let speed = (stream_speed - progress * taper) * layer_scale;
                            let vx = angle.cos() * speed;
                            let vy = angle.sin() * speed + progress * droop;
                            let hue_off = layer as f64 * 10.0 + progress * 20.0;
                            let delay = delay_base + progress * 0.2;
                            self.spawn(vx, vy, hue_off, Shape::Circle, delay);
                            self.decorate(decor, angle, speed, progress, hue_off, delay);
                        }
                    }
                }
            }
            Body::Palm {
                trunk_frac,
                fronds,
                trunk_speed,
                frond_speed,
            } => {
                let trunk = (count as f64 * trunk_frac) as usize;
                for i in 0..trunk {
                    let progress = i as f64 / trunk.max(1) as f64;
                    let speed = trunk_speed + progress * 2.0;
                    let sway = self.rng.uniform(-0.1, 0.1);
                    let p = self.spawn(sway * speed * 0.1, -speed, 0.0, Shape::Circle, progress * 0.2);
                    p.gravity = 0.15;
                }
                let per_frond = (count - trunk) / fronds.max(1);
                for frond in 0..fronds {
                    let base_angle = -PI / 2.0 + (frond as f64 - fronds as f64 / 2.0) * 0.4;
                    for i in 0..per_frond {
                        let progress = i as f64 / per_frond as f64;
                        let speed = frond_speed + progress * 3.0;
                        let angle =
                            base_angle + (progress * PI).sin() * 0.5 + self.rng.uniform(-0.1, 0.1);
                        let hue_off = frond as f64 * 10.0;
                        let delay = 0.3 + progress * 0.2;
                        let p = self.spawn(
                            angle.cos() * speed,
                            angle.sin() * speed,
                            hue_off,
                            Shape::Star,
                            delay,
                        );
                        p.gravity = 0.12;
                        self.decorate(decor, angle, speed, progress, hue_off, delay);
                    }
                }
            }
            Body::Petals {
                layers,
                petals,
                layer_scale,
                layer_delay,
                hue_step,
                radius_growth,
            } => {
                let per_petal = count / (layers * petals).max(1);
                for layer in 0..layers {
                    let scale = 1.0 + layer as f64 * layer_scale;
                    let delay_base = layer as f64 * layer_delay;
                    let layer_hue = layer as f64 * hue_step;
                    for petal in 0..petals {
                        let petal_angle = petal as f64 / petals as f64 * TAU;
                        let petal_spread = PI / petals as f64;
                        for i in 0..per_petal {
                            let progress = i as f64 / per_petal as f64;
                            let radius = (1.0 + progress * radius_growth) * scale;
                            let angle = petal_angle + (progress * PI).sin() * petal_spread;
                            let hue_off = layer_hue + progress * 30.0;
                            let delay = delay_base + progress * 0.2;
                            self.spawn(
                                angle.cos() * radius,
                                angle.sin() * radius,
                                hue_off,
                                Shape::Circle,
                                delay,
                            );
                            self.decorate(decor, angle, radius, progress, hue_off, delay);
                        }
                    }
                }
            }
            Body::Fall {
                streams,
                spread,
                speed_base,
                speed_growth,
                cascade,
                sparkles,
            } => {
                let per_stream = count / streams.max(1);
                for stream in 0..streams {
                    // Streams share a downward bias, offset slightly per stream.
                    let stream_bias = (stream as f64 - streams as f64 / 2.0) * spread * 0.5;
                    for i in 0..per_stream {
                        let progress = i as f64 / per_stream as f64;
                        let delay = progress * 0.5;
                        let angle =
                            PI / 2.0 + stream_bias + self.rng.uniform(-spread, spread);
                        let speed = speed_base + progress * speed_growth;
                        let hue_off = progress * 30.0;
                        let p = self.spawn(
                            angle.cos() * speed,
                            angle.sin() * speed,
                            hue_off,
                            Shape::Circle,
                            delay,
                        );
                        p.can_cascade = cascade;
                        if self.rng.chance(0.4) {
                            let jitter = self.rng.uniform(-0.5, 0.5);
                            let p = self.spawn(
                                angle.cos() * speed * 0.8 + jitter,
                                angle.sin() * speed * 0.8 + jitter,
                                60.0,
                                Shape::Star,
                                delay + 0.1,
                            );
                            p.can_cascade = cascade;
                        }
                        if self.rng.chance(0.2) && progress > 0.3 {
                            let a = angle + self.rng.uniform(-PI / 4.0, PI / 4.0);
                            let s = speed * 1.2;
                            let p = self.spawn(a.cos() * s, a.sin() * s, 20.0, Shape::Star, delay + 0.15);
                            p.can_cascade = cascade;
                        }
                        self.decorate(decor, angle, speed, progress, hue_off, delay);
                    }
                }
                for i in 0..sparkles {
                    let progress = i as f64 / sparkles.max(1) as f64;
                    let angle = PI / 2.0 + self.rng.uniform(-PI / 8.0, PI / 8.0);
                    let speed = 1.0 + self.rng.uniform(0.0, 2.0);
                    let p = self.spawn(
                        angle.cos() * speed,
                        angle.sin() * speed,
                        80.0,
                        Shape::Star,
                        progress * 0.3,
                    );
                    p.can_cascade = cascade;
                }
            }
            Body::StarPoints {
                points,
                spread,
                radius_base,
                radius_growth,
                tail_frac,
            } => {
                let per_point = count / points.max(1);
                for point in 0..points {
                    let point_angle = point as f64 / points as f64 * TAU;
                    let point_hue = 360.0 / points as f64 * point as f64;
                    for i in 0..per_point {
                        let progress = i as f64 / per_point as f64;
                        let radius = (radius_base + progress * radius_growth)
                            * (1.0 + self.rng.uniform(-0.15, 0.15));
                        let angle = point_angle
                            + (progress * PI).sin() * spread
                            + self.rng.uniform(-0.2, 0.2);
                        let hue_off = point_hue + progress * 30.0;
                        let delay = self.rng.uniform(0.0, 0.3);
                        self.spawn(
                            angle.cos() * radius,
                            angle.sin() * radius,
                            hue_off,
                            Shape::Star,
                            delay,
                        );
                        self.decorate(decor, angle, radius, progress, hue_off, delay);
                    }
                    // Short counter-directed tail behind each point.
                    let tail = (per_point as f64 * tail_frac) as usize;
                    for i in 0..tail {
                        let progress = i as f64 / tail as f64;
                        let angle = point_angle + PI + self.rng.uniform(-0.2, 0.2);
                        let radius = (0.5 + progress * 2.0) * (1.0 - progress);
                        let delay = self.rng.uniform(0.2, 0.5);
                        self.spawn(
                            angle.cos() * radius,
                            angle.sin() * radius,
                            point_hue - 30.0,
                            Shape::Circle,
                            delay,
                        );
                    }
                }
            }
            Body::HeartShape {
                size,
                transition,
                point_scale,
                decor_scale,
            } => {
                let points = (count as f64 * point_scale) as usize;
                let world = size / 16.0 * (self.vel.max(0.05));
                for i in 0..points {
                    let t = i as f64 / points.max(1) as f64 * TAU;
                    let (hx, hy) = heart_point(t);
                    let offset_x = hx * world;
                    let offset_y = hy * world;
                    let delay = i as f64 / points.max(1) as f64 * 0.2;
                    let burst = self.rng.uniform(6.0, 9.0);
                    let p = self.spawn(t.cos() * burst, t.sin() * burst, 0.0, Shape::Heart, delay);
                    p.motion = Motion::Shaped {
                        home_x: p.x,
                        home_y: p.y,
                        offset_x,
                        offset_y,
                        phase: 0.0,
                        transition,
                    };
                }
                // Loose sparkle decoration around the shape.
                let decor_count = (count as f64 * decor_scale) as usize;
                for _ in 0..decor_count {
                    let angle = self.rng.uniform(0.0, TAU);
                    let speed = self.rng.uniform(4.0, 7.0);
                    let hue_off = self.rng.uniform(-30.0, 30.0);
                    let delay = self.rng.uniform(0.0, 0.4);
                    let p = self.spawn(angle.cos() * speed, angle.sin() * speed, hue_off, Shape::Star, delay);
                    p.lifespan = 0.8;
                    p.decay = 0.02;
                    p.gravity = DEFAULT_GRAVITY * 0.6;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_effect(kind: EffectKind, base: usize, tier: PerformanceTier) -> Vec<Particle> {
        let mut rng = RandomSource::new();
        let mut out = Vec::new();
        generate(
            kind,
            400.0,
            300.0,
            180.0,
            base,
            tier,
            &ShowOptions::default(),
            1.0,
            &mut rng,
            &mut out,
        );
        out
    }

    #[test]
    fn every_effect_wraps_hue_and_produces_finite_velocities() {
        for &kind in &ALL_EFFECTS {
            let particles = run_effect(kind, 100, PerformanceTier::High);
            assert!(!particles.is_empty(), "{} generated nothing", kind.name());
            for p in &particles {
                assert!((0.0..360.0).contains(&p.hue), "{} hue {}", kind.name(), p.hue);
                assert!(p.vx.is_finite() && p.vy.is_finite());
                assert!(p.lifespan > 0.0);
            }
        }
    }

    #[test]
    fn low_tier_normal_effect_yields_roughly_thirty_particles() {
        let particles = run_effect(EffectKind::Normal, 100, PerformanceTier::Low);
        assert_eq!(particles.len(), 30);
    }

    #[test]
    fn tier_counts_are_monotonic_per_effect() {
        for &kind in &ALL_EFFECTS {
            let low = run_effect(kind, 100, PerformanceTier::Low).len();
            let medium = run_effect(kind, 100, PerformanceTier::Medium).len();
            let high = run_effect(kind, 100, PerformanceTier::High).len();
            // Decoration rolls are probabilistic; allow headroom while still
            // requiring a real density gap between tiers.
            assert!(
                (low as f64) < (medium as f64) * 0.95 && (medium as f64) < (high as f64) * 0.95,
                "{}: {} {} {}",
                kind.name(),
                low,
                medium,
                high
            );
        }
    }

    #[test]
    fn zero_count_degrades_to_no_body_particles() {
        // Groups that truncate to zero must silently produce nothing.
        let particles = run_effect(EffectKind::Spiral, 0, PerformanceTier::Low);
        assert!(particles.is_empty());
    }

    #[test]
    fn burst_effect_marks_a_minority_of_particles_cascadable() {
        let particles = run_effect(EffectKind::Burst, 100, PerformanceTier::High);
        let cascadable = particles.iter().filter(|p| p.can_cascade).count();
        assert!(cascadable > 0, "no cascade-capable particles in 100 draws is implausible");
        assert!(cascadable < particles.len() / 2);
    }

    #[test]
    fn heart_effect_uses_shaped_motion_for_outline_points() {
        let particles = run_effect(EffectKind::Heart, 100, PerformanceTier::High);
        let shaped = particles
            .iter()
            .filter(|p| matches!(p.motion, Motion::Shaped { .. }))
            .count();
        assert_eq!(shaped, 180, "1.8x outline points expected");
    }

    #[test]
    fn effect_names_round_trip() {
        for &kind in &ALL_EFFECTS {
            assert_eq!(EffectKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(EffectKind::from_name("nope"), None);
    }
}
