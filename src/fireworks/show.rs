//! Show scheduling: the launch queue, random mode, timed formations, and
//! scripted multi-scene shows.
//!
//! Every delayed launch, whether from random mode, a formation, a scripted
//! scene, or a rocket's secondary bursts, goes through one priority queue
//! keyed by fire time. A monotonic sequence number breaks ties so launches
//! submitted together fire in submission order.

use super::effects::EffectKind;
use super::particle::heart_point;
use super::rocket::Rocket;
use super::{
    PendingLaunch, PerformanceTier, RandomSource, ShowOptions, SoundSink, TICK, TickCtx, Viewport,
};
use crate::render::Canvas;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::f64::consts::TAU;

/// Hard cap on simultaneously live rockets. Due launches beyond the cap are
/// dropped, never deferred.
const MAX_FIREWORKS: usize = 15;
/// Chance that a random-mode launch opportunity actually fires.
const RANDOM_LAUNCH_CHANCE: f64 = 0.3;
/// Horizontal keep-out from the viewport edges, in pixels.
const EDGE_MARGIN: f64 = 20.0;
/// Seconds between formation changes in choreography mode.
const FORMATION_INTERVAL: f64 = 8.0;
/// Pause between scenes of a scripted show, after the scene's batch span.
const SCENE_PAUSE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    Random,
    Choreography,
}

impl Mode {
    pub fn name(self) -> &'static str {
        match self {
            Mode::Random => "random",
            Mode::Choreography => "choreography",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Mode::Random => Mode::Choreography,
            Mode::Choreography => Mode::Random,
        }
    }
}

/// Queue entry. Ordered by fire time, then by submission sequence.
struct ScheduledLaunch {
    fire_at: f64,
    seq: u64,
    launch: PendingLaunch,
}

impl PartialEq for ScheduledLaunch {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.seq == other.seq
    }
}

impl Eq for ScheduledLaunch {}

impl PartialOrd for ScheduledLaunch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledLaunch {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fire_at
            .total_cmp(&other.fire_at)
            .then(self.seq.cmp(&other.seq))
    }
}

/// The scenes a scripted show is composed from.
#[derive(Debug, Clone, Copy)]
enum Scene {
    Opening,
    LightDance,
    StarryNight,
    Dragon,
    Butterflies,
    Firestorm,
    GrandFinale,
}

struct ScriptedShow {
    name: &'static str,
    scenes: &'static [Scene],
}

const SHOWS: &[ScriptedShow] = &[
    ScriptedShow {
        name: "classic night",
        scenes: &[Scene::Opening, Scene::LightDance, Scene::GrandFinale],
    },
    ScriptedShow {
        name: "starfall",
        scenes: &[Scene::StarryNight, Scene::Butterflies, Scene::GrandFinale],
    },
    ScriptedShow {
        name: "dragon fire",
        scenes: &[Scene::Dragon, Scene::Firestorm, Scene::GrandFinale],
    },
    ScriptedShow {
        name: "butterfly garden",
        scenes: &[Scene::Opening, Scene::Butterflies, Scene::LightDance],
    },
    ScriptedShow {
        name: "storm and calm",
        scenes: &[Scene::Firestorm, Scene::StarryNight],
    },
    ScriptedShow {
        name: "midnight waltz",
        scenes: &[Scene::LightDance, Scene::StarryNight, Scene::LightDance],
    },
    ScriptedShow {
        name: "phoenix rising",
        scenes: &[Scene::Dragon, Scene::Opening, Scene::GrandFinale],
    },
    ScriptedShow {
        name: "quiet sky",
        scenes: &[Scene::StarryNight, Scene::StarryNight],
    },
    ScriptedShow {
        name: "royal salute",
        scenes: &[Scene::Opening, Scene::Opening, Scene::GrandFinale],
    },
    ScriptedShow {
        name: "wildfire",
        scenes: &[Scene::Firestorm, Scene::Dragon, Scene::Firestorm],
    },
    ScriptedShow {
        name: "carnival",
        scenes: &[Scene::LightDance, Scene::Butterflies, Scene::Firestorm, Scene::GrandFinale],
    },
    ScriptedShow {
        name: "finale marathon",
        scenes: &[Scene::GrandFinale, Scene::GrandFinale, Scene::GrandFinale],
    },
];

pub fn show_names() -> impl Iterator<Item = &'static str> {
    SHOWS.iter().map(|s| s.name)
}

pub struct FireworkShow {
    mode: Mode,
    pub options: ShowOptions,
    pub tier: PerformanceTier,
    rng: RandomSource,
    now: f64,
    rockets: Vec<Rocket>,
    queue: BinaryHeap<Reverse<ScheduledLaunch>>,
    seq: u64,
    next_random_at: f64,
    formation_index: usize,
    next_formation_at: f64,
    is_playing: bool,
    current_show: usize,
    scene_index: usize,
    next_scene_at: f64,
    /// Reused outbox for secondary launches produced during rocket updates.
    scratch: Vec<PendingLaunch>,
}

impl FireworkShow {
    pub fn new(mode: Mode, options: ShowOptions, tier: PerformanceTier) -> Self {
        FireworkShow {
            mode,
            options,
            tier,
            rng: RandomSource::new(),
            now: 0.0,
            rockets: Vec::new(),
            queue: BinaryHeap::new(),
            seq: 0,
            next_random_at: 0.0,
            formation_index: 0,
            next_formation_at: 0.0,
            is_playing: false,
            current_show: 0,
            scene_index: 0,
            next_scene_at: 0.0,
            scratch: Vec::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        self.is_playing = false;
        self.next_random_at = self.now;
        // Entering choreography restarts the formation cycle immediately.
        self.formation_index = 0;
        self.next_formation_at = self.now;
    }

    pub fn toggle_mode(&mut self) {
        self.set_mode(self.mode.toggle());
    }

    pub fn rocket_count(&self) -> usize {
        self.rockets.len()
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn current_show_name(&self) -> &'static str {
        SHOWS[self.current_show % SHOWS.len()].name
    }

    /// Start a scripted show. Returns false (and does nothing) if a show is
    /// already in flight; each show always starts from its first scene.
    pub fn play_show(&mut self, index: usize) -> bool {
        if self.is_playing {
            return false;
        }
        self.mode = Mode::Choreography;
        self.is_playing = true;
        self.current_show = index % SHOWS.len();
        self.scene_index = 0;
        self.next_scene_at = self.now;
        true
    }

    pub fn stop_show(&mut self) {
        self.is_playing = false;
    }

    /// Submit a launch `launch.delay` seconds from now.
    fn enqueue(&mut self, launch: PendingLaunch) {
        let entry = ScheduledLaunch {
            fire_at: self.now + launch.delay.max(0.0),
            seq: self.seq,
            launch,
        };
        self.seq += 1;
        self.queue.push(Reverse(entry));
    }

    /// Advance the simulation one fixed tick.
    pub fn tick(&mut self, view: Viewport, sound: &mut dyn SoundSink) {
        self.now += TICK;

        match self.mode {
            Mode::Random => self.tick_random(view),
            Mode::Choreography => self.tick_choreography(view),
        }

        let mut scratch = std::mem::take(&mut self.scratch);
        {
            let mut ctx = TickCtx {
                rng: &mut self.rng,
                tier: self.tier,
                options: &self.options,
                view,
                now: self.now,
                sound,
                pending: &mut scratch,
            };

            while let Some(Reverse(head)) = self.queue.peek() {
                if head.fire_at > ctx.now {
                    break;
                }
                let entry = self.queue.pop().unwrap().0;
                if self.rockets.len() >= MAX_FIREWORKS {
                    continue;
                }
                let mut rocket = Rocket::from_launch(&entry.launch, view, ctx.rng);
                if entry.launch.pre_detonated {
                    rocket.detonate_now(&mut ctx);
                }
                self.rockets.push(rocket);
            }

            self.rockets.retain_mut(|r| r.update(&mut ctx));
        }
        for launch in scratch.drain(..) {
            self.enqueue(launch);
        }
        self.scratch = scratch;
    }

    pub fn render(&self, canvas: &mut Canvas) {
        for rocket in &self.rockets {
            rocket.render(canvas, self.now);
        }
    }

    fn tick_random(&mut self, view: Viewport) {
        if self.now < self.next_random_at {
            return;
        }
        self.next_random_at = self.now + self.options.delay;
        if !self.rng.chance(RANDOM_LAUNCH_CHANCE) {
            return;
        }
        let launch = self.random_launch(view);
        self.enqueue(launch);
    }

    /// A launch from a random bottom position toward the 10-80% height band,
    /// horizontal drift bounded by the spread option and the edge margins.
    fn random_launch(&mut self, view: Viewport) -> PendingLaunch {
        let margin = EDGE_MARGIN.min(view.width / 4.0);
        let start_x = self.rng.uniform(margin, (view.width - margin).max(margin + 1.0));
        let drift = view.width * self.options.spread / 2.0;
        let target_x = self
            .rng
            .uniform(start_x - drift, start_x + drift)
            .clamp(margin, view.width - margin);
        let lo = view.height * (1.0 - self.options.height).max(0.1);
        let hi = view.height * 0.8;
        let target_y = self.rng.uniform(lo.min(hi), hi);
        PendingLaunch::ascent(start_x, view.height, target_x, target_y, 0.0)
    }

    fn tick_choreography(&mut self, view: Viewport) {
        if self.is_playing {
            self.tick_scripted(view);
            return;
        }
        if self.now < self.next_formation_at {
            return;
        }
        self.next_formation_at = self.now + FORMATION_INTERVAL;
        let index = self.formation_index;
        self.formation_index = (self.formation_index + 1) % 6;
        match index {
            0 => self.formation_heart(view),
            1 => self.formation_ring(view),
            2 => self.formation_cascade(view),
            3 => self.formation_cross(view),
            4 => self.formation_staircase(view),
            _ => self.formation_rainbow(view),
        }
    }

    fn tick_scripted(&mut self, view: Viewport) {
        if self.now < self.next_scene_at {
            return;
        }
        let show = &SHOWS[self.current_show % SHOWS.len()];
        if self.scene_index >= show.scenes.len() {
            self.is_playing = false;
            return;
        }
        let scene = show.scenes[self.scene_index];
        self.scene_index += 1;
        let span = self.run_scene(scene, view);
        self.next_scene_at = self.now + span + SCENE_PAUSE;
    }

    /// Enqueue one scene's launch batch. Returns the batch span in seconds.
    fn run_scene(&mut self, scene: Scene, view: Viewport) -> f64 {
        let w = view.width;
        let h = view.height;
        match scene {
            Scene::Opening => {
                // A measured volley marching across the sky.
                let count = 5;
                for i in 0..count {
                    let x = w * (0.15 + 0.7 * i as f64 / (count - 1) as f64);
                    let delay = i as f64 * 0.3;
                    let effect = if i % 2 == 0 {
                        EffectKind::Normal
                    } else {
                        EffectKind::Burst
                    };
                    self.enqueue(
                        PendingLaunch::ascent(x, h, x, h * 0.3, delay).with_effect(Some(effect)),
                    );
                }
                (count - 1) as f64 * 0.3
            }
            Scene::LightDance => {
                // Alternating left/right spirals and rings.
                let count = 8;
                for i in 0..count {
                    let side = if i % 2 == 0 { 0.25 } else { 0.75 };
                    let x = w * side + self.rng.uniform(-w * 0.05, w * 0.05);
                    let delay = i as f64 * 0.25;
                    let effect = if i % 2 == 0 {
                        EffectKind::Spiral
                    } else {
                        EffectKind::Circle
                    };
                    let apex = h * self.rng.uniform(0.25, 0.45);
                    self.enqueue(
                        PendingLaunch::ascent(x, h, x, apex, delay).with_effect(Some(effect)),
                    );
                }
                (count - 1) as f64 * 0.25
            }
            Scene::StarryNight => {
                let count = 6;
                for i in 0..count {
                    let x = self.rng.uniform(w * 0.1, w * 0.9);
                    let delay = i as f64 * 0.5;
                    let apex = h * self.rng.uniform(0.15, 0.3);
                    self.enqueue(
                        PendingLaunch::ascent(x, h, x, apex, delay)
                            .with_effect(Some(EffectKind::Star)),
                    );
                }
                (count - 1) as f64 * 0.5
            }
            Scene::Dragon => {
                // A diagonal sweep trailing fire.
                let count = 7;
                for i in 0..count {
                    let t = i as f64 / (count - 1) as f64;
                    let x = w * (0.1 + 0.8 * t);
                    let y = h * (0.5 - 0.25 * t);
                    let delay = i as f64 * 0.2;
                    let effect = if i == count - 1 {
                        EffectKind::Phoenix
                    } else {
                        EffectKind::Waterfall
                    };
                    self.enqueue(
                        PendingLaunch {
                            hue: Some(20.0 + t * 40.0),
                            ..PendingLaunch::ascent(x, h, x, y, delay)
                        }
                        .with_effect(Some(effect)),
                    );
                }
                (count - 1) as f64 * 0.2
            }
            Scene::Butterflies => {
                let count = 4;
                for i in 0..count {
                    let x = w * (0.2 + 0.6 * i as f64 / (count - 1) as f64);
                    let delay = i as f64 * 0.6;
                    self.enqueue(
                        PendingLaunch::ascent(x, h, x, h * 0.35, delay)
                            .with_effect(Some(EffectKind::Butterfly)),
                    );
                }
                (count - 1) as f64 * 0.6
            }
            Scene::Firestorm => {
                let count = 10;
                let mut span: f64 = 0.0;
                for _ in 0..count {
                    let x = self.rng.uniform(w * 0.1, w * 0.9);
                    let delay = self.rng.uniform(0.0, 1.0);
                    span = span.max(delay);
                    let effect = if self.rng.chance(0.5) {
                        EffectKind::Burst
                    } else {
                        EffectKind::Palm
                    };
                    let apex = h * self.rng.uniform(0.3, 0.5);
                    self.enqueue(
                        PendingLaunch::ascent(x, h, x, apex, delay).with_effect(Some(effect)),
                    );
                }
                span
            }
            Scene::GrandFinale => {
                let count = 12;
                let mut span: f64 = 0.0;
                let finale = [EffectKind::Dahlia, EffectKind::Galaxy, EffectKind::Phoenix];
                for i in 0..count {
                    let x = self.rng.uniform(w * 0.1, w * 0.9);
                    let delay = self.rng.uniform(0.0, 1.5);
                    span = span.max(delay);
                    let apex = h * self.rng.uniform(0.2, 0.5);
                    self.enqueue(
                        PendingLaunch::ascent(x, h, x, apex, delay)
                            .with_effect(Some(finale[i % finale.len()])),
                    );
                }
                span
            }
        }
    }

    // Formation builders. Targets trace the named shape in the upper half of
    // the viewport; delays stagger along the outline.

    fn formation_heart(&mut self, view: Viewport) {
        let cx = view.width / 2.0;
        let cy = view.height * 0.35;
        let scale = view.height.min(view.width) / 80.0;
        let count = 10;
        for i in 0..count {
            let t = i as f64 / count as f64 * TAU;
            let (hx, hy) = heart_point(t);
            let tx = (cx + hx * scale).clamp(0.0, view.width);
            let ty = (cy + hy * scale).clamp(view.height * 0.1, view.height * 0.8);
            let delay = i as f64 / count as f64;
            self.enqueue(
                PendingLaunch {
                    hue: Some(340.0),
                    ..PendingLaunch::ascent(tx, view.height, tx, ty, delay)
                }
                .with_effect(Some(EffectKind::Normal)),
            );
        }
    }

    fn formation_ring(&mut self, view: Viewport) {
        let cx = view.width / 2.0;
        let cy = view.height * 0.35;
        let radius = view.height.min(view.width) * 0.2;
        let count = 10;
        for i in 0..count {
            let angle = i as f64 / count as f64 * TAU;
            let tx = (cx + angle.cos() * radius).clamp(0.0, view.width);
            let ty = (cy + angle.sin() * radius).clamp(view.height * 0.1, view.height * 0.8);
            self.enqueue(
                PendingLaunch::ascent(tx, view.height, tx, ty, i as f64 * 0.1)
                    .with_effect(Some(EffectKind::Circle)),
            );
        }
    }

    fn formation_cascade(&mut self, view: Viewport) {
        let columns = 6;
        for col in 0..columns {
            let x = view.width * (0.1 + 0.8 * col as f64 / (columns - 1) as f64);
            let y = view.height * (0.2 + 0.05 * col as f64);
            self.enqueue(
                PendingLaunch::ascent(x, view.height, x, y, col as f64 * 0.3)
                    .with_effect(Some(EffectKind::Waterfall)),
            );
        }
    }

    fn formation_cross(&mut self, view: Viewport) {
        let cx = view.width / 2.0;
        let cy = view.height * 0.35;
        let arm = view.height.min(view.width) * 0.18;
        let steps = 3;
        let mut i = 0;
        for step in -(steps as i64)..=(steps as i64) {
            let offset = step as f64 / steps as f64 * arm;
            for &(tx, ty) in &[(cx + offset, cy), (cx, cy + offset)] {
                let tx = tx.clamp(0.0, view.width);
                let ty = ty.clamp(view.height * 0.1, view.height * 0.8);
                self.enqueue(
                    PendingLaunch::ascent(tx, view.height, tx, ty, i as f64 * 0.08)
                        .with_effect(Some(EffectKind::Burst)),
                );
                i += 1;
            }
        }
    }

    fn formation_staircase(&mut self, view: Viewport) {
        let steps = 8;
        for i in 0..steps {
            let t = i as f64 / steps as f64;
            let angle = t * TAU * 1.5;
            let radius = view.width * 0.1 + t * view.width * 0.15;
            let tx = (view.width / 2.0 + angle.cos() * radius).clamp(0.0, view.width);
            let ty = (view.height * (0.6 - 0.45 * t)).clamp(view.height * 0.1, view.height * 0.8);
            self.enqueue(
                PendingLaunch::ascent(tx, view.height, tx, ty, i as f64 * 0.25)
                    .with_effect(Some(EffectKind::Spiral)),
            );
        }
    }

    fn formation_rainbow(&mut self, view: Viewport) {
        let count = 7;
        for i in 0..count {
            let t = i as f64 / (count - 1) as f64;
            let tx = view.width * (0.1 + 0.8 * t);
            // Arc peaks in the middle.
            let ty = view.height * (0.45 - 0.25 * (t * std::f64::consts::PI).sin());
            self.enqueue(
                PendingLaunch {
                    hue: Some(t * 300.0),
                    ..PendingLaunch::ascent(tx, view.height, tx, ty, i as f64 * 0.15)
                }
                .with_effect(Some(EffectKind::Normal)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fireworks::NullSound;

    fn show(mode: Mode) -> FireworkShow {
        FireworkShow::new(mode, ShowOptions::default(), PerformanceTier::High)
    }

    #[test]
    fn queue_preserves_submission_order_for_equal_fire_times() {
        let mut s = show(Mode::Random);
        for i in 0..5 {
            s.enqueue(PendingLaunch::ascent(i as f64, 0.0, 0.0, 0.0, 0.5));
        }
        let mut popped = Vec::new();
        while let Some(Reverse(entry)) = s.queue.pop() {
            popped.push(entry.launch.start_x as i64);
        }
        assert_eq!(popped, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn queue_orders_by_fire_time_first() {
        let mut s = show(Mode::Random);
        s.enqueue(PendingLaunch::ascent(1.0, 0.0, 0.0, 0.0, 0.9));
        s.enqueue(PendingLaunch::ascent(2.0, 0.0, 0.0, 0.0, 0.1));
        let first = s.queue.pop().unwrap().0;
        assert_eq!(first.launch.start_x as i64, 2);
    }

    #[test]
    fn live_rocket_count_never_exceeds_cap() {
        let mut s = show(Mode::Random);
        let view = Viewport::new(800, 600);
        for i in 0..40 {
            s.enqueue(PendingLaunch::ascent(
                20.0 + i as f64 * 10.0,
                600.0,
                20.0 + i as f64 * 10.0,
                200.0,
                0.0,
            ));
        }
        let mut sound = NullSound;
        s.tick(view, &mut sound);
        assert_eq!(s.rocket_count(), MAX_FIREWORKS);
        // Overflow launches were dropped, not deferred.
        assert!(s.queue.is_empty());
    }

    #[test]
    fn play_show_is_a_no_op_while_playing() {
        let mut s = show(Mode::Choreography);
        assert!(s.play_show(0));
        assert!(s.is_playing());
        assert!(!s.play_show(1));
        assert_eq!(s.current_show, 0);
        // Still on the first scene of the original show.
        assert_eq!(s.scene_index, 0);
    }

    #[test]
    fn scripted_show_finishes_and_can_be_restarted() {
        let mut s = show(Mode::Choreography);
        let view = Viewport::new(800, 600);
        let mut sound = NullSound;
        assert!(s.play_show(2));
        // Long enough for three scenes plus pauses and rocket flights.
        for _ in 0..60 * 60 {
            s.tick(view, &mut sound);
        }
        assert!(!s.is_playing());
        assert!(s.play_show(0));
        assert_eq!(s.scene_index, 0);
    }

    #[test]
    fn random_launches_stay_within_margins_and_height_band() {
        let mut s = show(Mode::Random);
        let view = Viewport::new(800, 600);
        for _ in 0..200 {
            let launch = s.random_launch(view);
            assert!((20.0..=780.0).contains(&launch.start_x));
            assert!((20.0..=780.0).contains(&launch.target_x));
            assert!(launch.target_y >= 600.0 * 0.1);
            assert!(launch.target_y <= 600.0 * 0.8);
            assert_eq!(launch.start_y, 600.0);
        }
    }

    #[test]
    fn formations_enqueue_targets_inside_the_viewport() {
        let view = Viewport::new(400, 300);
        for formation in 0..6 {
            let mut s = show(Mode::Choreography);
            match formation {
                0 => s.formation_heart(view),
                1 => s.formation_ring(view),
                2 => s.formation_cascade(view),
                3 => s.formation_cross(view),
                4 => s.formation_staircase(view),
                _ => s.formation_rainbow(view),
            }
            assert!(!s.queue.is_empty());
            while let Some(Reverse(entry)) = s.queue.pop() {
                assert!((0.0..=400.0).contains(&entry.launch.target_x));
                assert!((0.0..=300.0).contains(&entry.launch.target_y));
            }
        }
    }

    #[test]
    fn mode_toggle_round_trips() {
        let mut s = show(Mode::Random);
        s.toggle_mode();
        assert_eq!(s.mode(), Mode::Choreography);
        s.toggle_mode();
        assert_eq!(s.mode(), Mode::Random);
    }
}
