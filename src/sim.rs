//! Frame-rate update and the low-frequency game tick. Everything here is
//! driven by a session clock (`now`, seconds since launch) plus a clamped
//! per-frame `dt`; nothing reads the wall clock directly.

use crate::model::*;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::f32::consts::PI;

// --- Steering ---------------------------------------------------------------

const DT_CLAMP: f32 = 0.1;

const CHASE_ACCEL: f32 = 0.1;
const IDLE_ACCEL: f32 = 0.05;
const CHASE_SLOWING_RADIUS: f32 = 120.0;
const IDLE_SLOWING_RADIUS: f32 = 80.0;
const CHASE_SPEED_FLOOR: f32 = 0.4;
const IDLE_SPEED_FLOOR: f32 = 0.2;
const CHASE_FACING_EASE: f32 = 0.15;
const IDLE_FACING_EASE: f32 = 0.08;
/// Per-frame velocity damping; tighter when braking near a chase target.
const FRICTION: f32 = 0.95;
const BRAKING_FRICTION: f32 = 0.85;
const BRAKING_RADIUS_SCALE: f32 = 40.0;
/// Non-chase targets count as reached inside this radius (times scale).
const ARRIVE_RADIUS_SCALE: f32 = 50.0;
const FISH_HALF_WIDTH: f32 = 28.0;
const BOB_PHASE_RATE: f32 = 1.2;
const ROTATION_EASE: f32 = 0.1;

const SLEEP_SPEED: f32 = 40.0;
const SLEEP_EASE: f32 = 0.05;
const SLEEP_ARRIVE_DIST: f32 = 10.0;
const SLEEP_FADE_IN_PER_SEC: f32 = 0.5;
const SLEEP_FADE_OUT_PER_SEC: f32 = 1.0;

const HUNGER_SEEK_THRESHOLD: f32 = 95.0;
const FOOD_LANE_SPACING: f32 = 25.0;
const FRIEND_FOLLOW_CHANCE: f64 = 0.005;
const FRIEND_TRAIL_OFFSET: f32 = 60.0;
/// Free-roam depth is biased toward mid-water with this exponent.
const ROAM_DEPTH_BIAS: f32 = 0.6;

const TOY_RING_RADIUS: f32 = 55.0;
const TOY_RING_JITTER: f32 = 20.0;

// --- Interaction ------------------------------------------------------------

const POKE_RADIUS_SCALE: f32 = 50.0;
const POKE_IMPULSE: f32 = 250.0;
const EAT_RADIUS_SCALE: f32 = 25.0;
const EAT_COOLDOWN_SECS: f64 = 0.5;
const HUNGER_PER_PELLET: f32 = 25.0;
const SQUEAK_RADIUS_SCALE: f32 = 65.0;
const SQUEAK_COOLDOWN_SECS: f64 = 0.5;
const SQUEAK_HAPPINESS: f32 = 5.0;
const DOUBLE_TAP_SECS: f64 = 0.3;
const FOOD_CAP: usize = 10;
const FOOD_PELLETS_PER_FEED: usize = 3;
const TOY_GRACE_SECS: f64 = 3.0;

// --- Particles --------------------------------------------------------------

const FOOD_FALL_GRAVITY: f32 = 200.0;
const FOOD_SPLASH_DAMPING: f32 = 0.3;
const FOOD_SINK_GRAVITY: f32 = 25.0;
const FOOD_SINK_DRAG: f32 = 0.98;
const FOOD_BOUNCE: f32 = -0.4;
const FOOD_FLOOR_DRAG: f32 = 0.7;
const FOOD_LIFE_SECS: f32 = 15.0;
const FOOD_SETTLED_DRAIN_PER_SEC: f32 = 0.5;

const BUBBLE_INTERVAL_SECS: f64 = 0.8;
const BUBBLE_INTERVAL_JITTER: f64 = 0.2;
const AMBIENT_BUBBLE_CAP: usize = 120;
const AMBIENT_BUBBLE_CHANCE: f64 = 0.9;
const RIPPLE_GROWTH_PER_SEC: f32 = 30.0;
const RIPPLE_DECAY_PER_SEC: f32 = 0.8;

const SHAKE_FORCE: f32 = 300.0;
const SHAKE_FOOD_FORCE: f32 = 75.0;
const SHAKE_BUBBLE_SHIFT: f32 = 10.0;

/// Mood as a pure function of the five-stat mean; death pins it to Sos.
pub(crate) fn mood_for(stats: &Stats, alive: bool) -> Mood {
    if !alive {
        return Mood::Sos;
    }
    let m = stats.mean();
    if m > 75.0 {
        Mood::Happy
    } else if m > 50.0 {
        Mood::Ok
    } else if m > 25.0 {
        Mood::Sick
    } else {
        Mood::Sos
    }
}

impl Tank {
    /// Advance everything by one frame. Returns true when the low-frequency
    /// tick fired, which is the caller's cue to autosave.
    pub(crate) fn update(&mut self, now: f64, dt: f32, bounds: TankBounds) -> bool {
        if bounds.is_degenerate() || dt <= 0.0 {
            return false;
        }
        let dt = dt.min(DT_CLAMP);

        self.tick_cleaning(now);
        self.expire_toy(now);
        self.step_fish(now, dt, bounds);
        self.step_particles(now, dt, bounds);

        if now - self.last_tick > TICK_SECS {
            self.low_tick(now, bounds);
            true
        } else {
            false
        }
    }

    fn expire_toy(&mut self, now: f64) {
        if let Some(at) = self.toy_expires_at {
            if now >= at && !self.dragging_toy {
                self.toy = None;
                self.toy_expires_at = None;
            }
        }
    }

    /// Cleanliness ramps linearly from the values captured at activation up
    /// to 100 over the cycle; poop is removed only at completion.
    fn tick_cleaning(&mut self, now: f64) {
        let Some(cycle) = &self.cleaning else {
            return;
        };
        let t = (((now - cycle.started) / CLEAN_DURATION_SECS) as f32).clamp(0.0, 1.0);
        for (f, start) in self.fish.iter_mut().zip(&cycle.start_cleanliness) {
            if f.alive {
                f.stats.cleanliness = (start + (100.0 - start) * t).clamp(0.0, 100.0);
            }
        }
        if t >= 1.0 {
            for f in &mut self.fish {
                f.stats.cleanliness = 100.0;
            }
            self.poops.clear();
            self.cleaning = None;
            // fresh decay window, no double-dip right after the scrub
            self.last_tick = now;
        }
    }

    fn step_fish(&mut self, now: f64, dt: f32, bounds: TankBounds) {
        let water_top = bounds.water_top();
        let sand = bounds.sand_y();

        // Snapshot positions for friend-following so a fish can trail
        // another without a second mutable borrow of the roster.
        struct Mate {
            id: u32,
            pos: Vec2,
            facing: f32,
            scale: f32,
        }
        let mates: Vec<Mate> = self
            .fish
            .iter()
            .filter(|f| f.alive)
            .map(|f| Mate {
                id: f.id,
                pos: f.pos,
                facing: f.facing,
                scale: f.scale,
            })
            .collect();

        // Fish converging on the toy fan out over a semicircle below it,
        // one angular slot per eligible fish.
        let toy_pos = if self.play_mode {
            self.toy.map(|t| t.pos)
        } else {
            None
        };
        let toy_slots: Vec<u32> = self
            .fish
            .iter()
            .filter(|f| f.alive && !f.is_sleepy() && now - f.last_ate > EAT_COOLDOWN_SECS)
            .map(|f| f.id)
            .collect();

        let Tank {
            fish,
            food,
            rng,
            cues,
            last_squeak,
            play_mode,
            toy,
            ..
        } = self;
        let play = *play_mode;

        for f in fish.iter_mut() {
            if !f.alive {
                continue;
            }

            let fade = if f.is_sleepy() {
                SLEEP_FADE_IN_PER_SEC * dt
            } else {
                -SLEEP_FADE_OUT_PER_SEC * dt
            };
            f.sleep_progress = (f.sleep_progress + fade).clamp(0.0, 1.0);

            // Any live fish hoovers up pellets in reach, even one drifting
            // down to its resting spot or already asleep.
            let before = food.len();
            let pos = f.pos;
            let radius = EAT_RADIUS_SCALE * f.scale;
            food.retain(|pellet| pellet.pos.dist(pos) >= radius);
            let eaten = before - food.len();
            if eaten > 0 {
                cues.push(SoundCue::Eat);
                f.stats.hunger = (f.stats.hunger + HUNGER_PER_PELLET * eaten as f32).min(100.0);
                f.target = None;
                f.last_ate = now;
            }

            if f.activity == Activity::Sleeping {
                continue;
            }

            if f.activity == Activity::GoingToSleep {
                // Drift to the resting spot, then stop for good.
                if !matches!(f.target, Some(Target::Roam(_))) {
                    let x = rng.gen::<f32>() * bounds.w;
                    f.target = Some(Target::Roam(Vec2::new(x, sand - 20.0)));
                }
                let spot = f.target.map(|t| t.pos()).unwrap_or(f.pos);
                let delta = spot - f.pos;
                if delta.len() < SLEEP_ARRIVE_DIST {
                    f.activity = Activity::Sleeping;
                    f.vel = Vec2::new(0.0, 0.0);
                    f.target = None;
                    continue;
                }
                let desired = delta.norm() * SLEEP_SPEED;
                f.vel.x += (desired.x - f.vel.x) * SLEEP_EASE;
                f.vel.y += (desired.y - f.vel.y) * SLEEP_EASE;
            } else {
                let just_ate = now - f.last_ate <= EAT_COOLDOWN_SECS;
                if !just_ate {
                    if let Some(tp) = toy_pos {
                        let n = toy_slots.len().max(1);
                        let k = toy_slots.iter().position(|&id| id == f.id).unwrap_or(0);
                        let angle = PI * (k + 1) as f32 / (n + 1) as f32;
                        let radius = TOY_RING_RADIUS
                            + (f.id.wrapping_mul(17) as f32) % TOY_RING_JITTER;
                        let spot = Vec2::new(
                            tp.x + angle.cos() * radius,
                            (tp.y + angle.sin() * radius).max(water_top + 20.0),
                        );
                        f.target = Some(Target::Toy(spot));
                    } else {
                        if matches!(f.target, Some(Target::Toy(_))) {
                            f.target = None;
                        }
                        // Non-chase targets count as reached near the spot.
                        if let Some(t) = f.target {
                            if !t.is_chase() && t.pos().dist(f.pos) < ARRIVE_RADIUS_SCALE * f.scale
                            {
                                f.target = None;
                            }
                        }

                        let mut closest: Option<Vec2> = None;
                        if f.stats.hunger < HUNGER_SEEK_THRESHOLD {
                            let mut best = f32::INFINITY;
                            for pellet in food.iter() {
                                if pellet.pos.y <= water_top {
                                    continue;
                                }
                                let d = pellet.pos.dist(f.pos);
                                if d < best {
                                    best = d;
                                    closest = Some(pellet.pos);
                                }
                            }
                        }
                        if let Some(fp) = closest {
                            // Per-fish lateral lane so the school doesn't
                            // pile onto one pellet.
                            let lane = (f.id as f32 - 1.5) * FOOD_LANE_SPACING * f.scale;
                            f.target = Some(Target::Food(Vec2::new(fp.x + lane, fp.y)));
                        } else {
                            if matches!(f.target, Some(Target::Food(_))) {
                                f.target = None;
                            }
                            if f.activity == Activity::Idle && f.target.is_none() {
                                let follow = rng.gen::<f64>() < FRIEND_FOLLOW_CHANCE;
                                let others: Vec<&Mate> =
                                    mates.iter().filter(|m| m.id != f.id).collect();
                                if follow && !others.is_empty() {
                                    let mate = others[rng.gen_range(0..others.len())];
                                    let behind = if mate.facing > 0.0 { -1.0 } else { 1.0 };
                                    f.target = Some(Target::Friend(Vec2::new(
                                        mate.pos.x + behind * FRIEND_TRAIL_OFFSET * mate.scale,
                                        mate.pos.y + (rng.gen::<f32>() - 0.5) * 30.0,
                                    )));
                                } else {
                                    let x =
                                        50.0 + rng.gen::<f32>() * (bounds.w - 100.0).max(1.0);
                                    let depth = rng.gen::<f32>().powf(ROAM_DEPTH_BIAS);
                                    let y = water_top
                                        + 40.0
                                        + depth * (sand - water_top - 80.0).max(1.0);
                                    f.target = Some(Target::Roam(Vec2::new(x, y)));
                                }
                            }
                        }
                    }
                }

                if let Some(t) = f.target {
                    let delta = t.pos() - f.pos;
                    let dist = delta.len().max(1.0);
                    let (top, accel, slow_r, floor, face_ease) = if t.is_chase() {
                        (
                            f.mood.chase_speed(),
                            CHASE_ACCEL,
                            CHASE_SLOWING_RADIUS,
                            CHASE_SPEED_FLOOR,
                            CHASE_FACING_EASE,
                        )
                    } else if matches!(t, Target::Friend(_)) {
                        (
                            f.mood.follow_speed(),
                            IDLE_ACCEL,
                            IDLE_SLOWING_RADIUS,
                            IDLE_SPEED_FLOOR,
                            IDLE_FACING_EASE,
                        )
                    } else {
                        (
                            f.mood.idle_speed(),
                            IDLE_ACCEL,
                            IDLE_SLOWING_RADIUS,
                            IDLE_SPEED_FLOOR,
                            IDLE_FACING_EASE,
                        )
                    };
                    let mut speed = top;
                    if dist < slow_r {
                        speed *= floor + (1.0 - floor) * (dist / slow_r);
                    }
                    let desired = delta * (speed / dist);
                    f.vel.x += (desired.x - f.vel.x) * accel;
                    f.vel.y += (desired.y - f.vel.y) * accel;
                    if f.vel.x.abs() > 0.1 {
                        f.facing += (f.vel.x.signum() - f.facing) * face_ease;
                    }
                }
            }

            // Shared integration for every awake fish, sleep-bound or not.
            let mut friction = FRICTION;
            if let Some(t) = f.target {
                if t.is_chase() && t.pos().dist(f.pos) < BRAKING_RADIUS_SCALE * f.scale {
                    friction = BRAKING_FRICTION;
                }
            }
            f.vel = f.vel * friction;
            f.pos += f.vel * dt;

            let half = FISH_HALF_WIDTH * f.scale;
            let lo_x = half.min(bounds.w / 2.0);
            let hi_x = (bounds.w - half).max(bounds.w / 2.0);
            f.pos.x = f.pos.x.clamp(lo_x, hi_x);
            f.pos.y = f.pos.y.clamp(water_top + 20.0, sand - 10.0);

            f.phase += BOB_PHASE_RATE * dt;
            let speed = f.vel.len();
            let mut target_rot = if speed > 5.0 {
                (f.vel.y.clamp(-100.0, 100.0) / 100.0) * (PI / 12.0)
            } else {
                0.0
            };
            if f.facing < -0.33 {
                target_rot = -target_rot;
            }
            f.rotation += (target_rot - f.rotation) * ROTATION_EASE;

            // Contact events: squeak the toy on touch.
            if play {
                if let Some(t) = toy.as_ref() {
                    if f.pos.dist(t.pos) < SQUEAK_RADIUS_SCALE * f.scale
                        && now - *last_squeak > SQUEAK_COOLDOWN_SECS
                    {
                        *last_squeak = now;
                        cues.push(SoundCue::ToySqueak);
                        f.stats.happiness = (f.stats.happiness + SQUEAK_HAPPINESS).min(100.0);
                    }
                }
            }
        }
    }

    fn step_particles(&mut self, now: f64, dt: f32, bounds: TankBounds) {
        let water_top = bounds.water_top();
        let sand = bounds.sand_y();
        let mut plopped = false;
        let mut new_ripples: Vec<Ripple> = Vec::new();

        for pellet in &mut self.food {
            match pellet.phase {
                FoodPhase::Falling => {
                    pellet.vel.y += FOOD_FALL_GRAVITY * dt;
                    pellet.pos += pellet.vel * dt;
                    if pellet.pos.y >= water_top {
                        pellet.phase = FoodPhase::Sinking;
                        pellet.vel.y *= FOOD_SPLASH_DAMPING;
                        plopped = true;
                        new_ripples.push(Ripple {
                            pos: Vec2::new(pellet.pos.x, water_top + 1.0),
                            radius: 2.0,
                            life: 1.0,
                        });
                    }
                }
                FoodPhase::Sinking => {
                    pellet.vel.y += FOOD_SINK_GRAVITY * dt;
                    pellet.vel = pellet.vel * FOOD_SINK_DRAG;
                    pellet.pos += pellet.vel * dt;
                    if pellet.pos.x < 4.0 || pellet.pos.x > bounds.w - 4.0 {
                        pellet.vel.x *= -0.5;
                        pellet.pos.x = pellet.pos.x.clamp(4.0, bounds.w - 4.0);
                    }
                    if pellet.pos.y >= sand - 2.0 {
                        pellet.pos.y = sand - 2.0;
                        if pellet.vel.y.abs() > 10.0 {
                            pellet.vel.y *= FOOD_BOUNCE;
                            pellet.vel.x *= FOOD_FLOOR_DRAG;
                        } else {
                            pellet.vel = Vec2::new(0.0, 0.0);
                            pellet.phase = FoodPhase::Settled;
                        }
                    }
                }
                FoodPhase::Settled => {
                    pellet.life -= FOOD_SETTLED_DRAIN_PER_SEC * dt;
                }
            }
        }
        self.food.retain(|p| p.life > 0.0);
        if plopped {
            self.cue(SoundCue::Plop);
        }

        // Breath bubbles pop into surface ripples.
        let mut i = 0;
        while i < self.bubbles.len() {
            let b = &mut self.bubbles[i];
            b.pos.y -= b.vy * dt;
            if b.pos.y - b.r <= water_top {
                new_ripples.push(Ripple {
                    pos: Vec2::new(b.pos.x, water_top + 1.0),
                    radius: b.r,
                    life: 0.5,
                });
                self.bubbles.swap_remove(i);
            } else {
                i += 1;
            }
        }
        self.background_bubbles.retain_mut(|b| {
            b.pos.y -= b.vy * dt;
            b.pos.x += (b.pos.y / 30.0).sin() * 30.0 * dt;
            b.pos.y - b.r > water_top
        });

        let live = self.fish.iter().filter(|f| f.alive).count();
        for f in &mut self.fish {
            if !f.alive || f.is_sleepy() {
                continue;
            }
            let (rise, cap) = f.mood.bubble_params();
            if self.bubbles.len() < cap * live && now >= f.next_bubble_at {
                self.bubbles.push(Bubble {
                    pos: Vec2::new(f.pos.x + f.facing * 14.0 * f.scale, f.pos.y - 4.0),
                    r: (1.0 + self.rng.gen::<f32>() * 2.5) * f.scale,
                    vy: (rise + self.rng.gen::<f32>() * 10.0) * f.scale,
                    alpha: 0.8,
                });
                f.next_bubble_at =
                    now + BUBBLE_INTERVAL_SECS + self.rng.gen::<f64>() * BUBBLE_INTERVAL_JITTER;
            }
        }

        if self.background_bubbles.len() < AMBIENT_BUBBLE_CAP
            && self.rng.gen::<f64>() < AMBIENT_BUBBLE_CHANCE
        {
            self.background_bubbles.push(Bubble {
                pos: Vec2::new(self.rng.gen::<f32>() * bounds.w, sand),
                r: 0.5 + self.rng.gen::<f32>() * 2.0,
                vy: 20.0 + self.rng.gen::<f32>() * 40.0,
                alpha: 0.1 + self.rng.gen::<f32>() * 0.4,
            });
        }

        for r in &mut self.ripples {
            r.radius += RIPPLE_GROWTH_PER_SEC * dt;
            r.life -= RIPPLE_DECAY_PER_SEC * dt;
        }
        self.ripples.retain(|r| r.life > 0.0);
        self.ripples.extend(new_ripples);
    }

    /// The 5-second needs tick: decay, health drift, mortality, mood,
    /// social bonus, waste.
    fn low_tick(&mut self, now: f64, bounds: TankBounds) {
        self.last_tick = now;
        let poop_count = self.poops.len();

        for f in &mut self.fish {
            if !f.alive {
                continue;
            }
            if f.activity == Activity::Sleeping {
                f.stats.energy += ENERGY_REGEN_PER_TICK;
            } else {
                f.stats.hunger -= HUNGER_DECAY_PER_TICK;
                f.stats.happiness -= HAPPINESS_DECAY_PER_TICK;
                f.stats.energy -= ENERGY_DECAY_PER_TICK;
            }
            if poop_count > 0 {
                f.stats.cleanliness -= CLEANLINESS_DECAY_PER_POOP * poop_count as f32;
            }
            f.stats.clamp_all();

            let needs = f.stats.needs_mean();
            if needs < HEALTH_DECAY_THRESHOLD {
                f.stats.health -= HEALTH_DECAY_PER_TICK;
            } else if needs > HEALTH_REGEN_THRESHOLD {
                f.stats.health += HEALTH_REGEN_PER_TICK;
            }
            f.stats.clamp_all();

            if f.stats.health <= 0.0 {
                f.alive = false;
                f.target = None;
                f.vel = Vec2::new(0.0, 0.0);
            }
            f.mood = mood_for(&f.stats, f.alive);
        }

        // Fish swimming close together cheer each other up a little.
        for i in 0..self.fish.len() {
            let (head, tail) = self.fish.split_at_mut(i + 1);
            let a = &mut head[i];
            for b in tail.iter_mut() {
                if !a.alive || !b.alive {
                    continue;
                }
                let range = 40.0 * a.scale + 40.0 * b.scale + 20.0;
                if a.pos.dist(b.pos) < range {
                    a.stats.happiness = (a.stats.happiness + SOCIAL_BONUS).min(100.0);
                    b.stats.happiness = (b.stats.happiness + SOCIAL_BONUS).min(100.0);
                }
            }
        }

        if self.poops.len() < POOP_CAP {
            let candidates: Vec<Vec2> = self
                .fish
                .iter()
                .filter(|f| f.alive && !f.is_sleepy() && f.stats.hunger > POOP_HUNGER_GATE)
                .map(|f| f.pos)
                .collect();
            if !candidates.is_empty() && self.rng.gen::<f64>() < POOP_CHANCE_PER_TICK {
                let pos = candidates[self.rng.gen_range(0..candidates.len())];
                let id = self.alloc_id();
                self.poops.push(Poop {
                    id,
                    pos: Vec2::new(pos.x.clamp(10.0, bounds.w - 10.0), bounds.sand_y() - 4.0),
                });
            }
        }
    }

    // --- Interaction --------------------------------------------------------

    pub(crate) fn pointer_down(&mut self, now: f64, p: Vec2, bounds: TankBounds) {
        if !self.any_alive() || self.any_sleepy() {
            return;
        }
        if self.play_mode {
            self.dragging_toy = true;
            self.toy_expires_at = None;
            self.toy = Some(Toy { pos: p });
            return;
        }

        let poked = self
            .fish
            .iter_mut()
            .find(|f| f.alive && f.pos.dist(p) < POKE_RADIUS_SCALE * f.scale);
        if let Some(f) = poked {
            let mut away = (f.pos - p).norm();
            if away.len() < 0.5 {
                away = Vec2::new(1.0, 0.0);
            }
            f.vel += away * POKE_IMPULSE;
            f.target = None;
            self.cue(SoundCue::Poke);
            // A poke is not a tap; it must not arm a feed.
            self.last_tap = None;
            return;
        }

        if matches!(self.last_tap, Some(t) if now - t < DOUBLE_TAP_SECS) {
            if self.food.len() >= FOOD_CAP {
                return;
            }
            self.last_tap = None;
            self.cue(SoundCue::Feed);
            for _ in 0..FOOD_PELLETS_PER_FEED {
                self.spawn_pellet(p, bounds);
            }
        } else {
            self.last_tap = Some(now);
        }
    }

    fn spawn_pellet(&mut self, p: Vec2, bounds: TankBounds) {
        let id = self.alloc_id();
        let x = (p.x + (self.rng.gen::<f32>() - 0.5) * 30.0).clamp(4.0, bounds.w - 4.0);
        self.food.push(Food {
            id,
            pos: Vec2::new(x, bounds.water_top() - 10.0),
            vel: Vec2::new(
                (self.rng.gen::<f32>() - 0.5) * 15.0,
                self.rng.gen::<f32>() * -5.0,
            ),
            phase: FoodPhase::Falling,
            life: FOOD_LIFE_SECS,
            tint: self.rng.gen_range(0..4),
        });
    }

    pub(crate) fn pointer_move(&mut self, p: Vec2) {
        if self.play_mode && self.dragging_toy {
            self.toy = Some(Toy { pos: p });
        }
    }

    pub(crate) fn pointer_up(&mut self, now: f64) {
        if self.play_mode && self.dragging_toy {
            self.dragging_toy = false;
            // The toy lingers a moment so fish can catch up to it.
            self.toy_expires_at = Some(now + TOY_GRACE_SECS);
        }
    }

    pub(crate) fn toggle_play(&mut self) {
        if !self.any_alive() {
            return;
        }
        self.play_mode = !self.play_mode;
        if !self.play_mode {
            self.toy = None;
            self.dragging_toy = false;
            self.toy_expires_at = None;
            for f in &mut self.fish {
                f.target = None;
            }
        }
    }

    pub(crate) fn start_clean(&mut self, now: f64) {
        if self.cleaning.is_some() || !self.any_alive() || self.any_sleepy() {
            return;
        }
        let dirty = !self.poops.is_empty()
            || self
                .fish
                .iter()
                .any(|f| f.alive && f.stats.cleanliness < 99.0);
        if !dirty {
            return;
        }
        self.cue(SoundCue::Clean);
        self.cleaning = Some(CleaningCycle {
            started: now,
            start_cleanliness: self.fish.iter().map(|f| f.stats.cleanliness).collect(),
        });
    }

    /// One switch for the whole tank: every live fish heads for the sand
    /// and dozes off, or wakes immediately.
    pub(crate) fn toggle_lights(&mut self, bounds: TankBounds) {
        if !self.any_alive() {
            return;
        }
        let waking = self.any_sleepy();
        let sand = bounds.sand_y();
        let primary_id = self.primary().map(|f| f.id);
        for f in &mut self.fish {
            if !f.alive {
                continue;
            }
            if waking {
                f.activity = Activity::Idle;
                f.target = None;
            } else if f.activity != Activity::GoingToSleep {
                f.activity = Activity::GoingToSleep;
                let spot = if Some(f.id) == primary_id {
                    Vec2::new(bounds.w / 2.0, sand - 20.0)
                } else {
                    Vec2::new(
                        50.0 + self.rng.gen::<f32>() * (bounds.w - 100.0).max(1.0),
                        sand - 20.0 - self.rng.gen::<f32>() * 20.0,
                    )
                };
                f.target = Some(Target::Roam(spot));
            }
        }
    }

    pub(crate) fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    /// A terminal resize sloshes the water: sideways impulse on every live
    /// fish, drifting food and bubbles, one surface ripple.
    pub(crate) fn shake(&mut self, bounds: TankBounds) {
        self.cue(SoundCue::Swish);
        let dir = if self.rng.gen::<bool>() { 1.0 } else { -1.0 };
        for f in &mut self.fish {
            if !f.alive {
                continue;
            }
            f.vel.x += dir * SHAKE_FORCE * (0.75 + self.rng.gen::<f32>() * 0.5);
            f.target = None;
        }
        for pellet in &mut self.food {
            pellet.vel.x += dir * SHAKE_FOOD_FORCE;
        }
        for b in &mut self.bubbles {
            b.pos.x -= dir * SHAKE_BUBBLE_SHIFT;
        }
        self.ripples.push(Ripple {
            pos: Vec2::new(bounds.w / 2.0, bounds.water_top() + 1.0),
            radius: 1.0,
            life: 1.5,
        });
    }

    // --- Persistence --------------------------------------------------------

    /// Rebuild a running tank from a save, applying one-shot offline decay
    /// for the time the program was closed.
    pub(crate) fn restore(
        save: SaveFile,
        seed: u64,
        bounds: TankBounds,
        now_utc: DateTime<Utc>,
    ) -> Self {
        let mut tank = Tank::new(seed, bounds);
        tank.fish = save.fish;
        tank.food = save.food;
        tank.poops = save.poops;
        tank.muted = save.muted;
        tank.next_particle_id = tank
            .food
            .iter()
            .map(|f| f.id)
            .chain(tank.poops.iter().map(|p| p.id))
            .max()
            .unwrap_or(0);

        let hours = ((now_utc - save.last_save).num_seconds().max(0) as f32) / 3600.0;
        let poop_count = tank.poops.len();
        catch_up(&mut tank.fish, poop_count, hours);

        for f in &mut tank.fish {
            f.pos.x = f.pos.x.clamp(0.0, bounds.w);
            f.pos.y = f
                .pos
                .y
                .clamp(bounds.water_top() + 20.0, bounds.sand_y() - 10.0);
        }
        tank
    }
}

/// One-shot offline adjustment. Linear per-hour rates rather than a tick
/// replay, so waking up a long-abandoned tank stays cheap and predictable.
/// A mid-descent sleeper is normalized straight to asleep.
pub(crate) fn catch_up(fish: &mut [Fish], poop_count: usize, hours: f32) {
    let h = hours.max(0.0);
    for f in fish {
        if f.alive {
            let asleep = f.is_sleepy();
            f.stats.hunger -= OFFLINE_HUNGER_PER_HOUR * h;
            f.stats.happiness -= OFFLINE_HAPPINESS_PER_HOUR * h;
            if asleep {
                f.stats.energy += OFFLINE_ENERGY_REGEN_PER_HOUR * h;
            } else {
                f.stats.energy -= OFFLINE_ENERGY_PER_HOUR * h;
            }
            f.stats.cleanliness -= OFFLINE_CLEANLINESS_PER_POOP_HOUR * poop_count as f32 * h;
            f.stats.clamp_all();

            let needs = f.stats.needs_mean();
            if needs < HEALTH_DECAY_THRESHOLD {
                f.stats.health -= OFFLINE_HEALTH_DECAY_PER_HOUR * h;
            } else if needs > HEALTH_REGEN_THRESHOLD {
                f.stats.health += OFFLINE_HEALTH_REGEN_PER_HOUR * h;
            }
            f.stats.clamp_all();

            if f.stats.health <= 0.0 {
                f.alive = false;
            }
        }
        f.mood = mood_for(&f.stats, f.alive);

        if f.activity == Activity::GoingToSleep {
            f.activity = Activity::Sleeping;
            f.target = None;
            f.vel = Vec2::new(0.0, 0.0);
        }
        f.last_ate = f64::NEG_INFINITY;
        f.next_bubble_at = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn bounds() -> TankBounds {
        TankBounds::from_terminal(80, 26)
    }

    fn tank() -> Tank {
        Tank::new(42, bounds())
    }

    fn run_ticks(t: &mut Tank, mut now: f64, ticks: usize) -> f64 {
        for _ in 0..ticks {
            now += TICK_SECS + 0.1;
            t.update(now, 0.016, bounds());
        }
        now
    }

    fn far_corner() -> Vec2 {
        // Outside every fish's poke radius at spawn.
        Vec2::new(620.0, 360.0)
    }

    #[test]
    fn stats_stay_clamped_over_many_ticks() {
        let mut t = tank();
        run_ticks(&mut t, 0.0, 500);
        for f in &t.fish {
            let s = &f.stats;
            for v in [s.hunger, s.happiness, s.health, s.cleanliness, s.energy] {
                assert!((0.0..=100.0).contains(&v), "stat out of range: {v}");
            }
        }
    }

    #[test]
    fn mood_thresholds_over_the_mean() {
        let mk = |v: f32| Stats {
            hunger: v,
            happiness: v,
            health: v,
            cleanliness: v,
            energy: v,
        };
        assert_eq!(mood_for(&mk(80.0), true), Mood::Happy);
        assert_eq!(mood_for(&mk(75.0), true), Mood::Ok);
        assert_eq!(mood_for(&mk(50.0), true), Mood::Sick);
        assert_eq!(mood_for(&mk(25.0), true), Mood::Sos);
        assert_eq!(mood_for(&mk(100.0), false), Mood::Sos);
    }

    #[test]
    fn death_is_terminal_and_freezes_stats() {
        let mut t = tank();
        for f in &mut t.fish {
            f.stats = Stats {
                hunger: 0.0,
                happiness: 0.0,
                health: 2.0,
                cleanliness: 0.0,
                energy: 0.0,
            };
        }
        let now = run_ticks(&mut t, 0.0, 5);
        assert!(t.fish.iter().all(|f| !f.alive));
        assert!(t.fish.iter().all(|f| f.mood == Mood::Sos));

        // No decay, no targets, no revival once dead.
        for f in &mut t.fish {
            f.stats.hunger = 60.0;
            f.stats.health = 50.0;
        }
        run_ticks(&mut t, now, 3);
        for f in &t.fish {
            assert!(!f.alive);
            assert_eq!(f.stats.hunger, 60.0);
            assert!(f.target.is_none());
        }
    }

    #[test]
    fn cleaning_ramps_to_exactly_full_and_clears_poop() {
        let mut t = tank();
        for f in &mut t.fish {
            f.stats.cleanliness = 37.0;
        }
        t.poops.push(Poop {
            id: 1,
            pos: Vec2::new(100.0, 300.0),
        });
        t.start_clean(10.0);
        assert!(t.cleaning.is_some());
        assert_eq!(t.cues, vec![SoundCue::Clean]);

        // Mid-cycle the ramp is partial, re-activation is refused.
        t.update(11.0, 0.016, bounds());
        let mid = t.fish[0].stats.cleanliness;
        assert!(mid > 37.0 && mid < 100.0);
        t.start_clean(11.0);
        assert_eq!(t.cues.len(), 1);

        t.update(12.7, 0.016, bounds());
        assert!(t.cleaning.is_none());
        assert!(t.poops.is_empty());
        for f in &t.fish {
            assert_eq!(f.stats.cleanliness, 100.0);
        }

        // Nothing left to clean, so nothing starts.
        t.start_clean(13.0);
        assert!(t.cleaning.is_none());
    }

    #[test]
    fn scrub_polishes_a_dead_fish_to_full_too() {
        let mut t = tank();
        for f in &mut t.fish {
            f.stats.cleanliness = 40.0;
        }
        t.fish[2].alive = false;
        t.start_clean(0.0);
        assert!(t.cleaning.is_some());
        t.update(2.6, 0.016, bounds());
        assert!(t.cleaning.is_none());
        for f in &t.fish {
            assert_eq!(f.stats.cleanliness, 100.0);
        }
    }

    #[test]
    fn clean_refused_while_asleep() {
        let mut t = tank();
        t.fish[0].stats.cleanliness = 20.0;
        t.toggle_lights(bounds());
        t.start_clean(5.0);
        assert!(t.cleaning.is_none());
    }

    #[test]
    fn double_tap_feeds_and_single_tap_does_not() {
        let mut t = tank();
        t.pointer_down(1.0, far_corner(), bounds());
        assert!(t.food.is_empty());
        t.pointer_down(1.2, far_corner(), bounds());
        assert_eq!(t.food.len(), 3);
        assert_eq!(t.cues, vec![SoundCue::Feed]);
        assert!(t.food.iter().all(|f| f.phase == FoodPhase::Falling));

        // Two taps too far apart stay two single taps.
        t.pointer_down(5.0, far_corner(), bounds());
        t.pointer_down(5.5, far_corner(), bounds());
        assert_eq!(t.food.len(), 3);
    }

    #[test]
    fn poke_resets_the_tap_window() {
        let mut t = tank();
        let fish_pos = t.fish[0].pos;
        t.pointer_down(1.0, far_corner(), bounds());
        t.pointer_down(1.1, fish_pos, bounds());
        assert_eq!(t.cues, vec![SoundCue::Poke]);
        assert!(t.fish[0].vel.len() > 100.0);
        // The tap after the poke arms a fresh window instead of feeding.
        t.pointer_down(1.2, far_corner(), bounds());
        assert!(t.food.is_empty());
    }

    #[test]
    fn feed_refused_at_the_pellet_cap() {
        let mut t = tank();
        for i in 0..10 {
            t.food.push(Food {
                id: i,
                pos: Vec2::new(600.0, 350.0),
                vel: Vec2::new(0.0, 0.0),
                phase: FoodPhase::Settled,
                life: 10.0,
                tint: 0,
            });
        }
        t.pointer_down(1.0, far_corner(), bounds());
        t.pointer_down(1.2, far_corner(), bounds());
        assert_eq!(t.food.len(), 10);
        assert!(t.cues.is_empty());
    }

    #[test]
    fn interaction_refused_while_asleep_or_dead() {
        let mut t = tank();
        t.toggle_lights(bounds());
        t.pointer_down(1.0, t.fish[0].pos, bounds());
        assert!(t.cues.is_empty());

        let mut t = tank();
        for f in &mut t.fish {
            f.alive = false;
        }
        t.pointer_down(1.0, far_corner(), bounds());
        t.pointer_down(1.2, far_corner(), bounds());
        assert!(t.food.is_empty());
        t.toggle_play();
        assert!(!t.play_mode);
    }

    #[test]
    fn pellet_splashes_once_then_expires() {
        let mut t = tank();
        for f in &mut t.fish {
            f.alive = false; // nobody around to eat it
        }
        let b = bounds();
        t.spawn_pellet(Vec2::new(b.w / 2.0, 0.0), b);
        assert_eq!(t.food[0].phase, FoodPhase::Falling);

        let mut now = 0.0;
        let mut splashes = 0;
        let mut saw_settled = false;
        let mut prev = FoodPhase::Falling;
        for _ in 0..5000 {
            now += 0.016;
            t.update(now, 0.016, b);
            match t.food.first() {
                Some(p) => {
                    if prev == FoodPhase::Falling && p.phase == FoodPhase::Sinking {
                        splashes += 1;
                    }
                    saw_settled |= p.phase == FoodPhase::Settled;
                    prev = p.phase;
                }
                None => break,
            }
        }
        assert_eq!(splashes, 1);
        assert!(saw_settled);
        assert!(t.food.is_empty(), "settled pellet never expired");
        assert!(t.cues.contains(&SoundCue::Plop));
    }

    #[test]
    fn breath_bubble_cap_counts_only_live_fish() {
        let mut t = tank();
        let b = bounds();
        t.fish[1].alive = false;
        t.fish[2].alive = false;
        t.fish[0].stats = Stats {
            hunger: 10.0,
            happiness: 10.0,
            health: 80.0,
            cleanliness: 10.0,
            energy: 10.0,
        };
        t.fish[0].mood = Mood::Sos;
        let (_, cap) = Mood::Sos.bubble_params();
        let mut now = 0.0;
        for _ in 0..6000 {
            now += 0.016;
            t.update(now, 0.016, b);
            assert!(
                t.bubbles.len() <= cap,
                "one breather blew past its own cap: {}",
                t.bubbles.len()
            );
        }
    }

    #[test]
    fn ambient_drift_speed_is_frame_rate_independent() {
        let mut t = tank();
        let b = bounds();
        t.background_bubbles.push(Bubble {
            pos: Vec2::new(100.0, 200.0),
            r: 1.0,
            vy: 30.0,
            alpha: 0.2,
        });
        t.update(0.016, 0.016, b);
        let y: f32 = 200.0 - 30.0 * 0.016;
        let expect_x = 100.0 + (y / 30.0).sin() * 30.0 * 0.016;
        assert!((t.background_bubbles[0].pos.x - expect_x).abs() < 1e-3);
    }

    #[test]
    fn hungry_fish_finds_and_eats_a_pellet() {
        let mut t = tank();
        let b = bounds();
        for f in &mut t.fish {
            f.stats.hunger = 40.0;
        }
        let spot = Vec2::new(t.fish[0].pos.x, t.fish[0].pos.y + 60.0);
        t.food.push(Food {
            id: 1,
            pos: spot,
            vel: Vec2::new(0.0, 0.0),
            phase: FoodPhase::Settled,
            life: 1000.0,
            tint: 0,
        });
        let mut now = 0.0;
        for _ in 0..600 {
            now += 0.016;
            t.update(now, 0.016, b);
            if t.food.is_empty() {
                break;
            }
        }
        assert!(t.food.is_empty(), "pellet was never eaten");
        assert!(t.cues.contains(&SoundCue::Eat));
        let fed = t.fish.iter().find(|f| f.stats.hunger > 40.0).unwrap();
        assert!(!matches!(fed.target, Some(Target::Food(_))));
    }

    #[test]
    fn drowsy_and_sleeping_fish_still_eat_pellets_in_reach() {
        let mut t = tank();
        let b = bounds();
        t.toggle_lights(b);
        let mut now = 0.016;
        t.update(now, 0.016, b);
        assert_eq!(t.fish[0].activity, Activity::GoingToSleep);
        t.food.push(Food {
            id: 1,
            pos: t.fish[0].pos,
            vel: Vec2::new(0.0, 0.0),
            phase: FoodPhase::Settled,
            life: 1000.0,
            tint: 0,
        });
        now += 0.016;
        t.update(now, 0.016, b);
        assert!(t.food.is_empty(), "descending fish left the pellet uneaten");
        assert!(t.cues.contains(&SoundCue::Eat));

        for _ in 0..4000 {
            now += 0.016;
            t.update(now, 0.016, b);
            if t.fish.iter().all(|f| f.activity == Activity::Sleeping) {
                break;
            }
        }
        assert!(t.fish.iter().all(|f| f.activity == Activity::Sleeping));
        t.food.push(Food {
            id: 2,
            pos: t.fish[1].pos,
            vel: Vec2::new(0.0, 0.0),
            phase: FoodPhase::Settled,
            life: 1000.0,
            tint: 0,
        });
        now += 0.016;
        t.update(now, 0.016, b);
        assert!(t.food.is_empty(), "sleeping fish left the pellet uneaten");
    }

    #[test]
    fn toy_preempts_food_and_drops_when_play_ends() {
        let mut t = tank();
        let b = bounds();
        t.fish[0].target = Some(Target::Food(Vec2::new(100.0, 100.0)));
        t.toggle_play();
        t.pointer_down(1.0, Vec2::new(300.0, 150.0), b);
        t.update(1.02, 0.016, b);
        assert!(matches!(t.fish[0].target, Some(Target::Toy(_))));

        t.toggle_play();
        assert!(t.toy.is_none());
        t.update(1.05, 0.016, b);
        assert!(!matches!(t.fish[0].target, Some(Target::Toy(_))));
    }

    #[test]
    fn released_toy_expires_after_the_grace_period() {
        let mut t = tank();
        let b = bounds();
        t.toggle_play();
        t.pointer_down(1.0, Vec2::new(300.0, 150.0), b);
        t.pointer_move(Vec2::new(320.0, 160.0));
        assert_eq!(t.toy.unwrap().pos, Vec2::new(320.0, 160.0));
        t.pointer_up(2.0);
        t.update(4.0, 0.016, b);
        assert!(t.toy.is_some());
        t.update(5.1, 0.016, b);
        assert!(t.toy.is_none());
    }

    #[test]
    fn toy_contact_squeaks_once_per_cooldown() {
        let mut t = tank();
        let b = bounds();
        t.toggle_play();
        let on_fish = t.fish[0].pos;
        t.pointer_down(1.0, on_fish, b);
        let before = t.fish[0].stats.happiness;
        t.update(1.02, 0.016, b);
        t.update(1.04, 0.016, b);
        let squeaks = t.cues.iter().filter(|c| **c == SoundCue::ToySqueak).count();
        assert_eq!(squeaks, 1);
        assert!(t.fish[0].stats.happiness > before);
    }

    #[test]
    fn lights_out_sends_everyone_to_the_sand() {
        let mut t = tank();
        let b = bounds();
        t.toggle_lights(b);
        assert!(t.fish.iter().all(|f| f.activity == Activity::GoingToSleep));
        let sand = b.sand_y();
        for f in &t.fish {
            let spot = f.target.unwrap().pos();
            assert!(spot.y > sand - 45.0 && spot.y <= sand - 15.0);
        }

        let mut now = 0.0;
        for _ in 0..4000 {
            now += 0.016;
            t.update(now, 0.016, b);
            if t.fish.iter().all(|f| f.activity == Activity::Sleeping) {
                break;
            }
        }
        for f in &t.fish {
            assert_eq!(f.activity, Activity::Sleeping);
            assert_eq!(f.vel, Vec2::new(0.0, 0.0));
            assert!(f.sleep_progress > 0.0);
        }

        // Second toggle wakes everyone immediately.
        t.toggle_lights(b);
        assert!(t.fish.iter().all(|f| f.activity == Activity::Idle));
        assert!(t.fish.iter().all(|f| f.target.is_none()));
    }

    #[test]
    fn sleeping_fish_regains_energy_on_tick() {
        let mut t = tank();
        let b = bounds();
        t.toggle_lights(b);
        let mut now = 0.0;
        for _ in 0..4000 {
            now += 0.016;
            t.update(now, 0.016, b);
            if t.fish.iter().all(|f| f.activity == Activity::Sleeping) {
                break;
            }
        }
        assert!(t.fish.iter().all(|f| f.activity == Activity::Sleeping));
        for f in &mut t.fish {
            f.stats.energy = 50.0;
            f.stats.hunger = 80.0;
        }
        run_ticks(&mut t, now, 2);
        for f in &t.fish {
            assert!(f.stats.energy > 50.0);
            // Asleep fish do not get hungrier.
            assert_eq!(f.stats.hunger, 80.0);
        }
    }

    #[test]
    fn a_fish_still_descending_keeps_burning_energy() {
        let mut t = tank();
        let b = bounds();
        t.toggle_lights(b);
        t.update(0.016, 0.016, b);
        assert!(t.fish.iter().all(|f| f.activity == Activity::GoingToSleep));
        for f in &mut t.fish {
            f.stats.energy = 50.0;
        }
        run_ticks(&mut t, 0.016, 1);
        for f in &t.fish {
            assert!(f.stats.energy < 50.0);
        }
    }

    #[test]
    fn shake_shoves_fish_and_spawns_one_ripple() {
        let mut t = tank();
        for f in &mut t.fish {
            f.vel = Vec2::new(0.0, 0.0);
            f.target = Some(Target::Roam(Vec2::new(10.0, 10.0)));
        }
        t.shake(bounds());
        assert_eq!(t.ripples.len(), 1);
        assert_eq!(t.cues, vec![SoundCue::Swish]);
        for f in &t.fish {
            assert!(f.vel.x.abs() > 100.0);
            assert!(f.target.is_none());
        }
    }

    #[test]
    fn offline_decay_is_monotonic_in_elapsed_time() {
        let t = tank();
        let mut short = t.fish.clone();
        let mut long = t.fish.clone();
        catch_up(&mut short, 2, 2.0);
        catch_up(&mut long, 2, 10.0);
        for (s, l) in short.iter().zip(&long) {
            assert!(l.stats.hunger <= s.stats.hunger);
            assert!(l.stats.happiness <= s.stats.happiness);
            assert!(l.stats.energy <= s.stats.energy);
            assert!(l.stats.cleanliness <= s.stats.cleanliness);
        }
    }

    #[test]
    fn offline_sleepers_recharge_instead_of_draining() {
        let t = tank();
        let mut fish = t.fish.clone();
        for f in &mut fish {
            f.activity = Activity::Sleeping;
            f.stats.energy = 30.0;
        }
        catch_up(&mut fish, 0, 3.0);
        for f in &fish {
            assert!(f.stats.energy > 30.0);
        }
    }

    #[test]
    fn restore_normalizes_a_mid_descent_sleeper() {
        let b = bounds();
        let mut t = tank();
        t.toggle_lights(b);
        assert!(t.fish.iter().all(|f| f.activity == Activity::GoingToSleep));
        let save = SaveFile::snapshot(&t, Utc::now());
        let back = Tank::restore(save, 42, b, Utc::now());
        for f in &back.fish {
            assert_eq!(f.activity, Activity::Sleeping);
            assert!(f.target.is_none());
            assert_eq!(f.vel, Vec2::new(0.0, 0.0));
        }
    }

    #[test]
    fn restore_applies_elapsed_hours() {
        let b = bounds();
        let t = tank();
        let hunger_before = t.fish[0].stats.hunger;
        let mut save = SaveFile::snapshot(&t, Utc::now());
        save.last_save = Utc::now() - Duration::hours(6);
        let back = Tank::restore(save, 42, b, Utc::now());
        let f = &back.fish[0];
        assert!(f.stats.hunger < hunger_before);
        assert!((hunger_before - f.stats.hunger - 6.0 * OFFLINE_HUNGER_PER_HOUR).abs() < 0.2);
    }

    #[test]
    fn neglect_eventually_kills() {
        let mut t = tank();
        for f in &mut t.fish {
            f.stats = Stats {
                hunger: 5.0,
                happiness: 5.0,
                health: 100.0,
                cleanliness: 5.0,
                energy: 5.0,
            };
        }
        run_ticks(&mut t, 0.0, 120);
        assert!(t.fish.iter().all(|f| !f.alive));
        assert!(t.fish.iter().all(|f| f.mood == Mood::Sos));
    }

    #[test]
    fn idle_fish_picks_a_roam_target_inside_the_water() {
        let mut t = tank();
        let b = bounds();
        for f in &mut t.fish {
            f.stats.hunger = 100.0; // never seeks food
        }
        t.update(0.016, 0.016, b);
        for f in &t.fish {
            let spot = f.target.expect("idle fish should pick a target").pos();
            assert!(spot.x >= 0.0 && spot.x <= b.w);
            assert!(spot.y > b.water_top() && spot.y < b.sand_y());
        }
    }

    #[test]
    fn fish_never_leaves_the_tank() {
        let mut t = tank();
        let b = bounds();
        let mut now = 0.0;
        for i in 0..2000 {
            if i % 300 == 0 {
                t.shake(b);
            }
            now += 0.016;
            t.update(now, 0.016, b);
            for f in &t.fish {
                assert!(f.pos.x >= 0.0 && f.pos.x <= b.w);
                assert!(f.pos.y >= b.water_top() && f.pos.y <= b.sand_y());
            }
        }
    }

    #[test]
    fn zero_or_negative_dt_is_skipped() {
        let mut t = tank();
        let snapshot: Vec<Vec2> = t.fish.iter().map(|f| f.pos).collect();
        t.update(1.0, 0.0, bounds());
        t.update(1.0, -0.5, bounds());
        let after: Vec<Vec2> = t.fish.iter().map(|f| f.pos).collect();
        assert_eq!(snapshot, after);
    }
}
