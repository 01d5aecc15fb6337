use chrono::{DateTime, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub};

pub(crate) const SAVE_VERSION: u32 = 1;

/// Terminal cells map to this many simulation pixels.
pub(crate) const CELL_W_PX: f32 = 8.0;
pub(crate) const CELL_H_PX: f32 = 16.0;
/// Rows reserved for the HUD above the tank viewport.
pub(crate) const HUD_ROWS: u16 = 2;

pub(crate) const SAND_HEIGHT: f32 = 20.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Vec2 {
    pub(crate) x: f32,
    pub(crate) y: f32,
}

impl Vec2 {
    pub(crate) fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
    pub(crate) fn len(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
    pub(crate) fn norm(self) -> Self {
        let l = self.len();
        if l <= 1e-6 {
            Self::new(0.0, 0.0)
        } else {
            Self::new(self.x / l, self.y / l)
        }
    }
    pub(crate) fn dist(self, other: Vec2) -> f32 {
        (self - other).len()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}
impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}
impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}
impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Simulation-space extent of the tank. Derived from the terminal size,
/// recomputed whenever it changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct TankBounds {
    pub(crate) w: f32,
    pub(crate) h: f32,
}

impl TankBounds {
    pub(crate) fn from_terminal(cols: u16, rows: u16) -> Self {
        let tank_rows = rows.saturating_sub(HUD_ROWS);
        Self {
            w: cols as f32 * CELL_W_PX,
            h: tank_rows as f32 * CELL_H_PX,
        }
    }

    pub(crate) fn water_top(&self) -> f32 {
        0.0
    }

    pub(crate) fn sand_y(&self) -> f32 {
        self.h - SAND_HEIGHT
    }

    pub(crate) fn is_degenerate(&self) -> bool {
        self.w < CELL_W_PX || self.h <= SAND_HEIGHT + 40.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum Species {
    Clownfish,
    Basslet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum Mood {
    Happy,
    Ok,
    Sick,
    Sos,
}

impl Mood {
    /// Top speed while chasing food or the toy, px/s.
    pub(crate) fn chase_speed(self) -> f32 {
        match self {
            Mood::Happy => 180.0,
            Mood::Ok => 150.0,
            Mood::Sick => 90.0,
            Mood::Sos => 60.0,
        }
    }

    /// Top speed while shadowing another fish, px/s.
    pub(crate) fn follow_speed(self) -> f32 {
        match self {
            Mood::Happy => 90.0,
            Mood::Ok => 70.0,
            Mood::Sick => 45.0,
            Mood::Sos => 25.0,
        }
    }

    /// Top speed while roaming, px/s.
    pub(crate) fn idle_speed(self) -> f32 {
        match self {
            Mood::Happy => 70.0,
            Mood::Ok => 50.0,
            Mood::Sick => 30.0,
            Mood::Sos => 15.0,
        }
    }

    /// Breath-bubble rise speed and per-fish population cap.
    pub(crate) fn bubble_params(self) -> (f32, usize) {
        match self {
            Mood::Happy => (45.0, 10),
            Mood::Ok => (35.0, 6),
            Mood::Sick => (20.0, 4),
            Mood::Sos => (10.0, 2),
        }
    }

    /// Idle bob amplitude, px.
    pub(crate) fn bob_amplitude(self) -> f32 {
        match self {
            Mood::Happy => 1.5,
            Mood::Ok => 1.0,
            Mood::Sick => 0.6,
            Mood::Sos => 0.2,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Mood::Happy => "HAPPY",
            Mood::Ok => "OK",
            Mood::Sick => "SICK",
            Mood::Sos => "SOS",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum Activity {
    Idle,
    GoingToSleep,
    Sleeping,
}

/// A desired destination tagged with why the fish is headed there. The tag
/// is matched every frame before use, so a stale target of the wrong kind
/// gets discarded instead of chased.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) enum Target {
    Food(Vec2),
    Toy(Vec2),
    Friend(Vec2),
    Roam(Vec2),
}

impl Target {
    pub(crate) fn pos(&self) -> Vec2 {
        match *self {
            Target::Food(p) | Target::Toy(p) | Target::Friend(p) | Target::Roam(p) => p,
        }
    }

    /// Food and toy pursuit use the fast speed tier and tighter braking.
    pub(crate) fn is_chase(&self) -> bool {
        matches!(self, Target::Food(_) | Target::Toy(_))
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub(crate) struct Stats {
    pub(crate) hunger: f32,
    pub(crate) happiness: f32,
    pub(crate) health: f32,
    pub(crate) cleanliness: f32,
    pub(crate) energy: f32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            hunger: 80.0,
            happiness: 80.0,
            health: 100.0,
            cleanliness: 100.0,
            energy: 80.0,
        }
    }
}

impl Stats {
    /// Mean of all five stats; mood is a pure function of this.
    pub(crate) fn mean(&self) -> f32 {
        (self.hunger + self.happiness + self.health + self.cleanliness + self.energy) / 5.0
    }

    /// Mean of the four need stats (health excluded); drives health drift.
    pub(crate) fn needs_mean(&self) -> f32 {
        (self.hunger + self.happiness + self.energy + self.cleanliness) / 4.0
    }

    pub(crate) fn clamp_all(&mut self) {
        self.hunger = self.hunger.clamp(0.0, 100.0);
        self.happiness = self.happiness.clamp(0.0, 100.0);
        self.health = self.health.clamp(0.0, 100.0);
        self.cleanliness = self.cleanliness.clamp(0.0, 100.0);
        self.energy = self.energy.clamp(0.0, 100.0);
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct Fish {
    pub(crate) id: u32,
    pub(crate) name: String,
    pub(crate) species: Species,
    pub(crate) scale: f32,
    pub(crate) stats: Stats,
    pub(crate) mood: Mood,
    pub(crate) activity: Activity,
    pub(crate) alive: bool,
    pub(crate) sleep_progress: f32,
    pub(crate) pos: Vec2,
    pub(crate) vel: Vec2,
    pub(crate) facing: f32,
    pub(crate) phase: f32,
    pub(crate) rotation: f32,
    pub(crate) target: Option<Target>,
    /// Session-clock timestamps; meaningless across runs, reset on load.
    #[serde(skip, default = "neg_infinity")]
    pub(crate) last_ate: f64,
    #[serde(skip)]
    pub(crate) next_bubble_at: f64,
}

fn neg_infinity() -> f64 {
    f64::NEG_INFINITY
}

impl Fish {
    pub(crate) fn new(
        id: u32,
        name: &str,
        species: Species,
        scale: f32,
        bounds: TankBounds,
        rng: &mut StdRng,
    ) -> Self {
        let x = bounds.w / 2.0 + (id as f32 - 2.0) * 100.0;
        let y = bounds.h / 2.0 + (rng.gen::<f32>() - 0.5) * 50.0;
        Self {
            id,
            name: name.to_string(),
            species,
            scale,
            stats: Stats::default(),
            mood: Mood::Happy,
            activity: Activity::Idle,
            alive: true,
            sleep_progress: 0.0,
            pos: Vec2::new(x, y),
            vel: Vec2::new(0.0, 0.0),
            facing: 1.0,
            phase: rng.gen::<f32>() * std::f32::consts::TAU,
            rotation: 0.0,
            target: None,
            last_ate: f64::NEG_INFINITY,
            next_bubble_at: 0.0,
        }
    }

    pub(crate) fn is_sleepy(&self) -> bool {
        matches!(self.activity, Activity::Sleeping | Activity::GoingToSleep)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum FoodPhase {
    Falling,
    Sinking,
    Settled,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub(crate) struct Food {
    pub(crate) id: u64,
    pub(crate) pos: Vec2,
    pub(crate) vel: Vec2,
    pub(crate) phase: FoodPhase,
    pub(crate) life: f32,
    /// Index into the renderer's pellet palette.
    pub(crate) tint: u8,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub(crate) struct Poop {
    pub(crate) id: u64,
    pub(crate) pos: Vec2,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Bubble {
    pub(crate) pos: Vec2,
    pub(crate) r: f32,
    pub(crate) vy: f32,
    pub(crate) alpha: f32,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Ripple {
    pub(crate) pos: Vec2,
    pub(crate) radius: f32,
    pub(crate) life: f32,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Toy {
    pub(crate) pos: Vec2,
}

/// Scoped record of an in-flight clean: cleanliness is interpolated from
/// the values captured at activation so the ramp has no discontinuity.
#[derive(Clone, Debug)]
pub(crate) struct CleaningCycle {
    pub(crate) started: f64,
    pub(crate) start_cleanliness: Vec<f32>,
}

/// Fire-and-forget audio triggers, keyed by the game event that caused
/// them. The simulation pushes these; the host drains them each frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SoundCue {
    Feed,
    Poke,
    Eat,
    ToySqueak,
    Plop,
    Clean,
    Swish,
}

impl SoundCue {
    pub(crate) fn caption(self) -> &'static str {
        match self {
            SoundCue::Feed => "*plip plip*",
            SoundCue::Poke => "*boop*",
            SoundCue::Eat => "*nom*",
            SoundCue::ToySqueak => "*squeak*",
            SoundCue::Plop => "*plop*",
            SoundCue::Clean => "*scrub scrub*",
            SoundCue::Swish => "*sloosh*",
        }
    }
}

/// The whole simulation. One owner, mutated by the frame driver and the
/// interaction handlers on the same thread; the renderer only reads.
pub(crate) struct Tank {
    pub(crate) fish: Vec<Fish>,
    pub(crate) food: Vec<Food>,
    pub(crate) poops: Vec<Poop>,
    pub(crate) bubbles: Vec<Bubble>,
    pub(crate) background_bubbles: Vec<Bubble>,
    pub(crate) ripples: Vec<Ripple>,
    pub(crate) toy: Option<Toy>,
    pub(crate) dragging_toy: bool,
    pub(crate) toy_expires_at: Option<f64>,
    pub(crate) play_mode: bool,
    pub(crate) cleaning: Option<CleaningCycle>,
    pub(crate) muted: bool,
    pub(crate) last_tap: Option<f64>,
    pub(crate) last_squeak: f64,
    pub(crate) last_tick: f64,
    pub(crate) next_particle_id: u64,
    pub(crate) rng: StdRng,
    pub(crate) cues: Vec<SoundCue>,
}

impl Tank {
    pub(crate) fn new(seed: u64, bounds: TankBounds) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let fish = vec![
            Fish::new(1, "Aqua", Species::Clownfish, 1.0, bounds, &mut rng),
            Fish::new(2, "Bubbles", Species::Clownfish, 0.8, bounds, &mut rng),
            Fish::new(3, "Finley", Species::Basslet, 0.9, bounds, &mut rng),
        ];
        Self {
            fish,
            food: Vec::new(),
            poops: Vec::new(),
            bubbles: Vec::new(),
            background_bubbles: Vec::new(),
            ripples: Vec::new(),
            toy: None,
            dragging_toy: false,
            toy_expires_at: None,
            play_mode: false,
            cleaning: None,
            muted: false,
            last_tap: None,
            last_squeak: f64::NEG_INFINITY,
            last_tick: 0.0,
            next_particle_id: 0,
            rng,
            cues: Vec::new(),
        }
    }

    pub(crate) fn alloc_id(&mut self) -> u64 {
        self.next_particle_id += 1;
        self.next_particle_id
    }

    pub(crate) fn any_alive(&self) -> bool {
        self.fish.iter().any(|f| f.alive)
    }

    pub(crate) fn any_sleepy(&self) -> bool {
        self.fish.iter().any(|f| f.alive && f.is_sleepy())
    }

    pub(crate) fn primary(&self) -> Option<&Fish> {
        self.fish.first()
    }

    pub(crate) fn cue(&mut self, cue: SoundCue) {
        self.cues.push(cue);
    }

    /// Dirt level the renderer tints the water with, from the primary
    /// fish's cleanliness.
    pub(crate) fn dirtiness(&self) -> f32 {
        let clean = self.primary().map(|f| f.stats.cleanliness).unwrap_or(100.0);
        1.0 - clean / 100.0
    }

    pub(crate) fn cleaning_progress(&self, now: f64) -> Option<f32> {
        self.cleaning
            .as_ref()
            .map(|c| (((now - c.started) / CLEAN_DURATION_SECS) as f32).clamp(0.0, 1.0))
    }
}

/// Full serialized snapshot. Transient particles (bubbles, ripples), the
/// toy and any in-flight cleaning cycle are ephemeral and not persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct SaveFile {
    pub(crate) version: u32,
    pub(crate) last_save: DateTime<Utc>,
    pub(crate) fish: Vec<Fish>,
    pub(crate) food: Vec<Food>,
    pub(crate) poops: Vec<Poop>,
    pub(crate) muted: bool,
}

impl SaveFile {
    pub(crate) fn snapshot(tank: &Tank, now_utc: DateTime<Utc>) -> Self {
        Self {
            version: SAVE_VERSION,
            last_save: now_utc,
            fish: tank.fish.clone(),
            food: tank.food.clone(),
            poops: tank.poops.clone(),
            muted: tank.muted,
        }
    }
}

// --- Tuning constants -------------------------------------------------------
// The health drift thresholds and rates are inherited balance values;
// keep them as-is rather than inferring different intent.

/// Low-frequency tick cadence, seconds.
pub(crate) const TICK_SECS: f64 = 5.0;

/// Per-tick stat decay while awake.
pub(crate) const HUNGER_DECAY_PER_TICK: f32 = 1.5;
pub(crate) const HAPPINESS_DECAY_PER_TICK: f32 = 1.0;
pub(crate) const ENERGY_DECAY_PER_TICK: f32 = 0.8;
/// Per-tick energy regeneration while asleep.
pub(crate) const ENERGY_REGEN_PER_TICK: f32 = 2.0;
/// Cleanliness lost per tick, per outstanding poop.
pub(crate) const CLEANLINESS_DECAY_PER_POOP: f32 = 2.5;

/// Health drifts down when the four-need mean is below this...
pub(crate) const HEALTH_DECAY_THRESHOLD: f32 = 20.0;
/// ...and up when above this.
pub(crate) const HEALTH_REGEN_THRESHOLD: f32 = 80.0;
pub(crate) const HEALTH_DECAY_PER_TICK: f32 = 1.0;
pub(crate) const HEALTH_REGEN_PER_TICK: f32 = 0.5;

/// Happiness granted to each of a pair of nearby live fish, per tick.
pub(crate) const SOCIAL_BONUS: f32 = 0.5;

pub(crate) const POOP_CAP: usize = 3;
pub(crate) const POOP_CHANCE_PER_TICK: f64 = 0.05;
/// A fish this well-fed may eventually produce waste.
pub(crate) const POOP_HUNGER_GATE: f32 = 50.0;

pub(crate) const CLEAN_DURATION_SECS: f64 = 2.5;

/// Offline catch-up rates, per elapsed hour. Distinct from the in-session
/// tick rates above.
pub(crate) const OFFLINE_HUNGER_PER_HOUR: f32 = 3.0;
pub(crate) const OFFLINE_HAPPINESS_PER_HOUR: f32 = 2.0;
pub(crate) const OFFLINE_ENERGY_PER_HOUR: f32 = 2.5;
pub(crate) const OFFLINE_ENERGY_REGEN_PER_HOUR: f32 = 10.0;
pub(crate) const OFFLINE_CLEANLINESS_PER_POOP_HOUR: f32 = 0.5;
pub(crate) const OFFLINE_HEALTH_DECAY_PER_HOUR: f32 = 1.0;
pub(crate) const OFFLINE_HEALTH_REGEN_PER_HOUR: f32 = 0.5;
