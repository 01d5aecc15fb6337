use crate::config::{load_settings, project_paths, save_settings_atomic, Settings};
use crate::input::{collect_input_nonblocking, Intent};
use crate::model::{SaveFile, SoundCue, Tank, TankBounds};
use crate::render::{draw_scene, Terminal};
use crate::storage::{load_save, save_atomic};
use std::time::{Duration, Instant};

/// How long a sound caption lingers on the HUD.
const CAPTION_TTL_SECS: f64 = 1.2;

pub(crate) struct App {
    settings: Settings,
    tank: Tank,
    bounds: TankBounds,
    paths: crate::config::Paths,
    term: Terminal,
    epoch: Instant,
    should_quit: bool,
    caption: Option<(SoundCue, f64)>,
}

impl App {
    fn init() -> anyhow::Result<Self> {
        let paths = project_paths()?;
        let mut settings = load_settings(&paths.settings_path);
        if settings.seed == 0 {
            settings.seed = 0xC0FFEE_u64;
        }

        let term = Terminal::begin()?;
        let bounds = TankBounds::from_terminal(term.cols, term.rows);

        let tank = match load_save(&paths.save_path) {
            Some(save) => Tank::restore(save, settings.seed, bounds, chrono::Utc::now()),
            None => Tank::new(settings.seed, bounds),
        };

        Ok(Self {
            settings,
            tank,
            bounds,
            paths,
            term,
            epoch: Instant::now(),
            should_quit: false,
            caption: None,
        })
    }

    fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let fps = self.settings.fps_cap.clamp(10, 120);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);
        let mut last_frame = self.now();

        while !self.should_quit {
            if self.term.resize_if_needed()? {
                self.on_resize();
            }

            let now = self.now();
            for intent in collect_input_nonblocking(frame_dt)? {
                match intent {
                    Intent::Quit => {
                        self.should_quit = true;
                        break;
                    }
                    Intent::PointerDown(p) => self.tank.pointer_down(now, p, self.bounds),
                    Intent::PointerMove(p) => self.tank.pointer_move(p),
                    Intent::PointerUp => self.tank.pointer_up(now),
                    Intent::TogglePlay => self.tank.toggle_play(),
                    Intent::Clean => self.tank.start_clean(now),
                    Intent::Lights => self.tank.toggle_lights(self.bounds),
                    Intent::ToggleMute => self.tank.toggle_mute(),
                    Intent::Resize(cols, rows) => {
                        self.term.resize_to(cols, rows);
                        self.on_resize();
                    }
                    Intent::Redraw => {
                        // wipe the diff baseline so the next present repaints
                        self.term.prev = crate::render::CellBuffer::new(
                            self.term.cols,
                            self.term.rows,
                        );
                    }
                }
            }

            let now = self.now();
            let dt = (now - last_frame) as f32;
            last_frame = now;
            let ticked = self.tank.update(now, dt, self.bounds);

            for cue in std::mem::take(&mut self.tank.cues) {
                self.caption = Some((cue, now + CAPTION_TTL_SECS));
            }
            if matches!(self.caption, Some((_, until)) if now > until) {
                self.caption = None;
            }

            if ticked {
                // best-effort autosave; a full disk should not kill the tank
                self.save_now().ok();
            }

            let caption = self.caption.map(|(c, _)| c.caption());
            draw_scene(
                &mut self.term.cur,
                &self.tank,
                self.bounds,
                now,
                &self.settings,
                caption,
            );
            self.term.present(true)?;

            spin_sleep(frame_dt, Instant::now());
        }

        self.save_now()?;
        self.term.end()?;
        save_settings_atomic(&self.paths.settings_path, &self.settings)?;
        Ok(())
    }

    /// Recompute the simulation extent and slosh the water.
    fn on_resize(&mut self) {
        let next = TankBounds::from_terminal(self.term.cols, self.term.rows);
        if next != self.bounds {
            self.bounds = next;
            if !self.bounds.is_degenerate() {
                self.tank.shake(self.bounds);
            }
        }
    }

    fn save_now(&self) -> anyhow::Result<()> {
        let save = SaveFile::snapshot(&self.tank, chrono::Utc::now());
        save_atomic(&self.paths.save_path, &save)
    }
}

pub(crate) fn run() -> anyhow::Result<()> {
    let mut app = App::init()?;
    let result = app.run();
    if result.is_err() {
        // raw mode must come down even on a failed frame
        app.term.end().ok();
    }
    result
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
