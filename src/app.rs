use crate::config::{load_settings, save_settings_atomic, Paths, Settings};
use crate::game::{GameScene, SceneCommand, SessionSummary};
use crate::input::{collect_input_nonblocking, map_event_to_action, Action};
use crate::model::Rules;
use crate::render::{draw_game, draw_home, FieldView, Style, Terminal};
use anyhow::Context;
use crossterm::style::Color;
use std::time::{Duration, Instant};
use tracing::info;

/// Simulation step in milliseconds.
const SIM_STEP_MS: u64 = 20;

pub(crate) enum Screen {
    Home,
    Game(Box<GameScene>),
}

/// Command-line overrides applied on top of the saved settings.
#[derive(Clone, Debug, Default)]
pub(crate) struct Overrides {
    pub(crate) seed: Option<u64>,
    pub(crate) fps: Option<u32>,
    pub(crate) no_color: bool,
    pub(crate) ascii: bool,
}

impl Overrides {
    fn apply(&self, mut s: Settings) -> Settings {
        if let Some(seed) = self.seed {
            s.seed = seed;
        }
        if let Some(fps) = self.fps {
            s.fps_cap = fps;
        }
        if self.no_color {
            s.enable_color = false;
        }
        if self.ascii {
            s.emoji = false;
        }
        s
    }
}

pub(crate) struct App {
    settings: Settings,
    rules: Rules,
    paths: Paths,
    term: Terminal,
    screen: Screen,
    last_summary: Option<SessionSummary>,
    seed: u64,
    games: u64,
    clock: Instant,
    should_quit: bool,
}

impl App {
    fn init(paths: Paths, overrides: &Overrides) -> anyhow::Result<Self> {
        let settings = overrides.apply(load_settings(&paths.settings_path));
        let seed = settings.session_seed();
        info!(seed, fps = settings.fps_cap, emoji = settings.emoji, "starting");

        let term = Terminal::begin().context("could not set up the terminal")?;

        Ok(Self {
            settings,
            rules: Rules::default(),
            paths,
            term,
            screen: Screen::Home,
            last_summary: None,
            seed,
            games: 0,
            clock: Instant::now(),
            should_quit: false,
        })
    }

    fn style(&self) -> Style {
        Style {
            color: self.settings.enable_color,
            emoji: self.settings.emoji,
        }
    }

    fn view(&self) -> FieldView {
        FieldView::fit(self.term.cols, self.term.rows)
    }

    fn start_game(&mut self) {
        let seed = self.seed.wrapping_add(self.games);
        self.games += 1;
        self.screen = Screen::Game(Box::new(GameScene::new(self.rules.clone(), seed)));
    }

    fn go_home(&mut self) {
        if let Screen::Game(scene) = &self.screen {
            self.last_summary = Some(scene.summary().clone());
        }
        self.screen = Screen::Home;
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::Back => {
                if matches!(self.screen, Screen::Home) {
                    self.should_quit = true;
                } else {
                    self.go_home();
                }
            }
            Action::Start => {
                if matches!(self.screen, Screen::Home) {
                    self.start_game();
                }
            }
            _ => {
                if let Screen::Game(scene) = &mut self.screen {
                    play(scene, action);
                }
            }
        }
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let fps = self.settings.fps_cap.clamp(10, 240);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);
        let sim_step = Duration::from_millis(SIM_STEP_MS);

        let mut last_frame = Instant::now();
        let mut sim_accum = Duration::ZERO;

        while !self.should_quit {
            self.term.resize_if_needed()?;

            // input
            let view = self.view();
            for ev in collect_input_nonblocking(frame_dt)? {
                if let Some(action) = map_event_to_action(&self.screen, &view, ev) {
                    self.apply(action);
                }
                if self.should_quit {
                    break;
                }
            }

            // sim fixed-step
            let now = Instant::now();
            let real_dt = now.saturating_duration_since(last_frame);
            last_frame = now;
            sim_accum = sim_accum.saturating_add(real_dt);

            while sim_accum >= sim_step {
                sim_accum = sim_accum.saturating_sub(sim_step);
                let Screen::Game(scene) = &mut self.screen else {
                    continue;
                };
                if scene.update(SIM_STEP_MS) == SceneCommand::Home {
                    self.go_home();
                }
            }

            self.render_frame()?;

            // frame cap
            spin_sleep(frame_dt, Instant::now());
        }
        Ok(())
    }

    fn render_frame(&mut self) -> anyhow::Result<()> {
        let view = self.view();
        let style = self.style();
        let now_ms = self.clock.elapsed().as_millis() as u64;

        self.term.cur.clear(Color::Black);
        match &self.screen {
            Screen::Home => draw_home(
                &mut self.term.cur,
                &view,
                style,
                now_ms,
                self.last_summary.as_ref(),
            ),
            Screen::Game(scene) => draw_game(&mut self.term.cur, &view, scene, style, now_ms),
        }
        self.term.present(true)
    }
}

fn play(scene: &mut GameScene, action: Action) {
    match action {
        Action::Slot(i) => {
            scene.click_slot(i);
        }
        Action::PlaceInFront => {
            scene.place_in_front();
        }
        Action::PointerDown(p) => scene.pointer_down(p),
        Action::PointerDrag(p) => scene.pointer_drag(p),
        Action::PointerUp => scene.pointer_up(),
        Action::Quit | Action::Back | Action::Start => {}
    }
}

/// Runs the app and always hands the terminal back, even on error.
pub(crate) fn run(paths: Paths, overrides: Overrides) -> anyhow::Result<()> {
    let mut app = App::init(paths, &overrides)?;
    let result = app.run();
    let restored = app.term.end();

    if let Some(s) = &app.last_summary {
        info!(
            feedings = s.feedings,
            sick = s.sick_events,
            lasted_s = s.lasted().num_seconds(),
            "last session"
        );
    }
    result?;
    restored?;

    // leave an editable settings file behind on first run
    if !app.paths.settings_path.exists() {
        save_settings_atomic(&app.paths.settings_path, &Settings::default())?;
    }
    Ok(())
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
