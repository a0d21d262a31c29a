// What you SEE:
// • A black 28x28 pad blown up to fill the window, with a ring under the mouse.
// • Hold Left Mouse to draw with the brush, Right Mouse with its inverse.
// • The strip below shows one bar per digit; the best guess is highlighted.
// • Ctrl+Z undo, Ctrl+Y redo, C clear, B swap brush, [ ] brush size, ESC quits.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use digit_pad::classifier::{self, Classifier, Mlp, Unavailable};
use digit_pad::config::Config;
use digit_pad::draw::{self, Drawer, Screen, PANEL_HEIGHT};
use digit_pad::error::Error;
use digit_pad::session::EditSession;
use digit_pad::types::{invert, ALT_BRUSH, MAIN_BRUSH};
use env_logger::Env;
use log::{debug, info, warn};
use minifb::Key;

const DEFAULT_CONFIG: &str = "digit-pad.toml";

/// Whatever answers classification requests for this run.
enum Backend {
    Model(Mlp),
    Missing(Unavailable),
}

impl Classifier for Backend {
    fn classify(&mut self, input: &[f64], width: usize, height: usize) -> Option<Vec<f64>> {
        match self {
            Backend::Model(mlp) => mlp.classify(input, width, height),
            Backend::Missing(none) => none.classify(input, width, height),
        }
    }
}

/// Latest classifier answer; `None` shows an empty strip.
struct Scores {
    values: Option<Vec<f64>>,
    winner: Option<usize>,
}

impl Scores {
    fn refresh(&mut self, session: &mut EditSession<Backend>) {
        match session.classify() {
            Ok(values) => {
                self.winner = classifier::best(&values);
                self.values = Some(values);
            }
            Err(e) => {
                warn!("{e}");
                self.values = None;
                self.winner = None;
            }
        }
    }
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    /* --- Settings + classifier --- */
    let config_path = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let config = Config::load(&config_path)?;
    let backend = match &config.model {
        Some(path) => Backend::Model(Mlp::load(path)?),
        None => {
            warn!("no model configured; the score strip stays empty");
            Backend::Missing(Unavailable)
        }
    };

    /* --- Pad + window ---
       Visual: window is the raster at `scale` plus the score strip. */
    let mut session = EditSession::new(config.width, config.height, config.history_capacity, backend);
    session.set_radius(config.brush_radius);

    let canvas_w = config.width * config.scale;
    let canvas_h = config.height * config.scale;
    let mut screen = Screen::new(canvas_w, canvas_h + PANEL_HEIGHT);
    let mut drawer = Drawer::new("Digit Pad", screen.width, screen.height)?;
    info!("pad {}x{} at scale {}, {} undo steps", config.width, config.height, config.scale, config.history_capacity);

    let mut scores = Scores { values: None, winner: None };
    scores.refresh(&mut session);

    let mut was_down = false;
    let mut last_pos: Option<(f32, f32)> = None;

    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        let now = Instant::now();

        /* 1) Keyboard: history and brush settings */
        let ctrl = drawer.ctrl_down();
        if ctrl && drawer.pressed_once(Key::Z) && session.undo() {
            scores.refresh(&mut session);
        }
        if ctrl && drawer.pressed_once(Key::Y) && session.redo() {
            scores.refresh(&mut session);
        }
        if !ctrl && drawer.pressed_once(Key::C) {
            session.reset();
            scores.refresh(&mut session);
        }
        if drawer.pressed_once(Key::B) {
            let next = if session.brush() == MAIN_BRUSH { ALT_BRUSH } else { MAIN_BRUSH };
            session.set_brush(next);
        }
        if drawer.pressed_once(Key::LeftBracket) {
            session.set_radius(config.step_radius(session.radius(), -1));
            debug!("brush radius {}", session.radius());
        }
        if drawer.pressed_once(Key::RightBracket) {
            session.set_radius(config.step_radius(session.radius(), 1));
            debug!("brush radius {}", session.radius());
        }

        /* 2) Pointer: press opens a stroke, drag continues it, release ends it.
           Visual: every dab shows up immediately and the bars follow. */
        let (left, right) = (drawer.left_mouse_down(), drawer.right_mouse_down());
        let down = left || right;
        let pos = drawer.mouse_pos();

        if down && !was_down {
            let color = if left { session.brush() } else { invert(session.brush()) };
            session.begin_stroke(color);
            last_pos = None;
        }
        if down && pos.is_some() && pos != last_pos {
            if let Some((mx, my)) = pos {
                let (x, y) = draw::window_to_raster(mx, my, config.scale);
                session.continue_stroke(x, y, session.radius());
                scores.refresh(&mut session);
            }
            last_pos = pos;
        }
        if !down && was_down {
            session.end_stroke();
        }
        was_down = down;

        /* 3) Compose the frame: raster, brush ring, score strip */
        draw::blit(&mut screen, &draw::upscale(session.current(), config.scale));
        if let Some((mx, my)) = pos {
            let ring = (session.radius() * config.scale as f64).round() as i32;
            draw::draw_ring(&mut screen, mx as i32, my as i32, ring);
        }
        draw::draw_panel(&mut screen, canvas_h, scores.values.as_deref(), scores.winner, session.brush());

        /* 4) Present */
        drawer.present(&screen)?;

        /* 5) FPS to the debug log once per second */
        frames_this_second += 1;
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            debug!("FPS: {:.1}", frames_this_second as f32 / secs);
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    Ok(())
}
