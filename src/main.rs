/// Entry point and game loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use domain::animal::Catalog;
use sim::event::HostEvent;
use sim::host::dispatch;
use sim::ledger::{progress_path, FileStore, UnlockLedger};
use sim::round::{RoundController, RoundPhase};
use sim::world::{Screen, WorldState};
use ui::gamepad::GamepadState;
use ui::input::{FocusChange, InputState};
use ui::renderer::Renderer;
use ui::scene::TerminalHost;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

const LOG_FILE: &str = "hidden-animals.log";
const LOG_ENV: &str = "HIDDEN_ANIMALS_LOG";

/// Animal cards per row on the title grid.
const GRID_COLS: usize = 3;

fn main() {
    init_logging();

    let config = GameConfig::load();
    let catalog = Catalog::builtin();
    let ledger = open_ledger(&config, &catalog);
    let mut round = RoundController::new(
        catalog,
        ledger,
        config.scoring.clone(),
        config.feedback.clone(),
    );
    let mut world = WorldState::new(&config.feedback);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut round, &mut world, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Hidden Animals!");
    for animal in round.catalog().iter() {
        let count = round.ledger().count_for(animal.id);
        if count > 0 {
            println!("  {} {:<8} found {}×", animal.glyph, animal.name, count);
        }
    }
    info!("session ended");
}

/// Logs go to a file: the terminal belongs to the game.
fn init_logging() {
    let path = std::env::var_os(LOG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(LOG_FILE));
    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Logging disabled ({}): {e}", path.display());
            return;
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

/// File-backed ledger, or a session-only one if the file can't be read.
fn open_ledger(config: &GameConfig, catalog: &Catalog) -> UnlockLedger {
    let path = progress_path(config.save_dir.as_deref());
    match FileStore::open(path.clone()) {
        Ok(store) => {
            info!(path = %path.display(), "progress loaded");
            UnlockLedger::load(Box::new(store), catalog)
        }
        Err(e) => {
            warn!(error = %e, "progress unavailable; finds this session will not be saved");
            UnlockLedger::in_memory(catalog)
        }
    }
}

fn game_loop(
    round: &mut RoundController,
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);
    let sample_every = Duration::from_millis(config.feedback.sample_interval_ms);
    let mut last_tick = Instant::now();
    let mut pending: Vec<HostEvent> = Vec::new();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }

        // Losing focus is the terminal's "page hidden"
        if kb.focus == Some(FocusChange::Lost) {
            pause_if_playing(round, world, &mut pending);
        }

        if handle_input(round, world, &kb, &gp, &mut pending) {
            break;
        }

        let elapsed = last_tick.elapsed();
        if elapsed >= tick_rate {
            last_tick = Instant::now();
            world.tick();

            let playing = world.screen == Screen::Field && round.phase() == RoundPhase::Playing;
            if playing {
                steer_pointer(world, &kb, &gp, config.speed.cursor_move_rate);
            }
            pending.push(HostEvent::Advance(elapsed));
            if playing && world.sample_due(elapsed, sample_every) {
                pending.push(HostEvent::Sample { distance: world.distance_to_target() });
            }
        }

        for event in pending.drain(..) {
            let out = round.handle(event);
            if out.is_empty() { continue; }
            let mut host = TerminalHost {
                world: &mut *world,
                catalog: round.catalog(),
                sound,
                pad: &mut gp,
            };
            dispatch(&mut host, &out);
        }

        renderer.render(world, round)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];

fn steer_pointer(world: &mut WorldState, kb: &InputState, gp: &GamepadState, move_rate: u32) {
    let dx = if kb.any_held(KEYS_LEFT) || gp.left_held() {
        -1
    } else if kb.any_held(KEYS_RIGHT) || gp.right_held() {
        1
    } else {
        0
    };
    let dy = if kb.any_held(KEYS_UP) || gp.up_held() {
        -1
    } else if kb.any_held(KEYS_DOWN) || gp.down_held() {
        1
    } else {
        0
    };
    if dx == 0 && dy == 0 {
        world.release_pointer();
    } else {
        world.move_pointer(dx, dy, move_rate);
    }
}

fn pause_if_playing(round: &RoundController, world: &mut WorldState, pending: &mut Vec<HostEvent>) {
    if world.screen == Screen::Field && round.phase() == RoundPhase::Playing {
        pending.push(HostEvent::Pause);
        world.screen = Screen::Paused;
    }
}

/// Per-screen input. Returns true to quit.
fn handle_input(
    round: &RoundController,
    world: &mut WorldState,
    kb: &InputState,
    gp: &GamepadState,
    pending: &mut Vec<HostEvent>,
) -> bool {
    let confirm = kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed();
    let esc = kb.any_pressed(&[KeyCode::Esc]) || gp.cancel_pressed();
    let quit = kb.any_pressed(KEYS_QUIT);

    match world.screen {
        // ── Animal grid ──
        Screen::Title => {
            if quit || esc {
                return true;
            }
            let total = round.catalog().len();
            if total == 0 {
                return false;
            }
            let cur = world.select_cursor;
            if kb.any_pressed(KEYS_LEFT) || gp.left_pressed() {
                world.select_cursor = cur.saturating_sub(1);
            } else if kb.any_pressed(KEYS_RIGHT) || gp.right_pressed() {
                world.select_cursor = (cur + 1).min(total - 1);
            } else if kb.any_pressed(KEYS_UP) || gp.up_pressed() {
                world.select_cursor = cur.saturating_sub(GRID_COLS);
            } else if kb.any_pressed(KEYS_DOWN) || gp.down_pressed() {
                world.select_cursor = (cur + GRID_COLS).min(total - 1);
            } else if confirm {
                start_selected(round, world, pending);
            }
        }

        // ── Round in progress ──
        Screen::Field => {
            if quit {
                return true;
            }
            if round.phase() != RoundPhase::Playing {
                // Won, waiting for the summary
                return false;
            }
            if esc || gp.pause_pressed() {
                pause_if_playing(round, world, pending);
            } else if kb.any_pressed(KEYS_CONFIRM) || gp.point_pressed() {
                if let Some(event) = world.pointer_event() {
                    pending.push(event);
                }
            }
        }

        // ── Pause overlay ──
        Screen::Paused => {
            if quit {
                return true;
            }
            if confirm || gp.pause_pressed() {
                pending.push(HostEvent::Resume);
                world.screen = Screen::Field;
            } else if esc {
                world.return_to_title();
            }
        }

        // ── Win screen ──
        Screen::Summary => {
            if quit {
                return true;
            }
            if confirm {
                if let Some(s) = &world.summary {
                    pending.push(HostEvent::Start { animal_id: s.animal_id.to_string() });
                }
            } else if esc {
                world.return_to_title();
            }
        }
    }

    false
}

/// Start the highlighted animal, or explain why it is locked.
fn start_selected(round: &RoundController, world: &mut WorldState, pending: &mut Vec<HostEvent>) {
    let index = world.select_cursor;
    let Some(animal) = round.catalog().get(index) else { return; };

    if round.is_unlocked(index) {
        pending.push(HostEvent::Start { animal_id: animal.id.to_string() });
        return;
    }

    let hint = match (
        round.ledger().finds_remaining(round.catalog(), index),
        index.checked_sub(1).and_then(|p| round.catalog().get(p)),
    ) {
        (Some(n), Some(prev)) => format!("Locked: find the {} {} more time(s)", prev.name, n),
        _ => "Locked".to_string(),
    };
    world.set_message(&hint, 60);
}
