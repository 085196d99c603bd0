/// Entry point and game loop.

mod config;
mod domain;
mod logging;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use tracing::{error, info, warn};

use config::GameConfig;
use sim::event::GameEvent;
use sim::flow;
use sim::resolve;
use sim::session::{Phase, Session};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_FLIP: &[KeyCode] = &[KeyCode::Char(' '), KeyCode::Enter];
const KEYS_START: &[KeyCode] = &[KeyCode::Enter];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q'), KeyCode::Esc];

fn main() {
    let config = GameConfig::load();

    match logging::init(&config.logging) {
        Ok(true) => info!("memflip starting"),
        Ok(false) => {}
        Err(e) => eprintln!("Log file unavailable: {e}"),
    }
    for w in &config.warnings {
        warn!("{w}");
    }

    let mut session = match Session::new(config.board.deck_spec(), config.timing.clone(), config.board.seed) {
        Ok(s) => s,
        Err(e) => {
            error!("cannot deal a deck: {e}");
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();
    if sound.is_none() {
        warn!("no audio output; playing silently");
    }

    let result = game_loop(&mut session, &mut renderer, sound.as_ref(), &config);
    if let Some(sfx) = &sound {
        sfx.stop_music();
    }

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        error!("game loop aborted: {e}");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing MemFlip!");
    if session.total_attempts > 0 {
        println!("Score: {}", session.score_text);
    }
}

fn game_loop(
    session: &mut Session,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    if gp.connected {
        info!("gamepad connected");
    }
    let tick_rate = Duration::from_millis(config.timing.tick_rate_ms);
    let mut last_tick = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_commands(session, sound, &kb, &gp) {
            break;
        }

        let elapsed = last_tick.elapsed();
        if elapsed >= tick_rate {
            // Whole milliseconds only; the remainder carries into the next tick
            let ms = elapsed.as_millis() as u64;
            last_tick += Duration::from_millis(ms);
            let events = flow::advance(session, ms);
            process_sound_events(sound, &events);
        }

        renderer.render(session)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    info!("quit");
    Ok(())
}

/// Apply this frame's input. Returns true when the player asked to quit.
fn handle_commands(
    session: &mut Session,
    sound: Option<&SoundEngine>,
    kb: &InputState,
    gp: &GamepadState,
) -> bool {
    if kb.any_pressed(KEYS_QUIT) || gp.cancel_pressed() {
        return true;
    }

    let restart = kb.any_pressed(KEYS_RESTART)
        || gp.restart_pressed()
        || (session.phase == Phase::End && (kb.any_pressed(KEYS_START) || gp.confirm_pressed()));
    if restart {
        match flow::restart(session) {
            Ok(events) => process_sound_events(sound, &events),
            Err(e) => error!("restart failed: {e}"),
        }
        return false;
    }

    match session.phase {
        Phase::Start => {
            if kb.any_pressed(KEYS_START) || gp.confirm_pressed() || gp.flip_pressed() {
                let events = flow::start(session);
                process_sound_events(sound, &events);
            }
        }
        Phase::Memorize | Phase::Play => {
            if let Some((d_row, d_col)) = detect_cursor_move(kb, gp) {
                session.move_cursor(d_row, d_col);
            }

            let mut events = vec![];
            if kb.any_pressed(KEYS_FLIP) || gp.flip_pressed() {
                events.extend(resolve::flip_at_cursor(session));
            }
            for &(col, row) in &kb.clicks {
                if let Some((x, y)) = Renderer::hit_test(col, row) {
                    if session.deck.layout().contains(y, x) {
                        session.cursor = (y, x);
                    }
                    events.extend(resolve::request_flip(session, x, y));
                }
            }
            process_sound_events(sound, &events);
        }
        Phase::End => {}
    }
    false
}

fn detect_cursor_move(kb: &InputState, gp: &GamepadState) -> Option<(i32, i32)> {
    if kb.any_pressed(KEYS_UP) {
        Some((-1, 0))
    } else if kb.any_pressed(KEYS_DOWN) {
        Some((1, 0))
    } else if kb.any_pressed(KEYS_LEFT) {
        Some((0, -1))
    } else if kb.any_pressed(KEYS_RIGHT) {
        Some((0, 1))
    } else {
        gp.cursor_step()
    }
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::CardFlipped { .. } => sfx.play_flip(),
            GameEvent::PairMatched { .. } => sfx.play_match(),
            GameEvent::PairHidden { .. } => sfx.play_fail(),
            GameEvent::CountdownTick { remaining } if *remaining > 0 => sfx.play_countdown_blip(*remaining),
            GameEvent::MemorizeStarted => sfx.start_music(),
            GameEvent::PlayStarted => sfx.play_go(),
            GameEvent::GameFinished { .. } => sfx.play_win(),
            GameEvent::CountdownTick { .. }
            | GameEvent::PairMismatched { .. }
            | GameEvent::AllPairsMatched => {}
        }
    }
}
