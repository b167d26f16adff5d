//! Probability Quest entry point
//!
//! The browser build is driven from JavaScript through `web.rs`. Natively this
//! runs a headless autopilot session and prints how the observed success rate
//! compares with the odds that were rolled.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use probability_quest::consts::*;
    use probability_quest::prob::format_probability;
    use probability_quest::sim::{Action, GamePhase, Session, TickInput, tick};
    use probability_quest::{Tuning, epoch_ms};

    env_logger::init();
    log::info!("Probability Quest (native) starting...");

    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or_else(epoch_ms);
    let tuning = match args.next().map(std::fs::read_to_string) {
        Some(Ok(json)) => match Tuning::from_json(&json) {
            Ok(tuning) => tuning,
            Err(err) => {
                log::error!("Bad tuning file: {}", err);
                return;
            }
        },
        Some(Err(err)) => {
            log::error!("Could not read tuning file: {}", err);
            return;
        }
        None => Tuning::default(),
    };

    log::info!("Autopilot session with seed: {}", seed);
    let mut session = Session::new(seed, tuning, epoch_ms());
    if let Err(err) = session.dispatch(&Action::StartGame { difficulty: 1 }) {
        log::error!("Could not start: {}", err);
        return;
    }

    let input = TickInput {
        autopilot: true,
        ..Default::default()
    };
    // Ten minutes of simulated play at most
    let max_steps = (600.0 / SIM_DT) as usize;
    for _ in 0..max_steps {
        tick(&mut session, &input, SIM_DT);
        for event in session.drain_events() {
            log::debug!("{:?}", event);
        }

        if session.state().phase == GamePhase::LevelComplete {
            let state = session.state();
            println!("Level {} complete, score {}", state.current_level, state.score);
            if session.dispatch(&Action::NextLevel).is_err() {
                break;
            }
        }
    }

    let state = session.state();
    let analysis = session.analysis();
    let expected = format_probability(analysis.expected_success_rate);
    let observed = format_probability(analysis.success_rate);
    println!();
    println!("Final score:        {}", state.score);
    println!("Treasures found:    {}", state.total_treasures_collected);
    println!("Map size:           {}x{}", state.map_size, state.map_size);
    println!("Events recorded:    {}", analysis.total_events);
    println!(
        "Expected success:   {} ({})",
        expected.percentage, expected.fraction
    );
    println!(
        "Observed success:   {} ({})",
        observed.percentage, observed.fraction
    );
    println!("Deviation:          {:.3}", analysis.deviation);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is web::start, this is just to satisfy the compiler
}
