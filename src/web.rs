//! Browser bindings
//!
//! The JavaScript renderer owns the canvas and the key listeners. Each frame it
//! calls `update` with the elapsed time and a key bitmask, reads `snapshot`,
//! and plays effects from `drain_events`. Everything crosses the boundary as
//! JSON strings.

use wasm_bindgen::prelude::*;

use crate::consts::*;
use crate::prob;
use crate::sim::{Action, Session, TickInput, tick};
use crate::tuning::Tuning;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        // Already initialized by an earlier module instance
        return;
    }
    log::info!("Probability Quest starting...");
}

/// A game instance driven by the page's animation loop
#[wasm_bindgen]
pub struct WebGame {
    session: Session,
    accumulator: f32,
    input: TickInput,
}

#[wasm_bindgen]
impl WebGame {
    /// Create a session, optionally overriding the default tuning
    #[wasm_bindgen(constructor)]
    pub fn new(tuning_json: Option<String>) -> Result<WebGame, JsError> {
        let tuning = match tuning_json {
            Some(json) => Tuning::from_json(&json)?,
            None => Tuning::default(),
        };
        let seed = js_sys::Date::now() as u64;
        log::info!("Game initialized with seed: {}", seed);
        Ok(Self {
            session: Session::new(seed, tuning, crate::epoch_ms()),
            accumulator: 0.0,
            input: TickInput::default(),
        })
    }

    /// Run fixed simulation steps covering `dt` seconds of real time
    pub fn update(&mut self, dt: f32, keys: u32) {
        let pressed = TickInput::from_bits(keys);
        // Pause is one-shot; keep it latched until a step consumes it
        let pause = self.input.pause || pressed.pause;
        self.input = TickInput { pause, ..pressed };

        self.accumulator += dt.min(MAX_FRAME_DT);
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.session, &self.input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            self.input.pause = false;
        }
    }

    /// Apply a JSON action such as `{"action":"startGame","difficulty":2}`
    ///
    /// Returns false when the action is not allowed in the current phase.
    pub fn dispatch(&mut self, action_json: &str) -> Result<bool, JsError> {
        let action: Action = serde_json::from_str(action_json)?;
        Ok(self.session.dispatch(&action).is_ok())
    }

    /// Current state as JSON
    pub fn snapshot(&self) -> Result<String, JsError> {
        Ok(serde_json::to_string(&self.session.snapshot())?)
    }

    /// Events since the last call, as a JSON array
    pub fn drain_events(&mut self) -> Result<String, JsError> {
        Ok(serde_json::to_string(&self.session.drain_events())?)
    }

    /// Observed vs expected success rate over the session, as JSON
    pub fn analysis(&self) -> Result<String, JsError> {
        Ok(serde_json::to_string(&self.session.analysis())?)
    }
}

/// Fraction / percentage / decimal views of `p`, as JSON
#[wasm_bindgen]
pub fn format_probability(p: f64) -> Result<String, JsError> {
    Ok(serde_json::to_string(&prob::format_probability(p))?)
}
