use crate::session::{Command, Seat, Session};
use crate::{Card, Rules};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Envelope for every JSON answer handed to the page
#[derive(Serialize)]
pub struct Reply<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn reply<T: Serialize, E: ToString>(outcome: Result<T, E>) -> String {
    let reply = match outcome {
        Ok(result) => Reply {
            success: true,
            result: Some(result),
            error: None,
        },
        Err(e) => Reply {
            success: false,
            result: None,
            error: Some(e.to_string()),
        },
    };
    serde_json::to_string(&reply)
        .unwrap_or_else(|e| format!(r#"{{"success":false,"error":"Serialization error: {}"}}"#, e))
}

fn codes(cards: Vec<Card>) -> Vec<String> {
    cards.into_iter().map(String::from).collect()
}

/// One advisor session driven from the page with JSON commands
#[wasm_bindgen]
pub struct WasmSession {
    inner: Session,
}

#[wasm_bindgen]
impl WasmSession {
    /// Create a session from a JSON rules object; an empty string uses the defaults
    #[wasm_bindgen(constructor)]
    pub fn new(rules_json: &str) -> Result<WasmSession, JsValue> {
        let rules = if rules_json.trim().is_empty() {
            Rules::default()
        } else {
            serde_json::from_str(rules_json)
                .map_err(|e| JsValue::from_str(&format!("Invalid rules JSON: {}", e)))?
        };
        let inner = Session::new(rules).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(WasmSession { inner })
    }

    /// Apply a command such as `{"type":"rival_draw_hidden","seat":"east"}`.
    ///
    /// Returns the outcome (snapshot plus pending request) or the denial.
    pub fn apply(&mut self, command_json: &str) -> String {
        let command = match serde_json::from_str::<Command>(command_json) {
            Ok(command) => command,
            Err(e) => return reply::<(), _>(Err(format!("Invalid command JSON: {}", e))),
        };
        reply(self.inner.apply(command))
    }

    pub fn snapshot(&self) -> String {
        reply::<_, String>(Ok(self.inner.snapshot()))
    }

    /// Fresh advice for the current hand and table
    pub fn recommend(&self) -> String {
        reply(self.inner.recommend())
    }

    pub fn unseen_candidates(&self) -> String {
        reply::<_, String>(Ok(codes(self.inner.unseen_candidates())))
    }

    /// Candidate discards for a rival seat named like `"north"`
    pub fn rival_discard_candidates(&self, seat: &str) -> String {
        let seat = serde_json::from_value::<Seat>(serde_json::Value::String(seat.to_string()))
            .map_err(|_| format!("Unknown seat: {}", seat));
        reply(seat.map(|seat| codes(self.inner.rival_discard_candidates(seat))))
    }

    /// Cards free for hand slot `slot`, or for any slot when omitted
    pub fn hand_choices(&self, slot: Option<u32>) -> String {
        reply::<_, String>(Ok(codes(
            self.inner.hand_choices(slot.map(|s| s as usize)),
        )))
    }
}

/// Get the git commit hash that this WASM module was built from
///
/// Returns the first 8 characters of the commit hash, or "unknown" if not available
#[wasm_bindgen]
pub fn get_build_commit() -> String {
    env!("BUILD_COMMIT").to_string()
}
