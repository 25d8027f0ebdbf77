#![cfg(target_arch = "wasm32")]

use chinchon_advisor::wasm_api::{WasmSession, get_build_commit};
use serde_json::Value;
use wasm_bindgen_test::*;

fn parse(json: &str) -> Value {
    serde_json::from_str(json).unwrap()
}

#[wasm_bindgen_test]
fn test_round_through_json() {
    let mut session = WasmSession::new(r#"{"players": 2}"#).unwrap();
    for (slot, code) in ["C-4", "C-5", "C-6", "O-10", "E-10", "B-10", "E-2"]
        .iter()
        .enumerate()
    {
        let reply = parse(&session.apply(&format!(
            r#"{{"type":"set_hand_slot","slot":{},"card":"{}"}}"#,
            slot, code
        )));
        assert_eq!(reply["success"], true);
    }
    let reply = parse(&session.apply(r#"{"type":"set_table_card","card":"B-12"}"#));
    assert_eq!(reply["success"], true);

    let reply = parse(&session.apply(r#"{"type":"start_round"}"#));
    assert_eq!(reply["result"]["snapshot"]["phase"], "running");
    assert_eq!(
        reply["result"]["snapshot"]["recommendation"]["advice"]["action"],
        "close_now"
    );

    let reply = parse(&session.apply(r#"{"type":"close"}"#));
    assert_eq!(reply["result"]["snapshot"]["phase"], "finished");
    assert_eq!(reply["result"]["snapshot"]["closure"]["leftovers"][0], "E-2");
}

#[wasm_bindgen_test]
fn test_denials_and_bad_input() {
    let mut session = WasmSession::new("").unwrap();
    let reply = parse(&session.apply(r#"{"type":"start_round"}"#));
    assert_eq!(reply["success"], false);
    assert!(reply["error"].as_str().unwrap().contains("incomplete hand"));

    let reply = parse(&session.apply("not json"));
    assert_eq!(reply["success"], false);

    let reply = parse(&session.rival_discard_candidates("south-east"));
    assert_eq!(reply["success"], false);

    let reply = parse(&session.hand_choices(None));
    assert_eq!(reply["result"].as_array().unwrap().len(), 40);

    assert!(WasmSession::new(r#"{"players": 6}"#).is_err());
    assert!(!get_build_commit().is_empty());
}
