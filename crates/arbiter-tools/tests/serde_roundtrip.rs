#![cfg(feature = "serde")]

use arbiter_tools::{TraceEvent, TraceKind, TraceLog};

#[test]
fn trace_log_json_roundtrip() {
    let log = TraceLog {
        events: vec![
            TraceEvent::new(1, TraceKind::NodeStarted, "attack").with_detail("fight"),
            TraceEvent::new(2, TraceKind::MemoryExpired, "threat"),
            TraceEvent::new(3, TraceKind::ActivityChanged, "idle").with_detail("fight"),
        ],
    };

    let json = serde_json::to_string(&log).expect("serialize");
    assert!(json.contains("\"memory_expired\""));
    let roundtrip: TraceLog = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(roundtrip, log);
}
