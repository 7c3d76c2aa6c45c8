mod common;

use common::{event, start_payload};
use cupball::{
    AtBatOutcome, EventPayload, FlipCupResult, GameEvent, PitchResult, ScoringMethod,
};
use serde_json::{json, Value};

#[test]
fn test_round_trip() {
    let ev = event("evt-1", 1, start_payload());
    let json = serde_json::to_string(&ev).unwrap();
    let back: GameEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(ev, back);
}

#[test]
fn test_type_tag_is_inline() {
    let ev = event(
        "evt-1",
        1,
        EventPayload::Pitch {
            result: PitchResult::FirstCup,
        },
    );
    let value: Value = serde_json::to_value(&ev).unwrap();
    assert_eq!(value["type"], "pitch");
    assert_eq!(value["result"], "first_cup");
    assert_eq!(value["seq"], 1);
    assert_eq!(value["game_id"], "game-1");
    assert_eq!(value["umpire_id"], "ump-1");
}

#[test]
fn test_pitch_result_vocabulary() {
    let pairs = [
        (PitchResult::Ball, "ball"),
        (PitchResult::StrikeSwinging, "strike_swinging"),
        (PitchResult::StrikeLooking, "strike_looking"),
        (PitchResult::FirstCup, "first_cup"),
        (PitchResult::SecondCup, "second_cup"),
        (PitchResult::ThirdCup, "third_cup"),
        (PitchResult::HomeRunCup, "home_run_cup"),
    ];
    for (result, wire) in pairs {
        assert_eq!(serde_json::to_value(result).unwrap(), json!(wire));
    }
}

#[test]
fn test_outcome_and_method_vocabulary() {
    assert_eq!(
        serde_json::to_value(AtBatOutcome::HomeRun).unwrap(),
        json!("home_run")
    );
    assert_eq!(
        serde_json::to_value(FlipCupResult::Offense).unwrap(),
        json!("offense")
    );
    assert_eq!(
        serde_json::to_value(ScoringMethod::QuickResult).unwrap(),
        json!("quick_result")
    );
}

#[test]
fn test_cup_bases_mapping() {
    assert_eq!(PitchResult::FirstCup.cup_bases(), Some(1));
    assert_eq!(PitchResult::SecondCup.cup_bases(), Some(2));
    assert_eq!(PitchResult::ThirdCup.cup_bases(), Some(3));
    assert_eq!(PitchResult::HomeRunCup.cup_bases(), Some(4));
    assert_eq!(PitchResult::Ball.cup_bases(), None);
    assert_eq!(PitchResult::StrikeLooking.cup_bases(), None);
}

#[test]
fn test_flip_cup_optional_fields_omitted() {
    let ev = event(
        "evt-1",
        1,
        EventPayload::FlipCup {
            result: FlipCupResult::Defense,
            errors: Vec::new(),
            batter: None,
        },
    );
    let value: Value = serde_json::to_value(&ev).unwrap();
    assert_eq!(value["type"], "flip_cup");
    assert_eq!(value["result"], "defense");
    assert!(value.get("errors").is_none());
    assert!(value.get("batter").is_none());
}

#[test]
fn test_flip_cup_deserializes_without_optional_fields() {
    let line = json!({
        "id": "evt-9",
        "game_id": "game-1",
        "seq": 9,
        "type": "flip_cup",
        "result": "offense",
        "umpire_id": "ump-1",
        "ts": 1234,
    });
    let ev: GameEvent = serde_json::from_value(line).unwrap();
    match ev.payload {
        EventPayload::FlipCup {
            result,
            errors,
            batter,
        } => {
            assert_eq!(result, FlipCupResult::Offense);
            assert!(errors.is_empty());
            assert!(batter.is_none());
        }
        other => panic!("expected flip_cup, got {other:?}"),
    }
}

#[test]
fn test_edit_nests_replacement_payload() {
    let ev = event(
        "evt-2",
        2,
        EventPayload::Edit {
            target_event_id: "evt-1".into(),
            payload: Box::new(EventPayload::Pitch {
                result: PitchResult::Ball,
            }),
        },
    );
    let value: Value = serde_json::to_value(&ev).unwrap();
    assert_eq!(value["type"], "edit");
    assert_eq!(value["target_event_id"], "evt-1");
    assert_eq!(value["payload"]["type"], "pitch");
    assert_eq!(value["payload"]["result"], "ball");

    let back: GameEvent = serde_json::from_value(value).unwrap();
    assert_eq!(ev, back);
}

#[test]
fn test_kind_names() {
    let kinds = [
        (start_payload(), "game_start"),
        (
            EventPayload::Pitch {
                result: PitchResult::Ball,
            },
            "pitch",
        ),
        (
            EventPayload::AtBat {
                outcome: AtBatOutcome::Walk,
            },
            "at_bat",
        ),
        (
            EventPayload::Undo {
                target_event_id: "x".into(),
            },
            "undo",
        ),
        (
            EventPayload::Takeover {
                umpire: "u".into(),
            },
            "takeover",
        ),
        (
            EventPayload::InningEnd {
                home_score: None,
                away_score: None,
                notes: None,
            },
            "inning_end",
        ),
        (
            EventPayload::GameEnd {
                home_score: 1,
                away_score: 0,
                scoring_method: ScoringMethod::Live,
            },
            "game_end",
        ),
    ];
    for (payload, kind) in kinds {
        assert_eq!(payload.kind(), kind);
    }
}

#[test]
fn test_new_event_defaults() {
    let ev = GameEvent::new(
        "evt-1",
        "game-9",
        EventPayload::Pitch {
            result: PitchResult::Ball,
        },
        "ump-3",
    );
    assert_eq!(ev.seq, 0);
    assert!(ev.ts > 0);
    assert_eq!(ev.game_id, "game-9");
    assert_eq!(ev.umpire_id, "ump-3");
}
