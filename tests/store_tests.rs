mod common;

use common::{at_bat, event, pitch, start_payload};
use cupball::{AppendError, AtBatOutcome, GameLogReader, GameLogWriter, LockMode, PitchResult};
use std::io::Write;
use tempfile::tempdir;

#[test]
fn test_append_assigns_sequence_numbers() {
    let dir = tempdir().unwrap();
    let mut writer = GameLogWriter::open(dir.path()).unwrap();

    let r1 = writer.append(&event("evt-1", 0, start_payload())).unwrap();
    let r2 = writer
        .append(&pitch("evt-2", 0, PitchResult::Ball))
        .unwrap();
    assert_eq!(r1.seq, 1);
    assert_eq!(r2.seq, 2);

    let events: Vec<_> = writer
        .reader()
        .read_full()
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].0.seq, 1);
    assert_eq!(events[0].0.kind(), "game_start");
    assert_eq!(events[1].0.seq, 2);
    assert_eq!(events[1].0.kind(), "pitch");
}

#[test]
fn test_append_rejects_gapped_sequence() {
    let dir = tempdir().unwrap();
    let mut writer = GameLogWriter::open(dir.path()).unwrap();
    writer.append(&event("evt-1", 0, start_payload())).unwrap();

    let err = writer
        .append(&pitch("evt-2", 5, PitchResult::Ball))
        .unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
}

#[test]
fn test_append_rejects_foreign_game() {
    let dir = tempdir().unwrap();
    let mut writer = GameLogWriter::open(dir.path()).unwrap();
    writer.append(&event("evt-1", 0, start_payload())).unwrap();

    let stray = cupball::GameEvent::new(
        "evt-2",
        "another-game",
        cupball::EventPayload::Pitch {
            result: PitchResult::Ball,
        },
        "ump-1",
    );
    let err = writer.append(&stray).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
}

#[test]
fn test_head_recovered_after_reopen() {
    let dir = tempdir().unwrap();
    let receipt = {
        let mut writer = GameLogWriter::open(dir.path()).unwrap();
        writer.append(&event("evt-1", 0, start_payload())).unwrap();
        writer
            .append(&pitch("evt-2", 0, PitchResult::Ball))
            .unwrap()
    };

    let writer = GameLogWriter::open(dir.path()).unwrap();
    let (seq, hash) = writer.head();
    assert_eq!(seq, 2);
    assert_eq!(hash, receipt.line_hash);
}

#[test]
fn test_append_if_chains() {
    let dir = tempdir().unwrap();
    let mut writer = GameLogWriter::open(dir.path()).unwrap();

    let r1 = writer
        .append_if(&event("evt-1", 0, start_payload()), 0, "")
        .unwrap();
    let r2 = writer
        .append_if(&pitch("evt-2", 0, PitchResult::Ball), r1.seq, &r1.line_hash)
        .unwrap();
    assert_eq!(r2.seq, 2);
}

#[test]
fn test_append_if_sequence_conflict() {
    let dir = tempdir().unwrap();
    let mut writer = GameLogWriter::open(dir.path()).unwrap();
    writer.append(&event("evt-1", 0, start_payload())).unwrap();

    let err = writer
        .append_if(&pitch("evt-2", 0, PitchResult::Ball), 0, "")
        .unwrap_err();
    match err {
        AppendError::SequenceConflict { expected, actual } => {
            assert_eq!(expected, 0);
            assert_eq!(actual, 1);
        }
        other => panic!("expected SequenceConflict, got {other:?}"),
    }
}

#[test]
fn test_append_if_hash_mismatch() {
    let dir = tempdir().unwrap();
    let mut writer = GameLogWriter::open(dir.path()).unwrap();
    let r1 = writer.append(&event("evt-1", 0, start_payload())).unwrap();

    let err = writer
        .append_if(&pitch("evt-2", 0, PitchResult::Ball), r1.seq, "bogus")
        .unwrap_err();
    assert!(matches!(err, AppendError::HashMismatch { seq: 1 }));
}

#[test]
fn test_writer_lock_is_exclusive() {
    let dir = tempdir().unwrap();
    let _writer = GameLogWriter::open(dir.path()).unwrap();

    let result = GameLogWriter::open(dir.path());
    assert!(result.is_err(), "second writer should fail to open");
    let err = result.err().unwrap();
    assert_eq!(err.kind(), std::io::ErrorKind::AlreadyExists);
    let msg = err.to_string();
    assert!(
        msg.contains("another writer holds the lock"),
        "error should mention the lock: {msg}"
    );
    assert!(
        msg.contains("game.jsonl"),
        "error should mention the file path: {msg}"
    );
}

#[test]
fn test_lock_released_on_drop() {
    let dir = tempdir().unwrap();
    {
        let _writer = GameLogWriter::open(dir.path()).unwrap();
    }
    let _writer2 = GameLogWriter::open(dir.path()).unwrap();
}

#[test]
fn test_lock_mode_none_allows_multiple() {
    let dir = tempdir().unwrap();
    let _writer1 = GameLogWriter::open_with_lock(dir.path(), LockMode::None).unwrap();
    let _writer2 = GameLogWriter::open_with_lock(dir.path(), LockMode::None).unwrap();
}

#[test]
fn test_read_from_filters_by_seq() {
    let dir = tempdir().unwrap();
    let mut writer = GameLogWriter::open(dir.path()).unwrap();
    writer.append(&event("evt-1", 0, start_payload())).unwrap();
    writer
        .append(&pitch("evt-2", 0, PitchResult::Ball))
        .unwrap();
    writer
        .append(&at_bat("evt-3", 0, AtBatOutcome::Single))
        .unwrap();

    let events: Vec<_> = writer
        .reader()
        .read_from(3)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0.id, "evt-3");
}

#[test]
fn test_partial_trailing_line_skipped() {
    let dir = tempdir().unwrap();
    let mut writer = GameLogWriter::open(dir.path()).unwrap();
    writer.append(&event("evt-1", 0, start_payload())).unwrap();
    writer
        .append(&pitch("evt-2", 0, PitchResult::Ball))
        .unwrap();
    drop(writer);

    // Simulate a torn write: append half a JSON line with no newline.
    let log_path = dir.path().join("game.jsonl");
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(&log_path)
        .unwrap();
    file.write_all(b"{\"id\":\"evt-3\",\"game_id\":\"ga").unwrap();
    drop(file);

    let reader = GameLogReader::open(dir.path());
    let events: Vec<_> = reader
        .read_full()
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(events.len(), 2, "torn line must be skipped");
}

#[test]
fn test_corrupt_line_is_invalid_data() {
    let dir = tempdir().unwrap();
    let mut writer = GameLogWriter::open(dir.path()).unwrap();
    writer.append(&event("evt-1", 0, start_payload())).unwrap();
    drop(writer);

    let log_path = dir.path().join("game.jsonl");
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(&log_path)
        .unwrap();
    file.write_all(b"not json at all\n").unwrap();
    drop(file);

    let reader = GameLogReader::open(dir.path());
    let results: Vec<_> = reader.read_full().unwrap().collect();
    assert!(results[0].is_ok());
    let err = results[1].as_ref().unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}

#[test]
fn test_archive_preserves_events_and_sequence() {
    let dir = tempdir().unwrap();
    let mut writer = GameLogWriter::open(dir.path()).unwrap();
    writer.append(&event("evt-1", 0, start_payload())).unwrap();
    writer
        .append(&pitch("evt-2", 0, PitchResult::Ball))
        .unwrap();

    writer.archive().unwrap();
    assert!(dir.path().join("history.jsonl.zst").exists());

    // The active log is empty but the head carries on.
    let r3 = writer
        .append(&at_bat("evt-3", 0, AtBatOutcome::Single))
        .unwrap();
    assert_eq!(r3.seq, 3);

    let events: Vec<_> = writer
        .reader()
        .read_full()
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    let ids: Vec<&str> = events.iter().map(|(ev, _)| ev.id.as_str()).collect();
    assert_eq!(ids, vec!["evt-1", "evt-2", "evt-3"]);
}

#[test]
fn test_archive_twice_appends_frames() {
    let dir = tempdir().unwrap();
    let mut writer = GameLogWriter::open(dir.path()).unwrap();
    writer.append(&event("evt-1", 0, start_payload())).unwrap();
    writer.archive().unwrap();
    writer
        .append(&pitch("evt-2", 0, PitchResult::Ball))
        .unwrap();
    writer.archive().unwrap();

    let events: Vec<_> = writer
        .reader()
        .read_full()
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].0.seq, 1);
    assert_eq!(events[1].0.seq, 2);
}

#[test]
fn test_reader_head() {
    let dir = tempdir().unwrap();
    let reader = GameLogReader::open(dir.path());
    assert!(reader.head().unwrap().is_none());

    let mut writer = GameLogWriter::open(dir.path()).unwrap();
    let receipt = writer.append(&event("evt-1", 0, start_payload())).unwrap();

    let (seq, hash) = writer.reader().head().unwrap().unwrap();
    assert_eq!(seq, 1);
    assert_eq!(hash, receipt.line_hash);
}
