use super::*;
use tempfile::tempdir;

#[test]
fn entries_carry_monotonic_sequence_numbers() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("trail.jsonl");
    let trail = AuditTrailRecorder::new(&path).expect("recorder");

    trail.record(Some("jane"), "plan.Submit", "plan-1", serde_json::json!({}));
    trail.record(None, "plan.Approve", "plan-1", serde_json::json!({"ok": true}));

    let content = std::fs::read_to_string(&path).expect("trail file");
    let entries: Vec<TrailEntry> = content
        .lines()
        .map(|line| serde_json::from_str(line).expect("parseable entry"))
        .collect();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].seq, 1);
    assert_eq!(entries[1].seq, 2);
    assert_eq!(entries[0].actor.as_deref(), Some("jane"));
    assert!(entries[1].actor.is_none());
    assert_eq!(entries[1].action, "plan.Approve");
}

#[test]
fn recorder_appends_across_instances() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("trail.jsonl");

    {
        let trail = AuditTrailRecorder::new(&path).expect("recorder");
        trail.record(None, "plan.CreatePlan", "plan-1", serde_json::json!({}));
    }
    {
        let trail = AuditTrailRecorder::new(&path).expect("recorder");
        trail.record(None, "plan.AddTask", "plan-1", serde_json::json!({}));
    }

    let content = std::fs::read_to_string(&path).expect("trail file");
    assert_eq!(content.lines().count(), 2);
}

#[test]
fn creates_missing_parent_directories() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("nested").join("deep").join("trail.jsonl");

    let trail = AuditTrailRecorder::new(&path).expect("recorder");
    trail.record(None, "plan.CreatePlan", "plan-1", serde_json::json!({}));

    assert_eq!(trail.path(), &path);
    assert!(path.exists());
}
