use super::types::{ExecutionSummary, ListExecutionsQuery};
use chrono::Utc;
use conclave_core::{ExecutionRecord, ExecutionStatus};
use conclave_sandbox::{Language, ResourceLimits, SandboxOutput};
use uuid::Uuid;

fn record(status: ExecutionStatus, result: Option<SandboxOutput>) -> ExecutionRecord {
    ExecutionRecord {
        id: Uuid::nil(),
        language: Language::Python,
        code: "print('hi')".to_string(),
        conversation_id: None,
        requesting_agent_id: None,
        timeout_seconds: 30,
        limits: ResourceLimits::default(),
        status,
        result,
        error: None,
        created_at: Utc::now(),
        started_at: None,
        completed_at: None,
        version: 1,
    }
}

#[test]
fn test_execution_summary_serialization() {
    let summary = ExecutionSummary::from(record(
        ExecutionStatus::Completed,
        Some(SandboxOutput::success("hi\n")),
    ));
    let json = serde_json::to_string(&summary).unwrap();
    assert!(json.contains("\"language\":\"python\""));
    assert!(json.contains("\"status\":\"completed\""));
    assert!(json.contains("\"exit_code\":0"));
    assert!(!json.contains("print"));
}

#[test]
fn test_summary_without_output_has_no_exit_code() {
    let summary = ExecutionSummary::from(record(ExecutionStatus::Pending, None));
    assert_eq!(summary.exit_code, None);
    assert_eq!(summary.status, ExecutionStatus::Pending);
}

#[test]
fn test_list_query_deserialization() {
    let json = r#"{"skip": 5, "take": 10, "status": "timeout"}"#;
    let query: ListExecutionsQuery = serde_json::from_str(json).unwrap();
    assert_eq!(query.status, Some(ExecutionStatus::Timeout));

    let page = query.page();
    assert_eq!(page.skip, Some(5));
    assert_eq!(page.take, Some(10));
}

#[test]
fn test_list_query_rejects_unknown_status() {
    let json = r#"{"status": "exploded"}"#;
    assert!(serde_json::from_str::<ListExecutionsQuery>(json).is_err());
}
