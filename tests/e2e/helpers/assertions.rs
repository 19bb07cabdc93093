use serde_json::Value;

/// Counts in a report always add up
pub fn assert_report_totals(report: &Value, total: u64, succeeded: u64) {
    assert_eq!(report["total_requested"].as_u64(), Some(total));
    assert_eq!(report["succeeded"].as_u64(), Some(succeeded));
    assert_eq!(report["failed"].as_u64(), Some(total - succeeded));
    assert_eq!(
        report["content_ids"].as_array().map(Vec::len),
        Some(succeeded as usize)
    );
    assert!(report["elapsed_seconds"].as_f64().is_some());
}

pub fn assert_failure(failure: &Value, stage: &str, kind: &str) {
    assert_eq!(failure["stage"].as_str(), Some(stage), "failure: {}", failure);
    assert_eq!(failure["kind"].as_str(), Some(kind), "failure: {}", failure);
    assert!(failure["message"].as_str().is_some());
}
