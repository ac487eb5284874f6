//! Plain-text views for terminal output

use roadmap_core::{MergeOutcome, RoadmapDocument, Status};
use std::fmt::Write;

fn marker(status: Status) -> &'static str {
    match status {
        Status::Pending => "[ ]",
        Status::InProgress => "[~]",
        Status::Completed => "[x]",
        Status::Cancelled => "[-]",
    }
}

/// Human-readable roadmap listing
pub fn document(doc: &RoadmapDocument) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", doc.feature);
    for line in doc.spec.lines() {
        let _ = writeln!(out, "  {line}");
    }

    for feature in &doc.roadmap.features {
        let _ = writeln!(
            out,
            "\n{}. {} ({} open)",
            feature.number,
            feature.title,
            feature.incomplete_count()
        );
        for action in &feature.actions {
            let _ = writeln!(
                out,
                "  {} {} {} ({})",
                marker(action.status),
                action.number,
                action.description.replace('\n', " "),
                action.status
            );
        }
    }
    out
}

/// One-line merge summary
pub fn merge_report(outcome: &MergeOutcome) -> String {
    let verb = if outcome.created { "created" } else { "merged" };
    let report = &outcome.report;
    let mut line = format!(
        "{verb}: {} new features, {} new actions",
        report.added_features.len(),
        report.added_actions.len()
    );
    if !report.skipped_actions.is_empty() {
        let skipped: Vec<_> = report.skipped_actions.iter().map(|n| n.as_str()).collect();
        let _ = write!(line, ", already present: {}", skipped.join(", "));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadmap_test_utils::{multi_feature_document, sample_document};

    #[test]
    fn sample_listing() {
        assert_eq!(
            document(&sample_document()),
            "Auth\n  Users log in with email and password.\n\n1. Auth (1 open)\n  [ ] 1.01 Build form (pending)\n"
        );
    }

    #[test]
    fn every_status_has_a_marker() {
        let text = document(&multi_feature_document());
        for expected in ["[~] 1.02", "[x] 1.03", "[-] 2.01", "[ ] 2.02", "2. Billing (1 open)"] {
            assert!(text.contains(expected), "missing {expected:?} in\n{text}");
        }
    }
}
