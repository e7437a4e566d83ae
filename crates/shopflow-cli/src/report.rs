use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, Table};

use shopflow_core::quality::{QualityReport, RuleStatus};

/// Render the quality report as a console table: one row per rule, with a
/// trailing verdict row per check group.
pub fn render(report: &QualityReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["check", "rule", "observed", "status"]);

    for check in &report.checks {
        for rule in &check.rules {
            table.add_row(vec![
                Cell::new(check.name),
                Cell::new(rule.rule),
                Cell::new(rule.observed),
                Cell::new(status_label(rule.status)),
            ]);
        }
        table.add_row(vec![
            Cell::new(check.name),
            Cell::new("overall"),
            Cell::new(""),
            Cell::new(if check.passed { "PASS" } else { "FAIL" }),
        ]);
    }

    table
}

fn status_label(status: RuleStatus) -> &'static str {
    match status {
        RuleStatus::Passed => "pass",
        RuleStatus::Failed => "FAIL",
        RuleStatus::Info => "info",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopflow_core::quality::{CheckResult, RuleResult};

    #[test]
    fn render_includes_every_check_name() {
        let report = QualityReport {
            checks: vec![CheckResult {
                name: "staging_customers",
                rules: vec![
                    RuleResult {
                        rule: "total rows",
                        observed: 10,
                        status: RuleStatus::Info,
                    },
                    RuleResult {
                        rule: "null customer ids",
                        observed: 0,
                        status: RuleStatus::Passed,
                    },
                ],
                passed: true,
            }],
        };

        let rendered = render(&report).to_string();
        assert!(rendered.contains("staging_customers"));
        assert!(rendered.contains("null customer ids"));
        assert!(rendered.contains("PASS"));
    }
}
