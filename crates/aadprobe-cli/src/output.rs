use aadprobe_verifier::{ScenarioReport, StepKind};

/// Render a scenario report as human-readable text.
pub fn render_report(report: &ScenarioReport) -> String {
    let mut out = format!("case {} ({})\n", report.case, report.provisioner);

    for step in &report.steps {
        let mark = if step.passed() { "✓" } else { "✗" };
        let what = match &step.kind {
            StepKind::Apply { variant, test_id } => format!("apply {} [{}]", variant, test_id),
            StepKind::ImportVerify { address } => format!("import-verify {}", address),
        };
        let id = step
            .object_id
            .as_deref()
            .map(|id| format!(" -> {}", id))
            .unwrap_or_default();
        out.push_str(&format!("  {} {}: {}{}\n", mark, step.index, what, id));
        if let Some(e) = &step.error {
            out.push_str(&indent(e));
        }
    }

    match &report.destroy_error {
        None => out.push_str("  ✓ destroy\n"),
        Some(e) => {
            out.push_str("  ✗ destroy\n");
            out.push_str(&indent(e));
        }
    }

    out.push_str(if report.passed() { "PASS\n" } else { "FAIL\n" });
    out
}

fn indent(text: &str) -> String {
    text.lines().map(|l| format!("      {}\n", l)).collect()
}
