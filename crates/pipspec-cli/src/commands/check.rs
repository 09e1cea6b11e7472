use super::{colorize_severity, json_pretty, EXIT_FAILURE, EXIT_SUCCESS};
use pipspec_core::{Engine, Issue};
use std::path::Path;

fn render_issue(issue: &Issue) -> String {
    let mut line = format!("{}[{}]", colorize_severity(issue.severity), issue.code);
    match (&issue.section, &issue.key) {
        (Some(section), Some(key)) => line.push_str(&format!(" [{section}] {key}")),
        (Some(section), None) => line.push_str(&format!(" [{section}]")),
        _ => {}
    }
    line.push_str(": ");
    line.push_str(&issue.message);
    line
}

pub fn run(engine: &Engine, manifest_path: &Path, strict: bool, json: bool) -> Result<u8, String> {
    let result = engine.check(manifest_path).map_err(|e| e.to_string())?;
    let report = &result.report;
    let strict = strict || engine.config().strict;
    let passed = report.passes(strict);

    if json {
        let payload = serde_json::json!({
            "manifest": manifest_path,
            "passed": passed,
            "strict": strict,
            "errors": report.errors(),
            "warnings": report.warnings(),
            "issues": report.issues,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        for issue in &report.issues {
            println!("{}", render_issue(issue));
        }
        if report.issues.is_empty() {
            println!("{}: ok", manifest_path.display());
        } else {
            println!(
                "{}: {} error(s), {} warning(s)",
                manifest_path.display(),
                report.errors(),
                report.warnings()
            );
        }
    }

    Ok(if passed { EXIT_SUCCESS } else { EXIT_FAILURE })
}
