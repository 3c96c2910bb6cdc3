use anyhow::Result;
use clap::ValueEnum;
use webprobe_core_types::TestRun;

use agent_core::LogEntry;

#[derive(Clone, Debug, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Yaml,
}

/// Prints a finished run in the requested format.
pub fn print_run(run: &TestRun, logs: &[LogEntry], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(run)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(run)?),
        OutputFormat::Human => print!("{}", render_human(run, logs)),
    }
    Ok(())
}

fn render_human(run: &TestRun, logs: &[LogEntry]) -> String {
    let mut out = String::new();
    out.push_str(&format!("Run {} ({})\n", run.id, run.status));
    out.push_str(&format!("Start URL: {}\n", run.start_url));
    if let Some(config_id) = &run.config_id {
        out.push_str(&format!("Config: {}\n", config_id));
    }
    if let Some(completed) = run.completed_at {
        let elapsed = (completed - run.created_at).to_std().unwrap_or_default();
        let elapsed = std::time::Duration::from_secs(elapsed.as_secs());
        out.push_str(&format!("Duration: {}\n", humantime::format_duration(elapsed)));
    }

    out.push_str(&format!("\nSteps ({}):\n", run.steps.len()));
    for step in &run.steps {
        out.push_str(&format!(
            "  {:>3}. {} -> {}\n",
            step.sequence, step.description, step.target
        ));
    }

    out.push_str(&format!("\nIssues ({}):\n", run.issues.len()));
    if run.issues.is_empty() {
        out.push_str("  none\n");
    }
    for issue in &run.issues {
        out.push_str(&format!(
            "  [{}] {}: {}\n",
            issue.severity.as_str(),
            issue.kind.as_str(),
            issue.title
        ));
        if !issue.description.is_empty() {
            out.push_str(&format!("        {}\n", issue.description));
        }
    }

    if !logs.is_empty() {
        out.push_str("\nRecent log:\n");
        for entry in logs {
            out.push_str(&format!(
                "  {} {:<5} {}\n",
                entry.timestamp.format("%H:%M:%S"),
                entry.level.to_string(),
                entry.message
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use webprobe_core_types::{
        DetectedIssue, IssueKind, IssueSeverity, RunStatus, StepId, TestStep,
    };

    #[test]
    fn human_summary_lists_steps_and_issues() {
        let mut run = TestRun::new("https://site.test/", "local", Some("smoke".into()));
        let step = TestStep::navigate(
            run.id.clone(),
            1,
            "https://site.test/",
            "Home",
            None,
        );
        run.push_step(step);
        run.push_issue(DetectedIssue::new(
            run.id.clone(),
            StepId::new(),
            IssueKind::ConsoleError,
            IssueSeverity::High,
            "Console errors detected",
            "boom",
        ));
        run.finish(RunStatus::Completed);

        let text = render_human(&run, &[]);
        assert!(text.contains("Config: smoke"));
        assert!(text.contains("1. Home -> https://site.test/"));
        assert!(text.contains("[high] console_error: Console errors detected"));
        assert!(text.contains("Duration:"));
    }
}
