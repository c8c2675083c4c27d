use anyhow::Result;
use lifecheck_harness::{RunSummary, Step};

/// Render a run summary as human-readable text.
pub fn render_summary(name: &str, summary: &RunSummary) -> String {
    format!(
        "ok: scenario '{}' converged ({} steps, {} resources destroyed)\n",
        name, summary.steps, summary.destroyed
    )
}

/// Render each step's configuration document as a YAML stream.
pub fn render_steps_yaml(steps: &[Step]) -> Result<String> {
    let mut out = String::new();
    for (i, step) in steps.iter().enumerate() {
        out.push_str(&format!("# step {}\n", i));
        out.push_str(&serde_yaml::to_string(&step.config)?);
        out.push_str("---\n");
    }
    Ok(out)
}
