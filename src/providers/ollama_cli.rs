use anyhow::{Context, Result, anyhow};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

pub const THINKING_START: &str = "Thinking...";
pub const THINKING_END: &str = "...done thinking.";

/// Drops the visible reasoning block some models print before their answer.
///
/// Only applies when the start marker is present; everything up to and
/// including the last end marker is discarded.
pub fn extract_answer(output: &str) -> String {
    if output.contains(THINKING_START)
        && let Some((_, answer)) = output.rsplit_once(THINKING_END)
    {
        return answer.trim().to_string();
    }
    output.trim().to_string()
}

/// Runs `<program> run <model> <prompt>` and returns the cleaned answer.
///
/// Arguments are passed as a vector, never through a shell.
pub async fn run(program: &str, model: &str, prompt: &str) -> Result<String> {
    debug!(
        program = %program,
        model = %model,
        prompt_len = prompt.len(),
        "invoking model runner"
    );

    let output = Command::new(program)
        .arg("run")
        .arg(model)
        .arg(prompt)
        .stdin(Stdio::null())
        .output()
        .await
        .with_context(|| format!("Failed to launch '{program} run {model}'"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(
            program = %program,
            model = %model,
            status = %output.status,
            "model runner exited unsuccessfully"
        );
        return Err(anyhow!(
            "'{} run {}' exited with {}: {}",
            program,
            model,
            output.status,
            stderr.trim()
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let answer = extract_answer(&stdout);
    debug!(
        model = %model,
        raw_len = stdout.len(),
        answer_len = answer.len(),
        "model runner finished"
    );
    Ok(answer)
}
