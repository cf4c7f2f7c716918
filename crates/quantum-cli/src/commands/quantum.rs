//! Quantum control commands.
//!
//! Each command wraps one daemon operation. `set` and `exchange` pass their
//! value by reference, so the daemon rejects anything that does not fit an
//! int region; `tell` and `shift` pass by value and get truncated instead.

use super::require_daemon;
use crate::output::OutputFormat;
use anyhow::Result;
use daemon_config_and_utils::Paths;
use daemon_ipc::{ops, Response};
use serde_json::json;

/// Restore the compile-time default quantum.
pub async fn reset(paths: &Paths, format: &OutputFormat) -> Result<()> {
    let client = require_daemon(paths).await?;
    let response = client.call_op(ops::QUANTUM_RESET).await?;
    finish(response, format, |_| "Quantum reset".to_string())
}

/// Set the quantum, passing the value by reference.
pub async fn set(paths: &Paths, value: i64, format: &OutputFormat) -> Result<()> {
    let client = require_daemon(paths).await?;
    let response = client.call_op_with_arg(ops::QUANTUM_SET, json!(value)).await?;
    finish(response, format, |_| format!("Quantum set to {}", value))
}

/// Set the quantum, passing the value directly.
pub async fn tell(paths: &Paths, value: i64, format: &OutputFormat) -> Result<()> {
    let client = require_daemon(paths).await?;
    let response = client
        .call_op_with_arg(ops::QUANTUM_TELL, json!(value))
        .await?;
    finish(response, format, |_| format!("Quantum set to {}", value))
}

/// Read the quantum through the argument region.
pub async fn get(paths: &Paths, format: &OutputFormat) -> Result<()> {
    let client = require_daemon(paths).await?;
    let response = client.call_op(ops::QUANTUM_GET).await?;
    finish(response, format, |result| {
        format!("Quantum: {}", result.get("arg").cloned().unwrap_or_default())
    })
}

/// Read the quantum as the call result.
pub async fn query(paths: &Paths, format: &OutputFormat) -> Result<()> {
    let client = require_daemon(paths).await?;
    let response = client.call_op(ops::QUANTUM_QUERY).await?;
    finish(response, format, |result| {
        format!(
            "Quantum: {}",
            result.get("value").cloned().unwrap_or_default()
        )
    })
}

/// Swap in a new quantum and print the old one, passing by reference.
pub async fn exchange(paths: &Paths, value: i64, format: &OutputFormat) -> Result<()> {
    let client = require_daemon(paths).await?;
    let response = client
        .call_op_with_arg(ops::QUANTUM_EXCHANGE, json!(value))
        .await?;
    finish(response, format, |result| {
        format!(
            "Quantum exchanged, old quantum: {}",
            result.get("arg").cloned().unwrap_or_default()
        )
    })
}

/// Swap in a new quantum and print the old one, passing by value.
pub async fn shift(paths: &Paths, value: i64, format: &OutputFormat) -> Result<()> {
    let client = require_daemon(paths).await?;
    let response = client
        .call_op_with_arg(ops::QUANTUM_SHIFT, json!(value))
        .await?;
    finish(response, format, |result| {
        format!(
            "Quantum shifted, old quantum: {}",
            result.get("value").cloned().unwrap_or_default()
        )
    })
}

/// Print a successful result, or fail with the daemon's error message.
fn finish(
    response: Response,
    format: &OutputFormat,
    text: impl FnOnce(&serde_json::Value) -> String,
) -> Result<()> {
    if !response.is_success() {
        let message = response
            .error
            .map(|e| e.message)
            .unwrap_or_else(|| "unknown error".to_string());
        anyhow::bail!(message);
    }
    let result = response.result.unwrap_or(serde_json::Value::Null);
    match format {
        OutputFormat::Text => println!("{}", text(&result)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_surfaces_daemon_errors() {
        let response = Response::error("1", -32601, "invalid command: bogus");
        let err = finish(response, &OutputFormat::Text, |_| String::new()).unwrap_err();
        assert!(err.to_string().contains("invalid command"));
    }

    #[test]
    fn finish_prints_a_success() {
        let response = Response::success("1", serde_json::json!({"value": 4000}));
        let outcome = finish(response, &OutputFormat::Text, |result| {
            format!("Quantum: {}", result.get("value").cloned().unwrap_or_default())
        });
        assert!(outcome.is_ok());
    }
}
