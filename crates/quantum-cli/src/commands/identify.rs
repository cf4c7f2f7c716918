//! Caller identification command.

use super::require_daemon;
use crate::output::OutputFormat;
use anyhow::{Context, Result};
use daemon_config_and_utils::Paths;
use daemon_ipc::ops;
use quantum_core::SchedSnapshot;
use serde_json::json;
use task_introspect::self_identity;

/// Register this process in the daemon's caller registry and print the
/// scheduling snapshot the daemon took of it.
///
/// Repeated calls from the same process are recorded once; `--repeat` makes
/// that visible by asking several times on one identity.
pub async fn identify(paths: &Paths, repeat: u32, format: &OutputFormat) -> Result<()> {
    let client = require_daemon(paths).await?;
    let me = self_identity();

    for _ in 0..repeat.max(1) {
        let response = client
            .call_op_with_arg(ops::CALLER_IDENTIFY, json!({"pid": me.pid, "tgid": me.tgid}))
            .await?;
        if !response.is_success() {
            let message = response
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "unknown error".to_string());
            anyhow::bail!(message);
        }
        let result = response.result.unwrap_or_default();
        let arg = result
            .get("arg")
            .cloned()
            .context("identify response is missing the argument region")?;

        match format {
            OutputFormat::Text => {
                let snapshot: SchedSnapshot =
                    serde_json::from_value(arg).context("malformed scheduling snapshot")?;
                println!("{}", describe(&snapshot));
            }
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&arg)?),
        }
    }
    Ok(())
}

pub(crate) fn describe(snapshot: &SchedSnapshot) -> String {
    format!(
        "state {}, cpu {}, prio {}, pid {}, tgid {}, nv {}, niv {}",
        snapshot.state,
        snapshot.cpu,
        snapshot.prio,
        snapshot.pid,
        snapshot.tgid,
        snapshot.nvcsw,
        snapshot.nivcsw
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_matches_the_report_shape() {
        let snapshot = SchedSnapshot {
            state: 'R',
            cpu: 2,
            prio: 120,
            pid: 4321,
            tgid: 4300,
            nvcsw: 17,
            nivcsw: 3,
        };
        assert_eq!(
            describe(&snapshot),
            "state R, cpu 2, prio 120, pid 4321, tgid 4300, nv 17, niv 3"
        );
    }
}
