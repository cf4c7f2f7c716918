//! Stress commands: hammer the daemon from many concurrent callers.
//!
//! The thread mode exists to exercise caller dedup with identities that
//! share a thread group; the process mode does the same with fully distinct
//! identities. Both finish by asking the daemon how many callers it has
//! recorded.

use super::require_daemon;
use crate::commands::identify::describe;
use crate::output::OutputFormat;
use anyhow::{Context, Result};
use daemon_config_and_utils::Paths;
use daemon_ipc::{ops, IpcClient, Request, Response};
use quantum_core::SchedSnapshot;
use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::process::Command;
use std::thread;

/// Spawn worker threads that identify themselves and bump the quantum.
///
/// Every worker runs on its own OS thread so the daemon sees one identity
/// per worker, all sharing this process's thread group.
pub async fn stress_threads(
    paths: &Paths,
    count: usize,
    iterations: usize,
    format: &OutputFormat,
) -> Result<()> {
    let client = require_daemon(paths).await?;
    let socket_path = paths.socket_file();

    let workers: Vec<_> = (0..count)
        .map(|worker| {
            let socket_path = socket_path.clone();
            thread::spawn(move || worker_loop(worker, &socket_path, iterations))
        })
        .collect();

    let mut failures = 0;
    for worker in workers {
        match worker.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                failures += 1;
                eprintln!("Error: worker failed: {}", e);
            }
            Err(_) => failures += 1,
        }
    }

    summarize(&client, "threads", count, iterations, failures, format).await
}

/// Spawn child processes that each run `quantumctl identify`.
pub async fn stress_procs(
    paths: &Paths,
    base_dir: Option<&Path>,
    count: usize,
    iterations: usize,
    format: &OutputFormat,
) -> Result<()> {
    let client = require_daemon(paths).await?;

    let exe = std::env::current_exe().context("locating the quantumctl binary")?;
    let mut children = Vec::with_capacity(count);
    for _ in 0..count {
        let mut command = Command::new(&exe);
        command
            .arg("identify")
            .arg("--repeat")
            .arg(iterations.to_string());
        if let Some(base) = base_dir {
            command.arg("--base-dir").arg(base);
        }
        if matches!(format, OutputFormat::Json) {
            command.arg("--format").arg("json");
        }
        children.push(command.spawn().context("spawning identify child")?);
    }

    let mut failures = 0;
    for mut child in children {
        if !child.wait()?.success() {
            failures += 1;
        }
    }

    summarize(&client, "procs", count, iterations, failures, format).await
}

fn worker_loop(worker: usize, socket_path: &Path, iterations: usize) -> Result<()> {
    // Identity is taken on the worker thread, so pid is this thread's own.
    let me = task_introspect::self_identity();

    for iteration in 0..iterations {
        let identify =
            Request::with_arg(ops::CALLER_IDENTIFY, json!({"pid": me.pid, "tgid": me.tgid}));
        let response = call_sync(socket_path, &identify)?;
        anyhow::ensure!(
            response.is_success(),
            "identify failed: {}",
            error_message(&response)
        );
        let arg = response
            .result
            .unwrap_or_default()
            .get("arg")
            .cloned()
            .unwrap_or_default();
        let snapshot: SchedSnapshot =
            serde_json::from_value(arg).context("malformed scheduling snapshot")?;
        println!("[worker {}] {}", worker, describe(&snapshot));

        let value = (1 + worker * iterations + iteration) as i64;
        let exchange = Request::with_arg(ops::QUANTUM_EXCHANGE, json!(value));
        let response = call_sync(socket_path, &exchange)?;
        anyhow::ensure!(
            response.is_success(),
            "exchange failed: {}",
            error_message(&response)
        );
        let old = response
            .result
            .as_ref()
            .and_then(|r| r.get("arg"))
            .cloned()
            .unwrap_or_default();
        println!("[worker {}] Quantum exchanged, old quantum: {}", worker, old);
    }
    Ok(())
}

/// Extract the daemon's error message from a failed response.
fn error_message(response: &Response) -> String {
    response
        .error
        .as_ref()
        .map(|e| e.message.clone())
        .unwrap_or_else(|| "unknown error".to_string())
}

/// One request/response exchange on a fresh blocking connection.
///
/// Worker threads cannot share the async client, so they speak the same
/// one-line protocol over a plain stream.
fn call_sync(socket_path: &Path, request: &Request) -> Result<Response> {
    let stream = UnixStream::connect(socket_path)
        .with_context(|| format!("connecting to {}", socket_path.display()))?;

    let mut writer = stream.try_clone()?;
    let mut line = request.to_json()?;
    line.push('\n');
    writer.write_all(line.as_bytes())?;
    writer.flush()?;

    let mut reader = BufReader::new(stream);
    let mut answer = String::new();
    reader.read_line(&mut answer)?;
    if answer.trim().is_empty() {
        anyhow::bail!("daemon closed the connection without answering");
    }
    Ok(Response::from_json(answer.trim())?)
}

async fn summarize(
    client: &IpcClient,
    mode: &str,
    count: usize,
    iterations: usize,
    failures: usize,
    format: &OutputFormat,
) -> Result<()> {
    let callers = match client.call_op(ops::HEALTH).await {
        Ok(health) => health
            .result
            .as_ref()
            .and_then(|r| r.get("callers_seen"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0),
        Err(_) => 0,
    };

    match format {
        OutputFormat::Text => {
            println!(
                "Stress complete ({}): {} workers x {} iterations, {} failures",
                mode, count, iterations, failures
            );
            println!("Callers seen by daemon: {}", callers);
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "mode": mode,
                    "workers": count,
                    "iterations": iterations,
                    "failures": failures,
                    "callers_seen": callers,
                }))?
            );
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} workers failed", failures, count);
    }
    Ok(())
}
