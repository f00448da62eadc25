//! Approval subcommand handlers for jobgate.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};
use tracing::{info, warn};

use jobgate_approval::options::{APPROVAL_MESSAGE, APPROVAL_TIMEOUT};
use jobgate_approval::{
    ApprovalContext, ApprovalGate, FileBroker, Job, MemoryBroker, ResolutionEngine, Submission,
};
use jobgate_config::{Config, StoreBackend};

use crate::cli::Commands;

/// The configured broker.
enum Broker {
    File(Arc<FileBroker>),
    Memory(Arc<MemoryBroker>),
}

impl Broker {
    async fn open(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        match config.store.backend {
            StoreBackend::File => {
                let broker = FileBroker::open(&config.store.path).await?;
                info!("Using store at {}", broker.path().display());
                Ok(Broker::File(Arc::new(broker)))
            }
            StoreBackend::Memory => {
                warn!("Using in-memory store, state is discarded on exit");
                Ok(Broker::Memory(Arc::new(MemoryBroker::new())))
            }
        }
    }

    fn context(&self, config: &Config) -> ApprovalContext {
        match self {
            Broker::File(b) => ApprovalContext::from_broker(config.approval.clone(), b.clone()),
            Broker::Memory(b) => ApprovalContext::from_broker(config.approval.clone(), b.clone()),
        }
    }

    async fn promote_due(&self) -> Result<usize, Box<dyn std::error::Error>> {
        let now = Utc::now();
        let promoted = match self {
            Broker::File(b) => b.promote_due(now).await?,
            Broker::Memory(b) => b.promote_due(now).await?,
        };
        Ok(promoted)
    }
}

/// Handle a subcommand.
pub(crate) async fn handle_command(
    command: Commands,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let broker = Broker::open(config).await?;
    let ctx = broker.context(config);

    match command {
        Commands::Submit { class, args, queue } => {
            let mut job = Job::new(class).with_args(parse_args(args.as_deref())?);
            job.queue = queue;
            submit(ApprovalGate::new(ctx), job).await
        }
        Commands::Hold {
            class,
            args,
            message,
            timeout,
        } => {
            let job = Job::new(class).with_args(parse_args(args.as_deref())?);
            hold(ApprovalGate::new(ctx), job, message, timeout).await
        }
        Commands::List { format } => list(&ctx, &format).await,
        Commands::Approve { key } => {
            let approved = ResolutionEngine::new(ctx).approve(&key).await?;
            decision(&key, approved, "approved")
        }
        Commands::Reject { key } => {
            let rejected = ResolutionEngine::new(ctx).reject(&key).await?;
            decision(&key, rejected, "rejected")
        }
        Commands::Promote => {
            let promoted = broker.promote_due().await?;
            println!("Released {} delayed job(s).", promoted);
            Ok(())
        }
    }
}

/// Parse `--args`; a non-array value becomes the only argument.
fn parse_args(raw: Option<&str>) -> Result<Vec<Value>, Box<dyn std::error::Error>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    match serde_json::from_str(raw)? {
        Value::Array(values) => Ok(values),
        value => Ok(vec![value]),
    }
}

async fn submit(gate: ApprovalGate, job: Job) -> Result<(), Box<dyn std::error::Error>> {
    match gate.submit(job).await? {
        Submission::Enqueued { queue } => println!("Enqueued on '{}'.", queue),
        Submission::Held(key) => println!("Held for approval: {}", key.encode()?),
    }
    Ok(())
}

async fn hold(
    gate: ApprovalGate,
    mut job: Job,
    message: Option<String>,
    timeout: Option<i64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = job.ensure_options();
    if let Some(message) = message {
        options.insert(APPROVAL_MESSAGE.to_string(), json!(message));
    }
    if let Some(timeout) = timeout {
        options.insert(APPROVAL_TIMEOUT.to_string(), json!(timeout));
    }

    let key = gate.hold_for_approval(job).await?;
    println!("Held for approval: {}", key.encode()?);
    Ok(())
}

async fn list(ctx: &ApprovalContext, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let pending = ctx.registry().list_pending().await?;

    if pending.is_empty() {
        println!("No jobs waiting for approval.");
        return Ok(());
    }

    match format {
        "json" => {
            let entries: Vec<Value> = pending
                .iter()
                .map(|(key, job)| json!({ "key": key.encode().ok(), "job": job }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        _ => {
            println!("{:<6} {:<20} {:<10} {:<30} {}", "ID", "CLASS", "TIMEOUT", "MESSAGE", "KEY");
            println!("{}", "-".repeat(100));
            for (key, job) in pending {
                let timeout = key
                    .approval_timeout
                    .map(|t| format!("{}s", t))
                    .unwrap_or_else(|| "-".to_string());
                let message = key.approval_message.as_deref().unwrap_or("-");
                println!(
                    "{:<6} {:<20} {:<10} {:<30} {}",
                    key.id,
                    job.class,
                    timeout,
                    message,
                    key.encode()?
                );
            }
        }
    }

    Ok(())
}

fn decision(key: &str, found: bool, verb: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !found {
        return Err(format!("No pending job for key {}", key).into());
    }
    println!("Job {} {}.", key, verb);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args_array() {
        let args = parse_args(Some(r#"[{"user":"ana"},3]"#)).unwrap();
        assert_eq!(args, vec![json!({"user": "ana"}), json!(3)]);
    }

    #[test]
    fn test_parse_args_single_value() {
        let args = parse_args(Some(r#"{"requires_approval":true}"#)).unwrap();
        assert_eq!(args, vec![json!({"requires_approval": true})]);
    }

    #[test]
    fn test_parse_args_missing_or_invalid() {
        assert!(parse_args(None).unwrap().is_empty());
        assert!(parse_args(Some("{oops")).is_err());
    }

    #[test]
    fn test_decision_not_found_is_error() {
        assert!(decision(r#"{"id":0}"#, true, "approved").is_ok());
        let err = decision(r#"{"id":0}"#, false, "approved").unwrap_err();
        assert!(err.to_string().contains("No pending job"));
    }
}
