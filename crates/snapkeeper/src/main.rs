//! snapkeeper: tag-driven snapshot and backup lifecycle automation
//!
//! The `trigger` command discovers tagged instances and file systems and
//! starts the backup workflow over them. The `step` commands each run one
//! stateless lifecycle step: they read an event payload (stdin or a file),
//! drive the provider, and write the updated payload to stdout for the
//! workflow to carry forward.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use snapkeeper::aws::{AwsContext, Ec2Client, FsxClient, SfnClient, SsmClient};
use snapkeeper::config::Config;
use snapkeeper::{discovery, steps};
use snapkeeper_core::SnapshotEvent;
use std::io::Read;
use std::path::PathBuf;
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "snapkeeper")]
#[command(about = "Tag-driven snapshot and backup lifecycle automation")]
#[command(version)]
struct Args {
    /// AWS region (uses the SDK default chain if not set)
    #[arg(long, global = true)]
    region: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Discover tagged resources and start the backup workflow
    Trigger,

    /// Run one lifecycle step over an event payload
    Step {
        #[command(subcommand)]
        action: StepAction,
    },
}

#[derive(Subcommand, Debug)]
enum StepAction {
    /// Request a point-in-time snapshot of an instance
    RequestSnapshot(EventInput),
    /// Poll the automation execution backing an event
    PollExecution(EventInput),
    /// Request a file-system backup
    RequestBackup(EventInput),
    /// Check whether any backup is still being created
    CheckBackup(EventInput),
    /// Delete expired snapshots for an instance
    SweepSnapshots(EventInput),
    /// Delete expired backups for a file system
    SweepBackups(EventInput),
}

#[derive(clap::Args, Debug)]
struct EventInput {
    /// Event JSON file (reads stdin if not set)
    #[arg(long)]
    event: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the step's output payload
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let ctx = AwsContext::new(args.region).await;

    match args.command {
        Command::Trigger => run_trigger(&ctx).await,
        Command::Step { action } => run_step(&ctx, action).await,
    }
}

async fn run_trigger(ctx: &AwsContext) -> Result<()> {
    let config = Config::from_env()?;
    let ec2 = Ec2Client::new(ctx);
    let fsx = FsxClient::new(ctx);
    let sfn = SfnClient::new(ctx);

    let instances = ec2
        .discover_tagged_instances(&config.instance_tag_key, &config.instance_tag_value)
        .await?;
    let file_systems = fsx
        .discover_tagged_file_systems(&config.filesystem_tag_key, &config.filesystem_tag_value)
        .await?;

    if let Some(execution) =
        discovery::trigger_workflow(&sfn, &config.state_machine_arn, instances, file_systems)
            .await?
    {
        println!("{execution}");
    }
    Ok(())
}

async fn run_step(ctx: &AwsContext, action: StepAction) -> Result<()> {
    match action {
        StepAction::RequestSnapshot(input) => {
            let config = Config::from_env()?;
            let event = read_event(&input)?;
            let ssm = SsmClient::new(ctx);
            let updated = steps::request_instance_snapshot(
                &ssm,
                &ssm,
                &config.snapshot_document_parameter,
                event,
            )
            .await?;
            write_json(&updated)
        }
        StepAction::PollExecution(input) => {
            let event = read_event(&input)?;
            let ssm = SsmClient::new(ctx);
            let updated = steps::poll_execution(&ssm, event).await?;
            if let Some(failure) = updated.failure() {
                error!(error = %failure, "Recorded execution failure");
            }
            write_json(&updated)
        }
        StepAction::RequestBackup(input) => {
            let event = read_event(&input)?;
            let fsx = FsxClient::new(ctx);
            let updated = steps::request_filesystem_backup(&fsx, event).await?;
            write_json(&updated)
        }
        StepAction::CheckBackup(input) => {
            let event = read_event(&input)?;
            let fsx = FsxClient::new(ctx);
            let updated = steps::check_backup_in_progress(&fsx, event).await?;
            write_json(&updated)
        }
        StepAction::SweepSnapshots(input) => {
            let config = Config::from_env()?;
            let event = read_event(&input)?;
            let ec2 = Ec2Client::new(ctx);
            let report = steps::sweep_instance_snapshots(
                &ec2,
                &event,
                config.retention,
                steps::DELETE_PACING,
            )
            .await?;
            write_json(&report)
        }
        StepAction::SweepBackups(input) => {
            let config = Config::from_env()?;
            let event = read_event(&input)?;
            let fsx = FsxClient::new(ctx);
            let report = steps::sweep_filesystem_backups(
                &fsx,
                &event,
                config.retention,
                steps::DELETE_PACING,
            )
            .await?;
            write_json(&report)
        }
    }
}

fn read_event(input: &EventInput) -> Result<SnapshotEvent> {
    let raw = match &input.event {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event from {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read event from stdin")?;
            buf
        }
    };
    serde_json::from_str(&raw).context("Failed to parse snapshot event")
}

fn write_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{rendered}");
    Ok(())
}
