//! DynamoDB infrastructure management commands.

mod bootstrap;
mod client;
mod deploy;
mod error;
mod planning;

pub use error::{DynamodbError, Result};

use crate::prelude::*;
use dialoguer::Confirm;
use itemstore::storage::dynamodb::create_client;
use itemstore::StoreConfig;

/// DynamoDB infrastructure management commands.
#[derive(Debug, clap::Parser)]
pub struct DynamodbCommand {
    #[command(subcommand)]
    pub action: DynamodbAction,
}

/// Available DynamoDB actions.
#[derive(Debug, clap::Subcommand)]
pub enum DynamodbAction {
    /// Deploy or destroy the item store tables.
    Deploy(DeployCommand),

    /// Move the global sequence past the reserved id range.
    Bootstrap(BootstrapCommand),
}

/// Deploy or update DynamoDB infrastructure.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Deploy or destroy the item store tables.

By default, this command creates or updates the items, maps, locks and
sequences tables with their keys, Global Secondary Indexes (GSIs) and TTL
settings, then bootstraps the global id sequence.

The command shows a plan of changes before applying and asks for confirmation.

Environment variables:
  ITEMSTORE_TABLE_PREFIX - Prefix prepended to every table name
  AWS_ENDPOINT_URL       - Use local DynamoDB (e.g., http://localhost:8000)
  AWS_REGION             - AWS region (defaults to us-east-1)
  AWS_PROFILE            - AWS profile to use for credentials")]
pub struct DeployCommand {
    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,

    /// Destroy the tables instead of creating/updating.
    #[arg(long)]
    pub destroy: bool,

    /// Prefix prepended to every table name.
    #[arg(long, env = "ITEMSTORE_TABLE_PREFIX")]
    pub table_prefix: Option<String>,
}

/// Bootstrap the global id sequence.
#[derive(Debug, clap::Parser)]
pub struct BootstrapCommand {
    /// Prefix prepended to every table name.
    #[arg(long, env = "ITEMSTORE_TABLE_PREFIX")]
    pub table_prefix: Option<String>,
}

/// Main entry point for dynamodb command.
pub async fn run(command: DynamodbCommand, global: crate::Global) -> Result<()> {
    match command.action {
        DynamodbAction::Deploy(deploy_cmd) => run_deploy(deploy_cmd, &global).await,
        DynamodbAction::Bootstrap(bootstrap_cmd) => run_bootstrap(bootstrap_cmd, &global).await,
    }
}

fn store_config(table_prefix: Option<String>) -> StoreConfig {
    let mut config = StoreConfig::from_env();
    if let Some(prefix) = table_prefix {
        config.table_prefix = prefix;
    }
    config
}

fn confirm(prompt: &str, default: bool) -> Result<()> {
    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()?;

    if confirmed {
        Ok(())
    } else {
        Err(DynamodbError::UserCancelled)
    }
}

async fn run_deploy(cmd: DeployCommand, global: &crate::Global) -> Result<()> {
    let config = store_config(cmd.table_prefix);
    let tables = config.tables();

    if !global.is_silent() {
        aprintln!("{} {}", p_b("Target:"), client::target_display(&config));
        aprintln!();
    }

    let dynamo_client = create_client(&config).await;

    let mut states = Vec::new();
    for table_config in tables.all_tables() {
        let state = client::get_table_state(&dynamo_client, &table_config.table_name).await?;
        states.push((table_config, state));
    }

    if cmd.destroy {
        let plans: Vec<_> = states
            .iter()
            .map(|(config, state)| planning::calculate_destroy_plan(state.as_ref(), &config.table_name))
            .collect();

        if !global.is_silent() {
            aprintln!("{}", p_y("Destroy Plan:"));
            for line in plans.iter().flat_map(planning::format_destroy_plan) {
                aprintln!("  {}", paint_plan_line(&line));
            }
            aprintln!();
        }

        if plans
            .iter()
            .all(|plan| matches!(plan, planning::DestroyPlan::AlreadyGone { .. }))
        {
            if !global.is_silent() {
                aprintln!("{}", p_g("Nothing to destroy."));
            }
            return Ok(());
        }

        if !cmd.force {
            confirm(
                "Are you sure you want to delete these tables? ALL DATA WILL BE LOST",
                false,
            )?;
        }

        if !global.is_silent() {
            aprintln!("{}", p_b("Deleting tables..."));
        }

        for plan in &plans {
            deploy::execute_destroy_plan(&dynamo_client, plan).await?;
        }

        if !global.is_silent() {
            aprintln!("{}", p_g("Tables destroyed successfully."));
        }
        return Ok(());
    }

    let plans: Vec<_> = states
        .iter()
        .map(|(config, state)| planning::calculate_deploy_plan(state.as_ref(), config))
        .collect();

    if !global.is_silent() {
        aprintln!("{}", p_c("Deploy Plan:"));
        for line in plans.iter().flat_map(planning::format_deploy_plan) {
            aprintln!("  {}", paint_plan_line(&line));
        }
        aprintln!();
    }

    if plans.iter().any(planning::DeployPlan::has_changes) {
        if !cmd.force {
            confirm("Apply these changes?", true)?;
        }

        if !global.is_silent() {
            aprintln!("{}", p_b("Applying changes..."));
        }

        for plan in &plans {
            deploy::execute_deploy_plan(&dynamo_client, plan).await?;
        }
    } else if !global.is_silent() {
        aprintln!("{}", p_g("Infrastructure is up to date."));
    }

    let value = bootstrap::bootstrap_sequences(&dynamo_client, &tables).await?;

    if !global.is_silent() {
        aprintln!("{} global sequence at {}", p_g("Ready:"), value);
    }

    Ok(())
}

async fn run_bootstrap(cmd: BootstrapCommand, global: &crate::Global) -> Result<()> {
    let config = store_config(cmd.table_prefix);
    let tables = config.tables();

    if !global.is_silent() {
        aprintln!("{} {}", p_b("Target:"), client::target_display(&config));
        aprintln!("{} {}", p_b("Table:"), tables.sequences_table());
        aprintln!();
    }

    let dynamo_client = create_client(&config).await;

    let sequences_table = tables.sequences_table();
    if client::get_table_state(&dynamo_client, &sequences_table)
        .await?
        .is_none()
    {
        return Err(DynamodbError::TableNotFound {
            table_name: sequences_table,
        });
    }

    let value = bootstrap::bootstrap_sequences(&dynamo_client, &tables).await?;

    if !global.is_silent() {
        aprintln!("{} global sequence at {}", p_g("Success:"), value);
    }

    Ok(())
}
