//! Notion dedup — one primary row per uid, newest wins.
//!
//! # Usage
//!
//! ```bash
//! # Report what would change, write nothing
//! cargo run -p notion-dedupe -- --dry-run
//!
//! # Reconcile, stamping a processed date on every touched row
//! cargo run -p notion-dedupe -- --processed-prop "Deduped at"
//! ```
//!
//! Token and database id come from `NOTION_TOKEN` / `NOTION_DB_ID`
//! (flags or `.env`). Re-running against a consistent database
//! performs zero updates.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;

mod notion;
mod plan;

use notion::NotionClient;

/// Pause between page updates, to stay inside Notion's rate limit.
const UPDATE_PACING: Duration = Duration::from_millis(350);

#[derive(Parser)]
#[command(about = "Deduplicate Notion rows by uid, keeping the newest as primary")]
struct Args {
    /// Notion integration token
    #[arg(long, env = "NOTION_TOKEN", hide_env_values = true)]
    token: String,

    /// Database to reconcile
    #[arg(long, env = "NOTION_DB_ID")]
    database_id: String,

    /// Property holding the user identifier
    #[arg(long, default_value = "uid", env = "UID_PROP")]
    uid_prop: String,

    /// Checkbox property marking the canonical row
    #[arg(long, default_value = "Primary", env = "PRIMARY_PROP")]
    primary_prop: String,

    /// Date property to stamp on every row this run touches
    #[arg(long, env = "PROCESSED_PROP")]
    processed_prop: Option<String>,

    /// Notion API version header
    #[arg(long, default_value = "2022-06-28", env = "NOTION_VERSION")]
    notion_version: String,

    /// Plan and report only; write nothing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let client = NotionClient::new(&args.token, &args.notion_version)?;
    let pages = client.query_all(&args.database_id).await?;
    let plan = plan::plan_updates(&pages, &args.uid_prop, &args.primary_prop);

    if args.dry_run {
        for update in &plan.updates {
            println!(
                "would set {} = {} on {}",
                args.primary_prop, update.primary, update.page_id
            );
        }
        println!(
            "Examined {} uids. Would update {} pages.",
            plan.examined_uids,
            plan.updates.len()
        );
        return Ok(());
    }

    for update in &plan.updates {
        client
            .set_checkbox(&update.page_id, &args.primary_prop, update.primary)
            .await?;
        if let Some(prop) = &args.processed_prop {
            client.stamp_date(&update.page_id, prop).await?;
        }
        tokio::time::sleep(UPDATE_PACING).await;
    }

    println!(
        "Examined {} uids. Updated {} pages.",
        plan.examined_uids,
        plan.updates.len()
    );
    Ok(())
}
