//! Waitline CLI - staff and customer commands against the daemon

mod rpc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rpc::RpcClient;
use serde::Deserialize;
use serde_json::{json, Value};
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9530";

#[derive(Parser)]
#[command(name = "waitline")]
#[command(about = "Waitline virtual waitlist CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, global = true, env = "WAITLINE_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,

    /// Authenticated staff principal (required for staff commands)
    #[arg(long, global = true, env = "WAITLINE_STAFF_ID")]
    staff_id: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Queue management
    #[command(subcommand)]
    Queue(QueueCommand),

    /// Join a queue as a customer
    Join {
        queue_id: String,

        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        phone: String,

        #[arg(long, default_value = "1")]
        party_size: i32,
    },

    /// Check an entry's position and estimated wait
    Status { entry_id: i64 },

    /// Cancel an entry (as staff when --staff-id is set)
    Cancel { entry_id: i64 },

    /// List a queue's entries (staff)
    Entries {
        queue_id: String,

        #[arg(short, long, value_enum)]
        status: Option<EntryStatusArg>,
    },

    /// Call whoever is at the head of the line (staff)
    CallNext { queue_id: String },

    /// Call a specific waiting entry (staff)
    Call { entry_id: i64 },

    /// Mark a called entry as served (staff)
    Serve { entry_id: i64 },

    /// Show daemon statistics
    Stats,

    /// Run maintenance operations
    Maintenance {
        /// Force VACUUM even if not needed
        #[arg(long)]
        force_vacuum: bool,
    },

    /// Check daemon liveness
    Health,
}

#[derive(Subcommand)]
enum QueueCommand {
    /// List queues
    List {
        /// Only queues owned by --staff-id
        #[arg(long)]
        mine: bool,

        /// Only active queues
        #[arg(long)]
        active: bool,
    },

    /// Show one queue
    Get { queue_id: String },

    /// Create a queue owned by --staff-id
    Create {
        name: String,

        #[arg(short, long)]
        business: String,

        /// Minutes of service per customer
        #[arg(short, long)]
        wait_minutes: Option<i64>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        address: Option<String>,
    },

    /// Change a queue's status
    SetStatus {
        queue_id: String,

        #[arg(value_enum)]
        status: QueueStatusArg,
    },

    /// Delete a queue with no live entries
    Delete { queue_id: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum QueueStatusArg {
    Active,
    Paused,
    Closed,
}

impl QueueStatusArg {
    fn as_str(self) -> &'static str {
        match self {
            QueueStatusArg::Active => "active",
            QueueStatusArg::Paused => "paused",
            QueueStatusArg::Closed => "closed",
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum EntryStatusArg {
    Waiting,
    Called,
    Served,
    Cancelled,
}

impl EntryStatusArg {
    fn as_str(self) -> &'static str {
        match self {
            EntryStatusArg::Waiting => "waiting",
            EntryStatusArg::Called => "called",
            EntryStatusArg::Served => "served",
            EntryStatusArg::Cancelled => "cancelled",
        }
    }
}

#[derive(Deserialize, Tabled)]
struct QueueView {
    id: String,
    name: String,
    business_name: String,
    status: String,
    current_size: i64,
    #[tabled(rename = "min/customer")]
    estimated_wait_minutes: i64,
}

#[derive(Deserialize, Tabled)]
struct EntryView {
    id: i64,
    customer_name: String,
    party_size: i32,
    status: String,
    position: i64,
    #[tabled(rename = "wait (min)")]
    estimated_wait_minutes: i64,
}

fn require_staff(staff_id: &Option<String>) -> Result<&str> {
    staff_id
        .as_deref()
        .context("--staff-id (or WAITLINE_STAFF_ID) is required for this command")
}

fn print_entries(entries: Vec<EntryView>) {
    if entries.is_empty() {
        println!("{}", "No entries".yellow());
    } else {
        println!("{}", Table::new(entries));
    }
}

fn print_entry(headline: String, entry: Value) -> Result<()> {
    let view: EntryView = serde_json::from_value(entry)?;
    println!("{}", headline.green().bold());
    println!();
    println!("{}", Table::new(vec![view]));
    Ok(())
}

fn mb(bytes: &Value) -> f64 {
    bytes.as_i64().unwrap_or(0) as f64 / (1024.0 * 1024.0)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = RpcClient::new(&cli.rpc_url);

    match cli.command {
        Commands::Queue(command) => run_queue_command(&client, &cli.staff_id, command).await?,

        Commands::Join {
            queue_id,
            name,
            phone,
            party_size,
        } => {
            let params = json!({
                "queue_id": queue_id,
                "customer_name": name,
                "phone_number": phone,
                "party_size": party_size,
            });
            let entry = client.call("entry.join.v1", params).await?;
            let headline = format!(
                "✓ Joined as entry {} (position {})",
                entry["id"], entry["position"]
            );
            print_entry(headline, entry)?;
        }

        Commands::Status { entry_id } => {
            let entry = client
                .call("entry.get.v1", json!({ "entry_id": entry_id }))
                .await?;
            print_entry(format!("Entry {}", entry_id), entry)?;
        }

        Commands::Cancel { entry_id } => {
            let params = match &cli.staff_id {
                Some(staff_id) => json!({ "entry_id": entry_id, "staff_id": staff_id }),
                None => json!({ "entry_id": entry_id }),
            };
            let entry = client.call("entry.cancel.v1", params).await?;
            print_entry(format!("✓ Entry {} cancelled", entry_id), entry)?;
        }

        Commands::Entries { queue_id, status } => {
            let staff_id = require_staff(&cli.staff_id)?;
            let params = json!({
                "staff_id": staff_id,
                "queue_id": queue_id,
                "status": status.map(EntryStatusArg::as_str),
            });
            let entries: Vec<EntryView> = client.call_as("entry.list.v1", params).await?;
            print_entries(entries);
        }

        Commands::CallNext { queue_id } => {
            let staff_id = require_staff(&cli.staff_id)?;
            let params = json!({ "staff_id": staff_id, "queue_id": queue_id });
            let result = client.call("entry.call_next.v1", params).await?;
            match result.get("entry").filter(|e| !e.is_null()) {
                Some(entry) => {
                    let headline = format!("✓ Called {}", entry["customer_name"]);
                    print_entry(headline, entry.clone())?;
                }
                None => println!("{}", "Nobody is waiting".yellow()),
            }
        }

        Commands::Call { entry_id } => {
            let staff_id = require_staff(&cli.staff_id)?;
            let params = json!({ "staff_id": staff_id, "entry_id": entry_id });
            let entry = client.call("entry.call.v1", params).await?;
            print_entry(format!("✓ Entry {} called", entry_id), entry)?;
        }

        Commands::Serve { entry_id } => {
            let staff_id = require_staff(&cli.staff_id)?;
            let params = json!({ "staff_id": staff_id, "entry_id": entry_id });
            let entry = client.call("entry.serve.v1", params).await?;
            print_entry(format!("✓ Entry {} served", entry_id), entry)?;
        }

        Commands::Stats => {
            println!("{}", "System Status".cyan().bold());
            println!();

            match client.call("admin.stats.v1", json!({})).await {
                Ok(stats) => {
                    println!("  {} {}", "RPC URL:".bold(), client.url());
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!();
                    println!("  {} {}", "Queues:".bold(), stats["queue_count"]);
                    println!("  {} {}", "Live entries:".bold(), stats["live_entry_count"]);
                    println!(
                        "  {} {}",
                        "Finished entries:".bold(),
                        stats["finished_entry_count"]
                    );
                    println!();
                    println!("  {} {:.2} MB", "DB Size:".bold(), mb(&stats["db_size_bytes"]));
                    println!("  {} {} seconds", "Uptime:".bold(), stats["uptime_seconds"]);
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }

        Commands::Maintenance { force_vacuum } => {
            println!("{}", "Running maintenance...".cyan().bold());
            println!();

            let params = json!({ "force_vacuum": force_vacuum });
            match client.call("admin.maintenance.v1", params).await {
                Ok(result) => {
                    if result["vacuum_run"].as_bool().unwrap_or(false) {
                        println!("  {} VACUUM executed", "✓".green());
                    } else {
                        println!("  ○ VACUUM skipped (not needed)");
                    }
                    println!(
                        "  {} {} finished entries purged",
                        "✓".green(),
                        result["purged_entries"]
                    );
                    println!(
                        "  {} {:.2} MB ({:.2} MB reclaimed)",
                        "DB Size:".bold(),
                        mb(&result["db_size_bytes"]),
                        result["reclaimed_mb"].as_f64().unwrap_or(0.0)
                    );
                }
                Err(e) => {
                    println!("  {} Maintenance failed: {}", "✗".red(), e);
                }
            }
        }

        Commands::Health => {
            let health = client.call("system.health.v1", json!({})).await?;
            println!(
                "{} {} (v{})",
                "✓".green(),
                health["status"].as_str().unwrap_or("unknown"),
                health["version"].as_str().unwrap_or("?")
            );
        }
    }

    Ok(())
}

async fn run_queue_command(
    client: &RpcClient,
    staff_id: &Option<String>,
    command: QueueCommand,
) -> Result<()> {
    match command {
        QueueCommand::List { mine, active } => {
            let owner_id = if mine {
                Some(require_staff(staff_id)?)
            } else {
                None
            };
            let params = json!({ "owner_id": owner_id, "active_only": active });
            let queues: Vec<QueueView> = client.call_as("queue.list.v1", params).await?;
            if queues.is_empty() {
                println!("{}", "No queues".yellow());
            } else {
                println!("{}", Table::new(queues));
            }
        }

        QueueCommand::Get { queue_id } => {
            let queue: QueueView = client
                .call_as("queue.get.v1", json!({ "queue_id": queue_id }))
                .await?;
            println!("{}", Table::new(vec![queue]));
        }

        QueueCommand::Create {
            name,
            business,
            wait_minutes,
            description,
            address,
        } => {
            let params = json!({
                "staff_id": require_staff(staff_id)?,
                "name": name,
                "business_name": business,
                "estimated_wait_minutes": wait_minutes,
                "description": description,
                "address": address,
            });
            let queue: QueueView = client.call_as("queue.create.v1", params).await?;
            println!("{}", "✓ Queue created".green().bold());
            println!();
            println!("{}", Table::new(vec![queue]));
        }

        QueueCommand::SetStatus { queue_id, status } => {
            let params = json!({
                "staff_id": require_staff(staff_id)?,
                "queue_id": queue_id,
                "status": status.as_str(),
            });
            let queue: QueueView = client.call_as("queue.update.v1", params).await?;
            println!(
                "{}",
                format!("✓ Queue {} is now {}", queue.id, queue.status)
                    .green()
                    .bold()
            );
        }

        QueueCommand::Delete { queue_id } => {
            let params = json!({
                "staff_id": require_staff(staff_id)?,
                "queue_id": queue_id,
            });
            client.call("queue.delete.v1", params).await?;
            println!("{}", format!("✓ Queue {} deleted", queue_id).green().bold());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staff_id_flag_is_global() {
        let cli = Cli::try_parse_from(["waitline", "call-next", "q-1", "--staff-id", "s-1"]).unwrap();
        assert_eq!(cli.staff_id.as_deref(), Some("s-1"));
        assert!(matches!(cli.command, Commands::CallNext { ref queue_id } if queue_id == "q-1"));
    }

    #[test]
    fn test_join_defaults_party_size() {
        let cli =
            Cli::try_parse_from(["waitline", "join", "q-1", "-n", "Ada", "-p", "+15551234567"])
                .unwrap();
        match cli.command {
            Commands::Join { party_size, .. } => assert_eq!(party_size, 1),
            _ => panic!("expected join"),
        }
    }

    #[test]
    fn test_queue_status_values() {
        let cli =
            Cli::try_parse_from(["waitline", "queue", "set-status", "q-1", "paused"]).unwrap();
        match cli.command {
            Commands::Queue(QueueCommand::SetStatus { status, .. }) => {
                assert_eq!(status.as_str(), "paused")
            }
            _ => panic!("expected queue set-status"),
        }
    }

    #[test]
    fn test_require_staff() {
        assert!(require_staff(&None).is_err());
        assert_eq!(require_staff(&Some("s-1".to_string())).unwrap(), "s-1");
    }

    #[test]
    fn test_entry_view_ignores_extra_fields() {
        let view: EntryView = serde_json::from_value(json!({
            "id": 3, "queue_id": "q", "customer_name": "Ada", "phone_number": "+15551234567",
            "party_size": 2, "position": 1, "status": "waiting", "joined_at": 0,
            "called_at": null, "served_at": null, "cancelled_at": null,
            "estimated_wait_minutes": 0
        }))
        .unwrap();
        assert_eq!(view.position, 1);
    }
}
