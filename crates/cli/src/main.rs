//! studyplan CLI - study plan generation and progress tracking.

mod import;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use studyplan_core::{
    Granularity, PlanRecord, ProgressStatus, ProgressUpdate, ScheduleStrategy, TopicId, UploadId,
    UserId,
};
use studyplan_planner::{PlanGenerator, PlanRequest, PlanService};
use studyplan_progress::{BasicProgressTracker, ProgressTracker};
use studyplan_storage::{JsonStorage, Storage};
use settings::Settings;

#[derive(Parser)]
#[command(name = "studyplan")]
#[command(about = "Study plan scheduling and progress tracking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Storage directory
    #[arg(short, long, default_value = ".studyplan", global = true)]
    storage: PathBuf,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage uploaded topics
    #[command(subcommand)]
    Topics(TopicsCommand),
    /// Generate and inspect plans
    #[command(subcommand)]
    Plan(PlanCommand),
    /// Record and summarize progress
    #[command(subcommand)]
    Progress(ProgressCommand),
}

#[derive(Subcommand)]
enum TopicsCommand {
    /// Import topics from a JSON array under a new upload id
    Import {
        /// JSON file
        file: PathBuf,
    },
    /// List an upload's topics
    List {
        /// Upload ID
        upload: String,
        /// Show this user's progress next to each topic
        #[arg(long)]
        user: Option<String>,
    },
}

#[derive(Subcommand)]
enum PlanCommand {
    /// Generate a plan for an upload
    Generate(GenerateArgs),
    /// Show the latest plan
    Show {
        /// User ID
        #[arg(long)]
        user: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all plans, newest first
    History {
        /// User ID
        #[arg(long)]
        user: String,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// User ID
    #[arg(long)]
    user: String,
    /// Upload ID
    #[arg(long)]
    upload: String,
    /// First day (YYYY-MM-DD)
    #[arg(long)]
    start: String,
    /// Last day (YYYY-MM-DD)
    #[arg(long)]
    end: String,
    /// Study hours per day
    #[arg(long)]
    hours: Option<f64>,
    /// Bucket size: day or week
    #[arg(long)]
    granularity: Option<String>,
    /// Strategy: budget_packing or even_spread
    #[arg(long)]
    strategy: Option<String>,
    /// Print as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum ProgressCommand {
    /// Update a topic's status
    Update {
        /// User ID
        #[arg(long)]
        user: String,
        /// Topic ID
        #[arg(long)]
        topic: String,
        /// not_started, in_progress or completed
        #[arg(long)]
        status: String,
        /// Hours studied since the last update
        #[arg(long, default_value = "0")]
        hours: f64,
        /// Notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show summary statistics
    Stats {
        /// User ID
        #[arg(long)]
        user: String,
    },
    /// Show unfinished topics
    Upcoming {
        /// User ID
        #[arg(long)]
        user: String,
        /// Upload ID (defaults to the latest plan's upload)
        #[arg(long)]
        upload: Option<String>,
        /// Maximum number of topics
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let storage = Arc::new(JsonStorage::new(&cli.storage).await?);
    let settings = Settings::load(&cli.storage)?;

    match cli.command {
        Commands::Topics(cmd) => run_topics(cmd, storage, &settings).await,
        Commands::Plan(cmd) => run_plan(cmd, storage, &settings).await,
        Commands::Progress(cmd) => run_progress(cmd, storage, &settings).await,
    }
}

async fn run_topics(cmd: TopicsCommand, storage: Arc<JsonStorage>, settings: &Settings) -> Result<()> {
    match cmd {
        TopicsCommand::Import { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {:?}", file))?;
            let upload_id = UploadId::new();
            let topics = import::parse_topics(&raw, upload_id)?;
            storage.save_topics(upload_id, &topics).await?;
            info!(upload = %upload_id, count = topics.len(), "imported topics");
            println!("Imported {} topics as upload {}", topics.len(), upload_id);
        }
        TopicsCommand::List { upload, user } => {
            let upload_id = parse_upload(&upload)?;
            match user {
                Some(user) => {
                    let tracker = BasicProgressTracker::new(storage).with_config(settings.progress);
                    let rows = tracker.topic_progress(&UserId::new(user), upload_id).await?;
                    println!("Topics ({})", rows.len());
                    for row in rows {
                        println!("  {} | {} | {:.1}h spent | {}",
                            row.topic.id,
                            row.status,
                            row.hours_spent,
                            row.topic.name,
                        );
                    }
                }
                None => {
                    let topics = storage.list_topics(upload_id).await?;
                    println!("Topics ({})", topics.len());
                    for topic in topics {
                        println!("  {} | {} | {} | {}",
                            topic.id,
                            topic.difficulty.map(|d| d.as_str()).unwrap_or("-"),
                            topic.estimated_hours.map(|h| format!("{:.1}h", h)).unwrap_or_else(|| "-".to_string()),
                            topic.name,
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

async fn run_plan(cmd: PlanCommand, storage: Arc<JsonStorage>, settings: &Settings) -> Result<()> {
    let service = PlanService::new(storage, PlanGenerator::new(settings.planner.clone()));

    match cmd {
        PlanCommand::Generate(args) => {
            let mut request = PlanRequest::new(args.start, args.end);
            request.daily_hours = args.hours;
            request.granularity = args.granularity.as_deref().map(parse_granularity).transpose()?;
            request.strategy = args.strategy.as_deref().map(parse_strategy).transpose()?;

            let record = service
                .generate_plan(&UserId::new(args.user), parse_upload(&args.upload)?, &request)
                .await?;
            print_plan(&record, args.json)?;
        }
        PlanCommand::Show { user, json } => {
            let Some(record) = service.latest_plan(&UserId::new(user)).await? else {
                println!("No study plan found");
                return Ok(());
            };
            print_plan(&record, json)?;
        }
        PlanCommand::History { user } => {
            let plans = service.plan_history(&UserId::new(user)).await?;
            println!("Plans ({})", plans.len());
            for record in plans {
                println!("  {} | {} | {} .. {} | {} buckets | {:.1}h",
                    record.id,
                    record.created_at.format("%Y-%m-%d %H:%M"),
                    record.plan.start_date,
                    record.plan.end_date,
                    record.plan.total_buckets,
                    record.plan.total_hours,
                );
            }
        }
    }
    Ok(())
}

async fn run_progress(cmd: ProgressCommand, storage: Arc<JsonStorage>, settings: &Settings) -> Result<()> {
    let tracker = BasicProgressTracker::new(storage.clone()).with_config(settings.progress);

    match cmd {
        ProgressCommand::Update { user, topic, status, hours, notes } => {
            let topic_id: TopicId = topic.parse().map_err(|_| anyhow::anyhow!("Invalid topic ID"))?;
            let status = ProgressStatus::parse(&status)
                .ok_or_else(|| anyhow::anyhow!("Unknown status '{}'", status))?;
            let record = tracker
                .update_progress(&UserId::new(user), topic_id, ProgressUpdate {
                    status,
                    hours_delta: hours,
                    notes,
                })
                .await?;
            println!("{} -> {} ({:.1}h spent)", record.topic_id, record.status, record.hours_spent);
        }
        ProgressCommand::Stats { user } => {
            let stats = tracker.stats(&UserId::new(user)).await?;
            println!("Progress");
            println!("  Topics: {}", stats.total_topics);
            println!("  Completed: {}", stats.completed);
            println!("  In progress: {}", stats.in_progress);
            println!("  Not started: {}", stats.not_started);
            println!("  Completion: {:.1}%", stats.completion_percentage);
            println!("  Hours spent: {:.1}", stats.total_hours);
        }
        ProgressCommand::Upcoming { user, upload, limit } => {
            let user = UserId::new(user);
            let upload_id = match upload {
                Some(upload) => parse_upload(&upload)?,
                None => match storage.load_latest_plan(&user).await? {
                    Some(record) => record.upload_id,
                    None => {
                        println!("No study plan found");
                        return Ok(());
                    }
                },
            };
            let topics = tracker.upcoming(&user, upload_id, limit).await?;
            println!("Up next ({})", topics.len());
            for topic in topics {
                println!("  {} | {} | {:.1}/{:.1}h | {}",
                    topic.topic_id,
                    topic.status,
                    topic.hours_spent,
                    topic.estimated_hours,
                    topic.name,
                );
            }
        }
    }
    Ok(())
}

fn print_plan(record: &PlanRecord, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
        return Ok(());
    }

    let plan = &record.plan;
    println!("Plan: {}", record.id);
    println!("  Range: {} .. {} at {:.1}h/day", plan.start_date, plan.end_date, plan.daily_hours);
    println!("  Scale factor: {:.2}", plan.scale_factor);
    println!("  Total: {:.1}h in {} buckets", plan.total_hours, plan.total_buckets);
    for bucket in &plan.buckets {
        if bucket.start_date == bucket.end_date {
            println!("  #{} {} ({:.1}h)", bucket.number, bucket.start_date, bucket.total_hours);
        } else {
            println!("  #{} {} .. {} ({:.1}h)", bucket.number, bucket.start_date, bucket.end_date, bucket.total_hours);
        }
        for assignment in &bucket.assignments {
            println!("    - {} [{}] {:.1}h", assignment.topic_name, assignment.difficulty, assignment.hours);
        }
    }
    Ok(())
}

fn parse_upload(s: &str) -> Result<UploadId> {
    s.parse().map_err(|_| anyhow::anyhow!("Invalid upload ID"))
}

fn parse_granularity(s: &str) -> Result<Granularity> {
    Granularity::parse(s).ok_or_else(|| anyhow::anyhow!("Unknown granularity '{}'", s))
}

fn parse_strategy(s: &str) -> Result<ScheduleStrategy> {
    ScheduleStrategy::parse(s).ok_or_else(|| anyhow::anyhow!("Unknown strategy '{}'", s))
}
