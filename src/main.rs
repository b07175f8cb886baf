use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing_subscriber::EnvFilter;

mod catalog;
mod chat;
mod dashboard;
mod error;
mod models;
mod recommend;
mod store;

use store::{CourseField, PgStore, RecordStore};

#[derive(Parser)]
#[command(name = "course-insights")]
#[command(about = "Dashboard aggregation and course recommendations over an LMS record store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import catalog courses from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Show a member's enrollment dashboard
    Dashboard {
        #[arg(long)]
        email: String,
        #[arg(long)]
        json: bool,
    },
    /// Rank course recommendations for a member
    Recommend {
        #[arg(long)]
        email: String,
        #[arg(long, default_value_t = recommend::DEFAULT_LIMIT)]
        limit: usize,
        #[arg(long, default_value_t = recommend::DEFAULT_POOL_SIZE)]
        pool: usize,
        #[arg(long)]
        json: bool,
    },
    /// Enroll a member in a course
    Enroll {
        #[arg(long)]
        email: String,
        #[arg(long)]
        course: String,
    },
    /// Search published courses by title or description
    Search {
        #[arg(long)]
        query: String,
        #[arg(long)]
        owner: Option<String>,
    },
    /// Ask the learning assistant a question
    Chat {
        #[arg(long)]
        message: String,
    },
    /// Greet a known member
    Hello {
        #[arg(long)]
        email: String,
    },
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to the LMS record store")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to the record store")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        // The assistant's reply table needs no store at all.
        Commands::Chat { message } => {
            println!("{}", chat::reply(&message));
        }
        Commands::InitDb => {
            store::init_db(&connect().await?).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            store::seed(&connect().await?).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = store::import_courses_csv(&connect().await?, &csv).await?;
            println!("Inserted {inserted} new courses from {}.", csv.display());
        }
        Commands::Dashboard { email, json } => {
            let store = PgStore::new(connect().await?);
            let view = dashboard::get_dashboard(&store, &email).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
                return Ok(());
            }

            println!(
                "Dashboard for {}: {} courses ({} completed, {} in progress)",
                view.user,
                view.statistics.total_courses,
                view.statistics.completed,
                view.statistics.in_progress
            );
            for course in &view.courses {
                println!(
                    "- {} ({}) {:.0}% done, instructor {}",
                    course.title, course.name, course.progress, course.instructor
                );
            }
            if view.recent_activity.is_empty() {
                println!("No recent activity.");
            } else {
                println!("Recent activity:");
                for record in &view.recent_activity {
                    println!(
                        "- {} {} on {} ({} min)",
                        record.lesson,
                        record.status,
                        record.modified_at.format("%Y-%m-%d %H:%M"),
                        record.time_spent / 60
                    );
                }
            }
        }
        Commands::Recommend {
            email,
            limit,
            pool: pool_size,
            json,
        } => {
            let store = PgStore::new(connect().await?);
            let recs = recommend::get_recommendations(&store, &email, pool_size, limit).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&recs)?);
                return Ok(());
            }

            if recs.is_empty() {
                println!("No eligible courses to recommend.");
                return Ok(());
            }

            println!("Top course recommendations:");
            for rec in &recs {
                println!(
                    "- {} ({}) score {}: {}",
                    rec.title, rec.name, rec.recommendation_score, rec.reason
                );
            }
        }
        Commands::Enroll { email, course } => {
            let store = PgStore::new(connect().await?);
            let outcome = catalog::enroll(&store, &email, &course).await?;
            match outcome.enrollment_id {
                Some(id) => println!("{} (enrollment {id})", outcome.message),
                None => println!("{}", outcome.message),
            }
        }
        Commands::Search { query, owner } => {
            let store = PgStore::new(connect().await?);
            let filters: Vec<(CourseField, String)> = owner
                .into_iter()
                .map(|owner| (CourseField::Owner, owner))
                .collect();
            let courses = catalog::search_courses(&store, &query, &filters).await?;

            if courses.is_empty() {
                println!("No matching courses.");
                return Ok(());
            }

            for course in &courses {
                println!(
                    "- {} ({}) by {}: {}",
                    course.title, course.name, course.owner, course.short_introduction
                );
            }
        }
        Commands::Hello { email } => {
            let store = PgStore::new(connect().await?);
            let user = store.get_user(&email).await?;
            println!("{}", chat::greeting(&user));
        }
    }

    Ok(())
}
