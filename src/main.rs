mod bookmarks;
mod config;
mod db;
mod export;
mod extract;
mod filter;
mod loader;
mod models;
mod stats;
mod tui;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use bookmarks::{AddOutcome, Bookmarks};
use config::Config;
use db::Database;
use export::ExportVariant;
use extract::{
    DEFAULT_SUMMARY_LEN, extract_salary, extract_skills, extract_work_type, relative_date,
    truncate_description, valid_logo_url,
};
use filter::JobFilter;
use models::{Job, JobUrl, WorkType};
use stats::{JobStatistics, RankEntry};

#[derive(Parser)]
#[command(name = "jobdash")]
#[command(about = "Job market dashboard - statistics, filters, exports and bookmarks over scraped postings")]
struct Cli {
    /// Path to the scraped job data (JSON array)
    #[arg(long, global = true, env = "JOBDASH_DATA")]
    data: Option<PathBuf>,

    /// Path to the bookmark store
    #[arg(long, global = true, env = "JOBDASH_STORE")]
    store: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// Match title, company or location
    #[arg(short = 'q', long)]
    search: Option<String>,

    /// Work type (remote, hybrid, on-site, "not specified")
    #[arg(short, long)]
    work_type: Option<WorkType>,

    /// City (text before the first comma of the location)
    #[arg(short, long)]
    location: Option<String>,

    /// Company name
    #[arg(short, long)]
    company: Option<String>,

    /// Skill mentioned in the description
    #[arg(short, long)]
    skill: Option<String>,

    /// Minimum advertised salary
    #[arg(long)]
    min_salary: Option<f64>,
}

impl From<FilterArgs> for JobFilter {
    fn from(args: FilterArgs) -> Self {
        JobFilter {
            search: args.search,
            work_type: args.work_type,
            location: args.location,
            company: args.company,
            skill: args.skill,
            min_salary: args.min_salary,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show dashboard statistics
    Stats {
        #[command(flatten)]
        filter: FilterArgs,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// List postings
    List {
        #[command(flatten)]
        filter: FilterArgs,

        /// Number of postings to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Show posting details
    Show {
        /// Detail URL of the posting
        url: String,
    },

    /// List hiring companies by number of postings
    Companies {
        /// Number of companies to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Show the values available for each filter
    Facets,

    /// Export postings as CSV
    Export {
        #[command(flatten)]
        filter: FilterArgs,

        /// Export layout
        #[arg(long, value_enum, default_value_t = ExportVariant::PowerBi)]
        variant: ExportVariant,

        /// Output directory
        #[arg(short, long, env = "JOBDASH_EXPORT_DIR")]
        out: Option<PathBuf>,
    },

    /// Manage bookmarked postings
    Bookmark {
        #[command(subcommand)]
        command: BookmarkCommands,
    },

    /// Browse postings interactively
    Browse {
        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(Subcommand)]
enum BookmarkCommands {
    /// Bookmark a posting
    Add {
        /// Detail URL of the posting
        url: String,
    },

    /// Remove a bookmark
    Remove {
        /// Detail URL of the posting
        url: String,
    },

    /// List bookmarks
    List,

    /// Remove all bookmarks
    Clear,
}

fn init_logging(verbose: u8) {
    let default_directive = match verbose {
        0 => "jobdash=warn",
        1 => "jobdash=info",
        _ => "jobdash=debug",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let export_dir = match &cli.command {
        Commands::Export { out, .. } => out.clone(),
        _ => None,
    };
    let config = Config::resolve(cli.data, cli.store, export_dir);
    tracing::debug!(?config, "resolved configuration");

    match cli.command {
        Commands::Stats { filter, json } => {
            let jobs = loader::load_jobs(&config.data_path)?;
            let filter = JobFilter::from(filter);
            let selected: Vec<Job> = filter.apply(&jobs).into_iter().cloned().collect();
            let stats = stats::job_statistics(&selected);

            if !filter.is_empty() {
                tracing::info!(matched = selected.len(), total = jobs.len(), "filter applied");
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_statistics(&stats);
            }
        }

        Commands::List { filter, limit } => {
            let jobs = loader::load_jobs(&config.data_path)?;
            let filter = JobFilter::from(filter);
            let selected = filter.apply(&jobs);
            if selected.is_empty() {
                println!("No jobs found.");
            } else {
                println!(
                    "{:<30} {:<20} {:<16} {:<13} {:<14}",
                    "TITLE", "COMPANY", "LOCATION", "WORK TYPE", "POSTED"
                );
                println!("{}", "-".repeat(97));
                for job in selected.iter().take(limit) {
                    println!(
                        "{:<30} {:<20} {:<16} {:<13} {:<14}",
                        truncate(&job.title, 28),
                        truncate(job.company_name.as_deref().unwrap_or("-"), 18),
                        truncate(job.city().unwrap_or("-"), 14),
                        extract_work_type(job.primary_description.as_deref()),
                        relative_date(job.created_at.as_deref()),
                    );
                }
                if selected.len() > limit {
                    println!("... {} more (use --limit)", selected.len() - limit);
                }
            }
        }

        Commands::Show { url } => {
            let jobs = loader::load_jobs(&config.data_path)?;
            let id = JobUrl::new(&url).ok_or_else(|| anyhow!("URL must not be empty"))?;
            let job = find_job(&jobs, &id)?;
            let db = Database::open(&config.store_path)?;
            let bookmarks = Bookmarks::load(&db)?;
            print_job(job, bookmarks.contains(Some(&id)));
        }

        Commands::Companies { limit } => {
            let jobs = loader::load_jobs(&config.data_path)?;
            let directory = filter::company_directory(&jobs);
            if directory.is_empty() {
                println!("No companies found.");
            } else {
                println!("{:<30} {:>6} {:<14} {}", "COMPANY", "JOBS", "LATEST", "LOGO");
                println!("{}", "-".repeat(80));
                for company in directory.iter().take(limit) {
                    let latest = company.latest_posting.map(|d| d.to_rfc3339());
                    println!(
                        "{:<30} {:>6} {:<14} {}",
                        truncate(&company.name, 28),
                        company.job_count,
                        relative_date(latest.as_deref()),
                        company.logo
                    );
                }
            }
        }

        Commands::Facets => {
            let jobs = loader::load_jobs(&config.data_path)?;
            print_facet("Locations", &filter::location_options(&jobs));
            print_facet("Companies", &filter::company_options(&jobs));
            print_facet("Skills", &filter::skill_options(&jobs));
        }

        Commands::Export { filter, variant, .. } => {
            let jobs = loader::load_jobs(&config.data_path)?;
            let filter = JobFilter::from(filter);
            let selected: Vec<Job> = filter.apply(&jobs).into_iter().cloned().collect();
            let bundle = export::export_jobs(&selected, variant)?;

            std::fs::create_dir_all(&config.export_dir).with_context(|| {
                format!("Failed to create export directory: {}", config.export_dir.display())
            })?;
            for file in bundle.files() {
                let path = config.export_dir.join(file.name);
                std::fs::write(&path, &file.content)
                    .with_context(|| format!("Failed to write to {}", path.display()))?;
                tracing::info!(path = %path.display(), "wrote export file");
                println!("Wrote {}", path.display());
            }
            println!("Exported {} job(s).", selected.len());
        }

        Commands::Bookmark { command } => {
            let db = Database::open(&config.store_path)?;
            let mut bookmarks = Bookmarks::load(&db)?;
            match command {
                BookmarkCommands::Add { url } => {
                    let jobs = loader::load_jobs(&config.data_path)?;
                    let id = JobUrl::new(&url).ok_or_else(|| anyhow!("URL must not be empty"))?;
                    let job = find_job(&jobs, &id)?.clone();
                    let title = job.title.clone();
                    match bookmarks.add(job)? {
                        AddOutcome::Added => println!("Bookmarked '{}'.", title),
                        AddOutcome::AlreadyBookmarked => println!("'{}' is already bookmarked.", title),
                        AddOutcome::MissingIdentifier => {
                            println!("'{}' has no detail URL and cannot be bookmarked.", title)
                        }
                    }
                }

                BookmarkCommands::Remove { url } => {
                    let id = JobUrl::new(&url).ok_or_else(|| anyhow!("URL must not be empty"))?;
                    if bookmarks.remove(&id)? {
                        println!("Removed bookmark {}.", id);
                    } else {
                        println!("{} is not bookmarked.", id);
                    }
                }

                BookmarkCommands::List => {
                    if bookmarks.is_empty() {
                        println!("No bookmarks yet.");
                    } else {
                        println!("{:<30} {:<20} {}", "TITLE", "COMPANY", "URL");
                        println!("{}", "-".repeat(90));
                        for job in bookmarks.jobs() {
                            println!(
                                "{:<30} {:<20} {}",
                                truncate(&job.title, 28),
                                truncate(job.company_name.as_deref().unwrap_or("-"), 18),
                                job.detail_url.as_deref().unwrap_or("-")
                            );
                        }
                        println!("\n{} bookmark(s) in {}", bookmarks.len(), db.path().display());
                    }
                }

                BookmarkCommands::Clear => {
                    let count = bookmarks.len();
                    bookmarks.clear()?;
                    println!("Removed {} bookmark(s).", count);
                }
            }
        }

        Commands::Browse { filter } => {
            let jobs = loader::load_jobs(&config.data_path)?;
            let filter = JobFilter::from(filter);
            let selected: Vec<Job> = filter.apply(&jobs).into_iter().cloned().collect();
            let db = Database::open(&config.store_path)?;
            let mut bookmarks = Bookmarks::load(&db)?;
            tui::run_browse(selected, &mut bookmarks)?;
        }
    }

    Ok(())
}

fn find_job<'a>(jobs: &'a [Job], id: &JobUrl) -> Result<&'a Job> {
    jobs.iter()
        .find(|j| j.id().as_ref() == Some(id))
        .ok_or_else(|| anyhow!("No posting with URL {}", id))
}

fn print_statistics(stats: &JobStatistics) {
    let share = |count: usize| match stats.share(count) {
        Some(s) => format!("{:.1}%", s * 100.0),
        None => "-".to_string(),
    };

    println!("Total jobs:   {}", stats.total_jobs);
    println!("Remote:       {:<6} {}", stats.remote_jobs, share(stats.remote_jobs));
    println!("Hybrid:       {:<6} {}", stats.hybrid_jobs, share(stats.hybrid_jobs));
    println!("On-site:      {:<6} {}", stats.onsite_jobs, share(stats.onsite_jobs));
    println!("Companies:    {}", stats.companies_count);
    println!("Locations:    {}", stats.locations_count);

    print_ranking("Top locations", &stats.top_locations);
    print_ranking("Top companies", &stats.top_companies);
    print_ranking("Top job titles", &stats.top_job_titles);
    print_ranking("Top skills", &stats.top_skills);

    if !stats.jobs_by_date.is_empty() {
        println!("\nJobs by date:");
        for point in &stats.jobs_by_date {
            println!("  {}  {:>4}  {}", point.date, point.count, "#".repeat(point.count.min(50)));
        }
    }
}

fn print_ranking(label: &str, entries: &[RankEntry]) {
    if entries.is_empty() {
        return;
    }
    println!("\n{}:", label);
    for (i, entry) in entries.iter().enumerate() {
        println!("  {:>2}. {:<32} {:>5}", i + 1, truncate(&entry.name, 30), entry.count);
    }
}

fn print_facet(label: &str, values: &[String]) {
    println!("{} ({}):", label, values.len());
    for value in values {
        println!("  {}", value);
    }
    println!();
}

fn print_job(job: &Job, bookmarked: bool) {
    println!("{}", job.title);
    if let Some(company) = &job.company_name {
        println!("Company: {}", company);
    }
    if let Some(location) = &job.location {
        println!("Location: {}", location);
    }
    println!("Work type: {}", extract_work_type(job.primary_description.as_deref()));
    println!("Posted: {}", relative_date(job.created_at.as_deref()));
    if let Some(salary) = extract_salary(job.description.as_deref()) {
        println!("Salary: {}", salary);
    }
    let skills = extract_skills(job.description.as_deref());
    if !skills.is_empty() {
        println!("Skills: {}", skills.join(", "));
    }
    if let Some(state) = &job.job_state {
        println!("State: {}", state);
    }
    if let Some(insight) = &job.insight {
        println!("Insight: {}", insight);
    }
    println!("Logo: {}", valid_logo_url(job.company_logo.as_deref()));
    if let Some(url) = &job.detail_url {
        println!("URL: {}", url);
    }
    println!("Bookmarked: {}", if bookmarked { "yes" } else { "no" });

    println!("\n--- Summary ---");
    let summary = truncate_description(job.description.as_deref(), DEFAULT_SUMMARY_LEN);
    println!("{}", textwrap::fill(&summary, 80));
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
