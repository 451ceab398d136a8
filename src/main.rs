use anyhow::Result;
use clap::{Parser, Subcommand};
use mergectl::commands::{list, merge, open, show, transition};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mergectl")]
#[command(about = "Merge-request coordination for git repositories", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a new merge request
    Open {
        /// Source branch to merge from
        #[arg(short, long)]
        source: String,

        /// Target branch (default: repository default branch)
        #[arg(short, long)]
        target: Option<String>,

        /// Human-readable title
        #[arg(long)]
        title: Option<String>,

        /// Delete the source branch after merging
        #[arg(long)]
        remove_source_branch: bool,

        /// Acting user ("Name <email>" or a configured user name)
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Merge an approved request into its target branch
    Merge {
        /// Merge request id
        request_id: String,

        /// Commit message override
        #[arg(short, long)]
        message: Option<String>,

        /// Acting user ("Name <email>" or a configured user name)
        #[arg(short, long)]
        user: Option<String>,

        /// Delete the source branch after merging
        #[arg(long)]
        delete_source_branch: bool,
    },

    /// List merge requests
    List,

    /// Show one merge request in detail
    Show {
        /// Merge request id
        request_id: String,
    },

    /// Mark a merge request as mergeable
    Approve {
        /// Merge request id
        request_id: String,
    },

    /// Close a merge request without merging
    Close {
        /// Merge request id
        request_id: String,
    },

    /// Reopen a closed merge request
    Reopen {
        /// Merge request id
        request_id: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Open {
            source,
            target,
            title,
            remove_source_branch,
            user,
        } => open::execute(source, target, title, remove_source_branch, user),
        Commands::Merge {
            request_id,
            message,
            user,
            delete_source_branch,
        } => merge::execute(request_id, message, user, delete_source_branch),
        Commands::List => list::execute(),
        Commands::Show { request_id } => show::execute(request_id),
        Commands::Approve { request_id } => transition::approve(request_id),
        Commands::Close { request_id } => transition::close(request_id),
        Commands::Reopen { request_id } => transition::reopen(request_id),
    }
}
