use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process;
use time::OffsetDateTime;

use github_daily_report::config::{self, CliConfig, RepoSource};
use github_daily_report::github::GitHubClient;
use github_daily_report::http::RetryPolicy;
use github_daily_report::model::ReportBundle;
use github_daily_report::notion::NotionClient;
use github_daily_report::report::{self, PromptOptions, PublishMode};
use github_daily_report::window::TimeWindow;
use github_daily_report::{fetch, onboarding, output, resolver};

/// GitHub Daily Report: collect your commits for a day and turn them into a
/// work report.
#[derive(Parser, Debug)]
#[command(
    name = "github-daily-report",
    version,
    about,
    after_help = "Examples:\n  github-daily-report config\n  github-daily-report fetch --window today --details\n  github-daily-report report --source discover\n  github-daily-report prompt --start \"2026-02-02 00:00\" --end \"2026-02-03 06:00\" --mode append\n  github-daily-report report | github-daily-report publish --date 2026-02-02"
)]
struct Cli {
    /// Print request-level detail (URLs, retries).
    #[arg(long, global = true)]
    verbose: bool,

    /// Override the GitHub API base URL (also: GITHUB_API_URL).
    #[arg(long, global = true, hide = true)]
    github_api_url: Option<String>,

    /// Override the Notion API base URL (also: NOTION_API_URL).
    #[arg(long, global = true, hide = true)]
    notion_api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the setup wizard, or show/reset the saved configuration.
    Config {
        #[command(subcommand)]
        action: Option<ConfigCommand>,
    },

    /// Collect commits, print them per repository and save a JSON snapshot.
    Fetch {
        #[command(flatten)]
        window: WindowArgs,

        /// Also fetch line stats and touched files for every commit.
        #[arg(long)]
        details: bool,

        /// Where the repository list comes from.
        #[arg(long, value_enum)]
        source: Option<RepoSource>,
    },

    /// Print the Markdown report followed by a plain summary.
    Report {
        #[command(flatten)]
        window: WindowArgs,

        #[arg(long, value_enum)]
        source: Option<RepoSource>,
    },

    /// Build instructions for an agent that writes the report into Notion.
    Prompt {
        #[command(flatten)]
        window: WindowArgs,

        /// Create the day's page, or append to the existing one.
        #[arg(long, value_enum, default_value_t = PublishMode::Create)]
        mode: PublishMode,

        /// Notion page or database the agent should write to.
        #[arg(long)]
        destination: Option<String>,

        #[arg(long, value_enum)]
        source: Option<RepoSource>,
    },

    /// Publish report text (from FILE or stdin) as a new Notion page.
    Publish {
        /// File holding the report text. Reads stdin when omitted.
        file: Option<PathBuf>,

        /// Report date (YYYY-MM-DD). Defaults to today (UTC).
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Show the saved configuration with secrets redacted.
    Show,
    /// Delete the saved configuration.
    Reset {
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },
}

#[derive(Args, Debug, Default, Clone)]
struct WindowArgs {
    /// Predefined time window.
    #[arg(long, value_enum, conflicts_with_all = ["start", "end"])]
    window: Option<WindowKind>,

    /// Custom window start, "YYYY-MM-DD HH:MM" (UTC).
    #[arg(long, requires = "end")]
    start: Option<String>,

    /// Custom window end, "YYYY-MM-DD HH:MM" (UTC).
    #[arg(long, requires = "start")]
    end: Option<String>,

    /// Date the custom window is reported under (YYYY-MM-DD).
    #[arg(long, requires = "start")]
    report_date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum WindowKind {
    /// The whole current UTC day.
    Today,
    /// Yesterday plus today until 06:00 UTC.
    Overnight,
}

/// Build the time window from flags. With no flags, show the menu when
/// `interactive`, otherwise use `fallback`.
fn resolve_window(
    args: &WindowArgs,
    now: OffsetDateTime,
    fallback: WindowKind,
    interactive: bool,
) -> Result<TimeWindow> {
    if let (Some(start), Some(end)) = (&args.start, &args.end) {
        return TimeWindow::custom(start, end, args.report_date.as_deref());
    }
    let kind = match args.window {
        Some(kind) => kind,
        None if interactive => {
            return onboarding::choose_window(now, &mut io::stdin().lock(), &mut io::stderr());
        }
        None => fallback,
    };
    Ok(match kind {
        WindowKind::Today => TimeWindow::today(now),
        WindowKind::Overnight => TimeWindow::overnight(now),
    })
}

fn stdin_is_interactive() -> bool {
    io::stdin().is_terminal()
}

// ---------------------------------------------------------------------------
// Subcommand dispatch
// ---------------------------------------------------------------------------

fn run_config(action: Option<ConfigCommand>) -> Result<()> {
    match action {
        None => {
            let path = CliConfig::config_path()
                .context("cannot determine config path: $HOME is not set")?;
            if !stdin_is_interactive() {
                bail!(
                    "the setup wizard needs an interactive terminal; edit {} directly instead",
                    path.display()
                );
            }
            let mut config = CliConfig::load_from(&path)?;
            onboarding::run_setup_wizard(
                &mut config,
                &path,
                &mut io::stdin().lock(),
                &mut io::stderr(),
            )
        }
        Some(ConfigCommand::Show) => CliConfig::load()?.show(&mut io::stdout()),
        Some(ConfigCommand::Reset { yes }) => {
            if !yes
                && stdin_is_interactive()
                && !onboarding::read_yes_no(
                    &mut io::stdin().lock(),
                    &mut io::stderr(),
                    "Delete the saved configuration? [y/N]: ",
                    false,
                )?
            {
                output::detail("Nothing changed.");
                return Ok(());
            }
            if CliConfig::reset()? {
                output::success("Reset", "configuration removed");
            } else {
                output::detail("No saved configuration to remove.");
            }
            Ok(())
        }
    }
}

/// Resolve repositories and collect commits for `window`.
fn collect(
    cli_github_url: Option<&str>,
    config: &CliConfig,
    source: Option<RepoSource>,
    window: &TimeWindow,
    with_details: bool,
) -> Result<ReportBundle> {
    let credentials = config.require_github()?;
    let client = GitHubClient::new(
        &config::github_api_url(cli_github_url),
        credentials,
        RetryPolicy::default(),
    )?;

    let source = config.resolve_repo_source(source);
    output::action("Resolving", &format!("repositories ({})", source.as_str()));
    let repos = resolver::resolver_for(source, config, &client).resolve();
    if repos.is_empty() {
        output::warn("no repositories to inspect");
    }

    output::action(
        "Collecting",
        &format!(
            "commits by {} in {} repositories, {}",
            client.username(),
            repos.len(),
            window.describe()
        ),
    );
    let bundle = fetch::collect_commits(&client, &repos, client.username(), window, with_details);
    output::success(
        "Collected",
        &format!(
            "{} commits across {} repositories",
            bundle.total_commits,
            bundle.repos_with_commits.len()
        ),
    );
    Ok(bundle)
}

fn run_fetch(
    cli: &GlobalArgs,
    window: &WindowArgs,
    details: bool,
    source: Option<RepoSource>,
) -> Result<()> {
    let config = CliConfig::load()?;
    let window = resolve_window(window, OffsetDateTime::now_utc(), WindowKind::Today, false)?;
    let bundle = collect(cli.github_api_url.as_deref(), &config, source, &window, details)?;

    for repo in &bundle.repos_with_commits {
        println!("{repo}");
        for commit in bundle.commits_for(repo) {
            println!("  [{}] {}", commit.sha, commit.title());
        }
    }

    let path = report::default_snapshot_path();
    report::write_snapshot(&bundle, &path)?;
    output::success("Saved", &path.display().to_string());
    Ok(())
}

fn run_report(cli: &GlobalArgs, window: &WindowArgs, source: Option<RepoSource>) -> Result<()> {
    let config = CliConfig::load()?;
    let window = resolve_window(window, OffsetDateTime::now_utc(), WindowKind::Today, false)?;
    let bundle = collect(cli.github_api_url.as_deref(), &config, source, &window, false)?;

    print!("{}", report::render_report(&bundle));
    Ok(())
}

fn run_prompt(
    cli: &GlobalArgs,
    window: &WindowArgs,
    mode: PublishMode,
    destination: Option<String>,
    source: Option<RepoSource>,
) -> Result<()> {
    let config = CliConfig::load()?;
    config.require_github()?;
    let interactive = stdin_is_interactive();
    let window = resolve_window(
        window,
        OffsetDateTime::now_utc(),
        WindowKind::Overnight,
        interactive,
    )?;

    let configured = config.get(config::ConfigField::NotionLocation);
    let destination = match destination {
        Some(d) => Some(d),
        None if interactive => onboarding::prompt_line(
            &mut io::stdin().lock(),
            &mut io::stderr(),
            "Notion destination",
            configured.as_deref(),
        )?,
        None => configured,
    };

    let bundle = collect(cli.github_api_url.as_deref(), &config, source, &window, true)?;
    let text = report::render_agent_prompt(&bundle, &PromptOptions { mode, destination });
    println!("{text}");

    if bundle.is_empty() {
        output::detail("No commits in this window; nothing written.");
        return Ok(());
    }
    let path = report::default_prompt_path();
    report::write_prompt(&text, &path)?;
    output::success("Saved", &path.display().to_string());
    Ok(())
}

fn run_publish(cli: &GlobalArgs, file: Option<PathBuf>, date: Option<String>) -> Result<()> {
    let config = CliConfig::load()?;
    let credentials = config.require_notion()?;

    let text = match &file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?,
        None => {
            if stdin_is_interactive() {
                bail!("no report given: pass a FILE or pipe the report text on stdin");
            }
            io::read_to_string(io::stdin()).context("failed to read report from stdin")?
        }
    };
    if text.trim().is_empty() {
        bail!("report text is empty");
    }

    let client = NotionClient::new(
        &config::notion_api_url(cli.notion_api_url.as_deref()),
        credentials,
        RetryPolicy::default(),
    )?;
    output::action("Publishing", "report to Notion");
    let page = client.publish(&text, date.as_deref())?;
    output::success("Published", &page.url);
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

/// Flags shared by every subcommand.
#[derive(Debug, Default)]
struct GlobalArgs {
    github_api_url: Option<String>,
    notion_api_url: Option<String>,
}

fn run(cli: Cli) -> Result<()> {
    let global = GlobalArgs {
        github_api_url: cli.github_api_url,
        notion_api_url: cli.notion_api_url,
    };
    match cli.command {
        Command::Config { action } => run_config(action),
        Command::Fetch {
            window,
            details,
            source,
        } => run_fetch(&global, &window, details, source),
        Command::Report { window, source } => run_report(&global, &window, source),
        Command::Prompt {
            window,
            mode,
            destination,
            source,
        } => run_prompt(&global, &window, mode, destination, source),
        Command::Publish { file, date } => run_publish(&global, file, date),
    }
}

fn main() {
    let cli = Cli::parse();
    output::set_verbose(cli.verbose);

    if let Err(e) = run(cli) {
        output::fail("error:", &format!("{e:#}"));
        process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
