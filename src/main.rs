//! CLI entry point for `skypeshell`.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use skypeshell::config::Config;
use skypeshell::export::json::{self as json_export, ConvertOutcome};
use skypeshell::model::history::History;
use skypeshell::parser::archive;
use skypeshell::parser::date::{parse_date_arg, Bound};
use skypeshell::search::cancel::CancellationToken;
use skypeshell::search::{SearchEngine, SearchOptions, SearchProgress, SearchResult};
use skypeshell::stats;
use skypeshell::view::render;
use skypeshell::view::theme::{current_theme, Theme};
use skypeshell::view::{paginate, Navigation, ViewOptions};

#[derive(Parser)]
#[command(
    name = "skypeshell",
    version,
    about = "Browse, search and export Skype chat history exports"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Skype export: messages.json or the directory containing it
    #[arg(short, long, global = true, env = "SKYPESHELL_FILE", value_name = "FILE")]
    file: Option<PathBuf>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

const DATE_HELP: &str = "\
Dates:
  --date-from and --date-to accept RFC 3339, YYYY-MM-DD[ HH:MM[:SS]],
  DD/MM/YYYY[ HH:MM[:SS]], 'Jan 2, 2006' and 'January 2, 2006'.
  Values without a zone are UTC. Both bounds are inclusive.
  A bare date given to --date-to covers the whole day: it means
  23:59:59.999999999 of that day, not midnight.";

#[derive(Subcommand)]
enum Commands {
    /// List all conversations
    List {
        /// Count system messages too
        #[arg(long)]
        show_system: bool,
        #[arg(long)]
        json: bool,
    },
    /// Page through a conversation
    #[command(after_help = DATE_HELP)]
    View {
        /// Conversation number as shown by `list`; prompts when omitted
        number: Option<usize>,
        /// Messages per page
        #[arg(long, value_name = "N")]
        page_size: Option<usize>,
        /// Show the newest messages first
        #[arg(long)]
        newest_first: bool,
        /// Include system messages
        #[arg(long)]
        show_system: bool,
        /// Only messages on or after this date
        #[arg(long, value_name = "DATE")]
        date_from: Option<String>,
        /// Only messages on or before this date (a bare date covers the whole day)
        #[arg(long, value_name = "DATE")]
        date_to: Option<String>,
        /// Print this page and exit instead of paging interactively
        #[arg(long, value_name = "P")]
        page: Option<usize>,
    },
    /// Search messages across all conversations
    #[command(after_help = DATE_HELP)]
    Search {
        /// Text to look for
        #[arg(short, long)]
        query: String,
        /// Match message content
        #[arg(long, num_args = 0..=1, default_missing_value = "true", value_name = "BOOL")]
        content: Option<bool>,
        /// Match sender names
        #[arg(long, num_args = 0..=1, default_missing_value = "true", value_name = "BOOL")]
        sender: Option<bool>,
        #[arg(long)]
        case_sensitive: bool,
        /// Only conversations whose name contains this text
        #[arg(long, value_name = "NAME")]
        conversation: Option<String>,
        /// Maximum number of results (0 = unlimited)
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
        /// Only messages on or after this date
        #[arg(long, value_name = "DATE")]
        date_from: Option<String>,
        /// Only messages on or before this date (a bare date covers the whole day)
        #[arg(long, value_name = "DATE")]
        date_to: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Export one conversation to a JSON file
    Export {
        /// Conversation number as shown by `list`
        number: usize,
        /// Output file (default: conversation_<name>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert a legacy single-conversation export to the current format
    Convert {
        input: PathBuf,
        /// Output file (default: <input>_converted.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show statistics
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = skypeshell::config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    let theme = current_theme(!cli.no_color && io::stdout().is_terminal());
    let file = cli.file.as_deref();

    match cli.command {
        Commands::List { show_system, json } => {
            cmd_list(require_file(file)?, show_system, json, &theme)
        }
        Commands::View {
            number,
            page_size,
            newest_first,
            show_system,
            date_from,
            date_to,
            page,
        } => {
            let mut options = ViewOptions::from_config(&config.view);
            if let Some(size) = page_size {
                options.page_size = size;
            }
            options.newest_first |= newest_first;
            options.show_system |= show_system;
            options.date_from = date_from
                .map(|d| parse_date_arg(&d, Bound::Start))
                .transpose()?;
            options.date_to = date_to.map(|d| parse_date_arg(&d, Bound::End)).transpose()?;
            cmd_view(require_file(file)?, number, &options, page, &config, &theme)
        }
        Commands::Search {
            query,
            content,
            sender,
            case_sensitive,
            conversation,
            limit,
            date_from,
            date_to,
            json,
        } => {
            if query.is_empty() {
                anyhow::bail!("Search query must not be empty");
            }
            let options = SearchOptions {
                query,
                search_in_content: content.unwrap_or(config.search.search_in_content),
                search_in_sender: sender.unwrap_or(config.search.search_in_sender),
                case_sensitive,
                conversation_filter: conversation,
                date_from: date_from
                    .map(|d| parse_date_arg(&d, Bound::Start))
                    .transpose()?,
                date_to: date_to.map(|d| parse_date_arg(&d, Bound::End)).transpose()?,
                limit: limit.unwrap_or(config.search.limit),
            };
            cmd_search(require_file(file)?, &options, json, &config, &theme)
        }
        Commands::Export { number, output } => {
            cmd_export(require_file(file)?, number, output.as_deref(), &config)
        }
        Commands::Convert { input, output } => cmd_convert(&input, output.as_deref(), &theme),
        Commands::Stats { json } => cmd_stats(require_file(file)?, json, &theme),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);

    let log_dir = skypeshell::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "skypeshell.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

fn require_file(file: Option<&Path>) -> anyhow::Result<&Path> {
    match file {
        Some(path) => Ok(path),
        None => anyhow::bail!("No export file given; use -f FILE or set SKYPESHELL_FILE"),
    }
}

/// Load the archive behind a byte-level progress bar.
fn load(path: &Path) -> anyhow::Result<History> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Loading [{bar:40.cyan/blue}] {bytes}/{total_bytes}")?
            .progress_chars("#>-"),
    );

    let result = archive::load_history(
        path,
        Some(&|done, total| {
            pb.set_length(total);
            pb.set_position(done);
        }),
    );
    pb.finish_and_clear();
    Ok(result?)
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "skypeshell", &mut io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    io::stdout().write_all(&buf)?;
    Ok(())
}

/// List conversations as a table or JSON.
fn cmd_list(path: &Path, show_system: bool, json: bool, theme: &Theme) -> anyhow::Result<()> {
    let history = load(path)?;

    if json {
        let items: Vec<serde_json::Value> = history
            .conversations
            .iter()
            .enumerate()
            .map(|(i, conv)| {
                serde_json::json!({
                    "number": i + 1,
                    "id": conv.id,
                    "name": conv.display_name(),
                    "participants": conv.participant_count(),
                    "messages": conv.message_count(show_system),
                    "last_message": conv.last_message_time().map(|t| t.to_rfc3339()),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    let mut out = io::stdout().lock();
    render::write_conversation_list(&mut out, &history, show_system, theme)?;
    Ok(())
}

/// Read one trimmed line from stdin after printing `prompt`. `None` on EOF.
fn prompt_line(prompt: &str) -> anyhow::Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Page through one conversation, interactively unless `--page` is given.
fn cmd_view(
    path: &Path,
    number: Option<usize>,
    options: &ViewOptions,
    page: Option<usize>,
    config: &Config,
    theme: &Theme,
) -> anyhow::Result<()> {
    let history = load(path)?;
    let date_format = config.general.date_format.as_str();

    let number = match number {
        Some(n) => n,
        None => {
            render::write_conversation_list(&mut io::stdout().lock(), &history, options.show_system, theme)?;
            println!();
            let Some(input) = prompt_line("Enter conversation number: ")? else {
                return Ok(());
            };
            input
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid conversation number: {input}"))?
        }
    };
    let conversation = history.conversation(number)?;

    if let Some(requested) = page {
        let page = paginate(conversation, options, requested);
        render::write_page(&mut io::stdout().lock(), conversation, &page, date_format, theme)?;
        return Ok(());
    }

    let mut current = 1;
    loop {
        let page = paginate(conversation, options, current);
        current = page.number;
        render::write_page(&mut io::stdout().lock(), conversation, &page, date_format, theme)?;

        let next = loop {
            let Some(input) = prompt_line(&render::navigation_hint(&page))? else {
                return Ok(());
            };
            match Navigation::parse(&input) {
                Some(nav) => break nav.apply(current),
                None => eprintln!("{}", theme.error.apply(format!("Unknown command: {input}"))),
            }
        };
        match next {
            Some(n) => current = n,
            None => return Ok(()),
        }
    }
}

/// Search all conversations and print the results.
fn cmd_search(
    path: &Path,
    options: &SearchOptions,
    json: bool,
    config: &Config,
    theme: &Theme,
) -> anyhow::Result<()> {
    let history = load(path)?;
    let engine = SearchEngine::with_config(&history, &config.search);

    let pb = ProgressBar::new(history.total_messages() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Searching [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("#>-"),
    );

    let on_progress = |p: SearchProgress| {
        pb.set_length(p.total as u64);
        pb.set_position(p.scanned as u64);
    };
    let results = engine.search(options, &CancellationToken::new(), Some(&on_progress));
    pb.finish_and_clear();
    let results = results?;

    if json {
        print_search_results_json(&results, options)?;
    } else {
        render::write_search_results(
            &mut io::stdout().lock(),
            &results,
            &config.general.date_format,
            theme,
        )?;
    }
    Ok(())
}

/// Print search results as JSON.
fn print_search_results_json(results: &[SearchResult], options: &SearchOptions) -> anyhow::Result<()> {
    let items: Vec<serde_json::Value> = results
        .iter()
        .map(|r| {
            serde_json::json!({
                "conversation": r.conversation_name,
                "sender": r.message.sender_name(),
                "from": r.message.from,
                "timestamp": r.message.timestamp,
                "message_type": r.message.message_type,
                "text": r.message.display_text(),
                "match": r.kind,
                "snippet": r.snippet.as_ref().map(|s| &s.text),
            })
        })
        .collect();

    let output = serde_json::json!({
        "query": options.query,
        "result_count": results.len(),
        "results": items,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Export one conversation as a standalone archive.
fn cmd_export(
    path: &Path,
    number: usize,
    output: Option<&Path>,
    config: &Config,
) -> anyhow::Result<()> {
    use humansize::{format_size, BINARY};

    let history = load(path)?;
    let conversation = history.conversation(number)?;

    let output = match output {
        Some(p) => p.to_path_buf(),
        None => {
            let name = json_export::default_export_name(conversation);
            match &config.export.default_output_dir {
                Some(dir) => dir.join(name),
                None => PathBuf::from(name),
            }
        }
    };

    let (written, size) = json_export::export_conversation(conversation, &history.user_id, &output)?;
    println!("Exported conversation to: {}", written.display());
    println!("  Size: {}", format_size(size, BINARY));
    Ok(())
}

/// Convert a legacy export file.
fn cmd_convert(input: &Path, output: Option<&Path>, theme: &Theme) -> anyhow::Result<()> {
    use humansize::{format_size, BINARY};

    match json_export::convert_legacy(input, output)? {
        ConvertOutcome::AlreadyCurrent => {
            println!("{}", theme.page_info.apply("File is already in the current format"));
        }
        ConvertOutcome::Converted {
            output,
            input_size,
            output_size,
        } => {
            println!(
                "{}",
                theme
                    .notice
                    .apply(format!("Converted to: {}", output.display()))
            );
            println!("  Original size: {}", format_size(input_size, BINARY));
            println!("  New size:      {}", format_size(output_size, BINARY));
            println!();
            println!("Open it with: skypeshell -f {} list", output.display());
        }
    }
    Ok(())
}

/// Show statistics for an export.
fn cmd_stats(path: &Path, json: bool, theme: &Theme) -> anyhow::Result<()> {
    let history = load(path)?;
    let json_path = archive::resolve_archive_path(path)?;
    let file_size = std::fs::metadata(&json_path)?.len();

    if json {
        print_stats_json(&json_path, file_size, &history)?;
    } else {
        print_stats_table(&json_path, file_size, &history, theme);
    }
    Ok(())
}

/// Print statistics in a human-readable table.
fn print_stats_table(path: &Path, file_size: u64, history: &History, theme: &Theme) {
    use humansize::{format_size, BINARY};

    let stats = stats::compute(history);

    println!();
    println!("{}", theme.title.apply("=== Skype History Statistics ==="));
    println!();
    println!("  {:<20} {}", "File:", path.display());
    println!("  {:<20} {}", "File size:", format_size(file_size, BINARY));
    if !history.user_id.is_empty() {
        println!("  {:<20} {}", "User:", history.user_id);
    }
    println!("  {:<20} {}", "Conversations:", stats.total_conversations);
    println!("  {:<20} {}", "Messages:", stats.total_messages);
    println!("  {:<20} {}", "Users:", stats.total_users);

    if let (Some(first), Some(last)) = (stats.first_message, stats.last_message) {
        println!(
            "  {:<20} {} to {}",
            "Date range:",
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        );
    }

    if !stats.message_types.is_empty() {
        println!();
        println!("  Message types:");
        for (kind, count) in &stats.message_types {
            println!("    {count:>6}  {kind}");
        }
    }

    let top = stats::top_senders(history, 10);
    if !top.is_empty() {
        println!();
        println!("  Top senders:");
        for (sender, count) in &top {
            println!("    {count:>6}  {}", render::truncate_str(sender, 60));
        }
    }
    println!();
}

/// Print statistics as JSON.
fn print_stats_json(path: &Path, file_size: u64, history: &History) -> anyhow::Result<()> {
    let stats = stats::compute(history);

    let date_range = stats
        .first_message
        .zip(stats.last_message)
        .map(|(first, last)| {
            serde_json::json!({
                "oldest": first.to_rfc3339(),
                "newest": last.to_rfc3339(),
            })
        });

    let top_json: Vec<serde_json::Value> = stats::top_senders(history, 10)
        .iter()
        .map(|(sender, count)| {
            serde_json::json!({
                "sender": sender,
                "count": count,
            })
        })
        .collect();

    let output = serde_json::json!({
        "file": path.to_string_lossy(),
        "file_size": file_size,
        "user_id": history.user_id,
        "total_conversations": stats.total_conversations,
        "total_messages": stats.total_messages,
        "total_users": stats.total_users,
        "date_range": date_range,
        "message_types": stats.message_types,
        "top_senders": top_json,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
