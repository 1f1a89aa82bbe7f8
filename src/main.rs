use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use miette::{Context, IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use prsize_core::{FileStat, OutputFormat, PrsizeConfig};
use prsize_difflens::aggregate::aggregate;
use prsize_difflens::filter::ExclusionPolicy;
use prsize_difflens::label::LabelTable;
use prsize_difflens::parser::split_unified_diff;
use prsize_difflens::report::{FailedFile, FileReport, SizeReport};
use prsize_difflens::syntax::SyntaxProvider;
use prsize_snapshot::collect::{collect_file_stats, CollectOptions, DEFAULT_JOBS};
use prsize_snapshot::source::{GitSnapshotSource, NoSnapshots, Revision, SnapshotSource};

const CONFIG_FILE: &str = ".prsize.toml";

#[derive(Parser)]
#[command(
    name = "prsize",
    version,
    about = "Size pull requests by what actually changed",
    long_about = "prsize classifies every changed line of a diff as code, blank, comment,\n\
                   import or delimiter using tree-sitter, counts the lines that matter and\n\
                   picks a size label.\n\n\
                   Examples:\n  \
                     git diff main | prsize measure --repo . --base main   Size a branch\n  \
                     prsize measure --file change.patch                    Size a patch file\n  \
                     prsize labels                                         Show the label table\n  \
                     prsize init                                           Write .prsize.toml"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .prsize.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable tables and summaries (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  Pull request comment body"
    )]
    format: OutputFormat,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Classify a diff's changed lines and pick a size label
    #[command(long_about = "Classify a diff's changed lines and pick a size label.\n\n\
        Reads a unified diff from stdin or a file. With --repo, the old version of\n\
        each file is read from --base and the new one from --head (default: the\n\
        working tree) so comments and imports can be recognised. Without --repo\n\
        every changed line other than blank ones counts as code.\n\n\
        Examples:\n  git diff | prsize measure --repo .\n  \
        git diff main...feature | prsize measure --repo . --base main --head feature\n  \
        prsize measure --file change.patch --format markdown")]
    Measure {
        /// Read diff from file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,

        /// Repository to read file contents from
        #[arg(long)]
        repo: Option<PathBuf>,

        /// Revision holding the old side of the diff
        #[arg(long, default_value = "HEAD")]
        base: String,

        /// Revision holding the new side of the diff (default: working tree)
        #[arg(long)]
        head: Option<String>,

        /// Number of files measured at once
        #[arg(long, default_value_t = DEFAULT_JOBS)]
        jobs: usize,

        /// Override the configured change target
        #[arg(long)]
        target: Option<u64>,

        /// Exit with non-zero code if the change count exceeds the target
        #[arg(long)]
        fail_over_target: bool,

        /// A label already on the pull request (repeatable); prints the label update
        #[arg(long = "current-label")]
        current_labels: Vec<String>,

        /// Print the label update even when no current labels are given
        #[arg(long)]
        plan_labels: bool,
    },
    /// Show the validated label table
    Labels,
    /// Create a default .prsize.toml configuration file
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!("prsize v{version}: size pull requests by what actually changed\n");

    println!("Quick start:");
    println!("  prsize init                         Create a .prsize.toml config file");
    println!("  git diff | prsize measure --repo .  Size your uncommitted changes\n");

    println!("All commands:");
    println!("  measure   Classify changed lines and pick a size label");
    println!("  labels    Show the label table");
    println!("  init      Create default configuration\n");

    println!("Run 'prsize <command> --help' for details.");
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(path: &Option<PathBuf>) -> Result<PrsizeConfig> {
    match path {
        Some(path) => Ok(PrsizeConfig::from_file(path)
            .wrap_err(format!("loading {}", path.display()))?),
        None => {
            let default_path = Path::new(CONFIG_FILE);
            if default_path.exists() {
                Ok(PrsizeConfig::from_file(default_path).wrap_err(format!("loading {CONFIG_FILE}"))?)
            } else {
                Ok(PrsizeConfig::default())
            }
        }
    }
}

fn read_diff_input(file: &Option<PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err(format!("reading {}", path.display())),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .into_diagnostic()
                .wrap_err("reading stdin")?;
            Ok(input)
        }
    }
}

fn snapshot_source(
    repo: &Option<PathBuf>,
    options: &CollectOptions,
) -> Result<Arc<dyn SnapshotSource>> {
    match repo {
        Some(path) => {
            let source = GitSnapshotSource::discover(path)?;
            source.verify(&options.base)?;
            source.verify(&options.head)?;
            tracing::debug!(base = %options.base, head = %options.head, "reading snapshots from git");
            Ok(Arc::new(source))
        }
        None => {
            tracing::debug!("no repository given, changed lines will not be parsed");
            Ok(Arc::new(NoSnapshots))
        }
    }
}

fn labels_markdown(labels: &LabelTable) -> String {
    let mut out = String::from("| Label | Max changes |\n|-------|-------------|\n");
    for label in labels.labels() {
        let max = label
            .max_changes
            .map_or_else(|| "-".to_string(), |m| m.to_string());
        out.push_str(&format!("| {} | {} |\n", label.name, max));
    }
    out
}

const DEFAULT_CONFIG: &str = r#"# prsize configuration

# Changes a pull request should stay under; mentioned in markdown output.
target = 256

[exclude]
# Files matching these globs are not measured.
files = [
    "**/*.yml",
    "**/*.yaml",
    "**/*.json",
    "**/*.md",
    "**/*.lock",
    "**/*.test.ts",
    "**/*.fixtures.ts",
]

[exclude.lines]
# Line classes that do not count as changes.
blank = true
comments = true
imports = true
delimiters = false

[classify]
# Give lines holding only `;`, `,`, `)`, `}` or `]` their own class.
delimiters = false

# Labels are sorted by max_changes; exactly one omits it.
[[labels]]
name = "Extra Small"
max_changes = 16

[[labels]]
name = "Small"
max_changes = 64

[[labels]]
name = "Medium"
max_changes = 256

[[labels]]
name = "Large"
max_changes = 512

[[labels]]
name = "Extra Large"
"#;

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        None => print_welcome(),
        Some(Command::Measure {
            ref file,
            ref repo,
            ref base,
            ref head,
            jobs,
            target,
            fail_over_target,
            ref current_labels,
            plan_labels,
        }) => {
            let config = load_config(&cli.config)?;
            let labels = LabelTable::new(config.labels.clone())?;
            let policy = ExclusionPolicy::from_config(&config.exclude)?;

            let options = CollectOptions {
                base: Revision::Commit(base.clone()),
                head: Revision::from_arg(head.as_deref()),
                jobs,
                classify: config.classify.into(),
            };
            let source = snapshot_source(repo, &options)?;

            let input = read_diff_input(file)?;
            let filtered = policy.filter(split_unified_diff(&input)?);
            tracing::debug!(
                measured = filtered.kept.len(),
                excluded = filtered.skipped.len(),
                "diff split"
            );

            let outcomes = collect_file_stats(
                source,
                Arc::new(SyntaxProvider::new()),
                filtered.kept,
                options,
            )
            .await?;

            let mut stats: Vec<FileStat> = Vec::with_capacity(outcomes.len());
            let mut files = Vec::with_capacity(outcomes.len());
            let mut failed = Vec::new();
            for outcome in outcomes {
                match outcome.result {
                    Ok(stat) => {
                        stats.push(stat);
                        files.push(FileReport {
                            path: outcome.path,
                            stat,
                        });
                    }
                    Err(e) => failed.push(FailedFile {
                        path: outcome.path,
                        error: e.to_string(),
                    }),
                }
            }

            let result = aggregate(&stats, &policy, &labels);
            let label_plan = (plan_labels || !current_labels.is_empty())
                .then(|| labels.plan_update(current_labels, &result.label));

            let mut report = SizeReport::new(result);
            report.files = files;
            report.skipped = filtered.skipped;
            report.failed = failed;
            report.target = target.or(config.target);
            report.label_plan = label_plan;

            match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&report).into_diagnostic()?
                    );
                }
                OutputFormat::Markdown => print!("{}", report.to_markdown()),
                OutputFormat::Text => print!("{report}"),
            }

            if fail_over_target {
                match report.within_target() {
                    Some(false) => {
                        std::io::stdout().flush().into_diagnostic()?;
                        std::process::exit(1);
                    }
                    Some(true) => {}
                    None => tracing::warn!("--fail-over-target given but no target is configured"),
                }
            }
        }
        Some(Command::Labels) => {
            let config = load_config(&cli.config)?;
            let labels = LabelTable::new(config.labels)?;
            match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(labels.labels()).into_diagnostic()?
                    );
                }
                OutputFormat::Markdown => print!("{}", labels_markdown(&labels)),
                OutputFormat::Text => print!("{labels}"),
            }
        }
        Some(Command::Init) => {
            let path = Path::new(CONFIG_FILE);
            if path.exists() {
                miette::bail!("{CONFIG_FILE} already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {CONFIG_FILE} with default configuration");
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "prsize", &mut std::io::stdout());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses_and_validates() {
        let config = PrsizeConfig::from_toml(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.target, Some(256));
        assert_eq!(config.exclude.files.len(), 7);
        assert!(config.exclude.lines.comments);
        assert!(!config.exclude.lines.delimiters);
        assert_eq!(config.labels, PrsizeConfig::default_labels());
        LabelTable::new(config.labels).unwrap();
        ExclusionPolicy::from_config(&config.exclude).unwrap();
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn markdown_label_table() {
        let labels = LabelTable::new(PrsizeConfig::default_labels()).unwrap();
        let md = labels_markdown(&labels);
        assert!(md.contains("| Small | 64 |"));
        assert!(md.contains("| Extra Large | - |"));
    }
}
