//! Command-line front end standing in for the editor host.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::app::command::{ActiveFileSource, ClipboardSink, CommandHandler};
use crate::app::selection::LineIndex;
use crate::domain::errors::{LinkError, LinkResult};
use crate::domain::model::{ActiveDocument, Caret, SelectionSpan};
use crate::infra::clipboard::SystemClipboard;
use crate::infra::config::Config;
use crate::infra::notify::TerminalNotifier;

#[derive(Parser, Debug)]
#[command(
    name = "repolink",
    author,
    version,
    about = "Copy a GitHub or Azure DevOps link to a line of a file",
    long_about = None
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a link to a file position and copy it to the clipboard
    Link(LinkArgs),
    /// Print the effective configuration
    Config,
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
pub struct LinkArgs {
    /// File the link should point at
    pub file: Option<PathBuf>,

    /// 1-based caret line
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub line: u64,

    /// 1-based caret column; links only report columns for selections
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub column: u64,

    /// Selected range as START_LINE:START_COL-END_LINE:END_COL (1-based)
    #[arg(short, long, conflicts_with = "offsets")]
    pub selection: Option<LineRange>,

    /// Selected range as character offsets START..END
    #[arg(long)]
    pub offsets: Option<OffsetRange>,

    /// Print the link without copying it
    #[arg(long)]
    pub no_copy: bool,

    /// Print a JSON description of the link instead of the bare URL
    #[arg(long)]
    pub json: bool,
}

/// 1-based `line:column` position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineColumn {
    pub line: usize,
    pub column: usize,
}

impl FromStr for LineColumn {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (line, column) = value.split_once(':').unwrap_or((value, "1"));
        let line = parse_positive(line, "line")?;
        let column = parse_positive(column, "column")?;
        Ok(Self { line, column })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: LineColumn,
    pub end: LineColumn,
}

impl FromStr for LineRange {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (start, end) = value
            .split_once('-')
            .ok_or_else(|| format!("expected START-END, got `{value}`"))?;
        Ok(Self {
            start: start.trim().parse()?,
            end: end.trim().parse()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetRange {
    pub start: usize,
    pub end: usize,
}

impl FromStr for OffsetRange {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (start, end) = value
            .split_once("..")
            .ok_or_else(|| format!("expected START..END, got `{value}`"))?;
        let parse = |raw: &str| {
            raw.trim()
                .parse::<usize>()
                .map_err(|err| format!("invalid offset `{raw}`: {err}"))
        };
        Ok(Self {
            start: parse(start)?,
            end: parse(end)?,
        })
    }
}

fn parse_positive(raw: &str, what: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(format!("{what} numbers start at 1")),
        Ok(value) => Ok(value),
        Err(err) => Err(format!("invalid {what} `{raw}`: {err}")),
    }
}

impl LinkArgs {
    fn caret(&self) -> Caret {
        Caret {
            line: to_index(self.line),
            column: to_index(self.column),
        }
    }

    /// Directory whose repository supplies the workspace configuration layer.
    fn config_directory(&self) -> Option<PathBuf> {
        let path = std::path::absolute(self.file.as_deref()?).ok()?;
        path.parent().map(Path::to_path_buf)
    }
}

/// Caret sitting at `offset`, used when a selection has zero width.
fn caret_at(index: &LineIndex, offset: usize) -> Caret {
    let (line, line_start) = index.locate(offset);
    Caret {
        line,
        column: offset.saturating_sub(line_start),
    }
}

fn to_index(one_based: u64) -> usize {
    usize::try_from(one_based.saturating_sub(1)).unwrap_or(usize::MAX)
}

impl ActiveFileSource for LinkArgs {
    fn active_document(&self) -> LinkResult<Option<ActiveDocument>> {
        let Some(file) = &self.file else {
            return Ok(None);
        };
        let read_error = |source: io::Error| LinkError::ReadDocument {
            path: file.clone(),
            source,
        };

        let path = std::path::absolute(file).map_err(read_error)?;
        fs::metadata(&path).map_err(read_error)?;

        let (text, index, span) = match (self.selection, self.offsets) {
            (None, None) => {
                return Ok(Some(ActiveDocument {
                    path,
                    caret: self.caret(),
                    selection: None,
                    text: None,
                }));
            }
            (Some(range), _) => {
                let text = fs::read_to_string(&path).map_err(read_error)?;
                let index = LineIndex::new(&text);
                let span = SelectionSpan {
                    start: index.offset_of(range.start.line, range.start.column),
                    end: index.offset_of(range.end.line, range.end.column),
                };
                (text, index, span)
            }
            (None, Some(offsets)) => {
                let text = fs::read_to_string(&path).map_err(read_error)?;
                let index = LineIndex::new(&text);
                let span = SelectionSpan {
                    start: offsets.start,
                    end: offsets.end,
                };
                (text, index, span)
            }
        };

        // An empty selection marks the caret position.
        let caret = if span.is_empty() {
            caret_at(&index, span.start)
        } else {
            self.caret()
        };

        Ok(Some(ActiveDocument {
            path,
            caret,
            selection: Some(span),
            text: Some(text),
        }))
    }
}

/// Dispatch a parsed command line.
pub fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Link(args) => run_link(&args),
        Commands::Config => {
            let config = Config::load()?;
            print!("{}", config.to_toml()?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "repolink", &mut io::stdout());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_link(args: &LinkArgs) -> Result<ExitCode> {
    let config = match args.config_directory() {
        Some(directory) => Config::load_for(&directory),
        None => Config::load(),
    }
    .context("failed to load configuration")?;
    let handler = CommandHandler::from_config(&config);
    let copy = config.output.copy_to_clipboard() && !args.no_copy;

    let mut clipboard = SystemClipboard::new();
    let mut notifier = TerminalNotifier::stderr();
    let sink: Option<&mut dyn ClipboardSink> = if copy { Some(&mut clipboard) } else { None };

    match handler.execute(args, sink, &mut notifier) {
        Ok(link) => {
            if args.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&link).context("failed to serialize link")?
                );
            } else {
                println!("{}", link.url);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(_) => Ok(ExitCode::FAILURE),
    }
}
