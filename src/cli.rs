use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::get_version;

#[derive(Parser, Debug)]
#[command(name = "hdfs-stream", rename_all = "kebab-case", version = get_version())]
pub struct Opts {
    #[command(flatten)]
    pub root: RootOpts,

    #[command(subcommand)]
    pub sub_command: SubCommand,
}

impl Opts {
    pub fn get_matches() -> Self {
        Opts::parse()
    }

    pub const fn log_level(&self) -> &'static str {
        // `generate` prints to stdout; keep it quiet unless asked.
        let (quiet_level, verbose_level) = match self.sub_command {
            SubCommand::Generate(_) => {
                if self.root.verbose == 0 {
                    (self.root.quiet + 1, self.root.verbose)
                } else {
                    (self.root.quiet, self.root.verbose - 1)
                }
            }
            _ => (self.root.quiet, self.root.verbose),
        };
        match quiet_level {
            0 => match verbose_level {
                0 => "info",
                1 => "debug",
                2..=255 => "trace",
            },
            1 => "warn",
            2 => "error",
            3..=255 => "off",
        }
    }
}

#[derive(Args, Debug)]
#[command(rename_all = "kebab-case")]
pub struct RootOpts {
    /// Enable more detailed internal logging. Repeat to increase level. Overridden by `--quiet`.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce detail of internal logging. Repeat to reduce further. Overrides `--verbose`.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Set the logging format.
    #[arg(long, default_value = "text", env = "HDFS_STREAM_LOG_FORMAT", global = true)]
    pub log_format: LogFormat,

    /// Control when ANSI terminal formatting is used.
    ///
    /// By default, formatting is used when stderr is a terminal.
    #[arg(long, default_value = "auto", env = "HDFS_STREAM_COLOR", global = true)]
    pub color: Color,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
pub enum SubCommand {
    /// Stream raw samples from a file or stdin into an HDFS file.
    Sink(SinkOpts),

    /// Stream an HDFS file as raw samples to a file or stdout.
    Source(SourceOpts),

    /// Print a default configuration for a block, then exit.
    Generate(GenerateOpts),
}

#[derive(Args, Debug)]
#[command(rename_all = "kebab-case")]
pub struct SinkOpts {
    /// Sink configuration file (TOML).
    #[arg(short, long, env = "HDFS_STREAM_CONFIG")]
    pub config: PathBuf,

    /// Host-order sample data to upload. Reads stdin when omitted.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Samples handed to the sink per work call.
    #[arg(long, default_value_t = crate::topology::DEFAULT_CHUNK_ITEMS)]
    pub chunk_items: usize,
}

#[derive(Args, Debug)]
#[command(rename_all = "kebab-case")]
pub struct SourceOpts {
    /// Source configuration file (TOML).
    #[arg(short, long, env = "HDFS_STREAM_CONFIG")]
    pub config: PathBuf,

    /// Where to write the samples. Writes stdout when omitted.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Sample slots offered to the source per work call.
    #[arg(long, default_value_t = crate::topology::DEFAULT_CHUNK_ITEMS)]
    pub chunk_items: usize,
}

#[derive(Args, Debug)]
pub struct GenerateOpts {
    /// Which block to generate a configuration for.
    #[arg(value_enum)]
    pub block: BlockKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BlockKind {
    Sink,
    Source,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Color {
    Auto,
    Always,
    Never,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}
