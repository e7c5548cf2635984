use std::{
    fs::File,
    io::{self, BufReader, BufWriter, IsTerminal},
    path::Path,
};

use exitcode::ExitCode;

use crate::{
    cli::{BlockKind, Color, GenerateOpts, LogFormat, Opts, SinkOpts, SourceOpts, SubCommand},
    config::{self, ConfigError, GenerateConfig},
    get_version,
    shutdown::ShutdownSignal,
    sinks::webhdfs::WebHdfsSinkConfig,
    sources::webhdfs::WebHdfsSourceConfig,
    topology::{self, RunError},
    trace,
};

/// Parses the command line, sets up logging and runs the chosen command.
pub fn run() -> ExitCode {
    run_with_opts(Opts::get_matches())
}

pub fn run_with_opts(opts: Opts) -> ExitCode {
    let color = match opts.root.color {
        Color::Auto => io::stderr().is_terminal(),
        Color::Always => true,
        Color::Never => false,
    };
    let json = opts.root.log_format == LogFormat::Json;
    let level = match opts.log_level() {
        "off" => "off".to_owned(),
        level => format!("hdfs_stream={},sample_codecs={}", level, level),
    };
    trace::init(color, json, &level);

    match &opts.sub_command {
        SubCommand::Generate(generate) => generate_cmd(generate),
        SubCommand::Sink(sink) => sink_cmd(sink),
        SubCommand::Source(source) => source_cmd(source),
    }
}

fn generate_cmd(opts: &GenerateOpts) -> ExitCode {
    let generated = match opts.block {
        BlockKind::Sink => WebHdfsSinkConfig::generate_config(),
        BlockKind::Source => WebHdfsSourceConfig::generate_config(),
    };
    match generated.map(|value| value.to_string()) {
        Ok(rendered) => {
            #[allow(clippy::print_stdout)]
            {
                print!("{}", rendered);
            }
            exitcode::OK
        }
        Err(error) => {
            error!(message = "Failed to render configuration.", %error);
            exitcode::SOFTWARE
        }
    }
}

fn sink_cmd(opts: &SinkOpts) -> ExitCode {
    let config: WebHdfsSinkConfig = match config::load_from_path(&opts.config) {
        Ok(config) => config,
        Err(error) => return handle_config_error(&error),
    };
    let mut sink = match config.build(ShutdownSignal::new()) {
        Ok(sink) => sink,
        Err(error) => return handle_config_error(&error),
    };
    info!(
        message = "Starting sink.",
        version = get_version(),
        folder = %config.folder,
        file = %config.file,
        mode = ?config.mode,
    );

    let result = match &opts.input {
        Some(path) => match open_input(path) {
            Ok(input) => topology::run_sink(&mut sink, BufReader::new(input), opts.chunk_items),
            Err(code) => return code,
        },
        None => topology::run_sink(&mut sink, io::stdin().lock(), opts.chunk_items),
    };
    handle_run_result(result.map(drop))
}

fn source_cmd(opts: &SourceOpts) -> ExitCode {
    let config: WebHdfsSourceConfig = match config::load_from_path(&opts.config) {
        Ok(config) => config,
        Err(error) => return handle_config_error(&error),
    };
    let mut source = match config.build(ShutdownSignal::new()) {
        Ok(source) => source,
        Err(error) => return handle_config_error(&error),
    };
    info!(
        message = "Starting source.",
        version = get_version(),
        folder = %config.folder,
        file = %config.file,
    );

    let result = match &opts.output {
        Some(path) => match File::create(path) {
            Ok(output) => {
                topology::run_source(&mut source, BufWriter::new(output), opts.chunk_items)
            }
            Err(error) => {
                error!(message = "Could not create output file.", path = %path.display(), %error);
                return exitcode::CANTCREAT;
            }
        },
        None => topology::run_source(&mut source, io::stdout().lock(), opts.chunk_items),
    };
    handle_run_result(result.map(drop))
}

fn open_input(path: &Path) -> Result<File, ExitCode> {
    File::open(path).map_err(|error| {
        error!(message = "Could not open input file.", path = %path.display(), %error);
        exitcode::NOINPUT
    })
}

fn handle_config_error(error: &ConfigError) -> ExitCode {
    error!(message = "Configuration error.", %error);
    exitcode::CONFIG
}

fn handle_run_result(result: Result<(), RunError>) -> ExitCode {
    match result {
        Ok(()) => exitcode::OK,
        Err(error) => {
            error!(message = "Stream failed.", %error);
            match error {
                RunError::ReadInput { .. } => exitcode::IOERR,
                RunError::WriteOutput { .. } => exitcode::IOERR,
                RunError::Codec { .. } => exitcode::DATAERR,
                RunError::Stream { .. } => exitcode::SOFTWARE,
            }
        }
    }
}
