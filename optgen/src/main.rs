mod output;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use colored::control::ShouldColorize;
use log::debug;

use optgen_build::{DEFAULT_UTIL_PATH, ToolCommand, generate_accessors};
use output::{OutputFormat, render_report};

#[derive(Parser, Debug)]
#[command(name = "optgen")]
#[command(version = "0.1.0")]
#[command(
    about = "Generate with_/get_ accessors for an options struct",
    long_about = r#"Reads a Rust source file, finds the named struct and writes a companion
module next to it with:

• with_<field> / get_<field> for every field
• changed(field_name) and to_params() backed by the runtime util module

The output file is then run through rustfmt.
"#
)]
struct Cli {
    /// Name of the struct to generate accessors for
    type_name: String,

    /// Source file declaring the struct
    #[arg(long, env = "OPTGEN_FILE")]
    source_file: PathBuf,

    /// Module path from the generated module to the source module [default: super::<file stem>]
    #[arg(long, env = "OPTGEN_PACKAGE")]
    package: Option<String>,

    /// Path of the runtime module providing changed/to_params
    #[arg(long, env = "OPTGEN_UTIL", default_value = DEFAULT_UTIL_PATH)]
    util_path: String,

    /// Output file [default: <file stem>_<type name>.rs next to the source]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Formatter command line, run with the output file appended
    #[arg(long)]
    formatter: Option<String>,

    /// Import organiser command line, run after the formatter
    #[arg(long)]
    import_fixer: Option<String>,

    /// Skip the formatter and import organiser
    #[arg(long)]
    no_post_process: bool,

    /// Summary format
    #[arg(long, value_enum, default_value = "text")]
    report: OutputFormat,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if let Err(err) = execute(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn execute(cli: Cli) -> Result<()> {
    debug!("{cli:?}");

    let mut generator = generate_accessors(&cli.type_name, &cli.source_file)
        .util_path(&cli.util_path);

    if let Some(package) = &cli.package {
        generator = generator.package(package);
    }
    if let Some(output) = &cli.output {
        generator = generator.output_file(output);
    }
    if let Some(command) = &cli.formatter {
        generator = generator.formatter(parse_tool(command, "--formatter")?);
    }
    if let Some(command) = &cli.import_fixer {
        generator = generator.import_fixer(parse_tool(command, "--import-fixer")?);
    }
    generator = generator.post_process(!cli.no_post_process);

    let generated = generator
        .run()
        .with_context(|| format!("generating accessors for `{}`", cli.type_name))?;

    let use_color = ShouldColorize::from_env().should_colorize();
    println!("{}", render_report(&generated, cli.report, use_color)?);
    Ok(())
}

fn parse_tool(command: &str, flag: &str) -> Result<ToolCommand> {
    ToolCommand::parse(command).ok_or_else(|| anyhow!("{flag} must not be empty"))
}
