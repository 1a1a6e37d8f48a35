use botflow::config::{AppConfig, load_config};
use botflow::prelude::*;
use botflow::runtime::VariableTiers;
use botflow::ui::load_project;
use clap::{Args, Parser, Subcommand};
use log::{LevelFilter, debug, info};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

/// Compiles bot builder projects into runnable aiogram programs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Path to a botflow.toml configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate and compile a project, writing the program and its derived files
    Compile(CompileArgs),
    /// Validate a project without generating code
    Validate {
        /// Path to the editor's project JSON
        project: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Render one node's text for a given set of variables
    Preview {
        /// Path to the editor's project JSON
        project: PathBuf,
        /// Id of the node to render
        node_id: String,
        /// Local variable, `name=value`; wins over durable values
        #[arg(long = "var", value_parser = parse_assignment)]
        vars: Vec<(String, String)>,
        /// Durable-store variable, `name=value`
        #[arg(long = "durable", value_parser = parse_assignment)]
        durable: Vec<(String, String)>,
    },
}

#[derive(Args, Debug)]
struct CompileArgs {
    /// Path to the editor's project JSON
    project: PathBuf,
    /// Output directory for bot.py and the derived files
    #[arg(short, long, default_value = "bot")]
    output: PathBuf,
    /// Enable the PostgreSQL persistence layer
    #[arg(long)]
    persistence: bool,
    /// Annotate the program with structural comments
    #[arg(long)]
    comments: bool,
    /// Display name for the program header and README
    #[arg(long)]
    name: Option<String>,
    /// Print `{ "code": ... }` to stdout instead of writing files
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();

    let log_level = LevelFilter::from_str(&cli.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using 'warn' instead.", cli.log_level);
        LevelFilter::Warn
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();
    debug!(cli:?; "Parsed arguments");

    let config = load_config(cli.config.as_deref())
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load configuration: {}", e)));

    match cli.command {
        Command::Compile(args) => run_compile(args, config),
        Command::Validate { project, json } => run_validate(&project, json, config),
        Command::Preview {
            project,
            node_id,
            vars,
            durable,
        } => run_preview(&project, &node_id, vars, durable),
    }
}

fn run_compile(args: CompileArgs, config: AppConfig) {
    let total_start = Instant::now();
    let project = read_project(&args.project);

    // Command-line switches only ever turn features on.
    let mut settings = config.project;
    settings.persistence_enabled |= args.persistence;
    settings.comments_enabled |= args.comments;

    let mut builder = Compiler::builder(project, settings);
    if let Some(name) = args.name.or(config.display_name) {
        builder = builder.with_display_name(name);
    }
    let compiler = builder.build();
    let flags = compiler.feature_flags();

    let compile_start = Instant::now();
    let artifact = match compiler.compile() {
        Ok(artifact) => artifact,
        Err(CompileError::Validation(report)) => {
            if args.json {
                print_json(&report);
            } else {
                eprintln!("{}", ReportFormatter::format_report(&report));
            }
            std::process::exit(1);
        }
        Err(e) => exit_with_error(&format!("Compilation failed: {}", e)),
    };
    let compile_duration = compile_start.elapsed();

    if args.json {
        let json = artifact
            .to_json()
            .unwrap_or_else(|e| exit_with_error(&e.to_string()));
        println!("{}", json);
        return;
    }

    artifact
        .save(&args.output)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));

    println!("{}", ReportFormatter::format_summary(&artifact, &flags));
    println!("Written to '{}'", args.output.display());
    info!(compile:? = compile_duration, total:? = total_start.elapsed(); "Done");
}

fn run_validate(path: &Path, json: bool, config: AppConfig) {
    let project = read_project(path);
    let report = Compiler::builder(project, config.project).build().validate();
    if json {
        print_json(&report);
    } else {
        println!("{}", ReportFormatter::format_report(&report));
    }
    if !report.valid {
        std::process::exit(1);
    }
}

fn run_preview(
    path: &Path,
    node_id: &str,
    vars: Vec<(String, String)>,
    durable: Vec<(String, String)>,
) {
    let project = read_project(path);
    let matches: Vec<&Node> = project
        .nodes()
        .filter(|(_, node)| node.id == node_id)
        .map(|(_, node)| node)
        .collect();
    let node = match matches.as_slice() {
        [node] => node,
        [] => exit_with_error(&format!("No node with id '{}'", node_id)),
        many => exit_with_error(&format!(
            "Node id '{}' exists on {} sheets",
            node_id,
            many.len()
        )),
    };

    let tiers = VariableTiers {
        durable: durable.into_iter().map(|(k, v)| (k, Value::String(v))).collect(),
        local: vars.into_iter().map(|(k, v)| (k, Value::String(v))).collect(),
    };
    println!("{}", tiers.render(&node.kind.message().text));
}

fn read_project(path: &Path) -> Project {
    let json = fs::read_to_string(path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read project file '{}': {}",
            path.display(),
            e
        ))
    });
    load_project(&json).unwrap_or_else(|e| exit_with_error(&e.to_string()))
}

fn print_json(report: &ValidationReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{}", json),
        Err(e) => exit_with_error(&format!("Failed to serialize report: {}", e)),
    }
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
