//! Loopspec CLI
//!
//! # Usage
//!
//! ```bash
//! # Plan one loop (by index or "function::header")
//! loopspec plan --program prog.json --profile prof.json --loop 'main::for.body'
//!
//! # Select loops across the whole program
//! loopspec select --program prog.json --profile prof.json --config planner.yaml
//!
//! # Print a preset as a YAML v1 config
//! loopspec config --preset thorough
//! ```
//!
//! Reports go to stdout as JSON, logs to stderr (`RUST_LOG=debug`).

use anyhow::{anyhow, bail, Context};
use clap::{Args, Parser, Subcommand};
use loopspec_core::config::{PlannerConfig, Preset, ValidatedConfig};
use loopspec_core::features::orchestration::{LoopPlanner, Orchestrator};
use loopspec_core::features::selection::LoopSelector;
use loopspec_core::shared::models::{
    ExecutionProfile, HeapAssignment, LoopId, Program, ProgramContext,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "loopspec")]
#[command(about = "Speculative loop parallelization planner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Inputs {
    /// Program JSON
    #[arg(short, long)]
    program: PathBuf,

    /// Execution profile JSON
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Heap assignment JSON
    #[arg(long)]
    heap: Option<PathBuf>,

    /// YAML v1 planner config (overrides --preset)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// fast | balanced | thorough | custom
    #[arg(long, default_value = "balanced")]
    preset: String,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan one loop
    Plan {
        #[command(flatten)]
        inputs: Inputs,

        /// Loop index or "function::header"
        #[arg(short = 'l', long = "loop")]
        loop_ref: String,
    },

    /// Select the loops to parallelize
    Select {
        #[command(flatten)]
        inputs: Inputs,
    },

    /// Print a preset as YAML
    Config {
        #[arg(long, default_value = "balanced")]
        preset: String,
    },
}

/// Loaded inputs, owned for the duration of one command
struct Loaded {
    program: Program,
    profile: ExecutionProfile,
    heap: HeapAssignment,
    config: ValidatedConfig,
}

impl Loaded {
    fn context(&self) -> ProgramContext<'_> {
        ProgramContext::new(&self.program, &self.profile, &self.heap)
    }
}

fn parse_preset(name: &str) -> anyhow::Result<Preset> {
    Preset::from_str(name).map_err(|e| anyhow!(e))
}

fn load(inputs: &Inputs) -> anyhow::Result<Loaded> {
    let program = Program::from_json_file(&inputs.program)
        .with_context(|| format!("loading program {}", inputs.program.display()))?;
    let profile = match &inputs.profile {
        Some(path) => {
            let profile = ExecutionProfile::from_json_file(path)
                .with_context(|| format!("loading profile {}", path.display()))?;
            profile.validate_against(&program)?;
            profile
        }
        None => ExecutionProfile::default(),
    };
    let heap = match &inputs.heap {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading heap assignment {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing heap assignment {}", path.display()))?
        }
        None => HeapAssignment::new(),
    };
    let config = match &inputs.config {
        Some(path) => PlannerConfig::from_yaml(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PlannerConfig::preset(parse_preset(&inputs.preset)?).build()?,
    };
    Ok(Loaded {
        program,
        profile,
        heap,
        config,
    })
}

fn resolve_loop(program: &Program, loop_ref: &str) -> anyhow::Result<LoopId> {
    if let Ok(index) = loop_ref.parse::<u32>() {
        if (index as usize) < program.loops().len() {
            return Ok(LoopId(index));
        }
        bail!("loop index {} out of range ({} loops)", index, program.loops().len());
    }
    program
        .loops()
        .iter()
        .map(|l| l.id)
        .find(|id| program.loop_name(*id) == loop_ref)
        .ok_or_else(|| anyhow!("no loop named {}", loop_ref))
}

fn emit<T: Serialize>(value: &T, output: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("writing report {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Plan { inputs, loop_ref } => {
            let loaded = load(&inputs)?;
            let loop_id = resolve_loop(&loaded.program, &loop_ref)?;
            let report =
                Orchestrator::new(loaded.config.clone()).plan_loop(loaded.context(), loop_id)?;
            emit(&report, inputs.output.as_deref())?;
        }
        Commands::Select { inputs } => {
            let loaded = load(&inputs)?;
            let selection = LoopSelector::new(loaded.config.clone()).select(loaded.context())?;
            emit(&selection, inputs.output.as_deref())?;
        }
        Commands::Config { preset } => {
            let config = PlannerConfig::preset(parse_preset(&preset)?);
            print!("{}", config.to_yaml()?);
        }
    }
    Ok(())
}
