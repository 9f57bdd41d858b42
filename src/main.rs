// ==========================================
// Kamayan 配置层 - 命令行入口
// ==========================================
// 用法: kamayan <problem.json> [--info] [--dry-run] [--engine PATH]
//       [--input-file PATH] [--dump-json] [-- overrides...]
// ==========================================

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use kamayan_config::backend::{CommandBackend, NullBackend, SimulationBackend};
use kamayan_config::config::RunConfig;
use kamayan_config::logging;
use kamayan_config::manager::Manager;
use kamayan_config::problem::ProblemSpec;

#[derive(Parser, Debug)]
#[command(name = "kamayan")]
#[command(version, about = "Build a simulation input file from a problem description and run it")]
struct Args {
    /// Problem description (JSON)
    problem: PathBuf,

    /// Print the run summary and configuration tree, then exit
    #[arg(long, conflicts_with_all = ["dry_run", "dump_json"])]
    info: bool,

    /// Flush and write the input file, but do not execute
    #[arg(long)]
    dry_run: bool,

    /// Simulation engine executable
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Where to write the input file (default: .<name>.in)
    #[arg(long)]
    input_file: Option<PathBuf>,

    /// Print the merged parameter blocks as JSON
    #[arg(long)]
    dump_json: bool,

    /// Overrides forwarded verbatim to the engine (block/key=value)
    #[arg(last = true)]
    overrides: Vec<String>,
}

fn main() {
    logging::init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        error!(error = %format!("{:#}", e), "运行失败");
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let spec = ProblemSpec::from_file(&args.problem)
        .with_context(|| format!("无法加载问题描述 {}", args.problem.display()))?;

    let mut config = RunConfig::from_env(&spec.name);
    if let Some(path) = &args.input_file {
        config = config.with_input_file(path);
    }

    let backend: Box<dyn SimulationBackend> = match &args.engine {
        Some(program) => Box::new(CommandBackend::new(program)),
        None => Box::new(NullBackend),
    };
    if args.engine.is_none() && !args.dry_run && !args.info {
        info!("未指定 --engine，只生成输入文件");
    }

    let mut manager = Manager::new(config, spec.units(), backend)?;
    spec.configure(&mut manager)?;

    if args.info {
        println!("{}", manager.info()?);
        return Ok(());
    }

    if args.dry_run || args.engine.is_none() {
        if let Some(path) = manager.dry_run()? {
            info!(path = %path.display(), "dry run 完成");
        }
    } else {
        let status = manager.execute(&args.overrides)?;
        info!(status = %status, "模拟结束");
    }

    if args.dump_json {
        println!("{}", serde_json::to_string_pretty(&manager.snapshot())?);
    }
    Ok(())
}
