// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, bail};
use config::Config;
use fieldcost_app::{AppCommand, AppState, CostSheet};
use fieldcost_testkit::FarmFaker;
use fieldcost_tui::UiOptions;
use runtime::SheetRuntime;
use std::env;
use std::fmt;
use std::path::PathBuf;
use tracing::info;

const DEMO_SEED: u64 = 2026;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `fieldcost --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let source = resolve_sheet_source(&options, &config)?;
    let sheet = source.load()?;
    if options.check_only {
        return Ok(());
    }

    let log_path = logging::init(&config)?;
    info!(
        sheet = %source,
        operations = sheet.operation_count(),
        locked = sheet.locked,
        log = %log_path.display(),
        "starting fieldcost"
    );

    let mut state = initial_state(&config, &sheet);
    let mut runtime = SheetRuntime::new(sheet);
    let options = UiOptions {
        money: config.money_format(),
        allow_delete: config.allow_delete(),
    };
    fieldcost_tui::run_app(&mut state, &mut runtime, options)
}

fn initial_state(config: &Config, sheet: &CostSheet) -> AppState {
    let mut state = AppState {
        read_only: sheet.locked,
        ..AppState::default()
    };
    if config.start_in_edit_mode() && !sheet.locked {
        state.dispatch(AppCommand::EnterEditMode);
    }
    state
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SheetSource {
    Demo { seed: u64 },
    File(PathBuf),
}

impl SheetSource {
    fn load(&self) -> Result<CostSheet> {
        match self {
            Self::Demo { seed } => FarmFaker::new(*seed).sheet(),
            Self::File(path) => runtime::load_sheet_file(path),
        }
    }
}

impl fmt::Display for SheetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Demo { seed } => write!(f, "demo (seed {seed})"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

fn resolve_sheet_source(options: &CliOptions, config: &Config) -> Result<SheetSource> {
    if options.demo {
        return Ok(SheetSource::Demo { seed: DEMO_SEED });
    }
    if let Some(path) = &options.sheet_path {
        return Ok(SheetSource::File(path.clone()));
    }
    if let Some(path) = config.sheet_path() {
        return Ok(SheetSource::File(path));
    }
    bail!(
        "no cost sheet to open; pass --sheet <path>, set [sheet].path in {}, or try --demo",
        options.config_path.display()
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    sheet_path: Option<PathBuf>,
    print_config_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        sheet_path: None,
        print_config_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--sheet" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--sheet requires a file path"))?;
                options.sheet_path = Some(PathBuf::from(value.as_ref()));
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("fieldcost: per-field operation costs");
    println!("  --config <path>          Use a specific config path");
    println!("  --sheet <path>           Open this cost sheet (TOML)");
    println!("  --demo                   Open a generated demo sheet");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --check                  Validate config and sheet, then exit");
    println!("  --help                   Show this help");
}
