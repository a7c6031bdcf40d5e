//! `relalg` CLI entry point.

mod cli;

use std::path::Path;

use clap::Parser;
use cli::{Cli, Command};
use plan_ir::print_op;
use relalg::session;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = match session::standard_context() {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let result: Result<String, Box<dyn std::error::Error>> = match cli.command {
        Command::Print { file } => {
            read_source(&file).and_then(|text| session::reprint(&ctx, &text).map_err(Into::into))
        }
        Command::Check { file } => read_source(&file).and_then(|text| {
            let report = session::check(&ctx, &text)?;
            Ok(format!(
                "{}: ok ({} ops, root {})\n",
                file.display(),
                report.ops,
                report.root
            ))
        }),
        Command::Demo => session::demo_plan(&ctx)
            .map(|op| print_op(&op))
            .map_err(Into::into),
    };

    match result {
        Ok(out) => print!("{out}"),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

/// `RUST_LOG` wins; otherwise `--verbose` selects debug output.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_source(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()).into())
}
