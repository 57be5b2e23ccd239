use clap::ArgMatches;
use colored::Colorize;
use sitemend::commands::command_argument_builder;
use sitemend::handlers::{
    handle_audit, handle_bump_version, handle_init, handle_inject, handle_remap, handle_replace,
};
use sitemend_core::print_banner;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");
    init_tracing(chosen_command.get_flag("verbose"));

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    let Some((name, primary_command)) = chosen_command.subcommand() else {
        println!(
            "Run {} to see the available commands.",
            "sitemend --help".bright_white()
        );
        return;
    };

    match dispatch(name, primary_command, quiet) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Run one subcommand and return the process exit code.
fn dispatch(name: &str, args: &ArgMatches, quiet: bool) -> anyhow::Result<i32> {
    match name {
        "audit" => {
            let report = handle_audit(args, quiet)?;
            // --check doubles as a CI gate
            let needs_attention = report.check_only
                && (report.counts().drift > 0 || report.has_unfixable());
            Ok(if needs_attention { 2 } else { 0 })
        }
        "bump-version" => handle_bump_version(args, quiet).map(|_| 0),
        "replace" => handle_replace(args, quiet).map(|_| 0),
        "remap" => handle_remap(args, quiet).map(|_| 0),
        "inject" => handle_inject(args, quiet).map(|_| 0),
        "init" => handle_init(args, quiet).map(|_| 0),
        _ => unreachable!("clap should ensure we don't get here"),
    }
}
