use crate::CLAP_STYLING;
use clap::{Arg, arg, command};
use std::path::PathBuf;

fn config_arg() -> Arg {
    arg!(-c --"config" <PATH>)
        .required(false)
        .help("Path to a sitemend.toml (default: <root>/sitemend.toml when present)")
        .value_parser(clap::value_parser!(PathBuf))
}

fn root_arg() -> Arg {
    arg!(-r --"root" <DIR>)
        .required(false)
        .help("Site root directory (overrides the config file)")
        .value_parser(clap::value_parser!(PathBuf))
}

fn dry_run_arg() -> Arg {
    arg!(--"dry-run")
        .required(false)
        .help("Report which files would change without writing them")
        .action(clap::ArgAction::SetTrue)
}

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("sitemend")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sitemend")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(arg!(-v --"verbose" "Log progress to stderr (RUST_LOG takes precedence)").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("audit")
                .about(
                    "Reconcile every page's canonical URL with its sitemap entry, fixing \
                mismatches in place.",
                )
                .arg(config_arg())
                .arg(root_arg())
                .arg(
                    arg!(--"origin" <URL>)
                        .required(false)
                        .help("Site origin, e.g. https://www.example.com (default: inferred from the sitemap)"),
                )
                .arg(
                    arg!(-s --"sitemap" <PATH>)
                        .required(false)
                        .help("Sitemap location, relative to the site root unless absolute")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--"check")
                        .required(false)
                        .help("Report drift without writing; exits with status 2 when anything needs fixing")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            command!("bump-version")
                .about("Set the ?v= cache-busting version of an asset across all pages")
                .disable_version_flag(true)
                .arg(
                    arg!(-a --"asset" <NAME>)
                        .required(true)
                        .help("Asset file name as referenced in pages, e.g. styles.css"),
                )
                .arg(
                    arg!(-n --"version" <N>)
                        .required(true)
                        .help("New version number")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(config_arg())
                .arg(root_arg())
                .arg(dry_run_arg()),
        )
        .subcommand(
            command!("replace")
                .about("Replace a literal string or regex match across all pages")
                .arg(
                    arg!(--"from" <TEXT>)
                        .required(true)
                        .help("Text to search for (a regular expression with --regex)"),
                )
                .arg(arg!(--"to" <TEXT>).required(true).help("Replacement text"))
                .arg(
                    arg!(-i --"ignore-case")
                        .required(false)
                        .help("Match the search text case-insensitively")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-e --"regex")
                        .required(false)
                        .help("Treat --from as a regular expression; the replacement is inserted literally")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(config_arg())
                .arg(root_arg())
                .arg(dry_run_arg()),
        )
        .subcommand(
            command!("remap")
                .about("Rewrite internal links from old paths to new ones, absolute forms included")
                .arg(
                    arg!(-m --"map" <MAPPING>)
                        .required(false)
                        .help("OLD=NEW path mapping (repeatable)")
                        .action(clap::ArgAction::Append),
                )
                .arg(
                    arg!(--"map-file" <PATH>)
                        .required(false)
                        .help("File of OLD=NEW lines; blank lines and # comments are ignored")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .group(
                    clap::ArgGroup::new("mappings")
                        .args(["map", "map-file"])
                        .required(true)
                        .multiple(true),
                )
                .arg(config_arg())
                .arg(root_arg())
                .arg(dry_run_arg()),
        )
        .subcommand(
            command!("inject")
                .about("Insert a snippet before </head> on every page that lacks it")
                .arg(
                    arg!(--"snippet-file" <PATH>)
                        .required(true)
                        .help("File holding the snippet to insert")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--"marker" <TEXT>)
                        .required(true)
                        .help("Text inside the snippet whose presence means it is already installed"),
                )
                .arg(config_arg())
                .arg(root_arg())
                .arg(dry_run_arg()),
        )
        .subcommand(
            command!("init")
                .about("Writes a commented sitemend.toml into a site directory")
                .arg(
                    arg!([DIR])
                        .required(false)
                        .help("Site directory to initialize")
                        .default_value("."),
                )
                .arg(
                    arg!(-f --"force")
                        .help("Overwrite an existing sitemend.toml without asking.")
                        .required(false),
                ),
        )
}
