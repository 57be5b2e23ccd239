pub mod audit;
pub mod config;
pub mod error;
pub mod report;
pub mod resolve;
pub mod rewrite;

use colored::Colorize;

pub use error::{CoreError, Result};

const BANNER: &str = r#"
  ┌─┐┬┌┬┐┌─┐┌┬┐┌─┐┌┐┌┌┬┐
  └─┐│ │ ├┤ │││├┤ │││ ││
  └─┘┴ ┴ └─┘┴ ┴└─┘┘└┘─┴┘"#;

pub fn print_banner() {
    println!("{}", BANNER.bright_cyan().bold());
    println!(
        "  {} {}\n",
        "canonical URLs and batch maintenance for static sites".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
