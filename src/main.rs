use clap::{Parser, Subcommand};
use ham::site::{DEFAULT_OUTPUT_DIR, Site};
use ham::{config, output};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ham")]
#[command(about = "Static-site template compiler")]
#[command(long_about = "\
Static-site template compiler

Pages are plain HTML. Marker elements pick a layout, splice partials and link
stylesheets and scripts; the output is fully resolved HTML.

Project structure:

  my-site/
  ├── ham.json                     # Marker + config (may be empty)
  ├── pages/                       # Every .html here becomes an output page
  │   ├── index.html
  │   └── about/team.html          # → public/about/team.html
  ├── layouts/default.html         # Shell with <embed type=\"ham/page\">
  ├── partials/nav.html            # Spliced via <embed type=\"ham/partial\">
  └── assets/                      # Copied verbatim to public/assets

Set RUST_LOG=debug to trace every file read.

Run 'ham gen-config' to print ham.json with every option at its default.")]
#[command(version)]
struct Cli {
    /// Project directory (must contain ham.json)
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR, global = true)]
    output: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile every page and copy the assets
    Build,
    /// Print a stock ham.json with all options at their defaults
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Build => {
            println!("==> Building {}", cli.source.display());
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_compile_event(&event);
                }
            });
            let result = Site::build_with_events(&cli.source, &cli.output, tx);
            // The sender is gone either way, so the printer drains and exits.
            if printer.join().is_err() {
                log::warn!("progress printer panicked");
            }
            let summary = result?;
            println!();
            output::print_build_summary(&summary);
            println!("==> Build complete: {}", cli.output.display());
        }
        Command::GenConfig => {
            println!("{}", config::stock_config_json());
        }
    }

    Ok(())
}
