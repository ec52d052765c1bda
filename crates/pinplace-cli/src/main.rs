use clap::{ArgAction, Parser, Subcommand};

mod check;
mod pins;
mod run;
mod scene;
mod visualize;

#[derive(Parser)]
#[command(name = "pinplace")]
#[command(about = "Pin-accurate label and wire placement for KiCad schematics", long_about = None)]
struct Cli {
    /// Increase log output (-v debug, -vv trace). RUST_LOG overrides this.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show where each pin of a symbol lands for a given placement
    #[command(alias = "p")]
    Pins(pins::PinsArgs),

    /// Run a scene file and optionally write the resulting schematic
    #[command(alias = "r")]
    Run(run::RunArgs),

    /// Run a scene file and check every label and wire against its pin
    #[command(alias = "c")]
    Check(check::CheckArgs),

    /// Run a scene file and write an SVG preview
    #[command(alias = "v")]
    Visualize(visualize::VisualizeArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Pins(args) => pins::execute(args),
        Commands::Run(args) => run::execute(args),
        Commands::Check(args) => check::execute(args),
        Commands::Visualize(args) => visualize::execute(args),
    }
}
