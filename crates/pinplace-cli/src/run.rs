use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use pinplace_schematic::write_kicad_schematic;

use crate::scene::{load_and_run, print_steps, SceneArgs};

#[derive(Args, Debug, Default, Clone)]
#[command(about = "Run the operations of a scene file")]
pub struct RunArgs {
    #[command(flatten)]
    pub scene: SceneArgs,

    /// Write the resulting sheet as a KiCad schematic
    #[arg(long, short = 'o', value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Print step results as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: RunArgs) -> Result<()> {
    let run = load_and_run(&args.scene)?;
    print_steps(&run, args.json)?;

    if let Some(output) = &args.output {
        write_kicad_schematic(&run.document, output)
            .with_context(|| format!("Failed to write schematic to {}", output.display()))?;
        eprintln!(
            "{} {} ({} components, {} wires, {} labels)",
            "✓".green(),
            output.display().to_string().bold(),
            run.document.components().len(),
            run.document.wires().len(),
            run.document
                .labels()
                .iter()
                .filter(|l| !l.item.suppressed)
                .count()
        );
    }
    Ok(())
}
