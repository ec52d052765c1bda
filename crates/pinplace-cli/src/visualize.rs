use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use pinplace_schematic::save_svg;

use crate::scene::{load_and_run, sibling_path, SceneArgs};

#[derive(Args, Debug, Default, Clone)]
#[command(about = "Render a scene's pins, wires and labels as an SVG preview")]
pub struct VisualizeArgs {
    #[command(flatten)]
    pub scene: SceneArgs,

    /// Output file. Defaults to the scene path with an .svg extension.
    #[arg(long, short = 'o', value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

pub fn execute(args: VisualizeArgs) -> Result<()> {
    let run = load_and_run(&args.scene)?;
    let output = args
        .output
        .unwrap_or_else(|| sibling_path(&args.scene.scene, "svg"));

    save_svg(&run.document, &output)
        .with_context(|| format!("Failed to save SVG to {}", output.display()))?;
    println!("{} {}", "✓".green(), output.display().to_string().bold());
    Ok(())
}
