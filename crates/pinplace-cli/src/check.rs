use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pinplace_schematic::FindingDisplay;

use crate::scene::{load_and_run, SceneArgs};

#[derive(Args, Debug, Default, Clone)]
#[command(about = "Check that every label and wire of a scene still lands on its pin")]
pub struct CheckArgs {
    #[command(flatten)]
    pub scene: SceneArgs,

    /// Print findings as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: CheckArgs) -> Result<()> {
    let run = load_and_run(&args.scene)?;
    for step in run.warnings() {
        if let Err(e) = &step.outcome {
            eprintln!("{} #{} {}: {e}", "!".yellow(), step.index, step.op);
        }
    }

    let findings = run.document.validate();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&findings)?);
    } else if findings.is_empty() {
        println!(
            "{} {}: {} labels and {} wires on their pins",
            "✓".green(),
            args.scene.scene.display().to_string().bold(),
            run.document.labels().len(),
            run.document.wires().len()
        );
    } else {
        for finding in &findings {
            println!("{} {}", "✗".red(), FindingDisplay(finding));
        }
    }

    if !findings.is_empty() {
        anyhow::bail!("{} connection problem(s) found", findings.len());
    }
    Ok(())
}
