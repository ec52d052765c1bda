use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use pinplace_eda::{find_kicad_symbol_dir, SymbolCache, SymbolLibrary};
use pinplace_schematic::{OperationOutput, Scene, SceneRun};
use serde::Serialize;

/// Where symbols come from.
#[derive(Args, Debug, Default, Clone)]
pub struct SymbolArgs {
    /// Directory of `<Library>.kicad_sym` files. Defaults to KICAD_SYMBOL_DIR,
    /// then the KiCad install.
    #[arg(long, value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    pub symbol_dir: Option<PathBuf>,

    /// Extra symbol library file, registered under its file stem. Repeatable.
    #[arg(long = "library", short = 'l', value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub libraries: Vec<PathBuf>,
}

impl SymbolArgs {
    /// The `--symbol-dir` value, checked to exist.
    pub fn explicit_dir(&self) -> Result<Option<PathBuf>> {
        if let Some(dir) = &self.symbol_dir {
            if !dir.is_dir() {
                anyhow::bail!("Symbol directory {} does not exist", dir.display());
            }
        }
        Ok(self.symbol_dir.clone())
    }

    /// `--symbol-dir`, then `KICAD_SYMBOL_DIR`, then a KiCad install.
    pub fn symbol_dir(&self) -> Result<Option<PathBuf>> {
        Ok(self
            .explicit_dir()?
            .or_else(|| find_kicad_symbol_dir(None)))
    }

    /// Register the `--library` files on `cache`.
    pub fn add_libraries(&self, cache: &mut SymbolCache) -> Result<()> {
        for path in &self.libraries {
            let library = SymbolLibrary::from_file(path)
                .with_context(|| format!("Failed to load symbol library {}", path.display()))?;
            cache.add_library(library);
        }
        Ok(())
    }

    pub fn cache(&self) -> Result<SymbolCache> {
        let mut cache = SymbolCache::new(self.symbol_dir()?);
        self.add_libraries(&mut cache)?;
        Ok(cache)
    }
}

/// Arguments shared by every command that runs a scene.
#[derive(Args, Debug, Default, Clone)]
pub struct SceneArgs {
    /// Scene file (TOML) with components and operations
    #[arg(value_name = "SCENE", value_hint = clap::ValueHint::FilePath)]
    pub scene: PathBuf,

    #[command(flatten)]
    pub symbols: SymbolArgs,
}

pub fn load_and_run(args: &SceneArgs) -> Result<SceneRun> {
    let scene = Scene::from_file(&args.scene)?;
    // --symbol-dir beats the scene's own symbol_dir
    let mut cache = scene.symbol_cache(args.symbols.explicit_dir()?)?;
    args.symbols.add_libraries(&mut cache)?;
    let run = scene
        .run(&mut cache)
        .with_context(|| format!("Scene {} failed", args.scene.display()))?;
    log::debug!(
        "{}: {} steps, {} warnings",
        args.scene.display(),
        run.steps.len(),
        run.warnings().count()
    );
    Ok(run)
}

/// `scene.toml` → `scene.<extension>` next to it.
pub fn sibling_path(scene: &Path, extension: &str) -> PathBuf {
    scene.with_extension(extension)
}

#[derive(Serialize)]
struct StepJson<'a> {
    index: usize,
    op: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a OperationOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

pub fn print_steps(run: &SceneRun, json: bool) -> Result<()> {
    if json {
        let steps: Vec<_> = run
            .steps
            .iter()
            .map(|step| StepJson {
                index: step.index,
                op: step.op,
                output: step.outcome.as_ref().ok(),
                warning: step.outcome.as_ref().err().map(ToString::to_string),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&steps)?);
        return Ok(());
    }

    for step in &run.steps {
        match &step.outcome {
            Ok(output) => {
                let text = output.to_string();
                let mut lines = text.lines();
                let first = lines.next().unwrap_or_default();
                println!("{} {} {first}", "✓".green(), step.op.bold());
                for line in lines {
                    println!("  {line}");
                }
            }
            Err(e) => println!("{} {} {e}", "!".yellow(), step.op.bold()),
        }
    }
    Ok(())
}
