use std::collections::BTreeMap;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use pinplace_engine::{Mirror, Point, Rotation};
use pinplace_schematic::{ComponentSpec, Document, Operation};

use crate::scene::SymbolArgs;

#[derive(ValueEnum, Debug, Default, Clone, Copy)]
pub enum MirrorArg {
    #[default]
    None,
    Horizontal,
    Vertical,
}

impl From<MirrorArg> for Mirror {
    fn from(arg: MirrorArg) -> Mirror {
        match arg {
            MirrorArg::None => Mirror::None,
            MirrorArg::Horizontal => Mirror::Horizontal,
            MirrorArg::Vertical => Mirror::Vertical,
        }
    }
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{s}'"))?;
    let coord = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid coordinate '{v}': {e}"))
    };
    Ok(Point::new(coord(x)?, coord(y)?))
}

#[derive(Args, Debug, Clone)]
#[command(about = "Print the world position and direction of every pin of a placed symbol")]
pub struct PinsArgs {
    /// Symbol to place, as Library:Name (e.g. Device:R)
    #[arg(value_name = "LIB_ID")]
    pub lib_id: String,

    /// Placement origin in millimeters
    #[arg(long, value_name = "X,Y", value_parser = parse_point, default_value = "0,0", allow_hyphen_values = true)]
    pub at: Point,

    /// Rotation in degrees: 0, 90, 180 or 270
    #[arg(long, short = 'r', default_value_t = 0.0, allow_hyphen_values = true)]
    pub rotation: f64,

    #[arg(long, short = 'm', value_enum, default_value_t = MirrorArg::None)]
    pub mirror: MirrorArg,

    /// Reference designator to report pins under. Defaults to the library's
    /// reference prefix plus 1 (`R1`), or `U1`.
    #[arg(long)]
    pub reference: Option<String>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub symbols: SymbolArgs,
}

pub fn execute(args: PinsArgs) -> Result<()> {
    let rotation = Rotation::try_from(args.rotation)?;
    let mut cache = args.symbols.cache()?;

    let reference = match args.reference {
        Some(reference) => reference,
        None => cache
            .resolve(&args.lib_id)
            .with_context(|| format!("Failed to load {}", args.lib_id))?
            .first_reference(),
    };

    let mut doc = Document::new();
    Operation::AddComponent(ComponentSpec {
        reference: reference.clone(),
        lib_id: args.lib_id.clone(),
        value: None,
        at: args.at,
        rotation,
        mirror: args.mirror.into(),
        properties: BTreeMap::new(),
    })
    .apply(&mut doc, &mut cache)
    .with_context(|| format!("Failed to place {}", args.lib_id))?;

    let output = Operation::ListPins { reference }.apply(&mut doc, &mut cache)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{output}");
    }
    Ok(())
}
