use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use acorn_io::load_snapshot;
use acorn_model::Point3;
use acorn_solver::loads::{LoadPattern, PatternClassification, PatternRule, classify_faces};
use acorn_solver::{
    ExtremalSelection, Percentile, ProbeResult, RecordedModel, StressCatalog, format_summary,
    probe_nearest, save_stress_report, select_extremes,
};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

type CliResult = Result<(), Box<dyn Error>>;

/// Stress post-processing for segmented concrete shells
#[derive(Parser)]
#[command(name = "acorn")]
#[command(about = "Stress post-processing for segmented concrete shells", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extremal compression and tension of one load case
    Stresses {
        /// Recorded model snapshot (JSON)
        snapshot: PathBuf,

        /// Share of elements treated as non-extreme, in percent
        #[arg(long, default_value_t = 95.0)]
        percentile: f64,

        /// Load case index
        #[arg(long, default_value_t = 0)]
        case: usize,

        /// Write the extremal element table to this file
        #[arg(long)]
        report: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Stresses of the element nearest to a point
    Probe {
        snapshot: PathBuf,
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
        #[arg(allow_negative_numbers = true)]
        z: f64,

        #[arg(long, default_value_t = 0)]
        case: usize,

        #[arg(long)]
        json: bool,
    },

    /// Faces loaded by an angular live load pattern
    Pattern {
        snapshot: PathBuf,

        /// Wedge angle in degrees
        #[arg(long, requires = "offset", conflicts_with = "predefined")]
        arc: Option<f64>,

        /// Start angle of the first wedge in degrees
        #[arg(long, requires = "arc", allow_negative_numbers = true)]
        offset: Option<f64>,

        /// Predefined pattern 1 to 7
        #[arg(long, required_unless_present = "arc")]
        predefined: Option<u8>,

        #[arg(long, value_enum, default_value_t = RuleArg::Periodic)]
        rule: RuleArg,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RuleArg {
    Periodic,
    Legacy,
}

impl From<RuleArg> for PatternRule {
    fn from(rule: RuleArg) -> Self {
        match rule {
            RuleArg::Periodic => PatternRule::Periodic,
            RuleArg::Legacy => PatternRule::Legacy,
        }
    }
}

fn load_model(path: &Path) -> Result<RecordedModel, Box<dyn Error>> {
    let snapshot = load_snapshot(path)?;
    info!(
        path = %path.display(),
        meshes = snapshot.meshes.len(),
        load_cases = snapshot.load_cases.len(),
        "loaded snapshot"
    );
    Ok(RecordedModel::new(snapshot))
}

fn print_probe(result: &ProbeResult) {
    println!("element: {}", result.element_index);
    println!("mesh: {}", result.mesh_index);
    println!("face: {}", result.face_index);
    println!("distance: {:.6}", result.distance);
    let c = result.element_center;
    println!("center: {:.4} {:.4} {:.4}", c.x, c.y, c.z);
    println!(
        "top principal [MPa]: {:.3} {:.3}",
        result.top_principal1, result.top_principal2
    );
    println!(
        "bottom principal [MPa]: {:.3} {:.3}",
        result.bottom_principal1, result.bottom_principal2
    );
}

fn print_pattern(classification: &PatternClassification) {
    let c = classification.centroid;
    println!("centroid: {:.4} {:.4} {:.4}", c.x, c.y, c.z);
    for (mesh, flags) in classification.loaded.iter().enumerate() {
        let loaded = flags.iter().filter(|&&l| l).count();
        println!("mesh {mesh}: {loaded}/{} faces loaded", flags.len());
    }
    println!("loaded_faces: {}", classification.loaded_count());
}

/// Text or JSON summary of one extremal selection.
fn stress_output(
    elements: usize,
    selection: &ExtremalSelection,
    percentile: Percentile,
    as_json: bool,
) -> Result<String, Box<dyn Error>> {
    // Nothing is extreme at p = 100 or for an empty catalog.
    let summary = if selection.is_empty() {
        None
    } else {
        Some(selection.summary()?)
    };
    if as_json {
        let out = json!({
            "elements": elements,
            "extremal_elements": selection.compression.len(),
            "percentile": percentile.value(),
            "summary": summary,
        });
        return Ok(serde_json::to_string_pretty(&out)?);
    }
    let mut text = format!(
        "elements: {elements}\nextremal_elements: {}",
        selection.compression.len()
    );
    if let Some(summary) = summary {
        text.push('\n');
        text.push_str(&format_summary(&summary, percentile));
    }
    Ok(text)
}

fn stresses(
    snapshot: &Path,
    percentile: f64,
    case: usize,
    report: Option<&Path>,
    as_json: bool,
) -> CliResult {
    let model = load_model(snapshot)?;
    let percentile = Percentile::new(percentile)?;
    let catalog = StressCatalog::build(&model, case)?;
    let selection = select_extremes(&catalog, percentile);
    if let Some(path) = report {
        save_stress_report(path, &selection, percentile)?;
    }
    println!("{}", stress_output(catalog.len(), &selection, percentile, as_json)?);
    Ok(())
}

fn probe(snapshot: &Path, point: Point3<f64>, case: usize, as_json: bool) -> CliResult {
    let model = load_model(snapshot)?;
    let catalog = StressCatalog::build(&model, case)?;
    let result = probe_nearest(&catalog, &point)?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_probe(&result);
    }
    Ok(())
}

fn pattern(
    snapshot: &Path,
    pattern: LoadPattern,
    rule: PatternRule,
    as_json: bool,
) -> CliResult {
    let model = load_model(snapshot)?;
    let classification = classify_faces(&model.snapshot().meshes, &pattern, rule)?;
    if as_json {
        let out = json!({
            "arc": pattern.arc,
            "offset": pattern.offset,
            "rule": rule,
            "centroid": classification.centroid,
            "loaded": classification.loaded,
            "check_points": classification.check_points,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_pattern(&classification);
    }
    Ok(())
}

fn run(cli: Cli) -> CliResult {
    match cli.command {
        Commands::Stresses {
            snapshot,
            percentile,
            case,
            report,
            json,
        } => stresses(&snapshot, percentile, case, report.as_deref(), json),
        Commands::Probe {
            snapshot,
            x,
            y,
            z,
            case,
            json,
        } => probe(&snapshot, Point3::new(x, y, z), case, json),
        Commands::Pattern {
            snapshot,
            arc,
            offset,
            predefined,
            rule,
            json,
        } => {
            let load_pattern = match (predefined, arc, offset) {
                (Some(number), _, _) => LoadPattern::predefined(number)?,
                (None, Some(arc), Some(offset)) => {
                    LoadPattern::new(arc.to_radians(), offset.to_radians())?
                }
                _ => return Err("either --predefined or --arc with --offset is required".into()),
            };
            pattern(&snapshot, load_pattern, rule.into(), json)
        }
    }
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}
