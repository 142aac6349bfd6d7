//! Plain-text stress report.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use acorn_model::units::kn_per_cm2_to_mpa;
use tracing::info;

use crate::error::Result;
use crate::stress::{ExtremalSelection, Percentile, StressSummary};

/// Summary lines as printed on the console.
pub fn format_summary(summary: &StressSummary, percentile: Percentile) -> String {
    format!(
        "Max compression            {:12.3} MPa\n\
         Compression at {:5.1}%      {:12.3} MPa\n\
         Max tension                {:12.3} MPa\n\
         Tension at {:5.1}%          {:12.3} MPa",
        summary.max_compression,
        percentile.value(),
        summary.max_compression_at_percentile,
        summary.max_tension,
        percentile.value(),
        summary.max_tension_at_percentile,
    )
}

/// Writes the extremal element table followed by the summary.
pub fn write_stress_report<W: Write>(
    out: &mut W,
    selection: &ExtremalSelection,
    percentile: Percentile,
) -> Result<()> {
    writeln!(out, "   Elem.  Mesh   Face        MAX COMP [MPa]     MAX TENS [MPa]")?;
    writeln!(out, " Compression")?;
    for r in &selection.compression {
        writeln!(
            out,
            "{:8}{:6}{:7}   {:16.4e}   {:16.4e}",
            r.element_index,
            r.mesh_index,
            r.face_index,
            kn_per_cm2_to_mpa(r.max_compression()),
            kn_per_cm2_to_mpa(r.max_tension())
        )?;
    }
    writeln!(out, " Tension")?;
    for r in &selection.tension {
        writeln!(
            out,
            "{:8}{:6}{:7}   {:16.4e}   {:16.4e}",
            r.element_index,
            r.mesh_index,
            r.face_index,
            kn_per_cm2_to_mpa(r.max_compression()),
            kn_per_cm2_to_mpa(r.max_tension())
        )?;
    }
    writeln!(out)?;
    if !selection.is_empty() {
        writeln!(out, "{}", format_summary(&selection.summary()?, percentile))?;
    }
    Ok(())
}

/// Writes the report to `path`, creating parent directories as needed.
pub fn save_stress_report<P: AsRef<Path>>(
    path: P,
    selection: &ExtremalSelection,
    percentile: Percentile,
) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = BufWriter::new(File::create(path)?);
    write_stress_report(&mut out, selection, percentile)?;
    out.flush()?;
    info!(path = %path.display(), "stress report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stress::{ElementStressRecord, LayerStress};
    use acorn_model::{Point3, Vector3};

    fn record(element_index: usize, value: f64) -> ElementStressRecord {
        let layer = LayerStress {
            origin: Point3::origin(),
            principal1_dir: Vector3::x(),
            principal1_val: value,
            principal2_dir: Vector3::y(),
            principal2_val: value / 2.0,
        };
        ElementStressRecord {
            element_index,
            mesh_index: 0,
            face_index: element_index,
            top: layer,
            bottom: layer,
        }
    }

    #[test]
    fn report_lists_both_sets_and_summary() {
        let selection = ExtremalSelection {
            compression: vec![record(3, -2.0)],
            tension: vec![record(7, 0.5)],
        };
        let mut buffer = Vec::new();
        write_stress_report(&mut buffer, &selection, Percentile::default()).expect("report");
        let text = String::from_utf8(buffer).expect("utf8");
        assert!(text.contains(" Compression\n       3"));
        assert!(text.contains(" Tension\n       7"));
        assert!(text.contains("Max compression"));
        assert!(text.contains("-20.000 MPa"));
    }

    #[test]
    fn empty_selection_has_no_summary() {
        let mut buffer = Vec::new();
        write_stress_report(&mut buffer, &ExtremalSelection::default(), Percentile::default())
            .expect("report");
        let text = String::from_utf8(buffer).expect("utf8");
        assert!(!text.contains("Max compression"));
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out").join("stress.txt");
        save_stress_report(&path, &ExtremalSelection::default(), Percentile::default())
            .expect("save");
        assert!(path.exists());
    }
}
