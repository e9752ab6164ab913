use anyhow::Context;
use detcore::sweep::DetectionCurve;
use std::fs;
use std::path::Path;

/// Writes `curve` as JSON when the path ends in `.json`, otherwise as CSV.
pub fn write_curve<P: AsRef<Path>>(path: P, curve: &DetectionCurve) -> anyhow::Result<()> {
    let path_ref = path.as_ref();
    let is_json = path_ref
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let contents = if is_json {
        curve.to_json().context("serializing detection curve")?
    } else {
        curve.to_csv()
    };

    if let Some(parent) = path_ref.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output directory {}", parent.display()))?;
        }
    }
    fs::write(path_ref, contents)
        .with_context(|| format!("writing detection curve {}", path_ref.display()))?;
    log::info!("detection curve written to {}", path_ref.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::config::WorkflowConfig;
    use tempfile::tempdir;

    fn curve() -> DetectionCurve {
        let cfg = WorkflowConfig {
            m: Some(3),
            n: 5,
            points: 8,
            ..Default::default()
        };
        detcore::sweep(&cfg.to_sweep_config().unwrap()).unwrap()
    }

    #[test]
    fn csv_export_writes_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("curves/pd.csv");
        write_curve(&path, &curve()).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("snr_db,pd"));
        let first: Vec<f64> = lines
            .next()
            .unwrap()
            .split(',')
            .map(|v| v.parse().unwrap())
            .collect();
        assert!((first[0] - 0.0).abs() < 1e-9);
        assert_eq!(contents.lines().count(), 9);
    }

    #[test]
    fn json_export_is_parseable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pd.JSON");
        write_curve(&path, &curve()).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["points"].as_array().unwrap().len(), 8);
        assert_eq!(value["config"]["rule"]["n"], 5);
    }
}
