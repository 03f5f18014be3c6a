use futures::future::BoxFuture;
use futures::FutureExt;
use log::debug;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

use crate::collectors::MetricSource;
use crate::error::SamplerError;
use crate::models::{MetricKind, Reading};
use crate::utils::file::get_file_line;

/// Charge percentage from `<power_supply>/<battery>/capacity`.
#[derive(Debug, Clone)]
pub struct BatterySource {
    dir: PathBuf,
}

impl BatterySource {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl MetricSource for BatterySource {
    fn kind(&self) -> MetricKind {
        MetricKind::Battery
    }

    fn read(&self) -> BoxFuture<'_, Reading> {
        async move {
            let start = Instant::now();
            let result = Reading::from_output(get_file_line(&self.dir.join("capacity"), 8));
            debug!("battery read took: {} ms", start.elapsed().as_millis());
            result
        }
        .boxed()
    }
}

/// Names of the power supplies under `root` that report a charge level.
pub fn available_batteries(root: &Path) -> Vec<String> {
    let mut names: Vec<String> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .flatten()
        .filter(|entry| entry.path().join("capacity").is_file())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect();
    names.sort();
    names
}

/// Fails with the list of valid identifiers when `name` is not a battery
/// under `root`.
pub fn ensure_exists(root: &Path, name: &str) -> Result<(), SamplerError> {
    let valid_name = !name.is_empty() && !name.contains('/') && name != "." && name != "..";
    if valid_name && root.join(name).is_dir() {
        return Ok(());
    }
    Err(SamplerError::UnknownBattery {
        name: name.to_string(),
        available: available_batteries(root),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_reads_capacity() {
        let root = tempdir().unwrap();
        fs::create_dir(root.path().join("BAT0")).unwrap();
        fs::write(root.path().join("BAT0/capacity"), "73\n").unwrap();

        let source = BatterySource::new(root.path().join("BAT0"));
        assert_eq!(source.read().await, Reading::Primary("73".into()));
    }

    #[tokio::test]
    async fn test_missing_capacity_is_unavailable() {
        let root = tempdir().unwrap();
        let source = BatterySource::new(root.path().join("BAT0"));
        assert_eq!(source.read().await, Reading::Unavailable);
    }

    #[test]
    fn test_unknown_battery_lists_valid_ones() {
        let root = tempdir().unwrap();
        for name in ["BAT1", "BAT0"] {
            fs::create_dir(root.path().join(name)).unwrap();
            fs::write(root.path().join(name).join("capacity"), "50").unwrap();
        }
        fs::create_dir(root.path().join("AC")).unwrap();

        assert!(ensure_exists(root.path(), "BAT0").is_ok());
        match ensure_exists(root.path(), "BAT7") {
            Err(SamplerError::UnknownBattery { name, available }) => {
                assert_eq!(name, "BAT7");
                assert_eq!(available, vec!["BAT0", "BAT1"]);
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert!(ensure_exists(root.path(), "../BAT0").is_err());
    }
}
