//! Snapshot of every externally identified data row on the remote side.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::json;
use vidledger_domain::{write_records, InventoryRecord};

use crate::config::{ConfigError, RequiredKeys, Settings, API_KEY_ENV, DEFAULT_INVENTORY_OUTPUT};
use crate::remote::{LabelboxClient, LabelingPlatform, RemoteError};
use crate::tooling::{missing_config_outcome, unauthorized_outcome};
use crate::{CommandContext, ExecutionOutcome};

#[derive(Debug, Clone, Default)]
pub struct InventoryRequest {
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct InventoryConfig {
    pub api_key: String,
    pub endpoint: String,
    pub output: PathBuf,
}

impl InventoryConfig {
    pub fn resolve(settings: &Settings, request: &InventoryRequest) -> Result<Self, ConfigError> {
        let mut required = RequiredKeys::default();
        let api_key = required.take(API_KEY_ENV, settings.api_key.as_ref());
        required.finish()?;
        Ok(Self {
            api_key: api_key.unwrap_or_default(),
            endpoint: settings.endpoint.clone(),
            output: request
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INVENTORY_OUTPUT)),
        })
    }
}

/// Lists every data row with a non-empty external id, dataset by dataset.
pub fn collect_inventory(platform: &dyn LabelingPlatform) -> Result<Vec<InventoryRecord>, RemoteError> {
    let mut records = Vec::new();
    for dataset in platform.list_datasets()? {
        tracing::info!(dataset = %dataset.name, "processing dataset");
        let rows = platform.list_data_rows(&dataset.id)?;
        let before = records.len();
        records.extend(rows.into_iter().filter_map(|row| {
            let video_name = row.external_id.filter(|id| !id.is_empty())?;
            Some(InventoryRecord {
                dataset_name: dataset.name.clone(),
                video_name,
                data_row_id: row.id,
                dataset_id: dataset.id.clone(),
            })
        }));
        tracing::debug!(dataset = %dataset.name, rows = records.len() - before, "collected rows");
    }
    Ok(records)
}

/// Collects the inventory and writes it to `output`; nothing is written when empty.
pub fn write_inventory(
    platform: &dyn LabelingPlatform,
    output: &std::path::Path,
) -> Result<Vec<InventoryRecord>> {
    let records = collect_inventory(platform)?;
    if records.is_empty() {
        tracing::info!("no videos found in any dataset");
        return Ok(records);
    }
    write_records(output, &records)
        .with_context(|| format!("failed to write inventory to {}", output.display()))?;
    tracing::info!(rows = records.len(), output = %output.display(), "wrote video inventory");
    Ok(records)
}

/// Writes a CSV snapshot of the Labelbox inventory.
///
/// # Errors
/// Returns an error for failures that are not attributable to user input.
pub fn inventory_command(ctx: &CommandContext, request: &InventoryRequest) -> Result<ExecutionOutcome> {
    let config = match InventoryConfig::resolve(ctx.settings(), request) {
        Ok(config) => config,
        Err(err) => return Ok(missing_config_outcome(&err)),
    };
    let platform = LabelboxClient::new(&config.endpoint, &config.api_key)?;
    match write_inventory(&platform, &config.output) {
        Ok(records) => Ok(inventory_outcome(&records, &config.output)),
        Err(err) => match err.downcast_ref::<RemoteError>() {
            Some(RemoteError::Unauthorized { endpoint, .. }) => Ok(unauthorized_outcome(endpoint)),
            _ => Err(err),
        },
    }
}

fn inventory_outcome(records: &[InventoryRecord], output: &std::path::Path) -> ExecutionOutcome {
    if records.is_empty() {
        return ExecutionOutcome::success(
            "no videos found",
            json!({ "rows": 0, "written": false }),
        );
    }
    let datasets = records
        .iter()
        .map(|record| record.dataset_id.as_str())
        .collect::<std::collections::BTreeSet<_>>()
        .len();
    ExecutionOutcome::success(
        format!(
            "wrote {} videos from {datasets} datasets to {}",
            records.len(),
            output.display()
        ),
        json!({
            "rows": records.len(),
            "datasets": datasets,
            "written": true,
            "output": output.display().to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{RemoteDataRow, RemoteDataset};
    use std::collections::HashMap;
    use std::path::Path;
    use tempfile::tempdir;
    use vidledger_domain::read_records;

    #[derive(Default)]
    struct StaticPlatform {
        datasets: Vec<RemoteDataset>,
        rows: HashMap<String, Vec<RemoteDataRow>>,
    }

    impl StaticPlatform {
        fn with(mut self, id: &str, name: &str, rows: &[(&str, Option<&str>)]) -> Self {
            self.datasets.push(RemoteDataset {
                id: id.into(),
                name: name.into(),
            });
            self.rows.insert(
                id.into(),
                rows.iter()
                    .map(|(row, external)| RemoteDataRow {
                        id: (*row).into(),
                        external_id: external.map(ToOwned::to_owned),
                    })
                    .collect(),
            );
            self
        }
    }

    impl LabelingPlatform for StaticPlatform {
        fn list_datasets(&self) -> Result<Vec<RemoteDataset>, RemoteError> {
            Ok(self.datasets.clone())
        }

        fn create_dataset(&self, _name: &str) -> Result<RemoteDataset, RemoteError> {
            panic!("inventory never creates datasets")
        }

        fn list_data_rows(&self, dataset_id: &str) -> Result<Vec<RemoteDataRow>, RemoteError> {
            Ok(self.rows.get(dataset_id).cloned().unwrap_or_default())
        }

        fn create_video_row(
            &self,
            _dataset_id: &str,
            _file: &Path,
            _external_id: &str,
        ) -> Result<RemoteDataRow, RemoteError> {
            panic!("inventory never uploads")
        }
    }

    #[test]
    fn rows_without_external_id_are_left_out() -> Result<()> {
        let platform = StaticPlatform::default()
            .with("ds-1", "site_visits", &[("r1", Some("a.mp4")), ("r2", None), ("r3", Some(""))])
            .with("ds-2", "drone", &[("r4", Some("b.mp4"))]);

        let records = collect_inventory(&platform)?;

        assert_eq!(
            records,
            vec![
                InventoryRecord {
                    dataset_name: "site_visits".into(),
                    video_name: "a.mp4".into(),
                    data_row_id: "r1".into(),
                    dataset_id: "ds-1".into(),
                },
                InventoryRecord {
                    dataset_name: "drone".into(),
                    video_name: "b.mp4".into(),
                    data_row_id: "r4".into(),
                    dataset_id: "ds-2".into(),
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn snapshot_overwrites_the_output() -> Result<()> {
        let tmp = tempdir()?;
        let output = tmp.path().join("inventory.csv");
        std::fs::write(&output, "stale\n")?;
        let platform = StaticPlatform::default().with("ds-1", "site_visits", &[("r1", Some("a.mp4"))]);

        let records = write_inventory(&platform, &output)?;

        assert_eq!(read_records(&output)?, records);
        let outcome = inventory_outcome(&records, &output);
        assert_eq!(outcome.details["rows"], 1);
        assert_eq!(outcome.details["datasets"], 1);
        Ok(())
    }

    #[test]
    fn empty_inventory_writes_nothing() -> Result<()> {
        let tmp = tempdir()?;
        let output = tmp.path().join("inventory.csv");
        let platform = StaticPlatform::default().with("ds-1", "empty", &[("r1", None)]);

        let records = write_inventory(&platform, &output)?;

        assert!(records.is_empty());
        assert!(!output.exists());
        assert_eq!(inventory_outcome(&records, &output).message, "no videos found");
        Ok(())
    }

    #[test]
    fn only_the_api_key_is_required() {
        let env = crate::config::EnvSnapshot::from_pairs(&[(API_KEY_ENV, "key")]);
        let config = InventoryConfig::resolve(&Settings::from_snapshot(&env), &InventoryRequest::default())
            .expect("config");
        assert_eq!(config.output, PathBuf::from(DEFAULT_INVENTORY_OUTPUT));

        let empty = Settings::from_snapshot(&crate::config::EnvSnapshot::from_pairs(&[]));
        let err = InventoryConfig::resolve(&empty, &InventoryRequest::default()).expect_err("no key");
        assert_eq!(err, ConfigError::Missing { keys: vec![API_KEY_ENV] });
    }
}
