use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_BUCKET_COUNT, DEFAULT_GROUP_SIZE, DEFAULT_ROW_GROUP_SIZE, DEFAULT_THREADS,
};
use crate::hive::HiveOptions;
use crate::table::{ParquetCompression, ParquetWriteOptions};

#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    pub hive: HiveSettings,
    pub inputs: InputList,
}

#[derive(Debug, Deserialize)]
pub struct HiveSettings {
    pub output: PathBuf,
    #[serde(default = "default_group_size")]
    pub group_size: usize,
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default = "default_bucket_count")]
    pub bucket_count: u64,
    #[serde(default)]
    pub compression: ParquetCompression,
    #[serde(default = "default_row_group_size")]
    pub row_group_size: usize,
}

fn default_group_size() -> usize {
    DEFAULT_GROUP_SIZE
}

fn default_threads() -> usize {
    DEFAULT_THREADS
}

fn default_bucket_count() -> u64 {
    DEFAULT_BUCKET_COUNT
}

fn default_row_group_size() -> usize {
    DEFAULT_ROW_GROUP_SIZE
}

#[derive(Debug, Deserialize)]
pub struct InputList {
    pub paths: Vec<PathBuf>,
}

impl ConfigFile {
    /// Pipeline options described by the `[hive]` table.
    pub fn hive_options(&self) -> HiveOptions {
        HiveOptions {
            group_size: self.hive.group_size,
            threads: self.hive.threads,
            bucket_count: self.hive.bucket_count,
            write: ParquetWriteOptions {
                row_group_size: self.hive.row_group_size,
                compression: self.hive.compression,
            },
        }
    }

    /// Input paths resolved against `config_dir`.
    pub fn input_paths(&self, config_dir: &Path) -> Vec<PathBuf> {
        self.inputs
            .paths
            .iter()
            .map(|p| resolve_path(config_dir, p))
            .collect()
    }

    /// Output prefix resolved against `config_dir`.
    pub fn output_prefix(&self, config_dir: &Path) -> PathBuf {
        resolve_path(config_dir, &self.hive.output)
    }
}

pub fn parse_config(path: &Path) -> Result<ConfigFile> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: ConfigFile = toml::from_str(&contents).context("Failed to parse TOML config")?;

    if config.hive.group_size == 0 {
        return Err(anyhow!("Config error: group_size must be > 0"));
    }
    if config.hive.threads == 0 {
        return Err(anyhow!("Config error: threads must be > 0"));
    }
    if config.hive.bucket_count == 0 {
        return Err(anyhow!("Config error: bucket_count must be > 0"));
    }

    Ok(config)
}

pub fn validate_config(config: &ConfigFile, config_dir: &Path) -> Result<()> {
    for file_path in config.input_paths(config_dir) {
        if !file_path.exists() {
            return Err(anyhow!("Input file not found: {}", file_path.display()));
        }
    }

    Ok(())
}

pub fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
