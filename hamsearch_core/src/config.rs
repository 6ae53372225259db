use crate::hash::HashAlgorithm;
use crate::hex_codec;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Target digest searched for when none is configured (1024 bits).
pub const DEFAULT_TARGET_HEX: &str = concat!(
    "5b4da95f5fa08280fc9879df44f418c8f9f12ba424b7757de02bbdfbae0d4c4f",
    "df9317c80cc5fe04c6429073466cf29706b8c25999ddd2f6540d4475cc977b87",
    "f4757be023f19b8f4035d7722886b78869826de916a79cf9c94cc79cd4347d24",
    "b567aa3e2390a573a373a48a5e676640c79cc70197e1c5e7f902fb53ca1858b6",
);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("chunk-size must be at least one byte")]
    ZeroChunkSize,
    #[error("output-bits must be a positive multiple of 8, got {0}")]
    OutputBits(usize),
    #[error("target is not valid hex: {0}")]
    InvalidTarget(#[from] hex::FromHexError),
    #[error("target is {actual} bytes but output-bits requires {expected}")]
    TargetLength { expected: usize, actual: usize },
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_output_bits")]
    pub output_bits: usize,
    #[serde(default = "default_target")]
    pub target: String,
    #[serde(default)]
    pub algorithm: HashAlgorithm,
    /// Stop after this many hashes instead of waiting for an interrupt.
    #[serde(default)]
    pub max_hashes: Option<u64>,
    /// Log a progress line every this many hashes; 0 disables it.
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
}

pub fn default_chunk_size() -> usize {
    16
}

pub fn default_output_bits() -> usize {
    1024
}

fn default_target() -> String {
    DEFAULT_TARGET_HEX.to_string()
}

pub fn default_progress_interval() -> u64 {
    10_000_000
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            output_bits: default_output_bits(),
            target: default_target(),
            algorithm: HashAlgorithm::default(),
            max_hashes: None,
            progress_interval: default_progress_interval(),
        }
    }
}

/// A [`SearchConfig`] whose sizes are known to agree with each other.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub chunk_size: usize,
    pub output_bits: usize,
    pub target: Vec<u8>,
    pub algorithm: HashAlgorithm,
    pub max_hashes: Option<u64>,
    pub progress_interval: u64,
}

impl SearchConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, anyhow::Error> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file at {:?}: {}", path, e))?;

        let config: SearchConfig = toml::from_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse TOML from config file {:?}: {}", path, e)
        })?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<ValidatedConfig, ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.output_bits == 0 || self.output_bits % 8 != 0 {
            return Err(ConfigError::OutputBits(self.output_bits));
        }
        let target = hex_codec::decode(&self.target)?;
        let expected = self.output_bits / 8;
        if target.len() != expected {
            return Err(ConfigError::TargetLength {
                expected,
                actual: target.len(),
            });
        }
        Ok(ValidatedConfig {
            chunk_size: self.chunk_size,
            output_bits: self.output_bits,
            target,
            algorithm: self.algorithm,
            max_hashes: self.max_hashes,
            progress_interval: self.progress_interval,
        })
    }
}
