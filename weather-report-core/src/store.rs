use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

use crate::model::Observation;

/// On-disk encoding of the observation table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    #[default]
    Csv,
    Json,
}

impl DataFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataFormat::Csv => "csv",
            DataFormat::Json => "json",
        }
    }

    /// Guess the format from the file extension; anything but `.json`
    /// is treated as CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DataFormat::Json,
            _ => DataFormat::Csv,
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(DataFormat::Csv),
            "json" => Ok(DataFormat::Json),
            _ => Err(anyhow::anyhow!(
                "Unknown data format '{s}'. Supported: csv, json."
            )),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("data file not found: {path}")]
    Missing { path: PathBuf },

    #[error("could not parse {path}: {reason}")]
    Format { path: PathBuf, reason: String },

    #[error("failed to access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("refusing to write an empty observation table")]
    Empty,

    #[error("no usable city names in {path}: add one city name per line")]
    NoCities { path: PathBuf },
}

/// Write the full observation sequence to `path`, overwriting any existing
/// file. Field order matches [`Observation`] in both formats.
pub fn save(
    observations: &[Observation],
    path: &Path,
    format: DataFormat,
) -> Result<(), StoreError> {
    if observations.is_empty() {
        return Err(StoreError::Empty);
    }

    match format {
        DataFormat::Csv => {
            let mut writer = csv::Writer::from_path(path).map_err(|e| from_csv(path, e))?;
            for observation in observations {
                writer.serialize(observation).map_err(|e| from_csv(path, e))?;
            }
            writer.flush().map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }
        DataFormat::Json => {
            let json =
                serde_json::to_string_pretty(observations).map_err(|e| StoreError::Format {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
            fs::write(path, json).map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    info!(
        "Saved {} observations to {} ({format})",
        observations.len(),
        path.display()
    );
    Ok(())
}

/// Load the observation table back, in stored order. A single malformed
/// row or record aborts the whole load.
pub fn load(path: &Path, format: DataFormat) -> Result<Vec<Observation>, StoreError> {
    if !path.exists() {
        return Err(StoreError::Missing {
            path: path.to_path_buf(),
        });
    }

    let observations = match format {
        DataFormat::Csv => {
            let mut reader = csv::Reader::from_path(path).map_err(|e| from_csv(path, e))?;
            reader
                .deserialize()
                .collect::<Result<Vec<Observation>, _>>()
                .map_err(|e| StoreError::Format {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?
        }
        DataFormat::Json => {
            let contents = fs::read_to_string(path).map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            serde_json::from_str(&contents).map_err(|e| StoreError::Format {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        }
    };

    info!("Loaded {} observations from {}", observations.len(), path.display());
    Ok(observations)
}

/// Read city names from a UTF-8 text file, one per non-empty line.
/// Names are trimmed; blank lines are dropped. A file that yields zero
/// usable names is an error, so the fetch step fails before any network
/// call is attempted.
pub fn read_cities(path: &Path) -> Result<Vec<String>, StoreError> {
    if !path.exists() {
        return Err(StoreError::Missing {
            path: path.to_path_buf(),
        });
    }

    let contents = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let cities: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if cities.is_empty() {
        return Err(StoreError::NoCities {
            path: path.to_path_buf(),
        });
    }

    Ok(cities)
}

fn from_csv(path: &Path, err: csv::Error) -> StoreError {
    let reason = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => StoreError::Io {
            path: path.to_path_buf(),
            source,
        },
        _ => StoreError::Format {
            path: path.to_path_buf(),
            reason,
        },
    }
}
