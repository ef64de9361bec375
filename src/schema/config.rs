//! Top-level configuration for an orientation search run.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::SearchAlgorithm;

/// Top-level search configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Strategy to run and its parameters.
    #[serde(default)]
    pub algorithm: SearchAlgorithm,
    /// Mesh scored by the reference support-volume evaluator.
    #[serde(default)]
    pub mesh: MeshSpec,
}

/// Mesh source for the reference evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MeshSpec {
    /// Axis-aligned box centered on the origin.
    Cuboid { size: [f32; 3] },
    /// Explicit indexed triangle list (counter-clockwise winding).
    Inline {
        vertices: Vec<[f32; 3]>,
        triangles: Vec<[u32; 3]>,
    },
}

impl Default for MeshSpec {
    fn default() -> Self {
        Self::Cuboid {
            size: [2.0, 1.0, 0.5],
        }
    }
}

impl MeshSpec {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            MeshSpec::Cuboid { size } => {
                if size.iter().any(|s| !(*s > 0.0) || !s.is_finite()) {
                    return Err(ConfigError::InvalidCuboid);
                }
                Ok(())
            }
            MeshSpec::Inline {
                vertices,
                triangles,
            } => {
                if triangles.is_empty() {
                    return Err(ConfigError::EmptyMesh);
                }
                for (i, tri) in triangles.iter().enumerate() {
                    if let Some(&index) = tri.iter().find(|&&v| v as usize >= vertices.len()) {
                        return Err(ConfigError::InvalidVertexIndex { triangle: i, index });
                    }
                }
                Ok(())
            }
        }
    }
}

impl SearchConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.algorithm.validate()?;
        self.mesh.validate()
    }

    /// Load and validate a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let text = fs::read_to_string(path)?;
        let config: SearchConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown search strategy: {0}")]
    UnknownStrategy(String),
    #[error("Step sizes of {name} must be positive and finite")]
    InvalidStep { name: String },
    #[error("Step limit of the {name} local search must be non-zero")]
    InvalidMaxSteps { name: String },
    #[error("Candidate set size k must be non-zero")]
    EmptyCandidateSet,
    #[error("Cuboid dimensions must be positive and finite")]
    InvalidCuboid,
    #[error("Mesh has no triangles")]
    EmptyMesh,
    #[error("Triangle {triangle} references missing vertex {index}")]
    InvalidVertexIndex { triangle: usize, index: u32 },
}

/// Errors while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(#[from] ConfigError),
}
