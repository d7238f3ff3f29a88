//! Parameter persistence
//!
//! Generation parameters are stored as pretty-printed JSON, field by name.
//! Missing fields fall back to their defaults, so older files keep loading.

use std::path::Path;

use crate::params::GenerationParams;

/// Errors that can occur when loading or saving parameters.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the parameter file.
    #[error("failed to read parameters: {0}")]
    ReadError(#[source] std::io::Error),

    /// Failed to write the parameter file.
    #[error("failed to write parameters: {0}")]
    WriteError(#[source] std::io::Error),

    /// The file is not valid parameter JSON.
    #[error("failed to parse parameters: {0}")]
    ParseError(#[source] serde_json::Error),

    /// Parameters could not be serialized.
    #[error("failed to serialize parameters: {0}")]
    SerializeError(#[source] serde_json::Error),
}

/// Load parameters from a JSON file.
pub fn load_params(path: &Path) -> Result<GenerationParams, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
    let params: GenerationParams = serde_json::from_str(&contents).map_err(ConfigError::ParseError)?;
    tracing::info!("Loaded parameters from {}", path.display());
    Ok(params)
}

/// Save parameters as pretty-printed JSON, creating parent directories.
pub fn save_params(path: &Path, params: &GenerationParams) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(ConfigError::WriteError)?;
    }
    let json = serde_json::to_string_pretty(params).map_err(ConfigError::SerializeError)?;
    std::fs::write(path, json).map_err(ConfigError::WriteError)?;
    tracing::info!("Saved parameters to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::MeshStyle;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("params.json");

        let mut params = GenerationParams::default();
        params.width = 300;
        params.worley.warp_octaves = 5;
        params.channels.mesh_style = MeshStyle::Outline;

        save_params(&path, &params).unwrap();
        let loaded = load_params(&path).unwrap();
        assert_eq!(loaded, params);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"mesh_style\": \"outline\""));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_params(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError(_)));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ width: ").unwrap();
        let err = load_params(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
        assert!(err.to_string().starts_with("failed to parse parameters"));
    }
}
