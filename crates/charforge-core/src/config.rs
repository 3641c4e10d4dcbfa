//! Database configuration
//!
//! Where the on-disk database lives and what it is called.

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::storage::{Result, StorageError};

/// Default database name
pub const DEFAULT_DATABASE_NAME: &str = "CharacterBuilder";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "CHARFORGE_DATA_DIR";

/// Gateway configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Database name, also the file stem for the SQLite engine
    pub name: String,
    /// Data directory; `None` resolves through [`DATA_DIR_ENV`] and then the platform default
    pub data_dir: Option<PathBuf>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_DATABASE_NAME.to_string(),
            data_dir: None,
        }
    }
}

impl DatabaseConfig {
    /// Default config rooted at `data_dir`
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            ..Default::default()
        }
    }

    /// Resolve the data directory, creating it if needed
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        let dir = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => match std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
                Some(dir) => PathBuf::from(dir),
                None => ProjectDirs::from("com", "charforge", "charforge")
                    .ok_or_else(|| {
                        StorageError::Init("Could not determine project directories".to_string())
                    })?
                    .data_dir()
                    .to_path_buf(),
            },
        };

        std::fs::create_dir_all(&dir)?;
        // Restrict directory permissions to owner-only on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            let _ = std::fs::set_permissions(&dir, perms);
        }

        Ok(dir)
    }
}
