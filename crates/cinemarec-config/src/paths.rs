use anyhow::Result;
use std::path::{Path, PathBuf};

/// Base directory override from the environment (`CINEMAREC_BASE_PATH`)
pub fn base_path_override() -> Option<PathBuf> {
    std::env::var("CINEMAREC_BASE_PATH").ok().filter(|v| !v.is_empty()).map(PathBuf::from)
}

pub struct PathManager {
    config_dir: PathBuf,
    log_dir: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("cinemarec");

        Ok(Self::with_base(base_dir))
    }

    pub fn with_base(base: PathBuf) -> Self {
        Self {
            log_dir: base.join("logs"),
            config_dir: base,
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.config_dir.join("credentials.toml")
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join("cinemarec.log")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}

impl Default for PathManager {
    fn default() -> Self {
        if let Some(base) = base_path_override() {
            return Self::with_base(base);
        }

        // Platform-specific paths (e.g., ~/.config/cinemarec on Linux), falling back to
        // the working directory when no config directory exists
        Self::new().unwrap_or_else(|_| Self::with_base(PathBuf::from(".cinemarec")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_under_base() {
        let paths = PathManager::with_base(PathBuf::from("/tmp/cinemarec-test"));
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/cinemarec-test/config.toml"));
        assert_eq!(paths.credentials_file(), PathBuf::from("/tmp/cinemarec-test/credentials.toml"));
        assert_eq!(paths.log_file(), PathBuf::from("/tmp/cinemarec-test/logs/cinemarec.log"));
    }
}
