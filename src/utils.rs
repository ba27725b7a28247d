use std::io;
use std::path::{Path, PathBuf};

const CACHE_DIR_NAME: &str = "era5_basin_cache";
const EXPORT_DIR_NAME: &str = "era5_basin_exports";

/// Directory catalog downloads are cached in, if the platform has a cache directory.
pub fn get_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|p| p.join(CACHE_DIR_NAME))
}

/// Root directory export folders are created under, if the platform has a data directory.
pub fn get_export_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join(EXPORT_DIR_NAME))
}

/// Creates `path` as a directory unless it already is one.
pub async fn ensure_dir_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("path exists but is not a directory: {}", path.display()),
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::info!("Creating directory: {}", path.display());
            tokio::fs::create_dir_all(path).await
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ensure_dir_exists() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let nested = dir.path().join("GEE").join("nested");
        ensure_dir_exists(&nested).await?;
        ensure_dir_exists(&nested).await?;
        assert!(nested.is_dir());

        let file = dir.path().join("file");
        std::fs::write(&file, b"x")?;
        assert!(ensure_dir_exists(&file).await.is_err());
        Ok(())
    }
}
