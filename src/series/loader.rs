use crate::series::catalog::GridCatalog;
use crate::series::error::ExtractError;
use crate::series::grid::GridSpec;
use crate::utils::get_cache_dir;
use async_compression::tokio::bufread::GzipDecoder;
use futures_util::TryStreamExt;
use log::{info, warn};
use polars::prelude::*;
use reqwest::Client;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::io::AsyncReadExt;
use tokio::{fs, task};
use tokio_util::io::StreamReader;

/// Downloads gzipped long-format catalog extracts and caches them as parquet.
pub struct CatalogLoader {
    cache_dir: PathBuf,
    download_client: Client,
}

impl CatalogLoader {
    pub fn new(cache_dir: &Path) -> CatalogLoader {
        CatalogLoader {
            cache_dir: cache_dir.to_path_buf(),
            download_client: Client::new(),
        }
    }

    /// Loader caching into the platform cache directory.
    pub fn with_default_cache_dir() -> Result<CatalogLoader, ExtractError> {
        let cache_dir = get_cache_dir().ok_or(ExtractError::CacheDirResolution)?;
        Ok(Self::new(&cache_dir))
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the extract stored under `cache_key`, downloading `url` on a cache miss.
    ///
    /// `url` must point at a gzipped CSV with a header row.
    pub async fn get_frame(&self, url: &str, cache_key: &str) -> Result<LazyFrame, ExtractError> {
        let parquet_path = self.cache_dir.join(format!("{cache_key}.parquet"));

        if fs::metadata(&parquet_path).await.is_ok() {
            info!("Cache hit for catalog '{}' at {:?}", cache_key, parquet_path);
        } else {
            warn!(
                "Cache miss for catalog '{}'. Downloading and processing.",
                cache_key
            );
            let raw_bytes = self.download(url).await?;
            let df = Self::csv_to_dataframe(raw_bytes, cache_key).await?;

            fs::create_dir_all(&self.cache_dir)
                .await
                .map_err(|e| ExtractError::CacheDirCreation(self.cache_dir.clone(), e))?;
            Self::cache_dataframe(df, &parquet_path).await?;
            info!("Cached catalog '{}' to {:?}", cache_key, parquet_path);
        }

        LazyFrame::scan_parquet(&parquet_path, Default::default())
            .map_err(|e| ExtractError::ParquetScan(parquet_path.clone(), e))
    }

    /// [`get_frame`](Self::get_frame) wrapped as a [`GridCatalog`] on `grid`.
    pub async fn load_catalog(
        &self,
        url: &str,
        cache_key: &str,
        grid: GridSpec,
    ) -> Result<GridCatalog, ExtractError> {
        let frame = self.get_frame(url, cache_key).await?;
        GridCatalog::from_lazyframe(cache_key, grid, frame)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ExtractError> {
        info!("Downloading catalog extract from {}", url);

        let response = self
            .download_client
            .get(url)
            .send()
            .await
            .map_err(|e| ExtractError::NetworkRequest(url.to_string(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(match e.status() {
                    Some(status) => ExtractError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    },
                    None => ExtractError::NetworkRequest(url.to_string(), e),
                });
            }
        };

        let stream = response.bytes_stream().map_err(std::io::Error::other);
        let mut decoder = GzipDecoder::new(StreamReader::new(stream));
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .await
            .map_err(ExtractError::DownloadIo)?;
        info!("Downloaded and decompressed {} bytes", decompressed.len());
        Ok(decompressed)
    }

    async fn csv_to_dataframe(bytes: Vec<u8>, cache_key: &str) -> Result<DataFrame, ExtractError> {
        let catalog = cache_key.to_string();
        task::spawn_blocking(move || {
            let mut temp_file = NamedTempFile::new().map_err(ExtractError::DownloadIo)?;
            temp_file
                .write_all(&bytes)
                .and_then(|_| temp_file.flush())
                .map_err(ExtractError::DownloadIo)?;

            CsvReadOptions::default()
                .with_has_header(true)
                .try_into_reader_with_file_path(Some(temp_file.path().to_path_buf()))
                .and_then(|reader| reader.finish())
                .map_err(|source| ExtractError::CsvRead { catalog, source })
        })
        .await?
    }

    async fn cache_dataframe(mut df: DataFrame, path: &Path) -> Result<(), ExtractError> {
        let path_buf = path.to_path_buf();
        task::spawn_blocking(move || {
            let file = std::fs::File::create(&path_buf)
                .map_err(|e| ExtractError::ParquetWriteIo(path_buf.clone(), e))?;
            ParquetWriter::new(file)
                .with_compression(ParquetCompression::Snappy)
                .finish(&mut df)
                .map_err(|e| ExtractError::ParquetWritePolars(path_buf, e))?;
            Ok::<(), ExtractError>(())
        })
        .await??;
        Ok(())
    }
}
