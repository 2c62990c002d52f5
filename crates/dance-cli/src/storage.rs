//! HTTP asset storage with an on-disk download cache.
//!
//! Remote references are streamed into the cache directory with progress
//! derived from `Content-Length`; local paths resolve in place.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, Url};
use tokio::io::AsyncWriteExt;

use dance_core::{AssetStorage, ProgressReporter};
use dance_types::AssetKind;

static PARTIAL_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, PartialEq, Eq)]
enum AssetSource {
    Remote(Url),
    Local(PathBuf),
}

pub struct HttpAssetStorage {
    client: Client,
    base_url: Option<String>,
    cache_dir: PathBuf,
}

impl HttpAssetStorage {
    pub fn new(base_url: Option<String>, cache_dir: PathBuf, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            base_url,
            cache_dir,
        })
    }

    fn source_for(&self, source_ref: &str) -> Result<AssetSource> {
        let trimmed = source_ref.trim();
        if let Some(path) = trimmed.strip_prefix("file://") {
            return Ok(AssetSource::Local(PathBuf::from(path)));
        }
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            let url = Url::parse(trimmed).with_context(|| format!("parse asset url {trimmed}"))?;
            return Ok(AssetSource::Remote(url));
        }
        match self.base_url.as_deref() {
            Some(base) => {
                let joined = format!("{}/{}", base, trimmed.trim_start_matches('/'));
                let url = Url::parse(&joined).with_context(|| format!("parse asset url {joined}"))?;
                Ok(AssetSource::Remote(url))
            }
            None => Ok(AssetSource::Local(PathBuf::from(trimmed))),
        }
    }

    fn cache_path(&self, kind: AssetKind, dance_id: &str, url: &Url) -> PathBuf {
        let ext = Path::new(url.path())
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("bin");
        self.cache_dir.join(kind.as_str()).join(format!(
            "{}-{}.{}",
            sanitize_segment(dance_id),
            hash_str(url.as_str()),
            ext
        ))
    }

    async fn resolve(
        &self,
        kind: AssetKind,
        dance_id: &str,
        source_ref: &str,
        progress: &ProgressReporter,
    ) -> Result<String> {
        match self.source_for(source_ref)? {
            AssetSource::Local(path) => {
                tokio::fs::metadata(&path)
                    .await
                    .with_context(|| format!("{kind} asset {:?} not found", path))?;
                Ok(path.to_string_lossy().to_string())
            }
            AssetSource::Remote(url) => {
                let target = self.cache_path(kind, dance_id, &url);
                if tokio::fs::try_exists(&target).await.unwrap_or(false) {
                    tracing::debug!(dance_id, %kind, path = %target.display(), "asset cache hit");
                } else {
                    self.download(&url, &target, progress).await?;
                }
                Ok(target.to_string_lossy().to_string())
            }
        }
    }

    async fn download(&self, url: &Url, target: &Path, progress: &ProgressReporter) -> Result<()> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("fetch asset {url}"))?;
        if !resp.status().is_success() {
            return Err(anyhow!("asset fetch failed with status {}", resp.status()));
        }
        let total = resp.content_length().unwrap_or(0);

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create cache dir {:?}", parent))?;
        }
        let partial = partial_path(target);
        let received = match write_body(resp, &partial, total, progress).await {
            Ok(received) => received,
            Err(err) => {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(err);
            }
        };
        if let Err(err) = tokio::fs::rename(&partial, target).await {
            let _ = tokio::fs::remove_file(&partial).await;
            if tokio::fs::try_exists(target).await.unwrap_or(false) {
                tracing::debug!(%url, path = %target.display(), "asset cached by concurrent download");
                return Ok(());
            }
            return Err(err).with_context(|| format!("move asset into cache {:?}", target));
        }

        tracing::info!(%url, bytes = received, path = %target.display(), "asset downloaded");
        Ok(())
    }
}

#[async_trait]
impl AssetStorage for HttpAssetStorage {
    async fn resolve_audio_url(
        &self,
        dance_id: &str,
        source_ref: &str,
        progress: &ProgressReporter,
    ) -> Result<String> {
        self.resolve(AssetKind::Audio, dance_id, source_ref, progress)
            .await
    }

    async fn resolve_animation_url(
        &self,
        dance_id: &str,
        source_ref: &str,
        progress: &ProgressReporter,
    ) -> Result<String> {
        self.resolve(AssetKind::Animation, dance_id, source_ref, progress)
            .await
    }
}

async fn write_body(
    resp: reqwest::Response,
    path: &Path,
    total: u64,
    progress: &ProgressReporter,
) -> Result<u64> {
    let mut file = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("create {:?}", path))?;
    let mut stream = resp.bytes_stream();
    let mut received = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("read asset body")?;
        file.write_all(&chunk)
            .await
            .with_context(|| format!("write {:?}", path))?;
        received += chunk.len() as u64;
        progress.report_bytes(received, total);
    }
    file.flush().await.with_context(|| format!("flush {:?}", path))?;
    Ok(received)
}

/// Download scratch file, unique per call so overlapping fetches of one URL
/// never share it.
fn partial_path(target: &Path) -> PathBuf {
    let seq = PARTIAL_SEQ.fetch_add(1, Ordering::Relaxed);
    let mut name = target
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}-{seq}.part", std::process::id()));
    target.with_file_name(name)
}

fn sanitize_segment(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "dance".to_string()
    } else {
        cleaned
    }
}

fn hash_str(value: &str) -> String {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
