//! Image lookup and upload for catalog rows.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use stockroom_core::models::{AssetReference, ResolvedAsset};
use stockroom_core::AppError;
use stockroom_storage::Storage;
use uuid::Uuid;

use crate::archive::find_local_image;
use crate::error::AssetError;
use crate::ssrf::validate_url_for_ssrf;

/// Redirect hops followed for one remote image, each re-checked
const MAX_REDIRECTS: usize = 5;

/// Where image references in a job may point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMode {
    /// Files bundled in the uploaded archive (public URLs are accepted too)
    Archive,
    /// Public http(s) URLs only
    Remote,
}

/// Parse `value` as an absolute http(s) URL with a host.
///
/// Syntax only; whether the host may be fetched is decided at upload time.
pub fn parse_public_url(value: &str) -> Option<reqwest::Url> {
    let url = reqwest::Url::parse(value).ok()?;
    let web = url.scheme() == "http" || url.scheme() == "https";
    (web && url.host_str().is_some_and(|h| !h.is_empty())).then_some(url)
}

/// Turn a row's image reference into a concrete source.
///
/// `root` is the extraction directory and is only consulted in [`ImageMode::Archive`].
pub fn resolve_reference(
    reference: &str,
    mode: ImageMode,
    root: Option<&Path>,
) -> Result<AssetReference, AssetError> {
    let reference = reference.trim();
    if let Some(url) = parse_public_url(reference) {
        return Ok(AssetReference::Remote {
            url: url.to_string(),
        });
    }

    match (mode, root) {
        (ImageMode::Archive, Some(root)) => find_local_image(root, reference)
            .map(|path| AssetReference::Local { path })
            .ok_or_else(|| AssetError::LocalNotFound(reference.to_string())),
        (ImageMode::Archive, None) => Err(AssetError::LocalNotFound(reference.to_string())),
        (ImageMode::Remote, _) => Err(AssetError::NotPublicUrl),
    }
}

/// Upload seam between the pipeline and the asset host
#[async_trait]
pub trait AssetUploader: Send + Sync {
    async fn upload(
        &self,
        owner_id: Uuid,
        source: &AssetReference,
    ) -> Result<ResolvedAsset, AssetError>;

    /// Remove an asset whose row was not persisted
    async fn discard(&self, asset: &ResolvedAsset) -> Result<(), AssetError>;
}

/// MIME type for an image file extension
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_lowercase())
}

/// Uploads row images through the configured [`Storage`] backend
pub struct StorageAssetUploader {
    storage: Arc<dyn Storage>,
    client: reqwest::Client,
    max_remote_bytes: usize,
    allow_private_ips: bool,
}

impl StorageAssetUploader {
    pub fn new(
        storage: Arc<dyn Storage>,
        fetch_timeout: Duration,
        max_remote_bytes: usize,
    ) -> Result<Self, AppError> {
        // Redirects are followed by hand so every hop goes through the URL check
        let client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            storage,
            client,
            max_remote_bytes,
            allow_private_ips: false,
        })
    }

    /// Permit remote images on loopback and private networks
    pub fn allow_private_ips(mut self, allow: bool) -> Self {
        self.allow_private_ips = allow;
        self
    }

    async fn read_local(&self, path: &Path) -> Result<(Vec<u8>, Option<String>), AssetError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| AssetError::Upload(format!("Failed to read image file {}: {}", name, e)))?;
        Ok((data, extension_of(&name)))
    }

    async fn fetch_remote(&self, url: &str) -> Result<(Vec<u8>, Option<String>), AssetError> {
        let mut current = reqwest::Url::parse(url)
            .map_err(|e| AssetError::Upload(format!("Invalid image URL {}: {}", url, e)))?;
        let mut redirects = 0;

        let response = loop {
            validate_url_for_ssrf(&current, self.allow_private_ips)
                .await
                .map_err(|reason| {
                    tracing::warn!(url = %current, reason = %reason, "Image URL rejected");
                    AssetError::UnsafeUrl(reason)
                })?;

            let response = self.client.get(current.clone()).send().await.map_err(|e| {
                tracing::warn!(error = %e, url = %current, "Failed to download image");
                AssetError::Upload(format!("Failed to download image from {}: {}", url, e))
            })?;

            if !response.status().is_redirection() {
                break response;
            }
            if redirects == MAX_REDIRECTS {
                return Err(AssetError::Upload(format!(
                    "Image URL {} redirected more than {} times",
                    url, MAX_REDIRECTS
                )));
            }

            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    AssetError::Upload(format!("Image URL {} redirected without a location", url))
                })?;
            current = current.join(location).map_err(|e| {
                AssetError::Upload(format!("Invalid redirect from {}: {}", url, e))
            })?;
            redirects += 1;
        };

        if !response.status().is_success() {
            return Err(AssetError::Upload(format!(
                "Image URL {} returned status code: {}",
                url,
                response.status()
            )));
        }

        if response
            .content_length()
            .is_some_and(|len| len > self.max_remote_bytes as u64)
        {
            return Err(AssetError::Upload(format!(
                "Image at {} exceeds the {} byte limit",
                url, self.max_remote_bytes
            )));
        }

        let extension = response
            .url()
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .and_then(extension_of);

        let data = response
            .bytes()
            .await
            .map_err(|e| AssetError::Upload(format!("Failed to read image from {}: {}", url, e)))?
            .to_vec();

        if data.len() > self.max_remote_bytes {
            return Err(AssetError::Upload(format!(
                "Image at {} exceeds the {} byte limit",
                url, self.max_remote_bytes
            )));
        }

        Ok((data, extension))
    }
}

#[async_trait]
impl AssetUploader for StorageAssetUploader {
    #[tracing::instrument(skip(self, source), fields(owner_id = %owner_id))]
    async fn upload(
        &self,
        owner_id: Uuid,
        source: &AssetReference,
    ) -> Result<ResolvedAsset, AssetError> {
        let (data, extension) = match source {
            AssetReference::Local { path } => self.read_local(path).await?,
            AssetReference::Remote { url } => self.fetch_remote(url).await?,
        };

        let extension = extension.unwrap_or_else(|| "bin".to_string());
        let filename = format!("{}.{}", Uuid::new_v4(), extension);
        let content_type = content_type_for_extension(&extension);

        let (key, url) = self
            .storage
            .upload(owner_id, &filename, content_type, data)
            .await
            .map_err(|e| AssetError::Upload(e.to_string()))?;

        Ok(ResolvedAsset {
            url,
            public_id: key,
            provider: self.storage.backend_type().to_string(),
        })
    }

    async fn discard(&self, asset: &ResolvedAsset) -> Result<(), AssetError> {
        self.storage
            .delete(&asset.public_id)
            .await
            .map_err(|e| AssetError::Upload(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use stockroom_storage::LocalStorage;
    use tempfile::tempdir;

    #[test]
    fn test_parse_public_url() {
        assert!(parse_public_url("https://cdn.example.com/rim.jpg").is_some());
        assert!(parse_public_url("http://cdn.example.com").is_some());
        assert!(parse_public_url("ftp://cdn.example.com/rim.jpg").is_none());
        assert!(parse_public_url("rim1.jpg").is_none());
        assert!(parse_public_url("file:///etc/passwd").is_none());
    }

    #[test]
    fn test_remote_mode_requires_public_url() {
        let err = resolve_reference("rim1.jpg", ImageMode::Remote, None).unwrap_err();
        assert!(err.to_string().contains("must be a public URL"));

        let resolved =
            resolve_reference(" https://cdn.example.com/rim.jpg ", ImageMode::Remote, None).unwrap();
        assert_eq!(
            resolved,
            AssetReference::Remote {
                url: "https://cdn.example.com/rim.jpg".to_string()
            }
        );
    }

    #[test]
    fn test_archive_mode_resolves_local_files() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Images")).unwrap();
        fs::write(dir.path().join("Images/spoiler.jpg"), b"jpeg").unwrap();

        let resolved =
            resolve_reference("spoiler.jpg", ImageMode::Archive, Some(dir.path())).unwrap();
        assert_eq!(
            resolved,
            AssetReference::Local {
                path: dir.path().join("Images/spoiler.jpg")
            }
        );

        let err = resolve_reference("missing.jpg", ImageMode::Archive, Some(dir.path())).unwrap_err();
        assert_eq!(err.to_string(), "Image file not found: missing.jpg");
    }

    #[test]
    fn test_content_type_for_extension() {
        assert_eq!(content_type_for_extension("JPG"), "image/jpeg");
        assert_eq!(content_type_for_extension("webp"), "image/webp");
        assert_eq!(content_type_for_extension("exe"), "application/octet-stream");
    }

    async fn uploader(root: &Path) -> (StorageAssetUploader, Arc<dyn Storage>) {
        let storage: Arc<dyn Storage> = Arc::new(
            LocalStorage::new(root.join("media"), "http://localhost:4000/media".to_string())
                .await
                .unwrap(),
        );
        let uploader = StorageAssetUploader::new(storage.clone(), Duration::from_secs(5), 1024)
            .unwrap()
            .allow_private_ips(true);
        (uploader, storage)
    }

    #[tokio::test]
    async fn test_upload_local_file_and_discard() {
        let dir = tempdir().unwrap();
        let image = dir.path().join("rim1.JPG");
        fs::write(&image, b"jpeg-bytes").unwrap();
        let (uploader, storage) = uploader(dir.path()).await;
        let owner = Uuid::new_v4();

        let asset = uploader
            .upload(owner, &AssetReference::Local { path: image })
            .await
            .unwrap();

        assert_eq!(asset.provider, "local");
        assert!(asset.public_id.starts_with(&format!("catalog/{}/", owner)));
        assert!(asset.public_id.ends_with(".jpg"));
        assert_eq!(storage.download(&asset.public_id).await.unwrap(), b"jpeg-bytes");

        uploader.discard(&asset).await.unwrap();
        assert!(!storage.exists(&asset.public_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_upload_remote_image() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/img/rim.png")
            .with_status(200)
            .with_body("png-bytes")
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let (uploader, storage) = uploader(dir.path()).await;
        let url = format!("{}/img/rim.png", server.url());

        let asset = uploader
            .upload(Uuid::new_v4(), &AssetReference::Remote { url })
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(asset.public_id.ends_with(".png"));
        assert_eq!(storage.download(&asset.public_id).await.unwrap(), b"png-bytes");
    }

    #[tokio::test]
    async fn test_upload_remote_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing.jpg")
            .with_status(404)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let (uploader, _) = uploader(dir.path()).await;
        let url = format!("{}/missing.jpg", server.url());

        let err = uploader
            .upload(Uuid::new_v4(), &AssetReference::Remote { url })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_upload_refuses_loopback_host_by_default() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/internal/secret.png")
            .with_status(200)
            .with_body("SECRET")
            .expect(0)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let (uploader, _) = uploader(dir.path()).await;
        let uploader = uploader.allow_private_ips(false);
        let url = format!("{}/internal/secret.png", server.url());

        let err = uploader
            .upload(Uuid::new_v4(), &AssetReference::Remote { url })
            .await
            .unwrap_err();

        assert!(matches!(err, AssetError::UnsafeUrl(_)));
        assert!(err.to_string().starts_with("Image URL not allowed"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_refuses_metadata_endpoint() {
        let dir = tempdir().unwrap();
        let (uploader, _) = uploader(dir.path()).await;
        let uploader = uploader.allow_private_ips(false);
        let url = "http://169.254.169.254/latest/meta-data/".to_string();

        let err = uploader
            .upload(Uuid::new_v4(), &AssetReference::Remote { url })
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::UnsafeUrl(_)));
    }

    #[tokio::test]
    async fn test_upload_follows_redirects() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/old/rim.jpg")
            .with_status(302)
            .with_header("location", "/new/rim.jpg")
            .create_async()
            .await;
        server
            .mock("GET", "/new/rim.jpg")
            .with_status(200)
            .with_body("moved-jpeg")
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let (uploader, storage) = uploader(dir.path()).await;
        let url = format!("{}/old/rim.jpg", server.url());

        let asset = uploader
            .upload(Uuid::new_v4(), &AssetReference::Remote { url })
            .await
            .unwrap();
        assert_eq!(storage.download(&asset.public_id).await.unwrap(), b"moved-jpeg");
    }

    #[tokio::test]
    async fn test_upload_rechecks_redirect_target() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rim.jpg")
            .with_status(301)
            .with_header("location", "file:///etc/passwd")
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let (uploader, _) = uploader(dir.path()).await;
        let url = format!("{}/rim.jpg", server.url());

        let err = uploader
            .upload(Uuid::new_v4(), &AssetReference::Remote { url })
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::UnsafeUrl(_)));
    }

    #[tokio::test]
    async fn test_upload_stops_redirect_loops() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/loop.jpg")
            .with_status(302)
            .with_header("location", "/loop.jpg")
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let (uploader, _) = uploader(dir.path()).await;
        let url = format!("{}/loop.jpg", server.url());

        let err = uploader
            .upload(Uuid::new_v4(), &AssetReference::Remote { url })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("redirected more than"));
    }

    #[tokio::test]
    async fn test_upload_remote_too_large() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/huge.jpg")
            .with_status(200)
            .with_body(vec![0u8; 4096])
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let (uploader, _) = uploader(dir.path()).await;
        let url = format!("{}/huge.jpg", server.url());

        let err = uploader
            .upload(Uuid::new_v4(), &AssetReference::Remote { url })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("byte limit"));
    }
}
