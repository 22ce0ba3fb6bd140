use std::path::{Path, PathBuf};

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use bytes::Bytes;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use tracing::{error, info};
use uuid::Uuid;

use folio_types::api::UploadResponse;
use folio_types::resource::Resource;

use crate::config::{CloudinaryConfig, Config, StorageConfig};
use crate::error::ApiError;
use crate::state::AppState;

/// 5 MiB upload limit for images
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
/// Request body cap on upload routes. Sits above `MAX_IMAGE_BYTES` so an
/// oversize image reaches the handler and is reported as `FileTooLarge`.
pub const UPLOAD_BODY_LIMIT: usize = 2 * MAX_IMAGE_BYTES;

/// Lowercased extension of `filename` if it is an allowed image type.
pub fn image_extension(filename: &str) -> Result<String, ApiError> {
    let (_, ext) = filename.rsplit_once('.').ok_or(ApiError::UnsupportedFileType)?;
    let ext = ext.to_ascii_lowercase();
    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(ApiError::UnsupportedFileType)
    }
}

pub fn check_size(len: usize) -> Result<(), ApiError> {
    if len == 0 {
        return Err(ApiError::Validation("Uploaded file is empty".into()));
    }
    if len > MAX_IMAGE_BYTES {
        return Err(ApiError::FileTooLarge);
    }
    Ok(())
}

// ── Backends ────────────────────────────────────────────────────────────

/// Images on local disk at `{dir}/{folder}/{name}`, served under `/uploads`.
pub struct LocalImageStore {
    dir: PathBuf,
    base_url: String,
}

impl LocalImageStore {
    pub async fn new(dir: PathBuf, base_url: impl Into<String>) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&dir).await?;
        info!("Image upload directory: {}", dir.display());
        Ok(Self {
            dir,
            base_url: base_url.into(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn store(&self, folder: &str, name: &str, bytes: &[u8]) -> Result<String, ApiError> {
        let dir = self.dir.join(folder);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ApiError::StorageBackend(format!("create {}: {}", dir.display(), e)))?;

        let path = dir.join(name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ApiError::StorageBackend(format!("write {}: {}", path.display(), e)))?;

        Ok(format!("{}/uploads/{}/{}", self.base_url, folder, name))
    }
}

#[derive(Deserialize)]
struct CloudinaryUpload {
    secure_url: String,
}

/// Signed uploads to Cloudinary's image API.
pub struct CloudinaryImageStore {
    client: reqwest::Client,
    config: CloudinaryConfig,
    endpoint: String,
}

impl CloudinaryImageStore {
    pub fn new(config: CloudinaryConfig) -> Self {
        let endpoint = format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            config.cloud_name
        );
        Self {
            client: reqwest::Client::new(),
            config,
            endpoint,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn store(&self, folder: &str, name: &str, bytes: Bytes) -> Result<String, ApiError> {
        let public_id = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
        let folder = format!("{}/{}", self.config.folder, folder);
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[
                ("folder", folder.as_str()),
                ("public_id", public_id),
                ("timestamp", timestamp.as_str()),
            ],
            &self.config.api_secret,
        );

        let form = Form::new()
            .part("file", Part::bytes(bytes.to_vec()).file_name(name.to_string()))
            .text("api_key", self.config.api_key.clone())
            .text("folder", folder)
            .text("public_id", public_id.to_string())
            .text("timestamp", timestamp)
            .text("signature", signature);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::StorageBackend(format!("Cloudinary request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::StorageBackend(format!(
                "Cloudinary returned {}: {}",
                status, body
            )));
        }

        let uploaded: CloudinaryUpload = response
            .json()
            .await
            .map_err(|e| ApiError::StorageBackend(format!("Cloudinary response unreadable: {}", e)))?;
        Ok(uploaded.secure_url)
    }
}

/// Cloudinary request signature: parameters sorted by name, joined as a
/// query string, secret appended, SHA-1, hex.
pub fn sign_params(params: &[(&str, &str)], secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    hex::encode(Sha1::digest(format!("{}{}", joined, secret).as_bytes()))
}

pub enum ImageStore {
    Local(LocalImageStore),
    Cloudinary(CloudinaryImageStore),
}

impl ImageStore {
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        match &config.storage {
            StorageConfig::Local => Ok(Self::Local(
                LocalImageStore::new(config.upload_dir.clone(), config.public_base_url.clone()).await?,
            )),
            StorageConfig::Cloudinary(cloudinary) => {
                info!(cloud = %cloudinary.cloud_name, "Image uploads go to Cloudinary");
                Ok(Self::Cloudinary(CloudinaryImageStore::new(cloudinary.clone())))
            }
        }
    }

    /// Directory to serve under `/uploads`, when images live on local disk.
    pub fn local_dir(&self) -> Option<&Path> {
        match self {
            Self::Local(local) => Some(local.dir()),
            Self::Cloudinary(_) => None,
        }
    }

    /// Persist `bytes` as `folder/name` and return its public URL.
    pub async fn store(&self, folder: &str, name: &str, bytes: Bytes) -> Result<String, ApiError> {
        match self {
            Self::Local(local) => local.store(folder, name, &bytes).await,
            Self::Cloudinary(cloudinary) => cloudinary.store(folder, name, bytes).await,
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────────

/// POST /api/{collection}/upload: multipart image upload.
///
/// Validation order: the declared extension first (before any bytes are read),
/// then size. The stored name is a fresh UUID; the client's filename is only
/// consulted for its extension.
pub async fn upload_image<R: Resource>(
    State(state): State<AppState>,
    WithRejection(mut multipart, _): WithRejection<Multipart, ApiError>,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let collection = R::SCHEMA.collection;

    while let Some(field) = multipart.next_field().await? {
        let Some(original) = field.file_name().map(str::to_string) else {
            continue;
        };

        let ext = image_extension(&original)?;
        let bytes = field.bytes().await?;
        check_size(bytes.len())?;

        let name = format!("{}.{}", Uuid::new_v4(), ext);
        let size = bytes.len();
        let url = state.images.store(collection, &name, bytes).await.map_err(|e| {
            error!(collection, stored = %name, "Image upload failed: {}", e);
            e
        })?;

        info!(collection, original = %original, stored = %name, size, "Image uploaded");
        return Ok((StatusCode::CREATED, Json(UploadResponse { image_url: url })));
    }

    Err(ApiError::Validation("No file provided".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_are_case_insensitive() {
        assert_eq!(image_extension("photo.PNG").unwrap(), "png");
        assert_eq!(image_extension("a.b.JpEg").unwrap(), "jpeg");
        assert_eq!(image_extension("x.webp").unwrap(), "webp");
    }

    #[test]
    fn disallowed_extensions_are_rejected() {
        for name in ["a.exe", "noext", "image.png.exe", "archive.tar.gz", "svg.svg"] {
            assert!(
                matches!(image_extension(name), Err(ApiError::UnsupportedFileType)),
                "{name}"
            );
        }
    }

    #[test]
    fn size_cap_is_inclusive() {
        assert!(check_size(MAX_IMAGE_BYTES).is_ok());
        assert!(matches!(check_size(MAX_IMAGE_BYTES + 1), Err(ApiError::FileTooLarge)));
        assert!(matches!(check_size(0), Err(ApiError::Validation(_))));
    }

    #[test]
    fn signature_sorts_parameters() {
        let expected = "af9e5cbf03dbd1755159b66aeaba563133804be8";
        let signed = sign_params(
            &[
                ("timestamp", "1315060510"),
                ("public_id", "abc"),
                ("folder", "portfolio/projects"),
            ],
            "abcd",
        );
        assert_eq!(signed, expected);
    }

    #[tokio::test]
    async fn local_store_writes_under_folder() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::Local(
            LocalImageStore::new(dir.path().to_path_buf(), "http://localhost:8000")
                .await
                .unwrap(),
        );

        let url = store
            .store("projects", "abc.png", Bytes::from_static(b"\x89PNG"))
            .await
            .unwrap();

        assert_eq!(url, "http://localhost:8000/uploads/projects/abc.png");
        let written = std::fs::read(dir.path().join("projects").join("abc.png")).unwrap();
        assert_eq!(written, b"\x89PNG");
        assert_eq!(store.local_dir(), Some(dir.path()));
    }

    #[tokio::test]
    async fn unreachable_cloudinary_is_a_backend_error() {
        let store = ImageStore::Cloudinary(
            CloudinaryImageStore::new(CloudinaryConfig {
                cloud_name: "demo".into(),
                api_key: "key".into(),
                api_secret: "secret".into(),
                folder: "portfolio".into(),
            })
            .with_endpoint("http://127.0.0.1:9/image/upload"),
        );

        let err = store
            .store("projects", "abc.png", Bytes::from_static(b"\x89PNG"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::StorageBackend(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.local_dir(), None);
    }
}
