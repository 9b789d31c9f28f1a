//! [`FileVault`] implementation over [`YandexDiskApi`].

use async_trait::async_trait;
use lightdesk_core::ports::{FileVault, PortError};
use lightdesk_core::submission::RemoteFile;

use crate::api::{VaultError, YandexDiskApi};

impl From<VaultError> for PortError {
    fn from(err: VaultError) -> Self {
        PortError::Remote(err.to_string())
    }
}

/// Every prefix of a slash-separated path, shortest first.
///
/// `"disk:/A/B"` yields `["disk:/A", "disk:/A/B"]`.
pub fn folder_chain(path: &str) -> Vec<String> {
    let (scheme, rest) = match path.split_once(":/") {
        Some((scheme, rest)) => (format!("{scheme}:/"), rest),
        None => (String::new(), path),
    };
    let mut chain = Vec::new();
    let mut current = scheme;
    for segment in rest.split('/').filter(|s| !s.is_empty()) {
        if !current.is_empty() && !current.ends_with('/') {
            current.push('/');
        }
        current.push_str(segment);
        chain.push(current.clone());
    }
    chain
}

#[async_trait]
impl FileVault for YandexDiskApi {
    async fn ensure_folder(&self, path: &str) -> Result<(), PortError> {
        for folder in folder_chain(path) {
            self.create_folder(&folder).await?;
        }
        tracing::debug!(path, "Folder ensured");
        Ok(())
    }

    async fn upload_bytes(&self, path: &str, bytes: Vec<u8>, overwrite: bool) -> Result<(), PortError> {
        let size = bytes.len();
        self.upload(path, bytes, overwrite).await?;
        tracing::info!(path, size, "File uploaded");
        Ok(())
    }

    async fn list_files(&self, folder: &str) -> Result<Vec<RemoteFile>, PortError> {
        Ok(YandexDiskApi::list_files(self, folder)
            .await?
            .into_iter()
            .map(|r| RemoteFile {
                name: r.name,
                path: r.path,
            })
            .collect())
    }

    async fn get_download_url(&self, path: &str) -> Result<String, PortError> {
        Ok(self.download_url(path).await?)
    }

    async fn download_bytes(&self, path: &str) -> Result<Vec<u8>, PortError> {
        Ok(self.download(path).await?)
    }

    async fn delete_folder(&self, path: &str, permanent: bool) -> Result<(), PortError> {
        self.delete(path, permanent).await?;
        tracing::info!(path, permanent, "Folder deleted");
        Ok(())
    }
}
