//! External collaborators: where images come from and where exports go
//!
//! Capture and upload are performed by the host. The editor only needs
//! these narrow async seams.

use anyhow::Context;
use futures::future::BoxFuture;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::editor::Editor;
use crate::export::ExportOutput;

/// Anything that can produce a source image (screen, tab, file...)
pub trait CaptureSource {
    fn capture(&self) -> BoxFuture<'_, anyhow::Result<RgbaImage>>;
}

/// Where the host stored an upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub url: String,
    #[serde(default)]
    pub delete_url: Option<String>,
}

/// Publishes an encoded export
pub trait Uploader {
    fn upload<'a>(&'a self, output: &'a ExportOutput) -> BoxFuture<'a, anyhow::Result<UploadReceipt>>;
}

/// Capture an image and open an editor on it
pub async fn open_capture(source: &dyn CaptureSource) -> anyhow::Result<Editor> {
    let image = source.capture().await.context("Capture failed")?;
    if image.width() == 0 || image.height() == 0 {
        anyhow::bail!("Capture returned an empty image");
    }
    log::info!("Captured {}x{} image", image.width(), image.height());
    Ok(Editor::new(image))
}

/// Upload an export, logging where it went
pub async fn publish(uploader: &dyn Uploader, output: &ExportOutput) -> anyhow::Result<UploadReceipt> {
    let receipt = uploader
        .upload(output)
        .await
        .with_context(|| format!("Failed to upload {} export", output.format))?;
    log::info!("Uploaded export to {}", receipt.url);
    Ok(receipt)
}
