use crate::attachments::{display_name, Attachment, Preview, SelectedFile};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::DynamicImage;
use std::path::PathBuf;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::debug;

/// Longest edge of the decoded preview. The transport payload is never resized.
const MAX_PREVIEW_EDGE: u32 = 1600;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Could not read {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{name} is not a supported image format.")]
    UnsupportedFormat { name: String },
    #[error("Could not decode {name}: {reason}")]
    Decode { name: String, reason: String },
    #[error("Image conversion was interrupted: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Returns the payload part of a data URL: everything after the first comma.
pub fn strip_data_url_header(data_url: &str) -> &str {
    match data_url.find(',') {
        Some(index) => &data_url[index + 1..],
        None => data_url,
    }
}

/// Converts every selected file concurrently and returns the attachments in
/// selection order. Any single failure fails the whole batch. Dropping the
/// returned future aborts every conversion still running.
pub async fn ingest_all(files: Vec<SelectedFile>) -> Result<Vec<Attachment>, IngestError> {
    let mut slots: Vec<Option<Attachment>> = files.iter().map(|_| None).collect();
    let mut tasks = JoinSet::new();
    for (index, file) in files.into_iter().enumerate() {
        tasks.spawn(async move { (index, ingest_file(file.path).await) });
    }

    while let Some(joined) = tasks.join_next().await {
        let (index, result) = joined?;
        slots[index] = Some(result?);
    }

    Ok(slots.into_iter().flatten().collect())
}

async fn ingest_file(path: PathBuf) -> Result<Attachment, IngestError> {
    let name = display_name(&path);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|source| IngestError::Read {
            name: name.clone(),
            source,
        })?;
    debug!(file = %name, bytes = bytes.len(), "read attachment");

    tokio::task::spawn_blocking(move || convert(path, name, &bytes)).await?
}

fn convert(path: PathBuf, name: String, bytes: &[u8]) -> Result<Attachment, IngestError> {
    let format = image::guess_format(bytes).map_err(|_| IngestError::UnsupportedFormat {
        name: name.clone(),
    })?;
    let data_url = format!(
        "data:{};base64,{}",
        format.to_mime_type(),
        BASE64.encode(bytes)
    );
    let encoded = strip_data_url_header(&data_url).to_string();

    let decoded = image::load_from_memory_with_format(bytes, format).map_err(|err| {
        IngestError::Decode {
            name: name.clone(),
            reason: err.to_string(),
        }
    })?;
    let preview = preview_pixels(decoded, data_url);

    Ok(Attachment {
        path,
        name,
        preview,
        encoded,
    })
}

fn preview_pixels(image: DynamicImage, data_url: String) -> Preview {
    let image = if image.width() > MAX_PREVIEW_EDGE || image.height() > MAX_PREVIEW_EDGE {
        image.thumbnail(MAX_PREVIEW_EDGE, MAX_PREVIEW_EDGE)
    } else {
        image
    };
    let rgba = image.to_rgba8();

    Preview {
        data_url,
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    }
}
