use bytes::Bytes;
use std::{collections::HashMap, fmt::Debug, str::FromStr, time::Duration};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::errors::{CodecError, GeoRasterError};

/// Where the container bytes come from.
pub enum Source {
    Buffer(Bytes),
    Url { url: String, options: UrlOptions },
    Blob(Box<dyn AsyncRead + Send + Unpin>),
}

impl Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Buffer(bytes) => write!(f, "Buffer({} bytes)", bytes.len()),
            Source::Url { url, options } => f
                .debug_struct("Url")
                .field("url", url)
                .field("options", options)
                .finish(),
            Source::Blob(_) => f.write_str("Blob"),
        }
    }
}

impl From<Vec<u8>> for Source {
    fn from(value: Vec<u8>) -> Self {
        Self::Buffer(value.into())
    }
}

impl From<Bytes> for Source {
    fn from(value: Bytes) -> Self {
        Self::Buffer(value)
    }
}

impl Source {
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url {
            url: url.into(),
            options: UrlOptions::default(),
        }
    }

    pub fn blob(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self::Blob(Box::new(reader))
    }

    pub fn source_type(&self) -> SourceType {
        match self {
            Source::Buffer(_) => SourceType::Buffer,
            Source::Url { .. } => SourceType::Url,
            Source::Blob(_) => SourceType::Blob,
        }
    }

    /// Resolves the source into the full container bytes.
    pub async fn fetch(self, client: &reqwest::Client) -> Result<Bytes, CodecError> {
        match self {
            Source::Buffer(bytes) => Ok(bytes),
            Source::Url { url, options } => {
                let mut request = client.get(&url);
                for (name, value) in &options.headers {
                    request = request.header(name, value);
                }
                if let Some(timeout) = options.timeout {
                    request = request.timeout(timeout);
                }
                Ok(request.send().await?.error_for_status()?.bytes().await?)
            }
            Source::Blob(mut reader) => {
                let mut buffer = Vec::new();
                reader.read_to_end(&mut buffer).await?;
                Ok(buffer.into())
            }
        }
    }
}

/// Options handed to the HTTP request of [Source::Url].
#[derive(serde::Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UrlOptions {
    pub headers: HashMap<String, String>,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    Buffer,
    Url,
    Blob,
}

impl FromStr for SourceType {
    type Err = GeoRasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buffer" | "arraybuffer" => Ok(Self::Buffer),
            "url" => Ok(Self::Url),
            "blob" => Ok(Self::Blob),
            _ => Err(GeoRasterError::InputShape(format!(
                "unknown source type `{s}`"
            ))),
        }
    }
}
