//! File transfer contract and the HTTP(S) implementation
//!
//! Job session directories are exposed by computing services as browsable
//! trees. [`HttpTransfer`] walks the HTML directory listings served by A-REX
//! style services:
//!
//! ```text
//! <LI><I>file</I> <A HREF="https://ce/jobs/1/out.txt">out.txt</A> - 12 bytes
//! <LI><I>dir</I> <A HREF="https://ce/jobs/1/log">log</A>
//! ```

use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use tracing::debug;
use url::Url;

use crate::error::{ClientError, Result};

/// Moves files out of remote job directories
#[async_trait]
pub trait FileTransfer: Send + Sync {
    /// List every file below `dir`, recursively
    ///
    /// # Returns
    /// Paths relative to `dir`, using `/` as separator
    async fn list_files(&self, dir: &Url) -> Result<Vec<String>>;

    /// Copy one remote file to a local path, creating parent directories
    async fn copy(&self, source: &Url, destination: &Path) -> Result<()>;

    /// Fetch the content of one remote file
    async fn fetch(&self, source: &Url) -> Result<Vec<u8>>;
}

/// [`FileTransfer`] over HTTP(S)
#[derive(Debug, Clone, Default)]
pub struct HttpTransfer {
    client: Client,
}

impl HttpTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transfer client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Turn non-success status codes into errors
    async fn handle_response(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(response.url().to_string()));
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(response)
    }

    async fn get(&self, url: &Url) -> Result<reqwest::Response> {
        let response = self.client.get(url.clone()).send().await?;
        self.handle_response(response).await
    }
}

#[async_trait]
impl FileTransfer for HttpTransfer {
    async fn list_files(&self, dir: &Url) -> Result<Vec<String>> {
        let mut files = Vec::new();
        let mut pending = vec![(as_directory(dir), String::new())];

        while let Some((url, prefix)) = pending.pop() {
            debug!(url = %url, "Listing remote directory");
            let html = self.get(&url).await?.text().await?;

            for entry in parse_listing(&html) {
                let path = format!("{}{}", prefix, entry.name);
                match entry.kind {
                    EntryKind::File => files.push(path),
                    EntryKind::Directory => {
                        let child = url.join(&entry.href).map_err(|e| {
                            ClientError::ParseError(format!("Bad listing link '{}': {}", entry.href, e))
                        })?;
                        pending.push((as_directory(&child), format!("{}/", path)));
                    }
                }
            }
        }

        files.sort();
        Ok(files)
    }

    async fn copy(&self, source: &Url, destination: &Path) -> Result<()> {
        let bytes = self.fetch(source).await?;
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(destination, bytes).await?;
        debug!(source = %source, destination = %destination.display(), "Copied file");
        Ok(())
    }

    async fn fetch(&self, source: &Url) -> Result<Vec<u8>> {
        let bytes = self.get(source).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

fn as_directory(url: &Url) -> Url {
    let mut url = url.clone();
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ListingEntry {
    kind: EntryKind,
    href: String,
    name: String,
}

/// Extract file and directory entries from an HTML listing
///
/// Anything not shaped like a listing item is skipped, and so is a name
/// that is not a single path segment.
fn parse_listing(html: &str) -> Vec<ListingEntry> {
    // ASCII lowercasing keeps byte offsets aligned with `html`
    let lower = html.to_ascii_lowercase();
    let mut entries = Vec::new();

    for (start, _) in lower.match_indices("<li>") {
        let item = &lower[start..];
        let end = item[4..].find("<li>").map(|i| i + 4).unwrap_or(item.len());
        let item_lower = &item[..end];
        let item_raw = &html[start..start + end];

        let kind = if item_lower.starts_with("<li><i>file</i>") {
            EntryKind::File
        } else if item_lower.starts_with("<li><i>dir</i>") {
            EntryKind::Directory
        } else {
            continue;
        };

        let Some(href_at) = item_lower.find("href=\"") else {
            continue;
        };
        let href_start = href_at + "href=\"".len();
        let Some(href_len) = item_lower[href_start..].find('"') else {
            continue;
        };
        let href = &item_raw[href_start..href_start + href_len];

        let after_href = href_start + href_len;
        let Some(gt) = item_lower[after_href..].find('>') else {
            continue;
        };
        let name_start = after_href + gt + 1;
        let Some(name_len) = item_lower[name_start..].find("</a>") else {
            continue;
        };
        let name = item_raw[name_start..name_start + name_len].trim();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            continue;
        }

        entries.push(ListingEntry {
            kind,
            href: href.to_string(),
            name: name.to_string(),
        });
    }

    entries
}
