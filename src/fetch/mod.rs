//! Remote ingestion: direct URL download or GitHub clone-and-repack.

mod github;

pub use github::fetch_github_repo;

use crate::error::{CodepromptError, Result};

/// Download a file over HTTP. Non-success status is a hard failure.
pub async fn fetch_url(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| CodepromptError::Upstream(format!("Fetch failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(CodepromptError::Upstream(format!(
            "HTTP error! status: {}",
            status.as_u16()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| CodepromptError::Upstream(format!("Fetch failed: {}", e)))?;
    Ok(bytes.to_vec())
}

/// Derive the stored archive name from a fetch URL: the last path segment,
/// or a generic fallback when the URL has none.
pub fn filename_from_url(url: &str) -> String {
    let segment = url.trim_end_matches('/').rsplit('/').next().unwrap_or("");
    let name = segment.split('?').next().unwrap_or("");
    if name.is_empty() {
        "download.zip".to_string()
    } else {
        name.to_string()
    }
}

/// Derive the stored archive name for a cloned repository:
/// `<repo-name>.zip` with any `.git` suffix removed.
pub fn filename_from_repo_url(url: &str) -> String {
    let name = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("repository");
    format!("{}.zip", name.trim_end_matches(".git"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_from_url() {
        assert_eq!(filename_from_url("https://x.dev/archives/proj.zip"), "proj.zip");
        assert_eq!(filename_from_url("https://x.dev/proj.zip?token=abc"), "proj.zip");
        assert_eq!(filename_from_url("https://x.dev/"), "x.dev");
    }

    #[test]
    fn test_filename_from_repo_url() {
        assert_eq!(
            filename_from_repo_url("https://github.com/owner/repo"),
            "repo.zip"
        );
        assert_eq!(
            filename_from_repo_url("https://github.com/owner/repo.git"),
            "repo.zip"
        );
        assert_eq!(
            filename_from_repo_url("https://github.com/owner/repo/"),
            "repo.zip"
        );
    }
}
