use std::collections::BTreeMap;

use reqwest::header::{AUTHORIZATION, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::publish::PublishError;

pub const DEFAULT_GIST_ENDPOINT: &str = "https://api.github.com/gists";

const CLIENT_AGENT: &str = concat!("osa-differ/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct GistRequest<'a> {
    description: String,
    public: bool,
    files: BTreeMap<String, GistFile<'a>>,
}

#[derive(Debug, Serialize)]
struct GistFile<'a> {
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct GistResponse {
    html_url: Option<String>,
}

/// Anything outside `[A-Za-z0-9._-]` becomes `_`
fn file_name_part(reference: &str) -> String {
    reference
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Posts reports to a GitHub-compatible gist endpoint
#[derive(Debug, Clone)]
pub struct GistClient {
    endpoint: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl Default for GistClient {
    fn default() -> Self {
        Self::new(DEFAULT_GIST_ENDPOINT)
    }
}

impl GistClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: None,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// File name the report is stored under, e.g. `stable/newton` becomes
    /// `stable_newton`
    pub fn file_name(old_ref: &str, new_ref: &str) -> String {
        format!(
            "osa-differ-{}-{}.rst",
            file_name_part(old_ref),
            file_name_part(new_ref)
        )
    }

    /// Create a public gist holding `report`, returning its URL
    pub async fn post(
        &self,
        report: &str,
        old_ref: &str,
        new_ref: &str,
    ) -> Result<String, PublishError> {
        let mut files = BTreeMap::new();
        files.insert(
            Self::file_name(old_ref, new_ref),
            GistFile { content: report },
        );
        let body = GistRequest {
            description: format!("OpenStack-Ansible diff from {} to {}", old_ref, new_ref),
            public: true,
            files,
        };

        let mut request = self
            .http
            .post(&self.endpoint)
            .header(USER_AGENT, CLIENT_AGENT)
            .json(&body);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("token {}", token));
        }

        debug!(endpoint = %self.endpoint, "Posting gist");
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let gist: GistResponse = response.json().await?;
        gist.html_url.ok_or(PublishError::MissingUrl)
    }
}
