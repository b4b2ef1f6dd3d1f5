use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppResult, profiles::GithubIdentity};

const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const API_BASE_URL: &str = "https://api.github.com";
const SCOPE: &str = "read:user";

pub struct GithubOAuth {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    callback_url: String,
}

impl GithubOAuth {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        if config.github_client_id.is_empty() || config.github_client_secret.is_empty() {
            tracing::warn!("GITHUB_CLIENT_ID or GITHUB_CLIENT_SECRET missing, login will fail");
        }
        Self {
            client,
            client_id: config.github_client_id.clone(),
            client_secret: config.github_client_secret.clone(),
            callback_url: config.github_callback_url.clone(),
        }
    }

    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{AUTHORIZE_URL}?client_id={}&redirect_uri={}&scope={}&state={}",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.callback_url),
            urlencoding::encode(SCOPE),
            urlencoding::encode(state),
        )
    }

    pub async fn exchange_code(&self, code: &str) -> AppResult<String> {
        let body = TokenRequest {
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            code,
            redirect_uri: &self.callback_url,
        };

        let resp: TokenResponse = self
            .client
            .post(TOKEN_URL)
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match resp {
            TokenResponse::Token { access_token } => Ok(access_token),
            TokenResponse::Error { error, error_description } => Err(anyhow::anyhow!(
                "github token exchange failed: {error} ({})",
                error_description.unwrap_or_default()
            )
            .into()),
        }
    }

    pub async fn fetch_identity(&self, access_token: String) -> AppResult<GithubIdentity> {
        let user: GithubUser = self
            .client
            .get(format!("{API_BASE_URL}/user"))
            .header(ACCEPT, "application/vnd.github+json")
            .bearer_auth(&access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(GithubIdentity {
            github_id: user.id,
            username: user.login,
            avatar_url: user.avatar_url,
            access_token,
        })
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TokenResponse {
    Token { access_token: String },
    Error { error: String, error_description: Option<String> },
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    id: i64,
    login: String,
    avatar_url: Option<String>,
}
