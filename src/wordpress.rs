//! WordPress REST API publishing

use crate::{summary::GeneratedSummary, Error, Result};
use clap::ValueEnum;
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const CATEGORY_TIMEOUT: Duration = Duration::from_secs(10);
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(30);
const FALLBACK_CATEGORY_ID: u64 = 1;

/// Site and credentials for basic auth (application password)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordPressConfig {
    pub url: String,
    pub username: String,
    pub password: String,
}

impl WordPressConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).unwrap_or_default().trim().to_string();
        Self {
            url: get("WORDPRESS_URL").trim_end_matches('/').to_string(),
            username: get("WORDPRESS_USERNAME"),
            password: get("WORDPRESS_PASSWORD"),
        }
    }

    /// Fails on the first missing setting
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(Error::MissingWordPressSetting { key: "WORDPRESS_URL" });
        }
        if self.username.is_empty() {
            return Err(Error::MissingWordPressSetting {
                key: "WORDPRESS_USERNAME",
            });
        }
        if self.password.is_empty() {
            return Err(Error::MissingWordPressSetting {
                key: "WORDPRESS_PASSWORD",
            });
        }
        Ok(())
    }
}

/// Post visibility accepted by `/wp/v2/posts`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Publish,
    Future,
    Pending,
    Private,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Publish => "publish",
            PostStatus::Future => "future",
            PostStatus::Pending => "pending",
            PostStatus::Private => "private",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub title: String,
    pub content: String,
    pub status: PostStatus,
}

impl Post {
    /// A blank title is replaced by `Git Commit - {date}`
    pub fn new(title: impl Into<String>, content: impl Into<String>, status: PostStatus) -> Self {
        let title: String = title.into();
        let title = if title.trim().is_empty() {
            format!("Git Commit - {}", chrono::Local::now().format("%Y-%m-%d %H:%M"))
        } else {
            title
        };

        Self {
            title,
            content: content.into(),
            status,
        }
    }

    pub fn from_summary(summary: GeneratedSummary, status: PostStatus) -> Self {
        Self::new(summary.title, summary.html_body, status)
    }
}

#[derive(Debug, Serialize)]
struct PostBody<'a> {
    title: &'a str,
    content: &'a str,
    status: PostStatus,
    categories: [u64; 1],
}

#[derive(Debug, Deserialize)]
struct Category {
    id: u64,
    #[serde(default)]
    slug: String,
}

#[derive(Debug, Deserialize)]
struct CurrentUser {
    #[serde(default)]
    id: u64,
    #[serde(default)]
    name: String,
}

/// A post WordPress accepted
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PublishedPost {
    pub id: u64,
    #[serde(default)]
    pub link: String,
}

pub struct WordPressClient {
    config: WordPressConfig,
    http_client: Client,
}

impl WordPressClient {
    pub fn new(config: WordPressConfig) -> Result<Self> {
        config.validate()?;
        let http_client = Client::builder().user_agent("Git2WP/1.0").build()?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn api(&self, route: &str) -> String {
        format!("{}/wp-json/wp/v2{}", self.config.url, route)
    }

    fn get(&self, route: &str) -> reqwest::RequestBuilder {
        self.http_client
            .get(self.api(route))
            .basic_auth(&self.config.username, Some(&self.config.password))
    }

    /// Check the credentials; returns the authenticated user's display name
    pub async fn test_connection(&self) -> Result<String> {
        let response = self
            .get("/users/me")
            .timeout(CATEGORY_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::WordPressApi {
                status: status.as_u16(),
                body,
            });
        }

        let user: CurrentUser = response.json().await?;
        info!("Authenticated as {} (ID: {})", user.name, user.id);
        Ok(user.name)
    }

    /// Category for new posts: `uncategorized` if present, else the first one
    async fn default_category(&self) -> u64 {
        let categories = match self.fetch_categories().await {
            Ok(categories) => categories,
            Err(e) => {
                warn!("Could not fetch categories: {}", e);
                return FALLBACK_CATEGORY_ID;
            }
        };

        categories
            .iter()
            .find(|c| c.slug == "uncategorized")
            .or_else(|| categories.first())
            .map(|c| c.id)
            .unwrap_or(FALLBACK_CATEGORY_ID)
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        let response = self
            .get("/categories")
            .timeout(CATEGORY_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    pub async fn publish(&self, post: &Post) -> Result<PublishedPost> {
        let category = self.default_category().await;
        let body = PostBody {
            title: &post.title,
            content: &post.content,
            status: post.status,
            categories: [category],
        };

        let url = self.api("/posts");
        debug!("POST {} (status: {}, category: {})", url, post.status, category);

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .timeout(PUBLISH_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED => {
                let published: PublishedPost = response.json().await?;
                info!("Published post {}: {}", published.id, published.link);
                Ok(published)
            }
            StatusCode::FORBIDDEN => Err(Error::WordPressForbidden),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::WordPressApi {
                    status: status.as_u16(),
                    body: body.chars().take(1000).collect(),
                })
            }
        }
    }
}
