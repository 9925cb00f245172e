// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client implementing [`ActivitySource`].
//!
//! Handles:
//! - Refresh-token exchange with an in-memory access token cache
//! - Paginated activity listing exposed as a stream
//! - Detailed activity fetching with segment efforts
//! - Rate limit and token error detection

use crate::config::Config;
use crate::error::AppError;
use crate::services::source::{ActivitySource, ActivityStream, RawActivity, RawActivityDetail};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use futures_util::{stream, StreamExt};
use serde::Deserialize;
use std::collections::VecDeque;
use tokio::sync::Mutex;

const DEFAULT_API_URL: &str = "https://www.strava.com/api/v3";
const DEFAULT_OAUTH_URL: &str = "https://www.strava.com/oauth";

/// Strava's maximum page size for activity listing.
pub const PER_PAGE: u32 = 200;

/// Margin before token expiration when we proactively refresh (5 minutes).
const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// The cursor is local wall-clock time while `after` is a UTC epoch, so widen
/// the window by the largest UTC offset. The merge absorbs the overlap.
const CURSOR_SKEW_SECS: i64 = 14 * 60 * 60;

/// Cached access token with expiry information.
#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Strava API client for a single athlete.
pub struct StravaClient {
    http: reqwest::Client,
    api_url: String,
    oauth_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: Mutex<String>,
    token: Mutex<Option<CachedToken>>,
}

impl StravaClient {
    /// Create a new Strava client with OAuth credentials.
    pub fn new(client_id: String, client_secret: String, refresh_token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: DEFAULT_API_URL.to_string(),
            oauth_url: DEFAULT_OAUTH_URL.to_string(),
            client_id,
            client_secret,
            refresh_token: Mutex::new(refresh_token),
            token: Mutex::new(None),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.strava_client_id.clone(),
            config.strava_client_secret.clone(),
            config.strava_refresh_token.clone(),
        )
    }

    /// Point the client at another host (API under `/api/v3`, OAuth under `/oauth`).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        self.api_url = format!("{}/api/v3", base);
        self.oauth_url = format!("{}/oauth", base);
        self
    }

    // ─── Token Management ────────────────────────────────────────────────────

    /// Get a valid access token, refreshing it when it is about to expire.
    pub async fn access_token(&self) -> Result<String, AppError> {
        let margin = Duration::seconds(TOKEN_REFRESH_MARGIN_SECS);

        // Holding the lock across the refresh serializes concurrent callers.
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Utc::now() + margin < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        tracing::info!("Access token missing or expiring, refreshing");
        let mut refresh_token = self.refresh_token.lock().await;
        let response = self.refresh(&refresh_token).await?;

        // Strava may rotate the refresh token.
        *refresh_token = response.refresh_token;
        let expires_at = DateTime::from_timestamp(response.expires_at, 0).unwrap_or_default();
        *cached = Some(CachedToken {
            access_token: response.access_token.clone(),
            expires_at,
        });

        tracing::info!(expires_at = %expires_at, "Token refreshed and cached");
        Ok(response.access_token)
    }

    /// Exchange a refresh token for a new access token.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenRefreshResponse, AppError> {
        let response = self
            .http
            .post(format!("{}/token", self.oauth_url))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(format!("Token refresh request failed: {}", e)))?;

        check_response_json(response).await
    }

    // ─── Activities ──────────────────────────────────────────────────────────

    /// List one page of activities started after `after` (Unix seconds).
    ///
    /// Items that do not deserialize are logged and dropped here so one odd
    /// record cannot fail the whole page.
    pub async fn list_activities(
        &self,
        after: Option<i64>,
        page: u32,
        per_page: u32,
    ) -> Result<PageResult, AppError> {
        let access_token = self.access_token().await?;
        let url = format!("{}/athlete/activities", self.api_url);

        let mut query = vec![
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ];
        if let Some(after) = after {
            query.push(("after", after.to_string()));
        }

        let response = self
            .http
            .get(&url)
            .bearer_auth(&access_token)
            .query(&query)
            .send()
            .await
            .map_err(|e| AppError::StravaApi(e.to_string()))?;

        let items: Vec<serde_json::Value> = check_response_json(response).await?;
        let raw_count = items.len();
        let activities = items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<RawActivity>(item) {
                Ok(activity) => Some(activity),
                Err(e) => {
                    tracing::warn!(page, error = %e, "Skipping undecodable activity");
                    None
                }
            })
            .collect();

        Ok(PageResult {
            activities,
            raw_count,
        })
    }

    /// Get a detailed activity including all segment efforts.
    pub async fn get_activity(&self, activity_id: u64) -> Result<RawActivityDetail, AppError> {
        let access_token = self.access_token().await?;
        let url = format!("{}/activities/{}", self.api_url, activity_id);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&access_token)
            .query(&[("include_all_efforts", "true")])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(e.to_string()))?;

        check_response_json(response).await
    }
}

#[async_trait]
impl ActivitySource for StravaClient {
    fn fetch_activities(&self, since: Option<NaiveDateTime>) -> ActivityStream<'_> {
        let after = since.map(|ts| ts.and_utc().timestamp() - CURSOR_SKEW_SECS);
        tracing::debug!(after = ?after, "Listing Strava activities");

        stream::unfold(PageCursor::new(after), move |mut cursor| async move {
            loop {
                if let Some(activity) = cursor.pending.pop_front() {
                    return Some((Ok(activity), cursor));
                }
                if cursor.exhausted {
                    return None;
                }

                match self.list_activities(cursor.after, cursor.page, PER_PAGE).await {
                    Ok(page) => {
                        tracing::debug!(page = cursor.page, count = page.raw_count, "Fetched activity page");
                        cursor.exhausted = page.raw_count < PER_PAGE as usize;
                        cursor.page += 1;
                        cursor.pending.extend(page.activities);
                    }
                    Err(e) => {
                        cursor.exhausted = true;
                        return Some((Err(e), cursor));
                    }
                }
            }
        })
        .boxed()
    }

    async fn fetch_activity_detail(&self, activity_id: u64) -> Result<RawActivityDetail, AppError> {
        self.get_activity(activity_id).await
    }
}

/// Pagination state of an activity listing.
struct PageCursor {
    after: Option<i64>,
    page: u32,
    pending: VecDeque<RawActivity>,
    exhausted: bool,
}

impl PageCursor {
    fn new(after: Option<i64>) -> Self {
        Self {
            after,
            page: 1,
            pending: VecDeque::new(),
            exhausted: false,
        }
    }
}

/// One listed page after per-item decoding.
#[derive(Debug, Default)]
pub struct PageResult {
    pub activities: Vec<RawActivity>,
    /// Items on the page before decoding, used to detect the last page
    pub raw_count: usize,
}

/// Token refresh response from Strava.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

/// Check response status and parse the JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.as_u16() == 429 {
            tracing::warn!("Strava rate limit hit (429)");
            return Err(AppError::StravaApi(AppError::STRAVA_RATE_LIMIT.to_string()));
        }

        if status.as_u16() == 401 {
            return Err(AppError::StravaApi(
                AppError::STRAVA_TOKEN_ERROR.to_string(),
            ));
        }

        return Err(AppError::StravaApi(format!("HTTP {}: {}", status, body)));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::StravaApi(format!("JSON parse error: {}", e)))
}
