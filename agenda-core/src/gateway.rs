//! HTTP client for the meetings API.
//!
//! Every authenticated call goes through [`Gateway::send`], which attaches the
//! bearer token and turns a 401 into a forced logout, the same way for every
//! endpoint.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::admin::{NewUser, UserUpdate};
use crate::config::AgendaConfig;
use crate::error::{AgendaError, AgendaResult};
use crate::location::Location;
use crate::session::{AuthState, Session};
use crate::user::User;
use crate::wire::{
    ErrorBody, LoginRequest, LoginResponse, MeResponse, MeetingPayload, RawMeeting, parse_listing,
};

/// Handle on the backend. Cloning is cheap and shares the session.
#[derive(Clone)]
pub struct Gateway {
    http: reqwest::Client,
    base_url: Url,
    session: Session,
}

fn iso(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Gateway {
    pub fn new(base_url: &str, session: Session, timeout: Duration) -> AgendaResult<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| AgendaError::Config(format!("Invalid base_url '{base_url}': {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(AgendaError::Config(format!(
                "Invalid base_url '{base_url}': not an http(s) URL"
            )));
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Gateway {
            http,
            base_url: parsed,
            session,
        })
    }

    pub fn from_config(config: &AgendaConfig, session: Session) -> AgendaResult<Self> {
        Self::new(&config.base_url, session, config.request_timeout())
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Endpoint under the base URL. Each segment is percent-encoded, so ids
    /// can't escape their path segment.
    fn url(&self, segments: &[&str]) -> AgendaResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| AgendaError::Config(format!("Invalid base_url '{}'", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Attach the bearer token and send. A 401 ends the session (once) and
    /// surfaces as [`AgendaError::SessionExpired`].
    async fn send(&self, request: RequestBuilder) -> AgendaResult<Response> {
        let credentials = self
            .session
            .credentials()
            .ok_or(AgendaError::NotAuthenticated)?;

        let response = request.bearer_auth(&credentials.token).send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            self.session.expire(credentials.epoch);
            return Err(AgendaError::SessionExpired);
        }

        Ok(response)
    }

    /// Map a non-2xx response to an error, extracting what the body offers.
    async fn failure(response: Response, fallback: &str) -> AgendaError {
        let status = response.status().as_u16();
        let bytes = response.bytes().await.unwrap_or_default();
        let body = ErrorBody::parse(&bytes);

        if body.is_time_conflict() {
            return AgendaError::TimeConflict {
                message: body.message.unwrap_or_else(|| fallback.to_string()),
                conflicts: body.conflicts,
            };
        }

        AgendaError::Api {
            status,
            message: body.best_message().unwrap_or_else(|| fallback.to_string()),
        }
    }

    async fn expect_success(response: Response, fallback: &str) -> AgendaResult<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::failure(response, fallback).await)
        }
    }

    async fn json<T: DeserializeOwned>(response: Response) -> AgendaResult<T> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// POST /auth/login
    pub async fn login(&self, email: &str, password: &str) -> AgendaResult<User> {
        let response = self
            .http
            .post(self.url(&["auth", "login"])?)
            .json(&LoginRequest {
                email: email.trim().to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            let bytes = response.bytes().await.unwrap_or_default();
            let message = ErrorBody::parse(&bytes)
                .best_message()
                .unwrap_or_else(|| "Invalid email or password".to_string());
            return Err(AgendaError::LoginRejected(message));
        }

        let response = Self::expect_success(response, "Login failed").await?;
        let LoginResponse { token, user } = Self::json(response).await?;

        self.session.establish(token, user.clone())?;
        tracing::info!("Logged in as {}", user.email);
        Ok(user)
    }

    /// Check a stored token against GET /auth/me.
    ///
    /// No token: nothing is fetched. 401, network or decode failure: the
    /// stored session is cleared. Other non-2xx: `InvalidToken`, storage kept.
    pub async fn restore(&self) -> AgendaResult<AuthState> {
        let Some(credentials) = self.session.credentials() else {
            return Ok(AuthState::Unauthenticated);
        };

        let result = self
            .http
            .get(self.url(&["auth", "me"])?)
            .bearer_auth(&credentials.token)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Session check failed: {e}");
                self.session.expire(credentials.epoch);
                return Err(e.into());
            }
        };

        if response.status() == StatusCode::UNAUTHORIZED {
            self.session.expire(credentials.epoch);
            return Err(AgendaError::SessionExpired);
        }

        if !response.status().is_success() {
            return Err(AgendaError::InvalidToken(format!(
                "session check returned HTTP {}",
                response.status().as_u16()
            )));
        }

        match Self::json::<MeResponse>(response).await {
            Ok(MeResponse { user }) => {
                self.session.confirm(user.clone())?;
                Ok(AuthState::Authenticated(user))
            }
            Err(e) => {
                tracing::error!("Unreadable session check response: {e}");
                self.session.expire(credentials.epoch);
                Err(e)
            }
        }
    }

    /// GET /auth/me
    pub async fn me(&self) -> AgendaResult<User> {
        let response = self.send(self.http.get(self.url(&["auth", "me"])?)).await?;
        let response = Self::expect_success(response, "Invalid token").await?;
        let MeResponse { user } = Self::json(response).await?;
        Ok(user)
    }

    /// GET /users
    pub async fn list_users(&self) -> AgendaResult<Vec<User>> {
        let response = self.send(self.http.get(self.url(&["users"])?)).await?;
        let response = Self::expect_success(response, "Could not fetch users").await?;
        let value: Value = Self::json(response).await?;
        Ok(parse_listing(value, "user"))
    }

    /// POST /users
    pub async fn create_user(&self, user: &NewUser) -> AgendaResult<()> {
        let response = self.send(self.http.post(self.url(&["users"])?).json(user)).await?;
        Self::expect_success(response, "Error creating user").await?;
        Ok(())
    }

    /// PUT /users/:id
    pub async fn update_user(&self, id: i64, update: &UserUpdate) -> AgendaResult<()> {
        let response = self
            .send(self.http.put(self.url(&["users", id.to_string().as_str()])?).json(update))
            .await?;
        Self::expect_success(response, "Error updating user").await?;
        Ok(())
    }

    /// DELETE /users/:id
    pub async fn delete_user(&self, id: i64) -> AgendaResult<()> {
        let response = self
            .send(self.http.delete(self.url(&["users", id.to_string().as_str()])?))
            .await?;
        Self::expect_success(response, "Error deleting user").await?;
        Ok(())
    }

    /// GET /meetings?startDate&endDate[&location]
    pub async fn list_meetings(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        location: Option<Location>,
    ) -> AgendaResult<Vec<RawMeeting>> {
        let mut query = vec![("startDate", iso(start)), ("endDate", iso(end))];
        if let Some(location) = location {
            query.push(("location", location.as_str().to_string()));
        }

        tracing::debug!(?query, "Fetching meetings");
        let response = self
            .send(self.http.get(self.url(&["meetings"])?).query(&query))
            .await?;
        let response = Self::expect_success(response, "Could not fetch meetings").await?;
        let value: Value = Self::json(response).await?;
        Ok(parse_listing(value, "meeting"))
    }

    /// POST /meetings
    pub async fn create_meeting(&self, payload: &MeetingPayload) -> AgendaResult<()> {
        let response = self
            .send(self.http.post(self.url(&["meetings"])?).json(payload))
            .await?;
        Self::expect_success(response, "Error creating meeting").await?;
        Ok(())
    }

    /// PUT /meetings/:id
    pub async fn update_meeting(&self, id: &str, payload: &MeetingPayload) -> AgendaResult<()> {
        let response = self
            .send(self.http.put(self.url(&["meetings", id])?).json(payload))
            .await?;
        Self::expect_success(response, "Error updating meeting").await?;
        Ok(())
    }

    /// DELETE /meetings/:id
    pub async fn delete_meeting(&self, id: &str) -> AgendaResult<()> {
        let response = self
            .send(self.http.delete(self.url(&["meetings", id])?))
            .await?;
        Self::expect_success(response, "Error deleting meeting").await?;
        Ok(())
    }
}
