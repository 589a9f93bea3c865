//! Typed calls against the booking service endpoints

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::common::config::Credentials;
use crate::common::{Error, Result};
use crate::http::{ApiResponse, HttpClient, HttpMethod, RequestOptions};

use super::types::{
    AuthReply, AuthToken, BookingId, BookingPatch, BookingRecord, BookingRef, CreatedBooking,
};

/// Booking service client
#[derive(Debug, Clone)]
pub struct BookerApi {
    client: HttpClient,
}

impl BookerApi {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// The underlying adapter, for calls the typed surface doesn't cover
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// `GET /ping`; the service answers 201 when healthy
    pub async fn ping(&self) -> Result<()> {
        let response = self
            .client
            .send(HttpMethod::Get, "/ping", RequestOptions::default())
            .await?;
        if response.status != 201 {
            return Err(Error::unexpected_status(
                "GET",
                self.client.resolve("/ping")?.as_str(),
                response.status,
                &response.body.to_string(),
            ));
        }
        Ok(())
    }

    /// Exchange credentials for a token
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<AuthToken> {
        let body = serde_json::to_value(credentials)?;
        let response = self
            .client
            .send(HttpMethod::Post, "/auth", RequestOptions::default().json(body))
            .await?;

        let reply: AuthReply = decode(response)?;
        match reply.token {
            Some(token) => {
                tracing::debug!("Obtained auth token for '{}'", credentials.username);
                Ok(AuthToken::new(token))
            }
            None => Err(Error::AuthRejected(
                reply.reason.unwrap_or_else(|| "no token in reply".to_string()),
            )),
        }
    }

    /// `GET /booking`
    pub async fn list(&self) -> Result<Vec<BookingRef>> {
        let response = self
            .client
            .send(HttpMethod::Get, "/booking", RequestOptions::default())
            .await?;
        decode(response)
    }

    /// `GET /booking/{id}`; `None` when the service answers 404
    pub async fn get(&self, id: BookingId) -> Result<Option<BookingRecord>> {
        let response = self
            .client
            .send(HttpMethod::Get, &booking_path(id), RequestOptions::tolerant())
            .await?;
        match response.status {
            404 => Ok(None),
            200 => decode(response).map(Some),
            status => Err(Error::unexpected_status(
                "GET",
                self.client.resolve(&booking_path(id))?.as_str(),
                status,
                &response.body.to_string(),
            )),
        }
    }

    /// `POST /booking`
    pub async fn create(&self, record: &BookingRecord) -> Result<CreatedBooking> {
        let body = serde_json::to_value(record)?;
        let response = self
            .client
            .send(HttpMethod::Post, "/booking", RequestOptions::default().json(body))
            .await?;
        decode(response)
    }

    /// `PUT /booking/{id}` with a full record
    pub async fn update(
        &self,
        id: BookingId,
        record: &BookingRecord,
        token: &AuthToken,
    ) -> Result<BookingRecord> {
        let body = serde_json::to_value(record)?;
        let options = RequestOptions::default().token(token.as_str()).json(body);
        let response = self
            .client
            .send(HttpMethod::Put, &booking_path(id), options)
            .await?;
        decode(response)
    }

    /// `PATCH /booking/{id}` with only the changed fields
    pub async fn patch(
        &self,
        id: BookingId,
        patch: &BookingPatch,
        token: &AuthToken,
    ) -> Result<BookingRecord> {
        let body = serde_json::to_value(patch)?;
        let options = RequestOptions::default().token(token.as_str()).json(body);
        let response = self
            .client
            .send(HttpMethod::Patch, &booking_path(id), options)
            .await?;
        decode(response)
    }

    /// `DELETE /booking/{id}`; the service answers 201 on success
    pub async fn delete(&self, id: BookingId, token: &AuthToken) -> Result<()> {
        let options = RequestOptions::default().token(token.as_str());
        self.client
            .send(HttpMethod::Delete, &booking_path(id), options)
            .await?;
        Ok(())
    }
}

fn booking_path(id: BookingId) -> String {
    format!("/booking/{}", id)
}

fn decode<T: DeserializeOwned>(response: ApiResponse) -> Result<T> {
    let ApiResponse { status, body } = response;
    serde_json::from_value(body.clone()).map_err(|e| {
        Error::Internal(format!(
            "Unexpected response shape (status {}): {}; body: {}",
            status,
            e,
            truncate(&body)
        ))
    })
}

fn truncate(body: &Value) -> String {
    let text = body.to_string();
    if text.chars().count() > 200 {
        format!("{}...", text.chars().take(200).collect::<String>())
    } else {
        text
    }
}
