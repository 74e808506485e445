// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-body client-credentials exchange with bearer injection.

use axum::http::header::{InvalidHeaderValue, AUTHORIZATION};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use futures_util::future::BoxFuture;
use serde::Serialize;

use crate::credential::token::read_token_response;
use crate::credential::{Credential, CredentialStrategy, API_KEY_HEADER};
use crate::error::FetchError;
use crate::secret::GatewaySecrets;

pub const CORRELATION_ID_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");
pub const DATA_CLASSIFICATION_HEADER: HeaderName =
    HeaderName::from_static("x-data-classification");
pub const DATA_SOURCE_HEADER: HeaderName = HeaderName::from_static("x-data-source");

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    scope: &'a str,
    grant_type: &'static str,
}

/// Posts `client_id`/`client_secret`/`scope` as JSON and injects the token as
/// both `Authorization: Bearer` and `Api-Key`, plus per-request metadata.
#[derive(Debug, Clone)]
pub struct JsonBearer {
    scope: String,
    data_classification: HeaderValue,
    data_source: HeaderValue,
}

impl JsonBearer {
    pub fn new(
        scope: &str,
        data_classification: &str,
        data_source: &str,
    ) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            scope: scope.to_owned(),
            data_classification: HeaderValue::from_str(data_classification)?,
            data_source: HeaderValue::from_str(data_source)?,
        })
    }
}

impl CredentialStrategy for JsonBearer {
    fn name(&self) -> &'static str {
        "json-bearer"
    }

    fn fetch<'a>(
        &'a self,
        http: &'a reqwest::Client,
        secrets: &'a GatewaySecrets,
    ) -> BoxFuture<'a, Result<Credential, FetchError>> {
        Box::pin(async move {
            let body = TokenRequest {
                client_id: &secrets.client_id,
                client_secret: secrets.client_secret.expose(),
                scope: &self.scope,
                grant_type: "client_credentials",
            };
            let resp = http
                .post(secrets.credential_endpoint.clone())
                .json(&body)
                .send()
                .await
                .map_err(|e| FetchError::Endpoint(e.without_url().to_string()))?;
            read_token_response(resp).await
        })
    }

    fn inject(
        &self,
        headers: &mut HeaderMap,
        credential: &Credential,
    ) -> Result<(), InvalidHeaderValue> {
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", credential.as_str()))?;
        bearer.set_sensitive(true);
        let correlation_id = HeaderValue::from_str(&uuid::Uuid::new_v4().to_string())?;

        headers.insert(AUTHORIZATION, bearer);
        headers.insert(API_KEY_HEADER, credential.header_value()?);
        headers.insert(CORRELATION_ID_HEADER, correlation_id);
        headers.insert(DATA_CLASSIFICATION_HEADER, self.data_classification.clone());
        headers.insert(DATA_SOURCE_HEADER, self.data_source.clone());
        Ok(())
    }
}
