// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP Basic + form-body client-credentials exchange.

use axum::http::header::InvalidHeaderValue;
use axum::http::HeaderMap;
use futures_util::future::BoxFuture;

use crate::credential::token::read_token_response;
use crate::credential::{Credential, CredentialStrategy, API_KEY_HEADER};
use crate::error::FetchError;
use crate::secret::GatewaySecrets;

/// Authenticates with `Basic base64(id:secret)` and injects only `Api-Key`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicForm;

impl CredentialStrategy for BasicForm {
    fn name(&self) -> &'static str {
        "basic-form"
    }

    fn fetch<'a>(
        &'a self,
        http: &'a reqwest::Client,
        secrets: &'a GatewaySecrets,
    ) -> BoxFuture<'a, Result<Credential, FetchError>> {
        Box::pin(async move {
            let resp = http
                .post(secrets.credential_endpoint.clone())
                .basic_auth(&secrets.client_id, Some(secrets.client_secret.expose()))
                .form(&[("grant_type", "client_credentials")])
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
        headers.insert(API_KEY_HEADER, credential.header_value()?);
        Ok(())
    }
}
