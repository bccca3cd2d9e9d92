//! Contact-form submission.

use reqwest::Method;
use serde::Serialize;
use tracing::info;

use crate::client::{Supabase, expect_success};
use crate::error::StoreError;

/// One contact-form submission.
#[derive(Debug, Clone, Serialize)]
pub struct ContactMessage {
    pub name: String,
    /// Email address or phone number, whichever the visitor left.
    pub contact: String,
    pub message: String,
}

impl Supabase {
    /// Forward a submission to the configured contact endpoint.
    pub async fn submit_contact(&self, message: &ContactMessage) -> Result<(), StoreError> {
        let endpoint = self
            .config
            .contact_endpoint
            .clone()
            .ok_or(StoreError::ContactUnconfigured)?;

        let resp = self
            .http
            .request(Method::POST, endpoint)
            .json(message)
            .send()
            .await
            .map_err(StoreError::http("contact submission"))?;
        expect_success(resp, "contact submission").await?;
        info!(name = %message.name, "contact message delivered");
        Ok(())
    }
}
