use miette::Diagnostic;
use thiserror::Error;

/// Failures talking to the backend.
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    /// The request never produced a usable response (DNS, TLS, timeout).
    #[error("request to {context} failed")]
    #[diagnostic(code(gable::store::http))]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-success status.
    #[error("{context} rejected with {status}: {body}")]
    #[diagnostic(code(gable::store::backend))]
    Backend {
        context: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    /// The response body did not have the shape we expect.
    #[error("unexpected response shape from {context}")]
    #[diagnostic(code(gable::store::decode))]
    Decode {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A request body failed to serialize.
    #[error("could not encode {context}")]
    #[diagnostic(code(gable::store::encode))]
    Encode {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("no category named {0:?}")]
    #[diagnostic(code(gable::store::unknown_category))]
    UnknownCategory(String),

    /// [`GableConfig::contact_endpoint`](gable_common::GableConfig) is unset.
    #[error("contact endpoint is not configured")]
    #[diagnostic(
        code(gable::store::contact_unconfigured),
        help("set CONTACT_ENDPOINT to the form submission URL")
    )]
    ContactUnconfigured,
}

impl StoreError {
    pub(crate) fn http(context: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Http { context, source }
    }

    pub(crate) fn decode(context: &'static str) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| Self::Decode { context, source }
    }

    pub(crate) fn encode(context: &'static str) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| Self::Encode { context, source }
    }
}
