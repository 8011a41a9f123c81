use crate::error::BlogClientError;
use crate::models::{ErrorResponse, Redirected};
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Thin wrapper over `reqwest` that knows the server's status conventions.
/// Redirects are never followed: a 303 is the answer to a successful write
/// and a 302 is a refusal.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, BlogClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn get_token(&self) -> Option<&String> {
        self.token.as_ref()
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// A request with the bearer token attached when there is one.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        tracing::debug!("{} {}", method, url);

        let request = self.client.request(method, &url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// 200/201 with a JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: Response,
) -> Result<T, BlogClientError> {
    match response.status() {
        StatusCode::OK | StatusCode::CREATED => decode(response).await,
        _ => Err(error_from(response).await),
    }
}

/// 303 with `{redirect_to, data}`.
pub(crate) async fn read_redirect<T: DeserializeOwned>(
    response: Response,
) -> Result<Redirected<T>, BlogClientError> {
    match response.status() {
        StatusCode::SEE_OTHER => decode(response).await,
        _ => Err(error_from(response).await),
    }
}

/// 204 without a body.
pub(crate) async fn read_empty(response: Response) -> Result<(), BlogClientError> {
    match response.status() {
        StatusCode::NO_CONTENT => Ok(()),
        _ => Err(error_from(response).await),
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BlogClientError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| BlogClientError::SerializationError(e.to_string()))
}

pub(crate) async fn error_from(response: Response) -> BlogClientError {
    let status = response.status();
    let location = response
        .headers()
        .get(LOCATION)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());

    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => return BlogClientError::HttpError(e),
    };
    let body: ErrorResponse = serde_json::from_str(&text).unwrap_or_else(|_| ErrorResponse {
        error: text.clone(),
        ..Default::default()
    });

    match status {
        StatusCode::NOT_FOUND => BlogClientError::NotFound,
        StatusCode::UNAUTHORIZED => BlogClientError::Unauthorized(body.error),
        StatusCode::FORBIDDEN => BlogClientError::Forbidden(body.error),
        StatusCode::CONFLICT => BlogClientError::Conflict(body.error),
        StatusCode::BAD_REQUEST => BlogClientError::Validation {
            message: body.error,
            fields: body.fields,
        },
        StatusCode::FOUND => BlogClientError::Redirected(location.unwrap_or_default()),
        _ => BlogClientError::UnexpectedStatus {
            status: status.as_u16(),
            message: body.error,
        },
    }
}
