use std::time::Duration;

use log::{debug, info};
use reqwest::multipart::{Form, Part};
use reqwest::{Client as HttpClient, Method, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::api::error::ApiError;
use crate::api::models::{Contact, Service, TechStack, TechStackList};
use crate::api::payload::{FormPart, ServicePayload};

/// Thin wrapper over the dashboard REST API rooted at `endpoint`.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: HttpClient,
    endpoint: Url,
}

impl ApiClient {
    pub fn new(endpoint: &str) -> Result<Self, ApiError> {
        Self::with_http(HttpClient::new(), endpoint)
    }

    /// Client for the setup window's reachability check. Data calls never time out.
    pub fn probe(endpoint: &str) -> Result<Self, ApiError> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Self::with_http(http, endpoint)
    }

    pub fn with_http(http: HttpClient, endpoint: &str) -> Result<Self, ApiError> {
        let endpoint = Url::parse(endpoint.trim())
            .map_err(|e| ApiError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        if endpoint.cannot_be_a_base() {
            return Err(ApiError::InvalidEndpoint(endpoint.to_string()));
        }
        Ok(Self { http, endpoint })
    }

    /// Appends path segments to the endpoint, keeping any prefix such as `/api`.
    pub fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn ensure_success(resp: Response) -> Result<Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            Err(ApiError::Status(status))
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.url(segments);
        debug!("GET {url}");
        let resp = Self::ensure_success(self.http.get(url).send().await?)?;
        Ok(resp.json::<T>().await?)
    }

    async fn delete(&self, segments: &[&str]) -> Result<(), ApiError> {
        let url = self.url(segments);
        info!("DELETE {url}");
        Self::ensure_success(self.http.delete(url).send().await?)?;
        Ok(())
    }

    async fn send_form(
        &self,
        method: Method,
        segments: &[&str],
        payload: ServicePayload,
    ) -> Result<(), ApiError> {
        let url = self.url(segments);
        let form = Self::build_form(payload).await?;
        info!("{method} {url} (multipart)");
        Self::ensure_success(self.http.request(method, url).multipart(form).send().await?)?;
        Ok(())
    }

    async fn build_form(payload: ServicePayload) -> Result<Form, ApiError> {
        let mut form = Form::new();
        for part in payload.into_parts() {
            form = match part {
                FormPart::Text { name, value } => form.text(name, value),
                FormPart::File { name, path } => {
                    let bytes = tokio::fs::read(&path)
                        .await
                        .map_err(|source| ApiError::Upload { path: path.clone(), source })?;
                    let file_name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "upload".to_string());
                    let mime = mime_guess::from_path(&path).first_or_octet_stream();
                    let part = Part::bytes(bytes).file_name(file_name).mime_str(mime.essence_str())?;
                    form.part(name, part)
                }
            };
        }
        Ok(form)
    }

    /// Reach the service listing and report the HTTP status, whatever it is.
    pub async fn ping(&self) -> Result<u16, ApiError> {
        let url = self.url(&["service"]);
        let resp = self.http.get(url).send().await?;
        Ok(resp.status().as_u16())
    }

    /// Download an already uploaded image for previews.
    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let url = Url::parse(url).map_err(|e| ApiError::InvalidEndpoint(format!("{url}: {e}")))?;
        debug!("GET {url} (image)");
        let resp = Self::ensure_success(self.http.get(url).send().await?)?;
        Ok(resp.bytes().await?.to_vec())
    }

    pub async fn contacts(&self) -> Result<Vec<Contact>, ApiError> {
        self.get_json(&["contact"]).await
    }

    pub async fn delete_contact(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&["contact", id]).await
    }

    pub async fn services(&self) -> Result<Vec<Service>, ApiError> {
        self.get_json(&["service"]).await
    }

    pub async fn tech_stacks(&self) -> Result<Vec<TechStack>, ApiError> {
        let list: TechStackList = self.get_json(&["techStack"]).await?;
        Ok(list.tech_stack)
    }

    pub async fn create_service(&self, payload: ServicePayload) -> Result<(), ApiError> {
        self.send_form(Method::POST, &["service"], payload).await
    }

    pub async fn update_service(&self, id: &str, payload: ServicePayload) -> Result<(), ApiError> {
        self.send_form(Method::PUT, &["service", id], payload).await
    }

    pub async fn delete_service(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&["service", id]).await
    }
}
