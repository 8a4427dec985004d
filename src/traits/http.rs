use anyhow::{Context, Result};

/// A single outgoing POST
#[derive(Debug, Clone, PartialEq)]
pub struct PostRequest {
    pub url: String,
    pub body: Vec<u8>,
    pub content_type: String,
    pub headers: Vec<(String, String)>,
    /// Accept any server certificate. Only set on explicit operator request.
    pub skip_ssl_validation: bool,
}

impl PostRequest {
    pub fn new(url: &str, body: Vec<u8>, content_type: &str) -> Self {
        Self {
            url: url.to_string(),
            body,
            content_type: content_type.to_string(),
            headers: Vec::new(),
            skip_ssl_validation: false,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn skip_ssl_validation(mut self, skip: bool) -> Self {
        self.skip_ssl_validation = skip;
        self
    }
}

/// Status and fully-read body of a response
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client trait for testing
pub trait HttpClient: Send + Sync {
    /// Send the request once. Only transport failures are errors; any HTTP
    /// status is returned as a response.
    fn post(&self, request: &PostRequest) -> Result<HttpResponse>;
}

/// Real HTTP client using reqwest
pub struct ReqwestClient;

impl HttpClient for ReqwestClient {
    fn post(&self, request: &PostRequest) -> Result<HttpResponse> {
        let client = reqwest::blocking::Client::builder()
            .danger_accept_invalid_certs(request.skip_ssl_validation)
            .build()
            .context("Failed to build HTTP client")?;

        let mut builder = client
            .post(&request.url)
            .header(reqwest::header::CONTENT_TYPE, &request.content_type)
            .body(request.body.clone());

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .with_context(|| format!("Failed to send request to: {}", request.url))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .with_context(|| format!("Failed to read response body from: {}", request.url))?;

        Ok(HttpResponse { status, body })
    }
}

/// Mock HTTP client that records requests and replays a fixed response
#[cfg(test)]
pub struct MockHttpClient {
    response: Option<HttpResponse>,
    error: Option<String>,
    requests: std::sync::Mutex<Vec<PostRequest>>,
}

#[cfg(test)]
impl MockHttpClient {
    pub fn with_response(status: u16, body: &str) -> Self {
        Self {
            response: Some(HttpResponse {
                status,
                body: body.to_string(),
            }),
            error: None,
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn with_error(error: &str) -> Self {
        Self {
            response: None,
            error: Some(error.to_string()),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<PostRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl HttpClient for MockHttpClient {
    fn post(&self, request: &PostRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(ref response) = self.response {
            Ok(response.clone())
        } else if let Some(ref error) = self.error {
            Err(anyhow::anyhow!("{}", error))
        } else {
            Err(anyhow::anyhow!("No response configured"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_request_builder() {
        let request = PostRequest::new("https://example.com", b"{}".to_vec(), "application/json")
            .with_header("Authorization", "Bearer abc")
            .skip_ssl_validation(true);

        assert_eq!(request.content_type, "application/json");
        assert_eq!(
            request.headers,
            vec![("Authorization".to_string(), "Bearer abc".to_string())]
        );
        assert!(request.skip_ssl_validation);
    }

    #[test]
    fn test_response_success_range() {
        let ok = HttpResponse {
            status: 204,
            body: String::new(),
        };
        let bad = HttpResponse {
            status: 500,
            body: String::new(),
        };
        assert!(ok.is_success());
        assert!(!bad.is_success());
    }
}
