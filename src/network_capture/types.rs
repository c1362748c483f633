//! Network exchanges as observed by an instrumented browser

/// One request the page made, plus its response if one arrived
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedExchange {
    /// Browser-assigned id, used to fetch the response body later
    pub request_id: String,
    pub method: String,
    pub url: String,
    pub request_headers: Vec<(String, String)>,
    pub request_body: Option<String>,
    pub response: Option<ObservedResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedResponse {
    /// HTTP status code
    pub status: i64,
    /// Declared content type (header value, or the browser's MIME type)
    pub content_type: String,
}

impl ObservedExchange {
    /// Raw request as stored in an `api_request` artifact:
    /// request line, header block, then the body.
    #[must_use]
    pub fn request_text(&self) -> String {
        let mut text = format!("{} {}\n\n", self.method, self.url);
        for (name, value) in &self.request_headers {
            text.push_str(name);
            text.push_str(": ");
            text.push_str(value);
            text.push('\n');
        }
        text.push('\n');
        if let Some(body) = &self.request_body {
            text.push_str(body);
        }
        text
    }
}
