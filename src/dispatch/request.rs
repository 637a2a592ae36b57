//! Request descriptors that can be sent more than once.

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use serde::Serialize;

/// One logical HTTP request. Bodies are kept as owned bytes so the request can
/// be rebuilt for the retry after a refresh.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub(super) method: Method,
    pub(super) url: String,
    pub(super) headers: HeaderMap,
    pub(super) body: RequestBody,
    pub(super) refresh_exempt: bool,
}

#[derive(Clone, Debug, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Vec<u8>),
    Multipart(MultipartBody),
}

#[derive(Clone, Debug, Default)]
pub struct MultipartBody {
    parts: Vec<FilePart>,
}

#[derive(Clone, Debug)]
struct FilePart {
    name: String,
    file_name: Option<String>,
    mime: Option<String>,
    bytes: Vec<u8>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
            refresh_exempt: false,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        self.body = RequestBody::Json(serde_json::to_vec(body)?);
        Ok(self)
    }

    pub fn multipart(mut self, body: MultipartBody) -> Self {
        self.body = RequestBody::Multipart(body);
        self
    }

    /// Never run refresh-on-401 for this request. Used for calls that are
    /// themselves part of credential handling.
    pub fn exempt_from_refresh(mut self) -> Self {
        self.refresh_exempt = true;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: Option<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(FilePart {
            name: name.into(),
            file_name: Some(file_name.into()),
            mime,
            bytes,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub(super) fn to_form(&self) -> reqwest::Result<Form> {
        let mut form = Form::new();
        for part in &self.parts {
            let mut p = Part::bytes(part.bytes.clone());
            if let Some(file_name) = &part.file_name {
                p = p.file_name(file_name.clone());
            }
            if let Some(mime) = &part.mime {
                p = p.mime_str(mime)?;
            }
            form = form.part(part.name.clone(), p);
        }
        Ok(form)
    }
}
