use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::model::{Endpoint, Spot};
use crate::session::{Session, SetCookie};

const USER_AGENT: &str = concat!("spotview/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("invalid header '{header}', expected 'Key: Value'")]
    InvalidHeader { header: String },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Whether a request carries the stored session cookie.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Credentials {
    #[default]
    Omit,
    Include,
}

#[derive(Debug)]
pub enum RequestBody {
    Json(Value),
    Form(reqwest::multipart::Form),
}

#[derive(Debug, Default)]
pub struct RequestOptions {
    pub method: Option<reqwest::Method>,
    pub body: Option<RequestBody>,
    pub headers: Vec<(String, String)>,
    pub credentials: Credentials,
}

impl RequestOptions {
    /// Options matching an endpoint's method and session requirement.
    pub fn for_endpoint(endpoint: Endpoint) -> Self {
        let credentials = if endpoint.needs_session() {
            Credentials::Include
        } else {
            Credentials::Omit
        };
        Self {
            method: Some(endpoint.method()),
            credentials,
            ..Default::default()
        }
    }

    pub fn method(mut self, method: reqwest::Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn form(mut self, form: reqwest::multipart::Form) -> Self {
        self.body = Some(RequestBody::Form(form));
        self
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }
}

/// A decoded response body.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

#[derive(Clone, Debug)]
pub struct Fetched {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Payload>,
}

impl Fetched {
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    /// Body as a JSON value: text becomes a string, a missing body becomes null.
    pub fn body_value(&self) -> Value {
        match &self.body {
            Some(Payload::Json(v)) => v.clone(),
            Some(Payload::Text(t)) => Value::String(t.clone()),
            None => Value::Null,
        }
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.body_value())
    }

    pub fn spots(&self) -> Result<Vec<Spot>, serde_json::Error> {
        self.decode()
    }

    /// `{"status": .., "body": ..}` pretty-printed, as shown in the output areas.
    pub fn status_report(&self) -> String {
        let report = serde_json::json!({
            "status": self.status.as_u16(),
            "body": self.body_value(),
        });
        serde_json::to_string_pretty(&report).unwrap_or_else(|_| report.to_string())
    }

    /// The server's explanation for a failed request.
    pub fn error_text(&self) -> String {
        match &self.body {
            Some(Payload::Json(Value::Object(map))) => match map.get("error") {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => Value::Object(map.clone()).to_string(),
            },
            Some(Payload::Json(other)) => other.to_string(),
            Some(Payload::Text(t)) if !t.trim().is_empty() => t.trim().to_string(),
            Some(Payload::Text(t)) => Value::String(t.clone()).to_string(),
            None => Value::Null.to_string(),
        }
    }
}

pub fn is_json_content_type(content_type: &str) -> bool {
    content_type
        .to_ascii_lowercase()
        .contains("application/json")
}

/// Decodes a raw body the way the content type says. Malformed JSON gives
/// `None`; anything else is kept as text, with invalid UTF-8 replaced.
pub fn decode_body(content_type: &str, bytes: &[u8]) -> Option<Payload> {
    if is_json_content_type(content_type) {
        serde_json::from_slice::<Value>(bytes).ok().map(Payload::Json)
    } else {
        Some(Payload::Text(String::from_utf8_lossy(bytes).into_owned()))
    }
}

pub fn parse_header_line(raw: &str) -> Result<(String, String), ClientError> {
    let invalid = || ClientError::InvalidHeader {
        header: raw.to_string(),
    };
    let (key, value) = raw.split_once(':').ok_or_else(invalid)?;
    let key = key.trim();
    if key.is_empty() {
        return Err(invalid());
    }
    HeaderName::from_str(key).map_err(|_| invalid())?;
    HeaderValue::from_str(value.trim()).map_err(|_| invalid())?;
    Ok((key.to_string(), value.trim().to_string()))
}

fn merge_headers(target: &mut HeaderMap, extra: &[(String, String)]) -> Result<(), ClientError> {
    for (k, v) in extra {
        let invalid = || ClientError::InvalidHeader {
            header: format!("{k}: {v}"),
        };
        let key = HeaderName::from_str(k.trim()).map_err(|_| invalid())?;
        let value = HeaderValue::from_str(v.trim()).map_err(|_| invalid())?;
        target.insert(key, value);
    }
    Ok(())
}

#[derive(Clone, Debug, Default)]
pub struct ClientOptions {
    pub api_base: String,
    pub proxy: Option<String>,
    pub headers: Vec<(String, String)>,
}

/// Thin wrapper around `reqwest` that owns the base URL and the cookie session.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    api_base: String,
    headers: Vec<(String, String)>,
    session: Arc<Mutex<Session>>,
}

impl ApiClient {
    pub fn new(options: ClientOptions, session: Session) -> Result<Self, ClientError> {
        let api_base = options.api_base.trim().trim_end_matches('/').to_string();
        reqwest::Url::parse(&api_base).map_err(|_| ClientError::InvalidUrl {
            url: options.api_base.clone(),
        })?;

        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| ClientError::ProxySetup {
                proxy: proxy.to_string(),
                source: e,
            })?;
            builder = builder.proxy(proxy);
        }
        let http = builder
            .build()
            .map_err(|e| ClientError::HttpClientBuild { source: e })?;

        Ok(Self {
            http,
            api_base,
            headers: options.headers,
            session: Arc::new(Mutex::new(session)),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn url_for(&self, path: &str) -> Result<reqwest::Url, ClientError> {
        let url = format!("{}{}", self.api_base, path);
        reqwest::Url::parse(&url).map_err(|_| ClientError::InvalidUrl { url })
    }

    pub async fn fetch_endpoint(
        &self,
        endpoint: Endpoint,
        body: Option<Value>,
    ) -> Result<Fetched, ClientError> {
        let mut opts = RequestOptions::for_endpoint(endpoint);
        if let Some(body) = body {
            opts = opts.json(body);
        }
        self.fetch(&endpoint.path(), opts).await
    }

    /// Performs one request. Non-2xx statuses are returned, not raised.
    pub async fn fetch(&self, path: &str, opts: RequestOptions) -> Result<Fetched, ClientError> {
        let url = self.url_for(path)?;
        let method = opts.method.unwrap_or(reqwest::Method::GET);

        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );
        if matches!(opts.body, Some(RequestBody::Json(_))) {
            headers.insert(
                reqwest::header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }
        merge_headers(&mut headers, &self.headers)?;
        merge_headers(&mut headers, &opts.headers)?;

        if opts.credentials == Credentials::Include && !headers.contains_key(reqwest::header::COOKIE)
        {
            let cookie = self.session().store().header_value(&url);
            if let Some(value) = cookie.and_then(|c| HeaderValue::from_str(&c).ok()) {
                headers.insert(reqwest::header::COOKIE, value);
            }
        }

        log::debug!("{} {} ({:?})", method, url, opts.credentials);
        let mut builder = self.http.request(method, url.clone()).headers(headers);
        builder = match opts.body {
            Some(RequestBody::Json(value)) => builder.body(value.to_string()),
            Some(RequestBody::Form(form)) => builder.multipart(form),
            None => builder,
        };

        let resp = builder.send().await.map_err(|e| ClientError::Request {
            url: url.to_string(),
            source: e,
        })?;
        let status = resp.status();
        let headers = resp.headers().clone();

        if opts.credentials == Credentials::Include {
            let cookies = resp.cookies().map(SetCookie::from).collect::<Vec<_>>();
            self.absorb_cookies(&url, cookies);
        }

        let content_type = headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = match resp.bytes().await {
            Ok(bytes) => decode_body(&content_type, &bytes),
            Err(e) => {
                log::debug!("failed to read body from {url}: {e}");
                None
            }
        };
        log::debug!("{} <- {}", status.as_u16(), url);

        Ok(Fetched {
            status,
            headers,
            body,
        })
    }

    fn absorb_cookies(&self, url: &reqwest::Url, cookies: Vec<SetCookie>) {
        if cookies.is_empty() {
            return;
        }
        let mut session = self.session();
        let mut changed = false;
        for cookie in cookies {
            changed |= session.store_mut().apply(url, cookie);
        }
        if changed {
            if let Err(e) = session.save() {
                log::warn!("{e}");
            }
        }
    }
}
