//! This module provides a client to connect to an AppointChed server

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::{Method, Response, StatusCode};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::Error;
use crate::ids::{ProviderId, RequestId, SlotId};
use crate::notification::Notification;
use crate::request::{AppointmentRequest, Decision, NewRequest};
use crate::slot::{AppointmentSlot, NewSlot, Provider, SlotUpdate};
use crate::traits::AppointmentApi;
use crate::utils::percent_decode;

static CSRF_META_NAME: &str = "csrf-token";
static XSRF_COOKIE_NAME: &str = "XSRF-TOKEN";


/// The role of the signed-in user. Every API path is prefixed by it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Client,
    /// Staff members and supervisors
    Staff,
    Admin,
}

impl Role {
    pub fn prefix(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

impl FromStr for Role {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" => Ok(Role::Client),
            "staff" | "supervisor" => Ok(Role::Staff),
            "admin" => Ok(Role::Admin),
            other => Err(Error::validation(format!("Unknown role {:?}", other))),
        }
    }
}


/// The anti-forgery tokens sent along with every mutating request
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CsrfToken {
    /// Content of the page's `<meta name="csrf-token">`, sent as `X-CSRF-TOKEN`
    meta: Option<String>,
    /// Decoded `XSRF-TOKEN` cookie, sent as `X-XSRF-TOKEN`
    xsrf: Option<String>,
}

impl CsrfToken {
    pub fn new(meta: Option<String>, xsrf: Option<String>) -> Self {
        Self { meta, xsrf }
    }

    /// Extracts the token of the `csrf-token` meta tag of an HTML page
    pub fn from_html(html: &str) -> Self {
        let mut rest = html;
        while let Some(start) = rest.find("<meta") {
            let tag_and_after = &rest[start..];
            let end = tag_and_after.find('>').unwrap_or(tag_and_after.len());
            let tag = &tag_and_after[..end];
            if attribute(tag, "name") == Some(CSRF_META_NAME) {
                if let Some(content) = attribute(tag, "content") {
                    return Self { meta: Some(content.to_string()), xsrf: None };
                }
            }
            rest = &tag_and_after[end..];
        }
        Self::default()
    }

    pub fn meta_token(&self) -> Option<&str> { self.meta.as_deref() }
    pub fn xsrf_token(&self) -> Option<&str> { self.xsrf.as_deref() }

    pub fn is_empty(&self) -> bool {
        self.meta.is_none() && self.xsrf.is_none()
    }

    /// Keeps the tokens of `self`, replacing those `newer` knows
    fn merge(&mut self, newer: CsrfToken) {
        if newer.meta.is_some() {
            self.meta = newer.meta;
        }
        if newer.xsrf.is_some() {
            self.xsrf = newer.xsrf;
        }
    }
}

/// Value of `name="..."` (or single-quoted) inside an HTML tag
fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let mut rest = tag;
    while let Some(pos) = rest.find(name) {
        let standalone = pos == 0 || rest[..pos].ends_with(char::is_whitespace);
        let after = rest[pos + name.len()..].trim_start();
        if standalone && after.starts_with('=') {
            let value = after[1..].trim_start();
            let quote = value.chars().next()?;
            if quote == '"' || quote == '\'' {
                let inner = &value[1..];
                return inner.find(quote).map(|end| &inner[..end]);
            }
        }
        rest = &rest[pos + name.len()..];
    }
    None
}


/// List endpoints answer either a bare array or a `{ "data": [...] }` envelope
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Bare(Vec<T>),
    Enveloped { data: Vec<T> },
}

fn parse_listing<T: DeserializeOwned>(text: &str) -> Result<Vec<T>, Error> {
    let listing: Listing<T> = serde_json::from_str(text)?;
    Ok(match listing {
        Listing::Bare(items) => items,
        Listing::Enveloped { data } => data,
    })
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// The message to show when the server refuses a request
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body).ok()
        .and_then(|body| body.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| format!("Unexpected HTTP status code {}", status))
}

async fn check_status(response: Response) -> Result<Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::status(status.as_u16(), error_message(status, &body)))
}


/// An [`AppointmentApi`] that talks to an actual server over HTTP.
///
/// All requests share one cookie jar, so the session cookie set at login is sent back the way a browser would.
pub struct Client {
    base: Url,
    role: Role,
    http: reqwest::Client,
    csrf: Mutex<CsrfToken>,
}

impl Client {
    /// Create a client. This does not start a connection
    pub fn new<S: AsRef<str>>(base_url: S, role: Role) -> Result<Self, Error> {
        let mut base = Url::parse(base_url.as_ref())?;
        if base.path().ends_with('/') == false {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(crate::config::user_agent())
            .build()?;

        Ok(Self {
            base,
            role,
            http,
            csrf: Mutex::new(CsrfToken::default()),
        })
    }

    pub fn role(&self) -> Role { self.role }
    pub fn base_url(&self) -> &Url { &self.base }

    pub fn csrf_token(&self) -> CsrfToken {
        self.csrf.lock().unwrap().clone()
    }

    /// Use tokens the embedding app already knows
    pub fn set_csrf_token(&self, token: CsrfToken) {
        *self.csrf.lock().unwrap() = token;
    }

    /// Fetches a page of the web app (e.g. `client/dashboard`) to pick up its anti-forgery tokens
    pub async fn bootstrap_csrf(&self, page_path: &str) -> Result<(), Error> {
        let url = self.base.join(page_path.trim_start_matches('/'))?;
        log::debug!("Fetching anti-forgery tokens from {}", url);

        let response = self.http.get(url)
            .header(ACCEPT, "text/html")
            .send()
            .await?;
        let response = check_status(response).await?;

        let xsrf = response.cookies()
            .find(|cookie| cookie.name() == XSRF_COOKIE_NAME)
            .map(|cookie| percent_decode(cookie.value()));
        let html = response.text().await?;
        let mut found = CsrfToken::from_html(&html);
        found.xsrf = xsrf;

        if found.is_empty() {
            log::warn!("No anti-forgery token found on {}", page_path);
        }
        self.csrf.lock().unwrap().merge(found);
        Ok(())
    }

    /// URL of `/{role}/api/{path}`
    pub fn endpoint(&self, path: &str) -> Result<Url, Error> {
        let url = self.base.join(&format!("{}/api/{}", self.role.prefix(), path))?;
        Ok(url)
    }

    async fn send(&self, method: Method, url: Url, body: Option<serde_json::Value>) -> Result<Response, Error> {
        log::debug!("{} {}", method, url);
        let mutating = method != Method::GET;

        let mut request = self.http.request(method, url)
            .header(ACCEPT, "application/json")
            .header("X-Requested-With", "XMLHttpRequest");
        if mutating {
            let csrf = self.csrf_token();
            if csrf.is_empty() {
                log::warn!("Sending a mutating request without any anti-forgery token");
            }
            if let Some(token) = csrf.meta_token() {
                request = request.header("X-CSRF-TOKEN", token);
            }
            if let Some(token) = csrf.xsrf_token() {
                request = request.header("X-XSRF-TOKEN", token);
            }
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        check_status(response).await
    }

    async fn get_list<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, Error> {
        let response = self.send(Method::GET, url, None).await?;
        let text = response.text().await?;
        parse_listing(&text)
    }

    async fn mutate<B: serde::Serialize + Sync>(&self, method: Method, url: Url, body: Option<&B>) -> Result<(), Error> {
        let body = match body {
            None => None,
            Some(b) => Some(serde_json::to_value(b)?),
        };
        self.send(method, url, body).await?;
        Ok(())
    }
}

#[async_trait]
impl AppointmentApi for Client {
    async fn providers(&self) -> Result<Vec<Provider>, Error> {
        self.get_list(self.endpoint("supervisors")?).await
    }

    async fn staff_schedule(&self, provider: ProviderId) -> Result<Vec<AppointmentSlot>, Error> {
        self.get_list(self.endpoint(&format!("staff-schedule/{}", provider))?).await
    }

    async fn staff_appointments(&self, from: &str, to: &str) -> Result<Vec<AppointmentSlot>, Error> {
        let mut url = self.endpoint("staff-appointments")?;
        url.query_pairs_mut()
            .append_pair("from", from)
            .append_pair("to", to);
        self.get_list(url).await
    }

    async fn create_request(&self, request: &NewRequest) -> Result<(), Error> {
        self.mutate(Method::POST, self.endpoint("appointment-requests")?, Some(request)).await
    }

    async fn my_requests(&self) -> Result<Vec<AppointmentRequest>, Error> {
        self.get_list(self.endpoint("my-appointment-requests")?).await
    }

    async fn requests_to_review(&self) -> Result<Vec<AppointmentRequest>, Error> {
        self.get_list(self.endpoint("appointment-requests")?).await
    }

    async fn decide_request(&self, id: RequestId, decision: Decision) -> Result<(), Error> {
        let url = self.endpoint(&format!("appointment-requests/{}/{}", id, decision.as_path()))?;
        self.mutate::<()>(Method::POST, url, None).await
    }

    async fn create_slot(&self, slot: &NewSlot) -> Result<(), Error> {
        self.mutate(Method::POST, self.endpoint("appointments")?, Some(slot)).await
    }

    async fn update_slot(&self, id: SlotId, update: &SlotUpdate) -> Result<(), Error> {
        self.mutate(Method::PUT, self.endpoint(&format!("appointments/{}", id))?, Some(update)).await
    }

    async fn delete_slot(&self, id: SlotId) -> Result<(), Error> {
        self.mutate::<()>(Method::DELETE, self.endpoint(&format!("appointments/{}", id))?, None).await
    }

    async fn notifications(&self) -> Result<Vec<Notification>, Error> {
        self.get_list(self.endpoint("notifications")?).await
    }
}
