use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};
use url::Url;

use crate::config::{
    HarnessConfig, AUTO_LOGIN_STEP_DELAY_MS, MANUAL_LOGIN_TIMEOUT_SECS, PASSWORD_VARS,
    ROOT_DOMAIN, USERNAME_VARS,
};
use crate::environment::Role;
use crate::error::HarnessError;
use crate::registry;
use crate::resume::ResumeSignal;

// --- Storage state model ---

/// Persisted browser storage snapshot: the cookie jar plus per-origin local
/// storage, in the layout the external context factory consumes. One file
/// per role under `.auth/`; write-once at capture, read-only at test start.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageState {
    #[serde(default)]
    pub cookies: Vec<Cookie>,
    #[serde(default)]
    pub origins: Vec<OriginState>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    /// Unix seconds; -1 marks a session cookie.
    #[serde(default = "session_expiry")]
    pub expires: f64,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
}

fn session_expiry() -> f64 {
    -1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginState {
    pub origin: String,
    #[serde(default)]
    pub local_storage: Vec<StorageEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageEntry {
    pub name: String,
    pub value: String,
}

pub fn state_path(config: &HarnessConfig, role: Role) -> PathBuf {
    config.auth_dir.join(format!("{}.json", role.file_stem()))
}

pub fn save_state(path: &Path, state: &StorageState) -> Result<(), HarnessError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_state(path: &Path) -> Result<StorageState, HarnessError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

// --- Login detection ---

/// Decide whether the current page still needs authentication, from the URL
/// and visible text alone. Pure; the heuristics mirror what the identity
/// provider actually shows.
pub fn needs_login(current_url: &str, body_text: &str, expected_domain: Option<&str>) -> bool {
    let text = body_text.to_lowercase();

    let on_login_page = current_url.contains("login")
        || current_url.contains("microsoftonline")
        || current_url.contains("identity")
        || current_url.contains("auth")
        || text.contains("sign in")
        || text.contains("pick an account")
        || text.contains("enter your password")
        || (text.contains("microsoft") && text.contains("password"));

    if on_login_page {
        return true;
    }

    if let Some(domain) = expected_domain {
        if !current_url.contains(domain) {
            return true;
        }
    }

    false
}

/// True when the URL's host is on the Magic Suite domain family.
pub fn on_suite_domain(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .map(|host| host == ROOT_DOMAIN || host.ends_with(&format!(".{}", ROOT_DOMAIN)))
        .unwrap_or(false)
}

// --- Credentials ---

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Optional credentials for the automatic login attempt. Both the newer and
/// the legacy variable names are honored; absence means manual login.
pub fn credentials_from_env() -> Option<Credentials> {
    let username = first_set(USERNAME_VARS)?;
    let password = first_set(PASSWORD_VARS)?;
    Some(Credentials { username, password })
}

fn first_set(vars: &[&str]) -> Option<String> {
    vars.iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty())
}

// --- Browser surface seam ---

/// Minimal surface the session manager needs from the external browser
/// engine. Interaction methods report whether the target element existed so
/// auto-login can skip steps the identity provider did not show.
#[async_trait]
pub trait LoginSurface {
    async fn goto(&mut self, url: &str) -> Result<(), HarnessError>;
    /// Wait for the page to settle after navigation or input.
    async fn wait_settled(&mut self);
    fn current_url(&self) -> String;
    async fn body_text(&self) -> String;
    async fn fill(&mut self, selector: &str, value: &str) -> Result<bool, HarnessError>;
    async fn press(&mut self, key: &str) -> Result<(), HarnessError>;
    async fn click(&mut self, selector: &str) -> Result<bool, HarnessError>;
    async fn storage_state(&self) -> StorageState;
}

/// Drive the identity provider's form with credentials from the
/// environment. Returns false when login could not be completed
/// automatically; the caller then falls back to the manual pause.
pub async fn auto_login<S: LoginSurface + Send>(
    surface: &mut S,
    credentials: &Credentials,
) -> Result<bool, HarnessError> {
    let step = Duration::from_millis(AUTO_LOGIN_STEP_DELAY_MS);
    info!("Attempting automatic login as {}", credentials.username);

    sleep(step).await;
    if surface.fill("input[type=\"email\"]", &credentials.username).await? {
        surface.press("Enter").await?;
        sleep(step).await;
    }

    let entered_password = surface
        .fill("input[type=\"password\"]", &credentials.password)
        .await?;
    if !entered_password {
        warn!("Automatic login failed: no password field on page");
        return Ok(false);
    }
    surface.press("Enter").await?;
    sleep(step).await;

    // "Stay signed in?" prompt, when the provider shows it.
    if surface.click("input[type=\"submit\"][value=\"Yes\"]").await? {
        sleep(step).await;
    }

    surface.wait_settled().await;
    info!("Automatic login completed");
    Ok(true)
}

// --- Capture workflow ---

/// Capture an authenticated session for one role and persist it to
/// `.auth/<role>.json`. Auto-login runs first when credentials are present;
/// otherwise execution suspends until the resume signal fires, bounded by
/// the manual-login ceiling. The final URL must be on the suite domain
/// before anything is persisted.
pub async fn capture_session_state<S: LoginSurface + Send>(
    surface: &mut S,
    role: Role,
    config: &HarnessConfig,
    resume: ResumeSignal,
) -> Result<PathBuf, HarnessError> {
    let login_url = registry::login_url(config.environment);
    info!(
        "{} login setup: environment {}, target {}",
        role.display_name(),
        config.environment,
        login_url
    );

    surface.goto(&login_url).await?;
    surface.wait_settled().await;

    let current = surface.current_url();
    let body = surface.body_text().await;

    if needs_login(&current, &body, None) {
        let mut logged_in = false;

        match credentials_from_env() {
            Some(credentials) => {
                logged_in = auto_login(surface, &credentials).await?;
            }
            None => {
                info!("No credentials in environment; manual login required");
            }
        }

        if !logged_in {
            info!(
                "Log in with {} credentials in the browser window, then signal resume (ceiling {}s)",
                role.display_name(),
                MANUAL_LOGIN_TIMEOUT_SECS
            );
            resume
                .wait(Duration::from_secs(MANUAL_LOGIN_TIMEOUT_SECS))
                .await?;
        }
    } else {
        info!("Already authenticated, proceeding");
    }

    surface.wait_settled().await;
    let final_url = surface.current_url();
    if !on_suite_domain(&final_url) {
        return Err(HarnessError::UnexpectedDomain(final_url));
    }

    let state = surface.storage_state().await;
    let path = state_path(config, role);
    save_state(&path, &state)?;
    info!(
        "{} session state saved to {}; rerun capture when the session expires",
        role.display_name(),
        path.display()
    );
    Ok(path)
}

// --- Degraded CLI surface ---

/// Plain-HTTP stand-in for a browser page, used by the `login` command when
/// no engine is attached. It can follow redirects and read the final page,
/// but cannot drive the identity provider's script-rendered form, so capture
/// through it relies on an already-authenticated session or manual resume.
pub struct HttpLoginSurface {
    client: reqwest::Client,
    current_url: String,
    body: String,
    cookies: Vec<Cookie>,
}

impl HttpLoginSurface {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build reqwest client");
        HttpLoginSurface {
            client,
            current_url: String::new(),
            body: String::new(),
            cookies: Vec::new(),
        }
    }
}

impl Default for HttpLoginSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LoginSurface for HttpLoginSurface {
    async fn goto(&mut self, url: &str) -> Result<(), HarnessError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HarnessError::Surface(format!("navigation to {} failed: {}", url, e)))?;

        self.current_url = response.url().to_string();

        let host = response.url().host_str().unwrap_or_default().to_string();
        for value in response.headers().get_all(reqwest::header::SET_COOKIE) {
            if let Ok(raw) = value.to_str() {
                if let Some(cookie) = parse_set_cookie(raw, &host) {
                    self.cookies.push(cookie);
                }
            }
        }

        self.body = response
            .text()
            .await
            .map_err(|e| HarnessError::Surface(format!("reading body failed: {}", e)))?;
        Ok(())
    }

    async fn wait_settled(&mut self) {}

    fn current_url(&self) -> String {
        self.current_url.clone()
    }

    async fn body_text(&self) -> String {
        self.body.clone()
    }

    async fn fill(&mut self, _selector: &str, _value: &str) -> Result<bool, HarnessError> {
        // No DOM to type into over plain HTTP.
        Ok(false)
    }

    async fn press(&mut self, _key: &str) -> Result<(), HarnessError> {
        Ok(())
    }

    async fn click(&mut self, _selector: &str) -> Result<bool, HarnessError> {
        Ok(false)
    }

    async fn storage_state(&self) -> StorageState {
        StorageState {
            cookies: self.cookies.clone(),
            origins: Vec::new(),
        }
    }
}

fn parse_set_cookie(raw: &str, host: &str) -> Option<Cookie> {
    let mut parts = raw.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    if name.trim().is_empty() {
        return None;
    }

    let mut cookie = Cookie {
        name: name.trim().to_string(),
        value: value.trim().to_string(),
        domain: host.to_string(),
        path: "/".to_string(),
        expires: -1.0,
        http_only: false,
        secure: false,
        same_site: None,
    };

    let mut max_age: Option<i64> = None;
    let mut expires_at: Option<i64> = None;

    for attr in parts {
        let attr = attr.trim();
        let (key, val) = attr.split_once('=').unwrap_or((attr, ""));
        match key.to_ascii_lowercase().as_str() {
            "domain" => cookie.domain = val.trim_start_matches('.').to_string(),
            "path" => cookie.path = val.to_string(),
            "httponly" => cookie.http_only = true,
            "secure" => cookie.secure = true,
            "samesite" => cookie.same_site = Some(val.to_string()),
            "max-age" => max_age = val.trim().parse().ok(),
            "expires" => {
                expires_at = chrono::DateTime::parse_from_rfc2822(val.trim())
                    .ok()
                    .map(|when| when.timestamp());
            }
            _ => {}
        }
    }

    // Max-Age wins over Expires; neither present means a session cookie.
    if let Some(secs) = max_age {
        cookie.expires = (Utc::now().timestamp() + secs) as f64;
    } else if let Some(ts) = expires_at {
        cookie.expires = ts as f64;
    }

    Some(cookie)
}
