use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use ms_harness::auth::{
    auto_login, capture_session_state, credentials_from_env, load_state, needs_login,
    on_suite_domain, save_state, state_path, Cookie, Credentials, HttpLoginSurface, LoginSurface,
    OriginState, StorageEntry, StorageState,
};
use ms_harness::config::HarnessConfig;
use ms_harness::environment::{Environment, Role};
use ms_harness::error::HarnessError;
use ms_harness::resume::ResumeSignal;

// Credential variables are process-global; serialize the tests that touch them.
static ENV_LOCK: Mutex<()> = Mutex::new(());

const CREDENTIAL_VARS: &[&str] = &["MS_TEST_USER", "MS_USERNAME", "MS_TEST_PASSWORD", "MS_PASSWORD"];

fn clear_credentials() {
    for var in CREDENTIAL_VARS {
        std::env::remove_var(var);
    }
}

fn test_config(auth_dir: PathBuf) -> HarnessConfig {
    HarnessConfig {
        environment: Environment::Alpha2,
        auth_dir,
        results_dir: PathBuf::from("test-results"),
        video_dir: None,
    }
}

// --- Login detection ---

#[test]
fn test_needs_login_on_identity_provider_url() {
    assert!(needs_login(
        "https://login.microsoftonline.com/common/oauth2",
        "",
        None
    ));
    assert!(needs_login("https://identity.example.com/session", "", None));
}

#[test]
fn test_needs_login_on_page_text_markers() {
    let url = "https://www.alpha2.magicsuite.net/";
    assert!(needs_login(url, "Sign in to continue", None));
    assert!(needs_login(url, "Pick an account", None));
    assert!(needs_login(url, "Microsoft - enter your password", None));
}

#[test]
fn test_authenticated_page_does_not_need_login() {
    assert!(!needs_login(
        "https://www.alpha2.magicsuite.net/dashboard",
        "Welcome back to Magic Suite",
        None
    ));
}

#[test]
fn test_needs_login_when_off_expected_domain() {
    assert!(needs_login(
        "https://example.com/landing",
        "some content",
        Some("ncalc101")
    ));
    assert!(!needs_login(
        "https://ncalc101.magicsuite.net/",
        "expression playground",
        Some("ncalc101")
    ));
}

#[test]
fn test_on_suite_domain() {
    assert!(on_suite_domain("https://data.alpha2.magicsuite.net/networks"));
    assert!(on_suite_domain("https://magicsuite.net"));
    assert!(!on_suite_domain("https://login.microsoftonline.com/"));
    // Substring tricks on a foreign host do not count.
    assert!(!on_suite_domain("https://magicsuite.net.evil.com/"));
    assert!(!on_suite_domain("not a url"));
}

// --- Storage state persistence ---

fn sample_state() -> StorageState {
    StorageState {
        cookies: vec![Cookie {
            name: "ms-session".to_string(),
            value: "abc123".to_string(),
            domain: "alpha2.magicsuite.net".to_string(),
            path: "/".to_string(),
            expires: 1_900_000_000.0,
            http_only: true,
            secure: true,
            same_site: Some("Lax".to_string()),
        }],
        origins: vec![OriginState {
            origin: "https://www.alpha2.magicsuite.net".to_string(),
            local_storage: vec![StorageEntry {
                name: "tenant".to_string(),
                value: "acme".to_string(),
            }],
        }],
    }
}

#[test]
fn test_state_path_per_role() {
    let config = test_config(PathBuf::from(".auth"));
    assert_eq!(
        state_path(&config, Role::Default),
        PathBuf::from(".auth/user.json")
    );
    assert_eq!(
        state_path(&config, Role::SuperAdmin),
        PathBuf::from(".auth/super-admin.json")
    );
    assert_eq!(
        state_path(&config, Role::RegularUser),
        PathBuf::from(".auth/regular-user.json")
    );
}

#[test]
fn test_state_roundtrip_creates_parent_dirs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".auth").join("user.json");

    save_state(&path, &sample_state()).unwrap();
    let loaded = load_state(&path).unwrap();

    assert_eq!(loaded.cookies.len(), 1);
    assert_eq!(loaded.cookies[0].name, "ms-session");
    assert!(loaded.cookies[0].http_only);
    assert_eq!(loaded.origins[0].local_storage[0].value, "acme");
}

#[test]
fn test_state_serializes_browser_field_names() {
    let json = serde_json::to_string(&sample_state()).unwrap();
    // The external context factory expects the camelCase layout.
    assert!(json.contains("\"httpOnly\""));
    assert!(json.contains("\"sameSite\""));
    assert!(json.contains("\"localStorage\""));
}

#[test]
fn test_load_state_tolerates_missing_optionals() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("user.json");
    std::fs::write(
        &path,
        r#"{"cookies":[{"name":"a","value":"b","domain":"magicsuite.net","path":"/"}]}"#,
    )
    .unwrap();

    let loaded = load_state(&path).unwrap();
    assert_eq!(loaded.cookies[0].expires, -1.0);
    assert!(!loaded.cookies[0].secure);
    assert!(loaded.origins.is_empty());
}

// --- Credentials ---

#[test]
fn test_credentials_from_env_fallback_names() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_credentials();

    assert!(credentials_from_env().is_none());

    std::env::set_var("MS_USERNAME", "tester@magicsuite.net");
    std::env::set_var("MS_PASSWORD", "hunter2");
    let creds = credentials_from_env().unwrap();
    assert_eq!(creds.username, "tester@magicsuite.net");
    assert_eq!(creds.password, "hunter2");

    // The newer variable names win over the legacy ones.
    std::env::set_var("MS_TEST_USER", "primary@magicsuite.net");
    let creds = credentials_from_env().unwrap();
    assert_eq!(creds.username, "primary@magicsuite.net");

    clear_credentials();
}

// --- Capture workflow ---

/// Scripted page states consumed one per navigation or settle call; the
/// last state sticks, standing in for what the human left on screen.
struct FakeSurface {
    script: VecDeque<(String, String)>,
    current: (String, String),
    state: StorageState,
}

impl FakeSurface {
    fn new(script: Vec<(&str, &str)>) -> Self {
        FakeSurface {
            script: script
                .into_iter()
                .map(|(u, b)| (u.to_string(), b.to_string()))
                .collect(),
            current: (String::new(), String::new()),
            state: sample_state(),
        }
    }

    fn advance(&mut self) {
        if let Some(next) = self.script.pop_front() {
            self.current = next;
        }
    }
}

#[async_trait]
impl LoginSurface for FakeSurface {
    async fn goto(&mut self, _url: &str) -> Result<(), HarnessError> {
        self.advance();
        Ok(())
    }

    async fn wait_settled(&mut self) {
        self.advance();
    }

    fn current_url(&self) -> String {
        self.current.0.clone()
    }

    async fn body_text(&self) -> String {
        self.current.1.clone()
    }

    async fn fill(&mut self, _selector: &str, _value: &str) -> Result<bool, HarnessError> {
        Ok(false)
    }

    async fn press(&mut self, _key: &str) -> Result<(), HarnessError> {
        Ok(())
    }

    async fn click(&mut self, _selector: &str) -> Result<bool, HarnessError> {
        Ok(false)
    }

    async fn storage_state(&self) -> StorageState {
        self.state.clone()
    }
}

const AUTHED: (&str, &str) = ("https://www.alpha2.magicsuite.net/dashboard", "Welcome back");
const SIGN_IN: (&str, &str) = (
    "https://login.microsoftonline.com/common/oauth2",
    "Sign in to your account",
);

#[tokio::test]
async fn test_capture_already_authenticated() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_credentials();
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path().join(".auth"));

    let mut surface = FakeSurface::new(vec![AUTHED, AUTHED, AUTHED]);
    let (handle, resume) = ResumeSignal::pair();
    drop(handle); // never needed on this path

    let path = capture_session_state(&mut surface, Role::Default, &config, resume)
        .await
        .unwrap();

    assert!(path.ends_with(".auth/user.json"));
    let saved = load_state(&path).unwrap();
    assert_eq!(saved.cookies[0].name, "ms-session");
}

#[tokio::test]
async fn test_capture_manual_login_after_resume() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_credentials();
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path().join(".auth"));

    // Lands on the identity provider, then the post-resume settle sees the
    // authenticated portal.
    let mut surface = FakeSurface::new(vec![SIGN_IN, SIGN_IN, AUTHED]);
    let (handle, resume) = ResumeSignal::pair();
    handle.resume();

    let path = capture_session_state(&mut surface, Role::SuperAdmin, &config, resume)
        .await
        .unwrap();

    assert!(path.ends_with(".auth/super-admin.json"));
    assert!(path.exists());
}

#[tokio::test]
async fn test_capture_fails_off_domain() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_credentials();
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path().join(".auth"));

    // Still stuck on the identity provider after resume.
    let mut surface = FakeSurface::new(vec![SIGN_IN, SIGN_IN, SIGN_IN]);
    let (handle, resume) = ResumeSignal::pair();
    handle.resume();

    let err = capture_session_state(&mut surface, Role::TenantAdmin, &config, resume)
        .await
        .unwrap_err();
    assert!(matches!(err, HarnessError::UnexpectedDomain(_)));
    assert!(!state_path(&config, Role::TenantAdmin).exists());
}

// --- Automatic login ---

/// Identity-provider page that accepts scripted form input. Every
/// interaction is recorded so tests can assert the login sequence; the
/// password field can be withheld to model a provider the script cannot
/// drive.
struct FormSurface {
    script: VecDeque<(String, String)>,
    current: (String, String),
    calls: Vec<String>,
    has_password_field: bool,
    state: StorageState,
}

impl FormSurface {
    fn new(script: Vec<(&str, &str)>, has_password_field: bool) -> Self {
        FormSurface {
            script: script
                .into_iter()
                .map(|(u, b)| (u.to_string(), b.to_string()))
                .collect(),
            current: (String::new(), String::new()),
            calls: Vec::new(),
            has_password_field,
            state: sample_state(),
        }
    }

    fn advance(&mut self) {
        if let Some(next) = self.script.pop_front() {
            self.current = next;
        }
    }
}

#[async_trait]
impl LoginSurface for FormSurface {
    async fn goto(&mut self, _url: &str) -> Result<(), HarnessError> {
        self.advance();
        Ok(())
    }

    async fn wait_settled(&mut self) {
        self.advance();
    }

    fn current_url(&self) -> String {
        self.current.0.clone()
    }

    async fn body_text(&self) -> String {
        self.current.1.clone()
    }

    async fn fill(&mut self, selector: &str, _value: &str) -> Result<bool, HarnessError> {
        self.calls.push(format!("fill {selector}"));
        if selector.contains("password") {
            Ok(self.has_password_field)
        } else {
            Ok(true)
        }
    }

    async fn press(&mut self, key: &str) -> Result<(), HarnessError> {
        self.calls.push(format!("press {key}"));
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<bool, HarnessError> {
        self.calls.push(format!("click {selector}"));
        Ok(true)
    }

    async fn storage_state(&self) -> StorageState {
        self.state.clone()
    }
}

#[tokio::test(start_paused = true)]
async fn test_capture_auto_login_sequence() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_credentials();
    std::env::set_var("MS_TEST_USER", "bot@magicsuite.net");
    std::env::set_var("MS_TEST_PASSWORD", "hunter2");
    scopeguard::defer! {
        clear_credentials();
    }

    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path().join(".auth"));

    // Lands on the identity provider; the post-login settle sees the portal.
    let mut surface = FormSurface::new(vec![SIGN_IN, SIGN_IN, AUTHED], true);
    let (handle, resume) = ResumeSignal::pair();
    // Dropped up front: the scripted login must finish without a resume.
    drop(handle);

    let path = capture_session_state(&mut surface, Role::Default, &config, resume)
        .await
        .unwrap();
    assert!(path.exists());

    let calls: Vec<&str> = surface.calls.iter().map(|s| s.as_str()).collect();
    assert_eq!(
        calls,
        vec![
            "fill input[type=\"email\"]",
            "press Enter",
            "fill input[type=\"password\"]",
            "press Enter",
            "click input[type=\"submit\"][value=\"Yes\"]",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_capture_falls_back_to_resume_without_password_field() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_credentials();
    std::env::set_var("MS_TEST_USER", "bot@magicsuite.net");
    std::env::set_var("MS_TEST_PASSWORD", "hunter2");
    scopeguard::defer! {
        clear_credentials();
    }

    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path().join(".auth"));

    let mut surface = FormSurface::new(vec![SIGN_IN, SIGN_IN, AUTHED], false);
    let (handle, resume) = ResumeSignal::pair();
    // The human finishes what the script could not.
    handle.resume();

    let path = capture_session_state(&mut surface, Role::RegularUser, &config, resume)
        .await
        .unwrap();
    assert!(path.ends_with(".auth/regular-user.json"));

    // The attempt stopped at the missing password field; no confirmation click.
    let calls: Vec<&str> = surface.calls.iter().map(|s| s.as_str()).collect();
    assert_eq!(
        calls,
        vec![
            "fill input[type=\"email\"]",
            "press Enter",
            "fill input[type=\"password\"]",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_auto_login_reports_missing_password_field() {
    let mut surface = FormSurface::new(vec![SIGN_IN], false);
    let credentials = Credentials {
        username: "bot@magicsuite.net".to_string(),
        password: "hunter2".to_string(),
    };
    assert!(!auto_login(&mut surface, &credentials).await.unwrap());
}

// --- HTTP surface cookie harvesting ---

/// Serve one canned HTTP response on a loopback port.
async fn one_shot_server(response: &'static str) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((mut stream, _)) = listener.accept().await {
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf).await;
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_http_surface_harvests_cookie_expiry() {
    let url = one_shot_server(
        "HTTP/1.1 200 OK\r\n\
         set-cookie: ms-session=abc; Max-Age=3600; Path=/; HttpOnly\r\n\
         set-cookie: legacy=1; Expires=Wed, 21 Oct 2026 07:28:00 GMT\r\n\
         set-cookie: temp=1\r\n\
         content-length: 2\r\n\
         connection: close\r\n\r\nok",
    )
    .await;

    let mut surface = HttpLoginSurface::new();
    surface.goto(&url).await.unwrap();
    let state = surface.storage_state().await;

    assert_eq!(state.cookies.len(), 3);

    let session = &state.cookies[0];
    assert_eq!(session.name, "ms-session");
    assert!(session.http_only);
    let now = Utc::now().timestamp() as f64;
    assert!(session.expires > now + 3500.0 && session.expires < now + 3700.0);

    let legacy_expiry = Utc.with_ymd_and_hms(2026, 10, 21, 7, 28, 0).unwrap();
    assert_eq!(state.cookies[1].expires, legacy_expiry.timestamp() as f64);

    // No expiry attributes means a session cookie.
    assert_eq!(state.cookies[2].expires, -1.0);
}
