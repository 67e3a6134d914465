// Fake BMC web interface shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Form, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use parking_lot::Mutex;
use tokio::net::TcpListener;

pub const TOKEN: &str = "Xy12abCDef34";
pub const JAR_BYTES: &[u8] = b"PK\x03\x04 not really a jar, but close enough";

pub fn login_ok_body(token: &str) -> String {
    format!(
        "//Dynamic data begin\n\
         WEBVAR_JSONVAR_WEB_SESSION = {{ WEBVAR_STRUCTNAME_WEB_SESSION : \
         [ {{ 'SESSION_COOKIE' : '{}', 'BMC_IP_ADDR' : '127.0.0.1' }}, {{}} ], \
         HAPI_STATUS:0 }};\n//Dynamic data end\n",
        token
    )
}

pub fn jnlp_body(codebase: &str, jar: &str, arguments: &[&str]) -> String {
    let args: String = arguments
        .iter()
        .map(|a| format!("    <argument>{}</argument>\n", a))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <jnlp spec=\"1.0+\" codebase=\"{codebase}\">\n\
         <resources>\n  <jar href=\"{jar}\" download=\"eager\" main=\"true\" />\n</resources>\n\
         <application-desc main-class=\"com.ami.kvm.jviewer.JViewer\">\n{args}</application-desc>\n\
         </jnlp>\n"
    )
}

#[derive(Default)]
pub struct Hits {
    pub login: AtomicUsize,
    pub jnlp: AtomicUsize,
    pub jar: AtomicUsize,
}

impl Hits {
    pub fn jar(&self) -> usize {
        self.jar.load(Ordering::SeqCst)
    }
}

struct Inner {
    login_body: String,
    jnlp: String,
    jar: Vec<u8>,
    hits: Arc<Hits>,
    credentials: Mutex<Vec<(String, String)>>,
}

pub struct MockBmc {
    pub addr: SocketAddr,
    pub hits: Arc<Hits>,
    inner: Arc<Inner>,
}

impl MockBmc {
    /// `host:port` form accepted by `LaunchConfig::host`.
    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Credentials received by the login endpoint, in order.
    pub fn credentials(&self) -> Vec<(String, String)> {
        self.inner.credentials.lock().clone()
    }
}

/// Start a fake BMC. `jnlp` receives the server's base URL so the codebase
/// can point back at it.
pub async fn start_mock_bmc(
    login_body: String,
    jnlp: impl FnOnce(&str) -> String,
    jar: Vec<u8>,
) -> MockBmc {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(Hits::default());

    let inner = Arc::new(Inner {
        login_body,
        jnlp: jnlp(&format!("http://{}", addr)),
        jar,
        hits: hits.clone(),
        credentials: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/rpc/WEBSES/create.asp", post(login_handler))
        .route("/Java/jviewer.jnlp", get(jnlp_handler))
        .route("/files/viewer.jar", get(jar_handler))
        .with_state(inner.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    MockBmc { addr, hits, inner }
}

async fn login_handler(
    State(inner): State<Arc<Inner>>,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    inner.hits.login.fetch_add(1, Ordering::SeqCst);
    inner.credentials.lock().push((
        form.get("WEBVAR_USERNAME").cloned().unwrap_or_default(),
        form.get("WEBVAR_PASSWORD").cloned().unwrap_or_default(),
    ));
    inner.login_body.clone()
}

async fn jnlp_handler(State(inner): State<Arc<Inner>>, headers: HeaderMap) -> impl IntoResponse {
    inner.hits.jnlp.fetch_add(1, Ordering::SeqCst);
    let expected = format!("SessionCookie={}", TOKEN);
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if cookie != expected {
        return (StatusCode::UNAUTHORIZED, "not logged in".to_string()).into_response();
    }
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/x-java-jnlp-file")],
        inner.jnlp.clone(),
    )
        .into_response()
}

async fn jar_handler(State(inner): State<Arc<Inner>>) -> impl IntoResponse {
    inner.hits.jar.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/java-archive")],
        inner.jar.clone(),
    )
}
