//! Asset cache policy middleware for a single-page application.
//!
//! Two handlers run in order behind every route the application registers:
//!
//! 1. the asset handler resolves the request path to a file under the build
//!    directory and serves it with [`CachePolicy::Immutable`];
//! 2. anything it did not resolve falls through to the entry document, read
//!    straight from disk and served with [`CachePolicy::NoStore`].
//!
//! ```rust,ignore
//! let api = Router::new().route("/api/health", get(health));
//! let app = SpaAssets::new("client/dist")?.install(api);
//! ```

use std::{
    io::ErrorKind,
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use axum::{
    body::Body,
    debug_handler,
    extract::{Request, State},
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
    Router,
};
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tracing::{debug, error, info, warn};

use crate::{
    cache_policy::CachePolicy,
    error::{EntryDocumentError, StartupError},
};

pub const ENTRY_DOCUMENT: &str = "index.html";

#[derive(Clone, Debug)]
pub struct SpaAssets {
    build_dir: Arc<PathBuf>,
    entry_document: Arc<PathBuf>,
    assets: ServeDir,
}

impl SpaAssets {
    /// Resolves the build directory and checks that it exists.
    ///
    /// This is the only place a missing build is reported as fatal. The entry
    /// document itself is not checked here; if it disappears the fallback
    /// answers `404 Not Found`.
    pub fn new(build_dir: impl AsRef<Path>) -> Result<Self, StartupError> {
        let requested = build_dir.as_ref();
        let build_dir = requested
            .canonicalize()
            .map_err(|source| StartupError::BuildDirMissing {
                path: requested.to_path_buf(),
                source,
            })?;
        if !build_dir.is_dir() {
            return Err(StartupError::NotADirectory { path: build_dir });
        }

        let entry_document = build_dir.join(ENTRY_DOCUMENT);
        let assets = ServeDir::new(&build_dir).append_index_html_on_directories(false);

        Ok(Self {
            build_dir: Arc::new(build_dir),
            entry_document: Arc::new(entry_document),
            assets,
        })
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    pub fn entry_document(&self) -> &Path {
        &self.entry_document
    }

    /// Attaches the SPA as the fallback of `router`.
    ///
    /// Routes already on `router`, and any added later, take precedence, so
    /// API paths are never shadowed by the catch-all.
    pub fn install<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        info!("serving SPA from {}", self.build_dir.display());
        router.fallback_service(self.into_service())
    }

    /// Stand-alone router answering every path with the SPA.
    pub fn router<S>(self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.install(Router::new())
    }

    // GET also answers HEAD; other methods get 405.
    fn into_service(self) -> MethodRouter {
        get(serve).with_state(self)
    }
}

#[debug_handler]
async fn serve(State(spa): State<SpaAssets>, request: Request) -> Response {
    let path = request.uri().path().to_owned();

    if !spa.resolves_to_entry_document(&path).await {
        let response = match spa.assets.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        let status = response.status();
        if status != StatusCode::NOT_FOUND {
            let policy = asset_policy(status);
            if policy == CachePolicy::NoStore {
                warn!(path, %status, "asset request failed");
            } else {
                debug!(path, %status, %policy, "asset");
            }
            let mut response = response.map(Body::new);
            policy.apply(response.headers_mut());
            return response;
        }
    }

    debug!(path, policy = %CachePolicy::NoStore, "entry document fallback");
    match read_entry_document(&spa.entry_document).await {
        Ok(response) => response,
        Err(err) => {
            match &err {
                EntryDocumentError::NotFound { .. } => warn!("{err}"),
                EntryDocumentError::Io { .. } => error!("{err}"),
            }
            err.into_response()
        }
    }
}

/// Only a file that was actually found keeps the one-year contract. Failures
/// such as a 500 from an unreadable file must not be cached anywhere.
fn asset_policy(status: StatusCode) -> CachePolicy {
    if status.is_success()
        || status == StatusCode::NOT_MODIFIED
        || status == StatusCode::RANGE_NOT_SATISFIABLE
    {
        CachePolicy::Immutable
    } else {
        CachePolicy::NoStore
    }
}

impl SpaAssets {
    /// The entry document is only ever served through the fallback, whatever
    /// spelling or link reaches it.
    async fn resolves_to_entry_document(&self, path: &str) -> bool {
        let Some(relative) = normalize_request_path(path) else {
            return false;
        };
        if relative.as_os_str() == ENTRY_DOCUMENT {
            return true;
        }
        match (
            tokio::fs::canonicalize(self.build_dir.join(&relative)).await,
            tokio::fs::canonicalize(self.entry_document.as_path()).await,
        ) {
            (Ok(resolved), Ok(entry_document)) => resolved == entry_document,
            _ => false,
        }
    }
}

/// Relative path under the build directory that `ServeDir` would open for
/// `path`: percent-decoded, `.` segments dropped, trailing slash ignored.
/// `None` for paths `ServeDir` refuses outright.
fn normalize_request_path(path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(path.trim_start_matches('/')).ok()?;
    let mut normalized = PathBuf::new();
    for component in Path::new(&*decoded).components() {
        match component {
            Component::Normal(segment) => normalized.push(segment),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(normalized)
}

async fn read_entry_document(path: &Path) -> Result<Response, EntryDocumentError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| match source.kind() {
        ErrorKind::NotFound => EntryDocumentError::NotFound {
            path: path.to_path_buf(),
        },
        _ => EntryDocumentError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let mut response = (
        [(
            CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        )],
        bytes,
    )
        .into_response();
    CachePolicy::NoStore.apply(response.headers_mut());
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_request_path() {
        let normalized = |path: &str| normalize_request_path(path).map(|p| p.display().to_string());

        assert_eq!(normalized("/index.html").as_deref(), Some("index.html"));
        assert_eq!(normalized("/%69ndex.html").as_deref(), Some("index.html"));
        assert_eq!(normalized("/./index.html").as_deref(), Some("index.html"));
        assert_eq!(normalized("/index.html/").as_deref(), Some("index.html"));
        assert_eq!(normalized("/assets//app.js").as_deref(), Some("assets/app.js"));
        assert_eq!(normalized("/").as_deref(), Some(""));
        assert_eq!(normalized("/../etc/passwd"), None);
        assert_eq!(normalized("/%2e%2e/etc/passwd"), None);
    }

    #[test]
    fn test_asset_policy_by_status() {
        assert_eq!(asset_policy(StatusCode::OK), CachePolicy::Immutable);
        assert_eq!(asset_policy(StatusCode::PARTIAL_CONTENT), CachePolicy::Immutable);
        assert_eq!(asset_policy(StatusCode::NOT_MODIFIED), CachePolicy::Immutable);
        assert_eq!(
            asset_policy(StatusCode::RANGE_NOT_SATISFIABLE),
            CachePolicy::Immutable
        );
        assert_eq!(
            asset_policy(StatusCode::INTERNAL_SERVER_ERROR),
            CachePolicy::NoStore
        );
        assert_eq!(
            asset_policy(StatusCode::PRECONDITION_FAILED),
            CachePolicy::NoStore
        );
    }

    #[tokio::test]
    async fn test_resolves_to_entry_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("index.html"), "<html></html>").expect("index.html");
        std::fs::write(dir.path().join("app.js"), "").expect("app.js");
        let spa = SpaAssets::new(dir.path()).expect("spa");

        assert!(spa.resolves_to_entry_document("/index.html").await);
        assert!(spa.resolves_to_entry_document("/%69ndex.html").await);
        assert!(!spa.resolves_to_entry_document("/app.js").await);
        assert!(!spa.resolves_to_entry_document("/").await);
        assert!(!spa.resolves_to_entry_document("/docs/index.html").await);
    }

    #[test]
    fn test_new_rejects_missing_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("dist");

        let err = SpaAssets::new(&missing).expect_err("missing dir must fail");

        assert!(matches!(err, StartupError::BuildDirMissing { .. }));
        assert!(err.to_string().contains(&missing.display().to_string()));
    }

    #[test]
    fn test_new_rejects_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("dist");
        std::fs::write(&file, "not a directory").expect("write");

        let err = SpaAssets::new(&file).expect_err("file must fail");

        assert!(matches!(err, StartupError::NotADirectory { .. }));
    }

    #[test]
    fn test_new_resolves_entry_document() {
        let dir = tempfile::tempdir().expect("tempdir");

        let spa = SpaAssets::new(dir.path()).expect("spa");

        assert!(spa.build_dir().is_absolute());
        assert_eq!(spa.entry_document(), spa.build_dir().join("index.html"));
    }

    #[tokio::test]
    async fn test_read_entry_document_missing() {
        let dir = tempfile::tempdir().expect("tempdir");

        let err = read_entry_document(&dir.path().join(ENTRY_DOCUMENT))
            .await
            .expect_err("no index.html");

        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
