//! # Remote URL Resolution
//!
//! Import identifiers are not always the address of their git repository.
//! Hosts advertise the real location through a `go-import` meta tag served at
//! `https://<import>?go-get=1`. `RemoteResolver` probes that page (falling back
//! to plain HTTP) and otherwise assumes `https://<import>`.
//!
//! Results are cached for the lifetime of the resolver. The cache lock is held
//! only while reading or updating the map, never across the network probe, so
//! slow hosts do not serialize unrelated lookups. If two callers race on the
//! same identifier the first stored answer wins and both return it.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use log::{debug, warn};
use regex::Regex;

use crate::error::{Error, Result};

/// Timeout for each metadata probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches the body of an import's metadata page.
pub trait MetaFetch: Send + Sync {
    /// Returns the response body for `url`, regardless of status code.
    fn fetch(&self, url: &str) -> Result<String>;
}

/// The default `MetaFetch`, backed by a blocking HTTP agent.
pub struct HttpMetaFetch {
    agent: ureq::Agent,
}

impl HttpMetaFetch {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl Default for HttpMetaFetch {
    fn default() -> Self {
        Self::new(PROBE_TIMEOUT)
    }
}

impl MetaFetch for HttpMetaFetch {
    fn fetch(&self, url: &str) -> Result<String> {
        let response = match self.agent.get(url).call() {
            Ok(response) => response,
            // Error pages can still carry the meta tag.
            Err(ureq::Error::Status(_, response)) => response,
            Err(e) => {
                return Err(Error::Network {
                    url: url.to_string(),
                    message: e.to_string(),
                })
            }
        };
        response.into_string().map_err(|e| Error::Network {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

/// Process-scoped cache of import identifier to git remote URL.
#[derive(Clone)]
pub struct RemoteResolver {
    fetcher: Arc<dyn MetaFetch>,
    cache: Arc<Mutex<HashMap<String, String>>>,
}

impl RemoteResolver {
    pub fn new(fetcher: Arc<dyn MetaFetch>) -> Self {
        Self {
            fetcher,
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the git URL to clone `import` from.
    pub fn resolve(&self, import: &str) -> Result<String> {
        {
            let cache = self.cache.lock().map_err(|_| Error::LockPoisoned {
                context: "remote URL cache".to_string(),
            })?;
            if let Some(url) = cache.get(import) {
                return Ok(url.clone());
            }
        }

        let url = self
            .probe("https", import)
            .or_else(|| self.probe("http", import))
            .unwrap_or_else(|| format!("https://{}", import));
        debug!("remote for {} is {}", import, url);

        let mut cache = self.cache.lock().map_err(|_| Error::LockPoisoned {
            context: "remote URL cache".to_string(),
        })?;
        Ok(cache.entry(import.to_string()).or_insert(url).clone())
    }

    fn probe(&self, scheme: &str, import: &str) -> Option<String> {
        let url = format!("{}://{}?go-get=1", scheme, import);
        match self.fetcher.fetch(&url) {
            Ok(body) => scan_go_import(&body, import),
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }
}

impl Default for RemoteResolver {
    fn default() -> Self {
        Self::new(Arc::new(HttpMetaFetch::default()))
    }
}

impl fmt::Debug for RemoteResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteResolver").finish_non_exhaustive()
    }
}

fn go_import_meta() -> &'static Regex {
    static META: OnceLock<Regex> = OnceLock::new();
    META.get_or_init(|| {
        Regex::new(r#"<meta\s+name="go-import"\s+content="([^"]*)""#)
            .expect("go-import pattern is valid")
    })
}

/// Finds the git URL an HTML page declares for `import`.
///
/// Only the first `go-import` tag is considered; it must name `import` and
/// the `git` VCS.
pub fn scan_go_import(body: &str, import: &str) -> Option<String> {
    let captures = go_import_meta().captures(body)?;
    let mut parts = captures[1].split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(prefix), Some("git"), Some(url)) if prefix == import => Some(url.to_string()),
        _ => None,
    }
}
