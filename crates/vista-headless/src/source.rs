// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Asset sources backed by memory or a local directory.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use vista_viewport::{AssetSource, LoadError, Progress};

enum Entry {
    Ready(Vec<u8>),
    Fail(LoadError),
    Deferred,
}

type Reply = oneshot::Sender<Result<Vec<u8>, LoadError>>;

#[derive(Default)]
struct MemoryState {
    entries: RefCell<HashMap<String, Entry>>,
    pending: RefCell<HashMap<String, (Reply, Progress)>>,
    requests: RefCell<Vec<String>>,
}

/// In-memory asset source.
///
/// Ready entries resolve on first poll after reporting 50% and 100%
/// progress. Deferred entries stay pending until [`MemorySource::complete`]
/// or [`MemorySource::reject`]. Unknown URLs fail with HTTP 404.
#[derive(Clone, Default)]
pub struct MemorySource(Rc<MemoryState>);

impl MemorySource {
    /// Empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bytes` at `url`.
    pub fn insert(&self, url: impl Into<String>, bytes: Vec<u8>) {
        self.0.entries.borrow_mut().insert(url.into(), Entry::Ready(bytes));
    }

    /// Fail requests for `url` with `err`.
    pub fn fail(&self, url: impl Into<String>, err: LoadError) {
        self.0.entries.borrow_mut().insert(url.into(), Entry::Fail(err));
    }

    /// Hold requests for `url` until resolved by hand.
    pub fn defer(&self, url: impl Into<String>) {
        self.0.entries.borrow_mut().insert(url.into(), Entry::Deferred);
    }

    /// Resolve a pending request. Returns whether one was pending.
    pub fn complete(&self, url: &str, bytes: Vec<u8>) -> bool {
        self.settle(url, Ok(bytes))
    }

    /// Fail a pending request. Returns whether one was pending.
    pub fn reject(&self, url: &str, err: LoadError) -> bool {
        self.settle(url, Err(err))
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.0.requests.borrow().clone()
    }

    /// Whether a deferred request for `url` is outstanding.
    pub fn is_pending(&self, url: &str) -> bool {
        self.0.pending.borrow().contains_key(url)
    }

    fn settle(&self, url: &str, result: Result<Vec<u8>, LoadError>) -> bool {
        let Some((reply, mut progress)) = self.0.pending.borrow_mut().remove(url) else {
            return false;
        };
        if let Ok(bytes) = &result {
            let total = bytes.len() as u64;
            progress.report_bytes(total, Some(total));
        }
        // The receiver is gone when the load future was dropped; nothing to do.
        let _ = reply.send(result);
        true
    }
}

impl AssetSource for MemorySource {
    fn fetch(&self, url: &str, mut progress: Progress) -> LocalBoxFuture<'static, Result<Vec<u8>, LoadError>> {
        self.0.requests.borrow_mut().push(url.to_owned());
        let url = url.to_owned();
        let outcome = match self.0.entries.borrow().get(&url) {
            Some(Entry::Ready(bytes)) => Some(Ok(bytes.clone())),
            Some(Entry::Fail(err)) => Some(Err(err.clone())),
            Some(Entry::Deferred) => None,
            None => Some(Err(LoadError::Http { url: url.clone(), status: 404 })),
        };
        match outcome {
            Some(result) => Box::pin(async move {
                if let Ok(bytes) = &result {
                    let total = bytes.len() as u64;
                    progress.report_bytes(total / 2, Some(total));
                    progress.report_bytes(total, Some(total));
                }
                result
            }),
            None => {
                let (reply, receiver) = oneshot::channel();
                self.0.pending.borrow_mut().insert(url.clone(), (reply, progress));
                Box::pin(async move {
                    receiver.await.unwrap_or_else(|_| {
                        Err(LoadError::Network {
                            url,
                            reason: "request dropped".to_owned(),
                        })
                    })
                })
            }
        }
    }
}

impl std::fmt::Debug for MemorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySource")
            .field("entries", &self.0.entries.borrow().len())
            .field("pending", &self.0.pending.borrow().len())
            .finish()
    }
}

/// Serves asset URLs from files under a root directory.
///
/// Leading slashes are ignored, so `/models/a.glb` and `models/a.glb` map to
/// the same file. Missing files fail with HTTP 404.
#[derive(Clone, Debug)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    /// Source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File a URL maps to.
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.root.join(url.trim_start_matches('/'))
    }
}

impl AssetSource for DirSource {
    fn fetch(&self, url: &str, mut progress: Progress) -> LocalBoxFuture<'static, Result<Vec<u8>, LoadError>> {
        let path = self.path_for(url);
        let url = url.to_owned();
        Box::pin(async move {
            let bytes = std::fs::read(&path).map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => LoadError::Http { url: url.clone(), status: 404 },
                _ => LoadError::Network {
                    url: url.clone(),
                    reason: err.to_string(),
                },
            })?;
            let total = bytes.len() as u64;
            progress.report_bytes(total, Some(total));
            Ok(bytes)
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn unknown_url_is_404() {
        let source = MemorySource::new();
        let result = block_on(source.fetch("missing.glb", Progress::silent()));
        assert_eq!(
            result,
            Err(LoadError::Http {
                url: "missing.glb".into(),
                status: 404
            })
        );
        assert_eq!(source.requests(), vec!["missing.glb"]);
    }

    #[test]
    fn deferred_request_resolves_on_complete() {
        let source = MemorySource::new();
        source.defer("a.hdr");
        let fut = source.fetch("a.hdr", Progress::silent());
        assert!(source.is_pending("a.hdr"));
        assert!(source.complete("a.hdr", vec![1, 2, 3]));
        assert_eq!(block_on(fut), Ok(vec![1, 2, 3]));
        assert!(!source.complete("a.hdr", Vec::new()));
    }

    #[test]
    fn dir_source_strips_leading_slash() {
        let source = DirSource::new("/srv/assets");
        assert_eq!(
            source.path_for("/models/a.glb"),
            PathBuf::from("/srv/assets/models/a.glb")
        );
        let missing = block_on(source.fetch("/nope.glb", Progress::silent()));
        assert!(matches!(missing, Err(LoadError::Http { status: 404, .. })));
    }
}
