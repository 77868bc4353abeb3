// SPDX-License-Identifier: MIT
//
// Page loading — fetch and parse off the render thread.
//
// A load runs on its own thread: fetch the text, parse it into a
// `Document`, send it back over a channel. The render loop polls the
// channel once per frame, so the browser state is only ever touched on
// the render thread.
//
// URL schemes:
//
//   piko://name        → <pages_dir>/name.xml, else a built-in page
//   http://, https://  → blocking GET with the configured User-Agent
//
// Failures never surface as errors to the caller. They come back as a
// one-line message document, like a page that says what went wrong.
//
// At most one load is in flight. Each load carries the generation it was
// started for; the browser drops results whose generation is stale.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use piko_page::{markup, Document};
use thiserror::Error;
use tracing::{debug, info};

pub const PIKO_SCHEME: &str = "piko://";

/// Pages compiled into the binary, looked up after `pages_dir`.
const BUILTIN_PAGES: &[(&str, &str)] = &[
    ("welcome", include_str!("../pages/welcome.xml")),
    ("help", include_str!("../pages/help.xml")),
];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Error: URL is empty")]
    EmptyUrl,

    #[error("Error: Could not determine URL protocol `{0}`")]
    UnknownScheme(String),

    #[error("Could not load `{0}`")]
    MissingPage(String),

    #[error("Could not load URL. \n{0}")]
    Http(#[from] reqwest::Error),
}

// ─── Source ──────────────────────────────────────────────────────────────────

/// Where page text comes from.
#[derive(Debug, Clone)]
pub struct Source {
    pub pages_dir: Option<PathBuf>,
    pub user_agent: String,
}

impl Source {
    /// Fetch the markup behind `url`.
    ///
    /// # Errors
    ///
    /// See [`LoadError`]: empty URL, unknown scheme, no such local page,
    /// or any transport or HTTP status failure.
    pub fn fetch(&self, url: &str) -> Result<String, LoadError> {
        if url.is_empty() {
            return Err(LoadError::EmptyUrl);
        }
        if let Some(name) = url.strip_prefix(PIKO_SCHEME) {
            return self.local(name);
        }
        if url.starts_with("http://") || url.starts_with("https://") {
            return self.http(url);
        }
        Err(LoadError::UnknownScheme(url.to_owned()))
    }

    /// A `piko://` page. Query and fragment don't take part in the lookup.
    fn local(&self, name: &str) -> Result<String, LoadError> {
        let page = name
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');

        if let Some(dir) = &self.pages_dir {
            let path = dir.join(format!("{page}.xml"));
            match fs::read_to_string(&path) {
                Ok(text) => return Ok(text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => debug!(path = %path.display(), %e, "local page unreadable"),
            }
        }

        BUILTIN_PAGES
            .iter()
            .find(|(n, _)| *n == page)
            .map(|(_, text)| (*text).to_owned())
            .ok_or_else(|| LoadError::MissingPage(page.to_owned()))
    }

    fn http(&self, url: &str) -> Result<String, LoadError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(self.user_agent.as_str())
            .build()?;
        let text = client.get(url).send()?.error_for_status()?.text()?;
        Ok(text)
    }

    /// Fetch and parse. Every failure becomes a message document; the
    /// message is also returned for the debug log.
    #[must_use]
    pub fn load(&self, url: &str) -> (Document, Option<String>) {
        match self.fetch(url) {
            Ok(text) => (markup::load(&text), None),
            Err(e) => {
                let message = e.to_string();
                (Document::with_message(&message), Some(message))
            }
        }
    }
}

// ─── Loader ──────────────────────────────────────────────────────────────────

/// A finished load.
#[derive(Debug)]
pub struct Loaded {
    pub generation: u64,
    pub url: String,
    pub document: Document,
    pub error: Option<String>,
}

struct InFlight {
    generation: u64,
    url: String,
    rx: Receiver<Loaded>,
}

/// Runs loads on a worker thread, one at a time.
pub struct Loader {
    source: Arc<Source>,
    in_flight: Option<InFlight>,
}

impl Loader {
    #[must_use]
    pub fn new(source: Source) -> Self {
        Self {
            source: Arc::new(source),
            in_flight: None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start loading `url`. Returns `Ok(false)` without starting anything
    /// while another load is in flight.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS refuses to spawn the worker thread.
    pub fn start(&mut self, url: &str, generation: u64) -> io::Result<bool> {
        if self.is_busy() {
            return Ok(false);
        }
        let (tx, rx) = mpsc::channel();
        let source = Arc::clone(&self.source);
        let owned = url.to_owned();

        thread::Builder::new().name("piko-loader".into()).spawn(move || {
            info!(url = %owned, generation, "load started");
            let (document, error) = source.load(&owned);
            // The browser may be gone by now; nothing to do then.
            let _ = tx.send(Loaded {
                generation,
                url: owned,
                document,
                error,
            });
        })?;

        self.in_flight = Some(InFlight {
            generation,
            url: url.to_owned(),
            rx,
        });
        Ok(true)
    }

    /// The finished load, if any. Never blocks.
    pub fn poll(&mut self) -> Option<Loaded> {
        let flight = self.in_flight.as_ref()?;
        match flight.rx.try_recv() {
            Ok(loaded) => {
                self.in_flight = None;
                Some(loaded)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                let flight = self.in_flight.take()?;
                let message = format!("Could not load `{}`: loader stopped", flight.url);
                Some(Loaded {
                    generation: flight.generation,
                    url: flight.url,
                    document: Document::with_message(&message),
                    error: Some(message),
                })
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::{Duration, Instant};

    fn source(dir: Option<PathBuf>) -> Source {
        Source {
            pages_dir: dir,
            user_agent: "Piko".into(),
        }
    }

    fn first_text(doc: &Document) -> String {
        let root = doc.tree.roots()[0];
        doc.tree[root].value().unwrap_or_default().to_owned()
    }

    fn wait(loader: &mut Loader) -> Loaded {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(loaded) = loader.poll() {
                return loaded;
            }
            assert!(Instant::now() < deadline, "load did not finish");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn error_messages() {
        let src = source(None);
        assert_eq!(src.fetch("").unwrap_err().to_string(), "Error: URL is empty");
        assert_eq!(
            src.fetch("gopher://x").unwrap_err().to_string(),
            "Error: Could not determine URL protocol `gopher://x`"
        );
        assert_eq!(
            src.fetch("piko://nowhere").unwrap_err().to_string(),
            "Could not load `nowhere`"
        );
    }

    #[test]
    fn builtin_pages_parse() {
        for (name, text) in BUILTIN_PAGES {
            assert!(markup::parse(text).is_ok(), "{name}");
        }
        let src = source(None);
        assert!(src.fetch("piko://welcome").is_ok());
        assert!(src.fetch("piko://help/?section=keys#top").is_ok());
    }

    #[test]
    fn pages_dir_wins_over_builtins() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("welcome.xml"),
            r#"<piko type="m100_xml"><text>mine</text></piko>"#,
        )
        .unwrap();
        let src = source(Some(dir.path().to_path_buf()));
        let (doc, err) = src.load("piko://welcome");
        assert_eq!(err, None);
        assert_eq!(first_text(&doc), "mine");
        assert!(src.fetch("piko://help").is_ok());
    }

    #[test]
    fn failures_become_message_documents() {
        let (doc, err) = source(None).load("");
        assert_eq!(err.as_deref(), Some("Error: URL is empty"));
        assert_eq!(first_text(&doc), "Error: URL is empty");
    }

    #[test]
    fn loader_runs_one_load_at_a_time() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.xml"),
            r#"<piko type="m100_xml"><text>a</text></piko>"#,
        )
        .unwrap();
        let mut loader = Loader::new(source(Some(dir.path().to_path_buf())));
        assert!(loader.start("piko://a", 7).unwrap());
        assert!(loader.is_busy());
        assert!(!loader.start("piko://b", 8).unwrap());

        let loaded = wait(&mut loader);
        assert_eq!(loaded.generation, 7);
        assert_eq!(loaded.url, "piko://a");
        assert_eq!(first_text(&loaded.document), "a");
        assert!(!loader.is_busy());
        assert!(loader.poll().is_none());
    }
}
