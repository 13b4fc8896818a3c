use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::notify::{NotificationEvent, NotificationSink};
use crate::presentation::{PageSnapshot, PageStore, WatchlistStore};

pub const DEFAULT_ARTICLE_PATH: &str = "/wiki/$1";

/// Short content fingerprint used as the revision id of fixture pages.
pub fn content_revision_id(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    let mut output = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        output.push_str(&format!("{byte:02x}"));
    }
    output
}

/// Page store backed by a directory of `.wiki` files, standing in for the
/// live wiki in tests and the CLI. File stems carry `___` for `/`, `--` for
/// `:` and `_` for spaces, so `Talk--Fix_the_roof.wiki` is the talk page of
/// `Fix_the_roof.wiki`.
#[derive(Debug, Clone)]
pub struct FixturePages {
    article_path: String,
    pages: BTreeMap<String, (String, String)>,
}

impl FixturePages {
    pub fn new(article_path: &str) -> Self {
        Self {
            article_path: article_path.to_string(),
            pages: BTreeMap::new(),
        }
    }

    pub fn scan(root: &Path, article_path: &str) -> Result<Self> {
        let mut store = Self::new(article_path);
        if !root.exists() {
            return Ok(store);
        }
        for entry in WalkDir::new(root) {
            let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("wiki") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            store.insert(&title_from_stem(stem), &content);
        }
        Ok(store)
    }

    pub fn insert(&mut self, title: &str, text: &str) {
        self.pages
            .insert(title.to_string(), (content_revision_id(text), text.to_string()));
    }

    pub fn remove(&mut self, title: &str) {
        self.pages.remove(title);
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl PageStore for FixturePages {
    fn page(&self, title: &str) -> Option<PageSnapshot> {
        let (revision_id, text) = self.pages.get(title)?;
        let talk_title = format!("Talk:{title}");
        Some(PageSnapshot {
            title: title.to_string(),
            revision_id: revision_id.clone(),
            text: text.clone(),
            talk_title: self.pages.contains_key(&talk_title).then_some(talk_title),
        })
    }

    fn page_url(&self, title: &str) -> String {
        self.article_path.replace("$1", &title.replace(' ', "_"))
    }
}

fn title_from_stem(stem: &str) -> String {
    stem.replace("___", "/").replace("--", ":").replace('_', " ")
}

/// Sink collecting delivered events, standing in for the host queue.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub events: Vec<NotificationEvent>,
}

impl NotificationSink for MemorySink {
    fn deliver(&mut self, event: &NotificationEvent) -> Result<()> {
        self.events.push(event.clone());
        Ok(())
    }
}

/// Watchlist recording (user id, title) pairs, deduplicated.
#[derive(Debug, Default)]
pub struct MemoryWatchlist {
    pub watches: Vec<(u64, String)>,
}

impl WatchlistStore for MemoryWatchlist {
    fn add_watch(&mut self, user_id: u64, title: &str) {
        if !self
            .watches
            .iter()
            .any(|(id, watched)| *id == user_id && watched == title)
        {
            self.watches.push((user_id, title.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::{FixturePages, MemoryWatchlist, content_revision_id, title_from_stem};
    use crate::presentation::{PageStore, WatchlistStore};

    #[test]
    fn revision_id_tracks_content() {
        let first = content_revision_id("{{Task|assignees=Alice}}");
        let second = content_revision_id("{{Task|assignees=Alice,Bob}}");
        assert_eq!(first.len(), 16);
        assert_ne!(first, second);
        assert_eq!(first, content_revision_id("{{Task|assignees=Alice}}"));
    }

    #[test]
    fn title_decoding_follows_file_conventions() {
        assert_eq!(title_from_stem("Fix_the_roof"), "Fix the roof");
        assert_eq!(title_from_stem("Talk--Fix_the_roof"), "Talk:Fix the roof");
        assert_eq!(title_from_stem("Project___Cleanup"), "Project/Cleanup");
    }

    #[test]
    fn scan_loads_pages_and_talk_companions() {
        let temp = tempdir().expect("tempdir");
        fs::write(
            temp.path().join("Fix_the_roof.wiki"),
            "{{Task|assignees=Alice}}",
        )
        .expect("write page");
        fs::write(temp.path().join("Talk--Fix_the_roof.wiki"), "Discussion.")
            .expect("write talk page");
        fs::write(temp.path().join("notes.txt"), "ignored").expect("write stray file");

        let store = FixturePages::scan(temp.path(), "/wiki/$1").expect("scan");
        assert_eq!(store.len(), 2);

        let page = store.page("Fix the roof").expect("page");
        assert_eq!(page.talk_title.as_deref(), Some("Talk:Fix the roof"));
        assert_eq!(page.revision_id, content_revision_id("{{Task|assignees=Alice}}"));
        assert!(store.page("Missing page").is_none());
    }

    #[test]
    fn scan_of_missing_directory_is_empty() {
        let store =
            FixturePages::scan(std::path::Path::new("/nonexistent/pages"), "/wiki/$1")
                .expect("scan");
        assert!(store.is_empty());
    }

    #[test]
    fn page_url_substitutes_underscored_title() {
        let store = FixturePages::new("https://wiki.example.org/wiki/$1");
        assert_eq!(
            store.page_url("Fix the roof"),
            "https://wiki.example.org/wiki/Fix_the_roof"
        );
    }

    #[test]
    fn watchlist_deduplicates_entries() {
        let mut watchlist = MemoryWatchlist::default();
        watchlist.add_watch(2, "Fix the roof");
        watchlist.add_watch(2, "Fix the roof");
        watchlist.add_watch(3, "Fix the roof");
        assert_eq!(watchlist.watches.len(), 2);
    }
}
