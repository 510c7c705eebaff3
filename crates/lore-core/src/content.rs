//! Content library: per-topic books, videos and presentations on disk.
//!
//! Layout: `<root>/<topic>/<type>/<type>.json` holds an explicit item list.
//! Without it the `<type>` directory is scanned for `.pdf`, `.txt` and `.md`
//! files and titles are derived from the filenames.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::topics::find_topic;

pub const CONTENT_TYPES: &[&str] = &["books", "videos", "presentations"];

const SCANNED_EXTENSIONS: &[&str] = &["pdf", "txt", "md"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub title: String,
    pub filename: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone)]
pub struct ContentLibrary {
    root: PathBuf,
}

impl ContentLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn is_content_type(content_type: &str) -> bool {
        CONTENT_TYPES.contains(&content_type)
    }

    /// Items for a catalog topic and known content type; anything else is empty.
    pub fn load(&self, topic: &str, content_type: &str) -> Vec<ContentItem> {
        if find_topic(topic).is_none() || !Self::is_content_type(content_type) {
            return Vec::new();
        }
        let dir = self.root.join(topic).join(content_type);
        let listing = dir.join(format!("{}.json", content_type));

        if listing.is_file() {
            return match std::fs::read_to_string(&listing)
                .map_err(|e| e.to_string())
                .and_then(|s| serde_json::from_str::<Vec<ContentItem>>(&s).map_err(|e| e.to_string()))
            {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!(
                        target: "lore::content",
                        path = %listing.display(),
                        error = %e,
                        "content listing unreadable"
                    );
                    Vec::new()
                }
            };
        }

        scan_dir(&dir, content_type)
    }
}

fn scan_dir(dir: &Path, content_type: &str) -> Vec<ContentItem> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let kind = content_type.strip_suffix('s').unwrap_or(content_type).to_string();

    let mut items: Vec<ContentItem> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| {
            Path::new(name)
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| SCANNED_EXTENSIONS.contains(&ext))
        })
        .map(|filename| ContentItem {
            title: title_from_filename(&filename),
            filename,
            kind: kind.clone(),
        })
        .collect();
    items.sort_by(|a, b| a.filename.cmp(&b.filename));
    items
}

/// `herbal_remedies_vol_1.pdf` -> `Herbal Remedies Vol 1`. Only `.pdf` is
/// dropped from titles; `.txt` and `.md` keep their extension.
pub fn title_from_filename(filename: &str) -> String {
    let spaced = filename.replace('_', " ");
    let titled = spaced
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ");
    titled
        .strip_suffix(".Pdf")
        .or_else(|| titled.strip_suffix(".pdf"))
        .unwrap_or(&titled)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_from_filenames() {
        assert_eq!(title_from_filename("herbal_remedies_vol_1.pdf"), "Herbal Remedies Vol 1");
        assert_eq!(title_from_filename("notes.md"), "Notes.md");
    }

    #[test]
    fn json_listing_wins_over_scan() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("apocrypha").join("books");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("ignored.pdf"), b"x").unwrap();
        std::fs::write(
            dir.join("books.json"),
            r#"[{"title":"Book of Enoch","filename":"enoch.pdf","type":"book"}]"#,
        )
        .unwrap();

        let items = ContentLibrary::new(root.path()).load("apocrypha", "books");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Book of Enoch");
    }

    #[test]
    fn bad_json_listing_is_empty() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("apocrypha").join("books");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("books.json"), b"{not json").unwrap();
        assert!(ContentLibrary::new(root.path()).load("apocrypha", "books").is_empty());
    }

    #[test]
    fn scan_picks_known_extensions() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("lost_history").join("presentations");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("atlantis_deck.pdf"), b"x").unwrap();
        std::fs::write(dir.join("readme.md"), b"x").unwrap();
        std::fs::write(dir.join("cover.png"), b"x").unwrap();

        let items = ContentLibrary::new(root.path()).load("lost_history", "presentations");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Atlantis Deck");
        assert_eq!(items[0].kind, "presentation");
        assert_eq!(items[1].filename, "readme.md");
    }

    #[test]
    fn unknown_topic_type_or_missing_dir_is_empty() {
        let root = tempfile::tempdir().unwrap();
        let lib = ContentLibrary::new(root.path());
        assert!(lib.load("..", "books").is_empty());
        assert!(lib.load("apocrypha", "../../etc").is_empty());
        assert!(lib.load("apocrypha", "videos").is_empty());
    }
}
