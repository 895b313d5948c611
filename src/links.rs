//! URLs embedded in a listing page.

use crate::listing::Entry;

pub const DOWNLOAD_PREFIX: &str = "/download";
pub const VIEW_PREFIX: &str = "/view";

/// Logical location of a listed directory, as decoded path segments below the
/// root. Always rendered with forward slashes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlPath {
    segments: Vec<String>,
}

/// Links for a single listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryLinks {
    /// Browse link for directories, view link for files.
    pub primary: String,
    /// Only files can be downloaded.
    pub download: Option<String>,
}

impl UrlPath {
    pub fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Encoded directory URL, always with a trailing `/`.
    pub fn dir_url(&self) -> String {
        let mut url = String::from("/");
        for segment in &self.segments {
            url.push_str(&urlencoding::encode(segment));
            url.push('/');
        }
        url
    }

    /// Link to the enclosing directory, `None` at the root.
    pub fn parent_url(&self) -> Option<String> {
        let (_, parent) = self.segments.split_last()?;
        Some(UrlPath::new(parent.to_vec()).dir_url())
    }

    pub fn entry_links(&self, entry: &Entry) -> EntryLinks {
        let name = urlencoding::encode(&entry.name);
        let dir = self.dir_url();
        if entry.is_dir {
            EntryLinks {
                primary: format!("{dir}{name}/"),
                download: None,
            }
        } else {
            EntryLinks {
                primary: format!("{VIEW_PREFIX}{dir}{name}"),
                download: Some(format!("{DOWNLOAD_PREFIX}{dir}{name}")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::resolve;
    use std::path::PathBuf;

    fn entry(name: &str, is_dir: bool) -> Entry {
        Entry {
            name: name.to_string(),
            is_dir,
            size: 0,
            modified: String::new(),
        }
    }

    fn path(segments: &[&str]) -> UrlPath {
        UrlPath::new(segments.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn root_links() {
        let root = UrlPath::default();
        assert_eq!(root.dir_url(), "/");
        assert_eq!(root.parent_url(), None);

        let links = root.entry_links(&entry("a.txt", false));
        assert_eq!(links.primary, "/view/a.txt");
        assert_eq!(links.download.as_deref(), Some("/download/a.txt"));

        let links = root.entry_links(&entry("sub", true));
        assert_eq!(links.primary, "/sub/");
        assert_eq!(links.download, None);
    }

    #[test]
    fn nested_links_are_encoded() {
        let here = path(&["my docs", "日本"]);
        assert_eq!(here.dir_url(), "/my%20docs/%E6%97%A5%E6%9C%AC/");

        let links = here.entry_links(&entry("a#b?.txt", false));
        assert_eq!(
            links.primary,
            "/view/my%20docs/%E6%97%A5%E6%9C%AC/a%23b%3F.txt"
        );

        let links = here.entry_links(&entry("x y", true));
        assert_eq!(links.primary, "/my%20docs/%E6%97%A5%E6%9C%AC/x%20y/");
    }

    #[test]
    fn parent_links() {
        assert_eq!(path(&["sub"]).parent_url().as_deref(), Some("/"));
        assert_eq!(path(&["a", "b"]).parent_url().as_deref(), Some("/a/"));
        assert_eq!(path(&["a", "b c", "d"]).parent_url().as_deref(), Some("/a/b%20c/"));
    }

    #[test]
    fn encoded_names_resolve_back_to_the_original() {
        let root = PathBuf::from("/srv");
        for name in ["space name.txt", "ünïcødé.md", "100%;a&b=c+d#e?.txt", "日本語", "'quotes'\"x\""] {
            let links = UrlPath::default().entry_links(&entry(name, false));
            let download = links.download.unwrap();
            let rest = download.strip_prefix(DOWNLOAD_PREFIX).unwrap();
            assert_eq!(resolve(&root, rest).unwrap(), root.join(name));

            let rest = links.primary.strip_prefix(VIEW_PREFIX).unwrap();
            assert_eq!(resolve(&root, rest).unwrap(), root.join(name));
        }
    }
}
