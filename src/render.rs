//! HTML rendering of a [`ListingPage`].

use humansize::{format_size, BINARY};
use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::listing::{DirectoryEntry, ListingPage};

const STYLE: &str = r#"
body { font-family: Arial, sans-serif; line-height: 1.6; margin: 20px; }
h1 { color: #2c3e50; }
.path { color: #7f8c8d; font-family: monospace; }
.back-link { font-size: 14px; margin-bottom: 10px; display: inline-block; color: #2980b9; text-decoration: none; }
.back-link:hover { text-decoration: underline; }
ul { list-style-type: none; padding-left: 0; }
li { margin: 8px 0; font-size: 16px; }
.file, .directory { display: flex; align-items: center; }
.file a, .directory a { margin-left: 8px; color: #34495e; text-decoration: none; }
.file a:hover, .directory a:hover { text-decoration: underline; }
.size { color: #7f8c8d; font-size: 14px; margin-left: 20px; }
.mod-time { color: #95a5a6; font-size: 14px; margin-left: 12px; }
"#;

/// Picks an icon from the entry kind and the extension's MIME category.
fn icon(entry: &DirectoryEntry) -> &'static str {
    if entry.is_dir {
        return "📁";
    }
    let Some(mime) = mime_guess::from_path(&entry.name).first() else {
        return "📄";
    };
    match (mime.type_().as_str(), mime.subtype().as_str()) {
        ("image", _) => "🖼️",
        ("audio", _) => "🎵",
        ("video", _) => "🎬",
        ("application", "zip" | "gzip" | "x-tar" | "x-7z-compressed" | "vnd.rar") => "🗄️",
        _ => "📄",
    }
}

fn entry_item(entry: &DirectoryEntry) -> Markup {
    html! {
        li class=(if entry.is_dir { "directory" } else { "file" }) {
            span class="icon" { (icon(entry)) }
            a href=(entry.href) { (entry.name) }
            @if let Some(download) = &entry.download_href {
                span class="size" data-bytes=(entry.size) { (format_size(entry.size, BINARY)) }
                a href=(download) download { "Download" }
            }
            span class="mod-time" { (entry.modified) }
        }
    }
}

/// Full HTML document for one directory listing.
pub fn listing_page(page: &ListingPage) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Index of " (page.path) }
                style { (PreEscaped(STYLE)) }
            }
            body {
                h1 { "Directory listing" }
                p class="path" { (page.path) }
                @if let Some(parent) = &page.parent {
                    p { a href=(parent) class="back-link" { "⬅ Parent directory" } }
                }
                ul {
                    @for entry in &page.entries {
                        (entry_item(entry))
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> ListingPage {
        ListingPage {
            path: "/docs/".to_string(),
            parent: Some("/".to_string()),
            entries: vec![
                DirectoryEntry {
                    name: "pics".to_string(),
                    is_dir: true,
                    size: 0,
                    modified: "2024-01-02 03:04:05".to_string(),
                    href: "/docs/pics/".to_string(),
                    download_href: None,
                },
                DirectoryEntry {
                    name: "<b>.txt".to_string(),
                    is_dir: false,
                    size: 2048,
                    modified: "2024-01-02 03:04:05".to_string(),
                    href: "/view/docs/%3Cb%3E.txt".to_string(),
                    download_href: Some("/download/docs/%3Cb%3E.txt".to_string()),
                },
            ],
        }
    }

    #[test]
    fn renders_entries_and_links() {
        let html = listing_page(&page()).into_string();
        assert!(html.contains(r#"href="/docs/pics/""#));
        assert!(html.contains(r#"href="/view/docs/%3Cb%3E.txt""#));
        assert!(html.contains(r#"href="/download/docs/%3Cb%3E.txt""#));
        assert!(html.contains(r#"data-bytes="2048""#));
        assert!(html.contains("2 KiB"));
        assert!(html.contains("⬅ Parent directory"));
    }

    #[test]
    fn names_are_escaped() {
        let html = listing_page(&page()).into_string();
        assert!(html.contains("&lt;b&gt;.txt"));
        assert!(!html.contains("<b>.txt"));
    }

    #[test]
    fn root_has_no_back_link() {
        let mut root = page();
        root.parent = None;
        let html = listing_page(&root).into_string();
        assert!(!html.contains("back-link\""));
    }

    #[test]
    fn icons_follow_mime_category() {
        let mut entry = page().entries.remove(1);
        entry.name = "cat.jpg".to_string();
        assert_eq!(icon(&entry), "🖼️");
        entry.name = "song.mp3".to_string();
        assert_eq!(icon(&entry), "🎵");
        entry.name = "README".to_string();
        assert_eq!(icon(&entry), "📄");
    }
}
