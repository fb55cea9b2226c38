//! Directory listing page
//!
//! Rendered for a directory that has no index file. Entries whose target
//! lies outside the root (symlinks pointing elsewhere) are left out.

use std::fmt::Write as _;
use std::io;
use std::path::Path;
use tokio::fs;

use super::path::percent_encode;

pub const CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// One row of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub is_dir: bool,
    pub is_symlink: bool,
}

impl Entry {
    /// Text shown for the entry: `name/` for directories, `name@` for symlinks
    pub fn display_name(&self) -> String {
        if self.is_symlink {
            format!("{}@", self.name)
        } else if self.is_dir {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }

    /// Relative link target, with a trailing slash for directories
    pub fn link_name(&self) -> String {
        if self.is_dir {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Entries of `dir` that resolve inside `root`, sorted by lowercased name
pub async fn read_entries(dir: &Path, root: &Path) -> io::Result<Vec<Entry>> {
    let mut reader = fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(entry) = reader.next_entry().await? {
        let file_type = entry.file_type().await?;
        let is_symlink = file_type.is_symlink();
        let is_dir = if is_symlink {
            match fs::canonicalize(entry.path()).await {
                Ok(target) if target.starts_with(root) => {
                    fs::metadata(&target).await.is_ok_and(|m| m.is_dir())
                }
                _ => continue,
            }
        } else {
            file_type.is_dir()
        };

        entries.push(Entry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
            is_symlink,
        });
    }

    entries.sort_by_cached_key(|e| e.name.to_lowercase());
    Ok(entries)
}

/// Render the listing page for `display_path` (the decoded request path)
pub fn render(display_path: &str, entries: &[Entry]) -> String {
    let title = format!("Directory listing for {}", html_escape(display_path));
    let mut html = format!(
        "<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<hr>\n<ul>\n"
    );
    for entry in entries {
        let _ = writeln!(
            html,
            "<li><a href=\"{}\">{}</a></li>",
            html_escape(&percent_encode(&entry.link_name())),
            html_escape(&entry.display_name())
        );
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    html
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}
