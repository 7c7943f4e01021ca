// src/crawl/path.rs
// =============================================================================
// This module maps URLs onto files inside the mirror's output directory.
//
// The rule is simple and deterministic:
// - Take the URL's path ("/catalogue/page-2.html")
// - Percent-decode it ("%20" becomes a space)
// - If it is empty or ends in "/", append "index.html"
// - Keep only its plain segments ("..", "/" and "." are dropped) and join
//   them onto the output root
//
// Nothing here touches the network. Only ensure_parent() touches the disk,
// and it must run before any file is written.
//
// Rust concepts:
// - Path vs PathBuf: borrowed vs owned filesystem paths (like &str vs String)
// - Cow<str>: "maybe borrowed, maybe owned" string returned by decoders
// =============================================================================

use std::io;
use std::path::{Component, Path, PathBuf};
use url::Url;

// Maps a URL to the file it is stored in under `root`
//
// Examples (root = "mirror"):
//   https://site/                        -> mirror/index.html
//   https://site/catalogue/page-2.html   -> mirror/catalogue/page-2.html
//   https://site/catalogue/travel_2/     -> mirror/catalogue/travel_2/index.html
pub fn local_path(root: &Path, url: &Url) -> PathBuf {
    let path = url.path();

    // A path that isn't valid UTF-8 once decoded is kept lossy rather than
    // dropped, so the mapping stays total.
    let mut decoded = match urlencoding::decode(path) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => {
            String::from_utf8_lossy(&urlencoding::decode_binary(path.as_bytes())).into_owned()
        }
    };
    if decoded.is_empty() || decoded.ends_with('/') {
        decoded.push_str("index.html");
    }

    // Decoding can turn "%2F.." into real "/.." segments. Only plain names
    // are kept, so the result never leaves `root`.
    let mut local = root.to_path_buf();
    for component in Path::new(&decoded).components() {
        if let Component::Normal(name) = component {
            local.push(name);
        }
    }

    if local == root {
        local.push("index.html");
    }
    local
}

// Renders `path` relative to the mirror root, always with "/" separators
//
// This is what goes into a rewritten href, so it must look like a URL path
// even on Windows.
pub fn relative_href(root: &Path, path: &Path) -> Option<String> {
    let relative = pathdiff::diff_paths(path, root)?;

    let parts: Vec<String> = relative
        .components()
        .map(|component| match component {
            Component::ParentDir => "..".to_string(),
            Component::CurDir => ".".to_string(),
            other => other.as_os_str().to_string_lossy().into_owned(),
        })
        .collect();

    Some(parts.join("/"))
}

// Creates the directory a file is about to be written into
//
// Safe to call repeatedly; create_dir_all succeeds if it already exists.
pub async fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent).await,
        _ => Ok(()),
    }
}
