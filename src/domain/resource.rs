//! Concrete downloadable resources and their media kind.

use serde::{Deserialize, Serialize};

/// A URL the resolver decided is worth downloading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedResource {
    pub source_url: String,

    /// Extension for the saved file (lowercase, no dot, may be empty)
    pub byte_extension: String,
}

impl ResolvedResource {
    /// Build a resource, deriving the extension from the URL path
    pub fn from_url(url: impl Into<String>) -> Self {
        let source_url = url.into();
        let byte_extension = url_extension(&source_url).unwrap_or_default();
        Self {
            source_url,
            byte_extension,
        }
    }
}

/// Broad media category, used for the optional `image`/`video` split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Unknown,
}

impl MediaKind {
    /// Folder segment when media is separated, `None` for unknown kinds
    pub fn folder(self) -> Option<&'static str> {
        match self {
            MediaKind::Image => Some("image"),
            MediaKind::Video => Some("video"),
            MediaKind::Unknown => None,
        }
    }

    /// Classify by file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "webp" | "bmp" | "tiff" | "avif" | "heic" => {
                MediaKind::Image
            }
            "mp4" | "webm" | "mkv" | "mov" | "avi" | "m4v" | "gifv" => MediaKind::Video,
            _ => MediaKind::Unknown,
        }
    }
}

/// Sniff the media kind and canonical extension from leading magic bytes
pub fn sniff(bytes: &[u8]) -> Option<(MediaKind, &'static str)> {
    const PNG: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    const EBML: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];

    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some((MediaKind::Image, "jpg"));
    }
    if bytes.starts_with(&PNG) {
        return Some((MediaKind::Image, "png"));
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some((MediaKind::Image, "gif"));
    }
    if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some((MediaKind::Image, "webp"));
    }
    if bytes.starts_with(b"BM") && bytes.len() >= 14 {
        return Some((MediaKind::Image, "bmp"));
    }
    if bytes.starts_with(&EBML) {
        // webm and mkv share the EBML header; the doctype tells them apart
        let head = &bytes[..bytes.len().min(64)];
        let is_webm = head.windows(4).any(|w| w == b"webm");
        return Some((MediaKind::Video, if is_webm { "webm" } else { "mkv" }));
    }
    if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
        return match &bytes[8..12] {
            b"qt  " => Some((MediaKind::Video, "mov")),
            b"avif" | b"avis" => Some((MediaKind::Image, "avif")),
            b"heic" | b"heix" | b"mif1" => Some((MediaKind::Image, "heic")),
            _ => Some((MediaKind::Video, "mp4")),
        };
    }
    None
}

/// Extension of the last path segment of a URL, lowercased, `jpeg` -> `jpg`
pub fn url_extension(url: &str) -> Option<String> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let path = without_query
        .split_once("://")
        .map(|(_, rest)| rest.split_once('/').map(|(_, p)| p).unwrap_or(""))
        .unwrap_or(without_query);
    let segment = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(canonical_extension(ext))
}

/// Lowercase, no leading dot, `jpeg` -> `jpg`
pub fn canonical_extension(ext: &str) -> String {
    let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
    if ext == "jpeg" {
        "jpg".to_string()
    } else {
        ext
    }
}
