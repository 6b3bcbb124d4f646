//! JAMS annotation files.
//!
//! The batch workflow reads track metadata out of `file_metadata` and
//! `sandbox`, links it, and writes the merged result back. Only the fields
//! we own are touched; everything else in the document round-trips as-is.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value, json};
use walkdir::WalkDir;

use crate::error::{Error, Result, ResultExt};
use crate::linking::{InputRecord, Provider, UnifiedOutputRecord};

/// File extension of annotation files.
pub const JAMS_EXTENSION: &str = "jams";

/// A parsed annotation document and the path it came from.
#[derive(Debug, Clone)]
pub struct JamsFile {
    pub path: PathBuf,
    pub document: Value,
}

impl JamsFile {
    /// Read and parse an annotation file.
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(format!("reading {}", path.display()))?;
        let document: Value = serde_json::from_str(&text)
            .with_context(format!("parsing {}", path.display()))?;

        if !document.is_object() {
            return Err(Error::annotation(path, "document is not a JSON object"));
        }

        Ok(Self {
            path: path.to_path_buf(),
            document,
        })
    }

    /// Build the linking input from the annotation's metadata.
    pub fn input_record(&self, strict: bool) -> Result<InputRecord> {
        let meta = self
            .document
            .get("file_metadata")
            .and_then(Value::as_object)
            .ok_or_else(|| Error::annotation(&self.path, "missing file_metadata"))?;
        let sandbox = self.document.get("sandbox").and_then(Value::as_object);
        let identifiers = meta.get("identifiers").and_then(Value::as_object);

        let artist = meta
            .get("artist")
            .and_then(first_text)
            .or_else(|| sandbox.and_then(credited_artist));

        Ok(InputRecord {
            artist,
            album: meta.get("release").and_then(first_text),
            title: meta.get("title").and_then(first_text),
            track_number: sandbox
                .and_then(|s| s.get("track_number"))
                .and_then(as_u32),
            duration: meta.get("duration").and_then(Value::as_f64),
            release_year: sandbox
                .and_then(|s| s.get("release_year"))
                .and_then(as_i32),
            canonical_id: identifiers
                .and_then(|ids| ids.get("musicbrainz"))
                .and_then(first_text),
            recording_code: identifiers
                .and_then(|ids| ids.get("isrc"))
                .and_then(first_text),
            strict,
        }
        .sanitized())
    }

    /// Merge a linking result into the document.
    ///
    /// Fields the record doesn't carry are left untouched, and identifiers
    /// already present are kept unless a provider supplied a new value. An
    /// existing `duration` is never replaced.
    pub fn apply(&mut self, record: &UnifiedOutputRecord, linked_at: DateTime<Utc>) -> Result<()> {
        let path = self.path.clone();
        let root = self
            .document
            .as_object_mut()
            .ok_or_else(|| Error::annotation(&path, "document is not a JSON object"))?;

        let meta = object_entry(root, "file_metadata")
            .ok_or_else(|| Error::annotation(&path, "file_metadata is not an object"))?;
        if let Some(title) = &record.title {
            meta.insert("title".into(), json!(title.value));
        }
        if let Some(artist) = &record.artist {
            meta.insert("artist".into(), json!(artist.value));
        }
        if let Some(album) = &record.album {
            meta.insert("release".into(), json!(album.value));
        }
        // The annotated audio's own length; only filled in when unknown
        if let Some(duration) = &record.duration
            && meta.get("duration").is_none_or(Value::is_null)
        {
            meta.insert("duration".into(), json!(duration.value));
        }

        let identifiers = object_entry(meta, "identifiers")
            .ok_or_else(|| Error::annotation(&path, "identifiers is not an object"))?;
        for (key, value) in linked_identifiers(record) {
            identifiers.insert(key.into(), Value::String(value));
        }

        let sandbox = object_entry(root, "sandbox")
            .ok_or_else(|| Error::annotation(&path, "sandbox is not an object"))?;
        if let Some(track) = &record.track_number {
            sandbox.insert("track_number".into(), json!(track.value));
        }
        if let Some(year) = &record.release_year {
            sandbox.insert("release_year".into(), json!(year.value));
        }
        sandbox.insert(
            "linked_at".into(),
            json!(linked_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );

        Ok(())
    }

    /// Write the document as pretty JSON, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(format!("creating {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(&self.document)?;
        std::fs::write(path, text).with_context(format!("writing {}", path.display()))
    }
}

/// Identifier entries contributed by a linking result.
fn linked_identifiers(record: &UnifiedOutputRecord) -> Vec<(&'static str, String)> {
    let mut ids = Vec::new();

    if let Some(mbid) = &record.canonical_id {
        ids.push(("musicbrainz", mbid.value.clone()));
    }
    if let Some(isrc) = &record.recording_code {
        ids.push(("isrc", isrc.value.clone()));
    }
    if let Some(deezer) = record.links.get(&Provider::Deezer) {
        ids.push(("deezer_id", deezer.id.clone()));
        if let Some(url) = &deezer.url {
            ids.push(("deezer_url", url.clone()));
        }
    }
    if let Some(ab) = record.links.get(&Provider::AcousticBrainz) {
        ids.push(("acousticbrainz", ab.url.clone().unwrap_or_else(|| ab.id.clone())));
    }

    ids
}

/// Get `key` as a JSON object, inserting an empty one when absent or null.
fn object_entry<'a>(map: &'a mut Map<String, Value>, key: &str) -> Option<&'a mut Map<String, Value>> {
    let entry = map.entry(key).or_insert_with(|| Value::Object(Map::new()));
    if entry.is_null() {
        *entry = Value::Object(Map::new());
    }
    entry.as_object_mut()
}

/// A string value, or the first string of a list.
fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// Fallback artist from sandbox credits.
fn credited_artist(sandbox: &Map<String, Value>) -> Option<String> {
    ["composers", "performers"].iter().find_map(|key| {
        let names: Vec<&str> = match sandbox.get(*key)? {
            Value::String(s) => vec![s.as_str()],
            Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
            _ => return None,
        };
        let names: Vec<&str> = names.into_iter().map(str::trim).filter(|s| !s.is_empty()).collect();
        (!names.is_empty()).then(|| names.join(", "))
    })
}

fn as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        // "3" and "3/12" both show up in the wild
        Value::String(s) => s.split('/').next()?.trim().parse().ok(),
        _ => None,
    }
}

fn as_i32(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.get(..4)?.parse().ok(),
        _ => None,
    }
}

/// Collect annotation files under `dir`, sorted by path.
pub fn find_jams(dir: &Path, recursive: bool) -> Vec<PathBuf> {
    let walker = WalkDir::new(dir).max_depth(if recursive { usize::MAX } else { 1 });
    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_jams_file(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

fn is_jams_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(JAMS_EXTENSION))
}
