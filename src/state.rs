// State document — filler words, replacement rules and the dictation history
//
// The whole document lives in one JSON file owned by `Store`. Every value that
// leaves the store and every value written to disk goes through the same
// normalization, so the file can be hand-edited without breaking the panel.
//
//   {
//     "fillerWords": ["あの", "えー"],
//     "replacementEntries": [{ "from": "くらうど", "to": "Claude" }],
//     "historyEntries": [{ "id": "...", "createdAtISO8601": "...", ... }]
//   }

use crate::constants::{DEFAULT_FILLERS, HISTORY_LIMIT};
use crate::errors::AppError;
use crate::paths::temp_path_for;
use crate::util::{is_truthy, now_iso8601, value_to_text};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────────────────────
// Data structures
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementEntry {
  pub from: String,
  pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
  pub id: String,
  #[serde(rename = "createdAtISO8601")]
  pub created_at_iso8601: String,
  pub raw_text: String,
  pub polished_text: String,
  pub inserted: bool,
  pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
  pub filler_words: Vec<String>,
  pub replacement_entries: Vec<ReplacementEntry>,
  pub history_entries: Vec<HistoryEntry>,
}

impl Default for Document {
  fn default() -> Self {
    Self {
      filler_words: DEFAULT_FILLERS.iter().map(|w| w.to_string()).collect(),
      replacement_entries: Vec::new(),
      history_entries: Vec::new(),
    }
  }
}

impl Document {
  /// Applies the normalization rules to an already-typed document.
  pub fn normalized(&self) -> Document {
    Document {
      filler_words: normalize_fillers(self.filler_words.iter().cloned()),
      replacement_entries: normalize_replacements(
        self
          .replacement_entries
          .iter()
          .map(|entry| (entry.from.clone(), entry.to.clone())),
      ),
      history_entries: normalize_history(self.history_entries.iter().cloned()),
    }
  }

  /// Returns true when the word was added.
  pub fn add_filler(&mut self, word: &str) -> bool {
    let word = word.trim();
    if word.is_empty() || self.filler_words.iter().any(|w| w == word) {
      return false;
    }
    self.filler_words.push(word.to_string());
    self.filler_words.sort();
    true
  }

  /// Returns true when at least one entry was removed.
  pub fn remove_filler(&mut self, word: &str) -> bool {
    let word = word.trim();
    let before = self.filler_words.len();
    self.filler_words.retain(|w| w != word);
    self.filler_words.len() != before
  }

  /// Updates `to` for an existing `from`, otherwise appends. Blank input is ignored.
  pub fn upsert_replacement(&mut self, src: &str, dst: &str) -> bool {
    let (src, dst) = (src.trim(), dst.trim());
    if src.is_empty() || dst.is_empty() {
      return false;
    }
    match self.replacement_entries.iter_mut().find(|entry| entry.from == src) {
      Some(entry) => entry.to = dst.to_string(),
      None => self.replacement_entries.push(ReplacementEntry {
        from: src.to_string(),
        to: dst.to_string(),
      }),
    }
    self.replacement_entries.sort_by(|a, b| a.from.cmp(&b.from));
    true
  }

  pub fn remove_replacement(&mut self, src: &str) -> bool {
    let src = src.trim();
    let before = self.replacement_entries.len();
    self.replacement_entries.retain(|entry| entry.from != src);
    self.replacement_entries.len() != before
  }

  /// Empties the history, returning how many entries were dropped.
  pub fn clear_history(&mut self) -> usize {
    let count = self.history_entries.len();
    self.history_entries.clear();
    count
  }

  pub fn history_preview(&self, limit: usize) -> &[HistoryEntry] {
    let end = self.history_entries.len().min(limit);
    &self.history_entries[..end]
  }
}

// ─────────────────────────────────────────────────────────────────────────────
// Normalization
// ─────────────────────────────────────────────────────────────────────────────

/// Builds a normalized document from loosely-typed JSON.
///
/// Missing or non-array top-level keys count as empty. Replacement and history
/// rows that are not objects are skipped. The result is stable under
/// `normalized()`, so `normalize(x)` fed back through the store never changes.
pub fn normalize(raw: &Value) -> Document {
  let fillers = array_field(raw, "fillerWords").iter().filter_map(value_to_text);

  let replacements = array_field(raw, "replacementEntries")
    .iter()
    .filter_map(Value::as_object)
    .map(|row| (text_field(row, "from"), text_field(row, "to")));

  let history = array_field(raw, "historyEntries")
    .iter()
    .filter_map(Value::as_object)
    .map(history_from_row);

  Document {
    filler_words: normalize_fillers(fillers),
    replacement_entries: normalize_replacements(replacements),
    history_entries: normalize_history(history),
  }
}

fn array_field<'a>(raw: &'a Value, key: &str) -> &'a [Value] {
  raw
    .get(key)
    .and_then(Value::as_array)
    .map(Vec::as_slice)
    .unwrap_or(&[])
}

fn text_field(row: &Map<String, Value>, key: &str) -> String {
  row.get(key).and_then(value_to_text).unwrap_or_default()
}

fn history_from_row(row: &Map<String, Value>) -> HistoryEntry {
  let error_message = row
    .get("errorMessage")
    .filter(|value| is_truthy(value))
    .and_then(value_to_text);
  HistoryEntry {
    id: text_field(row, "id"),
    created_at_iso8601: text_field(row, "createdAtISO8601"),
    raw_text: text_field(row, "rawText"),
    polished_text: text_field(row, "polishedText"),
    inserted: row.get("inserted").map(is_truthy).unwrap_or(false),
    error_message,
  }
}

fn normalize_fillers(words: impl IntoIterator<Item = String>) -> Vec<String> {
  let unique: BTreeSet<String> = words
    .into_iter()
    .map(|w| w.trim().to_string())
    .filter(|w| !w.is_empty())
    .collect();
  unique.into_iter().collect()
}

fn normalize_replacements(
  pairs: impl IntoIterator<Item = (String, String)>,
) -> Vec<ReplacementEntry> {
  let mut seen_from = HashSet::new();
  let mut entries = Vec::new();
  for (from, to) in pairs {
    let (from, to) = (from.trim(), to.trim());
    if from.is_empty() || to.is_empty() || !seen_from.insert(from.to_string()) {
      continue;
    }
    entries.push(ReplacementEntry {
      from: from.to_string(),
      to: to.to_string(),
    });
  }
  // Stable sort; `from` is unique at this point anyway.
  entries.sort_by(|a, b| a.from.cmp(&b.from));
  entries
}

fn normalize_history(rows: impl IntoIterator<Item = HistoryEntry>) -> Vec<HistoryEntry> {
  let mut history: Vec<HistoryEntry> = Vec::new();
  for row in rows {
    if history.len() == HISTORY_LIMIT {
      break;
    }
    let id = match row.id.trim() {
      "" => format!("hist-{}", history.len() + 1),
      id => id.to_string(),
    };
    let created_at_iso8601 = match row.created_at_iso8601.trim() {
      "" => now_iso8601(),
      created => created.to_string(),
    };
    history.push(HistoryEntry {
      id,
      created_at_iso8601,
      raw_text: row.raw_text,
      polished_text: row.polished_text,
      inserted: row.inserted,
      error_message: row.error_message.filter(|msg| !msg.is_empty()),
    });
  }
  history
}

// ─────────────────────────────────────────────────────────────────────────────
// Store
// ─────────────────────────────────────────────────────────────────────────────

/// Sole owner of the on-disk state document.
#[derive(Debug, Clone)]
pub struct Store {
  path: PathBuf,
}

impl Store {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Loads and normalizes the document, creating the file with defaults on first use.
  ///
  /// Unparsable content (or a JSON root that is not an object) is replaced by
  /// the default document in memory; the file itself is left untouched.
  pub fn read(&self) -> Result<Document, AppError> {
    self.ensure_exists()?;
    let raw = fs::read(&self.path).map_err(|e| {
      AppError::Storage(format!("Failed to read {}: {}", self.path.display(), e))
    })?;
    match serde_json::from_slice::<Value>(&raw) {
      Ok(value) if value.is_object() => Ok(normalize(&value)),
      Ok(_) => {
        warn!(
          "State file {} does not hold a JSON object, using defaults",
          self.path.display()
        );
        Ok(Document::default().normalized())
      }
      Err(e) => {
        warn!(
          "State file {} is not valid JSON ({}), using defaults",
          self.path.display(),
          e
        );
        Ok(Document::default().normalized())
      }
    }
  }

  /// Normalizes and persists the document via a sibling temp file and rename.
  pub fn write(&self, document: &Document) -> Result<(), AppError> {
    let normalized = document.normalized();
    if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent).map_err(|e| {
        AppError::Storage(format!("Failed to create {}: {}", parent.display(), e))
      })?;
    }
    let raw = serde_json::to_string_pretty(&normalized)
      .map_err(|e| AppError::Storage(format!("Failed to serialize state: {}", e)))?;
    let tmp = temp_path_for(&self.path);
    fs::write(&tmp, raw)
      .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", tmp.display(), e)))?;
    fs::rename(&tmp, &self.path).map_err(|e| {
      AppError::Storage(format!(
        "Failed to replace {} with {}: {}",
        self.path.display(),
        tmp.display(),
        e
      ))
    })?;
    debug!(
      fillers = normalized.filler_words.len(),
      replacements = normalized.replacement_entries.len(),
      history = normalized.history_entries.len(),
      "State written to {}",
      self.path.display()
    );
    Ok(())
  }

  /// Records one dictation result at the front of the history.
  pub fn append_history(
    &self,
    raw_text: impl Into<String>,
    polished_text: impl Into<String>,
    inserted: bool,
    error_message: Option<String>,
  ) -> Result<HistoryEntry, AppError> {
    let mut document = self.read()?;
    let entry = HistoryEntry {
      id: Uuid::new_v4().to_string(),
      created_at_iso8601: now_iso8601(),
      raw_text: raw_text.into(),
      polished_text: polished_text.into(),
      inserted,
      error_message: error_message.filter(|msg| !msg.is_empty()),
    };
    document.history_entries.insert(0, entry.clone());
    self.write(&document)?;
    Ok(entry)
  }

  fn ensure_exists(&self) -> Result<(), AppError> {
    if self.path.exists() {
      return Ok(());
    }
    info!("Creating state file at {}", self.path.display());
    self.write(&Document::default())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use tempfile::TempDir;

  fn temp_store() -> (TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(dir.path().join("nested").join("state.json"));
    (dir, store)
  }

  fn history_row(id: &str) -> Value {
    json!({
      "id": id,
      "createdAtISO8601": "2026-01-01T00:00:00Z",
      "rawText": "えー今日は",
      "polishedText": "今日は",
      "inserted": true,
      "errorMessage": null
    })
  }

  // ========== Normalization ==========

  #[test]
  fn fillers_are_trimmed_sorted_and_unique() {
    let doc = normalize(&json!({ "fillerWords": ["b", "", "a", "a"] }));
    assert_eq!(doc.filler_words, vec!["a", "b"]);

    let doc = normalize(&json!({ "fillerWords": [" その ", "その", "   ", null, 7] }));
    assert_eq!(doc.filler_words, vec!["7", "その"]);
  }

  #[test]
  fn replacements_first_occurrence_wins_and_sorted() {
    let doc = normalize(&json!({
      "replacementEntries": [
        { "from": "z", "to": "1" },
        { "from": " a ", "to": " first " },
        { "from": "a", "to": "second" },
        { "from": "", "to": "blank" },
        { "from": "m", "to": "  " },
        "not an object"
      ]
    }));
    assert_eq!(
      doc.replacement_entries,
      vec![
        ReplacementEntry { from: "a".into(), to: "first".into() },
        ReplacementEntry { from: "z".into(), to: "1".into() },
      ]
    );
  }

  #[test]
  fn history_defaults_ids_and_timestamps() {
    let doc = normalize(&json!({
      "historyEntries": [
        { "rawText": "  keep spaces  ", "inserted": 1, "errorMessage": "" },
        { "id": "  abc  ", "createdAtISO8601": "2026-02-03T04:05:06Z", "errorMessage": "mic lost" }
      ]
    }));
    let history = &doc.history_entries;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, "hist-1");
    assert!(!history[0].created_at_iso8601.is_empty());
    assert_eq!(history[0].raw_text, "  keep spaces  ");
    assert!(history[0].inserted);
    assert_eq!(history[0].error_message, None);
    assert_eq!(history[1].id, "abc");
    assert_eq!(history[1].created_at_iso8601, "2026-02-03T04:05:06Z");
    assert!(!history[1].inserted);
    assert_eq!(history[1].error_message.as_deref(), Some("mic lost"));
  }

  #[test]
  fn history_is_truncated_from_the_tail() {
    let rows: Vec<Value> = (0..350).map(|i| history_row(&format!("h{}", i))).collect();
    let doc = normalize(&json!({ "historyEntries": rows }));
    assert_eq!(doc.history_entries.len(), HISTORY_LIMIT);
    assert_eq!(doc.history_entries[0].id, "h0");
    assert_eq!(doc.history_entries[HISTORY_LIMIT - 1].id, "h299");
  }

  #[test]
  fn normalization_is_idempotent() {
    let inputs = vec![
      json!({}),
      json!({ "fillerWords": "not a list", "historyEntries": 3 }),
      json!({
        "fillerWords": ["えっと", " えっと", "", true],
        "replacementEntries": [{ "from": "b", "to": "c" }, { "from": "a", "to": 1 }, { "from": "b", "to": "x" }],
        "historyEntries": [{ "id": "" }, history_row("x"), { "errorMessage": ["oops"] }, 5]
      }),
    ];
    for input in inputs {
      let once = normalize(&input);
      let twice = once.normalized();
      assert_eq!(once, twice, "not idempotent for {}", input);
      let via_json = normalize(&serde_json::to_value(&once).unwrap());
      assert_eq!(once, via_json);
    }
  }

  #[test]
  fn missing_keys_yield_empty_lists() {
    let doc = normalize(&json!({}));
    assert!(doc.filler_words.is_empty());
    assert!(doc.replacement_entries.is_empty());
    assert!(doc.history_entries.is_empty());
  }

  // ========== Document mutations ==========

  #[test]
  fn add_filler_skips_blank_and_duplicates() {
    let mut doc = Document::default();
    let before = doc.filler_words.clone();
    assert!(!doc.add_filler("   "));
    assert!(!doc.add_filler("えー"));
    assert_eq!(doc.filler_words, before);
    assert!(doc.add_filler(" まあ "));
    assert!(doc.filler_words.contains(&"まあ".to_string()));
    assert!(doc.filler_words.windows(2).all(|w| w[0] <= w[1]));
  }

  #[test]
  fn upsert_replacement_updates_in_place() {
    let mut doc = Document::default();
    assert!(doc.upsert_replacement("X", "Y"));
    assert!(doc.upsert_replacement("X", "Z"));
    assert_eq!(
      doc.replacement_entries,
      vec![ReplacementEntry { from: "X".into(), to: "Z".into() }]
    );
    assert!(!doc.upsert_replacement("X", " "));
  }

  #[test]
  fn remove_operations_report_changes() {
    let mut doc = Document::default();
    doc.upsert_replacement("a", "b");
    assert!(!doc.remove_filler("absent"));
    assert!(doc.remove_filler("なんか"));
    assert!(!doc.remove_replacement("zzz"));
    assert!(doc.remove_replacement("a"));
    assert!(doc.replacement_entries.is_empty());
  }

  // ========== Store ==========

  #[test]
  fn first_read_creates_default_file() {
    let (_dir, store) = temp_store();
    assert!(!store.path().exists());
    let doc = store.read().unwrap();
    assert!(store.path().exists());
    assert_eq!(doc, Document::default().normalized());
    assert!(doc.replacement_entries.is_empty());
    assert!(doc.history_entries.is_empty());
  }

  #[test]
  fn write_then_read_round_trips() {
    let (_dir, store) = temp_store();
    let doc = Document {
      filler_words: vec!["b".into(), "".into(), "a".into(), "a".into()],
      replacement_entries: vec![ReplacementEntry { from: "くらうど".into(), to: "Claude".into() }],
      history_entries: vec![],
    };
    store.write(&doc).unwrap();
    let loaded = store.read().unwrap();
    assert_eq!(loaded, doc.normalized());
    assert_eq!(loaded.filler_words, vec!["a", "b"]);
  }

  #[test]
  fn persisted_json_is_pretty_and_unescaped() {
    let (_dir, store) = temp_store();
    store.write(&Document::default()).unwrap();
    let raw = fs::read_to_string(store.path()).unwrap();
    assert!(raw.contains("\n  \"fillerWords\": ["));
    assert!(raw.contains("えー"));
    assert!(!raw.contains("\\u"));
    assert!(!temp_path_for(store.path()).exists());
  }

  #[test]
  fn corrupt_file_reads_as_default() {
    let (_dir, store) = temp_store();
    store.read().unwrap();
    fs::write(store.path(), "{ this is not json").unwrap();
    let doc = store.read().unwrap();
    assert_eq!(doc, Document::default().normalized());
    // A plain read leaves the corrupt file alone.
    assert_eq!(fs::read_to_string(store.path()).unwrap(), "{ this is not json");
  }

  #[test]
  fn non_object_root_reads_as_default() {
    let (_dir, store) = temp_store();
    store.read().unwrap();
    fs::write(store.path(), "[1, 2, 3]").unwrap();
    assert_eq!(store.read().unwrap(), Document::default().normalized());
  }

  #[test]
  fn append_history_inserts_at_front_and_caps() {
    let (_dir, store) = temp_store();
    let mut doc = store.read().unwrap();
    doc.history_entries = (0..HISTORY_LIMIT)
      .map(|i| HistoryEntry {
        id: format!("old-{}", i),
        created_at_iso8601: "2026-01-01T00:00:00Z".into(),
        raw_text: String::new(),
        polished_text: String::new(),
        inserted: false,
        error_message: None,
      })
      .collect();
    store.write(&doc).unwrap();

    let entry = store
      .append_history("えっと明日", "明日", true, Some(String::new()))
      .unwrap();
    assert_eq!(entry.error_message, None);

    let loaded = store.read().unwrap();
    assert_eq!(loaded.history_entries.len(), HISTORY_LIMIT);
    assert_eq!(loaded.history_entries[0], entry);
    assert_eq!(loaded.history_entries[1].id, "old-0");
    assert_eq!(loaded.history_entries[HISTORY_LIMIT - 1].id, "old-298");
  }
}
