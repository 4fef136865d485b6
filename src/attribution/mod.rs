//! Attribution ledger
//!
//! Append-mostly record of the license obligations attached to every
//! imported asset. One entry per import, by design: importing the same icon
//! twice is two separate compliance events. Entries live in memory for the
//! session; the host persists and reloads them through the JSON export and
//! [`merge_from`](AttributionLedger::merge_from).

pub mod licenses;

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::models::AttributionEntry;

pub use licenses::{allows_commercial_use, license_info, requires_attribution, LicenseInfo};

#[derive(Debug, Default)]
pub struct AttributionLedger {
    entries: Mutex<Vec<AttributionEntry>>,
}

impl AttributionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> AppResult<MutexGuard<'_, Vec<AttributionEntry>>> {
        self.entries
            .lock()
            .map_err(|_| AppError::persistence("attribution ledger lock poisoned"))
    }

    /// Append one entry. Writes are never deduplicated.
    pub fn record(&self, entry: AttributionEntry) -> AppResult<()> {
        let mut entries = self.guard()?;
        debug!(
            icon = %entry.icon_id,
            provider = %entry.provider_name,
            "recorded attribution entry"
        );
        entries.push(entry);
        Ok(())
    }

    /// All entries in insertion (chronological) order.
    pub fn list(&self) -> AppResult<Vec<AttributionEntry>> {
        Ok(self.guard()?.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add only entries not already present, keyed by
    /// `(icon_id, provider_name, imported_at)`. Existing entries are never
    /// overwritten. Returns the number of entries added.
    pub fn merge_from(&self, external: Vec<AttributionEntry>) -> AppResult<usize> {
        let mut entries = self.guard()?;
        let mut seen: HashSet<_> = entries.iter().map(AttributionEntry::merge_key).collect();

        let before = entries.len();
        for entry in external {
            if seen.insert(entry.merge_key()) {
                entries.push(entry);
            }
        }
        let added = entries.len() - before;
        debug!(added, "merged external attribution entries");
        Ok(added)
    }

    /// Remove all entries. Irreversible. Returns the number removed.
    pub fn clear(&self) -> AppResult<usize> {
        let mut entries = self.guard()?;
        let removed = entries.len();
        entries.clear();
        Ok(removed)
    }

    /// Plain-text report, one stanza per entry.
    pub fn export_as_text(&self) -> AppResult<String> {
        let entries = self.guard()?;
        let mut lines = vec![
            "Icon Attributions".to_string(),
            "=".repeat(17),
            String::new(),
        ];

        for entry in entries.iter() {
            lines.push(format!("Icon: {}", entry.icon_name));
            lines.push(format!("Provider: {}", entry.provider_name));
            lines.push(format!("License: {}", entry.license));
            lines.push(format!(
                "Attribution: {}",
                entry.attribution_text.as_deref().unwrap_or("")
            ));
            lines.push(format!("URL: {}", entry.source_url));
            lines.push(format!("Imported: {}", entry.imported_at.to_rfc3339()));
            lines.push(String::new());
        }

        Ok(lines.join("\n"))
    }

    /// JSON export: an array of entry objects with field-named keys. This is
    /// the persistence shape; the host stores the string and feeds it back
    /// through [`entries_from_json`](Self::entries_from_json) +
    /// [`merge_from`](Self::merge_from).
    pub fn export_as_json(&self) -> AppResult<String> {
        let entries = self.guard()?;
        serde_json::to_string_pretty(&*entries)
            .map_err(|e| AppError::persistence(format!("failed to serialize ledger: {e}")))
    }

    /// Parse a previously exported JSON document back into entries.
    pub fn entries_from_json(json: &str) -> AppResult<Vec<AttributionEntry>> {
        serde_json::from_str(json)
            .map_err(|e| AppError::persistence(format!("invalid attribution JSON: {e}")))
    }

    /// Standalone HTML report.
    pub fn export_as_html(&self) -> AppResult<String> {
        let entries = self.guard()?;
        let mut html = String::from(
            "<!DOCTYPE html>\n\
             <html>\n\
             <head>\n\
             <title>Icon Attributions</title>\n\
             <style>\n\
             body { font-family: Arial, sans-serif; margin: 20px; }\n\
             .attribution { border: 1px solid #ddd; padding: 10px; margin: 10px 0; }\n\
             .icon-name { font-weight: bold; color: #333; }\n\
             .provider { color: #666; }\n\
             .license { background: #f5f5f5; padding: 2px 5px; border-radius: 3px; }\n\
             </style>\n\
             </head>\n\
             <body>\n\
             <h1>Icon Attributions</h1>\n",
        );

        for entry in entries.iter() {
            html.push_str(&format!(
                "<div class=\"attribution\">\n\
                 <div class=\"icon-name\">{}</div>\n\
                 <div class=\"provider\">Provider: {}</div>\n\
                 <div class=\"license\">License: {}</div>\n\
                 <div>Attribution: {}</div>\n\
                 <div><a href=\"{}\">Source URL</a></div>\n\
                 <div>Imported: {}</div>\n\
                 </div>\n",
                escape_html(&entry.icon_name),
                escape_html(&entry.provider_name),
                escape_html(&entry.license),
                escape_html(entry.attribution_text.as_deref().unwrap_or("")),
                escape_html(&entry.source_url),
                entry.imported_at.to_rfc3339(),
            ));
        }

        html.push_str("</body>\n</html>\n");
        Ok(html)
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
