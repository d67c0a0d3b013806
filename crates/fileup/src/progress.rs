//! 📊 progress.rs — "Are we there yet?" — asked once per chunk.
//!
//! Two things live here: a chunk-level progress bar for the import while it runs,
//! and a comfy table summarizing how it went once it stops.
//!
//! ⚠️ Watching the bar will not make the service accept chunks faster.

use std::time::{Duration, Instant};

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::NOTHING};
use indicatif::{ProgressBar, ProgressStyle};

use crate::common::{ImportResult, IndexPatternResult, PatternStatus};
use crate::importer::ChunkProgress;

/// 🔢 "1000000" → "1,000,000".
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// ⏱️ MM:SS, or HH:MM:SS once it gets embarrassing.
fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// 📊 A progress bar over chunks, with a records-per-second line underneath.
pub struct ImportProgress {
    index: String,
    progress_bar: ProgressBar,
    start_time: Instant,
}

impl std::fmt::Debug for ImportProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // -- ProgressBar has no Debug worth printing
        f.debug_struct("ImportProgress")
            .field("index", &self.index)
            .finish()
    }
}

impl ImportProgress {
    /// 🚀 A visible bar for an import into `index`. The chunk count arrives with
    /// the first update.
    pub fn new(index: impl Into<String>) -> Self {
        let progress_bar = ProgressBar::new(0);
        // -- the template is a literal; if indicatif ever rejects it, a plain bar will do
        let style = ProgressStyle::default_bar()
            .template("{msg}\n| [{bar:40.cyan/blue}] {pos}/{len} chunks")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        progress_bar.set_style(style);
        Self::with_bar(index.into(), progress_bar)
    }

    /// 🙈 Same bookkeeping, nothing drawn. For dry runs and tests.
    pub fn hidden(index: impl Into<String>) -> Self {
        Self::with_bar(index.into(), ProgressBar::hidden())
    }

    fn with_bar(index: String, progress_bar: ProgressBar) -> Self {
        Self {
            index,
            progress_bar,
            start_time: Instant::now(),
        }
    }

    /// 🔄 One chunk landed.
    pub fn update(&self, progress: ChunkProgress) {
        self.progress_bar.set_length(progress.chunks_total as u64);
        self.progress_bar.set_position(progress.chunks_done as u64);

        let sent = progress.records_sent as u64;
        let elapsed = self.start_time.elapsed();
        let per_sec = if elapsed.as_secs_f64() > 0.0 {
            sent as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        self.progress_bar.set_message(format!(
            "index: {}  {} records sent  {} records/s  {} elapsed",
            self.index,
            format_number(sent),
            format_number(per_sec as u64),
            format_duration(elapsed)
        ));
    }

    pub fn position(&self) -> u64 {
        self.progress_bar.position()
    }

    /// ✅ Done, one way or another.
    pub fn finish(&self) {
        self.progress_bar.finish();
    }
}

/// 🍽️ The end-of-run report: what the import said, and what the pattern
/// registration said, if there was one.
pub fn summary_table(import: &ImportResult, pattern: Option<&IndexPatternResult>) -> Table {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let mut row = |label: &str, value: String| {
        table.add_row(vec![
            Cell::new(label).set_alignment(CellAlignment::Right),
            Cell::new(value),
        ]);
    };

    row("import", if import.success { "✅ ok" } else { "💀 failed" }.to_string());
    row("docs", format_number(import.doc_count));
    row("failures", format_number(import.failures.len() as u64));
    if let Some(ref id) = import.id {
        row("id", id.clone());
    }
    if let Some(ref error) = import.error {
        row("error", error.clone());
    }

    if let Some(pattern) = pattern {
        let status = match pattern.status {
            PatternStatus::Created => "✅ created",
            PatternStatus::IdNotFound => "⚠️ saved, id not found",
            PatternStatus::Failed => "💀 failed",
        };
        row("index pattern", status.to_string());
        if let Some(ref id) = pattern.id {
            row("pattern id", id.clone());
        }
        if let Some(ref fields) = pattern.fields {
            row("fields", format_number(fields.len() as u64));
        }
        if let Some(ref error) = pattern.error {
            row("pattern error", error.clone());
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_one_where_big_numbers_get_commas() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(25_000), "25,000");
        assert_eq!(format_number(1_000_000), "1,000,000");
    }

    #[test]
    fn the_one_where_an_hour_grows_a_third_column() {
        assert_eq!(format_duration(Duration::from_secs(75)), "01:15");
        assert_eq!(format_duration(Duration::from_secs(3_725)), "01:02:05");
    }

    #[test]
    fn the_one_where_the_bar_follows_the_chunks() {
        let progress = ImportProgress::hidden("parcels");
        progress.update(ChunkProgress { chunks_done: 2, chunks_total: 3, records_sent: 20_000 });
        assert_eq!(progress.position(), 2);
        progress.finish();
    }

    #[test]
    fn the_one_where_the_summary_tells_the_whole_story() {
        let import = ImportResult {
            id: Some("idx-1".to_string()),
            ..ImportResult::failed("Chunk 1 failed after 5 attempts: boom")
        };
        let pattern = IndexPatternResult::id_not_found();

        let rendered = summary_table(&import, Some(&pattern)).to_string();

        assert!(rendered.contains("💀 failed"));
        assert!(rendered.contains("idx-1"));
        assert!(rendered.contains("Chunk 1 failed after 5 attempts: boom"));
        assert!(rendered.contains("saved, id not found"));
    }
}
