//! Upload processing: from form fields to displayable replays.
//!
//! ```text
//! multipart ──▶ UploadFormBuilder ──▶ UploadForm ──▶ process_upload() ──▶ UploadReport
//!                (text / file parts)   (validated)    (date, decode,       (summary, stats,
//!                                                      player view)         rows)
//! ```
//!
//! Only files named in `dates` are read; the client sends a timestamp for
//! every file it selected, so anything else is a stray part. Replays that
//! decode but are not ladder 1on1 games of the named player are skipped too.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

use crate::api::logs::{log, log_info, LogEntry};
use crate::error::{UploadError, UploadResult};
use crate::models::{PlayerSummary, Race, ReplaySummary, SkippedReplay};
use crate::replay::parse_replay;
use crate::stats::{compute_stats, player_game, RaceStats};

/// File input name in the upload form.
pub const REPLAYS_FIELD: &str = "replays";

/// Player name field, set by the client.
pub const PLAYER_NAME_FIELD: &str = "playerName";

/// JSON map of file name to last-modified milliseconds.
pub const DATES_FIELD: &str = "dates";

/// One uploaded file.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A validated upload request.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadForm {
    pub player_name: String,
    pub dates: HashMap<String, i64>,
    pub replays: Vec<ReplayFile>,
}

/// Collects multipart parts in any order, then validates them.
#[derive(Debug, Default)]
pub struct UploadFormBuilder {
    player_name: Option<String>,
    dates: Option<String>,
    replays: Vec<ReplayFile>,
}

impl UploadFormBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a text part. Unknown fields are ignored; a repeated field keeps
    /// the last value.
    pub fn text(&mut self, name: &str, value: String) {
        match name {
            PLAYER_NAME_FIELD => self.player_name = Some(value),
            DATES_FIELD => self.dates = Some(value),
            _ => {}
        }
    }

    /// Record a file part. Parts with no file name (an empty file input)
    /// are dropped.
    pub fn file(&mut self, filename: String, bytes: Vec<u8>) {
        if filename.is_empty() {
            return;
        }
        self.replays.push(ReplayFile { filename, bytes });
    }

    pub fn build(self) -> UploadResult<UploadForm> {
        let player_name = self
            .player_name
            .filter(|name| !name.is_empty())
            .ok_or(UploadError::MissingField(PLAYER_NAME_FIELD))?;
        let dates = self.dates.ok_or(UploadError::MissingField(DATES_FIELD))?;

        Ok(UploadForm {
            player_name,
            dates: parse_dates(&dates)?,
            replays: self.replays,
        })
    }
}

/// Parse the `dates` field: a JSON object of integer timestamps.
pub fn parse_dates(raw: &str) -> UploadResult<HashMap<String, i64>> {
    serde_json::from_str(raw).map_err(|e| UploadError::InvalidDates(e.to_string()))
}

/// Decoded replays of one upload, plus what was left out.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReport {
    pub summary: PlayerSummary,
    pub stats: BTreeMap<Race, RaceStats>,
    /// Newest first
    pub replays: Vec<ReplaySummary>,
    pub skipped: Vec<SkippedReplay>,
}

/// Date and decode every replay named in `dates`.
///
/// Replays are listed newest first; skipped files keep upload order.
/// Unreadable or ineligible files are reported in `skipped` rather than
/// failing the whole upload.
pub fn process_upload(form: &UploadForm) -> UploadReport {
    let mut replays = Vec::new();
    let mut skipped = Vec::new();

    for file in &form.replays {
        let skip = |reason: String| SkippedReplay {
            filename: file.filename.clone(),
            reason,
        };

        let Some(&timestamp) = form.dates.get(&file.filename) else {
            skipped.push(skip("no date supplied".to_string()));
            continue;
        };
        let Some(recorded_at) = DateTime::<Utc>::from_timestamp_millis(timestamp) else {
            log(LogEntry::warning(format!("{}: timestamp {} out of range", file.filename, timestamp)).with_indent(1));
            skipped.push(skip(format!("invalid timestamp {}", timestamp)));
            continue;
        };

        let replay = match parse_replay(&file.bytes) {
            Ok(replay) => replay,
            Err(e) => {
                log(LogEntry::warning(format!("{}: {}", file.filename, e)).with_indent(1));
                skipped.push(skip(e.to_string()));
                continue;
            }
        };

        match player_game(&replay.game, &form.player_name) {
            Ok(game) => replays.push(ReplaySummary {
                filename: file.filename.clone(),
                recorded_at,
                header: replay.header,
                game,
            }),
            Err(e) => skipped.push(skip(e.to_string())),
        }
    }
    replays.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));

    log_info(format!(
        "{}: {} replay(s) read, {} skipped",
        form.player_name,
        replays.len(),
        skipped.len()
    ));

    UploadReport {
        summary: summarize(&form.player_name, &replays),
        stats: compute_stats(&replays),
        replays,
        skipped,
    }
}

/// Aggregate statistics over decoded replays.
pub fn summarize(player_name: &str, replays: &[ReplaySummary]) -> PlayerSummary {
    PlayerSummary {
        player_name: player_name.to_string(),
        replay_count: replays.len(),
        wins: replays.iter().filter(|r| r.game.won).count(),
        losses: replays.iter().filter(|r| !r.game.won).count(),
        total_length_ms: replays.iter().map(|r| r.header.length_ms as u64).sum(),
        first_game: replays.iter().map(|r| r.recorded_at).min(),
        last_game: replays.iter().map(|r| r.recorded_at).max(),
    }
}
