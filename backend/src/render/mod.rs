//! HTML rendering for the upload page and its response fragments.
//!
//! The fragment returned by `POST /upload` is inserted verbatim into the
//! page's content container by the frontend, which then wraps every table
//! flagged `datatable` (no paging) or `datatablePaging` (paging + search).
//! Rejected uploads are answered in plain text, not HTML.

pub mod page;

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt::{Display, Write as _};
use v_htmlescape::escape;

use crate::models::ReplaySummary;
use crate::replay::format_length;
use crate::stats::{RaceStats, WinLoss};
use crate::upload::UploadReport;

/// Class for tables without paging, search or info.
pub const SIMPLE_TABLE_CLASS: &str = "datatable";

/// Class for tables with paging and search.
pub const PAGINATED_TABLE_CLASS: &str = "datatablePaging";

/// Escape text for use in element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    escape(text).to_string()
}

/// Total play time as `H:MM:SS`, hours unbounded.
pub fn format_total(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

/// Win rate as a whole percentage.
pub fn format_rate(wins: usize, games: usize) -> String {
    if games == 0 {
        return "-".to_string();
    }
    format!("{:.0}%", wins as f64 * 100.0 / games as f64)
}

fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn replay_row(out: &mut String, replay: &ReplaySummary) {
    let header = &replay.header;
    let game = &replay.game;
    let _ = write!(
        out,
        "<tr><td data-order=\"{}\">{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td data-order=\"{}\">{}</td></tr>",
        replay.recorded_at.timestamp(),
        format_date(Some(replay.recorded_at)),
        escape_html(&replay.filename),
        escape_html(&game.map),
        game.race,
        escape_html(&game.opponents.join(", ")),
        escape_html(&game.enemy_label()),
        if game.won { "Win" } else { "Loss" },
        header.length_ms,
        format_length(header.length_ms as u64),
    );
}

/// One table of win/loss rows keyed by `column`.
fn win_loss_table<K: Display>(out: &mut String, id: &str, column: &str, rows: &BTreeMap<K, WinLoss>) {
    let _ = write!(
        out,
        "<table id=\"{}\" class=\"table table-striped {}\">\
         <thead><tr><th>{}</th><th>Games</th><th>Wins</th><th>Losses</th>\
         <th>Win %</th><th>Average length</th></tr></thead><tbody>",
        id, SIMPLE_TABLE_CLASS, column
    );
    for (key, wl) in rows {
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&key.to_string()),
            wl.games(),
            wl.wins,
            wl.losses,
            format_rate(wl.wins, wl.games()),
            format_length(wl.average_length_ms()),
        );
    }
    out.push_str("</tbody></table>");
}

/// Tables for the games played as one race. Ids are suffixed with the race
/// slug so they stay valid selectors.
fn race_section(out: &mut String, stats: &RaceStats) {
    let slug = stats.race.slug();
    let _ = write!(
        out,
        "<section class=\"race-stats\" id=\"race-{}\"><h3>As {}: {} of {} won ({})</h3>",
        slug,
        stats.race,
        stats.overall.wins,
        stats.overall.games(),
        format_rate(stats.overall.wins, stats.overall.games()),
    );

    win_loss_table(out, &format!("matchups-{}", slug), "Against", &stats.by_matchup);
    win_loss_table(out, &format!("maps-{}", slug), "Map", &stats.by_map);
    win_loss_table(out, &format!("lengths-{}", slug), "Length", &stats.by_length);

    let on_map: BTreeMap<String, WinLoss> = stats
        .by_matchup_on_map
        .iter()
        .map(|((matchup, map), wl)| (format!("{} on {}", matchup, map), wl.clone()))
        .collect();
    win_loss_table(out, &format!("matchup-maps-{}", slug), "Against on map", &on_map);

    out.push_str("</section>");
}

/// Fragment answering a successful upload.
pub fn render_stats_fragment(report: &UploadReport) -> String {
    let summary = &report.summary;
    let mut out = String::new();

    let _ = write!(
        out,
        "<div class=\"stats\"><h2>Statistics for {}</h2>",
        escape_html(&summary.player_name)
    );

    let _ = write!(
        out,
        "<table id=\"summaryTable\" class=\"table table-striped {}\">\
         <thead><tr><th>Replays</th><th>Wins</th><th>Losses</th><th>Win %</th><th>Total time</th>\
         <th>Average length</th><th>First game</th><th>Last game</th></tr></thead>\
         <tbody><tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr></tbody></table>",
        SIMPLE_TABLE_CLASS,
        summary.replay_count,
        summary.wins,
        summary.losses,
        format_rate(summary.wins, summary.replay_count),
        format_total(summary.total_length_ms),
        format_length(summary.average_length_ms()),
        format_date(summary.first_game),
        format_date(summary.last_game),
    );

    for stats in report.stats.values() {
        race_section(&mut out, stats);
    }

    let _ = write!(
        out,
        "<table id=\"replayTable\" class=\"table table-striped {}\">\
         <thead><tr><th>Date</th><th>File</th><th>Map</th><th>Race</th><th>Opponent</th>\
         <th>Against</th><th>Result</th><th>Length</th></tr></thead><tbody>",
        PAGINATED_TABLE_CLASS
    );
    for replay in &report.replays {
        replay_row(&mut out, replay);
    }
    out.push_str("</tbody></table>");

    if !report.skipped.is_empty() {
        let _ = write!(
            out,
            "<div class=\"alert alert-warning\" role=\"alert\"><p>{} file(s) skipped</p><ul>",
            report.skipped.len()
        );
        for skipped in &report.skipped {
            let _ = write!(
                out,
                "<li>{}: {}</li>",
                escape_html(&skipped.filename),
                escape_html(&skipped.reason)
            );
        }
        out.push_str("</ul></div>");
    }

    out.push_str("</div>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::fixtures::{ladder_replay, LadderGame, UNDEAD};
    use crate::upload::{process_upload, UploadFormBuilder, DATES_FIELD, PLAYER_NAME_FIELD};

    fn report(player: &str, files: Vec<(&str, Vec<u8>)>, dates: &str) -> UploadReport {
        let mut builder = UploadFormBuilder::new();
        builder.text(PLAYER_NAME_FIELD, player.to_string());
        builder.text(DATES_FIELD, dates.to_string());
        for (name, bytes) in files {
            builder.file(name.to_string(), bytes);
        }
        process_upload(&builder.build().unwrap())
    }

    #[test]
    fn test_escape_html() {
        let escaped = escape_html("<b>\"Tom & Jerry's\"");
        assert!(escaped.starts_with("&lt;b&gt;&quot;Tom &amp; Jerry"));
        assert!(!escaped.contains('\''));
        assert!(!escaped.contains('"'));
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_format_total() {
        assert_eq!(format_total(90_061_000), "25:01:01");
        assert_eq!(format_total(59_000), "0:00:59");
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(2, 3), "67%");
        assert_eq!(format_rate(0, 4), "0%");
        assert_eq!(format_rate(0, 0), "-");
    }

    #[test]
    fn test_fragment_flags_tables() {
        let html = render_stats_fragment(&report(
            "Moon",
            vec![("a.w3g", ladder_replay(true, 754_000))],
            r#"{"a.w3g":1000}"#,
        ));

        assert!(html.contains("id=\"summaryTable\" class=\"table table-striped datatable\""));
        assert!(html.contains("id=\"replayTable\" class=\"table table-striped datatablePaging\""));
        assert!(html.contains("id=\"matchups-nightelf\" class=\"table table-striped datatable\""));
        assert!(html.contains("id=\"maps-nightelf\""));
        assert!(html.contains("id=\"lengths-nightelf\""));
        assert!(html.contains("id=\"matchup-maps-nightelf\""));
        assert!(html.contains("<td>a.w3g</td>"));
        assert!(html.contains("<td>EchoIsles</td>"));
        assert!(html.contains("<td>Grubby</td>"));
        assert!(html.contains("<td>Win</td>"));
        assert!(html.contains("<td>Orc on EchoIsles</td>"));
        assert!(html.contains("<td>10-20 min</td>"));
        assert!(html.contains("00:12:34"));
        assert!(html.contains("1970-01-01 00:00"));
        assert!(!html.contains("skipped"));
    }

    #[test]
    fn test_summary_row() {
        let html = render_stats_fragment(&report(
            "Moon",
            vec![
                ("a.w3g", ladder_replay(true, 60_000)),
                ("b.w3g", ladder_replay(false, 60_000)),
                ("c.w3g", LadderGame::new("Moon", "Sky").races(UNDEAD, UNDEAD).won_by(1).replay_bytes()),
            ],
            r#"{"a.w3g":1000,"b.w3g":2000,"c.w3g":3000}"#,
        ));

        assert!(html.contains("<tbody><tr><td>3</td><td>2</td><td>1</td><td>67%</td>"));
        assert!(html.contains("As Night Elf: 1 of 2 won (50%)"));
        assert!(html.contains("As Undead: 1 of 1 won (100%)"));
        assert!(html.contains("id=\"matchups-undead\""));
    }

    #[test]
    fn test_fragment_escapes_user_text() {
        let html = render_stats_fragment(&report(
            "<script>",
            vec![
                ("<img>.w3g", LadderGame::new("<script>", "Grubby").won_by(1).replay_bytes()),
                ("x.w3g", b"junk".to_vec()),
            ],
            r#"{"<img>.w3g":1000}"#,
        ));

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&lt;img&gt;.w3g"));
        assert!(html.contains("1 file(s) skipped"));
        assert!(html.contains("x.w3g: no date supplied"));
    }

    #[test]
    fn test_empty_upload_renders_empty_tables() {
        let html = render_stats_fragment(&report("Moon", vec![], "{}"));
        assert!(html.contains("<tbody></tbody>"));
        assert!(html.contains("<td>0</td>"));
        assert!(!html.contains("race-stats"));
    }
}
