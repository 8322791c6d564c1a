//! Per-player win/loss statistics.
//!
//! ```text
//! GameInfo ──▶ player_game() ──▶ PlayerGame ──▶ compute_stats() ──▶ RaceStats per own race
//!              (ladder 1on1,      (race, won,    (overall, by matchup, map,
//!               named player)      enemies)       length, matchup on map)
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{StatsError, StatsResult};
use crate::models::{GameInfo, GameType, PlayerGame, Race, ReplaySummary, OBSERVER_TEAM};
use crate::replay::map_name;

// =============================================================================
// Player View
// =============================================================================

/// View a game from `player_name`'s side.
///
/// The player wins when the winner sits on their team. Observers are
/// neither allies nor enemies.
pub fn player_game(game: &GameInfo, player_name: &str) -> StatsResult<PlayerGame> {
    if game.game_type != GameType::Ladder1v1 {
        return Err(StatsError::NotLadder1v1(game.game_type.label()));
    }
    let player = game
        .player_by_name(player_name)
        .ok_or_else(|| StatsError::PlayerAbsent(player_name.to_string()))?;
    let team = game.slot(player.id).map(|s| s.team);

    let winning_team = game
        .winner
        .and_then(|pid| game.slot(pid))
        .map(|s| s.team)
        .ok_or(StatsError::NoWinner)?;

    let mut enemy_races = Vec::new();
    let mut opponents = Vec::new();
    for other in &game.players {
        let Some(slot) = game.slot(other.id) else { continue };
        if Some(slot.team) == team || slot.team >= OBSERVER_TEAM {
            continue;
        }
        enemy_races.push(game.race_of(other));
        opponents.push(other.name.clone());
    }
    enemy_races.sort();
    enemy_races.dedup();

    Ok(PlayerGame {
        map: map_name(&game.map_path),
        race: game.race_of(player),
        won: team == Some(winning_team),
        enemy_races,
        opponents,
    })
}

// =============================================================================
// Aggregates
// =============================================================================

/// Wins and losses over a set of games.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WinLoss {
    pub wins: usize,
    pub losses: usize,
    pub total_length_ms: u64,
}

impl WinLoss {
    pub fn record(&mut self, won: bool, length_ms: u64) {
        if won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        self.total_length_ms += length_ms;
    }

    pub fn games(&self) -> usize {
        self.wins + self.losses
    }

    /// Share of games won, 0.0 to 1.0.
    pub fn win_rate(&self) -> f64 {
        match self.games() {
            0 => 0.0,
            games => self.wins as f64 / games as f64,
        }
    }

    pub fn average_length_ms(&self) -> u64 {
        match self.games() {
            0 => 0,
            games => self.total_length_ms / games as u64,
        }
    }
}

/// Game length ranges, in ten minute steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LengthBucket {
    UnderTen,
    TenToTwenty,
    TwentyToThirty,
    OverThirty,
}

impl LengthBucket {
    pub fn from_ms(ms: u64) -> Self {
        match ms / 60_000 {
            0..=9 => LengthBucket::UnderTen,
            10..=19 => LengthBucket::TenToTwenty,
            20..=29 => LengthBucket::TwentyToThirty,
            _ => LengthBucket::OverThirty,
        }
    }
}

impl fmt::Display for LengthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LengthBucket::UnderTen => "0-10 min",
            LengthBucket::TenToTwenty => "10-20 min",
            LengthBucket::TwentyToThirty => "20-30 min",
            LengthBucket::OverThirty => "30+ min",
        })
    }
}

/// Statistics for the games played as one race.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceStats {
    pub race: Race,
    pub overall: WinLoss,
    /// Keyed by enemy races, e.g. `Human, Undead`
    pub by_matchup: BTreeMap<String, WinLoss>,
    pub by_map: BTreeMap<String, WinLoss>,
    pub by_length: BTreeMap<LengthBucket, WinLoss>,
    /// Keyed by (enemy races, map)
    pub by_matchup_on_map: BTreeMap<(String, String), WinLoss>,
}

impl RaceStats {
    fn new(race: Race) -> Self {
        Self {
            race,
            overall: WinLoss::default(),
            by_matchup: BTreeMap::new(),
            by_map: BTreeMap::new(),
            by_length: BTreeMap::new(),
            by_matchup_on_map: BTreeMap::new(),
        }
    }

    fn record(&mut self, game: &PlayerGame, length_ms: u64) {
        let matchup = game.enemy_label();
        self.overall.record(game.won, length_ms);
        self.by_matchup
            .entry(matchup.clone())
            .or_default()
            .record(game.won, length_ms);
        self.by_map
            .entry(game.map.clone())
            .or_default()
            .record(game.won, length_ms);
        self.by_length
            .entry(LengthBucket::from_ms(length_ms))
            .or_default()
            .record(game.won, length_ms);
        self.by_matchup_on_map
            .entry((matchup, game.map.clone()))
            .or_default()
            .record(game.won, length_ms);
    }
}

/// Group replays by the race the player picked.
pub fn compute_stats(replays: &[ReplaySummary]) -> BTreeMap<Race, RaceStats> {
    let mut stats = BTreeMap::new();
    for replay in replays {
        stats
            .entry(replay.game.race)
            .or_insert_with(|| RaceStats::new(replay.game.race))
            .record(&replay.game, replay.header.length_ms as u64);
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::fixtures::{LadderGame, HUMAN, UNDEAD};
    use crate::replay::parse_replay;
    use chrono::DateTime;

    fn game(builder: LadderGame) -> GameInfo {
        parse_replay(&builder.replay_bytes()).unwrap().game
    }

    fn summary(builder: LadderGame) -> ReplaySummary {
        let replay = parse_replay(&builder.replay_bytes()).unwrap();
        ReplaySummary {
            filename: "game.w3g".into(),
            recorded_at: DateTime::from_timestamp(0, 0).unwrap(),
            game: player_game(&replay.game, "Moon").unwrap(),
            header: replay.header,
        }
    }

    #[test]
    fn test_player_game() {
        let view = player_game(&game(LadderGame::new("Moon", "Grubby").won_by(1)), "Moon").unwrap();

        assert_eq!(view.race, Race::NightElf);
        assert!(view.won);
        assert_eq!(view.enemy_races, vec![Race::Orc]);
        assert_eq!(view.opponents, vec!["Grubby".to_string()]);
        assert_eq!(view.map, "EchoIsles");
    }

    #[test]
    fn test_opponent_side() {
        let view = player_game(&game(LadderGame::new("Grubby", "Moon").won_by(1)), "Moon").unwrap();
        assert_eq!(view.race, Race::Orc);
        assert!(!view.won);
        assert_eq!(view.enemy_races, vec![Race::NightElf]);
    }

    #[test]
    fn test_observers_are_not_enemies() {
        let builder = LadderGame::new("Moon", "Grubby").with_observer(3, "Ref").won_by(1);
        let view = player_game(&game(builder), "Moon").unwrap();
        assert_eq!(view.opponents, vec!["Grubby".to_string()]);
    }

    #[test]
    fn test_ineligible_games() {
        let custom = game(LadderGame::new("Moon", "Grubby").game_type(0x09).won_by(1));
        assert_eq!(
            player_game(&custom, "Moon"),
            Err(StatsError::NotLadder1v1("Custom".into()))
        );

        let other = game(LadderGame::new("Sky", "Grubby").won_by(1));
        assert_eq!(
            player_game(&other, "Moon"),
            Err(StatsError::PlayerAbsent("Moon".into()))
        );

        let unfinished = game(LadderGame::new("Moon", "Grubby"));
        assert_eq!(player_game(&unfinished, "Moon"), Err(StatsError::NoWinner));
    }

    #[test]
    fn test_win_loss() {
        let mut wl = WinLoss::default();
        assert_eq!(wl.win_rate(), 0.0);
        assert_eq!(wl.average_length_ms(), 0);

        wl.record(true, 600_000);
        wl.record(true, 900_000);
        wl.record(false, 300_000);
        assert_eq!(wl.games(), 3);
        assert!((wl.win_rate() - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(wl.average_length_ms(), 600_000);
    }

    #[test]
    fn test_length_buckets() {
        assert_eq!(LengthBucket::from_ms(599_999), LengthBucket::UnderTen);
        assert_eq!(LengthBucket::from_ms(600_000), LengthBucket::TenToTwenty);
        assert_eq!(LengthBucket::from_ms(1_799_999), LengthBucket::TwentyToThirty);
        assert_eq!(LengthBucket::from_ms(1_800_000), LengthBucket::OverThirty);
        assert_eq!(LengthBucket::OverThirty.to_string(), "30+ min");
    }

    #[test]
    fn test_compute_stats() {
        let replays = vec![
            summary(LadderGame::new("Moon", "Grubby").won_by(1).length(480_000)),
            summary(LadderGame::new("Moon", "Grubby").won_by(2).length(1_320_000)),
            summary(LadderGame::new("Moon", "Sky").races(UNDEAD, HUMAN).won_by(1).map("Maps\\(4)TurtleRock.w3x")),
        ];
        let stats = compute_stats(&replays);

        assert_eq!(stats.keys().copied().collect::<Vec<_>>(), vec![Race::NightElf, Race::Undead]);

        let elf = &stats[&Race::NightElf];
        assert_eq!((elf.overall.wins, elf.overall.losses), (1, 1));
        assert_eq!(elf.by_matchup["Orc"].games(), 2);
        assert_eq!(elf.by_map["EchoIsles"].wins, 1);
        assert_eq!(elf.by_length[&LengthBucket::UnderTen].wins, 1);
        assert_eq!(elf.by_length[&LengthBucket::TwentyToThirty].losses, 1);
        assert_eq!(elf.by_matchup_on_map[&("Orc".to_string(), "EchoIsles".to_string())].games(), 2);

        let undead = &stats[&Race::Undead];
        assert_eq!(undead.by_matchup["Human"].wins, 1);
        assert_eq!(undead.by_map["TurtleRock"].games(), 1);
    }
}
