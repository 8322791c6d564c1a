//! Domain models for the replay upload.
//!
//! - [`Product`] - Game the replay was recorded with
//! - [`GameMode`] - Single or multiplayer
//! - [`ReplayHeader`] - Fixed-size `.w3g` header
//! - [`Race`], [`GameType`] - Startup record enums
//! - [`PlayerRecord`], [`SlotRecord`], [`GameInfo`] - Decoded game data
//! - [`Replay`] - Header plus game data
//! - [`PlayerGame`] - One replay from the named player's side
//! - [`ReplaySummary`] - One uploaded replay ready for display
//! - [`PlayerSummary`] - Aggregate over all uploaded replays

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Product
// =============================================================================

/// Game the replay was recorded with.
///
/// Header v0 replays predate the product field and are always Reign of Chaos.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Product {
    /// `WAR3` - Reign of Chaos
    ReignOfChaos,
    /// `W3XP` - The Frozen Throne
    FrozenThrone,
    /// Any other four-letter id
    Other(String),
}

impl Product {
    /// Map the four-letter id (already un-reversed) to a product.
    pub fn from_id(id: &str) -> Self {
        match id {
            "WAR3" => Product::ReignOfChaos,
            "W3XP" => Product::FrozenThrone,
            other => Product::Other(other.to_string()),
        }
    }

    /// Short label for tables.
    pub fn label(&self) -> &str {
        match self {
            Product::ReignOfChaos => "RoC",
            Product::FrozenThrone => "TFT",
            Product::Other(id) => id,
        }
    }
}

// =============================================================================
// Game Mode
// =============================================================================

/// Flags word of the header.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GameMode {
    /// `0x0000`
    SinglePlayer,
    /// `0x8000`
    Multiplayer,
    /// Any other flags value
    Unknown(u16),
}

impl GameMode {
    pub fn from_flags(flags: u16) -> Self {
        match flags {
            0x0000 => GameMode::SinglePlayer,
            0x8000 => GameMode::Multiplayer,
            other => GameMode::Unknown(other),
        }
    }

    pub fn label(&self) -> String {
        match self {
            GameMode::SinglePlayer => "Single player".to_string(),
            GameMode::Multiplayer => "Multiplayer".to_string(),
            GameMode::Unknown(flags) => format!("Unknown ({:#06x})", flags),
        }
    }
}

// =============================================================================
// Replay Header
// =============================================================================

/// Fixed-size header of a `.w3g` file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplayHeader {
    /// Offset of the first data block
    pub header_size: u32,
    /// Total file size, compressed
    pub compressed_size: u32,
    /// 0 for versions up to 1.06, 1 afterwards
    pub header_version: u32,
    /// Size of the decompressed data
    pub decompressed_size: u32,
    /// Number of compressed data blocks
    pub block_count: u32,
    pub product: Product,
    /// Patch minor version (e.g. 26 for 1.26)
    pub version: u32,
    pub build: u16,
    pub mode: GameMode,
    /// Game length in milliseconds
    pub length_ms: u32,
    pub checksum: u32,
}

impl ReplayHeader {
    /// Patch label such as `1.26`.
    pub fn version_label(&self) -> String {
        format!("1.{:02}", self.version)
    }
}

// =============================================================================
// Race
// =============================================================================

/// Race picked by a player.
///
/// Ordered as the game lists them, so tables keep a stable order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Race {
    Human,
    Orc,
    NightElf,
    Undead,
    Random,
    /// Custom games, or a flag the game never writes
    Unknown,
}

impl Race {
    /// Decode race flags; the `0x40` "selectable" bit is ignored.
    pub fn from_flags(flags: u32) -> Self {
        match flags & 0x3F {
            0x01 => Race::Human,
            0x02 => Race::Orc,
            0x04 => Race::NightElf,
            0x08 => Race::Undead,
            0x20 => Race::Random,
            _ => Race::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Race::Human => "Human",
            Race::Orc => "Orc",
            Race::NightElf => "Night Elf",
            Race::Undead => "Undead",
            Race::Random => "Random",
            Race::Unknown => "Unknown",
        }
    }

    /// Lowercase form usable in element ids.
    pub fn slug(&self) -> &'static str {
        match self {
            Race::Human => "human",
            Race::Orc => "orc",
            Race::NightElf => "nightelf",
            Race::Undead => "undead",
            Race::Random => "random",
            Race::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Game Type
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GameType {
    /// `0x01` - Ladder 1on1 or FFA
    Ladder1v1,
    /// `0x09`
    Custom,
    /// `0x0D` - Single player or local game
    Local,
    /// `0x20` - Ladder team game
    LadderTeam,
    Unknown(u8),
}

impl GameType {
    pub fn from_id(id: u8) -> Self {
        match id {
            0x01 => GameType::Ladder1v1,
            0x09 => GameType::Custom,
            0x0D => GameType::Local,
            0x20 => GameType::LadderTeam,
            other => GameType::Unknown(other),
        }
    }

    pub fn label(&self) -> String {
        match self {
            GameType::Ladder1v1 => "Ladder 1on1".to_string(),
            GameType::Custom => "Custom".to_string(),
            GameType::Local => "Local".to_string(),
            GameType::LadderTeam => "Ladder team".to_string(),
            GameType::Unknown(id) => format!("Unknown ({:#04x})", id),
        }
    }
}

// =============================================================================
// Game Data
// =============================================================================

/// A player record from the startup block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub id: u8,
    pub name: String,
    pub is_host: bool,
    /// Only ladder records carry a race
    pub race: Race,
}

/// One lobby slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlotRecord {
    pub player_id: u8,
    /// 0 empty, 1 closed, 2 used
    pub status: u8,
    pub is_human: bool,
    /// 12 for observers
    pub team: u8,
    pub color: u8,
    pub race: Race,
    pub handicap: u8,
}

/// Team number given to observer slots.
pub const OBSERVER_TEAM: u8 = 12;

/// Game data decoded from the replay blocks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    pub game_name: String,
    /// Map path as stored, e.g. `Maps\FrozenThrone\(2)EchoIsles.w3x`
    pub map_path: String,
    pub creator: String,
    pub game_type: GameType,
    pub players: Vec<PlayerRecord>,
    pub slots: Vec<SlotRecord>,
    /// Player id of the winner, when the leave events tell
    pub winner: Option<u8>,
}

impl GameInfo {
    pub fn player_by_name(&self, name: &str) -> Option<&PlayerRecord> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn slot(&self, player_id: u8) -> Option<&SlotRecord> {
        self.slots.iter().find(|s| s.player_id == player_id)
    }

    /// Race of a player, falling back to the slot race for custom records.
    pub fn race_of(&self, player: &PlayerRecord) -> Race {
        match player.race {
            Race::Unknown => self.slot(player.id).map_or(Race::Unknown, |s| s.race),
            race => race,
        }
    }
}

/// A fully decoded replay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Replay {
    pub header: ReplayHeader,
    pub game: GameInfo,
}

// =============================================================================
// Upload Results
// =============================================================================

/// One replay seen from the named player's side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerGame {
    /// Short map name, e.g. `EchoIsles`
    pub map: String,
    pub race: Race,
    pub won: bool,
    /// Distinct races of the other team, sorted
    pub enemy_races: Vec<Race>,
    /// Names on the other team
    pub opponents: Vec<String>,
}

impl PlayerGame {
    /// Matchup key such as `Orc` or `Human, Undead`.
    pub fn enemy_label(&self) -> String {
        self.enemy_races
            .iter()
            .map(Race::label)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// One uploaded replay, decoded and dated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplaySummary {
    pub filename: String,
    /// From the client-side last-modified time
    pub recorded_at: DateTime<Utc>,
    pub header: ReplayHeader,
    pub game: PlayerGame,
}

/// A file left out of the statistics, and why.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SkippedReplay {
    pub filename: String,
    pub reason: String,
}

/// Aggregate over one player's uploaded replays.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub player_name: String,
    pub replay_count: usize,
    pub wins: usize,
    pub losses: usize,
    pub total_length_ms: u64,
    pub first_game: Option<DateTime<Utc>>,
    pub last_game: Option<DateTime<Utc>>,
}

impl PlayerSummary {
    /// Mean game length, zero when no replay was read.
    pub fn average_length_ms(&self) -> u64 {
        if self.replay_count == 0 {
            0
        } else {
            self.total_length_ms / self.replay_count as u64
        }
    }
}
