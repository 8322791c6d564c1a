//! Warcraft III replay (`.w3g`) decoding.
//!
//! ```text
//! bytes ──▶ parse_header() ──▶ blocks::decompress_blocks() ──▶ game::parse_game() ──▶ Replay
//!           (fixed header)     (zlib blocks)                   (players, slots, winner)
//! ```
//!
//! Player actions are not decoded, so nothing here depends on the game
//! build beyond the header.
//!
//! # Header layout (little-endian)
//!
//! ```text
//! 0x00  28  "Warcraft III recorded game\x1A\0"
//! 0x1C   4  header size
//! 0x20   4  compressed file size
//! 0x24   4  header version (0 or 1)
//! 0x28   4  decompressed size
//! 0x2C   4  block count
//! 0x30      v0: 2 unused, 2 version | v1: 4 product id (reversed), 4 version
//!        2  build number
//!        2  flags (0x0000 single player, 0x8000 multiplayer)
//!        4  replay length (ms)
//!        4  header checksum
//! ```

pub mod blocks;
pub mod game;

use std::path::Path;

use crate::error::{ReplayError, ReplayResult};
use crate::models::{GameMode, Product, Replay, ReplayHeader};

pub use blocks::decompress_blocks;
pub use game::{map_name, parse_game};

/// Magic string every replay starts with.
pub const MAGIC: &[u8; 28] = b"Warcraft III recorded game\x1A\0";

/// Offset of the version-dependent subheader.
const SUBHEADER_OFFSET: usize = 0x30;

/// Header length for header version 0.
pub const HEADER_V0_LEN: usize = 0x40;

/// Header length for header version 1.
pub const HEADER_V1_LEN: usize = 0x44;

fn le_u16(b: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([b[at], b[at + 1]])
}

fn le_u32(b: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

fn ensure_len(bytes: &[u8], needed: usize) -> ReplayResult<()> {
    if bytes.len() < needed {
        return Err(ReplayError::Truncated { needed, got: bytes.len() });
    }
    Ok(())
}

/// Decode the header at the start of `bytes`.
pub fn parse_header(bytes: &[u8]) -> ReplayResult<ReplayHeader> {
    if bytes.len() < MAGIC.len() || &bytes[..MAGIC.len()] != MAGIC {
        return Err(ReplayError::BadMagic);
    }
    ensure_len(bytes, SUBHEADER_OFFSET)?;

    let header_size = le_u32(bytes, 0x1C);
    let compressed_size = le_u32(bytes, 0x20);
    let header_version = le_u32(bytes, 0x24);
    let decompressed_size = le_u32(bytes, 0x28);
    let block_count = le_u32(bytes, 0x2C);

    let (product, version, rest) = match header_version {
        0 => {
            ensure_len(bytes, HEADER_V0_LEN)?;
            let version = le_u16(bytes, SUBHEADER_OFFSET + 2) as u32;
            (Product::ReignOfChaos, version, SUBHEADER_OFFSET + 4)
        }
        1 => {
            ensure_len(bytes, HEADER_V1_LEN)?;
            let mut id = [0u8; 4];
            id.copy_from_slice(&bytes[SUBHEADER_OFFSET..SUBHEADER_OFFSET + 4]);
            id.reverse();
            if !id.iter().all(u8::is_ascii_alphanumeric) {
                return Err(ReplayError::InvalidProduct(id));
            }
            // ASCII checked above
            let id = String::from_utf8_lossy(&id);
            let version = le_u32(bytes, SUBHEADER_OFFSET + 4);
            (Product::from_id(&id), version, SUBHEADER_OFFSET + 8)
        }
        other => return Err(ReplayError::UnsupportedVersion(other)),
    };

    Ok(ReplayHeader {
        header_size,
        compressed_size,
        header_version,
        decompressed_size,
        block_count,
        product,
        version,
        build: le_u16(bytes, rest),
        mode: GameMode::from_flags(le_u16(bytes, rest + 2)),
        length_ms: le_u32(bytes, rest + 4),
        checksum: le_u32(bytes, rest + 8),
    })
}

/// Decode a whole replay: header, then game data.
pub fn parse_replay(bytes: &[u8]) -> ReplayResult<Replay> {
    let header = parse_header(bytes)?;
    let data = decompress_blocks(bytes, &header)?;
    let game = parse_game(&data)?;
    Ok(Replay { header, game })
}

/// Decode a replay on disk.
pub fn read_replay_file(path: &Path) -> ReplayResult<Replay> {
    let bytes = std::fs::read(path)?;
    parse_replay(&bytes)
}

/// Format a game length as `HH:MM:SS`.
///
/// Hours wrap at 24.
pub fn format_length(ms: u64) -> String {
    let secs = ms / 1000;
    format!(
        "{:02}:{:02}:{:02}",
        (secs / 3600) % 24,
        (secs / 60) % 60,
        secs % 60
    )
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use flate2::{write::ZlibEncoder, Compression};
    use std::io::Write;

    /// Build a header as the game writes it.
    pub fn header_bytes(header_version: u32, product: &[u8; 4], version: u32, flags: u16, length_ms: u32) -> Vec<u8> {
        let mut b = MAGIC.to_vec();
        let header_len = if header_version == 0 { HEADER_V0_LEN } else { HEADER_V1_LEN };
        b.extend_from_slice(&(header_len as u32).to_le_bytes());
        b.extend_from_slice(&4096u32.to_le_bytes());
        b.extend_from_slice(&header_version.to_le_bytes());
        b.extend_from_slice(&16384u32.to_le_bytes());
        b.extend_from_slice(&3u32.to_le_bytes());
        if header_version == 0 {
            b.extend_from_slice(&0u16.to_le_bytes());
            b.extend_from_slice(&(version as u16).to_le_bytes());
        } else {
            let mut id = *product;
            id.reverse();
            b.extend_from_slice(&id);
            b.extend_from_slice(&version.to_le_bytes());
        }
        b.extend_from_slice(&6059u16.to_le_bytes());
        b.extend_from_slice(&flags.to_le_bytes());
        b.extend_from_slice(&length_ms.to_le_bytes());
        b.extend_from_slice(&0xDEADBEEFu32.to_le_bytes());
        b
    }

    /// A Frozen Throne 1.26 multiplayer replay header.
    pub fn tft_replay(length_ms: u32) -> Vec<u8> {
        header_bytes(1, b"W3XP", 26, 0x8000, length_ms)
    }

    pub fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    /// One data block holding `data`.
    pub fn block_bytes(data: &[u8]) -> Vec<u8> {
        let payload = zlib(data);
        let mut b = Vec::new();
        b.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        b.extend_from_slice(&(data.len() as u16).to_le_bytes());
        b.extend_from_slice(&[0; 4]);
        b.extend_from_slice(&payload);
        b
    }

    /// Inverse of `game::decode_settings`: odd bytes are stored as is and
    /// flagged in the mask, even bytes are stored plus one.
    pub fn encode_settings(raw: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        for chunk in raw.chunks(7) {
            let mut mask = 0x01u8;
            let mut bytes = Vec::new();
            for (i, &b) in chunk.iter().enumerate() {
                if b % 2 == 0 {
                    bytes.push(b + 1);
                } else {
                    mask |= 1 << (i + 1);
                    bytes.push(b);
                }
            }
            out.push(mask);
            out.extend_from_slice(&bytes);
        }
        out
    }

    pub const HUMAN: u32 = 0x01;
    pub const ORC: u32 = 0x02;
    pub const NIGHT_ELF: u32 = 0x04;
    pub const UNDEAD: u32 = 0x08;

    struct Seat {
        id: u8,
        name: String,
        /// `None` for custom records
        race: Option<u32>,
        team: u8,
    }

    enum Event {
        Chat(u8, String),
        Leave(u8, u32, u32),
    }

    /// Builder for the game data of a ladder replay.
    pub struct LadderGame {
        seats: Vec<Seat>,
        events: Vec<Event>,
        map_path: String,
        game_type: u8,
        length_ms: u32,
    }

    impl LadderGame {
        /// `host` (player 1, Night Elf) against `opponent` (player 2, Orc)
        /// on Echo Isles.
        pub fn new(host: &str, opponent: &str) -> Self {
            Self {
                seats: vec![
                    Seat { id: 1, name: host.into(), race: Some(NIGHT_ELF), team: 0 },
                    Seat { id: 2, name: opponent.into(), race: Some(ORC), team: 1 },
                ],
                events: Vec::new(),
                map_path: "Maps\\FrozenThrone\\(2)EchoIsles.w3x".into(),
                game_type: 0x01,
                length_ms: 754_000,
            }
        }

        pub fn races(mut self, host: u32, opponent: u32) -> Self {
            self.seats[0].race = Some(host);
            self.seats[1].race = Some(opponent);
            self
        }

        pub fn map(mut self, path: &str) -> Self {
            self.map_path = path.into();
            self
        }

        pub fn game_type(mut self, id: u8) -> Self {
            self.game_type = id;
            self
        }

        pub fn length(mut self, ms: u32) -> Self {
            self.length_ms = ms;
            self
        }

        pub fn with_observer(mut self, id: u8, name: &str) -> Self {
            self.seats.push(Seat { id, name: name.into(), race: None, team: 12 });
            self
        }

        pub fn with_chat(mut self, player_id: u8, message: &str) -> Self {
            self.events.push(Event::Chat(player_id, message.into()));
            self
        }

        pub fn with_leave(mut self, player_id: u8, reason: u32, result: u32) -> Self {
            self.events.push(Event::Leave(player_id, reason, result));
            self
        }

        /// The loser is defeated, then the winner quits on the score screen.
        pub fn won_by(self, player_id: u8) -> Self {
            let loser = if player_id == 1 { 2 } else { 1 };
            self.with_leave(loser, 0x01, 0x08).with_leave(player_id, 0x0C, 0x09)
        }

        fn player_record(b: &mut Vec<u8>, record: u8, seat: &Seat) {
            b.push(record);
            b.push(seat.id);
            b.extend_from_slice(seat.name.as_bytes());
            b.push(0);
            match seat.race {
                Some(race) => {
                    b.push(0x08);
                    b.extend_from_slice(&1_000u32.to_le_bytes());
                    b.extend_from_slice(&race.to_le_bytes());
                }
                None => b.extend_from_slice(&[0x01, 0x00]),
            }
        }

        /// Decompressed game data, without the trailing padding.
        pub fn game_data(&self) -> Vec<u8> {
            let mut b = vec![0; 4];
            Self::player_record(&mut b, 0x00, &self.seats[0]);
            b.extend_from_slice(b"BNet\0\0");

            let mut settings = vec![0x02, 0x48, 0x06, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
            settings.extend_from_slice(self.map_path.as_bytes());
            settings.push(0);
            settings.extend_from_slice(b"Battle.net\0");
            b.extend_from_slice(&encode_settings(&settings));
            b.push(0);

            b.extend_from_slice(&(self.seats.len() as u32).to_le_bytes());
            b.push(self.game_type);
            b.push(0x00);
            b.extend_from_slice(&[0; 2]);
            b.extend_from_slice(&[0x18, 0, 0, 0]);
            for seat in &self.seats[1..] {
                Self::player_record(&mut b, 0x16, seat);
                b.extend_from_slice(&[0; 4]);
            }

            b.push(0x19);
            b.extend_from_slice(&(7 + 9 * self.seats.len() as u16).to_le_bytes());
            b.push(self.seats.len() as u8);
            for (color, seat) in self.seats.iter().enumerate() {
                let race = seat.race.unwrap_or(0x20) as u8 | 0x40;
                b.extend_from_slice(&[seat.id, 100, 2, 0, seat.team, color as u8, race, 1, 100]);
            }
            b.extend_from_slice(&[0xAA; 4]);
            b.extend_from_slice(&[0x00, 0x02]);

            // one empty time slot
            b.push(0x1F);
            b.extend_from_slice(&2u16.to_le_bytes());
            b.extend_from_slice(&250u16.to_le_bytes());

            let mut counter = 7u32;
            for event in &self.events {
                match event {
                    Event::Chat(player_id, message) => {
                        b.push(0x20);
                        b.push(*player_id);
                        b.extend_from_slice(&(message.len() as u16 + 6).to_le_bytes());
                        b.push(0x20);
                        b.extend_from_slice(&0u32.to_le_bytes());
                        b.extend_from_slice(message.as_bytes());
                        b.push(0);
                    }
                    Event::Leave(player_id, reason, result) => {
                        b.push(0x17);
                        b.extend_from_slice(&reason.to_le_bytes());
                        b.push(*player_id);
                        b.extend_from_slice(&result.to_le_bytes());
                        b.extend_from_slice(&counter.to_le_bytes());
                        counter += 1;
                    }
                }
            }
            b
        }

        /// A complete `.w3g` file, game data split over several blocks.
        pub fn replay_bytes(&self) -> Vec<u8> {
            let data = self.game_data();
            let blocks: Vec<Vec<u8>> = data.chunks(64).map(block_bytes).collect();

            let mut b = header_bytes(1, b"W3XP", 26, 0x8000, self.length_ms);
            b[0x2C..0x30].copy_from_slice(&(blocks.len() as u32).to_le_bytes());
            for block in blocks {
                b.extend_from_slice(&block);
            }
            b
        }
    }

    /// A ladder game between "Moon" (Night Elf) and "Grubby" (Orc).
    pub fn ladder_replay(moon_wins: bool, length_ms: u32) -> Vec<u8> {
        LadderGame::new("Moon", "Grubby")
            .won_by(if moon_wins { 1 } else { 2 })
            .length(length_ms)
            .replay_bytes()
    }
}
