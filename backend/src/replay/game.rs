//! Decompressed game data: startup records and leave/chat events.
//!
//! # Startup
//!
//! ```text
//! 4      unknown
//! var    host player record
//! cstr   game name, then one extra nul
//! var    encoded settings string: 13 setting bytes, map path, creator
//! 4      player count
//! 1      game type
//! 1      private flag
//! 2      unknown
//! 4      language id
//! var    0x16 player records, each followed by 4 unknown bytes
//! var    0x19 slot table
//! 4      random seed
//! 1      select mode
//! 1      start spot count
//! ```
//!
//! Events follow until a zero byte or the end of the data. Player actions
//! inside time slots are skipped whole.

use crate::error::{ReplayError, ReplayResult};
use crate::models::{GameInfo, GameType, PlayerRecord, Race, SlotRecord, OBSERVER_TEAM};

const HOST_RECORD: u8 = 0x00;
const PLAYER_RECORD: u8 = 0x16;
const SLOT_TABLE: u8 = 0x19;

const LEAVE_GAME: u8 = 0x17;
const TIME_SLOT_OLD: u8 = 0x1E;
const TIME_SLOT: u8 = 0x1F;
const CHAT: u8 = 0x20;

/// Chat flag for lobby messages, which carry no mode field.
const CHAT_STARTUP: u8 = 0x10;

/// Leave reasons.
const CLOSED_REMOTE: u32 = 0x01;
const CLOSED_LOCAL: u32 = 0x0C;

// =============================================================================
// Cursor
// =============================================================================

/// Bounds-checked little-endian cursor over game data.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn malformed(&self, message: impl Into<String>) -> ReplayError {
        ReplayError::Malformed { offset: self.pos, message: message.into() }
    }

    fn take(&mut self, n: usize) -> ReplayResult<&'a [u8]> {
        let bytes = self
            .data
            .get(self.pos..self.pos + n)
            .ok_or_else(|| self.malformed(format!("{} byte(s) past the end", n)))?;
        self.pos += n;
        Ok(bytes)
    }

    fn skip(&mut self, n: usize) -> ReplayResult<()> {
        self.take(n).map(|_| ())
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn u8(&mut self) -> ReplayResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> ReplayResult<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> ReplayResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Raw bytes up to the next nul, which is consumed.
    fn cbytes(&mut self) -> ReplayResult<&'a [u8]> {
        let rest = &self.data[self.pos..];
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| self.malformed("unterminated string"))?;
        self.pos += len + 1;
        Ok(&rest[..len])
    }

    fn cstr(&mut self) -> ReplayResult<String> {
        Ok(String::from_utf8_lossy(self.cbytes()?).into_owned())
    }
}

/// Undo the settings string encoding: every eighth byte is a mask whose
/// clear bits mark the following bytes as incremented by one.
pub fn decode_settings(encoded: &[u8]) -> Vec<u8> {
    let mut decoded = Vec::with_capacity(encoded.len());
    let mut mask = 0u8;
    for (pos, &byte) in encoded.iter().enumerate() {
        if pos % 8 == 0 {
            mask = byte;
        } else if mask & (1 << (pos % 8)) == 0 {
            decoded.push(byte.wrapping_sub(1));
        } else {
            decoded.push(byte);
        }
    }
    decoded
}

// =============================================================================
// Events
// =============================================================================

/// How a player left, as far as the leave event tells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveResult {
    Won,
    Lost,
    Draw,
    Disconnected,
    Left,
}

#[derive(Debug, Clone, PartialEq)]
struct Leave {
    player_id: u8,
    reason: u32,
    result: u32,
    /// Counter increased by one from the previous leave
    incremented: bool,
}

impl Leave {
    fn outcome(&self, is_last: bool) -> LeaveResult {
        match (self.reason, is_last, self.result) {
            (CLOSED_REMOTE, _, 0x08) => LeaveResult::Lost,
            (CLOSED_REMOTE, _, 0x09) => LeaveResult::Won,
            (CLOSED_REMOTE, _, 0x0A) => LeaveResult::Draw,
            (CLOSED_LOCAL, true, 0x07 | 0x0B) if self.incremented => LeaveResult::Won,
            (CLOSED_LOCAL, true, 0x07 | 0x0B) => LeaveResult::Lost,
            (CLOSED_LOCAL, _, 0x01) => LeaveResult::Disconnected,
            (CLOSED_LOCAL, _, 0x07 | 0x08 | 0x0B) => LeaveResult::Lost,
            (CLOSED_LOCAL, _, 0x09) => LeaveResult::Won,
            (CLOSED_LOCAL, false, 0x0A) => LeaveResult::Draw,
            _ => LeaveResult::Left,
        }
    }
}

#[derive(Debug, Default)]
struct Events {
    leaves: Vec<Leave>,
    /// (player id, message)
    chat: Vec<(u8, String)>,
}

fn read_leave(r: &mut Reader<'_>, last_counter: &mut Option<u32>) -> ReplayResult<Leave> {
    let reason = r.u32()?;
    let player_id = r.u8()?;
    let result = r.u32()?;
    let counter = r.u32()?;
    let incremented = last_counter.is_some_and(|last| counter == last.wrapping_add(1));
    *last_counter = Some(counter);
    Ok(Leave { player_id, reason, result, incremented })
}

fn read_chat(r: &mut Reader<'_>) -> ReplayResult<(u8, String)> {
    let player_id = r.u8()?;
    let len = r.u16()? as usize;
    let mut body = Reader::new(r.take(len)?);
    if body.u8()? != CHAT_STARTUP {
        body.skip(4)?;
    }
    Ok((player_id, body.cstr()?))
}

fn read_events(r: &mut Reader<'_>) -> ReplayResult<Events> {
    let mut events = Events::default();
    let mut last_counter = None;

    while let Some(id) = r.peek() {
        if id == 0 {
            break;
        }
        r.skip(1)?;
        match id {
            LEAVE_GAME => events.leaves.push(read_leave(r, &mut last_counter)?),
            0x1A..=0x1C => r.skip(4)?,
            TIME_SLOT_OLD | TIME_SLOT => {
                let len = r.u16()? as usize;
                r.skip(len)?;
            }
            CHAT => events.chat.push(read_chat(r)?),
            0x22 => r.skip(5)?,
            0x23 => r.skip(10)?,
            0x2F => r.skip(8)?,
            other => {
                r.pos -= 1;
                return Err(r.malformed(format!("unknown block id {:#04x}", other)));
            }
        }
    }

    Ok(events)
}

// =============================================================================
// Startup
// =============================================================================

fn read_player(r: &mut Reader<'_>) -> ReplayResult<PlayerRecord> {
    let record = r.u8()?;
    let id = r.u8()?;
    let name = r.cstr()?;
    let race = match r.u8()? {
        0x01 => {
            r.skip(1)?;
            Race::Unknown
        }
        0x08 => {
            r.skip(4)?;
            Race::from_flags(r.u32()?)
        }
        other => return Err(r.malformed(format!("player record kind {:#04x}", other))),
    };
    Ok(PlayerRecord { id, name, is_host: record == HOST_RECORD, race })
}

fn read_slots(r: &mut Reader<'_>) -> ReplayResult<Vec<SlotRecord>> {
    if r.u8()? != SLOT_TABLE {
        return Err(r.malformed("expected slot table"));
    }
    let size = r.u16()? as usize;
    let count = r.u8()? as usize;
    if count == 0 {
        return Err(r.malformed("empty slot table"));
    }
    let record_len = size.saturating_sub(7) / count;
    if !(7..=9).contains(&record_len) {
        return Err(r.malformed(format!("slot record size {}", record_len)));
    }

    let mut slots = Vec::with_capacity(count);
    for _ in 0..count {
        let raw = r.take(record_len)?;
        slots.push(SlotRecord {
            player_id: raw[0],
            status: raw[2],
            is_human: raw[3] == 0,
            team: raw[4],
            color: raw[5],
            race: Race::from_flags(raw[6] as u32),
            handicap: raw.get(8).copied().unwrap_or(100),
        });
    }
    Ok(slots)
}

/// Decode the startup records and find the winner.
pub fn parse_game(data: &[u8]) -> ReplayResult<GameInfo> {
    let mut r = Reader::new(data);
    r.skip(4)?;

    let mut players = vec![read_player(&mut r)?];
    let game_name = r.cstr()?;
    r.skip(1)?;

    let settings = decode_settings(r.cbytes()?);
    let mut s = Reader::new(settings.get(13..).unwrap_or_default());
    let map_path = s.cstr()?;
    let creator = s.cstr().unwrap_or_default();

    r.skip(4)?;
    let game_type = GameType::from_id(r.u8()?);
    r.skip(1 + 2 + 4)?;

    while r.peek() == Some(PLAYER_RECORD) {
        players.push(read_player(&mut r)?);
        r.skip(4)?;
    }
    let slots = read_slots(&mut r)?;
    r.skip(4 + 1 + 1)?;

    let events = read_events(&mut r)?;
    let winner = find_winner(&events, &slots);

    Ok(GameInfo { game_name, map_path, creator, game_type, players, slots, winner })
}

/// Players who are not observers.
fn active_players(slots: &[SlotRecord]) -> Vec<u8> {
    slots
        .iter()
        .filter(|s| s.team < OBSERVER_TEAM && s.player_id > 0)
        .map(|s| s.player_id)
        .collect()
}

fn other_player(slots: &[SlotRecord], loser: u8) -> Option<u8> {
    active_players(slots).into_iter().find(|&pid| pid != loser)
}

/// The last decisive leave names the winner; failing that, a player who
/// said "g" or "gg" and left is taken as the loser.
fn find_winner(events: &Events, slots: &[SlotRecord]) -> Option<u8> {
    let count = events.leaves.len();
    for (i, leave) in events.leaves.iter().enumerate().rev() {
        match leave.outcome(i + 1 == count) {
            LeaveResult::Won => return Some(leave.player_id),
            LeaveResult::Lost => return other_player(slots, leave.player_id),
            _ => {}
        }
    }

    let active = active_players(slots);
    for (i, leave) in events.leaves.iter().enumerate().rev() {
        if !active.contains(&leave.player_id) || leave.outcome(i + 1 == count) != LeaveResult::Left {
            continue;
        }
        let conceded = events.chat.iter().any(|(pid, msg)| {
            *pid == leave.player_id && matches!(msg.to_lowercase().as_str(), "g" | "gg")
        });
        if conceded {
            return other_player(slots, leave.player_id);
        }
    }
    None
}

/// Short map name from its path: `Maps\FrozenThrone\(2)EchoIsles.w3x`
/// becomes `EchoIsles`.
pub fn map_name(path: &str) -> String {
    let start = path
        .rfind(')')
        .or_else(|| path.rfind(['\\', '/']))
        .map_or(0, |i| i + 1);
    let name = &path[start..];
    let end = name.find(['.', '-', '_']).unwrap_or(name.len());
    name[..end].to_string()
}
