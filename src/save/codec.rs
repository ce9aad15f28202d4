//! Fixed-layout binary save codec.
//!
//! Integers are stored as decimal-digit pairs packed into bytes: each
//! byte's two nibbles are decimal digits 0-9, not true hexadecimal. The
//! score field goes further and stores one decimal digit per byte,
//! least-significant digit first. Both conventions come from the save
//! format this codec must stay byte-compatible with.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use chrono::Local;
use tracing::warn;

use crate::items::ItemId;
use crate::player::Player;
use crate::world::generation::DEFAULT_MAX_PLACEMENT_ATTEMPTS;
use crate::world::{Coord, GenerationError, WORLD_SIZE, WorldState, generate_world};

/// File identification bytes.
pub const MAGIC: [u8; 4] = [0x01, 0x4B, 0x55, 0x02];
/// Section separator byte.
pub const SEPARATOR: u8 = 0x5C;
/// Highest score the five-digit score field can hold.
pub const SCORE_MAX: u32 = 99_999;

const SEED_FIELD_LEN: usize = 20;
const NAME_FIELD_LEN: usize = 16;
const SCORE_FIELD_LEN: usize = 5;
const ACTIVE_FIELD_LEN: usize = 4;
const RECORD_LEN: usize = 3;
const POSITION_MAX: u8 = (WORLD_SIZE - 1) as u8;

const OFFSET_SEED: usize = 11;
const OFFSET_NAME: usize = 32;
const OFFSET_SCORE: usize = 50;

/// Errors from encoding, decoding, or the backing file I/O.
#[derive(Debug)]
pub enum SaveError {
    Io(io::Error),
    BadMagic { found: [u8; 4] },
    Truncated { field: &'static str, offset: usize },
    InvalidField {
        field: &'static str,
        offset: usize,
        detail: String,
    },
    Unencodable { field: &'static str, detail: String },
    Generation(GenerationError),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "I/O error: {}", e),
            SaveError::BadMagic { found } => {
                write!(f, "bad magic bytes {:02x?}: not a save file", found)
            }
            SaveError::Truncated { field, offset } => {
                write!(f, "save data ends before {} at offset {}", field, offset)
            }
            SaveError::InvalidField {
                field,
                offset,
                detail,
            } => {
                write!(f, "invalid {} at offset {}: {}", field, offset, detail)
            }
            SaveError::Unencodable { field, detail } => {
                write!(f, "cannot encode {}: {}", field, detail)
            }
            SaveError::Generation(e) => {
                write!(f, "cannot rebuild world from save: {}", e)
            }
        }
    }
}

impl std::error::Error for SaveError {}

impl From<io::Error> for SaveError {
    fn from(e: io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<GenerationError> for SaveError {
    fn from(e: GenerationError) -> Self {
        SaveError::Generation(e)
    }
}

/// Everything a save file holds, in decoded form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveData {
    /// `YYYYMMDDHHMMSS` digits from the header.
    pub timestamp: String,
    pub seed: String,
    pub player_name: String,
    pub region: Coord,
    pub score: u32,
    pub tier: u8,
    pub can_swim: bool,
    /// Equipped usable items, slot order preserved.
    pub active_items: Vec<ItemId>,
    /// Items still on the map and where they sit.
    pub placements: Vec<(ItemId, Coord)>,
}

// --- Field packing helpers ---

/// Pack a value below 100 into one byte of two decimal-digit nibbles.
fn pack_pair(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

/// Unpack a decimal-digit pair byte; `None` if either nibble is not a
/// decimal digit (so `0xFF` is invalid rather than 255).
fn unpack_pair(byte: u8) -> Option<u8> {
    let hi = byte >> 4;
    let lo = byte & 0x0F;
    if hi > 9 || lo > 9 {
        return None;
    }
    Some(hi * 10 + lo)
}

/// ASCII characters into a zero-padded fixed-width field.
fn pack_ascii_field(s: &str, width: usize) -> Vec<u8> {
    let mut field = s.as_bytes().to_vec();
    field.resize(width, 0);
    field
}

fn trim_zero_padding(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|&b| b != 0)
        .map(|i| i + 1)
        .unwrap_or(0);
    &bytes[..end]
}

fn is_printable_ascii(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| (0x20..0x7f).contains(&b))
}

// --- Encode ---

/// Encode player and world state into the fixed byte layout.
///
/// Pure: no I/O. `timestamp` must be the 14 digits of `YYYYMMDDHHMMSS`;
/// [`save_to_path`] supplies the current wall-clock time.
pub fn encode(
    player: &Player,
    world: &WorldState,
    timestamp: &str,
) -> Result<Vec<u8>, SaveError> {
    if timestamp.len() != 14 || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SaveError::Unencodable {
            field: "timestamp",
            detail: format!("expected 14 decimal digits, got {:?}", timestamp),
        });
    }
    let seed = world.seed();
    if seed.len() > SEED_FIELD_LEN || !is_printable_ascii(seed.as_bytes()) {
        return Err(SaveError::Unencodable {
            field: "seed",
            detail: format!("not a printable seed of at most 20 characters: {:?}", seed),
        });
    }
    if player.region.row > POSITION_MAX as usize || player.region.col > POSITION_MAX as usize {
        return Err(SaveError::Unencodable {
            field: "region",
            detail: format!(
                "({}, {}) outside the {}x{} grid",
                player.region.row, player.region.col, WORLD_SIZE, WORLD_SIZE
            ),
        });
    }
    if player.score() > SCORE_MAX {
        return Err(SaveError::Unencodable {
            field: "score",
            detail: format!("{} exceeds the five-digit maximum {}", player.score(), SCORE_MAX),
        });
    }

    let mut out = Vec::with_capacity(64 + RECORD_LEN * ItemId::ALL.len());
    out.extend_from_slice(&MAGIC);

    for pair in timestamp.as_bytes().chunks(2) {
        out.push(((pair[0] - b'0') << 4) | (pair[1] - b'0'));
    }

    out.extend_from_slice(&pack_ascii_field(seed, SEED_FIELD_LEN));
    out.push(SEPARATOR);

    out.extend_from_slice(&pack_ascii_field(player.name(), NAME_FIELD_LEN));
    out.push(pack_pair(player.region.row as u8));
    out.push(pack_pair(player.region.col as u8));

    // One decimal digit per byte, least-significant first.
    let mut score = player.score();
    for _ in 0..SCORE_FIELD_LEN {
        out.push((score % 10) as u8);
        score /= 10;
    }

    out.push(pack_pair(player.tier()));
    out.push(SEPARATOR);

    out.push(if player.can_swim { 0xFF } else { 0x00 });
    out.push(SEPARATOR);

    let mut active = [0u8; ACTIVE_FIELD_LEN];
    for (slot, item) in player
        .inventory
        .active()
        .iter()
        .take(ACTIVE_FIELD_LEN)
        .enumerate()
    {
        active[slot] = item.key();
    }
    out.extend_from_slice(&active);
    out.push(SEPARATOR);

    for (item, coord) in world.item_placements().placed() {
        out.push(pack_pair(coord.row as u8));
        out.push(pack_pair(coord.col as u8));
        out.push(item.key());
    }

    Ok(out)
}

// --- Decode ---

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    fn take(&mut self, len: usize, field: &'static str) -> Result<&'a [u8], SaveError> {
        if self.remaining() < len {
            return Err(SaveError::Truncated {
                field,
                offset: self.offset,
            });
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn take_byte(&mut self, field: &'static str) -> Result<u8, SaveError> {
        Ok(self.take(1, field)?[0])
    }

    fn expect_separator(&mut self) -> Result<(), SaveError> {
        let offset = self.offset;
        let byte = self.take_byte("separator")?;
        if byte != SEPARATOR {
            return Err(SaveError::InvalidField {
                field: "separator",
                offset,
                detail: format!("expected {:#04x}, got {:#04x}", SEPARATOR, byte),
            });
        }
        Ok(())
    }

    /// A bounds-checked grid position stored as a decimal-digit pair.
    fn take_position(&mut self, field: &'static str) -> Result<u8, SaveError> {
        let offset = self.offset;
        let byte = self.take_byte(field)?;
        let value = unpack_pair(byte).ok_or_else(|| SaveError::InvalidField {
            field,
            offset,
            detail: format!("byte {:#04x} is not a decimal digit pair", byte),
        })?;
        if value > POSITION_MAX {
            return Err(SaveError::InvalidField {
                field,
                offset,
                detail: format!("{} is outside 0-{}", value, POSITION_MAX),
            });
        }
        Ok(value)
    }

    /// A fixed-width, zero-padded printable-ASCII string field.
    fn take_string(
        &mut self,
        len: usize,
        field: &'static str,
    ) -> Result<String, SaveError> {
        let offset = self.offset;
        let raw = self.take(len, field)?;
        let trimmed = trim_zero_padding(raw);
        if !is_printable_ascii(trimmed) {
            return Err(SaveError::InvalidField {
                field,
                offset,
                detail: "not printable ASCII".to_string(),
            });
        }
        Ok(String::from_utf8_lossy(trimmed).into_owned())
    }
}

/// Decode a save byte stream, validating field by field in order and
/// failing fast at the first invalid field.
///
/// Positions, score digits, tier and the swim flag are strict; unknown
/// item keys are ignored without error. That asymmetry is part of the
/// format.
pub fn decode(bytes: &[u8]) -> Result<SaveData, SaveError> {
    let mut r = Reader::new(bytes);

    let magic = r.take(MAGIC.len(), "magic")?;
    if magic != MAGIC {
        let mut found = [0u8; 4];
        found.copy_from_slice(magic);
        return Err(SaveError::BadMagic { found });
    }

    let timestamp: String = r
        .take(7, "timestamp")?
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect();

    let seed = r.take_string(SEED_FIELD_LEN, "seed")?;
    if seed.len() < crate::rng::SEED_MIN_LEN {
        // A too-short seed would be regenerated on load and silently
        // produce a different world than the one saved.
        return Err(SaveError::InvalidField {
            field: "seed",
            offset: OFFSET_SEED,
            detail: format!("{:?} is shorter than {} characters", seed, crate::rng::SEED_MIN_LEN),
        });
    }
    r.expect_separator()?;

    let player_name = r.take_string(NAME_FIELD_LEN, "player name")?;
    if player_name.is_empty() {
        return Err(SaveError::InvalidField {
            field: "player name",
            offset: OFFSET_NAME,
            detail: "empty name".to_string(),
        });
    }

    let row = r.take_position("region row")?;
    let col = r.take_position("region col")?;
    let region = Coord {
        row: row as usize,
        col: col as usize,
    };

    let mut score: u32 = 0;
    let score_bytes = r.take(SCORE_FIELD_LEN, "score")?;
    for (i, &byte) in score_bytes.iter().enumerate() {
        if byte >> 4 != 0 {
            return Err(SaveError::InvalidField {
                field: "score",
                offset: OFFSET_SCORE + i,
                detail: "unknown score index".to_string(),
            });
        }
        let digit = byte & 0x0F;
        if digit > 9 {
            return Err(SaveError::InvalidField {
                field: "score",
                offset: OFFSET_SCORE + i,
                detail: format!("nibble {:#x} is not a decimal digit", digit),
            });
        }
        score += u32::from(digit) * 10u32.pow(i as u32);
    }

    let tier_offset = r.offset;
    let tier_byte = r.take_byte("tier")?;
    let tier = unpack_pair(tier_byte).ok_or_else(|| SaveError::InvalidField {
        field: "tier",
        offset: tier_offset,
        detail: format!("byte {:#04x} is not a decimal digit pair", tier_byte),
    })?;
    if tier > 3 {
        return Err(SaveError::InvalidField {
            field: "tier",
            offset: tier_offset,
            detail: format!("{} is outside 0-3", tier),
        });
    }
    r.expect_separator()?;

    let swim_offset = r.offset;
    let can_swim = match r.take_byte("swim flag")? {
        0xFF => true,
        0x00 => false,
        other => {
            return Err(SaveError::InvalidField {
                field: "swim flag",
                offset: swim_offset,
                detail: format!("byte {:#04x} is neither 0x00 nor 0xff", other),
            });
        }
    };
    r.expect_separator()?;

    let mut active_items = Vec::new();
    for &key in r.take(ACTIVE_FIELD_LEN, "active item keys")? {
        if key == 0 {
            continue;
        }
        match ItemId::from_key(key) {
            Some(item) if !item.is_special() => active_items.push(item),
            Some(item) => {
                warn!(key, item = item.name(), "special item key in active slots, ignoring");
            }
            None => {
                warn!(key, "unknown active item key, ignoring");
            }
        }
    }
    r.expect_separator()?;

    // Trailing records run until the stream ends; a short or malformed
    // record terminates the list rather than failing the whole load.
    let mut placements = Vec::new();
    loop {
        if r.remaining() == 0 {
            break;
        }
        if r.remaining() < RECORD_LEN {
            warn!(bytes = r.remaining(), "short trailing item record, ignoring");
            break;
        }
        let record = r.take(RECORD_LEN, "item record")?;
        let row = unpack_pair(record[0]).filter(|&v| v <= POSITION_MAX);
        let col = unpack_pair(record[1]).filter(|&v| v <= POSITION_MAX);
        let (Some(row), Some(col)) = (row, col) else {
            warn!("malformed item record position, ignoring the rest");
            break;
        };
        match ItemId::from_key(record[2]) {
            Some(item) => placements.push((
                item,
                Coord {
                    row: row as usize,
                    col: col as usize,
                },
            )),
            None => warn!(key = record[2], "unknown item key in record, ignoring"),
        }
    }

    Ok(SaveData {
        timestamp,
        seed,
        player_name,
        region,
        score,
        tier,
        can_swim,
        active_items,
        placements,
    })
}

/// Rebuild the live player and world from decoded save data.
///
/// The world is regenerated from the stored seed, then its placements
/// are replaced with the stored records. When the swim flag is set, the
/// raft is granted to the player directly: the traversal item is never
/// stored in the active-item bytes, only inferred from the flag.
pub fn restore(data: &SaveData) -> Result<(Player, WorldState), SaveError> {
    let mut world = generate_world(Some(&data.seed), DEFAULT_MAX_PLACEMENT_ATTEMPTS)?;
    world.apply_placements(&data.placements);

    let mut player = Player::from_save(
        &data.player_name,
        data.region,
        data.score,
        data.tier,
        data.can_swim,
        &data.active_items,
    )
    .map_err(|detail| SaveError::InvalidField {
        field: "player name",
        offset: OFFSET_NAME,
        detail,
    })?;
    if data.can_swim {
        player.inventory.add(ItemId::Raft);
    }

    Ok((player, world))
}

/// Write a save file, stamped with the current local time.
///
/// The bytes go to a temporary file first and are renamed into place, so
/// a failed write never leaves a partial save behind.
pub fn save_to_path(
    path: &Path,
    player: &Player,
    world: &WorldState,
) -> Result<(), SaveError> {
    let timestamp = Local::now().format("%Y%m%d%H%M%S").to_string();
    let encoded = encode(player, world, &timestamp)?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("game.save");
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    if let Err(e) = fs::write(&tmp, &encoded) {
        let _ = fs::remove_file(&tmp);
        return Err(SaveError::Io(e));
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(SaveError::Io(e));
    }
    Ok(())
}

/// Read and decode a save file, rebuilding the player and world.
pub fn load_from_path(path: &Path) -> Result<(Player, WorldState), SaveError> {
    let bytes = fs::read(path)?;
    let data = decode(&bytes)?;
    restore(&data)
}
