//! Predefined per-entry attributes.
//!
//! Entries carry a free-form string map; two keys have meaning to indexers
//! and the extractor:
//!
//! - `atype` -- `file` or `symlink`; symlink assets hold the link target
//! - `amode` -- permission bits as a 4-digit octal string, e.g. `0644`

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{TreeError, TreeResult};

pub const ASSET_TYPE: &str = "atype";
pub const ASSET_MODE: &str = "amode";

pub const ASSET_MODE_MASK: u32 = 0o777;
pub const DEFAULT_ASSET_MODE: u32 = 0o644;

/// Kind of filesystem object an entry materializes as.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AssetKind {
    #[default]
    File,
    Symlink,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Symlink => "symlink",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "file" => Some(Self::File),
            "symlink" => Some(Self::Symlink),
            _ => None,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed view of the predefined attributes of one entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryAttributes {
    pub kind: AssetKind,
    pub mode: u32,
}

impl Default for EntryAttributes {
    fn default() -> Self {
        Self {
            kind: AssetKind::File,
            mode: DEFAULT_ASSET_MODE,
        }
    }
}

impl EntryAttributes {
    pub fn file(mode: u32) -> Self {
        Self {
            kind: AssetKind::File,
            mode: mode & ASSET_MODE_MASK,
        }
    }

    pub fn symlink() -> Self {
        Self {
            kind: AssetKind::Symlink,
            mode: 0o777,
        }
    }

    /// Read the predefined keys from an attribute map. Missing keys take
    /// their defaults; unknown values are errors.
    pub fn from_map(path: &str, attrs: &BTreeMap<String, String>) -> TreeResult<Self> {
        let invalid = |name: &str, value: &str| TreeError::InvalidAttribute {
            path: path.to_string(),
            name: name.to_string(),
            value: value.to_string(),
        };

        let kind = match attrs.get(ASSET_TYPE) {
            Some(value) => AssetKind::parse(value).ok_or_else(|| invalid(ASSET_TYPE, value))?,
            None => AssetKind::File,
        };
        let mode = match attrs.get(ASSET_MODE) {
            Some(value) => parse_mode(value).ok_or_else(|| invalid(ASSET_MODE, value))?,
            None => DEFAULT_ASSET_MODE,
        };
        Ok(Self { kind, mode })
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (ASSET_TYPE.to_string(), self.kind.as_str().to_string()),
            (ASSET_MODE.to_string(), format_mode(self.mode)),
        ])
    }
}

pub fn format_mode(mode: u32) -> String {
    format!("{:04o}", mode & ASSET_MODE_MASK)
}

pub fn parse_mode(s: &str) -> Option<u32> {
    u32::from_str_radix(s, 8)
        .ok()
        .map(|mode| mode & ASSET_MODE_MASK)
}
