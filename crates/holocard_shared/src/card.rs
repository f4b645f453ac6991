//! Card records handed to the viewer by the surrounding application.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rarity tier of a collectible card.
///
/// Ordered: every comparison (`rarity >= Rarity::Rare`) follows collectible value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Rarity {
    /// Common cards (white)
    Common = 0,
    /// Uncommon cards (green)
    Uncommon = 1,
    /// Rare cards (blue)
    Rare = 2,
    /// Epic cards (purple)
    Epic = 3,
    /// Legendary cards (gold)
    Legendary = 4,
    /// Mythic cards (teal)
    Mythic = 5,
}

impl Rarity {
    /// All tiers, lowest first.
    pub const ALL: [Self; 6] = [
        Self::Common,
        Self::Uncommon,
        Self::Rare,
        Self::Epic,
        Self::Legendary,
        Self::Mythic,
    ];

    /// Converts from the u8 representation used by card records.
    #[inline]
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Common,
            1 => Self::Uncommon,
            2 => Self::Rare,
            3 => Self::Epic,
            4 => Self::Legendary,
            _ => Self::Mythic,
        }
    }

    /// Rare and above get shader programs, particles and ambient motion.
    #[inline]
    #[must_use]
    pub const fn is_premium(self) -> bool {
        self as u8 >= Self::Rare as u8
    }

    /// Lowercase name, matching the serialized form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
            Self::Mythic => "mythic",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Rarity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown rarity: {s}"))
    }
}

/// Card identifier, opaque to the renderer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardId(pub String);

impl CardId {
    /// Creates a new card id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A card as supplied by the host application.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Identifier, used in logs.
    pub id: CardId,
    /// Display title, used as alt text on the static image.
    pub title: String,
    /// Card artwork. `None` renders the placeholder.
    pub image_url: Option<String>,
    /// Rarity tier.
    pub rarity: Rarity,
}

impl Card {
    /// Creates a card record.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        image_url: Option<String>,
        rarity: Rarity,
    ) -> Self {
        Self {
            id: CardId::new(id),
            title: title.into(),
            image_url,
            rarity,
        }
    }
}
