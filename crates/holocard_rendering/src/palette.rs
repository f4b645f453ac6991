//! Rarity colours shared by materials, particles and accent lights.

use holocard_shared::Rarity;

/// White
pub const COMMON_WHITE: [f32; 3] = [1.0, 1.0, 1.0];
/// Green
pub const UNCOMMON_GREEN: [f32; 3] = [0.2, 0.9, 0.35];
/// Blue
pub const RARE_BLUE: [f32; 3] = [0.25, 0.55, 1.0];
/// Purple
pub const EPIC_PURPLE: [f32; 3] = [0.65, 0.3, 1.0];
/// Gold
pub const LEGENDARY_GOLD: [f32; 3] = [1.0, 0.84, 0.0];
/// Teal
pub const MYTHIC_TEAL: [f32; 3] = [0.0, 1.0, 0.8];

/// Signature colour of a rarity tier.
#[must_use]
pub const fn rarity_color(rarity: Rarity) -> [f32; 3] {
    match rarity {
        Rarity::Common => COMMON_WHITE,
        Rarity::Uncommon => UNCOMMON_GREEN,
        Rarity::Rare => RARE_BLUE,
        Rarity::Epic => EPIC_PURPLE,
        Rarity::Legendary => LEGENDARY_GOLD,
        Rarity::Mythic => MYTHIC_TEAL,
    }
}
