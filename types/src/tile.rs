/// Value of an empty cell.
pub const EMPTY: u32 = 0;

/// Spawn distribution for new tiles: value and relative weight.
/// A freshly spawned tile is a 2 nine times out of ten.
pub const SPAWN_WEIGHTS: [(u32, u8); 2] = [(2, 9), (4, 1)];

/// A cell value is valid if it is empty or a power of two of at least 2.
#[must_use]
#[inline(always)]
pub const fn is_valid_tile(value: u32) -> bool {
    value == EMPTY || (value >= 2 && value.is_power_of_two())
}
