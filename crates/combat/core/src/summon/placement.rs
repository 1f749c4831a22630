//! Deterministic placement near an anchor.

use crate::state::Position;

/// Cells of the square ring at `radius` around `anchor`, clockwise starting
/// due north.
pub fn ring(anchor: Position, radius: u32) -> Vec<Position> {
    if radius == 0 {
        return vec![anchor];
    }
    let r = radius as i32;
    let mut cells = Vec::with_capacity(8 * radius as usize);

    // North edge, center to the north-east corner.
    cells.extend((0..=r).map(|dx| anchor.offset(dx, r)));
    // East edge, downward.
    cells.extend((-r..r).rev().map(|dy| anchor.offset(r, dy)));
    // South edge, westward.
    cells.extend((-r..r).rev().map(|dx| anchor.offset(dx, -r)));
    // West edge, upward.
    cells.extend((-r + 1..=r).map(|dy| anchor.offset(-r, dy)));
    // North edge, north-west corner back toward center.
    cells.extend((-r + 1..0).map(|dx| anchor.offset(dx, r)));

    cells
}

/// Nearest free cell: rings `1..=max_radius` searched in order.
pub fn find_free_cell(
    anchor: Position,
    max_radius: u32,
    occupied: impl Fn(Position) -> bool,
) -> Option<Position> {
    (1..=max_radius)
        .flat_map(|radius| ring(anchor, radius))
        .find(|cell| !occupied(*cell))
}
