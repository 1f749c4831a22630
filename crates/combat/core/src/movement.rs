//! Grid distance and step-toward planning.
//!
//! Distance is Chebyshev (diagonal steps cost one cell). Planning never
//! mutates state; the engine commits the resulting position.

use crate::error::{FailureReason, RuleResult};
use crate::state::Position;

/// Chebyshev distance between two cells.
pub fn distance(a: Position, b: Position) -> u32 {
    let dx = (a.x - b.x).unsigned_abs();
    let dy = (a.y - b.y).unsigned_abs();
    dx.max(dy)
}

fn manhattan(a: Position, b: Position) -> u32 {
    (a.x - b.x).unsigned_abs() + (a.y - b.y).unsigned_abs()
}

/// Constraints on an approach.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveLimits {
    /// Cells that may be stepped this turn.
    pub max_steps: u32,
    /// Movement may not end farther than `radius` from `anchor`.
    pub leash: Option<Leash>,
    /// Refuse to leave the current cell while engaged.
    pub hold_position: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Leash {
    pub anchor: Position,
    pub radius: u32,
}

impl Leash {
    pub fn allows(&self, cell: Position) -> bool {
        distance(self.anchor, cell) <= self.radius
    }
}

/// Outcome of approach planning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MovePlan {
    /// Already within range.
    Stay,
    /// Walk through `path`; the last cell is the destination.
    Step { path: Vec<Position>, in_range: bool },
}

impl MovePlan {
    pub fn destination(&self) -> Option<Position> {
        match self {
            MovePlan::Stay => None,
            MovePlan::Step { path, .. } => path.last().copied(),
        }
    }
}

/// Scaled step budget: `steps * multiplier%`, at least one cell.
pub fn step_budget(steps_per_turn: u32, move_multiplier_percent: u32) -> u32 {
    (steps_per_turn * move_multiplier_percent / 100).max(1)
}

/// Plans steps from `from` until `target` is within `range`.
///
/// Each step moves one cell diagonally toward the target, falling back to
/// the pure horizontal or vertical step when the diagonal is blocked.
/// Occupied cells and cells outside the leash are never entered.
///
/// Fails with `out-of-range` when the target is out of range and no step is
/// possible (holding position, blocked, or leashed).
pub fn plan_approach(
    from: Position,
    target: Position,
    range: u32,
    limits: MoveLimits,
    occupied: impl Fn(Position) -> bool,
) -> RuleResult<MovePlan> {
    if distance(from, target) <= range {
        return Ok(MovePlan::Stay);
    }
    if limits.hold_position {
        return Err(FailureReason::OutOfRange);
    }

    let mut path = Vec::new();
    let mut current = from;
    for _ in 0..limits.max_steps {
        let dx = (target.x - current.x).signum();
        let dy = (target.y - current.y).signum();

        let candidates = [
            current.offset(dx, dy),
            current.offset(dx, 0),
            current.offset(0, dy),
        ];
        let next = candidates.into_iter().find(|cell| {
            *cell != current
                && *cell != target
                && manhattan(*cell, target) < manhattan(current, target)
                && !occupied(*cell)
                && limits.leash.map(|leash| leash.allows(*cell)).unwrap_or(true)
        });

        let Some(next) = next else {
            break;
        };
        path.push(next);
        current = next;
        if distance(current, target) <= range {
            break;
        }
    }

    if path.is_empty() {
        return Err(FailureReason::OutOfRange);
    }
    let in_range = distance(current, target) <= range;
    Ok(MovePlan::Step { path, in_range })
}
