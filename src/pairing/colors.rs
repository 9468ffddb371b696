//! Colour allocation for a finalized pair.

use crate::models::{Color, PlayerStanding};

/// How well a colour allocation satisfies both players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ColorFit {
    /// Both players get their due colour, or have no preference.
    Satisfied,
    /// One player misses their due colour but stays within the imbalance limit.
    Tolerated,
    /// One player ends up beyond the imbalance limit.
    Exceeded,
}

/// Pick `a`'s colour against `b`; `b` takes the other one.
///
/// Complementary or one-sided preferences are honoured directly. When both
/// are due the same colour, the player with the larger imbalance gets it,
/// then the lower pairing number. With no history on either side the
/// higher-ranked player's colour alternates by board, starting from
/// `first_board_color` on board 0.
pub fn allocate(
    a: &PlayerStanding,
    b: &PlayerStanding,
    board_index: usize,
    first_board_color: Color,
) -> Color {
    match (a.due_color(), b.due_color()) {
        (Some(due_a), Some(due_b)) if due_a != due_b => due_a,
        (Some(due_a), None) => due_a,
        (None, Some(due_b)) => due_b.opposite(),
        (Some(due), Some(_)) => {
            let claim_a = a.color_balance().abs();
            let claim_b = b.color_balance().abs();
            let a_wins = claim_a > claim_b
                || (claim_a == claim_b && a.pairing_number < b.pairing_number);
            if a_wins {
                due
            } else {
                due.opposite()
            }
        }
        (None, None) => {
            let higher = if board_index % 2 == 0 {
                first_board_color
            } else {
                first_board_color.opposite()
            };
            if a.pairing_number < b.pairing_number {
                higher
            } else {
                higher.opposite()
            }
        }
    }
}

/// Imbalance `player` would have after playing `color`.
pub fn balance_after(player: &PlayerStanding, color: Color) -> i32 {
    player.color_balance() + color.balance_delta()
}

/// Rate the allocation `allocate` would produce for this pair.
pub fn fit(a: &PlayerStanding, b: &PlayerStanding, max_imbalance: u32) -> ColorFit {
    let color_a = allocate(a, b, 0, Color::White);
    let color_b = color_a.opposite();

    let exceeded = balance_after(a, color_a).unsigned_abs() > max_imbalance
        || balance_after(b, color_b).unsigned_abs() > max_imbalance;
    if exceeded {
        return ColorFit::Exceeded;
    }

    let missed = a.due_color().is_some_and(|c| c != color_a)
        || b.due_color().is_some_and(|c| c != color_b);
    if missed {
        ColorFit::Tolerated
    } else {
        ColorFit::Satisfied
    }
}
