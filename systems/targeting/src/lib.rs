#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that aims the player's laser from world snapshots.

use tas_core::{CellCoord, Command, OccupancyView, PlayerSnapshot};

/// Laser targeting system.
///
/// The laser travels up the player's lane starting one row above the player
/// and stops at the first occupied cell. Enemies behind that cell are never
/// hit in the same turn.
#[derive(Clone, Copy, Debug, Default)]
pub struct Targeting;

impl Targeting {
    /// Creates a new targeting system.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Emits a `FireLaser` command when an enemy is in line of sight.
    ///
    /// Nothing is emitted when the lane above the player is empty.
    pub fn handle(
        &self,
        player: PlayerSnapshot,
        occupancy: OccupancyView<'_>,
        out: &mut Vec<Command>,
    ) {
        if let Some(target) = self.line_of_sight(player, occupancy) {
            out.push(Command::FireLaser { target });
        }
    }

    /// Returns the first occupied cell above the player, if any.
    #[must_use]
    pub fn line_of_sight(
        &self,
        player: PlayerSnapshot,
        occupancy: OccupancyView<'_>,
    ) -> Option<CellCoord> {
        let origin = player.cell();
        let (width, height) = occupancy.dimensions();
        if origin.lane() >= width {
            return None;
        }

        (origin.row() + 1..height)
            .map(|row| CellCoord::new(origin.lane(), row))
            .find(|cell| occupancy.is_occupied(*cell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tas_core::{Enemy, SpawnRecord};

    const WIDTH: u32 = 3;
    const HEIGHT: u32 = 5;

    fn field(occupied: &[(u32, u32, u32)]) -> Vec<Option<Enemy>> {
        let mut cells = vec![None; (WIDTH * HEIGHT) as usize];
        for &(lane, row, hp) in occupied {
            cells[(row * WIDTH + lane) as usize] =
                Some(Enemy::from_record(SpawnRecord::new(hp, 1, lane)));
        }
        cells
    }

    fn player(lane: u32) -> PlayerSnapshot {
        PlayerSnapshot {
            lane,
            score: 0,
            power: 0,
            level: 1,
        }
    }

    #[test]
    fn targets_nearest_enemy_in_lane() {
        let cells = field(&[(1, 4, 3), (1, 2, 9), (0, 1, 2)]);
        let view = OccupancyView::new(&cells, WIDTH, HEIGHT);

        let mut out = Vec::new();
        Targeting::new().handle(player(1), view, &mut out);

        assert_eq!(
            out,
            vec![Command::FireLaser {
                target: CellCoord::new(1, 2),
            }]
        );
    }

    #[test]
    fn empty_lane_emits_nothing() {
        let cells = field(&[(0, 1, 2), (2, 3, 2)]);
        let view = OccupancyView::new(&cells, WIDTH, HEIGHT);

        let mut out = Vec::new();
        Targeting::new().handle(player(1), view, &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn player_row_is_never_targeted() {
        let cells = field(&[(2, 0, 4)]);
        let view = OccupancyView::new(&cells, WIDTH, HEIGHT);

        assert_eq!(Targeting::new().line_of_sight(player(2), view), None);
    }

    #[test]
    fn top_row_is_within_reach() {
        let cells = field(&[(0, HEIGHT - 1, 4)]);
        let view = OccupancyView::new(&cells, WIDTH, HEIGHT);

        assert_eq!(
            Targeting::new().line_of_sight(player(0), view),
            Some(CellCoord::new(0, HEIGHT - 1))
        );
    }
}
