use medusa_tower_core::{
    CellCoord, FloorId, Position, SnakeId, SnakeMode, SnakeSnapshot, SnakeStep, SnakeView,
};
use medusa_tower_system_patrol::SnakeDefinition;

#[derive(Clone, Debug)]
struct Snake {
    id: SnakeId,
    floor: FloorId,
    mode: SnakeMode,
    path: Vec<CellCoord>,
    index: usize,
    initial_index: usize,
    direction: i8,
    alive: bool,
}

impl Snake {
    fn from_definition(id: SnakeId, definition: SnakeDefinition) -> Self {
        let initial_index = definition
            .start_index
            .min(definition.path.len().saturating_sub(1));
        let mut snake = Self {
            id,
            floor: definition.floor,
            mode: definition.mode,
            path: definition.path,
            index: initial_index,
            initial_index,
            direction: 1,
            alive: true,
        };
        snake.direction = snake.initial_direction();
        snake
    }

    fn initial_direction(&self) -> i8 {
        if self.path.len() > 1 && self.initial_index == self.path.len() - 1 {
            -1
        } else {
            1
        }
    }

    fn cell(&self) -> Option<CellCoord> {
        self.path.get(self.index).copied()
    }

    fn position(&self) -> Option<Position> {
        self.cell().map(|cell| Position::at(cell, self.floor))
    }

    fn is_active(&self) -> bool {
        self.alive && !self.path.is_empty()
    }

    fn step(&mut self) {
        let len = self.path.len();
        if len < 2 {
            return;
        }
        match self.mode {
            SnakeMode::Bounce => {
                let last = len - 1;
                let leaves_path = (self.direction < 0 && self.index == 0)
                    || (self.direction > 0 && self.index >= last);
                if leaves_path {
                    self.direction = -self.direction;
                }
                self.index = if self.direction > 0 {
                    self.index + 1
                } else {
                    self.index - 1
                };
                if self.index == 0 || self.index == last {
                    self.direction = -self.direction;
                }
            }
            SnakeMode::Loop | SnakeMode::Clock => {
                self.index = (self.index + 1) % len;
            }
        }
    }

    fn reset(&mut self) {
        self.index = self.initial_index;
        self.direction = self.initial_direction();
    }
}

/// Every snake of the tower, in identifier order.
#[derive(Clone, Debug, Default)]
pub(crate) struct SnakeRoster {
    snakes: Vec<Snake>,
}

impl SnakeRoster {
    pub(crate) fn from_definitions(definitions: Vec<SnakeDefinition>) -> Self {
        let snakes = definitions
            .into_iter()
            .enumerate()
            .filter_map(|(index, definition)| {
                let id = SnakeId::new(u32::try_from(index).ok()?);
                Some(Snake::from_definition(id, definition))
            })
            .collect();
        Self { snakes }
    }

    /// Advances every live snake, optionally only those on `floor`, by one tick.
    pub(crate) fn step_all(&mut self, floor: Option<FloorId>) -> Vec<SnakeStep> {
        let mut steps = Vec::new();
        for snake in &mut self.snakes {
            if !snake.is_active() || floor.is_some_and(|floor| floor != snake.floor) {
                continue;
            }
            snake.step();
            if let Some(position) = snake.position() {
                steps.push(SnakeStep {
                    snake: snake.id,
                    position,
                });
            }
        }
        steps
    }

    /// Live snake whose current cell is `position`. Path membership alone does not count.
    pub(crate) fn occupied_by(&self, position: Position) -> Option<SnakeId> {
        self.snakes
            .iter()
            .filter(|snake| snake.is_active())
            .find(|snake| snake.position() == Some(position))
            .map(|snake| snake.id)
    }

    /// Returns every snake to its initial index and direction. Killed snakes stay dead.
    pub(crate) fn reset_to_initial(&mut self) {
        for snake in &mut self.snakes {
            snake.reset();
        }
    }

    pub(crate) fn kill(&mut self, id: SnakeId) -> bool {
        match self.snakes.iter_mut().find(|snake| snake.id == id) {
            Some(snake) if snake.alive => {
                snake.alive = false;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn killed(&self) -> Vec<SnakeId> {
        self.snakes
            .iter()
            .filter(|snake| !snake.alive)
            .map(|snake| snake.id)
            .collect()
    }

    pub(crate) fn revive_all(&mut self) {
        for snake in &mut self.snakes {
            snake.alive = true;
        }
    }

    pub(crate) fn view(&self, floor: FloorId) -> SnakeView {
        SnakeView::from_snapshots(
            self.snakes
                .iter()
                .filter(|snake| snake.is_active() && snake.floor == floor)
                .filter_map(|snake| {
                    Some(SnakeSnapshot {
                        id: snake.id,
                        position: snake.position()?,
                        mode: snake.mode,
                    })
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(mode: SnakeMode, length: u32, start_index: usize) -> SnakeDefinition {
        SnakeDefinition {
            floor: FloorId::new(1),
            mode,
            path: (0..length).map(|row| CellCoord::new(0, row)).collect(),
            start_index,
        }
    }

    fn only(roster: &SnakeRoster) -> &Snake {
        &roster.snakes[0]
    }

    #[test]
    fn bounce_round_trip_restores_index_and_direction() {
        for length in 2..7 {
            for start in 0..length as usize {
                let mut roster =
                    SnakeRoster::from_definitions(vec![line(SnakeMode::Bounce, length, start)]);
                let direction = only(&roster).direction;
                for _ in 0..2 * (length - 1) {
                    let _ = roster.step_all(None);
                }
                assert_eq!(only(&roster).index, start, "length {length} start {start}");
                assert_eq!(only(&roster).direction, direction);
            }
        }
    }

    #[test]
    fn bounce_reverses_at_path_ends() {
        let mut roster = SnakeRoster::from_definitions(vec![line(SnakeMode::Bounce, 3, 0)]);
        let rows: Vec<u32> = (0..6)
            .map(|_| roster.step_all(None)[0].position.cell().row())
            .collect();
        assert_eq!(rows, vec![1, 2, 1, 0, 1, 2]);
    }

    #[test]
    fn loop_closes_after_path_length_steps() {
        let mut roster = SnakeRoster::from_definitions(vec![line(SnakeMode::Loop, 5, 2)]);
        for _ in 0..5 {
            let _ = roster.step_all(None);
        }
        assert_eq!(only(&roster).index, 2);
        let next = roster.step_all(None);
        assert_eq!(next[0].position.cell(), CellCoord::new(0, 3));
    }

    #[test]
    fn empty_path_is_inert() {
        let mut roster = SnakeRoster::from_definitions(vec![SnakeDefinition {
            floor: FloorId::new(1),
            mode: SnakeMode::Bounce,
            path: Vec::new(),
            start_index: 0,
        }]);
        assert!(roster.step_all(None).is_empty());
        assert_eq!(roster.occupied_by(Position::new(0, 0, FloorId::new(1))), None);
        assert_eq!(roster.view(FloorId::new(1)).iter().count(), 0);
    }

    #[test]
    fn occupancy_tracks_current_index_only() {
        let mut roster = SnakeRoster::from_definitions(vec![line(SnakeMode::Loop, 3, 0)]);
        let floor = FloorId::new(1);
        assert_eq!(
            roster.occupied_by(Position::new(0, 0, floor)),
            Some(SnakeId::new(0))
        );
        assert_eq!(roster.occupied_by(Position::new(0, 1, floor)), None);
        let _ = roster.step_all(None);
        assert_eq!(roster.occupied_by(Position::new(0, 0, floor)), None);
        assert_eq!(roster.occupied_by(Position::new(0, 1, floor)), Some(SnakeId::new(0)));
    }

    #[test]
    fn floor_filter_freezes_other_floors() {
        let mut hidden = line(SnakeMode::Loop, 3, 0);
        hidden.floor = FloorId::new(5);
        let mut roster =
            SnakeRoster::from_definitions(vec![line(SnakeMode::Loop, 3, 0), hidden]);
        let steps = roster.step_all(Some(FloorId::new(1)));
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].snake, SnakeId::new(0));
        assert_eq!(roster.snakes[1].index, 0);
    }

    #[test]
    fn killed_snakes_stay_dead_across_resets() {
        let mut roster = SnakeRoster::from_definitions(vec![
            line(SnakeMode::Loop, 3, 0),
            line(SnakeMode::Bounce, 3, 1),
        ]);
        assert!(roster.kill(SnakeId::new(1)));
        assert!(!roster.kill(SnakeId::new(1)), "a dead snake cannot die twice");
        let _ = roster.step_all(None);
        roster.reset_to_initial();

        assert_eq!(roster.killed(), vec![SnakeId::new(1)]);
        assert_eq!(only(&roster).index, 0);
        assert_eq!(roster.step_all(None).len(), 1);

        roster.revive_all();
        assert!(roster.killed().is_empty());
    }
}
