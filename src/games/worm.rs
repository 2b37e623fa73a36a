//! Worm on a 40x40 grid.

use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;

use super::{owns, SPEED_BOOST_ITEM};

pub const GRID_SIZE: i32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    fn in_bounds(&self) -> bool {
        (0..GRID_SIZE).contains(&self.x) && (0..GRID_SIZE).contains(&self.y)
    }

    fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WormState {
    /// Head first.
    pub body: Vec<Cell>,
    pub direction: Direction,
    pub food: Cell,
    pub score: u32,
    pub status: Status,
}

impl WormState {
    pub fn new(rng: &mut impl Rng) -> Self {
        let body = vec![Cell::new(10, 10)];
        let food = spawn_food(&body, rng).unwrap_or(Cell::new(0, 0));
        Self {
            body,
            direction: Direction::Right,
            food,
            score: 0,
            status: Status::Running,
        }
    }

    pub fn head(&self) -> Cell {
        self.body[0]
    }
}

/// Milliseconds between ticks. Faster with the speed boost.
pub fn tick_interval(inventory: &[String]) -> Duration {
    if owns(inventory, SPEED_BOOST_ITEM) {
        Duration::from_millis(50)
    } else {
        Duration::from_millis(100)
    }
}

/// A random free cell, `None` once the worm fills the grid.
fn spawn_food(body: &[Cell], rng: &mut impl Rng) -> Option<Cell> {
    let free: Vec<Cell> = (0..GRID_SIZE)
        .flat_map(|y| (0..GRID_SIZE).map(move |x| Cell::new(x, y)))
        .filter(|c| !body.contains(c))
        .collect();
    free.choose(rng).copied()
}

/// Advance one step. `turn` is the latest steering input; a direct reversal is ignored.
pub fn tick(state: &WormState, turn: Option<Direction>, rng: &mut impl Rng) -> WormState {
    let mut next = state.clone();
    if next.status != Status::Running {
        return next;
    }

    if let Some(turn) = turn.filter(|t| *t != state.direction.opposite()) {
        next.direction = turn;
    }

    let head = state.head().step(next.direction);
    if !head.in_bounds() {
        next.status = Status::GameOver;
        return next;
    }

    let eating = head == state.food;
    if !eating {
        next.body.pop();
    }
    if next.body.contains(&head) {
        next.status = Status::GameOver;
        return next;
    }
    next.body.insert(0, head);

    if eating {
        next.score += 1;
        match spawn_food(&next.body, rng) {
            Some(food) => next.food = food,
            None => next.status = Status::GameOver,
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    fn state(body: &[(i32, i32)], direction: Direction) -> WormState {
        WormState {
            body: body.iter().map(|&(x, y)| Cell::new(x, y)).collect(),
            direction,
            food: Cell::new(0, 0),
            score: 0,
            status: Status::Running,
        }
    }

    #[test]
    fn test_new_game() {
        let s = WormState::new(&mut rng());
        assert_eq!(s.body, vec![Cell::new(10, 10)]);
        assert_ne!(s.food, s.head());
        assert!(s.food.in_bounds());
    }

    #[test]
    fn test_moves_and_ignores_reversal() {
        let s = state(&[(10, 10)], Direction::Right);
        let s = tick(&s, None, &mut rng());
        assert_eq!(s.head(), Cell::new(11, 10));

        let s = tick(&s, Some(Direction::Left), &mut rng());
        assert_eq!(s.head(), Cell::new(12, 10));
        assert_eq!(s.direction, Direction::Right);

        let s = tick(&s, Some(Direction::Up), &mut rng());
        assert_eq!(s.head(), Cell::new(12, 9));
        assert_eq!(s.body.len(), 1);
    }

    #[test]
    fn test_wall_ends_game() {
        let s = state(&[(39, 10)], Direction::Right);
        let s = tick(&s, None, &mut rng());
        assert_eq!(s.status, Status::GameOver);
        // finished games stay frozen
        assert_eq!(tick(&s, None, &mut rng()), s);

        let s = state(&[(5, 0)], Direction::Up);
        assert_eq!(tick(&s, None, &mut rng()).status, Status::GameOver);
    }

    #[test]
    fn test_eating_grows_and_respawns_food() {
        let mut s = state(&[(10, 10)], Direction::Right);
        s.food = Cell::new(11, 10);
        let s = tick(&s, None, &mut rng());
        assert_eq!(s.score, 1);
        assert_eq!(s.body, vec![Cell::new(11, 10), Cell::new(10, 10)]);
        assert!(!s.body.contains(&s.food));
    }

    #[test]
    fn test_self_collision() {
        let s = state(
            &[(5, 5), (5, 6), (4, 6), (4, 5), (4, 4), (5, 4)],
            Direction::Up,
        );
        let s = tick(&s, Some(Direction::Left), &mut rng());
        assert_eq!(s.status, Status::GameOver);
    }

    #[test]
    fn test_moving_into_vacated_tail_is_safe() {
        let s = state(&[(5, 5), (5, 6), (4, 6), (4, 5)], Direction::Up);
        let s = tick(&s, Some(Direction::Left), &mut rng());
        assert_eq!(s.status, Status::Running);
        assert_eq!(s.head(), Cell::new(4, 5));
        assert_eq!(s.body.len(), 4);
    }

    #[test]
    fn test_tick_interval() {
        assert_eq!(tick_interval(&[]), Duration::from_millis(100));
        let boosted = vec!["speed-boost".to_string()];
        assert_eq!(tick_interval(&boosted), Duration::from_millis(50));
    }
}
