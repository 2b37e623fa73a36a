//! Side-scrolling platformer on a 400x400 canvas with four stages.

use rand::Rng;

use super::{owns, Rect, EXTRA_LIFE_ITEM};

pub const WIDTH: f32 = 400.0;
pub const HEIGHT: f32 = 400.0;
pub const PLAYER_SIZE: f32 = 20.0;
pub const SPAWN: (f32, f32) = (50.0, 50.0);
pub const GRAVITY: f32 = 0.5;
pub const JUMP_VELOCITY: f32 = -10.0;
pub const MOVE_SPEED: f32 = 5.0;
pub const BASE_LIVES: u32 = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub platforms: Vec<Rect>,
    pub thorns: Vec<Rect>,
    pub pitfalls: Vec<Rect>,
}

/// The built-in stages, in play order.
pub fn stages() -> Vec<Stage> {
    vec![
        Stage {
            platforms: vec![
                Rect::new(0.0, 380.0, 400.0, 20.0),
                Rect::new(100.0, 320.0, 100.0, 20.0),
                Rect::new(250.0, 260.0, 100.0, 20.0),
            ],
            thorns: vec![Rect::new(150.0, 360.0, 20.0, 20.0)],
            pitfalls: vec![],
        },
        Stage {
            platforms: vec![
                Rect::new(0.0, 380.0, 80.0, 20.0),
                Rect::new(150.0, 320.0, 100.0, 20.0),
                Rect::new(300.0, 260.0, 100.0, 20.0),
                Rect::new(50.0, 200.0, 120.0, 20.0),
            ],
            thorns: vec![Rect::new(200.0, 300.0, 20.0, 20.0)],
            pitfalls: vec![Rect::new(90.0, 390.0, 50.0, 10.0)],
        },
        Stage {
            platforms: vec![
                Rect::new(0.0, 380.0, 60.0, 20.0),
                Rect::new(120.0, 340.0, 60.0, 20.0),
                Rect::new(240.0, 300.0, 60.0, 20.0),
                Rect::new(350.0, 260.0, 50.0, 20.0),
            ],
            thorns: vec![],
            pitfalls: vec![
                Rect::new(60.0, 390.0, 60.0, 10.0),
                Rect::new(180.0, 390.0, 60.0, 10.0),
                Rect::new(300.0, 390.0, 50.0, 10.0),
            ],
        },
        Stage {
            platforms: vec![
                Rect::new(0.0, 380.0, 100.0, 20.0),
                Rect::new(150.0, 300.0, 80.0, 20.0),
                Rect::new(280.0, 220.0, 120.0, 20.0),
            ],
            thorns: vec![Rect::new(50.0, 360.0, 20.0, 20.0)],
            pitfalls: vec![Rect::new(110.0, 390.0, 30.0, 10.0)],
        },
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Stages in order; clearing the last one ends the run.
    Normal,
    /// A random stage after each clear, forever.
    Endless,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    GameOver,
    Cleared,
}

/// Buttons held during this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Input {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub airborne: bool,
}

impl Player {
    pub fn spawn() -> Self {
        Self {
            x: SPAWN.0,
            y: SPAWN.1,
            vx: 0.0,
            vy: 0.0,
            airborne: false,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, PLAYER_SIZE, PLAYER_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlatformerState {
    pub player: Player,
    pub stage: usize,
    pub lives: u32,
    pub mode: Mode,
    pub status: Status,
}

impl PlatformerState {
    pub fn new(mode: Mode, inventory: &[String]) -> Self {
        let lives = if owns(inventory, EXTRA_LIFE_ITEM) {
            BASE_LIVES + 1
        } else {
            BASE_LIVES
        };
        Self {
            player: Player::spawn(),
            stage: 0,
            lives,
            mode,
            status: Status::Running,
        }
    }

    fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.status = Status::GameOver;
        } else {
            self.player = Player::spawn();
        }
    }
}

/// Advance one frame.
pub fn tick(
    state: &PlatformerState,
    input: Input,
    stages: &[Stage],
    rng: &mut impl Rng,
) -> PlatformerState {
    let mut next = state.clone();
    let Some(stage) = stages.get(state.stage) else {
        next.status = Status::GameOver;
        return next;
    };
    if next.status != Status::Running {
        return next;
    }

    let p = &mut next.player;
    if input.jump && !p.airborne {
        p.vy = JUMP_VELOCITY;
        p.airborne = true;
    }
    p.vx = match (input.left, input.right) {
        (true, false) => -MOVE_SPEED,
        (false, true) => MOVE_SPEED,
        _ => 0.0,
    };

    p.vy += GRAVITY;
    p.x = (p.x + p.vx).max(0.0);
    p.y += p.vy;

    if p.bounds().bottom() > HEIGHT {
        next.lose_life();
        return next;
    }

    // land only while falling, and only from above
    p.airborne = true;
    for platform in &stage.platforms {
        let bounds = p.bounds();
        if bounds.overlaps_x(platform)
            && bounds.bottom() > platform.y
            && bounds.bottom() < platform.bottom()
            && p.vy >= 0.0
        {
            p.y = platform.y - PLAYER_SIZE;
            p.vy = 0.0;
            p.airborne = false;
        }
    }

    let bounds = p.bounds();
    let hit_thorn = stage.thorns.iter().any(|t| bounds.intersects(t));
    let in_pitfall = stage
        .pitfalls
        .iter()
        .any(|pit| bounds.overlaps_x(pit) && bounds.bottom() > pit.y);
    if hit_thorn || in_pitfall {
        next.lose_life();
        return next;
    }

    if p.x > WIDTH - PLAYER_SIZE {
        advance(&mut next, stages.len(), rng);
    }
    next
}

fn advance(state: &mut PlatformerState, stage_count: usize, rng: &mut impl Rng) {
    match state.mode {
        Mode::Normal if state.stage + 1 >= stage_count => state.status = Status::Cleared,
        Mode::Normal => state.stage += 1,
        Mode::Endless => state.stage = rng.gen_range(0..stage_count),
    }
    state.player = Player::spawn();
}
