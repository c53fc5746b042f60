use std::collections::VecDeque;

use hashbrown::HashMap;
use jamgrid_data::{
    math::Float,
    tile::{TileHandle, TileMap},
};

use crate::completion::{Completer, Completion};

/// Downward acceleration applied to falling tiles.
pub const GRAVITY: Float = 10.0;
/// How close above its target level a tile has to be to count as landed.
pub const LANDING_EPSILON: Float = 0.01;

/// Where a tile is in its lifecycle. Exactly one holds at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileFallState {
    Queued,
    Falling,
    /// Landed, or never handed to the scheduler.
    Settled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallingState {
    pub elapsed: Float,
    /// Downward speed. Negative while the tile is still being thrown up.
    pub speed: Float,
}

/// The initial downward speed that makes a tile `height` above its target land on it after exactly
/// `duration` seconds under [`GRAVITY`].
///
/// `height` is measured from the tile's current `y` down to its target level, not down to 0.
#[inline]
pub fn initial_speed(height: Float, duration: Float) -> Float {
    -(GRAVITY * duration / 2.0 - height / duration)
}

fn resolve(waiters: &mut HashMap<TileHandle, Vec<Completer>>, tile: TileHandle) {
    for completer in waiters.remove(&tile).into_iter().flatten() {
        completer.complete();
    }
}

/// Drops tiles onto the grid, releasing at most one from the wait queue per `1 / tiles_per_second`.
#[derive(Debug)]
pub struct TileFallScheduler {
    queue: VecDeque<TileHandle>,
    falling: HashMap<TileHandle, FallingState>,
    waiters: HashMap<TileHandle, Vec<Completer>>,

    tiles_per_second: Float,
    default_fall_duration: Float,
    tile_delay: Float,
}

impl TileFallScheduler {
    pub fn new(tiles_per_second: Float, default_fall_duration: Float) -> Self {
        Self {
            queue: VecDeque::new(),
            falling: HashMap::new(),
            waiters: HashMap::new(),

            tiles_per_second,
            default_fall_duration,
            tile_delay: tiles_per_second.recip(),
        }
    }

    #[inline]
    fn interval(&self) -> Float {
        self.tiles_per_second.recip()
    }

    /// Queues a tile to fall. The returned [`Completion`] fires when it reaches its target level.
    ///
    /// Queuing a tile that is already queued queues it twice.
    pub fn spawn(&mut self, tile: TileHandle, at_front: bool) -> Completion {
        let (completer, completion) = Completer::new();
        self.waiters.entry(tile).or_default().push(completer);

        if at_front {
            self.queue.push_front(tile);
        } else {
            self.queue.push_back(tile);
        }

        completion
    }

    /// Takes a tile out of the wait queue. Tiles that already started falling are not affected.
    ///
    /// Returns false if the tile was not queued.
    pub fn remove(&mut self, tile: TileHandle) -> bool {
        if !self.unqueue(tile) {
            return false;
        }

        if !self.falling.contains_key(&tile) && !self.queue.contains(&tile) {
            self.waiters.remove(&tile);
        }

        true
    }

    /// Moves a group of tiles to the head of the queue (or the back, if `at_front` is false),
    /// keeping their relative order and skipping the ones already falling.
    pub fn spawn_batch(&mut self, tiles: &[TileHandle], at_front: bool) -> Vec<(TileHandle, Completion)> {
        for &tile in tiles {
            self.unqueue(tile);
        }

        let pending = tiles
            .iter()
            .copied()
            .filter(|tile| !self.falling.contains_key(tile))
            .collect::<Vec<_>>();

        log::debug!(
            "Requeuing {} of {} tiles, {} queued in total",
            pending.len(),
            tiles.len(),
            self.queue.len() + pending.len()
        );

        if at_front {
            for &tile in pending.iter().rev() {
                self.queue.push_front(tile);
            }
        } else {
            self.queue.extend(pending.iter().copied());
        }

        pending
            .into_iter()
            .map(|tile| {
                let (completer, completion) = Completer::new();
                self.waiters.entry(tile).or_default().push(completer);

                (tile, completion)
            })
            .collect()
    }

    fn unqueue(&mut self, tile: TileHandle) -> bool {
        match self.queue.iter().position(|&queued| queued == tile) {
            Some(index) => {
                self.queue.remove(index);
                true
            }
            None => false,
        }
    }

    /// Advances every falling tile, then releases the next queued one if the rate limit allows.
    pub fn update(&mut self, dt: Float, tiles: &mut TileMap) {
        let waiters = &mut self.waiters;

        self.falling.retain(|&handle, state| {
            let Some(tile) = tiles.get_mut(handle) else {
                log::trace!("Tile {handle:?} vanished while falling");
                resolve(waiters, handle);
                return false;
            };

            if tile.position.y - LANDING_EPSILON <= tile.target_level {
                tile.position.y = tile.target_level;
                log::trace!("Tile at {} landed after {:.2}s", tile.coord, state.elapsed);
                resolve(waiters, handle);
                return false;
            }

            tile.position.y = (tile.position.y - state.speed * dt).max(0.0);
            state.speed += GRAVITY * dt;
            state.elapsed += dt;

            true
        });

        // at most one release per tick, no matter how far the delay overshot
        if self.tile_delay <= 0.0 {
            if let Some(handle) = self.queue.pop_front() {
                self.start_falling(handle, tiles);
                self.tile_delay = self.interval();
            }
        } else {
            self.tile_delay -= dt;
        }
    }

    fn start_falling(&mut self, handle: TileHandle, tiles: &mut TileMap) {
        if self.falling.contains_key(&handle) {
            log::trace!("Tile {handle:?} was queued again while falling");
            return;
        }

        let Some(tile) = tiles.get_mut(handle) else {
            log::trace!("Tile {handle:?} vanished while queued");
            resolve(&mut self.waiters, handle);
            return;
        };

        let duration = tile.fall_duration.unwrap_or(self.default_fall_duration);
        if duration <= 0.0 {
            tile.position.y = tile.target_level;
            resolve(&mut self.waiters, handle);
            return;
        }

        let height = tile.position.y - tile.target_level;
        let speed = initial_speed(height, duration);

        log::trace!("Tile at {} starts falling from {height:.2} over {duration:.2}s", tile.coord);

        self.falling.insert(handle, FallingState { elapsed: 0.0, speed });
    }
}

impl TileFallScheduler {
    pub fn state(&self, tile: TileHandle) -> TileFallState {
        if self.falling.contains_key(&tile) {
            TileFallState::Falling
        } else if self.queue.contains(&tile) {
            TileFallState::Queued
        } else {
            TileFallState::Settled
        }
    }

    pub fn falling_state(&self, tile: TileHandle) -> Option<&FallingState> {
        self.falling.get(&tile)
    }

    /// The wait queue, front first.
    pub fn queued(&self) -> impl Iterator<Item = TileHandle> + '_ {
        self.queue.iter().copied()
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    pub fn falling_len(&self) -> usize {
        self.falling.len()
    }

    /// True when nothing is queued or falling.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.falling.is_empty()
    }
}
