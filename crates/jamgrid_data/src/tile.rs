use hashbrown::HashMap;
use slotmap::{SlotMap, new_key_type};

use crate::{
    coord::HexCoord,
    math::{Float, Vec3},
};

new_key_type! {
    /// A generational handle to a [`Tile`] inside a [`TileMap`].
    pub struct TileHandle;
}

/// Everything needed to put a new tile into the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileSpawn {
    pub coord: HexCoord,
    /// The height the tile starts falling from.
    pub initial_level: Float,
    /// The height the tile comes to rest at.
    pub target_level: Float,
    /// Overrides the scheduler's default fall duration.
    pub fall_duration: Option<Float>,
}

impl TileSpawn {
    pub fn new(coord: HexCoord, initial_level: Float, target_level: Float) -> Self {
        Self {
            coord,
            initial_level,
            target_level,
            fall_duration: None,
        }
    }

    pub fn with_fall_duration(mut self, duration: Float) -> Self {
        self.fall_duration = Some(duration);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub coord: HexCoord,
    pub initial_level: Float,
    pub target_level: Float,
    pub fall_duration: Option<Float>,
    pub selected: bool,
    /// World position of the tile's visual.
    pub position: Vec3,
}

/// The live tiles of the scene. A handle that no longer resolves means the tile's visual is gone.
#[derive(Debug, Clone)]
pub struct TileMap {
    tiles: SlotMap<TileHandle, Tile>,
    by_coord: HashMap<HexCoord, TileHandle>,
    hex_size: Vec3,
}

impl TileMap {
    pub fn new(hex_size: Vec3) -> Self {
        Self {
            tiles: SlotMap::with_key(),
            by_coord: HashMap::new(),
            hex_size,
        }
    }

    pub fn hex_size(&self) -> Vec3 {
        self.hex_size
    }

    /// Creates a tile at `spawn.coord`, placed at its initial level.
    /// A tile already occupying the coordinate is despawned.
    pub fn spawn_tile(&mut self, spawn: TileSpawn) -> TileHandle {
        let tile = Tile {
            coord: spawn.coord,
            initial_level: spawn.initial_level,
            target_level: spawn.target_level,
            fall_duration: spawn.fall_duration,
            selected: false,
            position: spawn.coord.to_world(spawn.initial_level, self.hex_size),
        };

        let handle = self.tiles.insert(tile);

        if let Some(old) = self.by_coord.insert(spawn.coord, handle) {
            log::debug!("Replacing tile at {}", spawn.coord);
            self.tiles.remove(old);
        }

        handle
    }

    /// Despawns a tile, returning its last state.
    pub fn remove(&mut self, handle: TileHandle) -> Option<Tile> {
        let tile = self.tiles.remove(handle)?;

        if self.by_coord.get(&tile.coord) == Some(&handle) {
            self.by_coord.remove(&tile.coord);
        }

        Some(tile)
    }

    #[inline]
    pub fn get(&self, handle: TileHandle) -> Option<&Tile> {
        self.tiles.get(handle)
    }

    #[inline]
    pub fn get_mut(&mut self, handle: TileHandle) -> Option<&mut Tile> {
        self.tiles.get_mut(handle)
    }

    #[inline]
    pub fn contains(&self, handle: TileHandle) -> bool {
        self.tiles.contains_key(handle)
    }

    /// The tile occupying `coord`, if any.
    #[inline]
    pub fn at(&self, coord: HexCoord) -> Option<TileHandle> {
        self.by_coord.get(&coord).copied()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TileHandle, &Tile)> {
        self.tiles.iter()
    }
}
