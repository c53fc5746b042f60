use jamgrid_data::{
    coord::HexCoord,
    math::{Float, Vec3},
    tile::{TileHandle, TileMap},
};
use tokio::sync::oneshot::error::TryRecvError;

use crate::{
    completion::Completion,
    easing::ease_in_out_cubic,
    mover::{CancelFlag, MoveOptions, SharedVec3, SmoothMover},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionSettings {
    pub camera_move_duration: Float,
    pub highlight_move_duration: Float,
    /// Highlight intensity once it sits on the selected tile.
    pub highlight_intensity: Float,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            camera_move_duration: 0.5,
            highlight_move_duration: 0.1,
            highlight_intensity: 1.0,
        }
    }
}

/// Keeps track of the one selected tile, and moves the camera focus and the highlight to it.
#[derive(Debug)]
pub struct SelectionController {
    current: Option<TileHandle>,

    camera_target: SharedVec3,
    camera_cancel: Option<CancelFlag>,
    /// Where the camera focus was before a selection moved it.
    camera_rest: Option<Vec3>,

    highlight_position: SharedVec3,
    highlight_intensity: Float,
    highlight_coord: Option<HexCoord>,
    highlight_cancel: Option<CancelFlag>,
    highlight_arrival: Option<Completion>,

    settings: SelectionSettings,
}

impl SelectionController {
    pub fn new(camera_target: SharedVec3, highlight_position: SharedVec3, settings: SelectionSettings) -> Self {
        Self {
            current: None,

            camera_target,
            camera_cancel: None,
            camera_rest: None,

            highlight_position,
            highlight_intensity: 0.0,
            highlight_coord: None,
            highlight_cancel: None,
            highlight_arrival: None,

            settings,
        }
    }

    pub fn current(&self) -> Option<TileHandle> {
        self.current
    }

    pub fn camera_target(&self) -> &SharedVec3 {
        &self.camera_target
    }

    pub fn highlight_position(&self) -> &SharedVec3 {
        &self.highlight_position
    }

    pub fn highlight_intensity(&self) -> Float {
        self.highlight_intensity
    }

    /// The coordinate the highlight is on, or moving to.
    pub fn highlight_coord(&self) -> Option<HexCoord> {
        self.highlight_coord
    }
}

impl SelectionController {
    /// Selects a tile, or deselects it if it already is the selection.
    ///
    /// Deselecting this way sends the camera focus back to where it rested before the selection
    /// moved it. Returns whether the tile is selected afterwards.
    pub fn select(&mut self, tile: TileHandle, tiles: &mut TileMap, mover: &mut SmoothMover, move_camera: bool) -> bool {
        if self.current == Some(tile) {
            self.deselect_current(tiles);

            if let Some(rest) = self.camera_rest.take() {
                self.move_camera(rest, mover);
            }

            return false;
        }

        self.deselect_current(tiles);

        let hex_size = tiles.hex_size();
        let Some(selected) = tiles.get_mut(tile) else {
            return false;
        };
        selected.selected = true;
        self.current = Some(tile);

        log::debug!("Selected tile at {}", selected.coord);

        if move_camera {
            let to = selected.coord.to_world(self.camera_target.get().y, hex_size);

            if self.camera_rest.is_none() {
                self.camera_rest = Some(self.camera_target.get());
            }
            self.move_camera(to, mover);
        }

        true
    }

    fn move_camera(&mut self, to: Vec3, mover: &mut SmoothMover) {
        if let Some(previous) = self.camera_cancel.take() {
            previous.cancel();
        }
        let cancel = CancelFlag::new();

        let _ = mover.move_to(
            &self.camera_target,
            to,
            self.settings.camera_move_duration,
            MoveOptions::eased(ease_in_out_cubic).with_cancel(cancel.clone()),
        );
        self.camera_cancel = Some(cancel);
    }

    /// Clears the selection. A camera move still heading for the tile stops where it is,
    /// and the highlight goes dark right away.
    pub fn deselect_current(&mut self, tiles: &mut TileMap) {
        let Some(handle) = self.current.take() else {
            return;
        };

        if let Some(tile) = tiles.get_mut(handle) {
            tile.selected = false;
        }

        if let Some(camera) = self.camera_cancel.take() {
            camera.cancel();
        }

        if let Some(highlight) = self.highlight_cancel.take() {
            highlight.cancel();
        }
        self.highlight_arrival = None;
        self.highlight_coord = None;
        self.highlight_intensity = 0.0;
    }

    /// Moves the highlight after the selection.
    pub fn update(&mut self, tiles: &TileMap, mover: &mut SmoothMover) {
        if let Some(arrival) = &mut self.highlight_arrival {
            match arrival.try_recv() {
                Ok(()) => {
                    self.highlight_intensity = self.settings.highlight_intensity;
                    self.highlight_arrival = None;
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Closed) => self.highlight_arrival = None,
            }
        }

        let selected = self.current.and_then(|handle| tiles.get(handle));
        if selected.is_none() {
            self.current = None;
        }

        let coord = selected.map(|tile| tile.coord);
        if HexCoord::equals(coord, self.highlight_coord) {
            return;
        }
        self.highlight_coord = coord;

        if let Some(previous) = self.highlight_cancel.take() {
            previous.cancel();
        }
        self.highlight_arrival = None;

        match selected {
            Some(tile) => {
                let to = tile.coord.to_world(tile.target_level, tiles.hex_size());
                let cancel = CancelFlag::new();

                self.highlight_arrival = Some(mover.move_to(
                    &self.highlight_position,
                    to,
                    self.settings.highlight_move_duration,
                    MoveOptions::eased(ease_in_out_cubic).with_cancel(cancel.clone()),
                ));
                self.highlight_cancel = Some(cancel);
            }
            None => {
                self.highlight_intensity = 0.0;
            }
        }
    }
}
