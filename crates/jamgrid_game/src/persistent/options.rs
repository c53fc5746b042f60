use std::{
    fs::{File, read_to_string},
    io::Write,
    path::Path,
};

use jamgrid_data::{
    coord::UnsignedTileUnit,
    math::{Float, Vec3},
};
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};

use crate::{persistent, selection::SelectionSettings};

pub static OPTIONS_PATH: &str = "grid_options.ron";

/// Tunables of the grid, its animations and its placement search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    /// How many queued tiles may start falling per second.
    pub tiles_per_second: Float,
    /// Fall duration of tiles that don't override it.
    pub default_fall_duration: Float,
    /// Height new tiles fall from.
    pub spawn_height: Float,
    /// World footprint of one tile. `y` is unused.
    pub hex_size: Vec3,

    pub camera_move_duration: Float,
    pub highlight_move_duration: Float,
    pub highlight_intensity: Float,

    /// How many rings around the origin are searched for a free coordinate.
    pub free_coord_search_rings: UnsignedTileUnit,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            tiles_per_second: 10.0,
            default_fall_duration: 2.0,
            spawn_height: 10.0,
            hex_size: Vec3::new(1.0, 0.0, 1.0),

            camera_move_duration: 0.5,
            highlight_move_duration: 0.1,
            highlight_intensity: 1.0,

            free_coord_search_rings: 10,
        }
    }
}

impl GridOptions {
    pub fn load() -> Self {
        Self::load_from(Path::new(OPTIONS_PATH))
    }

    /// Reads the options at `path`, falling back to the defaults if they're missing or broken,
    /// then writes them back so the file always exists and is complete.
    pub fn load_from(path: &Path) -> Self {
        log::info!("Loading grid options...");

        let file = read_to_string(path).unwrap_or_default();

        let mut this: GridOptions = persistent::ron::ron_options()
            .from_str(&file)
            .inspect_err(|err| log::warn!("Error parsing grid options! A fresh one will be created. Error: {err}"))
            .unwrap_or_default();

        this.sanitize();

        if let Err(err) = this.save_to(path) {
            log::error!("Error saving grid options! {err}");
        }

        this
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(Path::new(OPTIONS_PATH))
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        let mut file = File::create(path)?;

        log::info!("Serializing grid options...");
        log::debug!("\n{self:?}");

        let document = persistent::ron::ron_options()
            .to_string_pretty(&self, PrettyConfig::default())
            .inspect_err(|err| log::warn!("Error writing grid options! Error: {err}"))?;

        log::info!("Saving grid options...");

        write!(&mut file, "{document}")?;

        log::info!("Saved grid options!");

        Ok(())
    }

    /// Resets values the components can't work with.
    fn sanitize(&mut self) {
        let default = Self::default();

        if self.tiles_per_second <= 0.0 {
            log::warn!("tiles_per_second must be positive, was {}. Resetting.", self.tiles_per_second);
            self.tiles_per_second = default.tiles_per_second;
        }

        if self.hex_size.x == 0.0 || self.hex_size.z == 0.0 {
            log::warn!("hex_size can't be zero on x or z, was {:?}. Resetting.", self.hex_size);
            self.hex_size = default.hex_size;
        }
    }

    pub fn selection_settings(&self) -> SelectionSettings {
        SelectionSettings {
            camera_move_duration: self.camera_move_duration,
            highlight_move_duration: self.highlight_move_duration,
            highlight_intensity: self.highlight_intensity,
        }
    }
}
