use std::{cell::Cell, env, fs::File, rc::Rc};

use anyhow::Context;
use jamgrid_data::{
    coord::HexCoord,
    id::EntryId,
    math::{Float, Vec3},
    tile::{TileMap, TileSpawn},
};
use jamgrid_game::{
    fall::TileFallScheduler,
    mover::SmoothMover,
    occupancy::GridOccupancy,
    persistent::options::GridOptions,
    selection::SelectionController,
};

const FRAME_DT: Float = 1.0 / 60.0;
const MAX_FRAMES: u32 = 60 * 60 * 5;
const DEFAULT_ENTRY_COUNT: u32 = 37;
/// Rings around the origin treated as on screen, and reprioritized when spawning.
const VISIBLE_RINGS: u32 = 2;

struct Grid {
    tiles: TileMap,
    occupancy: GridOccupancy,
    scheduler: TileFallScheduler,
    mover: SmoothMover,
    selection: SelectionController,
}

impl Grid {
    fn new(options: &GridOptions) -> Self {
        let camera_target = Rc::new(Cell::new(Vec3::new(0.0, 100.0, 0.0)));
        let highlight_position = Rc::new(Cell::new(Vec3::zero()));

        Self {
            tiles: TileMap::new(options.hex_size),
            occupancy: GridOccupancy::new(options.free_coord_search_rings),
            scheduler: TileFallScheduler::new(options.tiles_per_second, options.default_fall_duration),
            mover: SmoothMover::new(),
            selection: SelectionController::new(camera_target, highlight_position, options.selection_settings()),
        }
    }

    fn tick(&mut self, dt: Float) {
        self.mover.update(dt);
        self.scheduler.update(dt, &mut self.tiles);
        self.selection.update(&self.tiles, &mut self.mover);
    }
}

fn main() -> anyhow::Result<()> {
    {
        let filter = "info";

        let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter));
        if let Ok(file) = env::var("LOG_FILE") {
            let file = Box::new(File::create(&file).with_context(|| format!("log file {file} needs to be created"))?);

            builder.target(env_logger::Target::Pipe(file));
        }
        builder.init();
    }

    let entry_count = env::args()
        .nth(1)
        .map(|arg| arg.parse::<u32>())
        .transpose()
        .context("the entry count has to be a number")?
        .unwrap_or(DEFAULT_ENTRY_COUNT);

    let options = GridOptions::load();
    let mut grid = Grid::new(&options);
    let mut rng = rand::rng();

    log::info!("Placing {entry_count} entries...");

    let mut completions = Vec::new();
    for id in (0..entry_count).map(EntryId) {
        let coord = grid.occupancy.next_free_coord(&mut rng)?;
        grid.occupancy.place(coord, id);

        let tile = grid.tiles.spawn_tile(TileSpawn::new(coord, options.spawn_height, 0.0));
        completions.push(grid.scheduler.spawn(tile, false));
    }

    let visible = HexCoord::ORIGIN
        .spiral_around(0, Some(VISIBLE_RINGS))
        .filter_map(|coord| grid.tiles.at(coord))
        .collect::<Vec<_>>();
    completions.extend(grid.scheduler.spawn_batch(&visible, true).into_iter().map(|(_, completion)| completion));

    let mut frames = 0;
    while !grid.scheduler.is_idle() {
        grid.tick(FRAME_DT);
        frames += 1;

        if frames > MAX_FRAMES {
            anyhow::bail!("Tiles were still falling after {MAX_FRAMES} frames");
        }
    }

    let fired = completions.iter_mut().filter_map(|completion| completion.try_recv().ok()).count();
    log::info!(
        "All {} tiles landed after {:.2}s, {fired}/{} completions fired",
        grid.tiles.len(),
        frames as Float * FRAME_DT,
        completions.len()
    );

    if let Some(coord) = grid.occupancy.coord_of(EntryId(0))
        && let Some(tile) = grid.tiles.at(coord)
    {
        grid.selection.select(tile, &mut grid.tiles, &mut grid.mover, true);

        while !grid.mover.is_empty() {
            grid.tick(FRAME_DT);
        }
        // one more tick to observe the highlight arriving
        grid.tick(FRAME_DT);

        log::info!(
            "Selected {} at {coord}, camera at {:?}, highlight at {:?} with intensity {}",
            EntryId(0),
            grid.selection.camera_target().get(),
            grid.selection.highlight_position().get(),
            grid.selection.highlight_intensity(),
        );
    }

    Ok(())
}
