use approx::assert_abs_diff_eq;
use jamgrid_data::{
    coord::HexCoord,
    math::Vec3,
    tile::{TileHandle, TileMap, TileSpawn},
};
use jamgrid_game::fall::{TileFallScheduler, TileFallState, initial_speed};
use tokio::sync::oneshot::error::TryRecvError;

fn tile_map() -> TileMap {
    TileMap::new(Vec3::new(1.0, 0.0, 1.0))
}

fn spawn_slow(tiles: &mut TileMap, coord: HexCoord) -> TileHandle {
    tiles.spawn_tile(TileSpawn::new(coord, 10.0, 0.0).with_fall_duration(30.0))
}

#[track_caller]
fn tick_until_falling(scheduler: &mut TileFallScheduler, tiles: &mut TileMap, tile: TileHandle) {
    for _ in 0..100 {
        if scheduler.state(tile) == TileFallState::Falling {
            return;
        }
        scheduler.update(0.05, tiles);
    }

    panic!("tile never started falling");
}

#[test]
fn test_initial_speed_lands_on_time() {
    assert_abs_diff_eq!(initial_speed(10.0, 2.0), -5.0);

    // closed form of the integration: h - (v0 * t + g * t^2 / 2) == 0 at t == d
    let (h, d) = (7.0, 1.5);
    let v0 = initial_speed(h, d);
    assert_abs_diff_eq!(h - (v0 * d + 10.0 * d * d / 2.0), 0.0, epsilon = 1e-4);
}

#[test]
fn test_single_tile_is_dequeued_exactly_once() {
    let mut tiles = tile_map();
    let mut scheduler = TileFallScheduler::new(10.0, 2.0);

    let tile = spawn_slow(&mut tiles, HexCoord::ORIGIN);
    let _completion = scheduler.spawn(tile, false);
    assert_eq!(scheduler.state(tile), TileFallState::Queued);

    let mut releases = 0;
    let mut previous = scheduler.state(tile);
    for _ in 0..10 {
        scheduler.update(0.05, &mut tiles);

        let state = scheduler.state(tile);
        if previous == TileFallState::Queued && state == TileFallState::Falling {
            releases += 1;
        }
        previous = state;
    }

    assert_eq!(releases, 1);
    assert_eq!(scheduler.queued_len(), 0);
    assert_eq!(scheduler.falling_len(), 1);
}

#[test]
fn test_tile_lands_on_target() {
    let mut tiles = tile_map();
    let mut scheduler = TileFallScheduler::new(10.0, 5.0);

    let tile = tiles.spawn_tile(TileSpawn::new(HexCoord::new(2, -1), 10.0, 0.0).with_fall_duration(2.0));
    let mut completion = scheduler.spawn(tile, false);

    let mut ticks = 0;
    while completion.try_recv() == Err(TryRecvError::Empty) {
        scheduler.update(0.01, &mut tiles);
        ticks += 1;

        assert!(ticks < 1000, "tile never landed");
    }

    // ~0.1s waiting in the queue, then ~2s of falling
    assert!((200..230).contains(&ticks), "took {ticks} ticks");
    assert_abs_diff_eq!(tiles.get(tile).unwrap().position.y, 0.0, epsilon = 0.02);
    assert_eq!(scheduler.state(tile), TileFallState::Settled);
    assert!(scheduler.is_idle());
}

#[test]
fn test_tile_lands_on_raised_target() {
    let mut tiles = tile_map();
    let mut scheduler = TileFallScheduler::new(10.0, 1.0);

    let tile = tiles.spawn_tile(TileSpawn::new(HexCoord::ORIGIN, 6.0, 1.5));
    let mut completion = scheduler.spawn(tile, true);

    for _ in 0..500 {
        scheduler.update(0.01, &mut tiles);
    }

    assert_eq!(completion.try_recv(), Ok(()));
    assert_abs_diff_eq!(tiles.get(tile).unwrap().position.y, 1.5);
}

#[test]
fn test_spawn_batch_skips_falling_and_moves_queued_to_front() {
    let mut tiles = tile_map();
    let mut scheduler = TileFallScheduler::new(10.0, 2.0);

    let a = spawn_slow(&mut tiles, HexCoord::new(0, 0));
    let c = spawn_slow(&mut tiles, HexCoord::new(1, 0));
    let b = spawn_slow(&mut tiles, HexCoord::new(2, 0));

    let _ = scheduler.spawn(a, false);
    let _ = scheduler.spawn(c, false);
    let _ = scheduler.spawn(b, false);

    tick_until_falling(&mut scheduler, &mut tiles, a);
    assert_eq!(scheduler.queued().collect::<Vec<_>>(), vec![c, b]);

    let falling_before = *scheduler.falling_state(a).unwrap();
    let position_before = tiles.get(a).unwrap().position;

    let requeued = scheduler.spawn_batch(&[a, b], true);

    assert_eq!(requeued.iter().map(|(tile, _)| *tile).collect::<Vec<_>>(), vec![b]);
    assert_eq!(scheduler.queued().collect::<Vec<_>>(), vec![b, c]);
    assert_eq!(scheduler.state(a), TileFallState::Falling);
    assert_eq!(*scheduler.falling_state(a).unwrap(), falling_before);
    assert_eq!(tiles.get(a).unwrap().position, position_before);
}

#[test]
fn test_spawn_batch_keeps_input_order() {
    let mut tiles = tile_map();
    let mut scheduler = TileFallScheduler::new(10.0, 2.0);

    let [x, y, z, w] = [0, 1, 2, 3].map(|q| spawn_slow(&mut tiles, HexCoord::new(q, 0)));
    for tile in [x, y, z] {
        let _ = scheduler.spawn(tile, false);
    }

    let _ = scheduler.spawn_batch(&[z, w, y], true);
    assert_eq!(scheduler.queued().collect::<Vec<_>>(), vec![z, w, y, x]);

    let _ = scheduler.spawn_batch(&[z, x], false);
    assert_eq!(scheduler.queued().collect::<Vec<_>>(), vec![w, y, z, x]);
}

#[test]
fn test_spawn_batch_keeps_earlier_completions() {
    let mut tiles = tile_map();
    let mut scheduler = TileFallScheduler::new(100.0, 2.0);

    let tile = tiles.spawn_tile(TileSpawn::new(HexCoord::ORIGIN, 1.0, 0.0).with_fall_duration(0.2));
    let mut first = scheduler.spawn(tile, false);
    let mut requeued = scheduler.spawn_batch(&[tile], true);
    assert_eq!(requeued.len(), 1);
    assert_eq!(scheduler.queued_len(), 1);

    for _ in 0..100 {
        scheduler.update(0.01, &mut tiles);
    }

    assert_eq!(first.try_recv(), Ok(()));
    assert_eq!(requeued[0].1.try_recv(), Ok(()));
}

#[test]
fn test_remove() {
    let mut tiles = tile_map();
    let mut scheduler = TileFallScheduler::new(10.0, 2.0);

    let falling = spawn_slow(&mut tiles, HexCoord::new(0, 0));
    let queued = spawn_slow(&mut tiles, HexCoord::new(0, 1));
    let unknown = spawn_slow(&mut tiles, HexCoord::new(0, 2));

    let _ = scheduler.spawn(falling, false);
    let mut removed_completion = scheduler.spawn(queued, false);
    tick_until_falling(&mut scheduler, &mut tiles, falling);

    assert!(!scheduler.remove(falling));
    assert!(!scheduler.remove(unknown));
    assert!(scheduler.remove(queued));
    assert!(!scheduler.remove(queued));

    assert_eq!(scheduler.state(falling), TileFallState::Falling);
    assert_eq!(scheduler.state(queued), TileFallState::Settled);
    assert_eq!(removed_completion.try_recv(), Err(TryRecvError::Closed));
}

#[test]
fn test_vanished_tiles_still_complete() {
    let mut tiles = tile_map();
    let mut scheduler = TileFallScheduler::new(10.0, 2.0);

    let falling = spawn_slow(&mut tiles, HexCoord::new(0, 0));
    let queued = spawn_slow(&mut tiles, HexCoord::new(3, 3));

    let mut falling_completion = scheduler.spawn(falling, false);
    let mut queued_completion = scheduler.spawn(queued, false);
    tick_until_falling(&mut scheduler, &mut tiles, falling);

    tiles.remove(falling);
    tiles.remove(queued);

    scheduler.update(0.05, &mut tiles);
    assert_eq!(falling_completion.try_recv(), Ok(()));
    assert_eq!(scheduler.state(falling), TileFallState::Settled);

    for _ in 0..5 {
        scheduler.update(0.05, &mut tiles);
    }
    assert_eq!(queued_completion.try_recv(), Ok(()));
    assert!(scheduler.is_idle());
}

#[test]
fn test_one_release_per_tick() {
    let mut tiles = tile_map();
    let mut scheduler = TileFallScheduler::new(10.0, 2.0);

    let handles = (0..8).map(|q| spawn_slow(&mut tiles, HexCoord::new(q, -q))).collect::<Vec<_>>();
    for &tile in &handles {
        let _ = scheduler.spawn(tile, false);
    }

    let mut falling = 0;
    for _ in 0..20 {
        // a lag spike must not release the backlog all at once
        scheduler.update(1.0, &mut tiles);

        assert!(scheduler.falling_len() <= falling + 1);
        falling = scheduler.falling_len();
        assert_eq!(scheduler.falling_len() + scheduler.queued_len(), handles.len());
    }

    assert_eq!(scheduler.queued_len(), 0);
    assert!(handles.iter().all(|&tile| scheduler.state(tile) == TileFallState::Falling));
}
