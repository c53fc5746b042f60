use core::fmt::{Debug, Formatter};
use std::{cell::Cell, rc::Rc};

use hashbrown::HashMap;
use jamgrid_data::math::{Float, Vec3, lerp};

use crate::{
    completion::{Completer, Completion},
    easing::{self, Easing},
};

/// A vector owned by the caller that movements write into every tick.
pub type SharedVec3 = Rc<Cell<Vec3>>;

pub type TickCallback = Box<dyn FnMut(Float)>;

/// Cooperative cancellation for a movement. Checked once per tick; cancelling never fires the
/// movement's [`Completion`].
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Rc<Cell<bool>>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

#[derive(Default)]
pub struct MoveOptions {
    /// Defaults to [`easing::linear`].
    pub easing: Option<Easing>,
    /// Called with the tick's `dt` after the vector was written.
    pub on_tick: Option<TickCallback>,
    pub cancel: Option<CancelFlag>,
}

impl MoveOptions {
    pub fn eased(easing: Easing) -> Self {
        Self {
            easing: Some(easing),
            ..Default::default()
        }
    }

    pub fn with_on_tick(mut self, on_tick: impl FnMut(Float) + 'static) -> Self {
        self.on_tick = Some(Box::new(on_tick));
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MovementId(u64);

struct Movement {
    target: SharedVec3,
    from: Vec3,
    to: Vec3,
    duration: Float,
    elapsed: Float,
    easing: Easing,
    on_tick: Option<TickCallback>,
    cancel: Option<CancelFlag>,
    completer: Option<Completer>,
}

impl Debug for Movement {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Movement")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("duration", &self.duration)
            .field("elapsed", &self.elapsed)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

/// Interpolates shared vectors toward targets over time. Any number of movements run side by side.
#[derive(Debug, Default)]
pub struct SmoothMover {
    movements: HashMap<MovementId, Movement>,
    next_id: u64,
}

impl SmoothMover {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts moving `vector` from its current value to `to` over `duration` seconds.
    ///
    /// The [`Completion`] fires once the movement has written `to`. It never fires if the movement
    /// gets cancelled.
    pub fn move_to(&mut self, vector: &SharedVec3, to: Vec3, duration: Float, options: MoveOptions) -> Completion {
        let id = MovementId(self.next_id);
        self.next_id += 1;

        let (completer, completion) = Completer::new();

        self.movements.insert(
            id,
            Movement {
                target: vector.clone(),
                from: vector.get(),
                to,
                duration,
                elapsed: 0.0,
                easing: options.easing.unwrap_or(easing::linear),
                on_tick: options.on_tick,
                cancel: options.cancel,
                completer: Some(completer),
            },
        );

        completion
    }

    pub fn update(&mut self, dt: Float) {
        self.movements.retain(|id, movement| {
            if movement.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
                log::trace!("{id:?} was cancelled");
                return false;
            }

            movement.elapsed = (movement.elapsed + dt).min(movement.duration);
            let t = if movement.duration > 0.0 {
                movement.elapsed / movement.duration
            } else {
                1.0
            };

            let (from, to, ease) = (movement.from, movement.to, movement.easing);
            if t >= 1.0 {
                movement.target.set(to);
            } else {
                let t = ease(t);
                movement.target.set(Vec3::new(lerp(from.x, to.x, t), lerp(from.y, to.y, t), lerp(from.z, to.z, t)));
            }

            if let Some(on_tick) = &mut movement.on_tick {
                on_tick(dt);
            }

            if movement.elapsed >= movement.duration {
                if let Some(completer) = movement.completer.take() {
                    completer.complete();
                }

                return false;
            }

            true
        });
    }

    /// Number of movements still running.
    pub fn len(&self) -> usize {
        self.movements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movements.is_empty()
    }
}
