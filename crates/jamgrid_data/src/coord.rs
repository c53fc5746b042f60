use core::{
    fmt::{Display, Formatter},
    num::ParseIntError,
    str::FromStr,
};
use std::ops::{Add, Mul, Neg, Sub};

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::{Float, Int, UInt, Vec3};

/// The type that will be used to represent a tile's coordinates.
pub type TileUnit = Int;
pub type UnsignedTileUnit = UInt;

/// Row-major `(q, r) -> (x, z)` transform, before scaling by the hex size.
const CUBE_TO_WORLD: [Float; 4] = [
    1.0, 1.0 / 2.0, //
    0.0, 3.0 / 4.0,
];
/// Inverse of [`CUBE_TO_WORLD`].
const WORLD_TO_CUBE: [Float; 4] = [
    1.0, -2.0 / 3.0, //
    0.0, 4.0 / 3.0,
];

const KEY_DELIM: char = ':';

#[derive(Debug, Error)]
pub enum CoordKeyError {
    #[error("Coordinate key {0:?} is not in the format 'q:r'.")]
    Malformed(String),
    #[error("Coordinate key {key:?} has an invalid axis: {source}")]
    InvalidAxis {
        key: String,
        #[source]
        source: ParseIntError,
    },
}

/// A cube coordinate on the hex grid. Only `q` and `r` are stored, `s` is always `-q - r`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HexCoord {
    pub q: TileUnit,
    pub r: TileUnit,
}

impl HexCoord {
    /// Creates a new coordinate `(q, r)`, deriving `s`.
    #[inline]
    #[must_use]
    pub const fn new(q: TileUnit, r: TileUnit) -> Self {
        Self { q, r }
    }

    #[inline]
    #[must_use]
    pub const fn s(self) -> TileUnit {
        -self.q - self.r
    }

    pub const ORIGIN: Self = Self::new(0, 0);

    pub const NORTH_EAST: Self = Self::new(0, 1);
    pub const EAST: Self = Self::new(1, 0);
    pub const SOUTH_EAST: Self = Self::new(1, -1);
    pub const SOUTH_WEST: Self = Self::new(0, -1);
    pub const WEST: Self = Self::new(-1, 0);
    pub const NORTH_WEST: Self = Self::new(-1, 1);

    /// The unit directions, in the order a ring is walked.
    pub const DIRECTIONS: [Self; 6] = [
        Self::NORTH_EAST,
        Self::EAST,
        Self::SOUTH_EAST,
        Self::SOUTH_WEST,
        Self::WEST,
        Self::NORTH_WEST,
    ];
}

impl HexCoord {
    #[inline]
    #[must_use]
    pub const fn plus(self, rhs: Self) -> Self {
        Self::new(self.q + rhs.q, self.r + rhs.r)
    }

    #[inline]
    #[must_use]
    pub const fn minus(self, rhs: Self) -> Self {
        Self::new(self.q - rhs.q, self.r - rhs.r)
    }

    #[inline]
    #[must_use]
    pub const fn times(self, rhs: TileUnit) -> Self {
        Self::new(self.q * rhs, self.r * rhs)
    }

    #[inline]
    #[must_use]
    pub const fn neg(self) -> Self {
        Self::new(-self.q, -self.r)
    }

    /// Creates a list of the neighbors, in [`Self::DIRECTIONS`] order.
    #[inline]
    #[must_use]
    pub const fn neighbors(self) -> [Self; 6] {
        [
            self.plus(Self::DIRECTIONS[0]),
            self.plus(Self::DIRECTIONS[1]),
            self.plus(Self::DIRECTIONS[2]),
            self.plus(Self::DIRECTIONS[3]),
            self.plus(Self::DIRECTIONS[4]),
            self.plus(Self::DIRECTIONS[5]),
        ]
    }

    /// Hex distance from the origin.
    #[inline]
    #[must_use]
    pub const fn length(self) -> UnsignedTileUnit {
        (self.q.unsigned_abs() + self.r.unsigned_abs() + self.s().unsigned_abs()) / 2
    }

    #[inline]
    #[must_use]
    pub const fn distance(self, other: Self) -> UnsignedTileUnit {
        self.minus(other).length()
    }

    /// Null-safe equality. Two missing coordinates are equal, a missing one never equals a present one.
    #[inline]
    #[must_use]
    pub fn equals(a: Option<Self>, b: Option<Self>) -> bool {
        a == b
    }

    /// Converts to a world position at elevation `y`. `hex_size` is the footprint of one tile,
    /// only its `x` and `z` are used.
    #[inline]
    #[must_use]
    pub fn to_world(self, y: Float, hex_size: Vec3) -> Vec3 {
        let [q, r] = [self.q as Float, self.r as Float];

        Vec3::new(
            (CUBE_TO_WORLD[0] * q + CUBE_TO_WORLD[1] * r) * hex_size.x,
            y,
            (CUBE_TO_WORLD[2] * q + CUBE_TO_WORLD[3] * r) * hex_size.z,
        )
    }

    /// Finds the coordinate nearest to a world position. The elevation is ignored.
    #[inline]
    #[must_use]
    pub fn from_world(point: Vec3, hex_size: Vec3) -> Self {
        let [x, z] = [point.x / hex_size.x, point.z / hex_size.z];

        Self::new(
            (WORLD_TO_CUBE[0] * x + WORLD_TO_CUBE[1] * z).round() as TileUnit,
            (WORLD_TO_CUBE[2] * x + WORLD_TO_CUBE[3] * z).round() as TileUnit,
        )
    }

    /// The canonical `"q:r"` key used by grid occupancy lookups.
    #[inline]
    #[must_use]
    pub fn to_key(self) -> String {
        format!("{}{KEY_DELIM}{}", self.q, self.r)
    }

    pub fn from_key(key: &str) -> Result<Self, CoordKeyError> {
        let Some((q, r)) = key.split_once(KEY_DELIM) else {
            return Err(CoordKeyError::Malformed(key.to_string()));
        };

        let parse = |axis: &str| {
            axis.trim().parse::<TileUnit>().map_err(|source| CoordKeyError::InvalidAxis {
                key: key.to_string(),
                source,
            })
        };

        Ok(Self::new(parse(q)?, parse(r)?))
    }
}

impl HexCoord {
    /// Iterates the `6 * radius` coordinates at exactly `radius` steps from `self`.
    /// A radius of 0 yields `self` only, and one above [`TileUnit::MAX`] yields nothing.
    #[inline]
    #[must_use]
    pub fn ring_around(self, radius: UnsignedTileUnit) -> Ring {
        Ring::new(self, radius)
    }

    /// Iterates rings outward, starting with `start_ring`. `None` for `max_rings` never ends.
    #[inline]
    #[must_use]
    pub fn spiral_around(self, start_ring: UnsignedTileUnit, max_rings: Option<UnsignedTileUnit>) -> Spiral {
        Spiral {
            center: self,
            next_ring: start_ring,
            rings_left: max_rings,
            current: Ring::empty(),
        }
    }

    /// Same coordinates as [`Self::ring_around`], in random order.
    pub fn shuffled_ring_around<R: Rng + ?Sized>(self, radius: UnsignedTileUnit, rng: &mut R) -> std::vec::IntoIter<HexCoord> {
        let mut coords = self.ring_around(radius).collect::<Vec<_>>();
        coords.shuffle(rng);

        coords.into_iter()
    }

    /// Same as [`Self::spiral_around`], but every ring is shuffled on its own as it is reached.
    #[inline]
    #[must_use]
    pub fn shuffled_rings_around<R: Rng>(
        self,
        start_ring: UnsignedTileUnit,
        max_rings: Option<UnsignedTileUnit>,
        rng: R,
    ) -> ShuffledSpiral<R> {
        ShuffledSpiral {
            center: self,
            next_ring: start_ring,
            rings_left: max_rings,
            current: Vec::new().into_iter(),
            rng,
        }
    }
}

impl Display for HexCoord {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("[{}, {}, {}]", self.q, self.r, self.s()))
    }
}

impl FromStr for HexCoord {
    type Err = CoordKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s)
    }
}

impl Add for HexCoord {
    type Output = HexCoord;

    fn add(self, rhs: HexCoord) -> Self::Output {
        self.plus(rhs)
    }
}

impl Sub for HexCoord {
    type Output = HexCoord;

    fn sub(self, rhs: HexCoord) -> Self::Output {
        self.minus(rhs)
    }
}

impl Mul<TileUnit> for HexCoord {
    type Output = HexCoord;

    fn mul(self, rhs: TileUnit) -> Self::Output {
        self.times(rhs)
    }
}

impl Mul<HexCoord> for TileUnit {
    type Output = HexCoord;

    fn mul(self, rhs: HexCoord) -> Self::Output {
        rhs.times(self)
    }
}

impl Neg for HexCoord {
    type Output = HexCoord;

    fn neg(self) -> Self::Output {
        self.neg()
    }
}

/// See [`HexCoord::ring_around`].
#[derive(Debug, Clone)]
pub struct Ring {
    cursor: HexCoord,
    radius: usize,
    step: usize,
    remaining: usize,
}

impl Ring {
    /// Radii that don't fit a [`TileUnit`] have no coordinates and give an empty ring.
    fn new(center: HexCoord, radius: UnsignedTileUnit) -> Self {
        let Ok(signed) = TileUnit::try_from(radius) else {
            log::warn!("Ring radius {radius} is out of range, the ring is empty");
            return Self::empty();
        };

        let cursor = center + HexCoord::WEST * signed;
        let radius = radius as usize;

        Self {
            cursor,
            radius,
            step: 0,
            remaining: if radius == 0 { 1 } else { radius * 6 },
        }
    }

    fn empty() -> Self {
        Self {
            cursor: HexCoord::ORIGIN,
            radius: 0,
            step: 0,
            remaining: 0,
        }
    }
}

impl Iterator for Ring {
    type Item = HexCoord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let result = self.cursor;
        self.remaining -= 1;

        if self.radius > 0 {
            self.cursor = self.cursor + HexCoord::DIRECTIONS[self.step / self.radius];
            self.step += 1;
        }

        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Ring {}

/// See [`HexCoord::spiral_around`].
#[derive(Debug, Clone)]
pub struct Spiral {
    center: HexCoord,
    next_ring: UnsignedTileUnit,
    rings_left: Option<UnsignedTileUnit>,
    current: Ring,
}

impl Iterator for Spiral {
    type Item = HexCoord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(coord) = self.current.next() {
                return Some(coord);
            }

            match &mut self.rings_left {
                Some(0) => return None,
                Some(left) => *left -= 1,
                None => {}
            }

            self.current = self.center.ring_around(self.next_ring);
            self.next_ring += 1;
        }
    }
}

/// See [`HexCoord::shuffled_rings_around`].
#[derive(Debug, Clone)]
pub struct ShuffledSpiral<R> {
    center: HexCoord,
    next_ring: UnsignedTileUnit,
    rings_left: Option<UnsignedTileUnit>,
    current: std::vec::IntoIter<HexCoord>,
    rng: R,
}

impl<R: Rng> Iterator for ShuffledSpiral<R> {
    type Item = HexCoord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(coord) = self.current.next() {
                return Some(coord);
            }

            match &mut self.rings_left {
                Some(0) => return None,
                Some(left) => *left -= 1,
                None => {}
            }

            self.current = self.center.shuffled_ring_around(self.next_ring, &mut self.rng);
            self.next_ring += 1;
        }
    }
}
