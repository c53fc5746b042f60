use hashbrown::HashMap;
use jamgrid_data::{
    coord::{HexCoord, UnsignedTileUnit},
    id::EntryId,
};
use rand::Rng;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GridError {
    #[error("No free coordinate left within {rings} rings of the origin. The grid is full.")]
    Full { rings: UnsignedTileUnit },
}

/// Which entry sits on which coordinate, keyed by the canonical `"q:r"` string.
#[derive(Debug, Clone)]
pub struct GridOccupancy {
    entry_by_key: HashMap<String, EntryId>,
    key_by_entry: HashMap<EntryId, String>,
    search_rings: UnsignedTileUnit,
}

impl GridOccupancy {
    /// `search_rings` bounds how far [`Self::next_free_coord`] looks.
    pub fn new(search_rings: UnsignedTileUnit) -> Self {
        Self {
            entry_by_key: HashMap::new(),
            key_by_entry: HashMap::new(),
            search_rings,
        }
    }

    fn insert_key(&mut self, key: String, entry: EntryId) -> Option<EntryId> {
        if let Some(old_key) = self.key_by_entry.remove(&entry)
            && old_key != key
        {
            self.entry_by_key.remove(&old_key);
        }

        let previous = self.entry_by_key.insert(key.clone(), entry);
        if let Some(previous) = previous
            && previous != entry
        {
            self.key_by_entry.remove(&previous);
        }

        self.key_by_entry.insert(entry, key);

        previous.filter(|previous| *previous != entry)
    }

    /// Puts `entry` on `coord`, moving it if it was placed elsewhere.
    /// Returns the entry that was displaced from `coord`.
    pub fn place(&mut self, coord: HexCoord, entry: EntryId) -> Option<EntryId> {
        self.insert_key(coord.to_key(), entry)
    }

    pub fn clear_at(&mut self, coord: HexCoord) -> Option<EntryId> {
        let entry = self.entry_by_key.remove(&coord.to_key())?;
        self.key_by_entry.remove(&entry);

        Some(entry)
    }

    /// Replaces everything with a snapshot from the backend.
    ///
    /// Returns the placements that were not known before.
    pub fn replace_all(&mut self, snapshot: impl IntoIterator<Item = (String, EntryId)>) -> Vec<(String, EntryId)> {
        let old = std::mem::take(&mut self.entry_by_key);
        self.key_by_entry.clear();

        let mut added = Vec::new();
        for (key, entry) in snapshot {
            if old.get(&key) != Some(&entry) {
                added.push((key.clone(), entry));
            }

            self.insert_key(key, entry);
        }

        log::debug!("Grid now has {} placed entries, {} new", self.len(), added.len());

        added
    }

    #[inline]
    pub fn entry_at(&self, coord: HexCoord) -> Option<EntryId> {
        self.entry_by_key.get(&coord.to_key()).copied()
    }

    #[inline]
    pub fn is_placed(&self, entry: EntryId) -> bool {
        self.key_by_entry.contains_key(&entry)
    }

    /// The coordinate `entry` is placed on.
    pub fn coord_of(&self, entry: EntryId) -> Option<HexCoord> {
        let key = self.key_by_entry.get(&entry)?;

        HexCoord::from_key(key)
            .inspect_err(|err| log::warn!("Placement of {entry} has an unusable key: {err}"))
            .ok()
    }

    pub fn len(&self) -> usize {
        self.entry_by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entry_by_key.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, EntryId)> {
        self.entry_by_key.iter().map(|(key, entry)| (key.as_str(), *entry))
    }

    /// Finds an unoccupied coordinate, ring by ring from the origin, in random order within each ring.
    pub fn next_free_coord<R: Rng>(&self, rng: R) -> Result<HexCoord, GridError> {
        HexCoord::ORIGIN
            .shuffled_rings_around(0, Some(self.search_rings), rng)
            .find(|coord| !self.entry_by_key.contains_key(&coord.to_key()))
            .ok_or(GridError::Full {
                rings: self.search_rings,
            })
    }
}
