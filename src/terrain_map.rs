//! Terrain classification grid
//!
//! The single hand-off artifact between pipeline stages. Each cell holds one
//! of the reserved classes below, or a positive plateau id. Stages write in a
//! fixed order and later writes win, except that `BASALT` is never replaced.

use crate::tilemap::Tilemap;

pub const EMPTY: i16 = 0;
pub const BASALT: i16 = -1;
pub const LAVA: i16 = -2;
pub const VOID: i16 = -3;

/// Raw classification grid
pub type TerrainMap = Tilemap<i16>;

/// Decoded view of a classification cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TerrainClass {
    Empty,
    Basalt,
    Lava,
    Void,
    /// 1-based plateau id
    Plateau(u16),
}

impl TerrainClass {
    /// Decode a raw cell. Unknown negative values read as `Empty`.
    pub fn from_raw(raw: i16) -> Self {
        match raw {
            BASALT => TerrainClass::Basalt,
            LAVA => TerrainClass::Lava,
            VOID => TerrainClass::Void,
            id if id > 0 => TerrainClass::Plateau(id as u16),
            _ => TerrainClass::Empty,
        }
    }

    pub fn to_raw(self) -> i16 {
        match self {
            TerrainClass::Empty => EMPTY,
            TerrainClass::Basalt => BASALT,
            TerrainClass::Lava => LAVA,
            TerrainClass::Void => VOID,
            TerrainClass::Plateau(id) => id.min(i16::MAX as u16) as i16,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TerrainClass::Empty => "Empty",
            TerrainClass::Basalt => "Basalt",
            TerrainClass::Lava => "Lava",
            TerrainClass::Void => "Void",
            TerrainClass::Plateau(_) => "Plateau",
        }
    }
}

impl Tilemap<i16> {
    /// Write `class` unless the cell is already basalt. Returns whether it wrote.
    #[inline]
    pub fn stamp(&mut self, idx: usize, class: i16) -> bool {
        if *self.at(idx) == BASALT {
            return false;
        }
        self.set_at(idx, class);
        true
    }

    /// Per-class cell counts: (empty, basalt, lava, void, plateau)
    pub fn class_counts(&self) -> ClassCounts {
        let mut counts = ClassCounts::default();
        for &raw in self.as_slice() {
            match TerrainClass::from_raw(raw) {
                TerrainClass::Empty => counts.empty += 1,
                TerrainClass::Basalt => counts.basalt += 1,
                TerrainClass::Lava => counts.lava += 1,
                TerrainClass::Void => counts.void += 1,
                TerrainClass::Plateau(_) => counts.plateau += 1,
            }
        }
        counts
    }
}

/// Cell totals per class
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClassCounts {
    pub empty: usize,
    pub basalt: usize,
    pub lava: usize,
    pub void: usize,
    pub plateau: usize,
}
