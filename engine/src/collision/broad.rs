use std::{collections::HashMap, sync::Arc};

use super::{
    descriptor::{Category, CollisionDescriptor},
    settings::CollisionConfig,
};
use crate::cell::{GridCell, Portion, PortionKey};

/// Descriptors registered in one grid cell, by category.
#[derive(Clone, Debug, Default)]
pub struct CellEntries {
    lands: Vec<Arc<CollisionDescriptor>>,
    sprites: Vec<Arc<CollisionDescriptor>>,
    mountains: Vec<Arc<CollisionDescriptor>>,
    objects: Vec<Arc<CollisionDescriptor>>,
}

impl CellEntries {
    #[inline]
    pub fn list(&self, category: Category) -> &[Arc<CollisionDescriptor>] {
        match category {
            Category::Land => &self.lands,
            Category::Sprite => &self.sprites,
            Category::Mountain => &self.mountains,
            Category::Object3D => &self.objects,
        }
    }

    fn push(&mut self, descriptor: Arc<CollisionDescriptor>) {
        match descriptor.category() {
            Category::Land => self.lands.push(descriptor),
            Category::Sprite => self.sprites.push(descriptor),
            Category::Mountain => self.mountains.push(descriptor),
            Category::Object3D => self.objects.push(descriptor),
        }
    }
}

type CellTable = HashMap<GridCell, CellEntries>;

#[derive(Clone, Copy, Debug, PartialEq)]
struct FloorEntry {
    origin: PortionKey,
    y: f32,
}

/// Spatial index over loaded portions.
///
/// Each descriptor is owned by one portion but registered in every cell its footprint
/// covers. Cells that fall in another portion are stored in that portion's overflow table,
/// tagged with the origin, so they survive independently of load order and disappear when
/// the origin is unloaded.
///
/// Floor heights are kept per column, also tagged with their origin portion.
#[derive(Clone, Debug)]
pub struct PortionIndex {
    config: CollisionConfig,
    portions: HashMap<PortionKey, CellTable>,
    /// target portion -> origin portion -> cells.
    overflow: HashMap<PortionKey, HashMap<PortionKey, CellTable>>,
    /// origin portion -> target portions it spilled into.
    origin_targets: HashMap<PortionKey, Vec<PortionKey>>,
    floors: HashMap<(i32, i32), Vec<FloorEntry>>,
}

impl PortionIndex {
    pub fn new(config: &CollisionConfig) -> Self {
        Self {
            config: *config,
            portions: HashMap::new(),
            overflow: HashMap::new(),
            origin_targets: HashMap::new(),
            floors: HashMap::new(),
        }
    }

    #[inline]
    pub fn is_loaded(&self, portion: Portion) -> bool {
        self.portions.contains_key(&portion.key())
    }

    #[inline]
    pub fn loaded_count(&self) -> usize {
        self.portions.len()
    }

    /// Registers `descriptors` as the content of `portion`, replacing any previous content.
    pub fn load_portion(&mut self, portion: Portion, descriptors: Vec<CollisionDescriptor>) {
        let key = portion.key();
        if self.portions.contains_key(&key) {
            self.unload_portion(portion);
        }

        let ps = self.config.portion_size;
        let count = descriptors.len();
        let mut own = CellTable::new();
        let mut spilled = 0usize;

        for descriptor in descriptors {
            if descriptor.position.portion(ps) != portion {
                log::warn!(
                    "descriptor at {:?} loaded into foreign portion {key}",
                    descriptor.position.cell()
                );
            }
            for (column, y) in descriptor.floor_heights(&self.config) {
                self.floors
                    .entry(column)
                    .or_default()
                    .push(FloorEntry { origin: key, y });
            }

            let footprint = descriptor.footprint(&self.config);
            let descriptor = Arc::new(descriptor);
            for cell in footprint {
                let target = cell.portion(ps).key();
                if target == key {
                    own.entry(cell).or_default().push(Arc::clone(&descriptor));
                    continue;
                }
                spilled += 1;
                self.overflow
                    .entry(target)
                    .or_default()
                    .entry(key)
                    .or_default()
                    .entry(cell)
                    .or_default()
                    .push(Arc::clone(&descriptor));
                let targets = self.origin_targets.entry(key).or_default();
                if !targets.contains(&target) {
                    targets.push(target);
                }
            }
        }

        self.portions.insert(key, own);
        log::info!("loaded portion {key}: {count} descriptors, {spilled} overflow cells");
    }

    /// Drops `portion` and everything it registered in neighbouring portions.
    ///
    /// Returns false when the portion was not loaded.
    pub fn unload_portion(&mut self, portion: Portion) -> bool {
        let key = portion.key();
        if self.portions.remove(&key).is_none() {
            return false;
        }
        for target in self.origin_targets.remove(&key).unwrap_or_default() {
            if let Some(origins) = self.overflow.get_mut(&target) {
                origins.remove(&key);
                if origins.is_empty() {
                    self.overflow.remove(&target);
                }
            }
        }
        self.floors.retain(|_, entries| {
            entries.retain(|e| e.origin != key);
            !entries.is_empty()
        });
        log::info!("unloaded portion {key}");
        true
    }

    /// Descriptors of `category` registered in `cell`, own entries first, then overflow.
    ///
    /// Unloaded portions yield nothing, including what neighbours spilled into them.
    pub fn query(
        &self,
        category: Category,
        cell: GridCell,
    ) -> impl Iterator<Item = &Arc<CollisionDescriptor>> + '_ {
        let key = cell.portion(self.config.portion_size).key();
        let loaded = self.portions.get(&key);
        let own = loaded
            .and_then(|cells| cells.get(&cell))
            .map(|entries| entries.list(category))
            .unwrap_or(&[]);
        let spill = loaded
            .and_then(|_| self.overflow.get(&key))
            .into_iter()
            .flat_map(|origins| origins.values())
            .filter_map(move |cells| cells.get(&cell))
            .flat_map(move |entries| entries.list(category).iter());
        own.iter().chain(spill)
    }

    /// Floor heights registered in the column of `cell`.
    pub fn floors(&self, cell: GridCell) -> impl Iterator<Item = f32> + '_ {
        self.floors
            .get(&cell.column())
            .into_iter()
            .flatten()
            .map(|entry| entry.y)
    }

    /// True when the column of `cell` has a floor within `tolerance` of `y`.
    pub fn has_floor_near(&self, cell: GridCell, y: f32, tolerance: f32) -> bool {
        self.floors(cell).any(|floor| (floor - y).abs() <= tolerance)
    }

    /// Floor of the column of `cell` nearest to `y` within `tolerance`.
    pub fn nearest_floor(&self, cell: GridCell, y: f32, tolerance: f32) -> Option<f32> {
        self.floors(cell)
            .filter(|floor| (floor - y).abs() <= tolerance)
            .min_by(|a, b| (a - y).abs().total_cmp(&(b - y).abs()))
    }
}
