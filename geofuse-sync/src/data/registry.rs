use geofuse_common::GeodeticRect;
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    pub struct PlacedObjectId;
}

/// A mesh-renderer object pinned to a geodetic footprint. The handle refers to a
/// node owned by the mesh renderer's scene graph.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlacedObject<H> {
    pub handle: H,
    pub footprint: GeodeticRect,
}

#[derive(Debug)]
pub struct Registry<H> {
    objects: SlotMap<PlacedObjectId, PlacedObject<H>>,
}

impl<H> Default for Registry<H> {
    fn default() -> Self {
        Self {
            objects: SlotMap::with_key(),
        }
    }
}

impl<H: Copy> Registry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handle: H, footprint: GeodeticRect) -> PlacedObjectId {
        self.objects.insert(PlacedObject { handle, footprint })
    }

    pub fn unregister(&mut self, id: PlacedObjectId) -> Option<PlacedObject<H>> {
        self.objects.remove(id)
    }

    pub fn get(&self, id: PlacedObjectId) -> Option<&PlacedObject<H>> {
        self.objects.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlacedObjectId, &PlacedObject<H>)> {
        self.objects.iter()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
