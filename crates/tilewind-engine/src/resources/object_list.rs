use crate::engine::Tilengine;
use crate::error::EngineError;
use crate::native::{RawHandle, TileFlags};

use super::NativeRef;

/// Objects placed on an object layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectList(NativeRef);

impl ObjectList {
    pub fn new(tln: &Tilengine) -> Result<Self, EngineError> {
        NativeRef::create(tln, |n| n.create_object_list()).map(Self)
    }

    /// Loads an object group from a `.tmx` map; `None` picks the first one.
    pub fn load(tln: &Tilengine, filename: &str, layer: Option<&str>) -> Result<Self, EngineError> {
        NativeRef::create(tln, |n| n.load_object_list(filename, layer)).map(Self)
    }

    pub(crate) fn from_ref(r: NativeRef) -> Self {
        Self(r)
    }

    pub fn raw(&self) -> RawHandle {
        self.0.raw()
    }

    pub fn clone_list(&self) -> Option<ObjectList> {
        self.0.sibling(self.0.native().clone_object_list(self.raw())).map(Self)
    }

    pub fn add_tile_object(&self, id: u16, gid: u16, flags: TileFlags, x: i32, y: i32) -> bool {
        self.0.native().add_tile_object(self.raw(), id, gid, flags, x, y)
    }

    pub fn num_objects(&self) -> i32 {
        self.0.native().list_num_objects(self.raw())
    }

    pub fn delete(self) -> bool {
        self.0.native().delete_object_list(self.raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_objects_and_clone() {
        let tln = Tilengine::headless();
        let list = ObjectList::new(&tln).unwrap();
        assert!(list.add_tile_object(1, 10, TileFlags::FLIPX, 32, 48));
        assert!(list.add_tile_object(2, 11, TileFlags::empty(), 0, 0));
        let copy = list.clone_list().unwrap();
        assert!(list.add_tile_object(3, 12, TileFlags::empty(), 0, 0));
        assert_eq!(list.num_objects(), 3);
        assert_eq!(copy.num_objects(), 2);
        assert!(copy.delete());
    }
}
