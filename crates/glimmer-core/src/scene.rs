//! Scene graph: objects, the material library and the geometry library.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{EulerRot, Mat4, Quat, Vec3};
use slotmap::SlotMap;

use crate::error::{GlimmerError, Result};
use crate::geometry::{Geometry, GeometryId};
use crate::layer::{Layer, Layers};
use crate::material::{Material, MaterialId};

slotmap::new_key_type! {
    /// Generational handle to a scene object.
    ///
    /// A handle to a removed object never aliases a later object.
    pub struct ObjectId;
}

/// Position, Euler rotation (radians, XYZ order) and scale of an object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Object-to-world matrix.
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.position)
    }
}

/// A renderable object.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    pub geometry: GeometryId,
    /// The material currently assigned. Temporarily replaced by the mask
    /// material while the glow pass renders.
    pub material: MaterialId,
    pub transform: Transform,
    pub layers: Layers,
    pub visible: bool,
}

impl SceneObject {
    /// Whether the object is tagged for the glow pass.
    #[must_use]
    pub fn is_bloom(&self) -> bool {
        self.layers.contains(Layer::BloomScene)
    }
}

static NEXT_SCENE_UID: AtomicU64 = AtomicU64::new(1);

/// Owns every object, material and geometry.
pub struct Scene {
    uid: u64,
    objects: SlotMap<ObjectId, SceneObject>,
    materials: SlotMap<MaterialId, Material>,
    geometries: SlotMap<GeometryId, Geometry>,
    mask_material: MaterialId,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Creates an empty scene with the shared mask material registered.
    pub fn new() -> Self {
        let mut materials = SlotMap::with_key();
        let mask_material = materials.insert(Material::mask());
        Self {
            uid: NEXT_SCENE_UID.fetch_add(1, Ordering::Relaxed),
            objects: SlotMap::with_key(),
            materials,
            geometries: SlotMap::with_key(),
            mask_material,
        }
    }

    /// Process-unique id of this scene. Library handles are only meaningful
    /// together with the scene that issued them.
    pub fn uid(&self) -> u64 {
        self.uid
    }

    /// The shared material substituted onto non-glowing objects.
    pub fn mask_material(&self) -> MaterialId {
        self.mask_material
    }

    /// Recolors the shared mask material.
    pub fn set_mask_color(&mut self, color: Vec3) {
        if let Some(mask) = self.materials.get_mut(self.mask_material) {
            mask.color = color;
        }
    }

    /// Adds a material to the library.
    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.insert(material)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id)
    }

    /// Adds a geometry to the library.
    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryId {
        self.geometries.insert(geometry)
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&Geometry> {
        self.geometries.get(id)
    }

    /// Iterates the geometry library.
    pub fn geometries(&self) -> impl Iterator<Item = (GeometryId, &Geometry)> {
        self.geometries.iter()
    }

    /// Number of geometries in the library.
    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    /// Number of materials in the library, not counting the mask material.
    pub fn material_count(&self) -> usize {
        self.materials.len() - 1
    }

    /// Removes a geometry no object references.
    ///
    /// Returns `None` if the geometry is missing or still in use.
    pub fn remove_geometry(&mut self, id: GeometryId) -> Option<Geometry> {
        if self.objects.values().any(|o| o.geometry == id) {
            return None;
        }
        self.geometries.remove(id)
    }

    /// Removes a material no object references. The mask material is never
    /// removed.
    ///
    /// Returns `None` if the material is missing, in use or the mask.
    pub fn remove_material(&mut self, id: MaterialId) -> Option<Material> {
        if id == self.mask_material || self.objects.values().any(|o| o.material == id) {
            return None;
        }
        self.materials.remove(id)
    }

    /// Drops every geometry and material no object references. Returns the
    /// number of library entries removed.
    pub fn prune_library(&mut self) -> usize {
        let used_geometries: HashSet<GeometryId> =
            self.objects.values().map(|o| o.geometry).collect();
        let used_materials: HashSet<MaterialId> =
            self.objects.values().map(|o| o.material).collect();
        let mask = self.mask_material;

        let before = self.geometries.len() + self.materials.len();
        self.geometries.retain(|id, _| used_geometries.contains(&id));
        self.materials
            .retain(|id, _| id == mask || used_materials.contains(&id));
        before - self.geometries.len() - self.materials.len()
    }

    /// Adds an object referencing existing library entries.
    ///
    /// Names must be unique within the scene.
    pub fn add_object(
        &mut self,
        name: impl Into<String>,
        geometry: GeometryId,
        material: MaterialId,
    ) -> Result<ObjectId> {
        let name = name.into();
        if !self.geometries.contains_key(geometry) {
            return Err(GlimmerError::GeometryNotFound);
        }
        if !self.materials.contains_key(material) {
            return Err(GlimmerError::MaterialNotFound);
        }
        if self.find(&name).is_some() {
            return Err(GlimmerError::ObjectExists(name));
        }

        let id = self.objects.insert(SceneObject {
            name,
            geometry,
            material,
            transform: Transform::default(),
            layers: Layers::default(),
            visible: true,
        });
        Ok(id)
    }

    /// Removes an object, returning it if it was present.
    pub fn remove_object(&mut self, id: ObjectId) -> Option<SceneObject> {
        self.objects.remove(id)
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    /// Looks up an object by name.
    pub fn find(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .find_map(|(id, obj)| (obj.name == name).then_some(id))
    }

    /// Adds or removes the bloom tag on an object.
    pub fn set_bloom(&mut self, id: ObjectId, enabled: bool) -> Result<()> {
        let obj = self
            .objects
            .get_mut(id)
            .ok_or_else(|| GlimmerError::ObjectNotFound(format!("{id:?}")))?;
        if enabled {
            obj.layers.enable(Layer::BloomScene);
        } else {
            obj.layers.disable(Layer::BloomScene);
        }
        Ok(())
    }

    /// Flips the bloom tag on an object and returns the new state.
    pub fn toggle_bloom(&mut self, id: ObjectId) -> Result<bool> {
        let tagged = self
            .object(id)
            .map(SceneObject::is_bloom)
            .ok_or_else(|| GlimmerError::ObjectNotFound(format!("{id:?}")))?;
        self.set_bloom(id, !tagged)?;
        Ok(!tagged)
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &SceneObject)> {
        self.objects.iter()
    }

    pub fn objects_mut(&mut self) -> impl Iterator<Item = (ObjectId, &mut SceneObject)> {
        self.objects.iter_mut()
    }

    /// Number of objects in the scene.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Number of objects tagged for bloom.
    pub fn bloom_count(&self) -> usize {
        self.objects.values().filter(|o| o.is_bloom()).count()
    }

    /// Removes every object. Library entries are kept; see
    /// [`Scene::prune_library`].
    pub fn clear(&mut self) {
        self.objects.clear();
    }
}
