use glam::{DMat3, DMat4, DQuat, DVec3};
use slotmap::{SecondaryMap, SlotMap, new_key_type};

use super::ObjectTransform;

new_key_type! {
    pub struct NodeId;
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub position: DVec3,
    pub quaternion: DQuat,
    pub scale: DVec3,
    pub up: DVec3,
    parent: Option<NodeId>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: DVec3::ZERO,
            quaternion: DQuat::IDENTITY,
            scale: DVec3::ONE,
            up: DVec3::Y,
            parent: None,
        }
    }

    pub fn with_position(mut self, position: DVec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, quaternion: DQuat) -> Self {
        self.quaternion = quaternion;
        self
    }

    pub fn with_scale(mut self, scale: DVec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn local_matrix(&self) -> DMat4 {
        DMat4::from_scale_rotation_translation(self.scale, self.quaternion, self.position)
    }
}

impl ObjectTransform for SceneNode {
    fn position(&self) -> DVec3 {
        self.position
    }

    fn set_position(&mut self, position: DVec3) {
        self.position = position;
    }

    fn up(&self) -> DVec3 {
        self.up
    }

    fn set_up(&mut self, up: DVec3) {
        self.up = up;
    }

    fn look_at(&mut self, target: DVec3) {
        let z = (target - self.position).normalize_or_zero();
        let x = self.up.cross(z).normalize_or_zero();
        if z == DVec3::ZERO || x == DVec3::ZERO {
            log::debug!("Node {} look-at skipped: degenerate basis", self.name);
            return;
        }
        let y = z.cross(x);

        self.quaternion = DQuat::from_mat3(&DMat3::from_cols(x, y, z));
    }

    fn orientation(&self) -> DQuat {
        self.quaternion
    }
}

/// Scene graph owning every renderable node. Nodes are parented to at most one
/// other node; world matrices are recomputed on demand.
#[derive(Debug, Default)]
pub struct MeshScene {
    nodes: SlotMap<NodeId, SceneNode>,
    world: SecondaryMap<NodeId, DMat4>,
}

impl MeshScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: SceneNode) -> NodeId {
        self.nodes.insert(node)
    }

    /// Adds `node` as a child of `parent`, returns `None` if the parent is gone.
    pub fn add_child(&mut self, parent: NodeId, mut node: SceneNode) -> Option<NodeId> {
        if !self.nodes.contains_key(parent) {
            return None;
        }
        node.parent = Some(parent);
        Some(self.nodes.insert(node))
    }

    /// Removes the node together with all of its descendants.
    pub fn remove(&mut self, id: NodeId) -> Option<SceneNode> {
        let children = self
            .nodes
            .iter()
            .filter(|(_, node)| node.parent == Some(id))
            .map(|(child, _)| child)
            .collect::<Vec<_>>();
        for child in children {
            self.remove(child);
        }
        self.world.remove(id);
        self.nodes.remove(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys()
    }

    pub fn update_world_matrices(&mut self) {
        self.world.clear();
        let ids = self.nodes.keys().collect::<Vec<_>>();
        for id in ids {
            self.resolve_world(id);
        }
    }

    fn resolve_world(&mut self, id: NodeId) -> DMat4 {
        if let Some(world) = self.world.get(id) {
            return *world;
        }
        let Some(node) = self.nodes.get(id) else {
            return DMat4::IDENTITY;
        };
        let local = node.local_matrix();
        let parent = node.parent;
        let world = match parent {
            Some(parent) => self.resolve_world(parent) * local,
            None => local,
        };
        self.world.insert(id, world);
        world
    }

    /// World matrix as of the last [`MeshScene::update_world_matrices`].
    pub fn world_matrix(&self, id: NodeId) -> Option<DMat4> {
        self.world.get(id).copied()
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn look_at_points_z_at_target_and_keeps_up() {
        let mut node = SceneNode::new("marker").with_position(DVec3::new(0.0, 0.0, 10.0));
        node.set_up(DVec3::Y);
        node.look_at(DVec3::new(0.0, 0.0, 20.0));

        assert_relative_eq!(node.orientation() * DVec3::Z, DVec3::Z, epsilon = 1e-12);
        assert_relative_eq!(node.orientation() * DVec3::Y, DVec3::Y, epsilon = 1e-12);
    }

    #[test]
    fn look_at_reorthonormalises_tilted_up() {
        let mut node = SceneNode::new("marker");
        node.set_up(DVec3::new(0.0, 1.0, 1.0));
        node.look_at(DVec3::Z);

        let up = node.orientation() * DVec3::Y;
        assert_relative_eq!(up, DVec3::Y, epsilon = 1e-12);
        assert_relative_eq!(up.dot(node.orientation() * DVec3::Z), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_look_at_keeps_orientation() {
        let rotation = DQuat::from_rotation_x(0.3);
        let mut node = SceneNode::new("marker").with_rotation(rotation);
        node.look_at(DVec3::ZERO);
        assert_eq!(node.orientation(), rotation);

        node.set_up(DVec3::Z);
        node.look_at(DVec3::new(0.0, 0.0, 5.0));
        assert_eq!(node.orientation(), rotation);
    }

    #[test]
    fn child_world_matrix_composes_parent() {
        let mut scene = MeshScene::new();
        let group = SceneNode::new("group").with_position(DVec3::new(100.0, 0.0, 0.0));
        let group = scene.add(group);
        let child = SceneNode::new("mesh")
            .with_position(DVec3::new(0.0, 0.0, 15.0))
            .with_rotation(DQuat::from_rotation_x(FRAC_PI_2))
            .with_scale(DVec3::splat(2.0));
        let mesh = scene.add_child(group, child).unwrap();
        scene.update_world_matrices();

        let world = scene.world_matrix(mesh).unwrap();
        assert_relative_eq!(
            world.transform_point3(DVec3::ZERO),
            DVec3::new(100.0, 0.0, 15.0),
            epsilon = 1e-12
        );
        // the mesh's local +Y ends up along the group's +Z
        assert_relative_eq!(
            world.transform_vector3(DVec3::Y),
            DVec3::new(0.0, 0.0, 2.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn remove_drops_descendants() {
        let mut scene = MeshScene::new();
        let group = scene.add(SceneNode::new("group"));
        let child = scene.add_child(group, SceneNode::new("child")).unwrap();
        scene.add(SceneNode::new("other"));

        assert!(scene.remove(group).is_some());
        assert!(scene.get(child).is_none());
        assert_eq!(scene.len(), 1);
        assert!(scene.add_child(group, SceneNode::new("orphan")).is_none());
    }
}
