use std::collections::BTreeMap;

use geofuse_common::Size;
use glam::DVec3;

use super::{
    MeshRenderer,
    perspective_camera::PerspectiveCamera,
    scene::{MeshScene, NodeId, SceneNode},
};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderedNode {
    /// Normalized device coordinates of the node's world origin.
    pub ndc: DVec3,
    pub in_frustum: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub nodes: BTreeMap<NodeId, RenderedNode>,
}

/// Mesh renderer without a rasterizer: a render pass resolves the scene graph
/// and records where every node lands on screen.
#[derive(Debug)]
pub struct HeadlessMeshRenderer {
    camera: PerspectiveCamera,
    scene: MeshScene,
    surface: Size<u32>,
    frames_rendered: u64,
    last_frame: Option<FrameSnapshot>,
}

impl HeadlessMeshRenderer {
    pub fn new(camera: PerspectiveCamera, surface: Size<u32>) -> Self {
        Self {
            camera,
            scene: MeshScene::new(),
            surface,
            frames_rendered: 0,
            last_frame: None,
        }
    }

    pub fn scene(&self) -> &MeshScene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut MeshScene {
        &mut self.scene
    }

    pub fn add(&mut self, node: SceneNode) -> NodeId {
        self.scene.add(node)
    }

    pub fn resize(&mut self, surface: Size<u32>) {
        self.surface = surface;
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn last_frame(&self) -> Option<&FrameSnapshot> {
        self.last_frame.as_ref()
    }
}

impl MeshRenderer for HeadlessMeshRenderer {
    type Camera = PerspectiveCamera;
    type Handle = NodeId;
    type Transform = SceneNode;

    fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    fn camera_mut(&mut self) -> &mut PerspectiveCamera {
        &mut self.camera
    }

    fn transform_mut(&mut self, handle: NodeId) -> Option<&mut SceneNode> {
        self.scene.get_mut(handle)
    }

    fn drawing_surface_size(&self) -> Size<u32> {
        self.surface
    }

    fn render(&mut self) {
        self.scene.update_world_matrices();
        self.camera.update_matrix_world();

        let nodes = self
            .scene
            .ids()
            .filter_map(|id| {
                let world = self.scene.world_matrix(id)?;
                let ndc = self.camera.project_point(world.w_axis.truncate());
                let in_frustum = ndc.is_finite() && ndc.abs().max_element() <= 1.0;
                Some((id, RenderedNode { ndc, in_frustum }))
            })
            .collect::<BTreeMap<_, _>>();

        self.frames_rendered += 1;
        log::trace!(
            "Mesh frame {}: {} nodes, {} in frustum",
            self.frames_rendered,
            nodes.len(),
            nodes.values().filter(|n| n.in_frustum).count()
        );
        self.last_frame = Some(FrameSnapshot {
            frame: self.frames_rendered,
            nodes,
        });
    }
}
