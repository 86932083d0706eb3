// drapery-physics: Engine-agnostic skeleton and cloth abstraction for drapery.
//
// Environments are written against the `Skeleton`, `PhysicsWorld`,
// `ClothScene` and `ClothWorld` traits so the concrete engine can be swapped
// without touching reward or observation code. Cloth features and the handle
// node are computed locally on top of `ClothScene`.

pub mod backend;
pub mod cloth;
pub mod feature;
pub mod handle;
pub mod kinematic;
pub mod mesh;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        backend::{PhysicsWorld, Skeleton, SkeletonState},
        cloth::{ClothScene, ClothWorld, vertex_average_normal, vertex_centroid},
        feature::{ClothFeature, FeaturePlane},
        handle::HandleNode,
        kinematic::{KinematicClothWorld, KinematicSkeleton, KinematicWorld, MeshCloth},
        mesh::ObjMesh,
    };
}
