// drapery-env: Reacher and upper-body dressing environments.
//
// Both environments implement `Environment` and `DebugRender` from
// drapery-core and are generic over the engine traits of drapery-physics.

pub mod dressing;
pub mod episode;
pub mod reacher;
pub mod stats;

use nalgebra::Point3;

pub(crate) fn to_array(p: &Point3<f64>) -> [f64; 3] {
    [p.x, p.y, p.z]
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        dressing::{
            DressingConfig, DressingEnv, ObservationConfig, ResetConfig, RewardConfig,
            RewardTermKind, SaveConfig, TerminationConfig,
        },
        episode::{Episode, EpisodeState},
        reacher::{DistanceTermination, ReacherConfig, ReacherEnv},
        stats::EpisodeStats,
    };
}
