//! Initial-state sampling and state persistence for the dressing task.

use std::path::{Path, PathBuf};

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Uniform};
use tracing::{debug, info};

use drapery_core::error::{DraperyError, SimError};
use drapery_core::manifest::{ManifestEntry, ResetManifest};
use drapery_physics::backend::{PhysicsWorld, Skeleton, SkeletonState};
use drapery_physics::cloth::{ClothScene, ClothWorld};

use super::config::{ResetConfig, SaveConfig};

// ---------------------------------------------------------------------------
// ResetSource
// ---------------------------------------------------------------------------

/// Resolved [`ResetConfig`].
#[derive(Debug, Clone)]
pub enum ResetSource {
    Distribution {
        manifest: ResetManifest,
        size: usize,
        velocity_noise: f64,
        /// Cloth reset-state index of the first manifest entry, once the
        /// entries are registered with the cloth.
        base: Option<usize>,
    },
    Fixed {
        character_state: Option<PathBuf>,
    },
}

impl ResetSource {
    /// Load the manifest a distribution refers to and check it is large
    /// enough.
    pub fn from_config(config: &ResetConfig) -> Result<Self, DraperyError> {
        Ok(match config {
            ResetConfig::Distribution {
                manifest,
                size,
                velocity_noise,
            } => {
                let manifest = ResetManifest::load(manifest)?;
                manifest.require(*size)?;
                Self::Distribution {
                    manifest,
                    size: *size,
                    velocity_noise: *velocity_noise,
                    base: None,
                }
            }
            ResetConfig::Fixed { character_state } => Self::Fixed {
                character_state: character_state.clone(),
            },
        })
    }

    /// Put the world into a start state. Returns the sampled entry, if any.
    pub fn apply<W: ClothWorld>(
        &mut self,
        world: &mut W,
        rng: &mut ChaCha8Rng,
    ) -> Result<Option<usize>, DraperyError> {
        match self {
            Self::Distribution {
                manifest,
                size,
                velocity_noise,
                base,
            } => {
                let first = match *base {
                    Some(first) => first,
                    None => {
                        let first = world.cloth().num_reset_states();
                        for entry in manifest.entries() {
                            world.cloth_mut().add_reset_state(&manifest.mesh_path(entry))?;
                        }
                        debug!(
                            entries = manifest.len(),
                            root = %manifest.root().display(),
                            "registered reset distribution"
                        );
                        *base = Some(first);
                        first
                    }
                };

                let index = rng.gen_range(0..*size);
                let entry = &manifest.entries()[index];
                world.cloth_mut().set_reset_state(first + index)?;
                let state = SkeletonState::load(manifest.character_path(entry))?;
                world.robot_mut().set_state(&state)?;

                let noise = Uniform::new_inclusive(-*velocity_noise, *velocity_noise);
                let robot = world.robot_mut();
                let dq: Vec<f64> = robot
                    .velocities()
                    .iter()
                    .map(|v| v + noise.sample(rng))
                    .collect();
                robot.set_velocities(&dq)?;
                debug!(index, entry = entry.index, "sampled reset state");
                Ok(Some(index))
            }
            Self::Fixed { character_state } => {
                if let Some(path) = character_state {
                    let state = SkeletonState::load(path.as_path())?;
                    world.robot_mut().set_state(&state)?;
                }
                Ok(None)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// StateSaver
// ---------------------------------------------------------------------------

/// Appends cloth and character states to a manifest.
#[derive(Debug, Clone)]
pub struct StateSaver {
    path: PathBuf,
    manifest: ResetManifest,
    at_step: u32,
}

impl StateSaver {
    /// Open the manifest at `config.manifest`, or start an empty one next to
    /// it.
    pub fn open(config: &SaveConfig) -> Result<Self, DraperyError> {
        let manifest = if config.manifest.is_file() {
            ResetManifest::load(&config.manifest)?
        } else {
            let root = config
                .manifest
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            ResetManifest::new(root, config.prefix.clone())
        };
        Ok(Self {
            path: config.manifest.clone(),
            manifest,
            at_step: config.at_step,
        })
    }

    /// Step count at which [`save`](Self::save) is due.
    pub const fn at_step(&self) -> u32 {
        self.at_step
    }

    /// Entries saved so far, including those loaded from disk.
    pub const fn manifest(&self) -> &ResetManifest {
        &self.manifest
    }

    /// Write the current state under the next manifest index.
    ///
    /// The entry is recorded only once both files and the manifest are on
    /// disk; a failed save leaves the manifest unchanged.
    pub fn save<W: ClothWorld>(&mut self, world: &W) -> Result<ManifestEntry, DraperyError> {
        let entry = self.manifest.next_entry();
        let mesh = self.manifest.mesh_path(&entry);
        let character = self.manifest.character_path(&entry);
        for path in [&mesh, &character, &self.path] {
            create_parent(path)?;
        }
        world.cloth().save_obj_state(&mesh)?;
        world.robot().state().save(&character)?;

        let mut updated = self.manifest.clone();
        updated.push(entry.clone())?;
        updated.save(&self.path)?;
        self.manifest = updated;
        info!(
            index = entry.index,
            mesh = %entry.mesh.display(),
            "saved dressing state"
        );
        Ok(entry)
    }
}

fn create_parent(path: &Path) -> Result<(), SimError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir).map_err(|e| SimError::state_file(dir, e))
        }
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
