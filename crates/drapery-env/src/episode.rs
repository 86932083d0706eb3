//! Episode state machine and lifecycle bookkeeping.
//!
//! An episode is a single rollout from reset to termination/truncation.
//! Every environment owns one [`Episode`] tracking state, step count and
//! accumulated reward.

// ---------------------------------------------------------------------------
// EpisodeState
// ---------------------------------------------------------------------------

/// Lifecycle state of an episode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EpisodeState {
    /// Before the first reset.
    #[default]
    Idle,
    /// Actively stepping.
    Running,
    /// Ended due to task success or failure.
    Done,
    /// Ended due to time limit.
    Truncated,
}

impl EpisodeState {
    /// Returns `true` if the episode is finished (Done or Truncated).
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Truncated)
    }

    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

// ---------------------------------------------------------------------------
// Episode
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct Episode {
    pub state: EpisodeState,
    /// Steps taken this episode.
    pub step_count: u32,
    /// Cumulative reward this episode.
    pub total_reward: f64,
    /// Seed passed to the last reset.
    pub seed: Option<u64>,
    /// Number of resets since construction.
    pub episode_number: u32,
}

impl Episode {
    /// Start a new episode with an optional seed.
    pub const fn reset(&mut self, seed: Option<u64>) {
        self.state = EpisodeState::Running;
        self.step_count = 0;
        self.total_reward = 0.0;
        self.seed = seed;
        self.episode_number += 1;
    }

    /// Resets that happened before the current episode.
    pub const fn previous_resets(&self) -> u32 {
        self.episode_number.saturating_sub(1)
    }

    /// Advance one step, accumulating reward. Returns `false` if the
    /// episode is not running.
    pub fn advance(&mut self, reward: f64) -> bool {
        if self.state != EpisodeState::Running {
            return false;
        }
        self.step_count += 1;
        self.total_reward += reward;
        true
    }

    /// Mark the episode as done (task success/failure).
    pub const fn terminate(&mut self) {
        self.state = EpisodeState::Done;
    }

    /// Truncate once `max_steps` is reached. `0` means no limit.
    pub fn check_truncation(&mut self, max_steps: u32) -> bool {
        if max_steps > 0 && self.step_count >= max_steps && self.state == EpisodeState::Running {
            self.state = EpisodeState::Truncated;
            return true;
        }
        false
    }

    pub const fn is_done(&self) -> bool {
        self.state.is_terminal()
    }

    pub const fn is_running(&self) -> bool {
        self.state.is_running()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
