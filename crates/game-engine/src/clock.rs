use serde::{Deserialize, Serialize};

/// Turn counter plus the play/pause switch.
///
/// The clock only counts; it never looks at wall time. Whoever drives the
/// game decides how often [`SimulationClock::advance`] is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationClock {
    turn: u64,
    playing: bool,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self {
            turn: 1,
            playing: false,
        }
    }
}

impl SimulationClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Count one turn when `play` is set, returning the new turn number
    pub fn advance(&mut self, play: bool) -> Option<u64> {
        if !play {
            return None;
        }
        self.turn += 1;
        Some(self.turn)
    }
}
