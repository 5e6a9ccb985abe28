//! Input - Keyboard levels to named controls
//!
//! Key-down sets a control, key-up clears it. Each frame the sampler takes
//! a snapshot of the levels and reports which controls rose since the
//! previous snapshot, so the state machine can react to edges.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Named controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    Forward,
    Backward,
    Left,
    Right,
    CameraLeft,
    CameraRight,
    CameraUp,
    CameraDown,
    Start,
    Restart,
}

impl Control {
    pub const ALL: [Control; 10] = [
        Control::Forward,
        Control::Backward,
        Control::Left,
        Control::Right,
        Control::CameraLeft,
        Control::CameraRight,
        Control::CameraUp,
        Control::CameraDown,
        Control::Start,
        Control::Restart,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Level of every control at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlSet {
    levels: [bool; Control::ALL.len()],
}

impl ControlSet {
    /// Whether a control is held
    pub fn is_down(&self, control: Control) -> bool {
        self.levels[control.index()]
    }

    pub fn set(&mut self, control: Control, down: bool) {
        self.levels[control.index()] = down;
    }

    /// Builder helper, mostly for tests and scripted input
    pub fn with(mut self, control: Control) -> Self {
        self.set(control, true);
        self
    }

    /// Controls down here but not in `previous`
    pub fn rising_since(&self, previous: &ControlSet) -> ControlSet {
        let mut edges = ControlSet::default();
        for control in Control::ALL {
            edges.set(control, self.is_down(control) && !previous.is_down(control));
        }
        edges
    }
}

/// One frame's input: current levels plus rising edges
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlSample {
    pub levels: ControlSet,
    pub pressed: ControlSet,
}

impl ControlSample {
    pub fn is_down(&self, control: Control) -> bool {
        self.levels.is_down(control)
    }

    /// Whether a control went down since the last sample
    pub fn was_pressed(&self, control: Control) -> bool {
        self.pressed.is_down(control)
    }
}

/// Key name (lower-cased DOM `KeyboardEvent.key`) to controls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyBindings(HashMap<String, Vec<Control>>);

impl Default for KeyBindings {
    fn default() -> Self {
        let pairs: [(&str, &[Control]); 9] = [
            ("w", &[Control::Forward, Control::Start]),
            ("s", &[Control::Backward]),
            ("a", &[Control::Left]),
            ("d", &[Control::Right]),
            ("arrowleft", &[Control::CameraLeft]),
            ("arrowright", &[Control::CameraRight]),
            ("arrowup", &[Control::CameraUp]),
            ("arrowdown", &[Control::CameraDown]),
            ("r", &[Control::Restart]),
        ];
        Self(
            pairs
                .iter()
                .map(|(key, controls)| (key.to_string(), controls.to_vec()))
                .collect(),
        )
    }
}

impl KeyBindings {
    /// Controls bound to a key, case-insensitive
    pub fn controls_for(&self, key: &str) -> &[Control] {
        self.0
            .get(&key.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Collects key events between frames and samples them once per frame
#[derive(Debug, Clone, Default)]
pub struct InputSampler {
    bindings: KeyBindings,
    levels: ControlSet,
    previous: ControlSet,
}

impl InputSampler {
    pub fn new(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            levels: ControlSet::default(),
            previous: ControlSet::default(),
        }
    }

    /// Handle a key-down event. Returns false for unbound keys.
    pub fn key_down(&mut self, key: &str) -> bool {
        self.apply_key(key, true)
    }

    /// Handle a key-up event. Returns false for unbound keys.
    pub fn key_up(&mut self, key: &str) -> bool {
        self.apply_key(key, false)
    }

    fn apply_key(&mut self, key: &str, down: bool) -> bool {
        let controls = self.bindings.controls_for(key);
        for control in controls {
            self.levels.set(*control, down);
        }
        !controls.is_empty()
    }

    /// Drop every held control (e.g. when the window loses focus)
    pub fn release_all(&mut self) {
        self.levels = ControlSet::default();
    }

    /// Take this frame's sample and advance the edge baseline
    pub fn sample(&mut self) -> ControlSample {
        let sample = ControlSample {
            levels: self.levels,
            pressed: self.levels.rising_since(&self.previous),
        };
        self.previous = self.levels;
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_levels_follow_down_and_up() {
        let mut sampler = InputSampler::default();
        assert!(sampler.key_down("A"));
        assert!(sampler.sample().is_down(Control::Left));

        sampler.key_up("a");
        assert!(!sampler.sample().is_down(Control::Left));
    }

    #[test]
    fn test_start_edge_reported_once() {
        let mut sampler = InputSampler::default();
        sampler.key_down("w");

        let first = sampler.sample();
        assert!(first.was_pressed(Control::Start));
        assert!(first.is_down(Control::Forward));

        let second = sampler.sample();
        assert!(!second.was_pressed(Control::Start));
        assert!(second.is_down(Control::Start));
    }

    #[test]
    fn test_press_and_release_between_frames_is_lost() {
        let mut sampler = InputSampler::default();
        sampler.key_down("r");
        sampler.key_up("r");
        let sample = sampler.sample();
        assert!(!sample.was_pressed(Control::Restart));
        assert_eq!(sample.levels, ControlSet::default());
    }

    #[test]
    fn test_unbound_key_ignored() {
        let mut sampler = InputSampler::default();
        assert!(!sampler.key_down("q"));
        assert_eq!(sampler.sample().levels, ControlSet::default());
    }

    #[test]
    fn test_release_all() {
        let mut sampler = InputSampler::default();
        sampler.key_down("w");
        sampler.key_down("arrowup");
        sampler.release_all();
        assert_eq!(sampler.sample().levels, ControlSet::default());
    }

    #[test]
    fn test_custom_bindings_from_json() {
        let bindings: KeyBindings =
            serde_json::from_str(r#"{"enter": ["start"], "arrowup": ["forward"]}"#).unwrap();
        let mut sampler = InputSampler::new(bindings);
        sampler.key_down("Enter");
        sampler.key_down("ArrowUp");
        let sample = sampler.sample();
        assert!(sample.was_pressed(Control::Start));
        assert!(sample.is_down(Control::Forward));
        assert!(!sample.is_down(Control::CameraUp));
    }
}
