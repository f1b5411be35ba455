use super::AnimationState;
use crate::engine::Size;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// One horizontal strip sheet of equal width frames
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
pub struct AnimationSpec {
    pub frame_count: u32,
    pub sheet_width: f64,
    pub sheet_height: f64,
    pub ticks_per_frame: u32,
}

impl AnimationSpec {
    pub const fn new(
        frame_count: u32,
        sheet_width: f64,
        sheet_height: f64,
        ticks_per_frame: u32,
    ) -> Self {
        AnimationSpec {
            frame_count,
            sheet_width,
            sheet_height,
            ticks_per_frame,
        }
    }

    pub fn frame_width(&self) -> f64 {
        self.sheet_width / f64::from(self.frame_count)
    }

    pub fn frame_height(&self) -> f64 {
        self.sheet_height
    }

    pub fn frame_size(&self) -> Size {
        Size {
            width: self.frame_width(),
            height: self.frame_height(),
        }
    }

    /// Same timing, sheet measured from the loaded image
    pub fn with_sheet_size(mut self, width: f64, height: f64) -> Self {
        self.sheet_width = width;
        self.sheet_height = height;
        self
    }

    pub fn sheet_matches(&self, width: f64, height: f64) -> bool {
        self.sheet_width == width && self.sheet_height == height
    }

    /// Hard errors for values the frame math divides by, warnings for
    /// sheets whose width is not a whole number of frames
    pub fn validate(&self, label: &str) -> Result<Vec<String>> {
        if self.frame_count == 0 {
            bail!("animation [{}] has no frames", label);
        }
        if self.ticks_per_frame == 0 {
            bail!("animation [{}] has ticks_per_frame = 0", label);
        }
        let mut warnings = Vec::new();
        if self.sheet_width % f64::from(self.frame_count) != 0.0 {
            warnings.push(format!(
                "animation [{}] : sheet width {} is not a multiple of {} frames",
                label, self.sheet_width, self.frame_count
            ));
        }
        Ok(warnings)
    }
}

/// Sheet table for the character, a slot may be left empty
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnimationRegistry {
    pub waiting: Option<AnimationSpec>,
    pub walk: Option<AnimationSpec>,
    pub run: Option<AnimationSpec>,
    pub jump: Option<AnimationSpec>,
    pub crouch: Option<AnimationSpec>,
    pub combo: Option<AnimationSpec>,
}

impl Default for AnimationRegistry {
    fn default() -> Self {
        AnimationRegistry {
            waiting: Some(AnimationSpec::new(9, 1246.0, 196.0, 5)),
            walk: Some(AnimationSpec::new(9, 1246.0, 198.0, 5)),
            run: Some(AnimationSpec::new(13, 2517.0, 168.0, 5)),
            jump: Some(AnimationSpec::new(19, 6360.0, 248.0, 5)),
            crouch: Some(AnimationSpec::new(8, 2155.0, 189.0, 5)),
            combo: Some(AnimationSpec::new(7, 1822.0, 165.0, 5)),
        }
    }
}

impl AnimationRegistry {
    pub fn empty() -> Self {
        AnimationRegistry {
            waiting: None,
            walk: None,
            run: None,
            jump: None,
            crouch: None,
            combo: None,
        }
    }

    pub fn get(&self, state: AnimationState) -> Option<&AnimationSpec> {
        self.slot(state).as_ref()
    }

    pub fn insert(&mut self, state: AnimationState, spec: AnimationSpec) {
        *self.slot_mut(state) = Some(spec);
    }

    pub fn remove(&mut self, state: AnimationState) -> Option<AnimationSpec> {
        self.slot_mut(state).take()
    }

    /// Registered states with their specs, in `AnimationState::ALL` order
    pub fn iter(&self) -> impl Iterator<Item = (AnimationState, &AnimationSpec)> + '_ {
        AnimationState::ALL
            .into_iter()
            .filter_map(move |state| self.get(state).map(|spec| (state, spec)))
    }

    pub fn validate(&self) -> Result<Vec<String>> {
        let mut warnings = Vec::new();
        for (state, spec) in self.iter() {
            warnings.extend(spec.validate(state.name())?);
        }
        if self.get(AnimationState::Waiting).is_none() {
            warnings.push("no [waiting] animation, the idle character is invisible".to_string());
        }
        Ok(warnings)
    }

    fn slot(&self, state: AnimationState) -> &Option<AnimationSpec> {
        match state {
            AnimationState::Waiting => &self.waiting,
            AnimationState::Walk => &self.walk,
            AnimationState::Run => &self.run,
            AnimationState::Jump => &self.jump,
            AnimationState::Crouch => &self.crouch,
            AnimationState::Combo => &self.combo,
        }
    }

    fn slot_mut(&mut self, state: AnimationState) -> &mut Option<AnimationSpec> {
        match state {
            AnimationState::Waiting => &mut self.waiting,
            AnimationState::Walk => &mut self.walk,
            AnimationState::Run => &mut self.run,
            AnimationState::Jump => &mut self.jump,
            AnimationState::Crouch => &mut self.crouch,
            AnimationState::Combo => &mut self.combo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_frame_size_is_sheet_slice() {
        let combo = AnimationSpec::new(7, 1822.0, 165.0, 5);
        assert_relative_eq!(combo.frame_width(), 1822.0 / 7.0);
        assert_relative_eq!(combo.frame_height(), 165.0);
    }

    #[test]
    fn test_default_registry_is_complete() {
        let registry = AnimationRegistry::default();
        for state in AnimationState::ALL {
            assert!(registry.get(state).is_some(), "missing {}", state.name());
        }
        assert_eq!(registry.get(AnimationState::Jump).map(|s| s.frame_count), Some(19));
    }

    #[test]
    fn test_validate_rejects_zero_frames() {
        let mut registry = AnimationRegistry::default();
        registry.insert(AnimationState::Walk, AnimationSpec::new(0, 100.0, 10.0, 5));
        assert!(registry.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_speed() {
        let mut registry = AnimationRegistry::default();
        registry.insert(AnimationState::Crouch, AnimationSpec::new(8, 800.0, 10.0, 0));
        assert!(registry.validate().is_err());
    }

    #[test]
    fn test_validate_warns_on_uneven_sheet() {
        let mut registry = AnimationRegistry::empty();
        registry.insert(AnimationState::Waiting, AnimationSpec::new(3, 100.0, 10.0, 5));
        let warnings = registry.validate().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("waiting"));
    }

    #[test]
    fn test_remove_leaves_slot_empty() {
        let mut registry = AnimationRegistry::default();
        assert!(registry.remove(AnimationState::Run).is_some());
        assert!(registry.get(AnimationState::Run).is_none());
        assert_eq!(registry.iter().count(), 5);
    }

    #[test]
    fn test_with_sheet_size_keeps_timing() {
        let measured = AnimationSpec::new(9, 1246.0, 196.0, 5).with_sheet_size(1260.0, 200.0);
        assert_eq!(measured.ticks_per_frame, 5);
        assert!(measured.sheet_matches(1260.0, 200.0));
        assert_relative_eq!(measured.frame_width(), 140.0);
    }

    #[test]
    fn test_registry_from_json_keeps_missing_slots_default() {
        let registry: AnimationRegistry = serde_json::from_str(
            r#"{ "combo": { "frame_count": 4, "sheet_width": 400, "sheet_height": 90, "ticks_per_frame": 3 } }"#,
        )
        .unwrap();
        assert_eq!(registry.get(AnimationState::Combo).map(|s| s.frame_count), Some(4));
        assert_eq!(registry.get(AnimationState::Waiting).map(|s| s.frame_count), Some(9));
    }

    #[test]
    fn test_registry_from_json_null_clears_slot() {
        let registry: AnimationRegistry = serde_json::from_str(r#"{ "crouch": null }"#).unwrap();
        assert!(registry.get(AnimationState::Crouch).is_none());
    }
}
