use crate::playback::state::PlayState;

/// Whether the on-screen controls are shown.
///
/// Pointer activity shows them. While playing, an idle delay or the pointer leaving the player hides them again.
/// While not playing they always stay visible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlsVisibility {
	visible: bool,
}

impl Default for ControlsVisibility {
	fn default() -> Self {
		Self { visible: true }
	}
}

impl ControlsVisibility {
	pub fn visible(self) -> bool {
		self.visible
	}

	/// Returns whether the idle timer has to be (re)started.
	#[must_use]
	pub fn pointer_moved(&mut self, play_state: PlayState) -> bool {
		self.visible = true;
		play_state == PlayState::Playing
	}

	pub fn pointer_left(&mut self, play_state: PlayState) {
		if play_state == PlayState::Playing {
			self.visible = false;
		}
	}

	pub fn idle_elapsed(&mut self, play_state: PlayState) {
		if play_state == PlayState::Playing {
			self.visible = false;
		}
	}

	/// Returns whether the idle timer has to be started for the new state.
	#[must_use]
	pub fn state_changed(&mut self, play_state: PlayState) -> bool {
		if play_state == PlayState::Playing {
			return self.visible;
		}
		self.visible = true;
		false
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn should_hide_after_idling_while_playing() {
		let mut controls = ControlsVisibility::default();

		assert!(controls.pointer_moved(PlayState::Playing));
		controls.idle_elapsed(PlayState::Playing);

		assert!(!controls.visible());
	}

	#[test]
	fn should_never_hide_while_paused() {
		let mut controls = ControlsVisibility::default();

		assert!(!controls.pointer_moved(PlayState::Paused));
		controls.idle_elapsed(PlayState::Paused);
		controls.pointer_left(PlayState::Paused);

		assert!(controls.visible());
	}

	#[test]
	fn pointer_movement_should_show_hidden_controls() {
		let mut controls = ControlsVisibility::default();
		controls.pointer_left(PlayState::Playing);
		assert!(!controls.visible());

		let _ = controls.pointer_moved(PlayState::Playing);

		assert!(controls.visible());
	}

	#[test]
	fn pausing_should_show_the_controls() {
		let mut controls = ControlsVisibility::default();
		controls.idle_elapsed(PlayState::Playing);

		assert!(!controls.state_changed(PlayState::Paused));
		assert!(controls.visible());
	}

	#[test]
	fn starting_to_play_should_start_the_idle_timer() {
		let mut controls = ControlsVisibility::default();

		assert!(controls.state_changed(PlayState::Playing));
	}
}
