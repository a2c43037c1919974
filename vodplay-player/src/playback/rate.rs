use crate::playback::error::InvalidParameter;
use derive_more::Display;

/// The playback speeds offered by the player's speed selector.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash)]
pub enum PlaybackRate {
	#[display("0.5x")]
	Half,
	#[display("0.75x")]
	ThreeQuarters,
	#[default]
	#[display("1x")]
	Normal,
	#[display("1.25x")]
	OneAndAQuarter,
	#[display("1.5x")]
	OneAndAHalf,
	#[display("2x")]
	Double,
}

impl PlaybackRate {
	pub const ALL: [PlaybackRate; 6] = [
		PlaybackRate::Half,
		PlaybackRate::ThreeQuarters,
		PlaybackRate::Normal,
		PlaybackRate::OneAndAQuarter,
		PlaybackRate::OneAndAHalf,
		PlaybackRate::Double,
	];

	pub fn multiplier(self) -> f64 {
		match self {
			PlaybackRate::Half => 0.5,
			PlaybackRate::ThreeQuarters => 0.75,
			PlaybackRate::Normal => 1.0,
			PlaybackRate::OneAndAQuarter => 1.25,
			PlaybackRate::OneAndAHalf => 1.5,
			PlaybackRate::Double => 2.0,
		}
	}
}

impl TryFrom<f64> for PlaybackRate {
	type Error = InvalidParameter;

	fn try_from(multiplier: f64) -> Result<Self, Self::Error> {
		Self::ALL
			.into_iter()
			.find(|rate| (rate.multiplier() - multiplier).abs() < f64::EPSILON)
			.ok_or(InvalidParameter::UnsupportedPlaybackRate(multiplier))
	}
}
