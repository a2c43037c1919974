/// Audio level as a fraction in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Volume(f64);

impl Volume {
	pub const SILENT: Volume = Volume(0.0);
	pub const FULL: Volume = Volume(1.0);

	/// Clamps into `[0, 1]`. `NaN` counts as silence.
	pub fn new(fraction: f64) -> Self {
		if fraction.is_nan() {
			return Self::SILENT;
		}
		Self(fraction.clamp(0.0, 1.0))
	}

	pub fn fraction(self) -> f64 {
		self.0
	}

	pub fn is_silent(self) -> bool {
		self.0 == 0.0
	}
}

impl Default for Volume {
	fn default() -> Self {
		Self::FULL
	}
}
