//! Backend configuration.

use std::time::Duration;

use crate::device::Interpolation;
use crate::format::PixelFormat;

/// Environment variable consulted by [`BackendInit::from_env`] for the scale-quality hint.
pub const SCALE_QUALITY_ENV: &str = "DUPLEX_RENDER_SCALE_QUALITY";

/// Active display mode the backend is created for.
///
/// Both display buffers take this geometry; a mode change requires a new backend.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DisplayMode {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl DisplayMode {
    pub const fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self { width, height, format }
    }
}

/// How the flip wait polls the hardware.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PollConfig {
    /// Sleep between two status polls. Zero yields the thread instead of sleeping.
    pub interval: Duration,

    /// Give up on a flip after this long. `None` waits for as long as the hardware takes.
    pub deadline: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_micros(200),
            deadline: None,
        }
    }
}

/// Initialization parameters for the backend.
///
/// Keep this structure small; add fields only when a device or host needs them.
#[derive(Debug, Clone)]
pub struct BackendInit {
    /// Display-buffer rows are padded to a multiple of this many bytes.
    pub pitch_alignment: u32,

    /// Alignment of every GPU allocation (buffers and textures).
    pub memory_alignment: u32,

    /// Flip-completion polling.
    pub poll: PollConfig,

    /// Host scale-quality hint; see [`scale_quality`].
    pub scale_quality_hint: Option<String>,
}

impl Default for BackendInit {
    fn default() -> Self {
        Self {
            pitch_alignment: 64,
            memory_alignment: 64,
            poll: PollConfig::default(),
            scale_quality_hint: None,
        }
    }
}

impl BackendInit {
    /// Defaults, with the scale-quality hint taken from [`SCALE_QUALITY_ENV`].
    pub fn from_env() -> Self {
        Self {
            scale_quality_hint: std::env::var(SCALE_QUALITY_ENV).ok(),
            ..Self::default()
        }
    }
}

/// Maps the scale-quality hint to a transfer filter.
///
/// Unset, a value starting with `'0'`, or `"nearest"` (any case) select nearest-neighbor;
/// every other value selects linear filtering.
pub fn scale_quality(hint: Option<&str>) -> Interpolation {
    match hint {
        None => Interpolation::Nearest,
        Some(h) if h.starts_with('0') || h.eq_ignore_ascii_case("nearest") => Interpolation::Nearest,
        Some(_) => Interpolation::Linear,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_hint_is_nearest() {
        assert_eq!(scale_quality(None), Interpolation::Nearest);
        assert_eq!(scale_quality(None), scale_quality(Some("0")));
        assert_eq!(scale_quality(None), scale_quality(Some("nearest")));
    }

    #[test]
    fn nearest_is_case_insensitive() {
        assert_eq!(scale_quality(Some("NEAREST")), Interpolation::Nearest);
    }

    #[test]
    fn other_values_are_linear() {
        assert_eq!(scale_quality(Some("1")), Interpolation::Linear);
        assert_eq!(scale_quality(Some("linear")), Interpolation::Linear);
        assert_eq!(scale_quality(Some("best")), Interpolation::Linear);
        assert_eq!(scale_quality(Some("")), Interpolation::Linear);
    }

    #[test]
    fn default_init_waits_without_deadline() {
        let init = BackendInit::default();
        assert_eq!(init.poll.deadline, None);
        assert_eq!(init.pitch_alignment, 64);
    }
}
