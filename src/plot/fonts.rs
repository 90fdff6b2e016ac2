use plotters::style::{FontStyle, register_font};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Font family name used by every text element of the figures
pub const FONT_FAMILY: &str = "sans-serif";

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static TEXT_AVAILABLE: OnceLock<bool> = OnceLock::new();

fn candidates(preferred: Option<&Path>) -> Vec<PathBuf> {
    preferred
        .map(Path::to_path_buf)
        .into_iter()
        .chain(SYSTEM_FONTS.iter().map(PathBuf::from))
        .collect()
}

fn register_first_usable(preferred: Option<&Path>) -> bool {
    for path in candidates(preferred) {
        let Ok(bytes) = std::fs::read(&path) else {
            continue;
        };
        // plotters keeps registered fonts for the lifetime of the process
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        match register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
            Ok(()) => {
                tracing::debug!("Using font {}", path.display());
                return true;
            }
            Err(_) => tracing::warn!("Font {} is not usable", path.display()),
        }
    }
    tracing::warn!("No TrueType font found; figures are rendered without titles, labels or legends");
    false
}

/// Register a font for figure text, once per process.
///
/// The first call decides: later calls return the same answer whatever path
/// they pass.
pub fn text_available(preferred: Option<&Path>) -> bool {
    *TEXT_AVAILABLE.get_or_init(|| register_first_usable(preferred))
}
