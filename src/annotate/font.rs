use std::path::Path;

use ab_glyph::FontVec;
use tracing::{debug, warn};

/// DejaVu Sans, shipped with the crate so captions render on hosts without
/// system fonts. License in `assets/font-LICENSE.txt`.
const EMBEDDED_FONT: &[u8] = include_bytes!("../../assets/font.ttf");

/// Well-known TrueType locations tried when no font path is configured
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

fn read_font(path: &Path) -> Option<FontVec> {
    let data = std::fs::read(path).ok()?;
    FontVec::try_from_vec(data).ok()
}

/// The font bundled into the binary.
pub fn embedded_font() -> Option<FontVec> {
    FontVec::try_from_vec(EMBEDDED_FONT.to_vec()).ok()
}

/// Load the configured font, falling back to the system candidates and then
/// to the embedded font.
///
/// Returns `None` only when even the embedded font fails to parse; callers
/// then skip text.
pub fn load_font(configured: Option<&Path>) -> Option<FontVec> {
    if let Some(path) = configured {
        match read_font(path) {
            Some(font) => {
                debug!(path = ?path, "loaded label font");
                return Some(font);
            }
            None => warn!(path = ?path, "configured font is unusable, trying system fonts"),
        }
    }

    let found = FONT_CANDIDATES
        .iter()
        .map(Path::new)
        .find_map(|p| read_font(p).map(|font| (p, font)));

    if let Some((path, font)) = found {
        debug!(path = ?path, "loaded system label font");
        return Some(font);
    }

    match embedded_font() {
        Some(font) => {
            debug!("using embedded label font");
            Some(font)
        }
        None => {
            warn!("no usable font found; annotations will be drawn without text");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ab_glyph::{Font, PxScale};
    use imageproc::drawing::text_size;

    #[test]
    fn test_embedded_font_parses() {
        let font = embedded_font().unwrap();
        assert!(font.glyph_count() > 0);
        let (w, h) = text_size(PxScale::from(18.0), &font, "Matang 92%");
        assert!(w > 0 && h > 0);
    }

    #[test]
    fn test_unusable_configured_font_still_loads_one() {
        let dir = tempfile::TempDir::new().unwrap();
        let bogus = dir.path().join("not-a-font.ttf");
        std::fs::write(&bogus, b"garbage").unwrap();

        assert!(load_font(Some(&bogus)).is_some());
        assert!(load_font(Some(&dir.path().join("missing.ttf"))).is_some());
        assert!(load_font(None).is_some());
    }
}
