//! Page rasterisation to PNG files.
//!
//! Rendering goes through [`PageSource::render_page`]; this module only
//! names the output, creates the book's image directory and encodes the
//! bitmap. Every failure comes back as a [`PageWarning::Render`] so the
//! caller can record it and carry on with the book.

use crate::error::PageWarning;
use crate::pipeline::source::PageSource;
use image::ImageFormat;
use std::path::Path;
use tracing::debug;

/// File name of a page image inside the book's image directory.
pub fn page_image_name(page: u32) -> String {
    format!("page_{page}.png")
}

/// Hero image: page 1 at the title scale.
pub const TITLE_IMAGE: &str = "title.png";

/// Tile image: page 1 at the small title scale.
pub const TITLE_SMALL_IMAGE: &str = "title_small.png";

/// Render `page` at `scale` and save it as PNG at `path`.
///
/// `file_name` is reported in the warning when anything goes wrong.
pub fn render_png(
    doc: &dyn PageSource,
    page: u32,
    scale: f32,
    path: &Path,
    file_name: &str,
) -> Result<(), PageWarning> {
    let warn = |detail: String| PageWarning::Render {
        page,
        image: file_name.to_string(),
        detail,
    };

    let image = doc.render_page(page, scale).map_err(|w| match w {
        PageWarning::Render { detail, .. } | PageWarning::TextExtraction { detail, .. } => {
            warn(detail)
        }
    })?;

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .map_err(|e| warn(format!("cannot create {}: {e}", dir.display())))?;
    }

    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| warn(format!("cannot save {}: {e}", path.display())))?;

    debug!(
        "Rendered page {} → {} ({}x{} px)",
        page,
        path.display(),
        image.width(),
        image.height()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};
    use tempfile::TempDir;

    struct Blank;

    impl PageSource for Blank {
        fn page_count(&self) -> u32 {
            2
        }

        fn page_text(&self, _page: u32) -> Result<String, PageWarning> {
            Ok(String::new())
        }

        fn render_page(&self, page: u32, scale: f32) -> Result<DynamicImage, PageWarning> {
            if page == 2 {
                return Err(PageWarning::Render {
                    page,
                    image: String::new(),
                    detail: "broken content stream".into(),
                });
            }
            let side = (10.0 * scale) as u32;
            Ok(DynamicImage::ImageRgb8(RgbImage::new(side, side)))
        }
    }

    #[test]
    fn writes_png_and_creates_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("images").join("7").join("page_1.png");
        render_png(&Blank, 1, 2.0, &path, "page_1.png").unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (20, 20));
    }

    #[test]
    fn render_failure_names_the_image() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page_2.png");
        let w = render_png(&Blank, 2, 1.0, &path, "page_2.png").unwrap_err();
        assert_eq!(
            w,
            PageWarning::Render {
                page: 2,
                image: "page_2.png".into(),
                detail: "broken content stream".into(),
            }
        );
        assert!(!path.exists());
    }

    #[test]
    fn image_names() {
        assert_eq!(page_image_name(12), "page_12.png");
        assert_eq!(TITLE_IMAGE, "title.png");
        assert_eq!(TITLE_SMALL_IMAGE, "title_small.png");
    }
}
