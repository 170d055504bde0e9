//! Logo checks
//!
//! A logo is either an SVG or a raster image that fits a square bounding box
//! with at least one side exactly as long as the box.

use std::path::Path;

use crate::registry::contained_path;
use crate::report::{IssueKind, PackageIssue};

/// Default bounding box edge in pixels.
pub const DEFAULT_LOGO_SIZE: u32 = 512;

/// Checks the logo a package declares, relative to its directory.
///
/// The logo must stay inside `package_dir`.
pub fn check_package_logo(package_dir: &Path, logo: &str, size: u32) -> Option<PackageIssue> {
    match contained_path(logo) {
        Some(relative) => check_logo(&package_dir.join(relative), size),
        None => Some(logo_issue(format!(
            "Logo path '{}' must be relative and stay inside the package directory",
            logo
        ))),
    }
}

/// Checks the logo at `path` against a `size`x`size` bounding box.
pub fn check_logo(path: &Path, size: u32) -> Option<PackageIssue> {
    if !path.is_file() {
        return Some(logo_issue(format!("Image does not exist: {}", path.display())));
    }

    let is_svg = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("svg"));
    if is_svg {
        return None;
    }

    let (width, height) = match image::image_dimensions(path) {
        Ok(dimensions) => dimensions,
        Err(e) => {
            return Some(logo_issue(format!(
                "Cannot read image {}: {}",
                path.display(),
                e
            )))
        }
    };

    if fits_bounding_box(width, height, size) {
        None
    } else {
        Some(logo_issue(format!(
            "Image {} must fit in a {size}x{size}px bounding box and one dimension must be \
             exactly {size}px. Actual dimensions (width, height): ({}, {})",
            path.display(),
            width,
            height,
        )))
    }
}

/// True if the image fits the box and touches it on at least one side.
pub fn fits_bounding_box(width: u32, height: u32, size: u32) -> bool {
    (width == size && height <= size) || (width <= size && height == size)
}

fn logo_issue(message: String) -> PackageIssue {
    PackageIssue::for_field(IssueKind::InvalidLogo, "logo", message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_fits_bounding_box() {
        assert!(fits_bounding_box(512, 512, 512));
        assert!(fits_bounding_box(512, 200, 512));
        assert!(fits_bounding_box(100, 512, 512));
        assert!(!fits_bounding_box(256, 256, 512));
        assert!(!fits_bounding_box(600, 512, 512));
    }

    #[test]
    fn test_missing_logo() {
        let temp_dir = TempDir::new().unwrap();
        let issue = check_logo(&temp_dir.path().join("logo.png"), DEFAULT_LOGO_SIZE).unwrap();
        assert_eq!(issue.kind, IssueKind::InvalidLogo);
        assert!(issue.message.contains("does not exist"));
    }

    #[test]
    fn test_svg_accepted_without_decoding() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("logo.svg");
        fs::write(&path, "<svg xmlns=\"http://www.w3.org/2000/svg\"/>").unwrap();
        assert!(check_logo(&path, DEFAULT_LOGO_SIZE).is_none());
    }

    #[test]
    fn test_raster_dimensions() {
        let temp_dir = TempDir::new().unwrap();

        let good = temp_dir.path().join("good.png");
        RgbImage::new(512, 128).save(&good).unwrap();
        assert!(check_logo(&good, DEFAULT_LOGO_SIZE).is_none());

        let small = temp_dir.path().join("small.png");
        RgbImage::new(64, 64).save(&small).unwrap();
        let issue = check_logo(&small, DEFAULT_LOGO_SIZE).unwrap();
        assert!(issue.message.contains("(64, 64)"));
    }

    #[test]
    fn test_package_logo_must_stay_inside() {
        let temp_dir = TempDir::new().unwrap();
        let package_dir = temp_dir.path().join("scanpy");
        fs::create_dir(&package_dir).unwrap();
        fs::write(temp_dir.path().join("outside.svg"), "<svg/>").unwrap();
        fs::write(package_dir.join("logo.svg"), "<svg/>").unwrap();

        assert!(check_package_logo(&package_dir, "logo.svg", DEFAULT_LOGO_SIZE).is_none());

        let outside = temp_dir.path().join("outside.svg");
        for logo in ["../outside.svg", outside.to_str().unwrap()] {
            let issue = check_package_logo(&package_dir, logo, DEFAULT_LOGO_SIZE).unwrap();
            assert_eq!(issue.kind, IssueKind::InvalidLogo);
            assert!(issue.message.contains("stay inside the package directory"));
        }
    }

    #[test]
    fn test_unreadable_raster() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("logo.png");
        fs::write(&path, "not a png").unwrap();
        let issue = check_logo(&path, DEFAULT_LOGO_SIZE).unwrap();
        assert!(issue.message.contains("Cannot read image"));
    }
}
