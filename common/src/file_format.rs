use std::path::Path;

/// Returns the lowercase extension of `path` without the leading dot.
pub fn get_file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|os_str| os_str.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(
            get_file_extension(Path::new("mask2560_0.PNG")).as_deref(),
            Some("png")
        );
        assert_eq!(
            get_file_extension(Path::new("dir.v2/bathymetry.tif")).as_deref(),
            Some("tif")
        );
    }

    #[test]
    fn missing_extension() {
        assert_eq!(get_file_extension(Path::new("mask")), None);
        assert_eq!(get_file_extension(Path::new(".hidden")), None);
    }
}
