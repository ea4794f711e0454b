use std::path::PathBuf;

use super::{CaptureError, EncodedImage, ImageSink};

/// Writes captures as PNG files, replacing any previous file of the same name
pub struct PngFileSink {
    pub dir: PathBuf,
    pub file_name: String,
}

impl PngFileSink {
    pub fn new(dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            file_name: file_name.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

impl ImageSink for PngFileSink {
    fn save(&mut self, image: &EncodedImage) -> Result<PathBuf, CaptureError> {
        let path = self.path();
        std::fs::create_dir_all(&self.dir).map_err(|source| CaptureError::Save {
            path: self.dir.clone(),
            source,
        })?;
        std::fs::write(&path, &image.png).map_err(|source| CaptureError::Save {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

/// Keeps captures in memory; used by the headless harness
#[derive(Default)]
pub struct MemorySink {
    pub images: Vec<EncodedImage>,
}

impl MemorySink {
    pub fn last(&self) -> Option<&EncodedImage> {
        self.images.last()
    }
}

impl ImageSink for MemorySink {
    fn save(&mut self, image: &EncodedImage) -> Result<PathBuf, CaptureError> {
        self.images.push(image.clone());
        Ok(PathBuf::from(format!("memory/capture-{}.png", self.images.len())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> EncodedImage {
        EncodedImage::from_rgba(&image::RgbaImage::new(3, 3)).unwrap()
    }

    #[test]
    fn test_file_sink_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = PngFileSink::new(dir.path().join("shots"), "screenshot.png");
        let path = sink.save(&tiny()).unwrap();
        assert_eq!(path, dir.path().join("shots").join("screenshot.png"));
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn test_file_sink_reports_unwritable_target() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the directory should be
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, b"x").unwrap();
        let mut sink = PngFileSink::new(&blocker, "screenshot.png");
        assert!(matches!(sink.save(&tiny()), Err(CaptureError::Save { .. })));
    }

    #[test]
    fn test_memory_sink_numbers_captures() {
        let mut sink = MemorySink::default();
        sink.save(&tiny()).unwrap();
        let path = sink.save(&tiny()).unwrap();
        assert_eq!(path, PathBuf::from("memory/capture-2.png"));
        assert_eq!(sink.images.len(), 2);
    }
}
