//! Gzip compression of rotated log files

use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

/// Compresses `path` into `path.gz` and removes the original.
pub fn compress_file(path: &Path) -> io::Result<PathBuf> {
    let mut compressed_name = path.as_os_str().to_owned();
    compressed_name.push(".gz");
    let compressed_path = PathBuf::from(compressed_name);

    let mut input = BufReader::new(File::open(path)?);
    let mut encoder = GzEncoder::new(File::create(&compressed_path)?, Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?;

    fs::remove_file(path)?;
    Ok(compressed_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use proptest::prelude::*;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn test_compress_replaces_original() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("ecommerce.20260101_000000.log");
        fs::write(&file_path, "order 1 placed").unwrap();

        let compressed = compress_file(&file_path).unwrap();

        assert!(!file_path.exists());
        assert_eq!(
            compressed.file_name().unwrap().to_string_lossy(),
            "ecommerce.20260101_000000.log.gz"
        );
    }

    #[test]
    fn test_compress_missing_file_fails() {
        let dir = tempdir().unwrap();
        assert!(compress_file(&dir.path().join("absent.log")).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        #[test]
        fn property_compressed_content_decodes(content in ".{0,2000}") {
            let dir = tempdir().unwrap();
            let file_path = dir.path().join("app.log");
            fs::write(&file_path, &content).unwrap();

            let compressed = compress_file(&file_path).unwrap();
            let mut decoded = String::new();
            GzDecoder::new(File::open(compressed).unwrap())
                .read_to_string(&mut decoded)
                .unwrap();

            prop_assert_eq!(decoded, content);
        }
    }
}
