//! File rotation for the logger

use crate::logger::LoggerError;
use crate::logger::compression::compress_file;
use crate::logger::config::{RotationConfig, RotationStrategy};
use jiff::Zoned;
use jiff::civil::Date;
use std::fs;
use std::path::{Path, PathBuf};

pub struct RotationManager {
    config: RotationConfig,
    opened_on: Date,
}

impl RotationManager {
    pub fn new(config: RotationConfig) -> Self {
        Self {
            config,
            opened_on: Zoned::now().date(),
        }
    }

    pub fn should_rotate(&self, current_size: u64) -> bool {
        self.should_rotate_on(current_size, Zoned::now().date())
    }

    fn should_rotate_on(&self, current_size: u64, today: Date) -> bool {
        match self.config.strategy {
            RotationStrategy::Size => current_size >= self.config.max_size,
            RotationStrategy::Daily => today > self.opened_on && current_size > 0,
        }
    }

    /// Renames the active file, compresses it if configured and prunes old files.
    pub fn rotate(&mut self, active: &Path) -> Result<(), LoggerError> {
        if active.exists() {
            let rotated = rotated_path(active, &Zoned::now());
            fs::rename(active, &rotated)?;

            if self.config.compress {
                compress_file(&rotated)?;
            }
        }

        self.opened_on = Zoned::now().date();
        self.prune(active)
    }

    fn prune(&self, active: &Path) -> Result<(), LoggerError> {
        let parent = match active.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let stem = active
            .file_stem()
            .map(|s| format!("{}.", s.to_string_lossy()))
            .ok_or_else(|| LoggerError::rotation("log path has no file name"))?;

        let mut rotated: Vec<(PathBuf, std::time::SystemTime)> = fs::read_dir(parent)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path != active)
            .filter(|path| {
                path.file_name()
                    .map(|n| n.to_string_lossy().starts_with(&stem))
                    .unwrap_or(false)
            })
            .filter_map(|path| {
                let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
                Some((path, modified))
            })
            .collect();

        if rotated.len() <= self.config.max_files {
            return Ok(());
        }

        rotated.sort_by_key(|(_, modified)| *modified);
        let excess = rotated.len() - self.config.max_files;
        for (path, _) in rotated.into_iter().take(excess) {
            fs::remove_file(path)?;
        }

        Ok(())
    }
}

/// `logs/ecommerce.log` -> `logs/ecommerce.20261019_142501.log`
fn rotated_path(active: &Path, now: &Zoned) -> PathBuf {
    let stamp = now.strftime("%Y%m%d_%H%M%S");
    let stem = active.file_stem().unwrap_or_default().to_string_lossy();
    let name = match active.extension() {
        Some(ext) => format!("{}.{}.{}", stem, stamp, ext.to_string_lossy()),
        None => format!("{}.{}", stem, stamp),
    };
    active.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::{Duration, SystemTime};
    use tempfile::tempdir;

    fn size_config(max_size: u64, max_files: usize) -> RotationConfig {
        RotationConfig {
            strategy: RotationStrategy::Size,
            max_size,
            max_files,
            compress: false,
        }
    }

    #[test]
    fn test_daily_rotation_waits_for_next_day() {
        let mut config = size_config(1, 3);
        config.strategy = RotationStrategy::Daily;
        let manager = RotationManager::new(config);
        let today = manager.opened_on;

        assert!(!manager.should_rotate_on(500, today));
        assert!(manager.should_rotate_on(500, today.tomorrow().unwrap()));
        assert!(!manager.should_rotate_on(0, today.tomorrow().unwrap()));
    }

    #[test]
    fn test_rotated_path_keeps_extension() {
        let now: Zoned = "2026-10-19T14:25:01[UTC]".parse().unwrap();
        let rotated = rotated_path(Path::new("logs/ecommerce.log"), &now);
        assert_eq!(rotated, PathBuf::from("logs/ecommerce.20261019_142501.log"));

        let rotated = rotated_path(Path::new("logs/ecommerce"), &now);
        assert_eq!(rotated, PathBuf::from("logs/ecommerce.20261019_142501"));
    }

    #[test]
    fn test_rotate_with_compression() {
        let dir = tempdir().unwrap();
        let active = dir.path().join("ecommerce.log");
        fs::write(&active, "line").unwrap();

        let mut config = size_config(1, 3);
        config.compress = true;
        let mut manager = RotationManager::new(config);
        manager.rotate(&active).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with(".log.gz"));
    }

    #[test]
    fn test_prune_removes_oldest_first() {
        let dir = tempdir().unwrap();
        let active = dir.path().join("ecommerce.log");
        let base = SystemTime::now() - Duration::from_secs(3600);

        for i in 0..4u64 {
            let path = dir.path().join(format!("ecommerce.2026010{}_000000.log", i));
            fs::write(&path, "old").unwrap();
            let mtime = filetime::FileTime::from_system_time(base + Duration::from_secs(i * 60));
            filetime::set_file_mtime(&path, mtime).unwrap();
        }
        fs::write(dir.path().join("other.log"), "unrelated").unwrap();

        let manager = RotationManager::new(size_config(10, 2));
        manager.prune(&active).unwrap();

        assert!(!dir.path().join("ecommerce.20260100_000000.log").exists());
        assert!(!dir.path().join("ecommerce.20260101_000000.log").exists());
        assert!(dir.path().join("ecommerce.20260102_000000.log").exists());
        assert!(dir.path().join("ecommerce.20260103_000000.log").exists());
        assert!(dir.path().join("other.log").exists());
    }

    proptest! {
        #[test]
        fn property_size_rotation_threshold(current in 0u64..10_000_000, max in 1u64..10_000_000) {
            let manager = RotationManager::new(size_config(max, 5));
            prop_assert_eq!(manager.should_rotate(current), current >= max);
        }
    }
}
