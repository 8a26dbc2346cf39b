//! Archive extraction for downloaded plan artifacts.

use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::{bail, Context, Result};

pub trait Archive: Send + Sync {
    /// Extracts every entry of `archive_path` into `dest_dir`.
    fn decompress(&self, dest_dir: &Path, archive_path: &Path) -> Result<()>;
}

pub struct ZipArchiver;

impl Archive for ZipArchiver {
    fn decompress(&self, dest_dir: &Path, archive_path: &Path) -> Result<()> {
        let file = File::open(archive_path)
            .with_context(|| format!("failed to open archive {}", archive_path.display()))?;
        let mut archive = zip::ZipArchive::new(file)
            .with_context(|| format!("failed to read archive {}", archive_path.display()))?;
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).context("failed to read entry")?;
            // Entries with traversal components must not escape dest_dir.
            let Some(relative) = entry.enclosed_name() else {
                bail!("archive entry {:?} escapes the destination", entry.name());
            };
            let target = dest_dir.join(relative);
            if entry.is_dir() {
                std::fs::create_dir_all(&target)
                    .with_context(|| format!("failed to create {}", target.display()))?;
                continue;
            }
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let mut out = File::create(&target)
                .with_context(|| format!("failed to create {}", target.display()))?;
            io::copy(&mut entry, &mut out)
                .with_context(|| format!("failed to extract {}", target.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    use super::{Archive, ZipArchiver};

    fn write_zip(path: &std::path::Path, entries: &[(&str, &str)]) {
        let file = std::fs::File::create(path).expect("create zip");
        let mut writer = zip::ZipWriter::new(file);
        for (name, contents) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .expect("start entry");
            writer.write_all(contents.as_bytes()).expect("write entry");
        }
        writer.finish().expect("finish zip");
    }

    #[test]
    fn functional_decompress_extracts_nested_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let archive = dir.path().join("plan.zip");
        write_zip(
            &archive,
            &[("core_default_7.tfplan", "plan bytes"), ("nested/note.txt", "note")],
        );
        let dest = dir.path().join("out");
        std::fs::create_dir_all(&dest).expect("dest dir");
        ZipArchiver.decompress(&dest, &archive).expect("extracted");
        let plan = std::fs::read_to_string(dest.join("core_default_7.tfplan")).expect("plan");
        assert_eq!(plan, "plan bytes");
        let note = std::fs::read_to_string(dest.join("nested/note.txt")).expect("note");
        assert_eq!(note, "note");
    }

    #[test]
    fn regression_decompress_rejects_entries_that_escape_the_destination() {
        let dir = tempfile::tempdir().expect("tempdir");
        let archive = dir.path().join("evil.zip");
        write_zip(&archive, &[("../outside.txt", "nope")]);
        let dest = dir.path().join("out");
        std::fs::create_dir_all(&dest).expect("dest dir");
        let error = ZipArchiver
            .decompress(&dest, &archive)
            .expect_err("rejected");
        assert!(error.to_string().contains("escapes"));
        assert!(!dir.path().join("outside.txt").exists());
    }
}
