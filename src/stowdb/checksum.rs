//! Content-integrity checks for primary database files.
//!
//! A checksum is the MD5 digest of the primary file, hex-encoded as 32
//! lowercase characters. It can be persisted to a sidecar `.csm` file
//! next to the primary and compared later. The sidecar reflects the
//! file's content at the moment it was stored; it is the caller's job to
//! refresh it after writes.

use crate::error::Result;
use md5::{Digest, Md5};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

/// Files are digested in fixed-size blocks, never loaded whole.
const BLOCK_SIZE: usize = 1024;

/// Three-valued integrity verdict. `Unavailable` means one side of the
/// comparison did not exist, which is distinct from a real mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityCheck {
    Verified,
    Mismatched,
    Unavailable,
}

impl IntegrityCheck {
    pub fn is_verified(self) -> bool {
        self == IntegrityCheck::Verified
    }
}

/// Compute the checksum of `db_file`, or `None` if the file does not
/// exist.
pub fn compute_checksum(db_file: &Path) -> Result<Option<String>> {
    if !db_file.exists() {
        return Ok(None);
    }

    let mut file = File::open(db_file)?;
    let mut hasher = Md5::new();
    let mut block = [0u8; BLOCK_SIZE];
    loop {
        let len = file.read(&mut block)?;
        if len == 0 {
            break;
        }
        hasher.update(&block[..len]);
    }

    Ok(Some(hex::encode(hasher.finalize())))
}

/// Compute the checksum of `db_file` and write it as the entire content
/// of `sidecar`, creating or overwriting it. Returns the stored value,
/// or `None` (writing nothing) if the primary file does not exist.
pub fn store_checksum(db_file: &Path, sidecar: &Path) -> Result<Option<String>> {
    let checksum = match compute_checksum(db_file)? {
        Some(checksum) => checksum,
        None => return Ok(None),
    };
    fs::write(sidecar, &checksum)?;
    Ok(Some(checksum))
}

/// Read a previously stored checksum from `sidecar`, or `None` if no
/// sidecar exists. At most 32 bytes are read; trailing bytes are
/// ignored. Sidecar content is untrusted: arbitrary bytes load as a
/// (lossily decoded) value that simply fails to match, rather than an
/// error.
pub fn load_checksum(sidecar: &Path) -> Result<Option<String>> {
    if !sidecar.exists() {
        return Ok(None);
    }
    let content = fs::read(sidecar)?;
    let head = &content[..content.len().min(32)];
    Ok(Some(String::from_utf8_lossy(head).into_owned()))
}

/// Compare the stored checksum with a freshly computed one. Absence of
/// either side yields `Unavailable`, never an error.
pub fn verify_integrity(db_file: &Path, sidecar: &Path) -> Result<IntegrityCheck> {
    let stored = load_checksum(sidecar)?;
    let computed = compute_checksum(db_file)?;

    match (stored, computed) {
        (Some(stored), Some(computed)) => Ok(compare(&stored, &computed)),
        _ => Ok(IntegrityCheck::Unavailable),
    }
}

/// Compare a freshly computed checksum against a caller-supplied
/// expected value. `Unavailable` if the primary file does not exist.
pub fn verify_integrity_against(db_file: &Path, expected: &str) -> Result<IntegrityCheck> {
    match compute_checksum(db_file)? {
        Some(computed) => Ok(compare(expected, &computed)),
        None => Ok(IntegrityCheck::Unavailable),
    }
}

fn compare(expected: &str, computed: &str) -> IntegrityCheck {
    if expected.eq_ignore_ascii_case(computed) {
        IntegrityCheck::Verified
    } else {
        IntegrityCheck::Mismatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths(temp: &TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
        (
            temp.path().join("comics.s3db"),
            temp.path().join("comics.csm"),
        )
    }

    #[test]
    fn test_compute_checksum_is_lowercase_hex() {
        let temp = TempDir::new().unwrap();
        let (db, _) = paths(&temp);
        fs::write(&db, b"hello world").unwrap();

        let checksum = compute_checksum(&db).unwrap().unwrap();
        assert_eq!(checksum.len(), 32);
        assert!(checksum.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(checksum, checksum.to_lowercase());
        // Known MD5 of "hello world".
        assert_eq!(checksum, "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[test]
    fn test_compute_checksum_missing_file_is_none() {
        let temp = TempDir::new().unwrap();
        let (db, _) = paths(&temp);
        assert_eq!(compute_checksum(&db).unwrap(), None);
    }

    #[test]
    fn test_compute_checksum_spans_multiple_blocks() {
        let temp = TempDir::new().unwrap();
        let (db, _) = paths(&temp);
        fs::write(&db, vec![0xabu8; BLOCK_SIZE * 3 + 17]).unwrap();

        let first = compute_checksum(&db).unwrap().unwrap();
        let second = compute_checksum(&db).unwrap().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_store_then_verify_is_verified() {
        let temp = TempDir::new().unwrap();
        let (db, sidecar) = paths(&temp);
        fs::write(&db, b"issue #1").unwrap();

        store_checksum(&db, &sidecar).unwrap().unwrap();
        assert_eq!(
            verify_integrity(&db, &sidecar).unwrap(),
            IntegrityCheck::Verified
        );
    }

    #[test]
    fn test_changed_file_is_mismatched() {
        let temp = TempDir::new().unwrap();
        let (db, sidecar) = paths(&temp);
        fs::write(&db, b"issue #1").unwrap();
        store_checksum(&db, &sidecar).unwrap();

        fs::write(&db, b"issue #2").unwrap();
        assert_eq!(
            verify_integrity(&db, &sidecar).unwrap(),
            IntegrityCheck::Mismatched
        );
    }

    #[test]
    fn test_missing_sidecar_is_unavailable() {
        let temp = TempDir::new().unwrap();
        let (db, sidecar) = paths(&temp);
        fs::write(&db, b"issue #1").unwrap();

        assert_eq!(
            verify_integrity(&db, &sidecar).unwrap(),
            IntegrityCheck::Unavailable
        );
    }

    #[test]
    fn test_missing_primary_is_unavailable() {
        let temp = TempDir::new().unwrap();
        let (db, sidecar) = paths(&temp);
        fs::write(&sidecar, "5eb63bbbe01eeed093cb22bb8f5acdc3").unwrap();

        assert_eq!(
            verify_integrity(&db, &sidecar).unwrap(),
            IntegrityCheck::Unavailable
        );
    }

    #[test]
    fn test_verify_against_is_case_insensitive() {
        let temp = TempDir::new().unwrap();
        let (db, _) = paths(&temp);
        fs::write(&db, b"hello world").unwrap();

        assert_eq!(
            verify_integrity_against(&db, "5EB63BBBE01EEED093CB22BB8F5ACDC3").unwrap(),
            IntegrityCheck::Verified
        );
    }

    #[test]
    fn test_verify_against_round_trips_stored_value() {
        let temp = TempDir::new().unwrap();
        let (db, sidecar) = paths(&temp);
        fs::write(&db, b"issue #1").unwrap();

        let stored = store_checksum(&db, &sidecar).unwrap().unwrap();
        assert_eq!(
            verify_integrity_against(&db, &stored).unwrap(),
            IntegrityCheck::Verified
        );
    }

    #[test]
    fn test_load_checksum_reads_at_most_32_chars() {
        let temp = TempDir::new().unwrap();
        let (_, sidecar) = paths(&temp);
        fs::write(&sidecar, "5eb63bbbe01eeed093cb22bb8f5acdc3\ntrailing").unwrap();

        let loaded = load_checksum(&sidecar).unwrap().unwrap();
        assert_eq!(loaded, "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[test]
    fn test_corrupt_multibyte_sidecar_loads_and_mismatches() {
        let temp = TempDir::new().unwrap();
        let (db, sidecar) = paths(&temp);
        fs::write(&db, b"issue #1").unwrap();
        // 33 bytes; byte 32 falls inside a two-byte character.
        let corrupt = format!("a{}", "α".repeat(16));
        fs::write(&sidecar, corrupt).unwrap();

        assert!(load_checksum(&sidecar).unwrap().is_some());
        assert_eq!(
            verify_integrity(&db, &sidecar).unwrap(),
            IntegrityCheck::Mismatched
        );
    }

    #[test]
    fn test_non_utf8_sidecar_loads_and_mismatches() {
        let temp = TempDir::new().unwrap();
        let (db, sidecar) = paths(&temp);
        fs::write(&db, b"issue #1").unwrap();
        fs::write(&sidecar, vec![0xffu8; 40]).unwrap();

        assert!(load_checksum(&sidecar).unwrap().is_some());
        assert_eq!(
            verify_integrity(&db, &sidecar).unwrap(),
            IntegrityCheck::Mismatched
        );
    }

    #[test]
    fn test_store_checksum_overwrites_existing_sidecar() {
        let temp = TempDir::new().unwrap();
        let (db, sidecar) = paths(&temp);
        fs::write(&db, b"issue #1").unwrap();
        store_checksum(&db, &sidecar).unwrap();

        fs::write(&db, b"issue #2").unwrap();
        let updated = store_checksum(&db, &sidecar).unwrap().unwrap();
        assert_eq!(load_checksum(&sidecar).unwrap().unwrap(), updated);
    }

    #[test]
    fn test_store_checksum_missing_primary_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let (db, sidecar) = paths(&temp);

        assert_eq!(store_checksum(&db, &sidecar).unwrap(), None);
        assert!(!sidecar.exists());
    }
}
