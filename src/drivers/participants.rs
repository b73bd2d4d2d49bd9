use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use log::info;
use crate::drivers::RespirationError;
/// Three-digit tag used in log file names (`7` -> `007`).
pub fn participant_tag(participant: u32) -> String {
    format!("{participant:03}")
}
/// Newline-separated list of participant numbers already used for a session.
pub struct ParticipantRegistry {
    path: PathBuf,
    known: Vec<u32>,
}
impl ParticipantRegistry {
    /// Load the list; a missing file is an empty registry.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RespirationError> {
        let path = path.as_ref().to_path_buf();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        let mut known = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let number = line
                .parse::<u32>()
                .map_err(|e| RespirationError::MalformedLine {
                    line: idx + 1,
                    reason: format!("bad participant number `{line}`: {e}"),
                })?;
            known.push(number);
        }
        Ok(Self { path, known })
    }
    pub fn contains(&self, participant: u32) -> bool {
        self.known.contains(&participant)
    }
    pub fn participants(&self) -> &[u32] {
        &self.known
    }
    /// Record a new participant, appending it to the list file.
    pub fn register(&mut self, participant: u32) -> Result<(), RespirationError> {
        if participant == 0 {
            return Err(RespirationError::InvalidParticipant);
        }
        if self.contains(participant) {
            return Err(RespirationError::DuplicateParticipant(participant));
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{participant}")?;
        self.known.push(participant);
        info!("registered participant {}", participant_tag(participant));
        Ok(())
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn tags_are_zero_padded() {
        assert_eq!(participant_tag(7), "007");
        assert_eq!(participant_tag(42), "042");
        assert_eq!(participant_tag(123), "123");
        assert_eq!(participant_tag(1234), "1234");
    }
    #[test]
    fn registers_and_rejects_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ppnlist.txt");
        let mut registry = ParticipantRegistry::open(&path).unwrap();
        assert!(registry.participants().is_empty());
        registry.register(3).unwrap();
        registry.register(11).unwrap();
        assert!(matches!(
            registry.register(3),
            Err(RespirationError::DuplicateParticipant(3))
        ));
        assert!(matches!(
            registry.register(0),
            Err(RespirationError::InvalidParticipant)
        ));
        let reopened = ParticipantRegistry::open(&path).unwrap();
        assert_eq!(reopened.participants(), &[3, 11]);
        assert!(reopened.contains(11));
    }
    #[test]
    fn corrupt_list_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ppnlist.txt");
        fs::write(&path, "1\n\nabc\n").unwrap();
        assert!(matches!(
            ParticipantRegistry::open(&path),
            Err(RespirationError::MalformedLine { line: 3, .. })
        ));
    }
}
