//! Flat volume table
//!
//! One row per line, fields separated by whitespace:
//!
//! ```text
//! vol0 janedoe@host:/home/janedoe
//! alias v0 vol0
//! ```
//!
//! The table is only ever read. It is re-read from disk on every lookup
//! through [`VolumeRegistry`], so edits made while a batch is running are
//! picked up by the next lookup.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::error::{MountError, Result};

/// Leading field that marks an alias row.
pub const ALIAS_MARKER: &str = "alias";

/// A single line of the volume table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    /// `name remote`
    Volume {
        line: usize,
        name: String,
        remote: String,
    },

    /// `alias name target`
    Alias {
        line: usize,
        alias: String,
        target: String,
    },

    /// Any other field count.
    Malformed { line: usize, fields: Vec<String> },
}

impl Row {
    fn parse(line: usize, text: &str) -> Option<Self> {
        let fields: Vec<&str> = text.split_whitespace().collect();

        let row = match fields.as_slice() {
            [] => return None,
            [ALIAS_MARKER, alias, target] => Row::Alias {
                line,
                alias: (*alias).to_string(),
                target: (*target).to_string(),
            },
            [name, remote] if *name != ALIAS_MARKER => Row::Volume {
                line,
                name: (*name).to_string(),
                remote: (*remote).to_string(),
            },
            _ => Row::Malformed {
                line,
                fields: fields.iter().map(|f| f.to_string()).collect(),
            },
        };

        Some(row)
    }

    /// The first field when this row names a volume, well-formed or not.
    ///
    /// Alias rows and broken alias rows never name a volume.
    pub fn volume_name(&self) -> Option<&str> {
        match self {
            Row::Volume { name, .. } => Some(name),
            Row::Malformed { fields, .. } => fields
                .first()
                .map(String::as_str)
                .filter(|first| *first != ALIAS_MARKER),
            Row::Alias { .. } => None,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Row::Volume { line, .. } | Row::Alias { line, .. } | Row::Malformed { line, .. } => {
                *line
            }
        }
    }
}

/// A requested name resolved to a concrete volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVolume {
    pub remote: String,
    pub name: String,
}

/// In-memory snapshot of the volume table.
#[derive(Debug, Clone, Default)]
pub struct VolumeTable {
    rows: Vec<Row>,
}

impl VolumeTable {
    /// Parse table text. Blank lines are skipped; line numbers are 1-based.
    pub fn parse(content: &str) -> Self {
        let rows = content
            .lines()
            .enumerate()
            .filter_map(|(idx, text)| Row::parse(idx + 1, text))
            .collect();

        Self { rows }
    }

    /// Load the table at `path`, creating an empty file (and its parent
    /// directories) when it does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        let storage = |source| MountError::Storage {
            path: path.to_path_buf(),
            source,
        };

        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(storage)?;
            }
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(storage)?;
            tracing::debug!("Created empty volume table {}", path.display());
        }

        let content = std::fs::read_to_string(path).map_err(storage)?;
        let table = Self::parse(&content);

        tracing::debug!(
            "Loaded {} row(s) from volume table {}",
            table.rows.len(),
            path.display()
        );

        Ok(table)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Target of the first alias row for `name`, if any.
    pub fn alias_target(&self, name: &str) -> Option<&str> {
        self.rows.iter().find_map(|row| match row {
            Row::Alias { alias, target, .. } if alias == name => Some(target.as_str()),
            _ => None,
        })
    }

    /// Resolve `requested` through at most one alias hop to a single volume.
    ///
    /// An alias pointing at another alias is not followed further.
    pub fn resolve(&self, requested: &str) -> Result<ResolvedVolume> {
        let name = self.alias_target(requested).unwrap_or(requested);

        let matches: Vec<&Row> = self
            .rows
            .iter()
            .filter(|row| row.volume_name() == Some(name))
            .collect();

        match matches.as_slice() {
            [] => Err(MountError::NotFound(format!(
                "Volume '{}' not found in volume table",
                name
            ))),
            [Row::Volume { remote, .. }] => Ok(ResolvedVolume {
                remote: remote.clone(),
                name: name.to_string(),
            }),
            [row] => Err(MountError::MalformedRecord {
                name: name.to_string(),
                line: row.line(),
                fields: match row {
                    Row::Malformed { fields, .. } => fields.len(),
                    _ => 0,
                },
            }),
            many => Err(MountError::AmbiguousName {
                name: name.to_string(),
                count: many.len(),
            }),
        }
    }

    /// Every distinct volume name, in order of first appearance.
    ///
    /// Malformed rows contribute their first field so that a batch over the
    /// table reports them as failures instead of silently skipping them.
    pub fn volume_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();

        for name in self.rows.iter().filter_map(Row::volume_name) {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }

        names
    }
}

/// Load-on-demand handle to the table file.
#[derive(Debug, Clone)]
pub struct VolumeRegistry {
    path: PathBuf,
}

impl VolumeRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<VolumeTable> {
        VolumeTable::load(&self.path)
    }

    /// Re-read the table and resolve `requested`.
    pub fn resolve(&self, requested: &str) -> Result<ResolvedVolume> {
        self.load()?.resolve(requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
vol0 janedoe@host:/home/janedoe
alias v0 vol0
backup admin@nas:/srv/backup

dup user@a:/x
dup user@b:/y
broken user@c:/z extra
alias chained v0
alias half
";

    #[test]
    fn test_parse_row_kinds() {
        let table = VolumeTable::parse(SAMPLE);
        let rows = table.rows();

        assert_eq!(rows.len(), 8);
        assert_eq!(
            rows[0],
            Row::Volume {
                line: 1,
                name: "vol0".into(),
                remote: "janedoe@host:/home/janedoe".into()
            }
        );
        assert_eq!(
            rows[1],
            Row::Alias {
                line: 2,
                alias: "v0".into(),
                target: "vol0".into()
            }
        );
        // Blank line 4 is skipped but line numbers keep counting.
        assert_eq!(rows[3].line(), 5);
        assert!(matches!(rows[5], Row::Malformed { line: 7, .. }));
        assert!(matches!(rows[7], Row::Malformed { line: 9, .. }));
    }

    #[test]
    fn test_parse_tolerates_extra_whitespace() {
        let table = VolumeTable::parse("  vol0 \t janedoe@host:/home  \n");
        assert_eq!(
            table.resolve("vol0").unwrap().remote,
            "janedoe@host:/home"
        );
    }

    #[test]
    fn test_resolve_direct() {
        let table = VolumeTable::parse(SAMPLE);
        let resolved = table.resolve("vol0").unwrap();
        assert_eq!(resolved.remote, "janedoe@host:/home/janedoe");
        assert_eq!(resolved.name, "vol0");
    }

    #[test]
    fn test_resolve_alias_matches_direct() {
        let table = VolumeTable::parse(SAMPLE);
        assert_eq!(table.resolve("v0").unwrap(), table.resolve("vol0").unwrap());
    }

    #[test]
    fn test_resolve_alias_is_single_hop() {
        let table = VolumeTable::parse(SAMPLE);
        // chained -> v0 is followed once; v0 is not a volume row.
        assert!(matches!(
            table.resolve("chained"),
            Err(MountError::NotFound(_))
        ));
    }

    #[test]
    fn test_resolve_duplicate_is_ambiguous() {
        let table = VolumeTable::parse(SAMPLE);
        match table.resolve("dup") {
            Err(MountError::AmbiguousName { name, count }) => {
                assert_eq!(name, "dup");
                assert_eq!(count, 2);
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_missing_is_not_found() {
        let table = VolumeTable::parse(SAMPLE);
        assert!(matches!(
            table.resolve("nope"),
            Err(MountError::NotFound(_))
        ));
    }

    #[test]
    fn test_resolve_malformed_is_error() {
        let table = VolumeTable::parse(SAMPLE);
        match table.resolve("broken") {
            Err(MountError::MalformedRecord { line, fields, .. }) => {
                assert_eq!(line, 7);
                assert_eq!(fields, 3);
            }
            other => panic!("expected malformed record, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_lone_name_is_malformed() {
        let table = VolumeTable::parse("lonely\n");
        assert!(matches!(
            table.resolve("lonely"),
            Err(MountError::MalformedRecord { fields: 1, .. })
        ));
    }

    #[test]
    fn test_volume_names_distinct_and_ordered() {
        let table = VolumeTable::parse(SAMPLE);
        assert_eq!(
            table.volume_names(),
            vec!["vol0", "backup", "dup", "broken"]
        );
    }

    #[test]
    fn test_hash_line_is_a_row_not_a_comment() {
        let table = VolumeTable::parse("# ~/.config/sshmount/volumes\nvol0 a@b:/c\n");
        assert_eq!(table.volume_names(), vec!["#", "vol0"]);

        let table = VolumeTable::parse("vol0 janedoe@host:/home/janedoe\nalias v0 vol0\n");
        assert_eq!(table.volume_names(), vec!["vol0"]);
        assert_eq!(table.resolve("v0").unwrap().name, "vol0");
    }

    #[test]
    fn test_load_creates_missing_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("volumes");

        let table = VolumeTable::load(&path).unwrap();
        assert!(table.rows().is_empty());
        assert!(path.exists());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_load_does_not_touch_existing_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("volumes");
        std::fs::write(&path, SAMPLE).unwrap();

        VolumeTable::load(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), SAMPLE);
    }

    #[test]
    fn test_load_unreadable_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be read as a table.
        assert!(matches!(
            VolumeTable::load(dir.path()),
            Err(MountError::Storage { .. })
        ));
    }

    #[test]
    fn test_registry_rereads_on_every_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("volumes");
        std::fs::write(&path, "vol0 a@h:/one\n").unwrap();

        let registry = VolumeRegistry::new(&path);
        assert_eq!(registry.resolve("vol0").unwrap().remote, "a@h:/one");

        std::fs::write(&path, "vol0 a@h:/two\n").unwrap();
        assert_eq!(registry.resolve("vol0").unwrap().remote, "a@h:/two");
    }
}
