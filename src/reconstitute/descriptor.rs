//! Pack and parallel descriptors supplied by the caller for each task

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// How the current execution reaches the original files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PackKind {
    /// Original files are on a filesystem mounted on this machine
    Shared,
    /// Any other strategy; kept so preparation can reject it explicitly
    Other(String),
}

impl From<String> for PackKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "shared" => PackKind::Shared,
            _ => PackKind::Other(value),
        }
    }
}

impl From<PackKind> for String {
    fn from(kind: PackKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for PackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackKind::Shared => write!(f, "shared"),
            PackKind::Other(other) => write!(f, "{other}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackDescriptor {
    #[serde(rename = "type")]
    pub kind: PackKind,

    /// Working directory of the task on the shared filesystem
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workdir: Option<PathBuf>,

    /// Local scratch space; when unset the task runs in `workdir` directly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmpdir: Option<PathBuf>,

    /// Reference data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datadir: Option<PathBuf>,
}

impl PackDescriptor {
    pub fn shared(workdir: impl Into<PathBuf>) -> Self {
        Self {
            kind: PackKind::Shared,
            workdir: Some(workdir.into()),
            tmpdir: None,
            datadir: None,
        }
    }

    pub fn with_tmpdir(mut self, tmpdir: impl Into<PathBuf>) -> Self {
        self.tmpdir = Some(tmpdir.into());
        self
    }

    pub fn with_datadir(mut self, datadir: impl Into<PathBuf>) -> Self {
        self.datadir = Some(datadir.into());
        self
    }

    /// The scratch directory, treating an empty path as unset.
    pub fn staging_tmpdir(&self) -> Option<&Path> {
        self.tmpdir
            .as_deref()
            .filter(|dir| !dir.as_os_str().is_empty())
    }
}

/// Per fan-out partition settings.
///
/// `fresources` lists context prefixes for the argument branches this
/// partition needs on local disk. Absent or empty means every branch.
/// Other fields that schedulers attach (queue, cores, memory) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pack: Option<PackDescriptor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fresources: Option<Vec<Vec<String>>>,
}

impl ParallelDescriptor {
    pub fn with_resources<I, P, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pack: None,
            fresources: Some(
                prefixes
                    .into_iter()
                    .map(|p| p.into_iter().map(Into::into).collect())
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_from_yaml() {
        let pack: PackDescriptor = serde_yaml::from_str(
            "type: shared\nworkdir: /shared/run1\ntmpdir: /scratch\n",
        )
        .unwrap();
        assert_eq!(pack.kind, PackKind::Shared);
        assert_eq!(pack.workdir.as_deref(), Some(Path::new("/shared/run1")));
        assert_eq!(pack.staging_tmpdir(), Some(Path::new("/scratch")));
        assert!(pack.datadir.is_none());
    }

    #[test]
    fn test_unknown_pack_type_parses() {
        let pack: PackDescriptor =
            serde_json::from_str(r#"{"type": "s3", "bucket": "runs"}"#).unwrap();
        assert_eq!(pack.kind, PackKind::Other("s3".to_string()));
        assert_eq!(serde_json::to_value(&pack).unwrap()["type"], "s3");
    }

    #[test]
    fn test_empty_tmpdir_is_unset() {
        let pack = PackDescriptor::shared("/shared/run1").with_tmpdir("");
        assert!(pack.staging_tmpdir().is_none());
    }

    #[test]
    fn test_parallel_tolerates_scheduler_fields() {
        let parallel: ParallelDescriptor = serde_yaml::from_str(
            "queue: batch\ncores_per_job: 4\nfresources:\n  - [align]\n  - [config, algorithm]\n",
        )
        .unwrap();
        assert_eq!(
            parallel.fresources,
            Some(vec![
                vec!["align".to_string()],
                vec!["config".to_string(), "algorithm".to_string()]
            ])
        );
        assert!(parallel.pack.is_none());
    }
}
