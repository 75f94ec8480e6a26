//! Splitting input files into fixed-size work groups.

use arrow::datatypes::SchemaRef;
use std::path::{Path, PathBuf};

use crate::error::{HiveError, Result};
use crate::table;

/// One slot of a work group.
#[derive(Debug, Clone)]
pub enum GroupEntry {
    /// An input file to load.
    File(PathBuf),
    /// Empty batch padding the last group, typed with the schema of `source`
    /// (the first input).
    Placeholder { schema: SchemaRef, source: PathBuf },
}

/// A fixed-size run of inputs handed to exactly one worker.
#[derive(Debug, Clone)]
pub struct WorkGroup {
    /// Position of the group in the plan.
    pub index: usize,
    pub entries: Vec<GroupEntry>,
}

impl WorkGroup {
    /// Input files of this group, in plan order.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().filter_map(|entry| match entry {
            GroupEntry::File(path) => Some(path.as_path()),
            GroupEntry::Placeholder { .. } => None,
        })
    }

    /// Number of placeholder entries.
    pub fn placeholders(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry, GroupEntry::Placeholder { .. }))
            .count()
    }
}

/// Worker count actually used: never more workers than input files.
pub fn effective_threads(requested: usize, num_paths: usize) -> usize {
    requested.min(num_paths)
}

/// Plan work groups for `paths`.
///
/// The schema of `paths[0]` is read from its footer only when the last group
/// needs padding.
pub fn plan(paths: &[PathBuf], group_size: usize) -> Result<Vec<WorkGroup>> {
    check_group_size(group_size)?;

    let Some(first) = paths.first() else {
        return Ok(Vec::new());
    };

    if paths.len() % group_size == 0 {
        return Ok(chunk(paths, group_size, None));
    }

    let schema = table::scan_schema(first)?;
    Ok(chunk(paths, group_size, Some((schema, first.as_path()))))
}

fn check_group_size(group_size: usize) -> Result<()> {
    if group_size == 0 {
        return Err(HiveError::config("group_size must be > 0"));
    }
    Ok(())
}

fn chunk(
    paths: &[PathBuf],
    group_size: usize,
    placeholder: Option<(SchemaRef, &Path)>,
) -> Vec<WorkGroup> {
    paths
        .chunks(group_size)
        .enumerate()
        .map(|(index, files)| {
            let mut entries: Vec<GroupEntry> =
                files.iter().cloned().map(GroupEntry::File).collect();

            if let Some((schema, source)) = &placeholder {
                while entries.len() < group_size {
                    entries.push(GroupEntry::Placeholder {
                        schema: schema.clone(),
                        source: source.to_path_buf(),
                    });
                }
            }

            WorkGroup { index, entries }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn paths(n: usize) -> Vec<PathBuf> {
        (0..n)
            .map(|i| PathBuf::from(format!("sample{}.parquet", i)))
            .collect()
    }

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)]))
    }

    fn padded(paths: &[PathBuf], group_size: usize) -> Vec<WorkGroup> {
        chunk(paths, group_size, Some((schema(), paths[0].as_path())))
    }

    #[test]
    fn test_groups_reconstruct_input_order() {
        for n in 1..=23 {
            for group_size in 1..=7 {
                let input = paths(n);
                let groups = padded(&input, group_size);

                assert_eq!(groups.len(), n.div_ceil(group_size));
                assert!(groups.iter().all(|g| g.entries.len() == group_size));

                let flattened: Vec<PathBuf> = groups
                    .iter()
                    .flat_map(|g| g.files().map(Path::to_path_buf))
                    .collect();
                assert_eq!(flattened, input, "n={} group_size={}", n, group_size);

                for (i, group) in groups.iter().enumerate() {
                    assert_eq!(group.index, i);
                }
            }
        }
    }

    #[test]
    fn test_only_last_group_is_padded() {
        let groups = padded(&paths(7), 5);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].placeholders(), 0);
        assert_eq!(groups[1].placeholders(), 3);
        assert_eq!(groups[1].files().count(), 2);
        match &groups[1].entries[4] {
            GroupEntry::Placeholder { source, .. } => {
                assert_eq!(source, &PathBuf::from("sample0.parquet"))
            }
            other => panic!("expected placeholder, got {:?}", other),
        }
    }

    #[test]
    fn test_exact_multiple_needs_no_schema() {
        // Files do not exist: the footer must not be read when no padding is needed.
        let groups = plan(&paths(10), 5).unwrap();
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.placeholders() == 0));
    }

    #[test]
    fn test_empty_paths_empty_plan() {
        assert!(plan(&[], 5).unwrap().is_empty());
    }

    #[test]
    fn test_zero_group_size_rejected() {
        assert!(matches!(plan(&paths(3), 0), Err(HiveError::Config(_))));
    }

    #[test]
    fn test_padding_reads_first_file_schema() {
        let err = plan(&paths(3), 2).unwrap_err();
        assert!(err.to_string().contains("sample0.parquet"));
    }

    #[test]
    fn test_effective_threads_clamped() {
        assert_eq!(effective_threads(10, 3), 3);
        assert_eq!(effective_threads(2, 7), 2);
        assert_eq!(effective_threads(4, 0), 0);
    }
}
