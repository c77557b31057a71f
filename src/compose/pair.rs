use std::path::{Path, PathBuf};

use crate::assets::images::list_image_files;
use crate::foundation::error::{ReelError, ReelResult};

/// A primary photograph and the secondary taken in the same session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImagePair {
    pub primary: PathBuf,
    pub secondary: PathBuf,
    /// Date or index prefix shared by both file names.
    pub sequence_key: String,
}

/// Sequence key of a photograph file name: everything before the first `_`.
///
/// Names without a usable prefix fall back to the file stem, so
/// `2023-01-05_primary.jpg` keys as `2023-01-05` and `0007.png` as `0007`.
pub fn sequence_key(file_name: &str) -> &str {
    match file_name.split_once('_') {
        Some((prefix, _)) if !prefix.is_empty() => prefix,
        _ => Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name),
    }
}

/// Match every primary in `primary_dir` with a secondary from `secondary_dir`.
///
/// A secondary with the same sequence key wins; otherwise the first secondary whose name starts
/// with the key. Results follow sorted primary order. A primary without a match yields
/// [`ReelError::MissingSecondary`] in its slot; callers decide whether to skip it.
pub fn pair_images(
    primary_dir: &Path,
    secondary_dir: &Path,
) -> ReelResult<Vec<ReelResult<ImagePair>>> {
    let primaries = list_image_files(primary_dir)?;
    let secondaries = list_image_files(secondary_dir)?;

    let secondary_names: Vec<(String, &PathBuf)> = secondaries
        .iter()
        .filter_map(|p| Some((p.file_name()?.to_str()?.to_owned(), p)))
        .collect();

    let mut out = Vec::with_capacity(primaries.len());
    for primary in primaries {
        let Some(name) = primary.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let key = sequence_key(name).to_owned();
        let matched = secondary_names
            .iter()
            .find(|(candidate, _)| sequence_key(candidate) == key)
            .or_else(|| {
                secondary_names
                    .iter()
                    .find(|(candidate, _)| candidate.starts_with(&key))
            })
            .map(|(_, path)| (*path).clone());

        out.push(match matched {
            Some(secondary) => Ok(ImagePair {
                primary,
                secondary,
                sequence_key: key,
            }),
            None => Err(ReelError::missing_secondary(key)),
        });
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/compose/pair.rs"]
mod tests;
