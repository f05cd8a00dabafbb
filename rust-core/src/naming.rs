//! Short display names for data sources
//!
//! Sources are usually files whose names repeat across run directories
//! (`case_a/out.csv`, `case_b/out.csv`). The shortest distinguishing part of
//! each path becomes its name.

use std::collections::HashSet;
use std::path::{Component, Path};

/// Unique identifier for every path, aligned with the input.
///
/// Tries, in order: the file name; parent directory plus file name; the
/// span of path components that differ between paths; the paths with their
/// common leading and trailing characters stripped; and finally
/// `"{n}:{file name}"` numbered from 1.
pub fn unique_identifiers<P: AsRef<Path>>(paths: &[P]) -> Vec<String> {
    let paths: Vec<&Path> = paths.iter().map(AsRef::as_ref).collect();
    match paths.as_slice() {
        [] => return Vec::new(),
        [only] => return vec![file_name(only)],
        _ => {}
    }

    let names: Vec<String> = paths.iter().map(|p| file_name(p)).collect();
    if all_unique(&names) {
        return names;
    }

    let with_parent: Vec<String> = paths.iter().map(|p| parent_and_file_name(p)).collect();
    if all_unique(&with_parent) {
        return with_parent;
    }

    let parts: Vec<Vec<String>> = paths.iter().map(|p| components(p)).collect();
    let spans = differing_spans(&parts, &names);
    if all_unique(&spans) {
        return spans;
    }

    let normalized: Vec<String> = parts.iter().map(|p| p.join("/")).collect();
    let stripped = strip_common_affixes(&normalized);
    if all_unique(&stripped) {
        return stripped;
    }

    names
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{}:{name}", i + 1))
        .collect()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn parent_and_file_name(path: &Path) -> String {
    let parent = path
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned());
    match parent {
        Some(parent) => format!("{parent}/{}", file_name(path)),
        None => file_name(path),
    }
}

/// Path components with `.` and repeated separators removed
fn components(path: &Path) -> Vec<String> {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .map(|c| match c {
            Component::RootDir => String::new(),
            other => other.as_os_str().to_string_lossy().into_owned(),
        })
        .collect()
}

/// Components from the first differing one up to the last differing one
fn differing_spans(parts: &[Vec<String>], names: &[String]) -> Vec<String> {
    let min_len = parts.iter().map(Vec::len).min().unwrap_or(0);
    let first = &parts[0];

    let leading = (0..min_len)
        .find(|&i| parts.iter().any(|p| p[i] != first[i]))
        .unwrap_or(min_len);
    let trailing = (0..min_len)
        .find(|&i| {
            let last = &first[first.len() - 1 - i];
            parts.iter().any(|p| &p[p.len() - 1 - i] != last)
        })
        .unwrap_or(min_len);

    parts
        .iter()
        .zip(names)
        .map(|(part, name)| {
            let end = part.len().saturating_sub(trailing);
            if leading >= part.len() || trailing + 1 >= part.len() || leading >= end {
                name.clone()
            } else {
                part[leading..end].join("/")
            }
        })
        .collect()
}

fn strip_common_affixes(paths: &[String]) -> Vec<String> {
    let chars: Vec<Vec<char>> = paths.iter().map(|p| p.chars().collect()).collect();
    let min_len = chars.iter().map(Vec::len).min().unwrap_or(0);

    let prefix = (0..min_len)
        .find(|&i| chars.iter().any(|c| c[i] != chars[0][i]))
        .unwrap_or(min_len);
    let suffix = (0..min_len)
        .find(|&i| {
            let last = chars[0][chars[0].len() - 1 - i];
            chars.iter().any(|c| c[c.len() - 1 - i] != last)
        })
        .unwrap_or(min_len);

    chars
        .iter()
        .map(|c| {
            let end = c.len() - suffix;
            if prefix < end {
                c[prefix..end].iter().collect()
            } else {
                String::new()
            }
        })
        .collect()
}

fn all_unique(names: &[String]) -> bool {
    let mut seen = HashSet::with_capacity(names.len());
    names.iter().all(|name| seen.insert(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_and_distinct_names() {
        assert_eq!(unique_identifiers(&["/data/run/out.csv"]), vec!["out.csv"]);
        assert_eq!(
            unique_identifiers(&["/a/one.out", "/b/two.out"]),
            vec!["one.out", "two.out"]
        );
        assert!(unique_identifiers::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_parent_directory_disambiguates() {
        assert_eq!(
            unique_identifiers(&["/sims/case_a/out.csv", "/sims/case_b/out.csv"]),
            vec!["case_a/out.csv", "case_b/out.csv"]
        );
    }

    #[test]
    fn test_differing_component_span() {
        let ids = unique_identifiers(&[
            "/sims/v1/wind/out.csv",
            "/sims/v2/wind/out.csv",
        ]);
        assert_eq!(ids, vec!["v1", "v2"]);
    }

    #[test]
    fn test_duplicate_paths_fall_back_to_numbering() {
        let ids = unique_identifiers(&["/x/out.csv", "/x/out.csv"]);
        assert_eq!(ids, vec!["1:out.csv", "2:out.csv"]);
    }

    #[test]
    fn test_owned_paths() {
        let paths: Vec<String> = vec!["/runs/a/out.csv".into(), "/runs/b/out.csv".into()];
        assert_eq!(unique_identifiers(&paths), vec!["a/out.csv", "b/out.csv"]);
    }
}
