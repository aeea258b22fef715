use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_SECTION: &str = "DEFAULT";
const DICT_KEY: &str = "dict";

#[derive(Error, Debug)]
pub enum DictionaryError {
    #[error("Failed to read options file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse fuzzer options file {path:?}: line {line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: &'static str,
    },

    /// The options file names a dictionary that is not on disk.
    #[error("Bad dictionary path in options file {options_file:?}: {dict:?}")]
    BadDictionaryPath { options_file: PathBuf, dict: PathBuf },
}

/// Finds the mutation dictionary belonging to a target binary, if any.
pub trait DictionaryLookup {
    fn dictionary_for(&self, target_binary: &Path) -> Result<Option<PathBuf>, DictionaryError>;
}

/// Looks for `<target>.dict`, then for the first `dict` entry of any
/// section in `<target>.options`.
#[derive(Debug, Clone, Default)]
pub struct OptionsFileLookup {
    disabled: bool,
}

impl OptionsFileLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disabled() -> Self {
        Self { disabled: true }
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}

impl DictionaryLookup for OptionsFileLookup {
    fn dictionary_for(&self, target_binary: &Path) -> Result<Option<PathBuf>, DictionaryError> {
        if self.disabled {
            return Ok(None);
        }

        let dict_path = with_suffix(target_binary, ".dict");
        if dict_path.exists() {
            return Ok(Some(dict_path));
        }

        let options_path = with_suffix(target_binary, ".options");
        if !options_path.exists() {
            return Ok(None);
        }

        let content =
            std::fs::read_to_string(&options_path).map_err(|source| DictionaryError::Io {
                path: options_path.clone(),
                source,
            })?;
        let sections = parse_options(&content).map_err(|(line, reason)| {
            DictionaryError::Parse {
                path: options_path.clone(),
                line,
                reason,
            }
        })?;
        let Some(dict) = first_dict_entry(&sections) else {
            return Ok(None);
        };

        let base = target_binary.parent().unwrap_or_else(|| Path::new(""));
        let resolved = base.join(dict);
        if !resolved.exists() {
            return Err(DictionaryError::BadDictionaryPath {
                options_file: options_path,
                dict: resolved,
            });
        }
        log::debug!("Using dictionary {resolved:?} from {options_path:?}");
        Ok(Some(resolved))
    }
}

#[derive(Debug, Default)]
struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

impl Section {
    fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// `dict` from the first named section in file order. Entries under
/// `[DEFAULT]` count as part of every named section.
fn first_dict_entry(sections: &[Section]) -> Option<&str> {
    let defaults = sections.iter().find(|s| s.name == DEFAULT_SECTION);
    sections
        .iter()
        .filter(|s| s.name != DEFAULT_SECTION)
        .find_map(|s| s.get(DICT_KEY).or_else(|| defaults?.get(DICT_KEY)))
}

/// INI reader for `.options` files. Section names keep their case, keys
/// are lowercased, and indented lines continue the previous value.
/// Errors carry the 1-based line number.
fn parse_options(content: &str) -> Result<Vec<Section>, (usize, &'static str)> {
    let mut sections: Vec<Section> = Vec::new();
    let mut last_key: Option<String> = None;

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        let indented = raw.starts_with([' ', '\t']);
        if indented {
            if let (Some(section), Some(key)) = (sections.last_mut(), last_key.as_ref()) {
                if let Some((_, value)) = section.entries.iter_mut().find(|(k, _)| k == key) {
                    value.push('\n');
                    value.push_str(line);
                    continue;
                }
            }
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim();
            if sections.iter().any(|s| s.name == name) {
                return Err((line_no, "duplicate section"));
            }
            sections.push(Section {
                name: name.to_string(),
                entries: Vec::new(),
            });
            last_key = None;
            continue;
        }

        let Some(section) = sections.last_mut() else {
            return Err((line_no, "entry before any section header"));
        };
        let Some(split_at) = line.find(['=', ':']) else {
            return Err((line_no, "expected `key = value`"));
        };
        let (key, value) = line.split_at(split_at);
        let key = key.trim().to_lowercase();
        if section.get(&key).is_some() {
            return Err((line_no, "duplicate option"));
        }
        section.entries.push((key.clone(), value[1..].trim().to_string()));
        last_key = Some(key);
    }
    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn target_in(dir: &Path) -> PathBuf {
        let target = dir.join("fuzz_target");
        fs::write(&target, b"").unwrap();
        target
    }

    #[test]
    fn no_dictionary_when_nothing_present() {
        let dir = tempfile::tempdir().unwrap();
        let target = target_in(dir.path());
        assert_eq!(OptionsFileLookup::new().dictionary_for(&target).unwrap(), None);
    }

    #[test]
    fn dict_next_to_binary_wins() {
        let dir = tempfile::tempdir().unwrap();
        let target = target_in(dir.path());
        fs::write(dir.path().join("fuzz_target.dict"), "\"a\"\n").unwrap();
        fs::write(
            dir.path().join("fuzz_target.options"),
            "[libfuzzer]\ndict = other.dict\n",
        )
        .unwrap();

        assert_eq!(
            OptionsFileLookup::new().dictionary_for(&target).unwrap(),
            Some(dir.path().join("fuzz_target.dict"))
        );
    }

    #[test]
    fn options_file_dict_resolves_relative_to_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = target_in(dir.path());
        fs::write(dir.path().join("tokens.dict"), "\"GET\"\n").unwrap();
        fs::write(
            dir.path().join("fuzz_target.options"),
            "# comment\n[libfuzzer]\nmax_len = 1024\nDict = tokens.dict\n",
        )
        .unwrap();

        assert_eq!(
            OptionsFileLookup::new().dictionary_for(&target).unwrap(),
            Some(dir.path().join("tokens.dict"))
        );
    }

    #[test]
    fn dict_key_in_any_section_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let target = target_in(dir.path());
        fs::write(dir.path().join("tokens.dict"), "\"GET\"\n").unwrap();
        fs::write(
            dir.path().join("fuzz_target.options"),
            "[afl]\ndict = tokens.dict\n",
        )
        .unwrap();
        assert_eq!(
            OptionsFileLookup::new().dictionary_for(&target).unwrap(),
            Some(dir.path().join("tokens.dict"))
        );
    }

    #[test]
    fn options_without_dict_key_yield_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let target = target_in(dir.path());
        fs::write(
            dir.path().join("fuzz_target.options"),
            "[libfuzzer]\nmax_len = 64\n",
        )
        .unwrap();
        assert_eq!(OptionsFileLookup::new().dictionary_for(&target).unwrap(), None);
    }

    #[test]
    fn malformed_options_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let target = target_in(dir.path());
        fs::write(
            dir.path().join("fuzz_target.options"),
            "[libfuzzer]\nthis is not a pair\n",
        )
        .unwrap();

        let err = OptionsFileLookup::new().dictionary_for(&target).unwrap_err();
        match err {
            DictionaryError::Parse { path, line, .. } => {
                assert_eq!(path, dir.path().join("fuzz_target.options"));
                assert_eq!(line, 2);
            }
            other => panic!("Expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn missing_referenced_dictionary_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let target = target_in(dir.path());
        fs::write(
            dir.path().join("fuzz_target.options"),
            "[libfuzzer]\ndict: gone.dict\n",
        )
        .unwrap();

        let err = OptionsFileLookup::new().dictionary_for(&target).unwrap_err();
        match err {
            DictionaryError::BadDictionaryPath { dict, .. } => {
                assert_eq!(dict, dir.path().join("gone.dict"))
            }
            other => panic!("Expected BadDictionaryPath, got {other:?}"),
        }
    }

    #[test]
    fn disabled_lookup_ignores_dict_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = target_in(dir.path());
        fs::write(dir.path().join("fuzz_target.dict"), "\"a\"\n").unwrap();
        assert_eq!(
            OptionsFileLookup::disabled().dictionary_for(&target).unwrap(),
            None
        );
    }

    #[test]
    fn parser_rejects_pairs_outside_sections() {
        assert_eq!(parse_options("dict = x\n[libfuzzer]\n").unwrap_err().0, 1);
        assert_eq!(
            parse_options("[a]\nk = 1\n[a]\n").unwrap_err(),
            (3, "duplicate section")
        );
        assert_eq!(
            parse_options("[a]\nk = 1\nK = 2\n").unwrap_err(),
            (3, "duplicate option")
        );
    }

    #[test]
    fn parser_keeps_file_order_and_continuations() {
        let content = "[afl]\n; note\nclose_fd_mask=3\n  more\n[libfuzzer]\ndict=a\n";
        let parsed = parse_options(content).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].name, "afl");
        assert_eq!(parsed[0].get("close_fd_mask"), Some("3\nmore"));
        assert_eq!(first_dict_entry(&parsed), Some("a"));
    }

    #[test]
    fn default_section_dict_applies_to_named_sections() {
        let content = "[DEFAULT]\ndict = d.dict\n[libfuzzer]\nmax_len = 1\n";
        let parsed = parse_options(content).unwrap();
        assert_eq!(first_dict_entry(&parsed), Some("d.dict"));

        let only_default = parse_options("[DEFAULT]\ndict = d.dict\n").unwrap();
        assert_eq!(first_dict_entry(&only_default), None);
    }
}
