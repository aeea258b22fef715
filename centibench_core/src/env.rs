use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};

/// Environment handed to an external build tool.
///
/// Held as an explicit map so the configurator never touches the
/// process environment; only the builder turns it back into variables.
/// Names and values are kept as raw OS strings and passed on unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildEnvironment {
    vars: BTreeMap<OsString, OsString>,
}

impl BuildEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current process environment.
    pub fn from_process() -> Self {
        std::env::vars_os().collect()
    }

    /// Value of `name` if it is set and valid UTF-8.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_os(name).and_then(OsStr::to_str)
    }

    pub fn get_os(&self, name: &str) -> Option<&OsStr> {
        self.vars.get(OsStr::new(name)).map(OsString::as_os_str)
    }

    pub fn set(&mut self, name: impl Into<OsString>, value: impl Into<OsString>) {
        let name = name.into();
        let value = value.into();
        log::debug!("{name:?}={value:?}");
        self.vars.insert(name, value);
    }

    /// Appends `flags` to the space-separated value of `name`, keeping
    /// whatever was already there byte for byte. Not idempotent.
    pub fn append_flags<S: AsRef<OsStr>>(&mut self, name: &str, flags: &[S]) {
        let mut joined = self.get_os(name).map(OsStr::to_owned).unwrap_or_default();
        for flag in flags {
            if !joined.is_empty() {
                joined.push(" ");
            }
            joined.push(flag);
        }
        self.set(name, joined);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars
            .iter()
            .map(|(k, v)| (k.as_os_str(), v.as_os_str()))
    }
}

impl FromIterator<(OsString, OsString)> for BuildEnvironment {
    fn from_iter<T: IntoIterator<Item = (OsString, OsString)>>(iter: T) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}
