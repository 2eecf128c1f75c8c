use std::env;
use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::{debug, info};

use crate::errors::AdjustError;
use crate::relaunch::{ArgvSnapshot, Relauncher};

pub mod errors;
pub mod relaunch;

pub const DEFAULT_SEARCH_PATH_VAR: &str = "LD_LIBRARY_PATH";

#[derive(Debug, Clone)]
pub struct SearchPathSettings {
    pub var: OsString,
    pub ee_library_path: Option<OsString>,
    // relative ee library path entries are resolved against this
    pub program_dir: PathBuf,
}

impl Default for SearchPathSettings {
    fn default() -> Self {
        Self {
            var: OsString::from(DEFAULT_SEARCH_PATH_VAR),
            ee_library_path: None,
            program_dir: PathBuf::new(),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Adjustment {
    AlreadyPresent,
    Required {
        new_value: OsString
    },
}

/// Directories the dynamic loader needs in order to load `vm_library` and its dependencies.
///
/// With an execution environment library path those entries are used, otherwise the directory
/// containing the library and its parent. Entries which aren't existing directories are dropped.
pub fn vm_library_search_path(vm_library: &Path, ee_library_path: Option<&OsStr>, program_dir: &Path) -> Vec<PathBuf> {
    let candidates = match ee_library_path {
        Some(ee_library_path) => {
            env::split_paths(ee_library_path)
                .filter(|entry| !entry.as_os_str().is_empty())
                .map(|entry| if entry.is_relative() { program_dir.join(entry) } else { entry })
                .collect_vec()
        }
        None => {
            vm_library.ancestors().skip(1).take(2)
                .filter(|dir| !dir.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .collect_vec()
        }
    };
    candidates.into_iter().filter(|dir| dir.is_dir()).collect()
}

/// Whether every path is an entry of the colon separated `value`.
pub fn contains_paths(value: &OsStr, paths: &[PathBuf]) -> bool {
    let entries = env::split_paths(value).collect_vec();
    paths.iter().all(|path| entries.iter().any(|entry| entry == path))
}

pub fn plan_adjustment(current: Option<&OsStr>, required: &[PathBuf]) -> Result<Adjustment, AdjustError> {
    let current = match current {
        Some(current) if contains_paths(current, required) => return Ok(Adjustment::AlreadyPresent),
        Some(current) => current,
        None => OsStr::new(""),
    };
    let mut new_value = env::join_paths(required)?;
    if !current.is_empty() {
        if !new_value.is_empty() {
            new_value.push(":");
        }
        new_value.push(current);
    }
    Ok(Adjustment::Required { new_value })
}

/// Names `set_var` would reject: empty, or containing `=` or nul.
pub fn check_variable_name(var: &OsStr) -> Result<(), AdjustError> {
    let bytes = var.as_bytes();
    if bytes.is_empty() || bytes.contains(&b'=') || bytes.contains(&0) {
        return Err(AdjustError::InvalidVariable(var.to_os_string()));
    }
    Ok(())
}

/// Puts the directories `vm_library` needs on the search path variable.
///
/// When the variable had to change the launcher is restarted so the loader sees the new value;
/// this only returns `Ok` if no change was needed.
pub fn adjust_library_path(vm_library: &Path, settings: &SearchPathSettings, argv: &ArgvSnapshot, relauncher: &impl Relauncher) -> Result<(), AdjustError> {
    let required = vm_library_search_path(vm_library, settings.ee_library_path.as_deref(), &settings.program_dir);
    check_variable_name(&settings.var)?;
    let current = env::var_os(&settings.var);
    match plan_adjustment(current.as_deref(), &required)? {
        Adjustment::AlreadyPresent => {
            debug!("{} already contains {}", settings.var.to_string_lossy(), required.iter().map(|dir| dir.display()).join(":"));
            Ok(())
        }
        Adjustment::Required { new_value } => {
            info!("setting {}={}", settings.var.to_string_lossy(), new_value.to_string_lossy());
            env::set_var(&settings.var, &new_value);
            Err(AdjustError::Relaunch(relauncher.relaunch(argv)))
        }
    }
}

#[cfg(test)]
pub mod test {
    use std::cell::RefCell;
    use std::env;
    use std::ffi::{OsStr, OsString};
    use std::fs;
    use std::path::PathBuf;

    use crate::{adjust_library_path, Adjustment, check_variable_name, contains_paths, plan_adjustment, SearchPathSettings, vm_library_search_path};
    use crate::errors::{AdjustError, RelaunchError};
    use crate::relaunch::{ArgvSnapshot, Relauncher};

    #[derive(Default)]
    struct RecordingRelauncher {
        relaunched: RefCell<Vec<ArgvSnapshot>>,
    }

    impl Relauncher for RecordingRelauncher {
        fn relaunch(&self, argv: &ArgvSnapshot) -> RelaunchError {
            self.relaunched.borrow_mut().push(argv.clone());
            RelaunchError::EmptyArgv
        }
    }

    fn settings(var: &str) -> SearchPathSettings {
        SearchPathSettings { var: OsString::from(var), ..SearchPathSettings::default() }
    }

    #[test]
    pub fn contains_is_entry_wise() {
        let paths = vec![PathBuf::from("/a/b")];
        assert!(contains_paths(OsStr::new("/x:/a/b:/y"), &paths));
        assert!(contains_paths(OsStr::new("/a/b/"), &paths));
        assert!(!contains_paths(OsStr::new("/a/bc"), &paths));
        assert!(!contains_paths(OsStr::new("/x/a/b"), &paths));
        assert!(contains_paths(OsStr::new(""), &[]));
    }

    #[test]
    pub fn contains_requires_every_path() {
        let paths = vec![PathBuf::from("/a"), PathBuf::from("/b")];
        assert!(contains_paths(OsStr::new("/b:/a"), &paths));
        assert!(!contains_paths(OsStr::new("/a"), &paths));
    }

    #[test]
    pub fn unset_variable_forces_adjustment() {
        let required = vec![PathBuf::from("/jre/lib/amd64/server"), PathBuf::from("/jre/lib/amd64")];
        assert_eq!(plan_adjustment(None, &required).unwrap(), Adjustment::Required {
            new_value: OsString::from("/jre/lib/amd64/server:/jre/lib/amd64")
        });
        assert_eq!(plan_adjustment(None, &[]).unwrap(), Adjustment::Required { new_value: OsString::new() });
    }

    #[test]
    pub fn required_directories_are_prepended() {
        let required = vec![PathBuf::from("/jre/bin/classic")];
        assert_eq!(plan_adjustment(Some(OsStr::new("/usr/local/lib")), &required).unwrap(), Adjustment::Required {
            new_value: OsString::from("/jre/bin/classic:/usr/local/lib")
        });
        assert_eq!(plan_adjustment(Some(OsStr::new("/usr/local/lib:/jre/bin/classic")), &required).unwrap(), Adjustment::AlreadyPresent);
    }

    #[test]
    pub fn path_separator_in_directory_is_an_error() {
        let required = vec![PathBuf::from("/weird:dir")];
        assert!(matches!(plan_adjustment(None, &required), Err(AdjustError::InvalidPath(_))));
    }

    #[test]
    pub fn library_dir_and_parent_are_required() {
        let dir = tempfile::tempdir().unwrap();
        let server = dir.path().join("jre/lib/amd64/server");
        fs::create_dir_all(&server).unwrap();
        let lib = server.join("libjvm.so");
        let search_path = vm_library_search_path(&lib, None, dir.path());
        assert_eq!(search_path, vec![server.clone(), dir.path().join("jre/lib/amd64")]);
    }

    #[test]
    pub fn ee_library_path_replaces_derived_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("ee/lib")).unwrap();
        fs::create_dir_all(dir.path().join("abs")).unwrap();
        let mut ee = OsString::from("ee/lib:missing:");
        ee.push(dir.path().join("abs"));
        let search_path = vm_library_search_path(&dir.path().join("x/libjvm.so"), Some(&ee), dir.path());
        assert_eq!(search_path, vec![dir.path().join("ee/lib"), dir.path().join("abs")]);
    }

    #[test]
    pub fn present_directories_do_not_relaunch() {
        let dir = tempfile::tempdir().unwrap();
        let server = dir.path().join("server");
        fs::create_dir_all(&server).unwrap();
        let var = "LIBRARY_PATH_TEST_PRESENT";
        let mut value = env::join_paths([&server, &dir.path().to_path_buf()]).unwrap();
        value.push(":/usr/lib");
        env::set_var(var, &value);
        let relauncher = RecordingRelauncher::default();
        let argv = ArgvSnapshot::new(["launcher"]);
        adjust_library_path(&server.join("libjvm.so"), &settings(var), &argv, &relauncher).unwrap();
        assert!(relauncher.relaunched.borrow().is_empty());
        assert_eq!(env::var_os(var), Some(value));
    }

    #[test]
    pub fn unset_variable_is_set_and_relaunched() {
        let dir = tempfile::tempdir().unwrap();
        let server = dir.path().join("server");
        fs::create_dir_all(&server).unwrap();
        let var = "LIBRARY_PATH_TEST_UNSET";
        env::remove_var(var);
        let relauncher = RecordingRelauncher::default();
        let argv = ArgvSnapshot::new(["launcher", "-vm", "x"]);
        let result = adjust_library_path(&server.join("libjvm.so"), &settings(var), &argv, &relauncher);
        assert!(matches!(result, Err(AdjustError::Relaunch(_))));
        assert_eq!(relauncher.relaunched.borrow().as_slice(), &[argv]);
        let expected = env::join_paths([&server, &dir.path().to_path_buf()]).unwrap();
        assert_eq!(env::var_os(var), Some(expected));
    }

    #[test]
    pub fn unusable_variable_names_are_rejected_before_touching_env() {
        let dir = tempfile::tempdir().unwrap();
        let server = dir.path().join("server");
        fs::create_dir_all(&server).unwrap();
        let argv = ArgvSnapshot::new(["launcher"]);
        for var in ["", "LD=X", "LD\0X"] {
            let relauncher = RecordingRelauncher::default();
            match adjust_library_path(&server.join("libjvm.so"), &settings(var), &argv, &relauncher) {
                Err(AdjustError::InvalidVariable(name)) => assert_eq!(name, OsString::from(var)),
                other => panic!("unexpected {:?} for {:?}", other, var),
            }
            assert!(relauncher.relaunched.borrow().is_empty());
        }
        assert!(check_variable_name(OsStr::new("LD_LIBRARY_PATH")).is_ok());
    }
}
