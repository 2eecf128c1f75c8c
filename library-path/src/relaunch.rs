use std::ffi::{CString, OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use log::info;
use nix::unistd::execv;

use crate::errors::RelaunchError;

/// The launcher's argument vector as it was at startup.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ArgvSnapshot {
    args: Vec<OsString>,
}

impl ArgvSnapshot {
    pub fn capture() -> Self {
        Self { args: std::env::args_os().collect() }
    }

    pub fn new(args: impl IntoIterator<Item=impl Into<OsString>>) -> Self {
        Self { args: args.into_iter().map(|arg| arg.into()).collect() }
    }

    pub fn program(&self) -> Option<&Path> {
        self.args.first().map(Path::new)
    }

    pub fn args(&self) -> &[OsString] {
        self.args.as_slice()
    }
}

pub trait Relauncher {
    /// Replaces the current process image. Only returns if that failed.
    fn relaunch(&self, argv: &ArgvSnapshot) -> RelaunchError;
}

/// Relaunches with `execv`, using `program` if set and argv[0] otherwise.
#[derive(Debug, Clone, Default)]
pub struct ExecRelauncher {
    pub program: Option<PathBuf>,
}

impl Relauncher for ExecRelauncher {
    fn relaunch(&self, argv: &ArgvSnapshot) -> RelaunchError {
        restart_launcher(self.program.as_deref(), argv)
    }
}

fn to_cstring(s: &OsStr) -> Result<CString, RelaunchError> {
    Ok(CString::new(s.as_bytes())?)
}

pub fn restart_launcher(program: Option<&Path>, argv: &ArgvSnapshot) -> RelaunchError {
    let program = match program.or_else(|| argv.program()) {
        Some(program) => program,
        None => return RelaunchError::EmptyArgv,
    };
    let c_program = match to_cstring(program.as_os_str()) {
        Ok(c_program) => c_program,
        Err(err) => return err,
    };
    let c_args = match argv.args().iter().map(|arg| to_cstring(arg)).collect::<Result<Vec<_>, _>>() {
        Ok(c_args) => c_args,
        Err(err) => return err,
    };
    info!("restarting {} to apply library search path", program.display());
    match execv(&c_program, &c_args) {
        Ok(never) => match never {},
        Err(errno) => RelaunchError::Exec { program: program.to_path_buf(), errno },
    }
}

#[cfg(test)]
pub mod test {
    use std::ffi::OsString;
    use std::path::Path;

    use crate::errors::RelaunchError;
    use crate::relaunch::{ArgvSnapshot, ExecRelauncher, Relauncher, restart_launcher};

    #[test]
    pub fn snapshot_program_is_first_arg() {
        let argv = ArgvSnapshot::new(["/opt/app/launcher", "-data", "ws"]);
        assert_eq!(argv.program(), Some(Path::new("/opt/app/launcher")));
        assert_eq!(argv.args().len(), 3);
        assert_eq!(ArgvSnapshot::new(Vec::<OsString>::new()).program(), None);
    }

    #[test]
    pub fn empty_argv_cannot_relaunch() {
        let argv = ArgvSnapshot::new(Vec::<OsString>::new());
        assert!(matches!(ExecRelauncher::default().relaunch(&argv), RelaunchError::EmptyArgv));
    }

    #[test]
    pub fn interior_nul_is_rejected_before_exec() {
        let argv = ArgvSnapshot::new(["/bin/true", "a\0b"]);
        assert!(matches!(restart_launcher(None, &argv), RelaunchError::Nul(_)));
    }

    #[test]
    pub fn missing_program_returns_exec_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-launcher");
        let argv = ArgvSnapshot::new([missing.as_os_str()]);
        match restart_launcher(None, &argv) {
            RelaunchError::Exec { program, .. } => assert_eq!(program, missing),
            other => panic!("unexpected {:?}", other),
        }
    }
}
