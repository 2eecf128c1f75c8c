use std::env::JoinPathsError;
use std::ffi::{NulError, OsString};
use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelaunchError {
    #[error("no program to relaunch, argument vector is empty")]
    EmptyArgv,
    #[error("argument contains an interior nul byte")]
    Nul(#[from] NulError),
    #[error("could not exec {program}: {errno}")]
    Exec {
        program: PathBuf,
        errno: Errno,
    },
}

#[derive(Error, Debug)]
pub enum AdjustError {
    #[error("{0:?} can't be used as an environment variable name")]
    InvalidVariable(OsString),
    #[error("library directory can't be placed on a search path")]
    InvalidPath(#[from] JoinPathsError),
    #[error("relaunch after updating the library search path failed")]
    Relaunch(#[from] RelaunchError),
}
