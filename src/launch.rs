use std::path::PathBuf;

use log::{debug, info};
use thiserror::Error;

use jni_invocation::errors::InvocationError;
use jni_invocation::VmInvoker;
use libjvm_locator::errors::LocateError;
use libjvm_locator::find_lib;
use library_path::adjust_library_path;
use library_path::errors::AdjustError;
use library_path::relaunch::Relauncher;

use crate::config::LauncherConfig;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error(transparent)]
    Locate(#[from] LocateError),
    #[error(transparent)]
    Adjust(#[from] AdjustError),
    #[error(transparent)]
    Invocation(#[from] InvocationError),
}

/// Locates the vm library and makes sure the loader can find its dependencies.
///
/// If the search path had to change the process is replaced by a fresh launcher and this doesn't
/// return, a relaunch which fails comes back as `LaunchError::Adjust`.
pub fn find_vm_library(config: &LauncherConfig, relauncher: &impl Relauncher) -> Result<PathBuf, LaunchError> {
    debug!("locating {} for {}", config.vm_library_name, config.command.display());
    let vm_library = find_lib(&config.command, &config.locations, config.vm_library_name.as_str())?;
    adjust_library_path(&vm_library, &config.search_path, &config.argv, relauncher)?;
    Ok(vm_library)
}

pub fn launch(config: &LauncherConfig, relauncher: &impl Relauncher, invoker: &impl VmInvoker) -> Result<i32, LaunchError> {
    let vm_library = find_vm_library(config, relauncher)?;
    info!("starting vm {}", vm_library.display());
    Ok(invoker.start_java_vm(&vm_library, &config.vm_args, &config.program_args)?)
}
