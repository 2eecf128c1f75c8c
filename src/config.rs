use std::path::PathBuf;

use launcher_args::LauncherArgs;
use libjvm_locator::arch::JAVA_ARCH;
use libjvm_locator::errors::LocateError;
use libjvm_locator::JvmLocations;
use library_path::relaunch::ArgvSnapshot;
use library_path::SearchPathSettings;

/// Everything the launch needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    pub command: PathBuf,
    pub vm_library_name: String,
    pub locations: JvmLocations,
    pub search_path: SearchPathSettings,
    pub main_class: String,
    pub vm_args: Vec<String>,
    pub program_args: Vec<String>,
    pub argv: ArgvSnapshot,
}

impl LauncherConfig {
    pub fn from_args(args: &LauncherArgs, argv: ArgvSnapshot, program_dir: PathBuf) -> Result<Self, LocateError> {
        let java_arch = args.arch.as_deref().unwrap_or(JAVA_ARCH);
        Ok(Self {
            command: args.vm.clone(),
            vm_library_name: args.vm_library_name.clone(),
            locations: JvmLocations::new(java_arch)?,
            search_path: SearchPathSettings {
                var: args.search_path_var.clone(),
                ee_library_path: args.ee_library_path.clone(),
                program_dir,
            },
            main_class: args.main_class.clone(),
            vm_args: args.all_vm_args(),
            program_args: args.program_args.clone(),
            argv,
        })
    }
}
