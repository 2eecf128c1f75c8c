use std::env;
use std::path::Path;
use std::process::exit;

use anyhow::Context;
use clap::Parser;
use simple_logger::SimpleLogger;

use jni_invocation::JniInvoker;
use launcher_args::LauncherArgs;
use library_path::relaunch::{ArgvSnapshot, ExecRelauncher};
use vm_launcher::config::LauncherConfig;
use vm_launcher::launch::launch;

fn main() -> anyhow::Result<()> {
    let argv = ArgvSnapshot::capture();
    let args = LauncherArgs::parse();
    SimpleLogger::new().with_level(args.log_level).env().init()?;
    let current_exe = env::current_exe()?;
    let program_dir = current_exe.parent().map(Path::to_path_buf).unwrap_or_default();
    let config = LauncherConfig::from_args(&args, argv, program_dir)?;
    let relauncher = ExecRelauncher { program: Some(current_exe) };
    let invoker = JniInvoker { main_class: config.main_class.clone() };
    let exit_code = launch(&config, &relauncher, &invoker)
        .with_context(|| format!("could not launch a vm from {}", config.command.display()))?;
    exit(exit_code)
}
