use std::error::Error;
use std::ffi::OsString;
use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use log::LevelFilter;

use jni_invocation::DEFAULT_MAIN_CLASS;
use libjvm_locator::DEFAULT_VM_LIBRARY;
use library_path::DEFAULT_SEARCH_PATH_VAR;

/// Parse a single key-value pair
fn parse_key_val<T, U>(s: &str) -> Result<(T, U), Box<dyn Error + Send + Sync>>
    where
        T: FromStr,
        T::Err: Error + Send + Sync + 'static,
        U: FromStr,
        U::Err: Error + Send + Sync + 'static,
{
    //todo support escaping
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=value: no `=` found in `{}`", s))?;
    Ok((s[..pos].parse()?, s[pos + 1..].parse()?))
}


#[derive(Parser, Debug, Clone)]
#[clap(version)]
pub struct LauncherArgs {
    #[clap(long, help = "the java command or vm library to start")]
    pub vm: PathBuf,
    #[clap(long, help = "file name of the vm library", default_value = DEFAULT_VM_LIBRARY)]
    pub vm_library_name: String,
    #[clap(long, help = "architecture name used in jre/lib/<arch> directories")]
    pub arch: Option<String>,
    #[clap(long, help = "directories to put on the library search path instead of the vm library's")]
    pub ee_library_path: Option<OsString>,
    #[clap(long, help = "the library search path variable", default_value = DEFAULT_SEARCH_PATH_VAR)]
    pub search_path_var: OsString,
    #[clap(long, help = "the main class", default_value = DEFAULT_MAIN_CLASS)]
    pub main_class: String,
    #[clap(long = "vmarg", help = "argument passed to the vm", allow_hyphen_values = true, num_args = 1)]
    pub vm_args: Vec<String>,
    #[clap(short, long = "property", help = "system properties", value_parser = parse_key_val::<String, String>, num_args = 1)]
    pub properties: Vec<(String, String)>,
    #[clap(long, help = "log level", default_value = "info")]
    pub log_level: LevelFilter,
    #[clap(last = true, help = "arguments passed to the main class")]
    pub program_args: Vec<String>,
}

impl LauncherArgs {
    /// vm arguments with properties appended as -D options
    pub fn all_vm_args(&self) -> Vec<String> {
        let mut res = self.vm_args.clone();
        res.extend(self.properties.iter().map(|(key, value)| format!("-D{}={}", key, value)));
        res
    }
}
