use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::errors::LocateError;

pub mod arch;
pub mod errors;

pub const DEFAULT_VM_LIBRARY: &str = "libjvm.so";

// none of the candidate locations should be longer than this, after substituting the arch.
pub const MAX_LOCATION_LENGTH: usize = 40;

const ARCH_TOKEN: &str = "{arch}";

pub const DEFAULT_LOCATION_TEMPLATES: [&str; 11] = [
    "j9vm",
    "../jre/bin/j9vm",
    "classic",
    "../jre/bin/classic",
    "../lib/{arch}/client",
    "../lib/{arch}/server",
    "../lib/{arch}/jrockit",
    "../jre/lib/{arch}/client",
    "../jre/lib/{arch}/server",
    "../jre/lib/{arch}/jrockit",
    "../lib/jvm/jre/lib/{arch}/client",
];

const VM_LIBRARY_EXTENSIONS: [&str; 3] = ["so", "jnilib", "dylib"];

/// Directories, relative to the directory holding the java command, where a vm library may live.
/// Probed in order.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct JvmLocations {
    locations: Vec<String>,
}

impl JvmLocations {
    pub fn new(java_arch: &str) -> Result<Self, LocateError> {
        Self::from_templates(DEFAULT_LOCATION_TEMPLATES.iter(), java_arch)
    }

    pub fn from_templates(templates: impl IntoIterator<Item=impl AsRef<str>>, java_arch: &str) -> Result<Self, LocateError> {
        Self::from_locations(templates.into_iter().map(|template| template.as_ref().replace(ARCH_TOKEN, java_arch)))
    }

    pub fn from_locations(locations: impl IntoIterator<Item=impl Into<String>>) -> Result<Self, LocateError> {
        let locations = locations.into_iter().map(|location| location.into()).collect::<Vec<String>>();
        if let Some(too_long) = locations.iter().find(|location| location.len() > MAX_LOCATION_LENGTH) {
            return Err(LocateError::LocationTooLong { location: too_long.clone(), max: MAX_LOCATION_LENGTH });
        }
        Ok(Self { locations })
    }

    pub fn iter(&self) -> impl Iterator<Item=&str> {
        self.locations.iter().map(|location| location.as_str())
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

pub fn is_vm_library(path: impl AsRef<Path>) -> bool {
    match path.as_ref().extension().and_then(|extension| extension.to_str()) {
        None => false,
        Some(extension) => {
            VM_LIBRARY_EXTENSIONS.iter().any(|expected| expected.eq_ignore_ascii_case(extension))
        }
    }
}

fn is_regular_file(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(metadata) => metadata.is_file(),
        Err(_) => false
    }
}

/// Finds the vm library for `command`, which is either the library itself or a java executable.
///
/// Candidate paths are returned as probed, `..` components are not resolved.
///
/// The base directory is `command`'s parent as `Path` sees it, so a trailing slash is ignored:
/// `/opt/app/jre/bin/` probes from `/opt/app/jre`, not from `bin`.
pub fn find_lib(command: impl AsRef<Path>, locations: &JvmLocations, vm_library: &str) -> Result<PathBuf, LocateError> {
    let command = command.as_ref();
    if is_vm_library(command) {
        return if is_regular_file(command) {
            debug!("{} is already a vm library", command.display());
            Ok(command.to_path_buf())
        } else {
            Err(LocateError::NotFound { command: command.to_path_buf() })
        };
    }

    // a bare command name has an empty parent, candidates are then relative to the working directory
    let base = command.parent().unwrap_or_else(|| Path::new(""));
    for location in locations.iter() {
        let candidate = base.join(location).join(vm_library);
        trace!("probing {}", candidate.display());
        if is_regular_file(&candidate) {
            debug!("found vm library at {}", candidate.display());
            return Ok(candidate);
        }
    }
    Err(LocateError::NotFound { command: command.to_path_buf() })
}
