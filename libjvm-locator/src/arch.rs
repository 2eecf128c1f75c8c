// java's name for the architecture, as used in jre/lib/<arch> directories.
#[cfg(target_arch = "x86")]
pub const JAVA_ARCH: &str = "i386";
#[cfg(any(target_arch = "powerpc", target_arch = "powerpc64"))]
pub const JAVA_ARCH: &str = "ppc";
#[cfg(any(target_arch = "sparc", target_arch = "sparc64"))]
pub const JAVA_ARCH: &str = "sparc";
#[cfg(target_arch = "x86_64")]
pub const JAVA_ARCH: &str = "amd64";
#[cfg(not(any(
    target_arch = "x86",
    target_arch = "powerpc",
    target_arch = "powerpc64",
    target_arch = "sparc",
    target_arch = "sparc64",
    target_arch = "x86_64"
)))]
pub const JAVA_ARCH: &str = std::env::consts::ARCH;
