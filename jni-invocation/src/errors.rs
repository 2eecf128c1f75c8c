use std::ffi::NulError;
use std::path::PathBuf;

use jni_sys::jint;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InvocationError {
    #[error("could not load vm library {path}")]
    LoadLibrary {
        path: PathBuf,
        #[source]
        err: libloading::Error,
    },
    #[error("{path} does not export JNI_CreateJavaVM")]
    MissingCreateJavaVM {
        path: PathBuf,
        #[source]
        err: libloading::Error,
    },
    #[error("JNI_CreateJavaVM failed with {0}")]
    CreateJavaVM(jint),
    #[error("jni function table is missing {0}")]
    MissingJNIFunction(&'static str),
    #[error("main class {0} not found")]
    MainClassNotFound(String),
    #[error("main class {class} has no method {name}{signature}")]
    MethodNotFound {
        class: String,
        name: &'static str,
        signature: &'static str,
    },
    #[error("could not instantiate main class {0}")]
    Instantiation(String),
    #[error("could not build the argument array for main class {0}")]
    Arguments(String),
    #[error(transparent)]
    Nul(#[from] NulError),
}
