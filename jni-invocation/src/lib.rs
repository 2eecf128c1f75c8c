use std::ffi::CString;
use std::path::Path;
use std::ptr::{null, null_mut};

use jni_sys::{jclass, jint, JNI_OK, JNI_TRUE, JNI_VERSION_1_2, JNIEnv, jobject, jobjectArray, jsize, jvalue, JavaVM, JavaVMInitArgs, JavaVMOption};
use libc::{c_char, c_void};
use libloading::os::unix::{Library, RTLD_GLOBAL, RTLD_LAZY};
use log::{debug, error, info};

use crate::errors::InvocationError;

pub mod errors;

pub const DEFAULT_MAIN_CLASS: &str = "org/eclipse/equinox/launcher/Main";

const CREATE_JAVA_VM: &[u8] = b"JNI_CreateJavaVM\0";
const STRING_CLASS: &[u8] = b"java/lang/String\0";
const CONSTRUCTOR_NAME: &str = "<init>";
const CONSTRUCTOR_SIGNATURE: &str = "()V";
const RUN_NAME: &str = "run";
const RUN_SIGNATURE: &str = "([Ljava/lang/String;)I";

type CreateJavaVM = unsafe extern "system" fn(*mut *mut JavaVM, *mut *mut c_void, *mut c_void) -> jint;

pub trait VmInvoker {
    /// Starts the vm in `lib_path` and runs the launcher main class. Returns its exit code.
    fn start_java_vm(&self, lib_path: &Path, vm_args: &[String], prog_args: &[String]) -> Result<i32, InvocationError>;
}

/// Runs `main_class` through the jni invocation api: `new Main().run(String[])`.
#[derive(Debug, Clone)]
pub struct JniInvoker {
    pub main_class: String,
}

impl Default for JniInvoker {
    fn default() -> Self {
        Self { main_class: DEFAULT_MAIN_CLASS.to_string() }
    }
}

macro_rules! jni_fn {
    ($env:expr, $name:ident) => {
        (**$env).$name.ok_or(InvocationError::MissingJNIFunction(stringify!($name)))?
    };
}

fn load_vm_library(lib_path: &Path) -> Result<Library, InvocationError> {
    unsafe { Library::open(Some(lib_path), RTLD_LAZY | RTLD_GLOBAL) }
        .map_err(|err| InvocationError::LoadLibrary { path: lib_path.to_path_buf(), err })
}

impl VmInvoker for JniInvoker {
    fn start_java_vm(&self, lib_path: &Path, vm_args: &[String], prog_args: &[String]) -> Result<i32, InvocationError> {
        let library = load_vm_library(lib_path)?;
        let create_java_vm: CreateJavaVM = unsafe {
            *library.get::<CreateJavaVM>(CREATE_JAVA_VM)
                .map_err(|err| InvocationError::MissingCreateJavaVM { path: lib_path.to_path_buf(), err })?
        };

        let option_strings = vm_args.iter().map(|arg| CString::new(arg.as_str())).collect::<Result<Vec<_>, _>>()?;
        let mut options = option_strings.iter().map(|option| JavaVMOption {
            optionString: option.as_ptr() as *mut c_char,
            extraInfo: null_mut(),
        }).collect::<Vec<_>>();
        let mut init_args = JavaVMInitArgs {
            version: JNI_VERSION_1_2,
            nOptions: options.len() as jint,
            options: options.as_mut_ptr(),
            ignoreUnrecognized: JNI_TRUE,
        };

        debug!("creating java vm from {} with {} options", lib_path.display(), options.len());
        let mut jvm: *mut JavaVM = null_mut();
        let mut env: *mut c_void = null_mut();
        let res = unsafe { create_java_vm(&mut jvm, &mut env, &mut init_args as *mut JavaVMInitArgs as *mut c_void) };
        if res != JNI_OK {
            return Err(InvocationError::CreateJavaVM(res));
        }
        // hotspot can't be unloaded, keep the library mapped for the rest of the process
        std::mem::forget(library);

        let env = env as *mut JNIEnv;
        let exit_code = unsafe { run_main_class(env, self.main_class.as_str(), prog_args) };
        unsafe { destroy_java_vm(jvm) };
        let exit_code = exit_code?;
        info!("{} returned {}", self.main_class, exit_code);
        Ok(exit_code)
    }
}

unsafe fn destroy_java_vm(jvm: *mut JavaVM) {
    match (**jvm).DestroyJavaVM {
        Some(destroy) => {
            let res = destroy(jvm);
            if res != JNI_OK {
                error!("DestroyJavaVM failed with {}", res);
            }
        }
        None => error!("jni invoke interface has no DestroyJavaVM"),
    }
}

unsafe fn describe_pending_exception(env: *mut JNIEnv) -> Result<bool, InvocationError> {
    if jni_fn!(env, ExceptionCheck)(env) == JNI_TRUE {
        jni_fn!(env, ExceptionDescribe)(env);
        jni_fn!(env, ExceptionClear)(env);
        return Ok(true);
    }
    Ok(false)
}

pub const EXCEPTION_EXIT_CODE: i32 = -1;

// the value CallIntMethodA returns is undefined once run has thrown
pub fn run_exit_code(returned: jint, threw: bool) -> i32 {
    if threw {
        EXCEPTION_EXIT_CODE
    } else {
        returned
    }
}

unsafe fn run_main_class(env: *mut JNIEnv, main_class: &str, prog_args: &[String]) -> Result<i32, InvocationError> {
    let class_name = CString::new(main_class)?;
    let class: jclass = jni_fn!(env, FindClass)(env, class_name.as_ptr());
    if class.is_null() {
        describe_pending_exception(env)?;
        return Err(InvocationError::MainClassNotFound(main_class.to_string()));
    }

    let constructor_name = CString::new(CONSTRUCTOR_NAME)?;
    let constructor_signature = CString::new(CONSTRUCTOR_SIGNATURE)?;
    let constructor = jni_fn!(env, GetMethodID)(env, class, constructor_name.as_ptr(), constructor_signature.as_ptr());
    if constructor.is_null() {
        describe_pending_exception(env)?;
        return Err(InvocationError::MethodNotFound { class: main_class.to_string(), name: CONSTRUCTOR_NAME, signature: CONSTRUCTOR_SIGNATURE });
    }
    let main_object: jobject = jni_fn!(env, NewObjectA)(env, class, constructor, null());
    if main_object.is_null() {
        describe_pending_exception(env)?;
        return Err(InvocationError::Instantiation(main_class.to_string()));
    }

    let run_name = CString::new(RUN_NAME)?;
    let run_signature = CString::new(RUN_SIGNATURE)?;
    let run = jni_fn!(env, GetMethodID)(env, class, run_name.as_ptr(), run_signature.as_ptr());
    if run.is_null() {
        describe_pending_exception(env)?;
        jni_fn!(env, DeleteLocalRef)(env, main_object);
        return Err(InvocationError::MethodNotFound { class: main_class.to_string(), name: RUN_NAME, signature: RUN_SIGNATURE });
    }

    let run_args = match create_run_args(env, prog_args) {
        Ok(run_args) => run_args,
        Err(err) => {
            describe_pending_exception(env)?;
            jni_fn!(env, DeleteLocalRef)(env, main_object);
            return Err(err);
        }
    };
    let args = [jvalue { l: run_args }];
    let returned = jni_fn!(env, CallIntMethodA)(env, main_object, run, args.as_ptr());
    let threw = describe_pending_exception(env)?;
    if threw {
        error!("{}.run threw an exception", main_class);
    }
    let exit_code = run_exit_code(returned, threw);
    jni_fn!(env, DeleteLocalRef)(env, run_args);
    jni_fn!(env, DeleteLocalRef)(env, main_object);
    Ok(exit_code)
}

//todo NewStringUTF wants modified utf-8, arguments with supplementary characters need re-encoding first
unsafe fn create_run_args(env: *mut JNIEnv, prog_args: &[String]) -> Result<jobjectArray, InvocationError> {
    let string_class = jni_fn!(env, FindClass)(env, STRING_CLASS.as_ptr() as *const c_char);
    if string_class.is_null() {
        return Err(InvocationError::MainClassNotFound("java/lang/String".to_string()));
    }
    let array = jni_fn!(env, NewObjectArray)(env, prog_args.len() as jsize, string_class, null_mut());
    if array.is_null() {
        return Err(InvocationError::Arguments(format!("{} program arguments", prog_args.len())));
    }
    for (i, arg) in prog_args.iter().enumerate() {
        let c_arg = CString::new(arg.as_str())?;
        let string = jni_fn!(env, NewStringUTF)(env, c_arg.as_ptr());
        if string.is_null() {
            jni_fn!(env, DeleteLocalRef)(env, array);
            return Err(InvocationError::Arguments(arg.clone()));
        }
        jni_fn!(env, SetObjectArrayElement)(env, array, i as jsize, string);
        jni_fn!(env, DeleteLocalRef)(env, string);
    }
    Ok(array)
}
