use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocateError {
    #[error("no vm library found for {command}")]
    NotFound {
        command: PathBuf
    },
    #[error("candidate location `{location}` is longer than {max} characters")]
    LocationTooLong {
        location: String,
        max: usize,
    },
}
