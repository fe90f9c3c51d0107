//! Generic parameters functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::warn;
use serde::de::DeserializeOwned;
use std::fs::read_to_string;
use std::path::Path;
use thiserror::Error;
use toml;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("The software root environment variable ({}) is not set", crate::host::SW_ROOT_ENV_VAR)]
    SwRootNotSet,

    #[error("Cannot load the parmeter file: {0}")]
    FileLoadError(std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    DeserialiseError(toml::de::Error)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file
///
/// The file path is relative to the `params` directory of the software root.
pub fn load<P>(param_file_path: &str) -> Result<P, LoadError> 
where
    P: DeserializeOwned
{
    // Get the params dir
    let mut path = crate::host::get_sw_root()
        .map_err(|_| LoadError::SwRootNotSet)?;
    path.push("params");
    path.push(param_file_path);

    load_from_path(path)
}

/// Load a parameter file from an explicit path.
pub fn load_from_path<P, F>(path: F) -> Result<P, LoadError>
where
    P: DeserializeOwned,
    F: AsRef<Path>
{
    // Load the file into a string
    let params_str = read_to_string(path)
        .map_err(LoadError::FileLoadError)?;

    // Parse the string into the parameter struct
    toml::from_str(params_str.as_str())
        .map_err(LoadError::DeserialiseError)
}

/// Load a parameter file, falling back on the default parameters if the file cannot be found.
///
/// A file which exists but cannot be parsed is still an error.
pub fn load_or_default<P>(param_file_path: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned + Default
{
    match load(param_file_path) {
        Ok(p) => Ok(p),
        Err(LoadError::SwRootNotSet) => {
            warn!(
                "{} is not set, using default parameters for {}",
                crate::host::SW_ROOT_ENV_VAR,
                param_file_path
            );
            Ok(P::default())
        },
        Err(LoadError::FileLoadError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("{} not found, using default parameters", param_file_path);
            Ok(P::default())
        },
        Err(e) => Err(e)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, PartialEq)]
    struct TestParams {
        gain: f64,
        names: Vec<String>
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.toml");
        std::fs::write(&path, "gain = 0.05\nnames = [\"a\", \"b\"]\n").unwrap();

        let p: TestParams = load_from_path(&path).unwrap();
        assert_eq!(p, TestParams { gain: 0.05, names: vec!["a".into(), "b".into()] });

        std::fs::write(&path, "gain = \"high\"\n").unwrap();
        assert!(matches!(
            load_from_path::<TestParams, _>(&path),
            Err(LoadError::DeserialiseError(_))
        ));

        assert!(matches!(
            load_from_path::<TestParams, _>(dir.path().join("missing.toml")),
            Err(LoadError::FileLoadError(_))
        ));
    }
}
