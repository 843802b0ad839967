//! CUDA version extraction from the three system sources.

use regex::Regex;

/// Environment variables naming the CUDA toolkit root, in lookup order.
pub const TOOLKIT_HOME_VARS: [&str; 2] = ["CUDA_PATH", "CUDA_HOME"];

/// Version files a toolkit root may carry, in lookup order.
pub const VERSION_FILES: [&str; 2] = ["version.txt", "version.json"];

fn first_major_minor(pattern: &str, haystack: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    let caps = re.captures(haystack)?;
    Some(format!("{}.{}", &caps[1], &caps[2]))
}

/// `release X.Y` from `nvcc --version` output.
pub fn from_nvcc_output(output: &str) -> Option<String> {
    first_major_minor(r"release (\d+)\.(\d+)", output)
}

/// First `X.Y` in a toolkit version file.
pub fn from_version_file(contents: &str) -> Option<String> {
    first_major_minor(r"(\d+)\.(\d+)", contents)
}

/// First `X.Y` in a toolkit root path such as `.../CUDA/v12.1` or
/// `/usr/local/cuda-11.8`.
///
/// Narrower than taking the first `X.Y` in any path: a root that does not
/// mention CUDA (case-insensitive) yields `None`, so a variable pointing at
/// e.g. `/opt/python3.11` is not read as CUDA 3.11.
pub fn from_toolkit_path(path: &str) -> Option<String> {
    if !path.to_lowercase().contains("cuda") {
        return None;
    }
    first_major_minor(r"(\d+)\.(\d+)", path)
}
