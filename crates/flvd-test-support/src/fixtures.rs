//! Test fixtures for destination prefixes and shell-backed client stand-ins.

use std::path::{MAIN_SEPARATOR, Path};

/// Shell used to stand in for the external streaming client.
pub const SHELL: &str = "/bin/sh";

/// Render `dir` as a destination prefix ending in a path separator, so that
/// `prefix ++ title ++ ".flv"` lands inside `dir`.
#[must_use]
pub fn destination_prefix(dir: &Path) -> String {
    let mut prefix = dir.display().to_string();
    if !prefix.ends_with(MAIN_SEPARATOR) {
        prefix.push(MAIN_SEPARATOR);
    }
    prefix
}

/// Leading arguments that turn [`SHELL`] into a client stand-in running
/// `script`.
///
/// The fetcher appends `-r <url> -o <path>`, so inside the script `$2` is the
/// URL and `$4` is the output path.
#[must_use]
pub fn shell_client_args(script: &str) -> Vec<String> {
    vec![
        "-c".to_string(),
        script.to_string(),
        "flvstreamer".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_prefix_appends_single_separator() {
        let prefix = destination_prefix(Path::new("/tmp/out"));
        assert_eq!(prefix, format!("/tmp/out{MAIN_SEPARATOR}"));
        assert_eq!(destination_prefix(Path::new(&prefix)), prefix);
    }

    #[test]
    fn shell_client_args_name_the_script_process() {
        let args = shell_client_args("exit 0");
        assert_eq!(args, vec!["-c", "exit 0", "flvstreamer"]);
    }
}
