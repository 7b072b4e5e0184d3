//! System diagnostics and dependency checking.
//!
//! Verifies that required system tools are installed and the configured
//! credentials are usable before a run burns time on staging.

use crate::config::Config;
use crate::gcp::auth::ServiceAccountKey;
use std::process::Command;

/// Result of a dependency check.
#[derive(Debug, PartialEq)]
pub enum CheckResult {
    /// Tool is installed and working
    Ok,
    /// Tool is not found
    NotFound,
    /// Tool is found but has issues
    Warning(String),
}

/// Check if a command exists and is executable.
fn check_command(command: &str) -> CheckResult {
    match Command::new(command).arg("-version").output() {
        Ok(output) if output.status.success() => CheckResult::Ok,
        Ok(_) => CheckResult::Warning(format!("'{}' found but -version failed", command)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => CheckResult::NotFound,
        Err(e) => CheckResult::Warning(format!("Error checking '{}': {}", command, e)),
    }
}

/// Check the configured credential file parses as a service-account key.
fn check_credentials(config: &Config) -> CheckResult {
    let Some(path) = &config.gcp.credentials else {
        return CheckResult::NotFound;
    };
    match ServiceAccountKey::load(path) {
        Ok(key) => {
            if key.client_email.ends_with(".gserviceaccount.com") {
                CheckResult::Ok
            } else {
                CheckResult::Warning(format!(
                    "client_email '{}' does not look like a service account",
                    key.client_email
                ))
            }
        }
        Err(e) => CheckResult::Warning(e.to_string()),
    }
}

/// Run all dependency checks and print results.
pub fn check_dependencies(config: &Config) {
    println!("Checking system dependencies...\n");

    print!("ffprobe (media probing): ");
    match check_command("ffprobe") {
        CheckResult::Ok => println!("✓ OK"),
        CheckResult::NotFound => {
            println!("✗ NOT FOUND");
            println!("  Install: sudo apt install ffmpeg  (Debian/Ubuntu)");
            println!("           sudo pacman -S ffmpeg    (Arch)");
        }
        CheckResult::Warning(msg) => println!("⚠ WARNING: {}", msg),
    }

    print!("ffmpeg (transcoding): ");
    match check_command("ffmpeg") {
        CheckResult::Ok => println!("✓ OK"),
        CheckResult::NotFound => {
            println!("✗ NOT FOUND");
            println!("  Install: sudo apt install ffmpeg  (Debian/Ubuntu)");
        }
        CheckResult::Warning(msg) => println!("⚠ WARNING: {}", msg),
    }

    print!("service-account credentials: ");
    match check_credentials(config) {
        CheckResult::Ok => println!("✓ OK"),
        CheckResult::NotFound => {
            println!("- not configured");
            println!("  Set gcp.credentials in the config file, --credentials, or GSCRIBE_CREDENTIALS.");
        }
        CheckResult::Warning(msg) => println!("⚠ WARNING: {}", msg),
    }

    print!("project id: ");
    match &config.gcp.project {
        Some(project) => println!("✓ {} (bucket: {}-{})", project, project, config.gcp.bucket_suffix),
        None => {
            println!("- not configured");
            println!("  Set gcp.project in the config file, --project, or GSCRIBE_PROJECT.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_check_command_not_found() {
        assert_eq!(
            check_command("gscribe-tool-that-does-not-exist"),
            CheckResult::NotFound
        );
    }

    #[test]
    fn test_check_credentials_unconfigured() {
        let config = Config::default();
        assert_eq!(check_credentials(&config), CheckResult::NotFound);
    }

    #[test]
    fn test_check_credentials_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not json").unwrap();

        let mut config = Config::default();
        config.gcp.credentials = Some(file.path().to_path_buf());

        assert!(matches!(
            check_credentials(&config),
            CheckResult::Warning(_)
        ));
    }

    #[test]
    fn test_check_credentials_valid_key() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{"client_email": "speech@negishi.iam.gserviceaccount.com", "private_key": "k"}"#,
        )
        .unwrap();

        let mut config = Config::default();
        config.gcp.credentials = Some(file.path().to_path_buf());

        assert_eq!(check_credentials(&config), CheckResult::Ok);
    }
}
