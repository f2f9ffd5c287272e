use std::io::Write;
use std::process::{Command, Output};
use std::str;
use tempfile::TempDir;

/// CLI interface tests
#[cfg(test)]
mod cli_tests {
    use super::*;

    fn dualcom(settings: &std::path::Path, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_dualcom"))
            .arg("--quiet")
            .arg("--config")
            .arg(settings)
            .args(args)
            .output()
            .expect("Failed to execute command")
    }

    #[test]
    fn test_cli_help() {
        let output = Command::new(env!("CARGO_BIN_EXE_dualcom"))
            .arg("--help")
            .output()
            .expect("Failed to execute command");

        let stdout = str::from_utf8(&output.stdout).expect("Invalid UTF-8");
        assert!(stdout.contains("Usage:"));
        assert!(stdout.contains("Commands:"));
        for command in ["ports", "import", "send", "monitor", "macro", "config", "version"] {
            assert!(stdout.contains(command), "help lacks {}", command);
        }
    }

    #[test]
    fn test_cli_version() {
        let temp = TempDir::new().unwrap();
        let output = dualcom(&temp.path().join("settings.toml"), &["version"]);
        assert!(output.status.success());
        // --quiet suppresses the message; the plain form prints it
        let output = Command::new(env!("CARGO_BIN_EXE_dualcom"))
            .args(["--config"])
            .arg(temp.path().join("settings.toml"))
            .arg("version")
            .output()
            .unwrap();
        let stdout = str::from_utf8(&output.stdout).unwrap();
        assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_macro_set_list_delete() {
        let temp = TempDir::new().unwrap();
        let settings = temp.path().join("settings.toml");

        let output = dualcom(&settings, &["macro", "-s", "2", "set", "1", "AT+GMR"]);
        assert!(output.status.success(), "{:?}", output);
        let output = dualcom(&settings, &["macro", "-s", "2", "set", "2", "AA 55", "--hex"]);
        assert!(output.status.success(), "{:?}", output);
        assert!(settings.exists());

        let output = dualcom(&settings, &["-o", "json", "macro", "-s", "2", "list"]);
        let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let macros = listed["macros"].as_array().unwrap();
        assert_eq!(macros.len(), 2);
        assert_eq!(macros[0]["content"], "AT+GMR");
        assert_eq!(macros[1]["hex"], true);

        let output = dualcom(&settings, &["macro", "-s", "2", "delete", "1"]);
        assert!(output.status.success());
        let output = dualcom(&settings, &["-o", "json", "macro", "-s", "2", "list"]);
        let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let macros = listed["macros"].as_array().unwrap();
        assert_eq!(macros.len(), 1);
        assert_eq!(macros[0]["content"], "AA 55");
        assert_eq!(macros[0]["index"], 1);

        // Session 1 untouched
        let output = dualcom(&settings, &["-o", "json", "macro", "list"]);
        let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert!(listed["macros"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_macro_set_rejects_bad_hex() {
        let temp = TempDir::new().unwrap();
        let settings = temp.path().join("settings.toml");
        let output = dualcom(&settings, &["macro", "set", "1", "ABC", "--hex"]);
        assert!(!output.status.success());
        assert!(!settings.exists());
    }

    #[test]
    fn test_import_legacy_file() {
        let temp = TempDir::new().unwrap();
        let settings = temp.path().join("settings.toml");
        let import = temp.path().join("quick.ini");
        let mut file = std::fs::File::create(&import).unwrap();
        write!(file, "Str1=hello\r\nHex1=False\r\nStr2=01 02\r\nHex2=True\r\n").unwrap();

        let output = dualcom(&settings, &["-o", "json", "import", import.to_str().unwrap()]);
        assert!(output.status.success());
        let imported: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(imported.as_array().unwrap().len(), 2);
        assert_eq!(imported[1]["is_hex"], true);
        assert!(!settings.exists());

        let output = dualcom(&settings, &["import", import.to_str().unwrap(), "-s", "1"]);
        assert!(output.status.success());
        let stored = std::fs::read_to_string(&settings).unwrap();
        assert!(stored.contains("hello"));
    }

    #[test]
    fn test_config_show_json() {
        let temp = TempDir::new().unwrap();
        let output = dualcom(&temp.path().join("settings.toml"), &["-o", "json", "config", "show"]);
        assert!(output.status.success());
        let shown: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(shown["global"]["history_limit"], 20);
        assert_eq!(shown["session1"]["baud_rate"], 115200);
    }

    #[test]
    fn test_send_to_missing_port_fails() {
        let temp = TempDir::new().unwrap();
        let output = dualcom(
            &temp.path().join("settings.toml"),
            &["send", "-p", "/dev/dualcom-missing", "AT"],
        );
        assert!(!output.status.success());
        let stderr = str::from_utf8(&output.stderr).unwrap();
        assert!(stderr.contains("unavailable"));
    }
}
