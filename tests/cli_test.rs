//! CLI argument parsing tests.
//!
//! These only exercise clap wiring; nothing here talks to a browser.

use assert_cmd::Command;
use predicates::prelude::*;

/// Get the dvdebug binary command
fn dvdebug() -> Command {
    Command::cargo_bin("dvdebug").unwrap()
}

mod help {
    use super::*;

    #[test]
    fn shows_help() {
        dvdebug()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("dvdebug"))
            .stdout(predicate::str::contains("debug panel"));
    }

    #[test]
    fn shows_version() {
        dvdebug()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("dvdebug"));
    }

    #[test]
    fn lists_panel_commands() {
        dvdebug()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("open"))
            .stdout(predicate::str::contains("close"))
            .stdout(predicate::str::contains("toggle"))
            .stdout(predicate::str::contains("tool"))
            .stdout(predicate::str::contains("watch"));
    }
}

mod tool_command {
    use super::*;

    #[test]
    fn tool_requires_a_name() {
        dvdebug()
            .arg("tool")
            .assert()
            .failure()
            .stderr(predicate::str::contains("NAME"));
    }

    #[test]
    fn tool_help_shows_open_flag() {
        dvdebug()
            .args(["tool", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--open"));
    }
}

mod agent_command {
    use super::*;

    #[test]
    fn agent_requires_a_subcommand() {
        dvdebug().arg("agent").assert().failure();
    }

    #[test]
    fn agent_help_lists_subcommands() {
        dvdebug()
            .args(["agent", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("run"))
            .stdout(predicate::str::contains("ping"))
            .stdout(predicate::str::contains("check"))
            .stdout(predicate::str::contains("inject"));
    }

    #[test]
    fn agent_ping_accepts_port_flag() {
        dvdebug()
            .args(["agent", "ping", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--port"));
    }
}

mod config_command {
    use super::*;

    #[test]
    fn config_path_prints_a_path() {
        dvdebug()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_emits_defaults() {
        dvdebug()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("dragvertising.com"))
            .stdout(predicate::str::contains("dv_ext_present"));
    }

    #[test]
    fn config_show_json_is_parseable() {
        let output = dvdebug()
            .args(["config", "show", "--json"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();

        let value: serde_json::Value =
            serde_json::from_slice(&output).expect("config show --json must emit valid JSON");
        assert_eq!(value["origins"]["production_domain"], "dragvertising.com");
    }
}

mod global_flags {
    use super::*;

    #[test]
    fn cdp_port_flag_is_global() {
        dvdebug()
            .args(["--cdp-port", "9333", "config", "path"])
            .assert()
            .success();
    }

    #[test]
    fn rejects_non_numeric_cdp_port() {
        dvdebug()
            .args(["--cdp-port", "nope", "status"])
            .assert()
            .failure();
    }
}
