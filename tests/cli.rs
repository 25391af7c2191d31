//  ██████╗  █████╗ ███████╗███████╗██╗███╗   ██╗ ██████╗
//  ██╔══██╗██╔══██╗██╔════╝██╔════╝██║████╗  ██║██╔════╝
//  ██████╔╝███████║███████╗███████╗██║██╔██╗ ██║██║  ███╗
//  ██╔═══╝ ██╔══██║╚════██║╚════██║██║██║╚██╗██║██║   ██║
//  ██║     ██║  ██║███████║███████║██║██║ ╚████║╚██████╔╝
//  ╚═╝     ╚═╝  ╚═╝╚══════╝╚══════╝╚═╝╚═╝  ╚═══╝ ╚═════╝

mod common;

#[cfg(test)]
mod passing {
    use std::fs;
    use std::process::Command;

    use assert_cmd::prelude::*;
    use tempfile::tempdir;

    use crate::common;

    const BIN: &str = "webarchive-extract";

    #[test]
    fn writes_beside_the_archive_by_default() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("page.webarchive");
        fs::write(&archive, common::sample_archive_bytes()).unwrap();

        let out = Command::cargo_bin(BIN).unwrap().arg(&archive).output().unwrap();

        assert!(out.status.success());
        assert_eq!(String::from_utf8_lossy(&out.stdout), "");
        let html = fs::read_to_string(dir.path().join("page.html")).unwrap();
        assert!(html.contains("href=\"page_files/style.css\""));
        assert!(dir.path().join("page_files").join("logo.png").exists());
        assert!(dir.path().join("page_files").join("frame.html").exists());
    }

    #[test]
    fn explicit_output_path() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("page.webarchive");
        let output = dir.path().join("saved.htm");
        fs::write(&archive, common::sample_archive_bytes()).unwrap();

        Command::cargo_bin(BIN)
            .unwrap()
            .arg(&archive)
            .arg(&output)
            .assert()
            .success();

        assert!(output.exists());
        assert!(dir.path().join("saved_files").join("style.css").exists());
        assert!(!dir.path().join("page.html").exists());
    }

    #[test]
    fn single_file_flag() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("page.webarchive");
        fs::write(&archive, common::sample_archive_bytes()).unwrap();

        Command::cargo_bin(BIN)
            .unwrap()
            .arg("-s")
            .arg(&archive)
            .assert()
            .success();

        let html = fs::read_to_string(dir.path().join("page.html")).unwrap();
        assert!(html.contains("<img src='data:image/png;base64,"));
        assert!(!dir.path().join("page_files").exists());
    }

    #[test]
    fn verbose_lists_written_files() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("page.webarchive");
        fs::write(&archive, common::sample_archive_bytes()).unwrap();

        let out = Command::cargo_bin(BIN)
            .unwrap()
            .arg("-v")
            .arg(&archive)
            .output()
            .unwrap();

        assert!(out.status.success());
        let stderr = String::from_utf8_lossy(&out.stderr);
        assert_eq!(stderr.matches("wrote file").count(), 5);
        assert!(stderr.contains("frame-only.png"));
    }

    #[test]
    fn help_lists_environment_variables() {
        let out = Command::cargo_bin(BIN).unwrap().arg("--help").output().unwrap();

        assert!(out.status.success());
        let stdout = String::from_utf8_lossy(&out.stdout);
        assert!(stdout.contains("--single-file"));
        assert!(stdout.contains("WEBARCHIVE_LOG_LEVEL"));
    }
}

//  ███████╗ █████╗ ██╗██╗     ██╗███╗   ██╗ ██████╗
//  ██╔════╝██╔══██╗██║██║     ██║████╗  ██║██╔════╝
//  █████╗  ███████║██║██║     ██║██╔██╗ ██║██║  ███╗
//  ██╔══╝  ██╔══██║██║██║     ██║██║╚██╗██║██║   ██║
//  ██║     ██║  ██║██║███████╗██║██║ ╚████║╚██████╔╝
//  ╚═╝     ╚═╝  ╚═╝╚═╝╚══════╝╚═╝╚═╝  ╚═══╝ ╚═════╝

#[cfg(test)]
mod failing {
    use std::fs;
    use std::process::Command;

    use assert_cmd::prelude::*;
    use tempfile::tempdir;

    const BIN: &str = "webarchive-extract";

    #[test]
    fn missing_archive() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("absent.webarchive");

        let out = Command::cargo_bin(BIN).unwrap().arg(&archive).output().unwrap();

        assert_eq!(out.status.code(), Some(1));
        let stderr = String::from_utf8_lossy(&out.stderr);
        assert!(stderr.contains("absent.webarchive: I/O error"));
        assert!(!dir.path().join("absent.html").exists());
    }

    #[test]
    fn not_a_property_list() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("page.webarchive");
        fs::write(&archive, "<html></html>").unwrap();

        let out = Command::cargo_bin(BIN)
            .unwrap()
            .env("NO_COLOR", "1")
            .arg(&archive)
            .output()
            .unwrap();

        assert_eq!(out.status.code(), Some(1));
        let stderr = String::from_utf8_lossy(&out.stderr);
        assert!(stderr.contains("invalid property list: missing \"bplist00\" header"));
    }

    #[test]
    fn missing_argument() {
        let out = Command::cargo_bin(BIN).unwrap().output().unwrap();
        assert!(!out.status.success());
    }
}
