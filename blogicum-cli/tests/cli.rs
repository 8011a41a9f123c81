use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("blogicum-cli").unwrap();
    // Сервер на этом порту не слушает
    cmd.env("BLOGICUM_SERVER", "http://127.0.0.1:9");
    cmd
}

#[test]
fn help_lists_commands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("feed"))
        .stdout(predicate::str::contains("edit-comment"))
        .stdout(predicate::str::contains("admin"));
}

#[test]
fn status_without_token_fails() {
    let dir = tempdir().unwrap();
    cli()
        .env("BLOGICUM_TOKEN_FILE", dir.path().join("token"))
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No token found"));
}

#[test]
fn logout_removes_saved_token() {
    let dir = tempdir().unwrap();
    let token_file = dir.path().join("token");
    std::fs::write(&token_file, "abc.def.ghi").unwrap();

    cli()
        .env("BLOGICUM_TOKEN_FILE", &token_file)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out"));
    assert!(!token_file.exists());

    cli()
        .env("BLOGICUM_TOKEN_FILE", &token_file)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("No saved token"));
}

#[test]
fn create_rejects_malformed_date() {
    cli()
        .args([
            "create", "--title", "T", "--text", "B", "--category", "1", "--pub-date", "soon",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("RFC 3339"));
}
