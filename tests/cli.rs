use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use tempfile::TempDir;

const BIN_NAME: &str = "pocketbook";

/// Each test gets its own HOME so settings and data never leak between runs.
struct Sandbox {
    home: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            home: tempfile::tempdir().expect("temp home"),
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin(BIN_NAME).expect("binary exists");
        cmd.env("HOME", self.home.path())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) {
        self.cmd().args(args).assert().success();
    }

    fn signed_in(user: &str) -> Self {
        let sandbox = Self::new();
        let data_dir = sandbox.home.path().join("data");
        sandbox.run(&["init", "--data-dir", data_dir.to_str().expect("utf-8 path")]);
        sandbox.run(&["login", user]);
        sandbox
    }
}

#[test]
fn data_commands_require_login() {
    let sandbox = Sandbox::new();
    let data_dir = sandbox.home.path().join("data");
    sandbox.run(&["init", "--data-dir", data_dir.to_str().unwrap()]);

    sandbox
        .cmd()
        .args(["rules", "list"])
        .assert()
        .failure()
        .stderr(contains("Not signed in"));
}

#[test]
fn login_and_logout_update_status() {
    let sandbox = Sandbox::signed_in("alice");
    sandbox
        .cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(contains("alice").and(contains("Transactions:")));

    sandbox.cmd().arg("logout").assert().success().stdout(contains("Signed out alice"));
    sandbox
        .cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(contains("(not signed in)"));
}

#[test]
fn status_before_init_suggests_init() {
    Sandbox::new()
        .cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(contains("pocketbook init"));
}

#[test]
fn category_and_rule_validation() {
    let sandbox = Sandbox::signed_in("alice");
    sandbox
        .cmd()
        .args(["categories", "add", "Groceries", "--color", "green"])
        .assert()
        .success()
        .stdout(contains("Added category"));
    sandbox
        .cmd()
        .args(["categories", "add", "Fun", "--color", "magenta"])
        .assert()
        .failure()
        .stderr(contains("unknown color"));
    sandbox
        .cmd()
        .args(["rules", "add", "%WHOLE FOODS%", "--category", "Groceries", "--confidence", "150"])
        .assert()
        .failure()
        .stderr(contains("confidence"));
    sandbox
        .cmd()
        .args(["rules", "add", "%WHOLE FOODS%", "--category", "Nope"])
        .assert()
        .failure()
        .stderr(contains("Unknown category: Nope"));
    sandbox
        .cmd()
        .args(["rules", "add", "%WHOLE FOODS%", "--category", "Groceries"])
        .assert()
        .success()
        .stdout(contains("(50%)"));
    sandbox
        .cmd()
        .args(["rules", "list"])
        .assert()
        .success()
        .stdout(contains("%WHOLE FOODS%"));
}

#[test]
fn budget_add_and_show() {
    let sandbox = Sandbox::signed_in("alice");
    sandbox.run(&["categories", "add", "Dining", "--color", "orange"]);
    sandbox
        .cmd()
        .args([
            "budgets", "add", "Dining", "--amount", "150", "--start", "2024-01-01", "--every", "weekly",
            "--interval", "2",
        ])
        .assert()
        .success()
        .stdout(contains("Added budget 1").and(contains("every 2 weeks")));
    sandbox
        .cmd()
        .args(["budgets", "add", "Dining", "--amount", "0"])
        .assert()
        .failure()
        .stderr(contains("greater than zero"));
    sandbox
        .cmd()
        .args(["budgets", "add", "Dining", "--amount", "10", "--every", "fortnightly"])
        .assert()
        .failure()
        .stderr(contains("unknown recurrence type"));
    sandbox
        .cmd()
        .args(["budgets", "show", "1"])
        .assert()
        .success()
        .stdout(contains("Every 2 weeks".to_lowercase()).and(contains("History")));
    sandbox
        .cmd()
        .args(["budgets", "show", "99"])
        .assert()
        .failure()
        .stderr(contains("No budget with ID 99"));
}

#[test]
fn demo_flow_reports() {
    let sandbox = Sandbox::signed_in("alice");
    sandbox
        .cmd()
        .arg("demo")
        .assert()
        .success()
        .stdout(contains("Demo data loaded for alice"));
    sandbox
        .cmd()
        .arg("demo")
        .assert()
        .success()
        .stdout(contains("already loaded"));

    sandbox
        .cmd()
        .args(["transactions", "list", "--uncategorized"])
        .assert()
        .success()
        .stdout(contains("TARGET STORE"));
    sandbox
        .cmd()
        .args(["report", "spending"])
        .assert()
        .success()
        .stdout(contains("TOTAL"));
    sandbox
        .cmd()
        .args(["report", "monthly", "--months", "3"])
        .assert()
        .success()
        .stdout(contains("Average:").and(contains("Top:")));
    sandbox
        .cmd()
        .args(["report", "budgets"])
        .assert()
        .success()
        .stdout(contains("Groceries").and(contains("near limit")));
    sandbox
        .cmd()
        .args(["budgets", "refresh"])
        .assert()
        .success()
        .stdout(contains("periods refreshed"));
}

#[test]
fn users_do_not_see_each_other() {
    let sandbox = Sandbox::signed_in("alice");
    sandbox.run(&["demo"]);
    sandbox.run(&["login", "bob"]);
    sandbox
        .cmd()
        .args(["transactions", "list"])
        .assert()
        .success()
        .stdout(contains("No transactions found."));
    sandbox
        .cmd()
        .args(["budgets", "show", "1"])
        .assert()
        .failure()
        .stderr(contains("No budget with ID 1"));
}

#[test]
fn quick_rule_categorizes_transaction() {
    let sandbox = Sandbox::signed_in("alice");
    sandbox.run(&["demo"]);
    // The first demo transaction is always a payroll deposit; id 1.
    sandbox
        .cmd()
        .args(["transactions", "quick-rule", "1", "--category", "Income", "--confidence", "85"])
        .assert()
        .success()
        .stdout(contains("'%PAYROLL ACME CORP%'").and(contains("(85%)")));
    sandbox
        .cmd()
        .args(["transactions", "quick-rule", "9999", "--category", "Income"])
        .assert()
        .failure()
        .stderr(contains("No transaction with ID 9999"));
}

#[test]
fn transactions_list_rejects_huge_page() {
    let sandbox = Sandbox::signed_in("alice");
    sandbox
        .cmd()
        .args(["transactions", "list", "--limit", "2", "--page", &usize::MAX.to_string()])
        .assert()
        .failure()
        .stderr(contains("--page is too large"));
}
