//! Integration tests for tf-runner

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;

    fn tf_runner() -> Command {
        let mut cmd = cargo_bin_cmd!("tf-runner");
        // Keep job-container env vars from the host out of the tests
        cmd.env_remove("TERRAFORM_VERSION")
            .env_remove("TERRAFORM_WORKSPACE")
            .env_remove("TERRAFORM_DESTROY")
            .env_remove("TF_PLUGIN_CACHE_DIR")
            .env_remove("TERRAFORM_PROJECT_PATH")
            .env_remove("TERRAFORM_VAR_FILES_PATH")
            .env_remove("POD_NAMESPACE")
            .env_remove("OUTPUT_SECRET_NAME");
        cmd
    }

    #[test]
    fn help_displays() {
        tf_runner()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("--terraform-version"));
    }

    #[test]
    fn version_displays() {
        tf_runner()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("tf-runner"));
    }

    #[test]
    fn missing_required_configuration_fails() {
        tf_runner()
            .assert()
            .failure()
            .stderr(predicate::str::contains("--terraform-version"));
    }

    #[test]
    fn invalid_version_pin_fails_before_any_step() {
        tf_runner()
            .args([
                "--terraform-version",
                "latest",
                "--cache-dir",
                "/tmp/tf-cache",
                "--namespace",
                "default",
                "--output-secret",
                "my-secret",
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not a valid version"));
    }
}
