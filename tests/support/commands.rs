//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

impl Test {
    /// Create a dev-vault command isolated from the caller's environment.
    ///
    /// Store credentials are removed and the settings file points into the
    /// temporary home, so no test can reach a real store by accident.
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("dev-vault").expect("failed to find dev-vault binary");
        cmd.env("HOME", self.home.path());
        cmd.env("USERPROFILE", self.home.path());
        cmd.env("DEV_VAULT_CONFIG", self.home.path().join("config.toml"));
        cmd.env("DEV_VAULT_API_URL", "http://127.0.0.1:9");
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("SCW_SECRET_KEY");
        cmd.env_remove("SCW_DEFAULT_PROJECT_ID");
        cmd.env_remove("SCW_DEFAULT_REGION");
        cmd.env_remove("DEV_VAULT_LOG");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Run dev-vault with the given arguments.
    pub fn run(&self, args: &[&str]) -> Output {
        self.cmd()
            .args(args)
            .output()
            .expect("failed to run dev-vault")
    }

    /// Shortcut for `dev-vault pull`.
    pub fn pull(&self, args: &[&str]) -> Output {
        let mut all = vec!["pull"];
        all.extend_from_slice(args);
        self.run(&all)
    }

    /// Shortcut for `dev-vault push`.
    pub fn push(&self, args: &[&str]) -> Output {
        let mut all = vec!["push"];
        all.extend_from_slice(args);
        self.run(&all)
    }
}
