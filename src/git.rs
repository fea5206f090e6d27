use std::fs;
use std::path::Path;
use std::process::Command;

use failure::{Error, ResultExt};
use log::debug;

/// Something which can produce a local checkout of a remote repository.
///
/// Callers only invoke [`Cloner::clone_repo`] once they have decided a
/// repository really should be cloned, so implementations don't need to
/// re-check the destination.
pub trait Cloner {
    fn clone_repo(&self, url: &str, dest_dir: &Path) -> Result<(), Error>;
}

impl<'a, C: Cloner + ?Sized> Cloner for &'a C {
    fn clone_repo(&self, url: &str, dest_dir: &Path) -> Result<(), Error> {
        (**self).clone_repo(url, dest_dir)
    }
}

/// Clone repositories by shelling out to `git`.
///
/// The URL is passed straight through, so a credentialed URL is visible in
/// the process's argument list for the duration of the clone.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct GitClone;

impl Cloner for GitClone {
    fn clone_repo(&self, url: &str, dest_dir: &Path) -> Result<(), Error> {
        if let Some(parent) = dest_dir.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).context(format!(
                    "Couldn't create the target directory ({})",
                    parent.display()
                ))?;
            }
        }

        do_clone(dest_dir, url)
    }
}

fn do_clone(dest_dir: &Path, url: &str) -> Result<(), Error> {
    debug!("Cloning into {}", dest_dir.display());

    let output = Command::new("git")
        .arg("clone")
        .arg("--quiet")
        .arg("--recursive")
        .arg(url)
        .arg(dest_dir)
        .output()
        .context("Unable to invoke git")?;

    if output.status.success() {
        Ok(())
    } else {
        Err(
            failure::err_msg(String::from_utf8(output.stderr).unwrap_or_else(
                |_| String::from("<couldn't read the error message>"),
            ))
            .context("Unable to clone the repository")
            .into(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Stdio;

    macro_rules! require_program {
        ($name:expr) => {{
            let exists = ::std::process::Command::new($name)
                .arg("--help")
                .stdout(::std::process::Stdio::null())
                .stderr(::std::process::Stdio::null())
                .status()
                .is_ok();
            if !exists {
                eprintln!("Couldn't find \"{}\"", $name);
                return;
            }
        }};
    }

    fn fixture_repo(dir: &Path) {
        let run = |args: &[&str]| {
            let status = Command::new("git")
                .args(args)
                .current_dir(dir)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .unwrap();
            assert!(status.success(), "git {:?} failed", args);
        };

        run(&["init", "--quiet", "."]);
        run(&["config", "user.email", "tests@localhost"]);
        run(&["config", "user.name", "Tests"]);
        fs::write(dir.join("README.md"), "fixture").unwrap();
        run(&["add", "README.md"]);
        run(&["commit", "--quiet", "-m", "initial"]);
    }

    #[test]
    fn clone_a_repo() {
        require_program!("git");

        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("src");
        fs::create_dir(&src).unwrap();
        fixture_repo(&src);

        let dest = temp.path().join("nested").join("dest");

        GitClone.clone_repo(src.to_str().unwrap(), &dest).unwrap();

        assert!(dest.join(".git").exists());
        assert!(dest.join("README.md").exists());
    }

    #[test]
    fn failed_clones_keep_the_error_message() {
        require_program!("git");

        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("missing");
        let dest = temp.path().join("dest");

        let err = GitClone
            .clone_repo(missing.to_str().unwrap(), &dest)
            .unwrap_err();

        assert!(err.to_string().contains("Unable to clone the repository"));
    }
}
