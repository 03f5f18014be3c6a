use log::{debug, error};
use std::collections::BTreeSet;
use std::env;
use std::path::Path;
use std::time::Instant;
use tokio::process::Command;

use crate::error::{SamplerError, Tool};

/// Runs an external tool and returns its stdout, or `None` when it could not
/// be started or exited unsuccessfully. Output is forced to the C locale.
pub async fn run_tool(program: &str, args: &[&str]) -> Option<String> {
    let cmd_start = Instant::now();
    let cmd = Command::new(program)
        .args(args)
        .env("LC_ALL", "C")
        .kill_on_drop(true)
        .output()
        .await;
    debug!(
        "{} command execution took: {} ms",
        program,
        cmd_start.elapsed().as_millis()
    );

    match cmd {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => {
            error!(
                "{} exited with {}: {}",
                program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            None
        }
        Err(e) => {
            error!("Error running {}: {}", program, e);
            None
        }
    }
}

/// Whether `program` resolves to a file on `PATH`.
pub fn is_installed(program: &str) -> bool {
    if program.contains('/') {
        return Path::new(program).is_file();
    }
    env::var_os("PATH")
        .map(|paths| env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

/// Fails with every tool in `required` that is not installed.
pub fn check_dependencies<I>(required: I) -> Result<(), SamplerError>
where
    I: IntoIterator<Item = Tool>,
{
    let unique: BTreeSet<_> = required
        .into_iter()
        .map(|tool| (tool.program, tool.package))
        .collect();
    let missing: Vec<Tool> = unique
        .into_iter()
        .filter(|(program, _)| !is_installed(program))
        .map(|(program, package)| Tool { program, package })
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SamplerError::MissingDependencies(missing))
    }
}
