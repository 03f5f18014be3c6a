use futures::future::BoxFuture;
use futures::FutureExt;
use std::env;

use crate::collectors::command::run_tool;
use crate::collectors::MetricSource;
use crate::error::Tool;
use crate::models::{MetricKind, Reading};

pub const PS: Tool = Tool {
    program: "ps",
    package: "procps",
};

/// Longest command name the kernel keeps for a process.
const COMM_LEN: usize = 15;

/// Command names from `ps -eo comm= --sort=-pcpu` output, busiest first,
/// minus `exclude`, capped at `count`. Commas inside a name are replaced so
/// the joined list splits back into the same names.
pub fn top_commands(output: &str, count: usize, exclude: &[String]) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter(|name| !exclude.iter().any(|skip| skip.as_str() == *name))
        .take(count)
        .map(|name| name.replace(',', "_"))
        .collect()
}

/// Name this process shows up under in `ps`, if it can be determined.
fn own_command_name() -> Option<String> {
    let exe = env::current_exe().ok()?;
    let name = exe.file_name()?.to_str()?;
    Some(name.chars().take(COMM_LEN).collect())
}

/// The busiest processes by CPU share, excluding the sampler and the helper
/// tools it spawns.
#[derive(Debug, Clone)]
pub struct PsProcesses {
    count: usize,
    exclude: Vec<String>,
}

impl PsProcesses {
    pub fn new(count: usize, mut exclude: Vec<String>) -> Self {
        if let Some(own) = own_command_name() {
            if !exclude.contains(&own) {
                exclude.push(own);
            }
        }
        Self { count, exclude }
    }
}

impl MetricSource for PsProcesses {
    fn kind(&self) -> MetricKind {
        MetricKind::Processes
    }

    fn tools(&self) -> Vec<Tool> {
        vec![PS]
    }

    fn read(&self) -> BoxFuture<'_, Reading> {
        async move {
            let output = run_tool(PS.program, &["-eo", "comm=", "--sort=-pcpu"]).await;
            let names = output
                .as_deref()
                .map(|out| top_commands(out, self.count, &self.exclude))
                .unwrap_or_default();
            Reading::from_output(Some(names.join(",")))
        }
        .boxed()
    }
}
