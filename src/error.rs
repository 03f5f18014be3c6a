use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// An external program a metric source shells out to, and the distribution
/// package that usually provides it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tool {
    pub program: &'static str,
    pub package: &'static str,
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.program, self.package)
    }
}

/// Conditions that stop the sampler before the first cycle.
///
/// Once the loop is running nothing in here is raised any more; per-reading
/// failures are recorded as `NA` instead.
#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("missing required tools: {}", list_tools(.0))]
    MissingDependencies(Vec<Tool>),

    #[error("battery '{name}' not found, available: {}", list_or_none(.available))]
    UnknownBattery { name: String, available: Vec<String> },

    #[error("log file {} is not writable", .path.display())]
    LogNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid interval '{0}', expected a whole number with an optional s/m/h/d suffix")]
    InvalidInterval(String),

    #[error("unknown {metric} backend '{value}'")]
    UnknownBackend { metric: &'static str, value: String },
}

impl SamplerError {
    /// Process exit code for this condition. An unknown battery is reported
    /// as information, not a failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            SamplerError::UnknownBattery { .. } => 0,
            _ => 1,
        }
    }
}

fn list_tools(tools: &[Tool]) -> String {
    tools
        .iter()
        .map(Tool::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}
