//! CI workflow reporting
//!
//! Log groups, run outputs and failure markers. Under GitHub Actions these
//! are emitted as workflow commands on stdout.

use crate::error::Result;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

type Sink = Arc<Mutex<dyn Write + Send>>;

/// Reporting sink for a single run
#[derive(Clone)]
pub struct Workflow {
    /// Emit GitHub Actions workflow commands
    github_actions: bool,
    /// File receiving `name=value` outputs
    output_file: Option<PathBuf>,
    /// Where workflow commands are written, stdout unless replaced
    sink: Sink,
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new(false, None)
    }
}

impl fmt::Debug for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workflow")
            .field("github_actions", &self.github_actions)
            .field("output_file", &self.output_file)
            .finish()
    }
}

impl Workflow {
    pub fn new(github_actions: bool, output_file: Option<PathBuf>) -> Self {
        Self {
            github_actions,
            output_file,
            sink: Arc::new(Mutex::new(std::io::stdout())),
        }
    }

    /// Write workflow commands to `writer` instead of stdout
    pub fn with_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.sink = Arc::new(Mutex::new(writer));
        self
    }

    /// Detect GitHub Actions from `GITHUB_ACTIONS` and `GITHUB_OUTPUT`
    pub fn from_env() -> Self {
        let github_actions = std::env::var("GITHUB_ACTIONS")
            .map(|v| v == "true")
            .unwrap_or(false);
        let output_file = std::env::var_os("GITHUB_OUTPUT")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Self::new(github_actions, output_file)
    }

    fn emit(&self, line: &str) {
        if let Ok(mut sink) = self.sink.lock() {
            if let Err(e) = writeln!(sink, "{}", line) {
                tracing::warn!("Failed to write workflow command: {}", e);
            }
        }
    }

    /// Open a log group, closed when the returned guard is dropped
    pub fn group(&self, title: impl Into<String>) -> Group {
        let title = title.into();
        if self.github_actions {
            self.emit(&format!("::group::{}", title));
        }
        tracing::info!("{}", title);

        Group {
            workflow: self.github_actions.then(|| self.clone()),
        }
    }

    /// Publish a run output
    pub fn set_output(&self, name: &str, value: &str) -> Result<()> {
        if let Some(ref path) = self.output_file {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(file, "{}={}", name, value)?;
        }

        self.emit(&format!("{}={}", name, value));
        Ok(())
    }

    /// Mark the run as failed
    pub fn set_failed(&self, message: &str) {
        if self.github_actions {
            self.emit(&format!("::error::{}", escape_data(message)));
        }
        tracing::error!("{}", message);
    }
}

/// Open log group
pub struct Group {
    workflow: Option<Workflow>,
}

impl Drop for Group {
    fn drop(&mut self) {
        if let Some(ref workflow) = self.workflow {
            workflow.emit("::endgroup::");
        }
    }
}

/// Escape a workflow command message
fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
