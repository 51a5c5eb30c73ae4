use core::fmt;
use std::process::{ExitStatus, Stdio};

use log::{info, warn};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::io::BufReader;
use tokio::process::{Child, ChildStdout, Command};

use super::errors::ImporterError;
use super::import::LineImporter;

#[derive(Debug, Clone, PartialEq)]
pub struct PmacctSettings {
    pub command: String,
    pub args: Vec<String>,
}

/// Handle to the external flow collector whose stdout feeds the pipeline.
pub struct CollectorProcess {
    child: Child,
    settings: PmacctSettings,
}

impl fmt::Debug for CollectorProcess {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?} (pid: {:?})", self.settings, self.child.id())
    }
}

impl CollectorProcess {
    pub fn spawn(
        settings: PmacctSettings,
    ) -> Result<(Self, LineImporter<BufReader<ChildStdout>>), ImporterError> {
        let mut child = Command::new(&settings.command)
            .args(&settings.args)
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| ImporterError::SpawnErr(settings.command.clone(), e))?;

        let stdout = child.stdout.take().ok_or(ImporterError::MissingStdout)?;
        info!(
            "started collector: [{} {}] with pid {:?}",
            settings.command,
            settings.args.join(" "),
            child.id()
        );

        let importer = LineImporter::new(BufReader::new(stdout), &settings.command);
        Ok((CollectorProcess { child, settings }, importer))
    }

    /// Forwards SIGINT to the collector and waits for it to exit.
    pub async fn shutdown(mut self) -> Result<ExitStatus, ImporterError> {
        match self.child.id() {
            Some(pid) => {
                info!("sending SIGINT to {} (pid {})", self.settings.command, pid);
                kill(Pid::from_raw(pid as i32), Signal::SIGINT)?;
            }
            None => warn!("{} has already exited", self.settings.command),
        }

        let status = self.child.wait().await?;
        info!("{} exited with {}", self.settings.command, status);
        Ok(status)
    }
}
