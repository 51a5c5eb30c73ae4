#[derive(Debug)]
pub enum ImporterError {
    IoErr(std::io::Error),
    SpawnErr(String, std::io::Error),
    SignalErr(nix::Error),
    MissingStdout,
}

impl From<std::io::Error> for ImporterError {
    fn from(error: std::io::Error) -> Self {
        Self::IoErr(error)
    }
}

impl From<nix::Error> for ImporterError {
    fn from(error: nix::Error) -> Self {
        Self::SignalErr(error)
    }
}
