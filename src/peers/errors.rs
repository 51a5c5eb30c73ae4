#[derive(Debug)]
pub enum LookupError {
    DatabaseOpen(maxminddb::MaxMindDBError),
    Backend(String),
}

impl From<maxminddb::MaxMindDBError> for LookupError {
    fn from(error: maxminddb::MaxMindDBError) -> Self {
        Self::Backend(error.to_string())
    }
}
