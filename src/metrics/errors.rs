#[derive(Debug)]
pub enum MetricsError {
    PrometheusErr(prometheus::Error),
    IoErr(std::io::Error),
    TimeoutErr(tokio::time::error::Elapsed),
}

pub type MetricsResult<T> = Result<T, MetricsError>;

impl From<prometheus::Error> for MetricsError {
    fn from(error: prometheus::Error) -> Self {
        Self::PrometheusErr(error)
    }
}

impl From<std::io::Error> for MetricsError {
    fn from(error: std::io::Error) -> Self {
        Self::IoErr(error)
    }
}

impl From<tokio::time::error::Elapsed> for MetricsError {
    fn from(error: tokio::time::error::Elapsed) -> Self {
        Self::TimeoutErr(error)
    }
}
