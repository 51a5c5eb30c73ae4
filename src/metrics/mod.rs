mod aggregator;
mod errors;
mod server;

pub use self::aggregator::{FlowMetrics, Observe, FLOW_LABELS};
pub use self::errors::{MetricsError, MetricsResult};
pub use self::server::{bind, serve, MetricsSettings};
