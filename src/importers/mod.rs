pub mod errors;
mod import;
pub mod pmacct;

pub use self::import::{run, Import, LineImporter};
pub use self::pmacct::{CollectorProcess, PmacctSettings};
