mod errors;
mod lookup;
mod maxmind;
mod resolver;

pub use self::errors::LookupError;
pub use self::lookup::{AsnLookup, AsnRecord, CityLookup, CityRecord};
pub use self::maxmind::{MaxmindAsn, MaxmindCity};
pub use self::resolver::{Peer, PeerResolver};
