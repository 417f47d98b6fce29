//! Identifiers of the records the server manages

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Declares a numeric identifier, so that a slot id cannot be passed where a request id is expected
macro_rules! synthetise_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(id: u64) -> Self { Self(id) }
            pub fn get(&self) -> u64 { self.0 }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self { Self(id) }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
                write!(f, "{}", self.0)
            }
        }
    }
}

synthetise_id!(
    /// A staff-defined appointment slot
    SlotId
);
synthetise_id!(
    /// A staff or supervisor account that offers slots
    ProviderId
);
synthetise_id!(
    /// A client's request to book a slot
    RequestId
);
synthetise_id!(
    /// A client account
    ClientId
);
synthetise_id!(NotificationId);
