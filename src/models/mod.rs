pub mod decision;
pub mod location;
pub mod postcode;
pub mod quote;
pub mod settings;
pub mod zone;

pub use self::decision::*;
pub use self::location::*;
pub use self::postcode::*;
pub use self::quote::*;
pub use self::settings::*;
pub use self::zone::*;
