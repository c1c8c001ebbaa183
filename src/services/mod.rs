pub mod check;
pub mod delivery;
pub mod types;
pub mod zones;

pub use self::check::*;
pub use self::delivery::*;
pub use self::zones::*;
