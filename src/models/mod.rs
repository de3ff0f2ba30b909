pub mod appointment;
pub mod billing;
pub mod clinical;
pub mod enums;
pub mod filters;
pub mod patient;
pub mod pharmacy;
pub mod staff;
pub mod waiting_list;

pub use appointment::*;
pub use billing::*;
pub use clinical::*;
pub use patient::*;
pub use pharmacy::*;
pub use staff::*;
pub use waiting_list::*;
