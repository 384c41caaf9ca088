pub mod donation;
pub mod donor;
pub mod donor_request;

pub use donation::*;
pub use donor::*;
pub use donor_request::*;
