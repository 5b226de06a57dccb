//! Market data models.

mod profile;
mod quote;

pub use profile::CompanyProfile;
pub use quote::Quote;
