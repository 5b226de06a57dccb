//! Quote provider interface and the bundled in-memory provider.

mod static_provider;
mod traits;

pub use static_provider::StaticQuoteProvider;
pub use traits::QuoteProvider;
