//! Analytics engine: the read-side entry points over holdings and quotes.

mod analytics_service;
mod analytics_traits;


pub use analytics_service::AnalyticsService;
pub use analytics_traits::AnalyticsServiceTrait;
