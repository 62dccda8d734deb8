pub mod google;
pub mod helpers;
pub mod routing;

pub use google::GoogleTtsClient;
pub use routing::chain::ProviderChain;
pub use routing::registry::ProviderRegistry;
