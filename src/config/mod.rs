//! Configuration module

mod site;

pub use site::AboutConfig;
pub use site::BlogConfig;
pub use site::HighlightConfig;
pub use site::HomeConfig;
pub use site::NavConfig;
pub use site::ServerConfig;
pub use site::SiteConfig;
pub use site::ThemeConfig;
