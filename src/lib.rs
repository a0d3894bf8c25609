pub mod analytics;
pub mod errors;
pub mod logging;
pub mod site;
pub mod site_config;
pub mod slug;
