pub mod c40;
pub mod development_aid;
pub mod estm;

pub use c40::{C40_SOURCE, C40Client, C40CrawlConfig};
pub use development_aid::{DEVELOPMENT_AID_SOURCE, DevelopmentAidClient, DevelopmentAidCrawlConfig};
pub use estm::{ESTM_SOURCE, EstmClient, EstmCrawlConfig};
