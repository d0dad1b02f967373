pub mod overview;

pub use overview::{AdminOverview, EntityCounts, RecentActivity, RevenueTotal};
