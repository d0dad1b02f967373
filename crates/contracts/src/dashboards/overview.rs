use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::contact::ContactSubmission;
use crate::domain::order::OrderSummary;

/// One-call snapshot for the admin dashboard landing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminOverview {
    pub counts: EntityCounts,
    pub revenue: RevenueTotal,
    #[serde(rename = "recentActivity")]
    pub recent_activity: RecentActivity,
}

/// Bands, watches and subscribers count live rows only; orders and users
/// count everything ever stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityCounts {
    pub bands: i64,
    pub watches: i64,
    pub orders: i64,
    pub users: i64,
    pub subscribers: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueTotal {
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentActivity {
    pub orders: Vec<OrderSummary>,
    #[serde(rename = "contactSubmissions")]
    pub contact_submissions: Vec<ContactSubmission>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overview_serializes_with_camel_case_sections() {
        let overview = AdminOverview {
            counts: EntityCounts {
                bands: 12,
                watches: 4,
                orders: 3,
                users: 2,
                subscribers: 1,
            },
            revenue: RevenueTotal {
                total: "147.00".parse().unwrap(),
            },
            recent_activity: RecentActivity {
                orders: vec![],
                contact_submissions: vec![],
            },
        };
        let json = serde_json::to_value(&overview).unwrap();
        assert_eq!(json["counts"]["bands"], 12);
        assert_eq!(json["revenue"]["total"], "147.00");
        assert!(json["recentActivity"]["contactSubmissions"].is_array());
    }
}
