use serde::{Deserialize, Serialize};

// ============================================================================
// Contact form
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub order_number: Option<String>,
    pub read_status: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "orderNumber", default)]
    pub order_number: Option<String>,
}

/// Returned to the submitter, without the message body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactReceipt {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
}

// ============================================================================
// Newsletter
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsletterSubscriber {
    pub id: String,
    pub email: String,
    pub active: bool,
    pub subscribed_at: String,
    pub unsubscribed_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeOutcome {
    #[serde(rename = "alreadySubscribed")]
    pub already_subscribed: bool,
}

/// The email being unsubscribed travels in the path; only the reason comes
/// from the body (which unsubscribe links usually omit).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UnsubscribeRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_request_order_number_is_camel() {
        let req: ContactRequest = serde_json::from_str(
            r#"{"name":"Ana","email":"ana@example.com","message":"hi","orderNumber":"PU-1"}"#,
        )
        .unwrap();
        assert_eq!(req.order_number.as_deref(), Some("PU-1"));
    }
}
