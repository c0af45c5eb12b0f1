use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationCategory {
    Automation,
    Communication,
    Email,
    Productivity,
    Marketing,
    Payments,
    Crm,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntegrationMeta {
    pub id: &'static str,
    pub name: &'static str,
    pub category: IntegrationCategory,
    pub icon: &'static str,
    pub description: &'static str,
    pub features: &'static [&'static str],
}

const CATALOG: &[IntegrationMeta] = &[
    IntegrationMeta {
        id: "webhook",
        name: "Webhooks",
        category: IntegrationCategory::Automation,
        icon: "webhook",
        description: "Send every submission to your own HTTP endpoint",
        features: &["Real-time delivery", "Custom headers", "JSON payload"],
    },
    IntegrationMeta {
        id: "slack",
        name: "Slack",
        category: IntegrationCategory::Communication,
        icon: "slack",
        description: "Post a message to a Slack channel for new submissions",
        features: &["Channel notifications", "Submission summary"],
    },
    IntegrationMeta {
        id: "zapier",
        name: "Zapier",
        category: IntegrationCategory::Automation,
        icon: "zap",
        description: "Trigger Zaps and connect to thousands of apps",
        features: &["Catch hook trigger", "Multi-step zaps"],
    },
    IntegrationMeta {
        id: "email",
        name: "Email (SMTP)",
        category: IntegrationCategory::Email,
        icon: "mail",
        description: "Email a copy of each submission through your SMTP server",
        features: &["Custom sender", "Respondent copy"],
    },
    IntegrationMeta {
        id: "google-sheets",
        name: "Google Sheets",
        category: IntegrationCategory::Productivity,
        icon: "sheet",
        description: "Append submissions as rows in a spreadsheet",
        features: &["Automatic columns", "Row per submission"],
    },
    IntegrationMeta {
        id: "mailchimp",
        name: "Mailchimp",
        category: IntegrationCategory::Marketing,
        icon: "megaphone",
        description: "Add respondents to a Mailchimp audience",
        features: &["Audience sync", "Tagging"],
    },
    IntegrationMeta {
        id: "stripe",
        name: "Stripe",
        category: IntegrationCategory::Payments,
        icon: "credit-card",
        description: "Collect payments from payment fields",
        features: &["Card payments", "Receipts"],
    },
    IntegrationMeta {
        id: "hubspot",
        name: "HubSpot",
        category: IntegrationCategory::Crm,
        icon: "users",
        description: "Create or update HubSpot contacts from submissions",
        features: &["Contact sync", "Field mapping"],
    },
];

pub fn catalog() -> &'static [IntegrationMeta] {
    CATALOG
}

pub fn find(id: &str) -> Option<&'static IntegrationMeta> {
    CATALOG.iter().find(|m| m.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ids_are_unique() {
        let ids: HashSet<&str> = catalog().iter().map(|m| m.id).collect();
        assert_eq!(ids.len(), catalog().len());
    }

    #[test]
    fn test_find_known_and_unknown() {
        assert_eq!(find("slack").map(|m| m.name), Some("Slack"));
        assert!(find("carrier-pigeon").is_none());
    }

    #[test]
    fn test_every_entry_lists_features() {
        assert!(catalog().iter().all(|m| !m.features.is_empty()));
    }
}
