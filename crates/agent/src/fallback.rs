use redress_core::domain::{Decision, DecisionStatus, PolicyRecord};

pub const CUSTOMER_CARE_HELPLINE: &str = "1800-123-4567";

/// Deterministic keyword-to-policy matcher. The system's only
/// guaranteed-available decision path: no I/O, no external calls, total for
/// any input message.
///
/// Policies are scanned in catalog order; the first whose keyword appears
/// anywhere in the lowercased message wins. No match escalates to a human,
/// which is a valid outcome rather than an error.
pub fn rule_based_fallback(message: &str, policies: &[PolicyRecord]) -> Decision {
    let lowered = message.to_lowercase();

    for policy in policies {
        let matched = policy
            .keywords
            .iter()
            .any(|keyword| lowered.contains(keyword.to_lowercase().as_str()));
        if matched {
            return Decision {
                status: DecisionStatus::Handled,
                resolution: Some(policy.default_resolution.clone()),
                message: policy.response_template.clone(),
                escalate: false,
                policy_citations: vec![policy.policy_id.clone()],
                next_steps: policy.next_steps.clone(),
            };
        }
    }

    Decision {
        status: DecisionStatus::NeedsHuman,
        resolution: None,
        message: format!(
            "Thanks for your patience. I could not confidently match this situation to any of \
             our standard complaint policies based on your message and order details. I'll \
             connect you to a human agent who can review this in detail. If you prefer, you can \
             also call our customer care at {CUSTOMER_CARE_HELPLINE}."
        ),
        escalate: true,
        policy_citations: Vec::new(),
        next_steps: vec![
            "Connecting you to customer care for manual review of your case.".to_string(),
            format!("If you prefer, call customer care directly at {CUSTOMER_CARE_HELPLINE}."),
        ],
    }
}
