use serde::{Deserialize, Serialize};

/// Outcome of the human review gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Approval {
    Approved,
    Rejected { reason: String },
}

impl Approval {
    /// Parse a free-text reviewer reply once, at the boundary.
    ///
    /// `y`, `yes`, `ok`, `approve` and `approved` approve. Anything else is a
    /// rejection whose reason is the reply with a leading `no`/`reject`
    /// keyword stripped.
    pub fn parse(reply: &str) -> Self {
        let trimmed = reply.trim();
        let lowered = trimmed.to_ascii_lowercase();

        if matches!(lowered.as_str(), "y" | "yes" | "ok" | "approve" | "approved") {
            return Approval::Approved;
        }

        let mut reason = trimmed;
        for keyword in ["rejected", "reject", "no", "n"] {
            if lowered.starts_with(keyword) {
                let rest = &trimmed[keyword.len()..];
                if rest.is_empty() || rest.starts_with([':', ' ', '-', ',']) {
                    reason = rest.trim_start_matches([':', ' ', '-', ',']).trim();
                    break;
                }
            }
        }

        Approval::Rejected {
            reason: if reason.is_empty() {
                "rejected without feedback".to_string()
            } else {
                reason.to_string()
            },
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, Approval::Approved)
    }
}
