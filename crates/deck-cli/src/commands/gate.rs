use std::io::Write;

use async_trait::async_trait;
use deck_core::{Approval, ApprovalGate, BatchPlan};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Review prompt on the controlling terminal. The prompt goes to stderr,
/// the reply comes from stdin.
pub struct StdinGate;

fn write_prompt(out: &mut impl Write, plan: &BatchPlan) -> std::io::Result<()> {
    writeln!(out, "\nReview batch {}: {}", plan.batch_id, plan.topic)?;
    for unit in plan.ordered_units() {
        writeln!(out, "  {}. {}", unit.ordinal, unit.text)?;
        writeln!(out, "     image: {}", unit.source)?;
    }
    write!(out, "\nApprove? [yes | reject: <feedback>] ")?;
    out.flush()
}

#[async_trait]
impl ApprovalGate for StdinGate {
    async fn request_approval(&self, plan: &BatchPlan) -> Approval {
        let _ = write_prompt(&mut std::io::stderr().lock(), plan);

        let mut line = String::new();
        let mut reader = BufReader::new(tokio::io::stdin());
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => Approval::Rejected {
                reason: "no review reply".to_string(),
            },
            Ok(_) => Approval::parse(&line),
        }
    }
}
