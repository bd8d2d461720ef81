use super::*;

/// The block-producing daemon the pool mines against. The registry only
/// needs the two template RPCs; transport, auth and retries live with the
/// implementor.
#[async_trait]
pub trait UpstreamRpc: Send + Sync + 'static {
    async fn get_block_template(&self) -> Result<TemplateData>;

    /// Submits a solved block. `check_hex` and `solution_hex` are whatever
    /// the chain's hasher produced for the winning header.
    async fn submit_block(
        &self,
        block_hex: &str,
        check_hex: &str,
        solution_hex: &str,
    ) -> Result<SubmitOutcome>;
}

/// Upstream verdict on a submitted block, passed through to the share
/// outcome verbatim. Transport failures are folded into `Failed` by the
/// registry so a submit error never reaches the worker as a rejection.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Accepted,
    Rejected { reason: Option<String> },
    Failed { error: String },
}

impl fmt::Display for SubmitOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SubmitOutcome::Accepted => write!(f, "accepted"),
            SubmitOutcome::Rejected { reason } => {
                write!(f, "rejected: {}", reason.as_deref().unwrap_or("unknown"))
            }
            SubmitOutcome::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}
