use async_trait::async_trait;

use super::EmailProvider;

// Dev provider: logs instead of sending.
pub struct ConsoleProvider;

#[async_trait]
impl EmailProvider for ConsoleProvider {
    async fn send(&self, to: &str, subject: &str, _html: &str) -> anyhow::Result<()> {
        tracing::info!(to = %to, subject = %subject, "email (console provider)");
        Ok(())
    }
}
