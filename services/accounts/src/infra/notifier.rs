use crate::domain::repository::Notifier;

/// Stand-in for an SMS gateway: writes the code to the log.
#[derive(Clone, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn deliver(&self, phone_number: &str, code: &str) -> anyhow::Result<()> {
        tracing::info!(phone_number, code, "otp delivery stub");
        Ok(())
    }
}
