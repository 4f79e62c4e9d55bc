use crate::domain::repository::DeliveryChannel;
use crate::domain::types::OtpPurpose;

/// Log-only delivery for development and console deployments. Provider-backed
/// channels (SMS gateway, SMTP relay) plug in behind the same trait without
/// touching the issuance path.
#[derive(Clone)]
pub struct LogDelivery {
    channel: &'static str,
}

impl LogDelivery {
    pub fn sms() -> Self {
        Self { channel: "sms" }
    }

    pub fn email() -> Self {
        Self { channel: "email" }
    }
}

impl DeliveryChannel for LogDelivery {
    async fn send_code(
        &self,
        target: &str,
        _code: &str,
        purpose: OtpPurpose,
    ) -> Result<(), anyhow::Error> {
        // The code value stays out of the log line.
        tracing::info!(
            channel = self.channel,
            target,
            purpose = %purpose,
            "dispatching one-time code"
        );
        Ok(())
    }
}
