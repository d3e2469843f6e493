//! The ephemeral state a 3-D Secure callback token resolves to.

use common_enums::{Environment, Provider};
use common_utils::types::MajorUnit;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackState {
    pub payment_id: String,
    pub tenant_id: i64,
    pub amount: MajorUnit,
    pub currency: common_enums::Currency,
    pub log_id: String,
    pub provider: Provider,
    pub environment: Environment,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: time::OffsetDateTime,
    pub original_callback: String,
    pub client_ip: Option<String>,
}
