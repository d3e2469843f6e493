//! Card data. Exists only in the request-scoped stack of the dispatcher and
//! driver: nothing outside this module
//! should hold a `CardInfo` for longer than it takes to build a provider
//! request.

use masking::{ExposeInterface, Secret};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardInfo {
    pub holder_name: Secret<String>,
    pub card_number: Secret<String>,
    /// `MM`, as supplied by the client; drivers pad/convert to whatever
    /// format the provider expects.
    pub expire_month: Secret<String>,
    /// `YYYY`.
    pub expire_year: Secret<String>,
    pub cvv: Secret<String>,
}

impl CardInfo {
    pub fn masked_number(&self) -> String {
        common_utils::pan::mask_card_number(self.card_number.clone().expose().as_str())
    }
}
