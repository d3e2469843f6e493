/// The eight upstream payment providers the gateway can route to.
///
/// Re-implemented as a closed enum rather than the source's plugin registry
/// (see DESIGN.md, "Dynamic provider dispatch"): new providers are added by
/// editing this enum and the registry, not by loading code at runtime.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Iyzico,
    Stripe,
    Ozanpay,
    Paycell,
    Papara,
    Nkolay,
    Paytr,
    Payu,
}

impl Provider {
    /// All supported providers, in the order this array lists them.
    pub const ALL: [Self; 8] = [
        Self::Iyzico,
        Self::Stripe,
        Self::Ozanpay,
        Self::Paycell,
        Self::Papara,
        Self::Nkolay,
        Self::Paytr,
        Self::Payu,
    ];
}

/// Sandbox vs. production credential/endpoint selection.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Sandbox,
    Production,
}

/// Common projection of the per-provider payment-intent state machine.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Successful,
    Pending,
    Processing,
    Cancelled,
    Refunded,
    Failed,
}

/// Refund bookkeeping status, tracked independently of `PaymentStatus` so a
/// partially-refunded payment can still report `Successful` while its
/// refund ledger accumulates.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    Pending,
    Succeeded,
    Failed,
}

/// ISO-4217 currencies the gateway has seen in practice. The driver layer
/// rejects anything not in this set at validation time rather than at the
/// upstream.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[strum(serialize = "TRY")]
    TRY,
    #[strum(serialize = "USD")]
    USD,
    #[strum(serialize = "EUR")]
    EUR,
    #[strum(serialize = "GBP")]
    GBP,
}

impl Currency {
    /// Minor-unit exponent; every currency the gateway supports today uses
    /// 2 decimal places. Kept as a method rather than a constant so a
    /// future zero-decimal currency doesn't require touching every call
    /// site.
    pub const fn exponent(self) -> u32 {
        2
    }
}
