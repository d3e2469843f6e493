//! Zero-sized flow marker types. `interfaces::ConnectorIntegration<Flow,
//! Req, Resp>` is implemented once per marker per driver, one marker for
//! each of the six payment operations a driver exposes: create, 3-D create,
//! 3-D complete, status, cancel, refund.

#[derive(Debug, Clone)]
pub struct CreatePayment;

#[derive(Debug, Clone)]
pub struct Create3DPayment;

#[derive(Debug, Clone)]
pub struct Complete3DPayment;

#[derive(Debug, Clone)]
pub struct GetPaymentStatus;

#[derive(Debug, Clone)]
pub struct CancelPayment;

#[derive(Debug, Clone)]
pub struct RefundPayment;

#[derive(Debug, Clone, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum FlowName {
    CreatePayment,
    Create3DPayment,
    Complete3DPayment,
    GetPaymentStatus,
    CancelPayment,
    RefundPayment,
    ValidateWebhook,
}
