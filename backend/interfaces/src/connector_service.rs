//! The aggregate trait a driver instance is actually stored and dispatched
//! through: C2's registry produces a `Box<dyn ConnectorServiceTrait>`
//! spanning the six payment flows plus webhook validation.

use domain_types::connector_flow::{
    CancelPayment, Complete3DPayment, Create3DPayment, CreatePayment, GetPaymentStatus,
    RefundPayment,
};
use domain_types::types::{
    CancelRequest, GetPaymentStatusRequest, PaymentRequest, PaymentResponse, RefundRequest,
    RefundResponse,
};

use crate::api::ConnectorCommon;
use crate::connector_integration::ConnectorIntegration;
use crate::webhook::IncomingWebhook;

/// The request shape `Complete3DPayment` executes against: the correlator's
/// resolved `CallbackState` plus the provider's raw callback POST body
/// (: `Complete3DPayment(state, data)`).
#[derive(Debug, Clone)]
pub struct Complete3DPaymentRequest {
    pub state: domain_types::callback_state::CallbackState,
    pub callback_data: std::collections::HashMap<String, String>,
}

pub trait ConnectorServiceTrait:
    ConnectorCommon
    + ConnectorIntegration<CreatePayment, PaymentRequest, PaymentResponse>
    + ConnectorIntegration<Create3DPayment, PaymentRequest, PaymentResponse>
    + ConnectorIntegration<Complete3DPayment, Complete3DPaymentRequest, PaymentResponse>
    + ConnectorIntegration<GetPaymentStatus, GetPaymentStatusRequest, PaymentResponse>
    + ConnectorIntegration<CancelPayment, CancelRequest, PaymentResponse>
    + ConnectorIntegration<RefundPayment, RefundRequest, RefundResponse>
    + IncomingWebhook
{
}
