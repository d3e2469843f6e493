pub mod iyzico;
pub mod nkolay;
pub mod ozanpay;
pub mod papara;
pub mod paycell;
pub mod paytr;
pub mod payu;
pub mod stripe;

pub use iyzico::Iyzico;
pub use nkolay::Nkolay;
pub use ozanpay::Ozanpay;
pub use papara::Papara;
pub use paycell::Paycell;
pub use paytr::Paytr;
pub use payu::Payu;
pub use stripe::Stripe;
