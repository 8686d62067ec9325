// Core types and protocol plumbing
pub mod constants;
pub mod error;
pub mod payload;
pub mod signature;

// Gateway configuration and order-facing types
pub mod config;
pub mod order;

// Outbound request assembly, response mapping, orchestration
pub mod orchestrator;
pub mod request;
pub mod response;

// Re-exports
pub use constants::{currency_code, Brand};
pub use error::GatewayError;
pub use payload::SignablePayload;

pub use config::{Credentials, GatewayConfig, Mode};
pub use order::{Address, CardDetails, OrderSnapshot};
pub use orchestrator::{process_payment, HttpProcessor, OrderHooks, PaymentResult, Processor};
pub use request::TransactionRequest;
pub use response::{PaymentOutcome, TransactionResponse};
