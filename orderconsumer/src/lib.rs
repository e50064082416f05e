pub mod classify;
pub mod consumer;
pub mod dlq;
pub mod error;
pub mod handler;

pub use consumer::{ConsumerConfig, run};
pub use dlq::{DlqProducer, DlqPublisher};
pub use error::NonRetriableError;
pub use handler::{MessageHandler, OrderAdder};
