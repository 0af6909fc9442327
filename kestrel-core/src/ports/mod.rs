//! Ports: the two boundaries the agent core talks across — the model
//! backend and the attached front end — kept as traits so neither is
//! baked into the core.

pub mod model_transport;
pub mod ui;

pub use model_transport::{ChatResponse, ModelTransport, StopReason};
pub use ui::{AgentStatus, ConfirmationDecision, Ui};
