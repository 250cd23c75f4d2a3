pub mod interface;
pub mod manager;

pub use interface::AgentGateway;
pub use manager::{LettaAgent, LettaManager};
