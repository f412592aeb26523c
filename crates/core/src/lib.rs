//! Courier Core
//!
//! Task dispatch and session lifecycle for LLM-backed agents: the session
//! store, the runtime boundary and its LLM implementation, the agents and
//! their tools, and the dispatcher that turns a runtime's event stream into a
//! normalized response.

pub mod agent_runtime;
pub mod agents;
pub mod dispatcher;
pub mod event;
pub mod extract;
pub mod llm_client;
pub mod response;
pub mod runtime;
pub mod session;
pub mod tools;

pub use dispatcher::{TaskContext, TaskDispatcher};
pub use response::{ResponseData, TaskResponse, TaskStatus};
