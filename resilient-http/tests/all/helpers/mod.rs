mod simple_server;

pub use scripted::{Outcome, ScriptedExecutor};
pub use simple_server::SimpleServer;
