mod dispatch;
mod server;

pub use dispatch::DispatchConfig;
pub use server::ServerConfig;
