//! Round-robin / weighted round-robin HTTP load balancer.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod routing;
pub mod spawner;

pub use config::BalancerConfig;
pub use http::HttpServer;
pub use lifecycle::{Balancer, Shutdown};
pub use load_balancer::{Backend, Pool};
pub use routing::RequestRouter;
