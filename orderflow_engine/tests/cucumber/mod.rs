mod order_flow_world;
mod setups;
mod steps;

pub use order_flow_world::OrderFlowWorld;
