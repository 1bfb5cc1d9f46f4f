use cucumber::given;

use crate::cucumber::{
    order_flow_world::{scenario_queue_config, OrderFlowSystem},
    OrderFlowWorld,
};

#[given("a fresh install")]
async fn fresh_database(world: &mut OrderFlowWorld) {
    let system = OrderFlowSystem::new(scenario_queue_config()).await;
    world.system = Some(system);
}

#[given(expr = "a fresh install with room for {int} queued orders")]
async fn fresh_bounded_database(world: &mut OrderFlowWorld, capacity: usize) {
    let system = OrderFlowSystem::new(scenario_queue_config().with_max_depth(capacity)).await;
    world.system = Some(system);
}
