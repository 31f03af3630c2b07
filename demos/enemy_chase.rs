//! Enemy that patrols to a post and chases a player walking past it.
//!
//! Run with `RUST_LOG=flowstate=debug cargo run --example enemy_chase` to
//! see every transition the machine performs.

use flowstate::{Flow, FlowMachineBuilder, State};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug)]
struct Vec2 {
    x: f32,
    y: f32,
}

impl Vec2 {
    fn distance(self, other: Vec2) -> f32 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }

    fn move_towards(self, target: Vec2, max_step: f32) -> Vec2 {
        let dist = self.distance(target);
        if dist <= max_step || dist == 0.0 {
            return target;
        }
        let t = max_step / dist;
        Vec2 {
            x: self.x + (target.x - self.x) * t,
            y: self.y + (target.y - self.y) * t,
        }
    }
}

struct World {
    enemy: Vec2,
    player: Option<Vec2>,
    post: Vec2,
    move_speed: f32,
    view_distance: f32,
    forget_distance: f32,
}

#[derive(Default)]
struct Patrol;

impl State<World> for Patrol {
    fn on_enter(&mut self, _flow: &mut Flow<'_, World>) {
        info!("back on patrol");
    }

    fn on_update(&mut self, flow: &mut Flow<'_, World>) {
        let step = flow.delta().as_secs_f32() * flow.context().move_speed;
        let world = flow.context_mut();
        let Some(player) = world.player else {
            return;
        };

        let to_player = world.enemy.distance(player);
        if world.enemy.distance(world.post) > 0.1 {
            world.enemy = world.enemy.move_towards(world.post, step);
        }
        if to_player < world.view_distance {
            flow.transition_to::<Pursue>();
        }
    }
}

#[derive(Default)]
struct Pursue {
    ticks: u32,
}

impl State<World> for Pursue {
    fn on_enter(&mut self, flow: &mut Flow<'_, World>) {
        self.ticks = 0;
        info!(at = flow.elapsed().as_secs_f32(), "player spotted");
    }

    fn on_update(&mut self, flow: &mut Flow<'_, World>) {
        self.ticks += 1;
        let step = flow.delta().as_secs_f32() * flow.context().move_speed;
        let world = flow.context_mut();
        let Some(player) = world.player else {
            return;
        };

        if world.enemy.distance(player) > world.forget_distance {
            info!(ticks = self.ticks, "lost sight of the player");
            flow.transition_to::<Patrol>();
            return;
        }
        world.enemy = world.enemy.move_towards(player, step);
    }

    fn on_exit(&mut self, flow: &mut Flow<'_, World>) {
        // Catch our breath before looking around again.
        flow.wait(Duration::from_secs(1), |flow| {
            info!(at = flow.elapsed().as_secs_f32(), "recovered");
        });
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let world = World {
        enemy: Vec2 { x: 0.0, y: 0.0 },
        player: Some(Vec2 { x: -12.0, y: 2.0 }),
        post: Vec2 { x: 3.0, y: 0.0 },
        move_speed: 3.0,
        view_distance: 5.0,
        forget_distance: 7.0,
    };

    let mut machine = match FlowMachineBuilder::new(world)
        .state::<Pursue>()
        .start_state::<Patrol>()
        .build()
    {
        Ok(machine) => machine,
        Err(err) => {
            eprintln!("failed to build machine: {err}");
            return;
        }
    };

    let dt = Duration::from_millis(250);
    let result = machine.start().and_then(|()| {
        for _ in 0..80 {
            // The player runs right, a little faster than the enemy.
            if let Some(player) = machine.context_mut().player.as_mut() {
                player.x += 1.0;
            }
            machine.on_tick(dt)?;
        }
        Ok(())
    });

    if let Err(err) = result {
        eprintln!("machine stopped: {err}");
        return;
    }

    let world = machine.context();
    info!(
        enemy = ?world.enemy,
        player = ?world.player,
        transitions = machine.history().total_recorded(),
        path = ?machine.history().get_path(),
        "simulation finished"
    );
}
