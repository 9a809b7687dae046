//! Demonstrates single-target and multicast delegates over every kind of target.
//!
//! Run with `RUST_LOG=delegates=trace` to see the registry log registrations, removals and
//! skipped targets.

use std::cell::Cell;
use std::rc::Rc;

use delegates::{Delegate, ExpiredPolicy, MulticastDelegate};
use tracing_subscriber::EnvFilter;

fn subtract(a: i32, b: i32) -> i32 {
    a - b
}

trait Combine {
    fn combine(&self, a: i32, b: i32) -> i32;
}

struct Adder {
    bias: i32,
}

impl Combine for Adder {
    fn combine(&self, a: i32, b: i32) -> i32 {
        a + b + self.bias
    }
}

struct Multiplier;

impl Combine for Multiplier {
    fn combine(&self, a: i32, b: i32) -> i32 {
        a * b
    }
}

struct Scoreboard {
    total: Cell<i32>,
}

impl Scoreboard {
    fn on_points(&self, points: i32) {
        self.total.set(self.total.get() + points);
        println!("  scoreboard total is now {}", self.total.get());
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    single_target();
    println!();
    multicast();
    println!();
    pruning();
}

fn single_target() {
    println!("=== Delegate ===");

    let multiplier = Multiplier;
    let adder = Rc::new(Adder { bias: 6 });

    let mut delegate = Delegate::<(i32, i32), i32>::new();
    println!("unbound: {}", delegate.invoke((5, 6)));

    delegate.bind_function(subtract);
    println!("function: {}", delegate.invoke((5, 6)));

    delegate.bind_shared_object(&adder, <Adder as Combine>::combine);
    println!("safe object: {}", delegate.invoke((5, 6)));

    delegate.bind_object(&multiplier, <Multiplier as Combine>::combine);
    println!("object: {}", delegate.invoke((5, 6)));

    delegate.bind_closure(|(a, b)| a.max(b));
    println!("closure: {}", delegate.invoke((5, 6)));

    delegate.bind_shared_object(&adder, <Adder as Combine>::combine);
    drop(adder);
    println!("after the object is destroyed: {:?}", delegate.try_invoke((5, 6)));
}

fn multicast() {
    println!("=== MulticastDelegate ===");

    let multiplier = Multiplier;
    let adder = Rc::new(Adder { bias: 6 });

    let delegate = MulticastDelegate::<(i32, i32), i32>::new();
    delegate.add_function(subtract);
    delegate.add_shared_object(&adder, <Adder as Combine>::combine);
    let multiplier_handle =
        delegate.add_object(&multiplier, <Multiplier as Combine>::combine);

    println!("results: {:?}", delegate.broadcast_collect((5, 6)));

    drop(adder);
    println!("adder destroyed: {:?}", delegate.broadcast_collect((5, 6)));

    delegate.remove(multiplier_handle);
    println!("multiplier removed: {:?}", delegate.broadcast_collect((5, 6)));

    delegate.remove_function(subtract);
    println!(
        "function removed: {:?} ({} registrations remain)",
        delegate.broadcast_collect((5, 6)),
        delegate.len()
    );

    delegate.clear();
    println!("cleared: {:?}", delegate.broadcast_collect((5, 6)));
}

fn pruning() {
    println!("=== Expired policy ===");

    let on_points = MulticastDelegate::<(i32,)>::builder()
        .expired_policy(ExpiredPolicy::Prune)
        .build();

    let home = Rc::new(Scoreboard {
        total: Cell::new(0),
    });
    let away = Rc::new(Scoreboard {
        total: Cell::new(0),
    });

    on_points.add_shared_object(&home, Scoreboard::on_points);
    on_points.add_shared_object(&away, Scoreboard::on_points);

    println!("scoring 3 points:");
    on_points.broadcast((3,));

    drop(away);

    println!("scoring 2 points:");
    let invoked = on_points.broadcast((2,));
    println!(
        "invoked {invoked} targets, {} registrations remain",
        on_points.len()
    );
}
