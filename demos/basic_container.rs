//! Basic state container usage: observe, patch, select, reset

use statecell::StateContainer;

#[derive(Clone, Debug, PartialEq)]
struct PlayerState {
    name: String,
    score: u32,
    lives: u8,
}

fn main() {
    println!("=== StateContainer Example ===\n");

    let container = StateContainer::new(PlayerState {
        name: "Player One".to_string(),
        score: 0,
        lives: 3,
    });

    // Observers get the current value immediately, then every change.
    let _all = container.observe(|state| {
        println!("state: {state:?}");
    });

    // Derived streams only emit when the projection changes.
    let _lives = container.select(
        |state| &state.lives,
        |lives| println!("  lives changed: {lives}"),
    );

    println!("\nScoring...");
    container.patch(|state| state.score += 100).unwrap();
    container.patch(|state| state.score += 250).unwrap();

    println!("\nTaking a hit...");
    container
        .patch(|state| {
            state.score += 10;
            state.lives -= 1;
        })
        .unwrap();

    println!("\nGame over, resetting...");
    container.reset().unwrap();

    println!("\nFinal state: {:#?}", container.snapshot());
    container.complete();
}
