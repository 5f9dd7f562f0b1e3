//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `pinboard_core` linkage.
//! - Run a headless board session (`demo local|shared`) against in-memory
//!   collaborators and print the drawn cards.

use pinboard_core::{
    AnonymousIdentity, Board, BoardConfig, BoardResult, MemoryDocumentStore, MemoryKvStore,
    NoteColor, NoteDraft, RecordingSurface, StoreVariant, TiltChoice, ALL_CONTROLS,
};
use std::process::ExitCode;
use std::sync::Arc;

const DEMO_SEED: u64 = 17;

fn main() -> ExitCode {
    println!("pinboard_core ping={}", pinboard_core::ping());
    println!("pinboard_core version={}", pinboard_core::core_version());

    let mut args = std::env::args().skip(1);
    let Some(command) = args.next() else {
        return ExitCode::SUCCESS;
    };
    let variant = match (command.as_str(), args.next().as_deref()) {
        ("demo", None | Some("local")) => StoreVariant::Local,
        ("demo", Some("shared")) => StoreVariant::Shared,
        _ => {
            eprintln!("usage: pinboard_cli [demo [local|shared]]");
            return ExitCode::from(2);
        }
    };

    match run_demo(variant) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("demo failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_demo(variant: StoreVariant) -> BoardResult<()> {
    let config = BoardConfig {
        variant,
        seed: Some(DEMO_SEED),
        ..BoardConfig::default()
    };
    let kv = Arc::new(MemoryKvStore::new());
    let mut board = match variant {
        StoreVariant::Local => {
            Board::open_local(kv, RecordingSurface::new(), &config, ALL_CONTROLS)?
        }
        StoreVariant::Shared => Board::open_shared(
            kv,
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(AnonymousIdentity::new()),
            RecordingSurface::new(),
            &config,
            ALL_CONTROLS,
        )?,
    };

    board.create(&NoteDraft::new("Ann", "Standup moved to 10:30").with_color(NoteColor::Peach))?;
    board.create(
        &NoteDraft::new("", "Bring snacks on Friday")
            .with_color(NoteColor::Mint)
            .with_tilt(TiltChoice::Fixed(-4.0)),
    )?;
    board.create(&NoteDraft::new("Bob", "Release notes draft is up").with_color(NoteColor::Sky))?;
    print_cards("pinned", &board);

    board.shuffle()?;
    print_cards("shuffled", &board);

    board.set_filter("ann")?;
    print_cards("filter=ann", &board);
    Ok(())
}

fn print_cards(label: &str, board: &Board<RecordingSurface>) {
    println!(
        "[{label}] variant={} cards={}",
        board.variant().as_str(),
        board.surface().cards().len()
    );
    for card in board.surface().cards() {
        println!(
            "  {:<10} {:<9} {:>7.1},{:>6.1} {:>5.1}deg  {}",
            card.author_label, card.css_class, card.left, card.top, card.rotation_deg, card.text
        );
    }
}
