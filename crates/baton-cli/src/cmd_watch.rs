use baton_coord::render::render_changes;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::open_board;

/// Run the background reconciliation pass every `interval` seconds until
/// Ctrl-C, printing what changed between passes.
pub fn execute(repo_root: &Path, interval: u64) -> anyhow::Result<()> {
    let board = open_board(repo_root)?;
    let interval = Duration::from_secs(interval.max(1));

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))?;

    eprintln!("baton watch (every {}s). Press Ctrl-C to stop.\n", interval.as_secs());

    let mut last = None;
    while running.load(Ordering::SeqCst) {
        let view = match board.update_view() {
            Ok(view) => view,
            Err(e) => {
                eprintln!("error: {e}");
                board.rebuild_view()
            }
        };
        for line in render_changes(last.as_ref(), &view) {
            println!("{line}");
        }
        last = Some(view);

        let next = Instant::now() + interval;
        while running.load(Ordering::SeqCst) && Instant::now() < next {
            std::thread::sleep(Duration::from_millis(100));
        }
    }
    Ok(())
}
