use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

static START_TIME: OnceLock<Instant> = OnceLock::new();

/// Initialize stderr logging for the mapping pipeline.
///
/// `verbose` raises the level filter from Warn to Info. Each line is
/// stamped with the seconds elapsed since initialization, which is what the
/// phase timings in the pipeline logs are read against:
/// `[  12.34s] INFO: voting for 100000 reads in 3.20s`
pub fn init_logger(verbose: bool) {
    START_TIME.set(Instant::now()).ok();

    let level = if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format(|buf, record| {
            let secs = START_TIME
                .get()
                .map(|t| t.elapsed().as_secs_f64())
                .unwrap_or(0.0);
            writeln!(buf, "[{:8.2}s] {}: {}", secs, record.level(), record.args())
        })
        .target(env_logger::Target::Stderr)
        .init();
}
