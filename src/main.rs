pub mod ext;
pub mod hic;
pub mod pipeline;
pub mod command;

mod err;
pub use err::{Error, FailurePolicy, Result};

fn init_logger() {
    use fern::{
        Dispatch,
        colors::{Color, ColoredLevelConfig},
    };
    let colors = ColoredLevelConfig::default()
        .info(Color::Green)
        .debug(Color::Cyan);
    Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {:>5}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                colors.color(record.level()),
                message
            ))
        })
        .level(log::LevelFilter::Trace)
        .chain(std::io::stderr())
        .apply()
        .unwrap();
}

fn main() {
    init_logger();
    let args: Vec<_> = std::env::args().collect();
    if let Err(e) = command::run(&args) {
        log::error!("{}", e.display());
        std::process::exit(1);
    }
}
