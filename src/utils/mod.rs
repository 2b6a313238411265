pub mod logging;

pub use logging::Logger;

pub fn format_duration(duration: std::time::Duration) -> String {
    format!("{:.3}s", duration.as_secs_f64())
}
