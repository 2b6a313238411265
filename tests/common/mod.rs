#![allow(dead_code)]

use async_trait::async_trait;
use multiav::engine::ExecutionError;
use multiav::invoker::ProcessInvoker;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

pub const SCAN_INFECTED: &str = include_str!("../fixtures/kav4fs/v8/scan_infected.txt");
pub const SCAN_CLEAN: &str = include_str!("../fixtures/kav4fs/v8/scan_clean.txt");
pub const SCAN_RISKWARE: &str = include_str!("../fixtures/kav4fs/v8/scan_riskware.txt");
pub const TOP_VIRUSES_LOCKY: &str = include_str!("../fixtures/kav4fs/v8/top_viruses_locky.txt");
pub const TOP_VIRUSES_EICAR: &str = include_str!("../fixtures/kav4fs/v8/top_viruses_eicar.txt");
pub const TOP_VIRUSES_EMPTY: &str = include_str!("../fixtures/kav4fs/v8/top_viruses_empty.txt");
pub const APP_INFO: &str = include_str!("../fixtures/kav4fs/v8/app_info.txt");
pub const GET_STAT_UPDATE: &str = include_str!("../fixtures/kav4fs/v8/get_stat_update.txt");
pub const GET_STAT_UPDATE_PARTIAL: &str =
    include_str!("../fixtures/kav4fs/v8/get_stat_update_partial.txt");

/// Replays recorded kav4fs-control output.
///
/// Like the real engine it remembers the last detection across invocations,
/// so `--top-viruses` reports whatever the most recent `--scan-file` found.
pub struct FakeKav4fs {
    app_info: String,
    get_stat: String,
    samples: HashMap<String, (&'static str, &'static str)>,
    failing: HashSet<&'static str>,
    reset_delay: Duration,
    last_detection: Mutex<&'static str>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeKav4fs {
    pub fn new() -> Self {
        Self {
            app_info: APP_INFO.to_string(),
            get_stat: GET_STAT_UPDATE.to_string(),
            samples: HashMap::new(),
            failing: HashSet::new(),
            reset_delay: Duration::ZERO,
            last_detection: Mutex::new(TOP_VIRUSES_EMPTY),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_app_info(mut self, output: &str) -> Self {
        self.app_info = output.to_string();
        self
    }

    pub fn with_get_stat(mut self, output: &str) -> Self {
        self.get_stat = output.to_string();
        self
    }

    pub fn with_sample(mut self, path: &str, scan: &'static str, top_viruses: &'static str) -> Self {
        self.samples.insert(path.to_string(), (scan, top_viruses));
        self
    }

    /// Makes every invocation whose first argument is `command` exit non-zero.
    pub fn failing(mut self, command: &'static str) -> Self {
        self.failing.insert(command);
        self
    }

    pub fn with_reset_delay(mut self, delay: Duration) -> Self {
        self.reset_delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|args| args.first().cloned())
            .collect()
    }
}

#[async_trait]
impl ProcessInvoker for FakeKav4fs {
    async fn run(&self, binary: &Path, args: &[String]) -> Result<String, ExecutionError> {
        self.calls.lock().unwrap().push(args.to_vec());

        let command = args.first().map(String::as_str).unwrap_or_default();
        if self.failing.contains(command) {
            return Err(ExecutionError::non_zero_exit(
                binary,
                Some(1),
                format!("{} failed", command),
            ));
        }

        match command {
            "-S" => Ok(self.app_info.clone()),
            "--get-stat" => Ok(self.get_stat.clone()),
            "--scan-file" => {
                let path = args.get(1).cloned().unwrap_or_default();
                let (scan, top_viruses) = self
                    .samples
                    .get(&path)
                    .copied()
                    .unwrap_or((SCAN_CLEAN, TOP_VIRUSES_EMPTY));
                if scan == SCAN_INFECTED {
                    *self.last_detection.lock().unwrap() = top_viruses;
                }
                Ok(scan.to_string())
            }
            "--clean-stat" => {
                tokio::time::sleep(self.reset_delay).await;
                Ok(String::new())
            }
            "--top-viruses" => Ok(self.last_detection.lock().unwrap().to_string()),
            other => Err(ExecutionError::non_zero_exit(
                binary,
                Some(2),
                format!("unknown option {}", other),
            )),
        }
    }
}
