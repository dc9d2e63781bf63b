//! Repeated timing of an external benchmark program.
//!
//! The program is invoked as `program <n> <seed> [verbosity_flag]` and prints one
//! line per timed section, each containing a fixed marker followed by `:` and a
//! duration. Marker occurrence order defines a slot. A trial whose slot count
//! differs from the count seen in a single counting run is discarded, and each
//! slot is reduced to the median of the trials that survived.

use super::benchmark_errors::{BenchmarkError, BenchmarkResult};
use super::benchmark_types::HarnessConfig;
use super::performance_metrics::median;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const READER_GRACE: Duration = Duration::from_millis(500);

/// Arguments for one run of a benchmark program.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub n: usize,
    pub seed: u64,
    /// Ask the program for per-element results.
    pub verbose: bool,
    /// `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

/// A program that can be run once per invocation, returning its standard output.
pub trait BenchmarkProgram {
    fn name(&self) -> &str;
    fn run(&self, invocation: &Invocation) -> BenchmarkResult<String>;
}

/// An executable on disk, optionally launched through a wrapper such as an
/// emulator.
#[derive(Debug, Clone)]
pub struct ExternalProgram {
    path: PathBuf,
    name: String,
    wrapper: Option<String>,
    verbosity_flag: String,
}

impl ExternalProgram {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            name,
            wrapper: None,
            verbosity_flag: HarnessConfig::default().verbosity_flag,
        }
    }

    /// Applies the wrapper and verbosity flag from `config`.
    pub fn from_config<P: AsRef<Path>>(path: P, config: &HarnessConfig) -> Self {
        let mut program = Self::new(path);
        program.wrapper = config.wrapper.clone();
        program.verbosity_flag = config.verbosity_flag.clone();
        program
    }

    fn command(&self, invocation: &Invocation) -> Command {
        let mut command = match &self.wrapper {
            Some(wrapper) => {
                let mut command = Command::new(wrapper);
                command.arg(&self.path);
                command
            }
            None => Command::new(&self.path),
        };
        command
            .arg(invocation.n.to_string())
            .arg(invocation.seed.to_string());
        if invocation.verbose {
            command.arg(&self.verbosity_flag);
        }
        command
    }

    fn failure(&self, message: impl Into<String>) -> BenchmarkError {
        BenchmarkError::ProcessFailed {
            program: self.name.clone(),
            message: message.into(),
        }
    }

    fn wait_with_timeout(&self, child: &mut Child, timeout: Duration) -> BenchmarkResult<ExitStatus> {
        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) if start.elapsed() >= timeout => {
                    terminate(child);
                    return Err(BenchmarkError::Timeout {
                        program: self.name.clone(),
                        seconds: timeout.as_secs_f64(),
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    terminate(child);
                    return Err(e.into());
                }
            }
        }
    }
}

/// Kills and reaps `child`. Errors are ignored: the process may already be gone.
fn terminate(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Waits briefly for the stdout reader of a terminated program. A descendant that
/// inherited the pipe keeps it open, in which case the reader is detached and
/// ends when that descendant exits.
fn release_reader<T>(reader: JoinHandle<T>) {
    let start = Instant::now();
    while !reader.is_finished() {
        if start.elapsed() >= READER_GRACE {
            debug!("stdout still held open after kill, detaching reader");
            return;
        }
        thread::sleep(POLL_INTERVAL);
    }
    let _ = reader.join();
}

impl BenchmarkProgram for ExternalProgram {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, invocation: &Invocation) -> BenchmarkResult<String> {
        let mut child = self
            .command(invocation)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| self.failure(e.to_string()))?;

        // Drain stdout concurrently so a chatty program cannot block on a full pipe.
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| self.failure("stdout was not captured"))?;
        let reader = thread::spawn(move || {
            let mut output = String::new();
            stdout.read_to_string(&mut output).map(|_| output)
        });

        let waited = match invocation.timeout {
            Some(timeout) => self.wait_with_timeout(&mut child, timeout),
            None => child.wait().map_err(|e| {
                terminate(&mut child);
                BenchmarkError::from(e)
            }),
        };
        let status = match waited {
            Ok(status) => status,
            Err(e) => {
                release_reader(reader);
                return Err(e);
            }
        };
        let output = reader
            .join()
            .map_err(|_| self.failure("stdout reader panicked"))??;

        if !status.success() {
            warn!(
                "'{}' exited with {} for n={}",
                self.name, status, invocation.n
            );
        }
        Ok(output)
    }
}

/// Durations reported on lines containing `marker`, in output order.
pub fn parse_timings(output: &str, marker: &str) -> BenchmarkResult<Vec<f64>> {
    output
        .lines()
        .filter_map(|line| line.find(marker).map(|at| (line, &line[at + marker.len()..])))
        .map(|(line, rest)| {
            let value = rest.trim_start().trim_start_matches(':').trim();
            value
                .parse::<f64>()
                .map_err(|_| BenchmarkError::MalformedTiming {
                    line: line.to_string(),
                })
        })
        .collect()
}

fn count_markers(output: &str, marker: &str) -> usize {
    output.lines().filter(|line| line.contains(marker)).count()
}

/// Per-slot medians for one problem size. `None` marks a slot no trial reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingSample {
    pub n: usize,
    pub medians: Vec<Option<f64>>,
}

/// All samples of one run, in requested size order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingReport {
    pub slots: usize,
    pub samples: Vec<TimingSample>,
}

/// Runs a [`BenchmarkProgram`] repeatedly and reduces its timings.
pub struct TimingHarness<P: BenchmarkProgram> {
    program: P,
    trials: u32,
    seed: u64,
    marker: String,
    count_timeout: Duration,
}

impl<P: BenchmarkProgram> TimingHarness<P> {
    pub fn new(program: P, config: &HarnessConfig) -> Self {
        Self {
            program,
            trials: config.trials,
            seed: config.seed,
            marker: config.marker.clone(),
            count_timeout: config.calibration_timeout(),
        }
    }

    pub fn program(&self) -> &P {
        &self.program
    }

    /// Number of timing slots the program reports, from one bounded run at `n`.
    /// Any failure of the counting run falls back to a single slot.
    pub fn count_slots(&self, n: usize) -> usize {
        let counting = Invocation {
            n,
            seed: self.seed,
            verbose: false,
            timeout: Some(self.count_timeout),
        };
        match self.program.run(&counting) {
            Ok(output) => {
                let slots = count_markers(&output, &self.marker);
                if slots == 0 {
                    warn!(
                        "'{}' printed no '{}' lines at n={}",
                        self.program.name(),
                        self.marker,
                        n
                    );
                }
                slots
            }
            Err(e) => {
                warn!("Slot detection failed ({}), assuming one slot", e);
                1
            }
        }
    }

    /// Runs every trial at `n` and reduces each slot to its median.
    pub fn measure(&self, n: usize, slots: usize) -> TimingSample {
        let invocation = Invocation {
            n,
            seed: self.seed,
            verbose: false,
            timeout: None,
        };
        let mut per_slot: Vec<Vec<f64>> = vec![Vec::new(); slots];

        for trial in 0..self.trials {
            let timings = match self
                .program
                .run(&invocation)
                .and_then(|output| parse_timings(&output, &self.marker))
            {
                Ok(timings) => timings,
                Err(e) => {
                    warn!("n={} trial {}: {}", n, trial + 1, e);
                    continue;
                }
            };
            if timings.len() != slots {
                warn!(
                    "n={} trial {} reported {} timings, expected {}",
                    n,
                    trial + 1,
                    timings.len(),
                    slots
                );
                continue;
            }
            for (slot, value) in per_slot.iter_mut().zip(timings) {
                slot.push(value);
            }
        }

        let medians: Vec<Option<f64>> = per_slot.iter().map(|values| median(values)).collect();
        debug!("n={}: {:?}", n, medians);
        TimingSample { n, medians }
    }

    /// Measures every size in order. Slots are detected once at the smallest size.
    pub fn run(&self, sizes: &[usize]) -> BenchmarkResult<TimingReport> {
        let smallest = *sizes.iter().min().ok_or(BenchmarkError::EmptySizeList)?;
        let slots = self.count_slots(smallest);
        info!(
            "'{}': {} timing slot(s), {} trial(s) per size",
            self.program.name(),
            slots,
            self.trials
        );

        let samples = sizes
            .iter()
            .map(|&n| {
                let sample = self.measure(n, slots);
                info!("n={}: {:?}", n, sample.medians);
                sample
            })
            .collect();
        Ok(TimingReport { slots, samples })
    }
}
