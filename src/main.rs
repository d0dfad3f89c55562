//! Demo driver: runs a batch of sleep-and-log tasks under a deadline and
//! maps the outcome to a process exit code.

use bounded_runner::{Config, Error, Runner, Task};
use clap::Parser;
use signal_hook::consts::SIGTERM;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "bounded-runner")]
#[command(about = "Run sleeping tasks on a worker pool under a deadline", long_about = None)]
struct Cli {
    /// Time the whole run may take, in milliseconds
    #[arg(long, default_value_t = 3_000)]
    timeout_ms: u64,

    /// Number of worker threads
    #[arg(short, long, default_value_t = 3)]
    workers: usize,

    /// Number of tasks to register
    #[arg(short, long, default_value_t = 6)]
    tasks: usize,

    /// How long each task sleeps, in milliseconds
    #[arg(long, default_value_t = 1_000)]
    task_ms: u64,

    /// Treat SIGTERM as an interrupt too
    #[arg(long)]
    sigterm: bool,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_thread_names(true))
        .init();
}

// A, B, ..., Z, AA, AB, ...
fn task_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

fn sleep_task(name: String, duration: Duration) -> Task {
    Task::named(name.clone(), move |worker| {
        info!("Processor - Task #{} ... worker #{}", name, worker);
        thread::sleep(duration);
        info!("Processor - Task #{} completed after {:?}", name, duration);
    })
}

fn run(cli: &Cli) -> bounded_runner::Result<Runner> {
    let mut builder = Config::builder()
        .deadline(Duration::from_millis(cli.timeout_ms))
        .num_workers(cli.workers);
    if cli.sigterm {
        builder = builder.watch_signal(SIGTERM);
    }

    let mut runner = Runner::with_config(builder.build()?)?;
    let duration = Duration::from_millis(cli.task_ms);
    runner.add_all((0..cli.tasks).map(|i| sleep_task(task_name(i), duration)))?;

    runner.start()?;
    Ok(runner)
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    info!("Starting work.");

    match run(&cli) {
        Ok(runner) => {
            let stats = runner.metrics();
            info!(
                completed = stats.tasks_completed,
                avg_task_ms = stats.avg_task_ns / 1_000_000,
                "Process ended."
            );
            ExitCode::SUCCESS
        }
        Err(Error::Timeout) => {
            info!("Terminating due to timeout.");
            ExitCode::from(1)
        }
        Err(Error::Interrupt) => {
            info!("Terminating due to interrupt.");
            ExitCode::from(2)
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::from(3)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_names() {
        assert_eq!(task_name(0), "A");
        assert_eq!(task_name(5), "F");
        assert_eq!(task_name(25), "Z");
        assert_eq!(task_name(26), "AA");
        assert_eq!(task_name(27), "AB");
        assert_eq!(task_name(52), "BA");
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["bounded-runner"]);
        assert_eq!(cli.timeout_ms, 3_000);
        assert_eq!(cli.workers, 3);
        assert_eq!(cli.tasks, 6);
        assert_eq!(cli.task_ms, 1_000);
        assert!(!cli.sigterm);
    }
}
