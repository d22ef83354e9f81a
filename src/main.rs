use std::env;
use std::fmt;
use std::io::{self, Write};
use std::process;
use std::rc::Rc;
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use ipc::Mailbox;
use runtime::logging::{self, LogLevel};
use runtime::{info, yield_now};

const USAGE: &str = "usage: spindle [--bench COUNT]";

#[derive(Debug, Default, PartialEq)]
struct Options {
    /// Receive this many values without printing them, then exit.
    bench: Option<u64>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options> {
    let mut options = Options::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--bench" => {
                let count = args.next().context("--bench needs a count")?;
                let count = count
                    .parse()
                    .with_context(|| format!("invalid bench count {:?}", count))?;
                options.bench = Some(count);
            }
            "-h" | "--help" => {
                println!("{}", USAGE);
                process::exit(0);
            }
            other => bail!("unexpected argument {:?}\n{}", other, USAGE),
        }
    }
    Ok(options)
}

fn stderr_sink(_level: LogLevel, args: fmt::Arguments) {
    eprintln!("{}", args);
}

/// Infinite Fibonacci sequence, modulo 2^64.
fn fibonacci(mailbox: &Mailbox) -> ! {
    let (mut a, mut b) = (1i64, 1i64);
    loop {
        mailbox.send(a);
        (a, b) = (b, a.wrapping_add(b));
    }
}

fn print_fibonacci(mailbox: &Mailbox) -> ! {
    let stdout = io::stdout();
    loop {
        let next = mailbox.receive();
        if writeln!(stdout.lock(), "next fib: {}", next).is_err() {
            // reader went away
            process::exit(0);
        }
    }
}

fn count_fibonacci(mailbox: &Mailbox, count: u64) -> ! {
    let started = Instant::now();
    for _ in 0..count {
        mailbox.receive();
    }
    let elapsed = started.elapsed();
    info!(
        "received {} values in {:?} ({:.1} ns per value)",
        count,
        elapsed,
        elapsed.as_nanos() as f64 / count.max(1) as f64
    );
    process::exit(0);
}

fn main() -> Result<()> {
    let options = parse_args(env::args().skip(1))?;

    logging::set_sink(stderr_sink);
    if let Ok(level) = env::var("SPINDLE_LOG") {
        let level = level
            .parse()
            .map_err(|_| anyhow!("unknown log level {:?} in SPINDLE_LOG", level))?;
        logging::set_max_level(level);
    }

    // SAFETY: the runtime never leaves the main thread.
    unsafe { runtime::bootstrap() };

    let fib: Rc<Mailbox> = Rc::new(Mailbox::new());
    let producer = {
        let fib = fib.clone();
        runtime::spawn("fibonacci", move || fibonacci(&fib))
    };
    let consumer = match options.bench {
        Some(count) => runtime::spawn("count_fibonacci", move || count_fibonacci(&fib, count)),
        None => runtime::spawn("print_fibonacci", move || print_fibonacci(&fib)),
    };

    // a ring of just the two; the bootstrap thread hands over and never runs again
    producer.link(consumer);
    consumer.link(producer);
    yield_now();

    bail!("bootstrap thread resumed after leaving the run queue")
}
