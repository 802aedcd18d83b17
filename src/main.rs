use static_sched::{cli, logger};

fn main() {
    if let Err(err) = run_main() {
        eprintln!("static_sched error: {err:?}");
        std::process::exit(1);
    }
}

fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logger::init(args.log_level.map(Into::into));
    cli::run(args)
}
